// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

//! Keyword-argument surface for scripting hosts.
//!
//! A host hands over its call arguments as a JSON object; [`Camera`] checks
//! names and types, fills in board defaults and forwards to a
//! [`CameraDevice`]. Method calls can be made directly or by name through
//! [`Camera::call`], which also serves the `get_<property>` and
//! `set_<property>` pairs of every entry in [`crate::sensor::PROPERTIES`],
//! plus `get_bitmap`/`set_bitmap` for BMP wrapping of native captures.

use crate::{
    board::{Board, BoardDefaults},
    config::{CameraConfigBuilder, Warning},
    device::{CameraDevice, CapturedImage},
    driver::Converter,
    format::{FrameSize, GainCeiling, GrabMode, PixelFormat},
    registry::DeviceRegistry,
    sensor::{lookup, PropertyKind, PropertyValue},
    Error,
};
use serde_json::{Map, Value};
use std::{fmt, str::FromStr};

/// Keyword arguments of one call.
pub type Kwargs = Map<String, Value>;

const CONSTRUCT_KEYWORDS: &[&str] = &[
    "data_pins",
    "pclk_pin",
    "vsync_pin",
    "href_pin",
    "sda_pin",
    "scl_pin",
    "xclk_pin",
    "xclk_freq",
    "powerdown_pin",
    "reset_pin",
    "pixel_format",
    "frame_size",
    "jpeg_quality",
    "fb_count",
    "grab_mode",
    "init",
    "sccb_port",
    "bitmap",
];

const RECONFIGURE_KEYWORDS: &[&str] = &["frame_size", "pixel_format", "grab_mode", "fb_count"];

fn check_keywords(kwargs: &Kwargs, allowed: &[&str]) -> Result<(), Error> {
    match kwargs.keys().find(|key| !allowed.contains(&key.as_str())) {
        Some(key) => Err(Error::InvalidArgument(format!(
            "unexpected keyword argument '{}'",
            key
        ))),
        None => Ok(()),
    }
}

fn int_arg(kwargs: &Kwargs, key: &str) -> Result<Option<i64>, Error> {
    match kwargs.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_i64()
            .map(Some)
            .ok_or_else(|| Error::TypeMismatch(format!("{} must be an integer", key))),
        Some(Value::Bool(b)) => Ok(Some(i64::from(*b))),
        Some(_) => Err(Error::TypeMismatch(format!("{} must be an integer", key))),
    }
}

fn pin_arg(kwargs: &Kwargs, key: &str) -> Result<Option<i32>, Error> {
    int_arg(kwargs, key)?
        .map(|pin| {
            i32::try_from(pin)
                .map_err(|_| Error::InvalidArgument(format!("{} out of range: {}", key, pin)))
        })
        .transpose()
}

fn bool_arg(kwargs: &Kwargs, key: &str) -> Result<Option<bool>, Error> {
    match kwargs.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(Value::Number(n)) => Ok(Some(n.as_i64() != Some(0))),
        Some(_) => Err(Error::TypeMismatch(format!("{} must be a boolean", key))),
    }
}

fn pins_arg(kwargs: &Kwargs, key: &str) -> Result<Option<Vec<i32>>, Error> {
    match kwargs.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                item.as_i64()
                    .and_then(|pin| i32::try_from(pin).ok())
                    .ok_or_else(|| Error::TypeMismatch(format!("{} must hold integers", key)))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Some),
        Some(_) => Err(Error::TypeMismatch(format!("{} must be a list", key))),
    }
}

/// Enum argument given as its integer value or its constant name.
fn enum_arg<T>(kwargs: &Kwargs, key: &str) -> Result<Option<T>, Error>
where
    T: TryFrom<i64, Error = Error> + FromStr<Err = Error>,
{
    match kwargs.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => match n.as_i64() {
            Some(raw) => T::try_from(raw).map(Some),
            None => Err(Error::TypeMismatch(format!("{} must be an integer", key))),
        },
        Some(Value::String(name)) => name.parse().map(Some),
        Some(_) => Err(Error::TypeMismatch(format!("{} must be an integer", key))),
    }
}

/// Result of a call made by name.
#[derive(Debug)]
pub enum Reply<'a> {
    None,
    Value(Value),
    Image(CapturedImage<'a>),
}

/// Camera object as seen by a scripting host.
pub struct Camera<'r, D: Converter> {
    device: CameraDevice<'r, D>,
}

impl<'r, D: Converter> Camera<'r, D> {
    /// Construct from keyword arguments with the defaults of the board
    /// selected at build time.
    pub fn construct(driver: D, registry: &'r DeviceRegistry, kwargs: &Kwargs) -> Result<Self, Error> {
        Self::construct_with_defaults(driver, registry, Board::selected_defaults(), kwargs)
    }

    /// Construct from keyword arguments, initialize, and capture one frame
    /// to prove the configuration works. Without a frame the camera is shut
    /// down and construction fails. With `init=false` the camera is left
    /// deinitialized after the test frame.
    pub fn construct_with_defaults(
        driver: D,
        registry: &'r DeviceRegistry,
        defaults: BoardDefaults,
        kwargs: &Kwargs,
    ) -> Result<Self, Error> {
        check_keywords(kwargs, CONSTRUCT_KEYWORDS)?;

        let mut builder = CameraConfigBuilder::new(defaults);
        if let Some(pins) = pins_arg(kwargs, "data_pins")? {
            builder = builder.with_data_pins(&pins);
        }
        let pins: [(&str, fn(CameraConfigBuilder, i32) -> CameraConfigBuilder); 8] = [
            ("pclk_pin", CameraConfigBuilder::with_pclk_pin),
            ("vsync_pin", CameraConfigBuilder::with_vsync_pin),
            ("href_pin", CameraConfigBuilder::with_href_pin),
            ("sda_pin", CameraConfigBuilder::with_sda_pin),
            ("scl_pin", CameraConfigBuilder::with_scl_pin),
            ("xclk_pin", CameraConfigBuilder::with_xclk_pin),
            ("powerdown_pin", CameraConfigBuilder::with_powerdown_pin),
            ("reset_pin", CameraConfigBuilder::with_reset_pin),
        ];
        for (key, with) in pins {
            if let Some(pin) = pin_arg(kwargs, key)? {
                builder = with(builder, pin);
            }
        }
        if let Some(port) = pin_arg(kwargs, "sccb_port")? {
            builder = builder.with_sccb_port(port);
        }
        if let Some(freq) = int_arg(kwargs, "xclk_freq")? {
            builder = builder.with_xclk_freq(freq);
        }
        if let Some(format) = enum_arg::<PixelFormat>(kwargs, "pixel_format")? {
            builder = builder.with_pixel_format(format);
        }
        if let Some(size) = enum_arg::<FrameSize>(kwargs, "frame_size")? {
            builder = builder.with_frame_size(size);
        }
        if let Some(quality) = int_arg(kwargs, "jpeg_quality")? {
            builder = builder.with_jpeg_quality(quality);
        }
        if let Some(count) = int_arg(kwargs, "fb_count")? {
            builder = builder.with_fb_count(count);
        }
        if let Some(mode) = enum_arg::<GrabMode>(kwargs, "grab_mode")? {
            builder = builder.with_grab_mode(mode);
        }
        let init = bool_arg(kwargs, "init")?.unwrap_or(true);
        let bitmap = bool_arg(kwargs, "bitmap")?.unwrap_or(false);

        let (config, warnings) = builder.build_with_warnings()?;
        let mut device = CameraDevice::new(driver, registry, config);
        device.push_warnings(warnings);
        device.set_bitmap(bitmap);
        device.init()?;

        if device.capture(None)?.is_none() {
            log::error!(
                "Failed to capture initial frame. Construct a new object with appropriate configuration."
            );
            if let Err(err) = device.deinit() {
                log::warn!("camera deinit after failed test capture: {}", err);
            }
            return Err(Error::Timeout);
        }
        if init {
            device.free_buffer();
        } else {
            device.deinit()?;
        }
        Ok(Camera { device })
    }

    pub fn device(&self) -> &CameraDevice<'r, D> {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut CameraDevice<'r, D> {
        &mut self.device
    }

    pub fn drain_warnings(&mut self) -> Vec<Warning> {
        self.device.drain_warnings()
    }

    pub fn init(&mut self) -> Result<(), Error> {
        self.device.init()
    }

    pub fn deinit(&mut self) -> Result<(), Error> {
        self.device.deinit()
    }

    pub fn enter(&mut self) -> &mut Self {
        self
    }

    pub fn exit(&mut self) -> Result<(), Error> {
        self.device.deinit()
    }

    pub fn capture(&mut self, output_format: Option<PixelFormat>) -> Result<Option<CapturedImage<'_>>, Error> {
        self.device.capture(output_format)
    }

    /// Partial reconfigure; absent keywords keep their current values.
    pub fn reconfigure(&mut self, kwargs: &Kwargs) -> Result<(), Error> {
        check_keywords(kwargs, RECONFIGURE_KEYWORDS)?;
        let frame_size = enum_arg::<FrameSize>(kwargs, "frame_size")?;
        let pixel_format = enum_arg::<PixelFormat>(kwargs, "pixel_format")?;
        let grab_mode = enum_arg::<GrabMode>(kwargs, "grab_mode")?;
        let fb_count = int_arg(kwargs, "fb_count")?;
        self.device
            .reconfigure(frame_size, pixel_format, grab_mode, fb_count)
    }

    pub fn get(&self, name: &str) -> Result<Value, Error> {
        Ok(match self.device.property(name)? {
            PropertyValue::Int(v) => Value::from(v),
            PropertyValue::Bool(b) => Value::from(b),
            PropertyValue::Text(s) => Value::from(s),
        })
    }

    pub fn set(&mut self, name: &str, value: &Value) -> Result<(), Error> {
        let prop = lookup(name)?;
        let value = match (value, prop.kind) {
            (Value::Bool(b), _) => PropertyValue::Bool(*b),
            (Value::Number(n), _) => n
                .as_i64()
                .and_then(|v| i32::try_from(v).ok())
                .map(PropertyValue::Int)
                .ok_or_else(|| Error::TypeMismatch(format!("{} expects an integer", name)))?,
            (Value::String(s), PropertyKind::FrameSize) => {
                PropertyValue::Int(s.parse::<FrameSize>()?.raw() as i32)
            }
            (Value::String(s), PropertyKind::GainCeiling) => {
                PropertyValue::Int(s.parse::<GainCeiling>()?.raw() as i32)
            }
            _ => {
                return Err(Error::TypeMismatch(format!(
                    "unsupported value for {}: {}",
                    name, value
                )))
            }
        };
        self.device.set_property(name, value)
    }

    pub fn free_buffer(&mut self) {
        self.device.free_buffer()
    }

    pub fn bitmap(&self) -> bool {
        self.device.bitmap()
    }

    /// Wrap native captures in a BMP container.
    pub fn set_bitmap(&mut self, bitmap: bool) {
        self.device.set_bitmap(bitmap)
    }

    pub fn frame_available(&self) -> Result<bool, Error> {
        self.device.frame_available()
    }

    /// Call a method by name.
    pub fn call(&mut self, method: &str, kwargs: &Kwargs) -> Result<Reply<'_>, Error> {
        match method {
            "get_bitmap" => {
                check_keywords(kwargs, &[])?;
                return Ok(Reply::Value(Value::from(self.bitmap())));
            }
            "set_bitmap" => {
                check_keywords(kwargs, &["value"])?;
                let bitmap = bool_arg(kwargs, "value")?.ok_or_else(|| {
                    Error::InvalidArgument(format!("{} requires a value", method))
                })?;
                self.set_bitmap(bitmap);
                return Ok(Reply::None);
            }
            _ => {}
        }
        if let Some(name) = method.strip_prefix("get_") {
            check_keywords(kwargs, &[])?;
            return self.get(name).map(Reply::Value);
        }
        if let Some(name) = method.strip_prefix("set_") {
            check_keywords(kwargs, &["value"])?;
            let value = kwargs
                .get("value")
                .ok_or_else(|| Error::InvalidArgument(format!("{} requires a value", method)))?;
            self.set(name, value)?;
            return Ok(Reply::None);
        }
        match method {
            "capture" => {
                check_keywords(kwargs, &["output_format"])?;
                let output = enum_arg::<PixelFormat>(kwargs, "output_format")?;
                Ok(match self.capture(output)? {
                    Some(image) => Reply::Image(image),
                    None => Reply::None,
                })
            }
            "reconfigure" => self.reconfigure(kwargs).map(|_| Reply::None),
            "init" => self.init().map(|_| Reply::None),
            "deinit" | "exit" => self.deinit().map(|_| Reply::None),
            "enter" => Ok(Reply::None),
            "free_buffer" => {
                self.free_buffer();
                Ok(Reply::None)
            }
            "frame_available" => self.frame_available().map(|b| Reply::Value(Value::from(b))),
            other => Err(Error::InvalidArgument(format!(
                "'Camera' object has no attribute '{}'",
                other
            ))),
        }
    }
}

impl<D: Converter> fmt::Display for Camera<'_, D> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.device.sensor_name() {
            Ok(name) => write!(f, "Camera with sensor {}", name),
            Err(_) => write!(f, "Camera unknown"),
        }
    }
}

fn constant_table<T: Copy>(members: &[T], name: fn(T) -> &'static str, raw: fn(T) -> u32) -> Value {
    let mut table = Map::new();
    for &member in members {
        table.insert(name(member).to_string(), Value::from(raw(member)));
    }
    Value::Object(table)
}

/// Named integer constants, grouped by type.
pub fn constants() -> Map<String, Value> {
    let mut groups = Map::new();
    groups.insert(
        "PixelFormat".to_string(),
        constant_table(PixelFormat::ALL, PixelFormat::name, PixelFormat::raw),
    );
    groups.insert(
        "FrameSize".to_string(),
        constant_table(FrameSize::ALL, FrameSize::name, FrameSize::raw),
    );
    groups.insert(
        "GrabMode".to_string(),
        constant_table(GrabMode::ALL, GrabMode::name, GrabMode::raw),
    );
    groups.insert(
        "GainCeiling".to_string(),
        constant_table(GainCeiling::ALL, GainCeiling::name, GainCeiling::raw),
    );
    groups
}

/// Binding version, same as the crate version.
pub fn version() -> &'static str {
    crate::version()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulated::SimulatedDriver;
    use serde_json::json;

    fn kwargs(value: Value) -> Kwargs {
        match value {
            Value::Object(map) => map,
            _ => panic!("kwargs must be an object"),
        }
    }

    fn construct<'r>(
        registry: &'r DeviceRegistry,
        args: Value,
    ) -> Result<Camera<'r, SimulatedDriver>, Error> {
        Camera::construct_with_defaults(
            SimulatedDriver::new(),
            registry,
            Board::AiThinker.defaults(),
            &kwargs(args),
        )
    }

    #[test]
    fn test_construct_frees_smoke_frame() {
        let registry = DeviceRegistry::new();
        let camera = construct(&registry, json!({"pixel_format": 4, "jpeg_quality": 80})).unwrap();
        assert!(camera.device().is_active());
        assert!(!camera.device().holds_frame());
        assert_eq!(camera.device().driver().frames_captured(), 1);
        assert_eq!(camera.to_string(), "Camera with sensor OV2640");
    }

    #[test]
    fn test_construct_init_false() {
        let registry = DeviceRegistry::new();
        let camera = construct(&registry, json!({"init": false})).unwrap();
        assert!(!camera.device().is_active());
        assert!(!registry.is_held());
        assert_eq!(camera.to_string(), "Camera unknown");
    }

    #[test]
    fn test_construct_without_frame_fails() {
        let registry = DeviceRegistry::new();
        let result = Camera::construct_with_defaults(
            SimulatedDriver::new().without_frames(),
            &registry,
            Board::AiThinker.defaults(),
            &Kwargs::new(),
        );
        assert!(matches!(result, Err(Error::Timeout)));
        assert!(!registry.is_held());
    }

    #[test]
    fn test_unknown_keyword() {
        let registry = DeviceRegistry::new();
        assert!(matches!(
            construct(&registry, json!({"i2c": 0})),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_wrong_types() {
        let registry = DeviceRegistry::new();
        assert!(matches!(
            construct(&registry, json!({"jpeg_quality": "high"})),
            Err(Error::TypeMismatch(_))
        ));
        assert!(matches!(
            construct(&registry, json!({"data_pins": 5})),
            Err(Error::TypeMismatch(_))
        ));
        assert!(matches!(
            construct(&registry, json!({"pixel_format": 42})),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_enum_names_accepted() {
        let registry = DeviceRegistry::new();
        let camera = construct(
            &registry,
            json!({"pixel_format": "JPEG", "frame_size": "VGA", "grab_mode": "LATEST"}),
        )
        .unwrap();
        let config = camera.device().config();
        assert_eq!(config.pixel_format(), PixelFormat::Jpeg);
        assert_eq!(config.frame_size(), FrameSize::Vga);
        assert_eq!(config.grab_mode(), GrabMode::Latest);
    }

    #[test]
    fn test_call_dispatch() {
        let registry = DeviceRegistry::new();
        let mut camera = construct(&registry, json!({"pixel_format": 4})).unwrap();

        camera
            .call("set_contrast", &kwargs(json!({"value": 2})))
            .unwrap();
        match camera.call("get_contrast", &Kwargs::new()).unwrap() {
            Reply::Value(v) => assert_eq!(v, json!(2)),
            other => panic!("unexpected reply {:?}", other),
        }
        match camera.call("get_sensor_name", &Kwargs::new()).unwrap() {
            Reply::Value(v) => assert_eq!(v, json!("OV2640")),
            other => panic!("unexpected reply {:?}", other),
        }
        match camera
            .call("capture", &kwargs(json!({"output_format": "RGB888"})))
            .unwrap()
        {
            Reply::Image(image) => assert_eq!(image.len(), 320 * 240 * 3),
            other => panic!("unexpected reply {:?}", other),
        }
        assert!(matches!(
            camera.call("zoom", &Kwargs::new()),
            Err(Error::InvalidArgument(_))
        ));
        camera.call("exit", &Kwargs::new()).unwrap();
        assert!(!camera.device().is_active());
    }

    #[test]
    fn test_partial_reconfigure() {
        let registry = DeviceRegistry::new();
        let mut camera = construct(&registry, json!({"pixel_format": 4})).unwrap();
        camera
            .reconfigure(&kwargs(json!({"frame_size": 8})))
            .unwrap();
        let config = camera.device().config();
        assert_eq!(config.frame_size(), FrameSize::Vga);
        assert_eq!(config.pixel_format(), PixelFormat::Jpeg);
        assert!(matches!(
            camera.reconfigure(&kwargs(json!({"jpeg_quality": 5}))),
            Err(Error::InvalidArgument(_))
        ));

        camera.device_mut().set_bitmap(true);
        let image = camera.capture(None).unwrap().unwrap();
        assert!(image.is_bitmap());
        assert_eq!(&image.data()[..2], b"BM");
    }

    #[test]
    fn test_bitmap_keyword() {
        let registry = DeviceRegistry::new();
        let mut camera = construct(&registry, json!({"bitmap": true, "frame_size": "QQVGA"})).unwrap();
        assert!(camera.bitmap());
        match camera.call("capture", &Kwargs::new()).unwrap() {
            Reply::Image(image) => {
                assert!(image.is_bitmap());
                assert_eq!(image.len(), 54 + 160 * 120 * 3);
            }
            other => panic!("unexpected reply {:?}", other),
        }

        camera
            .call("set_bitmap", &kwargs(json!({"value": false})))
            .unwrap();
        match camera.call("get_bitmap", &Kwargs::new()).unwrap() {
            Reply::Value(v) => assert_eq!(v, json!(false)),
            other => panic!("unexpected reply {:?}", other),
        }
        match camera.call("capture", &Kwargs::new()).unwrap() {
            Reply::Image(image) => assert!(!image.is_bitmap()),
            other => panic!("unexpected reply {:?}", other),
        }
        assert!(matches!(
            camera.call("set_bitmap", &Kwargs::new()),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            camera.call("set_bitmap", &kwargs(json!({"value": "yes"}))),
            Err(Error::TypeMismatch(_))
        ));
    }

    #[test]
    fn test_constants() {
        let constants = constants();
        assert_eq!(constants["PixelFormat"]["JPEG"], json!(4));
        assert_eq!(constants["FrameSize"]["QSXGA"], json!(21));
        assert_eq!(constants["FrameSize"].as_object().unwrap().len(), 22);
        assert_eq!(constants["GrabMode"]["LATEST"], json!(1));
        assert_eq!(constants["GainCeiling"]["128X"], json!(6));
    }
}
