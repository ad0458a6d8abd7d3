// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

//! Named camera properties.
//!
//! Every property is one row of [`PROPERTIES`]; a single pair of functions
//! ([`CameraDevice::property`] and [`CameraDevice::set_property`]) serves
//! them all. Sensor controls read the sensor status and write through the
//! sensor's setter, checking the value range first and warning when the
//! sensor reads back something other than what was written. The remaining
//! rows expose configuration and sensor information.

use crate::{
    config::{quality_to_driver, Warning},
    device::CameraDevice,
    driver::{Control, Driver},
    format::{FrameSize, GainCeiling},
    Error,
};
use serde::Serialize;
use std::fmt;

/// How a property value is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    Int,
    Bool,
    Text,
    /// One of [`GainCeiling`], as its integer value.
    GainCeiling,
    /// One of [`FrameSize`], as its integer value.
    FrameSize,
    /// JPEG quality on the 0-100 scale.
    Quality,
}

/// Non-control values a property can expose.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceField {
    FrameSize,
    PixelFormat,
    GrabMode,
    FbCount,
    PixelWidth,
    PixelHeight,
    MaxFrameSize,
    SensorName,
    SupportsJpeg,
    Address,
}

/// Where a property value lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Control(Control),
    Device(DeviceField),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Property {
    pub name: &'static str,
    pub kind: PropertyKind,
    pub source: Source,
    /// Inclusive bounds checked before the sensor sees the value.
    pub range: Option<(i32, i32)>,
    pub writable: bool,
}

const fn control(
    name: &'static str,
    kind: PropertyKind,
    control: Control,
    range: Option<(i32, i32)>,
) -> Property {
    Property {
        name,
        kind,
        source: Source::Control(control),
        range,
        writable: true,
    }
}

const fn field(name: &'static str, kind: PropertyKind, field: DeviceField) -> Property {
    Property {
        name,
        kind,
        source: Source::Device(field),
        range: None,
        writable: false,
    }
}

const LEVEL: Option<(i32, i32)> = Some((-2, 2));

/// Every property reachable by name.
pub static PROPERTIES: &[Property] = &[
    Property {
        writable: true,
        ..field("frame_size", PropertyKind::FrameSize, DeviceField::FrameSize)
    },
    field("pixel_format", PropertyKind::Int, DeviceField::PixelFormat),
    field("grab_mode", PropertyKind::Int, DeviceField::GrabMode),
    field("fb_count", PropertyKind::Int, DeviceField::FbCount),
    field("pixel_width", PropertyKind::Int, DeviceField::PixelWidth),
    field("pixel_height", PropertyKind::Int, DeviceField::PixelHeight),
    field("max_frame_size", PropertyKind::FrameSize, DeviceField::MaxFrameSize),
    field("sensor_name", PropertyKind::Text, DeviceField::SensorName),
    field("supports_jpeg", PropertyKind::Bool, DeviceField::SupportsJpeg),
    field("address", PropertyKind::Int, DeviceField::Address),
    control("contrast", PropertyKind::Int, Control::Contrast, LEVEL),
    control("brightness", PropertyKind::Int, Control::Brightness, LEVEL),
    control("saturation", PropertyKind::Int, Control::Saturation, LEVEL),
    control("sharpness", PropertyKind::Int, Control::Sharpness, LEVEL),
    control("denoise", PropertyKind::Int, Control::Denoise, None),
    control("gainceiling", PropertyKind::GainCeiling, Control::GainCeiling, Some((0, 6))),
    control("quality", PropertyKind::Quality, Control::Quality, Some((0, 100))),
    control("colorbar", PropertyKind::Bool, Control::Colorbar, None),
    control("whitebal", PropertyKind::Bool, Control::Whitebal, None),
    control("gain_ctrl", PropertyKind::Bool, Control::GainCtrl, None),
    control("exposure_ctrl", PropertyKind::Bool, Control::ExposureCtrl, None),
    control("hmirror", PropertyKind::Bool, Control::Hmirror, None),
    control("vflip", PropertyKind::Bool, Control::Vflip, None),
    control("aec2", PropertyKind::Bool, Control::Aec2, None),
    control("awb_gain", PropertyKind::Bool, Control::AwbGain, None),
    control("agc_gain", PropertyKind::Int, Control::AgcGain, None),
    control("aec_value", PropertyKind::Int, Control::AecValue, None),
    control("special_effect", PropertyKind::Int, Control::SpecialEffect, Some((0, 6))),
    control("wb_mode", PropertyKind::Int, Control::WbMode, Some((0, 4))),
    control("ae_level", PropertyKind::Int, Control::AeLevel, LEVEL),
    control("dcw", PropertyKind::Bool, Control::Dcw, None),
    control("bpc", PropertyKind::Bool, Control::Bpc, None),
    control("wpc", PropertyKind::Bool, Control::Wpc, None),
    control("raw_gma", PropertyKind::Bool, Control::RawGma, None),
    control("lenc", PropertyKind::Bool, Control::Lenc, None),
];

pub fn lookup(name: &str) -> Result<&'static Property, Error> {
    PROPERTIES
        .iter()
        .find(|prop| prop.name == name)
        .ok_or_else(|| Error::InvalidArgument(format!("No attribute {}", name)))
}

/// Value read from or written to a property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Int(i32),
    Bool(bool),
    Text(String),
}

impl PropertyValue {
    fn as_int(&self, name: &str) -> Result<i32, Error> {
        match self {
            PropertyValue::Int(v) => Ok(*v),
            PropertyValue::Bool(b) => Ok(i32::from(*b)),
            PropertyValue::Text(_) => Err(Error::TypeMismatch(format!(
                "{} expects an integer",
                name
            ))),
        }
    }

    fn as_bool(&self, name: &str) -> Result<bool, Error> {
        match self {
            PropertyValue::Bool(b) => Ok(*b),
            PropertyValue::Int(v) => Ok(*v != 0),
            PropertyValue::Text(_) => Err(Error::TypeMismatch(format!(
                "{} expects a boolean",
                name
            ))),
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PropertyValue::Int(v) => write!(f, "{}", v),
            PropertyValue::Bool(b) => write!(f, "{}", b),
            PropertyValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<i32> for PropertyValue {
    fn from(value: i32) -> Self {
        PropertyValue::Int(value)
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        PropertyValue::Bool(value)
    }
}

impl<D: Driver> CameraDevice<'_, D> {
    /// Read a property by name. Requires an active camera.
    pub fn property(&self, name: &str) -> Result<PropertyValue, Error> {
        let prop = lookup(name)?;
        self.require_active()?;
        match prop.source {
            Source::Control(control) => {
                let raw = self.driver.get_control(control)?;
                Ok(match prop.kind {
                    PropertyKind::Bool => PropertyValue::Bool(raw != 0),
                    // the sensor holds the driver scale; report what was set
                    PropertyKind::Quality => {
                        PropertyValue::Int(i32::from(self.config.jpeg_quality()))
                    }
                    _ => PropertyValue::Int(raw),
                })
            }
            Source::Device(field) => self.device_field(field),
        }
    }

    fn device_field(&self, field: DeviceField) -> Result<PropertyValue, Error> {
        let config = &self.config;
        Ok(match field {
            DeviceField::FrameSize => PropertyValue::Int(config.frame_size().raw() as i32),
            DeviceField::PixelFormat => PropertyValue::Int(config.pixel_format().raw() as i32),
            DeviceField::GrabMode => PropertyValue::Int(config.grab_mode().raw() as i32),
            DeviceField::FbCount => PropertyValue::Int(i32::from(config.fb_count())),
            DeviceField::PixelWidth => PropertyValue::Int(config.frame_size().width() as i32),
            DeviceField::PixelHeight => PropertyValue::Int(config.frame_size().height() as i32),
            DeviceField::MaxFrameSize => {
                PropertyValue::Int(self.driver.sensor_info()?.max_frame_size.raw() as i32)
            }
            DeviceField::SensorName => PropertyValue::Text(self.driver.sensor_info()?.name),
            DeviceField::SupportsJpeg => {
                PropertyValue::Bool(self.driver.sensor_info()?.supports_jpeg)
            }
            DeviceField::Address => {
                PropertyValue::Int(i32::from(self.driver.sensor_info()?.sccb_address))
            }
        })
    }

    /// Write a property by name. Requires an active camera.
    pub fn set_property(&mut self, name: &str, value: PropertyValue) -> Result<(), Error> {
        let prop = lookup(name)?;
        if !prop.writable {
            return Err(Error::InvalidArgument(format!("{} is read-only", name)));
        }
        self.require_active()?;

        let requested = match prop.kind {
            PropertyKind::Bool => i32::from(value.as_bool(name)?),
            _ => value.as_int(name)?,
        };
        if let Some((min, max)) = prop.range {
            if requested < min || requested > max {
                return Err(Error::InvalidArgument(format!(
                    "{} value must be between {} and {}",
                    name, min, max
                )));
            }
        }

        let control = match prop.source {
            Source::Control(control) => control,
            Source::Device(DeviceField::FrameSize) => {
                let size = FrameSize::try_from(i64::from(requested))?;
                return self.reconfigure(Some(size), None, None, None);
            }
            Source::Device(_) => {
                return Err(Error::InvalidArgument(format!("{} is read-only", name)))
            }
        };

        let driver_value = match prop.kind {
            PropertyKind::GainCeiling => GainCeiling::try_from(i64::from(requested))?.raw() as i32,
            PropertyKind::Quality => i32::from(quality_to_driver(requested as u8)),
            _ => requested,
        };
        self.driver.set_control(control, driver_value)?;
        if prop.kind == PropertyKind::Quality {
            self.config.set_jpeg_quality(requested as u8)?;
        }

        let actual = self.driver.get_control(control)?;
        let actual = if prop.kind == PropertyKind::Bool {
            i32::from(actual != 0)
        } else {
            actual
        };
        if actual != driver_value {
            Warning::PropertyNotApplied {
                property: prop.name,
                requested: driver_value,
                actual,
            }
            .raise(&mut self.warnings);
        }
        Ok(())
    }
}
