// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

//! In-memory camera driver.
//!
//! [`SimulatedDriver`] behaves like the esp32-camera driver as seen through
//! [`Driver`] and [`Converter`]: it rejects calls in the wrong lifecycle
//! state, hands out at most `fb_count` frames at once and keeps sensor
//! control values. It also records what was asked of it so tests can check
//! the call sequence, and can be told to fail in specific ways.

use crate::{
    convert::allocate,
    driver::{Control, Converter, Driver, DriverConfig, RawFrame, SensorInfo},
    format::{FrameSize, GainCeiling, PixelFormat},
    Error,
};
use std::{
    collections::{HashMap, HashSet},
    thread,
    time::{Duration, SystemTime, UNIX_EPOCH},
};
use unix_ts::Timestamp;

const BMP_HEADER_LEN: usize = 54;

/// Frame produced by [`SimulatedDriver`].
#[derive(Debug, Clone)]
pub struct SimulatedFrame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    format: PixelFormat,
    timestamp: Timestamp,
    sequence: u64,
}

impl SimulatedFrame {
    /// Position of this frame in the capture sequence, starting at 1.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }
}

impl RawFrame for SimulatedFrame {
    fn data(&self) -> &[u8] {
        &self.data
    }

    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn format(&self) -> PixelFormat {
        self.format
    }

    fn timestamp(&self) -> Timestamp {
        self.timestamp
    }
}

/// Driver double with an OV2640-like sensor.
#[derive(Debug)]
pub struct SimulatedDriver {
    sensor: SensorInfo,
    missing: HashSet<Control>,
    stuck: HashSet<Control>,
    controls: HashMap<Control, i32>,
    init_failures: HashMap<usize, i32>,
    deinit_failures: HashMap<usize, i32>,
    frames_enabled: bool,
    fail_conversions: bool,
    frame_delay: Duration,

    config: Option<DriverConfig>,
    init_log: Vec<DriverConfig>,
    deinit_count: usize,
    outstanding: usize,
    max_outstanding: usize,
    sequence: u64,
}

impl Default for SimulatedDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedDriver {
    pub fn new() -> Self {
        SimulatedDriver {
            sensor: SensorInfo {
                name: "OV2640".to_string(),
                sccb_address: 0x30,
                pid: 0x2642,
                max_frame_size: FrameSize::Uxga,
                supports_jpeg: true,
            },
            missing: HashSet::new(),
            stuck: HashSet::new(),
            controls: HashMap::new(),
            init_failures: HashMap::new(),
            deinit_failures: HashMap::new(),
            frames_enabled: true,
            fail_conversions: false,
            frame_delay: Duration::ZERO,
            config: None,
            init_log: Vec::new(),
            deinit_count: 0,
            outstanding: 0,
            max_outstanding: 0,
            sequence: 0,
        }
    }

    pub fn with_sensor(self, sensor: SensorInfo) -> Self {
        SimulatedDriver { sensor, ..self }
    }

    pub fn with_max_frame_size(mut self, size: FrameSize) -> Self {
        self.sensor.max_frame_size = size;
        self
    }

    /// Sensor without a JPEG encoder, like the OV7725.
    pub fn without_jpeg(mut self) -> Self {
        self.sensor.supports_jpeg = false;
        self
    }

    /// Sensor with no setter for `control`.
    pub fn without_control(mut self, control: Control) -> Self {
        self.missing.insert(control);
        self
    }

    /// Setter for `control` reports success but the value does not change.
    pub fn with_stuck_control(mut self, control: Control) -> Self {
        self.stuck.insert(control);
        self
    }

    /// Make the `call`-th init (counting from 1) fail with `status`.
    pub fn with_init_failure(mut self, call: usize, status: i32) -> Self {
        self.init_failures.insert(call, status);
        self
    }

    /// Make the `call`-th deinit (counting from 1) report `status`. The
    /// driver is still torn down, as esp_camera_deinit frees everything
    /// before returning its status.
    pub fn with_deinit_failure(mut self, call: usize, status: i32) -> Self {
        self.deinit_failures.insert(call, status);
        self
    }

    /// Never deliver a frame.
    pub fn without_frames(self) -> Self {
        SimulatedDriver {
            frames_enabled: false,
            ..self
        }
    }

    pub fn with_failing_conversions(self) -> Self {
        SimulatedDriver {
            fail_conversions: true,
            ..self
        }
    }

    /// Time the sensor takes to fill a frame.
    pub fn with_frame_delay(self, frame_delay: Duration) -> Self {
        SimulatedDriver {
            frame_delay,
            ..self
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.config.is_some()
    }

    /// Configuration of the running driver.
    pub fn active_config(&self) -> Option<&DriverConfig> {
        self.config.as_ref()
    }

    /// Every configuration passed to `init`, successful or not.
    pub fn init_calls(&self) -> &[DriverConfig] {
        &self.init_log
    }

    pub fn deinit_calls(&self) -> usize {
        self.deinit_count
    }

    /// Frames handed out and not yet returned.
    pub fn outstanding_frames(&self) -> usize {
        self.outstanding
    }

    /// Highest number of frames ever out at the same time.
    pub fn max_outstanding_frames(&self) -> usize {
        self.max_outstanding
    }

    pub fn frames_captured(&self) -> u64 {
        self.sequence
    }

    fn running(&self) -> Result<&DriverConfig, Error> {
        self.config
            .as_ref()
            .ok_or_else(|| Error::InvalidState("camera driver is not initialized".to_string()))
    }

    fn control_exists(&self, control: Control) -> Result<(), Error> {
        if self.missing.contains(&control) {
            return Err(Error::Unsupported(format!("No attribute {}", control)));
        }
        Ok(())
    }

    fn fill_frame(&mut self, config: DriverConfig) -> SimulatedFrame {
        self.sequence += 1;
        let (width, height) = config.frame_size.resolution();
        let pixels = (width * height) as usize;
        let data = match config.pixel_format {
            PixelFormat::Jpeg => fake_jpeg(pixels, config.jpeg_quality, self.sequence),
            PixelFormat::Yuv420 => pattern(pixels * 3 / 2, self.sequence),
            PixelFormat::Raw => pattern(pixels, self.sequence),
            format => pattern(pixels * format.bytes_per_pixel().unwrap_or(1), self.sequence),
        };
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        SimulatedFrame {
            data,
            width,
            height,
            format: config.pixel_format,
            timestamp: Timestamp::new(now.as_secs() as i64, now.subsec_nanos()),
            sequence: self.sequence,
        }
    }

    fn conversion(&self, what: &str) -> Result<(), Error> {
        if self.fail_conversions {
            return Err(Error::ConversionFailed(format!("{} failed", what)));
        }
        Ok(())
    }
}

fn pattern(len: usize, seed: u64) -> Vec<u8> {
    (0..len).map(|i| (i as u64).wrapping_add(seed) as u8).collect()
}

/// JPEG-shaped bytes whose size shrinks as the driver quality number grows.
fn fake_jpeg(pixels: usize, quality: u8, seed: u64) -> Vec<u8> {
    let body = (pixels / (4 + usize::from(quality))).max(16);
    let mut data = Vec::with_capacity(body + 4);
    data.extend_from_slice(&[0xFF, 0xD8]);
    data.extend((0..body).map(|i| ((i as u64).wrapping_mul(31).wrapping_add(seed) as u8) & 0x7F));
    data.extend_from_slice(&[0xFF, 0xD9]);
    data
}

fn bmp_header(width: u32, height: u32, image_len: usize) -> [u8; BMP_HEADER_LEN] {
    let mut header = [0u8; BMP_HEADER_LEN];
    let file_len = (BMP_HEADER_LEN + image_len) as u32;
    header[0..2].copy_from_slice(b"BM");
    header[2..6].copy_from_slice(&file_len.to_le_bytes());
    header[10..14].copy_from_slice(&(BMP_HEADER_LEN as u32).to_le_bytes());
    header[14..18].copy_from_slice(&40u32.to_le_bytes());
    header[18..22].copy_from_slice(&(width as i32).to_le_bytes());
    // negative height stores rows top down
    header[22..26].copy_from_slice(&(-(height as i32)).to_le_bytes());
    header[26..28].copy_from_slice(&1u16.to_le_bytes());
    header[28..30].copy_from_slice(&24u16.to_le_bytes());
    header[34..38].copy_from_slice(&(image_len as u32).to_le_bytes());
    header
}

impl Driver for SimulatedDriver {
    type Frame = SimulatedFrame;

    fn init(&mut self, config: &DriverConfig) -> Result<(), Error> {
        self.init_log.push(*config);
        if self.config.is_some() {
            return Err(Error::InvalidState(
                "camera driver is already initialized".to_string(),
            ));
        }
        if let Some(&status) = self.init_failures.get(&self.init_log.len()) {
            return Err(Error::from_status(status).unwrap_or(Error::Unknown(status)));
        }
        if config.pixel_format == PixelFormat::Jpeg && !self.sensor.supports_jpeg {
            return Err(Error::Unsupported(format!(
                "{} has no JPEG encoder",
                self.sensor.name
            )));
        }
        self.controls.insert(Control::Quality, i32::from(config.jpeg_quality));
        self.config = Some(*config);
        log::debug!(
            "simulated camera up: {} {} fb_count {}",
            config.frame_size,
            config.pixel_format,
            config.fb_count
        );
        Ok(())
    }

    fn deinit(&mut self) -> Result<(), Error> {
        self.deinit_count += 1;
        self.running()?;
        self.config = None;
        self.outstanding = 0;
        match self.deinit_failures.get(&self.deinit_count) {
            Some(&status) => Err(Error::from_status(status).unwrap_or(Error::Unknown(status))),
            None => Ok(()),
        }
    }

    fn get_frame(&mut self, timeout: Duration) -> Result<Option<SimulatedFrame>, Error> {
        let config = *self.running()?;
        // Nothing will ever arrive, so there is no point waiting out the
        // timeout.
        if !self.frames_enabled || self.outstanding >= usize::from(config.fb_count) {
            return Ok(None);
        }
        if self.frame_delay > timeout {
            thread::sleep(timeout);
            return Ok(None);
        }
        if !self.frame_delay.is_zero() {
            thread::sleep(self.frame_delay);
        }
        self.outstanding += 1;
        self.max_outstanding = self.max_outstanding.max(self.outstanding);
        Ok(Some(self.fill_frame(config)))
    }

    fn return_frame(&mut self, frame: SimulatedFrame) {
        log::trace!("simulated frame {} returned", frame.sequence);
        self.outstanding = self.outstanding.saturating_sub(1);
    }

    fn frame_available(&self) -> Result<bool, Error> {
        let config = self.running()?;
        Ok(self.frames_enabled && self.outstanding < usize::from(config.fb_count))
    }

    fn sensor_info(&self) -> Result<SensorInfo, Error> {
        if self.config.is_none() {
            return Err(Error::NotFound);
        }
        Ok(self.sensor.clone())
    }

    fn get_control(&self, control: Control) -> Result<i32, Error> {
        self.running()?;
        self.control_exists(control)?;
        Ok(self.controls.get(&control).copied().unwrap_or(0))
    }

    fn set_control(&mut self, control: Control, value: i32) -> Result<(), Error> {
        self.running()?;
        self.control_exists(control)?;
        if control == Control::GainCeiling
            && u32::try_from(value)
                .ok()
                .and_then(GainCeiling::from_raw)
                .is_none()
        {
            return Err(Error::InvalidArgument(format!(
                "Invalid setting for {}",
                control
            )));
        }
        if !self.stuck.contains(&control) {
            self.controls.insert(control, value);
        }
        Ok(())
    }
}

impl Converter for SimulatedDriver {
    fn encode_jpeg(&self, frame: &SimulatedFrame, quality: u8) -> Result<Vec<u8>, Error> {
        self.conversion("JPEG compression")?;
        if frame.format.is_compressed() {
            return Ok(frame.data.clone());
        }
        Ok(fake_jpeg(
            (frame.width * frame.height) as usize,
            quality,
            frame.sequence,
        ))
    }

    fn to_rgb888(&self, frame: &SimulatedFrame, out: &mut [u8]) -> Result<(), Error> {
        self.conversion("RGB888 conversion")?;
        let pixels = (frame.width * frame.height) as usize;
        if out.len() != pixels * 3 {
            return Err(Error::InvalidArgument(format!(
                "RGB888 buffer holds {} bytes, need {}",
                out.len(),
                pixels * 3
            )));
        }
        let step = frame.format.bytes_per_pixel().unwrap_or(1);
        for (i, px) in out.chunks_exact_mut(3).enumerate() {
            let value = frame.data.get(i * step).copied().unwrap_or(0x80);
            px.fill(value);
        }
        Ok(())
    }

    fn decode_jpeg_rgb565(&self, frame: &SimulatedFrame, out: &mut [u8]) -> Result<(), Error> {
        self.conversion("JPEG decode")?;
        if frame.format != PixelFormat::Jpeg {
            return Err(Error::ConversionFailed(
                "JPEG decode failed: frame is not JPEG".to_string(),
            ));
        }
        let pixels = (frame.width * frame.height) as usize;
        if out.len() != pixels * 2 {
            return Err(Error::InvalidArgument(format!(
                "RGB565 buffer holds {} bytes, need {}",
                out.len(),
                pixels * 2
            )));
        }
        out.copy_from_slice(&pattern(out.len(), frame.sequence));
        Ok(())
    }

    fn wrap_bmp(&self, frame: &SimulatedFrame) -> Result<Vec<u8>, Error> {
        self.conversion("BMP conversion")?;
        let mut pixels = allocate((frame.width * frame.height) as usize * 3)?;
        self.to_rgb888(frame, &mut pixels)?;
        let mut out = allocate(BMP_HEADER_LEN)?;
        out.copy_from_slice(&bmp_header(frame.width, frame.height, pixels.len()));
        out.extend_from_slice(&pixels);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{board::Board, format::GrabMode};

    fn config(format: PixelFormat, fb_count: u8) -> DriverConfig {
        DriverConfig {
            pins: Board::AiThinker.pins(),
            xclk_freq_hz: 20_000_000,
            pixel_format: format,
            frame_size: FrameSize::Qvga,
            jpeg_quality: 9,
            fb_count,
            grab_mode: GrabMode::WhenEmpty,
            sccb_port: -1,
        }
    }

    #[test]
    fn test_lifecycle_order() {
        let mut driver = SimulatedDriver::new();
        assert!(matches!(driver.deinit(), Err(Error::InvalidState(_))));
        driver.init(&config(PixelFormat::Rgb565, 1)).unwrap();
        assert!(matches!(
            driver.init(&config(PixelFormat::Rgb565, 1)),
            Err(Error::InvalidState(_))
        ));
        driver.deinit().unwrap();
        assert_eq!(driver.init_calls().len(), 2);
        assert_eq!(driver.deinit_calls(), 2);
    }

    #[test]
    fn test_frame_slots() {
        let mut driver = SimulatedDriver::new();
        driver.init(&config(PixelFormat::Rgb565, 1)).unwrap();
        let timeout = Duration::from_millis(5);

        let first = driver.get_frame(timeout).unwrap().unwrap();
        assert_eq!(first.len(), 320 * 240 * 2);
        assert!(!driver.frame_available().unwrap());
        assert!(driver.get_frame(timeout).unwrap().is_none());

        driver.return_frame(first);
        assert!(driver.frame_available().unwrap());
        let second = driver.get_frame(timeout).unwrap().unwrap();
        assert_eq!(second.sequence(), 2);
    }

    #[test]
    fn test_init_failure() {
        let mut driver = SimulatedDriver::new().with_init_failure(1, 0x20001);
        assert!(matches!(
            driver.init(&config(PixelFormat::Rgb565, 1)),
            Err(Error::NotFound)
        ));
        assert!(!driver.is_initialized());
        driver.init(&config(PixelFormat::Rgb565, 1)).unwrap();
    }

    #[test]
    fn test_deinit_failure() {
        let mut driver = SimulatedDriver::new().with_deinit_failure(1, espcam_sys::ESP_FAIL);
        driver.init(&config(PixelFormat::Rgb565, 1)).unwrap();
        assert!(matches!(driver.deinit(), Err(Error::Unknown(-1))));
        assert!(!driver.is_initialized());
        driver.init(&config(PixelFormat::Rgb565, 1)).unwrap();
        driver.deinit().unwrap();
    }

    #[test]
    fn test_controls() {
        let mut driver = SimulatedDriver::new()
            .without_control(Control::Lenc)
            .with_stuck_control(Control::Dcw);
        driver.init(&config(PixelFormat::Jpeg, 1)).unwrap();

        assert_eq!(driver.get_control(Control::Quality).unwrap(), 9);
        driver.set_control(Control::Contrast, 2).unwrap();
        assert_eq!(driver.get_control(Control::Contrast).unwrap(), 2);
        assert!(matches!(
            driver.set_control(Control::Lenc, 1),
            Err(Error::Unsupported(_))
        ));
        driver.set_control(Control::Dcw, 1).unwrap();
        assert_eq!(driver.get_control(Control::Dcw).unwrap(), 0);
        assert!(matches!(
            driver.set_control(Control::GainCeiling, 9),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_frame_delay_timeout() {
        let mut driver = SimulatedDriver::new().with_frame_delay(Duration::from_millis(50));
        driver.init(&config(PixelFormat::Jpeg, 1)).unwrap();
        assert!(driver.get_frame(Duration::from_millis(5)).unwrap().is_none());
        assert!(driver.get_frame(Duration::from_millis(500)).unwrap().is_some());
    }

    #[test]
    fn test_encode_jpeg_passes_through() {
        let mut driver = SimulatedDriver::new();
        driver.init(&config(PixelFormat::Jpeg, 1)).unwrap();
        let frame = driver.get_frame(Duration::from_millis(5)).unwrap().unwrap();
        assert_eq!(driver.encode_jpeg(&frame, 40).unwrap(), frame.data);
        driver.return_frame(frame);
    }

    #[test]
    fn test_custom_sensor() {
        let mut driver = SimulatedDriver::new().with_sensor(SensorInfo {
            name: "OV3660".to_string(),
            sccb_address: 0x3c,
            pid: 0x3660,
            max_frame_size: FrameSize::Qxga,
            supports_jpeg: true,
        });
        assert!(matches!(driver.sensor_info(), Err(Error::NotFound)));
        driver.init(&config(PixelFormat::Jpeg, 1)).unwrap();
        let info = driver.sensor_info().unwrap();
        assert_eq!(info.name, "OV3660");
        assert_eq!(info.max_frame_size, FrameSize::Qxga);
    }

    #[test]
    fn test_no_jpeg_sensor() {
        let mut driver = SimulatedDriver::new().without_jpeg();
        assert!(matches!(
            driver.init(&config(PixelFormat::Jpeg, 1)),
            Err(Error::Unsupported(_))
        ));
    }
}
