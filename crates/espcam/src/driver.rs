// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

//! Seam between the camera lifecycle and the driver that moves the pixels.
//!
//! [`Driver`] covers sensor bring-up, frame buffers and tuning controls.
//! [`Converter`] adds the image conversion entry points the capture pipeline
//! needs. [`crate::esp::EspDriver`] implements both over the esp32-camera
//! library and [`crate::simulated::SimulatedDriver`] implements both in
//! memory.

use crate::{
    board::PinMap,
    format::{FrameSize, GrabMode, PixelFormat},
    Error,
};
use serde::Serialize;
use std::{fmt, time::Duration};
use unix_ts::Timestamp;

/// Configuration in driver terms, with the JPEG quality already translated
/// to the driver's inverted 0-63 scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverConfig {
    pub pins: PinMap,
    pub xclk_freq_hz: u32,
    pub pixel_format: PixelFormat,
    pub frame_size: FrameSize,
    pub jpeg_quality: u8,
    pub fb_count: u8,
    pub grab_mode: GrabMode,
    /// SCCB I2C port, -1 to let the driver own the bus.
    pub sccb_port: i32,
}

/// Description of the detected sensor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SensorInfo {
    pub name: String,
    pub sccb_address: u8,
    pub pid: i32,
    pub max_frame_size: FrameSize,
    pub supports_jpeg: bool,
}

/// Sensor tuning controls, each backed by one setter in the driver's sensor
/// table and one field of the sensor status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Control {
    Contrast,
    Brightness,
    Saturation,
    Sharpness,
    Denoise,
    GainCeiling,
    Quality,
    Colorbar,
    Whitebal,
    GainCtrl,
    ExposureCtrl,
    Hmirror,
    Vflip,
    Aec2,
    AwbGain,
    AgcGain,
    AecValue,
    SpecialEffect,
    WbMode,
    AeLevel,
    Dcw,
    Bpc,
    Wpc,
    RawGma,
    Lenc,
}

impl Control {
    pub const ALL: &'static [Control] = &[
        Control::Contrast,
        Control::Brightness,
        Control::Saturation,
        Control::Sharpness,
        Control::Denoise,
        Control::GainCeiling,
        Control::Quality,
        Control::Colorbar,
        Control::Whitebal,
        Control::GainCtrl,
        Control::ExposureCtrl,
        Control::Hmirror,
        Control::Vflip,
        Control::Aec2,
        Control::AwbGain,
        Control::AgcGain,
        Control::AecValue,
        Control::SpecialEffect,
        Control::WbMode,
        Control::AeLevel,
        Control::Dcw,
        Control::Bpc,
        Control::Wpc,
        Control::RawGma,
        Control::Lenc,
    ];

    /// Name of the driver setter, used in error messages.
    pub fn setter(self) -> &'static str {
        match self {
            Control::Contrast => "set_contrast",
            Control::Brightness => "set_brightness",
            Control::Saturation => "set_saturation",
            Control::Sharpness => "set_sharpness",
            Control::Denoise => "set_denoise",
            Control::GainCeiling => "set_gainceiling",
            Control::Quality => "set_quality",
            Control::Colorbar => "set_colorbar",
            Control::Whitebal => "set_whitebal",
            Control::GainCtrl => "set_gain_ctrl",
            Control::ExposureCtrl => "set_exposure_ctrl",
            Control::Hmirror => "set_hmirror",
            Control::Vflip => "set_vflip",
            Control::Aec2 => "set_aec2",
            Control::AwbGain => "set_awb_gain",
            Control::AgcGain => "set_agc_gain",
            Control::AecValue => "set_aec_value",
            Control::SpecialEffect => "set_special_effect",
            Control::WbMode => "set_wb_mode",
            Control::AeLevel => "set_ae_level",
            Control::Dcw => "set_dcw",
            Control::Bpc => "set_bpc",
            Control::Wpc => "set_wpc",
            Control::RawGma => "set_raw_gma",
            Control::Lenc => "set_lenc",
        }
    }
}

impl fmt::Display for Control {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.setter().trim_start_matches("set_"))
    }
}

/// A filled frame buffer on loan from the driver.
pub trait RawFrame {
    fn data(&self) -> &[u8];
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    fn format(&self) -> PixelFormat;
    fn timestamp(&self) -> Timestamp;

    fn len(&self) -> usize {
        self.data().len()
    }

    fn is_empty(&self) -> bool {
        self.data().is_empty()
    }
}

/// Lifecycle, frame and sensor-control entry points of a camera driver.
///
/// The driver is not reentrant. Implementations may assume calls arrive
/// from one thread and in lifecycle order: `init`, any number of frame or
/// control calls, `deinit`.
pub trait Driver {
    type Frame: RawFrame;

    fn init(&mut self, config: &DriverConfig) -> Result<(), Error>;

    fn deinit(&mut self) -> Result<(), Error>;

    /// Wait up to `timeout` for a filled frame. `Ok(None)` means nothing
    /// arrived in time.
    fn get_frame(&mut self, timeout: Duration) -> Result<Option<Self::Frame>, Error>;

    /// Hand a frame back so its slot can be refilled.
    fn return_frame(&mut self, frame: Self::Frame);

    /// Whether a filled frame is waiting.
    fn frame_available(&self) -> Result<bool, Error>;

    fn sensor_info(&self) -> Result<SensorInfo, Error>;

    /// Current value of a control. `Unsupported` when the sensor has no
    /// setter for it.
    fn get_control(&self, control: Control) -> Result<i32, Error>;

    /// Apply a control value. `Unsupported` when the sensor has no setter,
    /// `InvalidArgument` when the setter rejects the value.
    fn set_control(&mut self, control: Control, value: i32) -> Result<(), Error>;
}

/// Image conversions provided alongside the driver.
pub trait Converter: Driver {
    /// Encode a frame as JPEG. `quality` is on the driver's 0-63 scale.
    fn encode_jpeg(&self, frame: &Self::Frame, quality: u8) -> Result<Vec<u8>, Error>;

    /// Expand a frame into `out`, which holds exactly `width * height * 3`
    /// bytes.
    fn to_rgb888(&self, frame: &Self::Frame, out: &mut [u8]) -> Result<(), Error>;

    /// Decode a JPEG frame at full scale into `out`, which holds exactly
    /// `width * height * 2` bytes.
    fn decode_jpeg_rgb565(&self, frame: &Self::Frame, out: &mut [u8]) -> Result<(), Error>;

    /// Wrap a frame in a BMP container.
    fn wrap_bmp(&self, frame: &Self::Frame) -> Result<Vec<u8>, Error>;
}
