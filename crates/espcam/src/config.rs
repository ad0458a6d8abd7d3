// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

//! Validated camera configuration.
//!
//! [`CameraConfigBuilder`] collects the options a caller cares about, fills
//! the rest from the board defaults, and checks everything before any
//! hardware is touched. The resulting [`CameraConfig`] keeps the JPEG
//! quality on the 0-100 scale callers use; the driver's inverted 0-63 scale
//! only appears in [`CameraConfig::driver_config`].

use crate::{
    board::{Board, BoardDefaults, Chip, PinMap, UNUSED_PIN},
    driver::DriverConfig,
    format::{FrameSize, GrabMode, PixelFormat},
    Error,
};
use std::fmt;

/// Highest API-facing JPEG quality.
pub const MAX_JPEG_QUALITY: u8 = 100;

/// Worst quality on the driver's scale.
pub const DRIVER_QUALITY_WORST: u8 = 63;

pub const MIN_FB_COUNT: u8 = 1;
pub const MAX_FB_COUNT: u8 = 2;

/// Linear map of `value` from `[in_min, in_max]` onto `[out_min, out_max]`,
/// rounded to the nearest integer. The output range may be inverted.
pub fn round_linear_map(value: i32, in_min: i32, in_max: i32, out_min: i32, out_max: i32) -> i32 {
    let span = f64::from(in_max - in_min);
    let scaled =
        f64::from(value - in_min) * f64::from(out_max - out_min) / span + f64::from(out_min);
    scaled.round() as i32
}

/// Translate API quality (0 worst, 100 best) to the driver scale (63 worst,
/// 0 best).
pub fn quality_to_driver(quality: u8) -> u8 {
    let mapped = round_linear_map(
        i32::from(quality.min(MAX_JPEG_QUALITY)),
        0,
        i32::from(MAX_JPEG_QUALITY),
        i32::from(DRIVER_QUALITY_WORST),
        0,
    );
    mapped.clamp(0, i32::from(DRIVER_QUALITY_WORST)) as u8
}

/// Non-fatal adjustments made on the caller's behalf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// The requested frame size is larger than the sensor can deliver.
    FrameSizeClamped {
        requested: FrameSize,
        applied: FrameSize,
    },
    /// fb_count outside 1..=2.
    FbCountClamped { requested: i64, applied: u8 },
    /// The sensor accepted a value but reads back something else.
    PropertyNotApplied {
        property: &'static str,
        requested: i32,
        actual: i32,
    },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Warning::FrameSizeClamped { requested, applied } => write!(
                f,
                "Frame size {} exceeds sensor maximum, using {}",
                requested, applied
            ),
            Warning::FbCountClamped { requested, applied } => write!(
                f,
                "fb_count {} out of range {}-{}, using {}",
                requested, MIN_FB_COUNT, MAX_FB_COUNT, applied
            ),
            Warning::PropertyNotApplied {
                property,
                requested,
                actual,
            } => write!(
                f,
                "Failed to set {}: requested {}, sensor reports {}",
                property, requested, actual
            ),
        }
    }
}

impl Warning {
    /// Log the warning and queue it.
    pub(crate) fn raise(self, sink: &mut Vec<Warning>) {
        log::warn!("{}", self);
        sink.push(self);
    }
}

/// Clamp a frame buffer count into 1..=2.
pub(crate) fn clamp_fb_count(requested: i64, warnings: &mut Vec<Warning>) -> u8 {
    let applied = requested.clamp(i64::from(MIN_FB_COUNT), i64::from(MAX_FB_COUNT)) as u8;
    if i64::from(applied) != requested {
        Warning::FbCountClamped { requested, applied }.raise(warnings);
    }
    applied
}

/// Complete, validated camera configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraConfig {
    chip: Chip,
    pins: PinMap,
    xclk_freq_hz: u32,
    pixel_format: PixelFormat,
    frame_size: FrameSize,
    jpeg_quality: u8,
    fb_count: u8,
    grab_mode: GrabMode,
    sccb_port: i32,
}

impl CameraConfig {
    /// Builder seeded with the defaults of the board selected at build time.
    pub fn builder() -> CameraConfigBuilder {
        CameraConfigBuilder::new(Board::selected_defaults())
    }

    pub fn chip(&self) -> Chip {
        self.chip
    }

    pub fn pins(&self) -> &PinMap {
        &self.pins
    }

    pub fn xclk_freq_hz(&self) -> u32 {
        self.xclk_freq_hz
    }

    pub fn pixel_format(&self) -> PixelFormat {
        self.pixel_format
    }

    pub fn frame_size(&self) -> FrameSize {
        self.frame_size
    }

    /// API-facing quality, 0 worst to 100 best.
    pub fn jpeg_quality(&self) -> u8 {
        self.jpeg_quality
    }

    /// Quality on the driver's 0-63 scale.
    pub fn driver_quality(&self) -> u8 {
        quality_to_driver(self.jpeg_quality)
    }

    pub fn fb_count(&self) -> u8 {
        self.fb_count
    }

    pub fn grab_mode(&self) -> GrabMode {
        self.grab_mode
    }

    pub fn sccb_port(&self) -> i32 {
        self.sccb_port
    }

    /// Driver view of this configuration.
    pub fn driver_config(&self) -> DriverConfig {
        DriverConfig {
            pins: self.pins,
            xclk_freq_hz: self.xclk_freq_hz,
            pixel_format: self.pixel_format,
            frame_size: self.frame_size,
            jpeg_quality: self.driver_quality(),
            fb_count: self.fb_count,
            grab_mode: self.grab_mode,
            sccb_port: self.sccb_port,
        }
    }

    pub(crate) fn set_jpeg_quality(&mut self, quality: u8) -> Result<(), Error> {
        if quality > MAX_JPEG_QUALITY {
            return Err(Error::InvalidArgument(format!(
                "jpeg quality must be in range 0-{}",
                MAX_JPEG_QUALITY
            )));
        }
        self.jpeg_quality = quality;
        Ok(())
    }

    pub(crate) fn apply(
        &mut self,
        frame_size: FrameSize,
        pixel_format: PixelFormat,
        grab_mode: GrabMode,
        fb_count: u8,
    ) {
        self.frame_size = frame_size;
        self.pixel_format = pixel_format;
        self.grab_mode = grab_mode;
        self.fb_count = fb_count;
    }
}

/// Collects camera options; anything left unset comes from the board
/// defaults.
#[derive(Debug, Clone)]
pub struct CameraConfigBuilder {
    defaults: BoardDefaults,
    data_pins: Option<Vec<i32>>,
    xclk_pin: Option<i32>,
    pclk_pin: Option<i32>,
    vsync_pin: Option<i32>,
    href_pin: Option<i32>,
    pwdn_pin: Option<i32>,
    reset_pin: Option<i32>,
    sda_pin: Option<i32>,
    scl_pin: Option<i32>,
    sccb_port: Option<i32>,
    xclk_freq: Option<i64>,
    pixel_format: Option<PixelFormat>,
    frame_size: Option<FrameSize>,
    jpeg_quality: Option<i64>,
    fb_count: Option<i64>,
    grab_mode: Option<GrabMode>,
}

impl Default for CameraConfigBuilder {
    fn default() -> Self {
        CameraConfig::builder()
    }
}

impl CameraConfigBuilder {
    pub fn new(defaults: BoardDefaults) -> Self {
        CameraConfigBuilder {
            defaults,
            data_pins: None,
            xclk_pin: None,
            pclk_pin: None,
            vsync_pin: None,
            href_pin: None,
            pwdn_pin: None,
            reset_pin: None,
            sda_pin: None,
            scl_pin: None,
            sccb_port: None,
            xclk_freq: None,
            pixel_format: None,
            frame_size: None,
            jpeg_quality: None,
            fb_count: None,
            grab_mode: None,
        }
    }

    /// Replace the defaults with those of `board`.
    pub fn with_board(self, board: Board) -> Self {
        CameraConfigBuilder {
            defaults: board.defaults(),
            ..self
        }
    }

    /// D0 through D7. Must hold exactly eight pins.
    pub fn with_data_pins(self, pins: &[i32]) -> Self {
        CameraConfigBuilder {
            data_pins: Some(pins.to_vec()),
            ..self
        }
    }

    pub fn with_xclk_pin(self, pin: i32) -> Self {
        CameraConfigBuilder {
            xclk_pin: Some(pin),
            ..self
        }
    }

    pub fn with_pclk_pin(self, pin: i32) -> Self {
        CameraConfigBuilder {
            pclk_pin: Some(pin),
            ..self
        }
    }

    pub fn with_vsync_pin(self, pin: i32) -> Self {
        CameraConfigBuilder {
            vsync_pin: Some(pin),
            ..self
        }
    }

    pub fn with_href_pin(self, pin: i32) -> Self {
        CameraConfigBuilder {
            href_pin: Some(pin),
            ..self
        }
    }

    pub fn with_powerdown_pin(self, pin: i32) -> Self {
        CameraConfigBuilder {
            pwdn_pin: Some(pin),
            ..self
        }
    }

    pub fn with_reset_pin(self, pin: i32) -> Self {
        CameraConfigBuilder {
            reset_pin: Some(pin),
            ..self
        }
    }

    pub fn with_sda_pin(self, pin: i32) -> Self {
        CameraConfigBuilder {
            sda_pin: Some(pin),
            ..self
        }
    }

    pub fn with_scl_pin(self, pin: i32) -> Self {
        CameraConfigBuilder {
            scl_pin: Some(pin),
            ..self
        }
    }

    /// Use an SCCB bus already set up on this I2C port instead of SDA/SCL
    /// pins.
    pub fn with_sccb_port(self, port: i32) -> Self {
        CameraConfigBuilder {
            sccb_port: Some(port),
            ..self
        }
    }

    /// XCLK frequency. Values below 1000 are taken as MHz.
    pub fn with_xclk_freq(self, freq: i64) -> Self {
        CameraConfigBuilder {
            xclk_freq: Some(freq),
            ..self
        }
    }

    pub fn with_pixel_format(self, format: PixelFormat) -> Self {
        CameraConfigBuilder {
            pixel_format: Some(format),
            ..self
        }
    }

    pub fn with_frame_size(self, size: FrameSize) -> Self {
        CameraConfigBuilder {
            frame_size: Some(size),
            ..self
        }
    }

    /// JPEG quality from 0 (worst) to 100 (best).
    pub fn with_jpeg_quality(self, quality: i64) -> Self {
        CameraConfigBuilder {
            jpeg_quality: Some(quality),
            ..self
        }
    }

    pub fn with_fb_count(self, count: i64) -> Self {
        CameraConfigBuilder {
            fb_count: Some(count),
            ..self
        }
    }

    pub fn with_grab_mode(self, mode: GrabMode) -> Self {
        CameraConfigBuilder {
            grab_mode: Some(mode),
            ..self
        }
    }

    /// Validate and build, logging and discarding any warnings.
    pub fn build(self) -> Result<CameraConfig, Error> {
        self.build_with_warnings().map(|(config, _)| config)
    }

    /// Validate and build, returning the adjustments that were made.
    pub fn build_with_warnings(self) -> Result<(CameraConfig, Vec<Warning>), Error> {
        let mut warnings = Vec::new();
        let defaults = self.defaults;
        let board_pins = defaults.pins;

        let data = match &self.data_pins {
            Some(pins) => <[i32; 8]>::try_from(pins.as_slice()).map_err(|_| {
                Error::InvalidArgument(format!("data_pins must have 8 elements, got {}", pins.len()))
            })?,
            None => match board_pins {
                Some(pins) => pins.data,
                None => {
                    return Err(Error::InvalidArgument(
                        "Specify a valid camera configuration: data_pins is required".to_string(),
                    ))
                }
            },
        };

        let required = |given: Option<i32>, name: &str, board: Option<i32>| {
            given.or(board).ok_or_else(|| {
                Error::InvalidArgument(format!(
                    "Specify a valid camera configuration: {} is required",
                    name
                ))
            })
        };
        let xclk = required(self.xclk_pin, "xclk_pin", board_pins.map(|p| p.xclk))?;
        let pclk = required(self.pclk_pin, "pclk_pin", board_pins.map(|p| p.pclk))?;
        let vsync = required(self.vsync_pin, "vsync_pin", board_pins.map(|p| p.vsync))?;
        let href = required(self.href_pin, "href_pin", board_pins.map(|p| p.href))?;
        let pwdn = self
            .pwdn_pin
            .or(board_pins.map(|p| p.pwdn))
            .unwrap_or(UNUSED_PIN);
        let reset = self
            .reset_pin
            .or(board_pins.map(|p| p.reset))
            .unwrap_or(UNUSED_PIN);
        let sda = self
            .sda_pin
            .or(board_pins.map(|p| p.sda))
            .unwrap_or(UNUSED_PIN);
        let scl = self
            .scl_pin
            .or(board_pins.map(|p| p.scl))
            .unwrap_or(UNUSED_PIN);
        let sccb_port = self.sccb_port.unwrap_or(UNUSED_PIN);
        if sccb_port < 0 && (sda == UNUSED_PIN || scl == UNUSED_PIN) {
            return Err(Error::InvalidArgument(
                "Either sccb_port or sda_pin/scl_pin must be specified".to_string(),
            ));
        }

        let xclk_freq_hz = validate_xclk(
            self.xclk_freq
                .unwrap_or(i64::from(defaults.xclk_freq_hz)),
            defaults.chip,
        )?;

        let jpeg_quality = match self.jpeg_quality {
            Some(q) if (0..=i64::from(MAX_JPEG_QUALITY)).contains(&q) => q as u8,
            Some(_) => {
                return Err(Error::InvalidArgument(format!(
                    "jpeg quality must be in range 0-{}",
                    MAX_JPEG_QUALITY
                )))
            }
            None => defaults.jpeg_quality,
        };

        let fb_count = clamp_fb_count(
            self.fb_count.unwrap_or(i64::from(defaults.fb_count)),
            &mut warnings,
        );

        let config = CameraConfig {
            chip: defaults.chip,
            pins: PinMap {
                data,
                xclk,
                pclk,
                vsync,
                href,
                pwdn,
                reset,
                sda,
                scl,
            },
            xclk_freq_hz,
            pixel_format: self.pixel_format.unwrap_or(defaults.pixel_format),
            frame_size: self.frame_size.unwrap_or(defaults.frame_size),
            jpeg_quality,
            fb_count,
            grab_mode: self.grab_mode.unwrap_or(defaults.grab_mode),
            sccb_port,
        };
        Ok((config, warnings))
    }
}

/// Values below 1000 are MHz; anything else is Hz.
fn validate_xclk(freq: i64, chip: Chip) -> Result<u32, Error> {
    if freq <= 0 {
        return Err(Error::InvalidArgument(format!(
            "xclk_freq must be positive, got {}",
            freq
        )));
    }
    let hz = if freq < 1000 { freq * 1_000_000 } else { freq };
    let max = chip.max_xclk_hz();
    if hz > i64::from(max) {
        return Err(Error::InvalidArgument(format!(
            "xclk_freq {} Hz exceeds the {} maximum of {} Hz",
            hz, chip, max
        )));
    }
    Ok(hz as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::BoardDefaults;

    fn ai_thinker() -> CameraConfigBuilder {
        CameraConfigBuilder::new(Board::AiThinker.defaults())
    }

    #[test]
    fn test_quality_map_endpoints() {
        assert_eq!(quality_to_driver(0), 63);
        assert_eq!(quality_to_driver(100), 0);
        assert!(matches!(quality_to_driver(50), 31 | 32));
        assert_eq!(round_linear_map(85, 0, 100, 63, 0), 9);
    }

    #[test]
    fn test_quality_map_monotonic() {
        for q in 0..MAX_JPEG_QUALITY {
            assert!(quality_to_driver(q) >= quality_to_driver(q + 1));
        }
    }

    #[test]
    fn test_board_defaults() {
        let config = ai_thinker().build().unwrap();
        assert_eq!(config.pins(), &Board::AiThinker.pins());
        assert_eq!(config.frame_size(), FrameSize::Qvga);
        assert_eq!(config.pixel_format(), PixelFormat::Rgb565);
        assert_eq!(config.grab_mode(), GrabMode::WhenEmpty);
        assert_eq!(config.jpeg_quality(), 85);
        assert_eq!(config.fb_count(), 1);
        assert_eq!(config.xclk_freq_hz(), 20_000_000);
        assert_eq!(config.sccb_port(), -1);
    }

    #[test]
    fn test_driver_config_translates_quality() {
        let config = ai_thinker().with_jpeg_quality(100).build().unwrap();
        assert_eq!(config.jpeg_quality(), 100);
        assert_eq!(config.driver_config().jpeg_quality, 0);
    }

    #[test]
    fn test_xclk_mhz_heuristic() {
        let config = ai_thinker().with_xclk_freq(10).build().unwrap();
        assert_eq!(config.xclk_freq_hz(), 10_000_000);

        let config = ai_thinker().with_xclk_freq(16_000_000).build().unwrap();
        assert_eq!(config.xclk_freq_hz(), 16_000_000);
    }

    #[test]
    fn test_xclk_ceiling() {
        assert!(matches!(
            ai_thinker().with_xclk_freq(24).build(),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            ai_thinker().with_xclk_freq(0).build(),
            Err(Error::InvalidArgument(_))
        ));

        let s3 = CameraConfigBuilder::new(Board::XiaoEsp32S3.defaults())
            .with_xclk_freq(40)
            .build()
            .unwrap();
        assert_eq!(s3.xclk_freq_hz(), 40_000_000);
    }

    #[test]
    fn test_jpeg_quality_range() {
        assert!(ai_thinker().with_jpeg_quality(0).build().is_ok());
        assert!(matches!(
            ai_thinker().with_jpeg_quality(101).build(),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            ai_thinker().with_jpeg_quality(-1).build(),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_fb_count_clamped() {
        let (config, warnings) = ai_thinker().with_fb_count(5).build_with_warnings().unwrap();
        assert_eq!(config.fb_count(), 2);
        assert_eq!(
            warnings,
            vec![Warning::FbCountClamped {
                requested: 5,
                applied: 2
            }]
        );

        let (config, warnings) = ai_thinker().with_fb_count(0).build_with_warnings().unwrap();
        assert_eq!(config.fb_count(), 1);
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_data_pins_length() {
        let result = ai_thinker().with_data_pins(&[1, 2, 3]).build();
        assert!(matches!(result, Err(Error::InvalidArgument(_))));

        let pins = [1, 2, 3, 4, 5, 6, 7, 8];
        let config = ai_thinker().with_data_pins(&pins).build().unwrap();
        assert_eq!(config.pins().data, pins);
    }

    #[test]
    fn test_generic_requires_pins() {
        let result = CameraConfigBuilder::new(BoardDefaults::generic()).build();
        assert!(matches!(result, Err(Error::InvalidArgument(_))));

        let no_sccb = CameraConfigBuilder::new(BoardDefaults::generic())
            .with_data_pins(&[5, 18, 19, 21, 36, 39, 34, 35])
            .with_xclk_pin(0)
            .with_pclk_pin(22)
            .with_vsync_pin(25)
            .with_href_pin(23);
        assert!(matches!(
            no_sccb.clone().build(),
            Err(Error::InvalidArgument(_))
        ));

        let config = no_sccb.with_sccb_port(1).build().unwrap();
        assert_eq!(config.sccb_port(), 1);
        assert_eq!(config.pins().sda, UNUSED_PIN);
        assert_eq!(config.pins().pwdn, UNUSED_PIN);
    }
}
