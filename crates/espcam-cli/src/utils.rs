// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

use crate::error::CliError;
use clap::Args as ClapArgs;
use espcam::{
    board::Board,
    config::{CameraConfig, CameraConfigBuilder},
    device::CameraDevice,
    driver::Driver,
    format::{FrameSize, GrabMode, PixelFormat},
    registry::DeviceRegistry,
    Error,
};
use serde_json::{Map, Value};
use signal_hook::consts::SIGINT;
use signal_hook::flag;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

/// Options shared by every subcommand
#[derive(Debug, Clone)]
pub struct Global {
    pub json: bool,
    pub simulate: bool,
    pub board: Option<String>,
}

/// Camera settings accepted by the subcommands that open a camera
#[derive(ClapArgs, Debug, Clone, Default)]
pub struct CameraArgs {
    /// Pixel format (JPEG, RGB565, YUV422, GRAYSCALE, RGB888, ...)
    #[arg(long, value_parser = parse_named::<PixelFormat>)]
    pub pixel_format: Option<PixelFormat>,

    /// Frame size (QVGA, VGA, SVGA, UXGA, ...)
    #[arg(long, value_parser = parse_named::<FrameSize>)]
    pub frame_size: Option<FrameSize>,

    /// JPEG quality, 0 (worst) to 100 (best)
    #[arg(long)]
    pub jpeg_quality: Option<i64>,

    /// Number of frame buffers (1-2)
    #[arg(long)]
    pub fb_count: Option<i64>,

    /// Frame buffer grab mode (WHEN_EMPTY or LATEST)
    #[arg(long, value_parser = parse_named::<GrabMode>)]
    pub grab_mode: Option<GrabMode>,

    /// XCLK frequency in Hz (values below 1000 are taken as MHz)
    #[arg(long)]
    pub xclk_freq: Option<i64>,
}

impl CameraArgs {
    /// Apply the given settings on top of the board defaults
    pub fn config(&self, board: Board) -> Result<CameraConfig, CliError> {
        let mut builder = CameraConfigBuilder::new(board.defaults());
        if let Some(format) = self.pixel_format {
            builder = builder.with_pixel_format(format);
        }
        if let Some(size) = self.frame_size {
            builder = builder.with_frame_size(size);
        }
        if let Some(quality) = self.jpeg_quality {
            builder = builder.with_jpeg_quality(quality);
        }
        if let Some(count) = self.fb_count {
            builder = builder.with_fb_count(count);
        }
        if let Some(mode) = self.grab_mode {
            builder = builder.with_grab_mode(mode);
        }
        if let Some(freq) = self.xclk_freq {
            builder = builder.with_xclk_freq(freq);
        }
        Ok(builder.build()?)
    }

    /// The same settings as binding keyword arguments
    pub fn kwargs(&self) -> Map<String, Value> {
        let mut kwargs = Map::new();
        if let Some(format) = self.pixel_format {
            kwargs.insert("pixel_format".into(), Value::from(format.name()));
        }
        if let Some(size) = self.frame_size {
            kwargs.insert("frame_size".into(), Value::from(size.name()));
        }
        if let Some(quality) = self.jpeg_quality {
            kwargs.insert("jpeg_quality".into(), Value::from(quality));
        }
        if let Some(count) = self.fb_count {
            kwargs.insert("fb_count".into(), Value::from(count));
        }
        if let Some(mode) = self.grab_mode {
            kwargs.insert("grab_mode".into(), Value::from(mode.name()));
        }
        if let Some(freq) = self.xclk_freq {
            kwargs.insert("xclk_freq".into(), Value::from(freq));
        }
        kwargs
    }
}

/// Parse a closed-set value by its constant name (case-insensitive)
pub fn parse_named<T: FromStr<Err = Error>>(s: &str) -> Result<T, String> {
    s.parse::<T>().map_err(|err| err.to_string())
}

/// Resolve the board from `--board`, the build-time selection, or the
/// AI-Thinker wiring when simulating.
pub fn resolve_board(global: &Global) -> Result<Board, CliError> {
    if let Some(name) = &global.board {
        return Ok(name.parse::<Board>()?);
    }
    if let Some(board) = Board::selected() {
        return Ok(board);
    }
    if global.simulate {
        log::debug!("No board selected, simulating {}", Board::AiThinker);
        return Ok(Board::AiThinker);
    }
    Err(CliError::InvalidArgs(
        "no board selected (use --board or build with ESPCAM_BOARD)".to_string(),
    ))
}

/// Create a camera on `registry` and bring it up
pub fn open_camera<D: Driver>(
    driver: D,
    registry: &DeviceRegistry,
    config: CameraConfig,
) -> Result<CameraDevice<'_, D>, CliError> {
    let mut camera = CameraDevice::new(driver, registry, config);
    camera.init()?;
    log::info!(
        "Camera ready: {} {} {}x{}",
        camera.sensor_name()?,
        camera.config().pixel_format(),
        camera.pixel_width()?,
        camera.pixel_height()?
    );
    Ok(camera)
}

/// Path for the `index`-th of several frames: `frame.jpg` becomes
/// `frame_0003.jpg`.
pub fn numbered_path(path: &Path, index: u32) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "frame".to_string());
    let name = match path.extension() {
        Some(ext) => format!("{}_{:04}.{}", stem, index, ext.to_string_lossy()),
        None => format!("{}_{:04}", stem, index),
    };
    path.with_file_name(name)
}

/// Install signal handler for graceful shutdown on Ctrl+C
///
/// Returns an Arc<AtomicBool> that will be set to true when SIGINT is received.
/// Check this flag periodically in your main loop to exit gracefully.
pub fn install_signal_handler() -> Result<Arc<AtomicBool>, CliError> {
    let term = Arc::new(AtomicBool::new(false));

    flag::register(SIGINT, Arc::clone(&term))
        .map_err(|e| CliError::General(format!("Failed to register signal handler: {}", e)))?;

    log::debug!("Installed SIGINT handler");
    Ok(term)
}
