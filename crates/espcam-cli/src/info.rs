// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

use crate::error::CliError;
use crate::utils::{self, CameraArgs, Global};
use clap::Args as ClapArgs;
use espcam::{
    board::{Board, Chip},
    config::CameraConfig,
    driver::{Driver, SensorInfo},
    esp::EspDriver,
    format::{FrameSize, GrabMode, PixelFormat},
    registry::DeviceRegistry,
    simulated::SimulatedDriver,
};
use serde::Serialize;

#[derive(ClapArgs, Debug)]
pub struct Args {
    #[command(flatten)]
    camera: CameraArgs,
}

#[derive(Debug, Serialize)]
struct InfoReport {
    version: &'static str,
    board: &'static str,
    chip: Chip,
    simulated: bool,
    sensor: SensorInfo,
    config: ConfigReport,
    warnings: Vec<String>,
}

#[derive(Debug, Serialize)]
struct ConfigReport {
    pixel_format: PixelFormat,
    frame_size: FrameSize,
    width: u32,
    height: u32,
    jpeg_quality: u8,
    driver_quality: u8,
    fb_count: u8,
    grab_mode: GrabMode,
    xclk_freq_hz: u32,
}

impl From<&CameraConfig> for ConfigReport {
    fn from(config: &CameraConfig) -> Self {
        let (width, height) = config.frame_size().resolution();
        ConfigReport {
            pixel_format: config.pixel_format(),
            frame_size: config.frame_size(),
            width,
            height,
            jpeg_quality: config.jpeg_quality(),
            driver_quality: config.driver_quality(),
            fb_count: config.fb_count(),
            grab_mode: config.grab_mode(),
            xclk_freq_hz: config.xclk_freq_hz(),
        }
    }
}

pub fn execute(args: Args, global: &Global) -> Result<(), CliError> {
    let board = utils::resolve_board(global)?;
    let config = args.camera.config(board)?;

    let report = if global.simulate {
        run(SimulatedDriver::new(), board, config, true)?
    } else {
        run(EspDriver::load()?, board, config, false)?
    };

    if global.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_text(&report);
    }
    Ok(())
}

fn run<D: Driver>(
    driver: D,
    board: Board,
    config: CameraConfig,
    simulated: bool,
) -> Result<InfoReport, CliError> {
    let registry = DeviceRegistry::new();
    let mut camera = utils::open_camera(driver, &registry, config)?;
    let report = InfoReport {
        version: espcam::version(),
        board: board.name(),
        chip: camera.config().chip(),
        simulated,
        sensor: camera.sensor_info()?,
        config: ConfigReport::from(camera.config()),
        warnings: camera
            .drain_warnings()
            .iter()
            .map(ToString::to_string)
            .collect(),
    };
    camera.deinit()?;
    Ok(report)
}

fn print_text(report: &InfoReport) {
    println!("espcam {}", report.version);
    println!(
        "Board:        {} ({}){}",
        report.board,
        report.chip,
        if report.simulated { " [simulated]" } else { "" }
    );
    println!("\nSensor:");
    println!("  Name:           {}", report.sensor.name);
    println!("  Product ID:     0x{:04x}", report.sensor.pid);
    println!("  SCCB address:   0x{:02x}", report.sensor.sccb_address);
    println!("  Max frame size: {}", report.sensor.max_frame_size);
    println!(
        "  JPEG:           {}",
        if report.sensor.supports_jpeg { "yes" } else { "no" }
    );

    let config = &report.config;
    println!("\nConfiguration:");
    println!("  Pixel format:   {}", config.pixel_format);
    println!(
        "  Frame size:     {} ({}x{})",
        config.frame_size, config.width, config.height
    );
    println!(
        "  JPEG quality:   {} (driver {})",
        config.jpeg_quality, config.driver_quality
    );
    println!("  Frame buffers:  {}", config.fb_count);
    println!("  Grab mode:      {}", config.grab_mode);
    println!(
        "  XCLK:           {:.1} MHz",
        config.xclk_freq_hz as f64 / 1_000_000.0
    );

    if !report.warnings.is_empty() {
        println!("\nWarnings:");
        for warning in &report.warnings {
            println!("  {}", warning);
        }
    }
}
