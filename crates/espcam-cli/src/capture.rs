// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

use crate::error::CliError;
use crate::utils::{self, CameraArgs, Global};
use clap::Args as ClapArgs;
use espcam::{
    driver::Converter, esp::EspDriver, format::PixelFormat, registry::DeviceRegistry,
    simulated::SimulatedDriver,
};
use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

#[derive(ClapArgs, Debug)]
pub struct Args {
    /// Output file (numbered when capturing more than one frame)
    #[arg(short, long, default_value = "frame.jpg")]
    output: PathBuf,

    /// Convert frames to this format (JPEG, RGB888, RGB565)
    #[arg(long, value_parser = utils::parse_named::<PixelFormat>)]
    output_format: Option<PixelFormat>,

    /// Wrap frames in a BMP header
    #[arg(long)]
    bmp: bool,

    /// Number of frames to capture
    #[arg(short = 'n', long, default_value = "1")]
    count: u32,

    /// Capture timeout in milliseconds
    #[arg(long, default_value = "4000")]
    timeout_ms: u64,

    #[command(flatten)]
    camera: CameraArgs,
}

/// One written frame
#[derive(Debug, Serialize)]
struct SavedFrame {
    path: PathBuf,
    bytes: usize,
    width: u32,
    height: u32,
    format: PixelFormat,
    bitmap: bool,
}

pub fn execute(args: Args, global: &Global) -> Result<(), CliError> {
    if args.count == 0 {
        return Err(CliError::InvalidArgs("--count must be at least 1".to_string()));
    }
    let board = utils::resolve_board(global)?;
    let config = args.camera.config(board)?;
    log::debug!("Capture parameters: {:?}", args);

    let saved = if global.simulate {
        run(SimulatedDriver::new(), &args, config)?
    } else {
        run(EspDriver::load()?, &args, config)?
    };

    if global.json {
        println!("{}", serde_json::to_string_pretty(&saved)?);
    } else {
        for frame in &saved {
            println!(
                "{}: {} bytes {}x{} {}{}",
                frame.path.display(),
                frame.bytes,
                frame.width,
                frame.height,
                frame.format,
                if frame.bitmap { " (BMP)" } else { "" }
            );
        }
    }
    Ok(())
}

fn run<D: Converter>(
    driver: D,
    args: &Args,
    config: espcam::config::CameraConfig,
) -> Result<Vec<SavedFrame>, CliError> {
    let registry = DeviceRegistry::new();
    let mut camera = utils::open_camera(driver, &registry, config)?;
    camera.set_bitmap(args.bmp);
    let timeout = Duration::from_millis(args.timeout_ms);

    let mut saved = Vec::with_capacity(args.count as usize);
    for index in 0..args.count {
        let path = if args.count == 1 {
            args.output.clone()
        } else {
            utils::numbered_path(&args.output, index)
        };

        let image = camera
            .capture_with_timeout(args.output_format, timeout)?
            .ok_or_else(|| {
                CliError::Timeout(format!("no frame within {} ms", args.timeout_ms))
            })?;
        fs::write(&path, image.data())?;
        log::info!("Wrote {} ({} bytes)", path.display(), image.len());

        saved.push(SavedFrame {
            path,
            bytes: image.len(),
            width: image.width(),
            height: image.height(),
            format: image.format(),
            bitmap: image.is_bitmap(),
        });
    }

    camera.deinit()?;
    Ok(saved)
}
