// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

use crate::error::CliError;
use crate::metrics::MetricsCollector;
use crate::utils::{self, CameraArgs, Global};
use clap::Args as ClapArgs;
use espcam::{
    config::CameraConfig, driver::Converter, esp::EspDriver, format::PixelFormat,
    registry::DeviceRegistry, simulated::SimulatedDriver,
};
use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};

#[derive(ClapArgs, Debug)]
pub struct Args {
    /// Number of frames to capture (0 = until Ctrl+C)
    #[arg(short = 'n', long, default_value = "100")]
    frames: u64,

    /// Convert every frame to this format (JPEG, RGB888, RGB565)
    #[arg(long, value_parser = utils::parse_named::<PixelFormat>)]
    output_format: Option<PixelFormat>,

    /// Capture timeout in milliseconds
    #[arg(long, default_value = "4000")]
    timeout_ms: u64,

    /// Give up after this many consecutive timeouts
    #[arg(long, default_value = "3")]
    max_timeouts: u32,

    #[command(flatten)]
    camera: CameraArgs,
}

pub fn execute(args: Args, global: &Global) -> Result<(), CliError> {
    let board = utils::resolve_board(global)?;
    let config = args.camera.config(board)?;
    log::debug!("Benchmark parameters: {:?}", args);

    let term = utils::install_signal_handler()?;
    let mut metrics = MetricsCollector::new();
    if global.simulate {
        run(SimulatedDriver::new(), &args, config, &term, &mut metrics)?;
    } else {
        run(EspDriver::load()?, &args, config, &term, &mut metrics)?;
    }

    if global.json {
        metrics.print_json()?;
    } else {
        metrics.print_text();
    }
    Ok(())
}

fn run<D: Converter>(
    driver: D,
    args: &Args,
    config: CameraConfig,
    term: &std::sync::atomic::AtomicBool,
    metrics: &mut MetricsCollector,
) -> Result<(), CliError> {
    let registry = DeviceRegistry::new();
    let mut camera = utils::open_camera(driver, &registry, config)?;
    let timeout = Duration::from_millis(args.timeout_ms);
    let max_frames = if args.frames == 0 {
        u64::MAX
    } else {
        args.frames
    };

    log::info!(
        "Capturing {} frames (Ctrl+C to stop)...",
        if max_frames == u64::MAX {
            "unlimited".to_string()
        } else {
            max_frames.to_string()
        }
    );

    let mut captured = 0u64;
    let mut consecutive_timeouts = 0u32;
    while captured < max_frames && !term.load(Ordering::Relaxed) {
        let start = Instant::now();
        match camera.capture_with_timeout(args.output_format, timeout)? {
            Some(image) => {
                metrics.record_frame(start.elapsed(), image.len());
                captured += 1;
                consecutive_timeouts = 0;
                if captured % 100 == 0 {
                    log::info!("{} frames captured", captured);
                }
            }
            None => {
                metrics.record_timeout();
                consecutive_timeouts += 1;
                log::warn!("No frame within {} ms", args.timeout_ms);
                if consecutive_timeouts >= args.max_timeouts {
                    return Err(CliError::Timeout(format!(
                        "{} consecutive captures without a frame",
                        consecutive_timeouts
                    )));
                }
            }
        }
    }

    if term.load(Ordering::Relaxed) {
        log::info!("Interrupted after {} frames", captured);
    }
    camera.deinit()?;
    Ok(())
}
