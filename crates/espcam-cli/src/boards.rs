// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

use crate::error::CliError;
use crate::utils::Global;
use clap::Args as ClapArgs;
use espcam::board::{Board, Chip, PinMap, UNUSED_PIN};
use espcam::format::GrabMode;
use serde::Serialize;

#[derive(ClapArgs, Debug)]
pub struct Args {
    /// Show the pin table of one board
    board: Option<String>,
}

#[derive(Debug, Serialize)]
struct BoardReport {
    name: &'static str,
    chip: Chip,
    max_xclk_hz: u32,
    fb_count: u8,
    grab_mode: GrabMode,
    selected: bool,
    pins: PinMap,
}

impl From<Board> for BoardReport {
    fn from(board: Board) -> Self {
        let defaults = board.defaults();
        BoardReport {
            name: board.name(),
            chip: board.chip(),
            max_xclk_hz: board.chip().max_xclk_hz(),
            fb_count: defaults.fb_count,
            grab_mode: defaults.grab_mode,
            selected: Board::selected() == Some(board),
            pins: board.pins(),
        }
    }
}

pub fn execute(args: Args, global: &Global) -> Result<(), CliError> {
    match args.board {
        Some(name) => {
            let report = BoardReport::from(name.parse::<Board>()?);
            if global.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_pins(&report);
            }
        }
        None => {
            let reports: Vec<BoardReport> = Board::ALL.iter().copied().map(Into::into).collect();
            if global.json {
                println!("{}", serde_json::to_string_pretty(&reports)?);
            } else {
                println!("{:<28} {:<8} {:>4}  {}", "BOARD", "CHIP", "FB", "GRAB");
                for report in &reports {
                    println!(
                        "{:<28} {:<8} {:>4}  {}{}",
                        report.name,
                        report.chip.to_string(),
                        report.fb_count,
                        report.grab_mode,
                        if report.selected { "  (selected)" } else { "" }
                    );
                }
            }
        }
    }
    Ok(())
}

fn pin(pin: i32) -> String {
    if pin == UNUSED_PIN {
        "-".to_string()
    } else {
        pin.to_string()
    }
}

fn print_pins(report: &BoardReport) {
    let pins = &report.pins;
    println!("{} ({})", report.name, report.chip);
    for (i, &data) in pins.data.iter().enumerate() {
        println!("  D{}     {}", i, pin(data));
    }
    println!("  XCLK   {}", pin(pins.xclk));
    println!("  PCLK   {}", pin(pins.pclk));
    println!("  VSYNC  {}", pin(pins.vsync));
    println!("  HREF   {}", pin(pins.href));
    println!("  PWDN   {}", pin(pins.pwdn));
    println!("  RESET  {}", pin(pins.reset));
    println!("  SDA    {}", pin(pins.sda));
    println!("  SCL    {}", pin(pins.scl));
    println!(
        "  max XCLK {} MHz, {} frame buffer(s), grab {}",
        report.max_xclk_hz / 1_000_000,
        report.fb_count,
        report.grab_mode
    );
}
