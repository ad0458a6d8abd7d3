// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

mod bench;
mod boards;
mod capture;
mod error;
mod info;
mod metrics;
mod props;
mod utils;

use clap::{Parser, Subcommand};
use error::{result_to_exit_code, CliError};
use std::process::ExitCode;
use utils::Global;

/// espcam CLI - ESP32 camera capture, sensor control and benchmarking tool
#[derive(Parser)]
#[command(name = "espcam")]
#[command(version)]
#[command(about = "espcam CLI - ESP32 camera capture, sensor control and benchmarking tool")]
#[command(long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging (use RUST_LOG=debug for more)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output results in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Use the in-memory simulated camera instead of the esp32-camera driver
    #[arg(long, global = true)]
    simulate: bool,

    /// Board pin table (defaults to the board selected at build time)
    #[arg(short, long, global = true)]
    board: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Capture frames to files
    Capture(capture::Args),

    /// Display sensor and camera configuration
    Info(info::Args),

    /// Read sensor properties
    Get(props::GetArgs),

    /// Write a sensor property and read it back
    Set(props::SetArgs),

    /// List supported boards or show one board's pin table
    Boards(boards::Args),

    /// Print the named integer constants
    Constants,

    /// Measure capture throughput and latency
    Bench(bench::Args),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(cli.verbose, cli.quiet);

    let global = Global {
        json: cli.json,
        simulate: cli.simulate,
        board: cli.board,
    };

    let result = match cli.command {
        Commands::Capture(args) => capture::execute(args, &global),
        Commands::Info(args) => info::execute(args, &global),
        Commands::Get(args) => props::execute_get(args, &global),
        Commands::Set(args) => props::execute_set(args, &global),
        Commands::Boards(args) => boards::execute(args, &global),
        Commands::Constants => print_constants(),
        Commands::Bench(args) => bench::execute(args, &global),
    };

    result_to_exit_code(result)
}

fn print_constants() -> Result<(), CliError> {
    let constants = serde_json::Value::Object(espcam::binding::constants());
    println!("{}", serde_json::to_string_pretty(&constants)?);
    Ok(())
}

/// Initialize env_logger based on verbosity flags
fn init_logging(verbose: bool, quiet: bool) {
    let env = env_logger::Env::default();

    let env = if quiet {
        env.default_filter_or("error")
    } else if verbose {
        env.default_filter_or("debug")
    } else {
        env.default_filter_or("info")
    };

    env_logger::Builder::from_env(env)
        .format_timestamp(None)
        .format_target(false)
        .init();

    log::debug!("Logging initialized");
}
