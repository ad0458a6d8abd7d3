// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

//! Property access through the keyword-argument binding, the same path a
//! scripting host takes.

use crate::error::CliError;
use crate::utils::{self, CameraArgs, Global};
use clap::Args as ClapArgs;
use espcam::{
    binding::{Camera, Kwargs},
    board::Board,
    driver::Converter,
    esp::EspDriver,
    format::{FrameSize, GainCeiling},
    registry::DeviceRegistry,
    sensor::{self, PropertyKind, PROPERTIES},
    simulated::SimulatedDriver,
    Error,
};
use serde_json::{Map, Value};

#[derive(ClapArgs, Debug)]
pub struct GetArgs {
    /// Property names (all properties when omitted)
    names: Vec<String>,

    #[command(flatten)]
    camera: CameraArgs,
}

#[derive(ClapArgs, Debug)]
pub struct SetArgs {
    /// Property name
    name: String,

    /// New value: integer, true/false, or a constant name for frame_size
    /// and gainceiling
    value: String,

    #[command(flatten)]
    camera: CameraArgs,
}

fn construct<'r, D: Converter>(
    driver: D,
    registry: &'r DeviceRegistry,
    board: Board,
    camera: &CameraArgs,
) -> Result<Camera<'r, D>, CliError> {
    let kwargs: Kwargs = camera.kwargs();
    Ok(Camera::construct_with_defaults(
        driver,
        registry,
        board.defaults(),
        &kwargs,
    )?)
}

pub fn execute_get(args: GetArgs, global: &Global) -> Result<(), CliError> {
    let names: Vec<&str> = if args.names.is_empty() {
        PROPERTIES.iter().map(|prop| prop.name).collect()
    } else {
        for name in &args.names {
            sensor::lookup(name)?;
        }
        args.names.iter().map(String::as_str).collect()
    };
    let board = utils::resolve_board(global)?;

    let values = if global.simulate {
        get(SimulatedDriver::new(), board, &args.camera, &names)?
    } else {
        get(EspDriver::load()?, board, &args.camera, &names)?
    };

    if global.json {
        println!("{}", serde_json::to_string_pretty(&Value::Object(values))?);
    } else {
        for (name, value) in &values {
            println!("{} = {}", name, describe(name, value));
        }
    }
    Ok(())
}

fn get<D: Converter>(
    driver: D,
    board: Board,
    camera: &CameraArgs,
    names: &[&str],
) -> Result<Map<String, Value>, CliError> {
    let registry = DeviceRegistry::new();
    let mut camera = construct(driver, &registry, board, camera)?;

    let mut values = Map::new();
    for &name in names {
        let value = match camera.get(name) {
            Ok(value) => value,
            Err(Error::Unsupported(msg)) => {
                log::debug!("{}: {}", name, msg);
                Value::Null
            }
            Err(err) => return Err(err.into()),
        };
        values.insert(name.to_string(), value);
    }
    camera.exit()?;
    Ok(values)
}

pub fn execute_set(args: SetArgs, global: &Global) -> Result<(), CliError> {
    sensor::lookup(&args.name)?;
    let value = parse_value(&args.value);
    let board = utils::resolve_board(global)?;

    let (current, warnings) = if global.simulate {
        set(SimulatedDriver::new(), board, &args, &value)?
    } else {
        set(EspDriver::load()?, board, &args, &value)?
    };

    if global.json {
        let mut report = Map::new();
        report.insert("name".into(), Value::from(args.name.as_str()));
        report.insert("requested".into(), value);
        report.insert("value".into(), current);
        report.insert("warnings".into(), Value::from(warnings));
        println!("{}", serde_json::to_string_pretty(&Value::Object(report))?);
    } else {
        println!("{} = {}", args.name, describe(&args.name, &current));
        for warning in warnings {
            println!("warning: {}", warning);
        }
    }
    Ok(())
}

fn set<D: Converter>(
    driver: D,
    board: Board,
    args: &SetArgs,
    value: &Value,
) -> Result<(Value, Vec<String>), CliError> {
    let registry = DeviceRegistry::new();
    let mut camera = construct(driver, &registry, board, &args.camera)?;
    camera.drain_warnings();

    camera.set(&args.name, value)?;
    let current = camera.get(&args.name)?;
    let warnings = camera
        .drain_warnings()
        .iter()
        .map(ToString::to_string)
        .collect();
    camera.exit()?;
    Ok((current, warnings))
}

/// Interpret a command-line value the way a scripting host would pass it
fn parse_value(s: &str) -> Value {
    match s.to_ascii_lowercase().as_str() {
        "true" | "on" => return Value::Bool(true),
        "false" | "off" => return Value::Bool(false),
        _ => {}
    }
    match s.parse::<i64>() {
        Ok(v) => Value::from(v),
        Err(_) => Value::from(s),
    }
}

/// Value with its constant name where one exists
fn describe(name: &str, value: &Value) -> String {
    let kind = sensor::lookup(name).map(|prop| prop.kind).ok();
    let constant = value
        .as_u64()
        .and_then(|raw| u32::try_from(raw).ok())
        .and_then(|raw| match kind {
            Some(PropertyKind::FrameSize) => FrameSize::from_raw(raw).map(|v| v.name()),
            Some(PropertyKind::GainCeiling) => GainCeiling::from_raw(raw).map(|v| v.name()),
            _ => None,
        });
    match (value, constant) {
        (Value::Null, _) => "(unsupported)".to_string(),
        (Value::String(s), _) => s.clone(),
        (_, Some(constant)) => format!("{} ({})", value, constant),
        _ => value.to_string(),
    }
}
