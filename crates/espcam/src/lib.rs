// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

//! ESP32 Camera Library for Rust
//!
//! Safe Rust bindings for the esp32-camera driver, providing validated
//! camera configuration, an explicit init/reconfigure/deinit lifecycle,
//! frame capture with optional software conversion, and a keyword-argument
//! binding surface for embedding the camera into scripting hosts.
//!
//! The driver itself (sensor bring-up, DMA frame capture, JPEG and RGB
//! conversion) is an external C library. [`esp::EspDriver`] reaches it
//! through `espcam-sys`; [`simulated::SimulatedDriver`] stands in for it on
//! machines without a camera.
//!
//! # Quick Start
//!
//! ```no_run
//! use espcam::board::Board;
//! use espcam::config::CameraConfig;
//! use espcam::device::CameraDevice;
//! use espcam::esp::EspDriver;
//! use espcam::format::{FrameSize, PixelFormat};
//! use espcam::registry::DeviceRegistry;
//!
//! let config = CameraConfig::builder()
//!     .with_board(Board::AiThinker)
//!     .with_pixel_format(PixelFormat::Jpeg)
//!     .with_frame_size(FrameSize::Qvga)
//!     .with_jpeg_quality(80)
//!     .build()?;
//!
//! let registry = DeviceRegistry::new();
//! let mut camera = CameraDevice::new(EspDriver::load()?, &registry, config);
//! camera.init()?;
//! if let Some(image) = camera.capture(None)? {
//!     println!("captured {} bytes ({}x{})", image.len(), image.width(), image.height());
//! }
//! camera.deinit()?;
//! # Ok::<(), espcam::Error>(())
//! ```
//!
//! # Features
//!
//! - Per-board pin tables selected at build time via `ESPCAM_BOARD`
//! - API-facing JPEG quality 0-100 mapped onto the driver's inverted 0-63
//! - Single outstanding frame buffer, released before every capture
//! - JPEG, RGB888, RGB565 and BMP output through the driver's converters
//! - Table-driven access to ~25 sensor tuning properties

use std::{error, fmt};

use espcam_sys as ffi;

/// Error type for camera operations
#[derive(Debug)]
pub enum Error {
    /// The esp32-camera library could not be loaded at runtime
    LibraryNotLoaded(ffi::libloading::Error),

    /// A required driver symbol is missing from the loaded library
    SymbolNotFound(String),

    /// The driver or a conversion could not allocate memory
    OutOfMemory,

    /// Out-of-range or malformed configuration value
    InvalidArgument(String),

    /// Operation not allowed in the current lifecycle state
    InvalidState(String),

    /// No camera sensor detected
    NotFound,

    /// Operation or format not supported for the current configuration
    Unsupported(String),

    /// The driver gave up waiting on the sensor
    Timeout,

    /// Driver status code without a mapping
    Unknown(i32),

    /// An image converter reported failure
    ConversionFailed(String),

    /// A binding value had the wrong type
    TypeMismatch(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::LibraryNotLoaded(err) => {
                write!(f, "esp32-camera library could not be loaded: {}", err)
            }
            Error::SymbolNotFound(sym) => write!(f, "Symbol not found: {}", sym),
            Error::OutOfMemory => write!(f, "Out of memory"),
            Error::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
            Error::InvalidState(msg) => write!(f, "Invalid state: {}", msg),
            Error::NotFound => write!(f, "Camera not found"),
            Error::Unsupported(msg) => write!(f, "Not supported: {}", msg),
            Error::Timeout => write!(f, "Timed out waiting for the camera"),
            Error::Unknown(code) => write!(f, "Unknown error 0x{:04x}", code),
            Error::ConversionFailed(msg) => write!(f, "Conversion failed: {}", msg),
            Error::TypeMismatch(msg) => write!(f, "Type mismatch: {}", msg),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Error::LibraryNotLoaded(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ffi::libloading::Error> for Error {
    fn from(err: ffi::libloading::Error) -> Self {
        Error::LibraryNotLoaded(err)
    }
}

impl Error {
    /// Translate a driver status code. Returns `None` for `ESP_OK`.
    pub fn from_status(code: i32) -> Option<Error> {
        match code {
            ffi::ESP_OK => None,
            ffi::ESP_ERR_NO_MEM => Some(Error::OutOfMemory),
            ffi::ESP_ERR_INVALID_ARG => {
                Some(Error::InvalidArgument("rejected by driver".to_string()))
            }
            ffi::ESP_ERR_INVALID_STATE => {
                Some(Error::InvalidState("rejected by driver".to_string()))
            }
            ffi::ESP_ERR_NOT_FOUND | ffi::ESP_ERR_CAMERA_NOT_DETECTED => Some(Error::NotFound),
            ffi::ESP_ERR_NOT_SUPPORTED | ffi::ESP_ERR_CAMERA_NOT_SUPPORTED => Some(
                Error::Unsupported("operation not supported by driver".to_string()),
            ),
            ffi::ESP_ERR_TIMEOUT => Some(Error::Timeout),
            other => Some(Error::Unknown(other)),
        }
    }
}

/// Convert a driver status code into a `Result`.
pub fn check(code: i32) -> Result<(), Error> {
    match Error::from_status(code) {
        None => Ok(()),
        Some(err) => Err(err),
    }
}

/// The board module provides the static per-board pin tables.
pub mod board;

/// The format module provides the closed pixel format, frame size, grab mode
/// and gain ceiling sets.
pub mod format;

/// The config module validates camera configuration.
pub mod config;

/// The driver module defines the seam to the external camera driver.
pub mod driver;

/// The esp module drives the esp32-camera library through FFI.
pub mod esp;

/// The simulated module provides an in-memory driver.
pub mod simulated;

/// The registry module enforces a single active camera.
pub mod registry;

/// The device module provides the camera lifecycle and capture.
pub mod device;

/// The convert module provides the capture/convert pipeline.
pub mod convert;

/// The sensor module provides the table-driven sensor properties.
pub mod sensor;

/// The binding module maps keyword-argument calls onto a camera.
pub mod binding;

/// Crate version string
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
