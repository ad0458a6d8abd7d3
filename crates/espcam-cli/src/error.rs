// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

use std::fmt;
use std::process::ExitCode;

/// CLI-specific error type with exit code mapping
#[derive(Debug)]
pub enum CliError {
    /// Invalid command-line arguments or rejected camera settings
    InvalidArgs(String),
    /// Camera driver or sensor not found
    CameraNotFound(String),
    /// Operation or format not supported by the sensor or driver
    Unsupported(String),
    /// No frame arrived in time
    Timeout(String),
    /// General error from the espcam library
    General(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::InvalidArgs(msg) => write!(f, "Invalid arguments: {}", msg),
            CliError::CameraNotFound(msg) => write!(f, "Camera not found: {}", msg),
            CliError::Unsupported(msg) => write!(f, "Not supported: {}", msg),
            CliError::Timeout(msg) => write!(f, "Timeout: {}", msg),
            CliError::General(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for CliError {}

impl CliError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> ExitCode {
        match self {
            CliError::InvalidArgs(_) => ExitCode::from(2),
            CliError::CameraNotFound(_) => ExitCode::from(3),
            CliError::Unsupported(_) => ExitCode::from(4),
            CliError::Timeout(_) => ExitCode::from(6),
            CliError::General(_) => ExitCode::from(1),
        }
    }
}

/// Map espcam::Error to CliError with appropriate exit codes
impl From<espcam::Error> for CliError {
    fn from(err: espcam::Error) -> Self {
        use espcam::Error;

        match err {
            // Missing library or symbols means there is no camera driver
            Error::LibraryNotLoaded(lib_err) => {
                CliError::CameraNotFound(format!("Failed to load library: {}", lib_err))
            }
            Error::SymbolNotFound(sym) => {
                CliError::CameraNotFound(format!("Symbol not found: {}", sym))
            }
            Error::NotFound => CliError::CameraNotFound("no sensor detected".to_string()),

            Error::InvalidArgument(msg) => CliError::InvalidArgs(msg),
            Error::TypeMismatch(msg) => CliError::InvalidArgs(msg),

            Error::Unsupported(msg) => CliError::Unsupported(msg),
            Error::Timeout => CliError::Timeout("no frame from camera".to_string()),

            Error::InvalidState(msg) => CliError::General(format!("Invalid state: {}", msg)),
            Error::OutOfMemory => CliError::General("Out of memory".to_string()),
            Error::ConversionFailed(msg) => {
                CliError::General(format!("Conversion failed: {}", msg))
            }
            Error::Unknown(code) => CliError::General(format!("Driver error 0x{:04x}", code)),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::General(format!("I/O error: {}", err))
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        CliError::General(format!("JSON error: {}", err))
    }
}

/// Helper function to convert result to exit code
pub fn result_to_exit_code<T>(result: Result<T, CliError>) -> ExitCode {
    match result {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e);
            e.exit_code()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(
            CliError::InvalidArgs("test".into()).exit_code(),
            ExitCode::from(2)
        );
        assert_eq!(
            CliError::CameraNotFound("test".into()).exit_code(),
            ExitCode::from(3)
        );
        assert_eq!(
            CliError::Unsupported("test".into()).exit_code(),
            ExitCode::from(4)
        );
        assert_eq!(
            CliError::Timeout("test".into()).exit_code(),
            ExitCode::from(6)
        );
        assert_eq!(
            CliError::General("test".into()).exit_code(),
            ExitCode::from(1)
        );
    }

    #[test]
    fn test_library_error_mapping() {
        assert!(matches!(
            CliError::from(espcam::Error::NotFound),
            CliError::CameraNotFound(_)
        ));
        assert!(matches!(
            CliError::from(espcam::Error::Timeout),
            CliError::Timeout(_)
        ));
        assert!(matches!(
            CliError::from(espcam::Error::Unsupported("RGB565".into())),
            CliError::Unsupported(_)
        ));
        assert!(matches!(
            CliError::from(espcam::Error::TypeMismatch("x".into())),
            CliError::InvalidArgs(_)
        ));
        assert!(matches!(
            CliError::from(espcam::Error::Unknown(0x105)),
            CliError::General(_)
        ));
    }

    #[test]
    fn test_error_display() {
        let err = CliError::CameraNotFound("no sensor detected".to_string());
        assert_eq!(format!("{}", err), "Camera not found: no sensor detected");
    }
}
