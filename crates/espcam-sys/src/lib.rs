// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

#![allow(non_upper_case_globals)]
#![allow(non_camel_case_types)]
#![allow(non_snake_case)]
#![allow(clippy::type_complexity)]
#![allow(clippy::missing_safety_doc)]
#![allow(clippy::too_many_arguments)]

include!("ffi.rs");

// Re-export libloading for error handling
pub use libloading;

use std::sync::{Mutex, OnceLock};

/// Default shared object name of the esp32-camera driver build.
pub const DEFAULT_LIBRARY: &str = "libesp32_camera.so";

static LIBRARY: OnceLock<EspCameraLibrary> = OnceLock::new();
static INIT_LOCK: Mutex<()> = Mutex::new(());

/// Load the esp32-camera driver and image converters.
///
/// This must be called before using any other driver function. Returns an
/// error if the library cannot be loaded.
///
/// The environment variable `ESPCAM_LIBRARY` can be used to specify a custom
/// path to the library. If not set, the loader searches standard paths for
/// [`DEFAULT_LIBRARY`].
pub fn init() -> Result<&'static EspCameraLibrary, libloading::Error> {
    if let Some(lib) = LIBRARY.get() {
        return Ok(lib);
    }

    let _guard = INIT_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

    // Double-check after acquiring lock
    if let Some(lib) = LIBRARY.get() {
        return Ok(lib);
    }

    let lib_path = std::env::var("ESPCAM_LIBRARY").unwrap_or_else(|_| DEFAULT_LIBRARY.to_string());

    let lib = unsafe { EspCameraLibrary::new(lib_path.as_str())? };

    // Only this thread can reach here while holding INIT_LOCK.
    Ok(LIBRARY.get_or_init(|| lib))
}

#[cfg(test)]
fn try_library() -> Option<&'static EspCameraLibrary> {
    LIBRARY.get()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem;

    #[test]
    fn test_config_layout() {
        // 17 ints for pins and clock, 4 enums, quality, size_t count, 2 enums, port
        let ints = 17 + 4 + 1 + 2 + 1;
        let expected = ints * mem::size_of::<std::os::raw::c_int>() + mem::size_of::<usize>();
        assert!(mem::size_of::<camera_config_t>() >= expected);
    }

    #[test]
    fn test_camera_error_codes() {
        assert_eq!(ESP_ERR_CAMERA_NOT_DETECTED, 0x20001);
        assert_eq!(ESP_ERR_CAMERA_NOT_SUPPORTED, 0x20004);
        assert!(ESP_ERR_TIMEOUT > ESP_ERR_NO_MEM);
    }

    #[test]
    fn test_missing_library() {
        let result = unsafe { EspCameraLibrary::new("/nonexistent/libesp32_camera.so") };
        assert!(result.is_err());
        if init().is_err() {
            assert!(try_library().is_none());
        }
    }
}
