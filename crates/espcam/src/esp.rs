// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

//! [`Driver`] and [`Converter`] over the esp32-camera library.

use crate::{
    check,
    driver::{Control, Converter, Driver, DriverConfig, RawFrame, SensorInfo},
    format::{FrameSize, PixelFormat},
    Error,
};
use espcam_sys as ffi;
use std::{
    ffi::CStr,
    fmt,
    os::raw::c_int,
    ptr::{self, NonNull},
    slice, thread,
    time::{Duration, Instant},
};
use unix_ts::Timestamp;

const POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Frame buffer on loan from the esp32-camera driver. Must be handed back
/// through [`Driver::return_frame`].
pub struct EspFrame {
    fb: NonNull<ffi::camera_fb_t>,
    format: PixelFormat,
}

impl EspFrame {
    fn raw(&self) -> &ffi::camera_fb_t {
        // SAFETY: the driver keeps the buffer alive until it is returned,
        // which consumes this frame.
        unsafe { self.fb.as_ref() }
    }

    fn as_mut_ptr(&self) -> *mut ffi::camera_fb_t {
        self.fb.as_ptr()
    }
}

impl RawFrame for EspFrame {
    fn data(&self) -> &[u8] {
        let fb = self.raw();
        if fb.buf.is_null() {
            return &[];
        }
        // SAFETY: buf holds len bytes for as long as the frame is on loan.
        unsafe { slice::from_raw_parts(fb.buf, fb.len) }
    }

    fn width(&self) -> u32 {
        self.raw().width as u32
    }

    fn height(&self) -> u32 {
        self.raw().height as u32
    }

    fn format(&self) -> PixelFormat {
        self.format
    }

    fn timestamp(&self) -> Timestamp {
        let tv = self.raw().timestamp;
        Timestamp::new(tv.tv_sec, (tv.tv_usec as u32).saturating_mul(1000))
    }
}

impl fmt::Debug for EspFrame {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "EspFrame {}x{} {} len:{} ptr:{:?}",
            self.width(),
            self.height(),
            self.format,
            self.len(),
            self.fb
        )
    }
}

/// Camera driver backed by the runtime-loaded esp32-camera library.
pub struct EspDriver {
    lib: &'static ffi::EspCameraLibrary,
    initialized: bool,
}

impl fmt::Debug for EspDriver {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("EspDriver")
            .field("initialized", &self.initialized)
            .finish()
    }
}

impl EspDriver {
    /// Load the library (see [`espcam_sys::init`]) and check that every
    /// required entry point is present.
    pub fn load() -> Result<Self, Error> {
        let lib = ffi::init()?;
        let required = [
            ("esp_camera_init", lib.esp_camera_init.is_ok()),
            ("esp_camera_deinit", lib.esp_camera_deinit.is_ok()),
            ("esp_camera_fb_get", lib.esp_camera_fb_get.is_ok()),
            ("esp_camera_fb_return", lib.esp_camera_fb_return.is_ok()),
            ("esp_camera_sensor_get", lib.esp_camera_sensor_get.is_ok()),
            (
                "esp_camera_sensor_get_info",
                lib.esp_camera_sensor_get_info.is_ok(),
            ),
            ("frame2jpg", lib.frame2jpg.is_ok()),
            ("frame2bmp", lib.frame2bmp.is_ok()),
            ("fmt2rgb888", lib.fmt2rgb888.is_ok()),
            ("jpg2rgb565", lib.jpg2rgb565.is_ok()),
            ("free", lib.free.is_ok()),
        ];
        if let Some((name, _)) = required.iter().find(|(_, present)| !present) {
            return Err(Error::SymbolNotFound(name.to_string()));
        }
        if lib.esp_camera_available_frames.is_err() {
            log::debug!("esp_camera_available_frames missing, capture timeout is the driver's own");
        }
        Ok(EspDriver {
            lib,
            initialized: false,
        })
    }

    fn sensor(&self) -> Result<NonNull<ffi::sensor_t>, Error> {
        if !self.initialized {
            return Err(Error::InvalidState("Camera not initialized".to_string()));
        }
        // SAFETY: returns the driver's static sensor or null.
        NonNull::new(unsafe { self.lib.esp_camera_sensor_get() }).ok_or(Error::NotFound)
    }

    /// Setter function and status value of a control.
    fn control(
        sensor: &ffi::sensor_t,
        control: Control,
    ) -> (Option<unsafe extern "C" fn(*mut ffi::sensor_t, c_int) -> c_int>, i32) {
        let s = &sensor.status;
        match control {
            Control::Contrast => (sensor.set_contrast, s.contrast.into()),
            Control::Brightness => (sensor.set_brightness, s.brightness.into()),
            Control::Saturation => (sensor.set_saturation, s.saturation.into()),
            Control::Sharpness => (sensor.set_sharpness, s.sharpness.into()),
            Control::Denoise => (sensor.set_denoise, s.denoise.into()),
            // gainceiling_t is a C enum passed as an int
            Control::GainCeiling => (
                sensor.set_gainceiling.map(|f| {
                    // SAFETY: identical ABI for c_uint and c_int arguments.
                    unsafe {
                        std::mem::transmute::<
                            unsafe extern "C" fn(*mut ffi::sensor_t, ffi::gainceiling_t) -> c_int,
                            unsafe extern "C" fn(*mut ffi::sensor_t, c_int) -> c_int,
                        >(f)
                    }
                }),
                s.gainceiling.into(),
            ),
            Control::Quality => (sensor.set_quality, s.quality.into()),
            Control::Colorbar => (sensor.set_colorbar, s.colorbar.into()),
            Control::Whitebal => (sensor.set_whitebal, s.awb.into()),
            Control::GainCtrl => (sensor.set_gain_ctrl, s.agc.into()),
            Control::ExposureCtrl => (sensor.set_exposure_ctrl, s.aec.into()),
            Control::Hmirror => (sensor.set_hmirror, s.hmirror.into()),
            Control::Vflip => (sensor.set_vflip, s.vflip.into()),
            Control::Aec2 => (sensor.set_aec2, s.aec2.into()),
            Control::AwbGain => (sensor.set_awb_gain, s.awb_gain.into()),
            Control::AgcGain => (sensor.set_agc_gain, s.agc_gain.into()),
            Control::AecValue => (sensor.set_aec_value, s.aec_value.into()),
            Control::SpecialEffect => (sensor.set_special_effect, s.special_effect.into()),
            Control::WbMode => (sensor.set_wb_mode, s.wb_mode.into()),
            Control::AeLevel => (sensor.set_ae_level, s.ae_level.into()),
            Control::Dcw => (sensor.set_dcw, s.dcw.into()),
            Control::Bpc => (sensor.set_bpc, s.bpc.into()),
            Control::Wpc => (sensor.set_wpc, s.wpc.into()),
            Control::RawGma => (sensor.set_raw_gma, s.raw_gma.into()),
            Control::Lenc => (sensor.set_lenc, s.lenc.into()),
        }
    }

    /// Copy a driver-allocated buffer into a Vec and free the original.
    fn take_output(&self, out: *mut u8, len: usize) -> Result<Vec<u8>, Error> {
        let mut data = Vec::new();
        let reserved = data.try_reserve_exact(len);
        if reserved.is_ok() {
            // SAFETY: the converter wrote len bytes to out.
            data.extend_from_slice(unsafe { slice::from_raw_parts(out, len) });
        }
        // SAFETY: out was allocated by the driver with malloc.
        unsafe { self.lib.free(out.cast()) };
        reserved.map_err(|_| Error::OutOfMemory)?;
        Ok(data)
    }
}

fn native_config(config: &DriverConfig) -> ffi::camera_config_t {
    let pins = &config.pins;
    ffi::camera_config_t {
        pin_pwdn: pins.pwdn,
        pin_reset: pins.reset,
        pin_xclk: pins.xclk,
        pin_sccb_sda: pins.sda,
        pin_sccb_scl: pins.scl,
        pin_d7: pins.data[7],
        pin_d6: pins.data[6],
        pin_d5: pins.data[5],
        pin_d4: pins.data[4],
        pin_d3: pins.data[3],
        pin_d2: pins.data[2],
        pin_d1: pins.data[1],
        pin_d0: pins.data[0],
        pin_vsync: pins.vsync,
        pin_href: pins.href,
        pin_pclk: pins.pclk,
        xclk_freq_hz: config.xclk_freq_hz as c_int,
        ledc_timer: ffi::ledc_timer_t_LEDC_TIMER_0,
        ledc_channel: ffi::ledc_channel_t_LEDC_CHANNEL_0,
        pixel_format: config.pixel_format.raw(),
        frame_size: config.frame_size.raw(),
        jpeg_quality: c_int::from(config.jpeg_quality),
        fb_count: usize::from(config.fb_count),
        fb_location: ffi::camera_fb_location_t_CAMERA_FB_IN_PSRAM,
        grab_mode: config.grab_mode.raw(),
        sccb_i2c_port: config.sccb_port,
    }
}

impl Driver for EspDriver {
    type Frame = EspFrame;

    fn init(&mut self, config: &DriverConfig) -> Result<(), Error> {
        let native = native_config(config);
        log::debug!(
            "esp_camera_init {} {} xclk {} Hz quality {} fb_count {}",
            config.frame_size,
            config.pixel_format,
            config.xclk_freq_hz,
            config.jpeg_quality,
            config.fb_count
        );
        // SAFETY: native lives for the duration of the call.
        check(unsafe { self.lib.esp_camera_init(&native) })?;
        self.initialized = true;
        Ok(())
    }

    fn deinit(&mut self) -> Result<(), Error> {
        log::debug!("esp_camera_deinit");
        self.initialized = false;
        // SAFETY: no frame outlives deinit; the device returns them first.
        check(unsafe { self.lib.esp_camera_deinit() })
    }

    fn get_frame(&mut self, timeout: Duration) -> Result<Option<EspFrame>, Error> {
        if !self.initialized {
            return Err(Error::InvalidState("Camera not initialized".to_string()));
        }
        if self.lib.esp_camera_available_frames.is_ok() {
            let deadline = Instant::now() + timeout;
            // SAFETY: plain query of the frame queue.
            while !unsafe { self.lib.esp_camera_available_frames() } {
                if Instant::now() >= deadline {
                    return Ok(None);
                }
                thread::sleep(POLL_INTERVAL);
            }
        }
        // SAFETY: returns a filled buffer or null on the driver's timeout.
        let fb = match NonNull::new(unsafe { self.lib.esp_camera_fb_get() }) {
            Some(fb) => fb,
            None => return Ok(None),
        };
        // SAFETY: fb is a live frame buffer.
        let raw_format = unsafe { fb.as_ref() }.format;
        match PixelFormat::from_raw(raw_format) {
            Some(format) => Ok(Some(EspFrame { fb, format })),
            None => {
                // SAFETY: fb came from esp_camera_fb_get.
                unsafe { self.lib.esp_camera_fb_return(fb.as_ptr()) };
                Err(Error::Unsupported(format!(
                    "driver returned unknown pixel format {}",
                    raw_format
                )))
            }
        }
    }

    fn return_frame(&mut self, frame: EspFrame) {
        // SAFETY: frame came from esp_camera_fb_get and is returned once.
        unsafe { self.lib.esp_camera_fb_return(frame.as_mut_ptr()) };
    }

    fn frame_available(&self) -> Result<bool, Error> {
        if !self.initialized {
            return Err(Error::InvalidState("Camera not initialized".to_string()));
        }
        if self.lib.esp_camera_available_frames.is_err() {
            return Err(Error::SymbolNotFound(
                "esp_camera_available_frames".to_string(),
            ));
        }
        // SAFETY: plain query of the frame queue.
        Ok(unsafe { self.lib.esp_camera_available_frames() })
    }

    fn sensor_info(&self) -> Result<SensorInfo, Error> {
        let sensor = self.sensor()?;
        // SAFETY: the sensor struct lives as long as the driver is up.
        let info = unsafe {
            let id = ptr::addr_of_mut!((*sensor.as_ptr()).id);
            self.lib.esp_camera_sensor_get_info(id).as_ref()
        }
        .ok_or(Error::NotFound)?;
        let name = if info.name.is_null() {
            "unknown".to_string()
        } else {
            // SAFETY: name points at a static NUL-terminated string.
            unsafe { CStr::from_ptr(info.name) }
                .to_string_lossy()
                .into_owned()
        };
        Ok(SensorInfo {
            name,
            sccb_address: info.sccb_addr,
            pid: info.pid,
            max_frame_size: FrameSize::from_raw(info.max_size).unwrap_or(FrameSize::Qsxga),
            supports_jpeg: info.support_jpeg,
        })
    }

    fn get_control(&self, control: Control) -> Result<i32, Error> {
        let sensor = self.sensor()?;
        // SAFETY: read-only view of the live sensor struct.
        let (setter, value) = Self::control(unsafe { sensor.as_ref() }, control);
        if setter.is_none() {
            return Err(Error::Unsupported(format!("No attribute {}", control)));
        }
        Ok(value)
    }

    fn set_control(&mut self, control: Control, value: i32) -> Result<(), Error> {
        let sensor = self.sensor()?;
        // SAFETY: read-only view of the live sensor struct.
        let (setter, _) = Self::control(unsafe { sensor.as_ref() }, control);
        let setter =
            setter.ok_or_else(|| Error::Unsupported(format!("No attribute {}", control)))?;
        log::debug!("{} {}", control.setter(), value);
        // SAFETY: setter belongs to this sensor.
        if unsafe { setter(sensor.as_ptr(), value) } < 0 {
            return Err(Error::InvalidArgument(format!(
                "Invalid setting for {}",
                control
            )));
        }
        Ok(())
    }
}

impl Converter for EspDriver {
    fn encode_jpeg(&self, frame: &EspFrame, quality: u8) -> Result<Vec<u8>, Error> {
        let mut out: *mut u8 = ptr::null_mut();
        let mut len = 0usize;
        // SAFETY: frame is live; out and len are written on success.
        let ok = unsafe { self.lib.frame2jpg(frame.as_mut_ptr(), quality, &mut out, &mut len) };
        if !ok || out.is_null() {
            return Err(Error::ConversionFailed("JPEG compression failed".to_string()));
        }
        self.take_output(out, len)
    }

    fn to_rgb888(&self, frame: &EspFrame, out: &mut [u8]) -> Result<(), Error> {
        let data = frame.data();
        // SAFETY: out holds width * height * 3 bytes, checked by the caller.
        let ok = unsafe {
            self.lib
                .fmt2rgb888(data.as_ptr(), data.len(), frame.format.raw(), out.as_mut_ptr())
        };
        if !ok {
            return Err(Error::ConversionFailed("RGB888 conversion failed".to_string()));
        }
        Ok(())
    }

    fn decode_jpeg_rgb565(&self, frame: &EspFrame, out: &mut [u8]) -> Result<(), Error> {
        let data = frame.data();
        // SAFETY: out holds width * height * 2 bytes, checked by the caller.
        let ok = unsafe {
            self.lib.jpg2rgb565(
                data.as_ptr(),
                data.len(),
                out.as_mut_ptr(),
                ffi::jpg_scale_t_JPG_SCALE_NONE,
            )
        };
        if !ok {
            return Err(Error::ConversionFailed("JPEG decode failed".to_string()));
        }
        Ok(())
    }

    fn wrap_bmp(&self, frame: &EspFrame) -> Result<Vec<u8>, Error> {
        let mut out: *mut u8 = ptr::null_mut();
        let mut len = 0usize;
        // SAFETY: frame is live; out and len are written on success.
        let ok = unsafe { self.lib.frame2bmp(frame.as_mut_ptr(), &mut out, &mut len) };
        if !ok || out.is_null() {
            return Err(Error::ConversionFailed("BMP conversion failed".to_string()));
        }
        self.take_output(out, len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Board;
    use crate::format::GrabMode;
    use serial_test::serial;
    use std::mem;

    #[test]
    fn test_native_config_pin_order() {
        let config = DriverConfig {
            pins: Board::AiThinker.pins(),
            xclk_freq_hz: 20_000_000,
            pixel_format: PixelFormat::Jpeg,
            frame_size: FrameSize::Vga,
            jpeg_quality: 12,
            fb_count: 2,
            grab_mode: GrabMode::Latest,
            sccb_port: -1,
        };
        let native = native_config(&config);
        assert_eq!(native.pin_d0, 5);
        assert_eq!(native.pin_d7, 35);
        assert_eq!(native.pin_pwdn, 32);
        assert_eq!(native.pixel_format, ffi::pixformat_t_PIXFORMAT_JPEG);
        assert_eq!(native.frame_size, ffi::framesize_t_FRAMESIZE_VGA);
        assert_eq!(native.grab_mode, ffi::camera_grab_mode_t_CAMERA_GRAB_LATEST);
        assert_eq!(native.fb_count, 2);
        assert_eq!(native.jpeg_quality, 12);
    }

    #[test]
    fn test_optional_frame_has_no_overhead() {
        assert_eq!(
            mem::size_of::<Option<EspFrame>>(),
            mem::size_of::<EspFrame>()
        );
    }

    #[ignore = "test requires an esp32-camera library build (set ESPCAM_LIBRARY)"]
    #[test]
    #[serial]
    fn test_load() -> Result<(), Error> {
        let driver = EspDriver::load()?;
        assert!(!driver.initialized);
        Ok(())
    }
}
