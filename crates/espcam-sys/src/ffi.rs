// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies
//
// Declarations for esp_camera.h, sensor.h and img_converters.h in the layout
// of esp32-camera 2.0.x with CONFIG_CAMERA_CONVERTER_ENABLED unset.

pub type esp_err_t = ::std::os::raw::c_int;
pub const ESP_OK: esp_err_t = 0;
pub const ESP_FAIL: esp_err_t = -1;
pub const ESP_ERR_NO_MEM: esp_err_t = 0x101;
pub const ESP_ERR_INVALID_ARG: esp_err_t = 0x102;
pub const ESP_ERR_INVALID_STATE: esp_err_t = 0x103;
pub const ESP_ERR_INVALID_SIZE: esp_err_t = 0x104;
pub const ESP_ERR_NOT_FOUND: esp_err_t = 0x105;
pub const ESP_ERR_NOT_SUPPORTED: esp_err_t = 0x106;
pub const ESP_ERR_TIMEOUT: esp_err_t = 0x107;
pub const ESP_ERR_CAMERA_BASE: esp_err_t = 0x20000;
pub const ESP_ERR_CAMERA_NOT_DETECTED: esp_err_t = ESP_ERR_CAMERA_BASE + 1;
pub const ESP_ERR_CAMERA_FAILED_TO_SET_FRAME_SIZE: esp_err_t = ESP_ERR_CAMERA_BASE + 2;
pub const ESP_ERR_CAMERA_FAILED_TO_SET_OUT_FORMAT: esp_err_t = ESP_ERR_CAMERA_BASE + 3;
pub const ESP_ERR_CAMERA_NOT_SUPPORTED: esp_err_t = ESP_ERR_CAMERA_BASE + 4;

pub type pixformat_t = ::std::os::raw::c_uint;
pub const pixformat_t_PIXFORMAT_RGB565: pixformat_t = 0;
pub const pixformat_t_PIXFORMAT_YUV422: pixformat_t = 1;
pub const pixformat_t_PIXFORMAT_YUV420: pixformat_t = 2;
pub const pixformat_t_PIXFORMAT_GRAYSCALE: pixformat_t = 3;
pub const pixformat_t_PIXFORMAT_JPEG: pixformat_t = 4;
pub const pixformat_t_PIXFORMAT_RGB888: pixformat_t = 5;
pub const pixformat_t_PIXFORMAT_RAW: pixformat_t = 6;
pub const pixformat_t_PIXFORMAT_RGB444: pixformat_t = 7;
pub const pixformat_t_PIXFORMAT_RGB555: pixformat_t = 8;

pub type framesize_t = ::std::os::raw::c_uint;
pub const framesize_t_FRAMESIZE_96X96: framesize_t = 0;
pub const framesize_t_FRAMESIZE_QQVGA: framesize_t = 1;
pub const framesize_t_FRAMESIZE_QCIF: framesize_t = 2;
pub const framesize_t_FRAMESIZE_HQVGA: framesize_t = 3;
pub const framesize_t_FRAMESIZE_240X240: framesize_t = 4;
pub const framesize_t_FRAMESIZE_QVGA: framesize_t = 5;
pub const framesize_t_FRAMESIZE_CIF: framesize_t = 6;
pub const framesize_t_FRAMESIZE_HVGA: framesize_t = 7;
pub const framesize_t_FRAMESIZE_VGA: framesize_t = 8;
pub const framesize_t_FRAMESIZE_SVGA: framesize_t = 9;
pub const framesize_t_FRAMESIZE_XGA: framesize_t = 10;
pub const framesize_t_FRAMESIZE_HD: framesize_t = 11;
pub const framesize_t_FRAMESIZE_SXGA: framesize_t = 12;
pub const framesize_t_FRAMESIZE_UXGA: framesize_t = 13;
pub const framesize_t_FRAMESIZE_FHD: framesize_t = 14;
pub const framesize_t_FRAMESIZE_P_HD: framesize_t = 15;
pub const framesize_t_FRAMESIZE_P_3MP: framesize_t = 16;
pub const framesize_t_FRAMESIZE_QXGA: framesize_t = 17;
pub const framesize_t_FRAMESIZE_QHD: framesize_t = 18;
pub const framesize_t_FRAMESIZE_WQXGA: framesize_t = 19;
pub const framesize_t_FRAMESIZE_P_FHD: framesize_t = 20;
pub const framesize_t_FRAMESIZE_QSXGA: framesize_t = 21;
pub const framesize_t_FRAMESIZE_INVALID: framesize_t = 22;

pub type gainceiling_t = ::std::os::raw::c_uint;
pub const gainceiling_t_GAINCEILING_2X: gainceiling_t = 0;
pub const gainceiling_t_GAINCEILING_4X: gainceiling_t = 1;
pub const gainceiling_t_GAINCEILING_8X: gainceiling_t = 2;
pub const gainceiling_t_GAINCEILING_16X: gainceiling_t = 3;
pub const gainceiling_t_GAINCEILING_32X: gainceiling_t = 4;
pub const gainceiling_t_GAINCEILING_64X: gainceiling_t = 5;
pub const gainceiling_t_GAINCEILING_128X: gainceiling_t = 6;

pub type camera_grab_mode_t = ::std::os::raw::c_uint;
pub const camera_grab_mode_t_CAMERA_GRAB_WHEN_EMPTY: camera_grab_mode_t = 0;
pub const camera_grab_mode_t_CAMERA_GRAB_LATEST: camera_grab_mode_t = 1;

pub type camera_fb_location_t = ::std::os::raw::c_uint;
pub const camera_fb_location_t_CAMERA_FB_IN_PSRAM: camera_fb_location_t = 0;
pub const camera_fb_location_t_CAMERA_FB_IN_DRAM: camera_fb_location_t = 1;

pub type ledc_timer_t = ::std::os::raw::c_uint;
pub const ledc_timer_t_LEDC_TIMER_0: ledc_timer_t = 0;

pub type ledc_channel_t = ::std::os::raw::c_uint;
pub const ledc_channel_t_LEDC_CHANNEL_0: ledc_channel_t = 0;

pub type jpg_scale_t = ::std::os::raw::c_uint;
pub const jpg_scale_t_JPG_SCALE_NONE: jpg_scale_t = 0;
pub const jpg_scale_t_JPG_SCALE_2X: jpg_scale_t = 1;
pub const jpg_scale_t_JPG_SCALE_4X: jpg_scale_t = 2;
pub const jpg_scale_t_JPG_SCALE_8X: jpg_scale_t = 3;

pub type camera_model_t = ::std::os::raw::c_uint;

#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct camera_config_t {
    pub pin_pwdn: ::std::os::raw::c_int,
    pub pin_reset: ::std::os::raw::c_int,
    pub pin_xclk: ::std::os::raw::c_int,
    pub pin_sccb_sda: ::std::os::raw::c_int,
    pub pin_sccb_scl: ::std::os::raw::c_int,
    pub pin_d7: ::std::os::raw::c_int,
    pub pin_d6: ::std::os::raw::c_int,
    pub pin_d5: ::std::os::raw::c_int,
    pub pin_d4: ::std::os::raw::c_int,
    pub pin_d3: ::std::os::raw::c_int,
    pub pin_d2: ::std::os::raw::c_int,
    pub pin_d1: ::std::os::raw::c_int,
    pub pin_d0: ::std::os::raw::c_int,
    pub pin_vsync: ::std::os::raw::c_int,
    pub pin_href: ::std::os::raw::c_int,
    pub pin_pclk: ::std::os::raw::c_int,
    pub xclk_freq_hz: ::std::os::raw::c_int,
    pub ledc_timer: ledc_timer_t,
    pub ledc_channel: ledc_channel_t,
    pub pixel_format: pixformat_t,
    pub frame_size: framesize_t,
    pub jpeg_quality: ::std::os::raw::c_int,
    pub fb_count: usize,
    pub fb_location: camera_fb_location_t,
    pub grab_mode: camera_grab_mode_t,
    pub sccb_i2c_port: ::std::os::raw::c_int,
}

#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct timeval {
    pub tv_sec: i64,
    pub tv_usec: ::std::os::raw::c_long,
}

#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct camera_fb_t {
    pub buf: *mut u8,
    pub len: usize,
    pub width: usize,
    pub height: usize,
    pub format: pixformat_t,
    pub timestamp: timeval,
}

#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct camera_sensor_id_t {
    pub MIDH: u8,
    pub MIDL: u8,
    pub PID: u16,
    pub VER: u8,
}

#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct camera_status_t {
    pub framesize: framesize_t,
    pub scale: bool,
    pub binning: bool,
    pub quality: u8,
    pub brightness: i8,
    pub contrast: i8,
    pub saturation: i8,
    pub sharpness: i8,
    pub denoise: u8,
    pub special_effect: u8,
    pub wb_mode: u8,
    pub awb: u8,
    pub awb_gain: u8,
    pub aec: u8,
    pub aec2: u8,
    pub ae_level: i8,
    pub aec_value: u16,
    pub agc: u8,
    pub agc_gain: u8,
    pub gainceiling: u8,
    pub bpc: u8,
    pub wpc: u8,
    pub raw_gma: u8,
    pub lenc: u8,
    pub hmirror: u8,
    pub vflip: u8,
    pub dcw: u8,
    pub colorbar: u8,
}

pub type sensor_int_fn =
    Option<unsafe extern "C" fn(sensor: *mut sensor_t, value: ::std::os::raw::c_int) -> ::std::os::raw::c_int>;

#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct sensor_t {
    pub id: camera_sensor_id_t,
    pub slv_addr: u8,
    pub pixformat: pixformat_t,
    pub status: camera_status_t,
    pub xclk_freq_hz: ::std::os::raw::c_int,
    pub init_status: Option<unsafe extern "C" fn(sensor: *mut sensor_t) -> ::std::os::raw::c_int>,
    pub reset: Option<unsafe extern "C" fn(sensor: *mut sensor_t) -> ::std::os::raw::c_int>,
    pub set_pixformat: Option<
        unsafe extern "C" fn(sensor: *mut sensor_t, pixformat: pixformat_t) -> ::std::os::raw::c_int,
    >,
    pub set_framesize: Option<
        unsafe extern "C" fn(sensor: *mut sensor_t, framesize: framesize_t) -> ::std::os::raw::c_int,
    >,
    pub set_contrast: sensor_int_fn,
    pub set_brightness: sensor_int_fn,
    pub set_saturation: sensor_int_fn,
    pub set_sharpness: sensor_int_fn,
    pub set_denoise: sensor_int_fn,
    pub set_gainceiling: Option<
        unsafe extern "C" fn(sensor: *mut sensor_t, gainceiling: gainceiling_t) -> ::std::os::raw::c_int,
    >,
    pub set_quality: sensor_int_fn,
    pub set_colorbar: sensor_int_fn,
    pub set_whitebal: sensor_int_fn,
    pub set_gain_ctrl: sensor_int_fn,
    pub set_exposure_ctrl: sensor_int_fn,
    pub set_hmirror: sensor_int_fn,
    pub set_vflip: sensor_int_fn,
    pub set_aec2: sensor_int_fn,
    pub set_awb_gain: sensor_int_fn,
    pub set_agc_gain: sensor_int_fn,
    pub set_aec_value: sensor_int_fn,
    pub set_special_effect: sensor_int_fn,
    pub set_wb_mode: sensor_int_fn,
    pub set_ae_level: sensor_int_fn,
    pub set_dcw: sensor_int_fn,
    pub set_bpc: sensor_int_fn,
    pub set_wpc: sensor_int_fn,
    pub set_raw_gma: sensor_int_fn,
    pub set_lenc: sensor_int_fn,
    pub get_reg: Option<
        unsafe extern "C" fn(
            sensor: *mut sensor_t,
            reg: ::std::os::raw::c_int,
            mask: ::std::os::raw::c_int,
        ) -> ::std::os::raw::c_int,
    >,
    pub set_reg: Option<
        unsafe extern "C" fn(
            sensor: *mut sensor_t,
            reg: ::std::os::raw::c_int,
            mask: ::std::os::raw::c_int,
            value: ::std::os::raw::c_int,
        ) -> ::std::os::raw::c_int,
    >,
    pub set_res_raw: Option<
        unsafe extern "C" fn(
            sensor: *mut sensor_t,
            startX: ::std::os::raw::c_int,
            startY: ::std::os::raw::c_int,
            endX: ::std::os::raw::c_int,
            endY: ::std::os::raw::c_int,
            offsetX: ::std::os::raw::c_int,
            offsetY: ::std::os::raw::c_int,
            totalX: ::std::os::raw::c_int,
            totalY: ::std::os::raw::c_int,
            outputX: ::std::os::raw::c_int,
            outputY: ::std::os::raw::c_int,
            scale: bool,
            binning: bool,
        ) -> ::std::os::raw::c_int,
    >,
    pub set_pll: Option<
        unsafe extern "C" fn(
            sensor: *mut sensor_t,
            bypass: ::std::os::raw::c_int,
            mul: ::std::os::raw::c_int,
            sys: ::std::os::raw::c_int,
            root: ::std::os::raw::c_int,
            pre: ::std::os::raw::c_int,
            seld5: ::std::os::raw::c_int,
            pclken: ::std::os::raw::c_int,
            pclk: ::std::os::raw::c_int,
        ) -> ::std::os::raw::c_int,
    >,
    pub set_xclk: Option<
        unsafe extern "C" fn(
            sensor: *mut sensor_t,
            timer: ::std::os::raw::c_int,
            xclk: ::std::os::raw::c_int,
        ) -> ::std::os::raw::c_int,
    >,
}

#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct camera_sensor_info_t {
    pub model: camera_model_t,
    pub name: *const ::std::os::raw::c_char,
    pub sccb_addr: u8,
    pub pid: ::std::os::raw::c_int,
    pub max_size: framesize_t,
    pub support_jpeg: bool,
}

pub struct EspCameraLibrary {
    __library: ::libloading::Library,
    pub esp_camera_init:
        Result<unsafe extern "C" fn(config: *const camera_config_t) -> esp_err_t, ::libloading::Error>,
    pub esp_camera_deinit: Result<unsafe extern "C" fn() -> esp_err_t, ::libloading::Error>,
    pub esp_camera_fb_get: Result<unsafe extern "C" fn() -> *mut camera_fb_t, ::libloading::Error>,
    pub esp_camera_fb_return: Result<unsafe extern "C" fn(fb: *mut camera_fb_t), ::libloading::Error>,
    pub esp_camera_sensor_get: Result<unsafe extern "C" fn() -> *mut sensor_t, ::libloading::Error>,
    pub esp_camera_sensor_get_info: Result<
        unsafe extern "C" fn(id: *mut camera_sensor_id_t) -> *mut camera_sensor_info_t,
        ::libloading::Error,
    >,
    pub esp_camera_available_frames: Result<unsafe extern "C" fn() -> bool, ::libloading::Error>,
    pub frame2jpg: Result<
        unsafe extern "C" fn(
            fb: *mut camera_fb_t,
            quality: u8,
            out: *mut *mut u8,
            out_len: *mut usize,
        ) -> bool,
        ::libloading::Error,
    >,
    pub frame2bmp: Result<
        unsafe extern "C" fn(fb: *mut camera_fb_t, out: *mut *mut u8, out_len: *mut usize) -> bool,
        ::libloading::Error,
    >,
    pub fmt2rgb888: Result<
        unsafe extern "C" fn(
            src_buf: *const u8,
            src_len: usize,
            format: pixformat_t,
            rgb_buf: *mut u8,
        ) -> bool,
        ::libloading::Error,
    >,
    pub jpg2rgb565: Result<
        unsafe extern "C" fn(
            src: *const u8,
            src_len: usize,
            out: *mut u8,
            scale: jpg_scale_t,
        ) -> bool,
        ::libloading::Error,
    >,
    pub free: Result<unsafe extern "C" fn(ptr: *mut ::std::os::raw::c_void), ::libloading::Error>,
}

impl EspCameraLibrary {
    pub unsafe fn new<P>(path: P) -> Result<Self, ::libloading::Error>
    where
        P: ::libloading::AsFilename,
    {
        let library = ::libloading::Library::new(path)?;
        Self::from_library(library)
    }

    pub unsafe fn from_library<L>(library: L) -> Result<Self, ::libloading::Error>
    where
        L: Into<::libloading::Library>,
    {
        let __library = library.into();
        let esp_camera_init = __library.get(b"esp_camera_init\0").map(|sym| *sym);
        let esp_camera_deinit = __library.get(b"esp_camera_deinit\0").map(|sym| *sym);
        let esp_camera_fb_get = __library.get(b"esp_camera_fb_get\0").map(|sym| *sym);
        let esp_camera_fb_return = __library.get(b"esp_camera_fb_return\0").map(|sym| *sym);
        let esp_camera_sensor_get = __library.get(b"esp_camera_sensor_get\0").map(|sym| *sym);
        let esp_camera_sensor_get_info = __library
            .get(b"esp_camera_sensor_get_info\0")
            .map(|sym| *sym);
        let esp_camera_available_frames = __library
            .get(b"esp_camera_available_frames\0")
            .map(|sym| *sym);
        let frame2jpg = __library.get(b"frame2jpg\0").map(|sym| *sym);
        let frame2bmp = __library.get(b"frame2bmp\0").map(|sym| *sym);
        let fmt2rgb888 = __library.get(b"fmt2rgb888\0").map(|sym| *sym);
        let jpg2rgb565 = __library.get(b"jpg2rgb565\0").map(|sym| *sym);
        let free = __library.get(b"free\0").map(|sym| *sym);
        Ok(EspCameraLibrary {
            __library,
            esp_camera_init,
            esp_camera_deinit,
            esp_camera_fb_get,
            esp_camera_fb_return,
            esp_camera_sensor_get,
            esp_camera_sensor_get_info,
            esp_camera_available_frames,
            frame2jpg,
            frame2bmp,
            fmt2rgb888,
            jpg2rgb565,
            free,
        })
    }

    pub unsafe fn esp_camera_init(&self, config: *const camera_config_t) -> esp_err_t {
        (self
            .esp_camera_init
            .as_ref()
            .expect("Expected function, got error."))(config)
    }

    pub unsafe fn esp_camera_deinit(&self) -> esp_err_t {
        (self
            .esp_camera_deinit
            .as_ref()
            .expect("Expected function, got error."))()
    }

    pub unsafe fn esp_camera_fb_get(&self) -> *mut camera_fb_t {
        (self
            .esp_camera_fb_get
            .as_ref()
            .expect("Expected function, got error."))()
    }

    pub unsafe fn esp_camera_fb_return(&self, fb: *mut camera_fb_t) {
        (self
            .esp_camera_fb_return
            .as_ref()
            .expect("Expected function, got error."))(fb)
    }

    pub unsafe fn esp_camera_sensor_get(&self) -> *mut sensor_t {
        (self
            .esp_camera_sensor_get
            .as_ref()
            .expect("Expected function, got error."))()
    }

    pub unsafe fn esp_camera_sensor_get_info(
        &self,
        id: *mut camera_sensor_id_t,
    ) -> *mut camera_sensor_info_t {
        (self
            .esp_camera_sensor_get_info
            .as_ref()
            .expect("Expected function, got error."))(id)
    }

    pub unsafe fn esp_camera_available_frames(&self) -> bool {
        (self
            .esp_camera_available_frames
            .as_ref()
            .expect("Expected function, got error."))()
    }

    pub unsafe fn frame2jpg(
        &self,
        fb: *mut camera_fb_t,
        quality: u8,
        out: *mut *mut u8,
        out_len: *mut usize,
    ) -> bool {
        (self
            .frame2jpg
            .as_ref()
            .expect("Expected function, got error."))(fb, quality, out, out_len)
    }

    pub unsafe fn frame2bmp(
        &self,
        fb: *mut camera_fb_t,
        out: *mut *mut u8,
        out_len: *mut usize,
    ) -> bool {
        (self
            .frame2bmp
            .as_ref()
            .expect("Expected function, got error."))(fb, out, out_len)
    }

    pub unsafe fn fmt2rgb888(
        &self,
        src_buf: *const u8,
        src_len: usize,
        format: pixformat_t,
        rgb_buf: *mut u8,
    ) -> bool {
        (self
            .fmt2rgb888
            .as_ref()
            .expect("Expected function, got error."))(src_buf, src_len, format, rgb_buf)
    }

    pub unsafe fn jpg2rgb565(
        &self,
        src: *const u8,
        src_len: usize,
        out: *mut u8,
        scale: jpg_scale_t,
    ) -> bool {
        (self
            .jpg2rgb565
            .as_ref()
            .expect("Expected function, got error."))(src, src_len, out, scale)
    }

    pub unsafe fn free(&self, ptr: *mut ::std::os::raw::c_void) {
        (self.free.as_ref().expect("Expected function, got error."))(ptr)
    }
}
