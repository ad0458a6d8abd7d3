// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

//! Camera lifecycle and capture.
//!
//! A [`CameraDevice`] starts out `Configured`. [`CameraDevice::init`] brings
//! the sensor up in two steps: [`InitStep::BringUp`] starts the driver at
//! QVGA/RGB565, which every sensor accepts, and [`InitStep::Normalize`]
//! reconfigures to the requested frame size and pixel format now that the
//! sensor can be queried for its limits. Any failure leaves the device
//! inactive with its registry lease released.
//!
//! The device owns at most one driver frame and one converted buffer at a
//! time. Both are released before the next capture, on reconfigure and on
//! deinit.

use crate::{
    config::{clamp_fb_count, CameraConfig, Warning},
    convert::{self, ConvertedBuffer},
    driver::{Converter, Driver, RawFrame, SensorInfo},
    format::{FrameSize, GrabMode, PixelFormat},
    registry::{DeviceLease, DeviceRegistry},
    Error,
};
use std::{fmt, time::Duration};
use unix_ts::Timestamp;

/// How long a capture waits for a frame by default, matching the
/// esp32-camera frame timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(4000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// Constructed, never initialized.
    Configured,
    Active,
    /// Between driver deinit and re-init inside a reconfigure.
    Reconfiguring,
    Deinitialized,
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            State::Configured => write!(f, "configured"),
            State::Active => write!(f, "active"),
            State::Reconfiguring => write!(f, "reconfiguring"),
            State::Deinitialized => write!(f, "deinitialized"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitStep {
    BringUp,
    Normalize,
}

/// View of a captured image, valid until the next call on the device.
#[derive(Debug, Clone, Copy)]
pub struct CapturedImage<'a> {
    data: &'a [u8],
    width: u32,
    height: u32,
    format: PixelFormat,
    bitmap: bool,
    timestamp: Timestamp,
}

impl<'a> CapturedImage<'a> {
    fn native(frame: &'a impl RawFrame) -> Self {
        CapturedImage {
            data: frame.data(),
            width: frame.width(),
            height: frame.height(),
            format: frame.format(),
            bitmap: false,
            timestamp: frame.timestamp(),
        }
    }

    fn converted(buffer: &'a ConvertedBuffer, timestamp: Timestamp) -> Self {
        CapturedImage {
            data: buffer.data(),
            width: buffer.width(),
            height: buffer.height(),
            format: buffer.format(),
            bitmap: buffer.is_bitmap(),
            timestamp,
        }
    }

    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// The data is a BMP file rather than bare pixels.
    pub fn is_bitmap(&self) -> bool {
        self.bitmap
    }

    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }
}

impl AsRef<[u8]> for CapturedImage<'_> {
    fn as_ref(&self) -> &[u8] {
        self.data
    }
}

/// The one camera attached to the driver.
pub struct CameraDevice<'r, D: Driver> {
    pub(crate) driver: D,
    registry: &'r DeviceRegistry,
    lease: Option<DeviceLease<'r>>,
    pub(crate) config: CameraConfig,
    state: State,
    held: Option<D::Frame>,
    converted: Option<ConvertedBuffer>,
    bitmap: bool,
    steps: Vec<InitStep>,
    pub(crate) warnings: Vec<Warning>,
}

impl<'r, D: Driver> CameraDevice<'r, D> {
    /// Store the configuration. Nothing touches the hardware until
    /// [`init`](Self::init).
    pub fn new(driver: D, registry: &'r DeviceRegistry, config: CameraConfig) -> Self {
        CameraDevice {
            driver,
            registry,
            lease: None,
            config,
            state: State::Configured,
            held: None,
            converted: None,
            bitmap: false,
            steps: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == State::Active
    }

    pub fn config(&self) -> &CameraConfig {
        &self.config
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Steps completed by the most recent [`init`](Self::init).
    pub fn init_steps(&self) -> &[InitStep] {
        &self.steps
    }

    /// Take the warnings raised since the last call.
    pub fn drain_warnings(&mut self) -> Vec<Warning> {
        std::mem::take(&mut self.warnings)
    }

    pub(crate) fn push_warnings(&mut self, warnings: Vec<Warning>) {
        self.warnings.extend(warnings);
    }

    /// Wrap native captures in a BMP container.
    pub fn set_bitmap(&mut self, bitmap: bool) {
        self.bitmap = bitmap;
    }

    pub fn bitmap(&self) -> bool {
        self.bitmap
    }

    pub fn init(&mut self) -> Result<(), Error> {
        if self.is_active() {
            return Ok(());
        }
        self.steps.clear();
        self.bring_up()?;
        if let Err(err) = self.normalize() {
            log::warn!("camera init failed while applying configuration: {}", err);
            if let Err(cleanup) = self.deinit() {
                log::warn!("camera deinit after failed init: {}", cleanup);
            }
            return Err(err);
        }
        log::info!(
            "camera active: {} {} fb_count {}",
            self.config.frame_size(),
            self.config.pixel_format(),
            self.config.fb_count()
        );
        Ok(())
    }

    /// Take the lease and start the driver at QVGA/RGB565.
    fn bring_up(&mut self) -> Result<(), Error> {
        let lease = self.registry.acquire()?;
        let mut native = self.config.driver_config();
        native.frame_size = FrameSize::Qvga;
        native.pixel_format = PixelFormat::Rgb565;
        self.driver.init(&native)?;
        self.lease = Some(lease);
        self.state = State::Active;
        self.steps.push(InitStep::BringUp);
        Ok(())
    }

    /// Apply the configured frame size and format to the running sensor.
    fn normalize(&mut self) -> Result<(), Error> {
        self.reconfigure(
            Some(self.config.frame_size()),
            Some(self.config.pixel_format()),
            Some(self.config.grab_mode()),
            Some(i64::from(self.config.fb_count())),
        )?;
        self.steps.push(InitStep::Normalize);
        Ok(())
    }

    /// Stop the camera. Local state is always cleared, even when the driver
    /// reports an error.
    pub fn deinit(&mut self) -> Result<(), Error> {
        if !matches!(self.state, State::Active | State::Reconfiguring) {
            return Ok(());
        }
        let result = self.shut_down();
        log::info!("camera deinitialized");
        result
    }

    fn shut_down(&mut self) -> Result<(), Error> {
        self.release_buffers();
        let result = self.driver.deinit();
        if let Err(err) = &result {
            log::warn!("camera driver deinit failed: {}", err);
        }
        self.state = State::Deinitialized;
        self.lease = None;
        result
    }

    /// Change capture settings on an active camera. `None` keeps the
    /// current value.
    pub fn reconfigure(
        &mut self,
        frame_size: Option<FrameSize>,
        pixel_format: Option<PixelFormat>,
        grab_mode: Option<GrabMode>,
        fb_count: Option<i64>,
    ) -> Result<(), Error> {
        self.require_active()?;
        let info = self.driver.sensor_info()?;

        let pixel_format = pixel_format.unwrap_or(self.config.pixel_format());
        if pixel_format == PixelFormat::Jpeg && !info.supports_jpeg {
            return Err(Error::Unsupported(format!(
                "JPEG format is not supported by sensor {}",
                info.name
            )));
        }

        let mut frame_size = frame_size.unwrap_or(self.config.frame_size());
        if frame_size > info.max_frame_size {
            Warning::FrameSizeClamped {
                requested: frame_size,
                applied: info.max_frame_size,
            }
            .raise(&mut self.warnings);
            frame_size = info.max_frame_size;
        }

        let grab_mode = grab_mode.unwrap_or(self.config.grab_mode());
        let fb_count = clamp_fb_count(
            fb_count.unwrap_or(i64::from(self.config.fb_count())),
            &mut self.warnings,
        );

        log::debug!(
            "reconfigure to {} {} {} fb_count {}",
            frame_size,
            pixel_format,
            grab_mode,
            fb_count
        );
        self.state = State::Reconfiguring;
        self.release_buffers();
        if let Err(err) = self.driver.deinit() {
            self.state = State::Deinitialized;
            self.lease = None;
            return Err(err);
        }

        // the stored config only changes once the driver has accepted it
        let mut candidate = self.config.clone();
        candidate.apply(frame_size, pixel_format, grab_mode, fb_count);
        if let Err(err) = self.driver.init(&candidate.driver_config()) {
            log::warn!("camera re-init failed: {}", err);
            self.state = State::Deinitialized;
            self.lease = None;
            return Err(err);
        }
        self.config = candidate;
        self.state = State::Active;
        Ok(())
    }

    pub(crate) fn require_active(&self) -> Result<(), Error> {
        if self.is_active() {
            Ok(())
        } else {
            Err(Error::InvalidState("Camera not initialized".to_string()))
        }
    }

    /// Return the held frame to the driver.
    pub fn free_buffer(&mut self) {
        if let Some(frame) = self.held.take() {
            log::trace!("returning frame buffer");
            self.driver.return_frame(frame);
        }
    }

    fn release_buffers(&mut self) {
        self.free_buffer();
        self.converted = None;
    }

    /// Whether the driver has a filled frame waiting.
    pub fn frame_available(&self) -> Result<bool, Error> {
        self.require_active()?;
        self.driver.frame_available()
    }

    /// Whether a frame is currently held by the device.
    pub fn holds_frame(&self) -> bool {
        self.held.is_some()
    }

    pub fn sensor_info(&self) -> Result<SensorInfo, Error> {
        self.require_active()?;
        self.driver.sensor_info()
    }

    pub fn sensor_name(&self) -> Result<String, Error> {
        Ok(self.sensor_info()?.name)
    }

    pub fn supports_jpeg(&self) -> Result<bool, Error> {
        Ok(self.sensor_info()?.supports_jpeg)
    }

    pub fn max_frame_size(&self) -> Result<FrameSize, Error> {
        Ok(self.sensor_info()?.max_frame_size)
    }

    pub fn sccb_address(&self) -> Result<u8, Error> {
        Ok(self.sensor_info()?.sccb_address)
    }

    pub fn pixel_width(&self) -> Result<u32, Error> {
        self.require_active()?;
        Ok(self.config.frame_size().width())
    }

    pub fn pixel_height(&self) -> Result<u32, Error> {
        self.require_active()?;
        Ok(self.config.frame_size().height())
    }
}

impl<D: Converter> CameraDevice<'_, D> {
    /// Capture a frame, converted to `output` when it differs from the
    /// native format. `Ok(None)` when no frame arrived in
    /// [`DEFAULT_TIMEOUT`].
    pub fn capture(&mut self, output: Option<PixelFormat>) -> Result<Option<CapturedImage<'_>>, Error> {
        self.capture_with_timeout(output, DEFAULT_TIMEOUT)
    }

    pub fn capture_with_timeout(
        &mut self,
        output: Option<PixelFormat>,
        timeout: Duration,
    ) -> Result<Option<CapturedImage<'_>>, Error> {
        self.require_active()?;
        self.release_buffers();

        let frame = match self.driver.get_frame(timeout)? {
            Some(frame) => frame,
            None => {
                log::debug!("no frame within {:?}", timeout);
                return Ok(None);
            }
        };
        log::trace!(
            "frame {}x{} {} {} bytes",
            frame.width(),
            frame.height(),
            frame.format(),
            frame.len()
        );

        let quality = self.config.driver_quality();
        let frame = &*self.held.insert(frame);
        let native = frame.format();
        match output {
            Some(target) if target != native => {
                let buffer = convert::convert(&self.driver, frame, target, quality)?;
                let timestamp = frame.timestamp();
                let buffer = self.converted.insert(buffer);
                Ok(Some(CapturedImage::converted(buffer, timestamp)))
            }
            _ if self.bitmap => {
                let buffer = convert::bitmap(&self.driver, frame)?;
                let timestamp = frame.timestamp();
                let buffer = self.converted.insert(buffer);
                Ok(Some(CapturedImage::converted(buffer, timestamp)))
            }
            _ => Ok(Some(CapturedImage::native(frame))),
        }
    }
}

impl<D: Driver> fmt::Debug for CameraDevice<'_, D> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("CameraDevice")
            .field("state", &self.state)
            .field("config", &self.config)
            .field("holds_frame", &self.held.is_some())
            .field("bitmap", &self.bitmap)
            .finish()
    }
}

impl<D: Driver> Drop for CameraDevice<'_, D> {
    fn drop(&mut self) {
        if let Err(err) = self.deinit() {
            log::warn!("camera deinit on drop failed: {}", err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{board::Board, config::CameraConfigBuilder, simulated::SimulatedDriver};

    fn config() -> CameraConfig {
        CameraConfigBuilder::new(Board::AiThinker.defaults())
            .with_pixel_format(PixelFormat::Jpeg)
            .with_frame_size(FrameSize::Vga)
            .build()
            .unwrap()
    }

    #[test]
    fn test_two_phase_init() {
        let registry = DeviceRegistry::new();
        let mut camera = CameraDevice::new(SimulatedDriver::new(), &registry, config());
        assert_eq!(camera.state(), State::Configured);
        assert!(camera.driver().init_calls().is_empty());

        camera.init().unwrap();
        assert_eq!(camera.init_steps(), &[InitStep::BringUp, InitStep::Normalize]);

        let calls = camera.driver().init_calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].frame_size, FrameSize::Qvga);
        assert_eq!(calls[0].pixel_format, PixelFormat::Rgb565);
        assert_eq!(calls[1].frame_size, FrameSize::Vga);
        assert_eq!(calls[1].pixel_format, PixelFormat::Jpeg);
        assert!(registry.is_held());

        // idempotent
        camera.init().unwrap();
        assert_eq!(camera.driver().init_calls().len(), 2);
    }

    #[test]
    fn test_bring_up_failure_releases_lease() {
        let registry = DeviceRegistry::new();
        let driver = SimulatedDriver::new().with_init_failure(1, espcam_sys::ESP_ERR_CAMERA_NOT_DETECTED);
        let mut camera = CameraDevice::new(driver, &registry, config());
        assert!(matches!(camera.init(), Err(Error::NotFound)));
        assert!(!camera.is_active());
        assert!(!registry.is_held());
        assert!(camera.init_steps().is_empty());
    }

    #[test]
    fn test_normalize_failure() {
        let registry = DeviceRegistry::new();
        let driver = SimulatedDriver::new().with_init_failure(2, espcam_sys::ESP_ERR_NO_MEM);
        let mut camera = CameraDevice::new(driver, &registry, config());
        assert!(matches!(camera.init(), Err(Error::OutOfMemory)));
        assert!(!camera.is_active());
        assert!(!registry.is_held());
        assert_eq!(camera.init_steps(), &[InitStep::BringUp]);
    }

    #[test]
    fn test_deinit_clears_state() {
        let registry = DeviceRegistry::new();
        let mut camera = CameraDevice::new(SimulatedDriver::new(), &registry, config());
        camera.deinit().unwrap();
        assert_eq!(camera.driver().deinit_calls(), 0);

        camera.init().unwrap();
        camera.capture(None).unwrap();
        assert!(camera.holds_frame());
        camera.deinit().unwrap();
        assert!(!camera.holds_frame());
        assert_eq!(camera.state(), State::Deinitialized);
        assert!(!registry.is_held());
        assert!(matches!(camera.capture(None), Err(Error::InvalidState(_))));
    }

    #[test]
    fn test_capture_releases_previous() {
        let registry = DeviceRegistry::new();
        let mut camera = CameraDevice::new(SimulatedDriver::new(), &registry, config());
        camera.init().unwrap();
        for _ in 0..5 {
            assert!(camera.capture(None).unwrap().is_some());
        }
        assert_eq!(camera.driver().max_outstanding_frames(), 1);

        camera.free_buffer();
        assert_eq!(camera.driver().outstanding_frames(), 0);
        assert!(camera.frame_available().unwrap());
    }

    #[test]
    fn test_capture_timeout() {
        let registry = DeviceRegistry::new();
        let mut camera =
            CameraDevice::new(SimulatedDriver::new().without_frames(), &registry, config());
        camera.init().unwrap();
        assert!(camera
            .capture_with_timeout(None, Duration::from_millis(10))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_bitmap_native_only() {
        let registry = DeviceRegistry::new();
        let mut camera = CameraDevice::new(SimulatedDriver::new(), &registry, config());
        camera.init().unwrap();
        camera.set_bitmap(true);

        let image = camera.capture(None).unwrap().unwrap();
        assert!(image.is_bitmap());
        assert_eq!(&image.data()[..2], b"BM");

        let image = camera.capture(Some(PixelFormat::Rgb888)).unwrap().unwrap();
        assert!(!image.is_bitmap());
        assert_eq!(image.len(), 640 * 480 * 3);
    }

    #[test]
    fn test_reconfigure_requires_active() {
        let registry = DeviceRegistry::new();
        let mut camera = CameraDevice::new(SimulatedDriver::new(), &registry, config());
        assert!(matches!(
            camera.reconfigure(Some(FrameSize::Svga), None, None, None),
            Err(Error::InvalidState(_))
        ));
    }

    #[test]
    fn test_second_device_rejected() {
        let registry = DeviceRegistry::new();
        let mut first = CameraDevice::new(SimulatedDriver::new(), &registry, config());
        let mut second = CameraDevice::new(SimulatedDriver::new(), &registry, config());
        first.init().unwrap();
        assert!(matches!(second.init(), Err(Error::InvalidState(_))));
        assert!(second.driver().init_calls().is_empty());

        drop(first);
        second.init().unwrap();
    }
}
