// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies
//
// Camera Lifecycle Tests
//
// TESTING LAYERS:
//
// Layer 1 (Simulated driver - No hardware required):
//   - quality mapping and quality property round trip
//   - single held frame across consecutive captures
//   - frame size clamping to the sensor maximum
//   - conversion rules (RGB565 only from JPEG)
//   - fb_count clamping
//   - property access before and after init, missing setters
//   - end to end JPEG capture and deinit
//
// Layer 2 (Hardware Integration - Requires ESP32 camera board):
//   - test_hardware_capture_jpeg: init, capture JPEG, deinit
//   - test_hardware_properties: contrast/brightness round trip
//
// REQUIREMENTS for Layer 2 tests (marked with #[ignore]):
//   - ESP32 or ESP32-S3 board with an OV2640-class sensor
//   - esp32-camera library reachable through ESPCAM_LIBRARY
//   - ESPCAM_BOARD set to the board at build time
//
// RUN LAYER 1:
//   cargo test --test lifecycle
//
// RUN LAYER 2 (on hardware):
//   ESPCAM_BOARD=AI_THINKER cargo test --test lifecycle -- --ignored --nocapture

use espcam::{
    board::Board,
    config::{quality_to_driver, CameraConfig, CameraConfigBuilder, Warning},
    device::{CameraDevice, State},
    driver::{Control, Driver},
    esp::EspDriver,
    format::{FrameSize, PixelFormat},
    registry::DeviceRegistry,
    sensor::{PropertyValue, PROPERTIES},
    simulated::SimulatedDriver,
    Error,
};
use rand::Rng;
use serial_test::serial;

fn builder() -> CameraConfigBuilder {
    CameraConfigBuilder::new(Board::AiThinker.defaults())
}

fn jpeg_config() -> CameraConfig {
    builder()
        .with_pixel_format(PixelFormat::Jpeg)
        .with_frame_size(FrameSize::Qvga)
        .with_jpeg_quality(80)
        .build()
        .unwrap()
}

#[test]
fn test_quality_map() {
    assert_eq!(quality_to_driver(0), 63);
    assert_eq!(quality_to_driver(100), 0);
    assert!((31..=32).contains(&quality_to_driver(50)));

    let mut rng = rand::rng();
    for _ in 0..32 {
        let a: u8 = rng.random_range(0..=100);
        let b: u8 = rng.random_range(0..=100);
        let (lo, hi) = (a.min(b), a.max(b));
        assert!(quality_to_driver(lo) >= quality_to_driver(hi));
    }
}

#[test]
fn test_quality_round_trip() {
    let registry = DeviceRegistry::new();
    let mut camera = CameraDevice::new(SimulatedDriver::new(), &registry, jpeg_config());
    camera.init().unwrap();

    let mut rng = rand::rng();
    for _ in 0..16 {
        let quality: i32 = rng.random_range(0..=100);
        camera
            .set_property("quality", PropertyValue::Int(quality))
            .unwrap();
        assert_eq!(
            camera.property("quality").unwrap(),
            PropertyValue::Int(quality)
        );
        assert_eq!(i32::from(camera.config().jpeg_quality()), quality);
        assert_eq!(
            camera.driver().get_control(Control::Quality).unwrap(),
            i32::from(quality_to_driver(quality as u8))
        );
    }
    assert!(camera.drain_warnings().is_empty());
}

#[test]
fn test_consecutive_captures_hold_one_buffer() {
    let registry = DeviceRegistry::new();
    let driver = SimulatedDriver::new();
    let mut camera = CameraDevice::new(driver, &registry, jpeg_config());
    camera.init().unwrap();

    for _ in 0..10 {
        let image = camera.capture(None).unwrap().unwrap();
        assert!(!image.is_empty());
        assert_eq!(camera.driver().outstanding_frames(), 1);
    }
    assert_eq!(camera.driver().max_outstanding_frames(), 1);
}

#[test]
fn test_frame_size_clamped_to_sensor() {
    let registry = DeviceRegistry::new();
    let driver = SimulatedDriver::new().with_max_frame_size(FrameSize::Svga);
    let mut camera = CameraDevice::new(driver, &registry, jpeg_config());
    camera.init().unwrap();
    camera.drain_warnings();

    camera
        .reconfigure(Some(FrameSize::Uxga), None, None, None)
        .unwrap();
    assert_eq!(camera.config().frame_size(), FrameSize::Svga);
    assert_eq!(
        camera.driver().active_config().map(|c| c.frame_size),
        Some(FrameSize::Svga)
    );
    assert_eq!(
        camera.drain_warnings(),
        vec![Warning::FrameSizeClamped {
            requested: FrameSize::Uxga,
            applied: FrameSize::Svga
        }]
    );
}

#[test]
fn test_initial_frame_size_clamped() {
    let registry = DeviceRegistry::new();
    let driver = SimulatedDriver::new().with_max_frame_size(FrameSize::Vga);
    let config = builder().with_frame_size(FrameSize::Qxga).build().unwrap();
    let mut camera = CameraDevice::new(driver, &registry, config);
    camera.init().unwrap();
    assert_eq!(camera.config().frame_size(), FrameSize::Vga);
    assert_eq!(camera.drain_warnings().len(), 1);
}

#[test]
fn test_rgb565_from_rgb888_unsupported() {
    let registry = DeviceRegistry::new();
    let config = builder()
        .with_pixel_format(PixelFormat::Rgb888)
        .build()
        .unwrap();
    let mut camera = CameraDevice::new(SimulatedDriver::new(), &registry, config);
    camera.init().unwrap();
    assert!(matches!(
        camera.capture(Some(PixelFormat::Rgb565)),
        Err(Error::Unsupported(_))
    ));
    assert!(matches!(
        camera.capture(Some(PixelFormat::Yuv422)),
        Err(Error::Unsupported(_))
    ));
}

#[test]
fn test_rgb565_from_jpeg() {
    let registry = DeviceRegistry::new();
    let mut camera = CameraDevice::new(SimulatedDriver::new(), &registry, jpeg_config());
    camera.init().unwrap();
    let image = camera
        .capture(Some(PixelFormat::Rgb565))
        .unwrap()
        .unwrap();
    assert_eq!(image.format(), PixelFormat::Rgb565);
    assert_eq!(image.len(), 320 * 240 * 2);
}

#[test]
fn test_conversion_failure_surfaces() {
    let registry = DeviceRegistry::new();
    let driver = SimulatedDriver::new().with_failing_conversions();
    let config = builder()
        .with_pixel_format(PixelFormat::Rgb565)
        .build()
        .unwrap();
    let mut camera = CameraDevice::new(driver, &registry, config);
    camera.init().unwrap();
    assert!(matches!(
        camera.capture(Some(PixelFormat::Jpeg)),
        Err(Error::ConversionFailed(_))
    ));
    // a plain capture still works and the failed frame was released
    assert!(camera.capture(None).unwrap().is_some());
    assert_eq!(camera.driver().max_outstanding_frames(), 1);
}

#[test]
fn test_fb_count_clamped() {
    let (config, warnings) = builder().with_fb_count(5).build_with_warnings().unwrap();
    assert_eq!(config.fb_count(), 2);
    assert_eq!(warnings.len(), 1);

    let (config, warnings) = builder().with_fb_count(0).build_with_warnings().unwrap();
    assert_eq!(config.fb_count(), 1);
    assert_eq!(warnings.len(), 1);

    let registry = DeviceRegistry::new();
    let mut camera = CameraDevice::new(SimulatedDriver::new(), &registry, jpeg_config());
    camera.init().unwrap();
    camera.reconfigure(None, None, None, Some(7)).unwrap();
    assert_eq!(camera.config().fb_count(), 2);
    assert!(matches!(
        camera.drain_warnings().as_slice(),
        [Warning::FbCountClamped {
            requested: 7,
            applied: 2
        }]
    ));
}

#[test]
fn test_properties_before_init() {
    let registry = DeviceRegistry::new();
    let mut camera = CameraDevice::new(SimulatedDriver::new(), &registry, jpeg_config());
    for prop in PROPERTIES {
        assert!(
            matches!(camera.property(prop.name), Err(Error::InvalidState(_))),
            "{} readable before init",
            prop.name
        );
    }
    assert!(matches!(
        camera.set_property("contrast", PropertyValue::Int(1)),
        Err(Error::InvalidState(_))
    ));
}

#[test]
fn test_properties_after_init() {
    let registry = DeviceRegistry::new();
    let driver = SimulatedDriver::new().without_control(Control::Lenc);
    let mut camera = CameraDevice::new(driver, &registry, jpeg_config());
    camera.init().unwrap();

    for prop in PROPERTIES {
        let result = camera.property(prop.name);
        if prop.name == "lenc" {
            assert!(matches!(result, Err(Error::Unsupported(_))));
        } else {
            assert!(result.is_ok(), "{} failed: {:?}", prop.name, result);
        }
    }
    assert!(matches!(
        camera.set_property("lenc", PropertyValue::Bool(true)),
        Err(Error::Unsupported(_))
    ));

    camera
        .set_property("hmirror", PropertyValue::Bool(true))
        .unwrap();
    assert_eq!(
        camera.property("hmirror").unwrap(),
        PropertyValue::Bool(true)
    );
    assert_eq!(
        camera.property("sensor_name").unwrap(),
        PropertyValue::Text("OV2640".to_string())
    );
    assert_eq!(
        camera.property("pixel_width").unwrap(),
        PropertyValue::Int(320)
    );
}

#[test]
fn test_property_ranges() {
    let registry = DeviceRegistry::new();
    let mut camera = CameraDevice::new(SimulatedDriver::new(), &registry, jpeg_config());
    camera.init().unwrap();

    for (name, bad) in [
        ("contrast", 3),
        ("brightness", -3),
        ("special_effect", 7),
        ("wb_mode", 5),
        ("ae_level", -5),
        ("gainceiling", 7),
        ("quality", 101),
    ] {
        assert!(
            matches!(
                camera.set_property(name, PropertyValue::Int(bad)),
                Err(Error::InvalidArgument(_))
            ),
            "{} accepted {}",
            name,
            bad
        );
    }
    assert!(matches!(
        camera.set_property("sensor_name", PropertyValue::Int(1)),
        Err(Error::InvalidArgument(_))
    ));
}

#[test]
fn test_property_not_applied_warns() {
    let registry = DeviceRegistry::new();
    let driver = SimulatedDriver::new().with_stuck_control(Control::Saturation);
    let mut camera = CameraDevice::new(driver, &registry, jpeg_config());
    camera.init().unwrap();
    camera
        .set_property("saturation", PropertyValue::Int(2))
        .unwrap();
    assert_eq!(
        camera.drain_warnings(),
        vec![Warning::PropertyNotApplied {
            property: "saturation",
            requested: 2,
            actual: 0
        }]
    );
}

#[test]
fn test_frame_size_property_reconfigures() {
    let registry = DeviceRegistry::new();
    let mut camera = CameraDevice::new(SimulatedDriver::new(), &registry, jpeg_config());
    camera.init().unwrap();
    camera
        .set_property("frame_size", PropertyValue::Int(FrameSize::Vga.raw() as i32))
        .unwrap();
    assert_eq!(camera.config().frame_size(), FrameSize::Vga);
    let image = camera.capture(None).unwrap().unwrap();
    assert_eq!((image.width(), image.height()), (640, 480));
}

#[test]
fn test_jpeg_unsupported_sensor() {
    let registry = DeviceRegistry::new();
    let driver = SimulatedDriver::new().without_jpeg();
    let mut camera = CameraDevice::new(driver, &registry, jpeg_config());
    assert!(matches!(camera.init(), Err(Error::Unsupported(_))));
    assert!(!camera.is_active());
    assert!(!registry.is_held());
}

#[test]
fn test_end_to_end_jpeg() {
    let registry = DeviceRegistry::new();
    let mut camera = CameraDevice::new(SimulatedDriver::new(), &registry, jpeg_config());
    camera.init().unwrap();

    let image = camera.capture(None).unwrap().unwrap();
    assert!(!image.is_empty());
    assert_eq!(image.format(), PixelFormat::Jpeg);
    assert_eq!(&image.data()[..2], &[0xFF, 0xD8]);

    camera.deinit().unwrap();
    assert_eq!(camera.state(), State::Deinitialized);
    assert!(matches!(camera.capture(None), Err(Error::InvalidState(_))));
}

#[test]
fn test_reinit_after_deinit() {
    let registry = DeviceRegistry::new();
    let mut camera = CameraDevice::new(SimulatedDriver::new(), &registry, jpeg_config());
    camera.init().unwrap();
    camera.deinit().unwrap();
    camera.init().unwrap();
    assert!(camera.capture(None).unwrap().is_some());
    assert_eq!(camera.driver().init_calls().len(), 4);
}

#[test]
fn test_drop_releases_lease() {
    let registry = DeviceRegistry::new();
    {
        let mut camera = CameraDevice::new(SimulatedDriver::new(), &registry, jpeg_config());
        camera.init().unwrap();
        assert!(registry.is_held());
    }
    assert!(!registry.is_held());
}

#[test]
fn test_second_device_rejected() {
    let registry = DeviceRegistry::new();
    let mut first = CameraDevice::new(SimulatedDriver::new(), &registry, jpeg_config());
    first.init().unwrap();

    let mut second = CameraDevice::new(SimulatedDriver::new(), &registry, jpeg_config());
    assert!(matches!(second.init(), Err(Error::InvalidState(_))));
    assert!(second.driver().init_calls().is_empty());

    first.deinit().unwrap();
    second.init().unwrap();
    assert!(second.is_active());
}

#[test]
fn test_normalize_failure_releases_lease() {
    let registry = DeviceRegistry::new();
    // second driver init is the one issued by normalize
    let driver = SimulatedDriver::new().with_init_failure(2, 0x105);
    let mut camera = CameraDevice::new(driver, &registry, jpeg_config());
    assert!(matches!(camera.init(), Err(Error::NotFound)));
    assert!(!camera.is_active());
    assert!(!registry.is_held());
    assert!(matches!(camera.capture(None), Err(Error::InvalidState(_))));
}

#[test]
fn test_failed_reconfigure_keeps_config() {
    let registry = DeviceRegistry::new();
    // bring up and normalize are init calls 1 and 2
    let driver = SimulatedDriver::new().with_init_failure(3, espcam_sys::ESP_ERR_NO_MEM);
    let mut camera = CameraDevice::new(driver, &registry, jpeg_config());
    camera.init().unwrap();
    let fb_count = camera.config().fb_count();

    assert!(matches!(
        camera.reconfigure(Some(FrameSize::Uxga), None, None, Some(2)),
        Err(Error::OutOfMemory)
    ));
    assert_eq!(camera.state(), State::Deinitialized);
    assert!(!registry.is_held());
    assert_eq!(camera.config().frame_size(), FrameSize::Qvga);
    assert_eq!(camera.config().fb_count(), fb_count);

    camera.init().unwrap();
    let calls = camera.driver().init_calls();
    assert_eq!(calls.len(), 5);
    assert_eq!(calls[4].frame_size, FrameSize::Qvga);
    assert_eq!(calls[4].pixel_format, PixelFormat::Jpeg);
    assert_eq!(calls[4].fb_count, fb_count);
    assert!(camera.capture(None).unwrap().is_some());
}

#[test]
fn test_deinit_failure_still_releases() {
    let registry = DeviceRegistry::new();
    // deinit 1 happens inside normalize
    let driver = SimulatedDriver::new().with_deinit_failure(2, espcam_sys::ESP_FAIL);
    let mut camera = CameraDevice::new(driver, &registry, jpeg_config());
    camera.init().unwrap();
    camera.capture(None).unwrap();

    assert!(matches!(camera.deinit(), Err(Error::Unknown(-1))));
    assert_eq!(camera.state(), State::Deinitialized);
    assert!(!camera.holds_frame());
    assert!(!registry.is_held());
    assert!(matches!(camera.capture(None), Err(Error::InvalidState(_))));

    let mut next = CameraDevice::new(SimulatedDriver::new(), &registry, jpeg_config());
    next.init().unwrap();
    assert!(registry.is_held());

    // the first device already gave up its lease and stays down
    camera.deinit().unwrap();
    assert!(registry.is_held());
}

#[ignore = "test requires an ESP32 camera board (run with --include-ignored to enable)"]
#[test]
#[serial]
fn test_hardware_capture_jpeg() -> Result<(), Error> {
    let registry = DeviceRegistry::new();
    let config = CameraConfig::builder()
        .with_pixel_format(PixelFormat::Jpeg)
        .with_frame_size(FrameSize::Qvga)
        .with_jpeg_quality(80)
        .build()?;
    let mut camera = CameraDevice::new(EspDriver::load()?, &registry, config);
    camera.init()?;
    println!("sensor: {:?}", camera.sensor_info()?);

    let image = camera.capture(None)?.ok_or(Error::Timeout)?;
    println!("captured {} bytes {}x{}", image.len(), image.width(), image.height());
    assert!(!image.is_empty());

    camera.deinit()?;
    assert!(matches!(camera.capture(None), Err(Error::InvalidState(_))));
    Ok(())
}

#[ignore = "test requires an ESP32 camera board (run with --include-ignored to enable)"]
#[test]
#[serial]
fn test_hardware_properties() -> Result<(), Error> {
    let registry = DeviceRegistry::new();
    let config = CameraConfig::builder().build()?;
    let mut camera = CameraDevice::new(EspDriver::load()?, &registry, config);
    camera.init()?;

    for value in -2..=2 {
        camera.set_property("contrast", PropertyValue::Int(value))?;
        camera.set_property("brightness", PropertyValue::Int(value))?;
    }
    for warning in camera.drain_warnings() {
        println!("warning: {}", warning);
    }
    Ok(())
}
