// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

//! Software conversion of captured frames.
//!
//! Only three targets are offered: JPEG from any native format, RGB888 from
//! any native format, and RGB565 from native JPEG. A BMP container around
//! the native frame is available separately. Output buffers are allocated
//! fallibly so a large frame on a small heap reports `OutOfMemory` instead
//! of aborting.

use crate::{
    driver::{Converter, RawFrame},
    format::PixelFormat,
    Error,
};

/// Heap buffer produced by a conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertedBuffer {
    data: Vec<u8>,
    width: u32,
    height: u32,
    format: PixelFormat,
    bitmap: bool,
}

impl ConvertedBuffer {
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Pixel format of the content; for a bitmap, the format of its pixels.
    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn is_bitmap(&self) -> bool {
        self.bitmap
    }
}

/// Zeroed buffer of `len` bytes, or `OutOfMemory`.
pub(crate) fn allocate(len: usize) -> Result<Vec<u8>, Error> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(len).map_err(|_| Error::OutOfMemory)?;
    buf.resize(len, 0);
    Ok(buf)
}

fn pixel_bytes(frame: &impl RawFrame, bytes_per_pixel: usize) -> Result<usize, Error> {
    (frame.width() as usize)
        .checked_mul(frame.height() as usize)
        .and_then(|pixels| pixels.checked_mul(bytes_per_pixel))
        .ok_or(Error::OutOfMemory)
}

/// Convert `frame` to `target`. `quality` is on the driver's 0-63 scale and
/// only used for JPEG.
pub fn convert<C: Converter>(
    converter: &C,
    frame: &C::Frame,
    target: PixelFormat,
    quality: u8,
) -> Result<ConvertedBuffer, Error> {
    let native = frame.format();
    log::trace!(
        "converting {}x{} {} frame to {}",
        frame.width(),
        frame.height(),
        native,
        target
    );

    let data = match target {
        PixelFormat::Jpeg => converter.encode_jpeg(frame, quality)?,
        PixelFormat::Rgb888 => {
            let mut out = allocate(pixel_bytes(frame, 3)?)?;
            converter.to_rgb888(frame, &mut out)?;
            out
        }
        PixelFormat::Rgb565 => {
            if native != PixelFormat::Jpeg {
                return Err(Error::Unsupported(format!(
                    "Can only convert JPEG to RGB565, not {}",
                    native
                )));
            }
            let mut out = allocate(pixel_bytes(frame, 2)?)?;
            converter.decode_jpeg_rgb565(frame, &mut out)?;
            out
        }
        other => {
            return Err(Error::Unsupported(format!(
                "Cannot convert {} to {}",
                native, other
            )))
        }
    };

    Ok(ConvertedBuffer {
        data,
        width: frame.width(),
        height: frame.height(),
        format: target,
        bitmap: false,
    })
}

/// Wrap the native frame in a BMP container.
pub fn bitmap<C: Converter>(converter: &C, frame: &C::Frame) -> Result<ConvertedBuffer, Error> {
    let data = converter.wrap_bmp(frame)?;
    Ok(ConvertedBuffer {
        data,
        width: frame.width(),
        height: frame.height(),
        format: PixelFormat::Rgb888,
        bitmap: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        driver::{Driver, DriverConfig},
        format::{FrameSize, GrabMode},
        simulated::SimulatedDriver,
    };
    use std::time::Duration;

    fn frame_in(format: PixelFormat) -> (SimulatedDriver, <SimulatedDriver as Driver>::Frame) {
        let mut driver = SimulatedDriver::new();
        driver
            .init(&DriverConfig {
                pins: crate::board::Board::EspEye.pins(),
                xclk_freq_hz: 20_000_000,
                pixel_format: format,
                frame_size: FrameSize::Qqvga,
                jpeg_quality: 12,
                fb_count: 1,
                grab_mode: GrabMode::WhenEmpty,
                sccb_port: -1,
            })
            .unwrap();
        let frame = driver.get_frame(Duration::from_millis(10)).unwrap().unwrap();
        (driver, frame)
    }

    #[test]
    fn test_rgb888_size() {
        let (driver, frame) = frame_in(PixelFormat::Rgb565);
        let out = convert(&driver, &frame, PixelFormat::Rgb888, 12).unwrap();
        assert_eq!(out.data().len(), 160 * 120 * 3);
        assert_eq!(out.format(), PixelFormat::Rgb888);
        assert!(!out.is_bitmap());
    }

    #[test]
    fn test_rgb565_requires_jpeg() {
        let (driver, frame) = frame_in(PixelFormat::Rgb888);
        assert!(matches!(
            convert(&driver, &frame, PixelFormat::Rgb565, 12),
            Err(Error::Unsupported(_))
        ));

        let (driver, frame) = frame_in(PixelFormat::Jpeg);
        let out = convert(&driver, &frame, PixelFormat::Rgb565, 12).unwrap();
        assert_eq!(out.data().len(), 160 * 120 * 2);
    }

    #[test]
    fn test_other_targets_unsupported() {
        let (driver, frame) = frame_in(PixelFormat::Rgb565);
        for target in [PixelFormat::Yuv422, PixelFormat::Grayscale, PixelFormat::Raw] {
            assert!(matches!(
                convert(&driver, &frame, target, 12),
                Err(Error::Unsupported(_))
            ));
        }
    }

    #[test]
    fn test_jpeg_encode() {
        let (driver, frame) = frame_in(PixelFormat::Grayscale);
        let out = convert(&driver, &frame, PixelFormat::Jpeg, 12).unwrap();
        assert_eq!(&out.data()[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn test_bitmap_header() {
        let (driver, frame) = frame_in(PixelFormat::Rgb565);
        let out = bitmap(&driver, &frame).unwrap();
        assert!(out.is_bitmap());
        assert_eq!(&out.data()[..2], b"BM");
    }

    #[test]
    fn test_allocate() {
        assert_eq!(allocate(16).unwrap().len(), 16);
        assert!(matches!(allocate(usize::MAX), Err(Error::OutOfMemory)));
    }
}
