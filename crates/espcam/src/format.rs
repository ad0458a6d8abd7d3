// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

//! Closed value sets shared with the driver.
//!
//! Every enumeration here is validated by explicit membership in its `ALL`
//! list, never by comparing against the largest known discriminant, so a
//! value the driver does not know about can not slip through.

use crate::Error;
use espcam_sys as ffi;
use serde::{Serialize, Serializer};
use std::{fmt, str::FromStr};

macro_rules! named_enum {
    (
        $(#[$meta:meta])*
        $name:ident : $label:literal {
            $( $(#[$vmeta:meta])* $variant:ident = $raw:expr => $text:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl $name {
            /// Every member, in driver order.
            pub const ALL: &'static [$name] = &[ $( $name::$variant ),+ ];

            /// Constant name exposed to bindings.
            pub fn name(self) -> &'static str {
                match self {
                    $( $name::$variant => $text ),+
                }
            }

            /// Value passed to the driver.
            pub fn raw(self) -> u32 {
                match self {
                    $( $name::$variant => $raw ),+
                }
            }

            /// Look up a member by its driver value.
            pub fn from_raw(raw: u32) -> Option<$name> {
                Self::ALL.iter().copied().find(|member| member.raw() == raw)
            }
        }

        impl TryFrom<i64> for $name {
            type Error = Error;

            fn try_from(value: i64) -> Result<Self, Self::Error> {
                u32::try_from(value)
                    .ok()
                    .and_then($name::from_raw)
                    .ok_or_else(|| Error::InvalidArgument(format!("Invalid {}: {}", $label, value)))
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::ALL
                    .iter()
                    .copied()
                    .find(|member| member.name().eq_ignore_ascii_case(s))
                    .ok_or_else(|| Error::InvalidArgument(format!("Invalid {}: {}", $label, s)))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str(self.name())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.name())
            }
        }
    };
}

named_enum! {
    /// Pixel format emitted by the sensor or requested from a conversion.
    PixelFormat: "pixel_format" {
        Rgb565 = ffi::pixformat_t_PIXFORMAT_RGB565 => "RGB565",
        Yuv422 = ffi::pixformat_t_PIXFORMAT_YUV422 => "YUV422",
        Yuv420 = ffi::pixformat_t_PIXFORMAT_YUV420 => "YUV420",
        Grayscale = ffi::pixformat_t_PIXFORMAT_GRAYSCALE => "GRAYSCALE",
        Jpeg = ffi::pixformat_t_PIXFORMAT_JPEG => "JPEG",
        Rgb888 = ffi::pixformat_t_PIXFORMAT_RGB888 => "RGB888",
        Raw = ffi::pixformat_t_PIXFORMAT_RAW => "RAW",
        Rgb444 = ffi::pixformat_t_PIXFORMAT_RGB444 => "RGB444",
        Rgb555 = ffi::pixformat_t_PIXFORMAT_RGB555 => "RGB555",
    }
}

named_enum! {
    /// Sensor output resolution, ordered from smallest to largest.
    FrameSize: "frame_size" {
        R96x96 = ffi::framesize_t_FRAMESIZE_96X96 => "R96X96",
        Qqvga = ffi::framesize_t_FRAMESIZE_QQVGA => "QQVGA",
        Qcif = ffi::framesize_t_FRAMESIZE_QCIF => "QCIF",
        Hqvga = ffi::framesize_t_FRAMESIZE_HQVGA => "HQVGA",
        R240x240 = ffi::framesize_t_FRAMESIZE_240X240 => "R240X240",
        Qvga = ffi::framesize_t_FRAMESIZE_QVGA => "QVGA",
        Cif = ffi::framesize_t_FRAMESIZE_CIF => "CIF",
        Hvga = ffi::framesize_t_FRAMESIZE_HVGA => "HVGA",
        Vga = ffi::framesize_t_FRAMESIZE_VGA => "VGA",
        Svga = ffi::framesize_t_FRAMESIZE_SVGA => "SVGA",
        Xga = ffi::framesize_t_FRAMESIZE_XGA => "XGA",
        Hd = ffi::framesize_t_FRAMESIZE_HD => "HD",
        Sxga = ffi::framesize_t_FRAMESIZE_SXGA => "SXGA",
        Uxga = ffi::framesize_t_FRAMESIZE_UXGA => "UXGA",
        Fhd = ffi::framesize_t_FRAMESIZE_FHD => "FHD",
        PortraitHd = ffi::framesize_t_FRAMESIZE_P_HD => "P_HD",
        Portrait3Mp = ffi::framesize_t_FRAMESIZE_P_3MP => "P_3MP",
        Qxga = ffi::framesize_t_FRAMESIZE_QXGA => "QXGA",
        Qhd = ffi::framesize_t_FRAMESIZE_QHD => "QHD",
        Wqxga = ffi::framesize_t_FRAMESIZE_WQXGA => "WQXGA",
        PortraitFhd = ffi::framesize_t_FRAMESIZE_P_FHD => "P_FHD",
        Qsxga = ffi::framesize_t_FRAMESIZE_QSXGA => "QSXGA",
    }
}

named_enum! {
    /// Frame buffer reuse policy under backpressure.
    GrabMode: "grab_mode" {
        /// Wait for a free slot before filling it.
        WhenEmpty = ffi::camera_grab_mode_t_CAMERA_GRAB_WHEN_EMPTY => "WHEN_EMPTY",
        /// Always hand out the newest frame, overwriting older ones.
        Latest = ffi::camera_grab_mode_t_CAMERA_GRAB_LATEST => "LATEST",
    }
}

named_enum! {
    /// Maximum automatic gain applied by the sensor.
    GainCeiling: "gainceiling" {
        X2 = ffi::gainceiling_t_GAINCEILING_2X => "2X",
        X4 = ffi::gainceiling_t_GAINCEILING_4X => "4X",
        X8 = ffi::gainceiling_t_GAINCEILING_8X => "8X",
        X16 = ffi::gainceiling_t_GAINCEILING_16X => "16X",
        X32 = ffi::gainceiling_t_GAINCEILING_32X => "32X",
        X64 = ffi::gainceiling_t_GAINCEILING_64X => "64X",
        X128 = ffi::gainceiling_t_GAINCEILING_128X => "128X",
    }
}

impl FrameSize {
    /// Width and height in pixels.
    pub fn resolution(self) -> (u32, u32) {
        match self {
            FrameSize::R96x96 => (96, 96),
            FrameSize::Qqvga => (160, 120),
            FrameSize::Qcif => (176, 144),
            FrameSize::Hqvga => (240, 176),
            FrameSize::R240x240 => (240, 240),
            FrameSize::Qvga => (320, 240),
            FrameSize::Cif => (400, 296),
            FrameSize::Hvga => (480, 320),
            FrameSize::Vga => (640, 480),
            FrameSize::Svga => (800, 600),
            FrameSize::Xga => (1024, 768),
            FrameSize::Hd => (1280, 720),
            FrameSize::Sxga => (1280, 1024),
            FrameSize::Uxga => (1600, 1200),
            FrameSize::Fhd => (1920, 1080),
            FrameSize::PortraitHd => (720, 1280),
            FrameSize::Portrait3Mp => (864, 1536),
            FrameSize::Qxga => (2048, 1536),
            FrameSize::Qhd => (2560, 1440),
            FrameSize::Wqxga => (2560, 1600),
            FrameSize::PortraitFhd => (1080, 1920),
            FrameSize::Qsxga => (2560, 1920),
        }
    }

    pub fn width(self) -> u32 {
        self.resolution().0
    }

    pub fn height(self) -> u32 {
        self.resolution().1
    }
}

impl PixelFormat {
    /// Bytes per pixel for uncompressed formats, `None` for JPEG and RAW.
    pub fn bytes_per_pixel(self) -> Option<usize> {
        match self {
            PixelFormat::Grayscale => Some(1),
            PixelFormat::Rgb565
            | PixelFormat::Yuv422
            | PixelFormat::Rgb444
            | PixelFormat::Rgb555 => Some(2),
            PixelFormat::Rgb888 => Some(3),
            PixelFormat::Yuv420 | PixelFormat::Jpeg | PixelFormat::Raw => None,
        }
    }

    pub fn is_compressed(self) -> bool {
        self == PixelFormat::Jpeg
    }
}
