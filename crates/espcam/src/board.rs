// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

//! Static per-board camera wiring.
//!
//! Each supported board has a [`PinMap`] giving the GPIO number of every
//! camera signal, with `-1` for signals that are not wired. The board used
//! for defaults is chosen at build time through the `ESPCAM_BOARD`
//! environment variable (for example `ESPCAM_BOARD=AI_THINKER cargo build`);
//! every table is also reachable at runtime through [`Board::from_str`].

use crate::{
    format::{FrameSize, GrabMode, PixelFormat},
    Error,
};
use serde::Serialize;
use std::{fmt, str::FromStr};

/// Pin number meaning "not connected".
pub const UNUSED_PIN: i32 = -1;

/// Default XCLK frequency when the caller does not give one.
pub const DEFAULT_XCLK_FREQ_HZ: u32 = 20_000_000;

/// Default API-facing JPEG quality.
pub const DEFAULT_JPEG_QUALITY: u8 = 85;

/// Physical pin of every camera signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PinMap {
    /// D0 through D7
    pub data: [i32; 8],
    pub xclk: i32,
    pub pclk: i32,
    pub vsync: i32,
    pub href: i32,
    pub pwdn: i32,
    pub reset: i32,
    pub sda: i32,
    pub scl: i32,
}

impl PinMap {
    /// True when every signal without which no sensor can run has a pin.
    pub fn is_complete(&self) -> bool {
        self.data.iter().all(|&pin| pin != UNUSED_PIN)
            && [self.xclk, self.pclk, self.vsync, self.href]
                .iter()
                .all(|&pin| pin != UNUSED_PIN)
    }
}

/// SoC family, which bounds the XCLK frequency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Chip {
    Esp32,
    Esp32S3,
}

impl Chip {
    /// Highest XCLK the camera peripheral accepts. The S3 has a dedicated
    /// high-speed clock path for the camera interface.
    pub fn max_xclk_hz(self) -> u32 {
        match self {
            Chip::Esp32 => 20_000_000,
            Chip::Esp32S3 => 40_000_000,
        }
    }
}

impl fmt::Display for Chip {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Chip::Esp32 => write!(f, "esp32"),
            Chip::Esp32S3 => write!(f, "esp32s3"),
        }
    }
}

/// Values substituted for options the caller leaves out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoardDefaults {
    pub chip: Chip,
    /// `None` when the board does not certify a complete wiring.
    pub pins: Option<PinMap>,
    pub xclk_freq_hz: u32,
    pub pixel_format: PixelFormat,
    pub frame_size: FrameSize,
    pub jpeg_quality: u8,
    pub fb_count: u8,
    pub grab_mode: GrabMode,
}

impl BoardDefaults {
    /// Defaults for a custom wiring on a plain ESP32, where every pin must be
    /// given explicitly.
    pub fn generic() -> Self {
        Self::for_chip(Chip::Esp32, None)
    }

    fn for_chip(chip: Chip, pins: Option<PinMap>) -> Self {
        // S3 boards have enough PSRAM bandwidth to double buffer.
        let (fb_count, grab_mode) = match chip {
            Chip::Esp32 => (1, GrabMode::WhenEmpty),
            Chip::Esp32S3 => (2, GrabMode::Latest),
        };
        BoardDefaults {
            chip,
            pins,
            xclk_freq_hz: DEFAULT_XCLK_FREQ_HZ,
            pixel_format: PixelFormat::Rgb565,
            frame_size: FrameSize::Qvga,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            fb_count,
            grab_mode,
        }
    }
}

/// Boards with a known camera wiring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Board {
    WroverKit,
    EspEye,
    M5StackPsram,
    M5StackV2Psram,
    M5StackWide,
    M5StackEsp32Cam,
    M5StackUnitCam,
    M5StackCamS3Unit,
    AiThinker,
    TtgoTJournal,
    XiaoEsp32S3,
    Esp32MpCameraBoard,
    Esp32S3CamLcd,
    Esp32S3Eye,
    FreenoveEsp32S3Cam,
    DfRobotFireBeetle2Esp32S3,
    DfRobotRomeoEsp32S3,
    TtgoTCameraPlus,
    NewEspS3Re10,
    Xenoionex,
}

const fn pins(
    data: [i32; 8],
    xclk: i32,
    pclk: i32,
    vsync: i32,
    href: i32,
    pwdn: i32,
    reset: i32,
    sda: i32,
    scl: i32,
) -> PinMap {
    PinMap {
        data,
        xclk,
        pclk,
        vsync,
        href,
        pwdn,
        reset,
        sda,
        scl,
    }
}

// M5Stack ESP32 camera modules share everything but SCCB, VSYNC and D0.
const M5STACK_DATA: [i32; 8] = [32, 35, 34, 5, 39, 18, 36, 19];

impl Board {
    pub const ALL: &'static [Board] = &[
        Board::WroverKit,
        Board::EspEye,
        Board::M5StackPsram,
        Board::M5StackV2Psram,
        Board::M5StackWide,
        Board::M5StackEsp32Cam,
        Board::M5StackUnitCam,
        Board::M5StackCamS3Unit,
        Board::AiThinker,
        Board::TtgoTJournal,
        Board::XiaoEsp32S3,
        Board::Esp32MpCameraBoard,
        Board::Esp32S3CamLcd,
        Board::Esp32S3Eye,
        Board::FreenoveEsp32S3Cam,
        Board::DfRobotFireBeetle2Esp32S3,
        Board::DfRobotRomeoEsp32S3,
        Board::TtgoTCameraPlus,
        Board::NewEspS3Re10,
        Board::Xenoionex,
    ];

    /// Identifier used by `ESPCAM_BOARD` and the CLI.
    pub fn name(self) -> &'static str {
        match self {
            Board::WroverKit => "WROVER_KIT",
            Board::EspEye => "ESP_EYE",
            Board::M5StackPsram => "M5STACK_PSRAM",
            Board::M5StackV2Psram => "M5STACK_V2_PSRAM",
            Board::M5StackWide => "M5STACK_WIDE",
            Board::M5StackEsp32Cam => "M5STACK_ESP32CAM",
            Board::M5StackUnitCam => "M5STACK_UNITCAM",
            Board::M5StackCamS3Unit => "M5STACK_CAMS3_UNIT",
            Board::AiThinker => "AI_THINKER",
            Board::TtgoTJournal => "TTGO_T_JOURNAL",
            Board::XiaoEsp32S3 => "XIAO_ESP32S3",
            Board::Esp32MpCameraBoard => "ESP32_MP_CAMERA_BOARD",
            Board::Esp32S3CamLcd => "ESP32S3_CAM_LCD",
            Board::Esp32S3Eye => "ESP32S3_EYE",
            Board::FreenoveEsp32S3Cam => "FREENOVE_ESP32S3_CAM",
            Board::DfRobotFireBeetle2Esp32S3 => "DFROBOT_FIREBEETLE2_ESP32S3",
            Board::DfRobotRomeoEsp32S3 => "DFROBOT_ROMEO_ESP32S3",
            Board::TtgoTCameraPlus => "TTGO_T_CAMERA_PLUS",
            Board::NewEspS3Re10 => "NEW_ESPS3_RE1_0",
            Board::Xenoionex => "XENOIONEX",
        }
    }

    pub fn chip(self) -> Chip {
        match self {
            Board::M5StackCamS3Unit
            | Board::XiaoEsp32S3
            | Board::Esp32S3CamLcd
            | Board::Esp32S3Eye
            | Board::FreenoveEsp32S3Cam
            | Board::DfRobotFireBeetle2Esp32S3
            | Board::DfRobotRomeoEsp32S3
            | Board::NewEspS3Re10
            | Board::Xenoionex => Chip::Esp32S3,
            _ => Chip::Esp32,
        }
    }

    pub fn pins(self) -> PinMap {
        match self {
            Board::WroverKit => pins([4, 5, 18, 19, 36, 39, 34, 35], 21, 22, 25, 23, -1, -1, 26, 27),
            Board::EspEye => pins([34, 13, 14, 35, 39, 38, 37, 36], 4, 25, 5, 27, -1, -1, 18, 23),
            Board::M5StackPsram | Board::M5StackUnitCam => {
                pins(M5STACK_DATA, 27, 21, 22, 26, -1, 15, 25, 23)
            }
            Board::M5StackV2Psram | Board::M5StackWide => {
                pins(M5STACK_DATA, 27, 21, 25, 26, -1, 15, 22, 23)
            }
            Board::M5StackEsp32Cam => {
                pins([17, 35, 34, 5, 39, 18, 36, 19], 27, 21, 22, 26, -1, 15, 25, 23)
            }
            Board::M5StackCamS3Unit => {
                pins([6, 15, 16, 7, 5, 10, 4, 13], 11, 12, 42, 18, -1, 21, 17, 41)
            }
            Board::AiThinker => pins([5, 18, 19, 21, 36, 39, 34, 35], 0, 22, 25, 23, 32, -1, 26, 27),
            Board::TtgoTJournal => {
                pins([17, 35, 34, 5, 39, 18, 36, 19], 27, 21, 22, 26, 0, 15, 25, 23)
            }
            Board::XiaoEsp32S3 => {
                pins([15, 17, 18, 16, 14, 12, 11, 48], 10, 13, 38, 47, -1, -1, 40, 39)
            }
            // Wired for the camera socket; the 18 pin header swaps D1 and D3.
            Board::Esp32MpCameraBoard => {
                pins([34, 13, 14, 35, 39, 21, 19, 36], 4, 25, 5, 27, 32, 33, 18, 23)
            }
            Board::Esp32S3CamLcd => {
                pins([13, 47, 14, 3, 12, 42, 41, 39], 40, 11, 21, 38, -1, -1, 17, 18)
            }
            Board::Esp32S3Eye | Board::FreenoveEsp32S3Cam => {
                pins([11, 9, 8, 10, 12, 18, 17, 16], 15, 13, 6, 7, -1, -1, 4, 5)
            }
            Board::DfRobotFireBeetle2Esp32S3 | Board::DfRobotRomeoEsp32S3 => {
                pins([39, 40, 41, 4, 7, 8, 46, 48], 45, 5, 6, 42, -1, -1, 1, 2)
            }
            Board::TtgoTCameraPlus => {
                pins([34, 13, 26, 35, 39, 38, 37, 36], 4, 25, 5, 27, -1, -1, 18, 23)
            }
            Board::NewEspS3Re10 => pins([5, 3, 2, 4, 6, 8, 9, 11], 10, 7, 13, 12, -1, -1, 21, 14),
            Board::Xenoionex => pins([39, 40, 17, 41, 16, 42, 18, 3], 1, 2, 45, 38, -1, -1, 8, 9),
        }
    }

    pub fn defaults(self) -> BoardDefaults {
        BoardDefaults::for_chip(self.chip(), Some(self.pins()))
    }

    /// Board named by `ESPCAM_BOARD` when this crate was built.
    pub fn selected() -> Option<Board> {
        let name = option_env!("ESPCAM_BOARD")?;
        match name.parse() {
            Ok(board) => Some(board),
            Err(_) => {
                log::warn!("ESPCAM_BOARD={} is not a known board, ignoring", name);
                None
            }
        }
    }

    /// Defaults of the build-time board, or generic defaults without one.
    pub fn selected_defaults() -> BoardDefaults {
        Board::selected()
            .map(Board::defaults)
            .unwrap_or_else(BoardDefaults::generic)
    }
}

impl FromStr for Board {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().replace('-', "_");
        Board::ALL
            .iter()
            .copied()
            .find(|board| board.name().eq_ignore_ascii_case(&wanted))
            .ok_or_else(|| Error::InvalidArgument(format!("Unknown board: {}", s)))
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}
