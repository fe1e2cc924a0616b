//! Immutable display configuration records.
//!
//! Everything a board knows about its panel lives in a [`DisplayConfig`]:
//! geometry, controller opcodes, refresh policy and backlight. Boards keep
//! one as a `static` and pass it by reference into
//! [`BusDisplay::new()`](crate::BusDisplay::new); nothing here changes after
//! construction.

use crate::area::Area;
use crate::error::ConfigError;
use crate::init_sequence::InitSequence;

// ── Geometry ─────────────────────────────────────────────────────────────

/// Display rotation relative to the panel's native orientation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Rotation {
    #[default]
    Rotate0,
    /// 90 degrees clockwise.
    Rotate90,
    Rotate180,
    /// 270 degrees clockwise.
    Rotate270,
}

impl Rotation {
    /// Build from degrees. Only multiples of 90 in `0..360` are accepted.
    pub fn from_degrees(degrees: u16) -> Option<Self> {
        match degrees {
            0 => Some(Rotation::Rotate0),
            90 => Some(Rotation::Rotate90),
            180 => Some(Rotation::Rotate180),
            270 => Some(Rotation::Rotate270),
            _ => None,
        }
    }

    pub fn degrees(self) -> u16 {
        match self {
            Rotation::Rotate0 => 0,
            Rotation::Rotate90 => 90,
            Rotation::Rotate180 => 180,
            Rotation::Rotate270 => 270,
        }
    }

    /// `true` when width and height swap between logical and native space.
    pub fn is_transposed(self) -> bool {
        matches!(self, Rotation::Rotate90 | Rotation::Rotate270)
    }
}

/// Panel geometry and pixel format.
///
/// `width` and `height` are the logical size, i.e. after rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DisplayGeometry {
    pub width: u16,
    pub height: u16,
    /// Column offset of pixel 0 in controller RAM.
    pub colstart: u16,
    /// Row offset of pixel 0 in controller RAM.
    pub rowstart: u16,
    pub rotation: Rotation,
    /// Bits per pixel: 1, 2, 4, 8 or 16.
    pub color_depth: u8,
    pub grayscale: bool,
    /// Below 8 bpp: pixels packed in one byte run along a row. When `false`
    /// a byte holds a vertical strip (SSD1306/SH1107 pages).
    pub pixels_in_byte_share_row: bool,
    /// Below 8 bpp: bytes per addressable controller cell.
    pub bytes_per_cell: u8,
    /// Below 8 bpp: first pixel of a byte goes in the most significant bits.
    pub reverse_pixels_in_byte: bool,
    /// At 16 bpp: send each pixel high byte first.
    pub reverse_pixels_in_word: bool,
}

impl Default for DisplayGeometry {
    fn default() -> Self {
        Self {
            width: 128,
            height: 32,
            colstart: 0,
            rowstart: 0,
            rotation: Rotation::Rotate0,
            color_depth: 1,
            grayscale: true,
            pixels_in_byte_share_row: false,
            bytes_per_cell: 1,
            reverse_pixels_in_byte: false,
            reverse_pixels_in_word: false,
        }
    }
}

impl DisplayGeometry {
    /// Check the geometry describes a drivable panel.
    ///
    /// # Errors
    ///
    /// * [`ConfigError::InvalidGeometry`] for a zero dimension or cell size.
    /// * [`ConfigError::UnsupportedColorDepth`] for depths other than
    ///   1, 2, 4, 8 or 16.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 || self.bytes_per_cell == 0 {
            return Err(ConfigError::InvalidGeometry);
        }
        match self.color_depth {
            1 | 2 | 4 | 8 | 16 => Ok(()),
            depth => Err(ConfigError::UnsupportedColorDepth(depth)),
        }
    }

    /// Logical bounds, origin at `(0, 0)`.
    pub fn bounds(&self) -> Area {
        Area::from_size(0, 0, self.width, self.height)
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Panel size before rotation, as `(width, height)`.
    pub fn native_size(&self) -> (u16, u16) {
        if self.rotation.is_transposed() {
            (self.height, self.width)
        } else {
            (self.width, self.height)
        }
    }

    /// `true` when several pixels share a byte.
    pub fn is_packed(&self) -> bool {
        self.color_depth < 8
    }

    /// Pixels per byte for packed depths, `1` otherwise.
    pub fn pixels_per_byte(&self) -> u16 {
        if self.is_packed() {
            8 / self.color_depth as u16
        } else {
            1
        }
    }

    /// Pixels along the packed axis per controller address unit.
    pub fn pixels_per_cell(&self) -> u16 {
        if self.is_packed() {
            self.pixels_per_byte() * self.bytes_per_cell as u16
        } else {
            1
        }
    }
}

// ── Controller commands ──────────────────────────────────────────────────

/// Controller opcodes and addressing quirks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DisplayCommands {
    pub set_column: u8,
    pub set_row: u8,
    pub write_memory: u8,
    /// Brightness/contrast opcode taking one argument byte, if any.
    pub brightness: Option<u8>,
    /// Window bounds are one byte each instead of two big-endian bytes.
    pub single_byte_bounds: bool,
    /// No data/command select line: arguments travel as command bytes.
    pub data_as_commands: bool,
    /// Column set via `0x10 | hi nibble`, `lo nibble` and page via `0xB0 | page`.
    pub sh1107_addressing: bool,
}

impl Default for DisplayCommands {
    fn default() -> Self {
        Self {
            set_column: 0x21,
            set_row: 0x22,
            write_memory: 0x2C,
            brightness: None,
            single_byte_bounds: false,
            data_as_commands: false,
            sh1107_addressing: false,
        }
    }
}

// ── Refresh policy ───────────────────────────────────────────────────────

/// When frames reach the panel.
///
/// With `auto_refresh` the refresh task pushes dirty areas at no more than
/// `native_frames_per_second`. Without it refresh is host-triggered only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RefreshPolicy {
    pub auto_refresh: bool,
    pub native_frames_per_second: u32,
}

impl Default for RefreshPolicy {
    fn default() -> Self {
        Self {
            auto_refresh: true,
            native_frames_per_second: 60,
        }
    }
}

impl RefreshPolicy {
    /// Frame period in milliseconds, rounded up so the cadence never
    /// exceeds the native frame rate.
    ///
    /// Formula: `ceil(1000 / native_frames_per_second)`.
    pub fn frame_period_ms(&self) -> u64 {
        let fps = self.native_frames_per_second.max(1) as u64;
        1000_u64.div_ceil(fps)
    }
}

// ── Backlight ────────────────────────────────────────────────────────────

/// Backlight parameters. Absent for self-emissive panels such as OLEDs.
///
/// The pin itself is the [`Backlight`](crate::Backlight) implementation
/// handed to the driver.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BacklightConfig {
    /// `true` when a high level (or high duty cycle) lights the panel.
    pub on_high: bool,
    /// PWM frequency the board should configure on the backlight pin.
    pub pwm_frequency_hz: u32,
}

impl Default for BacklightConfig {
    fn default() -> Self {
        Self {
            on_high: true,
            pwm_frequency_hz: 50_000,
        }
    }
}

// ── DisplayConfig ────────────────────────────────────────────────────────

/// Complete, immutable description of a board's display.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayConfig<'a> {
    /// Raw init sequence table, see [`InitSequence`].
    pub init_sequence: &'a [u8],
    pub geometry: DisplayGeometry,
    pub commands: DisplayCommands,
    pub refresh: RefreshPolicy,
    pub backlight: Option<BacklightConfig>,
    /// Brightness applied right after the init sequence, `0.0..=1.0`.
    pub brightness: f32,
}

impl Default for DisplayConfig<'_> {
    fn default() -> Self {
        Self {
            init_sequence: &[],
            geometry: DisplayGeometry::default(),
            commands: DisplayCommands::default(),
            refresh: RefreshPolicy::default(),
            backlight: None,
            brightness: 1.0,
        }
    }
}

impl<'a> DisplayConfig<'a> {
    /// Validate every record and parse the init sequence.
    ///
    /// # Errors
    ///
    /// Any [`ConfigError`] found; no transport is involved.
    pub fn validate(&self) -> Result<InitSequence<'a>, ConfigError> {
        self.geometry.validate()?;
        if self.refresh.native_frames_per_second == 0 {
            return Err(ConfigError::InvalidFrameRate);
        }
        InitSequence::new(self.init_sequence)
    }

    /// `true` when [`BusDisplay::set_brightness()`](crate::BusDisplay::set_brightness)
    /// has something to drive.
    pub fn supports_brightness(&self) -> bool {
        self.backlight.is_some() || self.commands.brightness.is_some()
    }
}
