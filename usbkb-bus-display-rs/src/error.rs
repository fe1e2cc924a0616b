//! Error types for the bus display driver.

use core::fmt;

/// Errors that can occur during display operations.
///
/// Generic over the transport error `E` so callers can still match on the
/// underlying bus failure (NACK, arbitration loss, timeout).
#[derive(Debug)]
pub enum DriverError<E> {
    /// Transport failure. The driver is [`Faulted`](crate::DriverState::Faulted)
    /// after this error: the controller state after a partial command is
    /// unspecified, so nothing is retried.
    Transport(E),
    /// Malformed configuration, detected before any transport I/O.
    Config(ConfigError),
    /// The driver faulted earlier and must be reconstructed.
    DriverFaulted,
    /// Operation needs a brightness opcode or backlight that is not configured.
    Unsupported,
    /// An operation was attempted before [`BusDisplay::init()`](crate::BusDisplay::init)
    /// completed.
    NotInitialized,
    /// The pixel source is smaller than the configured geometry.
    BufferTooSmall {
        /// Pixels required by the geometry.
        required: usize,
        /// Pixels offered by the source.
        provided: usize,
    },
    /// The backlight pin rejected the new level or duty cycle.
    Backlight,
}

impl<E> From<ConfigError> for DriverError<E> {
    fn from(error: ConfigError) -> Self {
        DriverError::Config(error)
    }
}

impl<E: fmt::Debug> fmt::Display for DriverError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DriverError::Transport(e) => write!(f, "Transport error: {:?}", e),
            DriverError::Config(e) => write!(f, "Configuration error: {}", e),
            DriverError::DriverFaulted => write!(f, "Driver faulted"),
            DriverError::Unsupported => write!(f, "Unsupported operation"),
            DriverError::NotInitialized => write!(f, "Not initialized"),
            DriverError::BufferTooSmall { required, provided } => write!(
                f,
                "Pixel source too small: required {} pixels, provided {}",
                required, provided
            ),
            DriverError::Backlight => write!(f, "Backlight pin error"),
        }
    }
}

impl<E: fmt::Debug> core::error::Error for DriverError<E> {}

#[cfg(feature = "defmt")]
impl<E> defmt::Format for DriverError<E> {
    fn format(&self, f: defmt::Formatter) {
        match self {
            DriverError::Transport(_e) => defmt::write!(f, "Transport error"),
            DriverError::Config(e) => defmt::write!(f, "Configuration error: {}", e),
            DriverError::DriverFaulted => defmt::write!(f, "Driver faulted"),
            DriverError::Unsupported => defmt::write!(f, "Unsupported operation"),
            DriverError::NotInitialized => defmt::write!(f, "Not initialized"),
            DriverError::BufferTooSmall { required, provided } => {
                defmt::write!(f, "Pixel source too small: {} < {}", provided, required)
            }
            DriverError::Backlight => defmt::write!(f, "Backlight pin error"),
        }
    }
}

/// Configuration errors. All of them are raised before the transport is used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// An init sequence entry declares more bytes than remain in the table.
    InitSequenceOverrun {
        /// Byte offset of the offending entry's opcode.
        offset: usize,
        /// Bytes the entry needs, opcode and length byte included.
        needed: usize,
        /// Total length of the table.
        len: usize,
    },
    /// Width, height or cell size is zero, or a frame buffer cannot hold it.
    InvalidGeometry,
    /// Color depth other than 1, 2, 4, 8 or 16 bits per pixel.
    UnsupportedColorDepth(u8),
    /// Native frame rate of zero.
    InvalidFrameRate,
    /// Command arguments longer than a single framed write can carry.
    CommandTooLong {
        /// Argument count that was requested.
        len: usize,
    },
    /// The config's backlight entry and the pin handed to the driver
    /// disagree: one is present and the other is not.
    BacklightMismatch {
        /// `true` if the config declares a backlight.
        configured: bool,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InitSequenceOverrun { offset, needed, len } => write!(
                f,
                "Init sequence entry at offset {} needs {} bytes but table is {} bytes long",
                offset, needed, len
            ),
            ConfigError::InvalidGeometry => write!(f, "Invalid display geometry"),
            ConfigError::UnsupportedColorDepth(depth) => {
                write!(f, "Unsupported color depth: {} bpp", depth)
            }
            ConfigError::InvalidFrameRate => write!(f, "Native frame rate must be non-zero"),
            ConfigError::CommandTooLong { len } => {
                write!(f, "Command with {} argument bytes is too long", len)
            }
            ConfigError::BacklightMismatch { configured: true } => {
                write!(f, "Backlight configured but no backlight pin given")
            }
            ConfigError::BacklightMismatch { configured: false } => {
                write!(f, "Backlight pin given but no backlight configured")
            }
        }
    }
}

impl core::error::Error for ConfigError {}
