//! Board support for the carlossless usbkb (ESP32-S2).
//!
//! Everything here is immutable configuration: the pin-name table, the
//! default I2C and SPI buses, and the on-board 128×32 OLED with its init
//! sequence. Firmware passes these records by reference into the HAL and
//! into [`usbkb_bus_display_rs`]; nothing is global mutable state.
//! [`status`] draws the bring-up firmware's status screen.
//!
//! # Quick Start
//!
//! ```ignore
//! use usbkb_board::display::{construct_display, DISPLAY_I2C};
//!
//! // Build the display I2C bus from DISPLAY_I2C (SCL GPIO7, SDA GPIO8).
//! let display: BoardDisplay<CriticalSectionRawMutex, _> =
//!     construct_display(i2c, &mut Delay).await?;
//! ```
//!
//! # Crate Features
//!
//! - **`defmt`**: `defmt::Format` on board types, forwarded to the driver.
//! - **`task`**: forwards the driver's refresh task.

#![cfg_attr(not(test), no_std)]

pub mod board;
pub mod display;
pub mod pins;
pub mod status;

// ── Re-exports for convenience ───────────────────────────────────────────

pub use board::{BoardInfo, BOARD};
pub use display::{construct_display, BoardDisplay, BoardFrameBuffer, DISPLAY_CONFIG};
pub use pins::{pin_by_name, Gpio, I2cBusConfig, PinName, SpiBusConfig, PIN_NAMES};
