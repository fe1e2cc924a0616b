//! Async bus display driver for small window-addressed panels.
//!
//! This crate drives display controllers that are set up by a table-driven
//! init sequence and refreshed through column/row address windows: SSD1306
//! and SH1107 OLEDs over I2C, and colour LCDs over SPI with a data/command
//! line. Per-panel differences are pure configuration ([`DisplayConfig`]);
//! the driver logic is shared.
//!
//! Layers, bottom up:
//!
//! - [`DisplayBus`]: command/data framing on a transport ([`I2cDisplayBus`],
//!   [`FourWireBus`], [`InterfaceBus`]).
//! - [`BusAdapter`]: opcode/argument framing and window writes.
//! - [`BusDisplay`]: init playback, refresh, brightness and the fault
//!   state machine.
//! - [`MonoFrameBuffer`]: an `embedded-graphics` draw target with dirty
//!   tracking, refreshed by [`refresh_dirty()`].
//!
//! # Quick Start
//!
//! ```ignore
//! use usbkb_bus_display_rs::{BusDisplay, I2cDisplayBus, NoBacklight, MonoFrameBuffer};
//!
//! let bus = I2cDisplayBus::new(i2c, 0x3C);
//! let display: BusDisplay<CriticalSectionRawMutex, _> =
//!     BusDisplay::construct(bus, &DISPLAY_CONFIG, NoBacklight, &mut Delay).await?;
//!
//! let mut frame = MonoFrameBuffer::<512>::new(128, 32)?;
//! Text::new("hello", Point::new(0, 10), style).draw(&mut frame)?;
//! display.refresh(&frame, frame.take_dirty()).await?;
//! ```
//!
//! # Crate Features
//!
//! - **`defmt`**: structured logging via [`defmt`].
//! - **`task`**: [`display_refresh_task()`], a frame-rate refresh loop on
//!   `embassy-time`.

#![cfg_attr(not(test), no_std)]

pub mod adapter;
pub mod area;
pub mod backlight;
pub mod bus;
pub mod config;
pub mod driver;
pub mod error;
pub mod framebuffer;
pub mod init_sequence;
pub mod layout;
pub mod refresh_task;

#[cfg(test)]
mod mock;

// ── Re-exports for convenience ───────────────────────────────────────────

pub use adapter::{BusAdapter, CommandFraming};
pub use area::{Area, Window};
pub use backlight::{Backlight, GpioBacklight, NoBacklight, PwmBacklight};
pub use bus::{DisplayBus, FourWireBus, FourWireError, I2cDisplayBus, InterfaceBus};
pub use config::{
    BacklightConfig, DisplayCommands, DisplayConfig, DisplayGeometry, RefreshPolicy, Rotation,
};
pub use driver::{BusDisplay, DriverState};
pub use error::{ConfigError, DriverError};
pub use framebuffer::MonoFrameBuffer;
pub use init_sequence::{InitCommand, InitSequence};
pub use layout::PixelSource;
#[cfg(feature = "task")]
pub use refresh_task::display_refresh_task;
pub use refresh_task::refresh_dirty;
