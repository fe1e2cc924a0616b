//! Status screen shown by the bring-up firmware.

use core::fmt::{self, Write};

use embedded_graphics::{
    mono_font::{ascii::FONT_6X10, MonoTextStyle},
    pixelcolor::BinaryColor,
    prelude::*,
    text::{Baseline, Text},
};
use heapless::String;

use crate::board::BOARD;
use crate::display::BoardFrameBuffer;

/// Capacity of the uptime line; fits any `u32` second count.
pub const UPTIME_CAPACITY: usize = 24;

/// Format `seconds` as `"up <n>s"`.
///
/// # Errors
///
/// [`fmt::Error`] if the text does not fit in `N` bytes.
pub fn uptime_line<const N: usize>(seconds: u32) -> Result<String<N>, fmt::Error> {
    let mut line = String::new();
    write!(line, "up {}s", seconds)?;
    Ok(line)
}

/// Redraw the board name and uptime. Drawing into the frame buffer cannot
/// fail; only formatting the uptime line can.
pub fn draw_status(frame: &mut BoardFrameBuffer, seconds: u32) -> Result<(), fmt::Error> {
    let style = MonoTextStyle::new(&FONT_6X10, BinaryColor::On);
    let uptime = uptime_line::<UPTIME_CAPACITY>(seconds)?;

    let Ok(()) = frame.clear(BinaryColor::Off);
    let Ok(_) = Text::with_baseline(BOARD.name, Point::zero(), style, Baseline::Top).draw(frame);
    let Ok(_) = Text::with_baseline(&uptime, Point::new(0, 16), style, Baseline::Top).draw(frame);
    Ok(())
}
