//! On-board 128×32 OLED.
//!
//! The panel sits on its own I2C bus (SCL GPIO7, SDA GPIO8), separate from
//! the header `I2C` bus, at address `0x3C`. It has no backlight; brightness
//! is the controller's contrast register.

use embassy_sync::blocking_mutex::raw::RawMutex;
use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::i2c::I2c;

use usbkb_bus_display_rs::{
    BusDisplay, ConfigError, DisplayCommands, DisplayConfig, DisplayGeometry, DriverError,
    I2cDisplayBus, MonoFrameBuffer, NoBacklight, RefreshPolicy, Rotation,
};

use crate::pins::{Gpio, I2cBusConfig};

pub const DISPLAY_WIDTH: u16 = 128;
pub const DISPLAY_HEIGHT: u16 = 32;

/// 7-bit I2C address of the panel.
pub const DISPLAY_ADDRESS: u8 = 0x3C;

/// Dedicated display bus.
pub const DISPLAY_I2C: I2cBusConfig = I2cBusConfig {
    scl: Gpio(7),
    sda: Gpio(8),
    frequency_hz: 100_000,
    timeout_us: 255,
};

/// Controller bring-up, in init-table form.
#[rustfmt::skip]
pub const DISPLAY_INIT_SEQUENCE: &[u8] = &[
    0xAE, 0x00,                             // display off
    0x20, 0x01, 0x10,                       // page addressing
    0x81, 0x01, 0xCF,                       // contrast
    0xA1, 0x00,                             // segment remap
    0xA6, 0x00,                             // normal (not inverted)
    0xC8, 0x00,                             // COM scan descending
    0xA8, 0x01, (DISPLAY_HEIGHT - 1) as u8, // multiplex ratio
    0xD5, 0x01, 0x80,                       // oscillator divide
    0xD9, 0x01, 0xF1,                       // pre-charge period
    0xDA, 0x01, 0x12,                       // COM pins
    0xDB, 0x01, 0x30,                       // VCOMH deselect level
    0x8D, 0x01, 0x14,                       // charge pump on
    0xAF, 0x00,                             // display on
];

pub static DISPLAY_CONFIG: DisplayConfig<'static> = DisplayConfig {
    init_sequence: DISPLAY_INIT_SEQUENCE,
    geometry: DisplayGeometry {
        width: DISPLAY_WIDTH,
        height: DISPLAY_HEIGHT,
        colstart: 0,
        rowstart: 0,
        rotation: Rotation::Rotate0,
        color_depth: 1,
        grayscale: true,
        pixels_in_byte_share_row: false,
        bytes_per_cell: 1,
        reverse_pixels_in_byte: false,
        reverse_pixels_in_word: true,
    },
    commands: DisplayCommands {
        set_column: 0x21,
        set_row: 0x22,
        write_memory: 0x2C,
        brightness: Some(0x81),
        single_byte_bounds: true,
        data_as_commands: true,
        sh1107_addressing: true,
    },
    refresh: RefreshPolicy {
        auto_refresh: true,
        native_frames_per_second: 60,
    },
    backlight: None,
    brightness: 1.0,
};

/// Bytes of a 1 bpp frame covering the whole panel.
pub const FRAME_BYTES: usize = DISPLAY_WIDTH as usize * DISPLAY_HEIGHT as usize / 8;

pub type BoardFrameBuffer = MonoFrameBuffer<FRAME_BYTES>;

/// The board's display driver over I2C peripheral `I2C`.
pub type BoardDisplay<'a, M, I2C> = BusDisplay<'a, M, I2cDisplayBus<I2C>>;

/// Blank, fully dirty frame buffer sized for the panel.
///
/// # Errors
///
/// Never in practice; the sizes are fixed at compile time.
pub fn new_frame_buffer() -> Result<BoardFrameBuffer, ConfigError> {
    BoardFrameBuffer::new(DISPLAY_WIDTH, DISPLAY_HEIGHT)
}

/// Wrap an I2C peripheral already configured from [`DISPLAY_I2C`].
pub fn display_bus<I2C: I2c>(i2c: I2C) -> I2cDisplayBus<I2C> {
    I2cDisplayBus::new(i2c, DISPLAY_ADDRESS)
}

/// Build the display driver and run the init sequence.
///
/// # Errors
///
/// [`DriverError::Transport`] if the panel does not answer; the driver is
/// dropped together with the bus.
pub async fn construct_display<M, I2C, D>(
    i2c: I2C,
    delay: &mut D,
) -> Result<BoardDisplay<'static, M, I2C>, DriverError<I2C::Error>>
where
    M: RawMutex,
    I2C: I2c,
    D: DelayNs,
{
    let display =
        BusDisplay::construct(display_bus(i2c), &DISPLAY_CONFIG, NoBacklight, delay).await?;

    #[cfg(feature = "defmt")]
    defmt::info!(
        "Display {}x{} ready at {=u8:#x}",
        DISPLAY_WIDTH,
        DISPLAY_HEIGHT,
        DISPLAY_ADDRESS
    );

    Ok(display)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::vec::Vec;

    use embassy_futures::block_on;
    use embassy_sync::blocking_mutex::raw::NoopRawMutex;
    use embedded_hal_async::i2c::{self, ErrorKind, Operation};
    use usbkb_bus_display_rs::{DriverState, InitSequence};

    type Log = Rc<RefCell<Vec<(u8, Vec<u8>)>>>;

    struct RecordingI2c(Log);

    impl i2c::ErrorType for RecordingI2c {
        type Error = ErrorKind;
    }

    impl I2c for RecordingI2c {
        async fn transaction(
            &mut self,
            address: u8,
            operations: &mut [Operation<'_>],
        ) -> Result<(), Self::Error> {
            let mut bytes = Vec::new();
            for op in operations.iter() {
                if let Operation::Write(data) = op {
                    bytes.extend_from_slice(data);
                }
            }
            self.0.borrow_mut().push((address, bytes));
            Ok(())
        }
    }

    struct NoDelay;

    impl DelayNs for NoDelay {
        async fn delay_ns(&mut self, _ns: u32) {}
    }

    #[test]
    fn init_table_shape() {
        let sequence = InitSequence::new(DISPLAY_INIT_SEQUENCE).unwrap();
        assert_eq!(DISPLAY_INIT_SEQUENCE.len(), 34);
        assert_eq!(sequence.len(), 13);

        let mux = sequence.iter().find(|c| c.opcode == 0xA8).unwrap();
        assert_eq!(mux.args, &[0x1F]);

        let last = sequence.iter().last().unwrap();
        assert_eq!(last.opcode, 0xAF);
        assert!(sequence.iter().all(|c| c.delay_ms == 10));
    }

    #[test]
    fn config_is_valid() {
        assert!(DISPLAY_CONFIG.validate().is_ok());
        assert!(DISPLAY_CONFIG.supports_brightness());
        assert_eq!(DISPLAY_CONFIG.refresh.frame_period_ms(), 17);
    }

    #[test]
    fn frame_buffer_covers_the_panel() {
        let mut frame = new_frame_buffer().unwrap();
        assert_eq!(FRAME_BYTES, 512);
        assert_eq!(frame.bounds(), DISPLAY_CONFIG.geometry.bounds());
        assert_eq!(frame.take_dirty(), Some(frame.bounds()));
    }

    #[test]
    fn construct_plays_init_then_brightness() {
        let log = Log::default();
        let display: BoardDisplay<'_, NoopRawMutex, _> =
            block_on(construct_display(RecordingI2c(log.clone()), &mut NoDelay)).unwrap();

        assert_eq!(display.state(), DriverState::Ready);

        let log = log.borrow();
        assert_eq!(log.len(), 14);
        assert!(log.iter().all(|(address, _)| *address == DISPLAY_ADDRESS));
        assert_eq!(log[0].1, [0x80, 0xAE]);
        assert_eq!(log[6].1, [0x80, 0xA8, 0x80, 0x1F]);
        assert_eq!(log[11].1, [0x80, 0x8D, 0x80, 0x14]);
        assert_eq!(log[12].1, [0x80, 0xAF]);
        assert_eq!(log[13].1, [0x80, 0x81, 0x80, 0xFF]);
    }

    #[test]
    fn full_frame_is_four_pages() {
        let log = Log::default();
        let display: BoardDisplay<'_, NoopRawMutex, _> =
            block_on(construct_display(RecordingI2c(log.clone()), &mut NoDelay)).unwrap();
        log.borrow_mut().clear();

        let mut frame = new_frame_buffer().unwrap();
        frame.set_pixel(0, 0, true);
        block_on(display.refresh(&frame, None)).unwrap();

        let log = log.borrow();
        // Column, page, data for each of the four 8-row pages.
        assert_eq!(log.len(), 12);
        assert_eq!(log[0].1, [0x80, 0x10, 0x80, 0x00]);
        assert_eq!(log[1].1, [0x80, 0xB0]);
        assert_eq!(log[2].1.len(), 1 + 128);
        assert_eq!(log[2].1[..2], [0x40, 0x01]);
        assert_eq!(log[10].1, [0x80, 0xB3]);
    }
}
