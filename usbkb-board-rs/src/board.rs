//! Board identity and reset behaviour.

use crate::pins::{Gpio, I2cBusConfig, SpiBusConfig, DEFAULT_I2C, DEFAULT_SPI, NEVER_RESET};

/// Static facts about the board, as reported to the host runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BoardInfo {
    pub name: &'static str,
    pub mcu: &'static str,
    /// Held low at reset to enter the ROM bootloader.
    pub boot_button: Gpio,
    /// Wait after a soft reset before restarting user code.
    pub autoreset_delay_ms: u32,
    /// Pins left untouched by a soft reset.
    pub never_reset: &'static [Gpio],
    pub default_i2c: I2cBusConfig,
    pub default_spi: SpiBusConfig,
}

impl BoardInfo {
    /// `true` if `gpio` must keep its configuration across a soft reset.
    pub fn is_never_reset(&self, gpio: Gpio) -> bool {
        self.never_reset.contains(&gpio)
    }
}

pub const BOARD: BoardInfo = BoardInfo {
    name: "carlossless usbkb",
    mcu: "ESP32S2",
    boot_button: Gpio(0),
    autoreset_delay_ms: 500,
    never_reset: &NEVER_RESET,
    default_i2c: DEFAULT_I2C,
    default_spi: DEFAULT_SPI,
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pins::pin_by_name;

    #[test]
    fn usb_pins_survive_reset() {
        assert!(BOARD.is_never_reset(Gpio(19)));
        assert!(BOARD.is_never_reset(Gpio(20)));
        assert!(!BOARD.is_never_reset(Gpio(7)));
    }

    #[test]
    fn boot_button_is_d0() {
        assert_eq!(pin_by_name("D0"), Some(BOARD.boot_button));
    }

    #[test]
    fn default_buses() {
        assert_eq!(BOARD.default_i2c.scl, Gpio(4));
        assert_eq!(BOARD.default_i2c.sda, Gpio(3));
        assert_eq!(BOARD.default_spi.sck, Gpio(36));
    }
}
