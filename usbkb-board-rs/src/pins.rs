//! Pin names and bus wiring.
//!
//! GPIO |   Names             | Notes
//! -----+---------------------+-----------------------------------
//!   0  | D0                  | Boot button
//!   3  | D3, SDA             | Default I2C data
//!   4  | D4, SCL             | Default I2C clock
//!   7  | D7                  | OLED I2C clock
//!   8  | D8, A5              | OLED I2C data
//!  13  | LED, D13, L         | User LED
//!  19  |                     | USB D-, never reset
//!  20  |                     | USB D+, never reset
//!  21  | NEOPIXEL_POWER      |
//!  33  | NEOPIXEL            |
//!  35  | D35, MOSI           | Default SPI
//!  36  | D36, SCK            | Default SPI
//!  37  | D37, MISO           | Default SPI
//!  38  | D38, RX             |
//!  39  | D39, TX             |

/// An ESP32-S2 GPIO number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Gpio(pub u8);

/// One entry of the board's pin-name table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PinName {
    pub name: &'static str,
    pub gpio: Gpio,
}

const fn pin(name: &'static str, gpio: u8) -> PinName {
    PinName {
        name,
        gpio: Gpio(gpio),
    }
}

/// Every user-facing pin name. A GPIO may carry several names.
pub const PIN_NAMES: [PinName; 39] = [
    pin("D0", 0),
    pin("D3", 3),
    pin("SDA", 3),
    pin("D4", 4),
    pin("SCL", 4),
    pin("D5", 5),
    pin("D6", 6),
    pin("D7", 7),
    pin("D8", 8),
    pin("A5", 8),
    pin("D9", 9),
    pin("D10", 10),
    pin("D11", 11),
    pin("D12", 12),
    pin("LED", 13),
    pin("D13", 13),
    pin("L", 13),
    pin("D14", 14),
    pin("A4", 14),
    pin("D15", 15),
    pin("A3", 15),
    pin("D16", 16),
    pin("A2", 16),
    pin("D17", 17),
    pin("A1", 17),
    pin("D18", 18),
    pin("A0", 18),
    pin("NEOPIXEL_POWER", 21),
    pin("NEOPIXEL", 33),
    pin("D35", 35),
    pin("MOSI", 35),
    pin("D36", 36),
    pin("SCK", 36),
    pin("D37", 37),
    pin("MISO", 37),
    pin("D38", 38),
    pin("RX", 38),
    pin("D39", 39),
    pin("TX", 39),
];

/// Look up a pin by name (case-sensitive).
pub fn pin_by_name(name: &str) -> Option<Gpio> {
    PIN_NAMES
        .iter()
        .find(|entry| entry.name == name)
        .map(|entry| entry.gpio)
}

/// All names of `gpio`, in table order.
pub fn names_of(gpio: Gpio) -> impl Iterator<Item = &'static str> {
    PIN_NAMES
        .iter()
        .filter(move |entry| entry.gpio == gpio)
        .map(|entry| entry.name)
}

// ── Buses ────────────────────────────────────────────────────────────────

/// I2C bus wiring and timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct I2cBusConfig {
    pub scl: Gpio,
    pub sda: Gpio,
    pub frequency_hz: u32,
    /// Clock-stretching timeout in microseconds.
    pub timeout_us: u32,
}

/// SPI bus wiring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SpiBusConfig {
    pub sck: Gpio,
    pub mosi: Gpio,
    pub miso: Gpio,
}

/// The board's `I2C` bus on the header.
pub const DEFAULT_I2C: I2cBusConfig = I2cBusConfig {
    scl: Gpio(4),
    sda: Gpio(3),
    frequency_hz: 100_000,
    timeout_us: 255,
};

/// The board's `SPI` bus on the header.
pub const DEFAULT_SPI: SpiBusConfig = SpiBusConfig {
    sck: Gpio(36),
    mosi: Gpio(35),
    miso: Gpio(37),
};

/// USB data lines, which must survive a soft reset.
pub const NEVER_RESET: [Gpio; 2] = [Gpio(19), Gpio(20)];
