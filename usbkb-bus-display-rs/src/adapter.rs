//! Controller-level framing on top of a [`DisplayBus`].
//!
//! [`BusAdapter`] turns logical operations ("send opcode with these
//! arguments", "write these pixels into this window") into bus writes.
//! How arguments travel is a [`CommandFraming`] strategy picked from the
//! `data_as_commands` flag; everything else is shared.

use heapless::Vec;

use crate::area::Window;
use crate::bus::DisplayBus;
use crate::config::DisplayCommands;
use crate::error::{ConfigError, DriverError};

/// Maximum argument bytes of a single command (7-bit length field).
pub const MAX_COMMAND_ARGS: usize = 127;

/// SH1107 "set lower column address" base opcode.
const SH1107_COLUMN_LOW: u8 = 0x00;

/// SH1107 "set higher column address" base opcode.
const SH1107_COLUMN_HIGH: u8 = 0x10;

/// SH1107 "set page address" base opcode.
const SH1107_PAGE: u8 = 0xB0;

/// How command arguments are told apart from the opcode on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CommandFraming {
    /// No data/command line: opcode and arguments are all command bytes,
    /// sent as a single command write.
    DataAsCommands,
    /// Opcode as a command write, arguments as a following data write.
    CommandThenData,
}

impl CommandFraming {
    pub fn from_flag(data_as_commands: bool) -> Self {
        if data_as_commands {
            CommandFraming::DataAsCommands
        } else {
            CommandFraming::CommandThenData
        }
    }
}

/// Display bus adapter: owns the bus and applies controller framing.
pub struct BusAdapter<B> {
    bus: B,
    framing: CommandFraming,
    commands: DisplayCommands,
}

impl<B> BusAdapter<B>
where
    B: DisplayBus,
{
    pub fn new(bus: B, commands: DisplayCommands) -> Self {
        Self {
            bus,
            framing: CommandFraming::from_flag(commands.data_as_commands),
            commands,
        }
    }

    pub fn framing(&self) -> CommandFraming {
        self.framing
    }

    /// Give the bus back.
    pub fn into_bus(self) -> B {
        self.bus
    }

    /// Send `opcode` followed by `args`.
    ///
    /// # Errors
    ///
    /// * [`ConfigError::CommandTooLong`] if `args` exceeds
    ///   [`MAX_COMMAND_ARGS`]; nothing is sent.
    /// * [`DriverError::Transport`] on a bus failure.
    pub async fn send_command(
        &mut self,
        opcode: u8,
        args: &[u8],
    ) -> Result<(), DriverError<B::Error>> {
        if args.len() > MAX_COMMAND_ARGS {
            return Err(ConfigError::CommandTooLong { len: args.len() }.into());
        }

        match self.framing {
            CommandFraming::DataAsCommands => {
                let mut frame: Vec<u8, { MAX_COMMAND_ARGS + 1 }> = Vec::new();
                frame.push(opcode).ok();
                frame.extend_from_slice(args).ok();
                self.bus
                    .write_commands(&frame)
                    .await
                    .map_err(DriverError::Transport)
            }
            CommandFraming::CommandThenData => {
                self.bus
                    .write_commands(&[opcode])
                    .await
                    .map_err(DriverError::Transport)?;
                self.bus.write_data(args).await.map_err(DriverError::Transport)
            }
        }
    }

    /// Address `window` and stream `pixels` into it.
    ///
    /// 1. Column bounds (or SH1107 column nibbles).
    /// 2. Row bounds (or SH1107 page).
    /// 3. Write-memory opcode, unless arguments travel as commands. Those
    ///    controllers take RAM data directly after addressing.
    /// 4. The pixel payload as one data write.
    ///
    /// The caller holds the adapter exclusively for the whole call, so no
    /// other window can slip in between setup and payload.
    pub async fn send_window(
        &mut self,
        window: &Window,
        pixels: &[u8],
    ) -> Result<(), B::Error> {
        if self.commands.sh1107_addressing {
            let column = window.x1 as u8;
            self.bus
                .write_commands(&[
                    SH1107_COLUMN_HIGH | ((column >> 4) & 0x0F),
                    SH1107_COLUMN_LOW | (column & 0x0F),
                ])
                .await?;
            self.bus
                .write_commands(&[SH1107_PAGE | (window.y1 as u8 & 0x0F)])
                .await?;
        } else {
            self.send_bounds(self.commands.set_column, window.x1, window.x2)
                .await?;
            self.send_bounds(self.commands.set_row, window.y1, window.y2)
                .await?;
        }

        if self.framing == CommandFraming::CommandThenData {
            self.bus
                .write_commands(&[self.commands.write_memory])
                .await?;
        }
        self.bus.write_data(pixels).await
    }

    /// Send an address opcode with its start/end bounds.
    async fn send_bounds(&mut self, opcode: u8, start: u16, end: u16) -> Result<(), B::Error> {
        let mut frame: Vec<u8, 5> = Vec::new();
        frame.push(opcode).ok();
        if self.commands.single_byte_bounds {
            frame.extend_from_slice(&[start as u8, end as u8]).ok();
        } else {
            frame.extend_from_slice(&start.to_be_bytes()).ok();
            frame.extend_from_slice(&end.to_be_bytes()).ok();
        }

        match self.framing {
            CommandFraming::DataAsCommands => self.bus.write_commands(&frame).await,
            CommandFraming::CommandThenData => {
                self.bus.write_commands(&frame[..1]).await?;
                self.bus.write_data(&frame[1..]).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::{FourWireBus, I2cDisplayBus};
    use crate::mock::{Event, MockI2c, MockPin, MockSpi};
    use embassy_futures::block_on;

    fn i2c_adapter(
        commands: DisplayCommands,
    ) -> (BusAdapter<I2cDisplayBus<MockI2c>>, crate::mock::I2cLog) {
        let (i2c, log) = MockI2c::new();
        (BusAdapter::new(I2cDisplayBus::new(i2c, 0x3C), commands), log)
    }

    #[test]
    fn framing_follows_flag() {
        assert_eq!(CommandFraming::from_flag(true), CommandFraming::DataAsCommands);
        assert_eq!(CommandFraming::from_flag(false), CommandFraming::CommandThenData);
    }

    #[test]
    fn data_as_commands_sends_one_command_write() {
        let commands = DisplayCommands {
            data_as_commands: true,
            ..DisplayCommands::default()
        };
        let (mut adapter, log) = i2c_adapter(commands);
        block_on(adapter.send_command(0xA8, &[0x1F])).unwrap();

        let log = log.borrow();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].bytes, vec![0x80, 0xA8, 0x80, 0x1F]);
    }

    #[test]
    fn command_then_data_splits_opcode_and_args() {
        let (spi, events) = MockSpi::new();
        let bus = FourWireBus::new(spi, MockPin::new(events.clone()));
        let mut adapter = BusAdapter::new(bus, DisplayCommands::default());
        block_on(adapter.send_command(0x36, &[0x48])).unwrap();
        block_on(adapter.send_command(0x29, &[])).unwrap();

        assert_eq!(
            *events.borrow(),
            vec![
                Event::Pin(false),
                Event::Spi(vec![0x36]),
                Event::Pin(true),
                Event::Spi(vec![0x48]),
                Event::Pin(false),
                Event::Spi(vec![0x29]),
            ]
        );
    }

    #[test]
    fn rejects_oversized_args_before_io() {
        let (mut adapter, log) = i2c_adapter(DisplayCommands::default());
        let args = [0u8; MAX_COMMAND_ARGS + 1];
        let result = block_on(adapter.send_command(0x00, &args));
        assert!(matches!(
            result,
            Err(DriverError::Config(ConfigError::CommandTooLong { len: 128 }))
        ));
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn window_with_two_byte_bounds() {
        let (spi, events) = MockSpi::new();
        let bus = FourWireBus::new(spi, MockPin::new(events.clone()));
        let mut adapter = BusAdapter::new(
            bus,
            DisplayCommands {
                set_column: 0x2A,
                set_row: 0x2B,
                ..DisplayCommands::default()
            },
        );
        let window = Window {
            x1: 0,
            x2: 319,
            y1: 8,
            y2: 9,
        };
        block_on(adapter.send_window(&window, &[0xAB, 0xCD])).unwrap();

        let spi_writes: std::vec::Vec<std::vec::Vec<u8>> = events
            .borrow()
            .iter()
            .filter_map(|e| match e {
                Event::Spi(bytes) => Some(bytes.clone()),
                Event::Pin(_) => None,
            })
            .collect();
        assert_eq!(
            spi_writes.as_slice(),
            &[
                std::vec![0x2A],
                std::vec![0x00, 0x00, 0x01, 0x3F],
                std::vec![0x2B],
                std::vec![0x00, 0x08, 0x00, 0x09],
                std::vec![0x2C],
                std::vec![0xAB, 0xCD],
            ]
        );
    }

    #[test]
    fn window_with_single_byte_bounds_as_commands() {
        let commands = DisplayCommands {
            single_byte_bounds: true,
            data_as_commands: true,
            ..DisplayCommands::default()
        };
        let (mut adapter, log) = i2c_adapter(commands);
        let window = Window {
            x1: 0,
            x2: 127,
            y1: 0,
            y2: 3,
        };
        block_on(adapter.send_window(&window, &[0x01, 0x02])).unwrap();

        let log = log.borrow();
        assert_eq!(log.len(), 3);
        assert_eq!(log[0].bytes, std::vec![0x80, 0x21, 0x80, 0x00, 0x80, 0x7F]);
        assert_eq!(log[1].bytes, std::vec![0x80, 0x22, 0x80, 0x00, 0x80, 0x03]);
        assert_eq!(log[2].bytes, std::vec![0x40, 0x01, 0x02]);
    }

    #[test]
    fn sh1107_window_uses_nibbles_and_page() {
        let commands = DisplayCommands {
            single_byte_bounds: true,
            data_as_commands: true,
            sh1107_addressing: true,
            ..DisplayCommands::default()
        };
        let (mut adapter, log) = i2c_adapter(commands);
        let window = Window {
            x1: 0x25,
            x2: 0x7F,
            y1: 2,
            y2: 2,
        };
        block_on(adapter.send_window(&window, &[0xFF])).unwrap();

        let log = log.borrow();
        assert_eq!(log.len(), 3);
        assert_eq!(log[0].bytes, std::vec![0x80, 0x12, 0x80, 0x05]);
        assert_eq!(log[1].bytes, std::vec![0x80, 0xB2]);
        assert_eq!(log[2].bytes, std::vec![0x40, 0xFF]);
    }
}
