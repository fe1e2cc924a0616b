//! Physical command/data framing.
//!
//! A [`DisplayBus`] knows how to put "these bytes are commands" and "these
//! bytes are data" on the wire. Three transports are provided:
//!
//! - [`I2cDisplayBus`]: SSD1306-style control bytes over I2C.
//! - [`FourWireBus`]: SPI plus a data/command select pin.
//! - [`InterfaceBus`]: any [`display_interface`] implementation.

use core::fmt::Debug;

use display_interface::{AsyncWriteOnlyDataCommand, DataFormat, DisplayError};
use embedded_hal::digital::OutputPin;
use embedded_hal_async::i2c::{I2c, Operation};
use embedded_hal_async::spi::SpiDevice;

/// I2C control byte announcing one command byte (Co = 1, D/C# = 0).
pub const CONTROL_COMMAND: u8 = 0x80;

/// I2C control byte announcing a run of data bytes (Co = 0, D/C# = 1).
pub const CONTROL_DATA: u8 = 0x40;

/// Command bytes framed into a single I2C write.
const COMMANDS_PER_WRITE: usize = 128;

/// Transport carrying command and data writes to a display controller.
///
/// Each call is one bus transaction (one I2C write, one SPI transfer), which
/// is also what test doubles observe.
#[allow(async_fn_in_trait)]
pub trait DisplayBus {
    /// Underlying transport error.
    type Error: Debug;

    /// Write `bytes` framed as controller commands.
    async fn write_commands(&mut self, bytes: &[u8]) -> Result<(), Self::Error>;

    /// Write `bytes` framed as data (command arguments or RAM contents).
    async fn write_data(&mut self, bytes: &[u8]) -> Result<(), Self::Error>;
}

// ── I2C ──────────────────────────────────────────────────────────────────

/// I2C transport for controllers without a data/command line.
///
/// Every command byte is preceded by [`CONTROL_COMMAND`] inside one write;
/// data goes out as one write starting with [`CONTROL_DATA`].
pub struct I2cDisplayBus<I2C> {
    i2c: I2C,
    address: u8,
}

impl<I2C> I2cDisplayBus<I2C>
where
    I2C: I2c,
{
    /// # Arguments
    /// * `i2c` — I2C peripheral (takes ownership for exclusive access).
    /// * `address` — 7-bit device address (typically `0x3C` or `0x3D`).
    pub fn new(i2c: I2C, address: u8) -> Self {
        Self { i2c, address }
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    /// Give the I2C peripheral back.
    pub fn release(self) -> I2C {
        self.i2c
    }
}

impl<I2C> DisplayBus for I2cDisplayBus<I2C>
where
    I2C: I2c,
{
    type Error = I2C::Error;

    async fn write_commands(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
        let mut frame = [0u8; 2 * COMMANDS_PER_WRITE];
        for chunk in bytes.chunks(COMMANDS_PER_WRITE) {
            for (slot, &byte) in frame.chunks_exact_mut(2).zip(chunk) {
                slot[0] = CONTROL_COMMAND;
                slot[1] = byte;
            }
            self.i2c.write(self.address, &frame[..2 * chunk.len()]).await?;
        }
        Ok(())
    }

    async fn write_data(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
        if bytes.is_empty() {
            return Ok(());
        }
        // Adjacent write operations go out back to back in one transfer.
        self.i2c
            .transaction(
                self.address,
                &mut [Operation::Write(&[CONTROL_DATA]), Operation::Write(bytes)],
            )
            .await
    }
}

// ── SPI ──────────────────────────────────────────────────────────────────

/// Errors from a [`FourWireBus`].
#[derive(Debug)]
pub enum FourWireError<SpiErr, PinErr> {
    /// SPI communication error.
    Spi(SpiErr),
    /// Data/command pin error.
    Pin(PinErr),
}

impl<SpiErr: Debug, PinErr: Debug> core::fmt::Display for FourWireError<SpiErr, PinErr> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            FourWireError::Spi(e) => write!(f, "SPI error: {e:?}"),
            FourWireError::Pin(e) => write!(f, "Pin error: {e:?}"),
        }
    }
}

/// SPI transport with a dedicated data/command select line.
///
/// DC low marks command bytes, DC high marks data bytes.
pub struct FourWireBus<SPI, DC> {
    spi: SPI,
    dc: DC,
}

impl<SPI, DC> FourWireBus<SPI, DC>
where
    SPI: SpiDevice,
    DC: OutputPin,
{
    pub fn new(spi: SPI, dc: DC) -> Self {
        Self { spi, dc }
    }

    /// Give the SPI device and DC pin back.
    pub fn release(self) -> (SPI, DC) {
        (self.spi, self.dc)
    }
}

impl<SPI, DC> DisplayBus for FourWireBus<SPI, DC>
where
    SPI: SpiDevice,
    DC: OutputPin,
{
    type Error = FourWireError<SPI::Error, DC::Error>;

    async fn write_commands(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
        self.dc.set_low().map_err(FourWireError::Pin)?;
        self.spi.write(bytes).await.map_err(FourWireError::Spi)
    }

    async fn write_data(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
        if bytes.is_empty() {
            return Ok(());
        }
        self.dc.set_high().map_err(FourWireError::Pin)?;
        self.spi.write(bytes).await.map_err(FourWireError::Spi)
    }
}

// ── display-interface ────────────────────────────────────────────────────

/// Adapter for transports that already implement [`AsyncWriteOnlyDataCommand`].
pub struct InterfaceBus<DI> {
    interface: DI,
}

impl<DI> InterfaceBus<DI>
where
    DI: AsyncWriteOnlyDataCommand,
{
    pub fn new(interface: DI) -> Self {
        Self { interface }
    }

    pub fn release(self) -> DI {
        self.interface
    }
}

impl<DI> DisplayBus for InterfaceBus<DI>
where
    DI: AsyncWriteOnlyDataCommand,
{
    type Error = DisplayError;

    async fn write_commands(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
        self.interface.send_commands(DataFormat::U8(bytes)).await
    }

    async fn write_data(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
        if bytes.is_empty() {
            return Ok(());
        }
        self.interface.send_data(DataFormat::U8(bytes)).await
    }
}
