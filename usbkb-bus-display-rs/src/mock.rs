//! Recording test doubles for transports, pins and delays.

use std::cell::RefCell;
use std::convert::Infallible;
use std::rc::Rc;
use std::vec::Vec;

use embassy_futures::yield_now;
use embedded_hal::digital::{self, OutputPin};
use embedded_hal::pwm::{self, SetDutyCycle};
use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::i2c::{self, ErrorKind, I2c, NoAcknowledgeSource};
use embedded_hal_async::spi::{self, SpiDevice};

use crate::layout::PixelSource;

/// One recorded I2C write, all write operations concatenated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub address: u8,
    pub bytes: Vec<u8>,
}

pub type I2cLog = Rc<RefCell<Vec<Transaction>>>;

pub struct MockI2c {
    log: I2cLog,
    fail_after: Option<usize>,
    yield_each: bool,
}

impl MockI2c {
    pub fn new() -> (Self, I2cLog) {
        let log = I2cLog::default();
        let i2c = Self {
            log: log.clone(),
            fail_after: None,
            yield_each: false,
        };
        (i2c, log)
    }

    /// Let `n` transactions succeed, NACK every one after that.
    pub fn fail_after(&mut self, n: usize) {
        self.fail_after = Some(n);
    }

    /// Yield to the executor before every transaction, so concurrent
    /// callers get a chance to interleave.
    pub fn yielding(mut self) -> Self {
        self.yield_each = true;
        self
    }
}

impl i2c::ErrorType for MockI2c {
    type Error = ErrorKind;
}

impl I2c for MockI2c {
    async fn transaction(
        &mut self,
        address: u8,
        operations: &mut [i2c::Operation<'_>],
    ) -> Result<(), Self::Error> {
        if self.yield_each {
            yield_now().await;
        }
        if let Some(n) = self.fail_after {
            if self.log.borrow().len() >= n {
                return Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Data));
            }
        }
        let mut bytes = Vec::new();
        for op in operations.iter() {
            if let i2c::Operation::Write(data) = op {
                bytes.extend_from_slice(data);
            }
        }
        self.log.borrow_mut().push(Transaction { address, bytes });
        Ok(())
    }
}

/// Ordered SPI / pin activity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Spi(Vec<u8>),
    Pin(bool),
}

pub type EventLog = Rc<RefCell<Vec<Event>>>;

pub struct MockSpi {
    events: EventLog,
}

impl MockSpi {
    pub fn new() -> (Self, EventLog) {
        let events = EventLog::default();
        (
            Self {
                events: events.clone(),
            },
            events,
        )
    }
}

impl spi::ErrorType for MockSpi {
    type Error = spi::ErrorKind;
}

impl SpiDevice for MockSpi {
    async fn transaction(
        &mut self,
        operations: &mut [spi::Operation<'_, u8>],
    ) -> Result<(), Self::Error> {
        let mut bytes = Vec::new();
        for op in operations.iter() {
            if let spi::Operation::Write(data) = op {
                bytes.extend_from_slice(data);
            }
        }
        self.events.borrow_mut().push(Event::Spi(bytes));
        Ok(())
    }
}

pub struct MockPin {
    events: EventLog,
}

impl MockPin {
    pub fn new(events: EventLog) -> Self {
        Self { events }
    }
}

impl digital::ErrorType for MockPin {
    type Error = Infallible;
}

impl OutputPin for MockPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.events.borrow_mut().push(Event::Pin(false));
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.events.borrow_mut().push(Event::Pin(true));
        Ok(())
    }
}

/// PWM channel remembering every duty cycle written.
pub struct MockPwm {
    pub duties: Rc<RefCell<Vec<u16>>>,
}

impl MockPwm {
    pub const MAX_DUTY: u16 = 1000;

    pub fn new() -> (Self, Rc<RefCell<Vec<u16>>>) {
        let duties = Rc::new(RefCell::new(Vec::new()));
        (
            Self {
                duties: duties.clone(),
            },
            duties,
        )
    }
}

impl pwm::ErrorType for MockPwm {
    type Error = Infallible;
}

impl SetDutyCycle for MockPwm {
    fn max_duty_cycle(&self) -> u16 {
        Self::MAX_DUTY
    }

    fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Self::Error> {
        self.duties.borrow_mut().push(duty);
        Ok(())
    }
}

/// Delay that returns immediately and records requested milliseconds.
#[derive(Default)]
pub struct MockDelay {
    pub delays_ms: Vec<u32>,
}

impl DelayNs for MockDelay {
    async fn delay_ns(&mut self, _ns: u32) {}

    async fn delay_ms(&mut self, ms: u32) {
        self.delays_ms.push(ms);
    }
}

/// Pixel source computing each pixel from its coordinates.
pub struct FnSource<F> {
    pub width: u16,
    pub height: u16,
    pub pixel: F,
}

impl<F> FnSource<F>
where
    F: Fn(u16, u16) -> u16,
{
    pub fn new(width: u16, height: u16, pixel: F) -> Self {
        Self {
            width,
            height,
            pixel,
        }
    }
}

impl<F> PixelSource for FnSource<F>
where
    F: Fn(u16, u16) -> u16,
{
    fn size(&self) -> (u16, u16) {
        (self.width, self.height)
    }

    fn pixel(&self, x: u16, y: u16) -> u16 {
        (self.pixel)(x, y)
    }
}
