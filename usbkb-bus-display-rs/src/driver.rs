//! Bus display driver: init playback, windowed refresh and brightness.
//!
//! [`BusDisplay`] owns one [`BusAdapter`] (and so one physical bus) plus an
//! optional backlight pin, and walks the controller through a small state
//! machine:
//!
//! ```text
//! Uninitialized ──init()──▶ Initializing ──▶ Ready
//!                                 │            │
//!                                 └──▶ Faulted ◀┘   (any transport failure)
//! ```
//!
//! `Faulted` is terminal: the controller state after a partial command is
//! unknown, so the driver must be rebuilt with [`BusDisplay::deinit()`] and
//! [`BusDisplay::new()`].

use core::cell::Cell;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex as BlockingMutex;
use embassy_sync::mutex::Mutex;
use embedded_hal_async::delay::DelayNs;

use crate::adapter::BusAdapter;
use crate::area::Area;
use crate::backlight::{Backlight, NoBacklight};
use crate::bus::DisplayBus;
use crate::config::DisplayConfig;
use crate::error::{ConfigError, DriverError};
use crate::init_sequence::InitSequence;
use crate::layout::{self, PixelSource, MAX_WINDOW_BYTES};

/// Driver lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DriverState {
    /// Constructed, no bus traffic yet.
    Uninitialized,
    /// Init sequence playback in progress.
    Initializing,
    /// Init sequence completed; refresh and brightness are accepted.
    Ready,
    /// A transport failure occurred. Terminal.
    Faulted,
}

/// Everything guarded by the bus lock.
struct Inner<B, BL> {
    adapter: BusAdapter<B>,
    backlight: BL,
}

/// Display driver for controllers addressed through column/row windows.
///
/// All methods take `&self`, so one driver can be shared between tasks
/// (typically as a `&'static`). The bus is behind an async mutex held for a
/// whole refresh: two concurrent refreshes never interleave their window
/// setup and payload writes. State, brightness and the auto-refresh flag
/// are readable without awaiting.
///
/// # Lifecycle
///
/// 1. [`BusDisplay::new()`]: validates the configuration. No bus traffic.
/// 2. [`BusDisplay::init()`]: plays the init sequence, then applies the
///    configured brightness.
/// 3. [`BusDisplay::refresh()`] and [`BusDisplay::set_brightness()`].
/// 4. [`BusDisplay::deinit()`]: hands the bus and backlight back.
///
/// [`BusDisplay::construct()`] runs steps 1 and 2 in one call.
///
/// # Example
///
/// ```ignore
/// use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
/// use usbkb_bus_display_rs::{BusDisplay, I2cDisplayBus, NoBacklight};
///
/// let bus = I2cDisplayBus::new(i2c, 0x3C);
/// let display: BusDisplay<CriticalSectionRawMutex, _> =
///     BusDisplay::construct(bus, &DISPLAY_CONFIG, NoBacklight, &mut Delay).await?;
/// display.refresh(&frame, None).await?;
/// ```
pub struct BusDisplay<'a, M, B, BL = NoBacklight>
where
    M: RawMutex,
{
    config: &'a DisplayConfig<'a>,
    sequence: InitSequence<'a>,
    inner: Mutex<M, Inner<B, BL>>,
    state: BlockingMutex<M, Cell<DriverState>>,
    brightness: BlockingMutex<M, Cell<f32>>,
    auto_refresh: BlockingMutex<M, Cell<bool>>,
}

impl<'a, M, B, BL> BusDisplay<'a, M, B, BL>
where
    M: RawMutex,
    B: DisplayBus,
    BL: Backlight,
{
    /// Construct an uninitialised driver.
    ///
    /// The configuration is validated and the init sequence parsed here, so
    /// a malformed table is rejected before the bus is ever touched.
    ///
    /// # Errors
    ///
    /// Any [`ConfigError`] found in `config`, or
    /// [`ConfigError::BacklightMismatch`] when `config.backlight` and
    /// `backlight.is_present()` disagree.
    pub fn new(
        bus: B,
        config: &'a DisplayConfig<'a>,
        backlight: BL,
    ) -> Result<Self, ConfigError> {
        let sequence = config.validate()?;
        let configured = config.backlight.is_some();
        if configured != backlight.is_present() {
            return Err(ConfigError::BacklightMismatch { configured });
        }

        Ok(Self {
            config,
            sequence,
            inner: Mutex::new(Inner {
                adapter: BusAdapter::new(bus, config.commands),
                backlight,
            }),
            state: BlockingMutex::new(Cell::new(DriverState::Uninitialized)),
            brightness: BlockingMutex::new(Cell::new(clamp_fraction(config.brightness))),
            auto_refresh: BlockingMutex::new(Cell::new(config.refresh.auto_refresh)),
        })
    }

    /// Construct and initialise in one step.
    ///
    /// # Errors
    ///
    /// As [`new()`](Self::new) and [`init()`](Self::init). The bus is
    /// dropped with the half-built driver.
    pub async fn construct<D>(
        bus: B,
        config: &'a DisplayConfig<'a>,
        backlight: BL,
        delay: &mut D,
    ) -> Result<Self, DriverError<B::Error>>
    where
        D: DelayNs,
    {
        let display = Self::new(bus, config, backlight)?;
        display.init(delay).await?;
        Ok(display)
    }

    /// Play the init sequence.
    ///
    /// Commands go out in table order, each followed by its delay. On
    /// success the driver is [`Ready`](DriverState::Ready) and the
    /// configured brightness is applied if the panel supports it. Calling
    /// `init()` again on a ready driver replays the sequence.
    ///
    /// # Errors
    ///
    /// * [`DriverError::DriverFaulted`] if the driver already faulted.
    /// * [`DriverError::Transport`] on a bus failure. The driver is
    ///   [`Faulted`](DriverState::Faulted) and no further command is sent.
    pub async fn init<D>(&self, delay: &mut D) -> Result<(), DriverError<B::Error>>
    where
        D: DelayNs,
    {
        if self.state() == DriverState::Faulted {
            return Err(DriverError::DriverFaulted);
        }

        let mut inner = self.inner.lock().await;
        if self.state() == DriverState::Faulted {
            return Err(DriverError::DriverFaulted);
        }
        self.set_state(DriverState::Initializing);

        #[cfg(feature = "defmt")]
        defmt::info!("Display init: {} commands", self.sequence.len());

        for command in &self.sequence {
            if let Err(e) = inner.adapter.send_command(command.opcode, command.args).await {
                return Err(self.fault(e));
            }
            delay.delay_ms(u32::from(command.delay_ms)).await;
        }

        self.set_state(DriverState::Ready);

        #[cfg(feature = "defmt")]
        defmt::info!("Display ready");

        if self.supports_brightness() {
            let fraction = self.brightness();
            self.apply_brightness(&mut inner, fraction).await?;
        }
        Ok(())
    }

    /// Push pixels from `source` to the panel.
    ///
    /// `region` is a logical area; `None` refreshes the whole display. The
    /// region is clipped to the display, so an area entirely off-screen is
    /// a no-op.
    ///
    /// # Errors
    ///
    /// * [`DriverError::DriverFaulted`] once faulted. No bus traffic.
    /// * [`DriverError::NotInitialized`] before [`init()`](Self::init)
    ///   succeeded.
    /// * [`DriverError::BufferTooSmall`] if `source` is smaller than the
    ///   display.
    /// * [`DriverError::Transport`] on a bus failure, which faults the driver.
    pub async fn refresh<S>(
        &self,
        source: &S,
        region: Option<Area>,
    ) -> Result<(), DriverError<B::Error>>
    where
        S: PixelSource + ?Sized,
    {
        self.check_ready()?;

        let geometry = &self.config.geometry;
        let (width, height) = source.size();
        if width < geometry.width || height < geometry.height {
            return Err(DriverError::BufferTooSmall {
                required: geometry.pixel_count(),
                provided: width as usize * height as usize,
            });
        }

        let bounds = geometry.bounds();
        let Some(logical) = region.unwrap_or(bounds).intersection(&bounds) else {
            return Ok(());
        };
        let native = layout::native_area(geometry, &self.config.commands, &logical);

        let mut inner = self.inner.lock().await;
        // Another caller may have faulted the bus while we waited.
        self.check_ready()?;

        let mut buf = [0u8; MAX_WINDOW_BYTES];
        for tile in layout::tiles(geometry, &self.config.commands, native) {
            let len = layout::pack_tile(geometry, source, &tile, &mut buf);
            let window = layout::window_for(geometry, &tile);
            if let Err(e) = inner.adapter.send_window(&window, &buf[..len]).await {
                return Err(self.fault(DriverError::Transport(e)));
            }
        }
        Ok(())
    }

    /// Set panel brightness.
    ///
    /// `fraction` is clamped to `0.0..=1.0` (NaN counts as 0). A backlight
    /// pin takes precedence; otherwise the controller's brightness opcode
    /// gets `fraction * 255` as its argument.
    ///
    /// # Errors
    ///
    /// * [`DriverError::DriverFaulted`] once faulted.
    /// * [`DriverError::Unsupported`] with neither backlight nor opcode.
    /// * [`DriverError::NotInitialized`] before [`init()`](Self::init).
    /// * [`DriverError::Backlight`] if the pin rejects the level.
    /// * [`DriverError::Transport`] on a bus failure, which faults the driver.
    pub async fn set_brightness(&self, fraction: f32) -> Result<(), DriverError<B::Error>> {
        if self.state() == DriverState::Faulted {
            return Err(DriverError::DriverFaulted);
        }
        if !self.supports_brightness() {
            return Err(DriverError::Unsupported);
        }
        self.check_ready()?;

        let mut inner = self.inner.lock().await;
        self.check_ready()?;
        self.apply_brightness(&mut inner, clamp_fraction(fraction)).await
    }

    /// Current brightness, `0.0..=1.0`.
    pub fn brightness(&self) -> f32 {
        self.brightness.lock(Cell::get)
    }

    /// `true` when a backlight pin or brightness opcode is available.
    pub fn supports_brightness(&self) -> bool {
        self.config.supports_brightness()
    }

    pub fn state(&self) -> DriverState {
        self.state.lock(Cell::get)
    }

    pub fn config(&self) -> &'a DisplayConfig<'a> {
        self.config
    }

    /// Whether the refresh task should push frames on its own.
    pub fn auto_refresh(&self) -> bool {
        self.auto_refresh.lock(Cell::get)
    }

    /// Switch between display-timed (`true`) and host-triggered refresh.
    pub fn set_auto_refresh(&self, enabled: bool) {
        self.auto_refresh.lock(|cell| cell.set(enabled));
    }

    /// Tear the driver down and return the bus and backlight.
    pub fn deinit(self) -> (B, BL) {
        let inner = self.inner.into_inner();
        (inner.adapter.into_bus(), inner.backlight)
    }

    async fn apply_brightness(
        &self,
        inner: &mut Inner<B, BL>,
        fraction: f32,
    ) -> Result<(), DriverError<B::Error>> {
        if self.config.backlight.is_some() {
            inner
                .backlight
                .set_brightness(fraction)
                .map_err(|_| DriverError::Backlight)?;
        } else if let Some(opcode) = self.config.commands.brightness {
            let level = (fraction * 255.0) as u8;
            if let Err(e) = inner.adapter.send_command(opcode, &[level]).await {
                return Err(self.fault(e));
            }
        } else {
            return Err(DriverError::Unsupported);
        }

        self.brightness.lock(|cell| cell.set(fraction));
        Ok(())
    }

    fn check_ready(&self) -> Result<(), DriverError<B::Error>> {
        match self.state() {
            DriverState::Ready => Ok(()),
            DriverState::Faulted => Err(DriverError::DriverFaulted),
            DriverState::Uninitialized | DriverState::Initializing => {
                Err(DriverError::NotInitialized)
            }
        }
    }

    fn set_state(&self, state: DriverState) {
        self.state.lock(|cell| cell.set(state));
    }

    /// Move to `Faulted` and hand the error back.
    fn fault(&self, error: DriverError<B::Error>) -> DriverError<B::Error> {
        self.set_state(DriverState::Faulted);
        #[cfg(feature = "defmt")]
        defmt::error!("Display faulted: {}", error);
        error
    }
}

fn clamp_fraction(fraction: f32) -> f32 {
    if fraction.is_nan() {
        0.0
    } else {
        fraction.clamp(0.0, 1.0)
    }
}
