//! Frame buffer refresh loop.
//!
//! [`refresh_dirty()`] pushes whatever changed in a shared
//! [`MonoFrameBuffer`] since the last call; hosts that refresh on their own
//! schedule call it directly. With the `task` feature,
//! [`display_refresh_task()`] calls it at the panel's native frame rate
//! whenever auto-refresh is enabled.

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::mutex::Mutex;

use crate::backlight::Backlight;
use crate::bus::DisplayBus;
use crate::driver::BusDisplay;
use crate::error::DriverError;
use crate::framebuffer::MonoFrameBuffer;

/// Refresh the dirty area of `frame`, if any.
///
/// The frame buffer stays locked until the transfer finishes, so concurrent
/// callers refresh one after another and the last one always sends the
/// newest pixels. Drawing waits for at most one transfer. Returns
/// `Ok(true)` if anything was sent.
///
/// # Errors
///
/// Whatever [`BusDisplay::refresh()`] returns. The dirty area is put back
/// so a later call retries it.
pub async fn refresh_dirty<M, B, BL, const N: usize>(
    display: &BusDisplay<'_, M, B, BL>,
    frame: &Mutex<M, MonoFrameBuffer<N>>,
) -> Result<bool, DriverError<B::Error>>
where
    M: RawMutex,
    B: DisplayBus,
    BL: Backlight,
{
    let mut frame = frame.lock().await;
    let Some(dirty) = frame.take_dirty() else {
        return Ok(false);
    };

    if let Err(e) = display.refresh(&*frame, Some(dirty)).await {
        frame.mark_dirty(dirty);
        return Err(e);
    }
    Ok(true)
}

/// Periodic refresh loop.
///
/// This is a regular `async fn`, not an Embassy `#[task]`. Embassy tasks
/// cannot be generic, so callers wrap it in a thin concrete task:
///
/// ```ignore
/// #[embassy_executor::task]
/// async fn refresh_task(
///     display: &'static BoardDisplay<'static, MyI2c>,
///     frame: &'static Mutex<CriticalSectionRawMutex, BoardFrameBuffer>,
/// ) {
///     display_refresh_task(display, frame).await;
/// }
/// ```
///
/// # Control flow
///
/// Every `frame_period_ms()` tick, skipped while auto-refresh is off:
/// refresh the dirty area via [`refresh_dirty()`].
///
/// # Errors
///
/// * Not initialised yet: the area stays dirty and is retried next tick.
/// * Driver faulted: logs the error and **returns** (task exits).
/// * Anything else: logs the error and continues with the next tick.
#[cfg(feature = "task")]
pub async fn display_refresh_task<M, B, BL, const N: usize>(
    display: &BusDisplay<'_, M, B, BL>,
    frame: &Mutex<M, MonoFrameBuffer<N>>,
) where
    M: RawMutex,
    B: DisplayBus,
    BL: Backlight,
{
    use crate::driver::DriverState;

    let period = embassy_time::Duration::from_millis(display.config().refresh.frame_period_ms());
    let mut ticker = embassy_time::Ticker::every(period);

    #[cfg(feature = "defmt")]
    defmt::info!("Display refresh every {} ms", period.as_millis());

    loop {
        ticker.next().await;

        if !display.auto_refresh() {
            continue;
        }

        match refresh_dirty(display, frame).await {
            Ok(_) | Err(DriverError::NotInitialized) => {}
            Err(_e) if display.state() == DriverState::Faulted => {
                #[cfg(feature = "defmt")]
                defmt::error!("Display refresh stopped: {}", _e);
                return;
            }
            Err(_e) => {
                #[cfg(feature = "defmt")]
                defmt::warn!("Display refresh failed: {}", _e);
            }
        }
    }
}
