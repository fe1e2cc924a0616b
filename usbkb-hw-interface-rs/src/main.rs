//! usbkb-hw-interface
//!
//! OLED bring-up firmware for the carlossless usbkb (ESP32-S2). Wires the
//! board crate to esp-hal and keeps the panel alive:
//!
//! 1. The display I2C bus is configured from `DISPLAY_I2C` (GPIO7/GPIO8,
//!    100 kHz).
//! 2. `construct_display()` plays the init sequence and applies the
//!    configured contrast.
//! 3. The refresh task pushes the frame buffer's dirty area at the panel's
//!    native frame rate.
//! 4. The main loop redraws an uptime line once per second.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::mutex::Mutex;
use embassy_time::{Delay, Duration, Ticker};
use esp_hal::i2c::master::{Config as I2cConfig, I2c};
use esp_hal::time::Rate;
use esp_hal::timer::timg::TimerGroup;
use esp_hal::Async;
use static_cell::StaticCell;
use {esp_backtrace as _, esp_println as _};

use usbkb_board::display::{construct_display, new_frame_buffer, DISPLAY_I2C};
use usbkb_board::status::draw_status;
use usbkb_board::{BoardDisplay, BoardFrameBuffer, BOARD};
use usbkb_bus_display_rs::display_refresh_task;

esp_bootloader_esp_idf::esp_app_desc!();

// ---------------------------------------------------------------------------
// Static storage
// ---------------------------------------------------------------------------

type DisplayI2c = I2c<'static, Async>;

type Display = BoardDisplay<'static, CriticalSectionRawMutex, DisplayI2c>;

/// Frame buffer shared between the main loop (drawing) and the refresh task.
type SharedFrame = Mutex<CriticalSectionRawMutex, BoardFrameBuffer>;

static DISPLAY: StaticCell<Display> = StaticCell::new();
static FRAME: StaticCell<SharedFrame> = StaticCell::new();

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

/// Thin wrapper that monomorphises the generic `display_refresh_task` so it
/// can be spawned as a concrete Embassy task.
#[embassy_executor::task]
async fn refresh_task(display: &'static Display, frame: &'static SharedFrame) {
    display_refresh_task(display, frame).await;
    warn!("Display refresh task exited");
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[esp_rtos::main]
async fn main(spawner: Spawner) {
    let peripherals = esp_hal::init(esp_hal::Config::default());
    let timg0 = TimerGroup::new(peripherals.TIMG0);
    esp_rtos::start(timg0.timer0);

    info!("{} ({}) starting", BOARD.name, BOARD.mcu);

    // —— Pin assignments ————————————————————————————————————————————————————
    // OLED_SCL → GPIO7
    // OLED_SDA → GPIO8
    // ———————————————————————————————————————————————————————————————————————

    let i2c_config =
        I2cConfig::default().with_frequency(Rate::from_hz(DISPLAY_I2C.frequency_hz));
    let i2c = I2c::new(peripherals.I2C0, i2c_config)
        .unwrap()
        .with_scl(peripherals.GPIO7)
        .with_sda(peripherals.GPIO8)
        .into_async();

    let display = match construct_display(i2c, &mut Delay).await {
        Ok(display) => DISPLAY.init(display),
        Err(e) => {
            error!("Display bring-up failed: {}", e);
            return;
        }
    };

    let frame = FRAME.init(Mutex::new(new_frame_buffer().unwrap()));

    spawner.spawn(refresh_task(display, frame)).unwrap();
    info!("Refresh task spawned");

    let mut ticker = Ticker::every(Duration::from_secs(1));
    let mut seconds: u32 = 0;
    loop {
        {
            let mut frame = frame.lock().await;
            if draw_status(&mut frame, seconds).is_err() {
                warn!("Uptime line does not fit");
            }
        } // frame released before the refresh task needs it

        ticker.next().await;
        seconds = seconds.wrapping_add(1);
    }
}
