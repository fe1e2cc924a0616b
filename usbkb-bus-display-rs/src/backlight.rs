//! Backlight pins.
//!
//! OLED panels emit their own light and use [`NoBacklight`]; LCD boards
//! hand the driver either a PWM channel or a plain GPIO.

use core::convert::Infallible;
use core::fmt::Debug;

use embedded_hal::digital::OutputPin;
use embedded_hal::pwm::SetDutyCycle;

use crate::config::BacklightConfig;

/// Level at or above which a GPIO backlight is switched on.
pub const GPIO_ON_THRESHOLD: f32 = 0.99;

/// A pin that sets panel brightness.
pub trait Backlight {
    type Error: Debug;

    /// `false` when there is no pin, so brightness must go through the
    /// controller's brightness opcode instead.
    fn is_present(&self) -> bool {
        true
    }

    /// Apply `fraction`, already clamped to `0.0..=1.0`.
    fn set_brightness(&mut self, fraction: f32) -> Result<(), Self::Error>;
}

/// Placeholder for panels without a backlight pin.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoBacklight;

impl Backlight for NoBacklight {
    type Error = Infallible;

    fn is_present(&self) -> bool {
        false
    }

    fn set_brightness(&mut self, _fraction: f32) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Dimmable backlight on a PWM channel.
pub struct PwmBacklight<P> {
    pin: P,
    on_high: bool,
}

impl<P: SetDutyCycle> PwmBacklight<P> {
    /// `on_high` is `false` for active-low backlights, which get the duty
    /// cycle inverted.
    pub fn new(pin: P, on_high: bool) -> Self {
        Self { pin, on_high }
    }

    /// Polarity taken from the board's [`BacklightConfig`]. The board sets
    /// up the channel at `pwm_frequency_hz` before handing it over.
    pub fn from_config(pin: P, config: &BacklightConfig) -> Self {
        Self::new(pin, config.on_high)
    }

    pub fn release(self) -> P {
        self.pin
    }
}

impl<P: SetDutyCycle> Backlight for PwmBacklight<P> {
    type Error = P::Error;

    fn set_brightness(&mut self, fraction: f32) -> Result<(), Self::Error> {
        let max = self.pin.max_duty_cycle();
        let duty = (fraction * max as f32) as u16;
        let duty = if self.on_high { duty } else { max - duty };
        self.pin.set_duty_cycle(duty)
    }
}

/// On/off backlight on a GPIO.
pub struct GpioBacklight<P> {
    pin: P,
    on_high: bool,
}

impl<P: OutputPin> GpioBacklight<P> {
    pub fn new(pin: P, on_high: bool) -> Self {
        Self { pin, on_high }
    }

    pub fn from_config(pin: P, config: &BacklightConfig) -> Self {
        Self::new(pin, config.on_high)
    }

    pub fn release(self) -> P {
        self.pin
    }
}

impl<P: OutputPin> Backlight for GpioBacklight<P> {
    type Error = P::Error;

    fn set_brightness(&mut self, fraction: f32) -> Result<(), Self::Error> {
        let on = fraction >= GPIO_ON_THRESHOLD;
        if on == self.on_high {
            self.pin.set_high()
        } else {
            self.pin.set_low()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{Event, EventLog, MockPin, MockPwm};

    #[test]
    fn pwm_scales_duty() {
        let (pwm, duties) = MockPwm::new();
        let mut backlight = PwmBacklight::new(pwm, true);
        backlight.set_brightness(0.5).unwrap();
        backlight.set_brightness(1.0).unwrap();
        assert_eq!(*duties.borrow(), vec![500, MockPwm::MAX_DUTY]);
    }

    #[test]
    fn pwm_active_low_inverts() {
        let (pwm, duties) = MockPwm::new();
        let mut backlight = PwmBacklight::new(pwm, false);
        backlight.set_brightness(0.25).unwrap();
        backlight.set_brightness(0.0).unwrap();
        assert_eq!(*duties.borrow(), vec![750, MockPwm::MAX_DUTY]);
    }

    #[test]
    fn polarity_comes_from_config() {
        let active_low = BacklightConfig {
            on_high: false,
            ..BacklightConfig::default()
        };
        let (pwm, duties) = MockPwm::new();
        let mut backlight = PwmBacklight::from_config(pwm, &active_low);
        backlight.set_brightness(1.0).unwrap();
        assert_eq!(*duties.borrow(), vec![0]);

        let events = EventLog::default();
        let mut backlight = GpioBacklight::from_config(MockPin::new(events.clone()), &active_low);
        backlight.set_brightness(1.0).unwrap();
        assert_eq!(*events.borrow(), vec![Event::Pin(false)]);
    }

    #[test]
    fn gpio_switches_at_threshold() {
        let events = EventLog::default();
        let mut backlight = GpioBacklight::new(MockPin::new(events.clone()), true);
        backlight.set_brightness(0.98).unwrap();
        backlight.set_brightness(0.99).unwrap();
        assert_eq!(*events.borrow(), vec![Event::Pin(false), Event::Pin(true)]);

        let events = EventLog::default();
        let mut inverted = GpioBacklight::new(MockPin::new(events.clone()), false);
        inverted.set_brightness(1.0).unwrap();
        assert_eq!(*events.borrow(), vec![Event::Pin(false)]);
    }

    #[test]
    fn no_backlight_is_absent() {
        assert!(!NoBacklight.is_present());
        assert!(PwmBacklight::new(MockPwm::new().0, true).is_present());
    }
}
