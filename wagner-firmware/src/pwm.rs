//! PWM slice output as an `embedded-hal` duty-cycle channel
//!
//! The RP2040 PWM block is configured per slice; this wrapper owns one slice
//! and exposes its A output to the H-bridge driver.

use core::convert::Infallible;

use embassy_rp::pwm::{Config as PwmConfig, Pwm};
use embedded_hal::pwm::{ErrorType, SetDutyCycle};

/// Counter wrap value: 125 MHz / 12500 = 10 kHz
pub const PWM_TOP: u16 = 12_499;

/// Channel A of one PWM slice
pub struct SliceOutput {
    pwm: Pwm<'static>,
    config: PwmConfig,
}

impl SliceOutput {
    /// Take over a slice, output low
    pub fn new(mut pwm: Pwm<'static>) -> Self {
        let mut config = PwmConfig::default();
        config.top = PWM_TOP;
        config.compare_a = 0;
        pwm.set_config(&config);
        Self { pwm, config }
    }
}

impl ErrorType for SliceOutput {
    type Error = Infallible;
}

impl SetDutyCycle for SliceOutput {
    fn max_duty_cycle(&self) -> u16 {
        // compare > top keeps the output high for the whole period
        self.config.top + 1
    }

    fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Self::Error> {
        self.config.compare_a = duty.min(self.max_duty_cycle());
        self.pwm.set_config(&self.config);
        Ok(())
    }
}
