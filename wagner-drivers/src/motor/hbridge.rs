//! H-bridge DC motor driver
//!
//! Drives one side of an L298N/TB6612-style bridge:
//! - PWM duty cycle sets the speed magnitude
//! - Two input pins select the direction (IN1 high = forward)
//! - Zero speed pulls both inputs low and lets the wheel coast
//!
//! ```ignore
//! let mut left = HBridgeMotor::new(pwm, in1, in2, HBridgeConfig::default());
//! left.set_speed(-512)?; // half speed backward
//! ```

use embedded_hal::digital::{OutputPin, PinState};
use embedded_hal::pwm::SetDutyCycle;
use wagner_core::traits::{Motor, MotorError};

/// H-bridge motor configuration
#[derive(Debug, Clone)]
pub struct HBridgeConfig {
    /// Speed value that maps to 100% duty
    pub max_speed: u16,
    /// Minimum duty cycle percentage (below this the motor won't turn)
    pub min_duty: u8,
    /// Swap forward and backward (motor mounted mirrored)
    pub inverted: bool,
}

impl Default for HBridgeConfig {
    fn default() -> Self {
        Self {
            max_speed: 1023,
            min_duty: 0,
            inverted: false,
        }
    }
}

/// H-bridge motor driver
pub struct HBridgeMotor<P, A, B> {
    pwm: P,
    in1: A,
    in2: B,
    config: HBridgeConfig,
    /// Last accepted speed, clamped
    speed: i16,
    enabled: bool,
}

impl<P, A, B> HBridgeMotor<P, A, B>
where
    P: SetDutyCycle,
    A: OutputPin,
    B: OutputPin,
{
    /// Create an enabled driver; outputs are untouched until the first command
    pub fn new(pwm: P, in1: A, in2: B, config: HBridgeConfig) -> Self {
        Self {
            pwm,
            in1,
            in2,
            config,
            speed: 0,
            enabled: true,
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &HBridgeConfig {
        &self.config
    }

    /// Enable or disable the driver
    ///
    /// Disabling coasts the motor; commands are rejected until re-enabled.
    pub fn enable(&mut self, enabled: bool) -> Result<(), MotorError> {
        if !enabled {
            self.drive(0)?;
        }
        self.enabled = enabled;
        Ok(())
    }

    /// Check if the driver accepts commands
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Scale a speed magnitude to a duty fraction of `max_speed`
    ///
    /// Maps `1..=max_speed` onto `min_duty..=100%` so that the smallest
    /// non-zero command still turns the wheel.
    fn scale_duty(&self, magnitude: u16) -> u16 {
        if magnitude == 0 {
            return 0;
        }
        let max = self.full_scale() as u32;
        let min = max * self.config.min_duty.min(100) as u32 / 100;
        let scaled = min + magnitude as u32 * (max - min) / max;
        scaled.min(max) as u16
    }

    /// Largest speed magnitude a command can carry
    fn full_scale(&self) -> u16 {
        self.config.max_speed.min(i16::MAX as u16)
    }

    fn drive(&mut self, speed: i16) -> Result<(), MotorError> {
        let max = self.full_scale();
        let magnitude = speed.unsigned_abs().min(max);
        let forward = (speed > 0) != self.config.inverted;

        let (in1, in2) = match (magnitude, forward) {
            (0, _) => (false, false),
            (_, true) => (true, false),
            (_, false) => (false, true),
        };
        set_pin(&mut self.in1, in1)?;
        set_pin(&mut self.in2, in2)?;

        let duty = self.scale_duty(magnitude);
        self.pwm
            .set_duty_cycle_fraction(duty, max.max(1))
            .map_err(|_| MotorError::Output)?;

        self.speed = if speed < 0 {
            -(magnitude as i16)
        } else {
            magnitude as i16
        };
        Ok(())
    }
}

fn set_pin<O: OutputPin>(pin: &mut O, high: bool) -> Result<(), MotorError> {
    pin.set_state(PinState::from(high))
        .map_err(|_| MotorError::Output)
}

impl<P, A, B> Motor for HBridgeMotor<P, A, B>
where
    P: SetDutyCycle,
    A: OutputPin,
    B: OutputPin,
{
    fn set_speed(&mut self, speed: i16) -> Result<(), MotorError> {
        if !self.enabled {
            return Err(MotorError::Disabled);
        }
        self.drive(speed)
    }

    fn speed(&self) -> i16 {
        self.speed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::Infallible;

    #[derive(Default)]
    struct MockPin {
        high: bool,
    }

    impl embedded_hal::digital::ErrorType for MockPin {
        type Error = Infallible;
    }

    impl OutputPin for MockPin {
        fn set_low(&mut self) -> Result<(), Infallible> {
            self.high = false;
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Infallible> {
            self.high = true;
            Ok(())
        }
    }

    struct MockPwm {
        duty: u16,
    }

    impl embedded_hal::pwm::ErrorType for MockPwm {
        type Error = Infallible;
    }

    impl SetDutyCycle for MockPwm {
        fn max_duty_cycle(&self) -> u16 {
            10_000
        }

        fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Infallible> {
            self.duty = duty;
            Ok(())
        }
    }

    fn motor(config: HBridgeConfig) -> HBridgeMotor<MockPwm, MockPin, MockPin> {
        HBridgeMotor::new(
            MockPwm { duty: 0 },
            MockPin::default(),
            MockPin::default(),
            config,
        )
    }

    #[test]
    fn test_forward() {
        let mut m = motor(HBridgeConfig::default());
        m.set_speed(1023).unwrap();
        assert!(m.in1.high);
        assert!(!m.in2.high);
        assert_eq!(m.pwm.duty, 10_000);
        assert_eq!(m.speed(), 1023);
    }

    #[test]
    fn test_backward() {
        let mut m = motor(HBridgeConfig::default());
        m.set_speed(-700).unwrap();
        assert!(!m.in1.high);
        assert!(m.in2.high);
        assert_eq!(m.pwm.duty, 6842);
        assert_eq!(m.speed(), -700);
    }

    #[test]
    fn test_zero_coasts() {
        let mut m = motor(HBridgeConfig::default());
        m.set_speed(500).unwrap();
        m.stop().unwrap();
        assert!(!m.in1.high);
        assert!(!m.in2.high);
        assert_eq!(m.pwm.duty, 0);
        assert_eq!(m.speed(), 0);
    }

    #[test]
    fn test_speed_is_clamped() {
        let mut m = motor(HBridgeConfig::default());
        m.set_speed(i16::MIN).unwrap();
        assert_eq!(m.speed(), -1023);
        assert_eq!(m.pwm.duty, 10_000);
    }

    #[test]
    fn test_inverted() {
        let mut m = motor(HBridgeConfig {
            inverted: true,
            ..HBridgeConfig::default()
        });
        m.set_speed(300).unwrap();
        assert!(!m.in1.high);
        assert!(m.in2.high);
        // The reported speed stays in rover terms
        assert_eq!(m.speed(), 300);
    }

    #[test]
    fn test_min_duty_dead_zone() {
        let m = motor(HBridgeConfig {
            max_speed: 100,
            min_duty: 20,
            inverted: false,
        });
        assert_eq!(m.scale_duty(0), 0);
        assert_eq!(m.scale_duty(1), 20);
        assert_eq!(m.scale_duty(50), 60);
        assert_eq!(m.scale_duty(100), 100);
    }

    #[test]
    fn test_disabled_rejects_commands() {
        let mut m = motor(HBridgeConfig::default());
        m.set_speed(800).unwrap();
        m.enable(false).unwrap();
        assert_eq!(m.pwm.duty, 0);
        assert_eq!(m.set_speed(800), Err(MotorError::Disabled));

        m.enable(true).unwrap();
        assert!(m.set_speed(800).is_ok());
    }
}
