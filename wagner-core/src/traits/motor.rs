//! Drive motor trait
//!
//! A motor is an addressable actuator that accepts a signed speed: positive
//! values drive forward, negative values drive backward, zero stops.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Wheel rotation direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Direction {
    /// Wheel pushes the rover forward
    #[default]
    Forward,
    /// Wheel pushes the rover backward
    Backward,
}

impl Direction {
    /// Get the opposite direction
    pub fn opposite(self) -> Self {
        match self {
            Direction::Forward => Direction::Backward,
            Direction::Backward => Direction::Forward,
        }
    }

    /// Apply this direction to a speed magnitude
    pub fn signed(self, speed: u16) -> i16 {
        let magnitude = speed.min(i16::MAX as u16) as i16;
        match self {
            Direction::Forward => magnitude,
            Direction::Backward => -magnitude,
        }
    }
}

/// Errors that can occur with motor operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MotorError {
    /// Motor driver is disabled
    Disabled,
    /// Speed outside what the driver accepts
    InvalidSpeed,
    /// PWM or direction pin could not be driven
    Output,
}

/// Trait for drive motors
pub trait Motor {
    /// Command a signed speed
    fn set_speed(&mut self, speed: i16) -> Result<(), MotorError>;

    /// Last commanded speed
    fn speed(&self) -> i16;

    /// Stop the motor
    fn stop(&mut self) -> Result<(), MotorError> {
        self.set_speed(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_signed() {
        assert_eq!(Direction::Forward.signed(700), 700);
        assert_eq!(Direction::Backward.signed(700), -700);
        assert_eq!(Direction::Forward.signed(u16::MAX), i16::MAX);
    }

    #[test]
    fn test_direction_opposite() {
        assert_eq!(Direction::Forward.opposite(), Direction::Backward);
        assert_eq!(Direction::Backward.opposite().opposite(), Direction::Backward);
    }
}
