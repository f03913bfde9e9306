//! Action definitions and the default two-wheel catalog
//!
//! Catalog codes line up with the direction ids the joypad produces
//! (`code / 2 - 101` for codes 202..=212), so a received direction id can be
//! used directly as an action code.

use crate::traits::Direction;

/// Number of actions in the default catalog
pub const QNT_DEFAULT_ACTIONS: usize = 6;

/// All motors stopped
pub const ACTION_STOP: u8 = 0;
/// Both wheels forward at full speed
pub const ACTION_WALK_FORWARD: u8 = 1;
/// Pivot left in place
pub const ACTION_TURN_LEFT: u8 = 2;
/// Pivot right in place
pub const ACTION_TURN_RIGHT: u8 = 3;
/// Forward, bearing left
pub const ACTION_CURVE_LEFT: u8 = 4;
/// Forward, bearing right
pub const ACTION_CURVE_RIGHT: u8 = 5;

/// Left wheel motor index in the default catalog
const LEFT: usize = 0;
/// Right wheel motor index in the default catalog
const RIGHT: usize = 1;

/// One motor's part of an action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MotorStep {
    /// Index into the controller's motor array
    pub motor: usize,
    /// Rotation direction
    pub direction: Direction,
    /// Speed magnitude (clamped to the configured maximum when issued)
    pub speed: u16,
}

impl MotorStep {
    pub const fn new(motor: usize, direction: Direction, speed: u16) -> Self {
        Self {
            motor,
            direction,
            speed,
        }
    }

    /// Signed speed to send to the motor
    ///
    /// The magnitude is clamped to `[0, max_speed]`; `reverse` flips the
    /// profile direction.
    pub fn command(&self, max_speed: u16, reverse: bool) -> i16 {
        let direction = if reverse {
            self.direction.opposite()
        } else {
            self.direction
        };
        direction.signed(self.speed.min(max_speed))
    }
}

/// A pre-defined maneuver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Action {
    /// Identifying code
    pub code: u8,
    /// Intended duration in ms (0 = hold until something else is selected)
    pub duration_ms: u32,
    /// Per-motor speed profile
    pub steps: &'static [MotorStep],
}

impl Action {
    pub const fn new(code: u8, duration_ms: u32, steps: &'static [MotorStep]) -> Self {
        Self {
            code,
            duration_ms,
            steps,
        }
    }

    /// Highest motor index this action addresses
    pub fn max_motor_index(&self) -> Option<usize> {
        self.steps.iter().map(|s| s.motor).max()
    }

    /// `(motor index, signed speed)` pairs to issue for this action
    pub fn motor_commands(
        &self,
        max_speed: u16,
        reverse: bool,
    ) -> impl Iterator<Item = (usize, i16)> + '_ {
        self.steps
            .iter()
            .map(move |s| (s.motor, s.command(max_speed, reverse)))
    }
}

/// Find an action by code
pub fn find_action(catalog: &[Action], code: u8) -> Option<usize> {
    catalog.iter().position(|a| a.code == code)
}

const FULL: u16 = 1023;
const PIVOT: u16 = 700;
const BEARING: u16 = 512;

const STOP_STEPS: [MotorStep; 2] = [
    MotorStep::new(LEFT, Direction::Forward, 0),
    MotorStep::new(RIGHT, Direction::Forward, 0),
];
const WALK_FORWARD_STEPS: [MotorStep; 2] = [
    MotorStep::new(LEFT, Direction::Forward, FULL),
    MotorStep::new(RIGHT, Direction::Forward, FULL),
];
const TURN_LEFT_STEPS: [MotorStep; 2] = [
    MotorStep::new(LEFT, Direction::Backward, PIVOT),
    MotorStep::new(RIGHT, Direction::Forward, PIVOT),
];
const TURN_RIGHT_STEPS: [MotorStep; 2] = [
    MotorStep::new(LEFT, Direction::Forward, PIVOT),
    MotorStep::new(RIGHT, Direction::Backward, PIVOT),
];
const CURVE_LEFT_STEPS: [MotorStep; 2] = [
    MotorStep::new(LEFT, Direction::Forward, BEARING),
    MotorStep::new(RIGHT, Direction::Forward, FULL),
];
const CURVE_RIGHT_STEPS: [MotorStep; 2] = [
    MotorStep::new(LEFT, Direction::Forward, FULL),
    MotorStep::new(RIGHT, Direction::Forward, BEARING),
];

/// Default catalog for a two-wheel differential drive
pub static DEFAULT_ACTIONS: [Action; QNT_DEFAULT_ACTIONS] = [
    Action::new(ACTION_STOP, 0, &STOP_STEPS),
    Action::new(ACTION_WALK_FORWARD, 2000, &WALK_FORWARD_STEPS),
    Action::new(ACTION_TURN_LEFT, 800, &TURN_LEFT_STEPS),
    Action::new(ACTION_TURN_RIGHT, 800, &TURN_RIGHT_STEPS),
    Action::new(ACTION_CURVE_LEFT, 1500, &CURVE_LEFT_STEPS),
    Action::new(ACTION_CURVE_RIGHT, 1500, &CURVE_RIGHT_STEPS),
];
