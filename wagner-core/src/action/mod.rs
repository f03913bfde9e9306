//! Maneuver catalog
//!
//! An [`Action`] is an immutable motor behavior: a code, an intended
//! duration and one speed/direction step per motor. The scheduler borrows a
//! catalog of actions and never modifies it.

pub mod catalog;

pub use catalog::{
    find_action, Action, MotorStep, ACTION_CURVE_LEFT, ACTION_CURVE_RIGHT, ACTION_STOP,
    ACTION_TURN_LEFT, ACTION_TURN_RIGHT, ACTION_WALK_FORWARD, DEFAULT_ACTIONS, QNT_DEFAULT_ACTIONS,
};
