//! Motor driver implementations
//!
//! - H-bridge: one PWM channel for speed, two pins for direction

pub mod hbridge;

pub use hbridge::{HBridgeConfig, HBridgeMotor};
