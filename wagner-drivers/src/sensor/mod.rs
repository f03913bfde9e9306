//! Distance sensor implementations

pub mod hcsr04;

pub use hcsr04::{echo_to_cm, Hcsr04, MAX_DISTANCE_CM, MIN_DISTANCE_CM};
