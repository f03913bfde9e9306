//! Board-agnostic core logic for the Wagner rover
//!
//! This crate contains all application logic that does not depend on
//! specific hardware implementations:
//!
//! - Hardware abstraction traits (motor, distance sensor, radio)
//! - Maneuver catalog
//! - Drive state machine and the action scheduler
//! - Connectivity supervision with reconnection backoff
//! - Configuration types and their TOML reader
//! - The [`Wagner`](controller::Wagner) controller tying it together

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod action;
pub mod config;
pub mod connectivity;
pub mod controller;
pub mod scheduler;
pub mod state;
pub mod time;
pub mod traits;

pub use controller::{ControllerError, DriveOutcome, DriveReport, PollReport, Wagner};
