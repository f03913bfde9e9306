//! Configuration loading
//!
//! The robot configuration is compiled in from `robot.toml` and read at boot
//! with the core's no_std TOML reader.

pub mod loader;

pub use loader::{load_config, load_embedded, LoadError};
