//! Radio implementations

pub mod esp_at;

pub use esp_at::{EspAtConfig, EspAtRadio};
