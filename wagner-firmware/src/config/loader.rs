//! Boot-time configuration loading
//!
//! Falls back to the built-in defaults if the embedded file does not load.

use defmt::*;

use wagner_core::config::{parse_config, ConfigError, ParseError, RobotConfig};

/// Embedded configuration (compiled into firmware)
/// Edit robot.toml and rebuild to customize
const EMBEDDED_CONFIG: &str = include_str!("../../robot.toml");

/// Configuration loading errors
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LoadError {
    /// TOML could not be read
    Parse(ParseError),
    /// Values were read but are not usable
    Invalid(ConfigError),
}

impl From<ParseError> for LoadError {
    fn from(e: ParseError) -> Self {
        LoadError::Parse(e)
    }
}

impl From<ConfigError> for LoadError {
    fn from(e: ConfigError) -> Self {
        LoadError::Invalid(e)
    }
}

/// Parse and validate a configuration text
pub fn load_config(text: &str) -> Result<RobotConfig, LoadError> {
    let config = parse_config(text)?;
    config.validate()?;
    Ok(config)
}

/// Load the embedded configuration, or the defaults if it is unusable
pub fn load_embedded() -> RobotConfig {
    match load_config(EMBEDDED_CONFIG) {
        Ok(config) => {
            log_config_summary(&config);
            config
        }
        Err(e) => {
            warn!("Embedded config rejected: {:?}, using defaults", e);
            RobotConfig::default()
        }
    }
}

/// Log a summary of the loaded configuration
fn log_config_summary(config: &RobotConfig) {
    info!("Configuration loaded successfully");
    debug!(
        "  drive: stop below {} cm, blocked {} ms, hold {} ms, max speed {}",
        config.drive.max_distance_cm,
        config.drive.blocked_time_ms,
        config.drive.walking_time_ms,
        config.drive.max_speed
    );
    debug!(
        "  wifi: ssid {}, {} attempts every {} ms, cool-down {} ms",
        config.wifi.ssid.as_str(),
        config.wifi.reconnect_attempts,
        config.wifi.retry_interval_ms,
        config.wifi.cooldown_ms
    );
    debug!(
        "  protocol: {:?}, {} byte frames",
        config.protocol.variant,
        config.protocol.resolved_frame_len()
    );
}
