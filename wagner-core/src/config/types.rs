//! Configuration type definitions
//!
//! These types represent the robot configuration. The firmware embeds a TOML
//! file that is parsed into [`RobotConfig`] at boot; every field has a
//! default so a partial file is enough.

use heapless::String;
use wagner_protocol::{ProtocolVariant, MAX_FRAME_LEN};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Maximum SSID length (802.11 limit)
pub const MAX_SSID_LEN: usize = 32;

/// Maximum WPA passphrase length
pub const MAX_PASSWORD_LEN: usize = 64;

/// Full-scale motor speed
pub const DEFAULT_MAX_SPEED: u16 = 1023;

/// Obstacle distance limit in centimetres
pub const DEFAULT_MAX_DISTANCE_CM: f32 = 15.0;

/// Time spent stopped in front of an obstacle
pub const DEFAULT_BLOCKED_TIME_MS: u32 = 2000;

/// Minimum time a maneuver stays active before reselection
pub const DEFAULT_WALKING_TIME_MS: u32 = 2000;

/// Association attempts per short retry cycle
pub const DEFAULT_RECONNECT_ATTEMPTS: u8 = 5;

/// Spacing between attempts within a cycle
pub const DEFAULT_RETRY_INTERVAL_MS: u32 = 2000;

/// Cool-down after a cycle is exhausted
pub const DEFAULT_COOLDOWN_MS: u32 = 120_000;

/// Minimum spacing between status reports
pub const DEFAULT_STATUS_INTERVAL_MS: u32 = 3000;

/// Configuration validation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Obstacle distance is not a positive number
    InvalidDistance,
    /// Maximum speed is zero
    ZeroSpeed,
    /// Reconnect budget is zero
    ZeroAttempts,
    /// A timing interval is zero
    ZeroInterval,
    /// Cool-down shorter than the retry interval
    CooldownTooShort,
    /// Frame length does not fit the decoder
    InvalidFrameLength,
}

/// Autonomous drive parameters
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DriveConfig {
    /// Readings closer than this (cm) count as an obstacle
    pub max_distance_cm: f32,
    /// Stop time before choosing an avoidance side (ms)
    pub blocked_time_ms: u32,
    /// Minimum hold time of a maneuver (ms)
    pub walking_time_ms: u32,
    /// Full-scale motor command
    pub max_speed: u16,
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            max_distance_cm: DEFAULT_MAX_DISTANCE_CM,
            blocked_time_ms: DEFAULT_BLOCKED_TIME_MS,
            walking_time_ms: DEFAULT_WALKING_TIME_MS,
            max_speed: DEFAULT_MAX_SPEED,
        }
    }
}

/// Wireless network credentials and reconnection policy
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct WifiConfig {
    /// Network name
    pub ssid: String<MAX_SSID_LEN>,
    /// Network passphrase
    pub password: String<MAX_PASSWORD_LEN>,
    /// Attempts per retry cycle
    pub reconnect_attempts: u8,
    /// Spacing between attempts (ms)
    pub retry_interval_ms: u32,
    /// Wait after an exhausted cycle, measured from the last attempt (ms)
    pub cooldown_ms: u32,
    /// Minimum spacing between status reports (ms)
    pub status_interval_ms: u32,
}

impl Default for WifiConfig {
    fn default() -> Self {
        Self {
            ssid: String::new(),
            password: String::new(),
            reconnect_attempts: DEFAULT_RECONNECT_ATTEMPTS,
            retry_interval_ms: DEFAULT_RETRY_INTERVAL_MS,
            cooldown_ms: DEFAULT_COOLDOWN_MS,
            status_interval_ms: DEFAULT_STATUS_INTERVAL_MS,
        }
    }
}

/// Command link settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ProtocolConfig {
    /// Payload layout
    pub variant: ProtocolVariant,
    /// Frame length override; `None` uses the variant's length
    pub frame_len: Option<usize>,
}

impl ProtocolConfig {
    /// Frame length the decoder should use
    pub fn resolved_frame_len(&self) -> usize {
        self.frame_len.unwrap_or(self.variant.frame_len())
    }
}

/// Complete robot configuration
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RobotConfig {
    pub drive: DriveConfig,
    pub wifi: WifiConfig,
    pub protocol: ProtocolConfig,
}

impl RobotConfig {
    /// Create the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Check the configuration for values the runtime cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        let drive = &self.drive;
        if drive.max_distance_cm.is_nan() || drive.max_distance_cm <= 0.0 {
            return Err(ConfigError::InvalidDistance);
        }
        if drive.max_speed == 0 {
            return Err(ConfigError::ZeroSpeed);
        }
        if drive.blocked_time_ms == 0 || drive.walking_time_ms == 0 {
            return Err(ConfigError::ZeroInterval);
        }

        let wifi = &self.wifi;
        if wifi.reconnect_attempts == 0 {
            return Err(ConfigError::ZeroAttempts);
        }
        if wifi.retry_interval_ms == 0 || wifi.cooldown_ms == 0 || wifi.status_interval_ms == 0 {
            return Err(ConfigError::ZeroInterval);
        }
        if wifi.cooldown_ms < wifi.retry_interval_ms {
            return Err(ConfigError::CooldownTooShort);
        }

        let frame_len = self.protocol.resolved_frame_len();
        if !(2..=MAX_FRAME_LEN).contains(&frame_len) {
            return Err(ConfigError::InvalidFrameLength);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RobotConfig::new();
        assert_eq!(config.drive.max_distance_cm, 15.0);
        assert_eq!(config.drive.blocked_time_ms, 2000);
        assert_eq!(config.drive.walking_time_ms, 2000);
        assert_eq!(config.drive.max_speed, 1023);
        assert_eq!(config.wifi.reconnect_attempts, 5);
        assert_eq!(config.wifi.retry_interval_ms, 2000);
        assert_eq!(config.wifi.cooldown_ms, 120_000);
        assert_eq!(config.wifi.status_interval_ms, 3000);
        assert_eq!(config.protocol.variant, ProtocolVariant::Basic);
        assert_eq!(config.protocol.resolved_frame_len(), 7);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_frame_len_override() {
        let protocol = ProtocolConfig {
            variant: ProtocolVariant::Extended,
            frame_len: None,
        };
        assert_eq!(protocol.resolved_frame_len(), 9);

        let protocol = ProtocolConfig {
            frame_len: Some(12),
            ..protocol
        };
        assert_eq!(protocol.resolved_frame_len(), 12);
    }

    #[test]
    fn test_validate_rejects_bad_distance() {
        let mut config = RobotConfig::new();
        config.drive.max_distance_cm = 0.0;
        assert_eq!(config.validate(), Err(ConfigError::InvalidDistance));
        config.drive.max_distance_cm = f32::NAN;
        assert_eq!(config.validate(), Err(ConfigError::InvalidDistance));
    }

    #[test]
    fn test_validate_rejects_zero_values() {
        let mut config = RobotConfig::new();
        config.drive.max_speed = 0;
        assert_eq!(config.validate(), Err(ConfigError::ZeroSpeed));

        let mut config = RobotConfig::new();
        config.wifi.reconnect_attempts = 0;
        assert_eq!(config.validate(), Err(ConfigError::ZeroAttempts));

        let mut config = RobotConfig::new();
        config.wifi.retry_interval_ms = 0;
        assert_eq!(config.validate(), Err(ConfigError::ZeroInterval));
    }

    #[test]
    fn test_validate_rejects_short_cooldown() {
        let mut config = RobotConfig::new();
        config.wifi.cooldown_ms = 1000;
        assert_eq!(config.validate(), Err(ConfigError::CooldownTooShort));
    }

    #[test]
    fn test_validate_rejects_frame_len() {
        let mut config = RobotConfig::new();
        config.protocol.frame_len = Some(1);
        assert_eq!(config.validate(), Err(ConfigError::InvalidFrameLength));
        config.protocol.frame_len = Some(MAX_FRAME_LEN + 1);
        assert_eq!(config.validate(), Err(ConfigError::InvalidFrameLength));
    }
}
