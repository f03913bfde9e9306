//! Reconnection policy and status reporting
//!
//! ```text
//!   attempt   attempt   attempt   attempt   attempt         reset  attempt
//!   |--2 s----|--2 s----|--2 s----|--2 s----|-----120 s------|      |
//!   1         2         3         4         5                0 ---> 1
//! ```
//!
//! The cool-down is measured from the last attempt of the cycle. The call
//! that ends the cool-down only resets the counter; the next call resumes
//! the short cycle.

use crate::config::WifiConfig;
use crate::time::Millis;
use crate::traits::{IpAddress, MacAddress, Radio, RadioError};

/// What a reconnection step did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ReconnectOutcome {
    /// Station is associated; attempt counter cleared
    Connected,
    /// Too soon after the previous attempt
    Waiting,
    /// One association attempt was made
    Attempted {
        /// Attempt number within the current cycle, starting at 1
        attempt: u8,
        result: Result<(), RadioError>,
    },
    /// Cycle used up, cool-down still running
    Exhausted,
    /// Cool-down over, counter reset to zero
    CooldownReset,
}

/// Snapshot of the wireless link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct WifiStatus {
    pub connected: bool,
    /// `None` when the radio did not answer
    pub mac: Option<MacAddress>,
    /// `None` when the radio did not answer or holds no lease (0.0.0.0)
    pub ip: Option<IpAddress>,
    /// Attempts made in the current cycle
    pub attempts: u8,
}

/// Reconnection backoff state
#[derive(Debug, Clone)]
pub struct ConnectivitySupervisor {
    config: WifiConfig,
    attempts: u8,
    last_attempt: Option<Millis>,
    last_status: Option<Millis>,
}

impl ConnectivitySupervisor {
    pub fn new(config: WifiConfig) -> Self {
        Self {
            config,
            attempts: 0,
            last_attempt: None,
            last_status: None,
        }
    }

    /// Network credentials and policy in use
    pub fn config(&self) -> &WifiConfig {
        &self.config
    }

    /// Attempts made in the current cycle
    pub fn attempts(&self) -> u8 {
        self.attempts
    }

    /// Whether the short cycle is used up
    pub fn is_exhausted(&self) -> bool {
        self.attempts >= self.config.reconnect_attempts
    }

    /// Run one step of the backoff policy
    ///
    /// Call this every tick. At most one association attempt is made.
    pub fn retry_reconnection<R: Radio>(&mut self, radio: &mut R, now: Millis) -> ReconnectOutcome {
        if radio.is_associated() {
            self.attempts = 0;
            return ReconnectOutcome::Connected;
        }

        if self.is_exhausted() {
            let cooled = self
                .last_attempt
                .map_or(true, |at| now.has_elapsed(at, self.config.cooldown_ms));
            if !cooled {
                return ReconnectOutcome::Exhausted;
            }
            self.attempts = 0;
            return ReconnectOutcome::CooldownReset;
        }

        if let Some(at) = self.last_attempt {
            if !now.has_elapsed(at, self.config.retry_interval_ms) {
                return ReconnectOutcome::Waiting;
            }
        }

        self.attempt(radio, now)
    }

    /// Clear the backoff and attempt right away
    pub fn reconnect<R: Radio>(&mut self, radio: &mut R, now: Millis) -> ReconnectOutcome {
        self.attempts = 0;
        self.last_attempt = None;
        self.attempt(radio, now)
    }

    /// Status snapshot, at most once per status interval
    ///
    /// The first call always reports.
    pub fn print_status<R: Radio>(&mut self, radio: &mut R, now: Millis) -> Option<WifiStatus> {
        if let Some(at) = self.last_status {
            if !now.has_elapsed(at, self.config.status_interval_ms) {
                return None;
            }
        }
        self.last_status = Some(now);
        Some(self.status(radio))
    }

    /// Status snapshot, unthrottled
    pub fn status<R: Radio>(&self, radio: &mut R) -> WifiStatus {
        WifiStatus {
            connected: radio.is_associated(),
            mac: radio.mac_address().ok(),
            ip: radio.local_ip().ok().filter(|ip| !ip.is_unspecified()),
            attempts: self.attempts,
        }
    }

    fn attempt<R: Radio>(&mut self, radio: &mut R, now: Millis) -> ReconnectOutcome {
        self.attempts = self.attempts.saturating_add(1);
        self.last_attempt = Some(now);
        let result = radio.associate(&self.config.ssid, &self.config.password);
        ReconnectOutcome::Attempted {
            attempt: self.attempts,
            result,
        }
    }
}
