//! Wireless connectivity supervision
//!
//! Keeps the station associated with two-tier backoff: a short cycle of
//! spaced attempts, then a long cool-down once the cycle is used up.

pub mod supervisor;

pub use supervisor::{ConnectivitySupervisor, ReconnectOutcome, WifiStatus};
