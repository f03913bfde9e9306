//! Action scheduler
//!
//! Picks the active maneuver every tick from the steering directive, the
//! obstacle reading and elapsed time, and hands out motor commands only when
//! the selection changed.

pub mod executor;

pub use executor::{ActionScheduler, CatalogError, DriveCommand};
