//! Monotonic millisecond time
//!
//! All timing in the core is expressed as [`Millis`] since boot. The counter
//! is a `u32` and wraps after ~49.7 days; every comparison goes through
//! [`Millis::elapsed_since`], which uses wrapping subtraction and stays
//! correct across the rollover as long as the compared instants are less
//! than one wrap apart.

use core::cell::Cell;

/// A point in time, in milliseconds since boot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Millis(pub u32);

impl Millis {
    /// Create from a raw millisecond count
    pub const fn new(ms: u32) -> Self {
        Self(ms)
    }

    /// Raw millisecond count
    pub const fn as_u32(self) -> u32 {
        self.0
    }

    /// Milliseconds from `earlier` to `self`
    pub const fn elapsed_since(self, earlier: Millis) -> u32 {
        self.0.wrapping_sub(earlier.0)
    }

    /// Whether at least `duration_ms` has passed since `earlier`
    pub const fn has_elapsed(self, earlier: Millis, duration_ms: u32) -> bool {
        self.elapsed_since(earlier) >= duration_ms
    }

    /// The instant `ms` milliseconds later
    pub const fn wrapping_add(self, ms: u32) -> Self {
        Self(self.0.wrapping_add(ms))
    }
}

/// Source of monotonic time
pub trait Clock {
    /// Current time since boot
    fn now(&self) -> Millis;
}

/// Clock advanced by hand, for host-side simulation and tests
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<u32>,
}

impl ManualClock {
    /// Create a clock reading `start`
    pub fn new(start: Millis) -> Self {
        Self {
            now: Cell::new(start.0),
        }
    }

    /// Move the clock forward by `ms`
    pub fn advance(&self, ms: u32) {
        self.now.set(self.now.get().wrapping_add(ms));
    }

    /// Jump to an absolute time
    pub fn set(&self, now: Millis) {
        self.now.set(now.0);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Millis {
        Millis(self.now.get())
    }
}
