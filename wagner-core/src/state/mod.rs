//! Drive state machine
//!
//! The rover drives its maneuvers autonomously, waits stopped in front of an
//! obstacle, then runs an avoidance turn before steering resumes. The
//! machine is finite and has no terminal state.

pub mod events;
pub mod machine;

pub use events::DriveEvent;
pub use machine::DriveState;
