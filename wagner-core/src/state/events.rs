//! Events that trigger drive state transitions

/// Events that can trigger state transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DriveEvent {
    /// Distance sensor reported something closer than the obstacle limit
    ObstacleDetected,
    /// The blocked wait is over and an avoidance turn was chosen
    BlockTimeElapsed,
    /// The avoidance turn ran its hold time
    TurnCompleted,
}
