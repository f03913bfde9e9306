//! State machine definition
//!
//! Which maneuver may be selected is a function of the current state and an
//! event; the scheduler owns the timing that produces the events.

use super::events::DriveEvent;

/// Drive states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DriveState {
    /// Following the steering directive or the default walk
    #[default]
    Autonomous,
    /// Stopped in front of an obstacle, recalculating the route
    Blocked,
    /// Turning away from the obstacle; readings and directives wait
    Avoiding,
}

impl DriveState {
    /// Check if the steering directive may select maneuvers
    pub fn steering_allowed(&self) -> bool {
        matches!(self, DriveState::Autonomous)
    }

    /// Check if the rover is waiting out an obstacle
    pub fn is_blocked(&self) -> bool {
        matches!(self, DriveState::Blocked)
    }

    /// Check if an avoidance turn is running
    pub fn is_avoiding(&self) -> bool {
        matches!(self, DriveState::Avoiding)
    }

    /// Process an event and return the next state
    pub fn transition(self, event: DriveEvent) -> Self {
        use DriveEvent::*;
        use DriveState::*;

        match (self, event) {
            (Autonomous, ObstacleDetected) => Blocked,
            (Blocked, BlockTimeElapsed) => Avoiding,
            (Avoiding, TurnCompleted) => Autonomous,

            // A fresh reading while blocked does not restart the wait
            (Blocked, ObstacleDetected) => Blocked,
            // The turn is what gets the rover away from the obstacle
            (Avoiding, ObstacleDetected) => Avoiding,

            (state, _) => state,
        }
    }
}
