//! Maneuver selection
//!
//! Tracks the active catalog entry, the drive state and the latest steering
//! directive. [`ActionScheduler::tick`] updates the selection;
//! [`ActionScheduler::pending`] yields the motor commands of a selection
//! that has not been written yet.

use rand::{Rng, RngCore};
use wagner_protocol::SteeringDirective;

use crate::action::{
    find_action, Action, ACTION_STOP, ACTION_TURN_LEFT, ACTION_TURN_RIGHT, ACTION_WALK_FORWARD,
};
use crate::config::DriveConfig;
use crate::state::{DriveEvent, DriveState};
use crate::time::Millis;

/// Catalog cannot drive the scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CatalogError {
    /// No actions at all
    Empty,
    /// A maneuver the scheduler relies on is missing
    MissingAction(u8),
}

/// Commands for a selection that still has to reach the motors
#[derive(Debug, Clone, Copy)]
pub struct DriveCommand<'a> {
    /// Selected maneuver
    pub action: &'a Action,
    /// Profile directions are inverted
    pub reverse: bool,
    max_speed: u16,
}

impl<'a> DriveCommand<'a> {
    /// `(motor index, signed speed)` pairs to issue
    pub fn motor_commands(&self) -> impl Iterator<Item = (usize, i16)> + 'a {
        self.action.motor_commands(self.max_speed, self.reverse)
    }
}

/// Autonomous maneuver scheduler
///
/// Borrows the action catalog; the avoidance side is drawn from `R`.
#[derive(Debug)]
pub struct ActionScheduler<'a, R> {
    catalog: &'a [Action],
    config: DriveConfig,
    state: DriveState,
    /// Catalog indices of the maneuvers the scheduler selects on its own
    stop: usize,
    walk: usize,
    turn_left: usize,
    turn_right: usize,
    /// Active maneuver
    current: usize,
    reverse: bool,
    /// Commands for `current` not yet written
    dirty: bool,
    /// When `current` was selected (`None` before the first selection)
    selected_at: Option<Millis>,
    /// When the obstacle stopped the rover
    blocked_at: Millis,
    directive: Option<SteeringDirective>,
    directive_changed: bool,
    rng: R,
}

impl<'a, R: RngCore> ActionScheduler<'a, R> {
    /// Create a scheduler over `catalog`
    ///
    /// The catalog must contain stop, walk forward and both turns. The stop
    /// maneuver starts out active and unwritten, so the first
    /// [`pending`](Self::pending) call stops every motor.
    pub fn new(catalog: &'a [Action], config: DriveConfig, rng: R) -> Result<Self, CatalogError> {
        if catalog.is_empty() {
            return Err(CatalogError::Empty);
        }
        let index = |code| find_action(catalog, code).ok_or(CatalogError::MissingAction(code));
        let stop = index(ACTION_STOP)?;

        Ok(Self {
            catalog,
            config,
            state: DriveState::default(),
            stop,
            walk: index(ACTION_WALK_FORWARD)?,
            turn_left: index(ACTION_TURN_LEFT)?,
            turn_right: index(ACTION_TURN_RIGHT)?,
            current: stop,
            reverse: false,
            dirty: true,
            selected_at: None,
            blocked_at: Millis::default(),
            directive: None,
            directive_changed: false,
            rng,
        })
    }

    /// Current drive state
    pub fn state(&self) -> DriveState {
        self.state
    }

    /// Whether the rover is stopped in front of an obstacle
    pub fn is_blocked(&self) -> bool {
        self.state.is_blocked()
    }

    /// Active maneuver
    pub fn current_action(&self) -> &'a Action {
        &self.catalog[self.current]
    }

    /// Whether the active maneuver has not been written yet
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Latest steering directive
    pub fn directive(&self) -> Option<SteeringDirective> {
        self.directive
    }

    /// Replace the steering directive
    ///
    /// The directive is acted on at the next tick that allows steering.
    pub fn steer(&mut self, directive: SteeringDirective) {
        self.directive = Some(directive);
        self.directive_changed = true;
    }

    /// Advance the scheduler
    ///
    /// `distance_cm` is the latest obstacle reading; `None` means no
    /// reading, which counts as a clear path. An avoidance turn ignores
    /// readings and directives until its hold time is over; the same tick
    /// then checks for an obstacle again. Returns the drive event that
    /// fired, if any.
    pub fn tick(&mut self, now: Millis, distance_cm: Option<f32>) -> Option<DriveEvent> {
        let obstacle = distance_cm.is_some_and(|d| d < self.config.max_distance_cm);

        let mut event = None;
        if self.state.is_avoiding() {
            if !self.hold_expired(now) {
                return None;
            }
            self.state = self.state.transition(DriveEvent::TurnCompleted);
            event = Some(DriveEvent::TurnCompleted);
        }

        match self.state {
            DriveState::Blocked => {
                if !now.has_elapsed(self.blocked_at, self.config.blocked_time_ms) {
                    return None;
                }
                let turn = self.random_decision_side();
                self.state = self.state.transition(DriveEvent::BlockTimeElapsed);
                self.select(turn, false, now);
                Some(DriveEvent::BlockTimeElapsed)
            }
            state if state.steering_allowed() && obstacle => {
                self.state = state.transition(DriveEvent::ObstacleDetected);
                self.blocked_at = now;
                self.select(self.stop, false, now);
                Some(DriveEvent::ObstacleDetected)
            }
            state if state.steering_allowed() => {
                if self.hold_expired(now) || self.directive_changed {
                    self.directive_changed = false;
                    let (next, reverse) = self.directed();
                    self.select(next, reverse, now);
                }
                event
            }
            _ => event,
        }
    }

    /// Commands for the active maneuver if they have not been written yet
    pub fn pending(&self) -> Option<DriveCommand<'a>> {
        self.dirty.then(|| DriveCommand {
            action: self.current_action(),
            reverse: self.reverse,
            max_speed: self.config.max_speed,
        })
    }

    /// Record that every motor accepted the pending commands
    pub fn mark_written(&mut self) {
        self.dirty = false;
    }

    /// How long the active maneuver is held before reselection
    fn hold_time(&self) -> u32 {
        self.config
            .walking_time_ms
            .max(self.current_action().duration_ms)
    }

    fn hold_expired(&self, now: Millis) -> bool {
        self.selected_at
            .map_or(true, |at| now.has_elapsed(at, self.hold_time()))
    }

    /// Maneuver named by the directive, falling back to walk forward
    fn directed(&self) -> (usize, bool) {
        let Some(directive) = self.directive else {
            return (self.walk, false);
        };
        match u8::try_from(directive.direction)
            .ok()
            .and_then(|code| find_action(self.catalog, code))
        {
            Some(index) => (index, directive.is_reverse()),
            None => (self.walk, false),
        }
    }

    /// Pick the avoidance turn
    fn random_decision_side(&mut self) -> usize {
        if self.rng.gen_bool(0.5) {
            self.turn_left
        } else {
            self.turn_right
        }
    }

    fn select(&mut self, index: usize, reverse: bool, now: Millis) {
        if index == self.current && reverse == self.reverse {
            return;
        }
        self.current = index;
        self.reverse = reverse;
        self.dirty = true;
        self.selected_at = Some(now);
    }
}
