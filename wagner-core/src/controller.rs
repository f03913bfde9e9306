//! The rover controller
//!
//! [`Wagner`] owns the motors, the command link decoding, the maneuver
//! scheduler and the connectivity supervisor. Nothing in here blocks except
//! the radio calls, so the firmware can drive it from a single task.
//!
//! Data flow:
//!
//! ```text
//! byte -> ChannelRouter -> payload -> CommandInterpreter -> directive
//!                                                             |
//!      distance sensor ---------------> ActionScheduler <-----+
//!                                             |
//!                                          motors
//! ```

use rand::RngCore;
use wagner_protocol::{ChannelRouter, CommandInterpreter, SteeringDirective};

use crate::action::Action;
use crate::config::RobotConfig;
use crate::connectivity::{ConnectivitySupervisor, ReconnectOutcome, WifiStatus};
use crate::scheduler::{ActionScheduler, CatalogError};
use crate::state::DriveEvent;
use crate::time::{Clock, Millis};
use crate::traits::{DistanceSensor, IpAddress, MacAddress, Motor, MotorError, Radio, RadioError};

/// Construction-time configuration errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ControllerError {
    /// Motor array is empty
    NoMotors,
    /// An action drives a motor the array does not have
    MotorIndexOutOfRange { action: u8, motor: usize },
    /// Catalog has no actions
    EmptyCatalog,
    /// Catalog lacks a maneuver the scheduler selects on its own
    MissingAction(u8),
}

impl From<CatalogError> for ControllerError {
    fn from(e: CatalogError) -> Self {
        match e {
            CatalogError::Empty => ControllerError::EmptyCatalog,
            CatalogError::MissingAction(code) => ControllerError::MissingAction(code),
        }
    }
}

/// Result of writing motor commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DriveOutcome {
    /// Selection unchanged, nothing written
    Unchanged,
    /// Every motor accepted the commands of this action code
    Applied(u8),
    /// A motor rejected its command; the write is retried next tick
    Failed(MotorError),
}

/// What one drive step did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DriveReport {
    /// Drive state transition, if one happened
    pub event: Option<DriveEvent>,
    pub outcome: DriveOutcome,
}

/// What one [`Wagner::poll`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PollReport {
    pub drive: DriveReport,
    pub wifi: ReconnectOutcome,
}

/// Rover controller
///
/// - `M`: drive motor, `N` of them
/// - `S`: forward distance sensor
/// - `W`: wireless radio
/// - `G`: random source for the avoidance side
pub struct Wagner<'a, M, S, W, G, const N: usize> {
    motors: [M; N],
    router: ChannelRouter,
    interpreter: CommandInterpreter,
    scheduler: ActionScheduler<'a, G>,
    supervisor: ConnectivitySupervisor,
    sensor: S,
    radio: W,
}

impl<'a, M, S, W, G, const N: usize> Wagner<'a, M, S, W, G, N>
where
    M: Motor,
    S: DistanceSensor,
    W: Radio,
    G: RngCore,
{
    /// Assemble a controller
    ///
    /// Fails when the motor array is empty or the catalog cannot drive it.
    /// Until the first [`drive`](Self::drive) every motor is considered
    /// unwritten and gets a stop command.
    pub fn new(
        motors: [M; N],
        catalog: &'a [Action],
        config: RobotConfig,
        sensor: S,
        radio: W,
        rng: G,
    ) -> Result<Self, ControllerError> {
        if N == 0 {
            return Err(ControllerError::NoMotors);
        }
        if catalog.is_empty() {
            return Err(ControllerError::EmptyCatalog);
        }
        for action in catalog {
            if let Some(motor) = action.max_motor_index().filter(|&m| m >= N) {
                return Err(ControllerError::MotorIndexOutOfRange {
                    action: action.code,
                    motor,
                });
            }
        }

        let RobotConfig {
            drive,
            wifi,
            protocol,
        } = config;

        Ok(Self {
            motors,
            router: ChannelRouter::bluetooth(protocol.resolved_frame_len()),
            interpreter: CommandInterpreter::new(protocol.variant),
            scheduler: ActionScheduler::new(catalog, drive, rng)?,
            supervisor: ConnectivitySupervisor::new(wifi),
            sensor,
            radio,
        })
    }

    /// Feed one byte received on a serial channel
    ///
    /// Returns the directive when the byte completed a valid command.
    pub fn handle_byte(&mut self, channel: u8, byte: u8) -> Option<SteeringDirective> {
        let payload = self.router.on_byte(channel, byte)?;
        self.handle_payload(&payload)
    }

    /// Interpret a complete payload and hand the directive to the scheduler
    ///
    /// Malformed payloads leave the current directive untouched.
    pub fn handle_payload(&mut self, payload: &str) -> Option<SteeringDirective> {
        let directive = self.interpreter.interpret(payload)?;
        self.scheduler.steer(directive);
        Some(directive)
    }

    /// Run one scheduling step and write motor commands if needed
    pub fn drive(&mut self, now: Millis) -> DriveReport {
        // A failed reading counts as a clear path
        let distance = self.sensor.distance_cm().ok();
        let event = self.scheduler.tick(now, distance);
        DriveReport {
            event,
            outcome: self.apply(),
        }
    }

    /// One drive step and one reconnection step at the clock's time
    pub fn poll<C: Clock>(&mut self, clock: &C) -> PollReport {
        let now = clock.now();
        PollReport {
            drive: self.drive(now),
            wifi: self.retry_reconnection(now),
        }
    }

    /// Whether the radio is associated
    pub fn is_connected(&mut self) -> bool {
        self.radio.is_associated()
    }

    /// Station hardware address
    pub fn mac_address(&mut self) -> Result<MacAddress, RadioError> {
        self.radio.mac_address()
    }

    /// Station IPv4 address
    pub fn local_ip(&mut self) -> Result<IpAddress, RadioError> {
        self.radio.local_ip()
    }

    /// Throttled status snapshot for logging
    pub fn print_status(&mut self, now: Millis) -> Option<WifiStatus> {
        self.supervisor.print_status(&mut self.radio, now)
    }

    /// Backoff-governed reconnection step
    pub fn retry_reconnection(&mut self, now: Millis) -> ReconnectOutcome {
        self.supervisor.retry_reconnection(&mut self.radio, now)
    }

    /// Reconnect right away, discarding the backoff
    pub fn reconnect(&mut self, now: Millis) -> ReconnectOutcome {
        self.supervisor.reconnect(&mut self.radio, now)
    }

    /// Maneuver scheduler
    pub fn scheduler(&self) -> &ActionScheduler<'a, G> {
        &self.scheduler
    }

    /// Connectivity supervisor
    pub fn supervisor(&self) -> &ConnectivitySupervisor {
        &self.supervisor
    }

    /// Drive motors
    pub fn motors(&self) -> &[M; N] {
        &self.motors
    }

    /// Distance sensor
    pub fn sensor_mut(&mut self) -> &mut S {
        &mut self.sensor
    }

    /// Wireless radio
    pub fn radio_mut(&mut self) -> &mut W {
        &mut self.radio
    }

    /// Write the pending selection to every motor
    ///
    /// All motors are written even after a failure; the first error is
    /// reported and the selection stays pending.
    fn apply(&mut self) -> DriveOutcome {
        let Some(command) = self.scheduler.pending() else {
            return DriveOutcome::Unchanged;
        };

        let mut failure = None;
        for (index, speed) in command.motor_commands() {
            let result = match self.motors.get_mut(index) {
                Some(motor) => motor.set_speed(speed),
                None => Err(MotorError::Disabled),
            };
            if let Err(e) = result {
                failure.get_or_insert(e);
            }
        }

        match failure {
            Some(e) => DriveOutcome::Failed(e),
            None => {
                self.scheduler.mark_written();
                DriveOutcome::Applied(command.action.code)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{
        MotorStep, ACTION_CURVE_LEFT, ACTION_STOP, ACTION_TURN_LEFT, ACTION_TURN_RIGHT,
        ACTION_WALK_FORWARD, DEFAULT_ACTIONS,
    };
    use crate::state::DriveState;
    use crate::time::ManualClock;
    use crate::traits::{Direction, SensorError};
    use rand::rngs::mock::StepRng;
    use wagner_protocol::{ProtocolVariant, BLUETOOTH_CHANNEL};

    #[derive(Default)]
    struct MockMotor {
        speed: i16,
        writes: u32,
        fail: bool,
    }

    impl Motor for MockMotor {
        fn set_speed(&mut self, speed: i16) -> Result<(), MotorError> {
            if self.fail {
                return Err(MotorError::Output);
            }
            self.speed = speed;
            self.writes += 1;
            Ok(())
        }

        fn speed(&self) -> i16 {
            self.speed
        }
    }

    struct MockSensor {
        reading: Result<f32, SensorError>,
    }

    impl DistanceSensor for MockSensor {
        fn distance_cm(&mut self) -> Result<f32, SensorError> {
            self.reading
        }
    }

    #[derive(Default)]
    struct MockRadio {
        associated: bool,
        attempts: u32,
    }

    impl Radio for MockRadio {
        fn is_associated(&mut self) -> bool {
            self.associated
        }

        fn associate(&mut self, _ssid: &str, _password: &str) -> Result<(), RadioError> {
            self.attempts += 1;
            Err(RadioError::AssociationFailed)
        }

        fn mac_address(&mut self) -> Result<MacAddress, RadioError> {
            Ok(MacAddress([2, 0, 0, 0, 0, 1]))
        }

        fn local_ip(&mut self) -> Result<IpAddress, RadioError> {
            Err(RadioError::NotResponding)
        }
    }

    type TestWagner = Wagner<'static, MockMotor, MockSensor, MockRadio, StepRng, 2>;

    fn clear() -> MockSensor {
        MockSensor { reading: Ok(100.0) }
    }

    fn wagner_with(config: RobotConfig) -> TestWagner {
        Wagner::new(
            [MockMotor::default(), MockMotor::default()],
            &DEFAULT_ACTIONS,
            config,
            clear(),
            MockRadio::default(),
            StepRng::new(0, 0),
        )
        .unwrap()
    }

    fn wagner() -> TestWagner {
        wagner_with(RobotConfig::default())
    }

    fn writes(w: &TestWagner) -> u32 {
        w.motors().iter().map(|m| m.writes).sum()
    }

    fn speeds(w: &TestWagner) -> [i16; 2] {
        [w.motors()[0].speed(), w.motors()[1].speed()]
    }

    #[test]
    fn test_rejects_empty_motor_array() {
        let result: Result<Wagner<'_, MockMotor, _, _, _, 0>, _> = Wagner::new(
            [],
            &DEFAULT_ACTIONS,
            RobotConfig::default(),
            clear(),
            MockRadio::default(),
            StepRng::new(0, 0),
        );
        assert_eq!(result.err(), Some(ControllerError::NoMotors));
    }

    #[test]
    fn test_rejects_out_of_range_motor() {
        let result: Result<Wagner<'_, MockMotor, _, _, _, 1>, _> = Wagner::new(
            [MockMotor::default()],
            &DEFAULT_ACTIONS,
            RobotConfig::default(),
            clear(),
            MockRadio::default(),
            StepRng::new(0, 0),
        );
        assert_eq!(
            result.err(),
            Some(ControllerError::MotorIndexOutOfRange {
                action: ACTION_STOP,
                motor: 1
            })
        );
    }

    #[test]
    fn test_rejects_incomplete_catalog() {
        const STEPS: [MotorStep; 1] = [MotorStep::new(0, Direction::Forward, 0)];
        static CATALOG: [Action; 1] = [Action::new(ACTION_STOP, 0, &STEPS)];

        let result: Result<Wagner<'_, MockMotor, _, _, _, 1>, _> = Wagner::new(
            [MockMotor::default()],
            &CATALOG,
            RobotConfig::default(),
            clear(),
            MockRadio::default(),
            StepRng::new(0, 0),
        );
        assert_eq!(
            result.err(),
            Some(ControllerError::MissingAction(ACTION_WALK_FORWARD))
        );

        let result: Result<Wagner<'_, MockMotor, _, _, _, 1>, _> = Wagner::new(
            [MockMotor::default()],
            &[],
            RobotConfig::default(),
            clear(),
            MockRadio::default(),
            StepRng::new(0, 0),
        );
        assert_eq!(result.err(), Some(ControllerError::EmptyCatalog));
    }

    #[test]
    fn test_bytes_to_directive() {
        let mut w = wagner();
        let directive = b"<CR#308>"
            .iter()
            .find_map(|&b| w.handle_byte(BLUETOOTH_CHANNEL, b))
            .unwrap();
        assert_eq!(directive.direction, 53);
        assert_eq!(w.scheduler().directive(), Some(directive));

        // 53 is not in the catalog, so the rover walks
        w.drive(Millis(0));
        assert_eq!(w.scheduler().current_action().code, ACTION_WALK_FORWARD);
    }

    #[test]
    fn test_malformed_payload_keeps_directive() {
        let mut w = wagner();
        w.handle_payload("CR#206").unwrap();
        assert!(w.handle_payload("CR#abc").is_none());
        assert!(w.handle_payload("XY#204").is_none());
        assert_eq!(w.scheduler().directive().unwrap().direction, 2);
    }

    #[test]
    fn test_other_channel_is_ignored() {
        let mut w = wagner();
        for &b in b"<CR#206>" {
            assert!(w.handle_byte(1, b).is_none());
        }
        assert_eq!(w.scheduler().directive(), None);
    }

    #[test]
    fn test_extended_variant() {
        let mut config = RobotConfig::default();
        config.protocol.variant = ProtocolVariant::Extended;
        let mut w = wagner_with(config);

        let directive = b"<CR#204#25>"
            .iter()
            .find_map(|&b| w.handle_byte(BLUETOOTH_CHANNEL, b));
        // 10-byte frame does not fit a 9-byte variant
        assert!(directive.is_none());

        let directive = b"<CR#204#9>"
            .iter()
            .find_map(|&b| w.handle_byte(BLUETOOTH_CHANNEL, b))
            .unwrap();
        assert_eq!(directive.direction, 1);
        assert_eq!(directive.directive, Some(11));
    }

    #[test]
    fn test_joypad_frames_steer() {
        let mut config = RobotConfig::default();
        config.protocol.variant = ProtocolVariant::Joypad;
        let mut w = wagner_with(config);

        let directive = b"<21#204>"
            .iter()
            .find_map(|&b| w.handle_byte(BLUETOOTH_CHANNEL, b))
            .unwrap();
        assert_eq!(directive.direction, 1);
        assert!(directive.is_reverse());

        w.drive(Millis(0));
        assert_eq!(speeds(&w), [-1023, -1023]);

        let directive = b"<19#210>"
            .iter()
            .find_map(|&b| w.handle_byte(BLUETOOTH_CHANNEL, b))
            .unwrap();
        assert_eq!(directive.direction, i32::from(ACTION_CURVE_LEFT));
        w.drive(Millis(20));
        assert_eq!(w.scheduler().current_action().code, ACTION_CURVE_LEFT);
    }

    #[test]
    fn test_reverse_walk() {
        let mut config = RobotConfig::default();
        config.protocol.variant = ProtocolVariant::Extended;
        config.protocol.frame_len = Some(10);
        let mut w = wagner_with(config);

        let directive = b"<CR#204#25>"
            .iter()
            .find_map(|&b| w.handle_byte(BLUETOOTH_CHANNEL, b))
            .unwrap();
        assert!(directive.is_reverse());

        w.drive(Millis(0));
        assert_eq!(speeds(&w), [-1023, -1023]);
    }

    #[test]
    fn test_motor_commands_written_once() {
        let mut w = wagner();
        let report = w.drive(Millis(0));
        assert_eq!(report.outcome, DriveOutcome::Applied(ACTION_WALK_FORWARD));
        assert_eq!(speeds(&w), [1023, 1023]);
        assert_eq!(writes(&w), 2);

        for t in (10..1000).step_by(10) {
            assert_eq!(w.drive(Millis(t)).outcome, DriveOutcome::Unchanged);
        }
        assert_eq!(writes(&w), 2);
    }

    #[test]
    fn test_obstacle_scenario() {
        let mut w = wagner();
        w.drive(Millis(0));
        let before = writes(&w);

        w.sensor_mut().reading = Ok(10.0);
        let report = w.drive(Millis(100));
        assert_eq!(report.event, Some(DriveEvent::ObstacleDetected));
        assert_eq!(report.outcome, DriveOutcome::Applied(ACTION_STOP));
        assert_eq!(w.scheduler().state(), DriveState::Blocked);
        assert_eq!(speeds(&w), [0, 0]);
        assert_eq!(writes(&w), before + 2);

        // One stop write only, however long the block lasts
        for t in (200..2100).step_by(100) {
            w.drive(Millis(t));
        }
        assert_eq!(writes(&w), before + 2);

        // Released into a left pivot (StepRng(0, 0) always picks left)
        let report = w.drive(Millis(2100));
        assert_eq!(report.event, Some(DriveEvent::BlockTimeElapsed));
        assert_eq!(report.outcome, DriveOutcome::Applied(ACTION_TURN_LEFT));
        assert_eq!(speeds(&w), [-700, 700]);
        assert_eq!(w.scheduler().state(), DriveState::Avoiding);

        // Obstacle still there once the turn is over
        let report = w.drive(Millis(4100));
        assert_eq!(report.event, Some(DriveEvent::ObstacleDetected));
        assert_eq!(report.outcome, DriveOutcome::Applied(ACTION_STOP));
        assert_eq!(speeds(&w), [0, 0]);
    }

    #[test]
    fn test_right_side_decision() {
        let mut w: TestWagner = Wagner::new(
            [MockMotor::default(), MockMotor::default()],
            &DEFAULT_ACTIONS,
            RobotConfig::default(),
            MockSensor { reading: Ok(3.0) },
            MockRadio::default(),
            StepRng::new(u64::MAX, 0),
        )
        .unwrap();
        w.drive(Millis(0));
        let report = w.drive(Millis(2000));
        assert_eq!(report.outcome, DriveOutcome::Applied(ACTION_TURN_RIGHT));
    }

    #[test]
    fn test_sensor_failure_counts_as_clear() {
        let mut w = wagner();
        w.sensor_mut().reading = Err(SensorError::Timeout);
        w.drive(Millis(0));
        assert_eq!(w.scheduler().state(), DriveState::Autonomous);
        assert_eq!(w.scheduler().current_action().code, ACTION_WALK_FORWARD);
    }

    #[test]
    fn test_failed_write_is_retried() {
        let mut w: TestWagner = Wagner::new(
            [
                MockMotor::default(),
                MockMotor {
                    fail: true,
                    ..Default::default()
                },
            ],
            &DEFAULT_ACTIONS,
            RobotConfig::default(),
            clear(),
            MockRadio::default(),
            StepRng::new(0, 0),
        )
        .unwrap();

        assert_eq!(w.drive(Millis(0)).outcome, DriveOutcome::Failed(MotorError::Output));
        assert!(w.scheduler().is_dirty());
        assert_eq!(w.drive(Millis(10)).outcome, DriveOutcome::Failed(MotorError::Output));
    }

    #[test]
    fn test_poll_drives_and_reconnects() {
        let mut w = wagner();
        let clock = ManualClock::new(Millis(0));

        let report = w.poll(&clock);
        assert_eq!(report.drive.outcome, DriveOutcome::Applied(ACTION_WALK_FORWARD));
        assert!(matches!(report.wifi, ReconnectOutcome::Attempted { attempt: 1, .. }));

        clock.advance(500);
        assert_eq!(w.poll(&clock).wifi, ReconnectOutcome::Waiting);

        w.radio_mut().associated = true;
        assert_eq!(w.poll(&clock).wifi, ReconnectOutcome::Connected);
        assert!(w.is_connected());
    }

    #[test]
    fn test_reconnect_budget() {
        let mut w = wagner();
        for i in 0..5u32 {
            w.retry_reconnection(Millis(i * 2000));
        }
        assert_eq!(w.retry_reconnection(Millis(20_000)), ReconnectOutcome::Exhausted);
        assert_eq!(w.radio_mut().attempts, 5);

        assert_eq!(w.retry_reconnection(Millis(128_000)), ReconnectOutcome::CooldownReset);
        assert_eq!(w.supervisor().attempts(), 0);

        assert!(matches!(
            w.reconnect(Millis(128_001)),
            ReconnectOutcome::Attempted { attempt: 1, .. }
        ));
    }

    #[test]
    fn test_radio_queries() {
        let mut w = wagner();
        assert_eq!(w.mac_address(), Ok(MacAddress([2, 0, 0, 0, 0, 1])));
        assert_eq!(w.local_ip(), Err(RadioError::NotResponding));

        let status = w.print_status(Millis(0)).unwrap();
        assert!(!status.connected);
        assert_eq!(status.ip, None);
        assert!(w.print_status(Millis(1000)).is_none());
    }
}
