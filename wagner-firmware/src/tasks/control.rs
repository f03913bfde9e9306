//! Control task
//!
//! Owns the [`Wagner`] controller. Command bytes are decoded as they arrive;
//! every tick runs one drive step and one reconnection step. Link queries
//! read the modem driver's cached state, so only a join attempt blocks.

use defmt::*;
use embassy_futures::select::{select, Either};
use embassy_rp::gpio::Output;
use embassy_rp::uart::BufferedUart;
use embassy_time::{Delay, Duration, Instant, Ticker};
use rand::rngs::SmallRng;

use wagner_core::connectivity::{ReconnectOutcome, WifiStatus};
use wagner_core::time::{Clock, Millis};
use wagner_core::{DriveOutcome, DriveReport, Wagner};
use wagner_drivers::motor::HBridgeMotor;
use wagner_drivers::radio::EspAtRadio;
use wagner_protocol::BLUETOOTH_CHANNEL;

use super::sensor::SharedDistance;
use crate::channels::COMMAND_BYTES;
use crate::pwm::SliceOutput;

/// Control loop period (ms)
pub const CONTROL_INTERVAL_MS: u64 = 20;

/// One wheel: PWM slice plus IN1/IN2 direction pins
pub type DriveMotor = HBridgeMotor<SliceOutput, Output<'static>, Output<'static>>;

/// ESP-01 on a buffered UART
pub type ModemRadio = EspAtRadio<BufferedUart, Delay>;

/// The controller as wired on the board: left and right wheel
pub type Rover = Wagner<'static, DriveMotor, SharedDistance, ModemRadio, SmallRng, 2>;

/// Milliseconds since the control task started
struct UptimeClock {
    start: Instant,
}

impl Clock for UptimeClock {
    fn now(&self) -> Millis {
        // Wraps after ~49 days; Millis compares with wrapping arithmetic
        Millis(self.start.elapsed().as_millis() as u32)
    }
}

/// Control task
#[embassy_executor::task]
pub async fn control_task(mut rover: Rover) {
    info!("Control task started");

    let clock = UptimeClock {
        start: Instant::now(),
    };
    let mut ticker = Ticker::every(Duration::from_millis(CONTROL_INTERVAL_MS));

    loop {
        match select(COMMAND_BYTES.receive(), ticker.next()).await {
            Either::First(byte) => {
                if let Some(directive) = rover.handle_byte(BLUETOOTH_CHANNEL, byte) {
                    debug!("Directive: {:?}", directive);
                }
            }
            Either::Second(()) => {
                let report = rover.poll(&clock);
                log_drive(&report.drive);
                log_reconnect(report.wifi);

                if let Some(status) = rover.print_status(clock.now()) {
                    log_status(&status);
                }
            }
        }
    }
}

fn log_drive(report: &DriveReport) {
    if let Some(event) = report.event {
        info!("Drive event: {:?}", event);
    }

    match report.outcome {
        DriveOutcome::Unchanged => {}
        DriveOutcome::Applied(code) => debug!("Action {} applied", code),
        DriveOutcome::Failed(e) => warn!("Motor write failed: {:?}", e),
    }
}

fn log_reconnect(outcome: ReconnectOutcome) {
    match outcome {
        ReconnectOutcome::Attempted {
            attempt,
            result: Ok(()),
        } => info!("WiFi reconnected on attempt {}", attempt),
        ReconnectOutcome::Attempted {
            attempt,
            result: Err(e),
        } => warn!("WiFi attempt {} failed: {:?}", attempt, e),
        ReconnectOutcome::CooldownReset => info!("WiFi cool-down over"),
        ReconnectOutcome::Connected | ReconnectOutcome::Waiting | ReconnectOutcome::Exhausted => {}
    }
}

fn log_status(status: &WifiStatus) {
    if !status.connected {
        info!("WiFi disconnected, {} attempts this cycle", status.attempts);
        return;
    }

    match (status.mac, status.ip) {
        (Some(mac), Some(ip)) => info!(
            "WiFi connected, MAC {}, IP {}",
            Display2Format(&mac),
            Display2Format(&ip)
        ),
        _ => info!("WiFi connected, address query failed"),
    }
}
