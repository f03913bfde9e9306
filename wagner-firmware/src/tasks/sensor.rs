//! Ultrasonic distance task
//!
//! Measures the forward distance at a fixed rate and publishes it for the
//! control task. A reading that fails or times out is published as "no
//! reading", which the controller treats as a clear path.

use defmt::*;
use embassy_rp::gpio::{Input, Output};
use embassy_time::{with_timeout, Delay, Duration, Instant, Ticker};

use wagner_core::traits::{DistanceSensor, SensorError};
use wagner_drivers::sensor::Hcsr04;

use crate::channels::{latest_distance, publish_distance};

/// Time between two measurements (ms)
pub const MEASURE_INTERVAL_MS: u64 = 60;

/// Longest echo wait; 400 cm is about 23 ms of echo (ms)
const ECHO_TIMEOUT_MS: u64 = 30;

/// HC-SR04 wired to RP2040 pins
pub type UltrasonicSensor = Hcsr04<Output<'static>, Input<'static>, Delay, fn() -> u64>;

/// Microseconds since boot
pub fn now_us() -> u64 {
    Instant::now().as_micros()
}

/// Sensor task
#[embassy_executor::task]
pub async fn sensor_task(mut sensor: UltrasonicSensor) {
    info!("Sensor task started");

    let mut ticker = Ticker::every(Duration::from_millis(MEASURE_INTERVAL_MS));

    loop {
        ticker.next().await;

        let reading = match with_timeout(
            Duration::from_millis(ECHO_TIMEOUT_MS),
            sensor.measure_cm(),
        )
        .await
        {
            Ok(Ok(distance_cm)) => {
                trace!("Distance: {} cm", distance_cm);
                Some(distance_cm)
            }
            Ok(Err(e)) => {
                trace!("Distance read failed: {:?}", e);
                None
            }
            Err(_) => {
                trace!("Echo timeout");
                None
            }
        };

        publish_distance(reading);
    }
}

/// The latest published reading, seen as a distance sensor
pub struct SharedDistance;

impl DistanceSensor for SharedDistance {
    fn distance_cm(&mut self) -> Result<f32, SensorError> {
        latest_distance().ok_or(SensorError::NotReady)
    }
}
