//! HC-SR04 ultrasonic range finder
//!
//! A 10 µs pulse on TRIG starts a measurement; ECHO then stays high for the
//! round-trip time of the sound burst. At ~343 m/s that is 58 µs per
//! centimetre of distance.
//!
//! The echo wait has no timeout of its own. A missing sensor keeps ECHO low
//! forever, so callers should race [`Hcsr04::measure_cm`] against a timer.

use embedded_hal::digital::OutputPin;
use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::digital::Wait;
use wagner_core::traits::SensorError;

/// Closest distance the sensor resolves
pub const MIN_DISTANCE_CM: f32 = 2.0;

/// Farthest distance the sensor resolves
pub const MAX_DISTANCE_CM: f32 = 400.0;

/// Echo microseconds per centimetre of distance
const US_PER_CM: f32 = 58.0;

/// Convert an echo pulse width to a distance
pub fn echo_to_cm(echo_us: u32) -> f32 {
    echo_us as f32 / US_PER_CM
}

/// Reject readings outside the sensor's range
fn check_range(distance_cm: f32) -> Result<f32, SensorError> {
    if (MIN_DISTANCE_CM..=MAX_DISTANCE_CM).contains(&distance_cm) {
        Ok(distance_cm)
    } else {
        Err(SensorError::OutOfRange)
    }
}

/// HC-SR04 driver
///
/// `now_us` is a free-running microsecond counter used to time the echo.
pub struct Hcsr04<T, E, D, C> {
    trigger: T,
    echo: E,
    delay: D,
    now_us: C,
}

impl<T, E, D, C> Hcsr04<T, E, D, C>
where
    T: OutputPin,
    E: Wait,
    D: DelayNs,
    C: FnMut() -> u64,
{
    pub fn new(trigger: T, echo: E, delay: D, now_us: C) -> Self {
        Self {
            trigger,
            echo,
            delay,
            now_us,
        }
    }

    /// Trigger a measurement and return the echo pulse width
    pub async fn measure_echo_us(&mut self) -> Result<u32, SensorError> {
        self.trigger.set_low().map_err(|_| SensorError::NotReady)?;
        self.delay.delay_us(2).await;
        self.trigger.set_high().map_err(|_| SensorError::NotReady)?;
        self.delay.delay_us(10).await;
        self.trigger.set_low().map_err(|_| SensorError::NotReady)?;

        self.echo
            .wait_for_high()
            .await
            .map_err(|_| SensorError::NotReady)?;
        let start = (self.now_us)();
        self.echo
            .wait_for_low()
            .await
            .map_err(|_| SensorError::NotReady)?;
        let width = (self.now_us)().saturating_sub(start);

        u32::try_from(width).map_err(|_| SensorError::OutOfRange)
    }

    /// Trigger a measurement and return the distance in centimetres
    pub async fn measure_cm(&mut self) -> Result<f32, SensorError> {
        let echo_us = self.measure_echo_us().await?;
        check_range(echo_to_cm(echo_us))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::Cell;
    use core::convert::Infallible;
    use embassy_futures::block_on;

    #[test]
    fn test_echo_to_cm() {
        assert_eq!(echo_to_cm(0), 0.0);
        assert_eq!(echo_to_cm(580), 10.0);
        assert_eq!(echo_to_cm(870), 15.0);
    }

    #[test]
    fn test_range() {
        assert_eq!(check_range(10.0), Ok(10.0));
        assert_eq!(check_range(1.0), Err(SensorError::OutOfRange));
        assert_eq!(check_range(500.0), Err(SensorError::OutOfRange));
    }

    struct MockTrigger {
        pulses: u32,
    }

    impl embedded_hal::digital::ErrorType for MockTrigger {
        type Error = Infallible;
    }

    impl OutputPin for MockTrigger {
        fn set_low(&mut self) -> Result<(), Infallible> {
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Infallible> {
            self.pulses += 1;
            Ok(())
        }
    }

    /// Echo pin that is "high" for a fixed number of clock ticks
    struct MockEcho<'a> {
        clock: &'a Cell<u64>,
        width_us: u64,
    }

    impl embedded_hal::digital::ErrorType for MockEcho<'_> {
        type Error = Infallible;
    }

    impl Wait for MockEcho<'_> {
        async fn wait_for_high(&mut self) -> Result<(), Infallible> {
            Ok(())
        }

        async fn wait_for_low(&mut self) -> Result<(), Infallible> {
            self.clock.set(self.clock.get() + self.width_us);
            Ok(())
        }

        async fn wait_for_rising_edge(&mut self) -> Result<(), Infallible> {
            Ok(())
        }

        async fn wait_for_falling_edge(&mut self) -> Result<(), Infallible> {
            Ok(())
        }

        async fn wait_for_any_edge(&mut self) -> Result<(), Infallible> {
            Ok(())
        }
    }

    struct NoDelay;

    impl DelayNs for NoDelay {
        async fn delay_ns(&mut self, _ns: u32) {}
    }

    fn sensor(
        clock: &Cell<u64>,
        width_us: u64,
    ) -> Hcsr04<MockTrigger, MockEcho<'_>, NoDelay, impl FnMut() -> u64 + '_> {
        Hcsr04::new(
            MockTrigger { pulses: 0 },
            MockEcho { clock, width_us },
            NoDelay,
            move || clock.get(),
        )
    }

    #[test]
    fn test_measure() {
        let clock = Cell::new(1_000);
        let mut hcsr04 = sensor(&clock, 580);
        assert_eq!(block_on(hcsr04.measure_echo_us()), Ok(580));
        assert_eq!(block_on(hcsr04.measure_cm()), Ok(10.0));
        assert_eq!(hcsr04.trigger.pulses, 2);
    }

    #[test]
    fn test_measure_out_of_range() {
        let clock = Cell::new(0);
        // No obstacle: the module times out at ~38 ms
        let mut hcsr04 = sensor(&clock, 38_000);
        assert_eq!(block_on(hcsr04.measure_cm()), Err(SensorError::OutOfRange));
    }
}
