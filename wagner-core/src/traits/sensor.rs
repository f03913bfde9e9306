//! Distance sensor trait

/// Errors that can occur with distance sensing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SensorError {
    /// No echo within the measurement window
    Timeout,
    /// Reading outside the sensor's usable range
    OutOfRange,
    /// No reading has been taken yet
    NotReady,
}

/// Trait for forward-facing obstacle sensors
///
/// Takes `&mut self` because triggering a measurement usually needs
/// mutable access to pins or buses.
pub trait DistanceSensor {
    /// Distance to the nearest obstacle in centimetres
    fn distance_cm(&mut self) -> Result<f32, SensorError>;
}
