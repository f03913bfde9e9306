//! Hardware abstraction traits
//!
//! These traits define the interface between the drive/connectivity logic
//! and board-specific implementations.

pub mod motor;
pub mod radio;
pub mod sensor;

pub use motor::{Direction, Motor, MotorError};
pub use radio::{AddressParseError, IpAddress, MacAddress, Radio, RadioError};
pub use sensor::{DistanceSensor, SensorError};
