//! Embassy async tasks
//!
//! Each task runs independently and communicates via channels.

pub mod bluetooth_rx;
pub mod control;
pub mod sensor;

pub use bluetooth_rx::bluetooth_rx_task;
pub use control::control_task;
pub use sensor::{now_us, sensor_task, SharedDistance};
