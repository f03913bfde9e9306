//! Inter-task communication channels
//!
//! The Bluetooth receive task and the sensor task only publish data; all
//! decisions are taken in the control task.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use portable_atomic::{AtomicU32, Ordering};

/// Channel capacity for received command bytes
const COMMAND_CHANNEL_SIZE: usize = 64;

/// Bits stored while no valid distance is available (a NaN pattern)
const NO_DISTANCE: u32 = u32::MAX;

/// Raw bytes from the Bluetooth bridge, in arrival order
pub static COMMAND_BYTES: Channel<CriticalSectionRawMutex, u8, COMMAND_CHANNEL_SIZE> =
    Channel::new();

/// Latest forward distance as `f32` bits, [`NO_DISTANCE`] when unknown
static DISTANCE_CM: AtomicU32 = AtomicU32::new(NO_DISTANCE);

/// Publish a distance reading, `None` for a failed measurement
pub fn publish_distance(distance_cm: Option<f32>) {
    let bits = distance_cm.map_or(NO_DISTANCE, f32::to_bits);
    DISTANCE_CM.store(bits, Ordering::Relaxed);
}

/// Most recent published reading
pub fn latest_distance() -> Option<f32> {
    match DISTANCE_CM.load(Ordering::Relaxed) {
        NO_DISTANCE => None,
        bits => Some(f32::from_bits(bits)),
    }
}
