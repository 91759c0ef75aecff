//! Wearable motion ingestion: ring buffer, clock sync, host-time queries

mod buffer;
mod clock;
mod stream;

pub use buffer::{BufferStats, MotionBuffer};
pub use clock::{estimate_offset, ClockSync, ClockSyncError, ClockSyncStats};
pub use stream::WearableStream;

use crate::types::{MotionSample, RawMotionSample};

/// Convert a raw sample to host time with the given offset.
pub fn to_host_sample(raw: &RawMotionSample, offset: f64) -> MotionSample {
    MotionSample {
        timestamp: raw.local_timestamp + offset,
        sequence: raw.sequence,
        acceleration: raw.acceleration,
        rotation_rate: raw.rotation_rate,
    }
}
