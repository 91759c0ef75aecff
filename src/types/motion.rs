//! Wearable motion samples

use serde::{Deserialize, Serialize};

use super::Vec3;

/// Standard gravity in g units; a wrist at rest reads roughly this magnitude.
pub const GRAVITY_G: f64 = 1.0;

/// One wearable accelerometer/gyroscope reading, stamped in wearable-local time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawMotionSample {
    /// Wearable clock time (seconds)
    pub local_timestamp: f64,
    /// Monotonic sequence number assigned by the wearable
    pub sequence: u64,
    /// Acceleration (g)
    pub acceleration: Vec3,
    /// Rotation rate (rad/s)
    pub rotation_rate: Vec3,
}

impl RawMotionSample {
    pub fn is_finite(&self) -> bool {
        self.local_timestamp.is_finite()
            && self.acceleration.is_finite()
            && self.rotation_rate.is_finite()
    }

    /// Blend all six channels (and the timestamp) by fraction `t`.
    ///
    /// The blended sample keeps the earlier sample's sequence number.
    pub fn lerp(&self, other: &Self, t: f64) -> Self {
        Self {
            local_timestamp: t.mul_add(other.local_timestamp - self.local_timestamp, self.local_timestamp),
            sequence: self.sequence,
            acceleration: self.acceleration.lerp(other.acceleration, t),
            rotation_rate: self.rotation_rate.lerp(other.rotation_rate, t),
        }
    }
}

/// A motion sample aligned to the host clock.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotionSample {
    /// Host clock time (seconds)
    pub timestamp: f64,
    pub sequence: u64,
    /// Acceleration (g)
    pub acceleration: Vec3,
    /// Rotation rate (rad/s)
    pub rotation_rate: Vec3,
}

impl MotionSample {
    pub fn acceleration_magnitude(&self) -> f64 {
        self.acceleration.length()
    }

    pub fn rotation_rate_magnitude(&self) -> f64 {
        self.rotation_rate.length()
    }
}
