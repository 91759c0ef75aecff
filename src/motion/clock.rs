//! Host/wearable clock offset estimation.
//!
//! One sync round trip: the host sends at `T` (host clock), the wearable
//! replies with its local time `W`, and the host measures round-trip `R`.
//! Assuming symmetric latency the reply left the wearable at host time
//! `T + R/2`, so
//!
//! ```text
//! offset = (T + R) − (W + R/2)
//! host   = local + offset
//! ```
//!
//! The offset is applied at query time, never baked into stored samples,
//! so a later sync retroactively corrects everything already buffered.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::defaults::CLOCK_SYNC_HISTORY;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ClockSyncError {
    #[error("sync round trip contains non-finite values")]
    NonFinite,
    #[error("negative round-trip time {0:.4}s")]
    NegativeRoundTrip(f64),
    #[error("round trip {rtt:.3}s exceeds quality limit {max:.3}s")]
    RoundTripTooLong { rtt: f64, max: f64 },
}

/// Offset estimate from a single round trip.
pub fn estimate_offset(send_time: f64, wearable_time: f64, round_trip: f64) -> f64 {
    (send_time + round_trip) - (wearable_time + round_trip / 2.0)
}

/// Summary over the retained sync history.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ClockSyncStats {
    /// Accepted round trips (retained history, not lifetime)
    pub samples: usize,
    /// Round trips rejected since creation
    pub rejected: usize,
    pub current_offset: Option<f64>,
    pub min_round_trip: Option<f64>,
    pub max_round_trip: Option<f64>,
    /// max − min offset across retained history
    pub offset_spread: Option<f64>,
}

#[derive(Debug, Clone, Copy)]
struct SyncRecord {
    offset: f64,
    round_trip: f64,
}

#[derive(Debug, Clone)]
pub struct ClockSync {
    max_round_trip: f64,
    offset: Option<f64>,
    history: VecDeque<SyncRecord>,
    rejected: usize,
}

impl ClockSync {
    pub fn new(max_round_trip: f64) -> Self {
        Self {
            max_round_trip,
            offset: None,
            history: VecDeque::with_capacity(CLOCK_SYNC_HISTORY),
            rejected: 0,
        }
    }

    /// Record a round trip and adopt its offset.
    ///
    /// Rejected round trips leave the previous offset in place.
    pub fn record_round_trip(
        &mut self,
        send_time: f64,
        wearable_time: f64,
        round_trip: f64,
    ) -> Result<f64, ClockSyncError> {
        let checked = self.check(send_time, wearable_time, round_trip);
        if let Err(ref e) = checked {
            self.rejected += 1;
            warn!(error = %e, "Clock sync round trip rejected, keeping previous offset");
        }
        checked?;

        let offset = estimate_offset(send_time, wearable_time, round_trip);
        if self.history.len() >= CLOCK_SYNC_HISTORY {
            self.history.pop_front();
        }
        self.history.push_back(SyncRecord { offset, round_trip });
        self.offset = Some(offset);
        debug!(offset, round_trip, "Clock offset updated");
        Ok(offset)
    }

    fn check(&self, send_time: f64, wearable_time: f64, round_trip: f64) -> Result<(), ClockSyncError> {
        if !(send_time.is_finite() && wearable_time.is_finite() && round_trip.is_finite()) {
            return Err(ClockSyncError::NonFinite);
        }
        if round_trip < 0.0 {
            return Err(ClockSyncError::NegativeRoundTrip(round_trip));
        }
        if round_trip > self.max_round_trip {
            return Err(ClockSyncError::RoundTripTooLong {
                rtt: round_trip,
                max: self.max_round_trip,
            });
        }
        Ok(())
    }

    /// Current offset; 0 until a round trip has been accepted.
    pub fn offset(&self) -> f64 {
        self.offset.unwrap_or(0.0)
    }

    pub fn is_established(&self) -> bool {
        self.offset.is_some()
    }

    pub fn to_host(&self, local_time: f64) -> f64 {
        local_time + self.offset()
    }

    pub fn to_local(&self, host_time: f64) -> f64 {
        host_time - self.offset()
    }

    pub fn stats(&self) -> ClockSyncStats {
        let round_trips = self.history.iter().map(|r| r.round_trip);
        let offsets = self.history.iter().map(|r| r.offset);
        let spread = offsets
            .clone()
            .reduce(f64::max)
            .zip(offsets.reduce(f64::min))
            .map(|(max, min)| max - min);
        ClockSyncStats {
            samples: self.history.len(),
            rejected: self.rejected,
            current_offset: self.offset,
            min_round_trip: round_trips.clone().reduce(f64::min),
            max_round_trip: round_trips.reduce(f64::max),
            offset_spread: spread,
        }
    }
}
