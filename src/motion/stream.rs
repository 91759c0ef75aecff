//! Wearable stream: buffer plus clock, queried in host time.

use tracing::{debug, trace};

use super::{to_host_sample, ClockSync, ClockSyncError, MotionBuffer};
use crate::config::WearableConfig;
use crate::types::{MotionSample, RawMotionSample};

/// Spacing, in nominal sample periods, that counts as a missing-sample gap.
const GAP_FACTOR: f64 = 2.5;

/// Single-writer wearable ingest path.
///
/// Owned by the capture orchestrator; ingestion and finalize-time reads
/// never overlap, so no locking is involved.
#[derive(Debug, Clone)]
pub struct WearableStream {
    buffer: MotionBuffer,
    clock: ClockSync,
    dropped: u64,
    /// Local-time spacing above which consecutive samples count as a gap
    max_gap_secs: f64,
    gaps: u64,
}

impl WearableStream {
    pub fn new(config: &WearableConfig) -> Self {
        Self {
            buffer: MotionBuffer::new(config.buffer_capacity),
            clock: ClockSync::new(config.max_round_trip_secs),
            dropped: 0,
            max_gap_secs: GAP_FACTOR / config.sample_rate_hz,
            gaps: 0,
        }
    }

    pub fn push(&mut self, sample: RawMotionSample) -> bool {
        let previous = self.buffer.latest().map(|s| s.local_timestamp);
        let accepted = self.buffer.push(sample);
        if !accepted {
            self.dropped += 1;
            trace!(sequence = sample.sequence, "Motion sample dropped");
            return false;
        }
        if let Some(previous) = previous {
            let spacing = sample.local_timestamp - previous;
            if spacing > self.max_gap_secs {
                self.gaps += 1;
                debug!(
                    sequence = sample.sequence,
                    spacing_secs = spacing,
                    "Gap in wearable stream"
                );
            }
        }
        true
    }

    /// In-order arrivals spaced wider than the configured sample rate allows.
    pub fn gaps(&self) -> u64 {
        self.gaps
    }

    pub fn record_round_trip(
        &mut self,
        send_time: f64,
        wearable_time: f64,
        round_trip: f64,
    ) -> Result<f64, ClockSyncError> {
        self.clock.record_round_trip(send_time, wearable_time, round_trip)
    }

    pub fn clock(&self) -> &ClockSync {
        &self.clock
    }

    pub fn buffer(&self) -> &MotionBuffer {
        &self.buffer
    }

    /// Samples rejected by the buffer since creation.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    pub fn interpolate_at(&self, host_time: f64) -> Option<MotionSample> {
        let offset = self.clock.offset();
        self.buffer
            .interpolate(host_time - offset)
            .map(|raw| to_host_sample(&raw, offset))
    }

    pub fn nearest_at(&self, host_time: f64) -> Option<MotionSample> {
        let offset = self.clock.offset();
        self.buffer
            .nearest(host_time - offset)
            .map(|raw| to_host_sample(&raw, offset))
    }

    /// Host-aligned samples within `[host_start, host_end]`.
    pub fn range(&self, host_start: f64, host_end: f64) -> Vec<MotionSample> {
        let offset = self.clock.offset();
        self.buffer
            .range(host_start - offset, host_end - offset)
            .iter()
            .map(|raw| to_host_sample(raw, offset))
            .collect()
    }

    /// Drop samples older than a host time.
    pub fn trim_before(&mut self, host_time: f64) {
        self.buffer.remove_before(self.clock.to_local(host_time));
    }

    /// Host time of the newest buffered sample.
    pub fn latest_host_time(&self) -> Option<f64> {
        self.buffer.latest().map(|s| self.clock.to_host(s.local_timestamp))
    }

    /// Drop buffered samples but keep the clock offset.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::Vec3;

    fn raw(local: f64, seq: u64) -> RawMotionSample {
        RawMotionSample {
            local_timestamp: local,
            sequence: seq,
            acceleration: Vec3::new(local, -1.0, 0.0),
            rotation_rate: Vec3::ZERO,
        }
    }

    #[test]
    fn offset_is_applied_at_query_time() {
        let mut stream = WearableStream::new(&WearableConfig::default());
        stream.push(raw(50.0, 0));
        stream.push(raw(50.5, 1));
        // Before sync the stream reads in local time
        assert_eq!(stream.latest_host_time(), Some(50.5));

        // Watch 40 s ahead of the phone
        stream.record_round_trip(10.0, 50.01, 0.02).unwrap();
        let host = stream.latest_host_time().unwrap();
        assert!((host - 10.5).abs() < 1e-9);

        // Already-buffered samples follow the new offset
        let s = stream.interpolate_at(10.25).unwrap();
        assert!((s.timestamp - 10.25).abs() < 1e-9);
        assert!((s.acceleration.x - 50.25).abs() < 1e-9);
        assert_eq!(stream.range(9.99, 10.51).len(), 2);
    }

    #[test]
    fn clear_keeps_offset() {
        let mut stream = WearableStream::new(&WearableConfig::default());
        stream.record_round_trip(0.0, 1.0, 0.0).unwrap();
        stream.push(raw(1.0, 0));
        stream.clear();
        assert!(stream.buffer().is_empty());
        assert!(stream.clock().is_established());
    }

    #[test]
    fn gaps_follow_sample_rate() {
        // 100 Hz: spacing above 25 ms is a gap
        let mut stream = WearableStream::new(&WearableConfig::default());
        stream.push(raw(0.00, 0));
        stream.push(raw(0.01, 1));
        stream.push(raw(0.02, 2));
        assert_eq!(stream.gaps(), 0);
        stream.push(raw(0.10, 3));
        assert_eq!(stream.gaps(), 1);

        let slow = WearableConfig {
            sample_rate_hz: 10.0,
            ..WearableConfig::default()
        };
        let mut stream = WearableStream::new(&slow);
        stream.push(raw(0.0, 0));
        stream.push(raw(0.1, 1));
        assert_eq!(stream.gaps(), 0);
    }

    #[test]
    fn dropped_samples_are_counted() {
        let mut stream = WearableStream::new(&WearableConfig::default());
        stream.push(raw(1.0, 0));
        stream.push(raw(2.0, 0));
        assert_eq!(stream.dropped(), 1);
    }
}
