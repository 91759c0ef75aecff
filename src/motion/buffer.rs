//! Time-ordered ring buffer of wearable samples.
//!
//! Samples are keyed by their wearable-local timestamp; host-time conversion
//! happens at query time in [`super::WearableStream`].

use std::collections::{HashSet, VecDeque};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::RawMotionSample;

/// Timestamps closer than this are the same instant.
const TIME_EPSILON: f64 = 1e-12;

/// A bounded, time-ordered buffer of raw motion samples.
///
/// In-order pushes are O(1) amortized. Late samples from a bursty link are
/// inserted at their sorted position; samples repeating a sequence number
/// already held are dropped. A sequence number going backwards together with
/// a timestamp past the newest sample is a wearable restart: the seen set is
/// reset and the new numbering is accepted. Samples from before the restart
/// stay in the buffer but no longer take part in deduplication.
#[derive(Debug, Clone)]
pub struct MotionBuffer {
    capacity: usize,
    samples: VecDeque<RawMotionSample>,
    sequences: HashSet<u64>,
    restarts: u64,
    /// Local time of the last restart; older samples are outside `sequences`.
    epoch_start: f64,
}

impl MotionBuffer {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            samples: VecDeque::with_capacity(capacity.clamp(1, 1024)),
            sequences: HashSet::new(),
            restarts: 0,
            epoch_start: f64::NEG_INFINITY,
        }
    }

    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        self.samples.len() >= self.capacity
    }

    pub fn clear(&mut self) {
        self.samples.clear();
        self.sequences.clear();
        self.epoch_start = f64::NEG_INFINITY;
    }

    /// Insert a sample in timestamp order.
    ///
    /// Returns `false` when the sample was dropped: non-finite values, a
    /// repeated sequence number, or a late sample older than everything held
    /// by a full buffer. At capacity the oldest sample is evicted.
    pub fn push(&mut self, sample: RawMotionSample) -> bool {
        if !sample.is_finite() {
            return false;
        }
        if self.is_restart(&sample) {
            debug!(
                sequence = sample.sequence,
                held = self.samples.len(),
                "Wearable sequence restarted"
            );
            self.sequences.clear();
            self.restarts += 1;
            self.epoch_start = sample.local_timestamp;
        } else if self.sequences.contains(&sample.sequence) {
            return false;
        }

        let in_order = self
            .samples
            .back()
            .map_or(true, |last| sample.local_timestamp >= last.local_timestamp);

        if self.is_full() {
            if let Some(oldest) = self.samples.front() {
                if sample.local_timestamp < oldest.local_timestamp {
                    return false;
                }
            }
            if let Some(evicted) = self.samples.pop_front() {
                self.forget(&evicted);
            }
        }

        if in_order {
            self.samples.push_back(sample);
        } else {
            let at = self
                .samples
                .partition_point(|s| s.local_timestamp <= sample.local_timestamp);
            self.samples.insert(at, sample);
        }
        self.sequences.insert(sample.sequence);
        true
    }

    fn forget(&mut self, evicted: &RawMotionSample) {
        if evicted.local_timestamp >= self.epoch_start {
            self.sequences.remove(&evicted.sequence);
        }
    }

    fn is_restart(&self, sample: &RawMotionSample) -> bool {
        self.samples.back().is_some_and(|last| {
            sample.sequence < last.sequence && sample.local_timestamp > last.local_timestamp
        })
    }

    /// Sequence restarts detected since creation.
    #[must_use]
    pub const fn restarts(&self) -> u64 {
        self.restarts
    }

    #[must_use]
    pub fn oldest(&self) -> Option<&RawMotionSample> {
        self.samples.front()
    }

    #[must_use]
    pub fn latest(&self) -> Option<&RawMotionSample> {
        self.samples.back()
    }

    /// Local timestamp range `(min, max)`, `None` when empty.
    #[must_use]
    pub fn timestamp_range(&self) -> Option<(f64, f64)> {
        Some((self.oldest()?.local_timestamp, self.latest()?.local_timestamp))
    }

    /// Indices `(before, after)` bracketing a local timestamp.
    ///
    /// An exact match returns `(i, i)`. `None` when the timestamp lies
    /// outside the buffered range.
    #[must_use]
    pub fn find_bracket(&self, local_time: f64) -> Option<(usize, usize)> {
        let (min, max) = self.timestamp_range()?;
        if !(min..=max).contains(&local_time) {
            return None;
        }

        // First sample at or after local_time
        let lo = self.samples.partition_point(|s| s.local_timestamp < local_time);
        let last = self.samples.len() - 1;
        if lo >= self.samples.len() {
            Some((last, last))
        } else if lo == 0 || (self.samples[lo].local_timestamp - local_time).abs() < TIME_EPSILON {
            Some((lo, lo))
        } else {
            Some((lo - 1, lo))
        }
    }

    /// Sample with the minimum absolute time distance. Ties go to the earlier sample.
    #[must_use]
    pub fn nearest(&self, local_time: f64) -> Option<RawMotionSample> {
        let after = self.samples.partition_point(|s| s.local_timestamp < local_time);
        let candidates = [after.checked_sub(1), Some(after)];
        candidates
            .into_iter()
            .flatten()
            .filter_map(|i| self.samples.get(i))
            .fold(None, |best: Option<&RawMotionSample>, s| match best {
                Some(b) if (b.local_timestamp - local_time).abs() <= (s.local_timestamp - local_time).abs() => {
                    Some(b)
                }
                _ => Some(s),
            })
            .copied()
    }

    /// Sample at an arbitrary local time.
    ///
    /// A stored timestamp returns that sample unmodified; between two samples
    /// all six channels are linearly blended; outside the buffered range the
    /// nearest sample is returned.
    #[must_use]
    pub fn interpolate(&self, local_time: f64) -> Option<RawMotionSample> {
        let Some((i, j)) = self.find_bracket(local_time) else {
            return self.nearest(local_time);
        };
        let before = self.samples.get(i)?;
        if i == j {
            return Some(*before);
        }
        let after = self.samples.get(j)?;
        let span = after.local_timestamp - before.local_timestamp;
        if span.abs() < TIME_EPSILON {
            return Some(*before);
        }
        let t = (local_time - before.local_timestamp) / span;
        let mut blended = before.lerp(after, t);
        // Keep the query time exact rather than the re-derived blend
        blended.local_timestamp = local_time;
        Some(blended)
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&RawMotionSample> {
        self.samples.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RawMotionSample> {
        self.samples.iter()
    }

    /// Drop samples older than a local timestamp.
    pub fn remove_before(&mut self, local_time: f64) {
        while let Some(front) = self.samples.front() {
            if front.local_timestamp < local_time {
                if let Some(evicted) = self.samples.pop_front() {
                    self.forget(&evicted);
                }
            } else {
                break;
            }
        }
    }

    /// Samples within `[start, end]` (inclusive, local time).
    #[must_use]
    pub fn range(&self, start: f64, end: f64) -> Vec<RawMotionSample> {
        self.samples
            .iter()
            .filter(|s| s.local_timestamp >= start && s.local_timestamp <= end)
            .copied()
            .collect()
    }

    #[must_use]
    pub fn stats(&self) -> BufferStats {
        let range = self.timestamp_range();
        BufferStats {
            count: self.len(),
            capacity: self.capacity,
            min_timestamp: range.map(|(min, _)| min),
            max_timestamp: range.map(|(_, max)| max),
            time_span: range.filter(|_| self.len() >= 2).map(|(min, max)| max - min),
        }
    }
}

/// Statistics about a motion buffer (local time).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BufferStats {
    pub count: usize,
    pub capacity: usize,
    pub min_timestamp: Option<f64>,
    pub max_timestamp: Option<f64>,
    /// `None` with fewer than 2 samples
    pub time_span: Option<f64>,
}
