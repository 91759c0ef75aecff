//! Phase Segmenter - one marker per canonical phase for a captured swing
//!
//! Frames are taken in `frame_index` order. Each frame gets a progress
//! fraction in [0, 1] over the capture; each phase is placed on the frame
//! nearest its configured breakpoint, ties going to the earliest frame.
//! Emitted frame indices never decrease, even when timestamps jitter
//! backwards between frames.
//!
//! ## Progress basis
//!
//! - `Kinematic` (default): cumulative rotation travel. Shoulder rotation is
//!   preferred, hip rotation is the fallback. Changes inside the deadband are
//!   treated as jitter. Swings that pause at address or at the top then keep
//!   their phases attached to body motion rather than the clock.
//! - `Time`: elapsed time over the capture span, held at its running
//!   maximum so a late timestamp never moves progress backwards.
//!
//! Kinematic progress falls back to time when there is no measurable travel,
//! and time falls back to frame order when all timestamps coincide.

use tracing::debug;

use crate::config::defaults::MIN_KINEMATIC_TRAVEL_DEG;
use crate::config::{ProgressBasis, SegmentationConfig};
use crate::types::{PoseFrame, SwingPhase, SwingPhaseMarker};

#[derive(Debug, Clone, Default)]
pub struct PhaseSegmenter {
    config: SegmentationConfig,
}

impl PhaseSegmenter {
    pub fn new(config: SegmentationConfig) -> Self {
        Self { config }
    }

    /// Markers for the eight canonical phases, in order. Empty input yields no markers.
    pub fn segment(&self, frames: &[PoseFrame]) -> Vec<SwingPhaseMarker> {
        if frames.is_empty() {
            return Vec::new();
        }

        let mut ordered: Vec<&PoseFrame> = frames.iter().collect();
        ordered.sort_by(|a, b| {
            a.frame_index
                .cmp(&b.frame_index)
                .then(a.timestamp.total_cmp(&b.timestamp))
        });

        let progress = self.progress(&ordered);
        let breakpoints = self.config.breakpoints.ordered();

        let mut floor = 0usize;
        let markers: Vec<SwingPhaseMarker> = SwingPhase::ALL
            .iter()
            .zip(breakpoints)
            .map(|(&phase, target)| {
                let idx = nearest_index(&progress, target).max(floor);
                floor = idx;
                let frame = ordered[idx];
                SwingPhaseMarker {
                    phase,
                    timestamp: frame.timestamp,
                    frame_index: frame.frame_index,
                    confidence: frame.confidence,
                }
            })
            .collect();

        debug!(
            frames = ordered.len(),
            top = markers[3].frame_index,
            impact = markers[5].frame_index,
            "Swing segmented"
        );
        markers
    }

    /// Progress fraction per frame, in frame order.
    fn progress(&self, frames: &[&PoseFrame]) -> Vec<f64> {
        if frames.len() == 1 {
            return vec![0.0];
        }
        let kinematic = match self.config.basis {
            ProgressBasis::Kinematic => kinematic_progress(frames, self.config.travel_deadband_deg),
            ProgressBasis::Time => None,
        };
        kinematic
            .or_else(|| time_progress(frames))
            .unwrap_or_else(|| index_progress(frames.len()))
    }
}

/// Index of the progress value nearest `target`; strict `<` keeps the earliest on ties.
fn nearest_index(progress: &[f64], target: f64) -> usize {
    let mut best = 0;
    let mut best_dist = f64::INFINITY;
    for (i, p) in progress.iter().enumerate() {
        let dist = (p - target).abs();
        if dist < best_dist {
            best = i;
            best_dist = dist;
        }
    }
    best
}

fn kinematic_progress(frames: &[&PoseFrame], deadband: f64) -> Option<Vec<f64>> {
    let shoulder: Vec<Option<f64>> = frames.iter().map(|f| f.angles.shoulder_rotation).collect();
    let hip: Vec<Option<f64>> = frames.iter().map(|f| f.angles.hip_rotation).collect();

    [shoulder, hip]
        .into_iter()
        .find_map(|series| cumulative_travel(&series, deadband))
}

/// Normalized cumulative |Δangle|, holding the last committed angle so
/// sub-deadband jitter never accumulates.
fn cumulative_travel(series: &[Option<f64>], deadband: f64) -> Option<Vec<f64>> {
    let mut committed: Option<f64> = None;
    let mut total = 0.0;
    let mut travel = Vec::with_capacity(series.len());

    for value in series {
        if let Some(angle) = value.filter(|a| a.is_finite()) {
            match committed {
                None => committed = Some(angle),
                Some(prev) => {
                    let delta = (angle - prev).abs();
                    if delta >= deadband {
                        total += delta;
                        committed = Some(angle);
                    }
                }
            }
        }
        travel.push(total);
    }

    if total < MIN_KINEMATIC_TRAVEL_DEG {
        return None;
    }
    Some(travel.into_iter().map(|t| t / total).collect())
}

fn time_progress(frames: &[&PoseFrame]) -> Option<Vec<f64>> {
    let finite = frames.iter().map(|f| f.timestamp).filter(|t| t.is_finite());
    let start = finite.clone().fold(f64::INFINITY, f64::min);
    let duration = finite.fold(f64::NEG_INFINITY, f64::max) - start;
    if !(duration.is_finite() && duration > 0.0) {
        return None;
    }
    let mut reached = 0.0_f64;
    Some(
        frames
            .iter()
            .map(|f| {
                // f64::max ignores the NaN a non-finite timestamp produces
                reached = reached.max(((f.timestamp - start) / duration).clamp(0.0, 1.0));
                reached
            })
            .collect(),
    )
}

fn index_progress(len: usize) -> Vec<f64> {
    let last = (len.max(2) - 1) as f64;
    (0..len).map(|i| i as f64 / last).collect()
}
