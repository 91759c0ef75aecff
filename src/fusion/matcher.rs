//! Swing matching and combined confidence.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::FusionConfig;
use crate::types::{clamp_unit, CameraCapture, MotionSample, WearableCapture, GRAVITY_G};

/// Two onsets are the same swing iff they are strictly closer than `tolerance`.
pub fn swings_match(camera_onset: f64, wearable_onset: f64, tolerance: f64) -> bool {
    (wearable_onset - camera_onset).abs() < tolerance
}

/// Camera confidence, corroborated or contradicted by the wearable.
///
/// `camera + bonus` (wearable present) `− penalty × |Δt|` (beyond the
/// alignment window), clamped to [0, 1]. A large onset gap counts as
/// evidence against the match, so the penalty applies even when the sources
/// otherwise agree.
pub fn combined_confidence(
    camera_confidence: f64,
    wearable_present: bool,
    onset_delta: Option<f64>,
    config: &FusionConfig,
) -> f64 {
    let mut confidence = camera_confidence;
    if wearable_present {
        confidence += config.wearable_bonus;
    }
    if let Some(delta) = onset_delta {
        if delta.abs() > config.alignment_window_secs {
            confidence -= config.offset_penalty_per_sec * delta.abs();
        }
    }
    clamp_unit(confidence)
}

/// First sample whose acceleration exceeds gravity by more than `threshold_g`.
pub fn detect_wearable_onset(samples: &[MotionSample], threshold_g: f64) -> Option<f64> {
    samples
        .iter()
        .find(|s| s.acceleration_magnitude() - GRAVITY_G > threshold_g)
        .map(|s| s.timestamp)
}

/// Outcome of pairing one camera capture with one wearable capture.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SwingMatch {
    /// Wearable onset − camera onset (seconds)
    pub onset_delta: Option<f64>,
    pub matched: bool,
    pub combined_confidence: f64,
}

#[derive(Debug, Clone, Default)]
pub struct SwingMatcher {
    config: FusionConfig,
}

impl SwingMatcher {
    pub fn new(config: FusionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FusionConfig {
        &self.config
    }

    /// Pair the two halves of a capture.
    ///
    /// Without a camera capture the base confidence is 0, so a
    /// wearable-only swing scores at most the wearable bonus.
    pub fn evaluate(&self, camera: Option<&CameraCapture>, wearable: Option<&WearableCapture>) -> SwingMatch {
        let camera_onset = camera.and_then(|c| c.onset);
        let wearable_onset = wearable.and_then(|w| w.metrics.onset);
        let onset_delta = camera_onset
            .zip(wearable_onset)
            .map(|(cam, wear)| wear - cam);
        let matched = camera_onset
            .zip(wearable_onset)
            .is_some_and(|(cam, wear)| swings_match(cam, wear, self.config.match_tolerance_secs));

        let base = camera.map_or(0.0, |c| c.confidence);
        let wearable_present = wearable.is_some_and(|w| !w.samples.is_empty());
        let confidence = combined_confidence(base, wearable_present, onset_delta, &self.config);

        debug!(
            onset_delta = ?onset_delta,
            matched,
            confidence,
            "Swing sources evaluated"
        );

        SwingMatch {
            onset_delta,
            matched,
            combined_confidence: confidence,
        }
    }
}
