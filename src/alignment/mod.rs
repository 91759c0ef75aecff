//! Alignment Classifier - subject framing quality, re-evaluated every frame
//!
//! Decision order (no hysteresis):
//! 1. Missing either shoulder or either hip → `TooFar`
//! 2. Shoulder midpoint left/right of the centering band → `TooLeft`/`TooRight`
//! 3. Frame confidence below the minimum → `LowConfidence`
//! 4. Otherwise → `Good`
//!
//! `TooClose` has no 2D trigger. It is produced only from a depth session's
//! out-of-bounds tracking signal via [`AlignmentClassifier::classify_signal`].

use crate::config::AlignmentConfig;
use crate::types::{AlignmentStatus, PoseFrame, TrackingSignal};

#[derive(Debug, Clone, Default)]
pub struct AlignmentClassifier {
    config: AlignmentConfig,
}

impl AlignmentClassifier {
    pub fn new(config: AlignmentConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AlignmentConfig {
        &self.config
    }

    /// Classify one frame.
    ///
    /// Frames whose shoulders have no screen-space position (unprojected
    /// depth joints) skip the centering check.
    pub fn classify(&self, frame: &PoseFrame) -> AlignmentStatus {
        if !frame.has_torso() {
            return AlignmentStatus::TooFar;
        }

        if let Some(mid_x) = frame.shoulder_midpoint_x() {
            if mid_x < self.config.left_threshold {
                return AlignmentStatus::TooLeft;
            }
            if mid_x > self.config.right_threshold {
                return AlignmentStatus::TooRight;
            }
        }

        if frame.confidence < self.config.min_confidence {
            return AlignmentStatus::LowConfidence;
        }

        AlignmentStatus::Good
    }

    /// Classify with a provider tracking signal taken into account.
    ///
    /// A lost body anchor means there is nothing to frame; an out-of-bounds
    /// subject overrides geometry since the skeleton is clipped.
    pub fn classify_signal(&self, frame: Option<&PoseFrame>, signal: TrackingSignal) -> AlignmentStatus {
        match (signal, frame) {
            (TrackingSignal::Lost, _) | (_, None) => AlignmentStatus::Searching,
            (TrackingSignal::SubjectOutOfBounds, Some(_)) => AlignmentStatus::TooClose,
            (TrackingSignal::Normal | TrackingSignal::Limited, Some(frame)) => self.classify(frame),
        }
    }
}
