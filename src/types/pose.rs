//! Pose frames and raw pose observations

use serde::{Deserialize, Serialize};

use super::{Joint, JointName, JointSet, TrackingSignal};

/// Body angles derived from a frame's joints.
///
/// Each angle is `None` when the joints it needs are missing or degenerate.
/// A missing angle is never reported as 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DerivedAngles {
    /// Forward lean of the spine from vertical (degrees, signed)
    pub spine: Option<f64>,
    /// Hip line rotation away from square (degrees)
    pub hip_rotation: Option<f64>,
    /// Shoulder line rotation away from square (degrees)
    pub shoulder_rotation: Option<f64>,
}

/// One timestamped snapshot of joint positions plus derived angles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoseFrame {
    /// Host clock time (seconds)
    pub timestamp: f64,
    /// Provider frame counter since detection started
    pub frame_index: u64,
    /// Overall frame confidence in [0, 1]
    pub confidence: f64,
    pub joints: JointSet,
    pub angles: DerivedAngles,
}

impl PoseFrame {
    /// Horizontal screen position of the shoulder midpoint.
    ///
    /// `None` when either shoulder is missing or has no screen-space position.
    pub fn shoulder_midpoint_x(&self) -> Option<f64> {
        let left = self.joints.get(JointName::LeftShoulder)?.screen_x()?;
        let right = self.joints.get(JointName::RightShoulder)?.screen_x()?;
        let mid = (left + right) / 2.0;
        mid.is_finite().then_some(mid)
    }

    /// True when both shoulders and both hips were detected.
    pub fn has_torso(&self) -> bool {
        [
            JointName::LeftShoulder,
            JointName::RightShoulder,
            JointName::LeftHip,
            JointName::RightHip,
        ]
        .iter()
        .all(|name| self.joints.position(*name).is_some())
    }
}

/// Raw output of the external pose detector for one camera callback.
///
/// Providers turn observations into [`PoseFrame`]s.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoseObservation {
    /// Host clock time (seconds)
    pub timestamp: f64,
    pub joints: Vec<Joint>,
    /// Detector-reported confidence; mean joint confidence is used when absent
    #[serde(default)]
    pub confidence: Option<f64>,
    /// Coarse tracking state reported by depth-capable sessions
    #[serde(default)]
    pub tracking: Option<TrackingSignal>,
}

impl PoseObservation {
    pub fn new(timestamp: f64, joints: Vec<Joint>) -> Self {
        Self {
            timestamp,
            joints,
            confidence: None,
            tracking: None,
        }
    }

    #[must_use]
    pub const fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence);
        self
    }

    #[must_use]
    pub const fn with_tracking(mut self, signal: TrackingSignal) -> Self {
        self.tracking = Some(signal);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(joints: Vec<Joint>) -> PoseFrame {
        PoseFrame {
            timestamp: 0.0,
            frame_index: 0,
            confidence: 0.9,
            joints: JointSet::new(joints),
            angles: DerivedAngles::default(),
        }
    }

    #[test]
    fn test_shoulder_midpoint() {
        let f = frame(vec![
            Joint::image(JointName::LeftShoulder, 0.4, 0.3, 0.9),
            Joint::image(JointName::RightShoulder, 0.6, 0.3, 0.9),
        ]);
        let mid = f.shoulder_midpoint_x().expect("both shoulders present");
        assert!((mid - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_has_torso_requires_all_four() {
        let f = frame(vec![
            Joint::image(JointName::LeftShoulder, 0.4, 0.3, 0.9),
            Joint::image(JointName::RightShoulder, 0.6, 0.3, 0.9),
            Joint::image(JointName::LeftHip, 0.45, 0.6, 0.9),
        ]);
        assert!(!f.has_torso());
        assert!(f.angles.spine.is_none());
    }
}
