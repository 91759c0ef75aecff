//! Per-swing body metrics from segmented pose frames.

use crate::config::{Handedness, MetricsConfig};
use crate::geometry::arm_angle_for;
use crate::types::{marker_for, BodyMetrics, PoseFrame, SwingPhase, SwingPhaseMarker};

/// `backswing / downswing`, only when both durations are positive.
pub fn tempo_ratio(backswing_secs: f64, downswing_secs: f64) -> Option<f64> {
    (backswing_secs > 0.0 && downswing_secs > 0.0 && backswing_secs.is_finite() && downswing_secs.is_finite())
        .then(|| backswing_secs / downswing_secs)
}

/// `max(0, 100 − penalty × |ratio − target|)`.
pub fn tempo_score(ratio: f64, config: &MetricsConfig) -> f64 {
    config
        .tempo_penalty_per_unit
        .mul_add(-(ratio - config.target_tempo_ratio).abs(), 100.0)
        .max(0.0)
}

fn peak(frames: &[PoseFrame], angle: impl Fn(&PoseFrame) -> Option<f64>) -> Option<f64> {
    frames.iter().filter_map(angle).reduce(f64::max)
}

fn frame_at<'a>(frames: &'a [PoseFrame], marker: Option<&SwingPhaseMarker>) -> Option<&'a PoseFrame> {
    let marker = marker?;
    frames.iter().find(|f| f.frame_index == marker.frame_index)
}

/// Derive every body metric the frames support; the rest stay `None`.
pub fn compute_body_metrics(
    frames: &[PoseFrame],
    markers: &[SwingPhaseMarker],
    config: &MetricsConfig,
) -> BodyMetrics {
    let takeaway = marker_for(markers, SwingPhase::Takeaway);
    let top = marker_for(markers, SwingPhase::TopOfSwing);
    let impact = marker_for(markers, SwingPhase::Impact);

    let backswing_secs = takeaway.zip(top).map(|(a, b)| b.timestamp - a.timestamp);
    let downswing_secs = top.zip(impact).map(|(a, b)| b.timestamp - a.timestamp);
    let ratio = backswing_secs
        .zip(downswing_secs)
        .and_then(|(b, d)| tempo_ratio(b, d));

    let peak_shoulder_rotation = peak(frames, |f| f.angles.shoulder_rotation);
    let peak_hip_rotation = peak(frames, |f| f.angles.hip_rotation);
    let x_factor = peak_shoulder_rotation
        .zip(peak_hip_rotation)
        .map(|(s, h)| s - h);

    let setup_spine_angle = frame_at(frames, marker_for(markers, SwingPhase::Setup)).and_then(|f| f.angles.spine);
    let max_spine_deviation = setup_spine_angle.and_then(|setup| {
        frames
            .iter()
            .filter_map(|f| f.angles.spine)
            .map(|spine| (spine - setup).abs())
            .reduce(f64::max)
    });

    let lead_left = config.handedness == Handedness::Right;
    let lead_arm_at_top = frame_at(frames, top).and_then(|f| arm_angle_for(&f.joints, lead_left));

    BodyMetrics {
        backswing_secs,
        downswing_secs,
        tempo_ratio: ratio,
        tempo_score: ratio.map(|r| tempo_score(r, config)),
        peak_shoulder_rotation,
        peak_hip_rotation,
        x_factor,
        setup_spine_angle,
        max_spine_deviation,
        spine_angle_maintained: max_spine_deviation.map(|d| d < config.spine_tolerance_deg),
        lead_arm_at_top,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::{DerivedAngles, Joint, JointName, JointSet};

    fn frame(index: u64, t: f64, spine: f64, shoulder: f64, hip: f64) -> PoseFrame {
        PoseFrame {
            timestamp: t,
            frame_index: index,
            confidence: 0.9,
            joints: JointSet::default(),
            angles: DerivedAngles {
                spine: Some(spine),
                hip_rotation: Some(hip),
                shoulder_rotation: Some(shoulder),
            },
        }
    }

    fn marker(phase: SwingPhase, frame: &PoseFrame) -> SwingPhaseMarker {
        SwingPhaseMarker {
            phase,
            timestamp: frame.timestamp,
            frame_index: frame.frame_index,
            confidence: frame.confidence,
        }
    }

    #[test]
    fn tempo_score_peaks_at_target() {
        let config = MetricsConfig::default();
        assert_eq!(tempo_score(3.0, &config), 100.0);
        assert_eq!(tempo_score(2.0, &config), 50.0);
        assert_eq!(tempo_score(4.5, &config), 25.0);
        assert_eq!(tempo_score(9.0, &config), 0.0);
    }

    #[test]
    fn tempo_ratio_needs_positive_durations() {
        assert_eq!(tempo_ratio(0.9, 0.3).map(|r| (r * 1e9).round()), Some(3e9));
        assert!(tempo_ratio(0.0, 0.3).is_none());
        assert!(tempo_ratio(0.9, 0.0).is_none());
    }

    #[test]
    fn metrics_from_markers() {
        let frames = vec![
            frame(0, 0.0, 30.0, 0.0, 0.0),
            frame(1, 0.1, 31.0, 5.0, 2.0),
            frame(2, 1.0, 34.0, 85.0, 40.0),
            frame(3, 1.3, 33.0, 10.0, 20.0),
        ];
        let markers = vec![
            marker(SwingPhase::Setup, &frames[0]),
            marker(SwingPhase::Takeaway, &frames[1]),
            marker(SwingPhase::TopOfSwing, &frames[2]),
            marker(SwingPhase::Impact, &frames[3]),
        ];
        let m = compute_body_metrics(&frames, &markers, &MetricsConfig::default());
        assert!((m.tempo_ratio.unwrap() - 3.0).abs() < 1e-9);
        assert!(m.tempo_score.unwrap() > 99.9);
        assert_eq!(m.x_factor, Some(45.0));
        assert_eq!(m.max_spine_deviation, Some(4.0));
        assert_eq!(m.spine_angle_maintained, Some(true));
        assert!(m.lead_arm_at_top.is_none());
    }

    #[test]
    fn spine_drift_breaks_maintenance() {
        let frames = vec![frame(0, 0.0, 30.0, 0.0, 0.0), frame(1, 0.5, 42.0, 60.0, 30.0)];
        let markers = vec![marker(SwingPhase::Setup, &frames[0])];
        let m = compute_body_metrics(&frames, &markers, &MetricsConfig::default());
        assert_eq!(m.spine_angle_maintained, Some(false));
        // No takeaway/top/impact → no tempo
        assert!(m.tempo_ratio.is_none());
        assert!(m.tempo_score.is_none());
    }

    #[test]
    fn lead_arm_follows_handedness() {
        let mut top = frame(0, 0.0, 30.0, 80.0, 40.0);
        top.joints = JointSet::new(vec![
            Joint::image(JointName::LeftShoulder, 0.4, 0.3, 0.9),
            Joint::image(JointName::LeftElbow, 0.4, 0.4, 0.9),
            Joint::image(JointName::LeftWrist, 0.4, 0.5, 0.9),
        ]);
        let markers = vec![marker(SwingPhase::TopOfSwing, &top)];
        let frames = vec![top];

        let right_handed = compute_body_metrics(&frames, &markers, &MetricsConfig::default());
        assert!((right_handed.lead_arm_at_top.unwrap() - 180.0).abs() < 1e-6);

        let config = MetricsConfig {
            handedness: Handedness::Left,
            ..MetricsConfig::default()
        };
        assert!(compute_body_metrics(&frames, &markers, &config).lead_arm_at_top.is_none());
    }

    #[test]
    fn empty_frames_yield_absent_metrics() {
        let m = compute_body_metrics(&[], &[], &MetricsConfig::default());
        assert_eq!(m, BodyMetrics::default());
    }
}
