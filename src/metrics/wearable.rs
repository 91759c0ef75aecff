//! Per-swing wearable metrics.

use crate::fusion::detect_wearable_onset;
use crate::types::{MotionSample, WearableMetrics};

/// Onset, impact (peak acceleration instant), and peak magnitudes.
pub fn compute_wearable_metrics(samples: &[MotionSample], onset_threshold_g: f64) -> WearableMetrics {
    let peak_sample = samples
        .iter()
        .max_by(|a, b| a.acceleration_magnitude().total_cmp(&b.acceleration_magnitude()));

    WearableMetrics {
        onset: detect_wearable_onset(samples, onset_threshold_g),
        impact: peak_sample.map(|s| s.timestamp),
        peak_acceleration_g: peak_sample.map(MotionSample::acceleration_magnitude),
        peak_rotation_rate_dps: samples
            .iter()
            .map(|s| s.rotation_rate_magnitude().to_degrees())
            .reduce(f64::max),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::Vec3;

    fn sample(t: f64, ax: f64, wz: f64) -> MotionSample {
        MotionSample {
            timestamp: t,
            sequence: 0,
            acceleration: Vec3::new(ax, -1.0, 0.0),
            rotation_rate: Vec3::new(0.0, 0.0, wz),
        }
    }

    #[test]
    fn peaks_and_onset() {
        let samples = vec![
            sample(0.0, 0.0, 0.0),
            sample(0.1, 1.5, 1.0),
            sample(0.2, 6.0, std::f64::consts::PI),
            sample(0.3, 2.0, 0.5),
        ];
        let m = compute_wearable_metrics(&samples, 0.5);
        assert_eq!(m.onset, Some(0.1));
        assert_eq!(m.impact, Some(0.2));
        assert!((m.peak_acceleration_g.unwrap() - 37f64.sqrt()).abs() < 1e-12);
        assert!((m.peak_rotation_rate_dps.unwrap() - 180.0).abs() < 1e-9);
    }

    #[test]
    fn empty_samples_are_absent() {
        assert_eq!(compute_wearable_metrics(&[], 0.5), WearableMetrics::default());
    }
}
