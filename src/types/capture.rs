//! Swing capture records and range sessions
//!
//! These records are the read-only output contract handed to storage and
//! replay layers. Every derived metric is optional: `None` means the inputs
//! were insufficient, which keeps session averages honest.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{MotionSample, PoseFrame, SwingPhaseMarker, TrackingMode};

// ============================================================================
// Camera sub-capture
// ============================================================================

/// Body metrics derived from one swing's pose frames.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BodyMetrics {
    /// Takeaway → top of swing (seconds)
    pub backswing_secs: Option<f64>,
    /// Top of swing → impact (seconds)
    pub downswing_secs: Option<f64>,
    /// Backswing ÷ downswing duration
    pub tempo_ratio: Option<f64>,
    /// 0–100, 100 at the target ratio
    pub tempo_score: Option<f64>,
    pub peak_shoulder_rotation: Option<f64>,
    pub peak_hip_rotation: Option<f64>,
    /// Peak shoulder rotation − peak hip rotation (degrees)
    pub x_factor: Option<f64>,
    pub setup_spine_angle: Option<f64>,
    /// Largest |spine − setup spine| across the swing (degrees)
    pub max_spine_deviation: Option<f64>,
    pub spine_angle_maintained: Option<bool>,
    /// Lead-arm elbow angle at the top of the swing (degrees, 180 = straight)
    pub lead_arm_at_top: Option<f64>,
}

/// Camera half of a swing capture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraCapture {
    pub frames: Vec<PoseFrame>,
    pub markers: Vec<SwingPhaseMarker>,
    pub metrics: BodyMetrics,
    /// Phase-based swing onset (takeaway marker time, host seconds)
    pub onset: Option<f64>,
    /// Mean frame confidence in [0, 1]
    pub confidence: f64,
}

// ============================================================================
// Wearable sub-capture
// ============================================================================

/// Metrics derived from one swing's wearable samples.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WearableMetrics {
    /// Acceleration-onset time (host seconds)
    pub onset: Option<f64>,
    /// Time of peak acceleration magnitude (host seconds)
    pub impact: Option<f64>,
    pub peak_acceleration_g: Option<f64>,
    /// Peak rotation-rate magnitude (degrees per second)
    pub peak_rotation_rate_dps: Option<f64>,
}

/// Wearable half of a swing capture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WearableCapture {
    /// Host-aligned samples covering the capture window
    pub samples: Vec<MotionSample>,
    pub metrics: WearableMetrics,
}

// ============================================================================
// Combined capture
// ============================================================================

/// Fused per-swing metrics from both sources.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CombinedSwingMetrics {
    pub tempo_ratio: Option<f64>,
    pub tempo_score: Option<f64>,
    pub x_factor: Option<f64>,
    pub spine_angle_maintained: Option<bool>,
    pub peak_acceleration_g: Option<f64>,
    pub peak_rotation_rate_dps: Option<f64>,
    /// Wearable onset − camera onset (seconds), when both exist
    pub onset_delta_secs: Option<f64>,
    /// Both sources saw the same swing within tolerance
    pub sources_matched: bool,
    /// Fused trust score in [0, 1]
    pub combined_confidence: f64,
}

/// Why a capture window closed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum WindowClose {
    /// Caller finished the swing
    Explicit,
    /// Window exceeded the configured maximum duration
    Timeout,
    /// Session ended while the window was open
    SessionEnd,
}

/// One captured swing. Created once at window close and never modified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombinedSwingCapture {
    pub id: Uuid,
    /// 1-based swing number within the session
    pub swing_number: u32,
    /// Window open time (host seconds)
    pub opened_at: f64,
    /// Window close time (host seconds)
    pub closed_at: f64,
    pub closed_by: WindowClose,
    pub camera: Option<CameraCapture>,
    pub wearable: Option<WearableCapture>,
    pub metrics: CombinedSwingMetrics,
}

// ============================================================================
// Range session
// ============================================================================

/// Session-level aggregates. Averages skip swings whose metric is absent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub swing_count: usize,
    /// Swings where camera and wearable agreed
    pub matched_swings: usize,
    pub average_tempo: Option<f64>,
    /// Population variance of tempo ratios (0 when ≤ 1 ratio)
    pub tempo_variance: Option<f64>,
    pub consistency_score: Option<f64>,
    pub average_tempo_score: Option<f64>,
    pub average_x_factor: Option<f64>,
    /// Fraction of swings (with a verdict) that kept spine angle
    pub spine_maintained_rate: Option<f64>,
    pub average_combined_confidence: Option<f64>,
}

/// An ordered set of captures recorded in one sitting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeSession {
    pub id: Uuid,
    pub tracking_mode: TrackingMode,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub captures: Vec<CombinedSwingCapture>,
    pub summary: SessionSummary,
}
