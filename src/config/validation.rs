//! Config validation: unknown-key detection with Levenshtein suggestions
//! and range checks.
//!
//! Two-pass parse approach: first deserialize raw TOML into `toml::Value`,
//! walk the key tree, compare against known field names, and emit warnings
//! with "did you mean?" suggestions. Then proceed with normal serde
//! deserialization. Unknown keys never break existing configs.

use std::collections::HashSet;

use super::CaptureConfig;

/// Shortest accepted ground-plane projection of `geometry.camera_forward`.
const MIN_HORIZONTAL_FORWARD: f64 = 1e-6;

/// A non-fatal config warning (typo, suspicious value).
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(ref s) = self.suggestion {
            write!(f, " (did you mean '{s}'?)")?;
        }
        Ok(())
    }
}

// ============================================================================
// Known Config Keys
// ============================================================================

/// Returns the complete set of valid dotted key paths for `CaptureConfig`.
///
/// Maintained by hand to match the struct hierarchy in capture_config.rs.
pub fn known_config_keys() -> HashSet<&'static str> {
    let keys: &[&str] = &[
        // [alignment]
        "alignment",
        "alignment.left_threshold",
        "alignment.right_threshold",
        "alignment.min_confidence",
        // [geometry]
        "geometry",
        "geometry.shoulder_max_width",
        "geometry.hip_max_width",
        "geometry.camera_forward",
        "geometry.min_joint_confidence",
        // [segmentation]
        "segmentation",
        "segmentation.basis",
        "segmentation.travel_deadband_deg",
        // [segmentation.breakpoints]
        "segmentation.breakpoints",
        "segmentation.breakpoints.setup",
        "segmentation.breakpoints.takeaway",
        "segmentation.breakpoints.backswing",
        "segmentation.breakpoints.top_of_swing",
        "segmentation.breakpoints.downswing",
        "segmentation.breakpoints.impact",
        "segmentation.breakpoints.follow_through",
        "segmentation.breakpoints.finish",
        // [wearable]
        "wearable",
        "wearable.sample_rate_hz",
        "wearable.buffer_capacity",
        "wearable.max_round_trip_secs",
        "wearable.onset_threshold_g",
        // [fusion]
        "fusion",
        "fusion.match_tolerance_secs",
        "fusion.wearable_bonus",
        "fusion.alignment_window_secs",
        "fusion.offset_penalty_per_sec",
        // [metrics]
        "metrics",
        "metrics.target_tempo_ratio",
        "metrics.tempo_penalty_per_unit",
        "metrics.spine_tolerance_deg",
        "metrics.consistency_floor",
        "metrics.consistency_variance_weight",
        "metrics.handedness",
        // [capture]
        "capture",
        "capture.max_window_secs",
        "capture.wearable_grace_secs",
        "capture.pre_roll_secs",
        "capture.live_channel_capacity",
    ];
    keys.iter().copied().collect()
}

// ============================================================================
// TOML Key Walking
// ============================================================================

/// Recursively walks a `toml::Value` tree and collects all dotted key paths.
///
/// For example, a table `{ a = { b = 1, c = 2 } }` yields:
/// `["a", "a.b", "a.c"]`
pub fn walk_toml_keys(value: &toml::Value, prefix: &str) -> Vec<String> {
    let mut keys = Vec::new();
    if let Some(table) = value.as_table() {
        for (k, v) in table {
            let path = if prefix.is_empty() {
                k.clone()
            } else {
                format!("{prefix}.{k}")
            };
            keys.push(path.clone());
            if v.is_table() {
                keys.extend(walk_toml_keys(v, &path));
            }
        }
    }
    keys
}

// ============================================================================
// Levenshtein Distance
// ============================================================================

fn levenshtein(a: &str, b: &str) -> usize {
    let b_len = b.chars().count();
    if a.is_empty() {
        return b_len;
    }
    if b_len == 0 {
        return a.chars().count();
    }

    let mut prev: Vec<usize> = (0..=b_len).collect();
    let mut curr = vec![0; b_len + 1];

    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.chars().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b_len]
}

/// Suggest the closest known key for an unknown key, if within edit distance 3.
pub fn suggest_correction(unknown: &str, known: &HashSet<&str>) -> Option<String> {
    known
        .iter()
        .map(|k| (*k, levenshtein(unknown, k)))
        .filter(|(_, dist)| *dist <= 3)
        // Ties broken alphabetically so HashSet order never leaks into output
        .min_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(b.0)))
        .map(|(k, _)| k.to_string())
}

// ============================================================================
// Unknown Key Validation (entry point)
// ============================================================================

/// Parse a raw TOML string and return warnings for any unknown config keys.
pub fn validate_unknown_keys(raw_toml: &str) -> Vec<ValidationWarning> {
    let value: toml::Value = match raw_toml.parse() {
        Ok(v) => v,
        Err(_) => return Vec::new(), // parse errors are handled by serde later
    };

    let known = known_config_keys();
    walk_toml_keys(&value, "")
        .into_iter()
        .filter(|key| !known.contains(key.as_str()))
        .map(|key| ValidationWarning {
            suggestion: suggest_correction(&key, &known),
            message: format!("Unknown config key '{key}'"),
            field: key,
        })
        .collect()
}

// ============================================================================
// Range Validation
// ============================================================================

fn in_unit(value: f64) -> bool {
    (0.0..=1.0).contains(&value)
}

fn positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

fn non_negative(value: f64) -> bool {
    value.is_finite() && value >= 0.0
}

fn suspicious(field: &str, message: String) -> ValidationWarning {
    ValidationWarning {
        field: field.to_string(),
        message,
        suggestion: None,
    }
}

/// Validate value ranges on a parsed `CaptureConfig`.
///
/// Returns (errors, warnings). Errors are impossible values that must
/// prevent startup; warnings are suspicious but not fatal.
pub fn validate_ranges(config: &CaptureConfig) -> (Vec<String>, Vec<ValidationWarning>) {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    // Alignment: thresholds live in normalized screen space
    let a = &config.alignment;
    if !in_unit(a.left_threshold) || !in_unit(a.right_threshold) {
        errors.push(format!(
            "alignment thresholds ({:.2}, {:.2}) must lie within [0, 1]",
            a.left_threshold, a.right_threshold
        ));
    } else if a.left_threshold >= a.right_threshold {
        errors.push(format!(
            "alignment.left_threshold = {:.2} must be below right_threshold = {:.2}",
            a.left_threshold, a.right_threshold
        ));
    }
    if !in_unit(a.min_confidence) {
        errors.push(format!(
            "alignment.min_confidence = {:.2} must lie within [0, 1]",
            a.min_confidence
        ));
    }

    // Geometry: widths are divisors
    let g = &config.geometry;
    if !positive(g.shoulder_max_width) {
        errors.push(format!(
            "geometry.shoulder_max_width = {:.3} must be > 0 (used as divisor)",
            g.shoulder_max_width
        ));
    }
    if !positive(g.hip_max_width) {
        errors.push(format!(
            "geometry.hip_max_width = {:.3} must be > 0 (used as divisor)",
            g.hip_max_width
        ));
    }
    let [fx, fy, fz] = g.camera_forward;
    if crate::types::Vec3::new(fx, fy, fz).normalized().is_none() {
        errors.push("geometry.camera_forward must be a non-zero finite vector".to_string());
    } else if fx.hypot(fz) < MIN_HORIZONTAL_FORWARD {
        // Depth rotation projects the forward axis onto the ground plane
        errors.push(format!(
            "geometry.camera_forward = [{fx}, {fy}, {fz}] has no horizontal (x, z) component"
        ));
    }
    if !in_unit(g.min_joint_confidence) {
        errors.push(format!(
            "geometry.min_joint_confidence = {:.2} must lie within [0, 1]",
            g.min_joint_confidence
        ));
    }

    // Segmentation: breakpoints are ordered fractions
    let s = &config.segmentation;
    let bp = s.breakpoints.ordered();
    if bp.iter().any(|v| !in_unit(*v)) {
        errors.push("segmentation.breakpoints must all lie within [0, 1]".to_string());
    } else if bp.windows(2).any(|w| w[0] > w[1]) {
        errors.push("segmentation.breakpoints must be non-decreasing in phase order".to_string());
    }
    if !non_negative(s.travel_deadband_deg) {
        errors.push(format!(
            "segmentation.travel_deadband_deg = {:.2} cannot be negative",
            s.travel_deadband_deg
        ));
    }

    // Wearable
    let w = &config.wearable;
    if w.buffer_capacity == 0 {
        errors.push("wearable.buffer_capacity must be at least 1".to_string());
    }
    if !positive(w.sample_rate_hz) {
        errors.push(format!(
            "wearable.sample_rate_hz = {:.1} must be > 0",
            w.sample_rate_hz
        ));
    } else if !(25.0..=1000.0).contains(&w.sample_rate_hz) {
        warnings.push(suspicious(
            "wearable.sample_rate_hz",
            format!(
                "sample_rate_hz = {:.1} is outside typical range (25-1000 Hz)",
                w.sample_rate_hz
            ),
        ));
    }
    if !positive(w.max_round_trip_secs) {
        errors.push(format!(
            "wearable.max_round_trip_secs = {:.3} must be > 0",
            w.max_round_trip_secs
        ));
    }
    if !positive(w.onset_threshold_g) {
        errors.push(format!(
            "wearable.onset_threshold_g = {:.2} must be > 0",
            w.onset_threshold_g
        ));
    } else if !(0.1..=5.0).contains(&w.onset_threshold_g) {
        warnings.push(suspicious(
            "wearable.onset_threshold_g",
            format!(
                "onset_threshold_g = {:.2} is outside typical range (0.1-5 g)",
                w.onset_threshold_g
            ),
        ));
    }

    // Fusion
    let f = &config.fusion;
    if !positive(f.match_tolerance_secs) {
        errors.push(format!(
            "fusion.match_tolerance_secs = {:.3} must be > 0",
            f.match_tolerance_secs
        ));
    }
    if !non_negative(f.alignment_window_secs) || !non_negative(f.offset_penalty_per_sec) {
        errors.push("fusion.alignment_window_secs and offset_penalty_per_sec cannot be negative".to_string());
    }
    if !in_unit(f.wearable_bonus) {
        errors.push(format!(
            "fusion.wearable_bonus = {:.2} must lie within [0, 1]",
            f.wearable_bonus
        ));
    } else if f.wearable_bonus > 0.5 {
        warnings.push(suspicious(
            "fusion.wearable_bonus",
            format!(
                "wearable_bonus = {:.2} lets wearable presence dominate camera confidence",
                f.wearable_bonus
            ),
        ));
    }

    // Metrics
    let m = &config.metrics;
    if !positive(m.target_tempo_ratio) {
        errors.push(format!(
            "metrics.target_tempo_ratio = {:.2} must be > 0",
            m.target_tempo_ratio
        ));
    }
    if !non_negative(m.tempo_penalty_per_unit) || !non_negative(m.spine_tolerance_deg) {
        errors.push("metrics.tempo_penalty_per_unit and spine_tolerance_deg cannot be negative".to_string());
    }
    if !(0.0..=100.0).contains(&m.consistency_floor) {
        errors.push(format!(
            "metrics.consistency_floor = {:.1} must lie within [0, 100]",
            m.consistency_floor
        ));
    }
    if !non_negative(m.consistency_variance_weight) {
        errors.push(format!(
            "metrics.consistency_variance_weight = {:.2} cannot be negative",
            m.consistency_variance_weight
        ));
    }

    // Capture window
    let c = &config.capture;
    if !positive(c.max_window_secs) {
        errors.push(format!(
            "capture.max_window_secs = {:.2} must be > 0",
            c.max_window_secs
        ));
    } else if c.max_window_secs > 30.0 {
        warnings.push(suspicious(
            "capture.max_window_secs",
            format!(
                "max_window_secs = {:.1} is far longer than any swing",
                c.max_window_secs
            ),
        ));
    }
    if !non_negative(c.wearable_grace_secs) || !non_negative(c.pre_roll_secs) {
        errors.push("capture.wearable_grace_secs and pre_roll_secs cannot be negative".to_string());
    }
    if c.live_channel_capacity == 0 {
        errors.push("capture.live_channel_capacity must be at least 1".to_string());
    }

    (errors, warnings)
}

// ============================================================================
// Tests
// ============================================================================
