//! Capture Configuration - every tuning constant as an operator-tunable TOML value
//!
//! Each section implements `Default` with the calibrated values, so behaviour
//! is unchanged when no config file is present.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::defaults::{
    DEFAULT_LIVE_CHANNEL_CAPACITY, DEFAULT_MOTION_BUFFER_CAPACITY, ENV_CONFIG_PATH,
    LOCAL_CONFIG_FILE,
};

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration for the capture engine.
///
/// Load with `CaptureConfig::load()` which searches:
/// 1. `$SWING_CONFIG` env var
/// 2. `./swing_config.toml`
/// 3. Built-in defaults
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Framing classifier thresholds
    #[serde(default)]
    pub alignment: AlignmentConfig,

    /// Anatomical constants for angle derivation
    #[serde(default)]
    pub geometry: GeometryConfig,

    /// Phase segmenter breakpoints
    #[serde(default)]
    pub segmentation: SegmentationConfig,

    /// Wearable ingestion and clock sync
    #[serde(default)]
    pub wearable: WearableConfig,

    /// Swing matching and confidence fusion
    #[serde(default)]
    pub fusion: FusionConfig,

    /// Per-swing and per-session metric tuning
    #[serde(default)]
    pub metrics: MetricsConfig,

    /// Capture window lifecycle
    #[serde(default)]
    pub capture: WindowConfig,
}

impl CaptureConfig {
    /// Load configuration using the standard search order:
    /// 1. `$SWING_CONFIG` environment variable
    /// 2. `./swing_config.toml` in the current working directory
    /// 3. Built-in defaults
    pub fn load() -> Self {
        // 1. Check env var
        if let Ok(path) = std::env::var(ENV_CONFIG_PATH) {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), "Loaded capture config from SWING_CONFIG");
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load config from SWING_CONFIG, falling back");
                    }
                }
            } else {
                warn!(path = %path, "SWING_CONFIG points to non-existent file, falling back");
            }
        }

        // 2. Check ./swing_config.toml
        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!("Loaded capture config from ./swing_config.toml");
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./swing_config.toml, using defaults");
                }
            }
        }

        // 3. Defaults
        info!("No swing_config.toml found, using built-in defaults");
        Self::default()
    }

    /// Load from a specific TOML file path.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;

        // Unknown keys only warn
        for w in super::validation::validate_unknown_keys(&contents) {
            warn!("{}", w);
        }

        let config: Self = toml::from_str(&contents)
            .map_err(|e| ConfigError::Parse(path.to_path_buf(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the current config to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Save config to a file.
    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let contents = self.to_toml()?;
        std::fs::write(path, contents).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        info!(path = %path.display(), "Capture config saved");
        Ok(())
    }

    /// Reject impossible values. Suspicious-but-legal values only warn.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let (errors, warnings) = super::validation::validate_ranges(self);
        for w in &warnings {
            warn!("{}", w);
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(PathBuf, std::io::Error),
    Parse(PathBuf, toml::de::Error),
    Serialize(toml::ser::Error),
    Validation(Vec<String>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(path, e) => write!(f, "Config I/O error ({}): {}", path.display(), e),
            ConfigError::Parse(path, e) => {
                write!(f, "Config parse error ({}): {}", path.display(), e)
            }
            ConfigError::Serialize(e) => write!(f, "Config serialization error: {}", e),
            ConfigError::Validation(errors) => {
                writeln!(f, "Config validation failed:")?;
                for e in errors {
                    writeln!(f, "  - {}", e)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Alignment
// ============================================================================

/// Framing thresholds in normalized screen coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignmentConfig {
    /// Shoulder midpoint x below this → subject too far left.
    #[serde(default = "default_left_threshold")]
    pub left_threshold: f64,

    /// Shoulder midpoint x above this → subject too far right.
    #[serde(default = "default_right_threshold")]
    pub right_threshold: f64,

    /// Frame confidence below this → low confidence.
    #[serde(default = "default_min_frame_confidence")]
    pub min_confidence: f64,
}

fn default_left_threshold() -> f64 { 0.3 }
fn default_right_threshold() -> f64 { 0.7 }
fn default_min_frame_confidence() -> f64 { 0.5 }

impl Default for AlignmentConfig {
    fn default() -> Self {
        Self {
            left_threshold: default_left_threshold(),
            right_threshold: default_right_threshold(),
            min_confidence: default_min_frame_confidence(),
        }
    }
}

// ============================================================================
// Geometry
// ============================================================================

/// Anatomical widths and camera axes used by the angle functions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeometryConfig {
    /// Square-on shoulder width in normalized image units.
    #[serde(default = "default_shoulder_max_width")]
    pub shoulder_max_width: f64,

    /// Square-on hip width in normalized image units.
    #[serde(default = "default_hip_max_width")]
    pub hip_max_width: f64,

    /// Camera forward axis in the depth sensor frame.
    #[serde(default = "default_camera_forward")]
    pub camera_forward: [f64; 3],

    /// Joints below this detection confidence are treated as missing.
    #[serde(default = "default_min_joint_confidence")]
    pub min_joint_confidence: f64,
}

fn default_shoulder_max_width() -> f64 { 0.25 }
fn default_hip_max_width() -> f64 { 0.18 }
fn default_camera_forward() -> [f64; 3] { [0.0, 0.0, -1.0] }
fn default_min_joint_confidence() -> f64 { 0.2 }

impl Default for GeometryConfig {
    fn default() -> Self {
        Self {
            shoulder_max_width: default_shoulder_max_width(),
            hip_max_width: default_hip_max_width(),
            camera_forward: default_camera_forward(),
            min_joint_confidence: default_min_joint_confidence(),
        }
    }
}

// ============================================================================
// Segmentation
// ============================================================================

/// How a frame's position within the swing is measured.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressBasis {
    /// Elapsed time over the window duration
    Time,
    /// Cumulative shoulder (or hip) rotation travel over total travel
    #[default]
    Kinematic,
}

/// Progress fraction at which each canonical phase is located.
///
/// Empirical values, tuned for the kinematic basis: a full swing travels the
/// turn three times (back, through, finish), so top and impact sit near 1/3
/// and 2/3 of the rotation travel regardless of pauses.
///
/// With `basis = "time"` progress is elapsed time over the capture window,
/// where the backswing takes longer than the downswing. Time-based setups
/// should move `top_of_swing` to about 0.45 and `impact` to about 0.72.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseBreakpoints {
    #[serde(default = "default_bp_setup")]
    pub setup: f64,
    #[serde(default = "default_bp_takeaway")]
    pub takeaway: f64,
    #[serde(default = "default_bp_backswing")]
    pub backswing: f64,
    #[serde(default = "default_bp_top")]
    pub top_of_swing: f64,
    #[serde(default = "default_bp_downswing")]
    pub downswing: f64,
    #[serde(default = "default_bp_impact")]
    pub impact: f64,
    #[serde(default = "default_bp_follow_through")]
    pub follow_through: f64,
    #[serde(default = "default_bp_finish")]
    pub finish: f64,
}

fn default_bp_setup() -> f64 { 0.0 }
fn default_bp_takeaway() -> f64 { 0.05 }
fn default_bp_backswing() -> f64 { 0.17 }
fn default_bp_top() -> f64 { 0.333 }
fn default_bp_downswing() -> f64 { 0.5 }
fn default_bp_impact() -> f64 { 0.667 }
fn default_bp_follow_through() -> f64 { 0.833 }
fn default_bp_finish() -> f64 { 1.0 }

impl Default for PhaseBreakpoints {
    fn default() -> Self {
        Self {
            setup: default_bp_setup(),
            takeaway: default_bp_takeaway(),
            backswing: default_bp_backswing(),
            top_of_swing: default_bp_top(),
            downswing: default_bp_downswing(),
            impact: default_bp_impact(),
            follow_through: default_bp_follow_through(),
            finish: default_bp_finish(),
        }
    }
}

impl PhaseBreakpoints {
    /// Breakpoints in canonical phase order.
    pub fn ordered(&self) -> [f64; 8] {
        [
            self.setup,
            self.takeaway,
            self.backswing,
            self.top_of_swing,
            self.downswing,
            self.impact,
            self.follow_through,
            self.finish,
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentationConfig {
    /// Kinematic by default: time progress shifts every marker when the
    /// golfer pauses at address, rotation travel does not. The default
    /// breakpoints match this basis.
    #[serde(default)]
    pub basis: ProgressBasis,

    /// Rotation changes smaller than this are ignored as jitter (degrees).
    #[serde(default = "default_travel_deadband")]
    pub travel_deadband_deg: f64,

    #[serde(default)]
    pub breakpoints: PhaseBreakpoints,
}

fn default_travel_deadband() -> f64 { 0.5 }

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            basis: ProgressBasis::default(),
            travel_deadband_deg: default_travel_deadband(),
            breakpoints: PhaseBreakpoints::default(),
        }
    }
}

// ============================================================================
// Wearable
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WearableConfig {
    /// Nominal wearable sample rate (Hz).
    #[serde(default = "default_sample_rate")]
    pub sample_rate_hz: f64,

    /// Motion ring-buffer capacity (samples).
    #[serde(default = "default_buffer_capacity")]
    pub buffer_capacity: usize,

    /// Sync round trips slower than this are rejected (seconds).
    #[serde(default = "default_max_round_trip")]
    pub max_round_trip_secs: f64,

    /// Acceleration above gravity that marks a swing onset (g).
    #[serde(default = "default_onset_threshold")]
    pub onset_threshold_g: f64,
}

fn default_sample_rate() -> f64 { 100.0 }
fn default_buffer_capacity() -> usize { DEFAULT_MOTION_BUFFER_CAPACITY }
fn default_max_round_trip() -> f64 { 0.5 }
fn default_onset_threshold() -> f64 { 0.5 }

impl Default for WearableConfig {
    fn default() -> Self {
        Self {
            sample_rate_hz: default_sample_rate(),
            buffer_capacity: default_buffer_capacity(),
            max_round_trip_secs: default_max_round_trip(),
            onset_threshold_g: default_onset_threshold(),
        }
    }
}

// ============================================================================
// Fusion
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusionConfig {
    /// Onsets closer than this are the same swing (seconds).
    #[serde(default = "default_match_tolerance")]
    pub match_tolerance_secs: f64,

    /// Confidence added when wearable data is present.
    #[serde(default = "default_wearable_bonus")]
    pub wearable_bonus: f64,

    /// Onset gaps up to this are not penalized (seconds).
    #[serde(default = "default_alignment_window")]
    pub alignment_window_secs: f64,

    /// Confidence removed per second of onset gap beyond the window.
    #[serde(default = "default_offset_penalty")]
    pub offset_penalty_per_sec: f64,
}

fn default_match_tolerance() -> f64 { 0.5 }
fn default_wearable_bonus() -> f64 { 0.1 }
fn default_alignment_window() -> f64 { 0.05 }
fn default_offset_penalty() -> f64 { 2.0 }

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            match_tolerance_secs: default_match_tolerance(),
            wearable_bonus: default_wearable_bonus(),
            alignment_window_secs: default_alignment_window(),
            offset_penalty_per_sec: default_offset_penalty(),
        }
    }
}

// ============================================================================
// Metrics
// ============================================================================

/// Which side leads the swing. Right-handed golfers lead with the left arm.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Handedness {
    #[default]
    Right,
    Left,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Ideal backswing:downswing ratio.
    #[serde(default = "default_target_tempo")]
    pub target_tempo_ratio: f64,

    /// Tempo score lost per unit of ratio error.
    #[serde(default = "default_tempo_penalty")]
    pub tempo_penalty_per_unit: f64,

    /// Spine deviation from setup allowed while "maintained" (degrees).
    #[serde(default = "default_spine_tolerance")]
    pub spine_tolerance_deg: f64,

    /// Consistency score asymptote for very varied sessions.
    #[serde(default = "default_consistency_floor")]
    pub consistency_floor: f64,

    /// How quickly consistency falls with tempo variance.
    #[serde(default = "default_consistency_weight")]
    pub consistency_variance_weight: f64,

    #[serde(default)]
    pub handedness: Handedness,
}

fn default_target_tempo() -> f64 { 3.0 }
fn default_tempo_penalty() -> f64 { 50.0 }
fn default_spine_tolerance() -> f64 { 10.0 }
fn default_consistency_floor() -> f64 { 10.0 }
fn default_consistency_weight() -> f64 { 4.0 }

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            target_tempo_ratio: default_target_tempo(),
            tempo_penalty_per_unit: default_tempo_penalty(),
            spine_tolerance_deg: default_spine_tolerance(),
            consistency_floor: default_consistency_floor(),
            consistency_variance_weight: default_consistency_weight(),
            handedness: Handedness::default(),
        }
    }
}

// ============================================================================
// Capture window
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowConfig {
    /// Windows open longer than this close on the next ingested event (seconds).
    #[serde(default = "default_max_window")]
    pub max_window_secs: f64,

    /// How long a closed window waits for late wearable samples (seconds).
    #[serde(default = "default_wearable_grace")]
    pub wearable_grace_secs: f64,

    /// Wearable samples before the window opening included in the capture (seconds).
    #[serde(default = "default_pre_roll")]
    pub pre_roll_secs: f64,

    /// Live pose update channel depth; slow subscribers skip ahead.
    #[serde(default = "default_live_capacity")]
    pub live_channel_capacity: usize,
}

fn default_max_window() -> f64 { 6.0 }
fn default_wearable_grace() -> f64 { 0.5 }
fn default_pre_roll() -> f64 { 0.25 }
fn default_live_capacity() -> usize { DEFAULT_LIVE_CHANNEL_CAPACITY }

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            max_window_secs: default_max_window(),
            wearable_grace_secs: default_wearable_grace(),
            pre_roll_secs: default_pre_roll(),
            live_channel_capacity: default_live_capacity(),
        }
    }
}
