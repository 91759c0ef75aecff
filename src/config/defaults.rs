//! System-wide default constants.
//!
//! Values that are not operator-tunable, or that seed the tunable defaults
//! in capture_config.rs. Grouped by subsystem.

// ============================================================================
// Config loading
// ============================================================================

/// Environment variable holding an explicit config file path.
pub const ENV_CONFIG_PATH: &str = "SWING_CONFIG";

/// Config file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "swing_config.toml";

// ============================================================================
// Wearable
// ============================================================================

/// Motion ring-buffer capacity (samples).
///
/// 4 096 ≈ 40 seconds at 100 Hz.
pub const DEFAULT_MOTION_BUFFER_CAPACITY: usize = 4_096;

/// Clock-sync round trips kept for `ClockSync::stats`.
pub const CLOCK_SYNC_HISTORY: usize = 32;

// ============================================================================
// Capture
// ============================================================================

/// Live pose broadcast channel depth.
pub const DEFAULT_LIVE_CHANNEL_CAPACITY: usize = 64;

/// Capacity of each inbound channel of a `ChannelSource`.
pub const CHANNEL_SOURCE_CAPACITY: usize = 1_024;

// ============================================================================
// Geometry
// ============================================================================

/// Spine and rotation vectors shorter than this are degenerate.
pub const MIN_SEGMENT_LENGTH: f64 = 1e-6;

/// Kinematic travel below this total falls back to time-based progress (degrees).
pub const MIN_KINEMATIC_TRAVEL_DEG: f64 = 1e-9;
