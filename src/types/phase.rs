//! Canonical swing phases

use serde::{Deserialize, Serialize};

/// One of the eight canonical stages of a golf swing, in swing order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum SwingPhase {
    Setup,
    Takeaway,
    Backswing,
    TopOfSwing,
    Downswing,
    Impact,
    FollowThrough,
    Finish,
}

impl SwingPhase {
    /// All phases in canonical order.
    pub const ALL: [SwingPhase; 8] = [
        SwingPhase::Setup,
        SwingPhase::Takeaway,
        SwingPhase::Backswing,
        SwingPhase::TopOfSwing,
        SwingPhase::Downswing,
        SwingPhase::Impact,
        SwingPhase::FollowThrough,
        SwingPhase::Finish,
    ];

    /// Get display name for UI
    pub fn display_name(&self) -> &'static str {
        match self {
            SwingPhase::Setup => "Setup",
            SwingPhase::Takeaway => "Takeaway",
            SwingPhase::Backswing => "Backswing",
            SwingPhase::TopOfSwing => "Top of Swing",
            SwingPhase::Downswing => "Downswing",
            SwingPhase::Impact => "Impact",
            SwingPhase::FollowThrough => "Follow Through",
            SwingPhase::Finish => "Finish",
        }
    }
}

impl std::fmt::Display for SwingPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// A phase boundary located in a capture.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SwingPhaseMarker {
    pub phase: SwingPhase,
    /// Host clock time of the source frame (seconds)
    pub timestamp: f64,
    /// `frame_index` of the source frame
    pub frame_index: u64,
    /// Confidence in [0, 1], inherited from the source frame
    pub confidence: f64,
}

/// Find the marker for a phase.
pub fn marker_for(markers: &[SwingPhaseMarker], phase: SwingPhase) -> Option<&SwingPhaseMarker> {
    markers.iter().find(|m| m.phase == phase)
}
