//! Tracking mode, alignment status, and provider tracking signals

use serde::{Deserialize, Serialize};

/// Pose acquisition mode.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TrackingMode {
    /// Camera-only 2D pose estimation
    #[default]
    Camera2D,
    /// Depth-augmented 3D body tracking
    Depth3D,
}

impl TrackingMode {
    /// Number of joints the mode's skeleton produces.
    pub const fn joint_count(&self) -> usize {
        match self {
            TrackingMode::Camera2D => 19,
            TrackingMode::Depth3D => 91,
        }
    }

    /// Whether joint positions carry true depth.
    pub const fn supports_depth(&self) -> bool {
        matches!(self, TrackingMode::Depth3D)
    }
}

impl std::fmt::Display for TrackingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrackingMode::Camera2D => write!(f, "Camera 2D"),
            TrackingMode::Depth3D => write!(f, "Depth 3D"),
        }
    }
}

impl std::str::FromStr for TrackingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "camera" | "camera2d" | "camera_2d" | "2d" => Ok(TrackingMode::Camera2D),
            "depth" | "depth3d" | "depth_3d" | "3d" => Ok(TrackingMode::Depth3D),
            other => Err(format!("unknown tracking mode '{other}' (expected camera or depth)")),
        }
    }
}

/// Framing quality of the subject in the current frame.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AlignmentStatus {
    /// No pose yet (initial state)
    #[default]
    Searching,
    TooFar,
    /// Only produced by depth-capable providers
    TooClose,
    TooLeft,
    TooRight,
    LowConfidence,
    Good,
}

impl AlignmentStatus {
    pub const fn is_good(&self) -> bool {
        matches!(self, AlignmentStatus::Good)
    }
}

impl std::fmt::Display for AlignmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AlignmentStatus::Searching => write!(f, "Searching"),
            AlignmentStatus::TooFar => write!(f, "Too Far"),
            AlignmentStatus::TooClose => write!(f, "Too Close"),
            AlignmentStatus::TooLeft => write!(f, "Too Left"),
            AlignmentStatus::TooRight => write!(f, "Too Right"),
            AlignmentStatus::LowConfidence => write!(f, "Low Confidence"),
            AlignmentStatus::Good => write!(f, "Good"),
        }
    }
}

/// Coarse body-tracking state reported by depth sessions.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TrackingSignal {
    #[default]
    Normal,
    /// Tracking degraded but the skeleton is still usable
    Limited,
    /// Subject extends past the frame bounds
    SubjectOutOfBounds,
    /// Body anchor lost
    Lost,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_attributes() {
        assert_eq!(TrackingMode::Camera2D.joint_count(), 19);
        assert!(!TrackingMode::Camera2D.supports_depth());
        assert_eq!(TrackingMode::Depth3D.joint_count(), 91);
        assert!(TrackingMode::Depth3D.supports_depth());
    }

    #[test]
    fn test_mode_from_str() {
        assert_eq!("depth".parse::<TrackingMode>(), Ok(TrackingMode::Depth3D));
        assert_eq!("2D".parse::<TrackingMode>(), Ok(TrackingMode::Camera2D));
        assert!("lidar".parse::<TrackingMode>().is_err());
    }

    #[test]
    fn test_alignment_default_is_searching() {
        assert_eq!(AlignmentStatus::default(), AlignmentStatus::Searching);
    }
}
