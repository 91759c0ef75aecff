//! Joint landmarks

use serde::{Deserialize, Serialize};

use super::Vec3;

/// Named anatomical landmark.
///
/// The first 19 variants form the camera skeleton. Depth skeletons carry
/// additional landmarks, addressed by index through `Extended`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum JointName {
    Nose,
    Neck,
    LeftEye,
    RightEye,
    LeftEar,
    RightEar,
    LeftShoulder,
    RightShoulder,
    LeftElbow,
    RightElbow,
    LeftWrist,
    RightWrist,
    Root,
    LeftHip,
    RightHip,
    LeftKnee,
    RightKnee,
    LeftAnkle,
    RightAnkle,
    /// High-density skeleton landmark without a dedicated name
    Extended(u16),
}

/// Landmarks produced by the camera-only skeleton.
pub const CAMERA_SKELETON: [JointName; 19] = [
    JointName::Nose,
    JointName::Neck,
    JointName::LeftEye,
    JointName::RightEye,
    JointName::LeftEar,
    JointName::RightEar,
    JointName::LeftShoulder,
    JointName::RightShoulder,
    JointName::LeftElbow,
    JointName::RightElbow,
    JointName::LeftWrist,
    JointName::RightWrist,
    JointName::Root,
    JointName::LeftHip,
    JointName::RightHip,
    JointName::LeftKnee,
    JointName::RightKnee,
    JointName::LeftAnkle,
    JointName::RightAnkle,
];

impl std::fmt::Display for JointName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JointName::Extended(index) => write!(f, "joint_{index}"),
            other => write!(f, "{other:?}"),
        }
    }
}

/// Normalized screen-space projection of a joint (0..1 on both axes).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

/// Joint position in either image space or world space.
///
/// - `Image`: normalized image coordinates, y grows downward
/// - `World`: metres in the depth sensor frame, y points up
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "space", rename_all = "snake_case")]
pub enum JointPosition {
    Image { x: f64, y: f64 },
    World { x: f64, y: f64, z: f64 },
}

impl JointPosition {
    pub const fn has_depth(&self) -> bool {
        matches!(self, JointPosition::World { .. })
    }

    /// Position as a vector (image positions get z = 0).
    pub const fn to_vec3(&self) -> Vec3 {
        match *self {
            JointPosition::Image { x, y } => Vec3::new(x, y, 0.0),
            JointPosition::World { x, y, z } => Vec3::new(x, y, z),
        }
    }

    pub fn is_finite(&self) -> bool {
        self.to_vec3().is_finite()
    }
}

/// A single detected landmark.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Joint {
    pub name: JointName,
    pub position: JointPosition,
    /// Detection confidence in [0, 1]
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screen: Option<ScreenPoint>,
}

impl Joint {
    pub fn image(name: JointName, x: f64, y: f64, confidence: f64) -> Self {
        Self {
            name,
            position: JointPosition::Image { x, y },
            confidence: clamp_unit(confidence),
            screen: None,
        }
    }

    pub fn world(name: JointName, x: f64, y: f64, z: f64, confidence: f64) -> Self {
        Self {
            name,
            position: JointPosition::World { x, y, z },
            confidence: clamp_unit(confidence),
            screen: None,
        }
    }

    #[must_use]
    pub const fn with_screen(mut self, x: f64, y: f64) -> Self {
        self.screen = Some(ScreenPoint { x, y });
        self
    }

    /// Horizontal screen coordinate, when one is known.
    ///
    /// Image positions are already in screen space; world positions need an
    /// explicit projection.
    pub fn screen_x(&self) -> Option<f64> {
        match (self.screen, self.position) {
            (Some(s), _) => Some(s.x),
            (None, JointPosition::Image { x, .. }) => Some(x),
            (None, JointPosition::World { .. }) => None,
        }
    }
}

/// Clamp a confidence value into [0, 1]; NaN maps to 0.
pub fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// The joints of one frame, looked up by name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JointSet(Vec<Joint>);

impl JointSet {
    pub fn new(joints: Vec<Joint>) -> Self {
        Self(joints)
    }

    pub fn get(&self, name: JointName) -> Option<&Joint> {
        self.0.iter().find(|j| j.name == name)
    }

    /// Position of a joint whose coordinates are finite.
    pub fn position(&self, name: JointName) -> Option<JointPosition> {
        self.get(name)
            .map(|j| j.position)
            .filter(JointPosition::is_finite)
    }

    pub fn contains(&self, name: JointName) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Joint> {
        self.0.iter()
    }

    /// Mean joint confidence (0 for an empty set).
    pub fn mean_confidence(&self) -> f64 {
        if self.0.is_empty() {
            return 0.0;
        }
        self.0.iter().map(|j| j.confidence).sum::<f64>() / self.0.len() as f64
    }
}

impl From<Vec<Joint>> for JointSet {
    fn from(joints: Vec<Joint>) -> Self {
        Self(joints)
    }
}
