//! Pose Geometry - body angles derived from joint positions
//!
//! Pure functions, no state. Every angle is `Option<f64>` in degrees:
//! `None` when the joints it needs are missing, mixed between image and
//! world space, or geometrically degenerate. A missing angle is never 0.
//!
//! ## Conventions
//!
//! - Image positions: normalized, y grows downward
//! - World positions: metres, y points up
//! - Rotation 0° = segment square to the camera, 90° = edge-on

use crate::config::GeometryConfig;
use crate::config::defaults::MIN_SEGMENT_LENGTH;
use crate::types::{DerivedAngles, JointName, JointPosition, JointSet, Vec3};

/// Both positions of a left/right pair, only when they share a coordinate space.
fn pair(joints: &JointSet, left: JointName, right: JointName) -> Option<(JointPosition, JointPosition)> {
    let l = joints.position(left)?;
    let r = joints.position(right)?;
    (l.has_depth() == r.has_depth()).then_some((l, r))
}

// ============================================================================
// Spine
// ============================================================================

/// Lean of the mid-hip → mid-shoulder vector from vertical, in signed degrees.
///
/// 0 = upright. Positive when the shoulders sit toward +x of the hips.
/// Requires both shoulders and both hips.
pub fn spine_angle(joints: &JointSet) -> Option<f64> {
    let (ls, rs) = pair(joints, JointName::LeftShoulder, JointName::RightShoulder)?;
    let (lh, rh) = pair(joints, JointName::LeftHip, JointName::RightHip)?;
    if ls.has_depth() != lh.has_depth() {
        return None;
    }

    let shoulders = ls.to_vec3().midpoint(rs.to_vec3());
    let hips = lh.to_vec3().midpoint(rh.to_vec3());
    let v = shoulders - hips;

    // "Up" is −y in image space and +y in world space
    let up = if ls.has_depth() { v.y } else { -v.y };
    if v.x.hypot(up) < MIN_SEGMENT_LENGTH {
        return None;
    }
    Some(v.x.atan2(up).to_degrees())
}

// ============================================================================
// Rotation
// ============================================================================

/// 2D rotation from projected segment width.
///
/// `ratio = clamp(|dx| / max_width, 0, 1)`, `angle = acos(ratio)`.
/// Full anatomical width → 0°, zero width → 90°.
pub fn planar_rotation(left: JointPosition, right: JointPosition, max_width: f64) -> Option<f64> {
    if max_width <= 0.0 || !max_width.is_finite() {
        return None;
    }
    let width = (left.to_vec3().x - right.to_vec3().x).abs();
    let ratio = (width / max_width).clamp(0.0, 1.0);
    Some(ratio.acos().to_degrees())
}

/// 3D rotation from the horizontal component of the segment vector.
///
/// `angle = acos(|normalize(seg.x, 0, seg.z) · forward|)`. The absolute value
/// discards rotation direction, so the result lies in [0°, 90°].
pub fn spatial_rotation(left: Vec3, right: Vec3, forward: Vec3) -> Option<f64> {
    let seg = right - left;
    let horizontal = Vec3::new(seg.x, 0.0, seg.z).normalized()?;
    let forward = Vec3::new(forward.x, 0.0, forward.z).normalized()?;
    let cos = horizontal.dot(forward).abs().clamp(0.0, 1.0);
    Some(cos.acos().to_degrees())
}

fn segment_rotation(
    joints: &JointSet,
    left: JointName,
    right: JointName,
    max_width: f64,
    forward: Vec3,
) -> Option<f64> {
    let (l, r) = pair(joints, left, right)?;
    if l.has_depth() {
        spatial_rotation(l.to_vec3(), r.to_vec3(), forward)
    } else {
        planar_rotation(l, r, max_width)
    }
}

pub fn shoulder_rotation(joints: &JointSet, config: &GeometryConfig) -> Option<f64> {
    segment_rotation(
        joints,
        JointName::LeftShoulder,
        JointName::RightShoulder,
        config.shoulder_max_width,
        forward_axis(config),
    )
}

pub fn hip_rotation(joints: &JointSet, config: &GeometryConfig) -> Option<f64> {
    segment_rotation(
        joints,
        JointName::LeftHip,
        JointName::RightHip,
        config.hip_max_width,
        forward_axis(config),
    )
}

fn forward_axis(config: &GeometryConfig) -> Vec3 {
    let [x, y, z] = config.camera_forward;
    Vec3::new(x, y, z)
}

// ============================================================================
// Arm
// ============================================================================

/// Interior elbow angle between elbow→shoulder and elbow→wrist.
///
/// 180° = straight arm, 90° = right-angle bend. `None` for any zero-length
/// vector, or when the products overflow.
pub fn arm_angle(shoulder: Vec3, elbow: Vec3, wrist: Vec3) -> Option<f64> {
    let upper = shoulder - elbow;
    let fore = wrist - elbow;
    let (m1, m2) = (upper.length(), fore.length());
    if !(m1.is_finite() && m2.is_finite()) || m1 < MIN_SEGMENT_LENGTH || m2 < MIN_SEGMENT_LENGTH {
        return None;
    }
    let cos = (upper.dot(fore) / (m1 * m2)).clamp(-1.0, 1.0);
    Some(cos.acos().to_degrees()).filter(|angle| angle.is_finite())
}

/// Elbow angle of the left or right arm from a joint set.
pub fn arm_angle_for(joints: &JointSet, left_side: bool) -> Option<f64> {
    let (s, e, w) = if left_side {
        (JointName::LeftShoulder, JointName::LeftElbow, JointName::LeftWrist)
    } else {
        (JointName::RightShoulder, JointName::RightElbow, JointName::RightWrist)
    };
    let s = joints.position(s)?;
    let e = joints.position(e)?;
    let w = joints.position(w)?;
    if s.has_depth() != e.has_depth() || e.has_depth() != w.has_depth() {
        return None;
    }
    arm_angle(s.to_vec3(), e.to_vec3(), w.to_vec3())
}

/// All per-frame derived angles.
pub fn derive_angles(joints: &JointSet, config: &GeometryConfig) -> DerivedAngles {
    DerivedAngles {
        spine: spine_angle(joints),
        hip_rotation: hip_rotation(joints, config),
        shoulder_rotation: shoulder_rotation(joints, config),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Joint;

    fn torso(shoulder_dx: f64, shoulder_width: f64, hip_width: f64) -> JointSet {
        JointSet::new(vec![
            Joint::image(JointName::LeftShoulder, 0.5 - shoulder_width / 2.0 + shoulder_dx, 0.35, 0.9),
            Joint::image(JointName::RightShoulder, 0.5 + shoulder_width / 2.0 + shoulder_dx, 0.35, 0.9),
            Joint::image(JointName::LeftHip, 0.5 - hip_width / 2.0, 0.6, 0.9),
            Joint::image(JointName::RightHip, 0.5 + hip_width / 2.0, 0.6, 0.9),
        ])
    }

    #[test]
    fn test_straight_arm() {
        let angle = arm_angle(
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(0.5, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
        )
        .unwrap();
        assert!((angle - 180.0).abs() < 5.0);
    }

    #[test]
    fn test_bent_arm() {
        let angle = arm_angle(
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(0.5, 0.0, 0.0),
            Vec3::new(0.5, 0.5, 0.0),
        )
        .unwrap();
        assert!((angle - 90.0).abs() < 10.0);
    }

    #[test]
    fn test_arm_degenerate_is_none() {
        let p = Vec3::new(0.3, 0.3, 0.0);
        assert!(arm_angle(p, p, Vec3::new(0.5, 0.5, 0.0)).is_none());
    }

    #[test]
    fn test_arm_overflow_is_none() {
        let elbow = Vec3::new(0.0, 0.0, 0.0);
        for far in [1e155, 1e200, f64::MAX] {
            let angle = arm_angle(Vec3::new(far, 0.0, 0.0), elbow, Vec3::new(far, far, 0.0));
            assert!(angle.is_none(), "{far:e} gave {angle:?}");
        }
        // Opposite extremes overflow the segment subtraction itself
        let angle = arm_angle(Vec3::new(f64::MAX, 0.0, 0.0), Vec3::new(-f64::MAX, 0.0, 0.0), elbow);
        assert!(angle.is_none());
    }

    #[test]
    fn test_upright_spine() {
        let angle = spine_angle(&torso(0.0, 0.25, 0.18)).unwrap();
        assert!(angle.abs() < 1.0);
    }

    #[test]
    fn test_forward_lean_spine() {
        let angle = spine_angle(&torso(0.1, 0.25, 0.18)).unwrap();
        assert!((15.0..=45.0).contains(&angle), "got {angle}");
    }

    #[test]
    fn test_world_spine_upright() {
        let joints = JointSet::new(vec![
            Joint::world(JointName::LeftShoulder, -0.2, 1.45, -2.5, 0.9),
            Joint::world(JointName::RightShoulder, 0.2, 1.45, -2.5, 0.9),
            Joint::world(JointName::LeftHip, -0.15, 1.0, -2.5, 0.9),
            Joint::world(JointName::RightHip, 0.15, 1.0, -2.5, 0.9),
        ]);
        assert!(spine_angle(&joints).unwrap().abs() < 1.0);
    }

    #[test]
    fn test_incomplete_torso_yields_none() {
        let joints = JointSet::new(vec![
            Joint::image(JointName::LeftShoulder, 0.4, 0.35, 0.9),
            Joint::image(JointName::RightShoulder, 0.6, 0.35, 0.9),
            Joint::image(JointName::LeftHip, 0.45, 0.6, 0.9),
        ]);
        let angles = derive_angles(&joints, &GeometryConfig::default());
        assert!(angles.spine.is_none());
        assert!(angles.hip_rotation.is_none());
        assert!(angles.shoulder_rotation.is_some());
    }

    #[test]
    fn test_mixed_spaces_yield_none() {
        let joints = JointSet::new(vec![
            Joint::image(JointName::LeftHip, 0.4, 0.6, 0.9),
            Joint::world(JointName::RightHip, 0.1, 1.0, -2.5, 0.9),
        ]);
        assert!(hip_rotation(&joints, &GeometryConfig::default()).is_none());
    }

    #[test]
    fn test_planar_rotation_endpoints() {
        let l = JointPosition::Image { x: 0.4, y: 0.5 };
        let square = planar_rotation(l, JointPosition::Image { x: 0.65, y: 0.5 }, 0.25).unwrap();
        let edge_on = planar_rotation(l, JointPosition::Image { x: 0.4, y: 0.5 }, 0.25).unwrap();
        assert!(square.abs() < 1e-6);
        assert!((edge_on - 90.0).abs() < 1e-6);
    }

    #[test]
    fn test_planar_rotation_monotonic_as_width_shrinks() {
        let config = GeometryConfig::default();
        let mut previous = f64::NEG_INFINITY;
        for step in 0..=30 {
            let width = config.shoulder_max_width * (1.0 - f64::from(step) / 30.0);
            let rot = shoulder_rotation(&torso(0.0, width, 0.18), &config).unwrap();
            assert!(rot >= previous - 1e-12, "rotation fell at width {width}");
            previous = rot;
        }
        assert!((previous - 90.0).abs() < 1e-6);
    }

    #[test]
    fn test_wider_than_anatomical_max_clamps_to_square() {
        let rot = planar_rotation(
            JointPosition::Image { x: 0.2, y: 0.5 },
            JointPosition::Image { x: 0.8, y: 0.5 },
            0.25,
        )
        .unwrap();
        assert_eq!(rot, 0.0);
    }

    #[test]
    fn test_spatial_rotation_ignores_height_and_sign() {
        let forward = Vec3::new(0.0, 0.0, -1.0);
        // Segment along the forward axis: |dot| = 1 → 0°
        let along = spatial_rotation(Vec3::new(0.0, 1.4, -2.3), Vec3::new(0.0, 1.6, -2.7), forward).unwrap();
        assert!(along.abs() < 1e-6);
        // Segment across the camera: dot = 0 → 90°
        let across = spatial_rotation(Vec3::new(-0.2, 1.4, -2.5), Vec3::new(0.2, 1.4, -2.5), forward).unwrap();
        assert!((across - 90.0).abs() < 1e-6);
        // Mirrored segment gives the same angle
        let mirrored = spatial_rotation(Vec3::new(0.2, 1.4, -2.5), Vec3::new(-0.2, 1.4, -2.5), forward).unwrap();
        assert!((across - mirrored).abs() < 1e-9);
    }

    #[test]
    fn test_spatial_rotation_vertical_segment_is_none() {
        let forward = Vec3::new(0.0, 0.0, -1.0);
        assert!(spatial_rotation(Vec3::new(0.0, 1.0, -2.5), Vec3::new(0.0, 1.5, -2.5), forward).is_none());
    }
}
