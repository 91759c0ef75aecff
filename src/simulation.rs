//! Synthetic range-session generator.
//!
//! Produces the event stream a phone camera plus wrist wearable would
//! deliver for a series of swings: pose observations at the camera rate,
//! wearable samples in wearable-local time delivered with link latency,
//! clock sync round trips, and swing window boundaries.
//!
//! ## Swing model
//!
//! Each swing runs address → backswing → downswing → follow-through →
//! finish hold. The body turn follows a cosine ease:
//! - backswing: 0 → +turn
//! - downswing: +turn → 0 (impact)
//! - follow-through: 0 → −turn
//!
//! The wearable reads gravity at rest, a moderate lateral load through the
//! backswing, and a peak at impact.
//!
//! Frame and sample times are generated relative to each swing's start, so
//! identical profiles quantize identically.

use std::f64::consts::{FRAC_PI_2, PI};

use rand::prelude::*;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

use crate::capture::CaptureEvent;
use crate::config::GeometryConfig;
use crate::types::{
    Joint, JointName, PoseObservation, RawMotionSample, TrackingMode, TrackingSignal, Vec3,
    CAMERA_SKELETON,
};

/// Lateral wrist load at the middle of the backswing (g).
const BACKSWING_LOAD_G: f64 = 1.5;

/// Rotation rate per g of lateral load (rad/s).
const ROTATION_PER_G: f64 = 0.8;

/// Simulated detector confidence.
const JOINT_CONFIDENCE: f64 = 0.9;

/// Pinhole focal length in normalized screen units.
const FOCAL: f64 = 1.2;

/// Camera-space height that projects to screen centre (m).
const CAMERA_HEIGHT: f64 = 1.2;

// ============================================================================
// Profiles
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwingProfile {
    pub name: String,
    /// Still at address before the takeaway (s)
    pub setup_secs: f64,
    pub backswing_secs: f64,
    pub downswing_secs: f64,
    pub follow_through_secs: f64,
    /// Still at the finish (s)
    pub finish_hold_secs: f64,
    pub shoulder_turn_deg: f64,
    pub hip_turn_deg: f64,
    /// Constant spine tilt from vertical (deg)
    pub spine_tilt_deg: f64,
    /// Wrist acceleration magnitude at impact (g)
    pub peak_acceleration_g: f64,
}

impl SwingProfile {
    pub fn standard() -> Self {
        Self {
            name: "standard".to_string(),
            setup_secs: 0.6,
            backswing_secs: 0.9,
            downswing_secs: 0.3,
            follow_through_secs: 0.6,
            finish_hold_secs: 0.4,
            shoulder_turn_deg: 85.0,
            hip_turn_deg: 45.0,
            spine_tilt_deg: 6.0,
            peak_acceleration_g: 8.0,
        }
    }

    /// Five distinct tempos and turns, from quick to long.
    pub fn variations() -> Vec<Self> {
        let base = Self::standard();
        [
            ("standard", 0.9, 0.3, 85.0, 45.0),
            ("quick", 0.75, 0.3, 80.0, 42.0),
            ("long", 1.0, 0.28, 90.0, 48.0),
            ("smooth", 0.8, 0.32, 78.0, 40.0),
            ("aggressive", 0.95, 0.25, 88.0, 50.0),
        ]
        .into_iter()
        .map(|(name, backswing, downswing, shoulder, hip)| Self {
            name: name.to_string(),
            backswing_secs: backswing,
            downswing_secs: downswing,
            shoulder_turn_deg: shoulder,
            hip_turn_deg: hip,
            ..base.clone()
        })
        .collect()
    }

    pub fn duration(&self) -> f64 {
        self.setup_secs
            + self.backswing_secs
            + self.downswing_secs
            + self.follow_through_secs
            + self.finish_hold_secs
    }

    /// Signed turn fraction in [−1, 1] and lateral wrist load (g) at `tau`
    /// seconds after the swing start.
    fn kinematics(&self, tau: f64) -> (f64, f64) {
        let ease = |u: f64| (1.0 - (PI * u).cos()) / 2.0;
        let impact_load = (self.peak_acceleration_g.powi(2) - 1.0).max(0.0).sqrt();

        let backswing_start = self.setup_secs;
        let impact_start = backswing_start + self.backswing_secs;
        let follow_start = impact_start + self.downswing_secs;
        let finish_start = follow_start + self.follow_through_secs;

        if tau < backswing_start {
            (0.0, 0.0)
        } else if tau < impact_start {
            let u = (tau - backswing_start) / self.backswing_secs;
            (ease(u), BACKSWING_LOAD_G * (PI * u).sin())
        } else if tau < follow_start {
            let v = (tau - impact_start) / self.downswing_secs;
            (1.0 - ease(v), impact_load * (FRAC_PI_2 * v).sin())
        } else if tau < finish_start {
            let w = (tau - follow_start) / self.follow_through_secs;
            (-ease(w), impact_load * (FRAC_PI_2 * w).cos())
        } else {
            (-1.0, 0.0)
        }
    }
}

// ============================================================================
// Simulator
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub mode: TrackingMode,
    pub camera_fps: f64,
    pub wearable_rate_hz: f64,
    /// Wearable clock minus host clock (s)
    pub clock_skew_secs: f64,
    /// Wearable link delivery delay (s)
    pub wearable_latency_secs: f64,
    /// Clock sync round-trip time (s)
    pub sync_round_trip_secs: f64,
    /// Joint position noise std-dev (normalized screen units or metres)
    pub noise_std: f64,
    /// Idle time between swings (s)
    pub gap_secs: f64,
    pub seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            mode: TrackingMode::Camera2D,
            camera_fps: 60.0,
            wearable_rate_hz: 100.0,
            clock_skew_secs: 40.0,
            wearable_latency_secs: 0.08,
            sync_round_trip_secs: 0.02,
            noise_std: 0.0,
            gap_secs: 1.5,
            seed: 7,
        }
    }
}

pub struct SwingSimulator {
    config: SimulationConfig,
    geometry: GeometryConfig,
    rng: StdRng,
    noise: Option<Normal<f64>>,
    sequence: u64,
}

impl SwingSimulator {
    pub fn new(config: SimulationConfig, geometry: GeometryConfig) -> Self {
        let std = config.noise_std;
        let noise = (std.is_finite() && std > 0.0)
            .then(|| Normal::new(0.0, std).ok())
            .flatten();
        Self {
            rng: StdRng::seed_from_u64(config.seed),
            config,
            geometry,
            noise,
            sequence: 0,
        }
    }

    fn jitter(&mut self) -> f64 {
        match self.noise {
            Some(normal) => normal.sample(&mut self.rng),
            None => 0.0,
        }
    }

    /// Events for `swings` swings, cycling through `profiles`, in delivery order.
    pub fn session(&mut self, profiles: &[SwingProfile], swings: usize) -> Vec<CaptureEvent> {
        let mut timed: Vec<(f64, CaptureEvent)> = Vec::new();
        if profiles.is_empty() {
            return Vec::new();
        }

        for i in 0..3 {
            self.clock_sync(f64::from(i) * 0.05, &mut timed);
        }

        let mut cursor = 0.5;
        for profile in profiles.iter().cycle().take(swings) {
            let end = cursor + profile.duration();
            timed.push((cursor, CaptureEvent::BeginSwing { at: cursor }));
            self.segment(cursor, profile.duration(), |tau| profile.kinematics(tau), profile, &mut timed);
            timed.push((end, CaptureEvent::FinishSwing { at: end }));

            // Idle at address between swings
            let gap = self.config.gap_secs;
            self.segment(end, gap, |_| (0.0, 0.0), profile, &mut timed);
            self.clock_sync(end + gap / 2.0, &mut timed);
            cursor = end + gap;
        }

        // Stable sort keeps same-instant events in push order
        timed.sort_by(|a, b| a.0.total_cmp(&b.0));
        timed.into_iter().map(|(_, event)| event).collect()
    }

    fn clock_sync(&self, send_time: f64, timed: &mut Vec<(f64, CaptureEvent)>) {
        let round_trip = self.config.sync_round_trip_secs;
        timed.push((
            send_time + round_trip,
            CaptureEvent::ClockSync {
                send_time,
                wearable_time: send_time + round_trip / 2.0 + self.config.clock_skew_secs,
                round_trip,
            },
        ));
    }

    /// Camera frames and wearable samples for `[start, start + duration)`.
    fn segment(
        &mut self,
        start: f64,
        duration: f64,
        kinematics: impl Fn(f64) -> (f64, f64),
        profile: &SwingProfile,
        timed: &mut Vec<(f64, CaptureEvent)>,
    ) {
        for tau in ticks(duration, self.config.camera_fps) {
            let (turn, _) = kinematics(tau);
            let observation = self.observation(start + tau, turn, profile);
            timed.push((start + tau, CaptureEvent::Pose(observation)));
        }

        for tau in ticks(duration, self.config.wearable_rate_hz) {
            let (turn, load) = kinematics(tau);
            let sample = self.motion(start + tau, turn, load);
            timed.push((
                start + tau + self.config.wearable_latency_secs,
                CaptureEvent::Motion(sample),
            ));
        }
    }

    fn motion(&mut self, host_time: f64, turn: f64, load: f64) -> RawMotionSample {
        let sequence = self.sequence;
        self.sequence += 1;
        let direction = if turn < 0.0 { -1.0 } else { 1.0 };
        let lateral = load + self.jitter() * 0.5;
        RawMotionSample {
            local_timestamp: host_time + self.config.clock_skew_secs,
            sequence,
            acceleration: Vec3::new(lateral, -1.0 + self.jitter() * 0.5, self.jitter() * 0.5),
            rotation_rate: Vec3::new(0.0, direction * ROTATION_PER_G * load, 0.0),
        }
    }

    fn observation(&mut self, host_time: f64, turn: f64, profile: &SwingProfile) -> PoseObservation {
        let shoulder = (turn * profile.shoulder_turn_deg).to_radians();
        let hip = (turn * profile.hip_turn_deg).to_radians();
        let tilt = profile.spine_tilt_deg.to_radians();
        // Hands swing wider than the shoulders turn
        let hands = shoulder * 1.5;

        match self.config.mode {
            TrackingMode::Camera2D => {
                let joints = self.image_skeleton(shoulder, hip, tilt, hands);
                PoseObservation::new(host_time, joints)
            }
            TrackingMode::Depth3D => {
                let joints = self.world_skeleton(shoulder, hip, tilt, hands);
                PoseObservation::new(host_time, joints).with_tracking(TrackingSignal::Normal)
            }
        }
    }

    /// Face-on 2D skeleton. Rotation narrows the projected segment widths.
    fn image_skeleton(&mut self, shoulder: f64, hip: f64, tilt: f64, hands: f64) -> Vec<Joint> {
        let hip_center = Vec3::new(0.5, 0.6, 0.0);
        let shoulder_center = hip_center + Vec3::new(tilt.sin(), -tilt.cos(), 0.0) * 0.25;
        let shoulder_half = self.geometry.shoulder_max_width / 2.0 * shoulder.cos().abs();
        let hip_half = self.geometry.hip_max_width / 2.0 * hip.cos().abs();
        let wrist = shoulder_center + Vec3::new(-hands.sin(), hands.cos(), 0.0) * 0.3;

        let left_shoulder = shoulder_center - Vec3::new(shoulder_half, 0.0, 0.0);
        let right_shoulder = shoulder_center + Vec3::new(shoulder_half, 0.0, 0.0);
        let nose = shoulder_center + Vec3::new(0.0, -0.1, 0.0);

        let positions = [
            (JointName::Nose, nose),
            (JointName::Neck, shoulder_center),
            (JointName::LeftEye, nose + Vec3::new(-0.015, -0.015, 0.0)),
            (JointName::RightEye, nose + Vec3::new(0.015, -0.015, 0.0)),
            (JointName::LeftEar, nose + Vec3::new(-0.03, -0.005, 0.0)),
            (JointName::RightEar, nose + Vec3::new(0.03, -0.005, 0.0)),
            (JointName::LeftShoulder, left_shoulder),
            (JointName::RightShoulder, right_shoulder),
            // Lead arm straight, trail arm folded toward the wrist
            (JointName::LeftElbow, left_shoulder.midpoint(wrist)),
            (JointName::RightElbow, right_shoulder.midpoint(wrist) + Vec3::new(0.03, 0.0, 0.0)),
            (JointName::LeftWrist, wrist),
            (JointName::RightWrist, wrist + Vec3::new(0.01, 0.0, 0.0)),
            (JointName::Root, hip_center),
            (JointName::LeftHip, hip_center - Vec3::new(hip_half, 0.0, 0.0)),
            (JointName::RightHip, hip_center + Vec3::new(hip_half, 0.0, 0.0)),
            (JointName::LeftKnee, hip_center + Vec3::new(-0.07, 0.17, 0.0)),
            (JointName::RightKnee, hip_center + Vec3::new(0.07, 0.17, 0.0)),
            (JointName::LeftAnkle, hip_center + Vec3::new(-0.09, 0.33, 0.0)),
            (JointName::RightAnkle, hip_center + Vec3::new(0.09, 0.33, 0.0)),
        ];

        positions
            .into_iter()
            .map(|(name, p)| {
                let (x, y) = (p.x + self.jitter(), p.y + self.jitter());
                Joint::image(name, x, y, JOINT_CONFIDENCE)
            })
            .collect()
    }

    /// 3D skeleton in the sensor frame (camera at the origin looking down −z),
    /// padded with extended landmarks to the full joint count.
    fn world_skeleton(&mut self, shoulder: f64, hip: f64, tilt: f64, hands: f64) -> Vec<Joint> {
        let hip_center = Vec3::new(0.0, 1.0, -2.5);
        let shoulder_center = hip_center + Vec3::new(tilt.sin(), tilt.cos(), 0.0) * 0.5;
        let shoulder_axis = Vec3::new(shoulder.cos(), 0.0, shoulder.sin()) * 0.2;
        let hip_axis = Vec3::new(hip.cos(), 0.0, hip.sin()) * 0.15;
        let wrist = shoulder_center + Vec3::new(-hands.sin(), -hands.cos(), 0.0) * 0.6;

        let left_shoulder = shoulder_center - shoulder_axis;
        let right_shoulder = shoulder_center + shoulder_axis;
        let nose = shoulder_center + Vec3::new(0.0, 0.2, 0.05);

        let named = [
            (JointName::Nose, nose),
            (JointName::Neck, shoulder_center),
            (JointName::LeftEye, nose + Vec3::new(-0.03, 0.03, 0.0)),
            (JointName::RightEye, nose + Vec3::new(0.03, 0.03, 0.0)),
            (JointName::LeftEar, nose + Vec3::new(-0.07, 0.01, -0.05)),
            (JointName::RightEar, nose + Vec3::new(0.07, 0.01, -0.05)),
            (JointName::LeftShoulder, left_shoulder),
            (JointName::RightShoulder, right_shoulder),
            (JointName::LeftElbow, left_shoulder.midpoint(wrist)),
            (JointName::RightElbow, right_shoulder.midpoint(wrist) + Vec3::new(0.05, 0.0, 0.05)),
            (JointName::LeftWrist, wrist),
            (JointName::RightWrist, wrist + Vec3::new(0.02, 0.0, 0.0)),
            (JointName::Root, hip_center),
            (JointName::LeftHip, hip_center - hip_axis),
            (JointName::RightHip, hip_center + hip_axis),
            (JointName::LeftKnee, hip_center + Vec3::new(-0.12, -0.45, 0.05)),
            (JointName::RightKnee, hip_center + Vec3::new(0.12, -0.45, 0.05)),
            (JointName::LeftAnkle, hip_center + Vec3::new(-0.15, -0.9, 0.0)),
            (JointName::RightAnkle, hip_center + Vec3::new(0.15, -0.9, 0.0)),
        ];
        debug_assert_eq!(named.len(), CAMERA_SKELETON.len());

        let extended_count = TrackingMode::Depth3D.joint_count() - named.len();
        let extended = (0..extended_count).map(|i| {
            // Spread along the spine and shoulder girdle
            let t = i as f64 / extended_count as f64;
            let along_spine = hip_center.lerp(shoulder_center, t);
            let side = if i % 2 == 0 { -1.0 } else { 1.0 };
            let index = u16::try_from(i).unwrap_or(u16::MAX);
            (JointName::Extended(index), along_spine + shoulder_axis * (side * t))
        });

        named
            .into_iter()
            .chain(extended)
            .map(|(name, p)| {
                let p = p + Vec3::new(self.jitter(), self.jitter(), self.jitter());
                let joint = Joint::world(name, p.x, p.y, p.z, JOINT_CONFIDENCE);
                let depth = -p.z;
                joint.with_screen(
                    FOCAL.mul_add(p.x / depth, 0.5),
                    FOCAL.mul_add(-(p.y - CAMERA_HEIGHT) / depth, 0.5),
                )
            })
            .collect()
    }
}

/// Offsets `k / rate` strictly inside `[0, duration)`.
fn ticks(duration: f64, rate: f64) -> impl Iterator<Item = f64> {
    let limit = if rate.is_finite() && rate > 0.0 {
        (duration * rate).ceil().max(0.0) as u64
    } else {
        0
    };
    (0..limit)
        .map(move |k| k as f64 / rate)
        .take_while(move |tau| *tau < duration - 1e-9)
}
