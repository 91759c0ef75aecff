//! Pose Providers - camera-only 2D and depth-augmented 3D pose acquisition
//!
//! Both providers sit behind the [`PoseProvider`] trait and are selected by
//! an explicit [`TrackingMode`]. The external detector pushes raw
//! [`PoseObservation`]s in; providers turn them into [`PoseFrame`]s with
//! derived angles, classify framing, and publish a [`LiveUpdate`] on a
//! broadcast channel. Publishing never blocks: with no subscriber the update
//! is dropped, and a lagging subscriber skips ahead.

mod camera;
mod depth;

pub use camera::CameraPoseProvider;
pub use depth::DepthPoseProvider;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::debug;

use crate::alignment::AlignmentClassifier;
use crate::config::GeometryConfig;
use crate::geometry::derive_angles;
use crate::types::{
    clamp_unit, AlignmentStatus, Joint, JointSet, PoseFrame, PoseObservation, TrackingMode,
};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("{0} tracking is not supported on this device")]
    HardwareUnavailable(TrackingMode),
}

/// Static description of what a provider can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderCapabilities {
    pub mode: TrackingMode,
    pub joint_count: usize,
    pub supports_depth: bool,
    /// Whether `start()` can succeed on this device
    pub available: bool,
}

/// Live pose/alignment update for UI-style subscribers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveUpdate {
    pub mode: TrackingMode,
    pub status: AlignmentStatus,
    /// `None` when tracking was lost
    pub frame: Option<PoseFrame>,
}

/// The single hardware query the capture engine needs.
pub trait DeviceCapabilities: Send + Sync {
    fn supports_depth_tracking(&self) -> bool;
}

/// Fixed answer, for tests, simulation, and platforms without a real query.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticDeviceCapabilities(pub bool);

impl DeviceCapabilities for StaticDeviceCapabilities {
    fn supports_depth_tracking(&self) -> bool {
        self.0
    }
}

/// Shared contract for pose acquisition.
///
/// `start()` and `stop()` are idempotent; stopping an inactive provider is a
/// no-op. `ingest` returns the frame built from an observation, or `None`
/// when the provider is not detecting or the observation carries no body.
pub trait PoseProvider: Send {
    fn capabilities(&self) -> ProviderCapabilities;

    fn is_detecting(&self) -> bool;

    /// Most recent frame since the last `start()`.
    fn current_pose(&self) -> Option<&PoseFrame>;

    fn alignment_status(&self) -> AlignmentStatus;

    fn start(&mut self) -> Result<(), ProviderError>;

    fn stop(&mut self);

    fn ingest(&mut self, observation: PoseObservation) -> Option<PoseFrame>;

    fn mode(&self) -> TrackingMode {
        self.capabilities().mode
    }
}

// ============================================================================
// Shared provider state
// ============================================================================

/// Detection state and frame building shared by both providers.
#[derive(Debug)]
pub(crate) struct ProviderCore {
    mode: TrackingMode,
    detecting: bool,
    next_frame_index: u64,
    current: Option<PoseFrame>,
    status: AlignmentStatus,
    live_tx: broadcast::Sender<LiveUpdate>,
    geometry: GeometryConfig,
    classifier: AlignmentClassifier,
}

impl ProviderCore {
    pub(crate) fn new(
        mode: TrackingMode,
        geometry: GeometryConfig,
        classifier: AlignmentClassifier,
        live_tx: broadcast::Sender<LiveUpdate>,
    ) -> Self {
        Self {
            mode,
            detecting: false,
            next_frame_index: 0,
            current: None,
            status: AlignmentStatus::Searching,
            live_tx,
            geometry,
            classifier,
        }
    }

    pub(crate) fn start(&mut self) {
        if self.detecting {
            return;
        }
        self.detecting = true;
        self.next_frame_index = 0;
        self.current = None;
        self.status = AlignmentStatus::Searching;
        debug!(mode = %self.mode, "Pose provider started");
    }

    pub(crate) fn stop(&mut self) {
        if !self.detecting {
            return;
        }
        self.detecting = false;
        self.status = AlignmentStatus::Searching;
        debug!(mode = %self.mode, frames = self.next_frame_index, "Pose provider stopped");
    }

    pub(crate) const fn is_detecting(&self) -> bool {
        self.detecting
    }

    pub(crate) fn current(&self) -> Option<&PoseFrame> {
        self.current.as_ref()
    }

    pub(crate) const fn status(&self) -> AlignmentStatus {
        self.status
    }

    pub(crate) fn classifier(&self) -> &AlignmentClassifier {
        &self.classifier
    }

    pub(crate) fn min_joint_confidence(&self) -> f64 {
        self.geometry.min_joint_confidence
    }

    /// Build the next frame from already-filtered joints.
    pub(crate) fn build_frame(&mut self, timestamp: f64, joints: Vec<Joint>, confidence: Option<f64>) -> PoseFrame {
        let joints = JointSet::new(joints);
        let confidence = clamp_unit(confidence.unwrap_or_else(|| joints.mean_confidence()));
        let angles = derive_angles(&joints, &self.geometry);
        let frame = PoseFrame {
            timestamp,
            frame_index: self.next_frame_index,
            confidence,
            joints,
            angles,
        };
        self.next_frame_index += 1;
        frame
    }

    /// Record the latest frame and status, then publish without blocking.
    pub(crate) fn publish(&mut self, frame: Option<PoseFrame>, status: AlignmentStatus) {
        self.current.clone_from(&frame);
        self.status = status;
        // Err only means nobody is listening
        let _ = self.live_tx.send(LiveUpdate {
            mode: self.mode,
            status,
            frame,
        });
    }
}
