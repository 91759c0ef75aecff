//! Camera-only 2D provider. Always available, no true depth.

use tokio::sync::broadcast;

use super::{LiveUpdate, PoseProvider, ProviderCapabilities, ProviderCore, ProviderError};
use crate::alignment::AlignmentClassifier;
use crate::config::GeometryConfig;
use crate::types::{
    AlignmentStatus, Joint, JointPosition, PoseFrame, PoseObservation, TrackingMode, CAMERA_SKELETON,
};

#[derive(Debug)]
pub struct CameraPoseProvider {
    core: ProviderCore,
}

impl CameraPoseProvider {
    pub fn new(
        geometry: GeometryConfig,
        classifier: AlignmentClassifier,
        live_tx: broadcast::Sender<LiveUpdate>,
    ) -> Self {
        Self {
            core: ProviderCore::new(TrackingMode::Camera2D, geometry, classifier, live_tx),
        }
    }
}

/// Reduce a detected joint to image space.
///
/// World joints survive only through their screen projection; anything
/// outside the camera skeleton is dropped.
fn to_image_joint(joint: Joint) -> Option<Joint> {
    if !CAMERA_SKELETON.contains(&joint.name) {
        return None;
    }
    match (joint.position, joint.screen) {
        (JointPosition::Image { .. }, _) => Some(joint),
        (JointPosition::World { .. }, Some(screen)) => Some(Joint {
            position: JointPosition::Image {
                x: screen.x,
                y: screen.y,
            },
            screen: None,
            ..joint
        }),
        (JointPosition::World { .. }, None) => None,
    }
}

impl PoseProvider for CameraPoseProvider {
    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities {
            mode: TrackingMode::Camera2D,
            joint_count: TrackingMode::Camera2D.joint_count(),
            supports_depth: false,
            available: true,
        }
    }

    fn is_detecting(&self) -> bool {
        self.core.is_detecting()
    }

    fn current_pose(&self) -> Option<&PoseFrame> {
        self.core.current()
    }

    fn alignment_status(&self) -> AlignmentStatus {
        self.core.status()
    }

    fn start(&mut self) -> Result<(), ProviderError> {
        self.core.start();
        Ok(())
    }

    fn stop(&mut self) {
        self.core.stop();
    }

    fn ingest(&mut self, observation: PoseObservation) -> Option<PoseFrame> {
        if !self.core.is_detecting() {
            return None;
        }
        let min_confidence = self.core.min_joint_confidence();
        let joints: Vec<Joint> = observation
            .joints
            .into_iter()
            .filter(|j| j.confidence >= min_confidence)
            .filter_map(to_image_joint)
            .collect();

        let frame = self
            .core
            .build_frame(observation.timestamp, joints, observation.confidence);
        let status = self.core.classifier().classify(&frame);
        self.core.publish(Some(frame.clone()), status);
        Some(frame)
    }
}
