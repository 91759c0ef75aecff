//! Depth-augmented 3D provider, gated on the device capability query.

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{debug, warn};

use super::{
    DeviceCapabilities, LiveUpdate, PoseProvider, ProviderCapabilities, ProviderCore, ProviderError,
};
use crate::alignment::AlignmentClassifier;
use crate::config::GeometryConfig;
use crate::types::{AlignmentStatus, Joint, PoseFrame, PoseObservation, TrackingMode, TrackingSignal};

pub struct DepthPoseProvider {
    core: ProviderCore,
    device: Arc<dyn DeviceCapabilities>,
    signal: TrackingSignal,
}

impl std::fmt::Debug for DepthPoseProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DepthPoseProvider")
            .field("core", &self.core)
            .field("supported", &self.device.supports_depth_tracking())
            .field("signal", &self.signal)
            .finish()
    }
}

impl DepthPoseProvider {
    pub fn new(
        geometry: GeometryConfig,
        classifier: AlignmentClassifier,
        live_tx: broadcast::Sender<LiveUpdate>,
        device: Arc<dyn DeviceCapabilities>,
    ) -> Self {
        Self {
            core: ProviderCore::new(TrackingMode::Depth3D, geometry, classifier, live_tx),
            device,
            signal: TrackingSignal::Normal,
        }
    }

    /// Last coarse tracking signal reported by the depth session.
    pub fn tracking_signal(&self) -> TrackingSignal {
        self.signal
    }
}

impl PoseProvider for DepthPoseProvider {
    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities {
            mode: TrackingMode::Depth3D,
            joint_count: TrackingMode::Depth3D.joint_count(),
            supports_depth: true,
            available: self.device.supports_depth_tracking(),
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
        if !self.device.supports_depth_tracking() {
            warn!("Depth tracking requested on a device without support");
            return Err(ProviderError::HardwareUnavailable(TrackingMode::Depth3D));
        }
        self.signal = TrackingSignal::Normal;
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
        let signal = observation.tracking.unwrap_or_default();
        if signal != self.signal {
            debug!(from = ?self.signal, to = ?signal, "Depth tracking signal changed");
            self.signal = signal;
        }

        if signal == TrackingSignal::Lost {
            self.core.publish(None, AlignmentStatus::Searching);
            return None;
        }

        let min_confidence = self.core.min_joint_confidence();
        let joints: Vec<Joint> = observation
            .joints
            .into_iter()
            .filter(|j| j.confidence >= min_confidence)
            .collect();
        let frame = self
            .core
            .build_frame(observation.timestamp, joints, observation.confidence);
        let status = self.core.classifier().classify_signal(Some(&frame), signal);
        self.core.publish(Some(frame.clone()), status);
        Some(frame)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::providers::StaticDeviceCapabilities;
    use crate::types::JointName;

    fn provider(supported: bool) -> DepthPoseProvider {
        let (tx, _) = broadcast::channel(8);
        DepthPoseProvider::new(
            GeometryConfig::default(),
            AlignmentClassifier::default(),
            tx,
            Arc::new(StaticDeviceCapabilities(supported)),
        )
    }

    fn world_torso(t: f64) -> PoseObservation {
        PoseObservation::new(
            t,
            vec![
                Joint::world(JointName::LeftShoulder, -0.2, 1.45, -2.5, 0.9).with_screen(0.42, 0.3),
                Joint::world(JointName::RightShoulder, 0.2, 1.45, -2.5, 0.9).with_screen(0.58, 0.3),
                Joint::world(JointName::LeftHip, -0.15, 1.0, -2.5, 0.9),
                Joint::world(JointName::RightHip, 0.15, 1.0, -2.5, 0.9),
            ],
        )
    }

    #[test]
    fn unsupported_device_refuses_to_start() {
        let mut p = provider(false);
        assert!(!p.capabilities().available);
        assert_eq!(
            p.start(),
            Err(ProviderError::HardwareUnavailable(TrackingMode::Depth3D))
        );
        assert!(!p.is_detecting());
    }

    #[test]
    fn frames_keep_depth() {
        let mut p = provider(true);
        p.start().unwrap();
        let frame = p.ingest(world_torso(0.0)).unwrap();
        assert!(frame.joints.iter().all(|j| j.position.has_depth()));
        // Square shoulders across the camera read 90° in 3D
        assert!((frame.angles.shoulder_rotation.unwrap() - 90.0).abs() < 1e-6);
        assert_eq!(p.alignment_status(), AlignmentStatus::Good);
    }

    #[test]
    fn out_of_bounds_is_too_close() {
        let mut p = provider(true);
        p.start().unwrap();
        p.ingest(world_torso(0.0).with_tracking(TrackingSignal::SubjectOutOfBounds));
        assert_eq!(p.alignment_status(), AlignmentStatus::TooClose);
    }

    #[test]
    fn lost_tracking_clears_pose() {
        let mut p = provider(true);
        p.start().unwrap();
        p.ingest(world_torso(0.0));
        assert!(p.current_pose().is_some());
        assert!(p.ingest(world_torso(0.1).with_tracking(TrackingSignal::Lost)).is_none());
        assert!(p.current_pose().is_none());
        assert_eq!(p.alignment_status(), AlignmentStatus::Searching);
        assert_eq!(p.tracking_signal(), TrackingSignal::Lost);
    }
}
