//! Swing Capture: golf swing capture and multi-sensor fusion
//!
//! Turns per-frame body pose estimates and a wrist wearable's motion stream
//! into per-swing captures with phase markers, body and wearable metrics, and
//! a fused confidence, then summarizes a range session.
//!
//! ## Architecture
//!
//! - **Providers**: camera-only 2D and depth-augmented 3D pose acquisition
//! - **Geometry / Alignment**: joint angles and framing guidance
//! - **Segmentation**: eight-phase swing markers from a frame sequence
//! - **Motion**: wearable buffer, clock sync and interpolation
//! - **Fusion / Metrics**: swing matching, confidence, per-swing and session metrics
//! - **Capture**: session lifecycle, capture windows and the async processing loop

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

pub mod config;
pub mod types;
pub mod geometry;
pub mod alignment;
pub mod providers;
pub mod segmentation;
pub mod motion;
pub mod fusion;
pub mod metrics;
pub mod capture;
pub mod simulation;

// Re-export configuration
pub use config::CaptureConfig;

// Re-export commonly used types
pub use types::{
    AlignmentStatus, CombinedSwingCapture, Joint, JointName, MotionSample, PoseFrame,
    PoseObservation, RangeSession, RawMotionSample, SessionSummary, SwingPhase,
    SwingPhaseMarker, TrackingMode, Vec3,
};

// Re-export the capture surface
pub use capture::{
    CaptureError, CaptureEvent, CaptureOrchestrator, CaptureSource, ChannelSource,
    LoopOutcome, ProcessingLoop, ReplaySource,
};

pub use providers::{DeviceCapabilities, PoseProvider, StaticDeviceCapabilities};
pub use segmentation::PhaseSegmenter;
pub use fusion::SwingMatcher;
