//! Capture orchestrator: owns both providers, the wearable stream, and the
//! active range session.
//!
//! ## Window lifecycle
//!
//! 1. `begin_swing` opens a window; pose frames are appended as they arrive
//! 2. `finish_swing`, a timeout, or `end` closes it into a pending capture
//! 3. The pending capture waits until wearable data covers the window end
//!    (or the grace period passes), then is finalized: segmentation,
//!    metrics, and matching run once over the complete window
//!
//! Ingestion only appends; all expensive work happens at finalize time.

use std::collections::VecDeque;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::CaptureError;
use crate::alignment::AlignmentClassifier;
use crate::config::CaptureConfig;
use crate::fusion::SwingMatcher;
use crate::metrics::{combine, compute_body_metrics, compute_wearable_metrics, summarize};
use crate::motion::WearableStream;
use crate::providers::{
    CameraPoseProvider, DepthPoseProvider, DeviceCapabilities, LiveUpdate, PoseProvider,
};
use crate::segmentation::PhaseSegmenter;
use crate::types::{
    marker_for, CameraCapture, CombinedSwingCapture, PoseFrame, PoseObservation, RangeSession,
    RawMotionSample, SwingPhase, TrackingMode, WearableCapture, WindowClose,
};

/// An open capture window collecting frames.
#[derive(Debug)]
struct CaptureWindow {
    swing_number: u32,
    opened_at: f64,
    frames: Vec<PoseFrame>,
}

/// A closed window waiting for late wearable samples.
#[derive(Debug)]
struct PendingCapture {
    swing_number: u32,
    opened_at: f64,
    closed_at: f64,
    closed_by: WindowClose,
    frames: Vec<PoseFrame>,
}

#[derive(Debug)]
struct ActiveSession {
    id: Uuid,
    mode: TrackingMode,
    started_at: DateTime<Utc>,
    captures: Vec<CombinedSwingCapture>,
    window: Option<CaptureWindow>,
    pending: VecDeque<PendingCapture>,
    swings_opened: u32,
}

pub struct CaptureOrchestrator {
    config: CaptureConfig,
    mode: TrackingMode,
    camera: Box<dyn PoseProvider>,
    depth: Box<dyn PoseProvider>,
    live_tx: broadcast::Sender<LiveUpdate>,
    wearable: WearableStream,
    segmenter: PhaseSegmenter,
    matcher: SwingMatcher,
    session: Option<ActiveSession>,
}

impl CaptureOrchestrator {
    pub fn new(config: CaptureConfig, device: Arc<dyn DeviceCapabilities>, mode: TrackingMode) -> Self {
        let (live_tx, _) = broadcast::channel(config.capture.live_channel_capacity.max(1));
        let classifier = AlignmentClassifier::new(config.alignment.clone());
        let camera = CameraPoseProvider::new(config.geometry.clone(), classifier.clone(), live_tx.clone());
        let depth = DepthPoseProvider::new(config.geometry.clone(), classifier, live_tx.clone(), device);
        Self::with_providers(config, Box::new(camera), Box::new(depth), live_tx, mode)
    }

    /// Build around caller-supplied providers (e.g. a platform detector binding).
    pub fn with_providers(
        config: CaptureConfig,
        camera: Box<dyn PoseProvider>,
        depth: Box<dyn PoseProvider>,
        live_tx: broadcast::Sender<LiveUpdate>,
        mode: TrackingMode,
    ) -> Self {
        Self {
            wearable: WearableStream::new(&config.wearable),
            segmenter: PhaseSegmenter::new(config.segmentation.clone()),
            matcher: SwingMatcher::new(config.fusion.clone()),
            config,
            mode,
            camera,
            depth,
            live_tx,
            session: None,
        }
    }

    // ========================================================================
    // Mode and providers
    // ========================================================================

    pub fn mode(&self) -> TrackingMode {
        self.mode
    }

    /// Select the provider used by the next `start()`. Never starts or stops capture.
    pub fn set_mode(&mut self, mode: TrackingMode) {
        if mode != self.mode {
            info!(from = %self.mode, to = %mode, "Tracking mode changed");
            self.mode = mode;
        }
    }

    pub fn provider(&self, mode: TrackingMode) -> &dyn PoseProvider {
        match mode {
            TrackingMode::Camera2D => self.camera.as_ref(),
            TrackingMode::Depth3D => self.depth.as_ref(),
        }
    }

    fn provider_mut(&mut self, mode: TrackingMode) -> &mut dyn PoseProvider {
        match mode {
            TrackingMode::Camera2D => self.camera.as_mut(),
            TrackingMode::Depth3D => self.depth.as_mut(),
        }
    }

    /// Live pose and alignment updates from whichever provider is active.
    pub fn subscribe(&self) -> broadcast::Receiver<LiveUpdate> {
        self.live_tx.subscribe()
    }

    pub fn wearable(&self) -> &WearableStream {
        &self.wearable
    }

    pub fn config(&self) -> &CaptureConfig {
        &self.config
    }

    // ========================================================================
    // Session lifecycle
    // ========================================================================

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    pub fn session_id(&self) -> Option<Uuid> {
        self.session.as_ref().map(|s| s.id)
    }

    /// Captures finalized so far in the active session.
    pub fn captures(&self) -> &[CombinedSwingCapture] {
        match &self.session {
            Some(session) => &session.captures,
            None => &[],
        }
    }

    /// Start a range session on the current mode's provider.
    ///
    /// Fails without creating a session when the provider's hardware is
    /// unavailable. Buffered wearable samples are dropped; the clock offset
    /// is kept.
    pub fn start(&mut self) -> Result<Uuid, CaptureError> {
        if self.session.is_some() {
            return Err(CaptureError::AlreadyActive);
        }
        let mode = self.mode;
        let other = match mode {
            TrackingMode::Camera2D => TrackingMode::Depth3D,
            TrackingMode::Depth3D => TrackingMode::Camera2D,
        };
        self.provider_mut(other).stop();
        self.provider_mut(mode).start()?;
        self.wearable.clear();

        let id = Uuid::new_v4();
        self.session = Some(ActiveSession {
            id,
            mode,
            started_at: Utc::now(),
            captures: Vec::new(),
            window: None,
            pending: VecDeque::new(),
            swings_opened: 0,
        });
        info!(session = %id, mode = %mode, "Range session started");
        Ok(id)
    }

    /// Stop detection on both providers. Session data is kept until `end()`.
    pub fn stop(&mut self) {
        self.camera.stop();
        self.depth.stop();
        debug!("Pose detection stopped");
    }

    /// End the active session: close any open window, finalize every
    /// pending capture, summarize, and stop both providers.
    pub fn end(&mut self) -> Result<RangeSession, CaptureError> {
        let Some(session) = self.session.as_mut() else {
            return Err(CaptureError::NoActiveSession);
        };
        if let Some(window) = session.window.take() {
            let closed_at = window.frames.last().map_or(window.opened_at, |f| f.timestamp);
            session.pending.push_back(close_window(window, closed_at, WindowClose::SessionEnd));
        }
        let pending: Vec<PendingCapture> = session.pending.drain(..).collect();
        for capture in pending {
            self.finalize(capture);
        }
        self.stop();

        let Some(session) = self.session.take() else {
            return Err(CaptureError::NoActiveSession);
        };
        let summary = summarize(&session.captures, &self.config.metrics);
        info!(
            session = %session.id,
            swings = session.captures.len(),
            wearable_dropped = self.wearable.dropped(),
            wearable_gaps = self.wearable.gaps(),
            wearable_restarts = self.wearable.buffer().restarts(),
            "Range session ended"
        );
        Ok(RangeSession {
            id: session.id,
            tracking_mode: session.mode,
            started_at: session.started_at,
            ended_at: Utc::now(),
            captures: session.captures,
            summary,
        })
    }

    // ========================================================================
    // Capture windows
    // ========================================================================

    /// Open a capture window at host time `at`, closing any open one first.
    pub fn begin_swing(&mut self, at: f64) -> Result<u32, CaptureError> {
        let session = self.session.as_mut().ok_or(CaptureError::NoActiveSession)?;
        if let Some(window) = session.window.take() {
            warn!(swing = window.swing_number, "Swing begun while a window was open, closing it");
            session.pending.push_back(close_window(window, at, WindowClose::Explicit));
        }
        session.swings_opened += 1;
        let swing_number = session.swings_opened;
        session.window = Some(CaptureWindow {
            swing_number,
            opened_at: at,
            frames: Vec::new(),
        });
        debug!(swing = swing_number, at, "Capture window opened");
        self.poll_pending(at);
        Ok(swing_number)
    }

    /// Close the open window at host time `at`.
    pub fn finish_swing(&mut self, at: f64) -> Result<(), CaptureError> {
        let session = self.session.as_mut().ok_or(CaptureError::NoActiveSession)?;
        let window = session.window.take().ok_or(CaptureError::NoOpenWindow)?;
        debug!(swing = window.swing_number, at, frames = window.frames.len(), "Capture window closed");
        session.pending.push_back(close_window(window, at, WindowClose::Explicit));
        self.poll_pending(at);
        Ok(())
    }

    /// Close the open window if it has exceeded the maximum duration.
    fn check_timeout(&mut self, now: f64) {
        let max = self.config.capture.max_window_secs;
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let expired = session.window.as_ref().is_some_and(|w| now - w.opened_at > max);
        if !expired {
            return;
        }
        if let Some(window) = session.window.take() {
            let closed_at = window.opened_at + max;
            warn!(swing = window.swing_number, max_window_secs = max, "Capture window timed out");
            session.pending.push_back(close_window(window, closed_at, WindowClose::Timeout));
        }
    }

    // ========================================================================
    // Ingestion
    // ========================================================================

    /// Route a detector observation to the active provider.
    pub fn ingest_pose(&mut self, observation: PoseObservation) -> Option<PoseFrame> {
        let now = observation.timestamp;
        let mode = self.session.as_ref()?.mode;
        self.check_timeout(now);
        let frame = self.provider_mut(mode).ingest(observation);
        if let (Some(frame), Some(window)) = (
            frame.as_ref(),
            self.session.as_mut().and_then(|s| s.window.as_mut()),
        ) {
            window.frames.push(frame.clone());
        }
        self.poll_pending(now);
        frame
    }

    /// Append a wearable sample. Returns `false` when the buffer dropped it.
    ///
    /// Wearable time only advances window timeouts and finalization once the
    /// clock offset is established; before that, pose time alone drives them.
    pub fn ingest_motion(&mut self, sample: RawMotionSample) -> bool {
        let accepted = self.wearable.push(sample);
        if self.session.is_some() && self.wearable.clock().is_established() {
            let now = self.wearable.clock().to_host(sample.local_timestamp);
            self.check_timeout(now);
            self.poll_pending(now);
        }
        accepted
    }

    /// Apply one clock sync round trip. Rejections keep the previous offset.
    pub fn record_clock_sync(
        &mut self,
        send_time: f64,
        wearable_time: f64,
        round_trip: f64,
    ) -> Result<f64, CaptureError> {
        Ok(self.wearable.record_round_trip(send_time, wearable_time, round_trip)?)
    }

    // ========================================================================
    // Finalize
    // ========================================================================

    fn poll_pending(&mut self, now: f64) {
        let grace = self.config.capture.wearable_grace_secs;
        loop {
            let latest = self
                .wearable
                .clock()
                .is_established()
                .then(|| self.wearable.latest_host_time())
                .flatten();
            let Some(session) = self.session.as_mut() else {
                return;
            };
            let ready = session.pending.front().is_some_and(|p| {
                latest.is_some_and(|t| t >= p.closed_at) || now >= p.closed_at + grace
            });
            if !ready {
                return;
            }
            let Some(pending) = session.pending.pop_front() else {
                return;
            };
            self.finalize(pending);
        }
    }

    fn finalize(&mut self, pending: PendingCapture) {
        let capture = self.build_capture(pending);
        info!(
            swing = capture.swing_number,
            closed_by = ?capture.closed_by,
            tempo = ?capture.metrics.tempo_ratio,
            matched = capture.metrics.sources_matched,
            confidence = capture.metrics.combined_confidence,
            "Swing captured"
        );
        self.wearable
            .trim_before(capture.closed_at - self.config.capture.pre_roll_secs);
        if let Some(session) = self.session.as_mut() {
            session.captures.push(capture);
        }
    }

    fn build_capture(&self, pending: PendingCapture) -> CombinedSwingCapture {
        let camera = (!pending.frames.is_empty()).then(|| {
            let markers = self.segmenter.segment(&pending.frames);
            let metrics = compute_body_metrics(&pending.frames, &markers, &self.config.metrics);
            let onset = marker_for(&markers, SwingPhase::Takeaway).map(|m| m.timestamp);
            let confidence =
                pending.frames.iter().map(|f| f.confidence).sum::<f64>() / pending.frames.len() as f64;
            CameraCapture {
                frames: pending.frames,
                markers,
                metrics,
                onset,
                confidence,
            }
        });

        let samples = self
            .wearable
            .range(pending.opened_at - self.config.capture.pre_roll_secs, pending.closed_at);
        let wearable = (!samples.is_empty()).then(|| WearableCapture {
            metrics: compute_wearable_metrics(&samples, self.config.wearable.onset_threshold_g),
            samples,
        });

        let verdict = self.matcher.evaluate(camera.as_ref(), wearable.as_ref());
        let metrics = combine(
            camera.as_ref().map(|c| &c.metrics),
            wearable.as_ref().map(|w| &w.metrics),
            &verdict,
        );

        CombinedSwingCapture {
            id: Uuid::new_v4(),
            swing_number: pending.swing_number,
            opened_at: pending.opened_at,
            closed_at: pending.closed_at,
            closed_by: pending.closed_by,
            camera,
            wearable,
            metrics,
        }
    }
}

/// Close a window, keeping only frames up to the close time.
fn close_window(window: CaptureWindow, closed_at: f64, closed_by: WindowClose) -> PendingCapture {
    let frames = window
        .frames
        .into_iter()
        .filter(|f| f.timestamp <= closed_at)
        .collect();
    PendingCapture {
        swing_number: window.swing_number,
        opened_at: window.opened_at,
        closed_at,
        closed_by,
        frames,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::providers::{ProviderError, StaticDeviceCapabilities};
    use crate::types::{AlignmentStatus, Joint, JointName, Vec3};

    fn orchestrator(depth_supported: bool, mode: TrackingMode) -> CaptureOrchestrator {
        CaptureOrchestrator::new(
            CaptureConfig::default(),
            Arc::new(StaticDeviceCapabilities(depth_supported)),
            mode,
        )
    }

    fn observation(t: f64, shoulder_width: f64) -> PoseObservation {
        PoseObservation::new(
            t,
            vec![
                Joint::image(JointName::LeftShoulder, 0.5 - shoulder_width / 2.0, 0.35, 0.9),
                Joint::image(JointName::RightShoulder, 0.5 + shoulder_width / 2.0, 0.35, 0.9),
                Joint::image(JointName::LeftHip, 0.41, 0.6, 0.9),
                Joint::image(JointName::RightHip, 0.59, 0.6, 0.9),
            ],
        )
    }

    fn motion(local: f64, seq: u64, ax: f64) -> RawMotionSample {
        RawMotionSample {
            local_timestamp: local,
            sequence: seq,
            acceleration: Vec3::new(ax, -1.0, 0.0),
            rotation_rate: Vec3::ZERO,
        }
    }

    #[test]
    fn unsupported_depth_start_fails_without_session() {
        let mut o = orchestrator(false, TrackingMode::Depth3D);
        let err = o.start().unwrap_err();
        assert!(matches!(
            err,
            CaptureError::Provider(ProviderError::HardwareUnavailable(TrackingMode::Depth3D))
        ));
        assert!(!o.is_active());
        assert!(!o.provider(TrackingMode::Depth3D).is_detecting());
    }

    #[test]
    fn set_mode_does_not_start_or_stop() {
        let mut o = orchestrator(true, TrackingMode::Camera2D);
        o.start().unwrap();
        o.set_mode(TrackingMode::Depth3D);
        assert!(o.provider(TrackingMode::Camera2D).is_detecting());
        assert!(!o.provider(TrackingMode::Depth3D).is_detecting());
        assert!(matches!(o.start(), Err(CaptureError::AlreadyActive)));
    }

    #[test]
    fn stop_deactivates_both_providers() {
        let mut o = orchestrator(true, TrackingMode::Depth3D);
        o.start().unwrap();
        assert!(o.provider(TrackingMode::Depth3D).is_detecting());
        o.stop();
        assert!(!o.provider(TrackingMode::Camera2D).is_detecting());
        assert!(!o.provider(TrackingMode::Depth3D).is_detecting());
    }

    #[test]
    fn window_without_frames_or_samples_still_finalizes() {
        let mut o = orchestrator(false, TrackingMode::Camera2D);
        o.start().unwrap();
        o.begin_swing(1.0).unwrap();
        let session = o.end().unwrap();
        assert_eq!(session.captures.len(), 1);
        let capture = &session.captures[0];
        assert_eq!(capture.closed_by, WindowClose::SessionEnd);
        assert!(capture.camera.is_none());
        assert!(capture.wearable.is_none());
        assert!(capture.metrics.tempo_ratio.is_none());
        assert!(session.summary.average_tempo.is_none());
        assert!(!o.provider(TrackingMode::Camera2D).is_detecting());
    }

    #[test]
    fn finish_without_window_is_an_error() {
        let mut o = orchestrator(false, TrackingMode::Camera2D);
        assert!(matches!(o.finish_swing(0.0), Err(CaptureError::NoActiveSession)));
        o.start().unwrap();
        assert!(matches!(o.finish_swing(0.0), Err(CaptureError::NoOpenWindow)));
    }

    #[test]
    fn frames_outside_windows_are_not_captured() {
        let mut o = orchestrator(false, TrackingMode::Camera2D);
        o.start().unwrap();
        o.ingest_pose(observation(0.0, 0.25));
        o.begin_swing(1.0).unwrap();
        for i in 0..10 {
            o.ingest_pose(observation(1.0 + f64::from(i) * 0.1, 0.25 - f64::from(i) * 0.02));
        }
        o.finish_swing(2.0).unwrap();
        o.ingest_pose(observation(2.5, 0.25));
        // Grace period passed without wearable data
        o.ingest_pose(observation(2.6, 0.25));
        assert_eq!(o.captures().len(), 1);
        let camera = o.captures()[0].camera.as_ref().unwrap();
        assert_eq!(camera.frames.len(), 10);
        assert_eq!(camera.markers.len(), 8);
        assert_eq!(o.provider(TrackingMode::Camera2D).alignment_status(), AlignmentStatus::Good);
    }

    #[test]
    fn window_times_out() {
        let mut o = orchestrator(false, TrackingMode::Camera2D);
        o.start().unwrap();
        o.begin_swing(0.0).unwrap();
        o.ingest_pose(observation(1.0, 0.25));
        o.ingest_pose(observation(7.0, 0.2));
        let session = o.end().unwrap();
        assert_eq!(session.captures.len(), 1);
        let capture = &session.captures[0];
        assert_eq!(capture.closed_by, WindowClose::Timeout);
        assert_eq!(capture.closed_at, 6.0);
        assert_eq!(capture.camera.as_ref().unwrap().frames.len(), 1);
    }

    #[test]
    fn pending_capture_waits_for_wearable() {
        let mut o = orchestrator(false, TrackingMode::Camera2D);
        o.start().unwrap();
        o.record_clock_sync(0.0, 0.01, 0.02).unwrap();
        o.begin_swing(0.0).unwrap();
        for i in 0u32..5 {
            o.ingest_motion(motion(f64::from(i) * 0.1, u64::from(i), 0.0));
        }
        o.finish_swing(1.0).unwrap();
        assert!(o.captures().is_empty());
        // Wearable catches up to the window end
        o.ingest_motion(motion(1.0, 10, 0.0));
        assert_eq!(o.captures().len(), 1);
        assert_eq!(o.captures()[0].wearable.as_ref().unwrap().samples.len(), 6);
    }

    #[test]
    fn unsynced_wearable_time_does_not_close_windows() {
        let mut o = orchestrator(false, TrackingMode::Camera2D);
        o.start().unwrap();
        o.begin_swing(10.0).unwrap();
        // Wearable clock 100 s ahead, no sync yet
        assert!(o.ingest_motion(motion(110.0, 0, 0.0)));
        o.finish_swing(11.5).unwrap();
        assert!(o.captures().is_empty());

        let session = o.end().unwrap();
        let capture = &session.captures[0];
        assert_eq!(capture.closed_by, WindowClose::Explicit);
        assert_eq!(capture.closed_at, 11.5);
    }

    #[test]
    fn begin_closes_open_window() {
        let mut o = orchestrator(false, TrackingMode::Camera2D);
        o.start().unwrap();
        assert_eq!(o.begin_swing(0.0).unwrap(), 1);
        assert_eq!(o.begin_swing(3.0).unwrap(), 2);
        let session = o.end().unwrap();
        assert_eq!(session.captures.len(), 2);
        assert_eq!(session.captures[0].closed_at, 3.0);
        assert_eq!(session.captures[1].swing_number, 2);
    }

    #[test]
    fn clock_sync_rejection_surfaces_as_error() {
        let mut o = orchestrator(false, TrackingMode::Camera2D);
        assert!(o.record_clock_sync(0.0, 0.1, 0.02).is_ok());
        assert!(matches!(
            o.record_clock_sync(0.0, 0.1, 2.0),
            Err(CaptureError::ClockSync(_))
        ));
        assert!(o.wearable().clock().is_established());
    }
}
