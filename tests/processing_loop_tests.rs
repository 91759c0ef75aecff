//! Processing Loop Tests
//!
//! Async tests for the event loop: replayed sessions, live channel
//! producers, cancellation, and live update delivery.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use swing_capture::capture::{
    CaptureEvent, CaptureOrchestrator, ChannelSource, ProcessingLoop, ReplaySource,
};
use swing_capture::config::CaptureConfig;
use swing_capture::providers::StaticDeviceCapabilities;
use swing_capture::simulation::{SimulationConfig, SwingProfile, SwingSimulator};
use swing_capture::types::{AlignmentStatus, TrackingMode};

fn orchestrator() -> CaptureOrchestrator {
    CaptureOrchestrator::new(
        CaptureConfig::default(),
        Arc::new(StaticDeviceCapabilities(false)),
        TrackingMode::Camera2D,
    )
}

fn simulated_events(swings: usize) -> Vec<CaptureEvent> {
    SwingSimulator::new(SimulationConfig::default(), CaptureConfig::default().geometry)
        .session(&SwingProfile::variations(), swings)
}

#[tokio::test]
async fn replay_session_runs_to_completion() {
    let events = simulated_events(3);
    let poses = events
        .iter()
        .filter(|e| matches!(e, CaptureEvent::Pose(_)))
        .count() as u64;

    let mut source = ReplaySource::new(events, 0);
    let outcome = ProcessingLoop::new(orchestrator(), CancellationToken::new())
        .run(&mut source)
        .await
        .unwrap();

    assert!(!outcome.cancelled);
    assert_eq!(outcome.stats.poses, poses);
    assert_eq!(outcome.stats.frames, poses);
    assert_eq!(outcome.stats.swings_begun, 3);
    assert_eq!(outcome.stats.rejected_events, 0);
    assert_eq!(outcome.session.captures.len(), 3);
    assert_eq!(outcome.session.summary.matched_swings, 3);
}

#[tokio::test]
async fn stray_finish_is_counted_as_rejected() {
    let mut source = ReplaySource::new(vec![CaptureEvent::FinishSwing { at: 1.0 }], 0);
    let outcome = ProcessingLoop::new(orchestrator(), CancellationToken::new())
        .run(&mut source)
        .await
        .unwrap();

    assert_eq!(outcome.stats.rejected_events, 1);
    assert!(outcome.session.captures.is_empty());
}

#[tokio::test]
async fn cancellation_finalizes_open_window() {
    let (mut source, camera, wearable) = ChannelSource::new(1024);
    let cancel = CancellationToken::new();
    let processing = ProcessingLoop::new(orchestrator(), cancel.clone());

    let handle = tokio::spawn(async move { processing.run(&mut source).await });

    // Feed the first swing without finishing it
    for event in simulated_events(1) {
        match event {
            CaptureEvent::Pose(observation) => assert!(camera.push_pose(observation)),
            CaptureEvent::Motion(sample) => assert!(wearable.push_motion(sample)),
            CaptureEvent::ClockSync {
                send_time,
                wearable_time,
                round_trip,
            } => assert!(wearable.clock_sync(send_time, wearable_time, round_trip)),
            CaptureEvent::BeginSwing { at } => assert!(camera.begin_swing(at)),
            CaptureEvent::FinishSwing { .. } => break,
            CaptureEvent::Eof => break,
        }
        tokio::task::yield_now().await;
    }

    // Let the loop drain, then cancel while the producers are still open
    tokio::time::sleep(Duration::from_millis(50)).await;
    cancel.cancel();

    let outcome = handle.await.unwrap().unwrap();
    assert!(outcome.cancelled);
    assert_eq!(outcome.session.captures.len(), 1);
    assert_eq!(
        outcome.session.captures[0].closed_by,
        swing_capture::types::WindowClose::SessionEnd
    );
    drop((camera, wearable));
}

#[tokio::test]
async fn dropping_producers_ends_the_loop() {
    let (mut source, camera, wearable) = ChannelSource::new(16);
    drop(camera);
    drop(wearable);

    let outcome = ProcessingLoop::new(orchestrator(), CancellationToken::new())
        .run(&mut source)
        .await
        .unwrap();
    assert!(!outcome.cancelled);
    assert!(outcome.session.captures.is_empty());
}

#[tokio::test]
async fn live_updates_reach_subscribers() {
    let processing = ProcessingLoop::new(orchestrator(), CancellationToken::new());
    let mut updates = processing.orchestrator().subscribe();

    let events: Vec<CaptureEvent> = simulated_events(1)
        .into_iter()
        .filter(|e| matches!(e, CaptureEvent::Pose(_)))
        .take(5)
        .collect();
    let mut source = ReplaySource::new(events, 0);
    processing.run(&mut source).await.unwrap();

    let update = updates.recv().await.unwrap();
    assert_eq!(update.mode, TrackingMode::Camera2D);
    assert_eq!(update.status, AlignmentStatus::Good);
    assert!(update.frame.is_some());
}
