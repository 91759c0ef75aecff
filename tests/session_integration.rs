//! Range Session Integration Tests
//!
//! Drives simulated camera + wearable sessions through the orchestrator
//! synchronously and checks the per-swing captures and session summary.

use std::sync::Arc;

use swing_capture::capture::{CaptureError, CaptureEvent, CaptureOrchestrator};
use swing_capture::config::CaptureConfig;
use swing_capture::providers::{ProviderError, StaticDeviceCapabilities};
use swing_capture::simulation::{SimulationConfig, SwingProfile, SwingSimulator};
use swing_capture::types::{RangeSession, SwingPhase, TrackingMode, WindowClose};

fn simulate(
    mode: TrackingMode,
    profiles: &[SwingProfile],
    swings: usize,
    noise_std: f64,
) -> Vec<CaptureEvent> {
    let simulation = SimulationConfig {
        mode,
        noise_std,
        ..SimulationConfig::default()
    };
    SwingSimulator::new(simulation, CaptureConfig::default().geometry).session(profiles, swings)
}

fn started(mode: TrackingMode) -> CaptureOrchestrator {
    let mut orchestrator = CaptureOrchestrator::new(
        CaptureConfig::default(),
        Arc::new(StaticDeviceCapabilities(true)),
        mode,
    );
    orchestrator.start().unwrap();
    orchestrator
}

fn drive(orchestrator: &mut CaptureOrchestrator, events: Vec<CaptureEvent>) {
    for event in events {
        match event {
            CaptureEvent::Pose(observation) => {
                orchestrator.ingest_pose(observation);
            }
            CaptureEvent::Motion(sample) => {
                orchestrator.ingest_motion(sample);
            }
            CaptureEvent::ClockSync {
                send_time,
                wearable_time,
                round_trip,
            } => {
                orchestrator
                    .record_clock_sync(send_time, wearable_time, round_trip)
                    .unwrap();
            }
            CaptureEvent::BeginSwing { at } => {
                orchestrator.begin_swing(at).unwrap();
            }
            CaptureEvent::FinishSwing { at } => orchestrator.finish_swing(at).unwrap(),
            CaptureEvent::Eof => break,
        }
    }
}

/// Event index of the `n`th (zero-based) swing start.
fn nth_begin(events: &[CaptureEvent], n: usize) -> usize {
    events
        .iter()
        .enumerate()
        .filter(|(_, e)| matches!(e, CaptureEvent::BeginSwing { .. }))
        .nth(n)
        .map(|(i, _)| i)
        .unwrap()
}

fn run_session(
    mode: TrackingMode,
    profiles: &[SwingProfile],
    swings: usize,
    noise_std: f64,
) -> RangeSession {
    let mut orchestrator = started(mode);
    drive(&mut orchestrator, simulate(mode, profiles, swings, noise_std));
    orchestrator.end().unwrap()
}

#[test]
fn identical_swings_are_highly_consistent() {
    let session = run_session(TrackingMode::Camera2D, &[SwingProfile::standard()], 5, 0.0);

    assert_eq!(session.captures.len(), 5);
    assert_eq!(session.summary.swing_count, 5);
    let consistency = session.summary.consistency_score.unwrap();
    assert!(consistency > 70.0, "consistency {consistency:.1} too low");

    let tempos: Vec<f64> = session
        .captures
        .iter()
        .map(|c| c.metrics.tempo_ratio.unwrap())
        .collect();
    let spread = tempos.iter().copied().fold(f64::MIN, f64::max)
        - tempos.iter().copied().fold(f64::MAX, f64::min);
    assert!(spread < 1e-6, "identical swings gave tempos {tempos:?}");
}

#[test]
fn varied_tempos_lower_consistency() {
    let uniform = run_session(TrackingMode::Camera2D, &[SwingProfile::standard()], 5, 0.0);
    let varied = run_session(TrackingMode::Camera2D, &SwingProfile::variations(), 10, 0.0);

    assert_eq!(varied.captures.len(), 10);
    let consistency = varied.summary.consistency_score.unwrap();
    assert!((20.0..=100.0).contains(&consistency));
    assert!(consistency < uniform.summary.consistency_score.unwrap());
    assert!(varied.summary.tempo_variance.unwrap() > 0.0);
}

#[test]
fn every_capture_carries_canonical_markers() {
    let session = run_session(TrackingMode::Camera2D, &SwingProfile::variations(), 5, 0.0);

    for capture in &session.captures {
        assert_eq!(capture.closed_by, WindowClose::Explicit);
        let camera = capture.camera.as_ref().unwrap();
        let phases: Vec<SwingPhase> = camera.markers.iter().map(|m| m.phase).collect();
        assert_eq!(phases, SwingPhase::ALL.to_vec());
        assert!(camera
            .markers
            .windows(2)
            .all(|w| w[0].frame_index <= w[1].frame_index));
        assert!(camera
            .markers
            .windows(2)
            .all(|w| w[0].timestamp <= w[1].timestamp));

        let top = camera.markers.iter().find(|m| m.phase == SwingPhase::TopOfSwing).unwrap();
        let impact = camera.markers.iter().find(|m| m.phase == SwingPhase::Impact).unwrap();
        assert!(top.timestamp < impact.timestamp);
        assert!(camera.metrics.x_factor.unwrap() > 0.0);
    }
}

#[test]
fn camera_and_wearable_swings_are_matched() {
    let session = run_session(TrackingMode::Camera2D, &SwingProfile::variations(), 5, 0.0);

    assert_eq!(session.summary.matched_swings, 5);
    for capture in &session.captures {
        let wearable = capture.wearable.as_ref().unwrap();
        assert!(!wearable.samples.is_empty());
        // Samples arrive in host time despite the wearable clock skew
        assert!(wearable.samples[0].timestamp < capture.closed_at);
        assert!(capture.metrics.sources_matched);
        assert!(capture.metrics.onset_delta_secs.unwrap().abs() < 0.5);
        assert!(capture.metrics.peak_acceleration_g.unwrap() > 5.0);
        assert!((0.0..=1.0).contains(&capture.metrics.combined_confidence));
    }
}

#[test]
fn wearable_before_first_sync_does_not_close_windows() {
    // The wearable clock runs 40 s ahead; hold back every sync until the
    // third swing has begun
    let mut events = simulate(TrackingMode::Camera2D, &[SwingProfile::standard()], 5, 0.0);
    let third = nth_begin(&events, 2);
    let rest = events.split_off(third + 1);
    let (syncs, mut events): (Vec<CaptureEvent>, Vec<CaptureEvent>) = events
        .into_iter()
        .partition(|e| matches!(e, CaptureEvent::ClockSync { .. }));
    // Three at start-up plus one after each of the first two swings
    assert_eq!(syncs.len(), 5);
    events.extend(syncs);
    events.extend(rest);

    let mut orchestrator = started(TrackingMode::Camera2D);
    drive(&mut orchestrator, events);
    let session = orchestrator.end().unwrap();

    assert_eq!(session.captures.len(), 5);
    for capture in &session.captures {
        assert_eq!(capture.closed_by, WindowClose::Explicit);
    }
    // Once synced, the wearable lines up again
    for capture in &session.captures[2..] {
        assert!(capture.metrics.sources_matched);
    }
}

#[test]
fn wearable_restart_keeps_later_swings_matched() {
    let events = simulate(TrackingMode::Camera2D, &SwingProfile::variations(), 5, 0.0);
    let third = nth_begin(&events, 2);

    // The wearable reboots before the third swing and numbers from zero again
    let mut renumbered = 0;
    let events: Vec<CaptureEvent> = events
        .into_iter()
        .enumerate()
        .map(|(i, event)| match event {
            CaptureEvent::Motion(mut sample) if i > third => {
                sample.sequence = renumbered;
                renumbered += 1;
                CaptureEvent::Motion(sample)
            }
            other => other,
        })
        .collect();

    let mut orchestrator = started(TrackingMode::Camera2D);
    drive(&mut orchestrator, events);
    assert_eq!(orchestrator.wearable().buffer().restarts(), 1);
    let session = orchestrator.end().unwrap();

    assert_eq!(session.captures.len(), 5);
    assert_eq!(session.summary.matched_swings, 5);
    for capture in &session.captures {
        assert!(!capture.wearable.as_ref().unwrap().samples.is_empty());
    }
}

#[test]
fn depth_mode_session_produces_captures() {
    let session = run_session(TrackingMode::Depth3D, &[SwingProfile::standard()], 3, 0.0);

    assert_eq!(session.tracking_mode, TrackingMode::Depth3D);
    assert_eq!(session.captures.len(), 3);
    for capture in &session.captures {
        let camera = capture.camera.as_ref().unwrap();
        assert!(camera.frames.iter().all(|f| f.joints.len() == 91));
        assert_eq!(camera.markers.len(), SwingPhase::ALL.len());
    }
}

#[test]
fn noisy_session_still_summarizes() {
    let session = run_session(TrackingMode::Camera2D, &SwingProfile::variations(), 5, 0.003);
    assert_eq!(session.captures.len(), 5);
    assert!(session.summary.consistency_score.is_some());
    assert!(session.summary.average_combined_confidence.unwrap() > 0.0);
}

#[test]
fn depth_session_fails_on_unsupported_device() {
    let mut orchestrator = CaptureOrchestrator::new(
        CaptureConfig::default(),
        Arc::new(StaticDeviceCapabilities(false)),
        TrackingMode::Depth3D,
    );
    let err = orchestrator.start().unwrap_err();
    assert!(matches!(
        err,
        CaptureError::Provider(ProviderError::HardwareUnavailable(TrackingMode::Depth3D))
    ));
    assert!(!orchestrator.is_active());
}
