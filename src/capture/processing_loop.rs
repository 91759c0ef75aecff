//! Async driver feeding a capture source into the orchestrator.

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::source::{CaptureEvent, CaptureSource};
use super::{CaptureError, CaptureOrchestrator};
use crate::types::RangeSession;

/// Event counters for one loop run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoopStats {
    pub poses: u64,
    pub frames: u64,
    pub motion_samples: u64,
    pub motion_dropped: u64,
    pub clock_syncs: u64,
    pub swings_begun: u64,
    /// Events the orchestrator refused (e.g. finish without an open window)
    pub rejected_events: u64,
}

#[derive(Debug, Clone)]
pub struct LoopOutcome {
    pub session: RangeSession,
    pub stats: LoopStats,
    /// True when the loop stopped on cancellation rather than end of data
    pub cancelled: bool,
}

/// Owns the orchestrator for the duration of one range session.
///
/// Built with [`new()`](ProcessingLoop::new), then consumed by
/// [`run()`](ProcessingLoop::run).
pub struct ProcessingLoop {
    orchestrator: CaptureOrchestrator,
    cancel_token: CancellationToken,
}

impl ProcessingLoop {
    pub fn new(orchestrator: CaptureOrchestrator, cancel_token: CancellationToken) -> Self {
        Self {
            orchestrator,
            cancel_token,
        }
    }

    /// Subscribe to live updates before the loop takes over.
    pub fn orchestrator(&self) -> &CaptureOrchestrator {
        &self.orchestrator
    }

    /// Run until the source is exhausted, fails, or cancellation.
    ///
    /// Starts a session if none is active and always ends it, so every
    /// window opened during the run is finalized into the returned session.
    pub async fn run<S: CaptureSource + ?Sized>(mut self, source: &mut S) -> Result<LoopOutcome, CaptureError> {
        if !self.orchestrator.is_active() {
            self.orchestrator.start()?;
        }
        let mut stats = LoopStats::default();
        let mut cancelled = false;

        info!(source = source.source_name(), mode = %self.orchestrator.mode(), "Processing capture events");

        loop {
            let event = tokio::select! {
                () = self.cancel_token.cancelled() => {
                    info!("Shutdown signal received");
                    cancelled = true;
                    break;
                }
                result = source.next_event() => {
                    match result {
                        Ok(event) => event,
                        Err(e) => {
                            warn!(error = %e, "Capture source error");
                            break;
                        }
                    }
                }
            };

            if !self.dispatch(event, &mut stats) {
                info!(
                    poses = stats.poses,
                    motion = stats.motion_samples,
                    "Capture source reached end"
                );
                break;
            }
        }

        let session = self.orchestrator.end()?;
        Ok(LoopOutcome {
            session,
            stats,
            cancelled,
        })
    }

    /// Apply one event. Returns `false` at end of data.
    fn dispatch(&mut self, event: CaptureEvent, stats: &mut LoopStats) -> bool {
        let result = match event {
            CaptureEvent::Pose(observation) => {
                stats.poses += 1;
                if self.orchestrator.ingest_pose(observation).is_some() {
                    stats.frames += 1;
                }
                Ok(())
            }
            CaptureEvent::Motion(sample) => {
                stats.motion_samples += 1;
                if !self.orchestrator.ingest_motion(sample) {
                    stats.motion_dropped += 1;
                }
                Ok(())
            }
            CaptureEvent::ClockSync {
                send_time,
                wearable_time,
                round_trip,
            } => {
                stats.clock_syncs += 1;
                self.orchestrator
                    .record_clock_sync(send_time, wearable_time, round_trip)
                    .map(|_| ())
            }
            CaptureEvent::BeginSwing { at } => {
                stats.swings_begun += 1;
                self.orchestrator.begin_swing(at).map(|_| ())
            }
            CaptureEvent::FinishSwing { at } => self.orchestrator.finish_swing(at),
            CaptureEvent::Eof => return false,
        };

        if let Err(e) = result {
            stats.rejected_events += 1;
            warn!(error = %e, "Capture event rejected");
        }
        true
    }
}
