//! Capture event sources.
//!
//! Provides a unified trait for feeding capture events to the processing
//! loop: pre-recorded replays and live camera/wearable channels.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::trace;

use crate::config::defaults::CHANNEL_SOURCE_CAPACITY;
use crate::types::{PoseObservation, RawMotionSample};

/// Events produced by a capture source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum CaptureEvent {
    /// A pose detector observation (host time)
    Pose(PoseObservation),
    /// A wearable sample (wearable-local time)
    Motion(RawMotionSample),
    /// One clock sync round trip
    ClockSync {
        send_time: f64,
        wearable_time: f64,
        round_trip: f64,
    },
    /// Open a capture window (host time)
    BeginSwing { at: f64 },
    /// Close the open capture window (host time)
    FinishSwing { at: f64 },
    /// Source reached end of data
    Eof,
}

/// Trait abstracting where capture events come from.
///
/// The processing loop calls [`next_event`](CaptureSource::next_event) in a
/// `select!` with cancellation.
#[async_trait]
pub trait CaptureSource: Send {
    /// Returns `CaptureEvent::Eof` when no more data is available.
    async fn next_event(&mut self) -> Result<CaptureEvent>;

    /// Human-readable name for logging.
    fn source_name(&self) -> &str;
}

// ============================================================================
// Replay Source
// ============================================================================

/// Replays pre-recorded events with optional inter-event delay.
pub struct ReplaySource {
    events: std::vec::IntoIter<CaptureEvent>,
    delay_ms: u64,
    yielded_first: bool,
}

impl ReplaySource {
    pub fn new(events: Vec<CaptureEvent>, delay_ms: u64) -> Self {
        Self {
            events: events.into_iter(),
            delay_ms,
            yielded_first: false,
        }
    }
}

#[async_trait]
impl CaptureSource for ReplaySource {
    async fn next_event(&mut self) -> Result<CaptureEvent> {
        if self.yielded_first && self.delay_ms > 0 {
            tokio::time::sleep(tokio::time::Duration::from_millis(self.delay_ms)).await;
        }
        match self.events.next() {
            Some(event) => {
                self.yielded_first = true;
                Ok(event)
            }
            None => Ok(CaptureEvent::Eof),
        }
    }

    fn source_name(&self) -> &str {
        "replay"
    }
}

// ============================================================================
// Channel Source (live producers)
// ============================================================================

/// Producer handle for the camera side. Never blocks: a full channel drops
/// the event and reports `false`.
#[derive(Debug, Clone)]
pub struct CameraHandle {
    tx: mpsc::Sender<CaptureEvent>,
}

impl CameraHandle {
    pub fn push_pose(&self, observation: PoseObservation) -> bool {
        try_push(&self.tx, CaptureEvent::Pose(observation))
    }

    pub fn begin_swing(&self, at: f64) -> bool {
        try_push(&self.tx, CaptureEvent::BeginSwing { at })
    }

    pub fn finish_swing(&self, at: f64) -> bool {
        try_push(&self.tx, CaptureEvent::FinishSwing { at })
    }
}

/// Producer handle for the wearable side. Never blocks.
#[derive(Debug, Clone)]
pub struct WearableHandle {
    tx: mpsc::Sender<CaptureEvent>,
}

impl WearableHandle {
    pub fn push_motion(&self, sample: RawMotionSample) -> bool {
        try_push(&self.tx, CaptureEvent::Motion(sample))
    }

    pub fn clock_sync(&self, send_time: f64, wearable_time: f64, round_trip: f64) -> bool {
        try_push(
            &self.tx,
            CaptureEvent::ClockSync {
                send_time,
                wearable_time,
                round_trip,
            },
        )
    }
}

fn try_push(tx: &mpsc::Sender<CaptureEvent>, event: CaptureEvent) -> bool {
    match tx.try_send(event) {
        Ok(()) => true,
        Err(e) => {
            trace!(error = %e, "Capture event dropped");
            false
        }
    }
}

/// Merges the camera and wearable producers into one event stream.
///
/// Camera events are preferred when both are ready, so swing boundaries stay
/// ordered with the frames around them. Yields `Eof` once every handle of
/// both sides has been dropped and the channels are drained.
pub struct ChannelSource {
    camera_rx: mpsc::Receiver<CaptureEvent>,
    wearable_rx: mpsc::Receiver<CaptureEvent>,
    camera_open: bool,
    wearable_open: bool,
}

impl ChannelSource {
    /// Channels hold `capacity` events per side; 0 selects the default depth.
    pub fn new(capacity: usize) -> (Self, CameraHandle, WearableHandle) {
        let capacity = if capacity == 0 { CHANNEL_SOURCE_CAPACITY } else { capacity };
        let (camera_tx, camera_rx) = mpsc::channel(capacity);
        let (wearable_tx, wearable_rx) = mpsc::channel(capacity);
        (
            Self {
                camera_rx,
                wearable_rx,
                camera_open: true,
                wearable_open: true,
            },
            CameraHandle { tx: camera_tx },
            WearableHandle { tx: wearable_tx },
        )
    }
}

#[async_trait]
impl CaptureSource for ChannelSource {
    async fn next_event(&mut self) -> Result<CaptureEvent> {
        loop {
            if !self.camera_open && !self.wearable_open {
                return Ok(CaptureEvent::Eof);
            }
            tokio::select! {
                biased;
                event = self.camera_rx.recv(), if self.camera_open => match event {
                    Some(event) => return Ok(event),
                    None => self.camera_open = false,
                },
                event = self.wearable_rx.recv(), if self.wearable_open => match event {
                    Some(event) => return Ok(event),
                    None => self.wearable_open = false,
                },
            }
        }
    }

    fn source_name(&self) -> &str {
        "live-channels"
    }
}
