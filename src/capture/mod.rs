//! Capture Orchestration
//!
//! - `orchestrator`: session lifecycle, capture windows, finalize-time fusion
//! - `source`: where capture events come from (replay, live channels)
//! - `processing_loop`: async driver feeding a source into the orchestrator

mod orchestrator;
mod processing_loop;
mod source;

pub use orchestrator::CaptureOrchestrator;
pub use processing_loop::{LoopOutcome, LoopStats, ProcessingLoop};
pub use source::{CameraHandle, CaptureEvent, CaptureSource, ChannelSource, ReplaySource, WearableHandle};

use thiserror::Error;

use crate::motion::ClockSyncError;
use crate::providers::ProviderError;

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("a capture session is already active")]
    AlreadyActive,
    #[error("no active capture session")]
    NoActiveSession,
    #[error("no open capture window")]
    NoOpenWindow,
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error("clock sync rejected: {0}")]
    ClockSync(#[from] ClockSyncError),
}
