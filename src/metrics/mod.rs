//! Metrics Aggregator
//!
//! - `swing`: tempo, rotation, spine and arm metrics from segmented frames
//! - `wearable`: onset, impact and peak magnitudes from motion samples
//! - `session`: fused per-swing metrics and session-level aggregates
//!
//! Absent inputs produce absent metrics, never zeros, so session averages
//! only count swings that actually measured something.

mod session;
mod swing;
mod wearable;

pub use session::{combine, consistency_score, mean, population_variance, summarize};
pub use swing::{compute_body_metrics, tempo_ratio, tempo_score};
pub use wearable::compute_wearable_metrics;
