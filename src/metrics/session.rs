//! Session aggregates and per-swing metric fusion.

use statrs::statistics::Statistics;
use tracing::info;

use crate::config::MetricsConfig;
use crate::fusion::SwingMatch;
use crate::types::{BodyMetrics, CombinedSwingCapture, CombinedSwingMetrics, SessionSummary, WearableMetrics};

/// Arithmetic mean; `None` for no values.
pub fn mean(values: &[f64]) -> Option<f64> {
    (!values.is_empty()).then(|| values.iter().mean())
}

/// Population variance (÷N); 0 when there are fewer than two values.
pub fn population_variance(values: &[f64]) -> f64 {
    if values.len() <= 1 {
        return 0.0;
    }
    values.iter().population_variance()
}

/// Tempo consistency in (floor, 100].
///
/// `floor + (100 − floor) / (1 + weight × variance)`: identical tempos score
/// 100, and the score decays toward (never reaching) the floor as variance grows.
pub fn consistency_score(variance: f64, config: &MetricsConfig) -> f64 {
    let floor = config.consistency_floor;
    let variance = variance.max(0.0);
    floor + (100.0 - floor) / config.consistency_variance_weight.mul_add(variance, 1.0)
}

/// Fuse the body metrics, wearable metrics, and match verdict of one swing.
pub fn combine(
    body: Option<&BodyMetrics>,
    wearable: Option<&WearableMetrics>,
    swing_match: &SwingMatch,
) -> CombinedSwingMetrics {
    CombinedSwingMetrics {
        tempo_ratio: body.and_then(|b| b.tempo_ratio),
        tempo_score: body.and_then(|b| b.tempo_score),
        x_factor: body.and_then(|b| b.x_factor),
        spine_angle_maintained: body.and_then(|b| b.spine_angle_maintained),
        peak_acceleration_g: wearable.and_then(|w| w.peak_acceleration_g),
        peak_rotation_rate_dps: wearable.and_then(|w| w.peak_rotation_rate_dps),
        onset_delta_secs: swing_match.onset_delta,
        sources_matched: swing_match.matched,
        combined_confidence: swing_match.combined_confidence,
    }
}

/// Session summary. Averages skip swings whose metric is absent.
pub fn summarize(captures: &[CombinedSwingCapture], config: &MetricsConfig) -> SessionSummary {
    let collect = |f: fn(&CombinedSwingMetrics) -> Option<f64>| -> Vec<f64> {
        captures.iter().filter_map(|c| f(&c.metrics)).collect()
    };

    let tempos = collect(|m| m.tempo_ratio);
    let tempo_scores = collect(|m| m.tempo_score);
    let x_factors = collect(|m| m.x_factor);
    let confidences: Vec<f64> = captures.iter().map(|c| c.metrics.combined_confidence).collect();
    let spine_verdicts: Vec<f64> = captures
        .iter()
        .filter_map(|c| c.metrics.spine_angle_maintained)
        .map(|kept| if kept { 1.0 } else { 0.0 })
        .collect();

    let tempo_variance = (!tempos.is_empty()).then(|| population_variance(&tempos));

    let summary = SessionSummary {
        swing_count: captures.len(),
        matched_swings: captures.iter().filter(|c| c.metrics.sources_matched).count(),
        average_tempo: mean(&tempos),
        tempo_variance,
        consistency_score: tempo_variance.map(|v| consistency_score(v, config)),
        average_tempo_score: mean(&tempo_scores),
        average_x_factor: mean(&x_factors),
        spine_maintained_rate: mean(&spine_verdicts),
        average_combined_confidence: mean(&confidences),
    };

    info!(
        swings = summary.swing_count,
        matched = summary.matched_swings,
        average_tempo = ?summary.average_tempo,
        consistency = ?summary.consistency_score,
        "Session summarized"
    );
    summary
}
