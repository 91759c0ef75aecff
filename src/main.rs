//! swing-capture - simulated range session runner
//!
//! Generates a synthetic camera + wearable event stream, drives it through
//! the capture orchestrator, and prints the session summary.
//!
//! # Usage
//!
//! ```bash
//! # Ten swings cycling through five tempo profiles
//! cargo run --release -- --swings 10 --profiles varied
//!
//! # Depth tracking on a depth-capable device, JSON output
//! cargo run --release -- --mode 3d --depth-supported --json
//! ```
//!
//! # Environment Variables
//!
//! - `SWING_CONFIG`: Path to a capture config TOML (default: ./swing_config.toml)
//! - `RUST_LOG`: Logging level (default: info)

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tokio_util::sync::CancellationToken;
use tracing::info;

use swing_capture::capture::{CaptureOrchestrator, ProcessingLoop, ReplaySource};
use swing_capture::config::{self, CaptureConfig};
use swing_capture::providers::StaticDeviceCapabilities;
use swing_capture::simulation::{SimulationConfig, SwingProfile, SwingSimulator};
use swing_capture::types::{RangeSession, TrackingMode};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ProfileSet {
    /// The standard 3:1 tempo swing, repeated
    Standard,
    /// Five profiles with distinct tempos and turns
    Varied,
}

#[derive(Parser, Debug)]
#[command(name = "swing-capture")]
#[command(about = "Golf swing capture and sensor fusion: simulated range session")]
#[command(version)]
struct CliArgs {
    /// Number of swings to simulate
    #[arg(long, default_value = "10")]
    swings: usize,

    #[arg(long, value_enum, default_value = "varied")]
    profiles: ProfileSet,

    /// Tracking mode ("2d" or "3d")
    #[arg(long, default_value = "2d")]
    mode: TrackingMode,

    /// Report the device as depth-tracking capable
    #[arg(long)]
    depth_supported: bool,

    /// Joint position noise std-dev
    #[arg(long, default_value = "0.0")]
    noise: f64,

    /// RNG seed for noise
    #[arg(long, default_value = "7")]
    seed: u64,

    /// Capture config TOML (overrides SWING_CONFIG and ./swing_config.toml)
    #[arg(long, env = "SWING_CONFIG")]
    config: Option<PathBuf>,

    /// Delay between replayed events in milliseconds (0 = no delay)
    #[arg(long, default_value = "0")]
    delay_ms: u64,

    /// Print the full session as JSON
    #[arg(long)]
    json: bool,
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = CliArgs::parse();

    let capture_config = match &args.config {
        Some(path) => CaptureConfig::load_from_file(path)
            .with_context(|| format!("loading capture config from {}", path.display()))?,
        None => CaptureConfig::load(),
    };
    config::init(capture_config);
    let capture_config = config::get().clone();

    let profiles = match args.profiles {
        ProfileSet::Standard => vec![SwingProfile::standard()],
        ProfileSet::Varied => SwingProfile::variations(),
    };
    let simulation = SimulationConfig {
        mode: args.mode,
        noise_std: args.noise,
        seed: args.seed,
        ..SimulationConfig::default()
    };
    info!(
        swings = args.swings,
        profiles = profiles.len(),
        mode = %args.mode,
        seed = args.seed,
        "Generating simulated range session"
    );
    let events = SwingSimulator::new(simulation, capture_config.geometry.clone())
        .session(&profiles, args.swings);

    let device = Arc::new(StaticDeviceCapabilities(args.depth_supported));
    let orchestrator = CaptureOrchestrator::new(capture_config, device, args.mode);

    // Graceful shutdown via Ctrl+C
    let cancel_token = CancellationToken::new();
    let shutdown_token = cancel_token.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Received Ctrl+C, finishing session");
        shutdown_token.cancel();
    });

    let mut source = ReplaySource::new(events, args.delay_ms);
    let outcome = ProcessingLoop::new(orchestrator, cancel_token)
        .run(&mut source)
        .await
        .context("capture session failed")?;

    info!(
        poses = outcome.stats.poses,
        frames = outcome.stats.frames,
        motion = outcome.stats.motion_samples,
        dropped = outcome.stats.motion_dropped,
        rejected = outcome.stats.rejected_events,
        cancelled = outcome.cancelled,
        "Session processed"
    );

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome.session)?);
    } else {
        print_summary(&outcome.session);
    }
    Ok(())
}

fn fmt_opt(value: Option<f64>, precision: usize) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.precision$}"))
}

fn print_summary(session: &RangeSession) {
    println!("Session {} ({})", session.id, session.tracking_mode);
    println!(
        "{:>5} {:>8} {:>7} {:>9} {:>8} {:>7} {:>6}",
        "swing", "tempo", "score", "x-factor", "peak g", "match", "conf"
    );
    for capture in &session.captures {
        let m = &capture.metrics;
        println!(
            "{:>5} {:>8} {:>7} {:>9} {:>8} {:>7} {:>6.2}",
            capture.swing_number,
            fmt_opt(m.tempo_ratio, 2),
            fmt_opt(m.tempo_score, 1),
            fmt_opt(m.x_factor, 1),
            fmt_opt(m.peak_acceleration_g, 1),
            if m.sources_matched { "yes" } else { "no" },
            m.combined_confidence,
        );
    }

    let s = &session.summary;
    println!();
    println!("Swings:        {} ({} matched)", s.swing_count, s.matched_swings);
    println!("Avg tempo:     {}", fmt_opt(s.average_tempo, 2));
    println!("Consistency:   {}", fmt_opt(s.consistency_score, 1));
    println!("Avg x-factor:  {}", fmt_opt(s.average_x_factor, 1));
    println!("Spine held:    {}", fmt_opt(s.spine_maintained_rate.map(|r| r * 100.0), 0));
}
