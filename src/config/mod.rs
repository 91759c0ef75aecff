//! Capture Configuration Module
//!
//! Every tuning constant of the capture engine (alignment thresholds,
//! anatomical widths, phase breakpoints, fusion weights, window timing)
//! loaded from TOML.
//!
//! ## Loading Order
//!
//! 1. `SWING_CONFIG` environment variable (path to TOML file)
//! 2. `swing_config.toml` in the current working directory
//! 3. Built-in defaults
//!
//! ## Usage
//!
//! ```ignore
//! // In main():
//! config::init(CaptureConfig::load());
//!
//! // Anywhere in the codebase:
//! let tolerance = config::get().fusion.match_tolerance_secs;
//! ```
//!
//! Library components take their section by value at construction, so tests
//! and embedders can skip the global entirely.

mod capture_config;
pub mod defaults;
pub mod validation;

pub use capture_config::*;

use std::sync::OnceLock;

static CAPTURE_CONFIG: OnceLock<CaptureConfig> = OnceLock::new();

/// Initialize the global capture configuration. Later calls are ignored.
pub fn init(config: CaptureConfig) {
    if CAPTURE_CONFIG.set(config).is_err() {
        tracing::warn!("config::init() called more than once, ignoring");
    }
}

/// Get the global capture configuration.
///
/// Falls back to built-in defaults (initializing the global with them) when
/// `init()` was never called.
pub fn get() -> &'static CaptureConfig {
    CAPTURE_CONFIG.get_or_init(CaptureConfig::default)
}

/// Check whether the config has been initialized.
pub fn is_initialized() -> bool {
    CAPTURE_CONFIG.get().is_some()
}
