//! Shared data structures for swing capture and sensor fusion
//!
//! This module defines the value types that flow through the capture engine:
//! - Joints and pose frames (camera / depth providers)
//! - Motion samples (wearable accelerometer + gyroscope)
//! - Swing phases and phase markers (segmenter output)
//! - Tracking mode and alignment status (provider state)
//! - Combined swing captures and range sessions (final output contract)

mod vector;
mod joint;
mod pose;
mod motion;
mod phase;
mod tracking;
mod capture;

pub use vector::*;
pub use joint::*;
pub use pose::*;
pub use motion::*;
pub use phase::*;
pub use tracking::*;
pub use capture::*;
