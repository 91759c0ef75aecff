//! Cross-source fusion: is the camera swing the wearable swing, and how much
//! should the combined result be trusted?

mod matcher;

pub use matcher::{combined_confidence, detect_wearable_onset, swings_match, SwingMatch, SwingMatcher};
