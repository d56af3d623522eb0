use serde::{Deserialize, Serialize};

use crate::gesture::DEFAULT_CANCEL_THRESHOLD_PX;

/// Shortest clip that is sent for processing
pub const MIN_DURATION_MS: u64 = 800;

/// Push-to-talk policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PttConfig {
    /// Leftward drag, in pixels, past which releasing discards the recording
    #[serde(default = "default_cancel_threshold_px")]
    pub cancel_threshold_px: f32,

    /// Clips shorter than this are discarded
    #[serde(default = "default_min_duration_ms")]
    pub min_duration_ms: u64,

    /// Capacity of the controller's command inbox
    #[serde(default = "default_inbox_capacity")]
    pub inbox_capacity: usize,
}

fn default_cancel_threshold_px() -> f32 {
    DEFAULT_CANCEL_THRESHOLD_PX
}

fn default_min_duration_ms() -> u64 {
    MIN_DURATION_MS
}

fn default_inbox_capacity() -> usize {
    64
}

impl Default for PttConfig {
    fn default() -> Self {
        Self {
            cancel_threshold_px: default_cancel_threshold_px(),
            min_duration_ms: default_min_duration_ms(),
            inbox_capacity: default_inbox_capacity(),
        }
    }
}
