//! Visual and haptic feedback derived from controller snapshots
//!
//! The controller never drives presentation directly. After each transition
//! it projects the previous and next snapshots into a `Feedback` value and
//! hands that to a `FeedbackSink`.

use serde::Serialize;
use std::time::Duration;
use tracing::debug;

use super::state::{Phase, Snapshot};

pub const IDLE_SCALE: f32 = 1.0;
pub const RECORDING_SCALE: f32 = 1.12;
pub const CANCELLING_SCALE: f32 = 0.9;

/// Mic button color
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MicColor {
    Idle,
    Active,
    Cancel,
}

impl MicColor {
    pub fn hex(&self) -> &'static str {
        match self {
            MicColor::Idle => "#007AFF",
            MicColor::Active => "#FF3B30",
            MicColor::Cancel => "#D73A2A",
        }
    }
}

/// One vibration
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct HapticPulse {
    pub duration_ms: u64,
}

impl HapticPulse {
    /// Confirms the press was registered
    pub const PRESS: HapticPulse = HapticPulse { duration_ms: 20 };
    /// Signals the drag crossed into cancel territory
    pub const CANCEL: HapticPulse = HapticPulse { duration_ms: 15 };
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Feedback {
    pub scale: f32,
    pub color: MicColor,
    pub haptic: Option<HapticPulse>,
}

impl Feedback {
    /// Project a transition into feedback.
    ///
    /// Scale and color depend only on `next`; the haptic pulse fires on the
    /// edge into a press or into cancelling.
    pub fn project(prev: &Snapshot, next: &Snapshot) -> Self {
        let capturing = next.phase.is_capturing();
        let cancelling = capturing && next.is_cancelling;

        let (scale, color) = match (capturing, cancelling) {
            (true, true) => (CANCELLING_SCALE, MicColor::Cancel),
            (true, false) => (RECORDING_SCALE, MicColor::Active),
            _ => (IDLE_SCALE, MicColor::Idle),
        };

        let pressed = prev.phase.is_idle() && next.phase == Phase::Starting;
        let entered_cancel = cancelling && !(prev.phase.is_capturing() && prev.is_cancelling);

        let haptic = if pressed {
            Some(HapticPulse::PRESS)
        } else if entered_cancel {
            Some(HapticPulse::CANCEL)
        } else {
            None
        };

        Self { scale, color, haptic }
    }

    /// Feedback for a steady state, with no pulse
    pub fn steady(snapshot: &Snapshot) -> Self {
        Self::project(snapshot, snapshot)
    }
}

/// Receives feedback after every transition
pub trait FeedbackSink: Send + Sync {
    fn apply(&self, feedback: &Feedback);
}

/// Logs feedback; used when no presentation layer is attached
pub struct TracingFeedback;

impl FeedbackSink for TracingFeedback {
    fn apply(&self, feedback: &Feedback) {
        if let Some(pulse) = feedback.haptic {
            debug!("Haptic pulse {} ms", pulse.duration_ms);
        }
        debug!("Mic scale {:.2}, color {}", feedback.scale, feedback.color.hex());
    }
}

/// Recording overlay shown while a gesture is in progress
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Overlay {
    pub timer: String,
    pub hint: &'static str,
    pub cancelling: bool,
}

impl Overlay {
    pub fn for_snapshot(snapshot: &Snapshot) -> Option<Self> {
        if snapshot.phase != Phase::Recording {
            return None;
        }

        let hint = if snapshot.is_cancelling {
            "Release to cancel"
        } else {
            "Recording... slide to cancel"
        };

        Some(Self {
            timer: format_duration(snapshot.elapsed()),
            hint,
            cancelling: snapshot.is_cancelling,
        })
    }
}

/// `mm:ss`, rounded to the nearest second
pub fn format_duration(duration: Duration) -> String {
    let total_seconds = (duration.as_millis() + 500) / 1000;
    format!("{:02}:{:02}", total_seconds / 60, total_seconds % 60)
}
