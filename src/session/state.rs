use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;
use tokio::time::Instant;

use crate::audio::RecordingHandle;

/// Push-to-talk capture phase
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// No recording in progress
    #[default]
    Idle,
    /// Press received, device is arming the recorder
    Starting,
    /// Device confirmed the recorder is capturing
    Recording,
    /// Running the teardown sequence
    Finalizing,
}

impl Phase {
    pub fn is_idle(&self) -> bool {
        matches!(self, Phase::Idle)
    }

    /// Starting or recording: a gesture is in progress
    pub fn is_capturing(&self) -> bool {
        matches!(self, Phase::Starting | Phase::Recording)
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Idle => write!(f, "Idle"),
            Phase::Starting => write!(f, "Starting"),
            Phase::Recording => write!(f, "Recording"),
            Phase::Finalizing => write!(f, "Finalizing"),
        }
    }
}

/// Microphone permission as last reported by the device
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    #[default]
    Unknown,
    Granted,
    Denied,
}

/// Observable controller state, published after every transition
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Snapshot {
    pub phase: Phase,
    pub is_cancelling: bool,
    /// A clip or text message is waiting on the backend
    pub is_processing: bool,
    pub permission: Permission,
    #[serde(skip)]
    pub recording_since: Option<Instant>,
}

impl Snapshot {
    /// Time spent in the current recording
    pub fn elapsed(&self) -> Duration {
        self.recording_since
            .map(|since| since.elapsed())
            .unwrap_or_default()
    }

    /// Idle with nothing in flight
    pub fn is_settled(&self) -> bool {
        self.phase.is_idle() && !self.is_processing
    }
}

/// A finished recording handed to the processing pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioClip {
    pub uri: PathBuf,
    pub duration_ms: u64,
}

/// The in-flight capture. Owned exclusively by the controller.
pub(crate) struct RecordingSession {
    pub(crate) handle: Box<dyn RecordingHandle>,
    pub(crate) started_at: Instant,
}

impl RecordingSession {
    pub(crate) fn new(handle: Box<dyn RecordingHandle>) -> Self {
        Self {
            handle,
            started_at: Instant::now(),
        }
    }
}

/// A request to end the current session
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StopRequest {
    /// Whether the clip should be sent for processing
    pub should_process: bool,
}

impl StopRequest {
    /// Release by the user, processing unless the gesture was cancelling
    pub fn release(cancelling: bool) -> Self {
        Self {
            should_process: !cancelling,
        }
    }

    /// Programmatic teardown; never processes and never notifies
    pub fn discard() -> Self {
        Self {
            should_process: false,
        }
    }
}

/// Single-slot mailbox for a stop that arrives while the recorder is still arming
#[derive(Debug, Default)]
pub(crate) struct PendingStop(Option<StopRequest>);

impl PendingStop {
    /// Park a request. A discard always wins over a processing release.
    pub(crate) fn park(&mut self, request: StopRequest) {
        let should_process = match self.0 {
            Some(existing) => existing.should_process && request.should_process,
            None => request.should_process,
        };
        self.0 = Some(StopRequest { should_process });
    }

    pub(crate) fn take(&mut self) -> Option<StopRequest> {
        self.0.take()
    }

    pub(crate) fn clear(&mut self) {
        self.0 = None;
    }
}
