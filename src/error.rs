//! User-facing error taxonomy
//!
//! Every variant is recoverable: the controller reports it and returns to idle.

use serde::Serialize;
use thiserror::Error;

use crate::audio::DeviceError;
use crate::backend::BackendError;
use crate::pipeline::ValidationError;

/// Which network call failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkAction {
    ProcessAudio,
    SendMessage,
}

impl NetworkAction {
    fn generic_message(self) -> &'static str {
        match self {
            NetworkAction::ProcessAudio => "Could not process the audio.",
            NetworkAction::SendMessage => "Could not send the message.",
        }
    }
}

#[derive(Debug, Error)]
pub enum PttError {
    #[error("Microphone access is required to record audio.")]
    PermissionDenied,

    #[error("Failed to start recording: {0}")]
    Device(#[source] DeviceError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Hold the button a little longer to send audio.")]
    TooShort { duration_ms: u64 },

    #[error("{message}")]
    Network { action: NetworkAction, message: String },
}

/// Stable identifier for a notice, for clients that localize their own text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    PermissionDenied,
    Device,
    Validation,
    TooShort,
    Network,
}

impl PttError {
    /// Build a network error, preferring the backend-provided detail
    pub fn network(action: NetworkAction, error: &BackendError) -> Self {
        let message = error
            .detail()
            .map(str::to_string)
            .unwrap_or_else(|| action.generic_message().to_string());
        PttError::Network { action, message }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            PttError::PermissionDenied => ErrorKind::PermissionDenied,
            PttError::Device(_) => ErrorKind::Device,
            PttError::Validation(_) => ErrorKind::Validation,
            PttError::TooShort { .. } => ErrorKind::TooShort,
            PttError::Network { .. } => ErrorKind::Network,
        }
    }

    /// Short heading for a toast or alert
    pub fn title(&self) -> &'static str {
        match self {
            PttError::PermissionDenied => "Permission denied",
            PttError::Device(_) => "Recording error",
            PttError::Validation(_) => "Could not process audio",
            PttError::TooShort { .. } => "Recording too short",
            PttError::Network { action: NetworkAction::ProcessAudio, .. } => "Could not process audio",
            PttError::Network { action: NetworkAction::SendMessage, .. } => "Could not send message",
        }
    }
}
