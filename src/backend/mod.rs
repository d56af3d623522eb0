//! Assistant backend collaborators
//!
//! The core talks to the backend through two calls:
//! - `Uploader::transcribe_and_respond` for a recorded clip
//! - `ChatService::chat` for typed text

pub mod client;
pub mod messages;

use async_trait::async_trait;
use thiserror::Error;

use crate::session::AudioClip;

pub use client::ApiClient;
pub use messages::{ChatReply, ChatRequest, VoiceReply};

#[derive(Debug, Error)]
pub enum BackendError {
    /// The backend answered with a non-success status
    #[error("backend returned {status}: {}", .detail.as_deref().unwrap_or("no detail"))]
    Api { status: u16, detail: Option<String> },

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("failed to read audio clip: {0}")]
    Io(#[from] std::io::Error),
}

impl BackendError {
    /// Backend-provided explanation, suitable for showing to the user
    pub fn detail(&self) -> Option<&str> {
        match self {
            BackendError::Api { detail, .. } => detail.as_deref().filter(|d| !d.trim().is_empty()),
            BackendError::Transport(_) | BackendError::Io(_) => None,
        }
    }
}

/// Sends a finished recording for transcription and an assistant reply
#[async_trait]
pub trait Uploader: Send + Sync {
    async fn transcribe_and_respond(
        &self,
        clip: &AudioClip,
        context: Option<&str>,
    ) -> Result<VoiceReply, BackendError>;
}

/// Sends typed text to the assistant
#[async_trait]
pub trait ChatService: Send + Sync {
    async fn chat(&self, message: &str, context: Option<&str>) -> Result<ChatReply, BackendError>;
}
