//! Post-capture processing
//!
//! Each step is its own failure boundary:
//! 1. the clip must exist on disk and be non-empty
//! 2. the backend transcribes it and replies
//! 3. non-blank transcription and reply become user and assistant messages

use std::io::ErrorKind;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::backend::Uploader;
use crate::conversation::{Message, Sender};
use crate::error::{NetworkAction, PttError};
use crate::session::AudioClip;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Audio file not found.")]
    FileMissing,
    #[error("Audio file is empty. Try recording again.")]
    EmptyFile,
    #[error("Could not validate the audio file.")]
    Unreadable(#[source] std::io::Error),
}

/// Check the clip exists and has content. Returns its size in bytes.
pub async fn validate_clip(path: &Path) -> Result<u64, ValidationError> {
    let metadata = match tokio::fs::metadata(path).await {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            warn!("Audio file not found: {}", path.display());
            return Err(ValidationError::FileMissing);
        }
        Err(e) => {
            error!("Failed to inspect audio file {}: {}", path.display(), e);
            return Err(ValidationError::Unreadable(e));
        }
    };

    if !metadata.is_file() {
        warn!("Audio path is not a file: {}", path.display());
        return Err(ValidationError::FileMissing);
    }

    if metadata.len() == 0 {
        warn!("Audio file is empty: {}", path.display());
        return Err(ValidationError::EmptyFile);
    }

    Ok(metadata.len())
}

/// Turns a finished clip into conversation messages
#[derive(Clone)]
pub struct VoicePipeline {
    uploader: Arc<dyn Uploader>,
}

impl VoicePipeline {
    pub fn new(uploader: Arc<dyn Uploader>) -> Self {
        Self { uploader }
    }

    /// Validate, upload and convert the reply. Messages are returned in display order.
    pub async fn process(&self, clip: &AudioClip, context: Option<&str>) -> Result<Vec<Message>, PttError> {
        let size = validate_clip(&clip.uri).await?;
        debug!("Clip validated: {} bytes, {} ms", size, clip.duration_ms);

        let reply = self
            .uploader
            .transcribe_and_respond(clip, context)
            .await
            .map_err(|e| {
                error!("Failed to process audio: {}", e);
                PttError::network(NetworkAction::ProcessAudio, &e)
            })?;

        let messages: Vec<Message> = [
            Message::from_trimmed(&reply.transcription, Sender::User),
            Message::from_trimmed(&reply.response, Sender::Assistant),
        ]
        .into_iter()
        .flatten()
        .collect();

        info!("Voice exchange produced {} message(s)", messages.len());
        Ok(messages)
    }
}
