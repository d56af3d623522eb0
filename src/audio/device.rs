use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Failures reported by an audio device or one of its recordings
#[derive(Debug, Error)]
pub enum DeviceError {
    /// The recorder was already torn down (double stop, stop before start)
    #[error("recorder does not exist")]
    NotFound,
    /// Recording was attempted while the device was not in recording mode
    #[error("recording mode is not enabled")]
    ModeDisabled,
    #[error("microphone permission not granted")]
    PermissionDenied,
    #[error("{0}")]
    Failed(String),
}

impl DeviceError {
    pub fn failed(msg: impl Into<String>) -> Self {
        DeviceError::Failed(msg.into())
    }

    /// Errors of the "does not exist" class are expected races, not failures
    pub fn is_not_found(&self) -> bool {
        matches!(self, DeviceError::NotFound)
    }
}

/// Snapshot of a recording handle as reported by the device
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecordingStatus {
    pub is_recording: bool,
    pub can_record: bool,
    /// Captured audio so far, in milliseconds
    pub duration_ms: u64,
}

impl RecordingStatus {
    /// Whether the handle still holds an armed or running recorder that must be stopped
    pub fn is_active(&self) -> bool {
        self.is_recording || self.can_record
    }
}

/// Result of stopping a recording
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoppedRecording {
    pub uri: Option<PathBuf>,
    pub duration_ms: u64,
}

/// Platform audio capability
///
/// Implementations:
/// - `WavAudioDevice`: records frames from an `AudioBackend` into WAV clips
/// - test fakes with scripted latency and failures
#[async_trait]
pub trait AudioDevice: Send + Sync {
    /// Ask the platform for microphone access. `Ok(false)` means denied.
    async fn request_permission(&self) -> Result<bool, DeviceError>;

    /// Switch the shared audio session between playback and recording mode
    async fn set_mode(&self, recording_enabled: bool) -> Result<(), DeviceError>;

    /// Allocate a new, unprepared recording
    async fn create_recording(&self) -> Result<Box<dyn RecordingHandle>, DeviceError>;

    /// Delete a clip this device produced. `NotFound` if it is already gone.
    async fn remove_clip(&self, uri: &Path) -> Result<(), DeviceError>;

    /// Get device name for logging
    fn name(&self) -> &str;
}

/// A single recording owned by whoever created it. Dropping the handle releases it.
#[async_trait]
pub trait RecordingHandle: Send + Sync {
    /// Arm the recorder (allocate the output file, open the input)
    async fn prepare(&mut self) -> Result<(), DeviceError>;

    /// Begin capturing
    async fn start(&mut self) -> Result<(), DeviceError>;

    /// Stop capturing and unload the recorder
    async fn stop(&mut self) -> Result<StoppedRecording, DeviceError>;

    async fn status(&self) -> Result<RecordingStatus, DeviceError>;

    /// Location of the recorded clip, if one was produced
    fn uri(&self) -> Result<Option<PathBuf>, DeviceError>;
}
