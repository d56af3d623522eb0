// WAV-backed recording device
//
// Each recording pulls frames from a fresh `AudioBackend` and writes them to
// `<recordings_path>/<uuid>.wav`. Recording mode is a shared flag that must
// be enabled before a recording may start, mirroring mobile audio sessions.

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::backend::{AudioBackend, AudioBackendConfig, AudioBackendFactory, AudioSource};
use super::clip::{record_clip, samples_to_ms, ClipMetadata, ClipWriter};
use super::device::{AudioDevice, DeviceError, RecordingHandle, RecordingStatus, StoppedRecording};

/// Configuration for the WAV recording device
#[derive(Debug, Clone)]
pub struct WavDeviceConfig {
    /// Directory the clips are written to
    pub recordings_path: PathBuf,
    /// Where audio comes from
    pub source: AudioSource,
    pub backend: AudioBackendConfig,
}

pub struct WavAudioDevice {
    config: WavDeviceConfig,
    recording_enabled: Arc<AtomicBool>,
}

impl WavAudioDevice {
    pub fn new(config: WavDeviceConfig) -> Self {
        Self {
            config,
            recording_enabled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_recording_enabled(&self) -> bool {
        self.recording_enabled.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AudioDevice for WavAudioDevice {
    async fn request_permission(&self) -> Result<bool, DeviceError> {
        match tokio::fs::create_dir_all(&self.config.recordings_path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::PermissionDenied => {
                warn!(
                    "Recordings directory {} is not writable",
                    self.config.recordings_path.display()
                );
                Ok(false)
            }
            Err(e) => Err(DeviceError::failed(format!(
                "Failed to prepare recordings directory: {}",
                e
            ))),
        }
    }

    async fn set_mode(&self, recording_enabled: bool) -> Result<(), DeviceError> {
        let previous = self.recording_enabled.swap(recording_enabled, Ordering::SeqCst);
        if previous != recording_enabled {
            debug!("Audio mode: recording_enabled={}", recording_enabled);
        }
        Ok(())
    }

    async fn create_recording(&self) -> Result<Box<dyn RecordingHandle>, DeviceError> {
        let path = self
            .config
            .recordings_path
            .join(format!("{}.wav", uuid::Uuid::new_v4()));

        Ok(Box::new(WavRecording {
            path,
            source: self.config.source.clone(),
            backend_config: self.config.backend.clone(),
            recording_enabled: Arc::clone(&self.recording_enabled),
            samples_written: Arc::new(AtomicU64::new(0)),
            state: RecorderState::Created,
        }))
    }

    async fn remove_clip(&self, uri: &Path) -> Result<(), DeviceError> {
        if uri.parent() != Some(self.config.recordings_path.as_path()) {
            return Err(DeviceError::failed(format!(
                "Refusing to remove {} outside {}",
                uri.display(),
                self.config.recordings_path.display()
            )));
        }

        match tokio::fs::remove_file(uri).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(DeviceError::NotFound),
            Err(e) => Err(DeviceError::failed(format!(
                "Failed to remove clip {}: {}",
                uri.display(),
                e
            ))),
        }
    }

    fn name(&self) -> &str {
        "wav"
    }
}

enum RecorderState {
    Created,
    Prepared {
        backend: Box<dyn AudioBackend>,
        writer: ClipWriter,
    },
    Recording {
        backend: Box<dyn AudioBackend>,
        task: JoinHandle<anyhow::Result<ClipMetadata>>,
    },
    Stopped,
}

impl RecorderState {
    fn label(&self) -> &'static str {
        match self {
            RecorderState::Created => "created",
            RecorderState::Prepared { .. } => "prepared",
            RecorderState::Recording { .. } => "recording",
            RecorderState::Stopped => "stopped",
        }
    }
}

struct WavRecording {
    path: PathBuf,
    source: AudioSource,
    backend_config: AudioBackendConfig,
    recording_enabled: Arc<AtomicBool>,
    samples_written: Arc<AtomicU64>,
    state: RecorderState,
}

impl WavRecording {
    fn captured_ms(&self) -> u64 {
        samples_to_ms(
            self.samples_written.load(Ordering::SeqCst),
            self.backend_config.target_sample_rate,
            self.backend_config.target_channels,
        )
    }
}

#[async_trait]
impl RecordingHandle for WavRecording {
    async fn prepare(&mut self) -> Result<(), DeviceError> {
        if !matches!(self.state, RecorderState::Created) {
            return Err(DeviceError::failed(format!(
                "Cannot prepare a {} recording",
                self.state.label()
            )));
        }

        let backend = AudioBackendFactory::create(self.source.clone(), self.backend_config.clone())
            .map_err(|e| DeviceError::failed(format!("{:#}", e)))?;
        let writer = ClipWriter::create(
            self.path.clone(),
            self.backend_config.target_sample_rate,
            self.backend_config.target_channels,
        )
        .map_err(|e| DeviceError::failed(format!("{:#}", e)))?;

        debug!("Recording prepared: {} via {}", self.path.display(), backend.name());
        self.state = RecorderState::Prepared { backend, writer };
        Ok(())
    }

    async fn start(&mut self) -> Result<(), DeviceError> {
        if !self.recording_enabled.load(Ordering::SeqCst) {
            return Err(DeviceError::ModeDisabled);
        }

        let (mut backend, writer) = match std::mem::replace(&mut self.state, RecorderState::Stopped) {
            RecorderState::Prepared { backend, writer } => (backend, writer),
            other => {
                self.state = other;
                return Err(DeviceError::NotFound);
            }
        };

        let audio_rx = backend
            .start()
            .await
            .map_err(|e| DeviceError::failed(format!("Failed to start audio capture: {:#}", e)))?;

        let task = tokio::spawn(record_clip(writer, audio_rx, Arc::clone(&self.samples_written)));

        info!("Recording started: {}", self.path.display());
        self.state = RecorderState::Recording { backend, task };
        Ok(())
    }

    async fn stop(&mut self) -> Result<StoppedRecording, DeviceError> {
        match std::mem::replace(&mut self.state, RecorderState::Stopped) {
            RecorderState::Recording { mut backend, task } => {
                if let Err(e) = backend.stop().await {
                    warn!("Failed to stop audio backend: {:#}", e);
                }

                let metadata = task
                    .await
                    .map_err(|e| DeviceError::failed(format!("Clip writer panicked: {}", e)))?
                    .map_err(|e| DeviceError::failed(format!("{:#}", e)))?;

                Ok(StoppedRecording {
                    uri: Some(metadata.file_path.clone()),
                    duration_ms: metadata.duration_ms(),
                })
            }
            RecorderState::Prepared { writer, .. } => {
                let metadata = writer
                    .finish()
                    .map_err(|e| DeviceError::failed(format!("{:#}", e)))?;
                Ok(StoppedRecording {
                    uri: Some(metadata.file_path),
                    duration_ms: 0,
                })
            }
            RecorderState::Created | RecorderState::Stopped => Err(DeviceError::NotFound),
        }
    }

    async fn status(&self) -> Result<RecordingStatus, DeviceError> {
        Ok(RecordingStatus {
            is_recording: matches!(self.state, RecorderState::Recording { .. }),
            can_record: matches!(self.state, RecorderState::Prepared { .. }),
            duration_ms: self.captured_ms(),
        })
    }

    fn uri(&self) -> Result<Option<PathBuf>, DeviceError> {
        Ok(self.path.exists().then(|| self.path.clone()))
    }
}

impl Drop for WavRecording {
    fn drop(&mut self) {
        if let RecorderState::Recording { task, .. } = &self.state {
            warn!("Recording {} released while capturing", self.path.display());
            task.abort();
        }
    }
}
