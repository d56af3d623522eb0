use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::file::AudioFile;

/// Audio sample data (16-bit PCM, interleaved)
#[derive(Debug, Clone)]
pub struct AudioFrame {
    /// Raw audio samples (i16 PCM, interleaved)
    pub samples: Vec<i16>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of channels
    pub channels: u16,
    /// Timestamp in milliseconds since capture started
    pub timestamp_ms: u64,
}

impl AudioFrame {
    /// Duration covered by this frame
    pub fn duration_ms(&self) -> u64 {
        let per_channel = self.samples.len() as u64 / self.channels.max(1) as u64;
        per_channel * 1000 / self.sample_rate.max(1) as u64
    }
}

/// Configuration for audio backend
#[derive(Debug, Clone)]
pub struct AudioBackendConfig {
    /// Target sample rate (will resample if needed)
    pub target_sample_rate: u32,
    /// Target channel count (1 = mono, 2 = stereo)
    pub target_channels: u16,
    /// Buffer size in milliseconds (affects latency)
    pub buffer_duration_ms: u64,
}

impl Default for AudioBackendConfig {
    fn default() -> Self {
        Self {
            target_sample_rate: 16000, // 16kHz speech
            target_channels: 1,        // Mono
            buffer_duration_ms: 100,   // 100ms buffers
        }
    }
}

/// Audio capture backend trait
///
/// A recording handle owns one backend for the lifetime of a clip.
#[async_trait::async_trait]
pub trait AudioBackend: Send + Sync {
    /// Start capturing audio
    ///
    /// Returns a channel receiver that will receive audio frames. The channel
    /// closes once the backend is stopped.
    async fn start(&mut self) -> Result<mpsc::Receiver<AudioFrame>>;

    /// Stop capturing audio
    async fn stop(&mut self) -> Result<()>;

    /// Check if backend is currently capturing
    fn is_capturing(&self) -> bool;

    /// Get backend name for logging
    fn name(&self) -> &str;
}

/// Audio backend factory
pub struct AudioBackendFactory;

impl AudioBackendFactory {
    /// Create audio backend based on source and configuration
    pub fn create(source: AudioSource, config: AudioBackendConfig) -> Result<Box<dyn AudioBackend>> {
        match source {
            AudioSource::Microphone => {
                anyhow::bail!("No live microphone backend is available in this build; configure audio.input_wav")
            }

            AudioSource::File(path) => {
                let backend = FileBackend::open(&path, config)?;
                Ok(Box::new(backend))
            }
        }
    }
}

/// Audio source type
#[derive(Debug, Clone)]
pub enum AudioSource {
    /// Microphone input
    Microphone,
    /// File input, replayed in real time as if spoken into the microphone
    File(PathBuf),
}

/// Replays a WAV file as a live capture stream, looping until stopped
pub struct FileBackend {
    name: String,
    config: AudioBackendConfig,
    samples: Arc<Vec<i16>>,
    stop_tx: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl FileBackend {
    pub fn open(path: &Path, config: AudioBackendConfig) -> Result<Self> {
        if config.buffer_duration_ms == 0 {
            anyhow::bail!("buffer_duration_ms must be greater than zero");
        }

        let audio = AudioFile::open(path)
            .with_context(|| format!("Failed to open input file {}", path.display()))?;
        let samples = audio.conform(config.target_sample_rate, config.target_channels)?;

        if samples.is_empty() {
            anyhow::bail!("Input file {} contains no audio", path.display());
        }

        Ok(Self {
            name: format!("file:{}", path.display()),
            config,
            samples: Arc::new(samples),
            stop_tx: None,
            task: None,
        })
    }

    fn samples_per_frame(&self) -> usize {
        let per_second = self.config.target_sample_rate as u64 * self.config.target_channels as u64;
        ((per_second * self.config.buffer_duration_ms) / 1000).max(1) as usize
    }
}

#[async_trait::async_trait]
impl AudioBackend for FileBackend {
    async fn start(&mut self) -> Result<mpsc::Receiver<AudioFrame>> {
        if self.task.is_some() {
            anyhow::bail!("{} is already capturing", self.name);
        }

        let (tx, rx) = mpsc::channel(32);
        let (stop_tx, mut stop_rx) = oneshot::channel();

        let samples = Arc::clone(&self.samples);
        let frame_len = self.samples_per_frame();
        let sample_rate = self.config.target_sample_rate;
        let channels = self.config.target_channels;
        let buffer_ms = self.config.buffer_duration_ms;

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_millis(buffer_ms));
            let mut cursor = 0usize;
            let mut timestamp_ms = 0u64;

            loop {
                tokio::select! {
                    _ = &mut stop_rx => break,
                    _ = ticker.tick() => {
                        let mut frame = Vec::with_capacity(frame_len);
                        while frame.len() < frame_len {
                            let take = (frame_len - frame.len()).min(samples.len() - cursor);
                            frame.extend_from_slice(&samples[cursor..cursor + take]);
                            cursor = (cursor + take) % samples.len();
                        }

                        let frame = AudioFrame {
                            samples: frame,
                            sample_rate,
                            channels,
                            timestamp_ms,
                        };
                        timestamp_ms += buffer_ms;

                        if tx.send(frame).await.is_err() {
                            break;
                        }
                    }
                }
            }

            debug!("File replay stopped after {} ms", timestamp_ms);
        });

        self.stop_tx = Some(stop_tx);
        self.task = Some(task);

        info!("{} capturing ({}Hz, {} channels)", self.name, sample_rate, channels);

        Ok(rx)
    }

    async fn stop(&mut self) -> Result<()> {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }

        if let Some(task) = self.task.take() {
            task.await.context("File replay task panicked")?;
        }

        Ok(())
    }

    fn is_capturing(&self) -> bool {
        self.task.is_some()
    }

    fn name(&self) -> &str {
        &self.name
    }
}
