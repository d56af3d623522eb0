use anyhow::{Context, Result};
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

use super::backend::AudioFrame;

/// Metadata for a finished clip
#[derive(Debug, Clone)]
pub struct ClipMetadata {
    /// File path to the clip
    pub file_path: PathBuf,
    /// Sample rate
    pub sample_rate: u32,
    /// Number of channels
    pub channels: u16,
    /// Number of samples written (all channels)
    pub sample_count: usize,
}

impl ClipMetadata {
    pub fn duration_ms(&self) -> u64 {
        samples_to_ms(self.sample_count as u64, self.sample_rate, self.channels)
    }
}

pub(crate) fn samples_to_ms(sample_count: u64, sample_rate: u32, channels: u16) -> u64 {
    let per_second = sample_rate as u64 * channels.max(1) as u64;
    if per_second == 0 {
        return 0;
    }
    sample_count * 1000 / per_second
}

/// Writes a single push-to-talk clip to disk as WAV file
pub struct ClipWriter {
    writer: Option<hound::WavWriter<BufWriter<File>>>,
    metadata: ClipMetadata,
}

impl ClipWriter {
    pub fn create(file_path: PathBuf, sample_rate: u32, channels: u16) -> Result<Self> {
        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };

        let writer = hound::WavWriter::create(&file_path, spec)
            .with_context(|| format!("Failed to create WAV file: {:?}", file_path))?;

        Ok(Self {
            writer: Some(writer),
            metadata: ClipMetadata {
                file_path,
                sample_rate,
                channels,
                sample_count: 0,
            },
        })
    }

    pub fn write_frame(&mut self, frame: &AudioFrame) -> Result<()> {
        if let Some(writer) = &mut self.writer {
            for &sample in &frame.samples {
                writer.write_sample(sample).context("Failed to write sample to WAV")?;
            }

            self.metadata.sample_count += frame.samples.len();
        }

        Ok(())
    }

    pub fn metadata(&self) -> &ClipMetadata {
        &self.metadata
    }

    pub fn finish(mut self) -> Result<ClipMetadata> {
        if let Some(writer) = self.writer.take() {
            writer.finalize().context("Failed to finalize WAV file")?;
        }

        Ok(self.metadata.clone())
    }
}

impl Drop for ClipWriter {
    fn drop(&mut self) {
        if let Some(writer) = self.writer.take() {
            if let Err(e) = writer.finalize() {
                warn!("Failed to finalize WAV writer on drop: {}", e);
            }
        }
    }
}

/// Drain frames into the writer until the channel closes.
///
/// `progress` tracks the number of samples written so far for status polling.
pub async fn record_clip(
    mut writer: ClipWriter,
    mut audio_rx: mpsc::Receiver<AudioFrame>,
    progress: Arc<AtomicU64>,
) -> Result<ClipMetadata> {
    while let Some(frame) = audio_rx.recv().await {
        writer.write_frame(&frame)?;
        progress.store(writer.metadata().sample_count as u64, Ordering::SeqCst);
    }

    let metadata = writer.finish()?;

    info!(
        "Clip complete: {} ({:.1}s, {} samples)",
        metadata.file_path.display(),
        metadata.duration_ms() as f64 / 1000.0,
        metadata.sample_count
    );

    Ok(metadata)
}
