use anyhow::{Context, Result};
use hound::WavReader;
use std::path::Path;
use tracing::info;

pub struct AudioFile {
    pub path: String,
    pub duration_seconds: f64,
    pub sample_rate: u32,
    pub channels: u16,
    pub samples: Vec<i16>,
}

impl AudioFile {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Opening audio file: {}", path.display());

        let reader = WavReader::open(path).context("Failed to open WAV file")?;

        let spec = reader.spec();
        let samples: Vec<i16> = reader
            .into_samples::<i16>()
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to read audio samples")?;

        let duration_seconds = samples.len() as f64 / (spec.sample_rate as f64 * spec.channels as f64);

        info!(
            "Audio file loaded: {:.1}s, {}Hz, {} channels, {} samples",
            duration_seconds,
            spec.sample_rate,
            spec.channels,
            samples.len()
        );

        Ok(Self {
            path: path.display().to_string(),
            duration_seconds,
            sample_rate: spec.sample_rate,
            channels: spec.channels,
            samples,
        })
    }

    pub fn duration_ms(&self) -> u64 {
        (self.duration_seconds * 1000.0).round() as u64
    }

    /// Convert the samples to the target rate and channel layout.
    ///
    /// Only integer-ratio downsampling and stereo to mono are supported.
    pub fn conform(&self, target_sample_rate: u32, target_channels: u16) -> Result<Vec<i16>> {
        let mut samples = self.samples.clone();
        let mut channels = self.channels;

        if channels != target_channels {
            if channels == 2 && target_channels == 1 {
                samples = stereo_to_mono(&samples);
                channels = 1;
            } else {
                anyhow::bail!(
                    "Cannot convert {} channels to {} channels",
                    channels,
                    target_channels
                );
            }
        }

        if self.sample_rate != target_sample_rate {
            if self.sample_rate < target_sample_rate || self.sample_rate % target_sample_rate != 0 {
                anyhow::bail!(
                    "Resampling not supported: {}Hz -> {}Hz",
                    self.sample_rate,
                    target_sample_rate
                );
            }
            let ratio = (self.sample_rate / target_sample_rate) as usize;
            samples = decimate(&samples, channels as usize, ratio);
        }

        Ok(samples)
    }
}

/// Keep every Nth interleaved frame
fn decimate(samples: &[i16], channels: usize, ratio: usize) -> Vec<i16> {
    samples
        .chunks_exact(channels)
        .step_by(ratio)
        .flatten()
        .copied()
        .collect()
}

/// Sum left and right channels, clamped to the i16 range
fn stereo_to_mono(samples: &[i16]) -> Vec<i16> {
    samples
        .chunks_exact(2)
        .map(|pair| (pair[0] as i32 + pair[1] as i32).clamp(i16::MIN as i32, i16::MAX as i32) as i16)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(samples: Vec<i16>, sample_rate: u32, channels: u16) -> AudioFile {
        AudioFile {
            path: "memory".to_string(),
            duration_seconds: samples.len() as f64 / (sample_rate as f64 * channels as f64),
            sample_rate,
            channels,
            samples,
        }
    }

    #[test]
    fn test_conform_passthrough() {
        let audio = file(vec![1, 2, 3, 4], 16000, 1);
        assert_eq!(audio.conform(16000, 1).unwrap(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_conform_stereo_to_mono_clamps() {
        let audio = file(vec![100, 200, i16::MAX, 10], 16000, 2);
        assert_eq!(audio.conform(16000, 1).unwrap(), vec![300, i16::MAX]);
    }

    #[test]
    fn test_conform_decimates_48k() {
        let audio = file((0..12).collect(), 48000, 1);
        assert_eq!(audio.conform(16000, 1).unwrap(), vec![0, 3, 6, 9]);
    }

    #[test]
    fn test_conform_rejects_upsampling() {
        let audio = file(vec![0; 10], 8000, 1);
        assert!(audio.conform(16000, 1).is_err());
    }
}
