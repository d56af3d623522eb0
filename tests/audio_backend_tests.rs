// Tests for the audio backend abstractions and file replay
//
// Input fixtures are generated with hound into a temporary directory.

use anyhow::Result;
use contextus_ptt::audio::{AudioBackendConfig, AudioBackendFactory, AudioFrame, AudioSource};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn write_fixture(dir: &Path, name: &str, sample_rate: u32, channels: u16, samples: &[i16]) -> Result<PathBuf> {
    let path = dir.join(name);
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(&path, spec)?;
    for &sample in samples {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;
    Ok(path)
}

#[test]
fn test_audio_frame_duration() {
    let frame = AudioFrame {
        samples: vec![0; 1600],
        sample_rate: 16000,
        channels: 1,
        timestamp_ms: 0,
    };
    assert_eq!(frame.duration_ms(), 100);

    let stereo = AudioFrame {
        samples: vec![0; 3200],
        sample_rate: 16000,
        channels: 2,
        timestamp_ms: 0,
    };
    assert_eq!(stereo.duration_ms(), 100, "Stereo samples are interleaved");
}

#[test]
fn test_audio_backend_config_default() {
    let config = AudioBackendConfig::default();

    assert_eq!(config.target_sample_rate, 16000, "Default should be 16kHz speech");
    assert_eq!(config.target_channels, 1, "Default should be mono");
    assert_eq!(config.buffer_duration_ms, 100, "Default buffer should be 100ms");
}

#[test]
fn test_microphone_source_is_unavailable() {
    let result = AudioBackendFactory::create(AudioSource::Microphone, AudioBackendConfig::default());
    let err = result.err().expect("microphone backend should not be available");
    assert!(err.to_string().contains("input_wav"));
}

#[test]
fn test_file_source_rejects_missing_file() {
    let result = AudioBackendFactory::create(
        AudioSource::File(PathBuf::from("/nonexistent/input.wav")),
        AudioBackendConfig::default(),
    );
    assert!(result.is_err());
}

#[test]
fn test_file_source_rejects_empty_file() -> Result<()> {
    let dir = TempDir::new()?;
    let path = write_fixture(dir.path(), "empty.wav", 16000, 1, &[])?;

    let result = AudioBackendFactory::create(AudioSource::File(path), AudioBackendConfig::default());
    assert!(result.is_err(), "An empty input cannot be replayed");
    Ok(())
}

#[test]
fn test_file_source_rejects_zero_buffer_duration() -> Result<()> {
    let dir = TempDir::new()?;
    let path = write_fixture(dir.path(), "input.wav", 16000, 1, &[0; 1600])?;
    let config = AudioBackendConfig {
        buffer_duration_ms: 0,
        ..Default::default()
    };

    let err = AudioBackendFactory::create(AudioSource::File(path), config)
        .err()
        .expect("a zero-length frame cannot be paced");
    assert!(err.to_string().contains("buffer_duration_ms"));
    Ok(())
}

#[tokio::test]
async fn test_file_backend_replays_in_buffer_sized_frames() -> Result<()> {
    let dir = TempDir::new()?;
    // 250 ms of 16 kHz mono, shorter than three frames so replay must loop
    let samples: Vec<i16> = (0..4000).map(|i| (i % 100) as i16).collect();
    let path = write_fixture(dir.path(), "input.wav", 16000, 1, &samples)?;

    let mut backend = AudioBackendFactory::create(AudioSource::File(path), AudioBackendConfig::default())?;
    assert!(backend.name().starts_with("file:"));
    assert!(!backend.is_capturing());

    let mut rx = backend.start().await?;
    assert!(backend.is_capturing());

    let mut frames = Vec::new();
    for _ in 0..3 {
        frames.push(rx.recv().await.expect("frame"));
    }

    backend.stop().await?;
    assert!(!backend.is_capturing());

    for (i, frame) in frames.iter().enumerate() {
        assert_eq!(frame.samples.len(), 1600);
        assert_eq!(frame.sample_rate, 16000);
        assert_eq!(frame.channels, 1);
        assert_eq!(frame.timestamp_ms, i as u64 * 100);
    }

    // Third frame wraps past the end of the input
    assert_eq!(frames[2].samples[800], samples[0]);

    // Channel closes once the backend stops
    while rx.recv().await.is_some() {}
    Ok(())
}

#[tokio::test]
async fn test_file_backend_conforms_stereo_input() -> Result<()> {
    let dir = TempDir::new()?;
    let samples = vec![1000i16; 32000 * 2 / 10]; // 100 ms of 32 kHz stereo
    let path = write_fixture(dir.path(), "stereo.wav", 32000, 2, &samples)?;

    let mut backend = AudioBackendFactory::create(AudioSource::File(path), AudioBackendConfig::default())?;
    let mut rx = backend.start().await?;
    let frame = rx.recv().await.expect("frame");
    backend.stop().await?;

    assert_eq!(frame.channels, 1);
    assert_eq!(frame.sample_rate, 16000);
    assert_eq!(frame.samples.len(), 1600);
    Ok(())
}
