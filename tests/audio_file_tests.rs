// Integration tests for audio file loading
//
// These tests verify that we can read WAV files and extract audio data correctly.

use anyhow::Result;
use contextus_ptt::audio::AudioFile;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn write_fixture(dir: &Path, sample_rate: u32, channels: u16, samples: &[i16]) -> Result<PathBuf> {
    let path = dir.join("fixture.wav");
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
fn test_audio_file_open() -> Result<()> {
    let dir = TempDir::new()?;
    let path = write_fixture(dir.path(), 16000, 1, &vec![7i16; 16000])?;

    let audio = AudioFile::open(&path)?;

    assert_eq!(audio.sample_rate, 16000);
    assert_eq!(audio.channels, 1);
    assert_eq!(audio.samples.len(), 16000);
    assert_eq!(audio.duration_ms(), 1000);
    assert!(audio.path.contains("fixture.wav"));

    Ok(())
}

#[test]
fn test_audio_file_stereo_duration() -> Result<()> {
    let dir = TempDir::new()?;
    let path = write_fixture(dir.path(), 8000, 2, &vec![0i16; 8000])?;

    let audio = AudioFile::open(&path)?;

    assert_eq!(audio.duration_ms(), 500, "Interleaved stereo halves the duration");
    Ok(())
}

#[test]
fn test_audio_file_nonexistent() {
    let result = AudioFile::open(PathBuf::from("/nonexistent/path/to/audio.wav"));

    assert!(result.is_err(), "Opening nonexistent file should fail");
}

#[test]
fn test_audio_file_not_wav() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("note.wav");
    std::fs::write(&path, b"not a wav file")?;

    assert!(AudioFile::open(&path).is_err());
    Ok(())
}

#[test]
fn test_conform_rejects_upsampling() -> Result<()> {
    let dir = TempDir::new()?;
    let path = write_fixture(dir.path(), 8000, 1, &vec![0i16; 800])?;

    let audio = AudioFile::open(&path)?;

    assert!(audio.conform(16000, 1).is_err());
    assert_eq!(audio.conform(8000, 1)?.len(), 800);
    Ok(())
}
