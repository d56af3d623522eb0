use anyhow::Result;
use serde::Deserialize;
use std::path::PathBuf;

use crate::audio::AudioBackendConfig;
use crate::session::PttConfig;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub backend: BackendConfig,
    pub audio: AudioConfig,
    #[serde(default)]
    pub ptt: PttConfig,
    pub context: ContextConfig,
}

#[derive(Debug, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub auth_token: Option<String>,
}

fn default_timeout_secs() -> u64 {
    60 // audio processing can be slow
}

#[derive(Debug, Deserialize)]
pub struct AudioConfig {
    pub recordings_path: String,
    pub sample_rate: u32,
    pub channels: u16,
    #[serde(default = "default_buffer_duration_ms")]
    pub buffer_duration_ms: u64,
    /// WAV file replayed as microphone input
    #[serde(default)]
    pub input_wav: Option<String>,
}

fn default_buffer_duration_ms() -> u64 {
    100
}

impl AudioConfig {
    pub fn recordings_dir(&self) -> Result<PathBuf> {
        expand_path(&self.recordings_path)
    }

    pub fn input_path(&self) -> Result<Option<PathBuf>> {
        self.input_wav.as_deref().map(expand_path).transpose()
    }

    pub fn backend_config(&self) -> AudioBackendConfig {
        AudioBackendConfig {
            target_sample_rate: self.sample_rate,
            target_channels: self.channels,
            buffer_duration_ms: self.buffer_duration_ms,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ContextConfig {
    pub prompt_path: String,
}

impl ContextConfig {
    pub fn prompt_file(&self) -> Result<PathBuf> {
        expand_path(&self.prompt_path)
    }
}

/// Expand `~` and environment variables in a configured path
pub fn expand_path(path: &str) -> Result<PathBuf> {
    Ok(PathBuf::from(shellexpand::full(path)?.into_owned()))
}

impl Config {
    /// Load from a config file, with `CONTEXTUS__SECTION__KEY` environment overrides
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(config::Environment::with_prefix("CONTEXTUS").separator("__"))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}
