//! Context prompt storage
//!
//! The context prompt is free text the user configures once and that is
//! forwarded verbatim with every voice and text request.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::PathBuf;
use tracing::info;

/// Source of the context prompt, read each time the chat surface gains focus
#[async_trait]
pub trait PromptSource: Send + Sync {
    async fn load(&self) -> Result<String>;
}

/// A fixed prompt
#[async_trait]
impl PromptSource for String {
    async fn load(&self) -> Result<String> {
        Ok(self.clone())
    }
}

/// File-backed prompt store
#[derive(Debug, Clone)]
pub struct PromptStore {
    path: PathBuf,
}

impl PromptStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Save a trimmed prompt. Blank prompts clear the stored value.
    pub async fn save(&self, prompt: &str) -> Result<()> {
        let trimmed = prompt.trim();

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        tokio::fs::write(&self.path, trimmed)
            .await
            .with_context(|| format!("Failed to write context prompt to {}", self.path.display()))?;

        info!("Saved context prompt ({} chars)", trimmed.chars().count());
        Ok(())
    }
}

#[async_trait]
impl PromptSource for PromptStore {
    async fn load(&self) -> Result<String> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(prompt) => Ok(prompt),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(String::new()),
            Err(e) => Err(e).with_context(|| format!("Failed to read context prompt from {}", self.path.display())),
        }
    }
}
