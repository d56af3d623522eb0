use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::multipart;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, info};

use super::messages::{mime_type, upload_file_name, ChatReply, ChatRequest, ErrorBody, VoiceReply};
use super::{BackendError, ChatService, Uploader};
use crate::config::BackendConfig;
use crate::session::AudioClip;

/// HTTP client for the assistant backend
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
    auth_token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration, auth_token: Option<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        info!("Backend client targeting {} (timeout {:?})", base_url, timeout);

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            auth_token: auth_token.filter(|t| !t.is_empty()),
        })
    }

    pub fn from_config(config: &BackendConfig) -> Result<Self> {
        Self::new(
            &config.base_url,
            Duration::from_secs(config.timeout_secs),
            config.auth_token.clone(),
        )
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn post(&self, path: &str) -> reqwest::RequestBuilder {
        let request = self.client.post(self.endpoint(path));
        match &self.auth_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn read<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, BackendError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.bytes().await.unwrap_or_default();
            let detail = serde_json::from_slice::<ErrorBody>(&body)
                .ok()
                .and_then(ErrorBody::into_detail);
            return Err(BackendError::Api {
                status: status.as_u16(),
                detail,
            });
        }

        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl Uploader for ApiClient {
    async fn transcribe_and_respond(
        &self,
        clip: &AudioClip,
        context: Option<&str>,
    ) -> Result<VoiceReply, BackendError> {
        let audio = tokio::fs::read(&clip.uri).await?;
        let size = audio.len();

        let part = multipart::Part::bytes(audio)
            .file_name(upload_file_name(&clip.uri))
            .mime_str(mime_type(&clip.uri))?;

        let mut form = multipart::Form::new().part("audio", part);
        if let Some(context) = context.filter(|c| !c.is_empty()) {
            form = form.text("context_text", context.to_string());
        }

        debug!(
            "Uploading {} ({} bytes, {} ms)",
            clip.uri.display(),
            size,
            clip.duration_ms
        );

        let response = self.post("/process-audio/").multipart(form).send().await?;
        Self::read(response).await
    }
}

#[async_trait]
impl ChatService for ApiClient {
    async fn chat(&self, message: &str, context: Option<&str>) -> Result<ChatReply, BackendError> {
        let request = ChatRequest::new(message, context);
        let response = self.post("/chat/").json(&request).send().await?;
        Self::read(response).await
    }
}
