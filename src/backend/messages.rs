use serde::{Deserialize, Serialize};
use std::path::Path;

/// Response of `POST /process-audio/`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VoiceReply {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub subscription_status: Option<String>,
    #[serde(default)]
    pub transcription: String,
    #[serde(default)]
    pub response: String,
}

/// Body of `POST /chat/`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_text: Option<String>,
}

impl ChatRequest {
    /// The context is trimmed and omitted entirely when blank
    pub fn new(message: &str, context: Option<&str>) -> Self {
        Self {
            message: message.to_string(),
            context_text: context
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(str::to_string),
        }
    }
}

/// Response of `POST /chat/`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatReply {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub response: String,
}

/// Error body of a failed request, e.g. `{"detail": "Invalid token"}`
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    pub detail: Option<serde_json::Value>,
}

impl ErrorBody {
    /// Validation errors carry a list instead of a string; render those as JSON
    pub fn into_detail(self) -> Option<String> {
        match self.detail? {
            serde_json::Value::String(s) => Some(s),
            serde_json::Value::Null => None,
            other => Some(other.to_string()),
        }
    }
}

/// File name sent with the upload; paths without an extension fall back to `audio.m4a`
pub fn upload_file_name(path: &Path) -> String {
    match path.file_name().and_then(|n| n.to_str()) {
        Some(name) if name.contains('.') => name.to_string(),
        _ => "audio.m4a".to_string(),
    }
}

/// Content type inferred from the clip extension
pub fn mime_type(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("wav") => "audio/wav",
        Some("mp3") => "audio/mpeg",
        Some("aac") => "audio/aac",
        Some("3gp") | Some("3gpp") => "audio/3gpp",
        _ => "audio/m4a",
    }
}
