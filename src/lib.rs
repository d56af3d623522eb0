pub mod audio;
pub mod backend;
pub mod config;
pub mod context;
pub mod conversation;
pub mod error;
pub mod gesture;
pub mod http;
pub mod notify;
pub mod pipeline;
pub mod session;

pub use audio::{
    AudioBackend, AudioBackendConfig, AudioBackendFactory, AudioDevice, AudioFile, AudioFrame,
    AudioSource, ClipMetadata, ClipWriter, DeviceError, RecordingHandle, RecordingStatus,
    StoppedRecording, WavAudioDevice, WavDeviceConfig,
};
pub use backend::{ApiClient, BackendError, ChatReply, ChatService, Uploader, VoiceReply};
pub use config::Config;
pub use context::{PromptSource, PromptStore};
pub use conversation::{Conversation, ConversationSink, Message, Sender};
pub use error::{ErrorKind, NetworkAction, PttError};
pub use gesture::GestureTracker;
pub use http::{create_router, AppState};
pub use notify::{Notice, NoticeLog, Notifier};
pub use pipeline::{validate_clip, ValidationError, VoicePipeline};
pub use session::{
    AudioClip, Collaborators, Feedback, FeedbackSink, Phase, PttConfig, PttController, PttHandle,
    Snapshot, StopRequest,
};
