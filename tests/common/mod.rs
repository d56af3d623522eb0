// Shared fakes for controller integration tests
//
// Timing is measured on the tokio clock so tests can run with paused time.

#![allow(dead_code)]

use async_trait::async_trait;
use contextus_ptt::audio::{AudioDevice, DeviceError, RecordingHandle, RecordingStatus, StoppedRecording};
use contextus_ptt::backend::{BackendError, ChatReply, ChatService, Uploader, VoiceReply};
use contextus_ptt::notify::NoticeLog;
use contextus_ptt::session::{AudioClip, Collaborators, Feedback, FeedbackSink, PttConfig, PttController, PttHandle};
use contextus_ptt::Conversation;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Scripted device behaviour
#[derive(Debug, Clone)]
pub struct Script {
    pub start_delay: Duration,
    pub stop_delay: Duration,
    /// How long `request_permission` takes to answer
    pub permission_delay: Duration,
    /// `start` fails with this message
    pub start_error: Option<String>,
    /// `stop` reports the recorder as already gone
    pub stop_not_found: bool,
    /// Bytes written to the clip on stop
    pub clip_bytes: usize,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            start_delay: Duration::ZERO,
            stop_delay: Duration::ZERO,
            permission_delay: Duration::ZERO,
            start_error: None,
            stop_not_found: false,
            clip_bytes: 2048,
        }
    }
}

pub struct FakeDevice {
    dir: PathBuf,
    script: Mutex<Script>,
    permission: AtomicBool,
    mode: Arc<AtomicBool>,
    modes: Mutex<Vec<bool>>,
    events: Arc<Mutex<Vec<String>>>,
    removed: Mutex<Vec<PathBuf>>,
    next_id: AtomicUsize,
}

impl FakeDevice {
    pub fn new(dir: PathBuf, script: Script) -> Self {
        Self {
            dir,
            script: Mutex::new(script),
            permission: AtomicBool::new(true),
            mode: Arc::new(AtomicBool::new(false)),
            modes: Mutex::new(Vec::new()),
            events: Arc::new(Mutex::new(Vec::new())),
            removed: Mutex::new(Vec::new()),
            next_id: AtomicUsize::new(1),
        }
    }

    pub fn set_permission(&self, granted: bool) {
        self.permission.store(granted, Ordering::SeqCst);
    }

    pub fn set_script(&self, script: Script) {
        *self.script.lock().unwrap() = script;
    }

    /// Every `set_mode` call, in order
    pub fn modes(&self) -> Vec<bool> {
        self.modes.lock().unwrap().clone()
    }

    pub fn recording_enabled(&self) -> bool {
        self.mode.load(Ordering::SeqCst)
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.events().iter().filter(|e| e.starts_with(prefix)).count()
    }

    /// Every clip the controller asked to delete, in order
    pub fn removed(&self) -> Vec<PathBuf> {
        self.removed.lock().unwrap().clone()
    }
}

#[async_trait]
impl AudioDevice for FakeDevice {
    async fn request_permission(&self) -> Result<bool, DeviceError> {
        let delay = self.script.lock().unwrap().permission_delay;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        Ok(self.permission.load(Ordering::SeqCst))
    }

    async fn set_mode(&self, recording_enabled: bool) -> Result<(), DeviceError> {
        self.mode.store(recording_enabled, Ordering::SeqCst);
        self.modes.lock().unwrap().push(recording_enabled);
        Ok(())
    }

    async fn create_recording(&self) -> Result<Box<dyn RecordingHandle>, DeviceError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.events.lock().unwrap().push(format!("create:{}", id));

        Ok(Box::new(FakeHandle {
            id,
            path: self.dir.join(format!("clip-{}.wav", id)),
            script: self.script.lock().unwrap().clone(),
            mode: Arc::clone(&self.mode),
            events: Arc::clone(&self.events),
            prepared: false,
            started_at: None,
        }))
    }

    async fn remove_clip(&self, uri: &Path) -> Result<(), DeviceError> {
        self.removed.lock().unwrap().push(uri.to_path_buf());
        match std::fs::remove_file(uri) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(DeviceError::NotFound),
            Err(e) => Err(DeviceError::failed(e.to_string())),
        }
    }

    fn name(&self) -> &str {
        "fake"
    }
}

struct FakeHandle {
    id: usize,
    path: PathBuf,
    script: Script,
    mode: Arc<AtomicBool>,
    events: Arc<Mutex<Vec<String>>>,
    prepared: bool,
    started_at: Option<Instant>,
}

impl FakeHandle {
    fn log(&self, event: &str) {
        self.events.lock().unwrap().push(format!("{}:{}", event, self.id));
    }
}

#[async_trait]
impl RecordingHandle for FakeHandle {
    async fn prepare(&mut self) -> Result<(), DeviceError> {
        self.prepared = true;
        self.log("prepare");
        Ok(())
    }

    async fn start(&mut self) -> Result<(), DeviceError> {
        if !self.script.start_delay.is_zero() {
            tokio::time::sleep(self.script.start_delay).await;
        }
        if let Some(message) = &self.script.start_error {
            self.log("start-failed");
            return Err(DeviceError::failed(message.clone()));
        }
        if !self.mode.load(Ordering::SeqCst) {
            return Err(DeviceError::ModeDisabled);
        }

        self.started_at = Some(Instant::now());
        self.log("start");
        Ok(())
    }

    async fn stop(&mut self) -> Result<StoppedRecording, DeviceError> {
        if !self.script.stop_delay.is_zero() {
            tokio::time::sleep(self.script.stop_delay).await;
        }
        self.log("stop");

        let Some(started_at) = self.started_at.take() else {
            return Err(DeviceError::NotFound);
        };
        self.prepared = false;

        if self.script.stop_not_found {
            return Err(DeviceError::NotFound);
        }

        std::fs::write(&self.path, vec![0u8; self.script.clip_bytes])
            .map_err(|e| DeviceError::failed(e.to_string()))?;

        Ok(StoppedRecording {
            uri: Some(self.path.clone()),
            duration_ms: started_at.elapsed().as_millis() as u64,
        })
    }

    async fn status(&self) -> Result<RecordingStatus, DeviceError> {
        Ok(RecordingStatus {
            is_recording: self.started_at.is_some(),
            can_record: self.prepared,
            duration_ms: self
                .started_at
                .map(|t| t.elapsed().as_millis() as u64)
                .unwrap_or(0),
        })
    }

    fn uri(&self) -> Result<Option<PathBuf>, DeviceError> {
        Ok(self.path.exists().then(|| self.path.clone()))
    }
}

impl Drop for FakeHandle {
    fn drop(&mut self) {
        self.log("release");
    }
}

/// Records uploads and answers with a scripted reply
pub struct FakeUploader {
    reply: Mutex<Result<VoiceReply, (u16, Option<String>)>>,
    calls: Mutex<Vec<(AudioClip, Option<String>)>>,
}

impl FakeUploader {
    pub fn replying(transcription: &str, response: &str) -> Self {
        Self {
            reply: Mutex::new(Ok(VoiceReply {
                success: true,
                transcription: transcription.to_string(),
                response: response.to_string(),
                ..Default::default()
            })),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(status: u16, detail: Option<&str>) -> Self {
        Self {
            reply: Mutex::new(Err((status, detail.map(str::to_string)))),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<(AudioClip, Option<String>)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Uploader for FakeUploader {
    async fn transcribe_and_respond(
        &self,
        clip: &AudioClip,
        context: Option<&str>,
    ) -> Result<VoiceReply, BackendError> {
        self.calls
            .lock()
            .unwrap()
            .push((clip.clone(), context.map(str::to_string)));

        match &*self.reply.lock().unwrap() {
            Ok(reply) => Ok(reply.clone()),
            Err((status, detail)) => Err(BackendError::Api {
                status: *status,
                detail: detail.clone(),
            }),
        }
    }
}

pub struct FakeChat {
    reply: Mutex<Result<String, (u16, Option<String>)>>,
    calls: Mutex<Vec<(String, Option<String>)>>,
    delay: Duration,
}

impl FakeChat {
    pub fn replying(response: &str) -> Self {
        Self {
            reply: Mutex::new(Ok(response.to_string())),
            calls: Mutex::new(Vec::new()),
            delay: Duration::ZERO,
        }
    }

    pub fn failing(status: u16, detail: Option<&str>) -> Self {
        Self {
            reply: Mutex::new(Err((status, detail.map(str::to_string)))),
            calls: Mutex::new(Vec::new()),
            delay: Duration::ZERO,
        }
    }

    /// Answer only after `delay` has passed
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> Vec<(String, Option<String>)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatService for FakeChat {
    async fn chat(&self, message: &str, context: Option<&str>) -> Result<ChatReply, BackendError> {
        self.calls
            .lock()
            .unwrap()
            .push((message.to_string(), context.map(str::to_string)));

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        match &*self.reply.lock().unwrap() {
            Ok(response) => Ok(ChatReply {
                success: true,
                response: response.clone(),
            }),
            Err((status, detail)) => Err(BackendError::Api {
                status: *status,
                detail: detail.clone(),
            }),
        }
    }
}

/// Keeps every feedback value the controller applies
#[derive(Default)]
pub struct RecordingFeedback {
    applied: Mutex<Vec<Feedback>>,
}

impl RecordingFeedback {
    pub fn applied(&self) -> Vec<Feedback> {
        self.applied.lock().unwrap().clone()
    }

    pub fn haptics(&self) -> Vec<u64> {
        self.applied()
            .iter()
            .filter_map(|f| f.haptic.map(|h| h.duration_ms))
            .collect()
    }
}

impl FeedbackSink for RecordingFeedback {
    fn apply(&self, feedback: &Feedback) {
        self.applied.lock().unwrap().push(*feedback);
    }
}

/// A running controller wired to fakes
pub struct Harness {
    pub ptt: PttHandle,
    pub task: JoinHandle<()>,
    pub device: Arc<FakeDevice>,
    pub uploader: Arc<FakeUploader>,
    pub chat: Arc<FakeChat>,
    pub conversation: Conversation,
    pub notices: NoticeLog,
    pub feedback: Arc<RecordingFeedback>,
    pub dir: TempDir,
}

pub struct HarnessBuilder {
    script: Script,
    uploader: FakeUploader,
    chat: FakeChat,
    prompt: String,
}

impl Default for HarnessBuilder {
    fn default() -> Self {
        Self {
            script: Script::default(),
            uploader: FakeUploader::replying("hello", "hi there"),
            chat: FakeChat::replying("olá"),
            prompt: String::new(),
        }
    }
}

impl HarnessBuilder {
    pub fn script(mut self, script: Script) -> Self {
        self.script = script;
        self
    }

    pub fn uploader(mut self, uploader: FakeUploader) -> Self {
        self.uploader = uploader;
        self
    }

    pub fn chat(mut self, chat: FakeChat) -> Self {
        self.chat = chat;
        self
    }

    pub fn prompt(mut self, prompt: &str) -> Self {
        self.prompt = prompt.to_string();
        self
    }

    pub fn spawn(self) -> Harness {
        let dir = TempDir::new().unwrap();
        let device = Arc::new(FakeDevice::new(dir.path().to_path_buf(), self.script));
        let uploader = Arc::new(self.uploader);
        let chat = Arc::new(self.chat);
        let conversation = Conversation::new();
        let notices = NoticeLog::default();
        let feedback = Arc::new(RecordingFeedback::default());

        let collaborators = Collaborators {
            device: device.clone(),
            uploader: uploader.clone(),
            chat: chat.clone(),
            sink: Arc::new(conversation.clone()),
            notifier: Arc::new(notices.clone()),
            feedback: feedback.clone(),
            prompts: Arc::new(self.prompt),
        };

        let (ptt, task) = PttController::spawn(PttConfig::default(), collaborators);

        Harness {
            ptt,
            task,
            device,
            uploader,
            chat,
            conversation,
            notices,
            feedback,
            dir,
        }
    }
}

impl Harness {
    pub fn builder() -> HarnessBuilder {
        HarnessBuilder::default()
    }

    pub fn spawn() -> Harness {
        HarnessBuilder::default().spawn()
    }

    /// Press, hold for `held`, then release, and wait for processing to finish
    pub async fn hold(&self, x: f32, held: Duration) {
        self.ptt.press(Some(x)).await.unwrap();
        tokio::time::sleep(held).await;
        self.ptt.release().await.unwrap();
        self.ptt.flush().await.unwrap();
    }
}
