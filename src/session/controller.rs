use anyhow::{anyhow, Context, Result};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::config::PttConfig;
use super::feedback::{Feedback, FeedbackSink};
use super::state::{AudioClip, PendingStop, Permission, Phase, RecordingSession, Snapshot, StopRequest};
use crate::audio::{AudioDevice, DeviceError};
use crate::backend::{ChatService, Uploader};
use crate::context::PromptSource;
use crate::conversation::{ConversationSink, Message, Sender};
use crate::error::{NetworkAction, PttError};
use crate::gesture::GestureTracker;
use crate::notify::Notifier;
use crate::pipeline::VoicePipeline;

/// Input to the controller
#[derive(Debug)]
pub enum Command {
    /// The chat surface gained focus: re-check permission, reload the context prompt
    Focus,
    /// Pointer down on the mic button
    Press { x: Option<f32> },
    /// Pointer moved while pressed
    Move { x: f32 },
    /// Pointer up
    Release,
    /// Tear down any live session without processing (screen blur, mode switch)
    Discard,
    SendText { text: String },
    /// Answered once every earlier command has been handled
    Flush(oneshot::Sender<Snapshot>),
    Shutdown,
}

/// External collaborators the controller drives
#[derive(Clone)]
pub struct Collaborators {
    pub device: Arc<dyn AudioDevice>,
    pub uploader: Arc<dyn Uploader>,
    pub chat: Arc<dyn ChatService>,
    pub sink: Arc<dyn ConversationSink>,
    pub notifier: Arc<dyn Notifier>,
    pub feedback: Arc<dyn FeedbackSink>,
    pub prompts: Arc<dyn PromptSource>,
}

/// What teardown recovered from a session
struct Teardown {
    uri: Option<PathBuf>,
    duration_ms: u64,
}

/// Push-to-talk state machine
///
/// Runs as a single task. Every await on a collaborator goes through
/// [`PttController::drive`], which keeps reading the inbox while the call is
/// suspended: presses are ignored, moves update the gesture, and stop
/// requests are parked in the pending-stop slot for the arming path to pick
/// up once the device returns.
pub struct PttController {
    config: PttConfig,
    device: Arc<dyn AudioDevice>,
    chat: Arc<dyn ChatService>,
    sink: Arc<dyn ConversationSink>,
    notifier: Arc<dyn Notifier>,
    feedback: Arc<dyn FeedbackSink>,
    prompts: Arc<dyn PromptSource>,
    pipeline: VoicePipeline,

    inbox: mpsc::Receiver<Command>,
    status_tx: watch::Sender<Snapshot>,

    phase: Phase,
    permission: Permission,
    processing: bool,
    tracker: GestureTracker,
    live: Option<RecordingSession>,
    pending_stop: PendingStop,
    context: String,

    deferred_focus: bool,
    flush_waiters: Vec<oneshot::Sender<Snapshot>>,
    shutting_down: bool,
}

impl PttController {
    pub fn new(config: PttConfig, collaborators: Collaborators) -> (Self, PttHandle) {
        let (commands, inbox) = mpsc::channel(config.inbox_capacity.max(1));
        let (status_tx, status) = watch::channel(Snapshot::default());

        let controller = Self {
            tracker: GestureTracker::new(config.cancel_threshold_px),
            config,
            device: collaborators.device,
            chat: collaborators.chat,
            sink: collaborators.sink,
            notifier: collaborators.notifier,
            feedback: collaborators.feedback,
            prompts: collaborators.prompts,
            pipeline: VoicePipeline::new(collaborators.uploader),
            inbox,
            status_tx,
            phase: Phase::Idle,
            permission: Permission::Unknown,
            processing: false,
            live: None,
            pending_stop: PendingStop::default(),
            context: String::new(),
            deferred_focus: false,
            flush_waiters: Vec::new(),
            shutting_down: false,
        };

        (controller, PttHandle { commands, status })
    }

    /// Create a controller and run it on the current runtime
    pub fn spawn(config: PttConfig, collaborators: Collaborators) -> (PttHandle, JoinHandle<()>) {
        let (controller, handle) = Self::new(config, collaborators);
        let task = tokio::spawn(controller.run());
        (handle, task)
    }

    /// Process commands until shutdown or until every handle is dropped
    pub async fn run(mut self) {
        info!("Push-to-talk controller running");

        while !self.shutting_down {
            let Some(command) = self.inbox.recv().await else {
                break;
            };

            self.dispatch(command).await;
            self.settle().await;
            self.answer_flushes();
        }

        if self.live.is_some() {
            self.finish_session(StopRequest::discard()).await;
        }
        self.answer_flushes();

        info!("Push-to-talk controller stopped");
    }

    async fn dispatch(&mut self, command: Command) {
        match command {
            Command::Focus => self.focus().await,
            Command::Press { x } => self.press(x).await,
            Command::Move { x } => self.track_move(x),
            Command::Release => {
                if self.phase == Phase::Recording {
                    let stop = StopRequest::release(self.tracker.is_cancelling());
                    self.finish_session(stop).await;
                } else {
                    debug!("Release with no live recording");
                }
            }
            Command::Discard => {
                if self.live.is_some() {
                    self.finish_session(StopRequest::discard()).await;
                }
            }
            Command::SendText { text } => self.send_text(&text).await,
            Command::Flush(reply) => self.flush_waiters.push(reply),
            Command::Shutdown => self.shutting_down = true,
        }
    }

    /// Run work left behind by suspensions until none remains: a stop parked
    /// while the recorder was live, then any deferred focus.
    async fn settle(&mut self) {
        loop {
            if let Some(stop) = self.take_parked_stop() {
                debug!("Stop arrived during a suspension; finalizing now");
                self.finish_session(stop).await;
            } else if std::mem::take(&mut self.deferred_focus) {
                self.focus().await;
            } else {
                break;
            }
        }
    }

    fn take_parked_stop(&mut self) -> Option<StopRequest> {
        if self.phase == Phase::Recording && self.live.is_some() {
            self.pending_stop.take()
        } else {
            None
        }
    }

    /// Handle a command that arrived while a collaborator call is suspended
    fn observe(&mut self, command: Command) {
        match command {
            Command::Focus => self.deferred_focus = true,
            Command::Press { .. } => {
                debug!("Ignoring press while {} (processing={})", self.phase, self.processing)
            }
            Command::Move { x } => self.track_move(x),
            Command::Release => {
                if self.phase.is_capturing() {
                    self.pending_stop
                        .park(StopRequest::release(self.tracker.is_cancelling()));
                } else {
                    debug!("Ignoring release while {}", self.phase);
                }
            }
            Command::Discard => {
                if self.phase.is_capturing() {
                    self.pending_stop.park(StopRequest::discard());
                }
            }
            Command::SendText { .. } => info!("Ignoring text message while busy"),
            Command::Flush(reply) => self.flush_waiters.push(reply),
            Command::Shutdown => {
                self.shutting_down = true;
                if self.phase.is_capturing() {
                    self.pending_stop.park(StopRequest::discard());
                }
            }
        }
    }

    /// Await a collaborator call while still servicing the inbox
    async fn drive<F: Future>(&mut self, future: F) -> F::Output {
        tokio::pin!(future);

        loop {
            tokio::select! {
                biased;
                output = &mut future => return output,
                Some(command) = self.inbox.recv() => self.observe(command),
            }
        }
    }

    async fn focus(&mut self) {
        let device = Arc::clone(&self.device);
        match self.drive(device.request_permission()).await {
            Ok(true) => {
                if self.permission != Permission::Granted {
                    info!("Microphone permission granted");
                }
                self.permission = Permission::Granted;
            }
            Ok(false) | Err(DeviceError::PermissionDenied) => self.deny_permission(),
            Err(e) => warn!("Permission request failed: {}", e),
        }

        let prompts = Arc::clone(&self.prompts);
        match self.drive(prompts.load()).await {
            Ok(prompt) => self.context = prompt,
            Err(e) => error!("Failed to load context prompt: {:#}", e),
        }

        self.publish();
    }

    /// Report a denial once per denied streak
    fn deny_permission(&mut self) {
        if self.permission != Permission::Denied {
            self.permission = Permission::Denied;
            self.notifier.notify(&PttError::PermissionDenied);
        }
    }

    async fn press(&mut self, x: Option<f32>) {
        if self.processing {
            debug!("Ignoring press while a previous result is processing");
            return;
        }
        if self.phase != Phase::Idle {
            debug!("Ignoring press while {}", self.phase);
            return;
        }
        if self.permission == Permission::Denied {
            debug!("Ignoring press: microphone permission denied");
            return;
        }

        self.pending_stop.clear();
        self.tracker.on_press_start(x);
        self.set_phase(Phase::Starting);

        if let Some(stale) = self.live.take() {
            warn!("Discarding stale recording before starting a new one");
            if let Some(uri) = self.teardown(stale).await.uri {
                self.remove_clip(&uri).await;
            }
        }

        match self.arm().await {
            Ok(session) => {
                info!("Recording started");
                self.live = Some(session);
                self.set_phase(Phase::Recording);

                if let Some(stop) = self.take_parked_stop() {
                    debug!("Stop arrived while arming; finalizing now");
                    self.finish_session(stop).await;
                }
            }
            Err(e) => self.abort_start(e).await,
        }
    }

    /// Enable recording mode, then create, prepare and start a recorder
    async fn arm(&mut self) -> Result<RecordingSession, DeviceError> {
        let device = Arc::clone(&self.device);
        self.drive(device.set_mode(true)).await?;

        let mut handle = self.drive(device.create_recording()).await?;
        self.drive(handle.prepare()).await?;
        self.drive(handle.start()).await?;

        Ok(RecordingSession::new(handle))
    }

    async fn abort_start(&mut self, e: DeviceError) {
        self.pending_stop.clear();
        self.tracker.reset();
        self.restore_playback_mode().await;
        self.set_phase(Phase::Idle);

        match e {
            DeviceError::NotFound => debug!("Recorder vanished while starting"),
            DeviceError::PermissionDenied => self.deny_permission(),
            e => {
                error!("Failed to start recording: {}", e);
                self.notifier.notify(&PttError::Device(e));
            }
        }
    }

    fn track_move(&mut self, x: f32) {
        if !self.phase.is_capturing() {
            return;
        }

        if let Some(cancelling) = self.tracker.on_move(x) {
            debug!("Slide to cancel: {}", cancelling);
            self.publish();
        }
    }

    /// Finalize the live session and process the clip when accepted
    async fn finish_session(&mut self, stop: StopRequest) {
        let Some(session) = self.live.take() else {
            return;
        };

        self.pending_stop.clear();
        self.tracker.reset();
        self.set_phase(Phase::Finalizing);

        let outcome = self.teardown(session).await;
        let uri = outcome.uri.clone();
        let clip = self.accept(outcome, stop);

        if clip.is_none() {
            if let Some(uri) = uri {
                self.remove_clip(&uri).await;
            }
        }

        self.processing = clip.is_some();
        self.set_phase(Phase::Idle);

        if let Some(clip) = clip {
            self.process_clip(clip).await;
        }
    }

    /// Stop the recorder if needed, resolve the clip, release the handle and
    /// reset the audio mode. Never fails; every step tolerates the previous one failing.
    async fn teardown(&mut self, session: RecordingSession) -> Teardown {
        let RecordingSession { mut handle, started_at } = session;

        let status = match self.drive(handle.status()).await {
            Ok(status) => Some(status),
            Err(e) => {
                debug!("Status query failed, treating recording as stopped: {}", e);
                None
            }
        };

        let mut uri = None;
        let mut duration_ms = status.map(|s| s.duration_ms).unwrap_or(0);

        if status.is_some_and(|s| s.is_active()) {
            match self.drive(handle.stop()).await {
                Ok(stopped) => {
                    uri = stopped.uri;
                    duration_ms = stopped.duration_ms;
                }
                Err(e) if e.is_not_found() => debug!("Recording was already stopped"),
                Err(e) => warn!("Failed to stop active recording: {}", e),
            }
        }

        if uri.is_none() {
            uri = handle.uri().unwrap_or_else(|e| {
                debug!("Clip location unavailable: {}", e);
                None
            });
        }

        drop(handle);
        self.restore_playback_mode().await;

        debug!(
            "Session torn down after {:?} ({} ms captured)",
            started_at.elapsed(),
            duration_ms
        );

        Teardown { uri, duration_ms }
    }

    /// Decide whether a torn-down session is worth processing
    fn accept(&self, outcome: Teardown, stop: StopRequest) -> Option<AudioClip> {
        if !stop.should_process {
            info!("Recording discarded ({} ms)", outcome.duration_ms);
            return None;
        }

        let Some(uri) = outcome.uri else {
            warn!("Recording produced no clip; discarding");
            return None;
        };

        if outcome.duration_ms < self.config.min_duration_ms {
            info!(
                "Recording too short ({} ms < {} ms)",
                outcome.duration_ms, self.config.min_duration_ms
            );
            self.notifier.notify(&PttError::TooShort {
                duration_ms: outcome.duration_ms,
            });
            return None;
        }

        Some(AudioClip {
            uri,
            duration_ms: outcome.duration_ms,
        })
    }

    async fn process_clip(&mut self, clip: AudioClip) {
        info!("Processing clip {} ({} ms)", clip.uri.display(), clip.duration_ms);

        let pipeline = self.pipeline.clone();
        let context = self.request_context();

        match self.drive(pipeline.process(&clip, context.as_deref())).await {
            Ok(messages) => {
                let sink = Arc::clone(&self.sink);
                for message in messages {
                    self.drive(sink.append(message)).await;
                }
            }
            Err(e) => self.notifier.notify(&e),
        }

        self.remove_clip(&clip.uri).await;

        self.processing = false;
        self.publish();
    }

    /// Delete a clip that will not be processed again
    async fn remove_clip(&mut self, uri: &Path) {
        let device = Arc::clone(&self.device);
        match self.drive(device.remove_clip(uri)).await {
            Ok(()) => debug!("Removed clip {}", uri.display()),
            Err(e) if e.is_not_found() => debug!("Clip {} already gone", uri.display()),
            Err(e) => warn!("Failed to remove clip {}: {}", uri.display(), e),
        }
    }

    async fn send_text(&mut self, text: &str) {
        let Some(message) = Message::from_trimmed(text, Sender::User) else {
            return;
        };

        if self.processing || !self.phase.is_idle() {
            info!("Ignoring text message while busy");
            return;
        }

        self.processing = true;
        self.publish();

        let outgoing = message.text.clone();
        let sink = Arc::clone(&self.sink);
        self.drive(sink.append(message)).await;

        let chat = Arc::clone(&self.chat);
        let context = self.request_context();

        match self.drive(chat.chat(&outgoing, context.as_deref())).await {
            Ok(reply) => match Message::from_trimmed(&reply.response, Sender::Assistant) {
                Some(answer) => self.drive(sink.append(answer)).await,
                None => debug!("Assistant returned an empty reply"),
            },
            Err(e) => {
                error!("Failed to send text message: {}", e);
                self.notifier
                    .notify(&PttError::network(NetworkAction::SendMessage, &e));
            }
        }

        self.processing = false;
        self.publish();
    }

    async fn restore_playback_mode(&mut self) {
        let device = Arc::clone(&self.device);
        if let Err(e) = self.drive(device.set_mode(false)).await {
            warn!("Failed to reset audio mode: {}", e);
        }
    }

    fn request_context(&self) -> Option<String> {
        (!self.context.is_empty()).then(|| self.context.clone())
    }

    fn set_phase(&mut self, phase: Phase) {
        self.phase = phase;
        self.publish();
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            phase: self.phase,
            is_cancelling: self.tracker.is_cancelling(),
            is_processing: self.processing,
            permission: self.permission,
            recording_since: self
                .live
                .as_ref()
                .filter(|_| self.phase == Phase::Recording)
                .map(|session| session.started_at),
        }
    }

    /// Publish the current snapshot and its feedback, if anything changed
    fn publish(&self) {
        let next = self.snapshot();
        let prev = self.status_tx.borrow().clone();
        if prev == next {
            return;
        }

        self.feedback.apply(&Feedback::project(&prev, &next));
        self.status_tx.send_replace(next);
    }

    fn answer_flushes(&mut self) {
        let snapshot = self.snapshot();
        for waiter in self.flush_waiters.drain(..) {
            let _ = waiter.send(snapshot.clone());
        }
    }
}

/// Cloneable front end to a running controller
#[derive(Clone)]
pub struct PttHandle {
    commands: mpsc::Sender<Command>,
    status: watch::Receiver<Snapshot>,
}

impl PttHandle {
    async fn send(&self, command: Command) -> Result<()> {
        self.commands
            .send(command)
            .await
            .map_err(|_| anyhow!("Push-to-talk controller is not running"))
    }

    pub async fn focus(&self) -> Result<()> {
        self.send(Command::Focus).await
    }

    pub async fn press(&self, x: Option<f32>) -> Result<()> {
        self.send(Command::Press { x }).await
    }

    pub async fn move_to(&self, x: f32) -> Result<()> {
        self.send(Command::Move { x }).await
    }

    pub async fn release(&self) -> Result<()> {
        self.send(Command::Release).await
    }

    pub async fn discard(&self) -> Result<()> {
        self.send(Command::Discard).await
    }

    pub async fn send_text(&self, text: impl Into<String>) -> Result<()> {
        self.send(Command::SendText { text: text.into() }).await
    }

    /// Wait until every command sent before this one has been handled
    pub async fn flush(&self) -> Result<Snapshot> {
        let (reply, done) = oneshot::channel();
        self.send(Command::Flush(reply)).await?;
        done.await
            .context("Push-to-talk controller stopped before flushing")
    }

    pub async fn shutdown(&self) -> Result<()> {
        self.send(Command::Shutdown).await
    }

    /// Latest published snapshot
    pub fn snapshot(&self) -> Snapshot {
        self.status.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.status.clone()
    }
}
