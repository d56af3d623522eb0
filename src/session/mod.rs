//! Push-to-talk recording session management
//!
//! This module provides the controller that owns the capture state machine:
//! - Arming the recorder on press and tracking slide-to-cancel
//! - Finalizing on release, discard, or device failure
//! - Enforcing the minimum clip duration
//! - Handing accepted clips to the processing pipeline
//! - Publishing snapshots and feedback after every transition

mod config;
mod controller;
mod feedback;
mod state;

pub use config::{PttConfig, MIN_DURATION_MS};
pub use controller::{Collaborators, Command, PttController, PttHandle};
pub use feedback::{
    format_duration, Feedback, FeedbackSink, HapticPulse, MicColor, Overlay, TracingFeedback,
    CANCELLING_SCALE, IDLE_SCALE, RECORDING_SCALE,
};
pub use state::{AudioClip, Permission, Phase, Snapshot, StopRequest};
