//! HTTP API for driving the push-to-talk core from a thin client
//!
//! This module provides a REST API mirroring the mic button gestures:
//! - POST /ptt/press, /ptt/move, /ptt/release - Gesture events
//! - POST /ptt/discard - Drop the live recording silently
//! - POST /ptt/focus - Re-check permission and reload the context prompt
//! - GET /ptt/status - Controller snapshot with feedback and overlay
//! - POST /chat/send - Send typed text
//! - GET /conversation, GET /notices - Messages and user-visible notices
//! - GET/PUT /context - Context prompt
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
