use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tracing::warn;

use crate::error::{ErrorKind, PttError};

/// Surfaces user-visible errors (toast, alert, status line)
pub trait Notifier: Send + Sync {
    fn notify(&self, error: &PttError);
}

/// A notice as shown to the user
#[derive(Debug, Clone, Serialize)]
pub struct Notice {
    pub kind: ErrorKind,
    pub title: String,
    pub message: String,
    pub at: DateTime<Utc>,
}

impl From<&PttError> for Notice {
    fn from(error: &PttError) -> Self {
        Self {
            kind: error.kind(),
            title: error.title().to_string(),
            message: error.to_string(),
            at: Utc::now(),
        }
    }
}

/// Bounded log of recent notices, polled by clients of the HTTP surface
#[derive(Clone)]
pub struct NoticeLog {
    capacity: usize,
    notices: Arc<Mutex<VecDeque<Notice>>>,
}

impl NoticeLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            notices: Arc::new(Mutex::new(VecDeque::new())),
        }
    }

    pub fn recent(&self) -> Vec<Notice> {
        match self.notices.lock() {
            Ok(notices) => notices.iter().cloned().collect(),
            Err(poisoned) => poisoned.into_inner().iter().cloned().collect(),
        }
    }
}

impl Default for NoticeLog {
    fn default() -> Self {
        Self::new(50)
    }
}

impl Notifier for NoticeLog {
    fn notify(&self, error: &PttError) {
        warn!("{}: {}", error.title(), error);

        let mut notices = match self.notices.lock() {
            Ok(notices) => notices,
            Err(poisoned) => poisoned.into_inner(),
        };
        if notices.len() == self.capacity {
            notices.pop_front();
        }
        notices.push_back(Notice::from(error));
    }
}
