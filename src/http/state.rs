use crate::context::PromptStore;
use crate::conversation::Conversation;
use crate::notify::NoticeLog;
use crate::session::PttHandle;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Front end to the push-to-talk controller
    pub ptt: PttHandle,
    /// Messages appended by the controller
    pub conversation: Conversation,
    /// Notices raised by the controller
    pub notices: NoticeLog,
    /// Context prompt storage
    pub prompts: PromptStore,
}

impl AppState {
    pub fn new(ptt: PttHandle, conversation: Conversation, notices: NoticeLog, prompts: PromptStore) -> Self {
        Self {
            ptt,
            conversation,
            notices,
            prompts,
        }
    }
}
