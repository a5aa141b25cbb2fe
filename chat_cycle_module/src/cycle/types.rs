use std::time::Duration;

use serde::Serialize;

use reply_webhook_module::DEFAULT_WEBHOOK_URL;

use crate::settings_store::{
    SettingsStore, CHAT_COUNT_KEY, CYCLE_DELAY_KEY, DEFAULT_CHAT_LIMIT, DEFAULT_CYCLE_DELAY_MS,
    DEFAULT_MSG_LIMIT, SCAN_LIMIT_KEY, WEBHOOK_URL_KEY,
};

/// Discovery over-fetch: a scan can contain entries that turn out to be
/// unusable, so the candidate scan asks for more than the requested chat
/// count before truncating.
pub(crate) const DISCOVERY_BUFFER: usize = 30;

const DEFAULT_PREVIEW_WINDOW: Duration = Duration::from_secs(5);
const DEFAULT_ITEM_GAP: Duration = Duration::from_secs(3);

#[derive(Debug, thiserror::Error)]
pub enum CycleError {
    #[error("another traversal is already running")]
    AlreadyRunning,
    #[error("single-unread processing already in progress")]
    SingleUnreadBusy,
}

/// Totals of one traversal run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    /// Candidates the run set out to process.
    pub requested: usize,
    /// Candidates whose pipeline was attempted.
    pub processed: usize,
    /// Reply items actually submitted into conversations.
    pub delivered: usize,
    /// Whether the run ended through user cancellation.
    pub cancelled: bool,
}

/// Per-run knobs. `load` pulls the persisted settings with their documented
/// defaults; tests and embedders can also construct a config directly.
#[derive(Debug, Clone)]
pub struct CycleConfig {
    pub chat_count: usize,
    pub message_limit: usize,
    pub webhook_url: String,
    /// Pause between consecutive chats.
    pub inter_chat_delay: Duration,
    /// Cancellable window between reply arrival and delivery.
    pub preview_window: Duration,
    /// Pause between multiple reply items for one chat.
    pub item_gap: Duration,
}

impl CycleConfig {
    pub fn load(store: &dyn SettingsStore) -> Self {
        Self {
            chat_count: store.get_number(CHAT_COUNT_KEY, DEFAULT_CHAT_LIMIT) as usize,
            message_limit: store.get_number(SCAN_LIMIT_KEY, DEFAULT_MSG_LIMIT) as usize,
            webhook_url: store.get_string(WEBHOOK_URL_KEY, DEFAULT_WEBHOOK_URL),
            inter_chat_delay: Duration::from_millis(
                store.get_number(CYCLE_DELAY_KEY, DEFAULT_CYCLE_DELAY_MS),
            ),
            preview_window: DEFAULT_PREVIEW_WINDOW,
            item_gap: DEFAULT_ITEM_GAP,
        }
    }
}
