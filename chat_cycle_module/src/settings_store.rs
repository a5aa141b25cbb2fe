//! Key/value configuration seam.
//!
//! Settings live in the host's persistent key/value storage; the core only
//! needs get/set with documented fallbacks. Key names match the storage
//! keys the extension has always used.

use std::collections::HashMap;
use std::sync::Mutex;

pub const SCAN_LIMIT_KEY: &str = "scanLimit";
pub const CHAT_COUNT_KEY: &str = "chatCount";
pub const WEBHOOK_URL_KEY: &str = "webhookUrl";
pub const CYCLE_DELAY_KEY: &str = "cycleDelayMs";
pub const AUTO_RESPONDER_KEY: &str = "autoResponderActive";
pub const MESSAGE_COUNT_KEY: &str = "messageCount";
pub const LAST_CHECKED_KEY: &str = "lastCheckedTime";

/// Messages extracted per conversation when `scanLimit` is unset.
pub const DEFAULT_MSG_LIMIT: u64 = 10;

/// Chats processed per bulk run when `chatCount` is unset.
pub const DEFAULT_CHAT_LIMIT: u64 = 10;

/// Pause between consecutive chats when `cycleDelayMs` is unset.
pub const DEFAULT_CYCLE_DELAY_MS: u64 = 1800;

pub trait SettingsStore: Send + Sync {
    fn get_string(&self, key: &str, fallback: &str) -> String;
    fn get_number(&self, key: &str, fallback: u64) -> u64;
    fn set(&self, key: &str, value: &str);
}

/// In-memory store for tests and headless runs.
#[derive(Debug, Default)]
pub struct MemorySettingsStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsStore for MemorySettingsStore {
    fn get_string(&self, key: &str, fallback: &str) -> String {
        self.values
            .lock()
            .expect("settings lock poisoned")
            .get(key)
            .cloned()
            .unwrap_or_else(|| fallback.to_string())
    }

    fn get_number(&self, key: &str, fallback: u64) -> u64 {
        self.values
            .lock()
            .expect("settings lock poisoned")
            .get(key)
            .and_then(|value| value.trim().parse().ok())
            .unwrap_or(fallback)
    }

    fn set(&self, key: &str, value: &str) {
        self.values
            .lock()
            .expect("settings lock poisoned")
            .insert(key.to_string(), value.to_string());
    }
}
