//! Scripted fakes for driving the engine end to end without a browser.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chat_cycle_module::overlay::ProgressSink;
use chat_cycle_module::page::{BubbleView, ChatLinkView, ChatPage};
use chat_cycle_module::settings_store::MemorySettingsStore;
use chat_cycle_module::{CycleConfig, CycleEngine};
use send_replies_module::{DeliveryError, ImageFetcher, InputSimulator};

#[derive(Clone)]
pub struct FakeChat {
    pub id: String,
    pub title: String,
    pub unread: bool,
    pub bubbles: Vec<BubbleView>,
}

/// A chat whose counterpart opened with one question and got one answer.
pub fn buyer_chat(id: &str, name: &str, listing: &str, unread: bool) -> FakeChat {
    FakeChat {
        id: id.to_string(),
        title: format!("{} · {}", name, listing),
        unread,
        bubbles: vec![
            BubbleView {
                spans: vec![format!("{} is it still available?", name), "10:42".to_string()],
                outgoing_marker: false,
            },
            BubbleView {
                spans: vec!["You sent".to_string(), "yes it is".to_string()],
                outgoing_marker: true,
            },
        ],
    }
}

/// Scripted chat list plus the currently "open" conversation.
pub struct FakePage {
    chats: Vec<FakeChat>,
    open: Mutex<Option<usize>>,
    opened_log: Mutex<Vec<String>>,
}

impl FakePage {
    pub fn new(chats: Vec<FakeChat>) -> Self {
        Self {
            chats,
            open: Mutex::new(None),
            opened_log: Mutex::new(Vec::new()),
        }
    }

    pub fn opened_ids(&self) -> Vec<String> {
        self.opened_log.lock().expect("opened log lock").clone()
    }

    fn open_index(&self) -> Option<usize> {
        *self.open.lock().expect("open lock")
    }
}

impl ChatPage for FakePage {
    fn chat_links(&self, max: usize) -> Vec<ChatLinkView> {
        self.chats
            .iter()
            .take(max)
            .map(|chat| ChatLinkView {
                href: format!("https://www.messenger.com/t/{}/", chat.id),
                accessible_label: Some(chat.title.clone()),
                text: chat.title.clone(),
                unread_dot: chat.unread,
            })
            .collect()
    }

    fn conversation_title(&self) -> String {
        self.open_index()
            .map(|index| self.chats[index].title.clone())
            .unwrap_or_default()
    }

    fn header_present(&self) -> bool {
        self.open_index().is_some()
    }

    fn visible_bubbles(&self) -> Vec<BubbleView> {
        self.open_index()
            .map(|index| self.chats[index].bubbles.clone())
            .unwrap_or_default()
    }

    fn scroll_history_to_top(&self) {}

    fn history_scroll_height(&self) -> u64 {
        1000
    }

    fn activate_chat_link(&self, id: &str) -> bool {
        let Some(index) = self.chats.iter().position(|chat| chat.id == id) else {
            return false;
        };
        *self.open.lock().expect("open lock") = Some(index);
        self.opened_log
            .lock()
            .expect("opened log lock")
            .push(id.to_string());
        true
    }

    fn navigate_to_conversation(&self, id: &str) {
        // Deep link to an unknown chat leaves nothing open.
        if let Some(index) = self.chats.iter().position(|chat| chat.id == id) {
            *self.open.lock().expect("open lock") = Some(index);
            self.opened_log
                .lock()
                .expect("opened log lock")
                .push(id.to_string());
        }
    }
}

/// Composer that records every synthetic event it receives.
#[derive(Default)]
pub struct RecordingComposer {
    events: Mutex<Vec<String>>,
}

impl RecordingComposer {
    pub fn events(&self) -> Vec<String> {
        self.events.lock().expect("events lock").clone()
    }

    pub fn submit_count(&self) -> usize {
        self.events().iter().filter(|e| *e == "enter").count()
    }

    fn log(&self, event: impl Into<String>) {
        self.events.lock().expect("events lock").push(event.into());
    }
}

impl InputSimulator for RecordingComposer {
    fn focus_composer(&self) -> bool {
        self.log("focus");
        true
    }

    fn clear_composer(&self) {
        self.log("clear");
    }

    fn insert_text_line(&self, line: &str) {
        self.log(format!("line:{}", line));
    }

    fn insert_line_break(&self) {
        self.log("break");
    }

    fn dispatch_input_events(&self) {
        self.log("input-events");
    }

    fn press_enter(&self) {
        self.log("enter");
    }

    fn reveal_attachment_input(&self) -> bool {
        self.log("reveal-attachment");
        true
    }

    fn attach_file(&self, bytes: &[u8], mime: &str) -> bool {
        self.log(format!("attach:{}:{}", mime, bytes.len()));
        true
    }

    fn attachment_preview_visible(&self) -> bool {
        true
    }
}

/// Relay that must never be reached (tests use data URIs).
pub struct NoRelay;

impl ImageFetcher for NoRelay {
    fn fetch_as_base64(&self, url: &str) -> Result<String, DeliveryError> {
        Err(DeliveryError::ImageFetch(format!(
            "no relay in tests: {}",
            url
        )))
    }
}

/// Sink that records step names and countdowns.
#[derive(Default)]
pub struct RecordingSink {
    steps: Mutex<Vec<String>>,
    preview_seen: AtomicBool,
}

impl RecordingSink {
    pub fn steps(&self) -> Vec<String> {
        self.steps.lock().expect("steps lock").clone()
    }

    pub fn preview_seen(&self) -> bool {
        self.preview_seen.load(Ordering::Relaxed)
    }
}

impl ProgressSink for RecordingSink {
    fn report(&self, step: &str, _detail: Option<serde_json::Value>, _countdown: Option<u64>) {
        if step == "preview" {
            self.preview_seen.store(true, Ordering::Relaxed);
        }
        self.steps.lock().expect("steps lock").push(step.to_string());
    }
}

pub struct Harness {
    pub page: Arc<FakePage>,
    pub composer: Arc<RecordingComposer>,
    pub sink: Arc<RecordingSink>,
    pub store: Arc<MemorySettingsStore>,
    pub engine: Arc<CycleEngine>,
}

pub fn harness(chats: Vec<FakeChat>) -> Harness {
    let page = Arc::new(FakePage::new(chats));
    let composer = Arc::new(RecordingComposer::default());
    let sink = Arc::new(RecordingSink::default());
    let store = Arc::new(MemorySettingsStore::new());
    let engine = Arc::new(CycleEngine::new(
        page.clone(),
        composer.clone(),
        Arc::new(NoRelay),
        sink.clone(),
        store.clone(),
    ));
    Harness {
        page,
        composer,
        sink,
        store,
        engine,
    }
}

/// Run config with short pauses so scenarios finish quickly.
pub fn fast_config(webhook_url: impl Into<String>) -> CycleConfig {
    CycleConfig {
        chat_count: 10,
        message_limit: 10,
        webhook_url: webhook_url.into(),
        inter_chat_delay: Duration::from_millis(20),
        preview_window: Duration::from_millis(60),
        item_gap: Duration::from_millis(10),
    }
}
