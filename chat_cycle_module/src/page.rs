//! Observation seam over the host conversation UI.
//!
//! The host page is an external, unversioned system: the core only reads
//! visible text and attribute state through this trait and pokes it with
//! synthetic events. Implementations own the selectors and fall back
//! through alternative containers themselves; every retry, wait, and
//! parsing decision stays on the core's side of the seam.

/// Raw observation of one chat-list link, in display order.
#[derive(Debug, Clone, Default)]
pub struct ChatLinkView {
    /// Target URL of the link; the conversation id is a path segment.
    pub href: String,
    /// Accessible label, when the host provides one.
    pub accessible_label: Option<String>,
    /// Visible text content, used when no accessible label exists.
    pub text: String,
    /// Whether the row carries a visual unread marker.
    pub unread_dot: bool,
}

/// Raw observation of one rendered message bubble, spans in display order.
#[derive(Debug, Clone, Default)]
pub struct BubbleView {
    pub spans: Vec<String>,
    /// Whether the bubble carries an explicit outgoing-message marker.
    pub outgoing_marker: bool,
}

pub trait ChatPage: Send + Sync {
    /// Chat-list links in current display order, preferring the marketplace
    /// navigation region when the implementation can locate it and falling
    /// back to the whole page otherwise.
    fn chat_links(&self, max: usize) -> Vec<ChatLinkView>;

    /// Display title of the open conversation.
    fn conversation_title(&self) -> String;

    /// Whether the open conversation's header has rendered.
    fn header_present(&self) -> bool;

    /// Bubbles of the open conversation, oldest first. Empty when the
    /// message container is missing.
    fn visible_bubbles(&self) -> Vec<BubbleView>;

    /// Scroll the history container to its top to trigger lazy loading of
    /// older messages.
    fn scroll_history_to_top(&self);

    /// Current scrollable height of the history container.
    fn history_scroll_height(&self) -> u64;

    /// Dispatch a synthetic activation event on the chat-list link for
    /// `id`. Returns false when no matching link is present.
    fn activate_chat_link(&self, id: &str) -> bool;

    /// Full page navigation to the conversation's deep link.
    fn navigate_to_conversation(&self, id: &str);
}
