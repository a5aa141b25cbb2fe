//! Enumeration of candidate conversations from the chat list.

use std::sync::OnceLock;

use regex::Regex;

use crate::page::{ChatLinkView, ChatPage};

/// Phrases the host UI puts in accessible labels of unread rows. The
/// English strings appear alongside the Spanish ones depending on the
/// account locale.
const UNREAD_LABEL_HINTS: [&str; 3] = ["unread", "nuevo", "new message"];

/// Snapshot of one chat-list entry. Stale as soon as the list re-renders;
/// never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationSummary {
    pub id: String,
    pub title: String,
    pub unread: bool,
}

fn chat_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"/t/([^/?#]+)").expect("valid chat id pattern"))
}

/// Scan the chat list and return up to `max_candidates` conversations in
/// the UI's current display order.
pub fn scan_conversations(page: &dyn ChatPage, max_candidates: usize) -> Vec<ConversationSummary> {
    summaries_from_links(&page.chat_links(max_candidates), max_candidates)
}

/// Parse raw link observations into summaries. Links without an extractable
/// id are dropped.
pub fn summaries_from_links(
    links: &[ChatLinkView],
    max_candidates: usize,
) -> Vec<ConversationSummary> {
    links
        .iter()
        .filter_map(summary_from_link)
        .take(max_candidates)
        .collect()
}

fn summary_from_link(link: &ChatLinkView) -> Option<ConversationSummary> {
    let id = chat_id_pattern()
        .captures(&link.href)?
        .get(1)?
        .as_str()
        .to_string();

    let title = link
        .accessible_label
        .as_deref()
        .map(str::trim)
        .filter(|label| !label.is_empty())
        .unwrap_or_else(|| link.text.trim())
        .to_string();

    let unread = link.unread_dot || label_hints_unread(link.accessible_label.as_deref());

    Some(ConversationSummary { id, title, unread })
}

fn label_hints_unread(label: Option<&str>) -> bool {
    let Some(label) = label else {
        return false;
    };
    let label = label.to_lowercase();
    UNREAD_LABEL_HINTS.iter().any(|hint| label.contains(hint))
}
