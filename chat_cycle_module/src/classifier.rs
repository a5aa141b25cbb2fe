//! Extraction and classification of a conversation's visible messages.
//!
//! The host renders a conversation as bubbles of text spans interleaved
//! with timestamps, delivery labels, and quick-reply boilerplate, in the
//! account's locale (English or Spanish strings have both been observed).
//! This module turns that soup into an ordered, denoised message list
//! limited to the most recent entries.

use std::time::Duration;

use regex::Regex;
use tracing::debug;

use reply_webhook_module::{Message, Sender};

use crate::page::{BubbleView, ChatPage};

/// Bounded scroll-to-top attempts used to trigger lazy loading of older
/// history.
const HISTORY_SCROLL_ATTEMPTS: usize = 5;
const HISTORY_SCROLL_PAUSE: Duration = Duration::from_millis(300);

/// Text markers on bubbles the account itself sent.
const SELF_SENT_MARKERS: [&str; 2] = ["you sent", "enviaste"];

/// Lines marking the start of the conversation; everything before and
/// including them is system preamble.
const CONVERSATION_START_MARKERS: [&str; 2] = ["started this chat", "inició este chat"];

/// System and boilerplate span patterns, dropped from extraction.
const NOISE_PATTERNS: [&str; 9] = [
    // bare clock times: 10:42, 10:42 pm
    r"(?i)^\d{1,2}:\d{2}(?:\s?[ap]m)?$",
    // long-form datetimes in either locale: "12 mar 2024, 10:42" / "Mar 12, 2024, 10:42 AM"
    r"(?i)\d{1,2}\s(?:ene|feb|mar|abr|may|jun|jul|ago|sep|oct|nov|dic)\s\d{4},?\s\d{1,2}:\d{2}",
    r"(?i)(?:jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)\s\d{1,2},\s\d{4},?\s\d{1,2}:\d{2}",
    // numeric dates: 3/12/24, 10:42 pm
    r"(?i)^\d{1,2}/\d{1,2}/\d{2,4},?\s?\d{1,2}:\d{2}(?:\s?[ap]m)?$",
    // relative times: "Sent 5 minutes ago" / "Enviado hace 5 minutos"
    r"(?i)^(?:sent|enviado hace)\s?\d+",
    r"(?i)(?:is awaiting your response|está esperando tu respuesta)",
    r"(?i)(?:view listing|ver publicación)",
    r"(?i)message sent",
    // quick-reply suggestion chrome
    r"(?i)(?:quick repl|respuestas rápidas|press enter to send)",
];

/// Standalone delivery labels, matched exactly.
const BARE_LABELS: [&str; 5] = ["enter", "sent", "enviado", "enviaste", "you sent"];

/// Compiled patterns plus the extraction walk. One instance is reused
/// across every conversation of a run.
#[derive(Debug)]
pub struct MessageExtractor {
    noise: Vec<Regex>,
}

impl MessageExtractor {
    pub fn new() -> Self {
        let noise = NOISE_PATTERNS
            .iter()
            .map(|pattern| Regex::new(pattern).expect("valid noise pattern"))
            .collect();
        Self { noise }
    }

    /// Extract the last `limit` messages of the open conversation, oldest
    /// first. Yields an empty list when the message container is missing or
    /// nothing survives filtering; never fails.
    pub async fn extract_recent(&self, page: &dyn ChatPage, limit: usize) -> Vec<Message> {
        self.load_older_history(page).await;

        let bubbles = page.visible_bubbles();
        if bubbles.is_empty() {
            debug!("no message bubbles visible; returning empty extraction");
            return Vec::new();
        }

        let counterpart = leading_name_token(&page.conversation_title());
        let mut messages = Vec::new();
        for bubble in &bubbles {
            let Some(sender) = classify_bubble(bubble, &counterpart) else {
                continue;
            };
            self.collect_bubble_spans(bubble, sender, &counterpart, &mut messages);
        }

        // Drop the system preamble up to the conversation-started line.
        if let Some(marker) = messages
            .iter()
            .position(|message| is_conversation_start(&message.text))
        {
            messages.drain(..=marker);
        }

        let excess = messages.len().saturating_sub(limit);
        messages.split_off(excess)
    }

    /// Scroll the history container to its top repeatedly so the host lazy
    /// loads older messages, stopping early once the scrollable height
    /// stops growing.
    async fn load_older_history(&self, page: &dyn ChatPage) {
        let mut last_height = page.history_scroll_height();
        for _ in 0..HISTORY_SCROLL_ATTEMPTS {
            page.scroll_history_to_top();
            tokio::time::sleep(HISTORY_SCROLL_PAUSE).await;
            let height = page.history_scroll_height();
            if height <= last_height {
                break;
            }
            last_height = height;
        }
    }

    fn collect_bubble_spans(
        &self,
        bubble: &BubbleView,
        sender: Sender,
        counterpart: &str,
        messages: &mut Vec<Message>,
    ) {
        for (index, span) in bubble.spans.iter().enumerate() {
            let text = if index == 0 {
                clean_first_span(span, counterpart)
            } else {
                span.trim().to_string()
            };
            if text.is_empty() || self.is_noise(&text) {
                continue;
            }
            messages.push(Message::new(text, sender));
        }
    }

    fn is_noise(&self, text: &str) -> bool {
        let lowered = text.to_lowercase();
        if BARE_LABELS.iter().any(|label| lowered == *label) {
            return true;
        }
        self.noise.iter().any(|pattern| pattern.is_match(text))
    }
}

impl Default for MessageExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Determine the sender of a bubble, or None to discard it entirely.
/// Unattributable bubbles are dropped rather than labeled unknown: wrong
/// attributions poison the reply context more than missing lines do.
fn classify_bubble(bubble: &BubbleView, counterpart: &str) -> Option<Sender> {
    if bubble
        .spans
        .iter()
        .any(|span| is_self_sent_marker(span))
    {
        return Some(Sender::Seller);
    }
    if !counterpart.is_empty() {
        if let Some(first) = bubble.spans.first() {
            if strip_ci_prefix(first.trim(), counterpart).is_some() {
                return Some(Sender::Buyer);
            }
        }
    }
    if bubble.outgoing_marker {
        return Some(Sender::Seller);
    }
    None
}

fn is_self_sent_marker(span: &str) -> bool {
    let lowered = span.trim().to_lowercase();
    SELF_SENT_MARKERS
        .iter()
        .any(|marker| lowered.contains(marker))
}

fn is_conversation_start(text: &str) -> bool {
    let lowered = text.to_lowercase();
    CONVERSATION_START_MARKERS
        .iter()
        .any(|marker| lowered.contains(marker))
}

/// First token of the conversation title, i.e. the counterpart's leading
/// name, used both for attribution and for stripping name prefixes.
fn leading_name_token(title: &str) -> String {
    title
        .split(|c: char| c.is_whitespace() || c == '·' || c == '-')
        .find(|token| !token.is_empty())
        .unwrap_or("")
        .trim()
        .to_string()
}

/// Strip a leading "you sent"/"enviaste" or counterpart-name prefix from
/// the first span of a bubble.
fn clean_first_span(span: &str, counterpart: &str) -> String {
    let text = span.trim();
    let stripped = strip_ci_prefix(text, "you sent")
        .or_else(|| strip_ci_prefix(text, "enviaste"))
        .or_else(|| strip_ci_prefix(text, counterpart))
        .unwrap_or(text);
    stripped
        .trim_start_matches([':', ','])
        .trim()
        .to_string()
}

/// Case-insensitive prefix strip returning the remainder of the original
/// string.
fn strip_ci_prefix<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    if prefix.is_empty() {
        return None;
    }
    if !text.to_lowercase().starts_with(&prefix.to_lowercase()) {
        return None;
    }
    let boundary = text
        .char_indices()
        .nth(prefix.chars().count())
        .map(|(index, _)| index)
        .unwrap_or(text.len());
    Some(&text[boundary..])
}
