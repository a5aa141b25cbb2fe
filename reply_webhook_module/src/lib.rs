//! Gateway to the external reply-generation service.
//!
//! This crate owns the webhook wire contract: the conversation context
//! payload posted for each chat, and the normalization of the service's
//! loosely structured responses into an ordered list of reply items.

mod client;
mod normalize;
mod types;

pub use client::{ReplyClient, DEFAULT_WEBHOOK_URL};
pub use normalize::{normalize_reply_payload, FALLBACK_REPLY_TEXT};
pub use types::{ConversationContext, Message, ReplyItem, Sender};
