use serde::{Deserialize, Serialize};

/// Separator the host UI places between the counterpart name and the
/// listing description in a conversation title.
const TITLE_SEPARATOR: char = '·';

/// Who authored a message inside a marketplace conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    Buyer,
    Seller,
    Unknown,
}

/// One extracted message, part of an oldest-first conversation snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub text: String,
    pub sender: Sender,
}

impl Message {
    pub fn new(text: impl Into<String>, sender: Sender) -> Self {
        Self {
            text: text.into(),
            sender,
        }
    }
}

/// Payload sent to the reply webhook for one conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationContext {
    pub chat_id: String,
    pub client_name: String,
    pub listing: String,
    pub chat_name: String,
    pub messages: Vec<Message>,
}

impl ConversationContext {
    /// Build the payload from a conversation id, its display title, and the
    /// extracted messages. Titles look like `"Ana García · Blue Bike"`; the
    /// part before the separator is the counterpart's name and the part
    /// after is the listing. A title without a separator is used whole as
    /// the listing.
    pub fn from_title(
        chat_id: impl Into<String>,
        title: &str,
        messages: Vec<Message>,
    ) -> Self {
        let title = title.trim();
        let (client_name, listing) = match title.split_once(TITLE_SEPARATOR) {
            Some((name, listing)) => (name.trim().to_string(), listing.trim().to_string()),
            None => (
                title.split_whitespace().next().unwrap_or(title).to_string(),
                title.to_string(),
            ),
        };
        Self {
            chat_id: chat_id.into(),
            client_name,
            listing,
            chat_name: title.to_string(),
            messages,
        }
    }
}

/// One normalized unit of reply content to deliver into the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ReplyItem {
    Text { content: String },
    Image { url: String },
}

impl ReplyItem {
    pub fn text(content: impl Into<String>) -> Self {
        ReplyItem::Text {
            content: content.into(),
        }
    }

    pub fn image(url: impl Into<String>) -> Self {
        ReplyItem::Image { url: url.into() }
    }

    /// Display form used by preview overlays.
    pub fn preview_line(&self) -> String {
        match self {
            ReplyItem::Text { content } => content.clone(),
            ReplyItem::Image { url } => format!("[Image] {}", url),
        }
    }
}
