use std::time::Duration;

use futures::future::{AbortRegistration, Abortable};
use reqwest::Client;
use tracing::{debug, warn};

use crate::normalize::normalize_reply_payload;
use crate::types::{ConversationContext, ReplyItem};

/// Default reply webhook endpoint, overridable via stored configuration.
pub const DEFAULT_WEBHOOK_URL: &str = "https://n8n.ventaflow.app/webhook/marketplace-reply";

/// Timeout for one reply-generation request.
const REPLY_TIMEOUT: Duration = Duration::from_secs(60);

/// HTTP client for the external reply-generation webhook.
#[derive(Debug, Clone)]
pub struct ReplyClient {
    endpoint: String,
    client: Client,
}

impl ReplyClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(REPLY_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            endpoint: endpoint.into(),
            client,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Request replies for one conversation.
    ///
    /// Never surfaces an error to the caller: service failures collapse into
    /// a single synthetic text item, while a request aborted through `abort`
    /// yields an empty list so the caller can tell "nothing to deliver" from
    /// "deliver a failure notice".
    pub async fn request_reply(
        &self,
        context: &ConversationContext,
        abort: AbortRegistration,
    ) -> Vec<ReplyItem> {
        let exchange = async {
            debug!(
                "requesting reply for chat {} ({} messages)",
                context.chat_id,
                context.messages.len()
            );

            let response = match self.client.post(&self.endpoint).json(context).send().await {
                Ok(response) => response,
                Err(err) => {
                    warn!("reply webhook request failed: {}", err);
                    return vec![ReplyItem::text(format!("Reply service unavailable: {}", err))];
                }
            };

            if !response.status().is_success() {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                warn!("reply webhook returned {}: {}", status, body);
                return vec![ReplyItem::text(format!("Reply service returned {}", status))];
            }

            match response.json::<serde_json::Value>().await {
                Ok(payload) => normalize_reply_payload(&payload),
                Err(err) => {
                    warn!("reply webhook sent an unreadable body: {}", err);
                    vec![ReplyItem::text(format!(
                        "Reply service sent an unreadable response: {}",
                        err
                    ))]
                }
            }
        };

        match Abortable::new(exchange, abort).await {
            Ok(items) => items,
            Err(_aborted) => {
                debug!("reply request for chat {} aborted", context.chat_id);
                Vec::new()
            }
        }
    }
}
