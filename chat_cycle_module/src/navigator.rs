//! Opening a conversation and waiting for it to finish rendering.

use std::time::Duration;

use tracing::debug;

use crate::page::ChatPage;
use crate::waitutil::wait_until;

const RENDER_POLL_INTERVAL: Duration = Duration::from_millis(100);
const RENDER_TIMEOUT: Duration = Duration::from_secs(5);

/// Unconditional delay after the first bubble appears, absorbing trailing
/// re-renders before extraction starts.
const SETTLE_DELAY: Duration = Duration::from_millis(400);

/// Open the conversation with `id`: synthetic activation on its chat-list
/// link when one exists, full deep-link navigation otherwise. Waits for the
/// header and then for at least one message bubble, followed by a short
/// settle delay. Returns false when the conversation never rendered within
/// the timeout.
///
/// The opened conversation is not re-verified against `id` once rendering
/// settles; a list re-render racing the activation can leave a different
/// conversation open.
pub async fn open_conversation(page: &dyn ChatPage, id: &str) -> bool {
    if !page.activate_chat_link(id) {
        debug!("no chat-list link for {}; using deep link", id);
        page.navigate_to_conversation(id);
    }

    let header = wait_until(
        || page.header_present(),
        RENDER_POLL_INTERVAL,
        RENDER_TIMEOUT,
    )
    .await;
    let bubbles = wait_until(
        || !page.visible_bubbles().is_empty(),
        RENDER_POLL_INTERVAL,
        RENDER_TIMEOUT,
    )
    .await;

    tokio::time::sleep(SETTLE_DELAY).await;
    header && bubbles
}
