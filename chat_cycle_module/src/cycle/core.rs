//! The sequential traversal engine: discovery, per-chat pipeline, reply
//! delivery, and the pauses in between.

use std::sync::Arc;
use std::time::Duration;

use futures::future::AbortHandle;
use serde_json::json;
use tracing::{debug, info, warn};

use reply_webhook_module::{ConversationContext, ReplyClient, ReplyItem};
use send_replies_module::{deliver_image, deliver_text, ImageFetcher, InputSimulator};

use crate::classifier::MessageExtractor;
use crate::discovery::{scan_conversations, ConversationSummary};
use crate::navigator::open_conversation;
use crate::overlay::ProgressSink;
use crate::page::ChatPage;
use crate::settings_store::SettingsStore;
use crate::waitutil::cancellable_pause;

use super::state::RunState;
use super::types::{CycleConfig, CycleError, CycleReport, DISCOVERY_BUFFER};

enum CandidateOutcome {
    /// Pipeline ran to the end; count of reply items submitted.
    Delivered(usize),
    /// Pipeline gave up on this candidate; the run moves on.
    Skipped(&'static str),
    /// A cancellation was observed mid-pipeline.
    Cancelled,
}

/// Single-flight state machine sequencing discovery, navigation,
/// extraction, reply request, preview, and delivery across many chats.
///
/// Chats are processed strictly sequentially: one candidate finishes (or is
/// cancelled) before the next begins, and no two reply requests or
/// deliveries are ever in flight at once. Per-candidate failures are logged
/// and skipped; only user cancellation or exhausting the candidate list
/// ends a run.
pub struct CycleEngine {
    page: Arc<dyn ChatPage>,
    input: Arc<dyn InputSimulator>,
    images: Arc<dyn ImageFetcher>,
    sink: Arc<dyn ProgressSink>,
    store: Arc<dyn SettingsStore>,
    state: Arc<RunState>,
    extractor: MessageExtractor,
}

impl CycleEngine {
    pub fn new(
        page: Arc<dyn ChatPage>,
        input: Arc<dyn InputSimulator>,
        images: Arc<dyn ImageFetcher>,
        sink: Arc<dyn ProgressSink>,
        store: Arc<dyn SettingsStore>,
    ) -> Self {
        Self {
            page,
            input,
            images,
            sink,
            store,
            state: Arc::new(RunState::new()),
            extractor: MessageExtractor::new(),
        }
    }

    /// Shared run state, for cancel controls and status displays.
    pub fn state(&self) -> Arc<RunState> {
        self.state.clone()
    }

    /// Bulk mode: scan the chat list and process the first `requested`
    /// candidates (the persisted chat count when None). Rejected
    /// immediately when a traversal is already running.
    pub async fn run_bulk_scan(&self, requested: Option<usize>) -> Result<CycleReport, CycleError> {
        let config = CycleConfig::load(self.store.as_ref());
        self.run_bulk_scan_with(config, requested).await
    }

    pub async fn run_bulk_scan_with(
        &self,
        config: CycleConfig,
        requested: Option<usize>,
    ) -> Result<CycleReport, CycleError> {
        if !self.state.try_begin_cycle() {
            warn!("bulk scan rejected: a traversal is already running");
            return Err(CycleError::AlreadyRunning);
        }

        let requested = requested.unwrap_or(config.chat_count);
        self.sink.report("scanning", None, None);
        let mut candidates = scan_conversations(self.page.as_ref(), DISCOVERY_BUFFER.max(requested));
        candidates.truncate(requested);
        info!(
            "starting bulk scan over {} chats (requested {})",
            candidates.len(),
            requested
        );

        let report = self.process_candidates(&config, candidates, requested).await;
        self.finish_run(&report);
        self.state.end_cycle();
        Ok(report)
    }

    /// Unread mode: same per-chat pipeline, restricted to unread-flagged
    /// candidates and processed oldest-flagged first.
    pub async fn process_unread_chats(&self) -> Result<CycleReport, CycleError> {
        let config = CycleConfig::load(self.store.as_ref());
        self.process_unread_chats_with(config).await
    }

    pub async fn process_unread_chats_with(
        &self,
        config: CycleConfig,
    ) -> Result<CycleReport, CycleError> {
        if !self.state.try_begin_cycle() {
            warn!("unread processing rejected: a traversal is already running");
            return Err(CycleError::AlreadyRunning);
        }

        self.sink.report("scanning", None, None);
        let mut unread: Vec<ConversationSummary> =
            scan_conversations(self.page.as_ref(), DISCOVERY_BUFFER)
                .into_iter()
                .filter(|candidate| candidate.unread)
                .collect();
        // The list renders newest first; flip it so the oldest-flagged
        // unread chat is handled first.
        unread.reverse();
        let requested = unread.len();
        info!("processing {} unread chats", requested);

        let report = self.process_candidates(&config, unread, requested).await;
        self.finish_run(&report);
        self.state.end_cycle();
        Ok(report)
    }

    /// Claim and process exactly one unread chat, the oldest-flagged one.
    /// Returns Ok(None) when nothing is unread. Re-entrant calls are
    /// rejected through a guard separate from the bulk-run guard; the two
    /// modes cannot interleave either way.
    pub async fn process_oldest_unread(&self) -> Result<Option<CycleReport>, CycleError> {
        let config = CycleConfig::load(self.store.as_ref());
        self.process_oldest_unread_with(config).await
    }

    pub async fn process_oldest_unread_with(
        &self,
        config: CycleConfig,
    ) -> Result<Option<CycleReport>, CycleError> {
        if !self.state.try_begin_single_unread() {
            warn!("single-unread processing rejected: already in progress");
            return Err(CycleError::SingleUnreadBusy);
        }
        if !self.state.try_begin_cycle() {
            self.state.end_single_unread();
            warn!("single-unread processing rejected: a traversal is already running");
            return Err(CycleError::AlreadyRunning);
        }

        let oldest = scan_conversations(self.page.as_ref(), DISCOVERY_BUFFER)
            .into_iter()
            .filter(|candidate| candidate.unread)
            .last();

        let result = match oldest {
            None => {
                debug!("no unread conversations to claim");
                None
            }
            Some(candidate) => {
                info!("claiming oldest unread chat {}", candidate.id);
                let report = self.process_candidates(&config, vec![candidate], 1).await;
                self.finish_run(&report);
                Some(report)
            }
        };

        self.state.end_cycle();
        self.state.end_single_unread();
        Ok(result)
    }

    async fn process_candidates(
        &self,
        config: &CycleConfig,
        candidates: Vec<ConversationSummary>,
        requested: usize,
    ) -> CycleReport {
        let client = ReplyClient::new(&config.webhook_url);
        let mut report = CycleReport {
            requested,
            ..Default::default()
        };

        let total = candidates.len();
        for (index, candidate) in candidates.into_iter().enumerate() {
            if self.state.is_cancel_requested() {
                report.cancelled = true;
                break;
            }

            info!(
                "({}/{}) processing chat {} ({})",
                index + 1,
                total,
                candidate.id,
                candidate.title
            );
            report.processed += 1;
            match self.process_candidate(config, &client, &candidate).await {
                CandidateOutcome::Delivered(count) => {
                    report.delivered += count;
                }
                CandidateOutcome::Skipped(reason) => {
                    warn!("skipping chat {}: {}", candidate.id, reason);
                }
                CandidateOutcome::Cancelled => {
                    report.cancelled = true;
                    break;
                }
            }

            if index + 1 < total {
                self.pause_with_countdown("cooldown", config.inter_chat_delay)
                    .await;
            }
        }

        if self.state.is_cancel_requested() {
            report.cancelled = true;
        }
        report
    }

    async fn process_candidate(
        &self,
        config: &CycleConfig,
        client: &ReplyClient,
        candidate: &ConversationSummary,
    ) -> CandidateOutcome {
        self.sink.report(
            "opening",
            Some(json!({ "chatId": candidate.id, "title": candidate.title })),
            None,
        );
        if !open_conversation(self.page.as_ref(), &candidate.id).await {
            return CandidateOutcome::Skipped("conversation never finished rendering");
        }
        if self.state.is_cancel_requested() {
            return CandidateOutcome::Cancelled;
        }

        self.sink.report("extracting", None, None);
        let messages = self
            .extractor
            .extract_recent(self.page.as_ref(), config.message_limit)
            .await;
        if messages.is_empty() {
            return CandidateOutcome::Skipped("no messages extracted");
        }

        let title = self.page.conversation_title();
        let context = ConversationContext::from_title(candidate.id.clone(), &title, messages);

        self.sink.report("requesting", None, None);
        let (handle, registration) = AbortHandle::new_pair();
        self.state.arm_abort_handle(handle);
        let replies = client.request_reply(&context, registration).await;
        self.state.clear_abort_handle();

        if self.state.is_cancel_requested() {
            return CandidateOutcome::Cancelled;
        }
        if replies.is_empty() {
            return CandidateOutcome::Skipped("nothing to deliver");
        }

        let preview: Vec<String> = replies.iter().map(ReplyItem::preview_line).collect();
        let detail = json!({
            "chatId": candidate.id,
            "messages": context.messages,
            "replies": preview,
        });
        self.preview_pause(config.preview_window, detail).await;
        if self.state.is_cancel_requested() {
            return CandidateOutcome::Cancelled;
        }

        self.deliver_replies(config, candidate, &replies).await
    }

    async fn deliver_replies(
        &self,
        config: &CycleConfig,
        candidate: &ConversationSummary,
        replies: &[ReplyItem],
    ) -> CandidateOutcome {
        let cancel = self.state.cancel_flag();
        let mut delivered = 0;

        for (index, item) in replies.iter().enumerate() {
            if self.state.is_cancel_requested() {
                return CandidateOutcome::Cancelled;
            }

            self.sink.report(
                "delivering",
                Some(json!({ "chatId": candidate.id, "item": index + 1, "of": replies.len() })),
                None,
            );
            let submitted = match item {
                ReplyItem::Text { content } => {
                    deliver_text(self.input.as_ref(), content, cancel).await
                }
                ReplyItem::Image { url } => {
                    match deliver_image(self.input.as_ref(), self.images.as_ref(), url, cancel)
                        .await
                    {
                        Ok(submitted) => submitted,
                        Err(err) => {
                            warn!("failed to send image reply for {}: {}", candidate.id, err);
                            self.sink.report(
                                "failed to send image reply",
                                Some(json!({ "url": url, "error": err.to_string() })),
                                None,
                            );
                            false
                        }
                    }
                }
            };

            if submitted {
                delivered += 1;
            } else if self.state.is_cancel_requested() {
                return CandidateOutcome::Cancelled;
            } else {
                warn!(
                    "reply item {}/{} not delivered for chat {}",
                    index + 1,
                    replies.len(),
                    candidate.id
                );
            }

            if index + 1 < replies.len() {
                cancellable_pause(config.item_gap, cancel, |_| {}).await;
            }
        }

        CandidateOutcome::Delivered(delivered)
    }

    async fn preview_pause(&self, window: Duration, detail: serde_json::Value) {
        let sink = self.sink.as_ref();
        cancellable_pause(window, self.state.cancel_flag(), |remaining| {
            sink.report(
                "preview",
                Some(detail.clone()),
                Some(remaining_secs(remaining)),
            );
        })
        .await;
    }

    async fn pause_with_countdown(&self, step: &str, duration: Duration) {
        let sink = self.sink.as_ref();
        cancellable_pause(duration, self.state.cancel_flag(), |remaining| {
            sink.report(step, None, Some(remaining_secs(remaining)));
        })
        .await;
    }

    fn finish_run(&self, report: &CycleReport) {
        if report.cancelled {
            self.input.clear_composer();
            self.sink.report("cancelled", None, None);
            info!("traversal cancelled after {} chats", report.processed);
        } else {
            self.sink
                .report("completed", serde_json::to_value(report).ok(), None);
            info!(
                "traversal completed: {} chats, {} reply items delivered",
                report.processed, report.delivered
            );
        }
    }
}

fn remaining_secs(remaining: Duration) -> u64 {
    ((remaining.as_millis() + 999) / 1000) as u64
}
