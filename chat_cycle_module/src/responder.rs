//! Background auto-responder loop.
//!
//! While the persisted auto-responder toggle is on, the loop periodically
//! claims the oldest unread conversation, runs the reply pipeline on it,
//! and records the counters the status popup displays.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info};

use crate::cycle::CycleEngine;
use crate::settings_store::{
    SettingsStore, AUTO_RESPONDER_KEY, LAST_CHECKED_KEY, MESSAGE_COUNT_KEY,
};
use crate::waitutil::cancellable_pause;

/// Cadence of unread checks while the toggle is on.
const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_secs(30);

pub struct AutoResponder {
    engine: Arc<CycleEngine>,
    store: Arc<dyn SettingsStore>,
    interval: Duration,
    stop: Arc<AtomicBool>,
}

impl AutoResponder {
    pub fn new(engine: Arc<CycleEngine>, store: Arc<dyn SettingsStore>) -> Self {
        Self {
            engine,
            store,
            interval: DEFAULT_CHECK_INTERVAL,
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Flag that ends the loop; setting it takes effect within one pause
    /// tick.
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        self.stop.clone()
    }

    /// Run until the stop flag is set. Each tick consults the persisted
    /// toggle, so flipping `autoResponderActive` pauses and resumes the
    /// responder without restarting the loop.
    pub async fn run(&self) {
        info!("auto responder started (interval {:?})", self.interval);
        while !self.stop.load(Ordering::Relaxed) {
            if self.store.get_string(AUTO_RESPONDER_KEY, "false") == "true" {
                self.tick().await;
            }
            cancellable_pause(self.interval, &self.stop, |_| {}).await;
        }
        info!("auto responder stopped");
    }

    async fn tick(&self) {
        match self.engine.process_oldest_unread().await {
            Err(err) => debug!("auto responder tick skipped: {}", err),
            Ok(outcome) => {
                self.store.set(LAST_CHECKED_KEY, &Utc::now().to_rfc3339());
                if let Some(report) = outcome {
                    if report.delivered > 0 {
                        let count = self.store.get_number(MESSAGE_COUNT_KEY, 0)
                            + report.delivered as u64;
                        self.store.set(MESSAGE_COUNT_KEY, &count.to_string());
                        info!(
                            "auto responder answered an unread chat ({} total)",
                            count
                        );
                    }
                }
            }
        }
    }
}
