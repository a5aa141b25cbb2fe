//! Progress reporting seam.

use serde_json::Value;

/// Sink for step-by-step run progress. The engine reports after every state
/// transition; rendering and the user-facing cancel control live on the
/// other side of this trait. The engine works unchanged with a sink that
/// does nothing.
pub trait ProgressSink: Send + Sync {
    fn report(&self, step: &str, detail: Option<Value>, countdown_secs: Option<u64>);
}

/// Sink that discards every update.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl ProgressSink for NoopSink {
    fn report(&self, _step: &str, _detail: Option<Value>, _countdown_secs: Option<u64>) {}
}
