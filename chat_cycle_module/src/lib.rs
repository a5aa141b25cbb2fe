//! Chat traversal and reply orchestration for marketplace conversations.
//!
//! The engine scans the host chat list, opens each candidate conversation,
//! extracts and classifies its recent messages, asks an external service
//! for a reply, and delivers that reply back through the conversation
//! composer, one chat at a time with cooperative cancellation throughout.
//! The host page, the composer, the image relay, the settings storage, and
//! the progress overlay are all seams: the core only supplies the
//! traversal logic.

pub mod classifier;
pub mod cycle;
pub mod discovery;
pub mod logging;
pub mod navigator;
pub mod overlay;
pub mod page;
pub mod responder;
pub mod settings_store;
pub mod waitutil;

pub use cycle::{CycleConfig, CycleEngine, CycleError, CycleReport, RunState};
