use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tracing::{debug, warn};

use crate::simulate::InputSimulator;

/// Pause after inserting content so the host UI's internal state catches up
/// before the submit keystroke.
const COMPOSER_SETTLE: Duration = Duration::from_millis(500);

/// Phases of one delivery attempt. An attempt aborts back to `Idle` as soon
/// as a cancellation is observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DeliveryPhase {
    Idle,
    Focused,
    Cleared,
    Inserted,
}

/// Insert `text` into the composer and submit it.
///
/// Embedded newlines are preserved by giving each line its own composer
/// block through the line-break capability. Returns true only when every
/// phase completed without an intervening cancellation; a missing composer
/// or an observed cancellation yields false. Calling this twice submits
/// twice: there is no built-in dedup.
pub async fn deliver_text(sim: &dyn InputSimulator, text: &str, cancelled: &AtomicBool) -> bool {
    if cancelled.load(Ordering::Relaxed) {
        return abort(DeliveryPhase::Idle);
    }
    if !sim.focus_composer() {
        warn!("composer not found; dropping text reply");
        return false;
    }

    if cancelled.load(Ordering::Relaxed) {
        return abort(DeliveryPhase::Focused);
    }
    sim.clear_composer();

    if cancelled.load(Ordering::Relaxed) {
        return abort(DeliveryPhase::Cleared);
    }
    for (index, line) in text.split('\n').enumerate() {
        if index > 0 {
            sim.insert_line_break();
        }
        sim.insert_text_line(line);
    }
    sim.dispatch_input_events();

    tokio::time::sleep(COMPOSER_SETTLE).await;
    if cancelled.load(Ordering::Relaxed) {
        return abort(DeliveryPhase::Inserted);
    }

    sim.press_enter();
    debug!("text reply submitted ({} chars)", text.len());
    true
}

fn abort(phase: DeliveryPhase) -> bool {
    debug!("text delivery cancelled after {:?}", phase);
    false
}
