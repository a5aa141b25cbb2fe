//! Polling and pause primitives shared by every traversal step.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Tick cadence for cancellable pauses; bounds cancellation latency.
const PAUSE_TICK: Duration = Duration::from_millis(500);

/// Poll `probe` at `interval` until it returns true or `timeout` elapses.
///
/// Resolves true as soon as the probe passes, false once the timeout is
/// exhausted. Probes wrap their own fallible reads, so a failed read is
/// simply false for that tick; this function itself never fails.
pub async fn wait_until<F>(mut probe: F, interval: Duration, timeout: Duration) -> bool
where
    F: FnMut() -> bool,
{
    let mut waited = Duration::ZERO;
    loop {
        if probe() {
            return true;
        }
        if waited >= timeout {
            return false;
        }
        tokio::time::sleep(interval).await;
        waited += interval;
    }
}

/// Sleep for up to `duration`, waking roughly every 500 ms to report the
/// remaining time through `on_tick` and to honor cancellation. Returns
/// early, without error, as soon as `cancelled` is observed true.
pub async fn cancellable_pause<F>(duration: Duration, cancelled: &AtomicBool, mut on_tick: F)
where
    F: FnMut(Duration),
{
    let mut remaining = duration;
    loop {
        if cancelled.load(Ordering::Relaxed) {
            return;
        }
        if remaining.is_zero() {
            return;
        }
        on_tick(remaining);
        let step = remaining.min(PAUSE_TICK);
        tokio::time::sleep(step).await;
        remaining = remaining.saturating_sub(step);
    }
}
