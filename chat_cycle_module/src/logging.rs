//! Tracing subscriber setup for embedders.

/// Install the global fmt subscriber. Later calls are no-ops, so embedders
/// and tests can call this unconditionally.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_target(false).try_init();
}
