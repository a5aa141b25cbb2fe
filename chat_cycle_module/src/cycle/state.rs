//! Process-wide run state: single-flight guards and cooperative
//! cancellation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use futures::future::AbortHandle;

/// Shared state enforcing the at-most-one-traversal invariant. One instance
/// lives for the whole process; every traversal step reads it to decide
/// whether to keep going. There is no true parallelism among traversal
/// steps, so boolean guards checked at entry are sufficient.
#[derive(Debug, Default)]
pub struct RunState {
    cycling: AtomicBool,
    processing_single_unread: AtomicBool,
    cancel_requested: AtomicBool,
    /// Abort handle for the reply request currently in flight, if any.
    abort: Mutex<Option<AbortHandle>>,
}

impl RunState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the traversal slot. Returns false, with no side effects, when
    /// another traversal already holds it.
    pub(crate) fn try_begin_cycle(&self) -> bool {
        self.cycling
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    /// Release the traversal slot and reset cancellation for the next run.
    pub(crate) fn end_cycle(&self) {
        self.clear_abort_handle();
        self.cancel_requested.store(false, Ordering::SeqCst);
        self.cycling.store(false, Ordering::SeqCst);
    }

    /// Claim the single-unread slot, independent of the traversal slot so
    /// the two modes cannot interleave each other's guard.
    pub(crate) fn try_begin_single_unread(&self) -> bool {
        self.processing_single_unread
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    pub(crate) fn end_single_unread(&self) {
        self.processing_single_unread.store(false, Ordering::SeqCst);
    }

    pub fn is_cycling(&self) -> bool {
        self.cycling.load(Ordering::SeqCst)
    }

    pub fn is_processing_single_unread(&self) -> bool {
        self.processing_single_unread.load(Ordering::SeqCst)
    }

    /// Request cooperative cancellation: sets the shared flag every
    /// suspension point polls and aborts any reply request in flight.
    pub fn request_cancel(&self) {
        self.cancel_requested.store(true, Ordering::SeqCst);
        if let Some(handle) = self
            .abort
            .lock()
            .expect("abort handle lock poisoned")
            .take()
        {
            handle.abort();
        }
    }

    pub fn is_cancel_requested(&self) -> bool {
        self.cancel_requested.load(Ordering::SeqCst)
    }

    /// The raw flag, for call sites that poll between delivery sub-steps.
    pub(crate) fn cancel_flag(&self) -> &AtomicBool {
        &self.cancel_requested
    }

    /// Install the abort handle for a request about to go out. The handle
    /// is live only while that request is in flight; a cancellation that
    /// raced the installation aborts it immediately.
    pub(crate) fn arm_abort_handle(&self, handle: AbortHandle) {
        {
            let mut slot = self.abort.lock().expect("abort handle lock poisoned");
            *slot = Some(handle);
        }
        if self.is_cancel_requested() {
            if let Some(handle) = self
                .abort
                .lock()
                .expect("abort handle lock poisoned")
                .take()
            {
                handle.abort();
            }
        }
    }

    pub(crate) fn clear_abort_handle(&self) {
        self.abort
            .lock()
            .expect("abort handle lock poisoned")
            .take();
    }
}
