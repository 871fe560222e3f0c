//! Inbound reply buffer
//!
//! The host environment delivers reply strings asynchronously, potentially
//! from the main context, at arbitrary times. The queue decouples that
//! delivery callback from the bridge's drain: `push` is O(1), never blocks
//! the pusher, and wakes any thread parked in `await_reply` so a reply is
//! observed immediately instead of on the next poll tick.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tracing::debug;

/// Thread-safe FIFO of raw reply strings
///
/// Shared (via `Arc`) between the bridge, which drains it, and the host
/// integration layer, which pushes into it.
#[derive(Debug, Default)]
pub struct ReplyQueue {
    entries: Mutex<VecDeque<String>>,
    wakeup: Condvar,
}

impl ReplyQueue {
    /// Create an empty queue
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_entries(&self) -> MutexGuard<'_, VecDeque<String>> {
        // A panic while holding the lock must not take the bridge down with it
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append a raw reply and wake any waiting caller
    ///
    /// Called from the reply-delivery path (the main context); never blocks.
    pub fn push(&self, raw: impl Into<String>) {
        let raw = raw.into();
        debug!(raw = %raw, "ReplyQueue::push");
        self.lock_entries().push_back(raw);
        self.wakeup.notify_all();
    }

    /// Remove and return the oldest entry, if any
    pub fn pop(&self) -> Option<String> {
        self.lock_entries().pop_front()
    }

    /// Number of queued replies
    pub fn len(&self) -> usize {
        self.lock_entries().len()
    }

    /// Check whether the queue is empty
    pub fn is_empty(&self) -> bool {
        self.lock_entries().is_empty()
    }

    /// Wake all waiters without pushing anything
    ///
    /// Used by the drain loop after marking pending entries ready, so other
    /// waiters re-check their keys right away.
    pub(crate) fn notify(&self) {
        self.wakeup.notify_all();
    }

    /// Block for at most `max` until the queue sees activity
    ///
    /// Returns immediately if entries are already queued. Spurious wakeups
    /// are fine: callers re-drain and re-check in a loop.
    pub(crate) fn wait_for_activity(&self, max: Duration) {
        let entries = self.lock_entries();
        if entries.is_empty() {
            let _unused = self
                .wakeup
                .wait_timeout(entries, max)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }
}
