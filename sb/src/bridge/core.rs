//! Correlation bridge core
//!
//! Turns the fire-and-forget host channel into a blocking request/response
//! call. Each outbound call carries a unique correlation key; the matching
//! reply arrives later, out of order, on the shared [`ReplyQueue`], and is
//! routed back to the waiting caller through the pending map.
//!
//! The pending map and the reply queue are the only mutable shared state.
//! Their locks are never held across each other during caller-visible work:
//! the drain pops one item under the queue lock, parses it lock-free, then
//! touches the pending map.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::thread::ThreadId;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use super::config::BridgeConfig;
use super::queue::ReplyQueue;
use super::reply::{parse_raw_reply, CallReply, CorrelationKey, PendingCall};
use crate::error::BridgeError;
use crate::host::{HostChannel, LogSink, TracingLog};

/// Blocking request/response correlator over a one-way host channel
///
/// Owned by the application's composition root and shared by reference with
/// every caller; there is no process-wide singleton.
pub struct CorrelationBridge {
    /// In-flight calls, keyed by correlation key. At most one entry per key.
    pending: Mutex<HashMap<CorrelationKey, PendingCall>>,

    /// Inbound buffer the host integration layer pushes raw replies into
    queue: Arc<ReplyQueue>,

    /// Outward one-way channel into the host page
    channel: Arc<dyn HostChannel>,

    /// External log collector for request/outcome lines
    sink: Arc<dyn LogSink>,

    config: BridgeConfig,

    /// The thread that delivers replies. Blocking it in `await_reply` would
    /// deadlock, so that call fails fast there instead.
    main_context: RwLock<ThreadId>,
}

impl CorrelationBridge {
    /// Create a bridge over the given host channel
    ///
    /// The constructing thread is bound as the main context; rebind with
    /// [`bind_main_context`](Self::bind_main_context) from the actual
    /// reply-delivery thread if construction happens elsewhere.
    pub fn new(channel: Arc<dyn HostChannel>, config: BridgeConfig) -> Self {
        debug!(
            reply_timeout_ms = config.reply_timeout_ms,
            poll_interval_ms = config.poll_interval_ms,
            "CorrelationBridge::new"
        );
        Self {
            pending: Mutex::new(HashMap::new()),
            queue: Arc::new(ReplyQueue::new()),
            channel,
            sink: Arc::new(TracingLog),
            config,
            main_context: RwLock::new(std::thread::current().id()),
        }
    }

    /// Replace the default tracing-backed log sink
    pub fn with_log_sink(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Drain from an externally created queue instead of the bridge's own
    ///
    /// Used when the host integration layer (or a simulator) was wired to a
    /// queue before the bridge existed.
    pub fn with_reply_queue(mut self, queue: Arc<ReplyQueue>) -> Self {
        self.queue = queue;
        self
    }

    /// Shared handle to the inbound reply queue
    ///
    /// Hand a clone to the host integration layer so reply delivery does not
    /// need a reference back to the bridge.
    pub fn reply_queue(&self) -> Arc<ReplyQueue> {
        Arc::clone(&self.queue)
    }

    /// The active configuration
    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// The external log collector
    pub(crate) fn sink(&self) -> &dyn LogSink {
        self.sink.as_ref()
    }

    /// Deliver one raw reply string, as the host callback would
    pub fn push_reply(&self, raw: impl Into<String>) {
        self.queue.push(raw);
    }

    /// Rebind the main context to the current thread
    pub fn bind_main_context(&self) {
        let id = std::thread::current().id();
        debug!(?id, "CorrelationBridge::bind_main_context");
        *self
            .main_context
            .write()
            .unwrap_or_else(PoisonError::into_inner) = id;
    }

    /// Check whether the current thread is the bound main context
    pub fn on_main_context(&self) -> bool {
        let bound = *self
            .main_context
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        bound == std::thread::current().id()
    }

    fn lock_pending(&self) -> MutexGuard<'_, HashMap<CorrelationKey, PendingCall>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of calls currently in flight
    pub fn outstanding(&self) -> usize {
        self.lock_pending().len()
    }

    /// Check whether a key is currently tracked
    pub fn is_pending(&self, key: CorrelationKey) -> bool {
        self.lock_pending().contains_key(&key)
    }

    /// Allocate a fresh correlation key and install its Waiting entry
    ///
    /// The existence check and the insertion happen in one critical section,
    /// so two concurrent callers can never pick the same key.
    pub fn new_key(&self) -> CorrelationKey {
        let mut pending = self.lock_pending();
        let mut key: CorrelationKey = rand::random();
        while pending.contains_key(&key) {
            key = rand::random();
        }
        pending.insert(key, PendingCall::Waiting);
        debug!(key, outstanding = pending.len(), "CorrelationBridge::new_key");
        key
    }

    /// One-way get request for a data-model element
    pub fn send_get(&self, identifier: &str, key: CorrelationKey) {
        debug!(identifier, key, "CorrelationBridge::send_get");
        self.channel
            .get_value(identifier, &self.config.callback_object, &self.config.callback_function, key);
    }

    /// One-way set request for a data-model element
    pub fn send_set(&self, identifier: &str, value: &str, key: CorrelationKey) {
        debug!(identifier, value, key, "CorrelationBridge::send_set");
        self.channel.set_value(
            identifier,
            value,
            &self.config.callback_object,
            &self.config.callback_function,
            key,
        );
    }

    /// One-way protocol-variant probe
    pub fn send_version_probe(&self, key: CorrelationKey) {
        debug!(key, "CorrelationBridge::send_version_probe");
        self.channel
            .version_probe(&self.config.callback_object, &self.config.callback_function, key);
    }

    /// One-way commit; no reply expected, no key allocated
    pub fn send_commit(&self) {
        debug!("CorrelationBridge::send_commit");
        self.channel.commit();
    }

    /// One-way terminate; no reply expected, no key allocated
    pub fn send_terminate(&self) {
        debug!("CorrelationBridge::send_terminate");
        self.channel.terminate();
    }

    /// Move every queued raw reply into the pending map
    ///
    /// Malformed entries are logged and skipped without interrupting the rest
    /// of the batch. Replies whose key is no longer tracked (timed out or
    /// already consumed) are discarded; that lost-update behavior is part of
    /// the contract.
    pub fn drain_replies(&self) {
        let mut any_ready = false;
        while let Some(raw) = self.queue.pop() {
            match parse_raw_reply(&raw) {
                Ok((key, reply)) => {
                    let mut pending = self.lock_pending();
                    match pending.get_mut(&key) {
                        Some(entry) => {
                            if entry.is_ready() {
                                warn!(key, "CorrelationBridge::drain_replies: duplicate reply for ready key, discarding");
                            } else {
                                *entry = PendingCall::Ready(reply);
                                any_ready = true;
                            }
                        }
                        None => {
                            debug!(key, "CorrelationBridge::drain_replies: reply for untracked key, discarding");
                        }
                    }
                }
                Err(err) => {
                    warn!(%err, "CorrelationBridge::drain_replies: malformed reply, skipping");
                    self.sink.log(&format!("malformed reply skipped: {err}"));
                }
            }
        }
        if any_ready {
            // Other waiters may be parked on the queue condvar
            self.queue.notify();
        }
    }

    /// Block until the reply for `key` arrives, up to `timeout`
    ///
    /// Each iteration drains the queue, checks the pending entry, and parks
    /// on the queue condvar for at most `poll` (a push wakes it early). On
    /// success or timeout the entry is removed, so a reply arriving after
    /// timeout is silently discarded by the next drain.
    ///
    /// Fails fast with [`BridgeError::MainContext`] when called on the bound
    /// main context; sleeping there would block the very thread that delivers
    /// replies.
    pub fn await_reply(&self, key: CorrelationKey, timeout: Duration, poll: Duration) -> Result<CallReply, BridgeError> {
        if self.on_main_context() {
            warn!(key, "CorrelationBridge::await_reply: called on the main context, aborting call");
            self.sink.log("await_reply called on the main context; call aborted");
            self.lock_pending().remove(&key);
            return Err(BridgeError::MainContext);
        }

        let start = Instant::now();
        loop {
            self.drain_replies();

            let waited = {
                let mut pending = self.lock_pending();
                match pending.remove(&key) {
                    Some(PendingCall::Ready(reply)) => {
                        debug!(key, elapsed = ?start.elapsed(), "CorrelationBridge::await_reply: reply ready");
                        return Ok(reply);
                    }
                    Some(PendingCall::Waiting) => {
                        pending.insert(key, PendingCall::Waiting);
                    }
                    None => {
                        // Entry vanished out from under us; reinstall so a
                        // late reply can still complete this wait
                        warn!(key, "CorrelationBridge::await_reply: pending entry missing, reinstalling");
                        pending.insert(key, PendingCall::Waiting);
                    }
                }

                let waited = start.elapsed();
                if waited >= timeout {
                    pending.remove(&key);
                    drop(pending);
                    warn!(key, ?waited, "CorrelationBridge::await_reply: timeout");
                    self.sink.log("timeout");
                    return Err(BridgeError::TimedOut { key, waited });
                }
                waited
            };

            let remaining = timeout - waited;
            self.queue.wait_for_activity(poll.min(remaining));
        }
    }

    /// [`await_reply`](Self::await_reply) with the configured timeout and poll interval
    pub fn await_reply_default(&self, key: CorrelationKey) -> Result<CallReply, BridgeError> {
        self.await_reply(key, self.config.reply_timeout(), self.config.poll_interval())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Channel that counts calls and otherwise swallows them
    #[derive(Default)]
    struct NullChannel {
        commits: AtomicUsize,
        terminates: AtomicUsize,
    }

    impl HostChannel for NullChannel {
        fn get_value(&self, _identifier: &str, _obj: &str, _func: &str, _key: CorrelationKey) {}
        fn set_value(&self, _identifier: &str, _value: &str, _obj: &str, _func: &str, _key: CorrelationKey) {}
        fn version_probe(&self, _obj: &str, _func: &str, _key: CorrelationKey) {}
        fn commit(&self) {
            self.commits.fetch_add(1, Ordering::SeqCst);
        }
        fn terminate(&self) {
            self.terminates.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn test_bridge() -> CorrelationBridge {
        CorrelationBridge::new(Arc::new(NullChannel::default()), BridgeConfig::default())
    }

    /// Run `f` on a worker thread so the constructing thread stays the main context
    fn on_worker<T: Send + 'static>(bridge: Arc<CorrelationBridge>, f: impl FnOnce(Arc<CorrelationBridge>) -> T + Send + 'static) -> T {
        std::thread::spawn(move || f(bridge)).join().unwrap()
    }

    #[test]
    fn test_new_key_installs_waiting_entry() {
        let bridge = test_bridge();
        let key = bridge.new_key();
        assert!(bridge.is_pending(key));
        assert_eq!(bridge.outstanding(), 1);
    }

    #[test]
    fn test_new_keys_are_distinct() {
        let bridge = test_bridge();
        let mut keys: Vec<_> = (0..64).map(|_| bridge.new_key()).collect();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), 64);
        assert_eq!(bridge.outstanding(), 64);
    }

    #[test]
    fn test_drain_routes_reply_to_pending_entry() {
        let bridge = test_bridge();
        let key = bridge.new_key();
        bridge.push_reply(format!("hello|||{key}"));
        bridge.drain_replies();

        let reply = {
            let mut pending = bridge.lock_pending();
            match pending.remove(&key) {
                Some(PendingCall::Ready(reply)) => reply,
                other => panic!("expected ready entry, got {other:?}"),
            }
        };
        assert_eq!(reply.value, "hello");
        assert!(reply.is_ok());
    }

    #[test]
    fn test_drain_discards_orphan_reply() {
        let bridge = test_bridge();
        bridge.push_reply("orphan|||42");
        bridge.drain_replies();
        assert_eq!(bridge.outstanding(), 0);
    }

    #[test]
    fn test_drain_skips_malformed_then_processes_good() {
        let bridge = test_bridge();
        let key = bridge.new_key();
        bridge.push_reply("junk|2fields");
        bridge.push_reply(format!("good|||{key}"));
        bridge.drain_replies();
        assert!(matches!(
            bridge.lock_pending().get(&key),
            Some(entry) if entry.is_ready()
        ));
    }

    #[test]
    fn test_await_reply_on_main_context_fails_fast() {
        let bridge = test_bridge();
        let key = bridge.new_key();
        let start = Instant::now();
        let err = bridge
            .await_reply(key, Duration::from_secs(5), Duration::from_millis(10))
            .unwrap_err();
        assert!(err.is_main_context_guard());
        // Fails fast: no sleep-polling happened
        assert!(start.elapsed() < Duration::from_millis(50));
        assert!(!bridge.is_pending(key));
    }

    #[test]
    fn test_await_reply_times_out_and_cleans_up() {
        let bridge = Arc::new(test_bridge());
        let key = bridge.new_key();
        let err = on_worker(Arc::clone(&bridge), move |bridge| {
            bridge
                .await_reply(key, Duration::from_millis(50), Duration::from_millis(10))
                .unwrap_err()
        });
        assert!(err.is_timeout());
        assert!(!bridge.is_pending(key));
    }

    #[test]
    fn test_await_reply_returns_pushed_value() {
        let bridge = Arc::new(test_bridge());
        let key = bridge.new_key();
        bridge.push_reply(format!("value1|||{key}"));
        let reply = on_worker(Arc::clone(&bridge), move |bridge| {
            bridge
                .await_reply(key, Duration::from_secs(1), Duration::from_millis(10))
                .unwrap()
        });
        assert_eq!(reply.value, "value1");
        assert!(reply.error_code.is_empty());
        assert!(reply.error_description.is_empty());
        assert!(!bridge.is_pending(key));
    }

    #[test]
    fn test_one_way_sends_reach_channel() {
        let channel = Arc::new(NullChannel::default());
        let bridge = CorrelationBridge::new(Arc::clone(&channel) as Arc<dyn HostChannel>, BridgeConfig::default());
        bridge.send_commit();
        bridge.send_terminate();
        bridge.send_terminate();
        assert_eq!(channel.commits.load(Ordering::SeqCst), 1);
        assert_eq!(channel.terminates.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_bind_main_context_moves_guard() {
        let bridge = Arc::new(test_bridge());
        // Rebind the main context away from the test thread
        let handle = {
            let bridge = Arc::clone(&bridge);
            std::thread::spawn(move || bridge.bind_main_context())
        };
        handle.join().unwrap();
        assert!(!bridge.on_main_context());

        // Now awaiting on this thread is allowed (and times out normally)
        let key = bridge.new_key();
        let err = bridge
            .await_reply(key, Duration::from_millis(30), Duration::from_millis(10))
            .unwrap_err();
        assert!(err.is_timeout());
    }
}
