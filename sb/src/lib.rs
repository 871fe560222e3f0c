//! scorm-bridge - synchronous facade over the asynchronous host-page SCORM API
//!
//! A sandboxed client runtime can only reach the host page through one-way,
//! fire-and-forget calls; replies arrive later, out of order, on a separate
//! channel, correlated by an opaque key embedded in the reply payload. This
//! crate wraps that transport so application code gets plain blocking calls:
//!
//! ```text
//! caller → ScormApi::get_value
//!        → CorrelationBridge: fresh key, one-way send, block with timeout
//!        → host computes, pushes "value|code|desc|key" → ReplyQueue
//!        → drain routes reply by key → waiter wakes → value returned
//! ```
//!
//! Round trips must run off the main context (the thread that delivers
//! replies); blocking there would deadlock, and the bridge fails fast on it.
//!
//! # Modules
//!
//! - [`bridge`] - correlation core: key allocation, pending map, reply queue,
//!   blocking wait with timeout
//! - [`facade`] - [`ScormApi`], the get/set/commit/terminate surface
//! - [`host`] - [`HostChannel`] and [`LogSink`] seams to the environment
//! - [`sim`] - in-memory LMS for local testing
//! - [`datamodel`] - boundary vocabulary tables for typed record fields
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use scorm_bridge::{BridgeConfig, CorrelationBridge, ReplyQueue, ScormApi, SimulatorHost};
//!
//! let queue = Arc::new(ReplyQueue::new());
//! let host = Arc::new(SimulatorHost::new(Arc::clone(&queue)));
//! let bridge = CorrelationBridge::new(host, BridgeConfig::default()).with_reply_queue(queue);
//! let api = Arc::new(ScormApi::new(Arc::new(bridge)));
//!
//! // Round trips run on worker threads, never on the main context
//! let worker = {
//!     let api = Arc::clone(&api);
//!     std::thread::spawn(move || {
//!         api.initialize().unwrap();
//!         api.set_value("cmi.completion_status", "completed");
//!         api.commit();
//!     })
//! };
//! worker.join().unwrap();
//! ```

pub mod bridge;
pub mod datamodel;
pub mod error;
pub mod facade;
pub mod host;
pub mod sim;

// Re-export commonly used types
pub use bridge::{BridgeConfig, CallReply, CorrelationBridge, CorrelationKey, PendingCall, ReplyQueue};
pub use error::{BridgeError, ConfigError, ReplyParseError};
pub use facade::{LifecycleState, ScormApi};
pub use host::{HostChannel, LogSink, TracingLog};
pub use sim::SimulatorHost;
