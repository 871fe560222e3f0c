//! Asynchronous call-correlation core
//!
//! Three pieces compose the bridge:
//!
//! - [`CorrelationBridge`] issues one-way requests tagged with fresh
//!   correlation keys and blocks each caller until its reply arrives or the
//!   timeout elapses
//! - [`ReplyQueue`] buffers raw reply strings pushed asynchronously by the
//!   host environment
//! - the reply types in [`reply`] decode the `value|code|description|key`
//!   wire format
//!
//! Application code normally goes through [`ScormApi`](crate::ScormApi)
//! instead of calling the bridge directly.

pub mod config;
pub mod core;
pub mod queue;
pub mod reply;

pub use config::BridgeConfig;
pub use core::CorrelationBridge;
pub use queue::ReplyQueue;
pub use reply::{parse_raw_reply, CallReply, CorrelationKey, PendingCall};
