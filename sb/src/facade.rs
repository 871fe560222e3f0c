//! Synchronous facade over the correlation bridge
//!
//! [`ScormApi`] is what application logic calls. Each get/set wraps one full
//! round trip (fresh key, one-way send, blocking wait, decode) and converts
//! every failure into an ordinary return value: `""` for a failed get,
//! `false` for a failed set. Nothing here is process-fatal.
//!
//! The facade tracks its lifecycle but does not gate calls on it; callers are
//! expected to wait for initialization to complete before issuing get/set,
//! and that ordering is enforced by the surrounding application.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, info, warn};

use crate::bridge::CorrelationBridge;
use crate::error::BridgeError;

/// Facade lifecycle
///
/// `Uninitialized → Initializing → Ready → Terminating → Terminated`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// No handshake issued yet
    Uninitialized,

    /// Version-probe handshake in flight
    Initializing,

    /// Handshake complete; get/set usable
    Ready,

    /// Terminate sent
    Terminating,

    /// Session over
    Terminated,
}

/// Synchronous SCORM API surface
pub struct ScormApi {
    bridge: Arc<CorrelationBridge>,
    state: Mutex<LifecycleState>,

    /// Which protocol variant the host reported (2004 vs 1.2)
    scorm_2004: AtomicBool,
}

impl ScormApi {
    /// Create a facade over an existing bridge
    pub fn new(bridge: Arc<CorrelationBridge>) -> Self {
        Self {
            bridge,
            state: Mutex::new(LifecycleState::Uninitialized),
            scorm_2004: AtomicBool::new(false),
        }
    }

    /// The underlying bridge
    pub fn bridge(&self) -> &Arc<CorrelationBridge> {
        &self.bridge
    }

    /// Current lifecycle state
    pub fn state(&self) -> LifecycleState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_state(&self, next: LifecycleState) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        debug!(from = ?*state, to = ?next, "ScormApi: state transition");
        *state = next;
    }

    /// Whether the host reported the SCORM 2004 variant
    pub fn is_scorm_2004(&self) -> bool {
        self.scorm_2004.load(Ordering::SeqCst)
    }

    /// Handshake with the host and learn which protocol variant is active
    ///
    /// Returns `true` for SCORM 2004, `false` for 1.2. Must run off the main
    /// context like every other round trip.
    pub fn initialize(&self) -> Result<bool, BridgeError> {
        self.set_state(LifecycleState::Initializing);

        let key = self.bridge.new_key();
        self.bridge.send_version_probe(key);
        match self.bridge.await_reply_default(key) {
            Ok(reply) => {
                let is_2004 = parse_host_bool(&reply.value);
                self.scorm_2004.store(is_2004, Ordering::SeqCst);
                if is_2004 {
                    self.bridge.sink().log("ScormVersion is 2004");
                } else {
                    self.bridge.sink().log("ScormVersion is 1.2");
                }
                info!(is_2004, "ScormApi::initialize: handshake complete");
                self.set_state(LifecycleState::Ready);
                Ok(is_2004)
            }
            Err(err) => {
                warn!(%err, "ScormApi::initialize: handshake failed");
                self.set_state(LifecycleState::Uninitialized);
                Err(err)
            }
        }
    }

    /// Fetch a data-model element value
    ///
    /// Returns the raw value string, or `""` when the host reported an error
    /// or the wait failed; either way the outcome is logged.
    pub fn get_value(&self, identifier: &str) -> String {
        let key = self.bridge.new_key();
        self.bridge.sink().log(&format!("Get {identifier}"));
        self.bridge.send_get(identifier, key);

        match self.bridge.await_reply_default(key) {
            Ok(reply) if reply.is_ok() => {
                self.bridge.sink().log(&format!("Got {}", reply.value));
                reply.value
            }
            Ok(reply) => {
                self.bridge.sink().log(&format!(
                    "Error: {} {} Result: {}",
                    reply.error_code, reply.error_description, reply.value
                ));
                String::new()
            }
            Err(err) => {
                warn!(identifier, %err, "ScormApi::get_value: round trip failed");
                self.bridge.sink().log(&format!("Error: {err}"));
                String::new()
            }
        }
    }

    /// Store a data-model element value
    ///
    /// Returns `true` iff the host acknowledged without an error code.
    pub fn set_value(&self, identifier: &str, value: &str) -> bool {
        let key = self.bridge.new_key();
        self.bridge.sink().log(&format!("Set {identifier} to {value}"));
        self.bridge.send_set(identifier, value, key);

        match self.bridge.await_reply_default(key) {
            Ok(reply) if reply.is_ok() => {
                self.bridge.sink().log(&format!("Result {}", reply.value));
                true
            }
            Ok(reply) => {
                self.bridge
                    .sink()
                    .log(&format!("Error: {} {}", reply.error_code, reply.error_description));
                false
            }
            Err(err) => {
                warn!(identifier, %err, "ScormApi::set_value: round trip failed");
                self.bridge.sink().log(&format!("Error: {err}"));
                false
            }
        }
    }

    /// Ask the host to persist everything set so far (one-way)
    pub fn commit(&self) {
        self.bridge.sink().log("Commit");
        self.bridge.send_commit();
    }

    /// End the session (one-way)
    pub fn terminate(&self) {
        self.set_state(LifecycleState::Terminating);
        self.bridge.sink().log("Terminate");
        self.bridge.send_terminate();
        self.set_state(LifecycleState::Terminated);
    }
}

/// Interpret the host's boolean reply value
///
/// The page-side script stringifies a JavaScript boolean, so accept the usual
/// spellings rather than a strict parse.
fn parse_host_bool(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "true" | "1")
}
