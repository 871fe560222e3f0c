//! Host-page channel and log-collector seams
//!
//! All outward communication is fire-and-forget: the host page exposes a
//! handful of one-way functions, and replies come back later through the
//! shared [`ReplyQueue`](crate::bridge::ReplyQueue). An implementation
//! targeting a real page must invoke exactly these host functions:
//!
//! | Trait method    | Host function                                                            |
//! |-----------------|--------------------------------------------------------------------------|
//! | `get_value`     | `doGetValue(identifier, callbackObjectName, callbackFunctionName, key)`  |
//! | `set_value`     | `doSetValue(identifier, value, callbackObjectName, callbackFunctionName, key)` |
//! | `version_probe` | `doIsScorm2004(callbackObjectName, callbackFunctionName, key)`           |
//! | `commit`        | `doCommit()`                                                             |
//! | `terminate`     | `doTerminate()`                                                          |

use tracing::info;

use crate::bridge::CorrelationKey;

/// One-way call channel into the enclosing host page
///
/// No method returns a value and no delivery-order guarantee exists between
/// calls; correlated replies arrive asynchronously, tagged with `key`.
pub trait HostChannel: Send + Sync {
    /// Request the value of a data-model element
    fn get_value(&self, identifier: &str, callback_object: &str, callback_function: &str, key: CorrelationKey);

    /// Request storage of a data-model element value
    fn set_value(
        &self,
        identifier: &str,
        value: &str,
        callback_object: &str,
        callback_function: &str,
        key: CorrelationKey,
    );

    /// Ask which protocol variant the host is running (SCORM 2004 vs 1.2)
    fn version_probe(&self, callback_object: &str, callback_function: &str, key: CorrelationKey);

    /// Ask the host to persist everything set so far; no reply expected
    fn commit(&self);

    /// End the session on the host side; no reply expected
    fn terminate(&self);
}

/// External log collector
///
/// Every request and outcome is forwarded here, mirroring the host-page log
/// panel of the original integration kit. Implementations are fire-and-forget
/// and must never panic or block the bridge.
pub trait LogSink: Send + Sync {
    /// Record one line of bridge activity
    fn log(&self, text: &str);
}

/// Default sink that forwards to the `tracing` subscriber
#[derive(Debug, Default)]
pub struct TracingLog;

impl LogSink for TracingLog {
    fn log(&self, text: &str) {
        info!(target: "scorm_bridge::host", "{text}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct CapturingSink {
        lines: Mutex<Vec<String>>,
    }

    impl LogSink for CapturingSink {
        fn log(&self, text: &str) {
            self.lines.lock().unwrap().push(text.to_string());
        }
    }

    #[test]
    fn test_sink_is_object_safe() {
        let sink: Box<dyn LogSink> = Box::new(CapturingSink {
            lines: Mutex::new(Vec::new()),
        });
        sink.log("Get cmi.completion_status");
    }

    #[test]
    fn test_tracing_log_does_not_panic_without_subscriber() {
        TracingLog.log("Set cmi.score.raw to 85");
    }
}
