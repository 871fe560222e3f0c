//! Bridge error types

use std::time::Duration;

use thiserror::Error;

use crate::bridge::CorrelationKey;

/// Errors that can occur during a bridge round trip
#[derive(Debug, Error)]
pub enum BridgeError {
    /// No reply arrived for the key before the deadline
    #[error("timed out waiting for reply to key {key} after {waited:?}")]
    TimedOut { key: CorrelationKey, waited: Duration },

    /// `await_reply` was invoked on the main context, which would deadlock
    /// because that context is the one that delivers replies
    #[error("await_reply called on the main context; the reply could never be delivered")]
    MainContext,
}

impl BridgeError {
    /// Check if this is a timeout
    pub fn is_timeout(&self) -> bool {
        matches!(self, BridgeError::TimedOut { .. })
    }

    /// Check if this is the main-context guard firing
    pub fn is_main_context_guard(&self) -> bool {
        matches!(self, BridgeError::MainContext)
    }
}

/// Errors loading or saving bridge configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Errors produced when parsing a raw reply string
///
/// Parse failures are consumed inside the drain loop: the malformed entry is
/// logged and skipped, and draining continues with the next queued item.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReplyParseError {
    /// Fewer than the four `|`-delimited fields the wire format requires
    #[error("reply has {found} fields, expected at least 4: {raw:?}")]
    TooFewFields { found: usize, raw: String },

    /// The final field did not parse as a correlation key
    #[error("reply key {token:?} is not a valid correlation key")]
    BadKey { token: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_predicate() {
        let err = BridgeError::TimedOut {
            key: 42,
            waited: Duration::from_millis(50),
        };
        assert!(err.is_timeout());
        assert!(!err.is_main_context_guard());
    }

    #[test]
    fn test_main_context_predicate() {
        let err = BridgeError::MainContext;
        assert!(err.is_main_context_guard());
        assert!(!err.is_timeout());
    }

    #[test]
    fn test_display_includes_key() {
        let err = BridgeError::TimedOut {
            key: 7,
            waited: Duration::from_millis(15),
        };
        assert!(err.to_string().contains("key 7"));
    }
}
