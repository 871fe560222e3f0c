//! Reply wire format and pending-call state
//!
//! The host page answers every correlated call with a single string:
//!
//! ```text
//! <value>|<errorCode>|<errorDescription>|<key>
//! ```
//!
//! Exactly three `|` separators; value, error code, and description may be
//! empty but are always present; the key is always the final field.

use crate::error::ReplyParseError;

/// Correlation key carried in both the outbound call and the inbound reply.
///
/// Keys are drawn uniformly from the full `u16` range (0..=65535) and checked
/// against the live pending set, so no two outstanding calls share a key.
pub type CorrelationKey = u16;

/// Decoded result of one host API call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallReply {
    /// Raw value string returned by the host
    pub value: String,

    /// Host error code; empty means success
    pub error_code: String,

    /// Human-readable error description; empty when `error_code` is empty
    pub error_description: String,
}

impl CallReply {
    /// Check whether the host reported success
    pub fn is_ok(&self) -> bool {
        self.error_code.is_empty()
    }
}

/// One in-flight round trip, keyed by its correlation key
///
/// Created `Waiting` when the call is issued, flipped to `Ready` exactly once
/// when the matching reply is drained, and removed by the waiter that created
/// it. No entry outlives its call.
#[derive(Debug, Clone)]
pub enum PendingCall {
    /// Issued, reply not yet drained
    Waiting,

    /// Reply drained and decoded
    Ready(CallReply),
}

impl PendingCall {
    /// Check whether the reply has arrived
    pub fn is_ready(&self) -> bool {
        matches!(self, PendingCall::Ready(_))
    }
}

/// Parse a raw reply string into its correlation key and decoded reply
///
/// Splits on `|` and takes the LAST token as the key; the first three tokens
/// are value, error code, and error description in that order. Returns an
/// explicit error for malformed input instead of panicking, so the drain loop
/// can log and skip bad entries.
pub fn parse_raw_reply(raw: &str) -> Result<(CorrelationKey, CallReply), ReplyParseError> {
    let tokens: Vec<&str> = raw.split('|').collect();
    if tokens.len() < 4 {
        return Err(ReplyParseError::TooFewFields {
            found: tokens.len(),
            raw: raw.to_string(),
        });
    }

    let key_token = tokens[tokens.len() - 1];
    let key: CorrelationKey = key_token.trim().parse().map_err(|_| ReplyParseError::BadKey {
        token: key_token.to_string(),
    })?;

    Ok((
        key,
        CallReply {
            value: tokens[0].to_string(),
            error_code: tokens[1].to_string(),
            error_description: tokens[2].to_string(),
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_success_reply() {
        let (key, reply) = parse_raw_reply("completed|||1234").unwrap();
        assert_eq!(key, 1234);
        assert_eq!(reply.value, "completed");
        assert!(reply.is_ok());
        assert!(reply.error_description.is_empty());
    }

    #[test]
    fn test_parse_error_reply() {
        let (key, reply) = parse_raw_reply("|401|Undefined data model element|9").unwrap();
        assert_eq!(key, 9);
        assert!(reply.value.is_empty());
        assert!(!reply.is_ok());
        assert_eq!(reply.error_code, "401");
        assert_eq!(reply.error_description, "Undefined data model element");
    }

    #[test]
    fn test_parse_all_fields_empty_but_key() {
        let (key, reply) = parse_raw_reply("|||0").unwrap();
        assert_eq!(key, 0);
        assert!(reply.is_ok());
    }

    #[test]
    fn test_parse_too_few_fields() {
        let err = parse_raw_reply("oops|5").unwrap_err();
        assert!(matches!(err, ReplyParseError::TooFewFields { found: 2, .. }));
    }

    #[test]
    fn test_parse_bad_key() {
        let err = parse_raw_reply("value|||not-a-key").unwrap_err();
        assert!(matches!(err, ReplyParseError::BadKey { .. }));
    }

    #[test]
    fn test_parse_key_out_of_range() {
        assert!(parse_raw_reply("value|||70000").is_err());
    }

    #[test]
    fn test_pending_call_states() {
        assert!(!PendingCall::Waiting.is_ready());
        let ready = PendingCall::Ready(CallReply {
            value: "true".into(),
            error_code: String::new(),
            error_description: String::new(),
        });
        assert!(ready.is_ready());
    }

    proptest! {
        /// Parsing must never panic, whatever the host sends.
        #[test]
        fn parse_never_panics(raw in ".*") {
            let _ = parse_raw_reply(&raw);
        }

        /// A well-formed reply always round-trips its key from the last field.
        #[test]
        fn key_is_last_field(
            value in "[^|]*",
            code in "[^|]*",
            desc in "[^|]*",
            key in any::<u16>(),
        ) {
            let raw = format!("{value}|{code}|{desc}|{key}");
            let (parsed_key, reply) = parse_raw_reply(&raw).unwrap();
            prop_assert_eq!(parsed_key, key);
            prop_assert_eq!(reply.value, value);
            prop_assert_eq!(reply.error_code, code);
            prop_assert_eq!(reply.error_description, desc);
        }
    }
}
