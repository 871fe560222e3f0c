//! Boundary-layer vocabulary for the SCORM data model
//!
//! The core carries element identifiers and values as opaque strings; this
//! module is the edge where typed record fields meet those strings. Every
//! mapping is an explicit, exhaustive match table over the vocabulary the
//! host understands. Unknown inbound strings decode to the `NotSet` variant,
//! which encodes back to the empty string.

use std::fmt;
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;

/// cmi.completion_status vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompletionStatus {
    Completed,
    Incomplete,
    NotAttempted,
    Unknown,
    #[default]
    NotSet,
}

impl CompletionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            CompletionStatus::Completed => "completed",
            CompletionStatus::Incomplete => "incomplete",
            CompletionStatus::NotAttempted => "not attempted",
            CompletionStatus::Unknown => "unknown",
            CompletionStatus::NotSet => "",
        }
    }

    pub fn parse(value: &str) -> Self {
        match value {
            "completed" => CompletionStatus::Completed,
            "incomplete" => CompletionStatus::Incomplete,
            "not attempted" => CompletionStatus::NotAttempted,
            "unknown" => CompletionStatus::Unknown,
            _ => CompletionStatus::NotSet,
        }
    }
}

impl fmt::Display for CompletionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// cmi.success_status vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SuccessStatus {
    Passed,
    Failed,
    Unknown,
    #[default]
    NotSet,
}

impl SuccessStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            SuccessStatus::Passed => "passed",
            SuccessStatus::Failed => "failed",
            SuccessStatus::Unknown => "unknown",
            SuccessStatus::NotSet => "",
        }
    }

    pub fn parse(value: &str) -> Self {
        match value {
            "passed" => SuccessStatus::Passed,
            "failed" => SuccessStatus::Failed,
            "unknown" => SuccessStatus::Unknown,
            _ => SuccessStatus::NotSet,
        }
    }
}

impl fmt::Display for SuccessStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// cmi.credit vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Credit {
    Credit,
    NoCredit,
    #[default]
    NotSet,
}

impl Credit {
    pub fn as_str(self) -> &'static str {
        match self {
            Credit::Credit => "credit",
            Credit::NoCredit => "no-credit",
            Credit::NotSet => "",
        }
    }

    pub fn parse(value: &str) -> Self {
        match value {
            "credit" => Credit::Credit,
            "no-credit" => Credit::NoCredit,
            _ => Credit::NotSet,
        }
    }
}

/// cmi.entry vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Entry {
    Start,
    Resume,
    #[default]
    NotSet,
}

impl Entry {
    pub fn as_str(self) -> &'static str {
        match self {
            Entry::Start => "ab-initio",
            Entry::Resume => "resume",
            Entry::NotSet => "",
        }
    }

    pub fn parse(value: &str) -> Self {
        match value {
            "ab-initio" => Entry::Start,
            "resume" => Entry::Resume,
            _ => Entry::NotSet,
        }
    }
}

/// cmi.exit vocabulary, as the integration kit emits it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Exit {
    TimeOut,
    Suspend,
    #[default]
    Normal,
}

impl Exit {
    pub fn as_str(self) -> &'static str {
        match self {
            Exit::TimeOut => "timeout",
            Exit::Suspend => "suspend",
            Exit::Normal => "normal",
        }
    }

    pub fn parse(value: &str) -> Self {
        match value {
            "timeout" => Exit::TimeOut,
            "suspend" => Exit::Suspend,
            _ => Exit::Normal,
        }
    }
}

/// cmi.mode vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    Browse,
    Normal,
    Review,
    #[default]
    NotSet,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Browse => "browse",
            Mode::Normal => "normal",
            Mode::Review => "review",
            Mode::NotSet => "",
        }
    }

    pub fn parse(value: &str) -> Self {
        match value {
            "browse" => Mode::Browse,
            "normal" => Mode::Normal,
            "review" => Mode::Review,
            _ => Mode::NotSet,
        }
    }
}

/// cmi.interactions.n.type vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InteractionKind {
    TrueFalse,
    Choice,
    FillIn,
    LongFillIn,
    Likert,
    Matching,
    Performance,
    Sequencing,
    Numeric,
    Other,
    #[default]
    NotSet,
}

impl InteractionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            InteractionKind::TrueFalse => "true-false",
            InteractionKind::Choice => "choice",
            InteractionKind::FillIn => "fill-in",
            InteractionKind::LongFillIn => "long-fill-in",
            InteractionKind::Likert => "likert",
            InteractionKind::Matching => "matching",
            InteractionKind::Performance => "performance",
            InteractionKind::Sequencing => "sequencing",
            InteractionKind::Numeric => "numeric",
            InteractionKind::Other => "other",
            InteractionKind::NotSet => "",
        }
    }

    pub fn parse(value: &str) -> Self {
        match value {
            "true-false" => InteractionKind::TrueFalse,
            "choice" => InteractionKind::Choice,
            "fill-in" => InteractionKind::FillIn,
            "long-fill-in" => InteractionKind::LongFillIn,
            "likert" => InteractionKind::Likert,
            "matching" => InteractionKind::Matching,
            "performance" => InteractionKind::Performance,
            "sequencing" => InteractionKind::Sequencing,
            "numeric" => InteractionKind::Numeric,
            "other" => InteractionKind::Other,
            _ => InteractionKind::NotSet,
        }
    }
}

/// cmi.interactions.n.result vocabulary
///
/// A bare number in this slot means a numeric estimate, so decoding tries the
/// named vocabulary first and falls back to a float parse.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum InteractionResult {
    Correct,
    Incorrect,
    Unanticipated,
    Neutral,
    Estimate(f32),
    #[default]
    NotSet,
}

impl InteractionResult {
    pub fn encode(self) -> String {
        match self {
            InteractionResult::Correct => "correct".to_string(),
            InteractionResult::Incorrect => "incorrect".to_string(),
            InteractionResult::Unanticipated => "unanticipated".to_string(),
            InteractionResult::Neutral => "neutral".to_string(),
            InteractionResult::Estimate(value) => value.to_string(),
            InteractionResult::NotSet => String::new(),
        }
    }

    pub fn parse(value: &str) -> Self {
        match value {
            "correct" => InteractionResult::Correct,
            "incorrect" => InteractionResult::Incorrect,
            "unanticipated" => InteractionResult::Unanticipated,
            "neutral" => InteractionResult::Neutral,
            other => match other.parse::<f32>() {
                Ok(estimate) => InteractionResult::Estimate(estimate),
                Err(_) => InteractionResult::NotSet,
            },
        }
    }
}

/// cmi.time_limit_action vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeLimitAction {
    ExitMessage,
    ExitNoMessage,
    ContinueMessage,
    ContinueNoMessage,
    #[default]
    NotSet,
}

impl TimeLimitAction {
    pub fn as_str(self) -> &'static str {
        match self {
            TimeLimitAction::ExitMessage => "exit,message",
            TimeLimitAction::ExitNoMessage => "exit,no message",
            TimeLimitAction::ContinueMessage => "continue,message",
            TimeLimitAction::ContinueNoMessage => "continue,no message",
            TimeLimitAction::NotSet => "",
        }
    }

    pub fn parse(value: &str) -> Self {
        match value {
            "exit,message" => TimeLimitAction::ExitMessage,
            "exit,no message" => TimeLimitAction::ExitNoMessage,
            "continue,message" => TimeLimitAction::ContinueMessage,
            "continue,no message" => TimeLimitAction::ContinueNoMessage,
            _ => TimeLimitAction::NotSet,
        }
    }
}

static TIME_INTERVAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^P(?:(\d+)Y)?(?:(\d+)M)?(?:(\d+)D)?(?:T(?:(\d+)H)?(?:(\d+)M)?(?:(\d+(?:\.\d+)?)S)?)?$")
        .expect("time interval pattern is valid")
});

/// Encode a duration as a SCORM `timeinterval` (`PxDTxHxMx.xS`)
///
/// Days are the largest unit emitted; years and months are never produced,
/// which the data model accepts.
pub fn encode_time_interval(duration: Duration) -> String {
    let total = duration.as_secs_f64();
    let days = (total / 86_400.0) as u64;
    let hours = ((total % 86_400.0) / 3_600.0) as u64;
    let minutes = ((total % 3_600.0) / 60.0) as u64;
    let seconds = total % 60.0;
    format!("P{days}DT{hours}H{minutes}M{seconds:.2}S")
}

/// Decode a SCORM `timeinterval` into a duration
///
/// Years count as 365.25 days and months as 1/12 of that, matching the
/// hundredths-based arithmetic of the original integration kit. Returns
/// `None` for strings that do not match the format.
pub fn decode_time_interval(value: &str) -> Option<Duration> {
    if value.is_empty() {
        return None;
    }
    let caps = TIME_INTERVAL.captures(value)?;
    let field = |i: usize| -> f64 {
        caps.get(i)
            .and_then(|m| m.as_str().parse::<f64>().ok())
            .unwrap_or(0.0)
    };
    let seconds = field(1) * 31_557_600.0
        + field(2) * 2_629_800.0
        + field(3) * 86_400.0
        + field(4) * 3_600.0
        + field(5) * 60.0
        + field(6);
    Some(Duration::from_secs_f64(seconds))
}
