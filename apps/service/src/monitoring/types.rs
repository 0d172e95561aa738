use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How a single check ended.
///
/// Any HTTP response counts as `Success`, whatever its status class. `Failure`
/// means no response was received at all (DNS, connect, TLS, timeout...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum CheckOutcome {
    Success { status_code: u16 },
    Failure { message: String },
}

impl CheckOutcome {
    pub fn status_code(&self) -> Option<u16> {
        match self {
            CheckOutcome::Success { status_code } => Some(*status_code),
            CheckOutcome::Failure { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            CheckOutcome::Success { .. } => None,
            CheckOutcome::Failure { message } => Some(message),
        }
    }
}

/// Result of a monitoring check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResult {
    /// When the attempt started
    pub timestamp: DateTime<Utc>,
    pub outcome: CheckOutcome,
}

impl CheckResult {
    pub fn success(timestamp: DateTime<Utc>, status_code: u16) -> Self {
        Self { timestamp, outcome: CheckOutcome::Success { status_code } }
    }

    pub fn failure(timestamp: DateTime<Utc>, message: impl Into<String>) -> Self {
        Self { timestamp, outcome: CheckOutcome::Failure { message: message.into() } }
    }
}
