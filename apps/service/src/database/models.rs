use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::monitoring::types::{CheckOutcome, CheckResult};

/// A monitored URL together with the memory of its last check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Target {
    pub id: String,
    pub url: String,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
    pub check_interval_ms: u64,
    pub last_checked_at: Option<DateTime<Utc>>,
    pub last_status_code: Option<u16>,
    pub last_error: Option<String>,
}

impl Target {
    /// Build a fresh, never-checked target with a new id.
    pub fn new(new: NewTarget, created_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            url: new.url,
            enabled: new.enabled,
            created_at,
            check_interval_ms: new.check_interval_ms,
            last_checked_at: None,
            last_status_code: None,
            last_error: None,
        }
    }

    /// Whether a check is owed at `now`.
    ///
    /// Never-checked targets are always due. A clock that went backwards
    /// leaves the target not due until the interval has really elapsed.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        match self.last_checked_at {
            None => true,
            Some(last) => {
                let elapsed = now.signed_duration_since(last).num_milliseconds();
                elapsed >= 0 && elapsed as u64 >= self.check_interval_ms
            }
        }
    }

    /// The last recorded outcome, `None` until the first check lands.
    pub fn last_outcome(&self) -> Option<CheckOutcome> {
        self.last_checked_at?;
        match (&self.last_error, self.last_status_code) {
            (Some(message), _) => Some(CheckOutcome::Failure { message: message.clone() }),
            (None, Some(status_code)) => Some(CheckOutcome::Success { status_code }),
            (None, None) => None,
        }
    }

    pub(crate) fn apply_result(&mut self, result: &CheckResult) {
        self.last_checked_at = Some(result.timestamp);
        self.last_status_code = result.outcome.status_code();
        self.last_error = result.outcome.error().map(str::to_owned);
    }

    pub(crate) fn apply_patch(&mut self, patch: &TargetPatch) {
        if let Some(url) = &patch.url {
            self.url = url.clone();
        }
        if let Some(enabled) = patch.enabled {
            self.enabled = enabled;
        }
        if let Some(interval) = patch.check_interval_ms {
            self.check_interval_ms = interval;
        }
    }
}

/// Largest interval the store can hold, intervals are persisted as signed 64-bit
pub const MAX_INTERVAL_MS: u64 = i64::MAX as u64;

/// Insert payload; `url` must already be normalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTarget {
    pub url: String,
    pub enabled: bool,
    pub check_interval_ms: u64,
}

impl NewTarget {
    pub fn new(url: impl Into<String>, check_interval_ms: u64) -> Self {
        Self { url: url.into(), enabled: true, check_interval_ms }
    }
}

/// Partial update, `None` leaves the column untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetPatch {
    pub url: Option<String>,
    pub enabled: Option<bool>,
    pub check_interval_ms: Option<u64>,
}

impl TargetPatch {
    pub fn is_empty(&self) -> bool {
        self.url.is_none() && self.enabled.is_none() && self.check_interval_ms.is_none()
    }

    pub fn enabled(enabled: bool) -> Self {
        Self { enabled: Some(enabled), ..Self::default() }
    }
}

/// Convert a timestamp to Unix milliseconds for storage
pub fn timestamp_to_i64(time: DateTime<Utc>) -> i64 {
    time.timestamp_millis()
}

/// Convert stored Unix milliseconds back into a timestamp
pub fn i64_to_timestamp(millis: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(millis).single()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn target(interval_ms: u64) -> Target {
        Target::new(NewTarget::new("https://example.com", interval_ms), Utc::now())
    }

    #[test]
    fn test_never_checked_is_due() {
        let target = target(60_000);
        assert!(target.is_due(Utc::now()));
    }

    #[test]
    fn test_due_after_interval() {
        let mut target = target(5_000);
        let checked = Utc::now();
        target.apply_result(&CheckResult::success(checked, 200));

        assert!(!target.is_due(checked));
        assert!(!target.is_due(checked + Duration::milliseconds(4_999)));
        assert!(target.is_due(checked + Duration::milliseconds(5_000)));
        assert!(!target.is_due(checked - Duration::milliseconds(10_000)));
    }

    #[test]
    fn test_apply_result_overwrites_previous_outcome() {
        let mut target = target(1_000);
        let now = Utc::now();

        target.apply_result(&CheckResult::failure(now, "timed out"));
        assert_eq!(target.last_status_code, None);
        assert_eq!(target.last_error.as_deref(), Some("timed out"));

        target.apply_result(&CheckResult::success(now, 404));
        assert_eq!(target.last_status_code, Some(404));
        assert_eq!(target.last_error, None);
        assert_eq!(target.last_outcome(), Some(CheckOutcome::Success { status_code: 404 }));
    }

    #[test]
    fn test_json_uses_camel_case() {
        let target = target(60_000);
        let json = serde_json::to_value(&target).unwrap();

        assert_eq!(json["checkIntervalMs"], 60_000);
        assert_eq!(json["enabled"], true);
        assert!(json["lastCheckedAt"].is_null());
        assert!(json["lastStatusCode"].is_null());
        assert!(json["lastError"].is_null());
        assert!(json.get("createdAt").is_some());
    }

    #[test]
    fn test_millis_round_trip() {
        let now = i64_to_timestamp(1_700_000_000_123).unwrap();
        assert_eq!(timestamp_to_i64(now), 1_700_000_000_123);
    }
}
