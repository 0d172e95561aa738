use async_trait::async_trait;
use thiserror::Error;

use super::models::{MAX_INTERVAL_MS, NewTarget, Target, TargetPatch};
use crate::monitoring::types::CheckResult;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("a target with url {0} already exists")]
    DuplicateUrl(String),
    #[error("database error: {0}")]
    Database(#[from] libsql::Error),
    #[error("connection pool error: {0}")]
    Pool(String),
    #[error("check interval {0}ms is out of range")]
    IntervalOutOfRange(u64),
    #[error("corrupt target row: {0}")]
    Corrupt(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Column form of an interval; zero and anything past `i64::MAX` are refused rather than clamped.
pub(crate) fn interval_to_i64(interval_ms: u64) -> StoreResult<i64> {
    match i64::try_from(interval_ms) {
        Ok(ms) if ms > 0 && interval_ms <= MAX_INTERVAL_MS => Ok(ms),
        _ => Err(StoreError::IntervalOutOfRange(interval_ms)),
    }
}

/// Outcome of writing a check result back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    Recorded,
    /// The target was deleted after the scheduler took its snapshot.
    NotFound,
}

/// Durable set of monitored targets.
///
/// Every method touches at most one record atomically; implementations must
/// guarantee that, since neither the scheduler nor the API take locks of
/// their own. Concurrent writes to the same record are last-write-wins.
#[async_trait]
pub trait TargetStore: Send + Sync {
    /// Every target, oldest first
    async fn list(&self) -> StoreResult<Vec<Target>>;

    async fn get(&self, id: &str) -> StoreResult<Option<Target>>;

    /// Snapshot of the targets the scheduler should consider
    async fn find_enabled(&self) -> StoreResult<Vec<Target>>;

    /// Insert a new target, failing with `DuplicateUrl` if the url is taken
    async fn create(&self, new: NewTarget) -> StoreResult<Target>;

    /// Apply a partial update, `Ok(None)` if the id is unknown
    async fn update(&self, id: &str, patch: TargetPatch) -> StoreResult<Option<Target>>;

    async fn set_enabled(&self, id: &str, enabled: bool) -> StoreResult<Option<Target>> {
        self.update(id, TargetPatch::enabled(enabled)).await
    }

    /// Remove a target, returning whether it existed
    async fn delete(&self, id: &str) -> StoreResult<bool>;

    /// Insert only when no target has this url; an existing one is returned untouched
    async fn upsert_if_absent(&self, new: NewTarget) -> StoreResult<Target>;

    /// Overwrite the last-check fields of one target if it still exists
    async fn record_check_result(&self, id: &str, result: &CheckResult) -> StoreResult<RecordOutcome>;
}
