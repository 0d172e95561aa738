use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::models::{NewTarget, Target, TargetPatch};
use super::store::{RecordOutcome, StoreError, StoreResult, TargetStore, interval_to_i64};
use crate::monitoring::types::CheckResult;

/// Process-local store, mainly for tests and throwaway runs.
///
/// A single lock guards the whole set so the uniqueness check and the write
/// happen atomically.
#[derive(Debug, Default)]
pub struct InMemoryTargetStore {
    targets: RwLock<Vec<Target>>,
}

impl InMemoryTargetStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TargetStore for InMemoryTargetStore {
    async fn list(&self) -> StoreResult<Vec<Target>> {
        Ok(self.targets.read().await.clone())
    }

    async fn get(&self, id: &str) -> StoreResult<Option<Target>> {
        Ok(self.targets.read().await.iter().find(|target| target.id == id).cloned())
    }

    async fn find_enabled(&self) -> StoreResult<Vec<Target>> {
        Ok(self.targets.read().await.iter().filter(|target| target.enabled).cloned().collect())
    }

    async fn create(&self, new: NewTarget) -> StoreResult<Target> {
        interval_to_i64(new.check_interval_ms)?;
        let mut targets = self.targets.write().await;
        if targets.iter().any(|target| target.url == new.url) {
            return Err(StoreError::DuplicateUrl(new.url));
        }

        let target = Target::new(new, Utc::now());
        targets.push(target.clone());
        Ok(target)
    }

    async fn update(&self, id: &str, patch: TargetPatch) -> StoreResult<Option<Target>> {
        if let Some(interval_ms) = patch.check_interval_ms {
            interval_to_i64(interval_ms)?;
        }

        let mut targets = self.targets.write().await;
        let Some(index) = targets.iter().position(|target| target.id == id) else {
            return Ok(None);
        };

        if let Some(url) = &patch.url {
            if targets.iter().any(|target| target.id != id && &target.url == url) {
                return Err(StoreError::DuplicateUrl(url.clone()));
            }
        }

        let target = &mut targets[index];
        target.apply_patch(&patch);
        Ok(Some(target.clone()))
    }

    async fn delete(&self, id: &str) -> StoreResult<bool> {
        let mut targets = self.targets.write().await;
        let before = targets.len();
        targets.retain(|target| target.id != id);
        Ok(targets.len() != before)
    }

    async fn upsert_if_absent(&self, new: NewTarget) -> StoreResult<Target> {
        interval_to_i64(new.check_interval_ms)?;
        let mut targets = self.targets.write().await;
        if let Some(existing) = targets.iter().find(|target| target.url == new.url) {
            return Ok(existing.clone());
        }

        let target = Target::new(new, Utc::now());
        targets.push(target.clone());
        Ok(target)
    }

    async fn record_check_result(&self, id: &str, result: &CheckResult) -> StoreResult<RecordOutcome> {
        let mut targets = self.targets.write().await;
        match targets.iter_mut().find(|target| target.id == id) {
            Some(target) => {
                target.apply_result(result);
                Ok(RecordOutcome::Recorded)
            }
            None => Ok(RecordOutcome::NotFound),
        }
    }
}
