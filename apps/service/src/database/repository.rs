use async_trait::async_trait;
use chrono::{SubsecRound, Utc};
use deadpool::managed::Object;
use libsql::params::IntoParams;
use libsql::{Row, params};

use super::models::{NewTarget, Target, TargetPatch, i64_to_timestamp, timestamp_to_i64};
use super::store::{RecordOutcome, StoreError, StoreResult, TargetStore, interval_to_i64};
use crate::monitoring::types::CheckResult;
use crate::pool::{LibsqlManager, LibsqlPool};

const TARGET_COLUMNS: &str =
    "id, url, enabled, created_at, check_interval_ms, last_checked_at, last_status_code, last_error";

/// libsql-backed target store.
///
/// Each operation is a single statement, which SQLite applies atomically.
pub struct LibsqlTargetStore {
    pool: LibsqlPool,
}

impl LibsqlTargetStore {
    pub fn new_from_pool(pool: LibsqlPool) -> Self {
        Self { pool }
    }

    async fn get_conn(&self) -> StoreResult<Object<LibsqlManager>> {
        self.pool.get().await.map_err(|e| StoreError::Pool(e.to_string()))
    }

    async fn query_targets(&self, sql: &str, params: impl IntoParams + Send) -> StoreResult<Vec<Target>> {
        let conn = self.get_conn().await?;
        let mut rows = conn.query(sql, params).await?;

        let mut targets = Vec::new();
        while let Some(row) = rows.next().await? {
            targets.push(target_from_row(&row)?);
        }

        Ok(targets)
    }
}

#[async_trait]
impl TargetStore for LibsqlTargetStore {
    async fn list(&self) -> StoreResult<Vec<Target>> {
        self.query_targets(&format!("SELECT {TARGET_COLUMNS} FROM targets ORDER BY created_at, rowid"), ())
            .await
    }

    async fn get(&self, id: &str) -> StoreResult<Option<Target>> {
        let targets = self
            .query_targets(&format!("SELECT {TARGET_COLUMNS} FROM targets WHERE id = ?"), params![id])
            .await?;
        Ok(targets.into_iter().next())
    }

    async fn find_enabled(&self) -> StoreResult<Vec<Target>> {
        self.query_targets(
            &format!("SELECT {TARGET_COLUMNS} FROM targets WHERE enabled = 1 ORDER BY created_at, rowid"),
            (),
        )
        .await
    }

    async fn create(&self, new: NewTarget) -> StoreResult<Target> {
        let interval = interval_to_i64(new.check_interval_ms)?;
        let conn = self.get_conn().await?;
        let target = Target::new(new, Utc::now().trunc_subsecs(3));

        conn.execute(
            "INSERT INTO targets (id, url, enabled, created_at, check_interval_ms) VALUES (?, ?, ?, ?, ?)",
            params![
                target.id.clone(),
                target.url.clone(),
                i64::from(target.enabled),
                timestamp_to_i64(target.created_at),
                interval
            ],
        )
        .await
        .map_err(|e| map_write_error(e, &target.url))?;

        Ok(target)
    }

    async fn update(&self, id: &str, patch: TargetPatch) -> StoreResult<Option<Target>> {
        let interval = patch.check_interval_ms.map(interval_to_i64).transpose()?;
        let conn = self.get_conn().await?;
        let url = patch.url.clone().unwrap_or_default();

        let sql = format!(
            "UPDATE targets SET url = COALESCE(?1, url), enabled = COALESCE(?2, enabled), \
             check_interval_ms = COALESCE(?3, check_interval_ms) WHERE id = ?4 RETURNING {TARGET_COLUMNS}"
        );
        let mut rows = conn
            .query(
                &sql,
                params![
                    patch.url,
                    patch.enabled.map(i64::from),
                    interval,
                    id
                ],
            )
            .await
            .map_err(|e| map_write_error(e, &url))?;

        match rows.next().await.map_err(|e| map_write_error(e, &url))? {
            Some(row) => Ok(Some(target_from_row(&row)?)),
            None => Ok(None),
        }
    }

    async fn delete(&self, id: &str) -> StoreResult<bool> {
        let conn = self.get_conn().await?;
        let affected = conn.execute("DELETE FROM targets WHERE id = ?", params![id]).await?;
        Ok(affected > 0)
    }

    async fn upsert_if_absent(&self, new: NewTarget) -> StoreResult<Target> {
        let interval = interval_to_i64(new.check_interval_ms)?;
        let conn = self.get_conn().await?;
        let candidate = Target::new(new, Utc::now().trunc_subsecs(3));

        conn.execute(
            "INSERT INTO targets (id, url, enabled, created_at, check_interval_ms) VALUES (?, ?, ?, ?, ?) \
             ON CONFLICT(url) DO NOTHING",
            params![
                candidate.id.clone(),
                candidate.url.clone(),
                i64::from(candidate.enabled),
                timestamp_to_i64(candidate.created_at),
                interval
            ],
        )
        .await?;
        drop(conn);

        let existing = self
            .query_targets(
                &format!("SELECT {TARGET_COLUMNS} FROM targets WHERE url = ?"),
                params![candidate.url.clone()],
            )
            .await?;
        existing
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::Corrupt(format!("{} vanished right after upsert", candidate.url)))
    }

    async fn record_check_result(&self, id: &str, result: &CheckResult) -> StoreResult<RecordOutcome> {
        let conn = self.get_conn().await?;
        let affected = conn
            .execute(
                "UPDATE targets SET last_checked_at = ?, last_status_code = ?, last_error = ? WHERE id = ?",
                params![
                    timestamp_to_i64(result.timestamp),
                    result.outcome.status_code().map(i64::from),
                    result.outcome.error().map(str::to_owned),
                    id
                ],
            )
            .await?;

        if affected == 0 { Ok(RecordOutcome::NotFound) } else { Ok(RecordOutcome::Recorded) }
    }
}

fn target_from_row(row: &Row) -> StoreResult<Target> {
    let id: String = row.get(0)?;
    let created_at: i64 = row.get(3)?;
    let check_interval_ms: i64 = row.get(4)?;
    let last_checked_at: Option<i64> = row.get(5)?;
    let last_status_code: Option<i64> = row.get(6)?;

    let corrupt = |field: &str, value: i64| StoreError::Corrupt(format!("{id}: {field} = {value}"));

    Ok(Target {
        url: row.get(1)?,
        enabled: row.get::<i64>(2)? != 0,
        created_at: i64_to_timestamp(created_at).ok_or_else(|| corrupt("created_at", created_at))?,
        check_interval_ms: u64::try_from(check_interval_ms)
            .ok()
            .filter(|interval| *interval > 0)
            .ok_or_else(|| corrupt("check_interval_ms", check_interval_ms))?,
        last_checked_at: last_checked_at
            .map(|ms| i64_to_timestamp(ms).ok_or_else(|| corrupt("last_checked_at", ms)))
            .transpose()?,
        last_status_code: last_status_code
            .map(|code| u16::try_from(code).map_err(|_| corrupt("last_status_code", code)))
            .transpose()?,
        last_error: row.get(7)?,
        id,
    })
}

fn map_write_error(error: libsql::Error, url: &str) -> StoreError {
    if error.to_string().contains("UNIQUE constraint failed") {
        StoreError::DuplicateUrl(url.to_owned())
    } else {
        StoreError::Database(error)
    }
}
