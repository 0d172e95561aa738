//! Registration of the process's own health endpoint as a target, so the
//! scheduler keeps pinging the host and it never idles out.

use thiserror::Error;
use tracing::info;

use crate::database::{NewTarget, StoreError, Target, TargetStore};
use crate::normalize::{ValidationError, normalize_url};

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("invalid self url: {0}")]
    InvalidUrl(#[from] ValidationError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Make sure a target for `self_url` exists.
///
/// An existing target is returned as-is, including its interval and enabled
/// flag. Must run once, before the scheduler's first tick.
pub async fn register_self_target(
    store: &dyn TargetStore,
    self_url: &str,
    default_interval_ms: u64,
) -> Result<Target, BootstrapError> {
    let url = normalize_url(self_url)?;
    let target = store.upsert_if_absent(NewTarget::new(url, default_interval_ms)).await?;

    info!(target_id = %target.id, url = %target.url, enabled = target.enabled, "Self target registered");
    Ok(target)
}
