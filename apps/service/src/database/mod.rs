//! Target persistence
//!
//! `TargetStore` is the only shared mutable resource of the service. It has a
//! libsql implementation for real deployments and an in-memory one for tests.

pub mod memory;
pub mod migrations;
pub mod models;
pub mod repository;
pub mod store;


pub use memory::InMemoryTargetStore;
pub use models::{NewTarget, Target, TargetPatch};
pub use repository::LibsqlTargetStore;
pub use store::{RecordOutcome, StoreError, StoreResult, TargetStore};

use anyhow::{Context, Result};
use deadpool::managed::{Pool, PoolConfig};

use crate::pool::{LibsqlManager, LibsqlPool};

/// Initialize database with schema
pub async fn initialize_database(conn: &libsql::Connection) -> Result<()> {
    migrations::run_migrations(conn).await
}

/// Open the database behind `url`, migrate it and hand back a pool.
///
/// `libsql://`, `http://` and `https://` urls are treated as remote databases,
/// anything else as a local file path. Failing here is fatal for the process.
pub async fn open_pool(url: &str, auth_token: Option<&str>, max_size: usize) -> Result<LibsqlPool> {
    let database = if is_remote(url) {
        libsql::Builder::new_remote(url.to_owned(), auth_token.unwrap_or_default().to_owned())
            .build()
            .await
            .with_context(|| format!("failed to open remote database {url}"))?
    } else {
        libsql::Builder::new_local(url)
            .build()
            .await
            .with_context(|| format!("failed to open database file {url}"))?
    };

    let pool: LibsqlPool = Pool::builder(LibsqlManager::new(database))
        .config(PoolConfig::new(max_size.max(1)))
        .build()
        .context("failed to build connection pool")?;

    let conn = pool.get().await.map_err(|e| anyhow::anyhow!("failed to connect to database: {e}"))?;
    initialize_database(&*conn).await.context("failed to migrate database")?;

    Ok(pool)
}

fn is_remote(url: &str) -> bool {
    ["libsql://", "http://", "https://"].iter().any(|scheme| url.starts_with(scheme))
}
