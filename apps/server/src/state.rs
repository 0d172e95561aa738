use std::sync::Arc;

use keepalive_service::TargetStore;

/// Shared by every actix worker
pub struct AppState {
    pub store: Arc<dyn TargetStore>,
    /// Interval given to targets created without one
    pub default_interval_ms: u64,
}

impl AppState {
    pub fn new(store: Arc<dyn TargetStore>, default_interval_ms: u64) -> Self {
        Self { store, default_interval_ms }
    }
}
