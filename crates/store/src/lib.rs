//! Audit store implementations for ChatRelay.

pub mod in_memory;

#[cfg(feature = "sqlite")]
pub mod sqlite;

use std::sync::Arc;

use chatrelay_config::StoreConfig;
use chatrelay_core::error::StoreError;
use chatrelay_core::store::AuditStore;

pub use in_memory::InMemoryStore;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteStore;

/// Open the store described by `config`.
pub async fn open_from_config(config: &StoreConfig) -> Result<Arc<dyn AuditStore>, StoreError> {
    match config.backend.as_str() {
        "memory" => Ok(Arc::new(InMemoryStore::new())),
        #[cfg(feature = "sqlite")]
        "sqlite" => Ok(Arc::new(SqliteStore::new(&config.url).await?)),
        other => Err(StoreError::Storage(format!(
            "store backend '{other}' is not available in this build"
        ))),
    }
}
