//! Audit store trait — append-only persistence of completed exchanges.
//!
//! The pipeline only appends. Reading back (`count`, `recent`) exists for
//! diagnostics and tests.

use async_trait::async_trait;
use crate::error::StoreError;
use crate::exchange::ExchangeRecord;

/// The core audit-store trait.
#[async_trait]
pub trait AuditStore: Send + Sync {
    /// Backend name (e.g., "sqlite", "in_memory").
    fn name(&self) -> &str;

    /// Append one record. Records are never updated or deleted.
    async fn append(&self, record: ExchangeRecord) -> Result<(), StoreError>;

    /// Number of stored records.
    async fn count(&self) -> Result<usize, StoreError>;

    /// Most recent records, newest first.
    async fn recent(&self, limit: usize) -> Result<Vec<ExchangeRecord>, StoreError>;

    /// Health check — is the store reachable?
    async fn health_check(&self) -> Result<bool, StoreError> {
        self.count().await.map(|_| true)
    }
}
