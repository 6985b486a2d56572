//! In-memory store — useful for testing and ephemeral runs.

use async_trait::async_trait;
use chatrelay_core::error::StoreError;
use chatrelay_core::exchange::ExchangeRecord;
use chatrelay_core::store::AuditStore;
use tokio::sync::RwLock;

/// An audit store that keeps records in a Vec, in append order.
#[derive(Default)]
pub struct InMemoryStore {
    records: RwLock<Vec<ExchangeRecord>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All records in append order.
    pub async fn records(&self) -> Vec<ExchangeRecord> {
        self.records.read().await.clone()
    }
}

#[async_trait]
impl AuditStore for InMemoryStore {
    fn name(&self) -> &str { "in_memory" }

    async fn append(&self, record: ExchangeRecord) -> Result<(), StoreError> {
        self.records.write().await.push(record);
        Ok(())
    }

    async fn count(&self) -> Result<usize, StoreError> {
        Ok(self.records.read().await.len())
    }

    async fn recent(&self, limit: usize) -> Result<Vec<ExchangeRecord>, StoreError> {
        let records = self.records.read().await;
        Ok(records.iter().rev().take(limit).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chatrelay_core::exchange::InboundMessage;

    fn record(body: &str) -> ExchangeRecord {
        ExchangeRecord::new(&InboundMessage::new("whatsapp:+1", body), format!("re: {body}"))
    }

    #[tokio::test]
    async fn append_and_count() {
        let store = InMemoryStore::new();
        store.append(record("one")).await.unwrap();
        store.append(record("two")).await.unwrap();
        assert_eq!(store.count().await.unwrap(), 2);
        assert_eq!(store.records().await[0].input_body, "one");
    }

    #[tokio::test]
    async fn recent_is_newest_first() {
        let store = InMemoryStore::new();
        for body in ["a", "b", "c"] {
            store.append(record(body)).await.unwrap();
        }
        let recent = store.recent(2).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].input_body, "c");
        assert_eq!(recent[1].input_body, "b");
    }

    #[tokio::test]
    async fn healthy_by_default() {
        assert!(InMemoryStore::new().health_check().await.unwrap());
    }
}
