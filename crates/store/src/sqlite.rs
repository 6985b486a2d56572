//! SQLite audit store.
//!
//! A single `exchanges` table, created on open. Rows are only ever
//! inserted; there is no update or delete path.

use async_trait::async_trait;
use chatrelay_core::error::StoreError;
use chatrelay_core::exchange::ExchangeRecord;
use chatrelay_core::store::AuditStore;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use tracing::{debug, info};

/// An in-memory database lives only as long as its one connection, so that
/// connection is never reaped.
fn pool_options(in_memory: bool) -> SqlitePoolOptions {
    if in_memory {
        SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new().max_connections(4)
    }
}

/// A SQLite-backed append-only exchange log.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (or create) the store at `url`.
    ///
    /// Accepts `sqlite://path/to/file.db` style URLs and bare paths.
    /// Pass `"sqlite::memory:"` for an ephemeral database (useful for tests).
    pub async fn new(url: &str) -> Result<Self, StoreError> {
        let in_memory = url.contains(":memory:");
        let mut options = SqliteConnectOptions::from_str(url)
            .map_err(|e| StoreError::Storage(format!("Invalid SQLite URL: {e}")))?
            .create_if_missing(true)
            .synchronous(SqliteSynchronous::Normal);

        if !in_memory {
            options = options.journal_mode(SqliteJournalMode::Wal);
            if let Some(parent) = options.get_filename().parent().filter(|p| !p.as_os_str().is_empty()) {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| StoreError::Storage(format!("Failed to create {}: {e}", parent.display())))?;
            }
        }

        let pool = pool_options(in_memory)
            .connect_with(options)
            .await
            .map_err(|e| StoreError::Storage(format!("Failed to open SQLite: {e}")))?;

        let store = Self::from_pool(pool).await?;
        info!("SQLite audit store initialized at {url}");
        Ok(store)
    }

    /// Create from an existing pool (useful for testing).
    pub async fn from_pool(pool: SqlitePool) -> Result<Self, StoreError> {
        let store = Self { pool };
        store.run_migrations().await?;
        Ok(store)
    }

    async fn run_migrations(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS exchanges (
                iid          INTEGER PRIMARY KEY AUTOINCREMENT,
                id           TEXT UNIQUE NOT NULL,
                sender       TEXT NOT NULL,
                input_body   TEXT NOT NULL,
                output_body  TEXT NOT NULL,
                created_at   TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::MigrationFailed(format!("exchanges table: {e}")))?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_exchanges_sender ON exchanges(sender)")
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::MigrationFailed(format!("sender index: {e}")))?;

        debug!("SQLite migrations complete");
        Ok(())
    }

    fn row_to_record(row: &sqlx::sqlite::SqliteRow) -> Result<ExchangeRecord, StoreError> {
        let column = |name: &str| -> Result<String, StoreError> {
            row.try_get(name)
                .map_err(|e| StoreError::QueryFailed(format!("{name} column: {e}")))
        };

        let created_at = column("created_at")?;
        let timestamp = chrono::DateTime::parse_from_rfc3339(&created_at)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| StoreError::QueryFailed(format!("created_at '{created_at}': {e}")))?;

        Ok(ExchangeRecord {
            id: column("id")?,
            sender: column("sender")?,
            input_body: column("input_body")?,
            output_body: column("output_body")?,
            timestamp,
        })
    }
}

#[async_trait]
impl AuditStore for SqliteStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn append(&self, record: ExchangeRecord) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO exchanges (id, sender, input_body, output_body, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&record.id)
        .bind(&record.sender)
        .bind(&record.input_body)
        .bind(&record.output_body)
        .bind(record.timestamp.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Storage(format!("INSERT failed: {e}")))?;

        debug!(id = %record.id, "Appended exchange record");
        Ok(())
    }

    async fn count(&self) -> Result<usize, StoreError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM exchanges")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| StoreError::QueryFailed(format!("COUNT: {e}")))?;
        let n: i64 = row
            .try_get("n")
            .map_err(|e| StoreError::QueryFailed(format!("COUNT column: {e}")))?;
        Ok(usize::try_from(n).unwrap_or(0))
    }

    async fn recent(&self, limit: usize) -> Result<Vec<ExchangeRecord>, StoreError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = sqlx::query("SELECT * FROM exchanges ORDER BY iid DESC LIMIT ?1")
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StoreError::QueryFailed(format!("recent: {e}")))?;

        rows.iter().map(Self::row_to_record).collect()
    }

    async fn health_check(&self) -> Result<bool, StoreError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Storage(format!("health check: {e}")))?;
        Ok(true)
    }
}
