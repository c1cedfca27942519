//! Persistence collaborator for extracted trade records.
//!
//! The orchestrator only sees `TradeStore`; `SqliteTradeStore` is the
//! production implementation.

pub mod db_storage;

use async_trait::async_trait;

use crate::{error::SchemaError, models::TradeRecord};

pub use db_storage::SqliteTradeStore;

#[async_trait]
pub trait TradeStore: Send + Sync {
    /// Create tables and indexes if missing. Safe to call on every run.
    async fn ensure_schema(&self) -> Result<(), SchemaError>;

    /// Insert one report's records in a single transaction (all or nothing).
    /// Returns the number of newly stored rows.
    async fn insert_batch(&self, records: &[TradeRecord]) -> anyhow::Result<usize>;
}
