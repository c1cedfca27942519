//! SQLite-backed trade record storage
//!
//! - WAL mode so readers (the query API) never block batch commits
//! - One transaction per report batch; concurrent batches serialise on the
//!   connection lock and SQLite's busy timeout
//! - `(date, exchange_product_id)` is unique, so re-ingesting a report is a no-op

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use parking_lot::Mutex;
use rusqlite::{params, Connection, OpenFlags};
use std::{sync::Arc, time::Duration};
use tracing::{debug, info, warn};

use super::TradeStore;
use crate::{error::SchemaError, models::TradeRecord};

const DATE_FORMAT: &str = "%Y-%m-%d";

const PRAGMA_SQL: &str = r#"
PRAGMA journal_mode = WAL;
PRAGMA synchronous = NORMAL;
PRAGMA busy_timeout = 5000;
"#;

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS spimex_trading_results (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    exchange_product_id TEXT NOT NULL,
    exchange_product_name TEXT NOT NULL,
    oil_id TEXT NOT NULL,
    delivery_basis_id TEXT NOT NULL,
    delivery_basis_name TEXT NOT NULL,
    delivery_type_id TEXT NOT NULL,
    volume INTEGER NOT NULL,
    total INTEGER NOT NULL,
    count INTEGER NOT NULL,
    date TEXT NOT NULL,
    created_on TEXT NOT NULL DEFAULT (date('now')),
    updated_on TEXT NOT NULL DEFAULT (date('now'))
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_results_date_product
    ON spimex_trading_results(date, exchange_product_id);

-- Filter fields used by the read API
CREATE INDEX IF NOT EXISTS idx_results_date ON spimex_trading_results(date DESC);
CREATE INDEX IF NOT EXISTS idx_results_oil_id ON spimex_trading_results(oil_id, date DESC);
CREATE INDEX IF NOT EXISTS idx_results_delivery_type ON spimex_trading_results(delivery_type_id, date DESC);
CREATE INDEX IF NOT EXISTS idx_results_delivery_basis ON spimex_trading_results(delivery_basis_id, date DESC);
"#;

const INSERT_SQL: &str = "INSERT OR IGNORE INTO spimex_trading_results
     (exchange_product_id, exchange_product_name, oil_id, delivery_basis_id,
      delivery_basis_name, delivery_type_id, volume, total, count, date)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)";

pub struct SqliteTradeStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteTradeStore {
    pub fn open(db_path: &str) -> Result<Self> {
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_NO_MUTEX; // We handle our own locking

        let conn = Connection::open_with_flags(db_path, flags)
            .with_context(|| format!("Failed to open database at {}", db_path))?;

        conn.execute_batch(PRAGMA_SQL)
            .context("Failed to apply connection pragmas")?;
        conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
            .context("Database did not answer probe query")?;

        debug!(path = db_path, "trade store opened");
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Retry `open` until the store answers; exhausting the attempts is fatal.
    pub async fn open_with_retry(
        db_path: &str,
        attempts: u32,
        delay: Duration,
    ) -> Result<Self, SchemaError> {
        let attempts = attempts.max(1);
        let mut last_error = String::new();

        for attempt in 1..=attempts {
            match Self::open(db_path) {
                Ok(store) => {
                    info!(path = db_path, attempt, "📊 Trade store ready");
                    return Ok(store);
                }
                Err(e) => {
                    warn!(path = db_path, attempt, error = %e, "Waiting for trade store...");
                    last_error = format!("{:#}", e);
                    if attempt < attempts {
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }

        Err(SchemaError::Unreachable {
            attempts,
            reason: last_error,
        })
    }

    pub fn count(&self) -> Result<i64> {
        let conn = self.conn.lock();
        let n = conn.query_row("SELECT COUNT(*) FROM spimex_trading_results", [], |row| {
            row.get(0)
        })?;
        Ok(n)
    }

    pub fn count_for_date(&self, date: NaiveDate) -> Result<i64> {
        let conn = self.conn.lock();
        let n = conn.query_row(
            "SELECT COUNT(*) FROM spimex_trading_results WHERE date = ?1",
            params![date.format(DATE_FORMAT).to_string()],
            |row| row.get(0),
        )?;
        Ok(n)
    }

    /// Stored records for one trading day, ordered by product id.
    pub fn records_for_date(&self, date: NaiveDate) -> Result<Vec<TradeRecord>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare_cached(
            "SELECT exchange_product_id, exchange_product_name, delivery_basis_name,
                    volume, total, count
             FROM spimex_trading_results WHERE date = ?1
             ORDER BY exchange_product_id",
        )?;
        let rows = stmt.query_map(params![date.format(DATE_FORMAT).to_string()], |row| {
            Ok(TradeRecord {
                exchange_product_id: row.get(0)?,
                exchange_product_name: row.get(1)?,
                delivery_basis_name: row.get(2)?,
                volume: row.get(3)?,
                total: row.get(4)?,
                count: row.get(5)?,
                date,
            })
        })?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .context("Failed to read stored records")
    }
}

#[async_trait]
impl TradeStore for SqliteTradeStore {
    async fn ensure_schema(&self) -> Result<(), SchemaError> {
        let conn = self.conn.lock();
        conn.execute_batch(SCHEMA_SQL)?;
        info!("Trade schema created/verified");
        Ok(())
    }

    async fn insert_batch(&self, records: &[TradeRecord]) -> Result<usize> {
        if records.is_empty() {
            return Ok(0);
        }

        let mut conn = self.conn.lock();
        let tx = conn
            .transaction()
            .context("Failed to begin batch transaction")?;

        let mut inserted = 0usize;
        {
            let mut stmt = tx.prepare_cached(INSERT_SQL)?;
            for r in records {
                inserted += stmt.execute(params![
                    &r.exchange_product_id,
                    &r.exchange_product_name,
                    r.oil_id(),
                    r.delivery_basis_id(),
                    &r.delivery_basis_name,
                    r.delivery_type_id(),
                    r.volume,
                    r.total,
                    r.count,
                    r.date.format(DATE_FORMAT).to_string(),
                ])?;
            }
        }

        tx.commit().context("Failed to commit batch transaction")?;
        if inserted < records.len() {
            warn!(
                inserted,
                ignored = records.len() - inserted,
                date = %records[0].date,
                "Batch rows already stored for (date, product), ignored"
            );
        } else {
            debug!("📦 Batch inserted {} of {} records", inserted, records.len());
        }
        Ok(inserted)
    }
}
