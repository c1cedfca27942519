//! SPIMEX trading-results ingestion
//!
//! Crawls the exchange's paginated results listing, downloads the oil-products
//! `.xls` bulletins, extracts trade rows and stores them one report per
//! transaction.

pub mod config;
pub mod error;
pub mod ingest;
pub mod models;
pub mod reports;
pub mod scrapers;
pub mod storage;

pub use config::IngestConfig;
pub use ingest::{IngestSummary, IngestionOrchestrator, RunPhase};
pub use models::{CellValue, ReportReference, TradeRecord};
