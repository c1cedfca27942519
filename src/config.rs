//! Ingestion configuration.
//!
//! Defaults match the production listing site; every field can be overridden
//! from the environment (and, in the binary, from command-line flags).

use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://spimex.com";

#[derive(Debug, Clone)]
pub struct IngestConfig {
    pub base_url: String,
    pub max_pages: u32,
    /// Reports dated strictly before this day are not ingested.
    pub cutoff_date: NaiveDate,
    pub page_concurrency: usize,
    pub file_concurrency: usize,
    pub page_timeout: Duration,
    pub file_timeout: Duration,
    pub accept_invalid_certs: bool,
    pub database_path: String,
    pub db_connect_attempts: u32,
    pub db_connect_delay: Duration,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            max_pages: 100,
            cutoff_date: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap_or(NaiveDate::MIN),
            page_concurrency: 3,
            file_concurrency: 10,
            page_timeout: Duration::from_secs(30),
            file_timeout: Duration::from_secs(10),
            accept_invalid_certs: false,
            database_path: "./spimex_trading_results.db".to_string(),
            db_connect_attempts: 15,
            db_connect_delay: Duration::from_secs(2),
        }
    }
}

impl IngestConfig {
    /// Reads the process environment; the binary loads `.env` before calling this.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let cutoff_date = match std::env::var("INGEST_CUTOFF_DATE") {
            Ok(raw) if !raw.trim().is_empty() => parse_cutoff(&raw)?,
            _ => defaults.cutoff_date,
        };

        let accept_invalid_certs = std::env::var("INGEST_ACCEPT_INVALID_CERTS")
            .map(|v| matches!(v.as_str(), "1" | "true" | "TRUE" | "on" | "ON"))
            .unwrap_or(defaults.accept_invalid_certs);

        Ok(Self {
            base_url: std::env::var("SPIMEX_BASE_URL")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or(defaults.base_url),
            max_pages: env_parse("INGEST_MAX_PAGES", defaults.max_pages)?,
            cutoff_date,
            page_concurrency: env_parse("INGEST_PAGE_CONCURRENCY", defaults.page_concurrency)?
                .max(1),
            file_concurrency: env_parse("INGEST_FILE_CONCURRENCY", defaults.file_concurrency)?
                .max(1),
            page_timeout: Duration::from_secs(env_parse(
                "INGEST_PAGE_TIMEOUT_SECS",
                defaults.page_timeout.as_secs(),
            )?),
            file_timeout: Duration::from_secs(env_parse(
                "INGEST_FILE_TIMEOUT_SECS",
                defaults.file_timeout.as_secs(),
            )?),
            accept_invalid_certs,
            database_path: std::env::var("DATABASE_PATH")
                .or_else(|_| std::env::var("DB_PATH"))
                .ok()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.database_path),
            db_connect_attempts: env_parse("DB_CONNECT_ATTEMPTS", defaults.db_connect_attempts)?
                .max(1),
            db_connect_delay: Duration::from_secs(env_parse(
                "DB_CONNECT_DELAY_SECS",
                defaults.db_connect_delay.as_secs(),
            )?),
        })
    }
}

/// Accepts `YYYY-MM-DD` or the listing's own `DD.MM.YYYY`.
pub fn parse_cutoff(raw: &str) -> Result<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%d.%m.%Y"))
        .with_context(|| format!("Invalid cutoff date {:?}", raw))
}

fn env_parse<T>(var: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(var) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Invalid {}: {:?}", var, raw)),
        _ => Ok(default),
    }
}
