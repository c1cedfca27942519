//! SPIMEX results ingest
//!
//! One run: ensure the schema, crawl listing pages down to the cutoff date,
//! store every oil-products report, print the run summary as JSON.
//!
//! Usage:
//!   spimex-ingest --max-pages 2 --cutoff 2023-01-01 --db-path ./results.db
//!
//! Environment Variables:
//!   DATABASE_PATH - SQLite file (default: ./spimex_trading_results.db)
//!   INGEST_MAX_PAGES, INGEST_CUTOFF_DATE, INGEST_PAGE_CONCURRENCY,
//!   INGEST_FILE_CONCURRENCY, INGEST_FILE_TIMEOUT_SECS - see `IngestConfig`
//!   RUST_LOG - log filter (default: spimex_ingest=info)

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use dotenv::dotenv;
use std::{path::Path, sync::Arc};
use tokio::time::Instant;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use spimex_ingest::{
    config::{parse_cutoff, IngestConfig},
    reports::XlsDecoder,
    scrapers::HttpFetchClient,
    storage::SqliteTradeStore,
    IngestionOrchestrator,
};

#[derive(Parser, Debug)]
#[command(name = "spimex-ingest")]
#[command(about = "Ingest SPIMEX oil-products trading results into SQLite")]
struct Args {
    /// Number of listing pages to crawl
    #[arg(long)]
    max_pages: Option<u32>,

    /// Oldest trading day to ingest (YYYY-MM-DD or DD.MM.YYYY)
    #[arg(long, value_parser = parse_cutoff)]
    cutoff: Option<NaiveDate>,

    /// SQLite database path
    #[arg(long)]
    db_path: Option<String>,

    /// Concurrent listing page requests
    #[arg(long)]
    page_concurrency: Option<usize>,

    /// Concurrent report downloads
    #[arg(long)]
    file_concurrency: Option<usize>,
}

impl Args {
    fn apply(self, mut config: IngestConfig) -> IngestConfig {
        if let Some(n) = self.max_pages {
            config.max_pages = n;
        }
        if let Some(d) = self.cutoff {
            config.cutoff_date = d;
        }
        if let Some(p) = self.db_path {
            config.database_path = p;
        }
        if let Some(n) = self.page_concurrency {
            config.page_concurrency = n.max(1);
        }
        if let Some(n) = self.file_concurrency {
            config.file_concurrency = n.max(1);
        }
        config
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    load_env();
    init_tracing();

    let args = Args::parse();
    let config = args.apply(IngestConfig::from_env()?);

    info!(
        base_url = %config.base_url,
        max_pages = config.max_pages,
        cutoff = %config.cutoff_date,
        db = %config.database_path,
        "🚀 SPIMEX ingest starting"
    );

    let store = SqliteTradeStore::open_with_retry(
        &config.database_path,
        config.db_connect_attempts,
        config.db_connect_delay,
    )
    .await?;
    let store = Arc::new(store);
    let fetcher = Arc::new(HttpFetchClient::new(&config)?);

    let started = Instant::now();
    let mut orchestrator =
        IngestionOrchestrator::new(config, fetcher, Arc::new(XlsDecoder), store.clone());
    let summary = orchestrator.run().await?;

    info!(
        elapsed_ms = started.elapsed().as_millis() as u64,
        total_rows = store.count().unwrap_or(0),
        "Parsing finished"
    );

    println!(
        "{}",
        serde_json::to_string_pretty(&summary).context("Failed to serialise run summary")?
    );
    Ok(())
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "spimex_ingest=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn load_env() {
    // 1) Standard dotenv search (cwd + parents)
    let _ = dotenv();

    // 2) Also the crate directory's .env when run via --manifest-path from elsewhere
    let manifest_env = Path::new(env!("CARGO_MANIFEST_DIR")).join(".env");
    if manifest_env.exists() {
        let _ = dotenv::from_path(&manifest_env);
    }
}
