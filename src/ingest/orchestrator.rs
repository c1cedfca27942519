//! Ingestion run driver.
//!
//! Lifecycle: `Init → EnsureSchema → Traversing → Draining → Done`, or
//! `Failed` when the store cannot be initialised. Past schema setup a run
//! always completes: failures are scoped to one page, one report or one row.

use chrono::NaiveDate;
use futures_util::stream::{self, StreamExt};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::{
    config::IngestConfig,
    error::SchemaError,
    models::{ReportReference, TradeRecord},
    reports::{extract, SpreadsheetDecoder},
    scrapers::{listing_page_urls, FetchClient, ListingPageScanner},
    storage::TradeStore,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RunPhase {
    Init,
    EnsureSchema,
    Traversing,
    Draining,
    Done,
    Failed,
}

/// Counters for one run. Skips are expected and never fail the run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestSummary {
    pub pages_requested: usize,
    pub pages_fetched: usize,
    pub pages_failed: usize,
    pub pages_stopped_at_cutoff: usize,
    pub reports_discovered: usize,
    pub reports_skipped_non_oil: usize,
    pub reports_downloaded: usize,
    pub reports_fetch_failed: usize,
    pub reports_decode_failed: usize,
    pub rows_accepted: usize,
    pub rows_rejected: usize,
    pub rows_malformed: usize,
    pub batches_committed: usize,
    pub batches_failed: usize,
    pub records_persisted: usize,
}

/// All valid records from one report file, committed as one transaction.
#[derive(Debug, Clone)]
pub struct ReportBatch {
    pub report: ReportReference,
    pub records: Vec<TradeRecord>,
}

#[derive(Debug, Default)]
struct RowTally {
    rejected: usize,
    malformed: usize,
}

enum ReportOutcome {
    Extracted(ReportBatch, RowTally),
    FetchFailed,
    DecodeFailed,
}

#[derive(Default)]
struct PageOutcome {
    fetched: bool,
    stopped: bool,
    discovered: usize,
    non_oil: usize,
    reports: Vec<ReportOutcome>,
}

pub struct IngestionOrchestrator {
    config: IngestConfig,
    scanner: ListingPageScanner,
    fetcher: Arc<dyn FetchClient>,
    decoder: Arc<dyn SpreadsheetDecoder>,
    store: Arc<dyn TradeStore>,
    phase: RunPhase,
}

impl IngestionOrchestrator {
    pub fn new(
        config: IngestConfig,
        fetcher: Arc<dyn FetchClient>,
        decoder: Arc<dyn SpreadsheetDecoder>,
        store: Arc<dyn TradeStore>,
    ) -> Self {
        let scanner = ListingPageScanner::new(config.base_url.clone(), config.cutoff_date);
        Self {
            config,
            scanner,
            fetcher,
            decoder,
            store,
            phase: RunPhase::Init,
        }
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    pub fn cutoff(&self) -> NaiveDate {
        self.config.cutoff_date
    }

    fn transition(&mut self, next: RunPhase) {
        debug!(from = ?self.phase, to = ?next, "run phase");
        self.phase = next;
    }

    pub async fn run(&mut self) -> Result<IngestSummary, SchemaError> {
        self.transition(RunPhase::EnsureSchema);
        if let Err(e) = self.store.ensure_schema().await {
            error!(error = %e, "🛑 Trade store initialisation failed, aborting run");
            self.transition(RunPhase::Failed);
            return Err(e);
        }

        self.transition(RunPhase::Traversing);
        let urls = listing_page_urls(&self.config.base_url, self.config.max_pages);
        let mut summary = IngestSummary {
            pages_requested: urls.len(),
            ..IngestSummary::default()
        };
        info!(
            pages = urls.len(),
            cutoff = %self.config.cutoff_date,
            "🚀 Traversing listing pages"
        );

        let pages: Vec<PageOutcome> = stream::iter(urls.into_iter().enumerate())
            .map(|(i, url)| self.traverse_page(i + 1, url))
            .buffer_unordered(self.config.page_concurrency.max(1))
            .collect()
            .await;

        let mut batches = Vec::new();
        for page in pages {
            if page.fetched {
                summary.pages_fetched += 1;
            } else {
                summary.pages_failed += 1;
            }
            if page.stopped {
                summary.pages_stopped_at_cutoff += 1;
            }
            summary.reports_discovered += page.discovered;
            summary.reports_skipped_non_oil += page.non_oil;

            for report in page.reports {
                match report {
                    ReportOutcome::Extracted(batch, tally) => {
                        summary.reports_downloaded += 1;
                        summary.rows_accepted += batch.records.len();
                        summary.rows_rejected += tally.rejected;
                        summary.rows_malformed += tally.malformed;
                        if !batch.records.is_empty() {
                            batches.push(batch);
                        }
                    }
                    ReportOutcome::FetchFailed => summary.reports_fetch_failed += 1,
                    ReportOutcome::DecodeFailed => {
                        summary.reports_downloaded += 1;
                        summary.reports_decode_failed += 1;
                    }
                }
            }
        }

        self.transition(RunPhase::Draining);
        info!(batches = batches.len(), "Committing report batches");
        let store = self.store.clone();
        let commits: Vec<(ReportReference, anyhow::Result<usize>)> = stream::iter(batches)
            .map(|batch| {
                let store = store.clone();
                async move {
                    let res = store.insert_batch(&batch.records).await;
                    (batch.report, res)
                }
            })
            .buffer_unordered(self.config.file_concurrency.max(1))
            .collect()
            .await;

        for (report, res) in commits {
            match res {
                Ok(n) => {
                    summary.batches_committed += 1;
                    summary.records_persisted += n;
                    info!(url = %report.url, date = %report.date, records = n, "💾 Report saved");
                }
                Err(e) => {
                    summary.batches_failed += 1;
                    warn!(url = %report.url, date = %report.date, error = %e, "Report batch rejected by store");
                }
            }
        }

        self.transition(RunPhase::Done);
        info!(
            records = summary.records_persisted,
            batches = summary.batches_committed,
            failed_pages = summary.pages_failed,
            failed_reports = summary.reports_fetch_failed + summary.reports_decode_failed,
            "✅ Ingest run complete"
        );
        Ok(summary)
    }

    /// Fetch and scan one listing page, then pull every qualifying report on it.
    async fn traverse_page(&self, page: usize, url: String) -> PageOutcome {
        let body = match self.fetcher.fetch_page(&url).await {
            Ok(b) => b,
            Err(e) => {
                warn!(page, error = %e, "Listing page fetch failed, skipping page");
                return PageOutcome::default();
            }
        };

        let scan = self.scanner.scan(&String::from_utf8_lossy(&body));
        let discovered = scan.reports.len();
        let cutoff = self.scanner.cutoff();
        let (wanted, skipped): (Vec<_>, Vec<_>) = scan
            .reports
            .into_iter()
            .partition(|r| r.is_oil_report && r.date >= cutoff);

        debug!(
            page,
            discovered,
            wanted = wanted.len(),
            stopped = scan.stop,
            "Listing page scanned"
        );

        let reports: Vec<ReportOutcome> = stream::iter(wanted)
            .map(|report| self.collect_report(report))
            .buffer_unordered(self.config.file_concurrency.max(1))
            .collect()
            .await;

        PageOutcome {
            fetched: true,
            stopped: scan.stop,
            discovered,
            non_oil: skipped.len(),
            reports,
        }
    }

    /// Download → decode → extract for one report. Nothing here suspends
    /// after the download completes.
    async fn collect_report(&self, report: ReportReference) -> ReportOutcome {
        debug!(url = %report.url, date = %report.date, "Downloading report");
        let blob = match self.fetcher.fetch_file(&report.url).await {
            Ok(b) => b,
            Err(e) => {
                warn!(url = %report.url, error = %e, "Report download failed, skipping report");
                return ReportOutcome::FetchFailed;
            }
        };

        let rows = match self.decoder.decode(&blob) {
            Ok(rows) => rows,
            Err(e) => {
                warn!(url = %report.url, error = %e, "Report is not a readable spreadsheet, skipping report");
                return ReportOutcome::DecodeFailed;
            }
        };

        let mut records = Vec::new();
        let mut tally = RowTally::default();
        for (idx, row) in rows.iter().enumerate() {
            match extract(row, report.date) {
                Ok(Some(record)) => records.push(record),
                Ok(None) => tally.rejected += 1,
                Err(e) => {
                    debug!(url = %report.url, row = idx, error = %e, "Malformed trade row skipped");
                    tally.malformed += 1;
                }
            }
        }

        ReportOutcome::Extracted(ReportBatch { report, records }, tally)
    }
}
