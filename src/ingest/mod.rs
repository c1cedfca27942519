pub mod orchestrator;

pub use orchestrator::{IngestSummary, IngestionOrchestrator, ReportBatch, RunPhase};
