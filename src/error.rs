//! Error taxonomy for the ingestion pipeline.
//!
//! Every variant except `SchemaError` is scoped to one unit of work (page,
//! report, row) and is converted to a skip by the orchestrator.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("GET {url} returned status {status}")]
    Status { url: String, status: u16 },
    #[error("GET {url} timed out")]
    Timeout { url: String },
    #[error("GET {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{gate} fetch gate closed")]
    GateClosed { gate: &'static str },
}

impl FetchError {
    pub(crate) fn from_reqwest(url: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout {
                url: url.to_string(),
            }
        } else if let Some(status) = err.status() {
            FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            }
        } else {
            FetchError::Transport {
                url: url.to_string(),
                source: err,
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("not a readable xls workbook: {0}")]
    Container(String),
    #[error("workbook has no worksheets")]
    NoSheets,
    #[error("first worksheet unreadable: {0}")]
    Sheet(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("column {field} is not an integer: {value:?}")]
    InvalidNumber { field: &'static str, value: String },
    #[error("column {field} is negative: {value}")]
    Negative { field: &'static str, value: i64 },
}

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("trade store unreachable after {attempts} attempts: {reason}")]
    Unreachable { attempts: u32, reason: String },
    #[error("failed to initialise trade schema: {0}")]
    Init(#[from] rusqlite::Error),
}
