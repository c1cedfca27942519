//! Core data types for trading-result ingestion.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Exact length (in characters) of a valid exchange product id.
pub const PRODUCT_ID_LEN: usize = 11;

/// One decoded spreadsheet cell.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl CellValue {
    /// Text form used by the extractor for length/digit checks and numeric parsing.
    pub fn as_text(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Text(s) => s.clone(),
            CellValue::Int(i) => i.to_string(),
            CellValue::Float(f) => {
                if f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
                    (*f as i64).to_string()
                } else {
                    f.to_string()
                }
            }
            CellValue::Bool(b) => b.to_string(),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        if s.is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(s.to_string())
        }
    }
}

/// One row of a trading report, dated with the report's trading day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub exchange_product_id: String,
    pub exchange_product_name: String,
    pub delivery_basis_name: String,
    pub volume: i64,
    pub total: i64,
    pub count: i64,
    pub date: NaiveDate,
}

impl TradeRecord {
    /// First four characters of the product id.
    pub fn oil_id(&self) -> String {
        self.exchange_product_id.chars().take(4).collect()
    }

    /// Characters 5..=7 of the product id.
    pub fn delivery_basis_id(&self) -> String {
        self.exchange_product_id.chars().skip(4).take(3).collect()
    }

    /// Last character of the product id.
    pub fn delivery_type_id(&self) -> String {
        self.exchange_product_id
            .chars()
            .last()
            .map(String::from)
            .unwrap_or_default()
    }
}

/// A report discovered on a listing page. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportReference {
    pub url: String,
    pub date: NaiveDate,
    pub is_oil_report: bool,
}
