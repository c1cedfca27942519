//! Row → TradeRecord mapping.
//!
//! Column layout of a results sheet: `[_, product id, product name, delivery
//! basis name, volume, total, ..., count]`. Header and footer rows fail the
//! shape check and are dropped without error.

use chrono::NaiveDate;

use crate::{
    error::ExtractionError,
    models::{CellValue, TradeRecord, PRODUCT_ID_LEN},
};

const MIN_CELLS: usize = 6;

/// `Ok(None)` means the row is not a trade row (skip silently); `Err` means it
/// looked like one but carried a malformed number (skip and count).
pub fn extract(row: &[CellValue], date: NaiveDate) -> Result<Option<TradeRecord>, ExtractionError> {
    if row.len() < MIN_CELLS {
        return Ok(None);
    }

    let product_id = row[1].as_text();
    let count_text = row[row.len() - 1].as_text();

    if product_id.chars().count() != PRODUCT_ID_LEN || !is_digit_string(&count_text) {
        return Ok(None);
    }

    let volume = parse_int("volume", &row[4].as_text())?;
    let total = parse_total(&row[5].as_text())?;
    let count = parse_int("count", &count_text)?;

    Ok(Some(TradeRecord {
        exchange_product_id: product_id,
        exchange_product_name: row[2].as_text(),
        delivery_basis_name: row[3].as_text(),
        volume,
        total,
        count,
        date,
    }))
}

fn is_digit_string(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}

/// Decimal totals are truncated at the point, never rounded.
fn parse_total(raw: &str) -> Result<i64, ExtractionError> {
    let integer_part = raw.split('.').next().unwrap_or(raw);
    parse_int("total", integer_part).map_err(|e| match e {
        ExtractionError::InvalidNumber { field, .. } => ExtractionError::InvalidNumber {
            field,
            value: raw.to_string(),
        },
        other => other,
    })
}

fn parse_int(field: &'static str, raw: &str) -> Result<i64, ExtractionError> {
    let value = raw
        .trim()
        .parse::<i64>()
        .map_err(|_| ExtractionError::InvalidNumber {
            field,
            value: raw.to_string(),
        })?;
    if value < 0 {
        return Err(ExtractionError::Negative { field, value });
    }
    Ok(value)
}
