//! Legacy `.xls` decoding (first worksheet only).
//!
//! Rows come back in sheet order with cell `i` always holding sheet column `i`,
//! whatever the first used column is.

use calamine::{Data, Reader, Xls};
use std::io::Cursor;

use crate::{error::DecodeError, models::CellValue};

pub type Row = Vec<CellValue>;

pub trait SpreadsheetDecoder: Send + Sync {
    /// Rows of the first sheet, top to bottom. Header rows are kept; the
    /// extractor decides which rows are usable.
    fn decode(&self, blob: &[u8]) -> Result<Vec<Row>, DecodeError>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct XlsDecoder;

impl SpreadsheetDecoder for XlsDecoder {
    fn decode(&self, blob: &[u8]) -> Result<Vec<Row>, DecodeError> {
        let mut workbook: Xls<_> = Xls::new(Cursor::new(blob))
            .map_err(|e| DecodeError::Container(e.to_string()))?;

        let range = workbook
            .worksheet_range_at(0)
            .ok_or(DecodeError::NoSheets)?
            .map_err(|e| DecodeError::Sheet(e.to_string()))?;

        // The range begins at the first used cell; pad back to column A so
        // row indices are absolute sheet columns.
        let col_offset = range.start().map_or(0, |(_, col)| col as usize);

        Ok(range
            .rows()
            .map(|row| {
                let mut cells = Vec::with_capacity(col_offset + row.len());
                cells.resize(col_offset, CellValue::Empty);
                cells.extend(row.iter().map(cell_value));
                cells
            })
            .collect())
    }
}

fn cell_value(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Empty,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Int(i) => CellValue::Int(*i),
        Data::Float(f) => CellValue::Float(*f),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => CellValue::Float(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
        Data::Error(e) => CellValue::Text(e.to_string()),
    }
}
