//! Report spreadsheet handling: binary decode, then row extraction.

pub mod decoder;
pub mod extractor;

pub use decoder::{Row, SpreadsheetDecoder, XlsDecoder};
pub use extractor::extract;
