//! Minimal BIFF8 (`.xls`) workbook writer for decoder fixtures.
//!
//! One worksheet, `NUMBER` and `LABELSST` cells only, strings stored as
//! UTF-16 in the shared string table.

#![allow(dead_code)]

use std::io::{Cursor, Write};

const BOF: u16 = 0x0809;
const EOF: u16 = 0x000A;
const BOUNDSHEET: u16 = 0x0085;
const SST: u16 = 0x00FC;
const NUMBER: u16 = 0x0203;
const LABELSST: u16 = 0x00FD;

const BIFF8: u16 = 0x0600;
const GLOBALS_SUBSTREAM: u16 = 0x0005;
const SHEET_SUBSTREAM: u16 = 0x0010;

/// Streams under this size land in the compound file's mini stream.
const MINI_STREAM_CUTOFF: usize = 4096;

#[derive(Debug, Clone)]
pub enum XlsCell {
    Number(f64),
    Text(String),
}

impl From<f64> for XlsCell {
    fn from(v: f64) -> Self {
        XlsCell::Number(v)
    }
}

impl From<&str> for XlsCell {
    fn from(s: &str) -> Self {
        XlsCell::Text(s.to_string())
    }
}

/// Zero-based `(row, col, value)` cell.
pub type Placed = (u16, u16, XlsCell);

fn record(out: &mut Vec<u8>, typ: u16, data: &[u8]) {
    out.extend_from_slice(&typ.to_le_bytes());
    out.extend_from_slice(&(data.len() as u16).to_le_bytes());
    out.extend_from_slice(data);
}

fn bof(substream: u16) -> Vec<u8> {
    let mut data = Vec::with_capacity(16);
    data.extend_from_slice(&BIFF8.to_le_bytes());
    data.extend_from_slice(&substream.to_le_bytes());
    data.extend_from_slice(&0x0DBBu16.to_le_bytes()); // build
    data.extend_from_slice(&0x07CCu16.to_le_bytes()); // year
    data.extend_from_slice(&0u32.to_le_bytes());
    data.extend_from_slice(&0x0006u32.to_le_bytes());
    data
}

fn utf16(s: &str) -> Vec<u8> {
    s.encode_utf16().flat_map(|u| u.to_le_bytes()).collect()
}

/// The `Workbook` stream: globals substream followed by one sheet substream.
pub fn workbook_stream(sheet_name: &str, cells: &[Placed]) -> Vec<u8> {
    let mut strings: Vec<&str> = Vec::new();
    for (_, _, cell) in cells {
        if let XlsCell::Text(s) = cell {
            if !strings.contains(&s.as_str()) {
                strings.push(s);
            }
        }
    }

    let mut stream = Vec::new();
    record(&mut stream, BOF, &bof(GLOBALS_SUBSTREAM));

    // lbPlyPos is patched once the sheet offset is known.
    let ply_pos_at = stream.len() + 4;
    let mut sheet = vec![0u8; 4];
    sheet.push(0); // visible
    sheet.push(0); // worksheet
    sheet.push(sheet_name.encode_utf16().count() as u8);
    sheet.push(1); // fHighByte
    sheet.extend(utf16(sheet_name));
    record(&mut stream, BOUNDSHEET, &sheet);

    let mut sst = Vec::new();
    sst.extend_from_slice(&(strings.len() as u32).to_le_bytes());
    sst.extend_from_slice(&(strings.len() as u32).to_le_bytes());
    for s in &strings {
        sst.extend_from_slice(&(s.encode_utf16().count() as u16).to_le_bytes());
        sst.push(1); // fHighByte
        sst.extend(utf16(s));
    }
    record(&mut stream, SST, &sst);
    record(&mut stream, EOF, &[]);

    let sheet_pos = stream.len() as u32;
    stream[ply_pos_at..ply_pos_at + 4].copy_from_slice(&sheet_pos.to_le_bytes());

    record(&mut stream, BOF, &bof(SHEET_SUBSTREAM));
    for (row, col, cell) in cells {
        let mut data = Vec::with_capacity(14);
        data.extend_from_slice(&row.to_le_bytes());
        data.extend_from_slice(&col.to_le_bytes());
        data.extend_from_slice(&0u16.to_le_bytes()); // ixfe
        match cell {
            XlsCell::Number(v) => {
                data.extend_from_slice(&v.to_le_bytes());
                record(&mut stream, NUMBER, &data);
            }
            XlsCell::Text(s) => {
                let isst = strings.iter().position(|t| *t == s.as_str()).unwrap_or(0) as u32;
                data.extend_from_slice(&isst.to_le_bytes());
                record(&mut stream, LABELSST, &data);
            }
        }
    }
    record(&mut stream, EOF, &[]);

    // Excel pads the workbook stream past the mini-stream cutoff.
    if stream.len() < MINI_STREAM_CUTOFF {
        stream.resize(MINI_STREAM_CUTOFF, 0);
    }
    stream
}

/// A complete `.xls` file holding one worksheet.
pub fn xls_file(cells: &[Placed]) -> Vec<u8> {
    let stream = workbook_stream("TRADE_SUMMARY", cells);

    let mut compound =
        cfb::CompoundFile::create_with_version(cfb::Version::V3, Cursor::new(Vec::new()))
            .expect("create compound file");
    {
        let mut out = compound.create_stream("/Workbook").expect("create Workbook stream");
        out.write_all(&stream).expect("write Workbook stream");
        out.flush().expect("flush Workbook stream");
    }
    compound.flush().expect("flush compound file");
    compound.into_inner().into_inner()
}

/// A trading bulletin laid out like the exchange's: column A empty, a title
/// and header block, then trade rows in columns B..=G.
pub fn bulletin(trades: &[(&str, &str, &str, f64, f64, f64)]) -> Vec<u8> {
    let mut cells: Vec<Placed> = vec![
        (0, 1, "Бюллетень по итогам торгов в Секции «Нефтепродукты»".into()),
        (2, 1, "Единица измерения: Метрическая тонна".into()),
        (3, 1, "Код Инструмента".into()),
        (3, 2, "Наименование Инструмента".into()),
        (3, 3, "Базис поставки".into()),
        (3, 4, "Объем Договоров в единицах измерения".into()),
        (3, 5, "Обьем Договоров, руб.".into()),
        (3, 6, "Количество Договоров, шт.".into()),
    ];

    let mut row = 4u16;
    for (id, name, basis, volume, total, count) in trades {
        cells.push((row, 1, (*id).into()));
        cells.push((row, 2, (*name).into()));
        cells.push((row, 3, (*basis).into()));
        cells.push((row, 4, (*volume).into()));
        cells.push((row, 5, (*total).into()));
        cells.push((row, 6, (*count).into()));
        row += 1;
    }
    cells.push((row, 1, "Итого:".into()));
    cells.push((row, 6, XlsCell::Number(2.0)));

    xls_file(&cells)
}
