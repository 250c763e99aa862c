//! services/api/src/adapters/spreadsheet.rs
//!
//! The `SpreadsheetReader` adapter. Workbooks (xlsx, xls, xlsb, ods) are decoded
//! with `calamine`, comma-separated files with `csv`. Only the first worksheet is
//! read and its first row supplies the headers.

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use catalog_core::domain::{RawCell, RawRow};
use catalog_core::ports::{PortError, PortResult, SpreadsheetReader};
use std::io::Cursor;

#[derive(Debug, Clone, Copy, Default)]
pub struct WorkbookReader;

impl WorkbookReader {
    pub fn new() -> Self {
        Self
    }
}

impl SpreadsheetReader for WorkbookReader {
    fn read_rows(&self, file_name: &str, bytes: &[u8]) -> PortResult<Vec<RawRow>> {
        if file_name.to_lowercase().ends_with(".csv") {
            read_csv(bytes)
        } else {
            read_workbook(bytes)
        }
    }
}

fn parse_error(e: impl std::fmt::Display) -> PortError {
    PortError::Parse(e.to_string())
}

fn read_workbook(bytes: &[u8]) -> PortResult<Vec<RawRow>> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec())).map_err(parse_error)?;
    let first_sheet = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| PortError::Parse("workbook has no worksheets".to_string()))?;
    let range = workbook.worksheet_range(&first_sheet).map_err(parse_error)?;

    let mut rows = range.rows();
    let Some(header_row) = rows.next() else {
        return Ok(Vec::new());
    };
    let headers: Vec<String> = header_row
        .iter()
        .enumerate()
        .map(|(i, cell)| header_text(i, cell))
        .collect();

    let data = rows
        .map(|cells| {
            let mut row = RawRow::new();
            for (header, cell) in headers.iter().zip(cells) {
                row.push(header.clone(), workbook_cell(cell));
            }
            row
        })
        .collect();
    Ok(trim_trailing_blank_rows(data))
}

fn header_text(index: usize, cell: &Data) -> String {
    let text = match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_string(),
        other => other.to_string(),
    };
    if text.is_empty() {
        format!("Column {}", index + 1)
    } else {
        text
    }
}

fn workbook_cell(cell: &Data) -> RawCell {
    match cell {
        Data::Empty | Data::Error(_) => RawCell::Empty,
        Data::String(s) => RawCell::Text(s.clone()),
        Data::Int(i) => RawCell::Number(*i as f64),
        Data::Float(f) => RawCell::Number(*f),
        Data::Bool(b) => RawCell::Bool(*b),
        Data::DateTime(dt) => RawCell::DateSerial(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => RawCell::Text(s.clone()),
    }
}

fn read_csv(bytes: &[u8]) -> PortResult<Vec<RawRow>> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(bytes);
    let headers: Vec<String> = reader
        .headers()
        .map_err(parse_error)?
        .iter()
        .enumerate()
        .map(|(i, h)| {
            let h = h.trim_start_matches('\u{feff}').trim();
            if h.is_empty() {
                format!("Column {}", i + 1)
            } else {
                h.to_string()
            }
        })
        .collect();

    let mut data = Vec::new();
    for record in reader.records() {
        let record = record.map_err(parse_error)?;
        let mut row = RawRow::new();
        for (i, header) in headers.iter().enumerate() {
            let cell = match record.get(i) {
                Some(value) if !value.is_empty() => RawCell::Text(value.to_string()),
                _ => RawCell::Empty,
            };
            row.push(header.clone(), cell);
        }
        data.push(row);
    }
    Ok(trim_trailing_blank_rows(data))
}

/// Drops blank rows after the last row with content; blank rows in between are kept.
fn trim_trailing_blank_rows(mut rows: Vec<RawRow>) -> Vec<RawRow> {
    while rows
        .last()
        .is_some_and(|row| row.cells().all(|(_, cell)| cell.is_blank()))
    {
        rows.pop();
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_rows_keep_header_order_and_blank_interior_rows() {
        let csv = "Title,Copy,,RIS Number\nDune,1,x,17\n,,,\nEmma,,y,18\n,,,\n";
        let rows = WorkbookReader.read_rows("books.CSV", csv.as_bytes()).unwrap();
        assert_eq!(rows.len(), 3);

        let headers: Vec<&str> = rows[0].cells().map(|(h, _)| h).collect();
        assert_eq!(headers, vec!["Title", "Copy", "Column 3", "RIS Number"]);
        assert_eq!(rows[0].find(|h| h == "Title"), Some(&RawCell::Text("Dune".into())));
        assert!(rows[1].cells().all(|(_, c)| c.is_blank()));
        assert_eq!(rows[2].find(|h| h == "Copy"), Some(&RawCell::Empty));
    }

    #[test]
    fn header_only_csv_has_no_rows() {
        let rows = WorkbookReader.read_rows("books.csv", b"Title,Copy\n").unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn garbage_workbook_is_a_parse_error() {
        let err = WorkbookReader.read_rows("books.xlsx", b"definitely not a zip").unwrap_err();
        assert!(matches!(err, PortError::Parse(_)));
    }

    #[test]
    fn workbook_cells_map_to_raw_cells() {
        assert_eq!(workbook_cell(&Data::Int(7)), RawCell::Number(7.0));
        assert_eq!(workbook_cell(&Data::String("x".into())), RawCell::Text("x".into()));
        assert_eq!(workbook_cell(&Data::Empty), RawCell::Empty);
        assert_eq!(header_text(2, &Data::Empty), "Column 3");
        assert_eq!(header_text(0, &Data::String(" Title ".into())), "Title");
    }

    #[test]
    fn date_cells_reach_coercion_as_serials() {
        use calamine::{ExcelDateTime, ExcelDateTimeType};
        use catalog_core::coercion::coerce_row;
        use catalog_core::schema::BOOK_FIELDS;

        let cell = workbook_cell(&Data::DateTime(ExcelDateTime::new(
            45000.0,
            ExcelDateTimeType::DateTime,
            false,
        )));
        assert_eq!(cell, RawCell::DateSerial(45000.0));

        let row = RawRow::new().with("Date Added", cell);
        let coerced = coerce_row(&row, BOOK_FIELDS);
        assert!(coerced.warnings.is_empty());
        assert_eq!(
            coerced.record.text("date_added").as_deref(),
            Some("2023-03-15T00:00:00.000Z")
        );
    }
}
