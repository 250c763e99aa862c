//! crates/catalog_core/src/coercion.rs
//!
//! Row coercion: maps one raw spreadsheet row onto typed record fields using the
//! declared field schema. Blank or unparseable cells are omitted, never stored empty.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::domain::{format_number, FieldValue, PartialRecord, RawCell, RawRow};
use crate::schema::{FieldSpec, ValueKind, ID_FIELD};

/// Serial number of 1970-01-01 in the spreadsheet date system.
pub const SERIAL_EPOCH_OFFSET: f64 = 25569.0;

const MILLIS_PER_DAY: f64 = 86_400.0 * 1000.0;

const TRUTHY: [&str; 4] = ["true", "1", "yes", "on"];

const DATE_FORMATS: [&str; 6] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%B %d, %Y", "%b %d, %Y", "%d %B %Y"];

const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// A cell that was present but could not be coerced; the field was dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct CoercionWarning {
    pub field: &'static str,
    pub raw: String,
    pub reason: &'static str,
}

/// The outcome of coercing one row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoercedRow {
    pub record: PartialRecord,
    pub warnings: Vec<CoercionWarning>,
}

/// Coerces every declared field of `schema` out of `row`.
pub fn coerce_row(row: &RawRow, schema: &[FieldSpec]) -> CoercedRow {
    let mut out = CoercedRow::default();

    for spec in schema {
        if spec.name == ID_FIELD {
            continue;
        }
        let Some(cell) = locate(row, spec) else {
            continue;
        };
        if cell.is_blank() {
            continue;
        }
        match coerce_cell(cell, spec.kind) {
            Ok(value) => out.record.insert(spec.name, value),
            Err(reason) => out.warnings.push(CoercionWarning {
                field: spec.name,
                raw: describe(cell),
                reason,
            }),
        }
    }

    out
}

/// Finds the cell for a field: by label, then by internal name, then by both
/// with punctuation and spacing ignored.
fn locate<'r>(row: &'r RawRow, spec: &FieldSpec) -> Option<&'r RawCell> {
    row.find(|header| header.trim().eq_ignore_ascii_case(spec.label))
        .or_else(|| row.find(|header| header.trim().eq_ignore_ascii_case(spec.name)))
        .or_else(|| {
            let name = squash(spec.name);
            let label = squash(spec.label);
            row.find(|header| {
                let header = squash(header);
                !header.is_empty() && (header == name || header == label)
            })
        })
}

fn squash(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

fn coerce_cell(cell: &RawCell, kind: ValueKind) -> Result<FieldValue, &'static str> {
    match kind {
        ValueKind::Number => coerce_number(cell),
        ValueKind::Date => coerce_date(cell),
        ValueKind::Boolean => Ok(FieldValue::Boolean(coerce_boolean(cell))),
        ValueKind::String => Ok(FieldValue::Text(coerce_string(cell))),
    }
}

fn coerce_number(cell: &RawCell) -> Result<FieldValue, &'static str> {
    match cell {
        RawCell::Number(n) | RawCell::DateSerial(n) if n.is_finite() => Ok(FieldValue::Number(*n)),
        RawCell::Text(s) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .map(FieldValue::Number)
            .ok_or("not a number"),
        RawCell::Bool(b) => Ok(FieldValue::Number(if *b { 1.0 } else { 0.0 })),
        _ => Err("not a number"),
    }
}

fn coerce_date(cell: &RawCell) -> Result<FieldValue, &'static str> {
    match cell {
        RawCell::Number(n) | RawCell::DateSerial(n) => from_serial(*n)
            .map(FieldValue::Date)
            .ok_or("not a spreadsheet date serial"),
        RawCell::Text(s) => parse_date(s.trim())
            .map(FieldValue::Date)
            .ok_or("not a calendar date"),
        _ => Err("not a date"),
    }
}

fn coerce_boolean(cell: &RawCell) -> bool {
    match cell {
        RawCell::Text(s) => TRUTHY.contains(&s.trim().to_lowercase().as_str()),
        RawCell::Bool(b) => *b,
        RawCell::Number(n) | RawCell::DateSerial(n) => *n != 0.0,
        RawCell::Empty => false,
    }
}

fn coerce_string(cell: &RawCell) -> String {
    match cell {
        RawCell::Text(s) => s.trim().to_string(),
        RawCell::Number(n) => format_number(*n),
        RawCell::Bool(b) => b.to_string(),
        RawCell::DateSerial(n) => match from_serial(*n) {
            Some(date) => date.format("%Y-%m-%d").to_string(),
            None => format_number(*n),
        },
        RawCell::Empty => String::new(),
    }
}

/// Converts a spreadsheet date serial to a UTC instant.
///
/// Only serials after [`SERIAL_EPOCH_OFFSET`] are accepted.
pub fn from_serial(serial: f64) -> Option<DateTime<Utc>> {
    if !serial.is_finite() || serial <= SERIAL_EPOCH_OFFSET {
        return None;
    }
    let millis = ((serial - SERIAL_EPOCH_OFFSET) * MILLIS_PER_DAY).round() as i64;
    DateTime::from_timestamp_millis(millis)
}

/// Parses the calendar date spellings commonly typed into spreadsheets.
pub fn parse_date(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Some(dt.and_utc());
        }
    }
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(s, format).ok())
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

fn describe(cell: &RawCell) -> String {
    match cell {
        RawCell::Empty => String::new(),
        RawCell::Text(s) => s.clone(),
        RawCell::Number(n) | RawCell::DateSerial(n) => format_number(*n),
        RawCell::Bool(b) => b.to_string(),
    }
}
