//! crates/catalog_core/src/import.rs
//!
//! Bulk spreadsheet import. Rows are coerced, validated and written one at a
//! time; a failing row is recorded and the run moves on to the next one.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::catalog::create_checked;
use crate::coercion::coerce_row;
use crate::domain::RawRow;
use crate::ports::{PortError, RecordStore, SpreadsheetReader};
use crate::schema::BOOK_FIELDS;
use crate::validation::{describe_violations, RecordValidator};

/// Rows above the first data row (the header).
pub const HEADER_ROWS: usize = 1;

/// How many failure messages the summary text quotes.
pub const SUMMARY_MESSAGE_LIMIT: usize = 15;

/// A run-level failure; no row was processed.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("Error processing spreadsheet: {0}")]
    Unreadable(#[from] PortError),
}

/// Alert colour for the summary shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Success,
    Info,
    Error,
}

/// Totals and collected messages for one import run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportSummary {
    pub total_rows: usize,
    pub created: usize,
    pub skipped: usize,
    pub validation_failures: usize,
    pub creation_failures: usize,
    /// Every per-row message, in row order.
    pub failures: Vec<String>,
}

/// What the upload endpoint returns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportReport {
    pub severity: Severity,
    pub message: String,
    pub total_rows: usize,
    pub created: usize,
    pub skipped: usize,
    pub validation_failures: usize,
    pub creation_failures: usize,
    pub failures: Vec<String>,
    pub omitted_failures: usize,
}

impl ImportSummary {
    fn skip(&mut self, row: usize) {
        self.skipped += 1;
        self.collect(format!("Row {}: skipped (empty row)", row));
    }

    fn fail_validation(&mut self, message: String) {
        self.validation_failures += 1;
        self.collect(message);
    }

    fn fail_creation(&mut self, message: String) {
        self.creation_failures += 1;
        self.collect(message);
    }

    /// Every collected entry goes to the log at WARN, so entries beyond the
    /// summary cap are still visible at the default level.
    fn collect(&mut self, message: String) {
        warn!("{}", message);
        self.failures.push(message);
    }

    pub fn severity(&self) -> Severity {
        if self.validation_failures + self.creation_failures > 0 {
            Severity::Error
        } else if self.total_rows == 0 || self.skipped > 0 {
            Severity::Info
        } else {
            Severity::Success
        }
    }

    /// The human-readable alert text.
    pub fn message(&self) -> String {
        if self.total_rows == 0 {
            return "The spreadsheet is empty or has no data rows after the header.".to_string();
        }
        if self.failures.is_empty() {
            return format!("Successfully imported {} books.", self.created);
        }

        let mut text = format!(
            "Import finished with problems. {} books imported, {} failed validation, {} could not be saved",
            self.created, self.validation_failures, self.creation_failures
        );
        if self.skipped > 0 {
            text.push_str(&format!(", {} empty rows skipped", self.skipped));
        }
        text.push_str(".\nErrors:\n- ");
        text.push_str(&self.sampled_failures().join("\n- "));
        let omitted = self.omitted_failures();
        if omitted > 0 {
            text.push_str(&format!("\n... ({} more in the server log)", omitted));
        }
        text
    }

    pub fn sampled_failures(&self) -> &[String] {
        &self.failures[..self.failures.len().min(SUMMARY_MESSAGE_LIMIT)]
    }

    pub fn omitted_failures(&self) -> usize {
        self.failures.len().saturating_sub(SUMMARY_MESSAGE_LIMIT)
    }

    pub fn report(&self) -> ImportReport {
        ImportReport {
            severity: self.severity(),
            message: self.message(),
            total_rows: self.total_rows,
            created: self.created,
            skipped: self.skipped,
            validation_failures: self.validation_failures,
            creation_failures: self.creation_failures,
            failures: self.sampled_failures().to_vec(),
            omitted_failures: self.omitted_failures(),
        }
    }
}

/// Decodes an uploaded file and imports its rows.
///
/// A file that cannot be decoded aborts before any row is written.
pub async fn import_spreadsheet(
    reader: &dyn SpreadsheetReader,
    store: &dyn RecordStore,
    validator: &RecordValidator,
    file_name: &str,
    bytes: &[u8],
) -> Result<ImportSummary, ImportError> {
    let rows = reader.read_rows(file_name, bytes)?;
    info!(file = file_name, rows = rows.len(), "Starting bulk import");
    Ok(import_rows(&rows, store, validator).await)
}

/// Imports `rows` strictly in order, one store round trip at a time.
pub async fn import_rows(rows: &[RawRow], store: &dyn RecordStore, validator: &RecordValidator) -> ImportSummary {
    let mut summary = ImportSummary {
        total_rows: rows.len(),
        ..ImportSummary::default()
    };

    for (index, raw) in rows.iter().enumerate() {
        let row = index + 1 + HEADER_ROWS;
        let coerced = coerce_row(raw, BOOK_FIELDS);
        for w in &coerced.warnings {
            warn!(row, field = w.field, raw = %w.raw, "Dropped unparseable cell: {}", w.reason);
        }

        if coerced.record.is_empty() {
            summary.skip(row);
            continue;
        }

        let title = coerced.record.display_title();
        let data = match validator.validate(&coerced.record) {
            Ok(data) => data,
            Err(violations) => {
                let message = format!(
                    "Row {} (Title: {}): Validation failed — {}",
                    row,
                    title,
                    describe_violations(&violations)
                );
                summary.fail_validation(message);
                continue;
            }
        };

        match create_checked(store, data).await {
            Ok(record) => {
                debug!(row, id = %record.id, "Imported book");
                summary.created += 1;
            }
            Err(e) => {
                let message = format!("Row {} (Title: {}): Creation failed — {}", row, title, e);
                summary.fail_creation(message);
            }
        }
    }

    info!(
        created = summary.created,
        validation_failures = summary.validation_failures,
        creation_failures = summary.creation_failures,
        skipped = summary.skipped,
        "Bulk import finished"
    );
    summary
}
