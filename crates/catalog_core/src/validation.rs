//! crates/catalog_core/src/validation.rs
//!
//! Per-field rules applied to a coerced record. Every rule runs; all violations
//! are reported together.

use chrono::{Datelike, Utc};
use serde::Serialize;

use crate::domain::{BookData, PartialRecord};
use crate::schema::label_of;

/// Earliest accepted copyright year.
pub const MIN_COPYRIGHT_YEAR: i32 = 1000;

/// How many years past the current one a copyright year may be.
pub const COPYRIGHT_YEAR_LOOKAHEAD: i32 = 5;

pub const ISBN_DIGITS: usize = 13;

/// One failed rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub field: &'static str,
    pub message: String,
}

impl Violation {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Validates coerced records into normalized [`BookData`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordValidator {
    max_copyright_year: i32,
}

impl Default for RecordValidator {
    fn default() -> Self {
        Self::for_year(Utc::now().year())
    }
}

impl RecordValidator {
    /// A validator whose copyright-year ceiling is derived from `current_year`.
    pub fn for_year(current_year: i32) -> Self {
        Self {
            max_copyright_year: current_year + COPYRIGHT_YEAR_LOOKAHEAD,
        }
    }

    pub fn max_copyright_year(&self) -> i32 {
        self.max_copyright_year
    }

    /// Returns the normalized record, or every violation found.
    pub fn validate(&self, record: &PartialRecord) -> Result<BookData, Vec<Violation>> {
        let mut violations = Vec::new();

        let accession_number = required_text(record, "accession_number", &mut violations);
        let title = required_text(record, "title", &mut violations);
        let ddc = required_text(record, "ddc", &mut violations);
        let class_number = required_text(record, "class_number", &mut violations);
        let author_notation = required_text(record, "author_notation", &mut violations);

        let copyright_year = required_integer(record, "copyright_year", &mut violations)
            .and_then(|year| {
                if (MIN_COPYRIGHT_YEAR as i64..=self.max_copyright_year as i64).contains(&year) {
                    Some(year as i32)
                } else {
                    violations.push(Violation::new(
                        "copyright_year",
                        format!(
                            "Copyright Year must be between {} and {}",
                            MIN_COPYRIGHT_YEAR, self.max_copyright_year
                        ),
                    ));
                    None
                }
            });
        let copy = required_count(record, "copy", &mut violations);
        let ris_number = required_count(record, "ris_number", &mut violations);
        let date_added = required_text(record, "date_added", &mut violations);

        let isbn = record.text("isbn");
        if let Some(isbn) = &isbn {
            let digits: String = isbn.chars().filter(|c| *c != '-').collect();
            if digits.len() != ISBN_DIGITS || !digits.chars().all(|c| c.is_ascii_digit()) {
                violations.push(Violation::new(
                    "isbn",
                    format!("ISBN must have exactly {} digits once hyphens are removed", ISBN_DIGITS),
                ));
            }
        }

        if !violations.is_empty() {
            return Err(violations);
        }

        let optional = |name: &str| record.text(name);
        Ok(BookData {
            accession_number,
            title_number: optional("title_number"),
            isbn,
            title,
            author: optional("author"),
            co_author1_surname: optional("co_author1_surname"),
            co_author1_first_name: optional("co_author1_first_name"),
            co_author2_surname: optional("co_author2_surname"),
            co_author2_first_name: optional("co_author2_first_name"),
            co_author3_surname: optional("co_author3_surname"),
            co_author3_first_name: optional("co_author3_first_name"),
            co_author4_surname: optional("co_author4_surname"),
            co_author4_first_name: optional("co_author4_first_name"),
            publisher: optional("publisher"),
            prelim_page: optional("prelim_page"),
            pages: optional("pages"),
            description: optional("description"),
            dimension: optional("dimension"),
            accompanying_materials: optional("accompanying_materials"),
            ddc,
            class_number,
            author_notation,
            general_subject: optional("general_subject"),
            course_code1: optional("course_code1"),
            course_code2: optional("course_code2"),
            course_code3: optional("course_code3"),
            course_code4: optional("course_code4"),
            course_code5: optional("course_code5"),
            department: optional("department"),
            location: optional("location"),
            copyright_year: copyright_year.unwrap_or_default(),
            copy: copy.unwrap_or_default(),
            ris_number: ris_number.unwrap_or_default(),
            date_added,
            remarks: optional("remarks"),
        })
    }
}

/// Joins violations as `field: message; field: message`.
pub fn describe_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(|v| format!("{}: {}", v.field, v.message))
        .collect::<Vec<_>>()
        .join("; ")
}

fn required_text(record: &PartialRecord, name: &'static str, violations: &mut Vec<Violation>) -> String {
    match record.text(name) {
        Some(value) => value,
        None => {
            violations.push(Violation::new(name, format!("{} is required", label_of(name))));
            String::new()
        }
    }
}

fn required_integer(
    record: &PartialRecord,
    name: &'static str,
    violations: &mut Vec<Violation>,
) -> Option<i64> {
    let label = label_of(name);
    if !record.contains(name) {
        violations.push(Violation::new(name, format!("{} is required", label)));
        return None;
    }
    match record.number(name) {
        Some(n) if n.fract() == 0.0 && n.abs() < i64::MAX as f64 => Some(n as i64),
        _ => {
            violations.push(Violation::new(name, format!("{} must be a whole number", label)));
            None
        }
    }
}

fn required_count(record: &PartialRecord, name: &'static str, violations: &mut Vec<Violation>) -> Option<u32> {
    let value = required_integer(record, name, violations)?;
    if value < 1 {
        violations.push(Violation::new(name, format!("{} must be at least 1", label_of(name))));
        return None;
    }
    match u32::try_from(value) {
        Ok(count) => Some(count),
        Err(_) => {
            violations.push(Violation::new(name, format!("{} is too large", label_of(name))));
            None
        }
    }
}
