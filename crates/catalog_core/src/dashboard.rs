//! crates/catalog_core/src/dashboard.rs
//!
//! Collection statistics for the dashboard charts.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::domain::BookRecord;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct YearCount {
    pub year: i32,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DdcCount {
    pub ddc: String,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    pub total_books: usize,
    /// Ascending by year.
    pub books_by_year: Vec<YearCount>,
    /// Ascending by DDC code.
    pub books_by_ddc: Vec<DdcCount>,
}

/// Counts books per copyright year and per DDC class.
/// Records without a value for a breakdown are left out of that breakdown only.
pub fn summarize(books: &[BookRecord]) -> DashboardStats {
    let mut by_year: BTreeMap<i32, usize> = BTreeMap::new();
    let mut by_ddc: BTreeMap<&str, usize> = BTreeMap::new();

    for book in books {
        if book.data.copyright_year > 0 {
            *by_year.entry(book.data.copyright_year).or_default() += 1;
        }
        let ddc = book.data.ddc.trim();
        if !ddc.is_empty() {
            *by_ddc.entry(ddc).or_default() += 1;
        }
    }

    DashboardStats {
        total_books: books.len(),
        books_by_year: by_year
            .into_iter()
            .map(|(year, count)| YearCount { year, count })
            .collect(),
        books_by_ddc: by_ddc
            .into_iter()
            .map(|(ddc, count)| DdcCount {
                ddc: ddc.to_string(),
                count,
            })
            .collect(),
    }
}
