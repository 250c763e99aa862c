//! crates/catalog_core/src/catalog.rs
//!
//! Record operations layered over a [`RecordStore`]: accession-checked writes,
//! manual create/patch input handling, and the inventory query.
//!
//! The inventory query runs over a full snapshot of the store. Filtering, sorting
//! and paging all happen here in memory.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::str::FromStr;
use tracing::warn;
use uuid::Uuid;

use crate::coercion::coerce_row;
use crate::domain::{BookData, BookRecord, RawRow};
use crate::ports::{PortError, PortResult, RecordStore};
use crate::schema::{BOOK_FIELDS, ID_FIELD};
use crate::validation::{RecordValidator, Violation};

pub const DEFAULT_PAGE_SIZE: usize = 10;

//=========================================================================================
// Accession-Checked Writes
//=========================================================================================

/// Creates a record after checking that no live record holds its accession number.
///
/// The check and the write are two separate store calls; concurrent writers can
/// still both succeed.
pub async fn create_checked(store: &dyn RecordStore, data: BookData) -> PortResult<BookRecord> {
    if store.find_by_accession(&data.accession_number).await?.is_some() {
        return Err(PortError::Duplicate(data.accession_number));
    }
    store.create_one(data).await
}

/// Replaces a record's data, rejecting accession numbers held by a different record.
pub async fn update_checked(store: &dyn RecordStore, id: Uuid, data: BookData) -> PortResult<BookRecord> {
    if let Some(holder) = store.find_by_accession(&data.accession_number).await? {
        if holder.id != id {
            return Err(PortError::Duplicate(data.accession_number));
        }
    }
    store.update_one(id, data).await
}

/// Coerces and validates a JSON object submitted by the edit form.
///
/// Keys may be field names or column labels, exactly as in a spreadsheet row.
pub fn record_from_json(
    object: &Map<String, Value>,
    validator: &RecordValidator,
) -> Result<BookData, Vec<Violation>> {
    let coerced = coerce_row(&RawRow::from_json_object(object), BOOK_FIELDS);
    for w in &coerced.warnings {
        warn!(field = w.field, raw = %w.raw, "Dropped field from submitted record: {}", w.reason);
    }
    validator.validate(&coerced.record)
}

/// Overlays a patch (keyed by field name) on a stored record. `null` clears a field.
pub fn merge_patch(existing: &BookRecord, patch: &Map<String, Value>) -> Map<String, Value> {
    let mut merged = match serde_json::to_value(&existing.data) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    };
    for (key, value) in patch {
        if key != ID_FIELD {
            merged.insert(key.clone(), value.clone());
        }
    }
    merged
}

//=========================================================================================
// Inventory Query
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterOperator {
    Contains,
    Equals,
    StartsWith,
    EndsWith,
    #[serde(rename = ">")]
    GreaterThan,
    #[serde(rename = "<")]
    LessThan,
}

impl FromStr for FilterOperator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "contains" => Ok(Self::Contains),
            "equals" => Ok(Self::Equals),
            "startsWith" => Ok(Self::StartsWith),
            "endsWith" => Ok(Self::EndsWith),
            ">" => Ok(Self::GreaterThan),
            "<" => Ok(Self::LessThan),
            other => Err(format!("unknown filter operator '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl FromStr for SortDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            other => Err(format!("unknown sort direction '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterItem {
    pub field: String,
    pub operator: FilterOperator,
    #[serde(default)]
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortItem {
    pub field: String,
    #[serde(default)]
    pub direction: SortDirection,
}

/// Page, filters and sort keys for one inventory request. Pages are zero-based.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub page: usize,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default)]
    pub filters: Vec<FilterItem>,
    #[serde(default)]
    pub sort: Vec<SortItem>,
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            page: 0,
            page_size: DEFAULT_PAGE_SIZE,
            filters: Vec::new(),
            sort: Vec::new(),
        }
    }
}

/// One page of results. `total_count` counts every match, not just this page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_count: usize,
}

/// Fetches a snapshot of the store and applies `query` to it.
pub async fn get_many(store: &dyn RecordStore, query: &ListQuery) -> PortResult<Page<BookRecord>> {
    let snapshot = store.list_all().await?;
    Ok(apply_query(snapshot, query))
}

/// Filters, sorts and slices `records`.
pub fn apply_query(records: Vec<BookRecord>, query: &ListQuery) -> Page<BookRecord> {
    let mut rows: Vec<(Value, BookRecord)> = records
        .into_iter()
        .map(|record| (serde_json::to_value(&record).unwrap_or(Value::Null), record))
        .collect();

    for filter in &query.filters {
        if filter.field.is_empty() || filter.value.is_null() {
            continue;
        }
        rows.retain(|(json, _)| matches_filter(json.get(&filter.field), filter));
    }

    if !query.sort.is_empty() {
        rows.sort_by(|(a, _), (b, _)| {
            query
                .sort
                .iter()
                .map(|key| {
                    let ordering = compare_values(a.get(&key.field), b.get(&key.field));
                    match key.direction {
                        SortDirection::Asc => ordering,
                        SortDirection::Desc => ordering.reverse(),
                    }
                })
                .find(|o| *o != Ordering::Equal)
                .unwrap_or(Ordering::Equal)
        });
    }

    let total_count = rows.len();
    let start = query.page.saturating_mul(query.page_size).min(total_count);
    let end = start.saturating_add(query.page_size).min(total_count);
    let items = rows.drain(start..end).map(|(_, record)| record).collect();

    Page { items, total_count }
}

fn matches_filter(field_value: Option<&Value>, filter: &FilterItem) -> bool {
    let haystack = string_form(field_value).to_lowercase();
    let needle = string_form(Some(&filter.value)).to_lowercase();
    match filter.operator {
        FilterOperator::Contains => haystack.contains(&needle),
        FilterOperator::StartsWith => haystack.starts_with(&needle),
        FilterOperator::EndsWith => haystack.ends_with(&needle),
        FilterOperator::Equals => match (numeric_form(field_value), numeric_form(Some(&filter.value))) {
            (Some(a), Some(b)) => a == b,
            _ => string_form(field_value) == string_form(Some(&filter.value)),
        },
        FilterOperator::GreaterThan => numeric_pair(field_value, &filter.value).is_some_and(|(a, b)| a > b),
        FilterOperator::LessThan => numeric_pair(field_value, &filter.value).is_some_and(|(a, b)| a < b),
    }
}

fn numeric_pair(field_value: Option<&Value>, value: &Value) -> Option<(f64, f64)> {
    Some((numeric_form(field_value)?, numeric_form(Some(value))?))
}

/// Numeric values sort before all others; each group is ordered within itself.
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (numeric_form(a), numeric_form(b)) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => string_form(a).cmp(&string_form(b)),
    }
}

fn string_form(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn numeric_form(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        _ => None,
    }
}
