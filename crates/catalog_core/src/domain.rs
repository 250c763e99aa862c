//! crates/catalog_core/src/domain.rs
//!
//! Defines the pure, core data structures for the catalog.
//! These structs are independent of any database or spreadsheet format.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

//=========================================================================================
// Book Records
//=========================================================================================

/// A catalog entry as held by the record store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookRecord {
    pub id: Uuid,
    #[serde(flatten)]
    pub data: BookData,
}

/// The bibliographic and administrative fields of a book, without its identifier.
///
/// Fields that the validator requires are plain values; everything else is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BookData {
    // --- Identifiers ---
    pub accession_number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub isbn: Option<String>,

    // --- Bibliographic ---
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub co_author1_surname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub co_author1_first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub co_author2_surname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub co_author2_first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub co_author3_surname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub co_author3_first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub co_author4_surname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub co_author4_first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,

    // --- Physical description ---
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prelim_page: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pages: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimension: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accompanying_materials: Option<String>,

    // --- Classification ---
    pub ddc: String,
    pub class_number: String,
    pub author_notation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub general_subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course_code1: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course_code2: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course_code3: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course_code4: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course_code5: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    // --- Administrative ---
    pub copyright_year: i32,
    pub copy: u32,
    pub ris_number: u32,
    pub date_added: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
}

//=========================================================================================
// Raw Spreadsheet Rows
//=========================================================================================

/// A single cell value exactly as the spreadsheet reader produced it.
#[derive(Debug, Clone, PartialEq)]
pub enum RawCell {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    /// A spreadsheet date serial (days in the workbook's date system).
    DateSerial(f64),
}

impl RawCell {
    /// True for null cells and for text that is empty after trimming.
    pub fn is_blank(&self) -> bool {
        match self {
            RawCell::Empty => true,
            RawCell::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Converts a JSON value into the cell it would have been in a spreadsheet.
    pub fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => RawCell::Empty,
            serde_json::Value::Bool(b) => RawCell::Bool(*b),
            serde_json::Value::Number(n) => n.as_f64().map_or(RawCell::Empty, RawCell::Number),
            serde_json::Value::String(s) => RawCell::Text(s.clone()),
            other => RawCell::Text(other.to_string()),
        }
    }
}

/// One spreadsheet data row: header text paired with the cell under it, in column order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRow {
    cells: Vec<(String, RawCell)>,
}

impl RawRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, header: impl Into<String>, cell: RawCell) {
        self.cells.push((header.into(), cell));
    }

    /// Builder-style variant of [`RawRow::push`].
    pub fn with(mut self, header: impl Into<String>, cell: RawCell) -> Self {
        self.push(header, cell);
        self
    }

    pub fn cells(&self) -> impl Iterator<Item = (&str, &RawCell)> {
        self.cells.iter().map(|(h, c)| (h.as_str(), c))
    }

    /// Returns the first cell whose header satisfies the predicate.
    pub fn find(&self, mut matches: impl FnMut(&str) -> bool) -> Option<&RawCell> {
        self.cells
            .iter()
            .find(|(header, _)| matches(header))
            .map(|(_, cell)| cell)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Treats a JSON object as a row whose headers are the object's keys.
    pub fn from_json_object(object: &serde_json::Map<String, serde_json::Value>) -> Self {
        let cells = object
            .iter()
            .map(|(key, value)| (key.clone(), RawCell::from_json(value)))
            .collect();
        Self { cells }
    }
}

//=========================================================================================
// Coerced Values
//=========================================================================================

/// A typed value produced by row coercion.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Number(f64),
    Date(DateTime<Utc>),
    Boolean(bool),
}

impl FieldValue {
    /// Renders the value the way it would read in a text field.
    pub fn to_text(&self) -> String {
        match self {
            FieldValue::Text(s) => s.clone(),
            FieldValue::Number(n) => format_number(*n),
            FieldValue::Date(d) => d.to_rfc3339_opts(SecondsFormat::Millis, true),
            FieldValue::Boolean(b) => b.to_string(),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            FieldValue::Text(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
            _ => None,
        }
    }
}

/// Formats a number without a trailing `.0` when it is integral.
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

/// A sparse set of coerced fields keyed by internal field name.
///
/// Absent fields are simply missing; coercion never stores empty strings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartialRecord {
    fields: BTreeMap<&'static str, FieldValue>,
}

impl PartialRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &'static str, value: FieldValue) {
        self.fields.insert(name, value);
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.keys().copied()
    }

    /// The field rendered as trimmed text, or `None` when absent or blank.
    pub fn text(&self, name: &str) -> Option<String> {
        self.get(name)
            .map(|v| v.to_text().trim().to_string())
            .filter(|s| !s.is_empty())
    }

    pub fn number(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(FieldValue::as_number)
    }

    /// The title as shown in import reports.
    pub fn display_title(&self) -> String {
        self.text("title").unwrap_or_else(|| "N/A".to_string())
    }
}

//=========================================================================================
// Catalog Cards
//=========================================================================================

/// Which entry a printed catalog card files under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardType {
    Author,
    Title,
    Subject,
}

impl fmt::Display for CardType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CardType::Author => "Author Card",
            CardType::Title => "Title Card",
            CardType::Subject => "Subject Card",
        };
        f.write_str(name)
    }
}

impl FromStr for CardType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        match normalized.trim_end_matches(" card") {
            "author" => Ok(CardType::Author),
            "title" => Ok(CardType::Title),
            "subject" => Ok(CardType::Subject),
            _ => Err(format!("unknown card type '{}'", s)),
        }
    }
}

//=========================================================================================
// Accounts
//=========================================================================================

/// Represents a user - used throughout the service.
#[derive(Debug, Clone)]
pub struct User {
    pub user_id: Uuid,
    pub email: String,
}

// Only used internally for login/signup - contains sensitive data
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user_id: Uuid,
    pub email: String,
    pub hashed_password: String,
}

// Represents a browser login session (auth cookie)
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub id: String,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
}
