//! crates/catalog_core/src/schema.rs
//!
//! The ordered book field schema shared by the inventory grid, the spreadsheet
//! import and the catalog card.

use serde::Serialize;

/// How a raw cell is coerced into a field value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    String,
    Number,
    Date,
    Boolean,
}

/// One declared field: internal name, column header label, coercion kind and grid width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: ValueKind,
    pub width: u16,
}

impl FieldSpec {
    pub const fn new(name: &'static str, label: &'static str, kind: ValueKind, width: u16) -> Self {
        Self { name, label, kind, width }
    }
}

/// Name of the store-assigned identifier field; never taken from imported rows.
pub const ID_FIELD: &str = "id";

const fn text(name: &'static str, label: &'static str, width: u16) -> FieldSpec {
    FieldSpec::new(name, label, ValueKind::String, width)
}

const fn number(name: &'static str, label: &'static str, width: u16) -> FieldSpec {
    FieldSpec::new(name, label, ValueKind::Number, width)
}

pub static BOOK_FIELDS: &[FieldSpec] = &[
    text(ID_FIELD, "ID", 250),
    text("accession_number", "Accession Number", 140),
    text("title_number", "Title Number", 110),
    text("title", "Title", 220),
    text("author", "Author", 180),
    text("co_author1_surname", "Co-Author 1 Surname", 150),
    text("co_author1_first_name", "Co-Author 1 First Name", 150),
    text("co_author2_surname", "Co-Author 2 Surname", 150),
    text("co_author2_first_name", "Co-Author 2 First Name", 150),
    text("co_author3_surname", "Co-Author 3 Surname", 150),
    text("co_author3_first_name", "Co-Author 3 First Name", 150),
    text("co_author4_surname", "Co-Author 4 Surname", 150),
    text("co_author4_first_name", "Co-Author 4 First Name", 150),
    text("publisher", "Publisher", 160),
    text("prelim_page", "Prelim Page", 100),
    text("pages", "Pages", 80),
    text("description", "Description", 160),
    text("dimension", "Dimension", 100),
    text("accompanying_materials", "Accompanying Materials", 160),
    text("isbn", "ISBN", 150),
    text("ddc", "DDC", 100),
    text("class_number", "Class Number", 100),
    text("author_notation", "Author Notation", 100),
    text("general_subject", "General Subject", 160),
    text("course_code1", "Course Code 1", 110),
    text("course_code2", "Course Code 2", 110),
    text("course_code3", "Course Code 3", 110),
    text("course_code4", "Course Code 4", 110),
    text("course_code5", "Course Code 5", 110),
    text("department", "Department", 140),
    text("location", "Location", 100),
    number("copyright_year", "Copyright Year", 100),
    number("copy", "Copy", 50),
    number("ris_number", "RIS Number", 100),
    FieldSpec::new("date_added", "Date Added", ValueKind::Date, 150),
    text("remarks", "Remarks", 200),
];

/// Looks up a declared field by its internal name.
pub fn field(name: &str) -> Option<&'static FieldSpec> {
    BOOK_FIELDS.iter().find(|f| f.name == name)
}

/// The display label for a field, falling back to the raw name for unknown fields.
pub fn label_of(name: &str) -> &str {
    field(name).map_or(name, |f| f.label)
}
