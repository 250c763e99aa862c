//! crates/catalog_core/src/card.rs
//!
//! Catalog card layout. A card has a narrow left column (call number on top,
//! holdings at the bottom) and a body of bibliographic lines. Body paragraphs use
//! hanging indents: the first line starts at the paragraph indent and wrapped
//! lines continue further in.
//!
//! Missing fields are left out; formatting never fails.

use serde::Serialize;

use crate::domain::{BookData, CardType};

/// Physical card size.
pub const CARD_WIDTH_CM: f32 = 15.7;
pub const CARD_HEIGHT_CM: f32 = 7.62;

/// Monospace grid used for print output.
pub const CARD_COLUMNS: usize = 64;
pub const CARD_ROWS: usize = 18;
pub const LEFT_COLUMN_WIDTH: usize = 16;

/// Body indents, in columns from the left edge of the body.
pub const ENTRY_INDENT: usize = 0;
pub const PARAGRAPH_INDENT: usize = 2;
pub const WRAP_INDENT: usize = 4;

/// Shelf location printed when a record has none.
pub const DEFAULT_LOCATION: &str = "CY";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LineStyle {
    /// Heading lines: primary entry and added author.
    Entry,
    /// Descriptive paragraphs with a hanging indent.
    Paragraph,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CardLine {
    pub text: String,
    pub style: LineStyle,
    /// Leave an empty row above this line.
    pub spaced: bool,
}

impl CardLine {
    fn entry(text: String) -> Self {
        Self { text, style: LineStyle::Entry, spaced: false }
    }

    fn paragraph(text: String) -> Self {
        Self { text, style: LineStyle::Paragraph, spaced: false }
    }
}

/// A formatted card, split into its layout regions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogCard {
    pub card_type: CardType,
    pub width_cm: f32,
    pub height_cm: f32,
    /// Left column, stacked from the top.
    pub call_number: Vec<String>,
    /// Left column, stacked so the last line sits on the bottom edge.
    pub holdings: Vec<String>,
    pub body: Vec<CardLine>,
}

/// Lays out one record as the given card type.
pub fn format_card(book: &BookData, card_type: CardType) -> CatalogCard {
    let author = present(&book.author);
    let mut body = Vec::new();

    let primary = match card_type {
        CardType::Author => author.map(str::to_string),
        CardType::Title => Some(book.title.trim().to_string()).filter(|t| !t.is_empty()),
        CardType::Subject => present(&book.general_subject).map(str::to_uppercase),
    };
    if let Some(entry) = primary {
        body.push(CardLine::entry(terminate(&entry)));
    }
    if card_type != CardType::Author {
        if let Some(author) = author {
            body.push(CardLine::entry(terminate(author)));
        }
    }

    let imprint = imprint_line(book);
    if !imprint.is_empty() {
        body.push(CardLine::paragraph(imprint));
    }
    let collation = collation_line(book);
    if !collation.is_empty() {
        body.push(CardLine::paragraph(collation));
    }
    if let Some(isbn) = present(&book.isbn) {
        body.push(CardLine::paragraph(terminate(&format!("ISBN {}", isbn))));
    }
    if let Some(remarks) = present(&book.remarks) {
        body.push(CardLine::paragraph(terminate(&format!("Notes: {}", remarks))));
    }
    let tracing = tracing_subjects(book);
    if !tracing.is_empty() {
        body.push(CardLine {
            spaced: true,
            ..CardLine::paragraph(tracing)
        });
    }

    CatalogCard {
        card_type,
        width_cm: CARD_WIDTH_CM,
        height_cm: CARD_HEIGHT_CM,
        call_number: call_number(book),
        holdings: holdings(book),
        body,
    }
}

/// Physical extent: `<prelim>, <pages> pages : <description> ; <dimension>cm. + <materials>.`
pub fn collation_line(book: &BookData) -> String {
    let mut parts = Vec::new();
    match (present(&book.prelim_page), present(&book.pages)) {
        (Some(prelim), Some(pages)) => parts.push(format!("{}, {} pages", prelim, pages)),
        (None, Some(pages)) => parts.push(format!("{} pages", pages)),
        _ => {}
    }
    if let Some(description) = present(&book.description) {
        parts.push(format!(": {}", description));
    }
    if let Some(dimension) = present(&book.dimension) {
        parts.push(format!("; {}cm.", dimension));
    }
    if let Some(materials) = present(&book.accompanying_materials) {
        parts.push(format!("+ {}.", materials));
    }
    parts.join(" ").trim().to_string()
}

/// Numbered subject headings, e.g. `1. Philippine history.`
pub fn tracing_subjects(book: &BookData) -> String {
    let subjects: Vec<&str> = present(&book.general_subject).into_iter().collect();
    if subjects.is_empty() {
        return String::new();
    }
    let numbered = subjects
        .iter()
        .enumerate()
        .map(|(i, s)| format!("{}. {}", i + 1, s))
        .collect::<Vec<_>>()
        .join(" ");
    terminate(&numbered)
}

/// Title statement and imprint: `<title> / <author> -- <publisher>, <year>.`
pub fn imprint_line(book: &BookData) -> String {
    let title = book.title.trim();
    let statement = match (title.is_empty(), present(&book.author)) {
        (false, Some(author)) => format!("{} / {}", title, author),
        _ => title.to_string(),
    };

    let year = (book.copyright_year > 0).then(|| book.copyright_year.to_string());
    let publication = [present(&book.publisher).map(str::to_string), year]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(", ");

    match (statement.is_empty(), publication.is_empty()) {
        (true, true) => String::new(),
        (false, true) => terminate(&statement),
        (true, false) => terminate(&publication),
        (false, false) => terminate(&format!("{} -- {}", statement, publication)),
    }
}

fn call_number(book: &BookData) -> Vec<String> {
    let location = present(&book.location).unwrap_or(DEFAULT_LOCATION);
    let classification = format!("{} {}", book.ddc.trim(), book.class_number.trim());
    let year = (book.copyright_year > 0).then(|| book.copyright_year.to_string());

    [
        Some(location.to_string()),
        Some(classification.trim().to_string()),
        Some(book.author_notation.trim().to_string()),
        year,
    ]
    .into_iter()
    .flatten()
    .filter(|s| !s.is_empty())
    .collect()
}

fn holdings(book: &BookData) -> Vec<String> {
    let mut lines = Vec::new();
    let accession = book.accession_number.trim();
    if !accession.is_empty() {
        lines.push(format!("Acc. #: {}", accession));
    }
    if let Some(title_number) = present(&book.title_number) {
        lines.push(format!("Title #: {}", title_number));
    }
    if book.ris_number > 0 {
        lines.push(format!("RIS #: {}", book.ris_number));
    }
    if book.copy > 0 {
        lines.push(format!("Copy: {}", book.copy));
    }
    lines
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Appends a period unless the text already ends with one.
fn terminate(text: &str) -> String {
    let text = text.trim_end();
    if text.ends_with('.') {
        text.to_string()
    } else {
        format!("{}.", text)
    }
}

//=========================================================================================
// Print Rendering
//=========================================================================================

impl CatalogCard {
    /// Renders the card onto a fixed `CARD_ROWS` x `CARD_COLUMNS` monospace grid.
    /// Content that does not fit is cut off.
    pub fn render_text(&self) -> String {
        let mut left: Vec<String> = vec![String::new(); CARD_ROWS];
        for (row, line) in self.call_number.iter().enumerate().take(CARD_ROWS) {
            left[row] = clip(line, LEFT_COLUMN_WIDTH - 1);
        }
        let first_holding = CARD_ROWS.saturating_sub(self.holdings.len());
        for (offset, line) in self.holdings.iter().enumerate() {
            if let Some(slot) = left.get_mut(first_holding + offset) {
                *slot = clip(line, LEFT_COLUMN_WIDTH - 1);
            }
        }

        let body_width = CARD_COLUMNS - LEFT_COLUMN_WIDTH;
        let mut body: Vec<String> = vec![String::new()];
        for line in &self.body {
            if line.spaced {
                body.push(String::new());
            }
            let (first, rest) = match line.style {
                LineStyle::Entry => (ENTRY_INDENT, WRAP_INDENT),
                LineStyle::Paragraph => (PARAGRAPH_INDENT, WRAP_INDENT),
            };
            body.extend(wrap(&line.text, first, rest, body_width));
        }

        (0..CARD_ROWS)
            .map(|row| {
                let text = body.get(row).map(String::as_str).unwrap_or("");
                format!("{:<width$}{}", left[row], text, width = LEFT_COLUMN_WIDTH)
                    .trim_end()
                    .to_string()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn clip(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

/// Greedy word wrap; words longer than a line are split.
fn wrap(text: &str, first_indent: usize, rest_indent: usize, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut indent = first_indent;
    let mut current = String::new();
    let mut current_len = 0;

    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        loop {
            let room = width.saturating_sub(indent).max(1);
            let needed = if current_len == 0 { word.len() } else { current_len + 1 + word.len() };
            if needed <= room {
                if current_len > 0 {
                    current.push(' ');
                    current_len += 1;
                }
                current.extend(word.iter());
                current_len += word.len();
                break;
            }
            if current_len > 0 {
                lines.push(format!("{}{}", " ".repeat(indent), current));
                current.clear();
                current_len = 0;
                indent = rest_indent;
                continue;
            }
            let tail = word.split_off(room);
            lines.push(format!("{}{}", " ".repeat(indent), word.iter().collect::<String>()));
            indent = rest_indent;
            word = tail;
            if word.is_empty() {
                break;
            }
        }
    }
    if current_len > 0 {
        lines.push(format!("{}{}", " ".repeat(indent), current));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book() -> BookData {
        BookData {
            accession_number: "A100".into(),
            title_number: Some("T-12".into()),
            title: "Noli me tangere".into(),
            author: Some("Rizal, Jose".into()),
            publisher: Some("Anvil".into()),
            copyright_year: 2018,
            ddc: "899".into(),
            class_number: "1.307973".into(),
            author_notation: "R52".into(),
            general_subject: Some("Philippine fiction".into()),
            isbn: Some("978-0-13-468599-1".into()),
            copy: 2,
            ris_number: 1017,
            ..BookData::default()
        }
    }

    #[test]
    fn collation_skips_absent_description() {
        let b = BookData {
            prelim_page: Some("xii".into()),
            pages: Some("200".into()),
            dimension: Some("24".into()),
            ..BookData::default()
        };
        assert_eq!(collation_line(&b), "xii, 200 pages ; 24cm.");
    }

    #[test]
    fn collation_with_every_segment() {
        let b = BookData {
            prelim_page: Some("xii".into()),
            pages: Some("200".into()),
            description: Some("ill.".into()),
            dimension: Some("24".into()),
            accompanying_materials: Some("1 CD-ROM".into()),
            ..BookData::default()
        };
        assert_eq!(collation_line(&b), "xii, 200 pages : ill. ; 24cm. + 1 CD-ROM.");

        let prelim_only = BookData {
            prelim_page: Some("xii".into()),
            ..BookData::default()
        };
        assert_eq!(collation_line(&prelim_only), "");
    }

    #[test]
    fn tracing_lists_the_general_subject() {
        assert_eq!(tracing_subjects(&book()), "1. Philippine fiction.");
        assert_eq!(tracing_subjects(&BookData::default()), "");
    }

    #[test]
    fn imprint_joins_title_author_and_publication() {
        assert_eq!(imprint_line(&book()), "Noli me tangere / Rizal, Jose -- Anvil, 2018.");

        let untitled = BookData {
            author: Some("Anon".into()),
            copyright_year: 1999,
            ..BookData::default()
        };
        assert_eq!(imprint_line(&untitled), "1999.");
    }

    #[test]
    fn primary_entry_follows_card_type() {
        let b = book();
        let first = |t| format_card(&b, t).body[0].text.clone();
        assert_eq!(first(CardType::Author), "Rizal, Jose.");
        assert_eq!(first(CardType::Title), "Noli me tangere.");
        assert_eq!(first(CardType::Subject), "PHILIPPINE FICTION.");

        let subject = format_card(&b, CardType::Subject);
        assert_eq!(subject.body[1].text, "Rizal, Jose.");
        assert_eq!(subject.body[1].style, LineStyle::Entry);
    }

    #[test]
    fn optional_lines_appear_only_when_present() {
        let card = format_card(&book(), CardType::Author);
        let texts: Vec<&str> = card.body.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(
            texts,
            vec![
                "Rizal, Jose.",
                "Noli me tangere / Rizal, Jose -- Anvil, 2018.",
                "ISBN 978-0-13-468599-1.",
                "1. Philippine fiction.",
            ]
        );
        assert!(card.body[3].spaced);

        let bare = format_card(&BookData::default(), CardType::Title);
        assert!(bare.body.is_empty());
        assert_eq!(bare.call_number, vec![DEFAULT_LOCATION.to_string()]);
        assert!(bare.holdings.is_empty());
    }

    #[test]
    fn left_column_regions() {
        let card = format_card(&book(), CardType::Title);
        assert_eq!(card.call_number, vec!["CY", "899 1.307973", "R52", "2018"]);
        assert_eq!(card.holdings, vec!["Acc. #: A100", "Title #: T-12", "RIS #: 1017", "Copy: 2"]);
    }

    #[test]
    fn rendered_card_has_fixed_dimensions() {
        let mut b = book();
        b.remarks = Some("Gift of the class of 1998, ".repeat(12));
        let text = format_card(&b, CardType::Author).render_text();
        let lines: Vec<&str> = text.split('\n').collect();
        assert_eq!(lines.len(), CARD_ROWS);
        assert!(lines.iter().all(|l| l.chars().count() <= CARD_COLUMNS));
        assert!(lines[0].starts_with("CY"));
        assert!(lines[CARD_ROWS - 1].starts_with("Copy: 2"));
        assert!(lines[1].contains("Rizal, Jose."));
    }

    #[test]
    fn wrapping_uses_hanging_indent() {
        let lines = wrap("alpha beta gamma delta", 2, 4, 14);
        assert_eq!(lines, vec!["  alpha beta", "    gamma", "    delta"]);
        let split = wrap("abcdefghij", 0, 2, 6);
        assert_eq!(split, vec!["abcdef", "  ghij"]);
    }
}
