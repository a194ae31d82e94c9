//! Population of the ontology from the book-crossing spreadsheets.
//!
//! The files are semicolon-separated and not reliably UTF-8; bytes that do
//! not decode are read as Latin-1. Malformed rows are skipped with a
//! warning, never aborting a load. Authors and publishers are cached by
//! name so each distinct name becomes exactly one individual.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, warn};

use crate::datatype::Literal;
use crate::error::{BibliographError, Result};
use crate::ontology::Ontology;

lazy_static! {
    // publication years arrive as "2002" or "2002.0"; anything else is junk
    static ref YEAR_RE: Regex = Regex::new(r"^\d{1,4}(\.0+)?$").unwrap();
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub loaded: usize,
    pub skipped: usize,
}

fn decode(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_owned(),
        // Latin-1 maps every byte straight onto a code point
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

fn read_file(path: &Path) -> Result<String> {
    let bytes = fs::read(path)
        .map_err(|e| BibliographError::Ingest(format!("{}: {}", path.display(), e)))?;
    Ok(decode(&bytes))
}

fn reader(content: &str) -> csv::Reader<&[u8]> {
    csv::ReaderBuilder::new()
        .delimiter(b';')
        .flexible(true)
        .from_reader(content.as_bytes())
}

fn column(headers: &csv::StringRecord, name: &str) -> Result<usize> {
    headers
        .iter()
        .position(|h| h == name)
        .ok_or_else(|| BibliographError::Ingest(format!("missing column '{}'", name)))
}

fn field<'r>(record: &'r csv::StringRecord, index: usize) -> Option<&'r str> {
    record.get(index).map(str::trim).filter(|s| !s.is_empty())
}

pub fn load_books(onto: &mut Ontology, path: &Path) -> Result<IngestReport> {
    let report = load_books_from(onto, &read_file(path)?)?;
    info!(loaded = report.loaded, skipped = report.skipped, "books ingested");
    Ok(report)
}

pub fn load_books_from(onto: &mut Ontology, content: &str) -> Result<IngestReport> {
    let mut csv_reader = reader(content);
    let headers = csv_reader.headers()?.clone();
    let isbn_col = column(&headers, "ISBN")?;
    let title_col = column(&headers, "Book-Title")?;
    let author_col = column(&headers, "Book-Author")?;
    let year_col = column(&headers, "Year-Of-Publication")?;
    let publisher_col = column(&headers, "Publisher")?;

    let mut authors: HashMap<String, u64> = HashMap::new();
    let mut publishers: HashMap<String, u64> = HashMap::new();
    let mut report = IngestReport::default();

    for (index, record) in csv_reader.records().enumerate() {
        let record = match record {
            Ok(r) => r,
            Err(e) => {
                warn!(row = index, error = %e, "unreadable book row");
                report.skipped += 1;
                continue;
            }
        };
        let Some(isbn) = field(&record, isbn_col) else {
            report.skipped += 1;
            continue;
        };
        // a present but malformed year marks a misaligned row
        let year = match field(&record, year_col) {
            Some(text) if !YEAR_RE.is_match(text) => {
                warn!(row = index, year = text, "book row with unusable year");
                report.skipped += 1;
                continue;
            }
            Some(text) => Some(text.parse::<f64>().unwrap_or_default() as i64),
            None => None,
        };

        let book = onto.add_individual(&format!("book_{}", isbn), "Book");
        onto.assert_literal(book, "isbn", Literal::Str(isbn.to_owned()));
        if let Some(title) = field(&record, title_col) {
            onto.assert_literal(book, "book_title", Literal::Str(title.to_owned()));
        }
        if let Some(year) = year {
            onto.assert_literal(book, "publication_year", Literal::Int(year));
        }
        if let Some(name) = field(&record, author_col) {
            let author = match authors.get(name) {
                Some(id) => *id,
                None => {
                    let id = onto.add_individual(&format!("author_{}", authors.len()), "Author");
                    onto.assert_literal(id, "author_name", Literal::Str(name.to_owned()));
                    authors.insert(name.to_owned(), id);
                    id
                }
            };
            onto.assert_relation(book, "has_author", author);
        }
        if let Some(name) = field(&record, publisher_col) {
            let publisher = match publishers.get(name) {
                Some(id) => *id,
                None => {
                    let id =
                        onto.add_individual(&format!("publisher_{}", publishers.len()), "Publisher");
                    onto.assert_literal(id, "publisher_name", Literal::Str(name.to_owned()));
                    publishers.insert(name.to_owned(), id);
                    id
                }
            };
            onto.assert_relation(book, "has_publisher", publisher);
        }
        report.loaded += 1;
    }
    Ok(report)
}

pub fn load_ratings(onto: &mut Ontology, path: &Path) -> Result<IngestReport> {
    let report = load_ratings_from(onto, &read_file(path)?)?;
    info!(loaded = report.loaded, skipped = report.skipped, "ratings ingested");
    Ok(report)
}

pub fn load_ratings_from(onto: &mut Ontology, content: &str) -> Result<IngestReport> {
    let mut csv_reader = reader(content);
    let headers = csv_reader.headers()?.clone();
    let user_col = column(&headers, "User-ID")?;
    let isbn_col = column(&headers, "ISBN")?;
    let rating_col = column(&headers, "Book-Rating")?;

    let mut report = IngestReport::default();
    for (index, record) in csv_reader.records().enumerate() {
        let record = match record {
            Ok(r) => r,
            Err(e) => {
                warn!(row = index, error = %e, "unreadable rating row");
                report.skipped += 1;
                continue;
            }
        };
        let (Some(user_id), Some(isbn), Some(rating_text)) = (
            field(&record, user_col),
            field(&record, isbn_col),
            field(&record, rating_col),
        ) else {
            report.skipped += 1;
            continue;
        };
        let Ok(rating) = rating_text.parse::<i64>() else {
            warn!(row = index, rating = rating_text, "rating is not a number");
            report.skipped += 1;
            continue;
        };

        let book = onto.add_individual(&format!("book_{}", isbn), "Book");
        let user = onto.add_individual(&format!("user_{}", user_id), "User");
        let review = onto.add_individual(&format!("review_{}_{}", user_id, isbn), "Review");
        onto.assert_literal(review, "rating", Literal::Int(rating));
        onto.assert_literal(review, "review_user_id", Literal::Str(user_id.to_owned()));
        onto.assert_relation(review, "reviewed_by", user);
        onto.assert_relation(book, "has_review", review);
        report.loaded += 1;
    }
    Ok(report)
}

pub fn load_users(onto: &mut Ontology, path: &Path) -> Result<IngestReport> {
    let report = load_users_from(onto, &read_file(path)?)?;
    info!(loaded = report.loaded, skipped = report.skipped, "users ingested");
    Ok(report)
}

/// Enrich users already seen through ratings; unknown users are skipped.
pub fn load_users_from(onto: &mut Ontology, content: &str) -> Result<IngestReport> {
    let mut csv_reader = reader(content);
    let headers = csv_reader.headers()?.clone();
    let user_col = column(&headers, "User-ID")?;
    let location_col = column(&headers, "Location")?;
    let age_col = column(&headers, "Age")?;

    let mut report = IngestReport::default();
    for record in csv_reader.records() {
        let Ok(record) = record else {
            report.skipped += 1;
            continue;
        };
        let Some(user_id) = field(&record, user_col) else {
            report.skipped += 1;
            continue;
        };
        let Some(user) = onto.lookup(&format!("user_{}", user_id)) else {
            report.skipped += 1;
            continue;
        };
        if onto.literal_of(user, "user_age").is_none() {
            if let Some(age) = field(&record, age_col).and_then(|a| a.parse::<f64>().ok()) {
                onto.assert_literal(user, "user_age", Literal::Int(age as i64));
            }
        }
        if onto.literal_of(user, "user_location").is_none() {
            if let Some(location) = field(&record, location_col) {
                onto.assert_literal(user, "user_location", Literal::Str(location.to_owned()));
            }
        }
        report.loaded += 1;
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latin1_bytes_decode() {
        let bytes = b"Gabriel Garc\xeda M\xe1rquez";
        assert_eq!(decode(bytes), "Gabriel García Márquez");
    }

    #[test]
    fn year_shapes() {
        assert!(YEAR_RE.is_match("2002"));
        assert!(YEAR_RE.is_match("2002.0"));
        assert!(!YEAR_RE.is_match("DK Publishing Inc"));
    }
}
