//! Goodreads library export (`goodreads_library_export.csv`).
//!
//! Goodreads wraps ISBNs in spreadsheet formulas (`="0156013987"`,
//! `=""9780156013987""`) so that leading zeros survive a round-trip through
//! Excel. Ratings are already on a 5-point scale and the reading status is
//! carried by the "Exclusive Shelf" column.

use chrono::NaiveDate;

use super::{ColumnMapping, Field, FormatAdapter};
use crate::models::{Book, Entry, ReadingStatus};
use crate::transform::normalize::parse_five_point_rating;
use crate::validation::is_uuid_v4;

const REQUIRED_COLUMNS: [&str; 5] = ["Book Id", "Title", "Author", "ISBN13", "My Rating"];

const EXPORT_HEADERS: [&str; 24] = [
    "Book Id",
    "Title",
    "Author",
    "Author l-f",
    "Additional Authors",
    "ISBN",
    "ISBN13",
    "My Rating",
    "Average Rating",
    "Publisher",
    "Binding",
    "Number of Pages",
    "Year Published",
    "Original Publication Year",
    "Date Read",
    "Date Added",
    "Bookshelves",
    "Bookshelves with positions",
    "Exclusive Shelf",
    "My Review",
    "Spoiler",
    "Private Notes",
    "Read Count",
    "Owned Copies",
];

// Column positions in EXPORT_HEADERS
const COL_BOOK_ID: usize = 0;
const COL_TITLE: usize = 1;
const COL_AUTHOR: usize = 2;
const COL_AUTHOR_LF: usize = 3;
const COL_ADDITIONAL_AUTHORS: usize = 4;
const COL_ISBN: usize = 5;
const COL_ISBN13: usize = 6;
const COL_MY_RATING: usize = 7;
const COL_PUBLISHER: usize = 9;
const COL_PAGES: usize = 11;
const COL_YEAR_PUBLISHED: usize = 12;
const COL_DATE_READ: usize = 14;
const COL_DATE_ADDED: usize = 15;
const COL_BOOKSHELVES: usize = 16;
const COL_EXCLUSIVE_SHELF: usize = 18;
const COL_MY_REVIEW: usize = 19;
const COL_PRIVATE_NOTES: usize = 21;
const COL_READ_COUNT: usize = 22;
const COL_OWNED_COPIES: usize = 23;

/// Goodreads dialect.
#[derive(Debug, Clone, Copy, Default)]
pub struct GoodreadsFormat;

impl FormatAdapter for GoodreadsFormat {
    fn name(&self) -> &'static str {
        "goodreads"
    }

    fn description(&self) -> &'static str {
        "Goodreads library export"
    }

    fn required_columns(&self) -> &'static [&'static str] {
        &REQUIRED_COLUMNS
    }

    fn default_mapping(&self) -> ColumnMapping {
        // "Book Id" is Goodreads' internal ID, not a BLEF key: leave it unmapped
        // so ISBN-13 (or a generated UUID) becomes the book ID.
        ColumnMapping::new()
            .with(Field::Isbn13, "ISBN13")
            .with(Field::Isbn10, "ISBN")
            .with(Field::Title, "Title")
            .with(Field::Author, "Author")
            .with(Field::Publisher, "Publisher")
            .with(Field::PublishedDate, "Year Published")
            .with(Field::Pages, "Number of Pages")
            .with(Field::Rating, "My Rating")
            .with(Field::Review, "My Review")
            .with(Field::Status, "Exclusive Shelf")
            .with(Field::DateRead, "Date Read")
            .with(Field::DateAdded, "Date Added")
            .with(Field::Tags, "Bookshelves")
            .with(Field::Shelf, "Exclusive Shelf")
    }

    fn clean_value(&self, raw: &str) -> String {
        let mut value = raw.trim();

        if let Some(inner) = value.strip_prefix("=\"").and_then(|v| v.strip_suffix('"')) {
            value = inner;
        }

        value.trim_matches('"').trim().to_string()
    }

    fn map_status(&self, raw: &str) -> ReadingStatus {
        match raw.trim().to_lowercase().as_str() {
            "read" => ReadingStatus::Read,
            "currently-reading" => ReadingStatus::Reading,
            "to-read" => ReadingStatus::ToRead,
            _ => ReadingStatus::ToRead,
        }
    }

    fn map_rating(&self, raw: &str) -> f64 {
        parse_five_point_rating(raw)
    }

    fn export_headers(&self) -> &'static [&'static str] {
        &EXPORT_HEADERS
    }

    fn export_row(&self, book: &Book, entry: Option<&Entry>) -> Vec<String> {
        let mut row = vec![String::new(); EXPORT_HEADERS.len()];

        // Generated UUIDs mean nothing to Goodreads
        if !is_uuid_v4(&book.id) {
            row[COL_BOOK_ID] = book.id.clone();
        }
        row[COL_TITLE] = book.title.clone();

        if let Some((first, rest)) = book.authors.split_first() {
            row[COL_AUTHOR] = first.name.clone();
            row[COL_AUTHOR_LF] = author_last_first(&first.name);
            row[COL_ADDITIONAL_AUTHORS] = rest
                .iter()
                .map(|a| a.name.as_str())
                .collect::<Vec<_>>()
                .join(", ");
        }

        if let Some(isbn10) = &book.identifiers.isbn10 {
            row[COL_ISBN] = format!("=\"{}\"", isbn10);
        }
        if let Some(isbn13) = &book.identifiers.isbn13 {
            row[COL_ISBN13] = format!("=\"\"{}\"\"", isbn13);
        }

        row[COL_MY_RATING] = match entry {
            Some(e) if e.user_data.rating > 0.0 => format!("{:.0}", e.user_data.rating),
            _ => "0".to_string(),
        };

        if let Some(edition) = &book.edition {
            row[COL_PUBLISHER] = edition.publisher.clone().unwrap_or_default();
            row[COL_PAGES] = edition.pages.map(|p| p.to_string()).unwrap_or_default();
            row[COL_YEAR_PUBLISHED] = edition.published_date.clone().unwrap_or_default();
        }

        let Some(entry) = entry else {
            return row;
        };
        let data = &entry.user_data;

        if let Some(finished) = data.read_dates.first().and_then(|d| d.finished.as_deref()) {
            if let Ok(date) = NaiveDate::parse_from_str(finished, "%Y-%m-%d") {
                row[COL_DATE_READ] = date.format("%Y/%m/%d").to_string();
            }
        }
        if let Some(added) = data.added_at {
            row[COL_DATE_ADDED] = added.format("%Y/%m/%d").to_string();
        }

        row[COL_BOOKSHELVES] = data.tags.join(", ");
        row[COL_EXCLUSIVE_SHELF] = status_to_shelf(&data.status).to_string();
        row[COL_MY_REVIEW] = data.review.clone().unwrap_or_default();
        row[COL_PRIVATE_NOTES] = data.private_notes.clone().unwrap_or_default();

        if !data.read_dates.is_empty() {
            row[COL_READ_COUNT] = data.read_dates.len().to_string();
        }
        if entry.ownership.as_ref().is_some_and(|o| o.owned) {
            row[COL_OWNED_COPIES] = "1".to_string();
        }

        row
    }
}

/// "First Middle Last" → "Last, First Middle". Single words are unchanged.
fn author_last_first(name: &str) -> String {
    let parts: Vec<&str> = name.split_whitespace().collect();
    match parts.split_last() {
        Some((last, first)) if !first.is_empty() => format!("{}, {}", last, first.join(" ")),
        _ => name.to_string(),
    }
}

/// Canonical status → Goodreads exclusive shelf.
fn status_to_shelf(status: &str) -> &'static str {
    match status {
        "read" => "read",
        "reading" => "currently-reading",
        _ => "to-read",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Author, Edition, ReadDate};
    use crate::parser::TabularData;

    fn sample_book() -> Book {
        let mut book = Book::new(
            "9780156013987",
            "The Little Prince",
            vec![Author::new("Antoine de Saint-Exupéry"), Author::new("Richard Howard")],
        );
        book.identifiers.isbn13 = Some("9780156013987".into());
        book.identifiers.isbn10 = Some("0156013987".into());
        book.edition = Some(Edition {
            publisher: Some("Harcourt".into()),
            published_date: Some("2000".into()),
            pages: Some(96),
            ..Edition::default()
        });
        book
    }

    #[test]
    fn test_clean_value_formula_wrappers() {
        let f = GoodreadsFormat;
        assert_eq!(f.clean_value("=\"0156013987\""), "0156013987");
        assert_eq!(f.clean_value("=\"\"9780156013987\"\""), "9780156013987");
        assert_eq!(f.clean_value("  9780156013987 "), "9780156013987");
        assert_eq!(f.clean_value("=\"\""), "");
    }

    #[test]
    fn test_clean_value_is_idempotent() {
        let f = GoodreadsFormat;
        for raw in ["=\"0156013987\"", "=\"\"9780156013987\"\"", "\"quoted\"", "plain", ""] {
            let once = f.clean_value(raw);
            assert_eq!(f.clean_value(&once), once, "clean_value({:?})", raw);
        }
    }

    #[test]
    fn test_map_status() {
        let f = GoodreadsFormat;
        assert_eq!(f.map_status("read"), ReadingStatus::Read);
        assert_eq!(f.map_status(" Currently-Reading "), ReadingStatus::Reading);
        assert_eq!(f.map_status("to-read"), ReadingStatus::ToRead);
        assert_eq!(f.map_status("favorites"), ReadingStatus::ToRead);
    }

    #[test]
    fn test_map_rating() {
        let f = GoodreadsFormat;
        assert_eq!(f.map_rating("4"), 4.0);
        assert_eq!(f.map_rating("0"), 0.0);
        assert_eq!(f.map_rating(""), 0.0);
        assert_eq!(f.map_rating("-1"), 0.0);
        assert_eq!(f.map_rating("7"), 5.0);
    }

    #[test]
    fn test_detect_requires_all_columns() {
        let full = TabularData::new(
            REQUIRED_COLUMNS.iter().map(|c| c.to_string()).collect(),
            vec![],
        );
        assert!(GoodreadsFormat.detect(&full));

        let partial = TabularData::new(vec!["Book Id".into(), "Title".into(), "Author".into()], vec![]);
        assert!(!GoodreadsFormat.detect(&partial));
    }

    #[test]
    fn test_export_row_with_entry() {
        let book = sample_book();
        let mut entry = Entry::new(book.id.clone(), vec!["read".into()], ReadingStatus::Reading);
        entry.user_data.rating = 4.0;
        entry.user_data.review = Some("Lovely".into());
        entry.user_data.tags = vec!["classics".into(), "french".into()];
        entry.user_data.read_dates = vec![ReadDate {
            finished: Some("2023-07-14".into()),
            ..ReadDate::default()
        }];

        let row = GoodreadsFormat.export_row(&book, Some(&entry));

        assert_eq!(row.len(), 24);
        assert_eq!(row[COL_BOOK_ID], "9780156013987");
        assert_eq!(row[COL_AUTHOR], "Antoine de Saint-Exupéry");
        assert_eq!(row[COL_AUTHOR_LF], "Saint-Exupéry, Antoine de");
        assert_eq!(row[COL_ADDITIONAL_AUTHORS], "Richard Howard");
        assert_eq!(row[COL_ISBN], "=\"0156013987\"");
        assert_eq!(row[COL_ISBN13], "=\"\"9780156013987\"\"");
        assert_eq!(row[COL_MY_RATING], "4");
        assert_eq!(row[COL_PUBLISHER], "Harcourt");
        assert_eq!(row[COL_PAGES], "96");
        assert_eq!(row[COL_DATE_READ], "2023/07/14");
        assert_eq!(row[COL_BOOKSHELVES], "classics, french");
        assert_eq!(row[COL_EXCLUSIVE_SHELF], "currently-reading");
        assert_eq!(row[COL_MY_REVIEW], "Lovely");
        assert_eq!(row[COL_READ_COUNT], "1");
    }

    #[test]
    fn test_export_row_without_entry() {
        let row = GoodreadsFormat.export_row(&sample_book(), None);

        assert_eq!(row[COL_TITLE], "The Little Prince");
        assert_eq!(row[COL_MY_RATING], "0");
        assert_eq!(row[COL_EXCLUSIVE_SHELF], "");
        assert_eq!(row[COL_DATE_ADDED], "");
        assert_eq!(row[COL_MY_REVIEW], "");
    }

    #[test]
    fn test_uuid_ids_not_exported() {
        let book = Book::new(
            "4c1b1a0e-8a3f-4d2e-9b7c-1f2e3d4c5b6a",
            "Untitled Zine",
            vec![Author::new("Anonymous")],
        );
        let row = GoodreadsFormat.export_row(&book, None);
        assert_eq!(row[COL_BOOK_ID], "");
        assert_eq!(row[COL_AUTHOR_LF], "Anonymous");
    }

    #[test]
    fn test_status_to_shelf() {
        assert_eq!(status_to_shelf("read"), "read");
        assert_eq!(status_to_shelf("reading"), "currently-reading");
        assert_eq!(status_to_shelf("wishlist"), "to-read");
        assert_eq!(status_to_shelf("abandoned"), "to-read");
    }
}
