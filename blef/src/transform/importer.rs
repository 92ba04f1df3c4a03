//! Tabular rows → BLEF document.
//!
//! The importer walks the rows once, building one [`Book`] and one [`Entry`]
//! per usable row. Row-level anomalies never abort the run: unparseable
//! numbers and dates leave the field unset, rows without a title are
//! skipped, and registration conflicts are logged as warnings.

use uuid::Uuid;

use super::normalize::{collection_kind, normalize_status, parse_date, parse_rating, slugify, split_tags};
use crate::error::DocumentError;
use crate::formats::{ColumnMapping, Field, FormatAdapter};
use crate::logs::log_warning;
use crate::models::{Author, Book, Collection, Document, Edition, Entry, ReadDate, ReadingStatus};
use crate::parser::TabularData;

/// Shelf used when a row names none.
pub const DEFAULT_SHELF: &str = "default";

/// Author recorded when the author cell is blank.
pub const UNKNOWN_AUTHOR: &str = "Unknown";

/// A row that did not produce a book.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRow {
    /// 1-based line number in the source file (header is line 1).
    pub row: u64,
    pub reason: String,
}

/// Outcome of an import run.
#[derive(Debug, Clone)]
pub struct ImportResult {
    pub document: Document,
    /// Rows that produced an entry.
    pub imported: usize,
    /// Rows that repeated an already registered book ID.
    pub duplicates: usize,
    pub skipped: Vec<SkippedRow>,
}

/// Builds a [`Document`] from tabular data with a column mapping and an
/// optional dialect adapter.
pub struct Importer<'a> {
    data: &'a TabularData,
    mapping: ColumnMapping,
    adapter: Option<&'a dyn FormatAdapter>,
}

impl<'a> Importer<'a> {
    /// Use the adapter's default mapping, or a guessed one when no adapter
    /// is given.
    pub fn new(data: &'a TabularData, adapter: Option<&'a dyn FormatAdapter>) -> Self {
        let mapping = match adapter {
            Some(format) => format.default_mapping(),
            None => ColumnMapping::guess(&data.headers),
        };
        Self {
            data,
            mapping,
            adapter,
        }
    }

    /// Replace the mapping entirely.
    pub fn with_mapping(mut self, mapping: ColumnMapping) -> Self {
        self.mapping = mapping;
        self
    }

    /// Apply overrides on top of the current mapping.
    pub fn with_overrides(mut self, overrides: &ColumnMapping) -> Self {
        self.mapping.merge(overrides);
        self
    }

    pub fn mapping(&self) -> &ColumnMapping {
        &self.mapping
    }

    /// Run the import.
    pub fn import(&self) -> ImportResult {
        let mut result = ImportResult {
            document: Document::new(),
            imported: 0,
            duplicates: 0,
            skipped: Vec::new(),
        };

        for (idx, row) in self.data.rows.iter().enumerate() {
            let line = self.data.line_of(idx);

            if row.iter().all(|cell| cell.trim().is_empty()) {
                continue;
            }

            let Some(book) = self.build_book(row) else {
                result.skipped.push(SkippedRow {
                    row: line,
                    reason: "missing title".to_string(),
                });
                continue;
            };
            let book_id = book.id.clone();

            match result.document.add_book(book) {
                Ok(()) => {}
                Err(DocumentError::DuplicateBook(_)) => result.duplicates += 1,
                Err(e) => log_warning(format!("Row {}: failed to add book: {}", line, e)),
            }

            let collection = self.resolve_collection(row);
            let collection_id = collection.id.clone();
            if result.document.collection_by_id(&collection_id).is_none() {
                if let Err(e) = result.document.add_collection(collection) {
                    log_warning(format!("Row {}: failed to add collection: {}", line, e));
                }
            }

            let entry = self.build_entry(row, book_id, collection_id);
            match result.document.add_entry(entry) {
                Ok(()) => result.imported += 1,
                Err(e) => log_warning(format!("Row {}: failed to add entry: {}", line, e)),
            }
        }

        if result.document.collections.is_empty() {
            result
                .document
                .collections
                .push(Collection::new(DEFAULT_SHELF, "My Library", "custom"));
        }

        result
    }

    fn value<'r>(&self, row: &'r [String], field: Field) -> &'r str {
        match self.mapping.get(field) {
            Some(column) => self.data.value(row, column).trim(),
            None => "",
        }
    }

    fn cleaned(&self, row: &[String], field: Field) -> String {
        let raw = self.value(row, field);
        match self.adapter {
            Some(format) => format.clean_value(raw),
            None => raw.to_string(),
        }
    }

    fn build_book(&self, row: &[String]) -> Option<Book> {
        let title = self.value(row, Field::Title);
        if title.is_empty() {
            return None;
        }

        let isbn13 = self.cleaned(row, Field::Isbn13);
        let isbn10 = self.cleaned(row, Field::Isbn10);

        // ISBN-10 is never a primary key
        let id = [self.cleaned(row, Field::BookId), isbn13.clone()]
            .into_iter()
            .find(|v| !v.is_empty())
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let author = match self.value(row, Field::Author) {
            "" => UNKNOWN_AUTHOR,
            name => name,
        };

        let mut book = Book::new(id, title, vec![Author::new(author)]);
        book.identifiers.isbn13 = non_empty(isbn13);
        book.identifiers.isbn10 = non_empty(isbn10);
        book.language = non_empty(self.value(row, Field::Language).to_string());

        let publisher = self.value(row, Field::Publisher);
        let published = self.value(row, Field::PublishedDate);
        let pages = self.value(row, Field::Pages);
        if !publisher.is_empty() || !published.is_empty() || !pages.is_empty() {
            book.edition = Some(Edition {
                publisher: non_empty(publisher.to_string()),
                published_date: non_empty(published.to_string()),
                pages: pages.parse::<u32>().ok(),
                ..Edition::default()
            });
        }

        Some(book)
    }

    fn resolve_collection(&self, row: &[String]) -> Collection {
        let shelf = match self.value(row, Field::Shelf) {
            "" => DEFAULT_SHELF,
            name => name,
        };
        Collection::new(slugify(shelf), shelf, collection_kind(shelf))
    }

    fn build_entry(&self, row: &[String], book_id: String, collection_id: String) -> Entry {
        let raw_status = self.value(row, Field::Status);
        let status: ReadingStatus = match self.adapter {
            Some(format) => format.map_status(raw_status),
            None => normalize_status(raw_status),
        };

        let mut entry = Entry::new(book_id, vec![collection_id], status);
        let data = &mut entry.user_data;

        let rating = self.value(row, Field::Rating);
        if !rating.is_empty() {
            data.rating = match self.adapter {
                Some(format) => format.map_rating(rating),
                None => parse_rating(rating),
            };
        }

        data.review = non_empty(self.value(row, Field::Review).to_string());
        data.tags = split_tags(self.value(row, Field::Tags));
        data.added_at = parse_date(self.value(row, Field::DateAdded));

        if let Some(read) = parse_date(self.value(row, Field::DateRead)) {
            data.read_dates.push(ReadDate {
                finished: Some(read.format("%Y-%m-%d").to_string()),
                ..ReadDate::default()
            });
        }

        entry
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}
