//! Vendor dialect adapters.
//!
//! Each reading platform exports its library with its own column layout
//! and value conventions. A [`FormatAdapter`] captures one dialect:
//! how to recognise it, which columns feed which BLEF fields, how to
//! clean and normalise its values, and how to write rows back out.
//!
//! Adapters are collected in a caller-owned [`FormatRegistry`]. Detection
//! walks the registry in registration order and returns the first match,
//! so registration order is the tie-break when several dialects accept the
//! same header row.
//!
//! ```rust,ignore
//! use blef::formats::FormatRegistry;
//!
//! let registry = FormatRegistry::with_builtin();
//! if let Some(adapter) = registry.detect_format(&data) {
//!     println!("Detected {}", adapter.description());
//! }
//! ```

pub mod babelio;
pub mod goodreads;
pub mod mapping;

use crate::models::{Book, Entry, ReadingStatus};
use crate::parser::TabularData;

pub use babelio::BabelioFormat;
pub use goodreads::GoodreadsFormat;
pub use mapping::{ColumnMapping, Field};

/// One vendor dialect of the tabular library export.
pub trait FormatAdapter: Send + Sync {
    /// Identifier used for explicit selection (e.g. `goodreads`).
    fn name(&self) -> &'static str;

    /// Human-readable description for messages.
    fn description(&self) -> &'static str;

    /// Columns that must all be present for [`FormatAdapter::detect`] to succeed.
    fn required_columns(&self) -> &'static [&'static str];

    /// True iff every required column is in the header (case-insensitive).
    fn detect(&self, data: &TabularData) -> bool {
        self.required_columns().iter().all(|col| data.has_column(col))
    }

    /// Canonical field → column associations of this dialect.
    fn default_mapping(&self) -> ColumnMapping;

    /// Scrub dialect-specific syntax from a raw cell. Must be idempotent.
    fn clean_value(&self, raw: &str) -> String;

    /// Map dialect status vocabulary to the canonical enumeration.
    /// Unknown values map to the dialect's default rather than failing.
    fn map_status(&self, raw: &str) -> ReadingStatus;

    /// Parse a rating into `[0, 5]`.
    fn map_rating(&self, raw: &str) -> f64;

    /// Header row written on export.
    fn export_headers(&self) -> &'static [&'static str];

    /// One export row, aligned with [`FormatAdapter::export_headers`].
    /// Entry-derived cells stay empty when `entry` is `None`.
    fn export_row(&self, book: &Book, entry: Option<&Entry>) -> Vec<String>;
}

/// Ordered collection of adapters.
///
/// Build it once at start-up, then share it by reference.
#[derive(Default)]
pub struct FormatRegistry {
    formats: Vec<Box<dyn FormatAdapter>>,
}

impl FormatRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in dialects: Goodreads first, then Babelio.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(GoodreadsFormat));
        registry.register(Box::new(BabelioFormat));
        registry
    }

    /// Append an adapter. Later registrations lose detection ties.
    pub fn register(&mut self, format: Box<dyn FormatAdapter>) {
        self.formats.push(format);
    }

    /// Case-sensitive lookup by [`FormatAdapter::name`].
    pub fn get_by_name(&self, name: &str) -> Option<&dyn FormatAdapter> {
        self.formats
            .iter()
            .find(|f| f.name() == name)
            .map(|f| &**f)
    }

    /// First registered adapter whose detection accepts `data`.
    pub fn detect_format(&self, data: &TabularData) -> Option<&dyn FormatAdapter> {
        self.formats
            .iter()
            .find(|f| f.detect(data))
            .map(|f| &**f)
    }

    /// All adapters in registration order.
    pub fn all(&self) -> impl Iterator<Item = &dyn FormatAdapter> + '_ {
        self.formats.iter().map(|f| &**f)
    }

    /// Registered names in registration order.
    pub fn names(&self) -> Vec<&'static str> {
        self.formats.iter().map(|f| f.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.formats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.formats.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(cols: &[&str]) -> TabularData {
        TabularData::new(cols.iter().map(|c| c.to_string()).collect(), vec![])
    }

    /// Headers accepted by both built-in dialects.
    fn ambiguous_headers() -> TabularData {
        headers(&[
            "Book Id", "Title", "Author", "ISBN13", "My Rating", "ISBN", "Titre", "Auteur", "Statut",
        ])
    }

    #[test]
    fn test_detect_goodreads() {
        let registry = FormatRegistry::with_builtin();
        let data = headers(&["Book Id", "Title", "Author", "ISBN", "ISBN13", "My Rating", "Exclusive Shelf"]);
        assert_eq!(registry.detect_format(&data).map(|f| f.name()), Some("goodreads"));
    }

    #[test]
    fn test_detect_babelio_case_insensitive() {
        let registry = FormatRegistry::with_builtin();
        let data = headers(&["isbn", "TITRE", "Auteur", "Editeur", "statut", "Note"]);
        assert_eq!(registry.detect_format(&data).map(|f| f.name()), Some("babelio"));
    }

    #[test]
    fn test_detect_unknown() {
        let registry = FormatRegistry::with_builtin();
        assert!(registry.detect_format(&headers(&["Unknown", "Columns"])).is_none());
        // a partial Goodreads header is not enough
        assert!(registry.detect_format(&headers(&["Book Id", "Title", "Author"])).is_none());
    }

    #[test]
    fn test_detection_tie_break_is_registration_order() {
        let data = ambiguous_headers();
        assert!(GoodreadsFormat.detect(&data));
        assert!(BabelioFormat.detect(&data));

        let builtin = FormatRegistry::with_builtin();
        assert_eq!(builtin.detect_format(&data).map(|f| f.name()), Some("goodreads"));

        let mut reversed = FormatRegistry::new();
        reversed.register(Box::new(BabelioFormat));
        reversed.register(Box::new(GoodreadsFormat));
        assert_eq!(reversed.detect_format(&data).map(|f| f.name()), Some("babelio"));
    }

    #[test]
    fn test_get_by_name_is_case_sensitive() {
        let registry = FormatRegistry::with_builtin();
        assert_eq!(registry.get_by_name("babelio").map(|f| f.name()), Some("babelio"));
        assert!(registry.get_by_name("Babelio").is_none());
        assert!(registry.get_by_name("librarything").is_none());
    }

    #[test]
    fn test_names_and_len() {
        let registry = FormatRegistry::with_builtin();
        assert_eq!(registry.names(), vec!["goodreads", "babelio"]);
        assert_eq!(registry.len(), 2);
        assert!(FormatRegistry::new().is_empty());
    }

    #[test]
    fn test_export_rows_align_with_headers() {
        let book = Book::new("9780451524935", "1984", vec![crate::models::Author::new("George Orwell")]);
        for format in FormatRegistry::with_builtin().all() {
            assert_eq!(
                format.export_row(&book, None).len(),
                format.export_headers().len(),
                "{} row width",
                format.name()
            );
        }
    }
}
