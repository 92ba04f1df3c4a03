//! Column mapping: which source column feeds which BLEF field.
//!
//! A field without a mapping is skipped on import.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// BLEF fields that can be fed from a tabular column.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    BookId,
    Isbn13,
    Isbn10,
    Title,
    Author,
    Language,
    Publisher,
    PublishedDate,
    Pages,
    Rating,
    Review,
    Status,
    DateRead,
    DateAdded,
    Tags,
    Shelf,
}

impl Field {
    pub const ALL: [Field; 16] = [
        Field::BookId,
        Field::Isbn13,
        Field::Isbn10,
        Field::Title,
        Field::Author,
        Field::Language,
        Field::Publisher,
        Field::PublishedDate,
        Field::Pages,
        Field::Rating,
        Field::Review,
        Field::Status,
        Field::DateRead,
        Field::DateAdded,
        Field::Tags,
        Field::Shelf,
    ];

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Field::BookId => "Book ID (ISBN-13 or unique ID)",
            Field::Isbn13 => "ISBN-13",
            Field::Isbn10 => "ISBN-10",
            Field::Title => "Title",
            Field::Author => "Author",
            Field::Language => "Language",
            Field::Publisher => "Publisher",
            Field::PublishedDate => "Published Date",
            Field::Pages => "Number of Pages",
            Field::Rating => "My Rating",
            Field::Review => "My Review",
            Field::Status => "Reading Status",
            Field::DateRead => "Date Read",
            Field::DateAdded => "Date Added",
            Field::Tags => "Tags",
            Field::Shelf => "Shelf/Collection",
        }
    }

    /// Guess the field a column header most likely holds.
    pub fn guess(header: &str) -> Option<Field> {
        let lower = header.to_lowercase();
        let has = |needle: &str| lower.contains(needle);

        if has("published") || has("publication") {
            return Some(Field::PublishedDate);
        }
        if has("date") && (has("read") || has("lu") || has("lecture")) {
            return Some(Field::DateRead);
        }
        if has("date") && (has("added") || has("ajout") || has("entrée")) {
            return Some(Field::DateAdded);
        }
        if has("isbn") && has("13") {
            return Some(Field::Isbn13);
        }
        if has("isbn") {
            return Some(Field::Isbn10);
        }
        if has("title") || has("titre") {
            return Some(Field::Title);
        }
        if has("author") || has("auteur") {
            return Some(Field::Author);
        }
        if has("rating") || has("note") {
            return Some(Field::Rating);
        }
        if has("review") || has("critique") {
            return Some(Field::Review);
        }
        if has("status") || has("statut") || has("état") {
            return Some(Field::Status);
        }
        if has("shelf") || has("étagère") {
            return Some(Field::Shelf);
        }
        if has("language") || has("langue") {
            return Some(Field::Language);
        }
        if has("publisher") || has("editeur") || has("éditeur") {
            return Some(Field::Publisher);
        }
        if has("page") {
            return Some(Field::Pages);
        }
        if has("tag") {
            return Some(Field::Tags);
        }
        None
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Field → source column name table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColumnMapping {
    columns: BTreeMap<Field, String>,
}

impl ColumnMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`ColumnMapping::set`].
    pub fn with(mut self, field: Field, column: impl Into<String>) -> Self {
        self.set(field, column);
        self
    }

    /// Map `field` to `column`. An empty column name removes the mapping.
    pub fn set(&mut self, field: Field, column: impl Into<String>) {
        let column = column.into();
        if column.is_empty() {
            self.columns.remove(&field);
        } else {
            self.columns.insert(field, column);
        }
    }

    pub fn remove(&mut self, field: Field) {
        self.columns.remove(&field);
    }

    /// Source column for `field`, if mapped.
    pub fn get(&self, field: Field) -> Option<&str> {
        self.columns.get(&field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &str)> {
        self.columns.iter().map(|(f, c)| (*f, c.as_str()))
    }

    /// Apply `overrides` on top of this mapping; overriding entries win.
    pub fn merge(&mut self, overrides: &ColumnMapping) {
        for (field, column) in overrides.iter() {
            self.set(field, column);
        }
    }

    /// Build a mapping by guessing each header's field. When several
    /// headers guess the same field, the leftmost one keeps it.
    pub fn guess(headers: &[String]) -> Self {
        let mut mapping = Self::new();
        for header in headers {
            if let Some(field) = Field::guess(header) {
                if mapping.get(field).is_none() {
                    mapping.set(field, header.clone());
                }
            }
        }
        mapping
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guess_field() {
        assert_eq!(Field::guess("ISBN13"), Some(Field::Isbn13));
        assert_eq!(Field::guess("ISBN"), Some(Field::Isbn10));
        assert_eq!(Field::guess("Titre"), Some(Field::Title));
        assert_eq!(Field::guess("My Rating"), Some(Field::Rating));
        assert_eq!(Field::guess("Statut"), Some(Field::Status));
        assert_eq!(Field::guess("Date Read"), Some(Field::DateRead));
        assert_eq!(Field::guess("Date d`entrée dans Babelio"), Some(Field::DateAdded));
        assert_eq!(Field::guess("Number of Pages"), Some(Field::Pages));
        assert_eq!(Field::guess("Year Published"), Some(Field::PublishedDate));
        assert_eq!(Field::guess("Editeur"), Some(Field::Publisher));
        assert_eq!(Field::guess("Binding"), None);
    }

    #[test]
    fn test_guess_mapping_first_header_wins() {
        let headers: Vec<String> = ["Title", "Original Title", "Author", "ISBN13"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let mapping = ColumnMapping::guess(&headers);

        assert_eq!(mapping.get(Field::Title), Some("Title"));
        assert_eq!(mapping.get(Field::Author), Some("Author"));
        assert_eq!(mapping.get(Field::Isbn13), Some("ISBN13"));
        assert_eq!(mapping.get(Field::Shelf), None);
    }

    #[test]
    fn test_merge_overrides() {
        let mut base = ColumnMapping::new()
            .with(Field::Title, "Title")
            .with(Field::Shelf, "Exclusive Shelf");
        let overrides = ColumnMapping::new()
            .with(Field::Shelf, "Bookshelves")
            .with(Field::Language, "Lang");

        base.merge(&overrides);

        assert_eq!(base.get(Field::Title), Some("Title"));
        assert_eq!(base.get(Field::Shelf), Some("Bookshelves"));
        assert_eq!(base.get(Field::Language), Some("Lang"));
        assert_eq!(base.len(), 3);
    }

    #[test]
    fn test_empty_column_unmaps() {
        let mut mapping = ColumnMapping::new().with(Field::Review, "My Review");
        mapping.set(Field::Review, "");
        assert!(mapping.is_empty());
    }

    #[test]
    fn test_mapping_from_json() {
        let mapping: ColumnMapping =
            serde_json::from_str(r#"{ "title": "Name", "isbn13": "EAN", "shelf": "List" }"#).unwrap();
        assert_eq!(mapping.get(Field::Title), Some("Name"));
        assert_eq!(mapping.get(Field::Isbn13), Some("EAN"));
        assert_eq!(mapping.get(Field::Shelf), Some("List"));
    }
}
