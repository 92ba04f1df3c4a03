//! Domain models for BLEF (Book Library Exchange Format) documents.
//!
//! - [`Document`] - Root aggregate: books, collections and entries
//! - [`Book`] - A bibliographic work keyed by ISBN-13 or UUID v4
//! - [`Collection`] - A user shelf or list
//! - [`Entry`] - Links one book to one or more collections with user data
//! - [`ReadingStatus`] - The five canonical reading states
//!
//! Optional fields are omitted from the serialised form when empty.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{DocumentError, DocumentResult};

/// Value of the `format` tag of every BLEF document.
pub const FORMAT_TAG: &str = "BLEF";

/// Version written into freshly created documents.
pub const FORMAT_VERSION: &str = "0.1.0";

/// Free-form metadata bag attached to several entities.
pub type Metadata = BTreeMap<String, Value>;

fn is_zero(value: &f64) -> bool {
    *value == 0.0
}

fn is_false(value: &bool) -> bool {
    !*value
}

// =============================================================================
// Reading Status
// =============================================================================

/// Canonical reading status of an entry, independent of any vendor dialect.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "kebab-case")]
pub enum ReadingStatus {
    Read,
    Reading,
    ToRead,
    Abandoned,
    Wishlist,
}

impl ReadingStatus {
    /// Every canonical status, in display order.
    pub const ALL: [ReadingStatus; 5] = [
        Self::Read,
        Self::Reading,
        Self::ToRead,
        Self::Abandoned,
        Self::Wishlist,
    ];

    /// Wire representation used in BLEF documents.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Reading => "reading",
            Self::ToRead => "to-read",
            Self::Abandoned => "abandoned",
            Self::Wishlist => "wishlist",
        }
    }

    /// Parse the exact wire representation. Anything else is `None`.
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == value)
    }
}

impl std::fmt::Display for ReadingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Document
// =============================================================================

/// Root structure of a BLEF file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub format: String,
    pub version: String,
    pub exported_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub user: Option<User>,
    #[serde(default)]
    pub books: Vec<Book>,
    #[serde(default)]
    pub collections: Vec<Collection>,
    #[serde(default)]
    pub entries: Vec<Entry>,
}

/// Optional information about the library owner.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct User {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Metadata::is_empty", default)]
    pub metadata: Metadata,
}

impl Document {
    /// Create an empty document stamped with the current time.
    pub fn new() -> Self {
        Self {
            format: FORMAT_TAG.to_string(),
            version: FORMAT_VERSION.to_string(),
            exported_at: Utc::now(),
            user: None,
            books: Vec::new(),
            collections: Vec::new(),
            entries: Vec::new(),
        }
    }

    /// Register a book. Fails if a book with the same ID exists.
    pub fn add_book(&mut self, book: Book) -> DocumentResult<()> {
        if self.books.iter().any(|b| b.id == book.id) {
            return Err(DocumentError::DuplicateBook(book.id));
        }
        self.books.push(book);
        Ok(())
    }

    /// Register a collection. Fails if a collection with the same ID exists.
    pub fn add_collection(&mut self, collection: Collection) -> DocumentResult<()> {
        if self.collections.iter().any(|c| c.id == collection.id) {
            return Err(DocumentError::DuplicateCollection(collection.id));
        }
        self.collections.push(collection);
        Ok(())
    }

    /// Register an entry. Its book and every collection must already exist.
    pub fn add_entry(&mut self, entry: Entry) -> DocumentResult<()> {
        if self.book_by_id(&entry.book_id).is_none() {
            return Err(DocumentError::UnknownBook(entry.book_id));
        }
        if let Some(missing) = entry
            .collection_ids
            .iter()
            .find(|id| self.collection_by_id(id).is_none())
        {
            return Err(DocumentError::UnknownCollection(missing.clone()));
        }
        self.entries.push(entry);
        Ok(())
    }

    pub fn book_by_id(&self, id: &str) -> Option<&Book> {
        self.books.iter().find(|b| b.id == id)
    }

    pub fn collection_by_id(&self, id: &str) -> Option<&Collection> {
        self.collections.iter().find(|c| c.id == id)
    }

    /// All entries pointing at the given book.
    pub fn entries_for_book(&self, book_id: &str) -> Vec<&Entry> {
        self.entries.iter().filter(|e| e.book_id == book_id).collect()
    }

    /// Number of entries per status string, as stored.
    pub fn status_breakdown(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for entry in &self.entries {
            *counts.entry(entry.user_data.status.clone()).or_insert(0) += 1;
        }
        counts
    }

    /// Serialise with two-space indentation.
    pub fn to_json(&self) -> DocumentResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse a document from JSON bytes.
    pub fn from_json(bytes: &[u8]) -> DocumentResult<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> DocumentResult<Self> {
        let bytes = fs::read(path.as_ref())?;
        Self::from_json(&bytes)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> DocumentResult<()> {
        fs::write(path.as_ref(), self.to_json()?)?;
        Ok(())
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Book
// =============================================================================

/// A unique bibliographic work.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Book {
    /// Checksum-valid ISBN-13 or lowercase UUID v4.
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub authors: Vec<Author>,
    #[serde(default)]
    pub identifiers: Identifiers,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub cover_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub edition: Option<Edition>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub series: Option<Series>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub subjects: Vec<String>,
    #[serde(skip_serializing_if = "Metadata::is_empty", default)]
    pub metadata: Metadata,
}

impl Book {
    /// Create a book with the required fields only.
    pub fn new(id: impl Into<String>, title: impl Into<String>, authors: Vec<Author>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            subtitle: None,
            authors,
            identifiers: Identifiers::default(),
            language: None,
            description: None,
            cover_url: None,
            edition: None,
            series: None,
            subjects: Vec::new(),
            metadata: Metadata::new(),
        }
    }

    /// Name of the first listed author, if any.
    pub fn primary_author(&self) -> Option<&str> {
        self.authors.first().map(|a| a.name.as_str())
    }
}

/// A book author.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Author {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    pub identifiers: BTreeMap<String, String>,
}

impl Author {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            role: None,
            identifiers: BTreeMap::new(),
        }
    }
}

/// External identifiers of a book.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Identifiers {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub isbn13: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub isbn10: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub asin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub openlibrary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub wikidata: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub goodreads: Option<String>,
    #[serde(skip_serializing_if = "Metadata::is_empty", default)]
    pub other: Metadata,
}

/// Edition information.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Edition {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub publisher: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub published_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub pages: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub edition_number: Option<String>,
}

/// Series membership. The volume may be a number or a label like "1.5" or "II".
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Series {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub volume: Option<Value>,
}

// =============================================================================
// Collection
// =============================================================================

/// A user's shelf or list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Collection {
    pub id: String,
    pub name: String,
    /// Free-form type tag such as `read`, `to-read` or `custom`.
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_public: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Metadata::is_empty", default)]
    pub metadata: Metadata,
}

impl Collection {
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind: kind.into(),
            description: None,
            is_public: true,
            created_at: None,
            metadata: Metadata::new(),
        }
    }
}

// =============================================================================
// Entry
// =============================================================================

/// Links a book to user-specific data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entry {
    pub book_id: String,
    #[serde(default)]
    pub collection_ids: Vec<String>,
    pub user_data: UserData,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub ownership: Option<Ownership>,
    #[serde(skip_serializing_if = "Metadata::is_empty", default)]
    pub metadata: Metadata,
}

impl Entry {
    pub fn new(book_id: impl Into<String>, collection_ids: Vec<String>, status: ReadingStatus) -> Self {
        Self {
            book_id: book_id.into(),
            collection_ids,
            user_data: UserData::new(status),
            ownership: None,
            metadata: Metadata::new(),
        }
    }
}

/// User-specific state of a book.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserData {
    /// Stored as text so that documents with unknown statuses still load
    /// and can be reported by the validator.
    pub status: String,
    #[serde(skip_serializing_if = "is_zero", default)]
    pub rating: f64,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub review: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub private_notes: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "is_false", default)]
    pub favorite: bool,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub read_dates: Vec<ReadDate>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub added_at: Option<DateTime<Utc>>,
}

impl UserData {
    pub fn new(status: ReadingStatus) -> Self {
        Self {
            status: status.as_str().to_string(),
            rating: 0.0,
            review: None,
            private_notes: None,
            tags: Vec::new(),
            favorite: false,
            read_dates: Vec::new(),
            added_at: None,
        }
    }

    /// The status as a canonical value, if it is one.
    pub fn reading_status(&self) -> Option<ReadingStatus> {
        ReadingStatus::parse(&self.status)
    }
}

/// One reading of a book. Dates are `YYYY-MM-DD`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ReadDate {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub started: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub finished: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub progress: Option<u8>,
}

/// Ownership and lending state.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Ownership {
    #[serde(skip_serializing_if = "is_false", default)]
    pub owned: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub loaned: Option<Loan>,
}

/// Lending record.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Loan {
    pub status: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub to: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub notes: Option<String>,
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_document() -> Document {
        let mut doc = Document::new();
        doc.add_book(Book::new("9780156013987", "Le Petit Prince", vec![Author::new("Antoine de Saint-Exupéry")]))
            .unwrap();
        doc.add_collection(Collection::new("read", "Read", "read")).unwrap();
        doc.add_entry(Entry::new("9780156013987", vec!["read".into()], ReadingStatus::Read))
            .unwrap();
        doc
    }

    #[test]
    fn test_new_document_defaults() {
        let doc = Document::new();
        assert_eq!(doc.format, "BLEF");
        assert_eq!(doc.version, "0.1.0");
        assert!(doc.books.is_empty());
        assert!(doc.collections.is_empty());
    }

    #[test]
    fn test_duplicate_book_rejected() {
        let mut doc = sample_document();
        let err = doc
            .add_book(Book::new("9780156013987", "Dup", vec![Author::new("X")]))
            .unwrap_err();
        assert!(matches!(err, DocumentError::DuplicateBook(_)));
        assert!(err.to_string().contains("already exists"));
    }

    #[test]
    fn test_entry_requires_known_references() {
        let mut doc = sample_document();
        let err = doc
            .add_entry(Entry::new("9780062316097", vec!["read".into()], ReadingStatus::Read))
            .unwrap_err();
        assert!(matches!(err, DocumentError::UnknownBook(_)));

        let err = doc
            .add_entry(Entry::new("9780156013987", vec!["nope".into()], ReadingStatus::Read))
            .unwrap_err();
        assert!(matches!(err, DocumentError::UnknownCollection(ref id) if id == "nope"));
    }

    #[test]
    fn test_lookups() {
        let doc = sample_document();
        assert_eq!(doc.book_by_id("9780156013987").unwrap().title, "Le Petit Prince");
        assert!(doc.collection_by_id("read").is_some());
        assert_eq!(doc.entries_for_book("9780156013987").len(), 1);
        assert!(doc.entries_for_book("missing").is_empty());
    }

    #[test]
    fn test_optional_fields_omitted() {
        let doc = sample_document();
        let json: Value = serde_json::from_str(&doc.to_json().unwrap()).unwrap();

        assert!(json.get("user").is_none());
        let entry = &json["entries"][0];
        assert_eq!(entry["user_data"]["status"], "read");
        assert!(entry["user_data"].get("rating").is_none());
        assert!(entry["user_data"].get("tags").is_none());
        assert!(entry.get("ownership").is_none());
        assert_eq!(json["collections"][0]["type"], "read");
        assert!(json["books"][0].get("edition").is_none());
    }

    #[test]
    fn test_json_roundtrip_keeps_unknown_status() {
        let raw = r#"{
            "format": "BLEF",
            "version": "0.1.0",
            "exported_at": "2024-01-15T10:30:00Z",
            "books": [],
            "collections": [],
            "entries": [{
                "book_id": "x",
                "collection_ids": [],
                "user_data": { "status": "paused", "rating": 4.5 }
            }]
        }"#;
        let doc = Document::from_json(raw.as_bytes()).unwrap();
        assert_eq!(doc.entries[0].user_data.status, "paused");
        assert_eq!(doc.entries[0].user_data.reading_status(), None);
        assert_eq!(doc.entries[0].user_data.rating, 4.5);
    }

    #[test]
    fn test_status_breakdown() {
        let mut doc = sample_document();
        doc.add_book(Book::new("9780062316097", "Sapiens", vec![Author::new("Yuval Noah Harari")]))
            .unwrap();
        doc.add_entry(Entry::new("9780062316097", vec!["read".into()], ReadingStatus::Reading))
            .unwrap();

        let counts = doc.status_breakdown();
        assert_eq!(counts.get("read"), Some(&1));
        assert_eq!(counts.get("reading"), Some(&1));
    }

    #[test]
    fn test_reading_status_parse() {
        assert_eq!(ReadingStatus::parse("to-read"), Some(ReadingStatus::ToRead));
        assert_eq!(ReadingStatus::parse("wishlist"), Some(ReadingStatus::Wishlist));
        assert_eq!(ReadingStatus::parse("Read"), None);
        assert_eq!(ReadingStatus::Abandoned.to_string(), "abandoned");
    }
}
