//! BLEF document validation.
//!
//! Two independent layers:
//!
//! - **Schema**: structural check of the raw JSON against the embedded
//!   draft-07 schema (`schemas/blef.schema.json`).
//! - **Domain**: rules the schema cannot express (identifier shapes, ISBN-13
//!   check digit, uniqueness, referential integrity). Every violation is
//!   collected; nothing short-circuits.
//!
//! # Example
//!
//! ```rust,ignore
//! use blef::models::Document;
//! use blef::validation::validate_document;
//!
//! let doc = Document::load_from_file("library.blef.json")?;
//! for err in validate_document(&doc) {
//!     eprintln!("  - {}", err);
//! }
//! ```

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::error::{FieldError, SchemaError};
use crate::models::{Document, ReadingStatus, FORMAT_TAG};
use crate::transform::normalize::MAX_RATING;

/// 13 digits with a 978/979 prefix.
static ISBN13_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^97[89]\d{10}$").unwrap());

/// Lowercase hyphenated UUID, version 4, RFC 4122 variant.
static UUID_V4_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9a-f]{8}-[0-9a-f]{4}-4[0-9a-f]{3}-[89ab][0-9a-f]{3}-[0-9a-f]{12}$").unwrap()
});

const BLEF_SCHEMA: &str = include_str!("../../schemas/blef.schema.json");

// =============================================================================
// Identifiers
// =============================================================================

/// Whether `id` has the ISBN-13 shape (check digit not verified).
pub fn is_isbn13_shape(id: &str) -> bool {
    ISBN13_RE.is_match(id)
}

/// Whether `id` is a lowercase UUID v4.
pub fn is_uuid_v4(id: &str) -> bool {
    UUID_V4_RE.is_match(id)
}

/// Verify the ISBN-13 check digit: weights alternate 1 and 3 over the first
/// twelve digits, and the thirteenth must bring the sum to a multiple of 10.
pub fn validate_isbn13(isbn: &str) -> bool {
    let digits: Vec<u32> = match isbn.chars().map(|c| c.to_digit(10)).collect::<Option<Vec<_>>>() {
        Some(d) if d.len() == 13 => d,
        _ => return false,
    };

    let sum: u32 = digits[..12]
        .iter()
        .enumerate()
        .map(|(i, d)| if i % 2 == 0 { *d } else { d * 3 })
        .sum();

    (10 - sum % 10) % 10 == digits[12]
}

// =============================================================================
// Domain rules
// =============================================================================

/// Check every domain rule and return all violations.
pub fn validate_document(doc: &Document) -> Vec<FieldError> {
    let mut errors = Vec::new();

    if doc.format != FORMAT_TAG {
        errors.push(FieldError::new("format", format!("must be '{}'", FORMAT_TAG)));
    }
    if doc.version.is_empty() {
        errors.push(FieldError::new("version", "is required"));
    }
    if doc.collections.is_empty() {
        errors.push(FieldError::new("collections", "must contain at least one collection"));
    }

    let mut book_ids = HashSet::new();
    for (i, book) in doc.books.iter().enumerate() {
        let field = format!("books[{}].id", i);

        if !book_ids.insert(book.id.as_str()) {
            errors.push(FieldError::new(&field, format!("duplicate book ID: {}", book.id)));
        }

        if is_isbn13_shape(&book.id) {
            if !validate_isbn13(&book.id) {
                errors.push(FieldError::new(&field, "invalid ISBN-13 check digit"));
            }
        } else if !is_uuid_v4(&book.id) {
            errors.push(FieldError::new(&field, "must be valid ISBN-13 or UUID v4"));
        }

        if book.title.is_empty() {
            errors.push(FieldError::new(format!("books[{}].title", i), "is required"));
        }
        if book.authors.is_empty() {
            errors.push(FieldError::new(
                format!("books[{}].authors", i),
                "must contain at least one author",
            ));
        }
    }

    let mut collection_ids = HashSet::new();
    for (i, collection) in doc.collections.iter().enumerate() {
        if !collection_ids.insert(collection.id.as_str()) {
            errors.push(FieldError::new(
                format!("collections[{}].id", i),
                format!("duplicate collection ID: {}", collection.id),
            ));
        }
        if collection.name.is_empty() {
            errors.push(FieldError::new(format!("collections[{}].name", i), "is required"));
        }
        if collection.kind.is_empty() {
            errors.push(FieldError::new(format!("collections[{}].type", i), "is required"));
        }
    }

    errors.extend(check_referential_integrity(doc));
    errors
}

/// Entry-level checks: book and collection references resolve, status is
/// canonical, rating is within range.
pub fn check_referential_integrity(doc: &Document) -> Vec<FieldError> {
    let book_ids: HashSet<&str> = doc.books.iter().map(|b| b.id.as_str()).collect();
    let collection_ids: HashSet<&str> = doc.collections.iter().map(|c| c.id.as_str()).collect();
    let mut errors = Vec::new();

    for (i, entry) in doc.entries.iter().enumerate() {
        if !book_ids.contains(entry.book_id.as_str()) {
            errors.push(FieldError::new(
                format!("entries[{}].book_id", i),
                format!("references non-existent book: {}", entry.book_id),
            ));
        }

        if entry.collection_ids.is_empty() {
            errors.push(FieldError::new(
                format!("entries[{}].collection_ids", i),
                "must contain at least one collection",
            ));
        }
        for (j, id) in entry.collection_ids.iter().enumerate() {
            if !collection_ids.contains(id.as_str()) {
                errors.push(FieldError::new(
                    format!("entries[{}].collection_ids[{}]", i, j),
                    format!("references non-existent collection: {}", id),
                ));
            }
        }

        let data = &entry.user_data;
        if ReadingStatus::parse(&data.status).is_none() {
            errors.push(FieldError::new(
                format!("entries[{}].user_data.status", i),
                format!("invalid status: {}", data.status),
            ));
        }
        if !(0.0..=MAX_RATING).contains(&data.rating) {
            errors.push(FieldError::new(
                format!("entries[{}].user_data.rating", i),
                "must be between 0 and 5",
            ));
        }
    }

    errors
}

// =============================================================================
// Schema
// =============================================================================

/// Validate a JSON value against a draft-07 schema.
///
/// Each violation is keyed by the JSON pointer of the offending instance
/// (`/` for the document root).
pub fn validate(schema: &Value, data: &Value) -> Result<(), SchemaError> {
    let validator = jsonschema::draft7::new(schema).map_err(|e| SchemaError::InvalidSchema(e.to_string()))?;

    let errors: Vec<FieldError> = validator
        .iter_errors(data)
        .map(|e| {
            let path = e.instance_path().as_str();
            let field = if path.is_empty() { "/" } else { path };
            FieldError::new(field, e.to_string())
        })
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(SchemaError::Violations { errors })
    }
}

/// The embedded BLEF schema.
pub fn blef_schema() -> Result<Value, SchemaError> {
    serde_json::from_str(BLEF_SCHEMA).map_err(|e| SchemaError::InvalidSchema(e.to_string()))
}

/// Validate raw document bytes against the embedded BLEF schema.
pub fn validate_against_schema(json: &[u8]) -> Result<(), SchemaError> {
    let data: Value = serde_json::from_slice(json)?;
    validate_value_against_schema(&data)
}

/// Validate an already parsed document against the embedded BLEF schema.
pub fn validate_value_against_schema(data: &Value) -> Result<(), SchemaError> {
    validate(&blef_schema()?, data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Author, Book, Collection, Entry};
    use serde_json::json;

    fn valid_document() -> Document {
        let mut doc = Document::new();
        doc.add_collection(Collection::new("default", "My Library", "custom")).unwrap();
        doc.add_book(Book::new("9780156013987", "The Little Prince", vec![Author::new("Antoine de Saint-Exupéry")]))
            .unwrap();
        doc.add_entry(Entry::new("9780156013987", vec!["default".into()], ReadingStatus::Read))
            .unwrap();
        doc
    }

    fn fields(errors: &[FieldError]) -> Vec<&str> {
        errors.iter().map(|e| e.field.as_str()).collect()
    }

    #[test]
    fn test_isbn13_check_digit() {
        assert!(validate_isbn13("9780156013987"));
        assert!(validate_isbn13("9780062316097"));
        assert!(validate_isbn13("9780439139595"));

        assert!(!validate_isbn13("1234567890123"));
        assert!(!validate_isbn13("9780156013988"));
        assert!(!validate_isbn13("978015601398X"));
        assert!(!validate_isbn13("978"));
        assert!(!validate_isbn13(""));
    }

    #[test]
    fn test_identifier_shapes() {
        assert!(is_isbn13_shape("9790000000001"));
        assert!(!is_isbn13_shape("9770000000001"));
        assert!(is_uuid_v4("4c1b1a0e-8a3f-4d2e-9b7c-1f2e3d4c5b6a"));
        assert!(!is_uuid_v4("4C1B1A0E-8A3F-4D2E-9B7C-1F2E3D4C5B6A"));
        // version nibble must be 4
        assert!(!is_uuid_v4("4c1b1a0e-8a3f-1d2e-9b7c-1f2e3d4c5b6a"));
        // variant nibble must be 8, 9, a or b
        assert!(!is_uuid_v4("4c1b1a0e-8a3f-4d2e-7b7c-1f2e3d4c5b6a"));
        assert!(is_uuid_v4(&uuid::Uuid::new_v4().to_string()));
    }

    #[test]
    fn test_valid_document() {
        assert!(validate_document(&valid_document()).is_empty());
    }

    #[test]
    fn test_document_level_rules() {
        let mut doc = valid_document();
        doc.format = "CSV".into();
        doc.version.clear();
        let errors = validate_document(&doc);

        assert!(errors.contains(&FieldError::new("format", "must be 'BLEF'")));
        assert!(errors.contains(&FieldError::new("version", "is required")));
    }

    #[test]
    fn test_zero_collections_then_fixed() {
        let mut doc = Document::new();
        doc.add_book(Book::new("9780062316097", "Sapiens", vec![Author::new("Yuval Noah Harari")]))
            .unwrap();

        let errors = validate_document(&doc);
        assert_eq!(errors, vec![FieldError::new("collections", "must contain at least one collection")]);

        doc.add_collection(Collection::new("default", "My Library", "custom")).unwrap();
        assert!(validate_document(&doc).is_empty());
    }

    #[test]
    fn test_book_rules_are_all_reported() {
        let mut doc = valid_document();
        doc.books.push(Book::new("9780156013987", "", vec![]));
        doc.books.push(Book::new("1234567890123", "Bad Id", vec![Author::new("X")]));
        doc.books.push(Book::new("9780156013988", "Bad Check", vec![Author::new("Y")]));

        let errors = validate_document(&doc);
        let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();

        assert!(messages.contains(&"books[1].id: duplicate book ID: 9780156013987".to_string()));
        assert!(messages.contains(&"books[1].title: is required".to_string()));
        assert!(messages.contains(&"books[1].authors: must contain at least one author".to_string()));
        assert!(messages.contains(&"books[2].id: must be valid ISBN-13 or UUID v4".to_string()));
        assert!(messages.contains(&"books[3].id: invalid ISBN-13 check digit".to_string()));
        assert_eq!(errors.len(), 5);
    }

    #[test]
    fn test_collection_rules() {
        let mut doc = valid_document();
        doc.collections.push(Collection::new("default", "", ""));

        let errors = validate_document(&doc);
        assert_eq!(
            fields(&errors),
            vec!["collections[1].id", "collections[1].name", "collections[1].type"]
        );
    }

    #[test]
    fn test_referential_integrity() {
        let mut doc = valid_document();
        doc.entries.push(Entry::new("9780439139595", vec![], ReadingStatus::ToRead));
        doc.entries.push(Entry::new("9780156013987", vec!["default".into(), "ghost".into()], ReadingStatus::Read));
        doc.entries[2].user_data.status = "finished".into();
        doc.entries[2].user_data.rating = 7.0;

        let errors = check_referential_integrity(&doc);
        assert_eq!(
            fields(&errors),
            vec![
                "entries[1].book_id",
                "entries[1].collection_ids",
                "entries[2].collection_ids[1]",
                "entries[2].user_data.status",
                "entries[2].user_data.rating",
            ]
        );
        assert_eq!(errors[3].message, "invalid status: finished");

        // the full validator includes the same findings
        assert_eq!(validate_document(&doc).len(), 5);
    }

    #[test]
    fn test_rating_bounds_are_inclusive() {
        let mut doc = valid_document();
        doc.entries[0].user_data.rating = 5.0;
        assert!(check_referential_integrity(&doc).is_empty());
        doc.entries[0].user_data.rating = -0.5;
        assert_eq!(check_referential_integrity(&doc).len(), 1);
    }

    #[test]
    fn test_schema_accepts_serialised_document() {
        let json = valid_document().to_json().unwrap();
        assert!(validate_against_schema(json.as_bytes()).is_ok());
    }

    #[test]
    fn test_schema_rejects_missing_fields() {
        let data = json!({
            "format": "BLEF",
            "version": "0.1.0",
            "books": [{ "id": "9780156013987" }],
            "collections": [],
            "entries": []
        });
        match validate_value_against_schema(&data) {
            Err(SchemaError::Violations { errors }) => {
                assert!(errors
                    .iter()
                    .any(|e| e.field == "/" && e.message.contains("exported_at")));
                assert!(errors
                    .iter()
                    .any(|e| e.field == "/books/0" && e.message.contains("title")));
            }
            other => panic!("expected violations, got {:?}", other),
        }
    }

    #[test]
    fn test_schema_rejects_malformed_json() {
        assert!(matches!(
            validate_against_schema(b"{ not json"),
            Err(SchemaError::InvalidJson(_))
        ));
    }

    #[test]
    fn test_schema_error_points_at_nested_value() {
        let mut value = serde_json::to_value(valid_document()).unwrap();
        value["entries"][0]["user_data"] = json!({});

        match validate_value_against_schema(&value) {
            Err(SchemaError::Violations { errors }) => {
                assert_eq!(fields(&errors), vec!["/entries/0/user_data"]);
                assert!(errors[0].message.contains("status"));
            }
            other => panic!("expected violations, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_schema_is_reported() {
        let schema = json!({ "type": "not-a-type" });
        assert!(matches!(
            validate(&schema, &json!({})),
            Err(SchemaError::InvalidSchema(_))
        ));
    }
}
