//! Error types for the BLEF conversion pipeline.
//!
//! Fatal failures are modelled as a hierarchy of error enums:
//!
//! - [`CsvError`] - tabular input errors (IO, encoding, syntax)
//! - [`DocumentError`] - BLEF document construction and (de)serialisation
//! - [`SchemaError`] - structural schema violations, aggregated
//! - [`ExportError`] - CSV export errors
//! - [`PipelineError`] - top-level orchestration errors
//!
//! Domain rule violations are *not* errors in this sense: the validator
//! returns them as a batch of [`FieldError`] records.
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use std::fmt;

use thiserror::Error;

// =============================================================================
// Field-scoped validation records
// =============================================================================

/// A single violation tied to a field path such as `books[2].id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Path of the offending field. Empty for document-wide messages.
    pub field: String,
    /// Human-readable description of the violation.
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.field.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{}: {}", self.field, self.message)
        }
    }
}

impl std::error::Error for FieldError {}

// =============================================================================
// CSV Parsing Errors
// =============================================================================

/// Errors while reading tabular input.
#[derive(Debug, Error)]
pub enum CsvError {
    /// Failed to read file.
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to decode the input bytes.
    #[error("Failed to decode content: {0}")]
    EncodingError(String),

    /// Invalid CSV syntax.
    #[error("Invalid CSV format: {0}")]
    ParseError(String),

    /// Empty input.
    #[error("CSV file is empty")]
    EmptyFile,

    /// No header row found.
    #[error("No headers found in CSV")]
    NoHeaders,
}

impl From<csv::Error> for CsvError {
    fn from(err: csv::Error) -> Self {
        CsvError::ParseError(err.to_string())
    }
}

// =============================================================================
// Document Errors
// =============================================================================

/// Errors while building, loading or saving a BLEF document.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// A book with the same ID is already registered.
    #[error("book with ID {0} already exists")]
    DuplicateBook(String),

    /// A collection with the same ID is already registered.
    #[error("collection with ID {0} already exists")]
    DuplicateCollection(String),

    /// An entry references a book that is not in the document.
    #[error("book with ID {0} does not exist")]
    UnknownBook(String),

    /// An entry references a collection that is not in the document.
    #[error("collection with ID {0} does not exist")]
    UnknownCollection(String),

    /// JSON serialisation/deserialisation failure.
    #[error("failed to parse BLEF document: {0}")]
    JsonError(#[from] serde_json::Error),

    /// IO failure.
    #[error("Document IO error: {0}")]
    IoError(#[from] std::io::Error),
}

// =============================================================================
// Schema Errors
// =============================================================================

/// Structural schema validation failures.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// The embedded schema itself could not be compiled.
    #[error("Invalid schema: {0}")]
    InvalidSchema(String),

    /// The document is not well-formed JSON.
    #[error("Invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// One or more schema violations.
    #[error("schema validation errors:\n{}", join_lines(.errors))]
    Violations { errors: Vec<FieldError> },
}

fn join_lines(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

// =============================================================================
// Export Errors
// =============================================================================

/// Errors while writing vendor CSV rows.
#[derive(Debug, Error)]
pub enum ExportError {
    /// CSV writer failure.
    #[error("Failed to write CSV: {0}")]
    CsvError(#[from] csv::Error),

    /// IO failure.
    #[error("Export IO error: {0}")]
    IoError(#[from] std::io::Error),
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level pipeline orchestration errors.
///
/// This is the error type returned by the functions in
/// [`crate::transform::pipeline`].
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Tabular input error.
    #[error("CSV error: {0}")]
    Csv(#[from] CsvError),

    /// Document error.
    #[error("Document error: {0}")]
    Document(#[from] DocumentError),

    /// Schema validation error.
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    /// Export error.
    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    /// No adapter registered under that name.
    #[error("Unknown format: {0}")]
    UnknownFormat(String),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for CSV operations.
pub type CsvResult<T> = Result<T, CsvError>;

/// Result type for document operations.
pub type DocumentResult<T> = Result<T, DocumentError>;

/// Result type for export operations.
pub type ExportResult<T> = Result<T, ExportError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;
