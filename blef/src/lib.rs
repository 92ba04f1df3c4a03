//! # BLEF - Book Library Exchange Format converter
//!
//! Converts reading-platform library exports (Goodreads, Babelio, or any
//! CSV with recognisable headers) into a validated BLEF JSON document, and
//! exports BLEF documents back into those platforms' CSV dialects.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │   CSV File  │────▶│   Parser    │────▶│  Importer   │────▶│  BLEF JSON  │
//! │  (ISO/UTF8) │     │  (auto-enc) │     │  (dialect)  │     │ (validated) │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//!                                                                    │
//! ┌─────────────┐     ┌─────────────┐                                │
//! │ Dialect CSV │◀────│  Exporter   │◀───────────────────────────────┘
//! └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use blef::{convert_file, ConvertOptions, FormatRegistry};
//! use std::path::Path;
//!
//! let registry = FormatRegistry::with_builtin();
//! let result = convert_file(Path::new("export.csv"), &registry, &ConvertOptions::default())?;
//! println!("Imported {} books", result.document.books.len());
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`models`] - BLEF document model (Document, Book, Collection, Entry)
//! - [`parser`] - CSV parsing with auto-detection
//! - [`formats`] - Dialect adapters and their registry
//! - [`transform`] - Importer, exporter and pipeline
//! - [`validation`] - Schema and domain validation
//! - [`logs`] - Progress log broadcaster

// Core modules
pub mod error;
pub mod models;

// Parsing
pub mod parser;

// Dialects
pub mod formats;

// Transformation
pub mod transform;

// Validation
pub mod validation;

// Logging
pub mod logs;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{CsvError, DocumentError, ExportError, FieldError, PipelineError, SchemaError};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{
    Author, Book, Collection, Document, Edition, Entry, Identifiers, ReadDate, ReadingStatus, UserData,
};

// =============================================================================
// Re-exports - CSV Parsing
// =============================================================================

pub use parser::{
    decode_content, detect_delimiter, detect_encoding, parse_bytes_auto, parse_file_auto, parse_str,
    ParseResult, TabularData,
};

// =============================================================================
// Re-exports - Formats
// =============================================================================

pub use formats::{BabelioFormat, ColumnMapping, Field, FormatAdapter, FormatRegistry, GoodreadsFormat};

// =============================================================================
// Re-exports - Validation
// =============================================================================

pub use validation::{
    check_referential_integrity, is_uuid_v4, validate, validate_against_schema, validate_document,
    validate_isbn13,
};

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use transform::{ExportStats, Exporter, ImportResult, Importer, SkippedRow};

pub use transform::pipeline::{
    convert_bytes, convert_file, convert_parsed, default_convert_output, default_export_output, export_file,
    validate_file, validate_json, ConvertOptions, ConvertResult, CsvInfo, ExportOptions, ValidationReport,
};

/// Pipeline functions under a short path.
pub mod pipeline {
    pub use crate::transform::pipeline::*;
}
