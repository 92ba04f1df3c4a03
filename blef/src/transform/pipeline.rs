//! High-level pipeline API.
//!
//! Combines the steps behind each CLI command:
//!
//! - **convert**: parse CSV → select dialect → import → validate
//! - **validate**: schema check → domain rules
//! - **export**: load document → dialect rows → CSV file
//!
//! # Example
//!
//! ```rust,ignore
//! use blef::formats::FormatRegistry;
//! use blef::pipeline::{convert_file, ConvertOptions};
//! use std::path::Path;
//!
//! let registry = FormatRegistry::with_builtin();
//! let result = convert_file(Path::new("goodreads_library_export.csv"), &registry, &ConvertOptions::from_env())?;
//! result.document.save_to_file("library.blef.json")?;
//! ```

use std::env;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;

use super::exporter::{ExportStats, Exporter};
use super::importer::{Importer, SkippedRow};
use crate::error::{DocumentError, FieldError, PipelineError, PipelineResult, SchemaError};
use crate::formats::{ColumnMapping, FormatAdapter, FormatRegistry};
use crate::logs::{log_error, log_info, log_info_indent, log_success, log_warning};
use crate::models::Document;
use crate::parser::{parse_bytes_auto, parse_file_auto, ParseResult, TabularData};
use crate::validation::{validate_document, validate_value_against_schema};

/// Environment variable forcing the input dialect.
pub const ENV_FORMAT: &str = "BLEF_FORMAT";

/// Environment variable disabling post-conversion validation.
pub const ENV_NO_VALIDATE: &str = "BLEF_NO_VALIDATE";

/// Options for the conversion pipeline
#[derive(Debug, Clone, Default)]
pub struct ConvertOptions {
    /// Force a dialect by name instead of detecting it
    pub format: Option<String>,

    /// Skip validation of the produced document
    pub skip_validation: bool,

    /// Column associations applied on top of the dialect (or guessed) mapping
    pub mapping_overrides: Option<ColumnMapping>,
}

impl ConvertOptions {
    /// Defaults overlaid with `BLEF_FORMAT` and `BLEF_NO_VALIDATE`, after
    /// loading `.env` if present.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();

        Self {
            format: env::var(ENV_FORMAT).ok().filter(|v| !v.trim().is_empty()),
            skip_validation: env::var(ENV_NO_VALIDATE).map(|v| is_truthy(&v)).unwrap_or(false),
            mapping_overrides: None,
        }
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "1" | "true" | "yes")
}

/// Options for the export pipeline
#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// Target dialect name
    pub format: String,
}

impl ExportOptions {
    pub fn new(format: impl Into<String>) -> Self {
        Self { format: format.into() }
    }
}

/// CSV file information
#[derive(Debug, Clone, Serialize)]
pub struct CsvInfo {
    pub encoding: String,
    pub delimiter: char,
    pub headers: Vec<String>,
    pub row_count: usize,
}

/// Result of a conversion run
#[derive(Debug, Clone)]
pub struct ConvertResult {
    /// The produced document
    pub document: Document,

    /// Dialect used, `None` when the mapping was guessed
    pub format: Option<String>,

    /// CSV parsing metadata
    pub csv_info: CsvInfo,

    /// Rows that produced an entry
    pub imported: usize,

    /// Rows that repeated a known book
    pub duplicates: usize,

    /// Rows dropped for lack of a title
    pub skipped: Vec<SkippedRow>,

    /// Domain rule violations; empty when validation was skipped
    pub validation_errors: Vec<FieldError>,
}

/// Result of validating a document
#[derive(Debug, Clone)]
pub struct ValidationReport {
    pub document: Document,
    pub errors: Vec<FieldError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

// =============================================================================
// Convert
// =============================================================================

/// Convert a CSV file to a BLEF document.
pub fn convert_file(path: &Path, registry: &FormatRegistry, options: &ConvertOptions) -> PipelineResult<ConvertResult> {
    log_info("📖 Reading CSV file...");
    let parse_result = parse_file_auto(path)?;
    convert_parsed(parse_result, registry, options)
}

/// Same as [`convert_file`] for in-memory bytes.
pub fn convert_bytes(bytes: &[u8], registry: &FormatRegistry, options: &ConvertOptions) -> PipelineResult<ConvertResult> {
    let parse_result = parse_bytes_auto(bytes)?;
    convert_parsed(parse_result, registry, options)
}

/// Convert already parsed tabular data.
pub fn convert_parsed(
    parse_result: ParseResult,
    registry: &FormatRegistry,
    options: &ConvertOptions,
) -> PipelineResult<ConvertResult> {
    let ParseResult {
        data,
        encoding,
        delimiter,
    } = parse_result;

    log_success(format!("Detected encoding: {}", encoding));
    log_success(format!("Detected separator: '{}'", format_delimiter(delimiter)));
    log_success(format!("Found {} rows with {} columns", data.rows.len(), data.headers.len()));

    let csv_info = CsvInfo {
        encoding,
        delimiter,
        headers: data.headers.clone(),
        row_count: data.rows.len(),
    };

    let adapter = select_format(registry, &data, options.format.as_deref())?;

    let mut importer = Importer::new(&data, adapter);
    if let Some(overrides) = &options.mapping_overrides {
        importer = importer.with_overrides(overrides);
    }
    if adapter.is_none() {
        print_mapping(importer.mapping());
    }

    log_info("🔄 Converting to BLEF format...");
    let import = importer.import();
    let doc = &import.document;
    log_success(format!(
        "Created BLEF document with {} books, {} collections, {} entries",
        doc.books.len(),
        doc.collections.len(),
        doc.entries.len()
    ));
    if import.duplicates > 0 {
        log_info_indent(format!("{} rows repeated an existing book", import.duplicates), 1);
    }
    print_skipped(&import.skipped);

    let validation_errors = if options.skip_validation {
        log_info("(validation skipped)");
        Vec::new()
    } else {
        log_info("🔍 Validating BLEF document...");
        let errors = validate_document(doc);
        if errors.is_empty() {
            log_success("Validation passed");
        } else {
            log_warning("Validation warnings:");
            for err in &errors {
                log_info_indent(format!("• {}", err), 1);
            }
        }
        errors
    };

    Ok(ConvertResult {
        format: adapter.map(|f| f.name().to_string()),
        csv_info,
        imported: import.imported,
        duplicates: import.duplicates,
        skipped: import.skipped,
        validation_errors,
        document: import.document,
    })
}

/// Forced name → lookup (unknown is an error); otherwise detection, which
/// may find nothing.
fn select_format<'r>(
    registry: &'r FormatRegistry,
    data: &TabularData,
    forced: Option<&str>,
) -> PipelineResult<Option<&'r dyn FormatAdapter>> {
    if let Some(name) = forced {
        let format = registry
            .get_by_name(name)
            .ok_or_else(|| PipelineError::UnknownFormat(name.to_string()))?;
        log_info(format!("🎯 Using format: {}", format.description()));
        return Ok(Some(format));
    }

    log_info("🔍 Detecting CSV format...");
    match registry.detect_format(data) {
        Some(format) => {
            log_success(format!("Detected format: {}", format.description()));
            Ok(Some(format))
        }
        None => {
            log_warning("Could not auto-detect format, guessing columns from headers");
            Ok(None)
        }
    }
}

/// Format delimiter for display
pub fn format_delimiter(d: char) -> String {
    match d {
        '\t' => "TAB".to_string(),
        c => c.to_string(),
    }
}

fn print_mapping(mapping: &ColumnMapping) {
    log_info("📋 Column mapping:");
    for (field, column) in mapping.iter() {
        log_info_indent(format!("{} → {}", column, field), 1);
    }
}

fn print_skipped(skipped: &[SkippedRow]) {
    if skipped.is_empty() {
        return;
    }
    log_warning(format!("{} rows skipped", skipped.len()));

    let sample: Vec<String> = skipped.iter().take(5).map(|s| s.row.to_string()).collect();
    let more = if skipped.len() > 5 {
        format!("... +{}", skipped.len() - 5)
    } else {
        String::new()
    };
    log_warning(format!("• {} (rows: {}{})", skipped[0].reason, sample.join(", "), more));
}

// =============================================================================
// Validate
// =============================================================================

/// Validate a BLEF file: schema first, then domain rules.
pub fn validate_file(path: &Path) -> PipelineResult<ValidationReport> {
    let bytes = std::fs::read(path).map_err(DocumentError::from)?;
    validate_json(&bytes)
}

/// Validate BLEF JSON bytes.
///
/// Malformed JSON and schema violations are returned as errors; domain rule
/// violations are returned in the report.
pub fn validate_json(bytes: &[u8]) -> PipelineResult<ValidationReport> {
    let value: Value = serde_json::from_slice(bytes).map_err(SchemaError::from)?;

    log_info("🔍 Checking JSON schema...");
    validate_value_against_schema(&value)?;
    log_success("Schema validation passed");

    let document: Document = serde_json::from_value(value).map_err(DocumentError::from)?;

    log_info("🔍 Checking business rules...");
    let errors = validate_document(&document);
    if errors.is_empty() {
        log_success("Business rules validation passed");
    } else {
        log_error(format!("Found {} validation errors", errors.len()));
    }

    Ok(ValidationReport { document, errors })
}

// =============================================================================
// Export
// =============================================================================

/// Export a BLEF file to a dialect CSV.
pub fn export_file(
    input: &Path,
    output: &Path,
    registry: &FormatRegistry,
    options: &ExportOptions,
) -> PipelineResult<ExportStats> {
    let format = registry
        .get_by_name(&options.format)
        .ok_or_else(|| PipelineError::UnknownFormat(options.format.clone()))?;

    log_info("📖 Reading BLEF file...");
    let document = Document::load_from_file(input)?;
    log_success(format!(
        "Loaded {} books, {} entries",
        document.books.len(),
        document.entries.len()
    ));

    let exporter = Exporter::new(&document, format);
    print_export_preview(&exporter.stats());

    log_info(format!("💾 Writing to {}...", output.display()));
    let stats = exporter.export_to_file(output)?;
    log_success("Export complete!");

    Ok(stats)
}

/// Dry-run summary.
pub fn print_export_preview(stats: &ExportStats) {
    log_info("📊 Export preview:");
    log_info_indent(format!("Total books:   {}", stats.total_books), 1);
    log_info_indent(format!("Total entries: {}", stats.total_entries), 1);
    log_info_indent(format!("Will export:   {} rows", stats.exported), 1);
    if stats.skipped > 0 {
        log_warning(format!("Skipped: {} entries (missing book data)", stats.skipped));
    }
}

// =============================================================================
// Output paths
// =============================================================================

/// `<dir>/<stem>.blef.json` next to the input.
pub fn default_convert_output(input: &Path) -> PathBuf {
    input.with_extension("blef.json")
}

/// `<dir>/<stem>-<format>.csv` next to the input. Only the last extension is
/// dropped, so `library.blef.json` gives `library.blef-goodreads.csv`.
pub fn default_export_output(input: &Path, format: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "export".to_string());
    input.with_file_name(format!("{}-{}.csv", stem, format))
}
