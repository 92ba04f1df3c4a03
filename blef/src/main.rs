//! BLEF CLI - Convert reading-platform exports to and from BLEF
//!
//! # Main Commands
//!
//! ```bash
//! blef-cli convert goodreads_library_export.csv   # CSV → library.blef.json
//! blef-cli export library.blef.json -f babelio    # BLEF → Babelio CSV
//! blef-cli validate library.blef.json             # Schema + business rules
//! ```
//!
//! # Debug Commands
//!
//! ```bash
//! blef-cli parse input.csv         # Dump detected encoding/delimiter and rows as JSON
//! blef-cli formats                 # List supported dialects
//! ```

use clap::{Parser, Subcommand};
use blef::logs::{set_quiet, LOG_BROADCASTER};
use blef::pipeline::{format_delimiter, print_export_preview};
use blef::{
    convert_file, default_convert_output, default_export_output, export_file, parse_file_auto, validate_file,
    ColumnMapping, ConvertOptions, Document, ExportOptions, Exporter, FormatRegistry,
};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "blef-cli")]
#[command(version)]
#[command(about = "Convert book library exports to and from BLEF", long_about = None)]
struct Cli {
    /// Silence pipeline progress logs
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a CSV export to a BLEF document
    Convert {
        /// Input CSV file
        input: PathBuf,

        /// Output file (default: <input>.blef.json)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Force format (goodreads, babelio) instead of auto-detection
        #[arg(short, long)]
        format: Option<String>,

        /// Skip validation after conversion
        #[arg(long)]
        no_validate: bool,

        /// JSON object of field → column overrides, e.g. '{"shelf": "Bookshelves"}'
        #[arg(long)]
        mapping: Option<String>,

        /// Write the run's log entries as JSON to this file
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Export a BLEF document to a platform CSV
    Export {
        /// Input BLEF file
        input: PathBuf,

        /// Export format (goodreads, babelio)
        #[arg(short, long)]
        format: String,

        /// Output file (default: <input>-<format>.csv)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Only show what would be exported
        #[arg(long)]
        dry_run: bool,
    },

    /// Validate a BLEF document
    Validate {
        /// Input BLEF file
        input: PathBuf,
    },

    /// Parse a CSV file and output JSON
    Parse {
        /// Input CSV file
        input: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List supported formats
    Formats,
}

fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    set_quiet(cli.quiet);

    let registry = FormatRegistry::with_builtin();

    let result = match cli.command {
        Commands::Convert {
            input,
            output,
            format,
            no_validate,
            mapping,
            report,
        } => cmd_convert(
            &registry,
            &input,
            output,
            format,
            no_validate,
            mapping.as_deref(),
            report.as_deref(),
        ),

        Commands::Export {
            input,
            format,
            output,
            dry_run,
        } => cmd_export(&registry, &input, &format, output, dry_run),

        Commands::Validate { input } => cmd_validate(&input),

        Commands::Parse { input, output } => cmd_parse(&input, output.as_deref()),

        Commands::Formats => cmd_formats(&registry),
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn cmd_convert(
    registry: &FormatRegistry,
    input: &Path,
    output: Option<PathBuf>,
    format: Option<String>,
    no_validate: bool,
    mapping: Option<&str>,
    report: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let output = output.unwrap_or_else(|| default_convert_output(input));

    // CLI flags override the environment
    let mut options = ConvertOptions::from_env();
    if let Some(name) = format {
        options.format = Some(name);
    }
    options.format = options.format.map(|name| name.to_lowercase());
    options.skip_validation |= no_validate;
    if let Some(json) = mapping {
        let overrides: ColumnMapping = serde_json::from_str(json)?;
        options.mapping_overrides = Some(overrides);
    }

    eprintln!("📥 Converting CSV to BLEF format");
    eprintln!("   Input:  {}", input.display());
    eprintln!("   Output: {}\n", output.display());

    let capture = LOG_BROADCASTER.capture();
    let result = convert_file(input, registry, &options)?;
    let logs = capture.drain();

    result.document.save_to_file(&output)?;
    eprintln!("\n💾 Written to: {}", output.display());
    eprintln!(
        "   {} books, {} collections, {} entries",
        result.document.books.len(),
        result.document.collections.len(),
        result.document.entries.len()
    );
    if !result.skipped.is_empty() {
        eprintln!("   ⚠️  {} rows skipped", result.skipped.len());
    }

    if let Some(path) = report {
        fs::write(path, serde_json::to_string_pretty(&logs)?)?;
        eprintln!("📝 Report ({} warnings) written to: {}", logs.problems().count(), path.display());
    }

    eprintln!("\n✨ Done! Validate it with:\n   blef-cli validate {}", output.display());
    Ok(())
}

fn cmd_export(
    registry: &FormatRegistry,
    input: &Path,
    format: &str,
    output: Option<PathBuf>,
    dry_run: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let format = format.to_lowercase();

    let Some(adapter) = registry.get_by_name(&format) else {
        return Err(format!(
            "Unknown export format: {} (available: {})",
            format,
            registry.names().join(", ")
        )
        .into());
    };

    if dry_run {
        let document = Document::load_from_file(input)?;
        print_export_preview(&Exporter::new(&document, adapter).stats());
        return Ok(());
    }

    let output = output.unwrap_or_else(|| default_export_output(input, &format));
    eprintln!("📤 Exporting BLEF to CSV format");
    eprintln!("   Input:  {}", input.display());
    eprintln!("   Output: {}", output.display());
    eprintln!("   Format: {}\n", format);

    let stats = export_file(input, &output, registry, &ExportOptions::new(&format))?;

    eprintln!("\n✅ Exported {} rows to {}", stats.exported, output.display());
    Ok(())
}

fn cmd_validate(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("✔️  Validating: {}", input.display());

    let report = validate_file(input)?;
    let doc = &report.document;

    eprintln!("\n📊 Statistics:");
    eprintln!("   Format:      {} {}", doc.format, doc.version);
    eprintln!("   Books:       {}", doc.books.len());
    eprintln!("   Collections: {}", doc.collections.len());
    eprintln!("   Entries:     {}", doc.entries.len());

    let breakdown = doc.status_breakdown();
    if !breakdown.is_empty() {
        eprintln!("\n📚 Reading status:");
        for (status, count) in &breakdown {
            eprintln!("   {:<10} {}", status, count);
        }
    }

    if !report.is_valid() {
        eprintln!("\n❌ {} errors:", report.errors.len());
        for err in &report.errors {
            eprintln!("   - {}", err);
        }
        std::process::exit(1);
    }

    eprintln!("\n✅ Document is valid");
    Ok(())
}

fn cmd_parse(input: &Path, output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Parsing CSV: {}", input.display());

    let result = parse_file_auto(input)?;

    eprintln!("   Encoding: {}", result.encoding);
    eprintln!("   Delimiter: '{}' (auto-detected)", format_delimiter(result.delimiter));
    eprintln!("   Columns: {}", result.data.headers.join(", "));
    eprintln!("✅ Parsed {} records", result.data.rows.len());

    let json = serde_json::to_string_pretty(&result.data.to_records())?;
    write_output(&json, output)?;

    Ok(())
}

fn cmd_formats(registry: &FormatRegistry) -> Result<(), Box<dyn std::error::Error>> {
    for format in registry.all() {
        println!("  📄 {} - {}", format.name(), format.description());
        println!("     Required columns: {}", format.required_columns().join(", "));
    }
    Ok(())
}

fn write_output(content: &str, path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            fs::write(p, content)?;
            eprintln!("💾 Output written to: {}", p.display());
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
