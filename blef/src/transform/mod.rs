//! Transformation module.
//!
//! This module handles CSV ⇄ BLEF conversion:
//! - Normalize: lenient value parsing (ratings, statuses, dates)
//! - Importer: tabular rows to a BLEF document
//! - Exporter: BLEF document to dialect rows
//! - Pipeline: end-to-end convert / validate / export

pub mod exporter;
pub mod importer;
pub mod normalize;
pub mod pipeline;

pub use exporter::{ExportStats, Exporter};
pub use importer::{ImportResult, Importer, SkippedRow};
pub use pipeline::*;
