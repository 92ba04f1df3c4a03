//! BLEF document → vendor rows.
//!
//! One row per entry. Entries whose book is missing from the document are
//! skipped and counted; [`Exporter::stats`] reports that up front so callers
//! can preview an export without writing anything.

use std::collections::HashMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use serde::Serialize;

use crate::error::ExportResult;
use crate::formats::FormatAdapter;
use crate::models::{Book, Document, Entry};

/// What an export will write (or wrote).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ExportStats {
    pub total_books: usize,
    pub total_entries: usize,
    /// Rows written, one per resolvable entry.
    pub exported: usize,
    /// Entries whose book is not in the document.
    pub skipped: usize,
}

/// Drives a document through a dialect adapter.
pub struct Exporter<'a> {
    document: &'a Document,
    adapter: &'a dyn FormatAdapter,
    books: HashMap<&'a str, &'a Book>,
}

impl<'a> Exporter<'a> {
    pub fn new(document: &'a Document, adapter: &'a dyn FormatAdapter) -> Self {
        let books = document.books.iter().map(|b| (b.id.as_str(), b)).collect();
        Self {
            document,
            adapter,
            books,
        }
    }

    /// Dry-run preview.
    pub fn stats(&self) -> ExportStats {
        let exported = self
            .document
            .entries
            .iter()
            .filter(|e| self.books.contains_key(e.book_id.as_str()))
            .count();

        ExportStats {
            total_books: self.document.books.len(),
            total_entries: self.document.entries.len(),
            exported,
            skipped: self.document.entries.len() - exported,
        }
    }

    /// Resolvable entries with their book, in document order.
    fn pairs(&self) -> impl Iterator<Item = (&'a Book, &'a Entry)> + '_ {
        self.document
            .entries
            .iter()
            .filter_map(|entry| self.books.get(entry.book_id.as_str()).map(|book| (*book, entry)))
    }

    /// Data rows, without the header.
    pub fn rows(&self) -> Vec<Vec<String>> {
        self.pairs()
            .map(|(book, entry)| self.adapter.export_row(book, Some(entry)))
            .collect()
    }

    /// Write the header and all rows as CSV.
    pub fn write_to<W: Write>(&self, writer: W) -> ExportResult<ExportStats> {
        let mut csv = csv::Writer::from_writer(writer);
        csv.write_record(self.adapter.export_headers())?;
        for row in self.rows() {
            csv.write_record(&row)?;
        }
        csv.flush()?;
        Ok(self.stats())
    }

    /// Write the export to a file, replacing it if present.
    pub fn export_to_file<P: AsRef<Path>>(&self, path: P) -> ExportResult<ExportStats> {
        let file = File::create(path.as_ref())?;
        self.write_to(file)
    }
}
