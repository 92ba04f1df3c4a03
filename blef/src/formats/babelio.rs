//! Babelio export (French reading community).
//!
//! Semicolon-separated, often Latin-1 encoded, with French status labels.

use super::{ColumnMapping, Field, FormatAdapter};
use crate::models::{Book, Entry, ReadingStatus};
use crate::transform::normalize::parse_five_point_rating;

const REQUIRED_COLUMNS: [&str; 4] = ["ISBN", "Titre", "Auteur", "Statut"];

/// Babelio spells "Date d'entrée" with a backtick.
const DATE_ADDED_COLUMN: &str = "Date d`entrée dans Babelio";

const EXPORT_HEADERS: [&str; 8] = [
    "ISBN",
    "Titre",
    "Auteur",
    "Editeur",
    "Date de publication",
    DATE_ADDED_COLUMN,
    "Statut",
    "Note",
];

/// Babelio dialect.
#[derive(Debug, Clone, Copy, Default)]
pub struct BabelioFormat;

impl FormatAdapter for BabelioFormat {
    fn name(&self) -> &'static str {
        "babelio"
    }

    fn description(&self) -> &'static str {
        "Babelio library export"
    }

    fn required_columns(&self) -> &'static [&'static str] {
        &REQUIRED_COLUMNS
    }

    fn default_mapping(&self) -> ColumnMapping {
        ColumnMapping::new()
            .with(Field::Isbn13, "ISBN")
            .with(Field::Title, "Titre")
            .with(Field::Author, "Auteur")
            .with(Field::Publisher, "Editeur")
            .with(Field::PublishedDate, "Date de publication")
            .with(Field::Rating, "Note")
            .with(Field::Status, "Statut")
            .with(Field::DateAdded, DATE_ADDED_COLUMN)
    }

    fn clean_value(&self, raw: &str) -> String {
        raw.trim().trim_matches('"').trim().to_string()
    }

    fn map_status(&self, raw: &str) -> ReadingStatus {
        match raw.trim().to_lowercase().as_str() {
            "lu" | "read" => ReadingStatus::Read,
            "en cours" | "reading" => ReadingStatus::Reading,
            "à lire" | "a lire" | "to-read" => ReadingStatus::ToRead,
            "abandonné" | "abandonne" | "abandoned" => ReadingStatus::Abandoned,
            "pense-bête" | "pense-bete" | "wishlist" => ReadingStatus::Wishlist,
            _ => ReadingStatus::ToRead,
        }
    }

    fn map_rating(&self, raw: &str) -> f64 {
        parse_five_point_rating(raw)
    }

    fn export_headers(&self) -> &'static [&'static str] {
        &EXPORT_HEADERS
    }

    fn export_row(&self, book: &Book, entry: Option<&Entry>) -> Vec<String> {
        let isbn = book
            .identifiers
            .isbn13
            .clone()
            .unwrap_or_else(|| book.id.clone());
        let authors = book
            .authors
            .iter()
            .map(|a| a.name.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        let (publisher, published) = book
            .edition
            .as_ref()
            .map(|e| {
                (
                    e.publisher.clone().unwrap_or_default(),
                    e.published_date.clone().unwrap_or_default(),
                )
            })
            .unwrap_or_default();

        let mut added = String::new();
        let mut status = String::new();
        let mut rating = String::new();
        if let Some(entry) = entry {
            let data = &entry.user_data;
            if let Some(at) = data.added_at {
                added = at.format("%Y-%m-%d %H:%M:%S").to_string();
            }
            status = status_label(&data.status).to_string();
            rating = format!("{:.1}", data.rating);
        }

        vec![
            isbn,
            book.title.clone(),
            authors,
            publisher,
            published,
            added,
            status,
            rating,
        ]
    }
}

/// Canonical status → Babelio label.
fn status_label(status: &str) -> &'static str {
    match status {
        "read" => "Lu",
        "reading" => "En cours",
        "abandoned" => "Abandonné",
        "wishlist" => "Pense-bête",
        _ => "A lire",
    }
}
