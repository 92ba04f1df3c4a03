//! Value normalisation shared by the importer and the dialect adapters.
//!
//! Everything here is lenient: unparseable input degrades to a default or
//! to `None`, never to an error.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};

use crate::models::ReadingStatus;

/// Highest rating on the BLEF scale.
pub const MAX_RATING: f64 = 5.0;

/// Date-only layouts tried in order; the first successful parse wins.
const DATE_LAYOUTS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d/%m/%Y"];

/// Date-time layouts tried after the date-only ones.
const DATETIME_LAYOUTS: [&str; 1] = ["%Y-%m-%d %H:%M:%S"];

/// Parse a finite decimal number. A decimal comma is accepted.
pub fn parse_decimal(raw: &str) -> Option<f64> {
    let value = raw.trim();
    value
        .parse::<f64>()
        .or_else(|_| value.replace(',', ".").parse::<f64>())
        .ok()
        .filter(|v| v.is_finite())
}

/// Clamp a rating into `[0, 5]`.
pub fn clamp_rating(rating: f64) -> f64 {
    rating.clamp(0.0, MAX_RATING)
}

/// Rating for dialects whose native scale is already 5-point.
pub fn parse_five_point_rating(raw: &str) -> f64 {
    let value = raw.trim();
    if value.is_empty() || value == "0" {
        return 0.0;
    }
    parse_decimal(value).map(clamp_rating).unwrap_or(0.0)
}

/// Rating parser used when no dialect is known.
///
/// Values above 5 are assumed to be on a 10-point scale and halved.
pub fn parse_rating(raw: &str) -> f64 {
    let value = raw.trim();
    if value.is_empty() || value == "0" {
        return 0.0;
    }
    match parse_decimal(value) {
        Some(rating) if rating > MAX_RATING => clamp_rating(rating / 2.0),
        Some(rating) => clamp_rating(rating),
        None => 0.0,
    }
}

/// Map free-text status to the canonical enumeration when no dialect is known.
///
/// Specific phrases are tested before the bare word "read" so that
/// "to-read" and "currently-reading" are not taken for "read".
pub fn normalize_status(raw: &str) -> ReadingStatus {
    let value = raw.trim().to_lowercase();
    let has = |needle: &str| value.contains(needle);

    if has("abandon") {
        ReadingStatus::Abandoned
    } else if has("wish") {
        ReadingStatus::Wishlist
    } else if has("reading") || has("current") {
        ReadingStatus::Reading
    } else if has("to") && has("read") {
        ReadingStatus::ToRead
    } else if has("read") {
        ReadingStatus::Read
    } else {
        ReadingStatus::ToRead
    }
}

/// Parse a date or timestamp using the known layouts.
pub fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let value = raw.trim();
    if value.is_empty() {
        return None;
    }

    for layout in DATE_LAYOUTS {
        if let Ok(date) = NaiveDate::parse_from_str(value, layout) {
            let midnight = date.and_hms_opt(0, 0, 0)?;
            return Some(Utc.from_utc_datetime(&midnight));
        }
    }

    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Some(ts.with_timezone(&Utc));
    }

    DATETIME_LAYOUTS
        .iter()
        .find_map(|layout| NaiveDateTime::parse_from_str(value, layout).ok())
        .map(|dt| Utc.from_utc_datetime(&dt))
}

/// Collection identifier derived from a shelf name.
pub fn slugify(shelf: &str) -> String {
    shelf.to_lowercase().replace(' ', "-")
}

/// Collection type derived from a shelf name.
pub fn collection_kind(shelf: &str) -> &'static str {
    let lower = shelf.to_lowercase();
    if lower.contains("to-read") {
        "to-read"
    } else if lower.contains("reading") {
        "reading"
    } else if lower.contains("read") {
        "read"
    } else {
        "custom"
    }
}

/// Split a comma-separated tag list, dropping blanks.
pub fn split_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    #[test]
    fn test_parse_rating() {
        let cases = [
            ("5", 5.0),
            ("4.5", 4.5),
            ("0", 0.0),
            ("", 0.0),
            ("10", 5.0),
            ("8", 4.0),
            ("-1", 0.0),
            ("invalid", 0.0),
            ("NaN", 0.0),
        ];
        for (input, expected) in cases {
            assert_eq!(parse_rating(input), expected, "parse_rating({:?})", input);
        }
    }

    #[test]
    fn test_parse_five_point_rating_does_not_halve() {
        assert_eq!(parse_five_point_rating("8"), 5.0);
        assert_eq!(parse_five_point_rating("3,5"), 3.5);
        assert_eq!(parse_five_point_rating("-2"), 0.0);
    }

    #[test]
    fn test_normalize_status() {
        let cases = [
            ("read", ReadingStatus::Read),
            ("Read ", ReadingStatus::Read),
            ("reading now", ReadingStatus::Reading),
            ("currently-reading", ReadingStatus::Reading),
            ("to-read", ReadingStatus::ToRead),
            ("Want to read", ReadingStatus::ToRead),
            ("abandoned", ReadingStatus::Abandoned),
            ("wishlist", ReadingStatus::Wishlist),
            ("", ReadingStatus::ToRead),
            ("something else", ReadingStatus::ToRead),
        ];
        for (input, expected) in cases {
            assert_eq!(normalize_status(input), expected, "normalize_status({:?})", input);
        }
    }

    #[test]
    fn test_parse_date_layouts() {
        let iso = parse_date("2024-01-15").unwrap();
        assert_eq!((iso.year(), iso.month(), iso.day()), (2024, 1, 15));

        let slash = parse_date("2024/01/15").unwrap();
        assert_eq!(slash, iso);

        // US layout is tried before EU layout
        let us = parse_date("03/04/2023").unwrap();
        assert_eq!((us.month(), us.day()), (3, 4));

        // Only valid as EU
        let eu = parse_date("25/12/2023").unwrap();
        assert_eq!((eu.month(), eu.day()), (12, 25));

        let ts = parse_date("2024-01-15T10:30:00Z").unwrap();
        assert_eq!(ts.to_rfc3339(), "2024-01-15T10:30:00+00:00");

        let babelio = parse_date("2023-06-01 08:15:00").unwrap();
        assert_eq!(babelio.day(), 1);
    }

    #[test]
    fn test_parse_date_rejects_garbage() {
        assert!(parse_date("").is_none());
        assert!(parse_date("yesterday").is_none());
        assert!(parse_date("2024-13-45").is_none());
    }

    #[test]
    fn test_slug_and_kind() {
        assert_eq!(slugify("My Favourite Books"), "my-favourite-books");
        assert_eq!(collection_kind("to-read"), "to-read");
        assert_eq!(collection_kind("currently-reading"), "reading");
        assert_eq!(collection_kind("Read"), "read");
        assert_eq!(collection_kind("favorites"), "custom");
    }

    #[test]
    fn test_split_tags() {
        assert_eq!(split_tags("sci-fi, classics,,  dystopia "), vec!["sci-fi", "classics", "dystopia"]);
        assert!(split_tags(" , ").is_empty());
    }
}
