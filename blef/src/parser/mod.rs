//! Generic tabular reader with encoding and delimiter auto-detection.
//!
//! Produces a header row plus string rows. No BLEF-specific logic here.

use std::path::Path;

use serde_json::{Map, Value};

use crate::error::{CsvError, CsvResult};

/// Delimiters tried by [`detect_delimiter`], in tie-break order.
const DELIMITERS: [char; 4] = [',', ';', '\t', '|'];

/// Parsed tabular data: one header row and the data rows beneath it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TabularData {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    /// Source line where each row starts (1-based, header is line 1).
    /// Empty for tables built in memory.
    pub lines: Vec<u64>,
}

impl TabularData {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self {
            headers,
            rows,
            lines: Vec::new(),
        }
    }

    /// 1-based source line of row `idx`. Tables without recorded positions
    /// assume one line per row.
    pub fn line_of(&self, idx: usize) -> u64 {
        self.lines.get(idx).copied().unwrap_or(idx as u64 + 2)
    }

    /// Index of a column by name (case-insensitive exact match).
    pub fn column_index(&self, name: &str) -> Option<usize> {
        let wanted = name.to_lowercase();
        self.headers.iter().position(|h| h.to_lowercase() == wanted)
    }

    /// Whether a column with this name exists.
    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Cell of `row` under `column`, or `""` when the column is unknown or
    /// the row is shorter than the header.
    pub fn value<'a>(&self, row: &'a [String], column: &str) -> &'a str {
        if column.is_empty() {
            return "";
        }
        self.column_index(column)
            .and_then(|i| row.get(i))
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Rows as JSON objects keyed by header, for debugging output.
    pub fn to_records(&self) -> Vec<Value> {
        self.rows
            .iter()
            .map(|row| {
                let mut obj = Map::new();
                for (i, header) in self.headers.iter().enumerate() {
                    let cell = row.get(i).map(String::as_str).unwrap_or("");
                    obj.insert(header.clone(), Value::String(cell.to_string()));
                }
                Value::Object(obj)
            })
            .collect()
    }
}

/// Result of parsing with metadata
#[derive(Debug, Clone)]
pub struct ParseResult {
    /// Header and rows
    pub data: TabularData,
    /// Detected encoding
    pub encoding: String,
    /// Detected delimiter
    pub delimiter: char,
}

/// Detect the encoding of raw bytes.
///
/// Valid UTF-8 is reported as such; anything else goes through chardet and
/// is folded into one of the single-byte Latin encodings.
pub fn detect_encoding(bytes: &[u8]) -> String {
    if std::str::from_utf8(bytes).is_ok() {
        return "utf-8".to_string();
    }

    let charset = chardet::detect(bytes).0;
    match charset.to_lowercase().as_str() {
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        _ => "iso-8859-1".to_string(),
    }
}

/// Decode bytes to a string using the given encoding.
pub fn decode_content(bytes: &[u8], encoding: &str) -> CsvResult<String> {
    let content = match encoding.to_lowercase().as_str() {
        "utf-8" | "utf8" | "ascii" => String::from_utf8(bytes.to_vec())
            .map_err(|e| CsvError::EncodingError(e.to_string()))?,
        "windows-1252" | "cp1252" => encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned(),
        "iso-8859-1" | "latin-1" | "latin1" => encoding_rs::mem::decode_latin1(bytes).into_owned(),
        other => return Err(CsvError::EncodingError(format!("unsupported encoding '{}'", other))),
    };

    Ok(content.strip_prefix('\u{feff}').map(str::to_string).unwrap_or(content))
}

/// Detect the delimiter by counting occurrences in the first line.
///
/// The delimiter with the highest count wins; ties keep the earlier one in
/// `, ; \t |` order, and a line with none of them yields a comma.
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().next().unwrap_or("");

    let mut best_sep = ',';
    let mut best_count = 0;

    for &sep in &DELIMITERS {
        let count = first_line.matches(sep).count();
        if count > best_count {
            best_count = count;
            best_sep = sep;
        }
    }

    best_sep
}

/// Parse decoded CSV content with an explicit delimiter.
pub fn parse_str(content: &str, delimiter: char) -> CsvResult<TabularData> {
    if content.trim().is_empty() {
        return Err(CsvError::EmptyFile);
    }
    if !delimiter.is_ascii() {
        return Err(CsvError::ParseError(format!("delimiter '{}' is not ASCII", delimiter)));
    }

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter as u8)
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    if headers.iter().all(|h| h.is_empty()) {
        return Err(CsvError::NoHeaders);
    }

    let mut rows = Vec::new();
    let mut lines = Vec::new();
    for record in reader.records() {
        let record = record?;
        let line = record.position().map(|p| p.line()).unwrap_or(rows.len() as u64 + 2);
        lines.push(line);
        rows.push(record.iter().map(str::to_string).collect());
    }

    Ok(TabularData { headers, rows, lines })
}

/// Parse CSV bytes with auto-detection of encoding and delimiter.
pub fn parse_bytes_auto(bytes: &[u8]) -> CsvResult<ParseResult> {
    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding)?;
    let delimiter = detect_delimiter(&content);
    let data = parse_str(&content, delimiter)?;

    Ok(ParseResult {
        data,
        encoding,
        delimiter,
    })
}

/// Parse a CSV file with auto-detection of encoding and delimiter.
pub fn parse_file_auto<P: AsRef<Path>>(path: P) -> CsvResult<ParseResult> {
    let bytes = std::fs::read(path.as_ref())?;
    parse_bytes_auto(&bytes)
}
