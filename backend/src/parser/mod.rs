//! CSV to raw-row parser with encoding and delimiter auto-detection.
//!
//! Turns a delimited text file into [`RawRow`]s: one JSON object per data
//! line, keyed by the header names, every value a string. No stock-specific
//! logic lives here; typing happens in [`crate::transform::normalizer`].

use serde_json::{Map, Value};
use std::collections::HashSet;
use std::path::Path;

use crate::error::{CsvError, CsvResult};
use crate::models::RawRow;

/// Candidate delimiters, in tie-break order.
const DELIMITERS: [char; 4] = [';', ',', '\t', '|'];

/// Result of parsing with metadata
#[derive(Debug, Clone)]
pub struct ParseResult {
    /// Parsed rows as JSON objects
    pub rows: Vec<RawRow>,
    /// Detected or used encoding
    pub encoding: String,
    /// Detected or used delimiter
    pub delimiter: char,
    /// Column headers, in file order
    pub headers: Vec<String>,
}

/// Detect the encoding of raw bytes using chardet
pub fn detect_encoding(bytes: &[u8]) -> String {
    let result = chardet::detect(bytes);
    let charset = result.0;

    // Normalize charset names
    match charset.to_lowercase().as_str() {
        "" | "ascii" | "utf-8" | "utf8" => "utf-8".to_string(),
        "iso-8859-1" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        other => other.to_string(),
    }
}

/// Decode bytes to a string using the given encoding label.
///
/// Unknown labels and invalid UTF-8 fall back to lossy UTF-8.
pub fn decode_content(bytes: &[u8], encoding: &str) -> String {
    match encoding.to_lowercase().as_str() {
        "utf-8" | "utf8" | "ascii" => String::from_utf8_lossy(bytes).into_owned(),
        // WHATWG maps the Latin-1 labels onto windows-1252, a superset of it
        "iso-8859-1" | "latin-1" | "latin1" | "windows-1252" | "cp1252" => {
            encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned()
        }
        label => match encoding_rs::Encoding::for_label(label.as_bytes()) {
            Some(enc) => enc.decode(bytes).0.into_owned(),
            None => String::from_utf8_lossy(bytes).into_owned(),
        },
    }
}

/// Detect the delimiter by counting occurrences in the first line
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

/// Parse CSV text into raw rows with an explicit delimiter.
///
/// # Example
/// ```ignore
/// use stockview::csv_to_rows;
///
/// let csv = "year;stock\n2016;Cod\n2017;Herring";
/// let rows = csv_to_rows(csv, ';').unwrap();
///
/// assert_eq!(rows.len(), 2);
/// assert_eq!(rows[0]["stock"], "Cod");
/// ```
pub fn csv_to_rows(csv: &str, delimiter: char) -> CsvResult<Vec<RawRow>> {
    parse_str(csv, delimiter, "utf-8".to_string()).map(|r| r.rows)
}

/// Parse CSV bytes with auto-detection of encoding and delimiter.
pub fn parse_bytes_auto(bytes: &[u8]) -> CsvResult<ParseResult> {
    parse_bytes(bytes, None)
}

/// Parse CSV bytes, auto-detecting the encoding and, unless given, the delimiter.
pub fn parse_bytes(bytes: &[u8], delimiter: Option<char>) -> CsvResult<ParseResult> {
    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding);
    let delimiter = delimiter.unwrap_or_else(|| detect_delimiter(&content));

    parse_str(&content, delimiter, encoding)
}

/// Parse a CSV file with auto-detection of encoding and delimiter.
///
/// # Example
/// ```ignore
/// let result = parse_csv_file_auto("/path/to/stocks.csv")?;
/// println!("Encoding: {}, Delimiter: '{}'", result.encoding, result.delimiter);
/// println!("Rows: {}", result.rows.len());
/// ```
pub fn parse_csv_file_auto<P: AsRef<Path>>(path: P) -> CsvResult<ParseResult> {
    let bytes = std::fs::read(path.as_ref())?;
    parse_bytes_auto(&bytes)
}

/// Parse decoded CSV text and return rows plus metadata.
///
/// Quoted fields may contain the delimiter. Rows shorter than the header are
/// padded with empty strings, extra trailing fields are ignored, and blank
/// lines are skipped. Header names are trimmed; values are kept verbatim.
/// A repeated header gets a numeric suffix (`value`, `value_2`) so no
/// column is lost.
pub fn parse_str(content: &str, delimiter: char, encoding: String) -> CsvResult<ParseResult> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    if content.trim().is_empty() {
        return Err(CsvError::EmptyFile);
    }

    let delimiter_byte = u8::try_from(delimiter)
        .ok()
        .filter(u8::is_ascii)
        .ok_or_else(|| CsvError::ParseError {
            line: 1,
            message: format!("delimiter '{}' is not a single ASCII character", delimiter),
        })?;

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter_byte)
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(content.as_bytes());

    let headers = unique_headers(reader.headers()?.iter());
    if headers.iter().all(|h| h.is_empty()) {
        return Err(CsvError::NoHeaders);
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let mut obj = Map::new();
        for (i, header) in headers.iter().enumerate() {
            let raw_value = record.get(i).unwrap_or("");
            obj.insert(header.clone(), Value::String(raw_value.to_string()));
        }
        rows.push(obj);
    }

    Ok(ParseResult {
        rows,
        encoding,
        delimiter,
        headers,
    })
}

/// Suffix repeated names with `_2`, `_3`, ... skipping names already taken.
fn unique_headers<'a>(names: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut headers = Vec::new();

    for name in names {
        let mut unique = name.to_string();
        let mut n = 2;
        while seen.contains(&unique) {
            unique = format!("{}_{}", name, n);
            n += 1;
        }
        seen.insert(unique.clone());
        headers.push(unique);
    }

    headers
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_simple_csv() {
        let csv = "year;stock\n2016;Cod\n2017;Herring";
        let rows = csv_to_rows(csv, ';').unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["year"], "2016");
        assert_eq!(rows[0]["stock"], "Cod");
        assert_eq!(rows[1]["year"], "2017");
        assert_eq!(rows[1]["stock"], "Herring");
    }

    #[test]
    fn test_quoted_values_keep_delimiter() {
        let csv = "stock,region\n\"Cod, North Sea\",North";
        let rows = csv_to_rows(csv, ',').unwrap();

        assert_eq!(rows[0]["stock"], "Cod, North Sea");
        assert_eq!(rows[0]["region"], "North");
    }

    #[test]
    fn test_empty_lines_skipped() {
        let csv = "a;b\n1;2\n\n3;4\n";
        let rows = csv_to_rows(csv, ';').unwrap();

        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn test_missing_values() {
        let csv = "a;b;c\n1;;3\n4";
        let rows = csv_to_rows(csv, ';').unwrap();

        assert_eq!(rows[0]["b"], "");
        assert_eq!(rows[0]["c"], "3");
        assert_eq!(rows[1]["a"], "4");
        assert_eq!(rows[1]["c"], "");
    }

    #[test]
    fn test_extra_columns_ignored() {
        let csv = "a;b\n1;2;3;4";
        let rows = csv_to_rows(csv, ';').unwrap();

        assert_eq!(rows[0].len(), 2);
        assert_eq!(rows[0]["b"], "2");
    }

    #[test]
    fn test_values_not_trimmed_headers_trimmed() {
        let csv = " year , region \n2016, North ";
        let rows = csv_to_rows(csv, ',').unwrap();

        assert_eq!(rows[0]["region"], " North ");
    }

    #[test]
    fn test_empty_csv_error() {
        let result = csv_to_rows("", ';');
        assert!(matches!(result, Err(CsvError::EmptyFile)));
    }

    #[test]
    fn test_non_ascii_delimiter_rejected() {
        let result = csv_to_rows("a§b\n1§2", '§');
        assert!(matches!(result, Err(CsvError::ParseError { .. })));
    }

    #[test]
    fn test_detect_delimiter() {
        assert_eq!(detect_delimiter("a;b;c\n1;2;3"), ';');
        assert_eq!(detect_delimiter("a,b,c\n1,2,3"), ',');
        assert_eq!(detect_delimiter("a\tb\tc\n1\t2\t3"), '\t');
        assert_eq!(detect_delimiter("a|b|c\n1|2|3"), '|');
        assert_eq!(detect_delimiter("single"), ',');
    }

    #[test]
    fn test_auto_parse() {
        let csv = "\u{feff}year,stock,value\n2016,Cod,5\n2017,Herring,2";
        let result = parse_bytes_auto(csv.as_bytes()).unwrap();

        assert_eq!(result.delimiter, ',');
        assert_eq!(result.rows.len(), 2);
        assert_eq!(result.headers, vec!["year", "stock", "value"]);
    }

    #[test]
    fn test_explicit_delimiter_overrides_detection() {
        let csv = "a;b,c\n1;2,3";
        let result = parse_bytes(csv.as_bytes(), Some(',')).unwrap();

        assert_eq!(result.headers, vec!["a;b", "c"]);
    }

    #[test]
    fn test_latin1_decoding() {
        // "Société" in ISO-8859-1
        let bytes: &[u8] = &[0x53, 0x6F, 0x63, 0x69, 0xE9, 0x74, 0xE9];
        let decoded = decode_content(bytes, "iso-8859-1");
        assert_eq!(decoded, "Société");
    }

    #[test]
    fn test_latin1_upper_half_not_latin9() {
        // 0xA4 and 0xBD are ¤ and ½ in Latin-1 but € and œ in Latin-9
        let decoded = decode_content(&[0x41, 0xA4, 0xBD], "iso-8859-1");
        assert_eq!(decoded, "A¤½");

        let latin9 = decode_content(&[0x41, 0xA4], "iso-8859-15");
        assert_eq!(latin9, "A€");
    }

    #[test]
    fn test_duplicate_headers_kept_apart() {
        let rows = csv_to_rows("value,value\n1,2", ',').unwrap();

        assert_eq!(rows[0].len(), 2);
        assert_eq!(rows[0]["value"], "1");
        assert_eq!(rows[0]["value_2"], "2");
    }

    #[test]
    fn test_duplicate_header_suffix_skips_taken_names() {
        let result = parse_bytes(b"value,value_2,value\n1,2,3", Some(',')).unwrap();

        assert_eq!(result.headers, vec!["value", "value_2", "value_3"]);
        assert_eq!(result.rows[0]["value_3"], "3");
    }

    #[test]
    fn test_parse_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "year;region;value").unwrap();
        writeln!(file, "2016;North;5").unwrap();

        let result = parse_csv_file_auto(file.path()).unwrap();
        assert_eq!(result.delimiter, ';');
        assert_eq!(result.rows[0]["region"], "North");
    }
}
