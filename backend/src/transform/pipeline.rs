//! High-level loading API: source → raw rows → stock records.
//!
//! Combines parsing, optional download and normalization, reporting each
//! step through the log broadcaster.
//!
//! # Example
//!
//! ```rust,ignore
//! use stockview::{load_source, LoadOptions};
//! use stockview::Dashboard;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let dataset = load_source("data/stocks.csv", &LoadOptions::default()).await?;
//!     let dashboard = Dashboard::new(dataset.records.clone());
//!     println!("{} regions", dashboard.regional().len());
//!     Ok(())
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use super::normalizer::{normalize_with_report, NormalizeReport};
use crate::api::logs::{log_info, log_info_indent, log_success, log_warning};
use crate::error::{CsvError, FetchError, LoadResult};
use crate::models::{RawRow, StockRecord};
use crate::parser::{parse_bytes, ParseResult};

/// Options for loading a dataset
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoadOptions {
    /// Force a delimiter instead of detecting it
    pub delimiter: Option<char>,
}

/// CSV file information
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CsvInfo {
    pub encoding: String,
    pub delimiter: char,
    pub headers: Vec<String>,
    pub row_count: usize,
}

/// A loaded dataset: raw rows for the table view, typed records for the
/// aggregates.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub rows: Vec<RawRow>,
    pub headers: Vec<String>,
    pub records: Vec<StockRecord>,
    pub csv_info: CsvInfo,
    pub report: NormalizeReport,
}

impl Dataset {
    /// Build a dataset from already-parsed CSV.
    pub fn from_parsed(parse_result: ParseResult) -> Self {
        let csv_info = CsvInfo {
            encoding: parse_result.encoding.clone(),
            delimiter: parse_result.delimiter,
            headers: parse_result.headers.clone(),
            row_count: parse_result.rows.len(),
        };

        let (records, report) = normalize_with_report(&parse_result.rows);

        Dataset {
            rows: parse_result.rows,
            headers: parse_result.headers,
            records,
            csv_info,
            report,
        }
    }

    /// An empty dataset with no columns.
    pub fn empty() -> Self {
        Self::from_parsed(ParseResult {
            rows: Vec::new(),
            encoding: "utf-8".to_string(),
            delimiter: ',',
            headers: Vec::new(),
        })
    }
}

/// Load a dataset from a local file.
pub fn load_file(path: &Path, options: &LoadOptions) -> LoadResult<Dataset> {
    log_info(format!("📖 Reading {}...", path.display()));
    let bytes = std::fs::read(path).map_err(CsvError::from)?;
    load_bytes(&bytes, options)
}

/// Load a dataset from raw CSV bytes.
pub fn load_bytes(bytes: &[u8], options: &LoadOptions) -> LoadResult<Dataset> {
    log_info("Detecting encoding and separator...");
    let parse_result = parse_bytes(bytes, options.delimiter)?;
    log_success(format!("Detected encoding: {}", parse_result.encoding));
    log_success(format!(
        "Separator: '{}'{}",
        format_delimiter(parse_result.delimiter),
        if options.delimiter.is_some() { " (forced)" } else { "" }
    ));
    log_success(format!("Read {} rows", parse_result.rows.len()));

    log_info(format!("📋 {} columns:", parse_result.headers.len()));
    for (i, col) in parse_result.headers.iter().enumerate() {
        log_info_indent(format!("[{:2}] {}", i + 1, col), 1);
    }

    let dataset = Dataset::from_parsed(parse_result);
    print_report(&dataset.report);
    Ok(dataset)
}

/// Download and load a dataset.
pub async fn load_url(url: &str, options: &LoadOptions) -> LoadResult<Dataset> {
    log_info(format!("🌐 Fetching {}...", url));
    let response = reqwest::get(url).await.map_err(FetchError::from)?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        }
        .into());
    }

    let bytes = response.bytes().await.map_err(FetchError::from)?;
    log_success(format!("Downloaded {} bytes", bytes.len()));
    load_bytes(&bytes, options)
}

/// Load from a URL when `source` looks like one, from a file otherwise.
pub async fn load_source(source: &str, options: &LoadOptions) -> LoadResult<Dataset> {
    if is_url(source) {
        load_url(source, options).await
    } else {
        load_file(Path::new(source), options)
    }
}

/// Whether `source` should be fetched over HTTP.
pub fn is_url(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

/// Format delimiter for display
fn format_delimiter(d: char) -> String {
    match d {
        '\t' => "TAB".to_string(),
        c => c.to_string(),
    }
}

/// Surface data-quality counts without dropping rows.
fn print_report(report: &NormalizeReport) {
    log_success(format!("{} records normalized", report.rows));
    if report.malformed_year > 0 {
        log_warning(format!(
            "{} rows with unparsable year (left out of yearly totals)",
            report.malformed_year
        ));
    }
    if report.malformed_value > 0 {
        log_warning(format!(
            "{} rows with unparsable value (their totals become NaN)",
            report.malformed_value
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = "year,stock,region,category,value,unit\n\
                          2016,Cod,North,Demersal,5,kt\n\
                          2016,Haddock,South,Demersal,3,kt\n\
                          2017,Herring,North,Pelagic,2,kt\n";

    #[test]
    fn test_load_bytes() {
        let dataset = load_bytes(SAMPLE.as_bytes(), &LoadOptions::default()).unwrap();

        assert_eq!(dataset.rows.len(), 3);
        assert_eq!(dataset.records.len(), 3);
        assert_eq!(dataset.csv_info.delimiter, ',');
        assert_eq!(dataset.csv_info.row_count, 3);
        assert_eq!(dataset.headers[0], "year");
        assert_eq!(dataset.records[2].stock, "Herring");
        assert!(dataset.report.is_clean());
    }

    #[test]
    fn test_load_bytes_reports_malformed_rows() {
        let csv = "year;value\n2017;10\n2017;abc\nunknown;1\n";
        let dataset = load_bytes(csv.as_bytes(), &LoadOptions::default()).unwrap();

        assert_eq!(dataset.records.len(), 3);
        assert_eq!(dataset.report.malformed_value, 1);
        assert_eq!(dataset.report.malformed_year, 1);
    }

    #[test]
    fn test_forced_delimiter() {
        let csv = "year;stock\n2016;Cod\n";
        let options = LoadOptions {
            delimiter: Some(','),
        };
        let dataset = load_bytes(csv.as_bytes(), &options).unwrap();

        assert_eq!(dataset.headers, vec!["year;stock"]);
        assert_eq!(dataset.records[0].year, None);
    }

    #[test]
    fn test_empty_input_is_an_error() {
        assert!(load_bytes(b"", &LoadOptions::default()).is_err());
    }

    #[test]
    fn test_header_only_file_loads_empty_dataset() {
        let dataset = load_bytes(b"year,value\n", &LoadOptions::default()).unwrap();
        assert!(dataset.records.is_empty());
        assert_eq!(dataset.headers.len(), 2);
    }

    #[test]
    fn test_is_url() {
        assert!(is_url("https://example.org/stocks.csv"));
        assert!(is_url("http://localhost:8000/a.csv"));
        assert!(!is_url("data/stocks.csv"));
    }

    #[tokio::test]
    async fn test_load_source_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let path = file.path().to_string_lossy().to_string();
        let dataset = load_source(&path, &LoadOptions::default()).await.unwrap();
        assert_eq!(dataset.records.len(), 3);
    }

    #[tokio::test]
    async fn test_load_source_missing_file() {
        let result = load_source("/nonexistent/stocks.csv", &LoadOptions::default()).await;
        assert!(result.is_err());
    }
}
