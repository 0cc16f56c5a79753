//! Error types for the Stockview loader and server.
//!
//! The aggregation core never fails: malformed numbers become sentinels
//! (see [`crate::transform::normalizer`]). Everything here belongs to the
//! I/O layer around it:
//!
//! - [`CsvError`] - CSV reading and parsing errors
//! - [`FetchError`] - HTTP download errors
//! - [`LoadError`] - "failed to load dataset", wraps the two above
//! - [`ServerError`] - HTTP server errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use thiserror::Error;

// =============================================================================
// CSV Parsing Errors
// =============================================================================

/// Errors during CSV parsing.
#[derive(Debug, Error)]
pub enum CsvError {
    /// Failed to read file.
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    /// Invalid CSV format.
    #[error("Invalid CSV format at line {line}: {message}")]
    ParseError { line: u64, message: String },

    /// Empty file.
    #[error("CSV file is empty")]
    EmptyFile,

    /// No headers found.
    #[error("No headers found in CSV")]
    NoHeaders,
}

impl From<csv::Error> for CsvError {
    fn from(err: csv::Error) -> Self {
        let line = err.position().map(|p| p.line()).unwrap_or(0);
        CsvError::ParseError {
            line,
            message: err.to_string(),
        }
    }
}

// =============================================================================
// Fetch Errors
// =============================================================================

/// Errors while downloading a dataset over HTTP.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The request could not be sent or the body could not be read.
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("HTTP {status} while fetching {url}")]
    Status { url: String, status: u16 },
}

// =============================================================================
// Load Errors (top-level for the loader)
// =============================================================================

/// Failed to load a dataset.
///
/// This is the error surfaced to the user before any data reaches the
/// aggregation core.
#[derive(Debug, Error)]
pub enum LoadError {
    /// CSV parsing error.
    #[error("CSV error: {0}")]
    Csv(#[from] CsvError),

    /// Download error.
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),
}

// =============================================================================
// Server Errors
// =============================================================================

/// HTTP server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Dataset could not be loaded.
    #[error("Failed to load dataset: {0}")]
    Load(#[from] LoadError),

    /// Invalid request.
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Server internal error.
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<std::io::Error> for ServerError {
    fn from(err: std::io::Error) -> Self {
        ServerError::Internal(err.to_string())
    }
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for CSV operations.
pub type CsvResult<T> = Result<T, CsvError>;

/// Result type for load operations.
pub type LoadResult<T> = Result<T, LoadError>;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion_chain() {
        // CsvError -> LoadError
        let csv_err = CsvError::EmptyFile;
        let load_err: LoadError = csv_err.into();
        assert!(load_err.to_string().contains("empty"));

        // LoadError -> ServerError
        let server_err: ServerError = load_err.into();
        assert!(server_err.to_string().starts_with("Failed to load dataset"));
    }

    #[test]
    fn test_fetch_status_format() {
        let err = FetchError::Status {
            url: "https://example.org/stocks.csv".into(),
            status: 404,
        };
        let msg = err.to_string();
        assert!(msg.contains("404"));
        assert!(msg.contains("stocks.csv"));
    }

    #[test]
    fn test_parse_error_format() {
        let err = CsvError::ParseError {
            line: 7,
            message: "unequal lengths".into(),
        };
        assert_eq!(err.to_string(), "Invalid CSV format at line 7: unequal lengths");
    }
}
