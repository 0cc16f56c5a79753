//! Raw rows to typed stock records.
//!
//! Coercion is best-effort and per field: a malformed year becomes `None`,
//! a malformed value becomes NaN, and the row is always kept. Text fields are
//! copied verbatim.

use serde::Serialize;
use serde_json::Value;
use std::borrow::Cow;

use crate::models::{RawRow, StockRecord};

/// Column names read by the normalizer.
pub mod columns {
    pub const YEAR: &str = "year";
    pub const STOCK: &str = "stock";
    pub const REGION: &str = "region";
    pub const CATEGORY: &str = "category";
    pub const VALUE: &str = "value";
    pub const UNIT: &str = "unit";
}

/// Data-quality counts collected while normalizing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizeReport {
    /// Rows normalized.
    pub rows: usize,
    /// Rows whose year could not be parsed.
    pub malformed_year: usize,
    /// Rows whose value could not be parsed.
    pub malformed_value: usize,
}

impl NormalizeReport {
    pub fn is_clean(&self) -> bool {
        self.malformed_year == 0 && self.malformed_value == 0
    }
}

/// Convert raw rows into stock records, one per row, in order.
pub fn normalize(rows: &[RawRow]) -> Vec<StockRecord> {
    rows.iter().map(normalize_row).collect()
}

/// Same as [`normalize`], also counting malformed fields.
pub fn normalize_with_report(rows: &[RawRow]) -> (Vec<StockRecord>, NormalizeReport) {
    let mut report = NormalizeReport {
        rows: rows.len(),
        ..NormalizeReport::default()
    };

    let records = normalize(rows);
    for record in &records {
        if record.year.is_none() {
            report.malformed_year += 1;
        }
        if record.value.is_nan() {
            report.malformed_value += 1;
        }
    }

    (records, report)
}

/// Convert a single raw row.
pub fn normalize_row(row: &RawRow) -> StockRecord {
    StockRecord {
        year: parse_year(&field(row, columns::YEAR)),
        stock: field(row, columns::STOCK).into_owned(),
        region: field(row, columns::REGION).into_owned(),
        category: field(row, columns::CATEGORY).into_owned(),
        value: parse_value(&field(row, columns::VALUE)),
        unit: field(row, columns::UNIT).into_owned(),
    }
}

/// Base-10 integer parse. Surrounding whitespace is ignored.
pub fn parse_year(raw: &str) -> Option<i32> {
    raw.trim().parse::<i32>().ok()
}

/// Floating-point parse, NaN on failure. Surrounding whitespace is ignored.
pub fn parse_value(raw: &str) -> f64 {
    raw.trim().parse::<f64>().unwrap_or(f64::NAN)
}

/// Textual form of a row field; missing and null fields read as empty.
pub(crate) fn field<'a>(row: &'a RawRow, name: &str) -> Cow<'a, str> {
    match row.get(name) {
        Some(value) => value_text(value),
        None => Cow::Borrowed(""),
    }
}

/// Textual form of any JSON value.
pub(crate) fn value_text(value: &Value) -> Cow<'_, str> {
    match value {
        Value::String(s) => Cow::Borrowed(s.as_str()),
        Value::Null => Cow::Borrowed(""),
        other => Cow::Owned(other.to_string()),
    }
}
