//! Transformation module.
//!
//! This module turns raw rows into the views served to the dashboard:
//! - Normalizer: raw rows to typed stock records
//! - Aggregate: year, region and category/stock totals
//! - Filter: selection filtering and raw table search
//! - Pipeline: loading a dataset from a file, bytes or a URL

pub mod aggregate;
pub mod filter;
pub mod normalizer;
pub mod pipeline;

pub use aggregate::*;
pub use filter::*;
pub use normalizer::{normalize, normalize_row, normalize_with_report, NormalizeReport};
pub use pipeline::*;
