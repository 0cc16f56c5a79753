//! # Stockview - aggregate views over fish-stock assessment records
//!
//! Stockview loads a flat table of assessment records (year, stock, region,
//! category, value, unit) and serves totals by year, by region and by
//! category → stock, under a user selection and an optional hover highlight.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  CSV / URL  │────▶│   Parser    │────▶│ Normalizer  │────▶│  Dashboard  │
//! │  (any enc)  │     │ (auto-detect│     │ (typed rows)│     │ (selection, │
//! └─────────────┘     │  delimiter) │     └─────────────┘     │  aggregates)│
//!                     └─────────────┘                         └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use stockview::{csv_to_rows, normalize, Dashboard, Highlight};
//!
//! let rows = csv_to_rows("year,region,value\n2016,North,5\n2017,South,2", ',')?;
//! let mut dashboard = Dashboard::new(normalize(&rows));
//! dashboard.select_region("North");
//! dashboard.set_highlight(Highlight::Year(2016));
//! println!("{:?}", dashboard.view());
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Error types of the I/O layer
//! - [`models`] - Records, aggregates, selection
//! - [`parser`] - CSV parsing with auto-detection
//! - [`transform`] - Normalizer, aggregator, filters, loading pipeline
//! - [`session`] - Selection state machine
//! - [`config`] - Environment configuration
//! - [`api`] - HTTP API server

// Core modules
pub mod error;
pub mod models;

// Configuration
pub mod config;

// Parsing
pub mod parser;

// Normalization, aggregation, filtering
pub mod transform;

// Selection state
pub mod session;

// HTTP API
pub mod api;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{CsvError, FetchError, LoadError, ServerError};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{
    HierarchyLeaf, HierarchyNode, Highlight, RawRow, RegionalAggregate, RegionalComparison,
    Selection, StockRecord, YearlyAggregate, YearlyComparison,
};

// =============================================================================
// Re-exports - CSV Parsing
// =============================================================================

pub use parser::{
    csv_to_rows, decode_content, detect_delimiter, detect_encoding, parse_bytes,
    parse_bytes_auto, parse_csv_file_auto, ParseResult,
};

// =============================================================================
// Re-exports - Core
// =============================================================================

pub use transform::{
    aggregate_by_region, aggregate_by_year, aggregate_hierarchy, apply_highlight,
    apply_selection, compare_by_region, compare_by_year, filter_rows, normalize,
    normalize_with_report, NormalizeReport, TableQuery,
};

pub use session::{Command, Dashboard, DashboardView, FilterOptions, HighlightedAggregates};

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use transform::pipeline::{
    load_bytes, load_file, load_source, load_url, CsvInfo, Dataset, LoadOptions,
};

// =============================================================================
// Re-exports - Configuration
// =============================================================================

pub use config::Config;

// Server
pub mod server {
    pub use crate::api::server::{router, start_server};
}
