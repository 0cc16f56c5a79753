//! Domain models for the Stockview aggregation core.
//!
//! This module contains the core data structures used throughout the crate:
//!
//! - [`RawRow`] - Untyped row as produced by the parser
//! - [`StockRecord`] - Typed assessment record
//! - [`YearlyAggregate`], [`RegionalAggregate`], [`HierarchyNode`] - Aggregates
//! - [`YearlyComparison`], [`RegionalComparison`] - Aggregates with highlight totals
//! - [`Selection`], [`Highlight`] - Which records participate in a view

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// =============================================================================
// Records
// =============================================================================

/// A raw row: column name to value, as read from the source file.
///
/// The parser only ever stores strings, but consumers treat any other JSON
/// value as its textual form.
pub type RawRow = Map<String, Value>;

/// A typed stock assessment record.
///
/// Built once by the normalizer and never mutated afterwards. A `year` of
/// `None` and a NaN `value` mark fields that could not be parsed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockRecord {
    /// Assessment year.
    pub year: Option<i32>,
    /// Finest-grained entity, e.g. a specific fish stock.
    pub stock: String,
    /// Geographic grouping.
    pub region: String,
    /// Coarse grouping containing one or more stocks.
    pub category: String,
    /// Measured quantity.
    pub value: f64,
    /// Unit of `value`. Carried for display only.
    pub unit: String,
}

// =============================================================================
// Aggregates
// =============================================================================

/// Total value for one year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearlyAggregate {
    pub year: i32,
    pub value: f64,
}

/// Total value for one region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionalAggregate {
    pub region: String,
    pub value: f64,
}

/// Category node of the category → stock breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HierarchyNode {
    /// Category name.
    pub name: String,
    /// Sum over every record of the category.
    pub value: f64,
    /// Stocks of the category.
    pub children: Vec<HierarchyLeaf>,
}

/// Stock leaf of the category → stock breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HierarchyLeaf {
    pub name: String,
    pub value: f64,
}

/// A yearly bucket with the highlighted sub-population's total merged in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YearlyComparison {
    pub year: i32,
    pub value: f64,
    pub highlighted_value: f64,
}

/// A regional bucket with the highlighted sub-population's total merged in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionalComparison {
    pub region: String,
    pub value: f64,
    pub highlighted_value: f64,
}

// =============================================================================
// Selection
// =============================================================================

/// The durable, user-set filter.
///
/// Every field is independent: a view can be restricted by year, region
/// and category at the same time. Unset fields do not filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

impl Selection {
    /// Selection that keeps every record.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Whether no field is set.
    pub fn is_empty(&self) -> bool {
        self.year.is_none() && self.region.is_none() && self.category.is_none()
    }

    /// Whether `record` passes every set field.
    pub fn matches(&self, record: &StockRecord) -> bool {
        self.year.map_or(true, |y| record.year == Some(y))
            && self.region.as_ref().map_or(true, |r| &record.region == r)
            && self.category.as_ref().map_or(true, |c| &record.category == c)
    }
}

/// Ephemeral, hover-driven secondary filter.
///
/// Serialized as `{ "kind": "year", "value": 2016 }` or
/// `{ "kind": "region", "value": "North" }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum Highlight {
    Year(i32),
    Region(String),
}

impl Highlight {
    /// Exact equality on the highlighted dimension.
    pub fn matches(&self, record: &StockRecord) -> bool {
        match self {
            Highlight::Year(y) => record.year == Some(*y),
            Highlight::Region(r) => &record.region == r,
        }
    }
}
