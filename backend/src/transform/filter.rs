//! Record filtering.
//!
//! Two independent code paths:
//!
//! - [`apply_selection`] keeps the typed records matching a [`Selection`];
//!   it feeds the aggregates.
//! - [`filter_rows`] applies a [`TableQuery`] (free-text search plus
//!   per-column substring filters) to raw rows; it feeds the table view.
//!
//! Neither mutates its input, and both preserve the relative order of
//! surviving items.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::normalizer::value_text;
use crate::models::{Highlight, RawRow, Selection, StockRecord};

/// Records passing every set field of `selection`.
pub fn apply_selection(records: &[StockRecord], selection: &Selection) -> Vec<StockRecord> {
    records
        .iter()
        .filter(|r| selection.matches(r))
        .cloned()
        .collect()
}

/// Records in the highlighted sub-population.
pub fn apply_highlight(records: &[StockRecord], highlight: &Highlight) -> Vec<StockRecord> {
    records
        .iter()
        .filter(|r| highlight.matches(r))
        .cloned()
        .collect()
}

/// Search state of the raw table view.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableQuery {
    /// Case-insensitive substring matched against every field.
    #[serde(default)]
    pub search: Option<String>,
    /// Column name to case-insensitive substring.
    #[serde(default)]
    pub columns: BTreeMap<String, String>,
}

impl TableQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn with_column(mut self, column: impl Into<String>, needle: impl Into<String>) -> Self {
        self.columns.insert(column.into(), needle.into());
        self
    }

    /// Lower-cased needles with blank entries dropped.
    fn compile(&self) -> CompiledQuery<'_> {
        CompiledQuery {
            search: self
                .search
                .as_deref()
                .filter(|s| !s.is_empty())
                .map(str::to_lowercase),
            columns: self
                .columns
                .iter()
                .filter(|(_, needle)| !needle.is_empty())
                .map(|(column, needle)| (column.as_str(), needle.to_lowercase()))
                .collect(),
        }
    }
}

struct CompiledQuery<'a> {
    search: Option<String>,
    columns: Vec<(&'a str, String)>,
}

impl CompiledQuery<'_> {
    fn matches(&self, row: &RawRow) -> bool {
        let search_ok = self.search.as_ref().map_or(true, |needle| {
            row.values()
                .any(|v| value_text(v).to_lowercase().contains(needle.as_str()))
        });

        search_ok
            && self.columns.iter().all(|(column, needle)| {
                row.get(*column)
                    .is_some_and(|v| value_text(v).to_lowercase().contains(needle.as_str()))
            })
    }
}

/// Raw rows matching `query`: search OR across fields, AND every column filter.
pub fn filter_rows(rows: &[RawRow], query: &TableQuery) -> Vec<RawRow> {
    let compiled = query.compile();
    rows.iter()
        .filter(|row| compiled.matches(row))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rec(year: i32, region: &str, category: &str, stock: &str, value: f64) -> StockRecord {
        StockRecord {
            year: Some(year),
            stock: stock.into(),
            region: region.into(),
            category: category.into(),
            value,
            unit: "kt".into(),
        }
    }

    fn scenario() -> Vec<StockRecord> {
        vec![
            rec(2016, "North", "Demersal", "Cod", 5.0),
            rec(2016, "South", "Demersal", "Haddock", 3.0),
            rec(2017, "North", "Pelagic", "Herring", 2.0),
        ]
    }

    fn rows() -> Vec<RawRow> {
        vec![
            json!({ "Stock": "Atlantic Cod", "Region": "North Sea", "Status": "Healthy" }),
            json!({ "Stock": "Haddock", "Region": "Irish Sea", "Status": "At risk" }),
            json!({ "Stock": "Herring", "Region": "Baltic", "Status": "healthy" }),
        ]
        .into_iter()
        .map(|v| v.as_object().cloned().unwrap())
        .collect()
    }

    #[test]
    fn test_empty_selection_is_identity() {
        let records = scenario();
        assert_eq!(apply_selection(&records, &Selection::empty()), records);
    }

    #[test]
    fn test_selection_by_region() {
        let selection = Selection {
            region: Some("North".into()),
            ..Selection::default()
        };
        let filtered = apply_selection(&scenario(), &selection);

        let stocks: Vec<&str> = filtered.iter().map(|r| r.stock.as_str()).collect();
        assert_eq!(stocks, vec!["Cod", "Herring"]);
    }

    #[test]
    fn test_selection_fields_combine() {
        let selection = Selection {
            year: Some(2016),
            region: None,
            category: Some("Demersal".into()),
        };
        assert_eq!(apply_selection(&scenario(), &selection).len(), 2);

        let selection = Selection {
            year: Some(2017),
            region: Some("South".into()),
            category: None,
        };
        assert!(apply_selection(&scenario(), &selection).is_empty());
    }

    #[test]
    fn test_selection_is_idempotent() {
        let selection = Selection {
            year: Some(2016),
            ..Selection::default()
        };
        let once = apply_selection(&scenario(), &selection);
        let twice = apply_selection(&once, &selection);
        assert_eq!(once, twice);
        assert_eq!(apply_selection(&scenario(), &selection), once);
    }

    #[test]
    fn test_apply_highlight() {
        let records = scenario();
        assert_eq!(apply_highlight(&records, &Highlight::Year(2017)).len(), 1);
        assert_eq!(
            apply_highlight(&records, &Highlight::Region("South".into()))[0].stock,
            "Haddock"
        );
    }

    #[test]
    fn test_search_is_case_insensitive_across_fields() {
        let found = filter_rows(&rows(), &TableQuery::new().with_search("HEALTHY"));
        assert_eq!(found.len(), 2);

        let found = filter_rows(&rows(), &TableQuery::new().with_search("sea"));
        assert_eq!(found.len(), 2);
        assert_eq!(found[0]["Stock"], "Atlantic Cod");
        assert_eq!(found[1]["Stock"], "Haddock");
    }

    #[test]
    fn test_column_filters_and_with_search() {
        let query = TableQuery::new()
            .with_search("sea")
            .with_column("Status", "risk");
        let found = filter_rows(&rows(), &query);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0]["Stock"], "Haddock");

        let query = TableQuery::new()
            .with_column("Region", "sea")
            .with_column("Stock", "cod");
        assert_eq!(filter_rows(&rows(), &query).len(), 1);
    }

    #[test]
    fn test_blank_query_keeps_everything() {
        let query = TableQuery::new().with_search("").with_column("Region", "");
        assert_eq!(filter_rows(&rows(), &query), rows());
    }

    #[test]
    fn test_unknown_column_filter_matches_nothing() {
        let query = TableQuery::new().with_column("Quota", "1");
        assert!(filter_rows(&rows(), &query).is_empty());
    }
}
