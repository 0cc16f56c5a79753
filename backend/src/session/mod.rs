//! Selection state machine.
//!
//! [`Dashboard`] owns the full record set, the durable [`Selection`] and the
//! ephemeral [`Highlight`]. Mutators only touch that state; every getter
//! re-derives its output from scratch, so callers re-read after each
//! mutation (or take a [`DashboardView`] snapshot of everything at once).
//!
//! ```text
//!  records ──▶ apply_selection ──▶ filtered ──▶ aggregate_* ──▶ base views
//!                                     │
//!                     highlight ──▶ apply_highlight ──▶ aggregate_* ──▶ compare_*
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

use crate::models::{
    HierarchyNode, Highlight, RegionalAggregate, RegionalComparison, Selection, StockRecord,
    YearlyAggregate, YearlyComparison,
};
use crate::transform::aggregate::{
    aggregate_by_region, aggregate_by_year, aggregate_hierarchy, compare_by_region,
    compare_by_year, total,
};
use crate::transform::filter::{apply_highlight, apply_selection};

/// A user interaction, as forwarded by the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", content = "value", rename_all = "camelCase")]
pub enum Command {
    SelectYear(i32),
    SelectRegion(String),
    SelectCategory(String),
    ClearYear,
    ClearRegion,
    ClearCategory,
    Reset,
    SetHighlight(Highlight),
    ClearHighlight,
}

/// Yearly and regional buckets with the highlighted totals merged in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighlightedAggregates {
    pub highlight: Highlight,
    pub yearly: Vec<YearlyComparison>,
    pub regional: Vec<RegionalComparison>,
}

/// Distinct values available for the selection dropdowns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterOptions {
    /// Ascending.
    pub years: Vec<i32>,
    /// First-occurrence order.
    pub regions: Vec<String>,
    /// First-occurrence order.
    pub categories: Vec<String>,
}

/// Snapshot of every derived output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    pub selection: Selection,
    pub highlight: Option<Highlight>,
    pub total_records: usize,
    pub filtered_records: usize,
    pub filtered_total: f64,
    pub yearly: Vec<YearlyAggregate>,
    pub regional: Vec<RegionalAggregate>,
    pub hierarchy: Vec<HierarchyNode>,
    pub highlighted: Option<HighlightedAggregates>,
}

/// Explicit state container for one dashboard session.
#[derive(Debug, Clone)]
pub struct Dashboard {
    records: Arc<[StockRecord]>,
    selection: Selection,
    highlight: Option<Highlight>,
}

impl Dashboard {
    /// Start a session over `records` with an empty selection.
    pub fn new(records: Vec<StockRecord>) -> Self {
        Self {
            records: records.into(),
            selection: Selection::empty(),
            highlight: None,
        }
    }

    /// Swap the source record set. Selection and highlight are kept.
    pub fn replace_records(&mut self, records: Vec<StockRecord>) {
        self.records = records.into();
    }

    pub fn records(&self) -> &[StockRecord] {
        &self.records
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn highlight(&self) -> Option<&Highlight> {
        self.highlight.as_ref()
    }

    // -------------------------------------------------------------------------
    // Mutators
    // -------------------------------------------------------------------------

    pub fn select_year(&mut self, year: i32) {
        self.selection.year = Some(year);
    }

    pub fn select_region(&mut self, region: impl Into<String>) {
        self.selection.region = Some(region.into());
    }

    pub fn select_category(&mut self, category: impl Into<String>) {
        self.selection.category = Some(category.into());
    }

    pub fn clear_year(&mut self) {
        self.selection.year = None;
    }

    pub fn clear_region(&mut self) {
        self.selection.region = None;
    }

    pub fn clear_category(&mut self) {
        self.selection.category = None;
    }

    /// Clear year, region and category. The highlight follows the pointer,
    /// not the selection, so it is left alone.
    pub fn reset(&mut self) {
        self.selection = Selection::empty();
    }

    pub fn set_highlight(&mut self, highlight: Highlight) {
        self.highlight = Some(highlight);
    }

    pub fn clear_highlight(&mut self) {
        self.highlight = None;
    }

    /// Dispatch a [`Command`] to the matching mutator.
    pub fn apply(&mut self, command: Command) {
        match command {
            Command::SelectYear(year) => self.select_year(year),
            Command::SelectRegion(region) => self.select_region(region),
            Command::SelectCategory(category) => self.select_category(category),
            Command::ClearYear => self.clear_year(),
            Command::ClearRegion => self.clear_region(),
            Command::ClearCategory => self.clear_category(),
            Command::Reset => self.reset(),
            Command::SetHighlight(highlight) => self.set_highlight(highlight),
            Command::ClearHighlight => self.clear_highlight(),
        }
    }

    // -------------------------------------------------------------------------
    // Derived outputs
    // -------------------------------------------------------------------------

    /// Records matching the current selection.
    pub fn filtered(&self) -> Vec<StockRecord> {
        apply_selection(&self.records, &self.selection)
    }

    pub fn yearly(&self) -> Vec<YearlyAggregate> {
        aggregate_by_year(&self.filtered())
    }

    pub fn regional(&self) -> Vec<RegionalAggregate> {
        aggregate_by_region(&self.filtered())
    }

    pub fn hierarchy(&self) -> Vec<HierarchyNode> {
        aggregate_hierarchy(&self.filtered())
    }

    /// Comparison buckets for the active highlight, if any.
    pub fn highlighted(&self) -> Option<HighlightedAggregates> {
        let filtered = self.filtered();
        self.highlighted_from(&filtered)
    }

    fn highlighted_from(&self, filtered: &[StockRecord]) -> Option<HighlightedAggregates> {
        let highlight = self.highlight.as_ref()?;
        let sub = apply_highlight(filtered, highlight);

        Some(HighlightedAggregates {
            highlight: highlight.clone(),
            yearly: compare_by_year(&aggregate_by_year(filtered), &aggregate_by_year(&sub)),
            regional: compare_by_region(&aggregate_by_region(filtered), &aggregate_by_region(&sub)),
        })
    }

    /// Distinct years, regions and categories of the full record set.
    pub fn options(&self) -> FilterOptions {
        let mut options = FilterOptions::default();
        let mut years = HashSet::new();
        let mut regions = HashSet::new();
        let mut categories = HashSet::new();

        for record in self.records.iter() {
            if let Some(year) = record.year {
                if years.insert(year) {
                    options.years.push(year);
                }
            }
            if regions.insert(record.region.as_str()) {
                options.regions.push(record.region.clone());
            }
            if categories.insert(record.category.as_str()) {
                options.categories.push(record.category.clone());
            }
        }

        options.years.sort_unstable();
        options
    }

    /// Derive every output in one pass over the filtered set.
    pub fn view(&self) -> DashboardView {
        let filtered = self.filtered();

        DashboardView {
            selection: self.selection.clone(),
            highlight: self.highlight.clone(),
            total_records: self.records.len(),
            filtered_records: filtered.len(),
            filtered_total: total(&filtered),
            yearly: aggregate_by_year(&filtered),
            regional: aggregate_by_region(&filtered),
            hierarchy: aggregate_hierarchy(&filtered),
            highlighted: self.highlighted_from(&filtered),
        }
    }
}

impl Default for Dashboard {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}
