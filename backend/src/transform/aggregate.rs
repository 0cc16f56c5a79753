//! Group-and-sum views over a record set.
//!
//! ```text
//! records (flat)                         hierarchy
//! ┌───────────────────────────────┐      ┌──────────────────────────┐
//! │ 2016 North Demersal Cod     5 │      │ Demersal 8               │
//! │ 2016 South Demersal Haddock 3 │  →   │   Cod 5, Haddock 3       │
//! │ 2017 North Pelagic  Herring 2 │      │ Pelagic 2                │
//! └───────────────────────────────┘      │   Herring 2              │
//!                                        └──────────────────────────┘
//! ```
//!
//! All functions are pure and re-scan their input. Sums accumulate in `f64`;
//! a NaN value poisons its bucket. Descending orders are stable (ties keep
//! first-encountered order) and place NaN buckets last. Records without a
//! parsable year are left out of the yearly view only.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::hash::Hash;

use crate::models::{
    HierarchyLeaf, HierarchyNode, RegionalAggregate, RegionalComparison, StockRecord,
    YearlyAggregate, YearlyComparison,
};

/// Sums keyed by first occurrence.
struct Buckets<K> {
    index: HashMap<K, usize>,
    sums: Vec<(K, f64)>,
}

impl<K: Hash + Eq + Clone> Buckets<K> {
    fn new() -> Self {
        Self {
            index: HashMap::new(),
            sums: Vec::new(),
        }
    }

    fn add(&mut self, key: &K, value: f64) -> usize {
        let idx = match self.index.get(key) {
            Some(&idx) => idx,
            None => {
                self.sums.push((key.clone(), 0.0));
                self.index.insert(key.clone(), self.sums.len() - 1);
                self.sums.len() - 1
            }
        };
        self.sums[idx].1 += value;
        idx
    }

    fn into_vec(self) -> Vec<(K, f64)> {
        self.sums
    }
}

/// Descending by value, NaN last.
fn descending(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
    }
}

/// Total per year, ascending by year.
pub fn aggregate_by_year(records: &[StockRecord]) -> Vec<YearlyAggregate> {
    let mut totals: HashMap<i32, f64> = HashMap::new();
    for record in records {
        if let Some(year) = record.year {
            *totals.entry(year).or_insert(0.0) += record.value;
        }
    }

    let mut entries: Vec<YearlyAggregate> = totals
        .into_iter()
        .map(|(year, value)| YearlyAggregate { year, value })
        .collect();
    entries.sort_by_key(|e| e.year);
    entries
}

/// Total per region, largest first.
pub fn aggregate_by_region(records: &[StockRecord]) -> Vec<RegionalAggregate> {
    let mut buckets = Buckets::new();
    for record in records {
        buckets.add(&record.region, record.value);
    }

    let mut entries: Vec<RegionalAggregate> = buckets
        .into_vec()
        .into_iter()
        .map(|(region, value)| RegionalAggregate { region, value })
        .collect();
    entries.sort_by(|a, b| descending(a.value, b.value));
    entries
}

/// Two-level breakdown: categories, then stocks within each category.
///
/// A category's value is summed from its records, not from its children.
pub fn aggregate_hierarchy(records: &[StockRecord]) -> Vec<HierarchyNode> {
    let mut categories = Buckets::new();
    let mut stocks: Vec<Buckets<String>> = Vec::new();

    for record in records {
        let idx = categories.add(&record.category, record.value);
        if idx == stocks.len() {
            stocks.push(Buckets::new());
        }
        stocks[idx].add(&record.stock, record.value);
    }

    let mut nodes: Vec<HierarchyNode> = categories
        .into_vec()
        .into_iter()
        .zip(stocks)
        .map(|((name, value), stocks)| {
            let mut children: Vec<HierarchyLeaf> = stocks
                .into_vec()
                .into_iter()
                .map(|(name, value)| HierarchyLeaf { name, value })
                .collect();
            children.sort_by(|a, b| descending(a.value, b.value));
            HierarchyNode {
                name,
                value,
                children,
            }
        })
        .collect();
    nodes.sort_by(|a, b| descending(a.value, b.value));
    nodes
}

/// Sum of every record's value.
pub fn total(records: &[StockRecord]) -> f64 {
    records.iter().map(|r| r.value).sum()
}

/// Merge highlighted yearly totals into the base buckets, keeping base order.
pub fn compare_by_year(
    base: &[YearlyAggregate],
    highlighted: &[YearlyAggregate],
) -> Vec<YearlyComparison> {
    let lookup: HashMap<i32, f64> = highlighted.iter().map(|e| (e.year, e.value)).collect();
    base.iter()
        .map(|e| YearlyComparison {
            year: e.year,
            value: e.value,
            highlighted_value: lookup.get(&e.year).copied().unwrap_or(0.0),
        })
        .collect()
}

/// Merge highlighted regional totals into the base buckets, keeping base order.
pub fn compare_by_region(
    base: &[RegionalAggregate],
    highlighted: &[RegionalAggregate],
) -> Vec<RegionalComparison> {
    let lookup: HashMap<&str, f64> = highlighted
        .iter()
        .map(|e| (e.region.as_str(), e.value))
        .collect();
    base.iter()
        .map(|e| RegionalComparison {
            region: e.region.clone(),
            value: e.value,
            highlighted_value: lookup.get(e.region.as_str()).copied().unwrap_or(0.0),
        })
        .collect()
}
