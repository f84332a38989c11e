//! Summary metrics and grouped aggregates over a [`UnifiedTable`].
//!
//! Every function here is a pure read of the table; nothing is cached.

use std::collections::BTreeMap;

use dashboard_core::error::{DashboardError, Result};
use dashboard_core::models::{
    ColumnDef, GroupTotal, SaleRecord, SortOrder, SummaryMetrics, UnifiedTable,
};
use indexmap::{IndexMap, IndexSet};

// ── FilteredView ──────────────────────────────────────────────────────────────

/// The rows of one branch, borrowed from the table in original order.
#[derive(Debug, Clone)]
pub struct FilteredView<'a> {
    pub branch: String,
    pub columns: &'a [ColumnDef],
    pub records: Vec<&'a SaleRecord>,
}

impl FilteredView<'_> {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Revenue of the rows in the view.
    pub fn revenue(&self) -> f64 {
        self.records.iter().map(|r| r.revenue).sum()
    }
}

// ── SalesAggregator ───────────────────────────────────────────────────────────

/// Stateless helper computing the dashboard's derived views.
pub struct SalesAggregator;

impl SalesAggregator {
    /// Sum of `revenue` over all rows; `0.0` for an empty table.
    pub fn total_revenue(table: &UnifiedTable) -> f64 {
        table.records().iter().map(|r| r.revenue).sum()
    }

    /// Sum of `quantity` over all rows; `0.0` for an empty table.
    pub fn total_quantity(table: &UnifiedTable) -> f64 {
        table.records().iter().map(|r| r.quantity).sum()
    }

    /// Revenue summed per branch, in ascending branch-name order.
    pub fn revenue_by_branch(table: &UnifiedTable) -> Vec<GroupTotal> {
        let mut groups: BTreeMap<&str, f64> = BTreeMap::new();
        for record in table.records() {
            *groups.entry(record.branch.as_str()).or_insert(0.0) += record.revenue;
        }
        groups
            .into_iter()
            .map(|(key, value)| GroupTotal::new(key, value))
            .collect()
    }

    /// The branch with the highest summed revenue.
    ///
    /// Ties go to the first maximum in [`Self::revenue_by_branch`] order, so
    /// the lexicographically smallest branch name wins.
    pub fn best_branch(table: &UnifiedTable) -> Result<GroupTotal> {
        let mut best: Option<GroupTotal> = None;
        for group in Self::revenue_by_branch(table) {
            let replace = match &best {
                Some(current) => group.value.total_cmp(&current.value).is_gt(),
                None => true,
            };
            if replace {
                best = Some(group);
            }
        }
        best.ok_or(DashboardError::EmptyGrouping)
    }

    /// Quantity summed per product, ranked by quantity.
    ///
    /// The sort is stable: products with equal quantity keep the order in
    /// which they first appear in the table.
    pub fn quantity_by_product(table: &UnifiedTable, order: SortOrder) -> Vec<GroupTotal> {
        let mut groups: IndexMap<&str, f64> = IndexMap::new();
        for record in table.records() {
            *groups.entry(record.product.as_str()).or_insert(0.0) += record.quantity;
        }

        let mut ranked: Vec<GroupTotal> = groups
            .into_iter()
            .map(|(key, value)| GroupTotal::new(key, value))
            .collect();
        match order {
            SortOrder::Ascending => ranked.sort_by(|a, b| a.value.total_cmp(&b.value)),
            SortOrder::Descending => ranked.sort_by(|a, b| b.value.total_cmp(&a.value)),
        }
        ranked
    }

    /// Rows whose branch equals `branch`; empty when the branch is unknown.
    pub fn filter_by_branch<'a>(table: &'a UnifiedTable, branch: &str) -> FilteredView<'a> {
        FilteredView {
            branch: branch.to_string(),
            columns: table.columns(),
            records: table
                .records()
                .iter()
                .filter(|r| r.branch == branch)
                .collect(),
        }
    }

    /// Distinct branch names in first-encountered order.
    pub fn distinct_branches(table: &UnifiedTable) -> Vec<String> {
        table
            .records()
            .iter()
            .map(|r| r.branch.as_str())
            .collect::<IndexSet<&str>>()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    /// Headline metrics; fails with [`DashboardError::EmptyGrouping`] on an
    /// empty table because no branch can be best.
    pub fn summary(table: &UnifiedTable) -> Result<SummaryMetrics> {
        let best = Self::best_branch(table)?;
        let products: IndexSet<&str> = table.records().iter().map(|r| r.product.as_str()).collect();

        Ok(SummaryMetrics {
            total_revenue: Self::total_revenue(table),
            total_quantity: Self::total_quantity(table),
            best_branch: best.key,
            best_branch_revenue: best.value,
            row_count: table.len(),
            branch_count: Self::distinct_branches(table).len(),
            product_count: products.len(),
        })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
