//! Process-scoped dashboard snapshot.
//!
//! [`DashboardState`] runs the load pipeline once, keeps the resulting
//! [`UnifiedTable`] immutable, and derives the data products from it on every
//! request. Nothing is refreshed in the background: the table only changes
//! when [`DashboardState::reload`] is called.

use dashboard_core::error::DashboardError;
use dashboard_core::models::{GroupTotal, SortOrder, UnifiedTable};
use dashboard_data::aggregator::{FilteredView, SalesAggregator};
use dashboard_data::loader::{load_sales, LoadOptions, LoadReport};
use serde::Serialize;

// ── LoadState ─────────────────────────────────────────────────────────────────

/// Result of the most recent load.
#[derive(Debug, Clone)]
pub enum LoadState {
    /// At least one file loaded; the table may still hold zero rows.
    Ready {
        table: UnifiedTable,
        report: LoadReport,
    },
    /// No file matched, or none could be read.
    NoData { report: LoadReport },
    /// The load aborted (invalid pattern, or any failure in strict mode).
    Failed { message: String },
}

// ── DashboardProducts ─────────────────────────────────────────────────────────

/// Everything the presentation layer draws, computed from one table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardProducts {
    pub total_revenue: f64,
    pub total_quantity: f64,
    /// `None` when the table has no rows.
    pub best_branch: Option<GroupTotal>,
    pub revenue_by_branch: Vec<GroupTotal>,
    /// Products ranked by quantity, ascending.
    pub quantity_by_product: Vec<GroupTotal>,
    pub branches: Vec<String>,
    pub row_count: usize,
}

impl DashboardProducts {
    pub fn from_table(table: &UnifiedTable) -> Self {
        let best_branch = match SalesAggregator::best_branch(table) {
            Ok(best) => Some(best),
            Err(DashboardError::EmptyGrouping) => None,
            Err(e) => {
                tracing::warn!(error = %e, "best branch unavailable");
                None
            }
        };

        Self {
            total_revenue: SalesAggregator::total_revenue(table),
            total_quantity: SalesAggregator::total_quantity(table),
            best_branch,
            revenue_by_branch: SalesAggregator::revenue_by_branch(table),
            quantity_by_product: SalesAggregator::quantity_by_product(table, SortOrder::Ascending),
            branches: SalesAggregator::distinct_branches(table),
            row_count: table.len(),
        }
    }
}

// ── DashboardState ────────────────────────────────────────────────────────────

/// Loaded table plus the options needed to load it again.
///
/// # Example
/// ```no_run
/// use dashboard_data::loader::LoadOptions;
/// use dashboard_runtime::state::DashboardState;
///
/// let state = DashboardState::load(LoadOptions::new("vendas_*.xlsx"));
/// if let Some(products) = state.products() {
///     println!("revenue: {}", products.total_revenue);
/// }
/// ```
#[derive(Debug, Clone)]
pub struct DashboardState {
    options: LoadOptions,
    state: LoadState,
}

impl DashboardState {
    /// Run the loader once with `options`.
    pub fn load(options: LoadOptions) -> Self {
        let state = Self::run(&options);
        Self { options, state }
    }

    /// Re-run the loader with the original options, replacing the snapshot.
    pub fn reload(&mut self) {
        tracing::info!(pattern = %self.options.pattern, "reloading sales data");
        self.state = Self::run(&self.options);
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    pub fn options(&self) -> &LoadOptions {
        &self.options
    }

    /// The loaded table, if any.
    pub fn table(&self) -> Option<&UnifiedTable> {
        match &self.state {
            LoadState::Ready { table, .. } => Some(table),
            _ => None,
        }
    }

    /// The load report; `None` after a failed load.
    pub fn report(&self) -> Option<&LoadReport> {
        match &self.state {
            LoadState::Ready { report, .. } | LoadState::NoData { report } => Some(report),
            LoadState::Failed { .. } => None,
        }
    }

    /// Data products of the current table; `None` when nothing is loaded.
    pub fn products(&self) -> Option<DashboardProducts> {
        self.table().map(DashboardProducts::from_table)
    }

    /// Branch names in first-encountered order; empty when nothing is loaded.
    pub fn branches(&self) -> Vec<String> {
        self.table()
            .map(SalesAggregator::distinct_branches)
            .unwrap_or_default()
    }

    /// Rows of `branch`; `None` when nothing is loaded.
    pub fn filtered(&self, branch: &str) -> Option<FilteredView<'_>> {
        self.table()
            .map(|table| SalesAggregator::filter_by_branch(table, branch))
    }

    fn run(options: &LoadOptions) -> LoadState {
        match load_sales(options) {
            Ok(result) => match result.table {
                Some(table) => LoadState::Ready {
                    table,
                    report: result.report,
                },
                None => LoadState::NoData {
                    report: result.report,
                },
            },
            Err(e) => {
                tracing::error!(error = %e, "sales data load failed");
                LoadState::Failed {
                    message: e.to_string(),
                }
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
