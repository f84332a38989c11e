//! Data ingestion layer for the sales dashboard.
//!
//! Discovers the sales spreadsheets, reads and validates their rows, merges
//! them into one [`UnifiedTable`](dashboard_core::models::UnifiedTable) and
//! computes the aggregates the dashboard displays.

pub mod aggregator;
pub mod loader;
pub mod reader;

pub use aggregator::{FilteredView, SalesAggregator};
pub use dashboard_core as core;
pub use loader::{load, load_sales, FileError, LoadOptions, LoadOutcome, LoadReport, LoadResult};
pub use reader::RowError;
