//! Runtime layer for the sales dashboard.
//!
//! Holds the loaded snapshot between the data-ingestion and UI layers and
//! serves the derived data products on demand.

pub mod state;

pub use dashboard_core as core;
pub use dashboard_data as data;
pub use state::{DashboardProducts, DashboardState, LoadState};
