//! Terminal UI layer for the sales dashboard.
//!
//! Provides themes, header, metric card and share-bar components, the chart
//! and table views, and the application event loop built on top of
//! [`ratatui`].

pub mod app;
pub mod chart_view;
pub mod components;
pub mod table_view;
pub mod themes;

pub use app::App;
pub use dashboard_core as core;
