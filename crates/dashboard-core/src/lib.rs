//! Core types shared by every Sales Dashboard crate.
//!
//! Holds the typed sales data model, the error taxonomy, number and currency
//! formatting helpers, and the command-line settings.

pub mod error;
pub mod formatting;
pub mod models;
pub mod settings;

pub use error::{DashboardError, Result};
