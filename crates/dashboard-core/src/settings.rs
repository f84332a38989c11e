use clap::Parser;
use std::path::PathBuf;

use crate::error::{DashboardError, Result};
use crate::models::{ColumnMapping, LoadPolicy};

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Sales dashboard over a folder of spreadsheet files
#[derive(Parser, Debug, Clone)]
#[command(
    name = "sales-dashboard",
    about = "Aggregate sales spreadsheets into metrics, charts and a filterable table",
    version
)]
pub struct Settings {
    /// Glob pattern selecting the source spreadsheets
    #[arg(long, env = "SALES_DASHBOARD_PATTERN", default_value = "vendas_*.xlsx")]
    pub pattern: String,

    /// Directory the pattern is resolved against
    #[arg(long, env = "SALES_DASHBOARD_DATA_DIR", default_value = ".")]
    pub data_dir: PathBuf,

    /// Output view
    #[arg(long, default_value = "dashboard", value_parser = ["dashboard", "report", "json"])]
    pub view: String,

    /// Branch selected when the dashboard opens (first branch if omitted)
    #[arg(long)]
    pub branch: Option<String>,

    /// Abort on the first unreadable file or row instead of skipping it
    #[arg(long)]
    pub strict: bool,

    /// Header of the branch column
    #[arg(long, default_value = "filial")]
    pub branch_column: String,

    /// Header of the product column
    #[arg(long, default_value = "produto")]
    pub product_column: String,

    /// Header of the quantity column
    #[arg(long, default_value = "quantidade")]
    pub quantity_column: String,

    /// Header of the unit price column
    #[arg(long, default_value = "valor_unitario")]
    pub unit_price_column: String,

    /// Currency symbol printed before monetary values
    #[arg(long, default_value = "R$")]
    pub currency_symbol: String,

    /// Display theme
    #[arg(long, default_value = "auto", value_parser = ["light", "dark", "classic", "auto"])]
    pub theme: String,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR"])]
    pub log_level: String,

    /// Write logs to this file instead of stderr
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

impl Settings {
    /// Parse the process arguments and resolve derived values.
    ///
    /// Exits with clap's usage message on invalid arguments.
    pub fn load() -> Self {
        Self::resolve(Settings::parse())
    }

    /// Same as [`Settings::load`] but over an explicit argument list, returning
    /// clap's error instead of exiting.
    pub fn try_load_from<I, T>(args: I) -> std::result::Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Settings::try_parse_from(args).map(Self::resolve)
    }

    /// Reject values clap cannot check on its own.
    pub fn validate(&self) -> Result<()> {
        if self.pattern.trim().is_empty() {
            return Err(DashboardError::Config("--pattern must not be empty".to_string()));
        }
        let mapping = self.column_mapping();
        let mut seen = std::collections::HashSet::new();
        for (_, name) in mapping.required() {
            if name.trim().is_empty() {
                return Err(DashboardError::Config(
                    "column names must not be empty".to_string(),
                ));
            }
            if !seen.insert(name.trim().to_lowercase()) {
                return Err(DashboardError::Config(format!(
                    "column '{}' is mapped to more than one role",
                    name
                )));
            }
        }
        Ok(())
    }

    /// Column mapping assembled from the `--*-column` flags.
    pub fn column_mapping(&self) -> ColumnMapping {
        ColumnMapping {
            branch: self.branch_column.clone(),
            product: self.product_column.clone(),
            quantity: self.quantity_column.clone(),
            unit_price: self.unit_price_column.clone(),
        }
    }

    pub fn load_policy(&self) -> LoadPolicy {
        if self.strict {
            LoadPolicy::Strict
        } else {
            LoadPolicy::Lenient
        }
    }

    fn resolve(mut settings: Settings) -> Settings {
        // --debug overrides log level.
        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }
        settings
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
