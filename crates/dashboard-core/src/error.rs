use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the Sales Dashboard.
#[derive(Error, Debug)]
pub enum DashboardError {
    /// The discovery pattern is not a valid glob.
    #[error("Invalid file pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// No source files matched the discovery pattern.
    #[error("No sales files found matching {0}")]
    NoSourceFiles(String),

    /// A matched file could not be opened or read as a spreadsheet.
    #[error("Failed to parse workbook {path}: {reason}")]
    Workbook { path: PathBuf, reason: String },

    /// A required column is absent from a source file's header row.
    #[error("Missing required column '{column}' in {path}")]
    MissingColumn { path: PathBuf, column: String },

    /// A source file's columns differ from the columns already loaded.
    #[error("Columns of {path} do not match the loaded table (expected [{expected}], found [{found}])")]
    ColumnMismatch {
        path: PathBuf,
        expected: String,
        found: String,
    },

    /// A row's quantity, unit price, branch or product could not be read.
    #[error("Invalid value in {path} row {row}, column '{column}': {reason}")]
    Derivation {
        path: PathBuf,
        row: usize,
        column: String,
        reason: String,
    },

    /// A best-group query was made against a table with no rows.
    #[error("Cannot determine the best branch of an empty table")]
    EmptyGrouping,

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl DashboardError {
    /// `true` for the errors that describe a single unreadable source file
    /// or row rather than a problem with the whole load.
    pub fn is_source_error(&self) -> bool {
        matches!(
            self,
            DashboardError::Workbook { .. }
                | DashboardError::MissingColumn { .. }
                | DashboardError::ColumnMismatch { .. }
                | DashboardError::Derivation { .. }
        )
    }
}

/// Convenience alias used throughout the dashboard crates.
pub type Result<T> = std::result::Result<T, DashboardError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_no_source_files() {
        let err = DashboardError::NoSourceFiles("vendas_*.xlsx".to_string());
        assert_eq!(err.to_string(), "No sales files found matching vendas_*.xlsx");
    }

    #[test]
    fn test_error_display_missing_column() {
        let err = DashboardError::MissingColumn {
            path: PathBuf::from("vendas_a.xlsx"),
            column: "quantidade".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Missing required column 'quantidade' in vendas_a.xlsx"
        );
    }

    #[test]
    fn test_error_display_derivation() {
        let err = DashboardError::Derivation {
            path: PathBuf::from("vendas_a.xlsx"),
            row: 7,
            column: "valor_unitario".to_string(),
            reason: "not a number: 'abc'".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("row 7"));
        assert!(msg.contains("valor_unitario"));
        assert!(msg.contains("abc"));
    }

    #[test]
    fn test_error_display_empty_grouping() {
        let err = DashboardError::EmptyGrouping;
        assert_eq!(
            err.to_string(),
            "Cannot determine the best branch of an empty table"
        );
    }

    #[test]
    fn test_error_display_config() {
        let err = DashboardError::Config("empty pattern".to_string());
        assert_eq!(err.to_string(), "Configuration error: empty pattern");
    }

    #[test]
    fn test_is_source_error() {
        let workbook = DashboardError::Workbook {
            path: PathBuf::from("x.xlsx"),
            reason: "zip error".to_string(),
        };
        assert!(workbook.is_source_error());
        assert!(!DashboardError::EmptyGrouping.is_source_error());
        assert!(!DashboardError::NoSourceFiles("*.xlsx".to_string()).is_source_error());
    }
}
