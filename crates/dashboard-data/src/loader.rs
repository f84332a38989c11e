//! Load pipeline: discover, parse, merge.
//!
//! Builds the [`UnifiedTable`] once per run and returns it together with a
//! [`LoadReport`] describing what was read and what was skipped.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::Utc;
use dashboard_core::error::{DashboardError, Result};
use dashboard_core::models::{ColumnDef, ColumnMapping, LoadPolicy, SaleRecord, UnifiedTable};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::reader::{find_source_files, normalize_header_name, read_sales_file, RowError};

// ── Public types ──────────────────────────────────────────────────────────────

/// Where to look for source files and how to read them.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    pub data_dir: PathBuf,
    pub pattern: String,
    pub columns: ColumnMapping,
    pub policy: LoadPolicy,
}

impl LoadOptions {
    /// Options for `pattern` in the working directory with default columns.
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            data_dir: PathBuf::from("."),
            pattern: pattern.into(),
            columns: ColumnMapping::default(),
            policy: LoadPolicy::default(),
        }
    }

    pub fn with_data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.data_dir = data_dir.into();
        self
    }

    pub fn with_columns(mut self, columns: ColumnMapping) -> Self {
        self.columns = columns;
        self
    }

    pub fn with_policy(mut self, policy: LoadPolicy) -> Self {
        self.policy = policy;
        self
    }
}

/// A matched file that contributed no rows because it could not be read.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileError {
    pub path: PathBuf,
    pub message: String,
}

/// What a load run saw and did.
#[derive(Debug, Clone, Serialize)]
pub struct LoadReport {
    /// RFC 3339 timestamp of when the load finished.
    pub generated_at: String,
    pub pattern: String,
    /// Files matched by the pattern, in load order.
    pub files_matched: Vec<PathBuf>,
    /// Files whose rows made it into the table.
    pub files_loaded: Vec<PathBuf>,
    pub file_errors: Vec<FileError>,
    pub row_errors: Vec<RowError>,
    pub rows_loaded: usize,
    pub load_time_seconds: f64,
}

impl LoadReport {
    /// `true` when something was skipped.
    pub fn has_warnings(&self) -> bool {
        !self.file_errors.is_empty() || !self.row_errors.is_empty()
    }
}

/// Output of [`load_sales`]. `table` is `None` when no source file loaded.
#[derive(Debug, Clone)]
pub struct LoadResult {
    pub table: Option<UnifiedTable>,
    pub report: LoadReport,
}

/// A loaded table, or the distinct "no data" state.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    Loaded(UnifiedTable),
    Absent,
}

impl LoadResult {
    pub fn into_outcome(self) -> LoadOutcome {
        match self.table {
            Some(table) => LoadOutcome::Loaded(table),
            None => LoadOutcome::Absent,
        }
    }
}

// ── Public functions ──────────────────────────────────────────────────────────

/// Load every file matching `pattern` in the working directory with the
/// default column mapping and lenient policy.
pub fn load(pattern: &str) -> Result<LoadOutcome> {
    load_sales(&LoadOptions::new(pattern)).map(LoadResult::into_outcome)
}

/// Run the load pipeline.
///
/// 1. Discover files matching `options.pattern` (sorted by path).
/// 2. Parse each file's first worksheet into typed records; revenue is
///    derived per row as it is read.
/// 3. Concatenate in file order, keeping row order within each file.
///
/// Under [`LoadPolicy::Lenient`] unreadable files and rows are skipped and
/// reported; under [`LoadPolicy::Strict`] the first one aborts the load.
/// Zero matched files, or zero files that loaded, yields `table: None`.
pub fn load_sales(options: &LoadOptions) -> Result<LoadResult> {
    let start = Instant::now();
    let files = find_source_files(&options.data_dir, &options.pattern)?;

    let mut merged = Merge::default();
    let mut file_errors = Vec::new();
    let mut row_errors = Vec::new();

    if files.is_empty() {
        warn!("{}", DashboardError::NoSourceFiles(options.pattern.clone()));
    }

    for path in &files {
        let outcome = read_sales_file(path, &options.columns, options.policy)
            .and_then(|sheet| merged.push(sheet));
        match outcome {
            Ok(mut sheet_row_errors) => row_errors.append(&mut sheet_row_errors),
            Err(e) if options.policy == LoadPolicy::Strict || !e.is_source_error() => {
                return Err(e)
            }
            Err(e) => {
                warn!("Skipping {}: {}", path.display(), e);
                file_errors.push(FileError {
                    path: path.clone(),
                    message: e.to_string(),
                });
            }
        }
    }

    let files_loaded = merged.paths.clone();
    let rows_loaded = merged.records.len();
    let table = merged.finish();

    let report = LoadReport {
        generated_at: Utc::now().to_rfc3339(),
        pattern: options.pattern.clone(),
        files_matched: files,
        files_loaded,
        file_errors,
        row_errors,
        rows_loaded,
        load_time_seconds: start.elapsed().as_secs_f64(),
    };

    info!(
        files_matched = report.files_matched.len(),
        files_loaded = report.files_loaded.len(),
        rows = report.rows_loaded,
        skipped_files = report.file_errors.len(),
        skipped_rows = report.row_errors.len(),
        "Sales data loaded"
    );

    Ok(LoadResult { table, report })
}

// ── Merge ─────────────────────────────────────────────────────────────────────

/// Accumulates parsed sheets; the first sheet fixes the column set.
#[derive(Default)]
struct Merge {
    columns: Option<Vec<ColumnDef>>,
    header_key: Vec<String>,
    /// Normalized header name to the first sheet's spelling of it.
    canonical_names: HashMap<String, String>,
    records: Vec<SaleRecord>,
    paths: Vec<PathBuf>,
}

impl Merge {
    /// Append `sheet`, returning its row errors.
    fn push(&mut self, sheet: crate::reader::SourceSheet) -> Result<Vec<RowError>> {
        let key = sheet.header_key();
        let mut records = sheet.records;
        if self.columns.is_none() {
            self.canonical_names = sheet
                .columns
                .iter()
                .map(|c| (normalize_header_name(&c.name), c.name.clone()))
                .collect();
            self.columns = Some(sheet.columns);
            self.header_key = key;
        } else if key != self.header_key {
            // No reconciliation: a file with other columns is rejected whole.
            return Err(DashboardError::ColumnMismatch {
                path: sheet.path.clone(),
                expected: self.header_key.join(", "),
                found: key.join(", "),
            });
        } else {
            // Headers matched after normalization; store extras under the
            // table's column names so lookups by column find them.
            for record in &mut records {
                record.extra = std::mem::take(&mut record.extra)
                    .into_iter()
                    .map(|(name, value)| {
                        let canonical = self
                            .canonical_names
                            .get(&normalize_header_name(&name))
                            .cloned()
                            .unwrap_or(name);
                        (canonical, value)
                    })
                    .collect();
            }
        }

        debug!(
            "Merging {} rows from {}",
            records.len(),
            display_name(&sheet.path)
        );
        self.records.extend(records);
        self.paths.push(sheet.path);
        Ok(sheet.row_errors)
    }

    fn finish(self) -> Option<UnifiedTable> {
        self.columns
            .map(|columns| UnifiedTable::from_source(columns, self.records))
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
