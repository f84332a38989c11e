//! Spreadsheet discovery and parsing for the Sales Dashboard.
//!
//! Finds the source workbooks matching the discovery pattern and converts the
//! first worksheet of each into typed [`SaleRecord`]s.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use calamine::{open_workbook_auto, Data, Reader};
use dashboard_core::error::{DashboardError, Result};
use dashboard_core::models::{
    display_number, CellValue, ColumnDef, ColumnMapping, ColumnRole, LoadPolicy, SaleRecord,
};
use indexmap::IndexMap;
use serde::Serialize;
use tracing::{debug, warn};

// ── Public types ──────────────────────────────────────────────────────────────

/// A row that was dropped while reading a source file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowError {
    pub path: PathBuf,
    /// 1-based spreadsheet row number.
    pub row: usize,
    pub column: String,
    pub message: String,
}

/// The parsed contents of one source workbook.
#[derive(Debug, Clone)]
pub struct SourceSheet {
    pub path: PathBuf,
    /// Columns in header order, tagged with their pipeline role.
    pub columns: Vec<ColumnDef>,
    pub records: Vec<SaleRecord>,
    pub row_errors: Vec<RowError>,
    /// Non-blank data rows seen, including dropped ones.
    pub rows_read: usize,
}

impl SourceSheet {
    /// Normalized header names, sorted, used to check that files agree.
    pub fn header_key(&self) -> Vec<String> {
        let mut key: Vec<String> = self
            .columns
            .iter()
            .map(|c| normalize_header_name(&c.name))
            .collect();
        key.sort();
        key
    }
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Find the regular files matching `pattern`, sorted by path.
///
/// A relative pattern is resolved against `data_dir`.
pub fn find_source_files(data_dir: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    let full_pattern = if Path::new(pattern).is_absolute() {
        pattern.to_string()
    } else {
        let dir = glob::Pattern::escape(&data_dir.to_string_lossy());
        format!("{}/{}", dir.trim_end_matches('/'), pattern)
    };

    let paths = glob::glob(&full_pattern).map_err(|e| DashboardError::InvalidPattern {
        pattern: pattern.to_string(),
        reason: e.to_string(),
    })?;

    let mut files: Vec<PathBuf> = paths
        .filter_map(|entry| match entry {
            Ok(path) => Some(path),
            Err(e) => {
                warn!("Skipping unreadable path while matching {}: {}", pattern, e);
                None
            }
        })
        .filter(|path| path.is_file())
        .collect();

    files.sort();
    debug!("Pattern {} matched {} files", full_pattern, files.len());
    Ok(files)
}

/// Open `path` as a workbook and parse its first worksheet.
pub fn read_sales_file(
    path: &Path,
    mapping: &ColumnMapping,
    policy: LoadPolicy,
) -> Result<SourceSheet> {
    let mut workbook = open_workbook_auto(path).map_err(|e| DashboardError::Workbook {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let range = match workbook.worksheet_range_at(0) {
        Some(Ok(range)) => range,
        Some(Err(e)) => {
            return Err(DashboardError::Workbook {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })
        }
        None => {
            return Err(DashboardError::Workbook {
                path: path.to_path_buf(),
                reason: "workbook has no worksheets".to_string(),
            })
        }
    };

    // The range starts at the first used cell, which need not be A1.
    let header_row = range.start().map(|(row, _)| row as usize + 1).unwrap_or(1);
    parse_rows(path, range.rows(), header_row, mapping, policy)
}

/// Parse worksheet rows: the first row is the header, the rest are data.
///
/// `header_row` is the 1-based sheet row of the header, used for error
/// messages only.
pub fn parse_rows<'a, I>(
    path: &Path,
    rows: I,
    header_row: usize,
    mapping: &ColumnMapping,
    policy: LoadPolicy,
) -> Result<SourceSheet>
where
    I: IntoIterator<Item = &'a [Data]>,
{
    let mut rows = rows.into_iter();
    let header = rows.next().ok_or_else(|| DashboardError::Workbook {
        path: path.to_path_buf(),
        reason: "first worksheet is empty (no header row)".to_string(),
    })?;

    let columns = resolve_columns(path, header, mapping)?;

    let mut records = Vec::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;

    for (idx, row) in rows.enumerate() {
        let sheet_row = header_row + idx + 1;
        if row.iter().all(is_blank_cell) {
            continue;
        }
        rows_read += 1;

        match parse_record(row, &columns) {
            Ok(record) => records.push(record),
            Err((column, reason)) => {
                let err = DashboardError::Derivation {
                    path: path.to_path_buf(),
                    row: sheet_row,
                    column: column.clone(),
                    reason: reason.clone(),
                };
                if policy == LoadPolicy::Strict {
                    return Err(err);
                }
                warn!("Dropping row: {}", err);
                row_errors.push(RowError {
                    path: path.to_path_buf(),
                    row: sheet_row,
                    column,
                    message: reason,
                });
            }
        }
    }

    debug!(
        "File {}: {} rows read, {} loaded, {} dropped",
        path.display(),
        rows_read,
        records.len(),
        row_errors.len(),
    );

    Ok(SourceSheet {
        path: path.to_path_buf(),
        columns,
        records,
        row_errors,
        rows_read,
    })
}

/// Normalize a header for matching: trim, strip a UTF-8 BOM, lowercase.
pub fn normalize_header_name(name: &str) -> String {
    name.trim().trim_start_matches('\u{feff}').trim().to_lowercase()
}

/// Convert a raw calamine cell into a [`CellValue`].
pub fn to_cell_value(cell: &Data) -> CellValue {
    match cell {
        Data::Empty | Data::Error(_) => CellValue::Empty,
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Float(f) => CellValue::Number(*f),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::String(s) => CellValue::Text(s.clone()),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(CellValue::DateTime)
            .unwrap_or_else(|| CellValue::Number(dt.as_f64())),
        Data::DateTimeIso(s) => s
            .parse::<chrono::NaiveDateTime>()
            .map(CellValue::DateTime)
            .unwrap_or_else(|_| CellValue::Text(s.clone())),
        Data::DurationIso(s) => CellValue::Text(s.clone()),
    }
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Build the column list from the header row and check the required columns.
fn resolve_columns(path: &Path, header: &[Data], mapping: &ColumnMapping) -> Result<Vec<ColumnDef>> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut names: Vec<String> = Vec::with_capacity(header.len());

    for (idx, cell) in header.iter().enumerate() {
        let raw = to_cell_value(cell).to_string();
        let base = if raw.trim().is_empty() {
            format!("unnamed_{}", idx)
        } else {
            raw.trim().trim_start_matches('\u{feff}').to_string()
        };
        // Repeated headers get a numeric suffix so every column stays addressable.
        let count = seen.entry(normalize_header_name(&base)).or_insert(0);
        let name = if *count == 0 {
            base
        } else {
            format!("{}.{}", base, count)
        };
        *count += 1;
        names.push(name);
    }

    let mut roles = vec![ColumnRole::Extra; names.len()];
    for (role, wanted) in mapping.required() {
        let wanted_norm = normalize_header_name(wanted);
        let idx = names
            .iter()
            .position(|n| normalize_header_name(n) == wanted_norm)
            .ok_or_else(|| DashboardError::MissingColumn {
                path: path.to_path_buf(),
                column: wanted.to_string(),
            })?;
        roles[idx] = role;
    }

    Ok(names
        .into_iter()
        .zip(roles)
        .map(|(name, role)| ColumnDef::new(name, role))
        .collect())
}

/// Turn one data row into a [`SaleRecord`].
///
/// On failure returns the offending column name and a reason.
fn parse_record(
    row: &[Data],
    columns: &[ColumnDef],
) -> std::result::Result<SaleRecord, (String, String)> {
    let mut branch = None;
    let mut product = None;
    let mut quantity = None;
    let mut unit_price = None;
    let mut extra = IndexMap::new();

    for (idx, column) in columns.iter().enumerate() {
        let value = row.get(idx).map(to_cell_value).unwrap_or_default();
        let fail = |reason: String| (column.name.clone(), reason);
        match column.role {
            ColumnRole::Branch => branch = Some(coerce_label(&value).map_err(fail)?),
            ColumnRole::Product => product = Some(coerce_label(&value).map_err(fail)?),
            ColumnRole::Quantity => quantity = Some(coerce_number(&value).map_err(fail)?),
            ColumnRole::UnitPrice => unit_price = Some(coerce_number(&value).map_err(fail)?),
            ColumnRole::Extra | ColumnRole::Revenue => {
                extra.insert(column.name.clone(), value);
            }
        }
    }

    match (branch, product, quantity, unit_price) {
        (Some(b), Some(p), Some(q), Some(u)) => Ok(SaleRecord::new(b, p, q, u, extra)),
        // resolve_columns guarantees all four roles are present.
        _ => Err((String::new(), "row is missing a required column".to_string())),
    }
}

/// Read a branch or product identifier.
fn coerce_label(value: &CellValue) -> std::result::Result<String, String> {
    match value {
        CellValue::Text(s) if !s.trim().is_empty() => Ok(s.clone()),
        CellValue::Number(n) => Ok(display_number(*n)),
        CellValue::Bool(_) | CellValue::DateTime(_) => Ok(value.to_string()),
        _ => Err("empty value".to_string()),
    }
}

/// Read a quantity or unit price.
fn coerce_number(value: &CellValue) -> std::result::Result<f64, String> {
    let parsed = match value {
        CellValue::Number(n) => Some(*n),
        CellValue::Text(s) => parse_numeric_text(s),
        CellValue::Empty => return Err("empty value".to_string()),
        other => return Err(format!("not a number: '{}'", other)),
    };
    match parsed {
        Some(n) if n.is_finite() => Ok(n),
        _ => Err(format!("not a number: '{}'", value)),
    }
}

/// Parse numeric text, accepting `,` as the decimal separator when no `.` is
/// present (`"2,50"`).
fn parse_numeric_text(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    if trimmed.contains(',') && !trimmed.contains('.') {
        trimmed.replacen(',', ".", 1).parse().ok()
    } else {
        trimmed.parse().ok()
    }
}

fn is_blank_cell(cell: &Data) -> bool {
    match cell {
        Data::Empty => true,
        Data::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn s(v: &str) -> Data {
        Data::String(v.to_string())
    }

    fn header() -> Vec<Data> {
        vec![s("filial"), s("produto"), s("quantidade"), s("valor_unitario")]
    }

    fn parse(rows: &[Vec<Data>], policy: LoadPolicy) -> Result<SourceSheet> {
        parse_rows(
            Path::new("vendas_test.xlsx"),
            rows.iter().map(Vec::as_slice),
            1,
            &ColumnMapping::default(),
            policy,
        )
    }

    fn touch(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, b"x").unwrap();
        path
    }

    // ── find_source_files ─────────────────────────────────────────────────────

    #[test]
    fn test_find_source_files_matches_pattern_sorted() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "vendas_c.xlsx");
        touch(dir.path(), "vendas_a.xlsx");
        touch(dir.path(), "vendas_b.xlsx");
        touch(dir.path(), "estoque.xlsx");

        let files = find_source_files(dir.path(), "vendas_*.xlsx").unwrap();
        let names: Vec<&str> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap())
            .collect();
        assert_eq!(names, vec!["vendas_a.xlsx", "vendas_b.xlsx", "vendas_c.xlsx"]);
    }

    #[test]
    fn test_find_source_files_skips_directories() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("vendas_archive.xlsx")).unwrap();
        touch(dir.path(), "vendas_jan.xlsx");

        let files = find_source_files(dir.path(), "vendas_*.xlsx").unwrap();
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn test_find_source_files_no_match_is_empty() {
        let dir = TempDir::new().unwrap();
        let files = find_source_files(dir.path(), "vendas_*.xlsx").unwrap();
        assert!(files.is_empty());
    }

    #[test]
    fn test_find_source_files_invalid_pattern() {
        let dir = TempDir::new().unwrap();
        let err = find_source_files(dir.path(), "vendas_[.xlsx").unwrap_err();
        assert!(matches!(err, DashboardError::InvalidPattern { .. }));
    }

    // ── parse_rows ────────────────────────────────────────────────────────────

    #[test]
    fn test_parse_rows_basic() {
        let rows = vec![
            header(),
            vec![s("North"), s("Widget"), Data::Int(10), Data::Float(2.0)],
            vec![s("South"), s("Gadget"), Data::Float(5.0), Data::Float(3.0)],
        ];
        let sheet = parse(&rows, LoadPolicy::Lenient).unwrap();

        assert_eq!(sheet.records.len(), 2);
        assert_eq!(sheet.records[0].branch, "North");
        assert!((sheet.records[0].revenue - 20.0).abs() < 1e-9);
        assert!((sheet.records[1].revenue - 15.0).abs() < 1e-9);
        assert_eq!(sheet.rows_read, 2);
        assert!(sheet.row_errors.is_empty());
    }

    #[test]
    fn test_parse_rows_preserves_extra_columns() {
        let mut head = header();
        head.push(s("vendedor"));
        let rows = vec![
            head,
            vec![s("North"), s("Widget"), Data::Int(1), Data::Int(2), s("Ana")],
        ];
        let sheet = parse(&rows, LoadPolicy::Lenient).unwrap();

        assert_eq!(sheet.columns.len(), 5);
        assert_eq!(sheet.columns[4].role, ColumnRole::Extra);
        assert_eq!(
            sheet.records[0].extra.get("vendedor"),
            Some(&CellValue::Text("Ana".to_string()))
        );
    }

    #[test]
    fn test_parse_rows_header_matching_is_normalized() {
        let rows = vec![
            vec![
                s("\u{feff}Filial"),
                s(" PRODUTO "),
                s("Quantidade"),
                s("valor_unitario"),
            ],
            vec![s("North"), s("Widget"), Data::Int(1), Data::Int(2)],
        ];
        let sheet = parse(&rows, LoadPolicy::Lenient).unwrap();
        assert_eq!(sheet.columns[0].role, ColumnRole::Branch);
        assert_eq!(sheet.columns[0].name, "Filial");
        assert_eq!(sheet.records.len(), 1);
    }

    #[test]
    fn test_parse_rows_missing_column() {
        let rows = vec![vec![s("filial"), s("produto"), s("quantidade")]];
        let err = parse(&rows, LoadPolicy::Lenient).unwrap_err();
        match err {
            DashboardError::MissingColumn { column, .. } => assert_eq!(column, "valor_unitario"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_parse_rows_empty_sheet() {
        let err = parse(&[], LoadPolicy::Lenient).unwrap_err();
        assert!(matches!(err, DashboardError::Workbook { .. }));
    }

    #[test]
    fn test_parse_rows_lenient_drops_bad_row() {
        let rows = vec![
            header(),
            vec![s("North"), s("Widget"), s("ten"), Data::Float(2.0)],
            vec![s("South"), s("Widget"), Data::Int(5), Data::Float(3.0)],
        ];
        let sheet = parse(&rows, LoadPolicy::Lenient).unwrap();

        assert_eq!(sheet.records.len(), 1);
        assert_eq!(sheet.records[0].branch, "South");
        assert_eq!(sheet.row_errors.len(), 1);
        assert_eq!(sheet.row_errors[0].row, 2);
        assert_eq!(sheet.row_errors[0].column, "quantidade");
        assert_eq!(sheet.rows_read, 2);
    }

    #[test]
    fn test_parse_rows_strict_aborts_on_bad_row() {
        let rows = vec![
            header(),
            vec![s("North"), s("Widget"), Data::Int(1), Data::Empty],
        ];
        let err = parse(&rows, LoadPolicy::Strict).unwrap_err();
        match err {
            DashboardError::Derivation { row, column, .. } => {
                assert_eq!(row, 2);
                assert_eq!(column, "valor_unitario");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_parse_rows_skips_blank_rows() {
        let rows = vec![
            header(),
            vec![Data::Empty, s("  "), Data::Empty, Data::Empty],
            vec![s("North"), s("Widget"), Data::Int(1), Data::Int(2)],
        ];
        let sheet = parse(&rows, LoadPolicy::Strict).unwrap();
        assert_eq!(sheet.records.len(), 1);
        assert_eq!(sheet.rows_read, 1);
    }

    #[test]
    fn test_parse_rows_short_row_is_row_error() {
        let rows = vec![header(), vec![s("North"), s("Widget")]];
        let sheet = parse(&rows, LoadPolicy::Lenient).unwrap();
        assert!(sheet.records.is_empty());
        assert_eq!(sheet.row_errors.len(), 1);
    }

    #[test]
    fn test_parse_rows_numeric_branch_label() {
        let rows = vec![
            header(),
            vec![Data::Float(101.0), s("Widget"), Data::Int(1), Data::Int(2)],
        ];
        let sheet = parse(&rows, LoadPolicy::Strict).unwrap();
        assert_eq!(sheet.records[0].branch, "101");
    }

    #[test]
    fn test_parse_rows_duplicate_headers_get_suffix() {
        let mut head = header();
        head.push(s("obs"));
        head.push(s("obs"));
        let rows = vec![head];
        let sheet = parse(&rows, LoadPolicy::Strict).unwrap();
        let names: Vec<&str> = sheet.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(&names[4..], &["obs", "obs.1"]);
    }

    #[test]
    fn test_header_key_is_order_insensitive() {
        let a = parse(&[header()], LoadPolicy::Strict).unwrap();
        let mut reordered = header();
        reordered.reverse();
        let b = parse(&[reordered], LoadPolicy::Strict).unwrap();
        assert_eq!(a.header_key(), b.header_key());
    }

    // ── coercion ──────────────────────────────────────────────────────────────

    #[test]
    fn test_coerce_number_accepts_numeric_text() {
        assert_eq!(coerce_number(&CellValue::Text(" 12.5 ".to_string())), Ok(12.5));
        assert_eq!(coerce_number(&CellValue::Text("2,50".to_string())), Ok(2.5));
    }

    #[test]
    fn test_coerce_number_rejects_non_numeric() {
        assert!(coerce_number(&CellValue::Text("abc".to_string())).is_err());
        assert!(coerce_number(&CellValue::Bool(true)).is_err());
        assert!(coerce_number(&CellValue::Empty).is_err());
        assert!(coerce_number(&CellValue::Text("1,000.50".to_string())).is_err());
        assert!(coerce_number(&CellValue::Number(f64::NAN)).is_err());
    }

    #[test]
    fn test_coerce_label_rejects_blank() {
        assert!(coerce_label(&CellValue::Text("   ".to_string())).is_err());
        assert!(coerce_label(&CellValue::Empty).is_err());
        assert_eq!(coerce_label(&CellValue::Text("Sul".to_string())), Ok("Sul".to_string()));
    }

    #[test]
    fn test_to_cell_value_error_cell_is_empty() {
        assert_eq!(
            to_cell_value(&Data::Error(calamine::CellErrorType::Div0)),
            CellValue::Empty
        );
        assert_eq!(to_cell_value(&Data::Int(3)), CellValue::Number(3.0));
    }

    #[test]
    fn test_normalize_header_name() {
        assert_eq!(normalize_header_name("\u{feff} Valor_Unitario "), "valor_unitario");
    }
}
