use chrono::{NaiveDateTime, Timelike};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Header name of the derived revenue column appended to every table.
pub const REVENUE_COLUMN: &str = "revenue";

/// A single spreadsheet cell carried through the pipeline untouched.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    /// Blank cell (or a spreadsheet error value).
    #[default]
    Empty,
    Bool(bool),
    Number(f64),
    DateTime(NaiveDateTime),
    Text(String),
}

impl CellValue {
    /// `true` for blank cells and whitespace-only text.
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Bool(b) => write!(f, "{}", b),
            CellValue::Number(n) => write!(f, "{}", display_number(*n)),
            CellValue::DateTime(dt) => {
                if dt.hour() == 0 && dt.minute() == 0 && dt.second() == 0 {
                    write!(f, "{}", dt.format("%Y-%m-%d"))
                } else {
                    write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S"))
                }
            }
            CellValue::Text(s) => f.write_str(s),
        }
    }
}

/// Render a number without a trailing `.0` when it is integral.
pub fn display_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

// ── Schema ────────────────────────────────────────────────────────────────────

/// What the pipeline does with a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnRole {
    Branch,
    Product,
    Quantity,
    UnitPrice,
    /// Any other source column, preserved but not processed.
    Extra,
    /// The derived `quantity * unit_price` column.
    Revenue,
}

/// One column of a [`UnifiedTable`], in display order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDef {
    /// Header text as it appears in the first loaded file.
    pub name: String,
    pub role: ColumnRole,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, role: ColumnRole) -> Self {
        Self {
            name: name.into(),
            role,
        }
    }
}

/// Source header names of the four columns the pipeline reads.
///
/// The defaults are the headers used by the sales spreadsheets this tool was
/// written for (`filial`, `produto`, `quantidade`, `valor_unitario`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMapping {
    pub branch: String,
    pub product: String,
    pub quantity: String,
    pub unit_price: String,
}

impl Default for ColumnMapping {
    fn default() -> Self {
        Self {
            branch: "filial".to_string(),
            product: "produto".to_string(),
            quantity: "quantidade".to_string(),
            unit_price: "valor_unitario".to_string(),
        }
    }
}

impl ColumnMapping {
    /// The required columns paired with their role, in a fixed order.
    pub fn required(&self) -> [(ColumnRole, &str); 4] {
        [
            (ColumnRole::Branch, self.branch.as_str()),
            (ColumnRole::Product, self.product.as_str()),
            (ColumnRole::Quantity, self.quantity.as_str()),
            (ColumnRole::UnitPrice, self.unit_price.as_str()),
        ]
    }
}

/// How the loader reacts to a file or row it cannot read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadPolicy {
    /// Skip the bad file or row, record it in the load report, keep going.
    #[default]
    Lenient,
    /// Abort the whole load on the first bad file or row.
    Strict,
}

// ── Records ───────────────────────────────────────────────────────────────────

/// One validated sales row.
///
/// `revenue` is derived once at construction and never recomputed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleRecord {
    pub branch: String,
    pub product: String,
    pub quantity: f64,
    pub unit_price: f64,
    pub revenue: f64,
    /// Non-pipeline columns keyed by header name, in header order.
    #[serde(default)]
    pub extra: IndexMap<String, CellValue>,
}

impl SaleRecord {
    pub fn new(
        branch: impl Into<String>,
        product: impl Into<String>,
        quantity: f64,
        unit_price: f64,
        extra: IndexMap<String, CellValue>,
    ) -> Self {
        Self {
            branch: branch.into(),
            product: product.into(),
            quantity,
            unit_price,
            revenue: quantity * unit_price,
            extra,
        }
    }

    /// The value this record holds for `column`.
    pub fn value(&self, column: &ColumnDef) -> CellValue {
        match column.role {
            ColumnRole::Branch => CellValue::Text(self.branch.clone()),
            ColumnRole::Product => CellValue::Text(self.product.clone()),
            ColumnRole::Quantity => CellValue::Number(self.quantity),
            ColumnRole::UnitPrice => CellValue::Number(self.unit_price),
            ColumnRole::Revenue => CellValue::Number(self.revenue),
            ColumnRole::Extra => self.extra.get(&column.name).cloned().unwrap_or_default(),
        }
    }
}

// ── UnifiedTable ──────────────────────────────────────────────────────────────

/// All loaded sales rows, in file-discovery order then row order.
///
/// Immutable once built: there are no mutating accessors.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnifiedTable {
    columns: Vec<ColumnDef>,
    records: Vec<SaleRecord>,
}

impl UnifiedTable {
    /// Build a table from the source columns of the first loaded file.
    ///
    /// The derived revenue column is appended after the source columns.
    pub fn from_source(mut columns: Vec<ColumnDef>, records: Vec<SaleRecord>) -> Self {
        columns.retain(|c| c.role != ColumnRole::Revenue);
        columns.push(ColumnDef::new(REVENUE_COLUMN, ColumnRole::Revenue));
        Self { columns, records }
    }

    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    pub fn records(&self) -> &[SaleRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

// ── Derived structures ────────────────────────────────────────────────────────

/// A group key with its summed value (revenue or quantity).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupTotal {
    pub key: String,
    pub value: f64,
}

impl GroupTotal {
    pub fn new(key: impl Into<String>, value: f64) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }
}

/// Sort direction for ranked aggregates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

/// Headline numbers shown above the charts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryMetrics {
    /// Sum of `revenue` over every row.
    pub total_revenue: f64,
    /// Sum of `quantity` over every row.
    pub total_quantity: f64,
    /// Branch with the highest summed revenue.
    pub best_branch: String,
    /// Revenue of [`Self::best_branch`].
    pub best_branch_revenue: f64,
    pub row_count: usize,
    pub branch_count: usize,
    pub product_count: usize,
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record(branch: &str, product: &str, quantity: f64, unit_price: f64) -> SaleRecord {
        SaleRecord::new(branch, product, quantity, unit_price, IndexMap::new())
    }

    #[test]
    fn test_sale_record_derives_revenue() {
        let r = record("North", "Widget", 10.0, 2.5);
        assert!((r.revenue - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_sale_record_value_by_role() {
        let mut extra = IndexMap::new();
        extra.insert("vendedor".to_string(), CellValue::Text("Ana".to_string()));
        let r = SaleRecord::new("North", "Widget", 3.0, 4.0, extra);

        let branch = ColumnDef::new("filial", ColumnRole::Branch);
        let revenue = ColumnDef::new(REVENUE_COLUMN, ColumnRole::Revenue);
        let seller = ColumnDef::new("vendedor", ColumnRole::Extra);
        let missing = ColumnDef::new("regiao", ColumnRole::Extra);

        assert_eq!(r.value(&branch), CellValue::Text("North".to_string()));
        assert_eq!(r.value(&revenue), CellValue::Number(12.0));
        assert_eq!(r.value(&seller), CellValue::Text("Ana".to_string()));
        assert_eq!(r.value(&missing), CellValue::Empty);
    }

    #[test]
    fn test_unified_table_appends_revenue_column() {
        let columns = vec![
            ColumnDef::new("filial", ColumnRole::Branch),
            ColumnDef::new("produto", ColumnRole::Product),
        ];
        let table = UnifiedTable::from_source(columns, vec![record("A", "B", 1.0, 1.0)]);

        let names: Vec<&str> = table.columns().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["filial", "produto", REVENUE_COLUMN]);
        assert_eq!(table.len(), 1);
        assert!(!table.is_empty());
    }

    #[test]
    fn test_unified_table_never_duplicates_revenue_column() {
        let columns = vec![
            ColumnDef::new("filial", ColumnRole::Branch),
            ColumnDef::new(REVENUE_COLUMN, ColumnRole::Revenue),
        ];
        let table = UnifiedTable::from_source(columns, vec![]);
        let revenue_cols = table
            .columns()
            .iter()
            .filter(|c| c.role == ColumnRole::Revenue)
            .count();
        assert_eq!(revenue_cols, 1);
        assert!(table.is_empty());
    }

    #[test]
    fn test_cell_value_display() {
        assert_eq!(CellValue::Empty.to_string(), "");
        assert_eq!(CellValue::Number(15.0).to_string(), "15");
        assert_eq!(CellValue::Number(2.5).to_string(), "2.5");
        assert_eq!(CellValue::Text("Sul".to_string()).to_string(), "Sul");

        let date = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(CellValue::DateTime(date).to_string(), "2024-03-01");
    }

    #[test]
    fn test_cell_value_is_blank() {
        assert!(CellValue::Empty.is_blank());
        assert!(CellValue::Text("   ".to_string()).is_blank());
        assert!(!CellValue::Number(0.0).is_blank());
    }

    #[test]
    fn test_column_mapping_defaults() {
        let mapping = ColumnMapping::default();
        let required = mapping.required();
        assert_eq!(required[0], (ColumnRole::Branch, "filial"));
        assert_eq!(required[3], (ColumnRole::UnitPrice, "valor_unitario"));
    }

    #[test]
    fn test_summary_metrics_serializes() {
        let metrics = SummaryMetrics {
            total_revenue: 35.0,
            total_quantity: 15.0,
            best_branch: "North".to_string(),
            best_branch_revenue: 20.0,
            row_count: 2,
            branch_count: 2,
            product_count: 1,
        };
        let json = serde_json::to_value(&metrics).unwrap();
        assert_eq!(json["best_branch"], "North");
        assert_eq!(json["total_revenue"], 35.0);
    }
}
