//! Non-interactive outputs: plain-text report and JSON.

use std::fmt::Write as _;

use anyhow::{anyhow, Result};
use serde_json::{json, Value};

use dashboard_core::error::DashboardError;
use dashboard_core::formatting::{format_currency, format_number, format_quantity};
use dashboard_runtime::{DashboardState, LoadState};

const LABEL_WIDTH: usize = 24;

/// Plain-text summary of the loaded data.
///
/// `branch` appends that branch's rows. A failed load is an error; a load
/// with no files produces the "no data" message.
pub fn render_report(state: &DashboardState, currency: &str, branch: Option<&str>) -> Result<String> {
    let pattern = &state.options().pattern;
    let mut out = String::new();

    let report = match state.state() {
        LoadState::Failed { message } => return Err(anyhow!(message.clone())),
        LoadState::NoData { .. } => {
            writeln!(out, "{}", DashboardError::NoSourceFiles(pattern.clone()))?;
            return Ok(out);
        }
        LoadState::Ready { report, .. } => report,
    };
    let Some(products) = state.products() else {
        return Ok(out);
    };

    writeln!(out, "SALES DASHBOARD")?;
    writeln!(out, "{}", "=".repeat(60))?;
    writeln!(
        out,
        "[ {} | {} files | {} rows ]",
        pattern,
        report.files_loaded.len(),
        products.row_count
    )?;
    writeln!(out)?;

    writeln!(
        out,
        "{:<w$}{}",
        "Total revenue",
        format_currency(products.total_revenue, currency),
        w = LABEL_WIDTH
    )?;
    writeln!(
        out,
        "{:<w$}{}",
        "Items sold",
        format_quantity(products.total_quantity),
        w = LABEL_WIDTH
    )?;
    match &products.best_branch {
        Some(best) => writeln!(
            out,
            "{:<w$}{} ({})",
            "Best branch",
            best.key,
            format_currency(best.value, currency),
            w = LABEL_WIDTH
        )?,
        None => writeln!(out, "{:<w$}n/a", "Best branch", w = LABEL_WIDTH)?,
    }

    writeln!(out)?;
    writeln!(out, "Revenue by branch")?;
    writeln!(out, "{}", "-".repeat(40))?;
    for group in &products.revenue_by_branch {
        writeln!(
            out,
            "{:<w$}{}",
            group.key,
            format_currency(group.value, currency),
            w = LABEL_WIDTH
        )?;
    }

    writeln!(out)?;
    writeln!(out, "Items sold by product")?;
    writeln!(out, "{}", "-".repeat(40))?;
    for group in &products.quantity_by_product {
        writeln!(
            out,
            "{:<w$}{}",
            group.key,
            format_quantity(group.value),
            w = LABEL_WIDTH
        )?;
    }

    if let Some(name) = branch {
        writeln!(out)?;
        writeln!(out, "Sales of {}", name)?;
        writeln!(out, "{}", "-".repeat(40))?;
        match state.filtered(name) {
            Some(view) if !view.is_empty() => {
                for record in &view.records {
                    writeln!(
                        out,
                        "{:<w$}{:>10} x {:>12} = {:>14}",
                        record.product,
                        format_quantity(record.quantity),
                        format_number(record.unit_price, 2),
                        format_number(record.revenue, 2),
                        w = LABEL_WIDTH
                    )?;
                }
                writeln!(
                    out,
                    "{:<w$}{}",
                    "Total",
                    format_currency(view.revenue(), currency),
                    w = LABEL_WIDTH
                )?;
            }
            _ => writeln!(out, "No rows for branch {}", name)?,
        }
    }

    if report.has_warnings() {
        writeln!(out)?;
        writeln!(
            out,
            "Skipped {} files and {} rows:",
            report.file_errors.len(),
            report.row_errors.len()
        )?;
        for error in &report.file_errors {
            writeln!(out, "  {}: {}", error.path.display(), error.message)?;
        }
        for error in &report.row_errors {
            writeln!(
                out,
                "  {} row {} ({}): {}",
                error.path.display(),
                error.row,
                error.column,
                error.message
            )?;
        }
    }

    Ok(out)
}

/// JSON document with the load report and every data product.
pub fn render_json(state: &DashboardState, branch: Option<&str>) -> Result<Value> {
    let value = match state.state() {
        LoadState::Failed { message } => return Err(anyhow!(message.clone())),
        LoadState::NoData { report } => json!({
            "status": "no_data",
            "report": report,
        }),
        LoadState::Ready { report, .. } => {
            let mut value = json!({
                "status": "ready",
                "report": report,
                "products": state.products(),
            });
            if let Some(view) = branch.and_then(|name| state.filtered(name)) {
                value["filtered"] = json!({
                    "branch": view.branch,
                    "revenue": view.revenue(),
                    "rows": view.records,
                });
            }
            value
        }
    };
    Ok(value)
}

// ── Tests ──────────────────────────────────────────────────────────────────────
