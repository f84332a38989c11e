//! Branch detail table, branch selector and message screens.
//!
//! Renders a bordered [`ratatui::widgets::Table`] with one row per sale of the
//! selected branch, every source column plus revenue, and a highlighted totals
//! row at the bottom.

use ratatui::{
    layout::{Constraint, Rect},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use dashboard_core::error::DashboardError;
use dashboard_core::formatting;
use dashboard_core::models::{CellValue, ColumnDef, ColumnRole, SaleRecord};
use dashboard_runtime::data::aggregator::FilteredView;

use crate::themes::Theme;

/// Widest a single column is allowed to grow, in terminal columns.
const MAX_COLUMN_WIDTH: usize = 28;

/// Text shown in one table cell.
pub fn cell_text(record: &SaleRecord, column: &ColumnDef) -> String {
    match column.role {
        ColumnRole::Quantity => formatting::format_quantity(record.quantity),
        ColumnRole::UnitPrice => formatting::format_number(record.unit_price, 2),
        ColumnRole::Revenue => formatting::format_number(record.revenue, 2),
        _ => match record.value(column) {
            CellValue::Number(n) => formatting::format_quantity(n),
            other => other.to_string(),
        },
    }
}

/// Column widths fitted to the header and the widest cell, capped at
/// [`MAX_COLUMN_WIDTH`].
pub fn column_widths<'a, I>(columns: &[ColumnDef], rows: I) -> Vec<u16>
where
    I: IntoIterator<Item = &'a Vec<String>> + Clone,
{
    columns
        .iter()
        .enumerate()
        .map(|(i, column)| {
            let widest = rows
                .clone()
                .into_iter()
                .filter_map(|row| row.get(i))
                .map(|text| text.width())
                .chain(std::iter::once(column.name.width()))
                .max()
                .unwrap_or(0);
            widest.clamp(1, MAX_COLUMN_WIDTH) as u16
        })
        .collect()
}

/// Render the rows of one branch, starting at row `scroll`.
pub fn render_branch_table(
    frame: &mut Frame,
    area: Rect,
    view: &FilteredView<'_>,
    scroll: usize,
    currency_symbol: &str,
    theme: &Theme,
) {
    let texts: Vec<Vec<String>> = view
        .records
        .iter()
        .map(|record| view.columns.iter().map(|c| cell_text(record, c)).collect())
        .collect();

    let header = Row::new(
        view.columns
            .iter()
            .map(|c| Cell::from(c.name.clone()).style(theme.table_header)),
    )
    .height(1);

    // Borders, header and totals row take four lines.
    let visible = area.height.saturating_sub(4) as usize;
    let start = scroll.min(texts.len().saturating_sub(visible.max(1)));

    let data_rows: Vec<Row> = texts
        .iter()
        .enumerate()
        .skip(start)
        .take(visible)
        .map(|(i, row)| {
            let style = if i % 2 == 0 {
                theme.table_row
            } else {
                theme.table_row_alt
            };
            Row::new(row.iter().cloned().map(Cell::from)).style(style)
        })
        .collect();

    let totals: Vec<String> = view
        .columns
        .iter()
        .enumerate()
        .map(|(i, column)| match column.role {
            ColumnRole::Revenue => formatting::format_currency(view.revenue(), currency_symbol),
            ColumnRole::Quantity => {
                formatting::format_quantity(view.records.iter().map(|r| r.quantity).sum())
            }
            _ if i == 0 => format!("TOTAL ({} rows)", view.len()),
            _ => String::new(),
        })
        .collect();

    let widths: Vec<Constraint> = column_widths(
        view.columns,
        texts.iter().chain(std::iter::once(&totals)),
    )
    .into_iter()
    .map(Constraint::Length)
    .collect();

    let mut all_rows = data_rows;
    all_rows.push(Row::new(totals.into_iter().map(Cell::from)).style(theme.table_total));

    let title = if texts.is_empty() {
        format!(" {} ", view.branch)
    } else {
        format!(
            " {} · rows {}-{} of {} ",
            view.branch,
            start + 1,
            (start + visible).min(texts.len()),
            texts.len()
        )
    };

    let table = Table::new(all_rows, widths)
        .header(header)
        .column_spacing(2)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(theme.table_border)
                .title(title),
        )
        .style(theme.text);

    frame.render_widget(table, area);
}

/// Selector line listing every branch, the selected one highlighted.
pub fn branch_tabs_line<'a>(branches: &'a [String], selected: usize, theme: &Theme) -> Line<'a> {
    let mut spans = vec![Span::styled("Branch: ", theme.label)];
    for (i, branch) in branches.iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled(" │ ", theme.separator));
        }
        let style = if i == selected {
            theme.tab_selected
        } else {
            theme.tab
        };
        spans.push(Span::styled(format!(" {} ", branch), style));
    }
    Line::from(spans)
}

/// Render the "no data" screen shown when no file loaded.
pub fn render_no_data(frame: &mut Frame, area: Rect, pattern: &str, theme: &Theme) {
    let text = vec![
        Line::from(""),
        Line::from(Span::styled(
            DashboardError::NoSourceFiles(pattern.to_string()).to_string(),
            theme.warning,
        )),
        Line::from(""),
        Line::from(Span::styled(
            "Add spreadsheets to the data directory and press 'r' to reload.",
            theme.dim,
        )),
        Line::from(Span::styled("Press 'q' or Ctrl+C to exit", theme.dim)),
    ];
    render_message(frame, area, text, theme);
}

/// Render the error screen shown when the load aborted.
pub fn render_load_error(frame: &mut Frame, area: Rect, message: &str, theme: &Theme) {
    let text = vec![
        Line::from(""),
        Line::from(Span::styled("Could not load sales data", theme.error)),
        Line::from(""),
        Line::from(Span::styled(message.to_string(), theme.text)),
        Line::from(""),
        Line::from(Span::styled("Press 'r' to retry, 'q' to exit", theme.dim)),
    ];
    render_message(frame, area, text, theme);
}

fn render_message(frame: &mut Frame, area: Rect, lines: Vec<Line<'_>>, theme: &Theme) {
    frame.render_widget(
        Paragraph::new(Text::from(lines))
            .wrap(ratatui::widgets::Wrap { trim: true })
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(theme.table_border)
                    .title(" Sales Dashboard "),
            ),
        area,
    );
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use dashboard_core::models::UnifiedTable;
    use dashboard_runtime::data::aggregator::SalesAggregator;
    use indexmap::IndexMap;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    fn make_table() -> UnifiedTable {
        let columns = vec![
            ColumnDef::new("filial", ColumnRole::Branch),
            ColumnDef::new("produto", ColumnRole::Product),
            ColumnDef::new("quantidade", ColumnRole::Quantity),
            ColumnDef::new("valor_unitario", ColumnRole::UnitPrice),
            ColumnDef::new("vendedor", ColumnRole::Extra),
        ];
        let mut extra = IndexMap::new();
        extra.insert("vendedor".to_string(), CellValue::Text("Ana".to_string()));
        let records = vec![
            SaleRecord::new("North", "Widget", 10.0, 2.0, extra),
            SaleRecord::new("South", "Widget", 5.0, 3.0, IndexMap::new()),
            SaleRecord::new("North", "Gadget", 1.5, 1000.0, IndexMap::new()),
        ];
        UnifiedTable::from_source(columns, records)
    }

    fn buffer_text(terminal: &Terminal<TestBackend>) -> String {
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    // ── Cell text ─────────────────────────────────────────────────────────────

    #[test]
    fn test_cell_text_by_role() {
        let table = make_table();
        let record = &table.records()[2];
        let text: Vec<String> = table.columns().iter().map(|c| cell_text(record, c)).collect();
        assert_eq!(text, vec!["North", "Gadget", "1.50", "1,000.00", "", "1,500.00"]);
    }

    #[test]
    fn test_column_widths_fit_header_and_cells() {
        let columns = vec![
            ColumnDef::new("a", ColumnRole::Branch),
            ColumnDef::new("long header", ColumnRole::Product),
            ColumnDef::new("x", ColumnRole::Extra),
        ];
        let rows = vec![vec![
            "abcdef".to_string(),
            "b".to_string(),
            "y".repeat(100),
        ]];
        assert_eq!(column_widths(&columns, &rows), vec![6, 11, 28]);
    }

    // ── Branch tabs ───────────────────────────────────────────────────────────

    #[test]
    fn test_branch_tabs_line_highlights_selected() {
        let theme = Theme::dark();
        let branches = vec!["North".to_string(), "South".to_string()];
        let line = branch_tabs_line(&branches, 1, &theme);

        let south = line
            .spans
            .iter()
            .find(|s| s.content.contains("South"))
            .unwrap();
        assert_eq!(south.style, theme.tab_selected);
        let north = line
            .spans
            .iter()
            .find(|s| s.content.contains("North"))
            .unwrap();
        assert_eq!(north.style, theme.tab);
    }

    // ── Render (does not panic) ───────────────────────────────────────────────

    #[test]
    fn test_render_branch_table_shows_branch_rows() {
        let table = make_table();
        let view = SalesAggregator::filter_by_branch(&table, "North");
        let mut terminal = Terminal::new(TestBackend::new(120, 12)).unwrap();
        let theme = Theme::dark();

        terminal
            .draw(|frame| render_branch_table(frame, frame.area(), &view, 0, "R$", &theme))
            .unwrap();

        let text = buffer_text(&terminal);
        assert!(text.contains("Gadget"));
        assert!(text.contains("TOTAL (2 rows)"));
        assert!(!text.contains("South"));
    }

    #[test]
    fn test_render_branch_table_scroll_past_end_does_not_panic() {
        let table = make_table();
        let view = SalesAggregator::filter_by_branch(&table, "North");
        let mut terminal = Terminal::new(TestBackend::new(80, 6)).unwrap();
        let theme = Theme::light();

        terminal
            .draw(|frame| render_branch_table(frame, frame.area(), &view, 99, "R$", &theme))
            .unwrap();
    }

    #[test]
    fn test_render_branch_table_empty_view_does_not_panic() {
        let table = make_table();
        let view = SalesAggregator::filter_by_branch(&table, "Nonexistent");
        let mut terminal = Terminal::new(TestBackend::new(80, 10)).unwrap();
        let theme = Theme::dark();

        terminal
            .draw(|frame| render_branch_table(frame, frame.area(), &view, 0, "", &theme))
            .unwrap();
    }

    #[test]
    fn test_render_no_data_mentions_pattern() {
        let mut terminal = Terminal::new(TestBackend::new(80, 10)).unwrap();
        let theme = Theme::dark();

        terminal
            .draw(|frame| render_no_data(frame, frame.area(), "vendas_*.xlsx", &theme))
            .unwrap();

        assert!(buffer_text(&terminal).contains("No sales files found matching vendas_*.xlsx"));
    }

    #[test]
    fn test_render_load_error_does_not_panic() {
        let mut terminal = Terminal::new(TestBackend::new(40, 10)).unwrap();
        let theme = Theme::classic();

        terminal
            .draw(|frame| {
                render_load_error(frame, frame.area(), "Invalid file pattern 'vendas_['", &theme)
            })
            .unwrap();
    }
}
