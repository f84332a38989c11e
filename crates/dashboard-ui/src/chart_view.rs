//! Revenue-by-branch bar chart and product ranking panels.

use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Bar, BarChart, BarGroup, Block, Borders, Paragraph},
    Frame,
};

use dashboard_core::formatting;
use dashboard_core::models::GroupTotal;

use crate::components::share_bar::{ShareBar, ShareBarConfig};
use crate::themes::Theme;

/// Narrowest bar drawn, in columns.
const MIN_BAR_WIDTH: u16 = 5;
/// Widest bar drawn, in columns.
const MAX_BAR_WIDTH: u16 = 16;
const BAR_GAP: u16 = 2;

/// Chart heights are integers; negative sums draw as empty bars.
pub fn bar_value(value: f64) -> u64 {
    if value.is_finite() && value > 0.0 {
        value.round() as u64
    } else {
        0
    }
}

/// Bar width that fits `count` bars into `inner_width` columns.
pub fn bar_width(inner_width: u16, count: usize) -> u16 {
    if count == 0 {
        return MIN_BAR_WIDTH;
    }
    let count = count.min(u16::MAX as usize) as u16;
    let gaps = BAR_GAP.saturating_mul(count.saturating_sub(1));
    (inner_width.saturating_sub(gaps) / count).clamp(MIN_BAR_WIDTH, MAX_BAR_WIDTH)
}

/// Render revenue per branch as a vertical bar chart.
///
/// Each bar carries the branch name below it and its compact revenue inside.
pub fn render_revenue_chart(
    frame: &mut Frame,
    area: Rect,
    groups: &[GroupTotal],
    currency_symbol: &str,
    theme: &Theme,
) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme.table_border)
        .title(Span::styled(" Revenue by branch ", theme.header));

    if groups.is_empty() {
        frame.render_widget(empty_panel(block, theme), area);
        return;
    }

    let max = groups.iter().map(|g| g.value).fold(0.0_f64, f64::max);
    let bars: Vec<Bar> = groups
        .iter()
        .map(|group| {
            let style = theme.bar_style(formatting::percentage(group.value, max));
            Bar::default()
                .value(bar_value(group.value))
                .label(Line::from(group.key.clone()))
                .text_value(format!(
                    "{}{}",
                    currency_prefix(currency_symbol),
                    formatting::format_compact(group.value)
                ))
                .style(style)
                .value_style(theme.bar_value)
        })
        .collect();

    let inner_width = area.width.saturating_sub(2);
    let chart = BarChart::default()
        .block(block)
        .data(BarGroup::default().bars(&bars))
        .bar_width(bar_width(inner_width, bars.len()))
        .bar_gap(BAR_GAP)
        .max(bar_value(max).max(1))
        .label_style(theme.bar_label);

    frame.render_widget(chart, area);
}

/// Render the product ranking as one share bar per product, in the order
/// supplied (ascending quantity).
pub fn render_product_ranking(frame: &mut Frame, area: Rect, groups: &[GroupTotal], theme: &Theme) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme.table_border)
        .title(Span::styled(" Items sold by product ", theme.header));

    if groups.is_empty() {
        frame.render_widget(empty_panel(block, theme), area);
        return;
    }

    let max = groups.iter().map(|g| g.value).fold(0.0_f64, f64::max);
    let inner_width = area.width.saturating_sub(2) as usize;
    let label_width = (inner_width / 3).clamp(6, 24);
    // label + space + bar + " value"
    let bar_width = inner_width.saturating_sub(label_width + 1 + 10).max(1);

    let lines: Vec<Line> = groups
        .iter()
        .map(|group| {
            ShareBar::new(&group.key, group.value, max, theme)
                .with_config(ShareBarConfig {
                    width: bar_width.min(u16::MAX as usize) as u16,
                    label_width,
                    ..ShareBarConfig::default()
                })
                .to_line()
        })
        .collect();

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn currency_prefix(symbol: &str) -> String {
    if symbol.is_empty() {
        String::new()
    } else {
        format!("{} ", symbol)
    }
}

fn empty_panel<'a>(block: Block<'a>, theme: &Theme) -> Paragraph<'a> {
    Paragraph::new(Line::from(Span::styled("No rows", theme.dim)))
        .style(Style::default())
        .block(block)
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    fn groups() -> Vec<GroupTotal> {
        vec![GroupTotal::new("North", 20.0), GroupTotal::new("South", 15.0)]
    }

    // ── Helpers ──────────────────────────────────────────────────────────────

    #[test]
    fn test_bar_value() {
        assert_eq!(bar_value(20.4), 20);
        assert_eq!(bar_value(20.6), 21);
        assert_eq!(bar_value(-5.0), 0);
        assert_eq!(bar_value(f64::NAN), 0);
    }

    #[test]
    fn test_bar_width_bounds() {
        assert_eq!(bar_width(100, 0), MIN_BAR_WIDTH);
        assert_eq!(bar_width(200, 2), MAX_BAR_WIDTH);
        assert_eq!(bar_width(10, 10), MIN_BAR_WIDTH);
        // (40 - 2*2) / 3 = 12
        assert_eq!(bar_width(40, 3), 12);
    }

    // ── Render (does not panic) ──────────────────────────────────────────────

    #[test]
    fn test_render_revenue_chart_does_not_panic() {
        let mut terminal = Terminal::new(TestBackend::new(60, 15)).unwrap();
        let theme = Theme::dark();
        terminal
            .draw(|frame| render_revenue_chart(frame, frame.area(), &groups(), "R$", &theme))
            .unwrap();
    }

    #[test]
    fn test_render_revenue_chart_many_branches_narrow_area() {
        let mut terminal = Terminal::new(TestBackend::new(20, 6)).unwrap();
        let theme = Theme::light();
        let many: Vec<GroupTotal> = (0..30)
            .map(|i| GroupTotal::new(format!("B{i}"), i as f64 * 3.5))
            .collect();
        terminal
            .draw(|frame| render_revenue_chart(frame, frame.area(), &many, "", &theme))
            .unwrap();
    }

    #[test]
    fn test_render_empty_panels_do_not_panic() {
        let mut terminal = Terminal::new(TestBackend::new(40, 8)).unwrap();
        let theme = Theme::classic();
        terminal
            .draw(|frame| {
                let area = frame.area();
                render_revenue_chart(frame, area, &[], "R$", &theme);
                render_product_ranking(frame, area, &[], &theme);
            })
            .unwrap();
    }

    #[test]
    fn test_render_product_ranking_shows_products() {
        let mut terminal = Terminal::new(TestBackend::new(60, 8)).unwrap();
        let theme = Theme::dark();
        let ranking = vec![GroupTotal::new("Caderno", 7.0), GroupTotal::new("Caneta", 42.0)];
        terminal
            .draw(|frame| render_product_ranking(frame, frame.area(), &ranking, &theme))
            .unwrap();

        let buffer = terminal.backend().buffer().clone();
        let text: String = buffer.content().iter().map(|c| c.symbol()).collect();
        assert!(text.contains("Caderno"));
        assert!(text.contains("Caneta"));
        assert!(text.find("Caderno") < text.find("Caneta"));
    }
}
