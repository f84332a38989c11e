use crate::themes::Theme;
use dashboard_core::formatting;
use ratatui::text::{Line, Span};
use unicode_width::UnicodeWidthStr;

/// Configuration controlling visual appearance of a share bar.
pub struct ShareBarConfig {
    /// Width in terminal columns of the bar portion (excluding labels).
    pub width: u16,
    /// Columns reserved for the left-hand label.
    pub label_width: usize,
    pub filled_char: char,
    pub empty_char: char,
}

impl Default for ShareBarConfig {
    fn default() -> Self {
        Self {
            width: 30,
            label_width: 18,
            filled_char: '\u{2588}', // █  FULL BLOCK
            empty_char: '\u{2591}',  // ░  LIGHT SHADE
        }
    }
}

// ── ShareBar ──────────────────────────────────────────────────────────────────

/// One labelled horizontal bar showing `value` relative to `max`.
///
/// Renders as `"<label>  ████░░░░ <value>"`; used for the product ranking.
pub struct ShareBar<'a> {
    pub label: &'a str,
    pub value: f64,
    /// Share of the maximum, clamped to `[0.0, 100.0]`.
    pub percentage: f64,
    pub theme: &'a Theme,
    pub config: ShareBarConfig,
}

impl<'a> ShareBar<'a> {
    /// Construct a bar for `value` out of `max`.
    pub fn new(label: &'a str, value: f64, max: f64, theme: &'a Theme) -> Self {
        let percentage = formatting::percentage(value, max).clamp(0.0, 100.0);
        Self {
            label,
            value,
            percentage,
            theme,
            config: ShareBarConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ShareBarConfig) -> Self {
        self.config = config;
        self
    }

    pub fn to_line(&self) -> Line<'a> {
        let filled = ((self.percentage / 100.0) * self.config.width as f64).round() as u16;
        let filled = filled.min(self.config.width);
        let empty = self.config.width - filled;

        let filled_str = self.config.filled_char.to_string().repeat(filled as usize);
        let empty_str = self.config.empty_char.to_string().repeat(empty as usize);

        Line::from(vec![
            Span::styled(
                fit_label(self.label, self.config.label_width),
                self.theme.bar_label,
            ),
            Span::raw(" "),
            Span::styled(filled_str, self.theme.bar_style(self.percentage)),
            Span::styled(empty_str, self.theme.dim),
            Span::styled(
                format!(" {}", formatting::format_quantity(self.value)),
                self.theme.value,
            ),
        ])
    }
}

/// Pad or truncate `label` to exactly `width` display columns.
pub fn fit_label(label: &str, width: usize) -> String {
    if label.width() <= width {
        let pad = width - label.width();
        return format!("{}{}", label, " ".repeat(pad));
    }

    let mut out = String::new();
    let mut used = 0;
    for ch in label.chars() {
        let w = unicode_width::UnicodeWidthChar::width(ch).unwrap_or(0);
        if used + w + 1 > width {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.push('…');
    used += 1;
    out.push_str(&" ".repeat(width.saturating_sub(used)));
    out
}

// ── Tests ─────────────────────────────────────────────────────────────────────
