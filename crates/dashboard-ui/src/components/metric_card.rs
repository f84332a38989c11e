use crate::themes::Theme;
use ratatui::{
    layout::{Alignment, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

/// A bordered card with a title, a large value and an optional detail line.
pub struct MetricCard<'a> {
    pub title: &'a str,
    pub value: String,
    pub detail: Option<String>,
    pub theme: &'a Theme,
}

impl<'a> MetricCard<'a> {
    pub fn new(title: &'a str, value: impl Into<String>, theme: &'a Theme) -> Self {
        Self {
            title,
            value: value.into(),
            detail: None,
            theme,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn to_lines(&self) -> Vec<Line<'a>> {
        let mut lines = vec![Line::from(Span::styled(
            self.value.clone(),
            self.theme.card_value,
        ))];
        if let Some(detail) = &self.detail {
            lines.push(Line::from(Span::styled(detail.clone(), self.theme.dim)));
        }
        lines
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(self.theme.card_border)
            .title(Span::styled(format!(" {} ", self.title), self.theme.label));
        let paragraph = Paragraph::new(self.to_lines())
            .alignment(Alignment::Center)
            .block(block);
        frame.render_widget(paragraph, area);
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
