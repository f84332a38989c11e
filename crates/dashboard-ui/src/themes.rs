use ratatui::style::{Color, Modifier, Style};

/// Terminal background type detection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BackgroundType {
    Dark,
    Light,
}

/// Detect terminal background type from the `COLORFGBG` environment variable.
///
/// The variable has the format `"foreground;background"`. Background values
/// 0–6 are dark, 7–15 light. Absent or unparseable means dark.
pub fn detect_background() -> BackgroundType {
    std::env::var("COLORFGBG")
        .ok()
        .as_deref()
        .and_then(parse_colorfgbg)
        .unwrap_or(BackgroundType::Dark)
}

fn parse_colorfgbg(value: &str) -> Option<BackgroundType> {
    let bg = value.split(';').next_back()?.trim().parse::<u8>().ok()?;
    Some(if bg <= 6 {
        BackgroundType::Dark
    } else {
        BackgroundType::Light
    })
}

/// Every style the dashboard widgets draw with.
#[derive(Debug, Clone)]
pub struct Theme {
    // ── Header ───────────────────────────────────────────────────────────────
    pub header: Style,
    pub header_sparkle: Style,
    pub separator: Style,

    // ── Text ─────────────────────────────────────────────────────────────────
    pub text: Style,
    pub dim: Style,
    pub label: Style,
    pub value: Style,

    // ── Status ───────────────────────────────────────────────────────────────
    pub warning: Style,
    pub error: Style,

    // ── Metric cards ─────────────────────────────────────────────────────────
    pub card_border: Style,
    pub card_value: Style,

    // ── Charts ───────────────────────────────────────────────────────────────
    /// Bars at or above 80 % of the largest value.
    pub bar_high: Style,
    /// Bars between 40 % and 80 % of the largest value.
    pub bar_medium: Style,
    /// Bars below 40 % of the largest value.
    pub bar_low: Style,
    pub bar_label: Style,
    pub bar_value: Style,

    // ── Branch selector ──────────────────────────────────────────────────────
    pub tab: Style,
    pub tab_selected: Style,

    // ── Table ────────────────────────────────────────────────────────────────
    pub table_header: Style,
    pub table_border: Style,
    pub table_row: Style,
    pub table_row_alt: Style,
    pub table_total: Style,
}

impl Theme {
    // ── Constructors ─────────────────────────────────────────────────────────

    /// Dark-background terminal theme (default).
    pub fn dark() -> Self {
        Self {
            header: Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            header_sparkle: Style::default().fg(Color::Yellow),
            separator: Style::default().fg(Color::DarkGray),

            text: Style::default().fg(Color::White),
            dim: Style::default().fg(Color::DarkGray),
            label: Style::default().fg(Color::Gray),
            value: Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),

            warning: Style::default().fg(Color::Yellow),
            error: Style::default().fg(Color::Red),

            card_border: Style::default().fg(Color::DarkGray),
            card_value: Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),

            bar_high: Style::default().fg(Color::Green),
            bar_medium: Style::default().fg(Color::Cyan),
            bar_low: Style::default().fg(Color::Blue),
            bar_label: Style::default().fg(Color::Gray),
            bar_value: Style::default()
                .fg(Color::Black)
                .bg(Color::Green),

            tab: Style::default().fg(Color::Gray),
            tab_selected: Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD),

            table_header: Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            table_border: Style::default().fg(Color::DarkGray),
            table_row: Style::default().fg(Color::White),
            table_row_alt: Style::default().fg(Color::Gray),
            table_total: Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        }
    }

    /// Light-background terminal theme.
    pub fn light() -> Self {
        Self {
            header: Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::BOLD),
            header_sparkle: Style::default().fg(Color::Magenta),
            separator: Style::default().fg(Color::Gray),

            text: Style::default().fg(Color::Black),
            dim: Style::default().fg(Color::Gray),
            label: Style::default().fg(Color::DarkGray),
            value: Style::default()
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),

            warning: Style::default().fg(Color::Yellow),
            error: Style::default().fg(Color::Red),

            card_border: Style::default().fg(Color::Gray),
            card_value: Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::BOLD),

            bar_high: Style::default().fg(Color::Blue),
            bar_medium: Style::default().fg(Color::Magenta),
            bar_low: Style::default().fg(Color::DarkGray),
            bar_label: Style::default().fg(Color::DarkGray),
            bar_value: Style::default().fg(Color::White).bg(Color::Blue),

            tab: Style::default().fg(Color::DarkGray),
            tab_selected: Style::default()
                .fg(Color::White)
                .bg(Color::Blue)
                .add_modifier(Modifier::BOLD),

            table_header: Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::BOLD),
            table_border: Style::default().fg(Color::Gray),
            table_row: Style::default().fg(Color::Black),
            table_row_alt: Style::default().fg(Color::DarkGray),
            table_total: Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::BOLD),
        }
    }

    /// Basic 8-colour ANSI palette, no bold.
    pub fn classic() -> Self {
        Self {
            header: Style::default().fg(Color::Cyan),
            header_sparkle: Style::default().fg(Color::White),
            separator: Style::default().fg(Color::DarkGray),

            text: Style::default().fg(Color::White),
            dim: Style::default().fg(Color::DarkGray),
            label: Style::default().fg(Color::Gray),
            value: Style::default().fg(Color::White),

            warning: Style::default().fg(Color::Yellow),
            error: Style::default().fg(Color::Red),

            card_border: Style::default().fg(Color::DarkGray),
            card_value: Style::default().fg(Color::Green),

            bar_high: Style::default().fg(Color::Green),
            bar_medium: Style::default().fg(Color::Yellow),
            bar_low: Style::default().fg(Color::Cyan),
            bar_label: Style::default().fg(Color::White),
            bar_value: Style::default().fg(Color::Black).bg(Color::White),

            tab: Style::default().fg(Color::Gray),
            tab_selected: Style::default().fg(Color::Black).bg(Color::White),

            table_header: Style::default().fg(Color::Cyan),
            table_border: Style::default().fg(Color::DarkGray),
            table_row: Style::default().fg(Color::White),
            table_row_alt: Style::default().fg(Color::Gray),
            table_total: Style::default().fg(Color::Yellow),
        }
    }

    /// Choose a theme from the detected terminal background.
    pub fn auto_detect() -> Self {
        match detect_background() {
            BackgroundType::Light => Self::light(),
            BackgroundType::Dark => Self::dark(),
        }
    }

    /// Construct a theme by name. Unknown names (and `auto`) detect.
    pub fn from_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "light" => Self::light(),
            "dark" => Self::dark(),
            "classic" => Self::classic(),
            _ => Self::auto_detect(),
        }
    }

    // ── Style helpers ────────────────────────────────────────────────────────

    /// Bar colour for a value that is `share` percent of the chart maximum.
    pub fn bar_style(&self, share: f64) -> Style {
        if share >= 80.0 {
            self.bar_high
        } else if share >= 40.0 {
            self.bar_medium
        } else {
            self.bar_low
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
