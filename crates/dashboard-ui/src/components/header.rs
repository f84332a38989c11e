use crate::themes::Theme;
use ratatui::text::{Line, Span};

/// Decorative sparkle string placed either side of the application title.
pub const SPARKLES: &str = "✦ ✧ ✦ ✧";

/// Width of the `=` rule under the title.
const SEPARATOR_WIDTH: usize = 60;

/// Dashboard header rendering four lines:
///
/// 1. Title with sparkle decorations.
/// 2. A 60-column `=` separator.
/// 3. Source information in `[ pattern | N files ]` format.
/// 4. An empty line.
pub struct Header<'a> {
    /// Discovery pattern the data was loaded from.
    pub pattern: &'a str,
    /// Number of files that contributed rows.
    pub files_loaded: usize,
    pub theme: &'a Theme,
}

impl<'a> Header<'a> {
    pub fn new(pattern: &'a str, files_loaded: usize, theme: &'a Theme) -> Self {
        Self {
            pattern,
            files_loaded,
            theme,
        }
    }

    pub fn to_lines(&self) -> Vec<Line<'a>> {
        let files = match self.files_loaded {
            1 => "1 file".to_string(),
            n => format!("{} files", n),
        };

        vec![
            Line::from(vec![
                Span::styled(SPARKLES, self.theme.header_sparkle),
                Span::styled(" SALES DASHBOARD ", self.theme.header),
                Span::styled(SPARKLES, self.theme.header_sparkle),
            ]),
            Line::from(Span::styled(
                "=".repeat(SEPARATOR_WIDTH),
                self.theme.separator,
            )),
            Line::from(vec![
                Span::styled("[ ", self.theme.label),
                Span::styled(self.pattern, self.theme.value),
                Span::styled(" | ", self.theme.label),
                Span::styled(files, self.theme.value),
                Span::styled(" ]", self.theme.label),
            ]),
            Line::from(""),
        ]
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
