//! Application state and TUI event loop for the sales dashboard.
//!
//! [`App`] owns the loaded [`DashboardState`], the theme and the selection
//! state (branch and table scroll). It redraws on every tick and reloads the
//! data only when the user presses `r`.

use std::io;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::Paragraph,
    Frame, Terminal,
};

use dashboard_core::formatting;
use dashboard_runtime::{DashboardProducts, DashboardState, LoadState};

use crate::chart_view;
use crate::components::header::Header;
use crate::components::metric_card::MetricCard;
use crate::table_view;
use crate::themes::Theme;

const TICK_RATE: Duration = Duration::from_millis(250);

// ── App ───────────────────────────────────────────────────────────────────────

/// Root application state for the dashboard TUI.
pub struct App {
    pub theme: Theme,
    pub currency_symbol: String,
    /// Set to `true` to break out of the event loop on the next iteration.
    pub should_quit: bool,
    state: DashboardState,
    /// Data products are derived from `state` on every frame; only the
    /// selection is kept between frames.
    selected: Option<String>,
    /// First visible row of the branch table.
    scroll: usize,
}

impl App {
    /// Build the app around an already loaded snapshot.
    ///
    /// `initial_branch` preselects a branch by name; an unknown name falls
    /// back to the first branch.
    pub fn new(
        state: DashboardState,
        theme_name: &str,
        currency_symbol: impl Into<String>,
        initial_branch: Option<&str>,
    ) -> Self {
        let mut app = Self {
            theme: Theme::from_name(theme_name),
            currency_symbol: currency_symbol.into(),
            should_quit: false,
            selected: state.branches().into_iter().next(),
            state,
            scroll: 0,
        };
        if let Some(name) = initial_branch {
            if !app.select_branch(name) {
                tracing::warn!(branch = name, "branch not found; showing the first branch");
            }
        }
        app
    }

    pub fn state(&self) -> &DashboardState {
        &self.state
    }

    /// Name of the selected branch, if any branch exists.
    pub fn selected_branch(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn scroll(&self) -> usize {
        self.scroll
    }

    /// Select `name`; returns `false` when no such branch exists.
    pub fn select_branch(&mut self, name: &str) -> bool {
        if !self.state.branches().iter().any(|b| b == name) {
            return false;
        }
        self.selected = Some(name.to_string());
        self.scroll = 0;
        true
    }

    /// Re-run the loader, keeping the selected branch when it still exists.
    pub fn reload(&mut self) {
        let previous = self.selected.take();
        self.state.reload();
        self.selected = self.state.branches().into_iter().next();
        self.scroll = 0;
        if let Some(name) = previous {
            self.select_branch(&name);
        }
    }

    // ── Input ─────────────────────────────────────────────────────────────────

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }
        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.should_quit = true;
            }
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('r') | KeyCode::Char('R') => self.reload(),
            KeyCode::Left | KeyCode::Char('h') => self.step_branch(-1),
            KeyCode::Right | KeyCode::Char('l') => self.step_branch(1),
            KeyCode::Up | KeyCode::Char('k') => self.scroll = self.scroll.saturating_sub(1),
            KeyCode::Down | KeyCode::Char('j') => {
                if self.scroll + 1 < self.selected_row_count() {
                    self.scroll += 1;
                }
            }
            KeyCode::Home => self.scroll = 0,
            _ => {}
        }
    }

    fn step_branch(&mut self, delta: isize) {
        let branches = self.state.branches();
        if branches.is_empty() {
            return;
        }
        let current = self
            .selected_branch()
            .and_then(|name| branches.iter().position(|b| b == name))
            .unwrap_or(0);
        let next = (current as isize + delta).rem_euclid(branches.len() as isize) as usize;
        self.selected = branches.get(next).cloned();
        self.scroll = 0;
    }

    fn selected_row_count(&self) -> usize {
        self.selected_branch()
            .and_then(|b| self.state.filtered(b))
            .map_or(0, |view| view.len())
    }

    // ── Event loop ────────────────────────────────────────────────────────────

    /// Run the dashboard until the user quits.
    ///
    /// Uses `crossterm::event::poll` with a 250 ms timeout so the loop stays
    /// responsive without busy-waiting. The terminal is restored even when
    /// drawing fails.
    pub fn run(mut self) -> io::Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let result = self.event_loop(&mut terminal);

        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        result
    }

    fn event_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    ) -> io::Result<()> {
        while !self.should_quit {
            terminal.draw(|frame| self.render(frame))?;

            if event::poll(TICK_RATE)? {
                if let Event::Key(key) = event::read()? {
                    self.handle_key(key);
                }
            }
        }
        Ok(())
    }

    // ── Rendering ─────────────────────────────────────────────────────────────

    /// Render the current application state into `frame`.
    pub fn render(&self, frame: &mut Frame) {
        let area = frame.area();
        let pattern = self.state.options().pattern.as_str();

        match self.state.state() {
            LoadState::Failed { message } => {
                table_view::render_load_error(frame, area, message, &self.theme);
            }
            LoadState::NoData { .. } => {
                table_view::render_no_data(frame, area, pattern, &self.theme);
            }
            LoadState::Ready { report, .. } => {
                let Some(products) = self.state.products() else {
                    table_view::render_no_data(frame, area, pattern, &self.theme);
                    return;
                };
                let files_loaded = report.files_loaded.len();
                let skipped = (report.file_errors.len(), report.row_errors.len());
                self.render_dashboard(frame, area, pattern, files_loaded, skipped, &products);
            }
        }
    }

    fn render_dashboard(
        &self,
        frame: &mut Frame,
        area: Rect,
        pattern: &str,
        files_loaded: usize,
        skipped: (usize, usize),
        products: &DashboardProducts,
    ) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(4),
                Constraint::Length(4),
                Constraint::Min(8),
                Constraint::Length(1),
                Constraint::Min(6),
                Constraint::Length(1),
            ])
            .split(area);

        let header = Header::new(pattern, files_loaded, &self.theme);
        frame.render_widget(Paragraph::new(header.to_lines()), rows[0]);

        self.render_cards(frame, rows[1], products);

        let charts = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(rows[2]);
        chart_view::render_revenue_chart(
            frame,
            charts[0],
            &products.revenue_by_branch,
            &self.currency_symbol,
            &self.theme,
        );
        chart_view::render_product_ranking(
            frame,
            charts[1],
            &products.quantity_by_product,
            &self.theme,
        );

        let selected = self
            .selected_branch()
            .and_then(|name| products.branches.iter().position(|b| b == name))
            .unwrap_or(0);
        frame.render_widget(
            Paragraph::new(table_view::branch_tabs_line(
                &products.branches,
                selected,
                &self.theme,
            )),
            rows[3],
        );

        match self
            .selected_branch()
            .and_then(|branch| self.state.filtered(branch))
        {
            Some(view) => table_view::render_branch_table(
                frame,
                rows[4],
                &view,
                self.scroll,
                &self.currency_symbol,
                &self.theme,
            ),
            None => frame.render_widget(
                Paragraph::new(Span::styled("No rows loaded", self.theme.dim)),
                rows[4],
            ),
        }

        frame.render_widget(Paragraph::new(self.footer_line(skipped)), rows[5]);
    }

    fn render_cards(&self, frame: &mut Frame, area: Rect, products: &DashboardProducts) {
        let cards = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Ratio(1, 3),
                Constraint::Ratio(1, 3),
                Constraint::Ratio(1, 3),
            ])
            .split(area);

        MetricCard::new(
            "Total revenue",
            formatting::format_currency(products.total_revenue, &self.currency_symbol),
            &self.theme,
        )
        .render(frame, cards[0]);

        MetricCard::new(
            "Items sold",
            formatting::format_quantity(products.total_quantity),
            &self.theme,
        )
        .with_detail(format!("{} sales", products.row_count))
        .render(frame, cards[1]);

        let best = match &products.best_branch {
            Some(best) => MetricCard::new("Best branch", best.key.clone(), &self.theme).with_detail(
                formatting::format_currency(best.value, &self.currency_symbol),
            ),
            None => MetricCard::new("Best branch", "n/a", &self.theme),
        };
        best.render(frame, cards[2]);
    }

    fn footer_line(&self, (files, rows): (usize, usize)) -> Line<'static> {
        let mut spans = vec![Span::styled(
            "←/→ branch  ↑/↓ scroll  r reload  q quit",
            self.theme.dim,
        )];
        if files > 0 || rows > 0 {
            spans.push(Span::styled(
                format!("  ⚠ skipped {} files, {} rows", files, rows),
                self.theme.warning,
            ));
        }
        Line::from(spans)
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
