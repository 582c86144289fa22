//! Ratatui-based dashboard.
//!
//! Four pages, switched with Tab:
//! - Dashboard: portfolio metrics and recent applications from the store
//! - Application: editable form, Enter scores it, `p` writes a report
//! - Batch: CSV path, Enter scores the file
//! - Analytics: monthly score trend (Plotters) and the monthly table

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{BarChart, Block, Borders, Clear, List, ListItem, ListState, Paragraph, Row, Table, Tabs},
    Frame, Terminal,
};

use crate::app::pipeline::{BatchOutput, Pipeline};
use crate::app::settings::Settings;
use crate::domain::{Application, Assessment, RiskLevel};
use crate::error::AppError;
use crate::metrics::{linear_trend, Trend};
use crate::report::{fmt_inr, CreditReport};
use crate::store::{ApplicationStore, MonthlyStats, PortfolioStats, StoredApplication};

mod form;
mod trend_chart;

use form::FormField;
use trend_chart::TrendChart;

const RECENT_ROWS: usize = 8;
const DEFAULT_MONTHS: usize = 12;

/// Start the dashboard. `batch_file` prefills the Batch page.
pub fn run(settings: Settings, batch_file: Option<PathBuf>) -> Result<(), AppError> {
    // Open the store before taking over the terminal so failures print normally.
    let store = ApplicationStore::open(&settings.db_path)?;
    let mut app = App::new(settings, store, batch_file)?;

    let _guard = TerminalGuard::new()?;
    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)
        .map_err(|e| AppError::runtime(format!("Failed to initialize terminal: {e}")))?;

    app.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::runtime(format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::runtime(format!("Failed to enter alternate screen: {e}")));
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Page {
    Dashboard,
    Application,
    Batch,
    Analytics,
}

impl Page {
    const ALL: [Page; 4] = [Page::Dashboard, Page::Application, Page::Batch, Page::Analytics];

    fn title(self) -> &'static str {
        match self {
            Page::Dashboard => "Dashboard",
            Page::Application => "Application",
            Page::Batch => "Batch",
            Page::Analytics => "Analytics",
        }
    }

    fn index(self) -> usize {
        Page::ALL.iter().position(|p| *p == self).unwrap_or(0)
    }

    fn next(self) -> Self {
        Page::ALL[(self.index() + 1) % Page::ALL.len()]
    }

    fn prev(self) -> Self {
        Page::ALL[(self.index() + Page::ALL.len() - 1) % Page::ALL.len()]
    }
}

/// Last application scored from the form.
struct Scored {
    assessment: Assessment,
    application_id: Option<String>,
}

struct App {
    settings: Settings,
    pipeline: Pipeline,
    store: ApplicationStore,
    page: Page,
    status: String,

    portfolio: Option<PortfolioStats>,
    recent: Vec<StoredApplication>,

    form: Application,
    selected_field: usize,
    /// Typed input for the selected numeric field.
    edit_buffer: Option<String>,
    scored: Option<Scored>,

    batch_path: String,
    editing_path: bool,
    batch: Option<BatchOutput>,

    months_window: usize,
    months: Vec<MonthlyStats>,
    trend: Option<Trend>,
}

impl App {
    fn new(settings: Settings, store: ApplicationStore, batch_file: Option<PathBuf>) -> Result<Self, AppError> {
        let pipeline = settings.pipeline()?;
        let batch_path = batch_file
            .or_else(|| crate::cli::picker::discover_csv_files().into_iter().next())
            .map(|p| crate::cli::picker::display_path(&p))
            .unwrap_or_default();

        let mut app = Self {
            settings,
            pipeline,
            store,
            page: Page::Dashboard,
            status: "Tab switches pages, q quits.".to_string(),
            portfolio: None,
            recent: Vec::new(),
            form: Application::default(),
            selected_field: 0,
            edit_buffer: None,
            scored: None,
            batch_path,
            editing_path: false,
            batch: None,
            months_window: DEFAULT_MONTHS,
            months: Vec::new(),
            trend: None,
        };
        app.refresh();
        Ok(app)
    }

    fn event_loop<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::runtime(format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::runtime(format!("Event poll error: {e}")))?
            {
                continue;
            }

            match event::read().map_err(|e| AppError::runtime(format!("Event read error: {e}")))? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key.code) {
                        break;
                    }
                    needs_redraw = true;
                }
                Event::Resize(_, _) => needs_redraw = true,
                _ => {}
            }
        }
        Ok(())
    }

    /// Returns `true` when the user asked to quit.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        if self.editing_path {
            self.handle_path_edit(code);
            return false;
        }
        if self.edit_buffer.is_some() {
            self.handle_field_edit(code);
            return false;
        }

        match code {
            KeyCode::Char('q') => return true,
            KeyCode::Tab => self.switch_page(self.page.next()),
            KeyCode::BackTab => self.switch_page(self.page.prev()),
            _ => match self.page {
                Page::Dashboard => self.handle_dashboard_key(code),
                Page::Application => self.handle_application_key(code),
                Page::Batch => self.handle_batch_key(code),
                Page::Analytics => self.handle_analytics_key(code),
            },
        }
        false
    }

    fn switch_page(&mut self, page: Page) {
        self.page = page;
        if matches!(page, Page::Dashboard | Page::Analytics) {
            self.refresh();
        }
        self.status = match page {
            Page::Dashboard => "r refresh".to_string(),
            Page::Application => "Type a value, Enter to score.".to_string(),
            Page::Batch => "e edit path, n next CSV, Enter to score.".to_string(),
            Page::Analytics => "+/- change window, r refresh".to_string(),
        };
    }

    fn handle_dashboard_key(&mut self, code: KeyCode) {
        if let KeyCode::Char(c @ '1'..='4') = code {
            self.switch_page(Page::ALL[c as usize - '1' as usize]);
        } else if code == KeyCode::Char('r') {
            self.refresh();
            self.status = "Refreshed.".to_string();
        }
    }

    fn handle_application_key(&mut self, code: KeyCode) {
        let field = FormField::ALL[self.selected_field];
        match code {
            KeyCode::Up => self.selected_field = self.selected_field.saturating_sub(1),
            KeyCode::Down => {
                self.selected_field = (self.selected_field + 1).min(FormField::ALL.len() - 1);
            }
            KeyCode::Left | KeyCode::Right if field.is_choice() => {
                field.cycle(&mut self.form, code == KeyCode::Right);
            }
            KeyCode::Char(c) if is_numeric_char(c) && !field.is_choice() => {
                self.edit_buffer = Some(c.to_string());
            }
            KeyCode::Enter => self.score_form(),
            KeyCode::Char('p') => self.write_report(),
            KeyCode::Char('n') => {
                self.form = Application::default();
                self.scored = None;
                self.status = "Form reset to defaults.".to_string();
            }
            _ => {}
        }
    }

    fn handle_field_edit(&mut self, code: KeyCode) {
        let Some(buffer) = self.edit_buffer.as_mut() else {
            return;
        };
        match code {
            KeyCode::Char(c) if is_numeric_char(c) => buffer.push(c),
            KeyCode::Backspace => {
                buffer.pop();
            }
            KeyCode::Esc => {
                self.edit_buffer = None;
                self.status = "Edit canceled.".to_string();
            }
            KeyCode::Enter => {
                if self.commit_field() {
                    self.score_form();
                }
            }
            KeyCode::Up | KeyCode::Down => {
                if self.commit_field() {
                    self.handle_application_key(code);
                }
            }
            KeyCode::Tab => {
                if self.commit_field() {
                    self.switch_page(self.page.next());
                }
            }
            _ => {}
        }
    }

    /// Apply the edit buffer to the selected field. `false` keeps editing.
    fn commit_field(&mut self) -> bool {
        let Some(buffer) = self.edit_buffer.take() else {
            return true;
        };
        let field = FormField::ALL[self.selected_field];
        match field.set(&mut self.form, &buffer) {
            Ok(()) => true,
            Err(message) => {
                self.status = message;
                self.edit_buffer = Some(buffer);
                false
            }
        }
    }

    fn score_form(&mut self) {
        if let Err(message) = self.form.validate() {
            self.status = message;
            return;
        }
        let assessment = self.pipeline.assess(self.form.clone());
        let logged = self.store.log_application(&assessment, "tui:application");
        let status = match &logged {
            Ok(id) => format!(
                "{}: {} ({}, score {}). p writes a report.",
                id,
                assessment.decision,
                assessment.credit.risk_level,
                assessment.credit.credit_score
            ),
            Err(e) => format!("Scored, but logging failed: {e}"),
        };
        self.scored = Some(Scored {
            assessment,
            application_id: logged.ok(),
        });
        self.status = status;
        // Nothing new in the store when logging failed.
        if self.scored.as_ref().is_some_and(|s| s.application_id.is_some()) {
            self.refresh();
        }
    }

    fn write_report(&mut self) {
        let Some(scored) = &self.scored else {
            self.status = "Score the application first (Enter).".to_string();
            return;
        };
        let id = scored.application_id.as_deref();
        let path = self
            .settings
            .report_dir
            .join(format!("{}.md", id.unwrap_or("credit_report")));
        self.status = match CreditReport::new(&scored.assessment, id).write_to(&path) {
            Ok(()) => format!("Report written to {}", path.display()),
            Err(e) => format!("Report failed: {e}"),
        };
    }

    fn handle_batch_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char(c @ '1'..='4') => self.switch_page(Page::ALL[c as usize - '1' as usize]),
            KeyCode::Char('e') => {
                self.editing_path = true;
                self.status = "Editing path. Enter to apply, Esc to stop.".to_string();
            }
            KeyCode::Char('n') => self.next_discovered_csv(),
            KeyCode::Enter => self.run_batch(),
            _ => {}
        }
    }

    fn handle_path_edit(&mut self, code: KeyCode) {
        match code {
            KeyCode::Esc => {
                self.editing_path = false;
                self.status = "e edit path, n next CSV, Enter to score.".to_string();
            }
            KeyCode::Enter => {
                self.editing_path = false;
                self.run_batch();
            }
            KeyCode::Backspace => {
                self.batch_path.pop();
            }
            KeyCode::Char(c) => self.batch_path.push(c),
            _ => {}
        }
    }

    fn next_discovered_csv(&mut self) {
        let files = crate::cli::picker::discover_csv_files();
        if files.is_empty() {
            self.status = "No .csv files under the working directory.".to_string();
            return;
        }
        let names: Vec<String> = files.iter().map(|p| crate::cli::picker::display_path(p)).collect();
        let next = names
            .iter()
            .position(|n| *n == self.batch_path)
            .map_or(0, |i| (i + 1) % names.len());
        self.batch_path = names[next].clone();
        self.status = format!("{} of {} CSV files", next + 1, names.len());
    }

    fn run_batch(&mut self) {
        let result = crate::cli::picker::validate_csv_path(Path::new(self.batch_path.trim()))
            .and_then(|path| self.pipeline.run_batch(&path, None));
        let mut output = match result {
            Ok(output) => output,
            Err(e) => {
                self.status = e.to_string();
                return;
            }
        };
        self.status = match output.record(&mut self.store) {
            Ok(logged) => format!(
                "Scored {} of {} rows, logged {logged}.",
                output.summary.rows_scored, output.summary.rows_read
            ),
            Err(e) => format!("Scored, but logging failed: {e}"),
        };
        self.batch = Some(output);
        self.refresh();
    }

    fn handle_analytics_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char(c @ '1'..='4') => self.switch_page(Page::ALL[c as usize - '1' as usize]),
            KeyCode::Char('+') => {
                self.months_window = (self.months_window + 1).min(36);
                self.refresh();
            }
            KeyCode::Char('-') => {
                self.months_window = self.months_window.saturating_sub(1).max(2);
                self.refresh();
            }
            KeyCode::Char('r') => {
                self.refresh();
                self.status = "Refreshed.".to_string();
            }
            _ => {}
        }
    }

    /// Reload store-backed views; failures land in the status line.
    fn refresh(&mut self) {
        let loaded = self.store.portfolio_stats().and_then(|stats| {
            let recent = self.store.recent(RECENT_ROWS)?;
            let months = self.store.monthly_stats(self.months_window)?;
            Ok((stats, recent, months))
        });
        match loaded {
            Ok((stats, recent, months)) => {
                let averages: Vec<f64> = months.iter().map(|m| m.average_score).collect();
                self.trend = linear_trend(&averages);
                self.portfolio = Some(stats);
                self.recent = recent;
                self.months = months;
            }
            Err(e) => self.status = format!("Store error: {e}"),
        }
    }

    fn draw(&mut self, frame: &mut Frame<'_>) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(0), Constraint::Length(3)])
            .split(frame.area());

        self.draw_tabs(frame, chunks[0]);
        match self.page {
            Page::Dashboard => self.draw_dashboard(frame, chunks[1]),
            Page::Application => self.draw_application(frame, chunks[1]),
            Page::Batch => self.draw_batch(frame, chunks[1]),
            Page::Analytics => self.draw_analytics(frame, chunks[1]),
        }
        self.draw_footer(frame, chunks[2]);
    }

    fn draw_tabs(&self, frame: &mut Frame<'_>, area: Rect) {
        let titles = Page::ALL
            .iter()
            .enumerate()
            .map(|(i, p)| Line::from(format!("{} {}", i + 1, p.title())));
        let tabs = Tabs::new(titles)
            .select(self.page.index())
            .highlight_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(Span::styled("credit", Style::default().fg(Color::Cyan))),
            );
        frame.render_widget(tabs, area);
    }

    fn draw_dashboard(&self, frame: &mut Frame<'_>, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(5), Constraint::Min(0)])
            .split(area);

        let metrics = match &self.portfolio {
            Some(p) if p.applications > 0 => vec![
                Line::from(format!(
                    "Applications: {}   Average score: {:.1}",
                    p.applications, p.average_score
                )),
                Line::from(format!(
                    "Approval rate: {:.1}%   Fraud rate: {:.1}%",
                    p.approval_rate, p.fraud_rate
                )),
                Line::from(Span::styled(
                    format!("Store: {}", self.settings.db_path.display()),
                    Style::default().fg(Color::Gray),
                )),
            ],
            _ => vec![Line::from(Span::styled(
                "No applications logged yet. Score one on the Application page.",
                Style::default().fg(Color::Yellow),
            ))],
        };
        frame.render_widget(
            Paragraph::new(Text::from(metrics))
                .block(Block::default().title("Portfolio").borders(Borders::ALL)),
            chunks[0],
        );

        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
            .split(chunks[1]);

        let distribution = self
            .portfolio
            .as_ref()
            .map(|p| p.risk_distribution.clone())
            .unwrap_or_default();
        render_distribution(frame, body[0], &distribution);

        let rows = self.recent.iter().map(|r| {
            let a = &r.assessment;
            Row::new(vec![
                r.application_id.clone(),
                r.created_at.format("%m-%d %H:%M").to_string(),
                a.credit.credit_score.to_string(),
                a.credit.risk_level.display_name().to_string(),
                a.decision.display_name().to_string(),
                fmt_inr(a.application.loan_amount),
            ])
        });
        let table = Table::new(
            rows,
            [
                Constraint::Length(12),
                Constraint::Length(11),
                Constraint::Length(5),
                Constraint::Length(9),
                Constraint::Length(15),
                Constraint::Min(10),
            ],
        )
        .header(
            Row::new(vec!["id", "created", "score", "risk", "decision", "loan"])
                .style(Style::default().fg(Color::Gray).add_modifier(Modifier::BOLD)),
        )
        .block(Block::default().title("Recent applications").borders(Borders::ALL));
        frame.render_widget(table, body[1]);
    }

    fn draw_application(&self, frame: &mut Frame<'_>, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(42), Constraint::Min(0)])
            .split(area);

        let items: Vec<ListItem> = FormField::ALL
            .iter()
            .enumerate()
            .map(|(i, field)| {
                let value = match &self.edit_buffer {
                    Some(buffer) if i == self.selected_field => format!("{buffer}_"),
                    _ => field.value(&self.form),
                };
                let marker = if field.is_choice() { "◂▸" } else { "  " };
                ListItem::new(format!("{:<20} {marker} {value}", field.label()))
            })
            .collect();
        let list = List::new(items)
            .block(Block::default().title("Application").borders(Borders::ALL))
            .highlight_style(Style::default().fg(Color::Black).bg(Color::White))
            .highlight_symbol("» ");
        let mut state = ListState::default();
        state.select(Some(self.selected_field));
        frame.render_stateful_widget(list, chunks[0], &mut state);

        let right = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(9), Constraint::Min(8), Constraint::Length(6)])
            .split(chunks[1]);

        let Some(scored) = &self.scored else {
            frame.render_widget(
                Paragraph::new("Enter scores the application.")
                    .style(Style::default().fg(Color::Yellow))
                    .block(Block::default().title("Assessment").borders(Borders::ALL)),
                chunks[1],
            );
            return;
        };

        let a = &scored.assessment;
        let decision_color = if a.decision.is_approved() {
            Color::Green
        } else {
            Color::Yellow
        };
        let mut lines = vec![
            Line::from(Span::styled(
                a.decision.display_name(),
                Style::default().fg(decision_color).add_modifier(Modifier::BOLD),
            )),
            Line::from(format!(
                "Score {} | {} risk | default probability {:.1}%",
                a.credit.credit_score, a.credit.risk_level, a.credit.default_probability
            )),
            Line::from(a.credit.business_impact.clone()),
        ];
        if let Some(line) = crate::report::business_impact_line(a) {
            lines.push(Line::from(line));
        }
        if let Some(id) = &scored.application_id {
            lines.push(Line::from(Span::styled(
                format!("Application {id}"),
                Style::default().fg(Color::Gray),
            )));
        }
        frame.render_widget(
            Paragraph::new(Text::from(lines))
                .block(Block::default().title("Assessment").borders(Borders::ALL)),
            right[0],
        );

        let c = &a.credit.components;
        let bars = [
            ("Behavioral", c.behavioral.max(0) as u64),
            ("Financial", c.financial.max(0) as u64),
            ("Stability", c.stability.max(0) as u64),
            ("Ensemble", c.ensemble.max(0.0).round() as u64),
        ];
        let chart = BarChart::default()
            .block(Block::default().title("Component scores").borders(Borders::ALL))
            .data(&bars[..])
            .bar_width(10)
            .bar_gap(2)
            .max(850)
            .bar_style(Style::default().fg(Color::Cyan))
            .value_style(Style::default().fg(Color::Black).bg(Color::Cyan));
        frame.render_widget(chart, right[1]);

        let fraud_title = format!(
            "Fraud: {} (score {:.4}, {} confidence)",
            if a.fraud.is_fraud { "DETECTED" } else { "clear" },
            a.fraud.fraud_score,
            a.fraud.confidence.display_name()
        );
        let patterns: Vec<Line> = if a.fraud.patterns.is_empty() {
            vec![Line::from("No fraud patterns matched.")]
        } else {
            a.fraud.patterns.iter().map(|p| Line::from(format!("• {p}"))).collect()
        };
        frame.render_widget(
            Paragraph::new(Text::from(patterns))
                .block(Block::default().title(fraud_title).borders(Borders::ALL)),
            right[2],
        );
    }

    fn draw_batch(&self, frame: &mut Frame<'_>, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(0)])
            .split(area);

        let path_style = if self.editing_path {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        let path_text = if self.editing_path {
            format!("{}_", self.batch_path)
        } else if self.batch_path.is_empty() {
            "(none: press e to type a path)".to_string()
        } else {
            self.batch_path.clone()
        };
        frame.render_widget(
            Paragraph::new(Span::styled(path_text, path_style))
                .block(Block::default().title("CSV file").borders(Borders::ALL)),
            chunks[0],
        );

        let Some(output) = &self.batch else {
            frame.render_widget(
                Paragraph::new("Enter scores the file. Results are logged to the store.")
                    .style(Style::default().fg(Color::Yellow))
                    .block(Block::default().title("Summary").borders(Borders::ALL)),
                chunks[1],
            );
            return;
        };

        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(chunks[1]);

        let mut summary = crate::report::format_batch_summary(output);
        let errors = output.row_errors();
        if !errors.is_empty() {
            summary.push('\n');
            summary.push_str(&crate::report::format_row_errors(&errors, 5));
        }
        frame.render_widget(
            Paragraph::new(summary).block(Block::default().title("Summary").borders(Borders::ALL)),
            body[0],
        );
        render_distribution(frame, body[1], &output.summary.risk_distribution);
    }

    fn draw_analytics(&self, frame: &mut Frame<'_>, area: Rect) {
        let table_height = (self.months.len() as u16 + 5).min(area.height / 2);
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(table_height)])
            .split(area);

        let block = Block::default()
            .title(format!("Average score by month (last {} months)", self.months_window))
            .borders(Borders::ALL);
        let inner = block.inner(chunks[0]);
        frame.render_widget(block, chunks[0]);
        frame.render_widget(Clear, inner);

        if self.months.is_empty() {
            frame.render_widget(
                Paragraph::new("No applications logged yet.").style(Style::default().fg(Color::Yellow)),
                inner,
            );
            return;
        }

        let labels: Vec<String> = self.months.iter().map(|m| m.month.clone()).collect();
        let averages: Vec<f64> = self.months.iter().map(|m| m.average_score).collect();
        frame.render_widget(TrendChart::new(&labels, &averages, self.trend, "avg score"), inner);

        frame.render_widget(
            Paragraph::new(crate::report::format_monthly_table(&self.months, self.trend.as_ref()))
                .block(Block::default().title("Monthly").borders(Borders::ALL)),
            chunks[1],
        );
    }

    fn draw_footer(&self, frame: &mut Frame<'_>, area: Rect) {
        let help = match self.page {
            Page::Dashboard => "Tab/1-4 page  r refresh  q quit",
            Page::Application => "↑/↓ field  type value  ←/→ choice  Enter score  p report  n reset  q quit",
            Page::Batch => "e edit path  n next CSV  Enter score  Tab page  q quit",
            Page::Analytics => "+/- months  r refresh  Tab/1-4 page  q quit",
        };
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(&self.status, Style::default().fg(Color::Yellow)),
        ]);
        frame.render_widget(
            Paragraph::new(line).block(Block::default().borders(Borders::ALL)),
            area,
        );
    }
}

fn render_distribution(frame: &mut Frame<'_>, area: Rect, distribution: &[(RiskLevel, usize)]) {
    let bars: Vec<(&str, u64)> = distribution
        .iter()
        .map(|(level, count)| (level.display_name(), *count as u64))
        .collect();
    let chart = BarChart::default()
        .block(Block::default().title("Risk distribution").borders(Borders::ALL))
        .data(bars.as_slice())
        .bar_width(9)
        .bar_gap(1)
        .bar_style(Style::default().fg(Color::Magenta))
        .value_style(Style::default().fg(Color::Black).bg(Color::Magenta));
    frame.render_widget(chart, area);
}

fn is_numeric_char(c: char) -> bool {
    c.is_ascii_digit() || c == '.'
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fraud::FraudNoise;
    use ratatui::backend::TestBackend;

    fn app() -> App {
        let settings = Settings {
            fraud_noise: 0.0,
            report_dir: std::env::temp_dir().join("credit-tui-tests"),
            ..Settings::default()
        };
        assert_eq!(settings.fraud_config().noise, FraudNoise::Off);
        let store = ApplicationStore::open_in_memory().unwrap();
        App::new(settings, store, Some(PathBuf::from("missing.csv"))).unwrap()
    }

    fn press(app: &mut App, keys: &[KeyCode]) {
        for key in keys {
            assert!(!app.handle_key(*key));
        }
    }

    #[test]
    fn tab_cycles_pages() {
        let mut app = app();
        press(&mut app, &[KeyCode::Tab, KeyCode::Tab]);
        assert_eq!(app.page, Page::Batch);
        press(&mut app, &[KeyCode::BackTab, KeyCode::BackTab, KeyCode::BackTab]);
        assert_eq!(app.page, Page::Analytics);
        assert!(app.handle_key(KeyCode::Char('q')));
    }

    #[test]
    fn typing_and_enter_scores_and_logs() {
        let mut app = app();
        app.switch_page(Page::Application);
        press(
            &mut app,
            &[KeyCode::Char('4'), KeyCode::Char('2'), KeyCode::Enter],
        );
        assert_eq!(app.form.age, 42);
        let scored = app.scored.as_ref().unwrap();
        assert!(scored.application_id.is_some());
        assert_eq!(app.portfolio.as_ref().unwrap().applications, 1);
        assert_eq!(app.recent.len(), 1);
    }

    #[test]
    fn logging_failure_stays_visible() {
        let mut app = app();
        app.store
            .connection()
            .execute_batch("DROP TABLE applications")
            .unwrap();
        app.switch_page(Page::Application);
        press(&mut app, &[KeyCode::Enter]);

        let scored = app.scored.as_ref().unwrap();
        assert!(scored.application_id.is_none());
        assert!(app.status.starts_with("Scored, but logging failed"));
    }

    #[test]
    fn invalid_form_is_not_scored() {
        let mut app = app();
        app.switch_page(Page::Application);
        press(&mut app, &[KeyCode::Char('9'), KeyCode::Enter]);
        assert!(app.scored.is_none());
        assert!(app.status.contains("age"));
    }

    #[test]
    fn missing_batch_file_reports_in_status() {
        let mut app = app();
        app.switch_page(Page::Batch);
        press(&mut app, &[KeyCode::Enter]);
        assert!(app.batch.is_none());
        assert!(app.status.contains("missing.csv"));
    }

    #[test]
    fn every_page_draws() {
        let mut app = app();
        app.switch_page(Page::Application);
        press(&mut app, &[KeyCode::Enter]);

        let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();
        for page in Page::ALL {
            app.page = page;
            terminal.draw(|f| app.draw(f)).unwrap();
        }
    }
}
