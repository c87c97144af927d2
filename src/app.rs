//! Main application logic and TUI event loop.

use std::collections::BTreeMap;
use std::io;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use chrono::{Datelike, Local, NaiveDate};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    Terminal,
};
use tracing::{error, info};

use crate::config::AppConfig;
use crate::data::{parse_distance, parse_duration, NewRun, RunRecord, Storage, Summary};
use crate::export::{export_all, ExportStyle, TrendPoint};
use crate::publish;
use crate::ui::{
    chart::{TrendChart, TrendMode},
    heatmap::HeatmapView,
    widgets::{InputLine, Notice, StatusBar, SummaryPanel},
    HelpOverlay, NoticeLevel, Theme,
};

/// Parse the quick-add line: `distance [duration] [heart_rate]`
pub fn parse_quick_add(input: &str, today: NaiveDate) -> Result<NewRun> {
    let mut parts = input.split_whitespace();
    let distance = parts.next().context("Enter at least a distance")?;
    let mut run = NewRun::new(today, parse_distance(distance)?);
    if let Some(duration) = parts.next() {
        run = run.with_duration(parse_duration(duration)?);
    }
    if let Some(hr) = parts.next() {
        let bpm: f64 = hr
            .parse()
            .with_context(|| format!("Invalid heart rate '{hr}'"))?;
        run = run.with_heart_rate(bpm);
    }
    if let Some(extra) = parts.next() {
        anyhow::bail!("Unexpected input '{extra}'");
    }
    run.validate()?;
    Ok(run)
}

/// Nearest year in `years` strictly before (`forward == false`) or after `current`
fn adjacent_year(years: &[i32], current: i32, forward: bool) -> Option<i32> {
    if forward {
        years.iter().copied().filter(|y| *y > current).min()
    } else {
        years.iter().copied().filter(|y| *y < current).max()
    }
}

/// Application state
pub struct App {
    config: AppConfig,
    theme: Theme,
    storage: Storage,

    // Data
    year: i32,
    years: Vec<i32>,
    daily: BTreeMap<NaiveDate, f64>,
    year_runs: usize,
    last_run: Option<RunRecord>,
    summary: Summary,
    monthly: Vec<TrendPoint>,
    yearly: Vec<TrendPoint>,

    // UI state
    trend_mode: TrendMode,
    input: Option<String>,
    notice: Option<Notice>,
    show_help: bool,
    should_quit: bool,

    /// Run inserted during this session, eligible for undo
    session_last_id: Option<i64>,
}

impl App {
    /// Create a new App instance
    pub fn new(config: AppConfig, storage: Storage, year: i32) -> Result<Self> {
        let theme = Theme::new(config.dark_mode, config.heatmap_levels);
        let mut app = App {
            config,
            theme,
            storage,
            year,
            years: Vec::new(),
            daily: BTreeMap::new(),
            year_runs: 0,
            last_run: None,
            summary: Summary::default(),
            monthly: Vec::new(),
            yearly: Vec::new(),
            trend_mode: TrendMode::default(),
            input: None,
            notice: None,
            show_help: false,
            should_quit: false,
            session_last_id: None,
        };
        app.reload()?;
        Ok(app)
    }

    /// Reload everything shown on screen from the database
    fn reload(&mut self) -> Result<()> {
        self.years = self.storage.years_with_data()?;
        let runs = self.storage.load_year(self.year)?;
        self.year_runs = runs.values().map(Vec::len).sum();
        self.daily = runs
            .iter()
            .map(|(date, runs)| (*date, runs.iter().map(|r| r.distance).sum()))
            .collect();
        self.last_run = match self.storage.last_id()? {
            Some(id) => self.storage.get(id)?,
            None => None,
        };
        self.summary = self.storage.summary()?;
        self.monthly = self.storage.monthly_totals()?.iter().map(TrendPoint::from).collect();
        self.yearly = self.storage.yearly_totals()?.iter().map(TrendPoint::from).collect();
        Ok(())
    }

    fn notify(&mut self, level: NoticeLevel, text: impl Into<String>) {
        let notice = Notice::new(level, text);
        match level {
            NoticeLevel::Error => error!(text = %notice.text, "dashboard error"),
            _ => info!(text = %notice.text, "dashboard notice"),
        }
        self.notice = Some(notice);
    }

    fn tick(&mut self, now: Instant) {
        if self.notice.as_ref().is_some_and(|n| n.is_expired(now)) {
            self.notice = None;
        }
    }

    fn today() -> NaiveDate {
        Local::now().date_naive()
    }

    /// Handle keyboard input
    fn handle_input(&mut self, key: KeyCode) -> Result<()> {
        if self.input.is_some() {
            return self.handle_text_input(key);
        }

        match key {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('?') | KeyCode::F(1) => self.show_help = !self.show_help,
            KeyCode::Esc if self.show_help => self.show_help = false,
            _ if self.show_help => {}
            KeyCode::Left | KeyCode::Char('[') => self.change_year(false)?,
            KeyCode::Right | KeyCode::Char(']') => self.change_year(true)?,
            KeyCode::Char('t') => self.trend_mode = self.trend_mode.toggle(),
            KeyCode::Char('a') => self.input = Some(String::new()),
            KeyCode::Char('u') => self.undo_session_run()?,
            KeyCode::Char('e') => self.export()?,
            KeyCode::Char('p') => self.publish()?,
            KeyCode::Char('r') => {
                self.reload()?;
                self.notify(NoticeLevel::Success, "Reloaded");
            }
            _ => {}
        }
        Ok(())
    }

    fn handle_text_input(&mut self, key: KeyCode) -> Result<()> {
        let Some(text) = self.input.as_mut() else {
            return Ok(());
        };
        match key {
            KeyCode::Esc => self.input = None,
            KeyCode::Backspace => {
                text.pop();
            }
            KeyCode::Char(c) => text.push(c),
            KeyCode::Enter => {
                let text = self.input.take().unwrap_or_default();
                self.add_run(&text)?;
            }
            _ => {}
        }
        Ok(())
    }

    fn add_run(&mut self, text: &str) -> Result<()> {
        let today = Self::today();
        let run = match parse_quick_add(text, today) {
            Ok(run) => run,
            Err(e) => {
                self.notify(NoticeLevel::Warning, format!("{e:#}"));
                return Ok(());
            }
        };
        let id = self.storage.save(&run)?;
        self.session_last_id = Some(id);
        self.year = today.year();
        self.reload()?;
        self.notify(
            NoticeLevel::Success,
            format!("Saved {:.2} km for {today} (u to undo)", run.distance),
        );
        Ok(())
    }

    fn undo_session_run(&mut self) -> Result<()> {
        let Some(id) = self.session_last_id.take() else {
            self.notify(NoticeLevel::Warning, "Nothing to undo in this session");
            return Ok(());
        };
        if self.storage.delete(id)? {
            self.reload()?;
            self.notify(NoticeLevel::Success, format!("Deleted run #{id}"));
        } else {
            self.notify(NoticeLevel::Warning, format!("Run #{id} no longer exists"));
        }
        Ok(())
    }

    fn change_year(&mut self, forward: bool) -> Result<()> {
        match adjacent_year(&self.years, self.year, forward) {
            Some(year) => {
                self.year = year;
                self.reload()?;
            }
            None => {
                let which = if forward { "later" } else { "earlier" };
                self.notify(NoticeLevel::Warning, format!("No {which} year with runs"));
            }
        }
        Ok(())
    }

    fn export(&mut self) -> Result<()> {
        let dir = self.config.images_dir();
        let style = ExportStyle::new(self.config.dark_mode, self.config.heatmap_levels);
        match export_all(&self.storage, self.year, &dir, &style) {
            Ok(files) => self.notify(
                NoticeLevel::Success,
                format!("Wrote {} images to {}", files.len(), dir.display()),
            ),
            Err(e) => self.notify(NoticeLevel::Error, format!("Export failed: {e:#}")),
        }
        Ok(())
    }

    fn publish(&mut self) -> Result<()> {
        let message = publish::default_message(Self::today());
        match publish::publish(&self.config, &self.storage, self.year, &message, false) {
            Ok(reports) => self.notify(NoticeLevel::Success, publish::describe(&reports)),
            Err(e) => self.notify(NoticeLevel::Error, format!("Publish failed: {e:#}")),
        }
        Ok(())
    }

    /// Render the UI
    fn render(&self, frame: &mut ratatui::Frame) {
        let size = frame.area();

        let main_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(10), // Heatmap: border + month labels + 7 rows
                Constraint::Min(8),     // Summary and chart
                Constraint::Length(2),  // Status bar
            ])
            .split(size);

        let body_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(34), Constraint::Min(30)])
            .split(main_chunks[1]);

        HeatmapView::new(self.year, &self.daily, &self.theme).render(frame, main_chunks[0]);

        SummaryPanel::new(
            &self.summary,
            self.year,
            self.year_runs,
            self.last_run.as_ref(),
            &self.theme,
        )
        .render(frame, body_chunks[0]);

        let points = match self.trend_mode {
            TrendMode::Monthly => &self.monthly,
            TrendMode::Yearly => &self.yearly,
        };
        TrendChart::new(points, self.trend_mode, &self.theme).render(frame, body_chunks[1]);

        match &self.input {
            Some(text) => InputLine::new(text, &self.theme).render(frame, main_chunks[2]),
            None => StatusBar::new(self.year, self.notice.as_ref(), &self.theme)
                .render(frame, main_chunks[2]),
        }

        if self.show_help {
            HelpOverlay::new(&self.theme).render(frame, size);
        }
    }
}

/// Restore terminal to normal state
fn restore_terminal() {
    // Best effort cleanup - ignore errors since we may be in a panic
    let _ = disable_raw_mode();
    let _ = execute!(io::stdout(), LeaveAlternateScreen);
}

/// Run the TUI application
pub fn run(config: AppConfig, storage: Storage, year: Option<i32>) -> Result<()> {
    let year = year.unwrap_or_else(|| App::today().year());
    let mut app = App::new(config, storage, year).context("Failed to initialize application")?;
    if !app.storage.year_has_data(year)? {
        app.notify(NoticeLevel::Warning, format!("No runs logged in {year}"));
    }

    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    if let Err(e) = execute!(stdout, EnterAlternateScreen) {
        restore_terminal();
        return Err(e).context("Failed to setup terminal");
    }
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = match Terminal::new(backend) {
        Ok(t) => t,
        Err(e) => {
            restore_terminal();
            return Err(e).context("Failed to create terminal");
        }
    };

    let result = run_main_loop(&mut terminal, &mut app);

    // Always restore terminal, regardless of result
    restore_terminal();
    terminal.show_cursor().ok();

    result
}

/// Main application loop
fn run_main_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    loop {
        terminal.draw(|f| app.render(f))?;

        app.tick(Instant::now());

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    if let Err(e) = app.handle_input(key.code) {
                        // Keep running; surface the failure instead
                        app.notify(NoticeLevel::Error, format!("{e:#}"));
                    }
                }
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    fn test_app() -> (tempfile::TempDir, App) {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig {
            data_dir: dir.path().to_path_buf(),
            images_dir: Some(dir.path().join("images")),
            ..AppConfig::default()
        };
        let storage = Storage::open(&config.data_dir).unwrap();
        for (y, km) in [(2021, 5.0), (2023, 8.0)] {
            storage
                .save(&NewRun::new(NaiveDate::from_ymd_opt(y, 3, 1).unwrap(), km))
                .unwrap();
        }
        let app = App::new(config, storage, 2023).unwrap();
        (dir, app)
    }

    #[test]
    fn test_parse_quick_add() {
        let run = parse_quick_add("10.5 55:00 148", today()).unwrap();
        assert_eq!(run.date, today());
        assert_eq!(run.distance, 10.5);
        assert_eq!(run.duration_seconds, Some(3300));
        assert_eq!(run.heart_rate, Some(148.0));

        assert_eq!(parse_quick_add("5", today()).unwrap().distance, 5.0);
        assert!(parse_quick_add("", today()).is_err());
        assert!(parse_quick_add("5 25:00 fast", today()).is_err());
        assert!(parse_quick_add("5 25:00 150 extra", today()).is_err());
        assert!(parse_quick_add("5 99999999:00", today()).is_err());
    }

    #[test]
    fn test_adjacent_year_skips_gaps() {
        let years = [2019, 2021, 2024];
        assert_eq!(adjacent_year(&years, 2021, true), Some(2024));
        assert_eq!(adjacent_year(&years, 2021, false), Some(2019));
        assert_eq!(adjacent_year(&years, 2024, true), None);
        assert_eq!(adjacent_year(&years, 2022, false), Some(2021));
    }

    #[test]
    fn test_year_navigation_only_visits_years_with_data() {
        let (_dir, mut app) = test_app();
        assert_eq!(app.year_runs, 1);

        app.handle_input(KeyCode::Left).unwrap();
        assert_eq!(app.year, 2021);

        app.handle_input(KeyCode::Left).unwrap();
        assert_eq!(app.year, 2021);
        assert_eq!(app.notice.as_ref().map(|n| n.level), Some(NoticeLevel::Warning));

        app.handle_input(KeyCode::Char(']')).unwrap();
        assert_eq!(app.year, 2023);
    }

    #[test]
    fn test_quick_add_then_undo() {
        let (_dir, mut app) = test_app();
        let before = app.summary.days_run;

        app.handle_input(KeyCode::Char('a')).unwrap();
        for c in "7.5 40:00".chars() {
            app.handle_input(KeyCode::Char(c)).unwrap();
        }
        app.handle_input(KeyCode::Enter).unwrap();
        assert!(app.input.is_none());
        assert!(app.session_last_id.is_some());
        assert_eq!(app.summary.days_run, before + 1);
        assert_eq!(app.last_run.as_ref().map(|r| r.distance), Some(7.5));

        app.handle_input(KeyCode::Char('u')).unwrap();
        assert_eq!(app.summary.days_run, before);
        assert!(app.session_last_id.is_none());

        // Second undo has nothing to remove
        app.handle_input(KeyCode::Char('u')).unwrap();
        assert_eq!(app.notice.as_ref().map(|n| n.level), Some(NoticeLevel::Warning));
    }

    #[test]
    fn test_invalid_quick_add_warns() {
        let (_dir, mut app) = test_app();
        app.handle_input(KeyCode::Char('a')).unwrap();
        app.handle_input(KeyCode::Char('x')).unwrap();
        app.handle_input(KeyCode::Enter).unwrap();
        assert_eq!(app.notice.as_ref().map(|n| n.level), Some(NoticeLevel::Warning));
        assert!(app.session_last_id.is_none());
    }

    #[test]
    fn test_input_escape_and_backspace() {
        let (_dir, mut app) = test_app();
        app.handle_input(KeyCode::Char('a')).unwrap();
        app.handle_input(KeyCode::Char('1')).unwrap();
        app.handle_input(KeyCode::Char('2')).unwrap();
        app.handle_input(KeyCode::Backspace).unwrap();
        assert_eq!(app.input.as_deref(), Some("1"));
        // 'q' while typing is text, not quit
        app.handle_input(KeyCode::Char('q')).unwrap();
        assert!(!app.should_quit);
        app.handle_input(KeyCode::Esc).unwrap();
        assert!(app.input.is_none());
    }

    #[test]
    fn test_toggle_trend_and_help() {
        let (_dir, mut app) = test_app();
        app.handle_input(KeyCode::Char('t')).unwrap();
        assert_eq!(app.trend_mode, TrendMode::Yearly);

        app.handle_input(KeyCode::Char('?')).unwrap();
        assert!(app.show_help);
        // Other keys are ignored while help is open
        app.handle_input(KeyCode::Char('t')).unwrap();
        assert_eq!(app.trend_mode, TrendMode::Yearly);
        app.handle_input(KeyCode::Esc).unwrap();
        assert!(!app.show_help);

        app.handle_input(KeyCode::Char('q')).unwrap();
        assert!(app.should_quit);
    }

    #[test]
    fn test_export_from_dashboard() {
        let (dir, mut app) = test_app();
        app.handle_input(KeyCode::Char('e')).unwrap();
        assert_eq!(app.notice.as_ref().map(|n| n.level), Some(NoticeLevel::Success));
        assert!(dir.path().join("images").join("heatmap-2023.svg").exists());
    }

    #[test]
    fn test_publish_without_repo_reports_error() {
        let (_dir, mut app) = test_app();
        app.handle_input(KeyCode::Char('p')).unwrap();
        assert_eq!(app.notice.as_ref().map(|n| n.level), Some(NoticeLevel::Error));
    }

    #[test]
    fn test_notice_expires_on_tick() {
        let (_dir, mut app) = test_app();
        app.notify(NoticeLevel::Success, "hi");
        app.tick(Instant::now());
        assert!(app.notice.is_some());
        app.tick(Instant::now() + Duration::from_secs(4));
        assert!(app.notice.is_none());
    }
}
