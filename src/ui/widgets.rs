//! UI widgets for the running log dashboard.

use std::time::{Duration, Instant};

use ratatui::{
    layout::Rect,
    style::Modifier,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use super::theme::{NoticeLevel, Theme};
use crate::data::{format_duration, RunRecord, Summary};

/// How long a notification stays in the status bar
pub const NOTICE_TTL: Duration = Duration::from_secs(3);

/// A transient status bar message
#[derive(Debug, Clone)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
    shown_at: Instant,
}

impl Notice {
    pub fn new(level: NoticeLevel, text: impl Into<String>) -> Self {
        Notice {
            level,
            text: text.into(),
            shown_at: Instant::now(),
        }
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.shown_at) >= NOTICE_TTL
    }
}

/// Totals for the whole log plus the selected year
pub struct SummaryPanel<'a> {
    summary: &'a Summary,
    year: i32,
    year_runs: usize,
    last_run: Option<&'a RunRecord>,
    theme: &'a Theme,
}

impl<'a> SummaryPanel<'a> {
    pub fn new(
        summary: &'a Summary,
        year: i32,
        year_runs: usize,
        last_run: Option<&'a RunRecord>,
        theme: &'a Theme,
    ) -> Self {
        SummaryPanel {
            summary,
            year,
            year_runs,
            last_run,
            theme,
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let row = |key: &str, value: String| {
            Line::from(vec![
                Span::styled(format!("{key:<14}"), self.theme.dimmed_style()),
                Span::styled(value, self.theme.normal_style()),
            ])
        };

        let s = self.summary;
        let mut lines = vec![
            row("Days run", s.days_run.to_string()),
            row("Total", format!("{:.1} km", s.total_distance)),
            row("Avg / day", format!("{:.2} km", s.avg_distance)),
            row("Shortest day", format!("{:.1} km", s.min_distance)),
            row("Longest day", format!("{:.1} km", s.max_distance)),
            Line::from(""),
            row(&format!("Runs in {}", self.year), self.year_runs.to_string()),
        ];

        if let Some(run) = self.last_run {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                "Last run",
                self.theme.title_style().add_modifier(Modifier::UNDERLINED),
            )));
            lines.push(row("Date", run.date.to_string()));
            lines.push(row("Distance", format!("{:.2} km", run.distance)));
            if let Some(secs) = run.duration_seconds {
                lines.push(row("Duration", format_duration(secs)));
            }
            if let Some(pace) = &run.pace {
                lines.push(row("Pace", pace.clone()));
            }
            if let Some(hr) = run.heart_rate {
                lines.push(row("Heart rate", format!("{hr:.0} bpm")));
            }
            if let Some(place) = &run.place {
                lines.push(row("Place", place.clone()));
            }
            if let Some(notes) = &run.notes {
                lines.push(row("Notes", notes.clone()));
            }
        }

        let paragraph = Paragraph::new(lines)
            .block(
                Block::default()
                    .title(" Summary ")
                    .borders(Borders::ALL)
                    .border_style(self.theme.border_style())
                    .title_style(self.theme.title_style()),
            )
            .wrap(Wrap { trim: true });

        frame.render_widget(paragraph, area);
    }
}

/// Quick-add prompt shown in place of the status bar
pub struct InputLine<'a> {
    text: &'a str,
    theme: &'a Theme,
}

impl<'a> InputLine<'a> {
    pub fn new(text: &'a str, theme: &'a Theme) -> Self {
        InputLine { text, theme }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let line = Line::from(vec![
            Span::styled(
                "Add run (distance [duration] [heart rate]): ",
                self.theme.dimmed_style(),
            ),
            Span::styled(format!("{}_", self.text), self.theme.highlight_style()),
        ]);
        let paragraph = Paragraph::new(line).block(Block::default().borders(Borders::TOP));
        frame.render_widget(paragraph, area);
    }
}

/// Status bar widget
pub struct StatusBar<'a> {
    year: i32,
    notice: Option<&'a Notice>,
    theme: &'a Theme,
}

impl<'a> StatusBar<'a> {
    pub fn new(year: i32, notice: Option<&'a Notice>, theme: &'a Theme) -> Self {
        StatusBar {
            year,
            notice,
            theme,
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let line = match self.notice {
            Some(n) => Line::from(Span::styled(n.text.clone(), self.theme.notice_style(n.level))),
            None => Line::from(Span::styled(
                format!("runlog: {} | [a] Add [←/→] Year [?] Help [q] Quit", self.year),
                self.theme.normal_style(),
            )),
        };

        let paragraph = Paragraph::new(line).block(Block::default().borders(Borders::TOP));
        frame.render_widget(paragraph, area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notice_expiry() {
        let notice = Notice::new(NoticeLevel::Success, "Saved");
        assert!(!notice.is_expired(notice.shown_at));
        assert!(!notice.is_expired(notice.shown_at + Duration::from_secs(2)));
        assert!(notice.is_expired(notice.shown_at + NOTICE_TTL));
    }
}
