//! Terminal rendering of the yearly calendar heatmap.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use ratatui::{
    layout::{Alignment, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use super::theme::Theme;
use crate::heatmap::{max_value, HeatmapLayout, MONTH_LABELS, ROWS, WEEKDAY_LABELS};

/// Width of the weekday label gutter
const GUTTER: usize = 4;
const CELL_GLYPH: &str = "■";

/// Heatmap panel for one year
pub struct HeatmapView<'a> {
    year: i32,
    values: &'a BTreeMap<NaiveDate, f64>,
    theme: &'a Theme,
}

impl<'a> HeatmapView<'a> {
    pub fn new(year: i32, values: &'a BTreeMap<NaiveDate, f64>, theme: &'a Theme) -> Self {
        HeatmapView {
            year,
            values,
            theme,
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let total: f64 = self.values.values().sum();
        let block = Block::default()
            .title(format!(
                " {} · {:.1} km · {} days ",
                self.year,
                total,
                self.values.len()
            ))
            .borders(Borders::ALL)
            .border_style(self.theme.border_style())
            .title_style(self.theme.title_style());

        let inner = block.inner(area);
        frame.render_widget(block, area);

        let Some(layout) = HeatmapLayout::for_year(self.year) else {
            let message = Paragraph::new("Year out of range")
                .style(self.theme.dimmed_style())
                .alignment(Alignment::Center);
            frame.render_widget(message, inner);
            return;
        };

        let lines = heatmap_lines(&layout, self.values, self.theme, inner.width as usize);
        frame.render_widget(Paragraph::new(lines).style(self.theme.surface_style()), inner);
    }
}

/// Cell width in terminal columns: spaced cells when they fit
fn cell_width(columns: usize, width: usize) -> usize {
    if width >= GUTTER + columns * 2 {
        2
    } else {
        1
    }
}

/// Month label row: each label starts at its month's column unless it would overlap
fn month_label_line(layout: &HeatmapLayout, cell_w: usize) -> String {
    let mut text = " ".repeat(GUTTER);
    for (month, col) in layout.month_columns().into_iter().enumerate() {
        let x = GUTTER + col * cell_w;
        if x < text.chars().count() {
            continue;
        }
        text.push_str(&" ".repeat(x - text.chars().count()));
        text.push_str(MONTH_LABELS[month]);
    }
    text
}

fn heatmap_lines<'a>(
    layout: &HeatmapLayout,
    values: &BTreeMap<NaiveDate, f64>,
    theme: &Theme,
    width: usize,
) -> Vec<Line<'a>> {
    let cell_w = cell_width(layout.columns, width);
    let max = max_value(values);

    // grid[row][col] holds the day's colour, None before Jan 1 / after Dec 31
    let mut grid = vec![vec![None; layout.columns]; ROWS];
    for cell in &layout.cells {
        let value = values.get(&cell.date).copied().unwrap_or(0.0);
        grid[cell.row][cell.col] = Some(theme.heat_color(value, max));
    }

    let mut lines = vec![Line::from(Span::styled(
        month_label_line(layout, cell_w),
        theme.dimmed_style(),
    ))];

    for (row, cells) in grid.into_iter().enumerate() {
        let label = if row % 2 == 0 && row < 6 {
            WEEKDAY_LABELS[row]
        } else {
            ""
        };
        let mut spans = vec![Span::styled(
            format!("{label:<width$}", width = GUTTER),
            theme.dimmed_style(),
        )];
        for color in cells {
            let glyph = match (color, cell_w) {
                (Some(_), 2) => format!("{CELL_GLYPH} "),
                (Some(_), _) => CELL_GLYPH.to_string(),
                (None, w) => " ".repeat(w),
            };
            let style = color.map(|c| Style::default().fg(c)).unwrap_or_default();
            spans.push(Span::styled(glyph, style));
        }
        lines.push(Line::from(spans));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_text(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_cell_width_adapts() {
        assert_eq!(cell_width(53, 200), 2);
        assert_eq!(cell_width(53, 80), 1);
    }

    #[test]
    fn test_month_labels_positions() {
        let layout = HeatmapLayout::for_year(2024).unwrap();
        let text = month_label_line(&layout, 2);
        assert!(text.starts_with("    Jan"));
        // Feb 2024 starts in column 4 -> offset 4 + 4 * 2
        assert_eq!(text.find("Feb"), Some(12));
    }

    #[test]
    fn test_lines_have_header_and_seven_rows() {
        let layout = HeatmapLayout::for_year(2023).unwrap();
        let theme = Theme::dark(4);
        let lines = heatmap_lines(&layout, &BTreeMap::new(), &theme, 200);
        assert_eq!(lines.len(), 1 + ROWS);
        assert!(line_text(&lines[1]).starts_with("Mon"));
        assert!(line_text(&lines[3]).starts_with("Wed"));
        assert!(line_text(&lines[5]).starts_with("Fri"));

        // 2023 starts and ends on a Sunday
        let sunday = line_text(&lines[7]);
        let monday = line_text(&lines[1]);
        assert_eq!(sunday.chars().filter(|c| *c == '■').count(), 53);
        assert_eq!(monday.chars().filter(|c| *c == '■').count(), 52);
    }
}
