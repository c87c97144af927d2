//! Trend chart widget for monthly and yearly distance.

use ratatui::{
    layout::{Alignment, Rect},
    style::{Modifier, Style},
    text::Line,
    widgets::{Bar, BarChart, BarGroup, Block, Borders, Paragraph},
    Frame,
};

use super::theme::Theme;
use crate::export::TrendPoint;

/// Which aggregation the trend chart shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrendMode {
    #[default]
    Monthly,
    Yearly,
}

impl TrendMode {
    pub fn toggle(self) -> Self {
        match self {
            TrendMode::Monthly => TrendMode::Yearly,
            TrendMode::Yearly => TrendMode::Monthly,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            TrendMode::Monthly => "Monthly",
            TrendMode::Yearly => "Yearly",
        }
    }
}

/// Bar chart of per-period distance
pub struct TrendChart<'a> {
    points: &'a [TrendPoint],
    mode: TrendMode,
    theme: &'a Theme,
}

impl<'a> TrendChart<'a> {
    pub fn new(points: &'a [TrendPoint], mode: TrendMode, theme: &'a Theme) -> Self {
        TrendChart {
            points,
            mode,
            theme,
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let cumulative = self.points.last().map(|p| p.cumulative).unwrap_or(0.0);
        let block = Block::default()
            .title(format!(
                " {} distance (km) · cumulative {:.0} km · [t] toggle ",
                self.mode.title(),
                cumulative
            ))
            .borders(Borders::ALL)
            .border_style(self.theme.border_style())
            .title_style(self.theme.title_style());

        if self.points.is_empty() {
            let inner = block.inner(area);
            frame.render_widget(block, area);
            let message = Paragraph::new("No data available")
                .style(Style::default().add_modifier(Modifier::DIM))
                .alignment(Alignment::Center);
            frame.render_widget(message, inner);
            return;
        }

        let bar_width = bar_width(self.mode);
        let visible = visible_points(self.points, area.width.saturating_sub(2), bar_width);

        let bars: Vec<Bar> = visible
            .iter()
            .map(|p| {
                Bar::default()
                    .value(p.distance.round().max(0.0) as u64)
                    .text_value(format!("{:.0}", p.distance))
                    .label(Line::from(short_label(&p.label, self.mode)))
                    .style(Style::default().fg(self.theme.bar))
                    .value_style(self.theme.highlight_style())
            })
            .collect();

        let chart = BarChart::default()
            .block(block)
            .bar_width(bar_width)
            .bar_gap(1)
            .label_style(self.theme.dimmed_style())
            .data(BarGroup::default().bars(&bars));

        frame.render_widget(chart, area);
    }
}

fn bar_width(mode: TrendMode) -> u16 {
    match mode {
        TrendMode::Monthly => 3,
        TrendMode::Yearly => 5,
    }
}

/// The most recent points that fit in `width` columns
fn visible_points(points: &[TrendPoint], width: u16, bar_width: u16) -> &[TrendPoint] {
    let fit = (width / (bar_width + 1)).max(1) as usize;
    &points[points.len().saturating_sub(fit)..]
}

/// Month labels shrink to `MM`; years stay whole
fn short_label(label: &str, mode: TrendMode) -> String {
    match mode {
        TrendMode::Monthly => label.rsplit('-').next().unwrap_or(label).to_string(),
        TrendMode::Yearly => label.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(label: &str) -> TrendPoint {
        TrendPoint {
            label: label.to_string(),
            distance: 10.0,
            cumulative: 10.0,
        }
    }

    #[test]
    fn test_toggle() {
        assert_eq!(TrendMode::Monthly.toggle(), TrendMode::Yearly);
        assert_eq!(TrendMode::Yearly.toggle(), TrendMode::Monthly);
    }

    #[test]
    fn test_visible_points_keeps_latest() {
        let points: Vec<TrendPoint> = (1..=12).map(|m| point(&format!("2024-{m:02}"))).collect();
        let visible = visible_points(&points, 16, 3);
        assert_eq!(visible.len(), 4);
        assert_eq!(visible[0].label, "2024-09");
        assert_eq!(visible_points(&points, 0, 3).len(), 1);
        assert_eq!(visible_points(&points, 400, 3).len(), 12);
    }

    #[test]
    fn test_short_label() {
        assert_eq!(short_label("2024-03", TrendMode::Monthly), "03");
        assert_eq!(short_label("2024", TrendMode::Yearly), "2024");
    }
}
