//! Key reference shown over the dashboard.

use ratatui::{
    layout::{Alignment, Constraint, Flex, Layout, Rect},
    text::Line,
    widgets::{Block, Borders, Cell, Clear, Row, Table},
    Frame,
};

use super::theme::Theme;

/// `(group, key, action)`; an empty group continues the previous one
const KEYS: &[(&str, &str, &str)] = &[
    ("Year", "← / [", "Previous year with runs"),
    ("", "→ / ]", "Next year with runs"),
    ("Chart", "t", "Monthly / yearly totals"),
    ("Runs", "a", "Add a run for today"),
    ("", "u", "Undo the run added this session"),
    ("Files", "e", "Export heatmap and charts (SVG)"),
    ("", "p", "Export, commit and push"),
    ("General", "r", "Reload from the database"),
    ("", "? / F1", "Toggle this help"),
    ("", "q", "Quit"),
];

const WIDTH: u16 = 58;

pub struct HelpOverlay<'a> {
    theme: &'a Theme,
}

impl<'a> HelpOverlay<'a> {
    pub fn new(theme: &'a Theme) -> Self {
        HelpOverlay { theme }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        // Borders, header, blank line and footer
        let height = KEYS.len() as u16 + 5;
        let popup = popup_area(area, WIDTH, height);
        frame.render_widget(Clear, popup);

        let rows = KEYS.iter().map(|(group, key, action)| {
            Row::new([
                Cell::from(*group).style(self.theme.dimmed_style()),
                Cell::from(*key).style(self.theme.title_style()),
                Cell::from(*action).style(self.theme.normal_style()),
            ])
        });

        let table = Table::new(
            rows,
            [Constraint::Length(8), Constraint::Length(8), Constraint::Fill(1)],
        )
        .header(
            Row::new(["", "Key", "Action"])
                .style(self.theme.highlight_style())
                .bottom_margin(1),
        )
        .column_spacing(2)
        .block(
            Block::default()
                .title(" runlog keys ")
                .title_alignment(Alignment::Center)
                .title_bottom(Line::from(" Esc to close ").alignment(Alignment::Right))
                .borders(Borders::ALL)
                .border_style(self.theme.border_style())
                .title_style(self.theme.title_style())
                .style(self.theme.surface_style()),
        );

        frame.render_widget(table, popup);
    }
}

/// A `width` x `height` rect centred in `area`, shrunk to fit
fn popup_area(area: Rect, width: u16, height: u16) -> Rect {
    let [row] = Layout::vertical([Constraint::Length(height.min(area.height))])
        .flex(Flex::Center)
        .areas(area);
    let [popup] = Layout::horizontal([Constraint::Length(width.min(area.width))])
        .flex(Flex::Center)
        .areas(row);
    popup
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_popup_area_is_centred() {
        let area = Rect::new(0, 0, 100, 40);
        let popup = popup_area(area, 58, 15);
        assert_eq!((popup.width, popup.height), (58, 15));
        assert_eq!(popup.x, 21);
        assert!((12..=13).contains(&popup.y));
    }

    #[test]
    fn test_popup_area_shrinks_to_small_terminals() {
        let area = Rect::new(0, 0, 40, 10);
        let popup = popup_area(area, 58, 15);
        assert_eq!(popup, area);
    }

    #[test]
    fn test_every_group_starts_with_a_name() {
        assert!(!KEYS[0].0.is_empty());
        assert!(KEYS.iter().all(|(_, key, action)| !key.is_empty() && !action.is_empty()));
    }
}
