//! Theme configuration for the TUI.

use ratatui::style::{Color, Modifier, Style};

use crate::heatmap::{ColorScale, Rgb};

/// Severity of a status bar notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Warning,
    Error,
}

/// Color theme for the application
#[derive(Debug, Clone)]
pub struct Theme {
    pub bg: Color,
    pub fg: Color,
    pub highlight_bg: Color,
    pub highlight_fg: Color,
    pub border: Color,
    pub title: Color,
    pub success: Color,
    pub warning: Color,
    pub error: Color,
    pub bar: Color,
    pub scale: ColorScale,
}

fn to_color(rgb: Rgb) -> Color {
    Color::Rgb(rgb.0, rgb.1, rgb.2)
}

impl Theme {
    pub fn new(dark: bool, levels: u8) -> Self {
        if dark {
            Self::dark(levels)
        } else {
            Self::light(levels)
        }
    }

    pub fn dark(levels: u8) -> Self {
        Theme {
            bg: Color::Reset,
            fg: Color::White,
            highlight_bg: Color::Rgb(60, 60, 80),
            highlight_fg: Color::White,
            border: Color::Rgb(100, 100, 120),
            title: Color::Cyan,
            success: Color::LightGreen,
            warning: Color::Yellow,
            error: Color::LightRed,
            bar: Color::Green,
            scale: ColorScale::dark(levels),
        }
    }

    pub fn light(levels: u8) -> Self {
        Theme {
            bg: Color::Reset,
            fg: Color::Black,
            highlight_bg: Color::Rgb(210, 215, 230),
            highlight_fg: Color::Black,
            border: Color::Rgb(140, 140, 150),
            title: Color::Blue,
            success: Color::Green,
            warning: Color::Rgb(180, 120, 0),
            error: Color::Red,
            bar: Color::Rgb(0x2d, 0xa4, 0x4e),
            scale: ColorScale::light(levels),
        }
    }

    /// Base surface style used to paint widget backgrounds
    pub fn surface_style(&self) -> Style {
        Style::default().fg(self.fg).bg(self.bg)
    }

    /// Get style for normal text
    pub fn normal_style(&self) -> Style {
        Style::default().fg(self.fg)
    }

    /// Get style for borders
    pub fn border_style(&self) -> Style {
        Style::default().fg(self.border)
    }

    /// Get style for titles
    pub fn title_style(&self) -> Style {
        Style::default()
            .fg(self.title)
            .add_modifier(Modifier::BOLD)
    }

    /// Get style for secondary text such as axis labels
    pub fn dimmed_style(&self) -> Style {
        Style::default()
            .fg(self.border)
            .add_modifier(Modifier::DIM)
    }

    /// Style for the input line while typing
    pub fn highlight_style(&self) -> Style {
        Style::default()
            .fg(self.highlight_fg)
            .bg(self.highlight_bg)
            .add_modifier(Modifier::BOLD)
    }

    /// Style for a notification of the given level
    pub fn notice_style(&self, level: NoticeLevel) -> Style {
        let color = match level {
            NoticeLevel::Success => self.success,
            NoticeLevel::Warning => self.warning,
            NoticeLevel::Error => self.error,
        };
        Style::default().fg(color).add_modifier(Modifier::BOLD)
    }

    /// Heatmap colour for a day's distance
    pub fn heat_color(&self, value: f64, max: f64) -> Color {
        to_color(self.scale.color(value, max))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notice_styles_are_distinct() {
        let theme = Theme::dark(4);
        let s = theme.notice_style(NoticeLevel::Success);
        let w = theme.notice_style(NoticeLevel::Warning);
        let e = theme.notice_style(NoticeLevel::Error);
        assert_ne!(s.fg, w.fg);
        assert_ne!(w.fg, e.fg);
        assert_ne!(s.fg, e.fg);
    }

    #[test]
    fn test_heat_color_follows_scale() {
        let theme = Theme::light(4);
        assert_eq!(theme.heat_color(0.0, 10.0), to_color(theme.scale.empty));
        assert_eq!(theme.heat_color(10.0, 10.0), to_color(theme.scale.high));
    }

    #[test]
    fn test_new_picks_variant() {
        assert_eq!(Theme::new(true, 4).scale, ColorScale::dark(4));
        assert_eq!(Theme::new(false, 0).scale, ColorScale::light(0));
    }
}
