//! Terminal User Interface components for runlog.

pub mod chart;
pub mod heatmap;
mod help;
pub mod theme;
pub mod widgets;

pub use help::HelpOverlay;
pub use theme::{NoticeLevel, Theme};
