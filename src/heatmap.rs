//! Calendar heatmap layout and colour mapping.
//!
//! A year is laid out as a grid with one row per weekday (Monday first) and
//! one column per calendar week. Both the terminal widget and the SVG export
//! draw from the same [`HeatmapLayout`] and [`ColorScale`].

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};

/// Number of rows in the grid (one per weekday)
pub const ROWS: usize = 7;

/// Short weekday labels indexed by row
pub const WEEKDAY_LABELS: [&str; ROWS] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

/// Short month labels indexed by month - 1
pub const MONTH_LABELS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// An 8-bit RGB colour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }

    /// Per-channel linear interpolation, `t` clamped to `0..=1`
    pub fn lerp(self, to: Rgb, t: f64) -> Rgb {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
        Rgb(mix(self.0, to.0), mix(self.1, to.1), mix(self.2, to.2))
    }
}

/// Maps a day's distance to a colour
#[derive(Debug, Clone, PartialEq)]
pub struct ColorScale {
    pub empty: Rgb,
    pub low: Rgb,
    pub high: Rgb,
    /// Number of discrete shades; 0 interpolates continuously
    pub levels: u8,
}

impl ColorScale {
    pub fn light(levels: u8) -> Self {
        ColorScale {
            empty: Rgb(0xeb, 0xed, 0xf0),
            low: Rgb(0x9b, 0xe9, 0xa8),
            high: Rgb(0x21, 0x6e, 0x39),
            levels,
        }
    }

    pub fn dark(levels: u8) -> Self {
        ColorScale {
            empty: Rgb(0x16, 0x1b, 0x22),
            low: Rgb(0x0e, 0x44, 0x29),
            high: Rgb(0x39, 0xd3, 0x53),
            levels,
        }
    }

    /// Position between `low` (0.0) and `high` (1.0), or `None` for an empty day
    pub fn intensity(&self, value: f64, max: f64) -> Option<f64> {
        if !(value > 0.0) || !(max > 0.0) {
            return None;
        }
        let t = (value / max).min(1.0);
        if self.levels == 0 {
            return Some(t);
        }
        let n = self.levels as f64;
        let level = (t * n).ceil().clamp(1.0, n);
        if self.levels == 1 {
            Some(1.0)
        } else {
            Some((level - 1.0) / (n - 1.0))
        }
    }

    pub fn color(&self, value: f64, max: f64) -> Rgb {
        match self.intensity(value, max) {
            Some(t) => self.low.lerp(self.high, t),
            None => self.empty,
        }
    }
}

/// One day's position in the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub date: NaiveDate,
    pub col: usize,
    pub row: usize,
}

/// Grid placement of every day of a year
#[derive(Debug, Clone)]
pub struct HeatmapLayout {
    pub year: i32,
    /// Row of January 1st (Monday = 0)
    pub offset: usize,
    pub columns: usize,
    pub cells: Vec<Cell>,
}

impl HeatmapLayout {
    /// Lay out a year; `None` if the year is outside chrono's range
    pub fn for_year(year: i32) -> Option<Self> {
        let start = NaiveDate::from_ymd_opt(year, 1, 1)?;
        let end = NaiveDate::from_ymd_opt(year + 1, 1, 1)?;
        let offset = start.weekday().num_days_from_monday() as usize;
        let days = (end - start).num_days() as usize;

        let cells = start
            .iter_days()
            .take(days)
            .enumerate()
            .map(|(i, date)| Cell {
                date,
                col: (i + offset) / ROWS,
                row: (i + offset) % ROWS,
            })
            .collect();

        Some(HeatmapLayout {
            year,
            offset,
            columns: (offset + days).div_ceil(ROWS),
            cells,
        })
    }

    /// Column holding the 1st of each month, January first
    pub fn month_columns(&self) -> Vec<usize> {
        (1..=12)
            .filter_map(|m| NaiveDate::from_ymd_opt(self.year, m, 1))
            .filter_map(|d| self.position(d))
            .map(|(col, _)| col)
            .collect()
    }

    /// Grid position of a date, if it belongs to this year
    pub fn position(&self, date: NaiveDate) -> Option<(usize, usize)> {
        if date.year() != self.year {
            return None;
        }
        let i = date.ordinal0() as usize + self.offset;
        Some((i / ROWS, i % ROWS))
    }
}

/// Largest day value, 0.0 for an empty year
pub fn max_value(values: &BTreeMap<NaiveDate, f64>) -> f64 {
    values.values().copied().fold(0.0, f64::max)
}

/// Pixel geometry used when rendering the grid to an image
#[derive(Debug, Clone, Copy)]
pub struct Geometry {
    pub cell: u32,
    pub gap: u32,
    pub left: u32,
    pub top: u32,
}

impl Default for Geometry {
    fn default() -> Self {
        Geometry {
            cell: 12,
            gap: 2,
            left: 30,
            top: 30,
        }
    }
}

impl Geometry {
    /// Top-left pixel of a grid cell
    pub fn origin(&self, col: usize, row: usize) -> (u32, u32) {
        let step = self.cell + self.gap;
        (
            self.left + col as u32 * step,
            self.top + row as u32 * step,
        )
    }

    /// Total image size for a layout
    pub fn size(&self, layout: &HeatmapLayout) -> (u32, u32) {
        let step = self.cell + self.gap;
        (
            self.left + layout.columns as u32 * step + self.gap,
            self.top + ROWS as u32 * step + self.gap,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_layout_2024_starts_on_monday() {
        // 2024-01-01 was a Monday and 2024 is a leap year
        let layout = HeatmapLayout::for_year(2024).unwrap();
        assert_eq!(layout.offset, 0);
        assert_eq!(layout.cells.len(), 366);
        assert_eq!(layout.columns, 53);
        assert_eq!(layout.cells[0], Cell { date: date(2024, 1, 1), col: 0, row: 0 });
        assert_eq!(layout.position(date(2024, 12, 31)), Some((52, 1)));
    }

    #[test]
    fn test_layout_2023_offset() {
        // 2023-01-01 was a Sunday
        let layout = HeatmapLayout::for_year(2023).unwrap();
        assert_eq!(layout.offset, 6);
        assert_eq!(layout.cells.len(), 365);
        assert_eq!(layout.position(date(2023, 1, 1)), Some((0, 6)));
        assert_eq!(layout.position(date(2023, 1, 2)), Some((1, 0)));
        assert_eq!(layout.columns, 53);
    }

    #[test]
    fn test_layout_may_need_54_columns() {
        // 2012 is a leap year starting on a Sunday
        let layout = HeatmapLayout::for_year(2012).unwrap();
        assert_eq!(layout.offset, 6);
        assert_eq!(layout.columns, 54);
        let last = layout.cells.last().unwrap();
        assert_eq!(last.col, layout.columns - 1);
    }

    #[test]
    fn test_every_cell_is_unique_and_in_bounds() {
        let layout = HeatmapLayout::for_year(2025).unwrap();
        let mut seen = std::collections::HashSet::new();
        for cell in &layout.cells {
            assert!(cell.col < layout.columns && cell.row < ROWS);
            assert!(seen.insert((cell.col, cell.row)));
            assert_eq!(cell.row, cell.date.weekday().num_days_from_monday() as usize);
        }
        assert_eq!(layout.position(date(2024, 6, 1)), None);
    }

    #[test]
    fn test_month_columns() {
        let layout = HeatmapLayout::for_year(2024).unwrap();
        let cols = layout.month_columns();
        assert_eq!(cols.len(), 12);
        assert_eq!(cols[0], 0);
        // Feb 1 2024 is day 31 -> column 4
        assert_eq!(cols[1], 4);
        assert!(cols.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_continuous_scale() {
        let scale = ColorScale {
            empty: Rgb(200, 200, 200),
            low: Rgb(0, 0, 0),
            high: Rgb(0, 200, 0),
            levels: 0,
        };
        assert_eq!(scale.color(0.0, 10.0), Rgb(200, 200, 200));
        assert_eq!(scale.color(5.0, 10.0), Rgb(0, 100, 0));
        assert_eq!(scale.color(10.0, 10.0), Rgb(0, 200, 0));
        // Values above the max saturate
        assert_eq!(scale.color(20.0, 10.0), Rgb(0, 200, 0));
    }

    #[test]
    fn test_quantised_scale() {
        let scale = ColorScale::light(4);
        assert_eq!(scale.intensity(0.0, 20.0), None);
        assert_eq!(scale.intensity(1.0, 20.0), Some(0.0));
        assert_eq!(scale.intensity(5.0, 20.0), Some(0.0));
        assert_eq!(scale.intensity(6.0, 20.0), Some(1.0 / 3.0));
        assert_eq!(scale.intensity(20.0, 20.0), Some(1.0));
        assert_eq!(scale.color(20.0, 20.0), scale.high);
        assert_eq!(scale.color(0.5, 20.0), scale.low);

        let single = ColorScale::dark(1);
        assert_eq!(single.color(0.1, 20.0), single.high);
    }

    #[test]
    fn test_zero_max_is_empty() {
        let scale = ColorScale::dark(4);
        assert_eq!(scale.color(5.0, 0.0), scale.empty);
    }

    #[test]
    fn test_rgb_hex() {
        assert_eq!(Rgb(0x21, 0x6e, 0x39).to_hex(), "#216e39");
        assert_eq!(Rgb(0, 0, 0).lerp(Rgb(255, 255, 255), 2.0), Rgb(255, 255, 255));
    }

    #[test]
    fn test_geometry() {
        let geometry = Geometry::default();
        assert_eq!(geometry.origin(0, 0), (30, 30));
        assert_eq!(geometry.origin(2, 3), (58, 72));
        let layout = HeatmapLayout::for_year(2024).unwrap();
        assert_eq!(geometry.size(&layout), (30 + 53 * 14 + 2, 30 + 7 * 14 + 2));
    }

    #[test]
    fn test_max_value() {
        let mut values = BTreeMap::new();
        assert_eq!(max_value(&values), 0.0);
        values.insert(date(2024, 1, 1), 5.0);
        values.insert(date(2024, 1, 2), 12.5);
        assert_eq!(max_value(&values), 12.5);
    }
}
