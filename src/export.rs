//! SVG rendering of the yearly heatmap and the monthly/yearly trend charts.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use tracing::info;

use crate::data::{MonthlyTotals, Storage, YearlyTotals};
use crate::heatmap::{max_value, ColorScale, Geometry, HeatmapLayout, Rgb, MONTH_LABELS, WEEKDAY_LABELS};

/// Colours used for exported images
#[derive(Debug, Clone)]
pub struct ExportStyle {
    pub scale: ColorScale,
    pub background: Rgb,
    pub text: Rgb,
    pub bar: Rgb,
    pub line: Rgb,
}

impl ExportStyle {
    pub fn new(dark: bool, levels: u8) -> Self {
        if dark {
            ExportStyle {
                scale: ColorScale::dark(levels),
                background: Rgb(0x0d, 0x11, 0x17),
                text: Rgb(0xc9, 0xd1, 0xd9),
                bar: Rgb(0x26, 0xa6, 0x41),
                line: Rgb(0xf0, 0x88, 0x3e),
            }
        } else {
            ExportStyle {
                scale: ColorScale::light(levels),
                background: Rgb(0xff, 0xff, 0xff),
                text: Rgb(0x24, 0x29, 0x2f),
                bar: Rgb(0x2d, 0xa4, 0x4e),
                line: Rgb(0xd1, 0x5b, 0x04),
            }
        }
    }
}

/// One period of a trend chart
#[derive(Debug, Clone, PartialEq)]
pub struct TrendPoint {
    pub label: String,
    pub distance: f64,
    pub cumulative: f64,
}

impl From<&MonthlyTotals> for TrendPoint {
    fn from(m: &MonthlyTotals) -> Self {
        TrendPoint {
            label: m.month.clone(),
            distance: m.total_distance,
            cumulative: m.cumulative_distance,
        }
    }
}

impl From<&YearlyTotals> for TrendPoint {
    fn from(y: &YearlyTotals) -> Self {
        TrendPoint {
            label: y.year.to_string(),
            distance: y.total_distance,
            cumulative: y.cumulative_distance,
        }
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Render a year's heatmap. `values` maps dates to kilometres.
pub fn heatmap_svg(year: i32, values: &BTreeMap<NaiveDate, f64>, style: &ExportStyle) -> Option<String> {
    let layout = HeatmapLayout::for_year(year)?;
    let geometry = Geometry::default();
    let (width, height) = geometry.size(&layout);
    let max = max_value(values);
    let total: f64 = values.values().sum();
    let text = style.text.to_hex();

    let mut svg = String::new();
    let _ = writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}" viewBox="0 0 {width} {height}" font-family="sans-serif" font-size="10">"#
    );
    let _ = writeln!(svg, "<title>{year}: {total:.1} km on {} days</title>", values.len());
    let _ = writeln!(
        svg,
        r#"<rect width="100%" height="100%" fill="{}"/>"#,
        style.background.to_hex()
    );

    for row in [0, 2, 4] {
        let (_, y) = geometry.origin(0, row);
        let _ = writeln!(
            svg,
            r#"<text x="2" y="{}" fill="{text}">{}</text>"#,
            y + geometry.cell - 2,
            WEEKDAY_LABELS[row]
        );
    }

    for (month, col) in layout.month_columns().into_iter().enumerate() {
        let (x, _) = geometry.origin(col, 0);
        let _ = writeln!(
            svg,
            r#"<text x="{x}" y="{}" fill="{text}">{}</text>"#,
            geometry.top - 10,
            MONTH_LABELS[month]
        );
    }

    for cell in &layout.cells {
        let value = values.get(&cell.date).copied().unwrap_or(0.0);
        let (x, y) = geometry.origin(cell.col, cell.row);
        let _ = writeln!(
            svg,
            r#"<rect x="{x}" y="{y}" width="{c}" height="{c}" rx="2" fill="{fill}"><title>{date}: {value:.1} km</title></rect>"#,
            c = geometry.cell,
            fill = style.scale.color(value, max).to_hex(),
            date = cell.date,
        );
    }

    svg.push_str("</svg>\n");
    Some(svg)
}

const TREND_WIDTH: f64 = 720.0;
const TREND_HEIGHT: f64 = 360.0;
const MARGIN_X: f64 = 56.0;
const MARGIN_TOP: f64 = 40.0;
const MARGIN_BOTTOM: f64 = 44.0;
const MAX_X_LABELS: usize = 12;

/// Render a bar chart of per-period distance with a cumulative line
pub fn trend_svg(title: &str, points: &[TrendPoint], style: &ExportStyle) -> String {
    let text = style.text.to_hex();
    let plot_w = TREND_WIDTH - 2.0 * MARGIN_X;
    let plot_h = TREND_HEIGHT - MARGIN_TOP - MARGIN_BOTTOM;
    let baseline = MARGIN_TOP + plot_h;

    let mut svg = String::new();
    let _ = writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{TREND_WIDTH}" height="{TREND_HEIGHT}" viewBox="0 0 {TREND_WIDTH} {TREND_HEIGHT}" font-family="sans-serif" font-size="11">"#
    );
    let _ = writeln!(
        svg,
        r#"<rect width="100%" height="100%" fill="{}"/>"#,
        style.background.to_hex()
    );
    let _ = writeln!(
        svg,
        r#"<text x="{}" y="24" fill="{text}" font-size="14" text-anchor="middle">{}</text>"#,
        TREND_WIDTH / 2.0,
        escape(title)
    );
    let _ = writeln!(
        svg,
        r#"<line x1="{MARGIN_X}" y1="{baseline}" x2="{}" y2="{baseline}" stroke="{text}"/>"#,
        MARGIN_X + plot_w
    );

    if points.is_empty() {
        let _ = writeln!(
            svg,
            r#"<text x="{}" y="{}" fill="{text}" text-anchor="middle">No data available</text>"#,
            TREND_WIDTH / 2.0,
            MARGIN_TOP + plot_h / 2.0
        );
        svg.push_str("</svg>\n");
        return svg;
    }

    let max_distance = points.iter().map(|p| p.distance).fold(0.0, f64::max).max(1.0);
    let max_cumulative = points.iter().map(|p| p.cumulative).fold(0.0, f64::max).max(1.0);
    let slot = plot_w / points.len() as f64;
    let bar_w = (slot * 0.7).max(1.0);
    let label_every = points.len().div_ceil(MAX_X_LABELS);

    // Axis extremes: left for period distance, right for cumulative
    let _ = writeln!(
        svg,
        r#"<text x="{}" y="{}" fill="{text}" text-anchor="end">{max_distance:.0}</text>"#,
        MARGIN_X - 4.0,
        MARGIN_TOP + 4.0
    );
    let _ = writeln!(
        svg,
        r#"<text x="{}" y="{}" fill="{}" text-anchor="start">{max_cumulative:.0}</text>"#,
        MARGIN_X + plot_w + 4.0,
        MARGIN_TOP + 4.0,
        style.line.to_hex()
    );

    let mut line_points = Vec::with_capacity(points.len());
    for (i, point) in points.iter().enumerate() {
        let center = MARGIN_X + slot * (i as f64 + 0.5);
        let bar_h = plot_h * point.distance / max_distance;
        let _ = writeln!(
            svg,
            r#"<rect x="{:.1}" y="{:.1}" width="{bar_w:.1}" height="{bar_h:.1}" fill="{}"><title>{}: {:.1} km</title></rect>"#,
            center - bar_w / 2.0,
            baseline - bar_h,
            style.bar.to_hex(),
            escape(&point.label),
            point.distance
        );
        line_points.push(format!(
            "{center:.1},{:.1}",
            baseline - plot_h * point.cumulative / max_cumulative
        ));

        if i % label_every == 0 {
            let _ = writeln!(
                svg,
                r#"<text x="{center:.1}" y="{}" fill="{text}" text-anchor="middle">{}</text>"#,
                baseline + 16.0,
                escape(&point.label)
            );
        }
    }

    let _ = writeln!(
        svg,
        r#"<polyline points="{}" fill="none" stroke="{}" stroke-width="2"/>"#,
        line_points.join(" "),
        style.line.to_hex()
    );
    svg.push_str("</svg>\n");
    svg
}

/// Write `heatmap-<year>.svg`, `monthly.svg` and `yearly.svg` into `dir`
pub fn export_all(storage: &Storage, year: i32, dir: &Path, style: &ExportStyle) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory: {dir:?}"))?;

    let values = storage.daily_distances(year)?;
    let heatmap = heatmap_svg(year, &values, style)
        .with_context(|| format!("Year out of range: {year}"))?;

    let monthly: Vec<TrendPoint> = storage.monthly_totals()?.iter().map(TrendPoint::from).collect();
    let yearly: Vec<TrendPoint> = storage.yearly_totals()?.iter().map(TrendPoint::from).collect();

    let files = [
        (format!("heatmap-{year}.svg"), heatmap),
        ("monthly.svg".to_string(), trend_svg("Monthly distance (km)", &monthly, style)),
        ("yearly.svg".to_string(), trend_svg("Yearly distance (km)", &yearly, style)),
    ];

    let mut written = Vec::with_capacity(files.len());
    for (name, contents) in files {
        let path = dir.join(name);
        std::fs::write(&path, contents).with_context(|| format!("Failed to write {path:?}"))?;
        written.push(path);
    }
    info!(year, dir = ?dir, "exported images");
    Ok(written)
}
