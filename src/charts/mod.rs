//! Charts module - static SVG histogram and interactive HTML dashboard

mod dashboard;
mod histogram;

pub use dashboard::{DashboardData, DashboardRenderer, DASHBOARD_FILE};
pub use histogram::{HistogramRenderer, HISTOGRAM_FILE};

use plotters::style::RGBColor;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChartError {
    #[error("Failed to render chart: {0}")]
    Render(String),
    #[error("Failed to write chart: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to serialize chart data: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),
    #[error("Nothing to plot")]
    NoData,
}

/// Color of the baseline dataset
pub const CONTROL_COLOR: RGBColor = RGBColor(52, 152, 219); // Blue

pub const PALETTE: [RGBColor; 10] = [
    RGBColor(231, 76, 60),  // Red
    RGBColor(46, 204, 113), // Green
    RGBColor(155, 89, 182), // Purple
    RGBColor(243, 156, 18), // Orange
    RGBColor(26, 188, 156), // Teal
    RGBColor(233, 30, 99),  // Pink
    RGBColor(0, 188, 212),  // Cyan
    RGBColor(255, 87, 34),  // Deep Orange
    RGBColor(121, 85, 72),  // Brown
    RGBColor(96, 125, 139), // Blue Grey
];

/// Get color for the dataset at `index` in report order (0 = baseline).
pub fn get_group_color(index: usize) -> RGBColor {
    if index == 0 {
        CONTROL_COLOR
    } else {
        PALETTE[(index - 1) % PALETTE.len()]
    }
}

/// CSS hex notation, e.g. `#3498db`.
pub fn to_hex(color: RGBColor) -> String {
    let RGBColor(r, g, b) = color;
    format!("#{r:02x}{g:02x}{b:02x}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn baseline_keeps_its_color() {
        assert_eq!(to_hex(get_group_color(0)), "#3498db");
        assert_eq!(to_hex(get_group_color(1)), "#e74c3c");
        assert_eq!(to_hex(get_group_color(11)), to_hex(get_group_color(1)));
    }
}
