//! Static Histogram Renderer
//! Overlaid density histograms (step outline) with a KDE curve per dataset,
//! written as SVG with plotters.
//!
//! Every dataset is normalized on its own so datasets with different sample
//! counts stay comparable; all of them share the same bin edges.

use super::{get_group_color, ChartError};
use crate::stats::distribution::{gaussian_kde, histogram_density, histogram_edges, linspace};
use plotters::prelude::*;
use std::path::Path;

/// Default output file name.
pub const HISTOGRAM_FILE: &str = "compare_result.svg";

const WIDTH: u32 = 1200;
const HEIGHT: u32 = 700;
const KDE_POINTS: usize = 200;

/// Density curves of one dataset, ready to draw.
#[derive(Debug, Clone)]
pub struct DensitySeries {
    pub name: String,
    pub color: RGBColor,
    /// One density per bin.
    pub density: Vec<f64>,
    /// `(x, density)` points of the KDE curve; empty if it cannot be estimated.
    pub kde: Vec<(f64, f64)>,
}

pub struct HistogramRenderer;

impl HistogramRenderer {
    /// Shared bin edges and one density series per non-empty dataset.
    pub fn compute_series(groups: &[(String, Vec<f64>)], bins: usize) -> (Vec<f64>, Vec<DensitySeries>) {
        let edges = histogram_edges(groups.iter().flat_map(|(_, values)| values.iter()), bins);
        if edges.is_empty() {
            return (edges, Vec::new());
        }

        let grid = linspace(edges[0], edges[edges.len() - 1], KDE_POINTS);
        let series = groups
            .iter()
            .enumerate()
            .filter(|(_, (_, values))| !values.is_empty())
            .map(|(i, (name, values))| {
                let kde = gaussian_kde(values, &grid);
                DensitySeries {
                    name: name.clone(),
                    color: get_group_color(i),
                    density: histogram_density(values, &edges),
                    kde: grid.iter().copied().zip(kde).collect(),
                }
            })
            .collect();

        (edges, series)
    }

    /// Outline of a step histogram, starting and ending on the x axis.
    pub fn step_outline(edges: &[f64], density: &[f64]) -> Vec<(f64, f64)> {
        if edges.len() != density.len() + 1 || density.is_empty() {
            return Vec::new();
        }

        let mut points = Vec::with_capacity(density.len() * 2 + 2);
        points.push((edges[0], 0.0));
        for (i, &d) in density.iter().enumerate() {
            points.push((edges[i], d));
            points.push((edges[i + 1], d));
        }
        points.push((edges[density.len()], 0.0));
        points
    }

    /// Render the overlaid histogram of `groups` to an SVG file.
    pub fn render_svg(
        groups: &[(String, Vec<f64>)],
        bins: usize,
        output_path: &Path,
    ) -> Result<(), ChartError> {
        let (edges, series) = Self::compute_series(groups, bins);
        if series.is_empty() {
            return Err(ChartError::NoData);
        }

        let x_min = edges[0];
        let x_max = edges[edges.len() - 1];
        let y_max = series
            .iter()
            .flat_map(|s| s.density.iter().copied().chain(s.kde.iter().map(|&(_, y)| y)))
            .fold(0.0f64, f64::max);
        let y_max = if y_max > 0.0 { y_max * 1.1 } else { 1.0 };

        let root = SVGBackend::new(output_path, (WIDTH, HEIGHT)).into_drawing_area();
        root.fill(&WHITE).map_err(render_err)?;

        let mut chart = ChartBuilder::on(&root)
            .margin(20)
            .x_label_area_size(50)
            .y_label_area_size(70)
            .build_cartesian_2d(x_min..x_max, 0.0..y_max)
            .map_err(render_err)?;

        chart
            .configure_mesh()
            .x_desc("Duration (ms)")
            .y_desc("Density")
            .axis_desc_style(("sans-serif", 16))
            .draw()
            .map_err(render_err)?;

        for s in &series {
            let color = s.color;
            chart
                .draw_series(LineSeries::new(
                    Self::step_outline(&edges, &s.density),
                    color.stroke_width(2),
                ))
                .map_err(render_err)?
                .label(s.name.as_str())
                .legend(move |(x, y)| {
                    PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2))
                });

            if !s.kde.is_empty() {
                chart
                    .draw_series(LineSeries::new(
                        s.kde.iter().copied(),
                        color.mix(0.7).stroke_width(1),
                    ))
                    .map_err(render_err)?;
            }
        }

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()
            .map_err(render_err)?;

        root.present().map_err(render_err)?;
        log::info!("Overlaid histogram saved to {}", output_path.display());
        Ok(())
    }
}

fn render_err(e: impl std::fmt::Display) -> ChartError {
    ChartError::Render(e.to_string())
}
