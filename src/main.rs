//! WebSocket Latency Report - offline analysis of benchmark CSV shards
//!
//! Loads the per-variant latency shards, profiles each dataset, compares them
//! against the baseline and writes HTML reports, an SVG histogram and an
//! interactive dashboard.

mod charts;
mod config;
mod data;
mod report;
mod stats;
#[cfg(test)]
mod test_util;

use anyhow::{bail, Context};
use charts::{DashboardData, DashboardRenderer, HistogramRenderer, DASHBOARD_FILE, HISTOGRAM_FILE};
use config::{AnalysisConfig, CONFIG_FILE};
use data::{DataLoader, DataProcessor};
use report::{report_file_name, ProfileReport, COMPARE_REPORT_FILE};
use stats::StatsCalculator;
use std::fs;
use std::path::Path;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run() {
        log::error!("{e:#}");
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let config = AnalysisConfig::load_or_default(Path::new(CONFIG_FILE))
        .context("Failed to load settings")?;
    fs::create_dir_all(&config.output_dir).with_context(|| {
        format!("Failed to create output directory {}", config.output_dir.display())
    })?;

    // Load
    let loader = DataLoader::new(config.layouts.clone());
    let collection = loader.load_all(&config.datasets)?;
    let Some(baseline) = collection.baseline().map(|d| d.name.clone()) else {
        bail!("No data files found for any of {:?}", config.datasets);
    };
    let names = collection.names();
    log::info!("Loaded {} dataset(s), baseline is {baseline}", names.len());

    let combined = DataProcessor::combine(&collection)?;

    // Profile and compare
    let comparison = StatsCalculator::compute_all_stats_parallel(&combined, &names, &baseline);
    let groups: Vec<(String, Vec<f64>)> = names
        .iter()
        .map(|name| (name.clone(), StatsCalculator::get_values_for_group(&combined, name)))
        .collect();

    for (dataset, (_, values)) in collection.iter().zip(&groups) {
        if let Some(stats) = comparison.get(&dataset.name) {
            let path = config.output_path(&report_file_name(&dataset.name));
            ProfileReport::write_dataset(dataset, stats, values, &path)?;
        }
    }
    ProfileReport::write_comparison(&comparison, &config.output_path(COMPARE_REPORT_FILE))?;
    if comparison.has_significant_results() {
        log::info!("At least one dataset differs significantly from {baseline}");
    }

    // Charts
    match HistogramRenderer::render_svg(
        &groups,
        config.histogram_bins,
        &config.output_path(HISTOGRAM_FILE),
    ) {
        Ok(()) => {}
        Err(charts::ChartError::NoData) => log::warn!("No durations to plot, histogram skipped"),
        Err(e) => return Err(e.into()),
    }

    let timeseries =
        DataProcessor::timeseries(&combined, config.rolling_window, config.rolling_min_periods)?;
    match DashboardData::from_frames(&names, &combined, &timeseries, config.rolling_window) {
        Ok(data) => DashboardRenderer::write(
            &data,
            config.dashboard_focus_ms,
            &config.output_path(DASHBOARD_FILE),
        )?,
        Err(charts::ChartError::NoData) => log::warn!("No rows to chart, dashboard skipped"),
        Err(e) => return Err(e.into()),
    }

    log::info!("Analysis complete, outputs in {}", config.output_dir.display());
    Ok(())
}
