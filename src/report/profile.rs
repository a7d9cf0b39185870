//! Profile Reports
//! One HTML profile per dataset plus a side-by-side comparison of all of them.

use super::ReportError;
use crate::data::{LoadedDataset, ShardLayout};
use crate::stats::distribution::box_stats;
use crate::stats::{ComparisonStats, GroupStats, SIGNIFICANCE_THRESHOLD};
use std::fmt::{self, Write as _};
use std::fs;
use std::path::Path;

/// Default file name of the comparison report.
pub const COMPARE_REPORT_FILE: &str = "compare_report.html";

const STYLE: &str = r#"
        body { font-family: 'Segoe UI', Tahoma, Geneva, Verdana, sans-serif; margin: 20px; color: #333; }
        h1 { border-bottom: 3px solid #3498db; padding-bottom: 10px; }
        table { border-collapse: collapse; margin: 16px 0; }
        th, td { border: 1px solid #ccc; padding: 6px 12px; text-align: right; }
        th { background: #f2f2f2; }
        td.label, th.label { text-align: left; }
        td.significant { background: #ffc7ce; color: #9c0006; }
"#;

/// Default file name of a dataset's profile report.
pub fn report_file_name(dataset: &str) -> String {
    format!("{dataset}_report.html")
}

pub struct ProfileReport;

impl ProfileReport {
    /// HTML profile of one dataset. `values` are its non-null durations.
    pub fn render_dataset(
        dataset: &LoadedDataset,
        stats: &GroupStats,
        values: &[f64],
    ) -> Result<String, ReportError> {
        let title = format!("{} Performance Report", escape_html(&dataset.name));
        let mut body = format!("<h1>{title}</h1>\n");

        let source = describe_layout(&dataset.layout, &dataset.name);
        let overview = [
            ("Rows", dataset.row_count().to_string()),
            ("Missing durations", stats.null_count.to_string()),
            ("Shards", dataset.shard_rows.len().to_string()),
            ("Source", escape_html(&source)),
        ];
        label_table(&mut body, "Overview", overview)?;
        label_table(&mut body, "duration_ms", metric_rows(stats))?;

        if let Some(b) = box_stats(values) {
            let summary = [
                ("Lower whisker", fmt_num(b.whisker_low)),
                ("Q1", fmt_num(b.q1)),
                ("Q3", fmt_num(b.q3)),
                ("Upper whisker", fmt_num(b.whisker_high)),
                ("Outliers", b.outliers.len().to_string()),
            ];
            label_table(&mut body, "Box plot", summary)?;
        }

        shard_table(&mut body, &dataset.shard_rows)?;
        Ok(page(&title, &body))
    }

    /// HTML comparison of every dataset against the baseline.
    pub fn render_comparison(stats: &ComparisonStats) -> Result<String, ReportError> {
        let title = "Performance Comparison Report";
        let mut body = format!(
            "<h1>{title}</h1>\n<p>Baseline: <b>{}</b>. P-values from Welch's t-test; p &le; {SIGNIFICANCE_THRESHOLD} is highlighted.</p>\n",
            escape_html(&stats.control_group)
        );
        comparison_table(&mut body, stats)?;
        Ok(page(title, &body))
    }

    pub fn write_dataset(
        dataset: &LoadedDataset,
        stats: &GroupStats,
        values: &[f64],
        output_path: &Path,
    ) -> Result<(), ReportError> {
        fs::write(output_path, Self::render_dataset(dataset, stats, values)?)?;
        log::info!(
            "Report for {} saved to {}",
            dataset.name,
            output_path.display()
        );
        Ok(())
    }

    pub fn write_comparison(stats: &ComparisonStats, output_path: &Path) -> Result<(), ReportError> {
        fs::write(output_path, Self::render_comparison(stats)?)?;
        log::info!("Comparison report saved to {}", output_path.display());
        Ok(())
    }
}

fn metric_rows(stats: &GroupStats) -> Vec<(&'static str, String)> {
    vec![
        ("Count", stats.count.to_string()),
        ("Mean", fmt_num(stats.mean)),
        ("Std", fmt_num(stats.std)),
        ("Variance", fmt_num(stats.variance)),
        ("CV", fmt_num(stats.cv)),
        ("Min", fmt_num(stats.min)),
        ("5%", fmt_num(stats.p05)),
        ("25%", fmt_num(stats.p25)),
        ("Median", fmt_num(stats.median)),
        ("75%", fmt_num(stats.p75)),
        ("95%", fmt_num(stats.p95)),
        ("99%", fmt_num(stats.p99)),
        ("Max", fmt_num(stats.max)),
    ]
}

/// Section heading followed by a two-column label/value table.
fn label_table(
    out: &mut String,
    heading: &str,
    rows: impl IntoIterator<Item = (&'static str, String)>,
) -> fmt::Result {
    writeln!(out, "<h2>{heading}</h2>\n<table>")?;
    for (label, value) in rows {
        writeln!(out, "<tr><td class=\"label\">{label}</td><td>{value}</td></tr>")?;
    }
    writeln!(out, "</table>")
}

fn shard_table(out: &mut String, shard_rows: &[usize]) -> fmt::Result {
    writeln!(
        out,
        "<h2>Shards</h2>\n<table>\n<tr><th class=\"label\">file_index</th><th>rows</th></tr>"
    )?;
    for (index, rows) in shard_rows.iter().enumerate() {
        writeln!(out, "<tr><td class=\"label\">{index}</td><td>{rows}</td></tr>")?;
    }
    writeln!(out, "</table>")
}

/// One column per dataset, baseline first; significant p-values highlighted.
fn comparison_table(out: &mut String, stats: &ComparisonStats) -> fmt::Result {
    let groups = stats.get_ordered_groups();

    write!(out, "<table>\n<tr><th class=\"label\">metric</th>")?;
    for group in &groups {
        write!(out, "<th>{}</th>", escape_html(group))?;
    }
    writeln!(out, "</tr>")?;

    let columns: Vec<Vec<(&'static str, String)>> = groups
        .iter()
        .filter_map(|g| stats.get(g))
        .map(|gs| {
            let mut rows = metric_rows(gs);
            rows.push(("Std diff from baseline", fmt_opt(gs.std_diff_from_control)));
            rows
        })
        .collect();

    if let Some(first) = columns.first() {
        for (row, (label, _)) in first.iter().enumerate() {
            write!(out, "<tr><td class=\"label\">{label}</td>")?;
            for column in &columns {
                write!(out, "<td>{}</td>", column[row].1)?;
            }
            writeln!(out, "</tr>")?;
        }
    }

    write!(out, "<tr><td class=\"label\">P-value</td>")?;
    for group in &groups {
        match stats.get(group) {
            Some(gs) if gs.is_significant => {
                write!(out, "<td class=\"significant\">{}</td>", fmt_opt(gs.p_value))?
            }
            Some(gs) => write!(out, "<td>{}</td>", fmt_opt(gs.p_value))?,
            None => write!(out, "<td></td>")?,
        }
    }
    writeln!(out, "</tr>\n</table>")
}

fn describe_layout(layout: &ShardLayout, name: &str) -> String {
    match layout {
        ShardLayout::Flat { dir } => dir.join(format!("{name}.csv")).display().to_string(),
        ShardLayout::Sharded { dir } => dir.join(format!("{name}_<n>.csv")).display().to_string(),
    }
}

fn fmt_num(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else {
        format!("{value:.4}")
    }
}

fn fmt_opt(value: Option<f64>) -> String {
    value.map(fmt_num).unwrap_or_else(|| "-".to_string())
}

fn page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{title}</title>\n<style>{STYLE}</style>\n</head>\n<body>\n{body}</body>\n</html>\n"
    )
}

pub(crate) fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
