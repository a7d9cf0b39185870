//! Interactive Dashboard
//! A standalone HTML page with four linked plotly.js panels:
//!
//! ```text
//! ┌──────────────────────┬──────────────────────┐
//! │ Histogram (density)  │ Box plot per dataset │
//! ├──────────────────────┼──────────────────────┤
//! │ ECDF                 │ Rolling-average trend│
//! └──────────────────────┴──────────────────────┘
//! ```
//!
//! All traces of a dataset share a legend group, so toggling one legend entry
//! hides that dataset in every panel.

use super::{get_group_color, to_hex, ChartError};
use crate::data::{rolling_column_name, DATASET_COL, DURATION_COL, SEQUENCE_COL};
use crate::stats::distribution::ecdf;
use polars::prelude::*;
use serde_json::{json, Value};
use std::fs;
use std::path::Path;

/// Default output file name.
pub const DASHBOARD_FILE: &str = "full_performance_dashboard.html";

const PLOTLY_CDN: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";
const TITLE: &str = "Performance Analysis Dashboard";

/// Per-dataset series for the dashboard.
#[derive(Debug, Clone, Default)]
pub struct DatasetSeries {
    pub name: String,
    pub color: String,
    /// Non-null durations in load order.
    pub durations: Vec<f64>,
    pub sequence_ids: Vec<u64>,
    pub rolling: Vec<Option<f64>>,
    /// Raw duration at each sequence id, shown on hover.
    pub raw: Vec<Option<f64>>,
}

/// Everything the dashboard draws.
#[derive(Debug, Clone)]
pub struct DashboardData {
    pub datasets: Vec<DatasetSeries>,
    pub window: usize,
}

impl DashboardData {
    /// Split the combined table and the time-series table by dataset.
    ///
    /// `names` fixes the order and therefore the colors; datasets without rows
    /// are dropped.
    pub fn from_frames(
        names: &[String],
        combined: &DataFrame,
        timeseries: &DataFrame,
        window: usize,
    ) -> Result<Self, ChartError> {
        let rolling_col = rolling_column_name(window);
        let mut datasets = Vec::new();

        for (i, name) in names.iter().enumerate() {
            let group = filter_dataset(combined, name)?;
            if group.height() == 0 {
                continue;
            }
            let durations = f64_values(&group, DURATION_COL)?
                .into_iter()
                .flatten()
                .collect();

            let ts = filter_dataset(timeseries, name)?;
            let sequence_ids = ts
                .column(SEQUENCE_COL)?
                .cast(&DataType::UInt64)?
                .u64()?
                .into_iter()
                .map(|v| v.unwrap_or_default())
                .collect();

            datasets.push(DatasetSeries {
                name: name.clone(),
                color: to_hex(get_group_color(i)),
                durations,
                sequence_ids,
                rolling: f64_values(&ts, &rolling_col)?,
                raw: f64_values(&ts, DURATION_COL)?,
            });
        }

        if datasets.is_empty() {
            return Err(ChartError::NoData);
        }
        Ok(Self { datasets, window })
    }
}

fn filter_dataset(df: &DataFrame, name: &str) -> PolarsResult<DataFrame> {
    df.clone()
        .lazy()
        .filter(col(DATASET_COL).eq(lit(name)))
        .collect()
}

fn f64_values(df: &DataFrame, column: &str) -> PolarsResult<Vec<Option<f64>>> {
    let values = df.column(column)?.cast(&DataType::Float64)?;
    Ok(values.f64()?.into_iter().collect())
}

pub struct DashboardRenderer;

impl DashboardRenderer {
    /// Plotly traces for all four panels.
    pub fn build_traces(data: &DashboardData) -> Vec<Value> {
        let mut traces = Vec::with_capacity(data.datasets.len() * 4);

        for ds in &data.datasets {
            traces.push(json!({
                "type": "histogram",
                "name": ds.name,
                "legendgroup": ds.name,
                "showlegend": true,
                "x": ds.durations,
                "histnorm": "probability density",
                "opacity": 0.6,
                "marker": { "color": ds.color },
                "xaxis": "x",
                "yaxis": "y",
            }));

            traces.push(json!({
                "type": "box",
                "name": ds.name,
                "legendgroup": ds.name,
                "showlegend": false,
                "y": ds.durations,
                "boxpoints": "outliers",
                "marker": { "color": ds.color },
                "xaxis": "x2",
                "yaxis": "y2",
            }));

            let (x, y) = ecdf(&ds.durations);
            traces.push(json!({
                "type": "scatter",
                "mode": "lines",
                "name": ds.name,
                "legendgroup": ds.name,
                "showlegend": false,
                "x": x,
                "y": y,
                "line": { "shape": "hv", "color": ds.color },
                "xaxis": "x3",
                "yaxis": "y3",
            }));

            traces.push(json!({
                "type": "scatter",
                "mode": "lines",
                "name": ds.name,
                "legendgroup": ds.name,
                "showlegend": false,
                "x": ds.sequence_ids,
                "y": ds.rolling,
                "customdata": ds.raw,
                "hovertemplate": "#%{x}<br>rolling avg: %{y:.3f} ms<br>duration: %{customdata} ms",
                "line": { "color": ds.color },
                "xaxis": "x4",
                "yaxis": "y4",
            }));
        }

        traces
    }

    /// 2x2 layout; `focus` zooms every duration axis to `[lo, hi]` ms.
    pub fn build_layout(data: &DashboardData, focus: Option<[f64; 2]>) -> Value {
        let title = match focus {
            Some([lo, hi]) => format!("{TITLE} (focused on {lo}-{hi} ms)"),
            None => TITLE.to_string(),
        };
        let range = focus.map(|[lo, hi]| vec![lo, hi]);

        json!({
            "title": { "text": title, "font": { "size": 24 } },
            "height": 900,
            "width": 1400,
            "barmode": "overlay",
            "legend": { "title": { "text": "Implementation" }, "tracegroupgap": 20 },
            "xaxis": axis([0.0, 0.465], "y", "Duration (ms)", range.clone()),
            "yaxis": axis([0.55, 1.0], "x", "Density", None),
            "xaxis2": axis([0.535, 1.0], "y2", "Implementation", None),
            "yaxis2": axis([0.55, 1.0], "x2", "Duration (ms)", range.clone()),
            "xaxis3": axis([0.0, 0.465], "y3", "Duration (ms)", range),
            "yaxis3": axis([0.0, 0.45], "x3", "Cumulative fraction", None),
            "xaxis4": axis([0.535, 1.0], "y4", "Request sequence ID", None),
            "yaxis4": axis(
                [0.0, 0.45],
                "x4",
                &format!("Latency ({}-sample rolling mean)", data.window),
                None,
            ),
            "annotations": [
                panel_title(0.2325, 1.0, "Distribution (Histogram)"),
                panel_title(0.7675, 1.0, "Comparison (Box Plot)"),
                panel_title(0.2325, 0.45, "Cumulative Distribution (ECDF)"),
                panel_title(0.7675, 0.45, "Trend (Time Series)"),
            ],
        })
    }

    /// Complete standalone HTML document.
    pub fn render_html(data: &DashboardData, focus: Option<[f64; 2]>) -> Result<String, ChartError> {
        let traces = script_safe(serde_json::to_string(&Self::build_traces(data))?);
        let layout = script_safe(serde_json::to_string(&Self::build_layout(data, focus))?);

        Ok(format!(
            r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>{TITLE}</title>
    <script src="{PLOTLY_CDN}"></script>
    <style>
        body {{ font-family: 'Segoe UI', Tahoma, Geneva, Verdana, sans-serif; margin: 20px; }}
    </style>
</head>
<body>
    <div id="dashboard"></div>
    <script>
        const traces = {traces};
        const layout = {layout};
        Plotly.newPlot("dashboard", traces, layout, {{ responsive: true }});
    </script>
</body>
</html>
"#
        ))
    }

    pub fn write(
        data: &DashboardData,
        focus: Option<[f64; 2]>,
        output_path: &Path,
    ) -> Result<(), ChartError> {
        fs::write(output_path, Self::render_html(data, focus)?)?;
        log::info!("Interactive dashboard saved to {}", output_path.display());
        Ok(())
    }
}

fn axis(domain: [f64; 2], anchor: &str, title: &str, range: Option<Vec<f64>>) -> Value {
    let mut axis = json!({
        "domain": domain,
        "anchor": anchor,
        "title": { "text": title },
    });
    if let Some(range) = range {
        axis["range"] = json!(range);
    }
    axis
}

fn panel_title(x: f64, y: f64, text: &str) -> Value {
    json!({
        "text": format!("<b>{text}</b>"),
        "x": x,
        "y": y,
        "xref": "paper",
        "yref": "paper",
        "xanchor": "center",
        "yanchor": "bottom",
        "showarrow": false,
    })
}

/// JSON embedded in a `<script>` block must not close it early.
fn script_safe(json: String) -> String {
    json.replace("</", "<\\/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::DataProcessor;

    fn frames() -> (Vec<String>, DataFrame, DataFrame) {
        let combined = df!(
            DURATION_COL => [3.0, 1.0, 2.0, 10.0, 30.0],
            DATASET_COL => ["async_ws", "async_ws", "async_ws", "busy_poll_ws", "busy_poll_ws"]
        )
        .unwrap();
        let timeseries = DataProcessor::timeseries(&combined, 2, 1).unwrap();
        let names = vec![
            "async_ws".to_string(),
            "poll_ws".to_string(),
            "busy_poll_ws".to_string(),
        ];
        (names, combined, timeseries)
    }

    #[test]
    fn splits_frames_by_dataset() {
        let (names, combined, timeseries) = frames();
        let data = DashboardData::from_frames(&names, &combined, &timeseries, 2).unwrap();

        assert_eq!(data.datasets.len(), 2);
        let async_ws = &data.datasets[0];
        assert_eq!(async_ws.durations, vec![3.0, 1.0, 2.0]);
        assert_eq!(async_ws.sequence_ids, vec![0, 1, 2]);
        assert_eq!(async_ws.rolling, vec![Some(3.0), Some(2.0), Some(1.5)]);
        assert_eq!(async_ws.color, "#3498db");

        let busy = &data.datasets[1];
        assert_eq!(busy.name, "busy_poll_ws");
        assert_eq!(busy.rolling, vec![Some(10.0), Some(20.0)]);
        assert_eq!(busy.color, to_hex(get_group_color(2)));
    }

    #[test]
    fn one_legend_entry_per_dataset() {
        let (names, combined, timeseries) = frames();
        let data = DashboardData::from_frames(&names, &combined, &timeseries, 2).unwrap();
        let traces = DashboardRenderer::build_traces(&data);

        assert_eq!(traces.len(), 8);
        let shown: Vec<&str> = traces
            .iter()
            .filter(|t| t["showlegend"] == json!(true))
            .map(|t| t["name"].as_str().unwrap())
            .collect();
        assert_eq!(shown, vec!["async_ws", "busy_poll_ws"]);
        assert!(traces
            .iter()
            .all(|t| t["legendgroup"] == t["name"]));

        let ecdf_trace = &traces[2];
        assert_eq!(ecdf_trace["xaxis"], "x3");
        assert_eq!(ecdf_trace["x"], json!([1.0, 2.0, 3.0]));
    }

    #[test]
    fn focus_range_applies_to_duration_axes() {
        let (names, combined, timeseries) = frames();
        let data = DashboardData::from_frames(&names, &combined, &timeseries, 2).unwrap();

        let layout = DashboardRenderer::build_layout(&data, Some([0.0, 20.0]));
        assert_eq!(layout["xaxis"]["range"], json!([0.0, 20.0]));
        assert_eq!(layout["yaxis2"]["range"], json!([0.0, 20.0]));
        assert_eq!(layout["xaxis3"]["range"], json!([0.0, 20.0]));
        assert!(layout["xaxis4"].get("range").is_none());
        assert!(layout["title"]["text"]
            .as_str()
            .unwrap()
            .ends_with("(focused on 0-20 ms)"));

        let layout = DashboardRenderer::build_layout(&data, None);
        assert!(layout["xaxis"].get("range").is_none());
        assert_eq!(layout["title"]["text"], TITLE);
    }

    #[test]
    fn html_embeds_traces_safely() {
        let (_, combined, _) = frames();
        let renamed = DataProcessor::tag_dataset(
            &combined.drop(DATASET_COL).unwrap(),
            "</script>",
        )
        .unwrap();
        let timeseries = DataProcessor::timeseries(&renamed, 100, 1).unwrap();
        let names = vec!["</script>".to_string()];
        let data = DashboardData::from_frames(&names, &renamed, &timeseries, 100).unwrap();

        let html = DashboardRenderer::render_html(&data, None).unwrap();
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains(PLOTLY_CDN));
        assert!(html.contains("<\\/script>"));
        assert_eq!(html.matches("</script>").count(), 2);
    }

    #[test]
    fn no_rows_is_an_error() {
        let (_, combined, timeseries) = frames();
        let names = vec!["poll_ws".to_string()];
        assert!(matches!(
            DashboardData::from_frames(&names, &combined, &timeseries, 2),
            Err(ChartError::NoData)
        ));
    }
}
