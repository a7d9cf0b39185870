//! Statistics Calculator Module
//! Descriptive statistics per dataset and Welch t-tests against the baseline.

use crate::data::{DATASET_COL, DURATION_COL};
use polars::prelude::*;
use rayon::prelude::*;
use statrs::distribution::{ContinuousCDF, StudentsT};

/// Significance threshold for t-test
pub const SIGNIFICANCE_THRESHOLD: f64 = 0.05;

/// Statistics for a single dataset.
#[derive(Debug, Clone)]
pub struct GroupStats {
    pub group_name: String,
    pub count: usize,
    pub null_count: usize,
    pub mean: f64,
    pub median: f64,
    pub std: f64,
    pub variance: f64,
    pub min: f64,
    pub max: f64,
    pub p05: f64,
    pub p25: f64,
    pub p75: f64,
    pub p95: f64,
    pub p99: f64,
    /// Coefficient of variation (std / mean).
    pub cv: f64,
    pub std_diff_from_control: Option<f64>,
    pub p_value: Option<f64>,
    pub is_significant: bool,
}

impl Default for GroupStats {
    fn default() -> Self {
        Self {
            group_name: String::new(),
            count: 0,
            null_count: 0,
            mean: f64::NAN,
            median: f64::NAN,
            std: f64::NAN,
            variance: f64::NAN,
            min: f64::NAN,
            max: f64::NAN,
            p05: f64::NAN,
            p25: f64::NAN,
            p75: f64::NAN,
            p95: f64::NAN,
            p99: f64::NAN,
            cv: f64::NAN,
            std_diff_from_control: None,
            p_value: None,
            is_significant: false,
        }
    }
}

/// Statistics for every dataset, compared against the control (baseline).
#[derive(Debug, Clone)]
pub struct ComparisonStats {
    pub control_group: String,
    /// One entry per dataset, control first, then in collection order.
    pub group_stats: Vec<GroupStats>,
}

impl ComparisonStats {
    pub fn get(&self, group: &str) -> Option<&GroupStats> {
        self.group_stats.iter().find(|gs| gs.group_name == group)
    }

    /// Get groups ordered with control first.
    pub fn get_ordered_groups(&self) -> Vec<String> {
        self.group_stats
            .iter()
            .map(|gs| gs.group_name.clone())
            .collect()
    }

    /// Check if any group has significant p-value.
    pub fn has_significant_results(&self) -> bool {
        self.group_stats
            .iter()
            .any(|gs| gs.group_name != self.control_group && gs.is_significant)
    }
}

/// Handles statistical calculations with multi-threading support.
pub struct StatsCalculator;

impl StatsCalculator {
    /// Compute descriptive statistics for an array of values.
    pub fn compute_descriptive_stats(values: &[f64]) -> GroupStats {
        let n = values.len();
        if n == 0 {
            return GroupStats::default();
        }

        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let mean = values.iter().sum::<f64>() / n as f64;
        let median = if n % 2 == 0 {
            (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
        } else {
            sorted[n / 2]
        };

        let variance = if n > 1 {
            values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1) as f64
        } else {
            0.0
        };
        let std = variance.sqrt();
        let cv = if mean != 0.0 { std / mean } else { f64::NAN };

        GroupStats {
            count: n,
            mean,
            median,
            std,
            variance,
            min: sorted[0],
            max: sorted[n - 1],
            p05: Self::percentile(&sorted, 5.0),
            p25: Self::percentile(&sorted, 25.0),
            p75: Self::percentile(&sorted, 75.0),
            p95: Self::percentile(&sorted, 95.0),
            p99: Self::percentile(&sorted, 99.0),
            cv,
            ..GroupStats::default()
        }
    }

    /// Calculate percentile using linear interpolation (NumPy compatible).
    pub fn percentile(sorted_values: &[f64], p: f64) -> f64 {
        let n = sorted_values.len();
        if n == 0 {
            return f64::NAN;
        }
        if n == 1 {
            return sorted_values[0];
        }

        let rank = (p / 100.0) * (n - 1) as f64;
        let lower = rank.floor() as usize;
        let upper = (rank.ceil() as usize).min(n - 1);
        let frac = rank - lower as f64;

        if lower == upper {
            sorted_values[lower]
        } else {
            sorted_values[lower] * (1.0 - frac) + sorted_values[upper] * frac
        }
    }

    /// Perform Welch's t-test (independent samples, unequal variance).
    pub fn perform_ttest(group_values: &[f64], control_values: &[f64]) -> (f64, bool) {
        let n1 = group_values.len() as f64;
        let n2 = control_values.len() as f64;

        if n1 < 2.0 || n2 < 2.0 {
            return (f64::NAN, false);
        }

        let mean1 = group_values.iter().sum::<f64>() / n1;
        let mean2 = control_values.iter().sum::<f64>() / n2;

        let var1 = group_values
            .iter()
            .map(|x| (x - mean1).powi(2))
            .sum::<f64>()
            / (n1 - 1.0);
        let var2 = control_values
            .iter()
            .map(|x| (x - mean2).powi(2))
            .sum::<f64>()
            / (n2 - 1.0);

        let se = (var1 / n1 + var2 / n2).sqrt();
        if se == 0.0 {
            return (1.0, false); // No variance difference
        }

        let t = (mean1 - mean2) / se;

        // Welch-Satterthwaite degrees of freedom
        let df_num = (var1 / n1 + var2 / n2).powi(2);
        let df_denom = (var1 / n1).powi(2) / (n1 - 1.0) + (var2 / n2).powi(2) / (n2 - 1.0);
        let df = df_num / df_denom;

        // Two-tailed p-value using t-distribution
        if let Ok(dist) = StudentsT::new(0.0, 1.0, df) {
            let p_value = 2.0 * (1.0 - dist.cdf(t.abs()));
            let is_significant = p_value <= SIGNIFICANCE_THRESHOLD;
            (p_value, is_significant)
        } else {
            (f64::NAN, false)
        }
    }

    /// Get the non-null durations of one dataset from the combined table.
    pub fn get_values_for_group(df: &DataFrame, group: &str) -> Vec<f64> {
        Self::filter_group(df, group)
            .and_then(|df| df.column(DURATION_COL).ok().cloned())
            .map(|col| {
                col.f64()
                    .ok()
                    .map(|ca| ca.into_iter().flatten().filter(|v| !v.is_nan()).collect())
                    .unwrap_or_default()
            })
            .unwrap_or_default()
    }

    /// Number of missing durations in one dataset.
    pub fn get_null_count_for_group(df: &DataFrame, group: &str) -> usize {
        Self::filter_group(df, group)
            .and_then(|df| df.column(DURATION_COL).ok().map(|col| col.null_count()))
            .unwrap_or(0)
    }

    fn filter_group(df: &DataFrame, group: &str) -> Option<DataFrame> {
        df.clone()
            .lazy()
            .filter(col(DATASET_COL).eq(lit(group)))
            .select([col(DURATION_COL).cast(DataType::Float64)])
            .collect()
            .ok()
    }

    fn compute_group(df: &DataFrame, group: &str) -> (GroupStats, Vec<f64>) {
        let values = Self::get_values_for_group(df, group);
        let mut gs = Self::compute_descriptive_stats(&values);
        gs.group_name = group.to_string();
        gs.null_count = Self::get_null_count_for_group(df, group);
        (gs, values)
    }

    /// Compute statistics for every dataset, in parallel, and compare each
    /// one against `control_group`.
    pub fn compute_all_stats_parallel(
        df: &DataFrame,
        groups: &[String],
        control_group: &str,
    ) -> ComparisonStats {
        let (control_stats, control_values) = Self::compute_group(df, control_group);
        let control_std = control_stats.std;
        let control_mean = control_stats.mean;

        let others: Vec<GroupStats> = groups
            .par_iter()
            .filter(|group| group.as_str() != control_group)
            .map(|group| {
                let (mut gs, values) = Self::compute_group(df, group);

                // Calculate standardized mean difference
                if control_std > 0.0 && !control_mean.is_nan() {
                    gs.std_diff_from_control = Some((gs.mean - control_mean) / control_std);
                }

                if !control_values.is_empty() {
                    let (p_value, is_significant) = Self::perform_ttest(&values, &control_values);
                    gs.p_value = Some(p_value);
                    gs.is_significant = is_significant;
                }

                gs
            })
            .collect();

        let mut group_stats = Vec::with_capacity(others.len() + 1);
        group_stats.push(control_stats);
        group_stats.extend(others);

        ComparisonStats {
            control_group: control_group.to_string(),
            group_stats,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn combined() -> DataFrame {
        df!(
            DURATION_COL => [Some(1.0), Some(2.0), Some(3.0), Some(4.0), None, Some(10.0), Some(12.0), Some(14.0)],
            DATASET_COL => ["async_ws", "async_ws", "async_ws", "async_ws", "poll_ws", "poll_ws", "poll_ws", "poll_ws"]
        )
        .unwrap()
    }

    #[test]
    fn descriptive_stats() {
        let gs = StatsCalculator::compute_descriptive_stats(&[4.0, 1.0, 3.0, 2.0]);
        assert_eq!(gs.count, 4);
        assert_eq!(gs.mean, 2.5);
        assert_eq!(gs.median, 2.5);
        assert_eq!(gs.min, 1.0);
        assert_eq!(gs.max, 4.0);
        assert!((gs.variance - 5.0 / 3.0).abs() < 1e-12);
        assert!((gs.p25 - 1.75).abs() < 1e-12);
        assert!((gs.p75 - 3.25).abs() < 1e-12);
    }

    #[test]
    fn empty_values_give_nan() {
        let gs = StatsCalculator::compute_descriptive_stats(&[]);
        assert_eq!(gs.count, 0);
        assert!(gs.mean.is_nan());
    }

    #[test]
    fn percentile_interpolates() {
        let sorted = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(StatsCalculator::percentile(&sorted, 50.0), 3.0);
        assert_eq!(StatsCalculator::percentile(&sorted, 100.0), 5.0);
        assert!((StatsCalculator::percentile(&sorted, 95.0) - 4.8).abs() < 1e-12);
    }

    #[test]
    fn ttest_detects_shift() {
        let control: Vec<f64> = (0..50).map(|i| (i % 5) as f64).collect();
        let shifted: Vec<f64> = control.iter().map(|v| v + 10.0).collect();
        let (p, significant) = StatsCalculator::perform_ttest(&shifted, &control);
        assert!(p < 1e-6);
        assert!(significant);

        let (p, significant) = StatsCalculator::perform_ttest(&control, &control);
        assert!((p - 1.0).abs() < 1e-9);
        assert!(!significant);
    }

    #[test]
    fn values_are_filtered_by_dataset() {
        let df = combined();
        assert_eq!(
            StatsCalculator::get_values_for_group(&df, "poll_ws"),
            vec![10.0, 12.0, 14.0]
        );
        assert_eq!(StatsCalculator::get_null_count_for_group(&df, "poll_ws"), 1);
        assert!(StatsCalculator::get_values_for_group(&df, "busy_poll_ws").is_empty());
    }

    #[test]
    fn comparison_puts_control_first() {
        let df = combined();
        let groups = vec!["async_ws".to_string(), "poll_ws".to_string()];
        let stats = StatsCalculator::compute_all_stats_parallel(&df, &groups, "async_ws");

        assert_eq!(stats.get_ordered_groups(), groups);
        let control = stats.get("async_ws").unwrap();
        assert!(control.p_value.is_none());

        let poll = stats.get("poll_ws").unwrap();
        assert_eq!(poll.count, 3);
        assert_eq!(poll.null_count, 1);
        assert!(poll.std_diff_from_control.unwrap() > 0.0);
        assert!(poll.p_value.is_some());
        assert!(stats.has_significant_results());
    }
}
