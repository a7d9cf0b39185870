//! Distribution summaries used by the charts: density histograms, KDE,
//! ECDF and box-plot statistics.

use super::StatsCalculator;

/// `bins + 1` evenly spaced edges covering `[min, max]` of all values.
///
/// A degenerate range is widened by 0.5 on each side.
pub fn histogram_edges<'a>(values: impl IntoIterator<Item = &'a f64>, bins: usize) -> Vec<f64> {
    let (lo, hi) = values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    if bins == 0 || lo > hi {
        return Vec::new();
    }

    let (lo, hi) = if lo == hi { (lo - 0.5, hi + 0.5) } else { (lo, hi) };
    let width = (hi - lo) / bins as f64;
    (0..=bins).map(|i| lo + width * i as f64).collect()
}

/// Density of `values` in each bin: `count / (n * bin_width)`.
///
/// Bins are half-open except the last, which includes the upper edge.
/// Values outside the edges are ignored.
pub fn histogram_density(values: &[f64], edges: &[f64]) -> Vec<f64> {
    if edges.len() < 2 {
        return Vec::new();
    }
    let bins = edges.len() - 1;
    let lo = edges[0];
    let hi = edges[bins];
    let width = (hi - lo) / bins as f64;

    let mut counts = vec![0usize; bins];
    let mut n = 0usize;
    for &v in values {
        if !v.is_finite() || v < lo || v > hi {
            continue;
        }
        let idx = (((v - lo) / width) as usize).min(bins - 1);
        counts[idx] += 1;
        n += 1;
    }

    if n == 0 {
        return vec![0.0; bins];
    }
    counts
        .into_iter()
        .map(|c| c as f64 / (n as f64 * width))
        .collect()
}

/// Gaussian kernel density estimate evaluated at `grid`, using Scott's rule
/// for the bandwidth.
///
/// Empty when there are fewer than two values or no spread.
pub fn gaussian_kde(values: &[f64], grid: &[f64]) -> Vec<f64> {
    let stats = StatsCalculator::compute_descriptive_stats(values);
    if stats.count < 2 || !(stats.std > 0.0) {
        return Vec::new();
    }

    let n = stats.count as f64;
    let bandwidth = stats.std * n.powf(-0.2);
    let norm = 1.0 / (n * bandwidth * (2.0 * std::f64::consts::PI).sqrt());

    grid.iter()
        .map(|&x| {
            values
                .iter()
                .map(|&v| {
                    let z = (x - v) / bandwidth;
                    (-0.5 * z * z).exp()
                })
                .sum::<f64>()
                * norm
        })
        .collect()
}

/// `points` evenly spaced values from `lo` to `hi` inclusive.
pub fn linspace(lo: f64, hi: f64, points: usize) -> Vec<f64> {
    match points {
        0 => Vec::new(),
        1 => vec![lo],
        _ => {
            let step = (hi - lo) / (points - 1) as f64;
            (0..points).map(|i| lo + step * i as f64).collect()
        }
    }
}

/// Empirical CDF: sorted values paired with the fraction of samples `<=`
/// each position, `(i + 1) / n`.
pub fn ecdf(values: &[f64]) -> (Vec<f64>, Vec<f64>) {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let n = sorted.len() as f64;
    let fractions = (1..=sorted.len()).map(|i| i as f64 / n).collect();
    (sorted, fractions)
}

/// Tukey box-plot summary.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxStats {
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub whisker_low: f64,
    pub whisker_high: f64,
    pub outliers: Vec<f64>,
}

/// Quartiles, whiskers at the most extreme values within 1.5 IQR of the box,
/// and every value beyond them.
pub fn box_stats(values: &[f64]) -> Option<BoxStats> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let q1 = StatsCalculator::percentile(&sorted, 25.0);
    let median = StatsCalculator::percentile(&sorted, 50.0);
    let q3 = StatsCalculator::percentile(&sorted, 75.0);
    let iqr = q3 - q1;
    let low_fence = q1 - 1.5 * iqr;
    let high_fence = q3 + 1.5 * iqr;

    let whisker_low = sorted
        .iter()
        .copied()
        .find(|&v| v >= low_fence)
        .unwrap_or(q1);
    let whisker_high = sorted
        .iter()
        .rev()
        .copied()
        .find(|&v| v <= high_fence)
        .unwrap_or(q3);
    let outliers = sorted
        .iter()
        .copied()
        .filter(|&v| v < low_fence || v > high_fence)
        .collect();

    Some(BoxStats {
        q1,
        median,
        q3,
        whisker_low,
        whisker_high,
        outliers,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edges_span_all_values() {
        let values = [2.0, 4.0, 12.0];
        let edges = histogram_edges(&values, 5);
        assert_eq!(edges, vec![2.0, 4.0, 6.0, 8.0, 10.0, 12.0]);

        assert_eq!(histogram_edges(&[3.0], 2), vec![2.5, 3.0, 3.5]);
        assert!(histogram_edges(&Vec::<f64>::new(), 10).is_empty());
    }

    #[test]
    fn density_integrates_to_one() {
        let values: Vec<f64> = (0..100).map(|i| (i % 17) as f64 * 0.7).collect();
        let edges = histogram_edges(&values, 10);
        let density = histogram_density(&values, &edges);
        let width = edges[1] - edges[0];
        let area: f64 = density.iter().map(|d| d * width).sum();
        assert!((area - 1.0).abs() < 1e-9);
    }

    #[test]
    fn density_is_normalized_per_dataset() {
        let small = [1.0, 1.0];
        let large = [1.0; 200];
        let edges = histogram_edges(small.iter().chain(large.iter()), 4);
        assert_eq!(
            histogram_density(&small, &edges),
            histogram_density(&large, &edges)
        );
    }

    #[test]
    fn last_bin_includes_upper_edge() {
        let edges = [0.0, 1.0, 2.0];
        assert_eq!(histogram_density(&[2.0, 0.0], &edges), vec![0.5, 0.5]);
    }

    #[test]
    fn kde_is_a_density() {
        let values: Vec<f64> = (0..200).map(|i| ((i * 13) % 29) as f64).collect();
        let grid = linspace(-30.0, 60.0, 901);
        let kde = gaussian_kde(&values, &grid);
        let step = grid[1] - grid[0];
        let area: f64 = kde.iter().sum::<f64>() * step;
        assert!((area - 1.0).abs() < 1e-3);

        assert!(gaussian_kde(&[5.0, 5.0], &grid).is_empty());
        assert!(gaussian_kde(&[5.0], &grid).is_empty());
    }

    #[test]
    fn ecdf_steps_to_one() {
        let (x, y) = ecdf(&[3.0, 1.0, 2.0, f64::NAN]);
        assert_eq!(x, vec![1.0, 2.0, 3.0]);
        assert_eq!(y, vec![1.0 / 3.0, 2.0 / 3.0, 1.0]);
    }

    #[test]
    fn box_stats_flag_outliers() {
        let mut values: Vec<f64> = (1..=9).map(|i| i as f64).collect();
        values.push(100.0);
        let stats = box_stats(&values).unwrap();
        assert_eq!(stats.median, 5.5);
        assert_eq!(stats.whisker_low, 1.0);
        assert_eq!(stats.whisker_high, 9.0);
        assert_eq!(stats.outliers, vec![100.0]);
        assert!(box_stats(&[]).is_none());
    }
}
