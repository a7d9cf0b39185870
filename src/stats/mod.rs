//! Stats module - descriptive statistics and distribution summaries

mod calculator;
pub mod distribution;

pub use calculator::{ComparisonStats, GroupStats, StatsCalculator, SIGNIFICANCE_THRESHOLD};
