//! Data Processor Module
//! Handles shard concatenation, dataset tagging and derived columns.

use super::loader::DatasetCollection;
use super::{rolling_column_name, DATASET_COL, DURATION_COL, FILE_INDEX_COL, SEQUENCE_COL};
use polars::prelude::*;
use std::collections::{HashMap, VecDeque};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProcessorError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("No shards to concatenate")]
    NoShards,
    #[error("No datasets available")]
    NoDatasets,
    #[error("Dataset {dataset} has different columns than {baseline}")]
    SchemaMismatch { dataset: String, baseline: String },
    #[error("Missing column '{0}'")]
    MissingColumn(&'static str),
    #[error("Invalid rolling window {window} with min_periods {min_periods}")]
    InvalidWindow { window: usize, min_periods: usize },
}

/// Trailing-window mean over one series.
///
/// Missing values occupy a slot in the window but are not averaged. The sum
/// is recomputed from the window contents on every push.
#[derive(Debug, Clone)]
pub struct RollingWindow {
    window: usize,
    min_periods: usize,
    values: VecDeque<Option<f64>>,
}

impl RollingWindow {
    pub fn new(window: usize, min_periods: usize) -> Self {
        Self {
            window,
            min_periods,
            values: VecDeque::with_capacity(window),
        }
    }

    /// Add the next value and return the mean of the current window, or
    /// `None` while fewer than `min_periods` values are present.
    pub fn push(&mut self, value: Option<f64>) -> Option<f64> {
        if self.values.len() == self.window {
            self.values.pop_front();
        }
        self.values.push_back(value.filter(|v| !v.is_nan()));

        let (sum, valid) = self
            .values
            .iter()
            .flatten()
            .fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
        (valid >= self.min_periods).then(|| sum / valid as f64)
    }
}

/// Column names and dtypes, in order.
pub(crate) fn column_signature(df: &DataFrame) -> Vec<(String, DataType)> {
    df.get_columns()
        .iter()
        .map(|col| (col.name().to_string(), col.dtype().clone()))
        .collect()
}

/// Handles data tagging and transformation operations.
///
/// Every operation returns a new DataFrame; inputs are left untouched.
pub struct DataProcessor;

impl DataProcessor {
    /// Tag each shard with its probe index and stack them in order.
    pub fn concat_shards(
        shards: impl IntoIterator<Item = (usize, DataFrame)>,
    ) -> Result<DataFrame, ProcessorError> {
        let mut unified: Option<DataFrame> = None;

        for (index, df) in shards {
            let mut tagged = df;
            let file_index = vec![index as u32; tagged.height()];
            tagged.with_column(Column::new(FILE_INDEX_COL.into(), file_index))?;

            match unified.as_mut() {
                Some(acc) => {
                    acc.vstack_mut(&tagged)?;
                }
                None => unified = Some(tagged),
            }
        }

        unified.ok_or(ProcessorError::NoShards)
    }

    /// Copy of `df` with a `dataset` column holding `name`.
    pub fn tag_dataset(df: &DataFrame, name: &str) -> Result<DataFrame, ProcessorError> {
        let mut tagged = df.clone();
        let labels = vec![name.to_string(); df.height()];
        tagged.with_column(Column::new(DATASET_COL.into(), labels))?;
        Ok(tagged)
    }

    /// Tag every dataset with its name and stack them in collection order.
    pub fn combine(collection: &DatasetCollection) -> Result<DataFrame, ProcessorError> {
        let mut datasets = collection.iter();
        let first = datasets.next().ok_or(ProcessorError::NoDatasets)?;
        let baseline = column_signature(&first.df);

        let mut combined = Self::tag_dataset(&first.df, &first.name)?;
        for dataset in datasets {
            if column_signature(&dataset.df) != baseline {
                return Err(ProcessorError::SchemaMismatch {
                    dataset: dataset.name.clone(),
                    baseline: first.name.clone(),
                });
            }
            combined.vstack_mut(&Self::tag_dataset(&dataset.df, &dataset.name)?)?;
        }

        Ok(combined)
    }

    /// Add `sequence_id`: the row position within each dataset.
    pub fn with_sequence_ids(df: &DataFrame) -> Result<DataFrame, ProcessorError> {
        let datasets = df
            .column(DATASET_COL)
            .map_err(|_| ProcessorError::MissingColumn(DATASET_COL))?
            .str()?;

        let mut counters: HashMap<&str, u64> = HashMap::new();
        let ids: Vec<u64> = datasets
            .into_iter()
            .map(|name| {
                let counter = counters.entry(name.unwrap_or("")).or_insert(0);
                let id = *counter;
                *counter += 1;
                id
            })
            .collect();

        let mut out = df.clone();
        out.with_column(Column::new(SEQUENCE_COL.into(), ids))?;
        Ok(out)
    }

    /// Add `rolling_avg_<window>` over `duration_ms`, computed per dataset in
    /// row order.
    pub fn with_rolling_average(
        df: &DataFrame,
        window: usize,
        min_periods: usize,
    ) -> Result<DataFrame, ProcessorError> {
        if window == 0 || min_periods == 0 || min_periods > window {
            return Err(ProcessorError::InvalidWindow {
                window,
                min_periods,
            });
        }

        let datasets = df
            .column(DATASET_COL)
            .map_err(|_| ProcessorError::MissingColumn(DATASET_COL))?
            .str()?;
        let durations = df
            .column(DURATION_COL)
            .map_err(|_| ProcessorError::MissingColumn(DURATION_COL))?
            .cast(&DataType::Float64)?;
        let durations = durations.f64()?;

        let mut windows: HashMap<&str, RollingWindow> = HashMap::new();
        let averages: Vec<Option<f64>> = datasets
            .into_iter()
            .zip(durations.into_iter())
            .map(|(name, value)| {
                windows
                    .entry(name.unwrap_or(""))
                    .or_insert_with(|| RollingWindow::new(window, min_periods))
                    .push(value)
            })
            .collect();

        let mut out = df.clone();
        out.with_column(Column::new(rolling_column_name(window).into(), averages))?;
        Ok(out)
    }

    /// Time-series view: sequence ids, sorted by dataset then sequence,
    /// with the rolling average attached.
    pub fn timeseries(
        df: &DataFrame,
        window: usize,
        min_periods: usize,
    ) -> Result<DataFrame, ProcessorError> {
        let with_ids = if df.column(SEQUENCE_COL).is_ok() {
            df.clone()
        } else {
            Self::with_sequence_ids(df)?
        };

        let sorted = with_ids.sort([DATASET_COL, SEQUENCE_COL], SortMultipleOptions::default())?;
        Self::with_rolling_average(&sorted, window, min_periods)
    }
}
