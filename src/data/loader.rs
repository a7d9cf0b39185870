//! Dataset Loader Module
//! Discovers CSV shards for each dataset and loads them using Polars.

use super::processor::{column_signature, DataProcessor};
use super::shards::{Shard, ShardLayout};
use super::processor::ProcessorError;
use super::DURATION_COL;
use polars::prelude::*;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Failed to load CSV: {0}")]
    CsvError(#[from] PolarsError),
    #[error("{path}: missing '{column}' column")]
    MissingColumn { path: PathBuf, column: &'static str },
    #[error("{path}: columns differ from the first shard")]
    SchemaMismatch { path: PathBuf },
    #[error("Failed to merge shards: {0}")]
    Merge(#[from] ProcessorError),
}

/// One dataset after all of its shards were merged.
#[derive(Debug, Clone)]
pub struct LoadedDataset {
    pub name: String,
    /// Shards concatenated in index order, with a `file_index` column.
    pub df: DataFrame,
    /// Row count of each loaded shard, indexed by shard index.
    pub shard_rows: Vec<usize>,
    /// Layout the shards were found under.
    pub layout: ShardLayout,
}

impl LoadedDataset {
    pub fn row_count(&self) -> usize {
        self.df.height()
    }
}

/// Datasets that were found on disk, in the order they were requested.
#[derive(Debug, Clone, Default)]
pub struct DatasetCollection {
    datasets: Vec<LoadedDataset>,
}

impl DatasetCollection {
    pub fn push(&mut self, dataset: LoadedDataset) {
        self.datasets.push(dataset);
    }

    pub fn iter(&self) -> impl Iterator<Item = &LoadedDataset> {
        self.datasets.iter()
    }

    pub fn names(&self) -> Vec<String> {
        self.datasets.iter().map(|d| d.name.clone()).collect()
    }

    /// The dataset every other one is compared against.
    pub fn baseline(&self) -> Option<&LoadedDataset> {
        self.datasets.first()
    }
}

/// Shards read from one layout.
#[derive(Debug, Default)]
pub struct ShardScan {
    pub shards: Vec<(Shard, DataFrame)>,
    /// Discovery ended on a shard that failed to load.
    pub failed: bool,
}

/// Loads datasets by probing each configured layout in turn.
pub struct DataLoader {
    layouts: Vec<ShardLayout>,
}

impl DataLoader {
    pub fn new(layouts: Vec<ShardLayout>) -> Self {
        Self { layouts }
    }

    /// Load a single CSV file using Polars.
    ///
    /// `duration_ms` is required and is always returned as `Float64`, so
    /// integer and float shards of the same dataset share one schema.
    pub fn load_csv(file_path: &Path) -> Result<DataFrame, LoaderError> {
        let mut df = LazyCsvReader::new(file_path)
            .with_has_header(true)
            .with_infer_schema_length(Some(10000))
            .finish()?
            .collect()?;

        let duration = df
            .column(DURATION_COL)
            .map_err(|_| LoaderError::MissingColumn {
                path: file_path.to_path_buf(),
                column: DURATION_COL,
            })?
            .strict_cast(&DataType::Float64)?;
        df.with_column(duration)?;

        Ok(df)
    }

    /// Read shards of `name` under `layout` until the sequence ends or a
    /// shard fails to load.
    ///
    /// A failing shard ends discovery; the shards read before it are kept.
    pub fn load_shards(name: &str, layout: &ShardLayout) -> ShardScan {
        let mut loaded: Vec<(Shard, DataFrame)> = Vec::new();
        let mut failed = false;

        for shard in layout.shards(name) {
            let result = Self::load_csv(&shard.path).and_then(|df| match loaded.first() {
                Some((_, first)) if column_signature(first) != column_signature(&df) => {
                    Err(LoaderError::SchemaMismatch {
                        path: shard.path.clone(),
                    })
                }
                _ => Ok(df),
            });

            match result {
                Ok(df) => {
                    log::info!(
                        "Loaded shard {} of {} ({} rows)",
                        shard.path.display(),
                        name,
                        df.height()
                    );
                    loaded.push((shard, df));
                }
                Err(e) => {
                    log::warn!("Stopping discovery of {}: {}", name, e);
                    failed = true;
                    break;
                }
            }
        }

        ShardScan {
            shards: loaded,
            failed,
        }
    }

    /// Load every shard of one dataset.
    ///
    /// Returns `Ok(None)` when no layout has a first shard for `name`, or
    /// when the first shard found is malformed. Later layouts are only tried
    /// while the first shard is missing.
    pub fn load_dataset(&self, name: &str) -> Result<Option<LoadedDataset>, LoaderError> {
        for layout in &self.layouts {
            let ShardScan { shards, failed } = Self::load_shards(name, layout);
            if shards.is_empty() {
                if failed {
                    log::warn!("First shard of {} is malformed, dataset skipped", name);
                    return Ok(None);
                }
                continue;
            }

            let shard_rows: Vec<usize> = shards.iter().map(|(_, df)| df.height()).collect();
            let df = DataProcessor::concat_shards(
                shards.into_iter().map(|(shard, df)| (shard.index, df)),
            )?;

            log::info!(
                "Loaded dataset {} ({} rows from {} shard(s))",
                name,
                df.height(),
                shard_rows.len()
            );

            return Ok(Some(LoadedDataset {
                name: name.to_string(),
                df,
                shard_rows,
                layout: layout.clone(),
            }));
        }

        log::info!("Dataset {} not found", name);
        Ok(None)
    }

    /// Load all named datasets, skipping the ones that do not exist.
    pub fn load_all(&self, names: &[String]) -> Result<DatasetCollection, LoaderError> {
        let mut collection = DatasetCollection::default();
        for name in names {
            if let Some(dataset) = self.load_dataset(name)? {
                collection.push(dataset);
            }
        }
        Ok(collection)
    }
}
