//! Data module - shard discovery, CSV loading and derived columns

mod loader;
mod processor;
mod shards;

pub use loader::{DataLoader, LoadedDataset};
pub use processor::DataProcessor;
pub use shards::ShardLayout;

/// Measured latency of one operation, in milliseconds.
pub const DURATION_COL: &str = "duration_ms";
/// Name of the dataset a row belongs to.
pub const DATASET_COL: &str = "dataset";
/// Probe index of the shard file a row was read from.
pub const FILE_INDEX_COL: &str = "file_index";
/// Row position within its dataset.
pub const SEQUENCE_COL: &str = "sequence_id";

/// Column holding the rolling mean for a given window size.
pub fn rolling_column_name(window: usize) -> String {
    format!("rolling_avg_{window}")
}
