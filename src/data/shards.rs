//! Shard Discovery
//! Maps a dataset name to the sequence of CSV files that hold it.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// How a dataset is laid out on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShardLayout {
    /// A single `<dir>/<name>.csv` file.
    Flat { dir: PathBuf },
    /// Numbered `<dir>/<name>_<index>.csv` files starting at 0.
    Sharded { dir: PathBuf },
}

impl ShardLayout {
    /// Path probed for shard `index` of `name`, or `None` past the last
    /// shard a flat layout can have.
    pub fn shard_path(&self, name: &str, index: usize) -> Option<PathBuf> {
        match self {
            ShardLayout::Flat { dir } => (index == 0).then(|| dir.join(format!("{name}.csv"))),
            ShardLayout::Sharded { dir } => Some(dir.join(format!("{name}_{index}.csv"))),
        }
    }

    /// Lazily enumerate the shards of `name`.
    ///
    /// Each call starts a fresh probe from index 0.
    pub fn shards<'a>(&'a self, name: &'a str) -> ShardPaths<'a> {
        ShardPaths {
            layout: self,
            name,
            next_index: 0,
            done: false,
        }
    }
}

/// One discovered shard file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shard {
    pub index: usize,
    pub path: PathBuf,
}

/// Yields shard paths in index order and ends at the first absent file.
///
/// A missing file is the normal end of the sequence, so shard 0 missing
/// means the dataset has no data under this layout.
pub struct ShardPaths<'a> {
    layout: &'a ShardLayout,
    name: &'a str,
    next_index: usize,
    done: bool,
}

impl Iterator for ShardPaths<'_> {
    type Item = Shard;

    fn next(&mut self) -> Option<Shard> {
        if self.done {
            return None;
        }

        let index = self.next_index;
        match self.layout.shard_path(self.name, index) {
            Some(path) if path.is_file() => {
                self.next_index += 1;
                Some(Shard { index, path })
            }
            _ => {
                self.done = true;
                None
            }
        }
    }
}

impl std::iter::FusedIterator for ShardPaths<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::TempDir;
    use std::fs;
    use std::path::Path;

    fn touch(dir: &Path, file: &str) {
        fs::write(dir.join(file), "duration_ms\n1\n").unwrap();
    }

    #[test]
    fn stops_at_first_gap() {
        let dir = TempDir::new("shards_gap");
        for file in ["async_ws_0.csv", "async_ws_1.csv", "async_ws_2.csv", "async_ws_4.csv"] {
            touch(&dir, file);
        }

        let layout = ShardLayout::Sharded { dir: dir.to_path_buf() };
        let indices: Vec<usize> = layout.shards("async_ws").map(|s| s.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn missing_first_shard_yields_nothing() {
        let dir = TempDir::new("shards_no_first");
        touch(&dir, "poll_ws_1.csv");
        touch(&dir, "poll_ws_2.csv");

        let layout = ShardLayout::Sharded { dir: dir.to_path_buf() };
        assert_eq!(layout.shards("poll_ws").count(), 0);
    }

    #[test]
    fn flat_layout_has_at_most_one_shard() {
        let dir = TempDir::new("shards_flat");
        touch(&dir, "busy_poll_ws.csv");

        let layout = ShardLayout::Flat { dir: dir.to_path_buf() };
        let shards: Vec<Shard> = layout.shards("busy_poll_ws").collect();
        assert_eq!(
            shards,
            vec![Shard {
                index: 0,
                path: dir.join("busy_poll_ws.csv")
            }]
        );
        assert_eq!(layout.shards("poll_ws").count(), 0);
    }

    #[test]
    fn sequence_is_restartable() {
        let dir = TempDir::new("shards_restart");
        touch(&dir, "async_ws_0.csv");

        let layout = ShardLayout::Sharded { dir: dir.to_path_buf() };
        assert_eq!(layout.shards("async_ws").count(), 1);

        touch(&dir, "async_ws_1.csv");
        assert_eq!(layout.shards("async_ws").count(), 2);
    }

    #[test]
    fn exhausted_sequence_stays_exhausted() {
        let dir = TempDir::new("shards_fused");
        let layout = ShardLayout::Sharded { dir: dir.to_path_buf() };
        let mut shards = layout.shards("async_ws");
        assert!(shards.next().is_none());

        touch(&dir, "async_ws_0.csv");
        assert!(shards.next().is_none());
    }
}
