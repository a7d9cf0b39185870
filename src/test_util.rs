//! Scratch directories for filesystem tests.

use std::fs;
use std::ops::Deref;
use std::path::{Path, PathBuf};

/// Directory under the system temp dir, removed again when dropped.
pub struct TempDir(PathBuf);

impl TempDir {
    pub fn new(tag: &str) -> Self {
        let mut dir = std::env::temp_dir();
        dir.push(format!("ws_latency_{tag}_{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        Self(dir)
    }
}

impl Deref for TempDir {
    type Target = Path;

    fn deref(&self) -> &Path {
        &self.0
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removed_on_drop() {
        let dir = TempDir::new("test_util_drop");
        fs::write(dir.join("a.csv"), "duration_ms\n1\n").unwrap();
        let path = dir.to_path_buf();
        assert!(path.join("a.csv").is_file());

        drop(dir);
        assert!(!path.exists());
    }
}
