use std::fs;
use std::path::{Path, PathBuf};

use crate::error::StorageError;

/// Centralises every path the protocol depends on, given a configured root
/// `R` (§4.3). Bit-exact: padding width and separators must not change, or
/// an existing broker stops being able to find files the node writes.
#[derive(Debug, Clone)]
pub struct CatapultDataDirectory {
    root: PathBuf,
}

impl CatapultDataDirectory {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn dir(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    pub fn spool_root(&self) -> PathBuf {
        self.root.join("spool")
    }

    pub fn spool_dir(&self, queue: &str) -> PathBuf {
        self.spool_root().join(queue)
    }

    pub fn staged_block_root(&self) -> PathBuf {
        self.spool_dir("block_sync")
    }

    /// Creates `R/` and `R/spool/` if absent. Deliberately does not touch
    /// any other subdirectory; components create theirs on demand.
    pub fn prepare(&self) -> Result<(), StorageError> {
        fs::create_dir_all(&self.root)?;
        fs::create_dir_all(self.spool_root())?;
        Ok(())
    }
}

/// `shard(k) = "%05u" % (k / 10000)`, `seq(k) = "%05u" % (k % 10000)`.
pub fn shard_seq_path(root: &Path, id: u64, ext: &str) -> PathBuf {
    let shard = id / 10_000;
    let seq = id % 10_000;
    root.join(format!("{shard:05}")).join(format!("{seq:05}{ext}"))
}
