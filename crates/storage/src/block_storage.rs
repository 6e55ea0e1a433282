use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use catapult_core::{
    decode_block, decode_block_element, encode_block_element, Block, BlockElement, Height,
};
use catapult_fq::IndexFile;
use tracing::debug;

use crate::data_directory::shard_seq_path;
use crate::error::StorageError;

/// Whether a block store accepts a re-save of the current height as a no-op
/// overwrite (used by recovery, §4.4/§7 "Already-present") or treats it as a
/// fatal invariant violation (normal operation).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveMode {
    Strict,
    Idempotent,
}

/// The canonical block store rooted at `R`, tracking chain height in
/// `R/index.dat` (§3.4, §4.4).
pub struct BlockStorage {
    root: PathBuf,
    height_index: IndexFile,
    mode: SaveMode,
}

impl BlockStorage {
    pub fn new(root: impl Into<PathBuf>, mode: SaveMode) -> Self {
        let root = root.into();
        let height_index = IndexFile::new(root.join("index.dat"));
        Self {
            root,
            height_index,
            mode,
        }
    }

    pub fn chain_height(&self) -> Result<Height, StorageError> {
        Ok(self.height_index.get_or_zero()?)
    }

    fn path_for(&self, height: Height) -> PathBuf {
        shard_seq_path(&self.root, height, ".dat")
    }

    pub fn load_block(&self, height: Height) -> Result<Block, StorageError> {
        let mut file = File::open(self.path_for(height))?;
        Ok(decode_block(height, &mut file)?)
    }

    pub fn load_block_element(&self, height: Height) -> Result<BlockElement, StorageError> {
        let mut file = File::open(self.path_for(height))?;
        Ok(decode_block_element(height, &mut file)?)
    }

    /// Requires `element.height == chain_height() + 1`, unless in
    /// [`SaveMode::Idempotent`] mode and `element.height == chain_height()`,
    /// in which case the existing file is overwritten and the height advance
    /// becomes a no-op (§4.4).
    pub fn save_block(&self, element: &BlockElement) -> Result<(), StorageError> {
        let current = self.chain_height()?;

        let advances = element.height == current + 1;
        let overwrites_current = self.mode == SaveMode::Idempotent && element.height == current;

        if !advances && !overwrites_current {
            return Err(StorageError::InvariantViolation(format!(
                "save_block height {} is not contiguous with chain height {}",
                element.height, current
            )));
        }

        let path = self.path_for(element.height);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&path)?;
        encode_block_element(element, &mut file)?;
        file.sync_all()?;

        if advances {
            self.height_index.increment()?;
        } else {
            debug!(height = element.height, "save_block: already-present, overwritten in place");
        }

        Ok(())
    }

    /// Truncates the canonical chain back to `height`, removing files before
    /// lowering the index — the inverse of `save_block`.
    pub fn drop_blocks_after(&self, height: Height) -> Result<(), StorageError> {
        let current = self.chain_height()?;
        if height > current {
            return Err(StorageError::InvariantViolation(format!(
                "drop_blocks_after({height}) is not below chain height {current}"
            )));
        }

        for h in ((height + 1)..=current).rev() {
            let path = self.path_for(h);
            if path.exists() {
                fs::remove_file(&path)?;
            }
        }

        self.height_index.set(height)?;
        Ok(())
    }

    /// Moves an already-written file (typically a staged block) into this
    /// store's canonical location for `height` and advances the index the
    /// same way `save_block` would (§3.4, §4.6 step 4).
    pub fn promote_from(&self, source: &Path, height: Height) -> Result<(), StorageError> {
        let current = self.chain_height()?;
        let advances = height == current + 1;
        let overwrites_current = self.mode == SaveMode::Idempotent && height == current;
        if !advances && !overwrites_current {
            return Err(StorageError::InvariantViolation(format!(
                "promote_from height {height} is not contiguous with chain height {current}"
            )));
        }

        let dest = self.path_for(height);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::rename(source, &dest)?;

        if advances {
            self.height_index.increment()?;
        }
        Ok(())
    }
}

/// The staging store under `R/spool/block_sync/`. Same file layout as
/// [`BlockStorage`] but with no index and no side-effects on the canonical
/// `index.dat` — it only holds blocks until they're promoted (§3.4).
pub struct StagedBlockStorage {
    root: PathBuf,
}

impl StagedBlockStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path_for(&self, id: Height) -> PathBuf {
        shard_seq_path(&self.root, id, ".dat")
    }

    pub fn save_block(&self, element: &BlockElement) -> Result<(), StorageError> {
        let path = self.path_for(element.height);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&path)?;
        encode_block_element(element, &mut file)?;
        file.sync_all()?;
        Ok(())
    }

    pub fn load_block_element(&self, id: Height) -> Result<BlockElement, StorageError> {
        let mut file = File::open(self.path_for(id))?;
        Ok(decode_block_element(id, &mut file)?)
    }

    /// Ids of staged blocks currently on disk, ascending. Used by recovery
    /// to decide what still needs promoting or discarding.
    pub fn staged_ids(&self) -> Result<Vec<Height>, StorageError> {
        let mut ids = Vec::new();
        if !self.root.is_dir() {
            return Ok(ids);
        }
        for shard_entry in fs::read_dir(&self.root)? {
            let shard_entry = shard_entry?;
            if !shard_entry.file_type()?.is_dir() {
                continue;
            }
            let shard: u64 = match shard_entry.file_name().to_str().and_then(|s| s.parse().ok())
            {
                Some(v) => v,
                None => continue,
            };
            for file_entry in fs::read_dir(shard_entry.path())? {
                let file_entry = file_entry?;
                let name = file_entry.file_name();
                let Some(seq_str) = name.to_str().and_then(|s| s.strip_suffix(".dat")) else {
                    continue;
                };
                let Ok(seq) = seq_str.parse::<u64>() else {
                    continue;
                };
                ids.push(shard * 10_000 + seq);
            }
        }
        ids.sort_unstable();
        Ok(ids)
    }

    pub fn remove(&self, id: Height) -> Result<(), StorageError> {
        let path = self.path_for(id);
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }

    /// Deletes every staged block file (§4.8 step 1, "Absent or All_Updated").
    pub fn clear(&self) -> Result<(), StorageError> {
        for id in self.staged_ids()? {
            self.remove(id)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catapult_core::Hash32;

    fn element(height: Height) -> BlockElement {
        BlockElement::new(height, vec![height as u8], Hash32([height as u8; 32]))
    }

    #[test]
    fn save_and_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let storage = BlockStorage::new(dir.path(), SaveMode::Strict);

        storage.save_block(&element(1)).unwrap();
        storage.save_block(&element(2)).unwrap();

        assert_eq!(storage.chain_height().unwrap(), 2);
        assert_eq!(storage.load_block_element(1).unwrap(), element(1));
        assert_eq!(storage.load_block_element(2).unwrap(), element(2));
    }

    #[test]
    fn strict_mode_rejects_non_contiguous_save() {
        let dir = tempfile::tempdir().unwrap();
        let storage = BlockStorage::new(dir.path(), SaveMode::Strict);

        storage.save_block(&element(1)).unwrap();
        let err = storage.save_block(&element(3)).unwrap_err();
        assert!(matches!(err, StorageError::InvariantViolation(_)));
    }

    #[test]
    fn idempotent_mode_allows_resave_of_current_height() {
        let dir = tempfile::tempdir().unwrap();
        let storage = BlockStorage::new(dir.path(), SaveMode::Idempotent);

        storage.save_block(&element(1)).unwrap();
        storage.save_block(&element(1)).unwrap();
        assert_eq!(storage.chain_height().unwrap(), 1);
    }

    #[test]
    fn drop_blocks_after_removes_files_and_lowers_index() {
        let dir = tempfile::tempdir().unwrap();
        let storage = BlockStorage::new(dir.path(), SaveMode::Strict);
        storage.save_block(&element(1)).unwrap();
        storage.save_block(&element(2)).unwrap();
        storage.save_block(&element(3)).unwrap();

        storage.drop_blocks_after(1).unwrap();

        assert_eq!(storage.chain_height().unwrap(), 1);
        assert!(storage.load_block_element(2).is_err());
    }

    #[test]
    fn staged_storage_tracks_ids_and_promotes() {
        let dir = tempfile::tempdir().unwrap();
        let staged = StagedBlockStorage::new(dir.path().join("spool/block_sync"));
        staged.save_block(&element(1)).unwrap();
        staged.save_block(&element(2)).unwrap();

        assert_eq!(staged.staged_ids().unwrap(), vec![1, 2]);

        let canonical = BlockStorage::new(dir.path().join("canonical"), SaveMode::Strict);
        canonical
            .promote_from(&staged.path_for(1), 1)
            .unwrap();
        staged.remove(1).unwrap();

        assert_eq!(canonical.chain_height().unwrap(), 1);
        assert_eq!(staged.staged_ids().unwrap(), vec![2]);
    }
}
