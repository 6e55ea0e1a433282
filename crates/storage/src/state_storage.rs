use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use catapult_core::{ChainScore, Height};

use crate::error::StorageError;

/// Manages `R/state/`, `R/state.tmp/`, `R/importance/` and
/// `R/importance/wip/` (§3.5, §4.4).
///
/// The supplemental file's exact byte layout is opaque to the protocol
/// (§6.1); this type only needs to move it atomically, so its contents here
/// are whatever this crate chooses to write as long as `save`/promotion
/// round-trip.
pub struct StateStorage {
    root: PathBuf,
}

impl StateStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn state_dir(&self) -> PathBuf {
        self.root.join("state")
    }

    pub fn state_tmp_dir(&self) -> PathBuf {
        self.root.join("state.tmp")
    }

    pub fn importance_dir(&self) -> PathBuf {
        self.root.join("importance")
    }

    pub fn importance_wip_dir(&self) -> PathBuf {
        self.importance_dir().join("wip")
    }

    /// Writes `supplemental.dat` plus one file per registered sub-cache into
    /// `R/state.tmp/` (§4.4). `cache_payloads` is `(cache_id, bytes)`.
    pub fn save(
        &self,
        height: Height,
        score: ChainScore,
        cache_payloads: &[(u32, Vec<u8>)],
    ) -> Result<(), StorageError> {
        let tmp = self.state_tmp_dir();
        if tmp.exists() {
            fs::remove_dir_all(&tmp)?;
        }
        fs::create_dir_all(&tmp)?;

        let mut supplemental = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(tmp.join("supplemental.dat"))?;
        score.write_to(&mut supplemental)?;
        supplemental.write_all(&height.to_le_bytes())?;
        supplemental.sync_all()?;

        for (cache_id, payload) in cache_payloads {
            let mut file = OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(tmp.join(format!("{cache_id:010}.cache")))?;
            file.write_all(payload)?;
            file.sync_all()?;
        }

        Ok(())
    }

    /// Moves `state.tmp/` into place as `state/`. Unlike [`promote_dir`],
    /// this replaces an existing `state/` outright: every commit writes a
    /// full new state rather than a diff, so the directory this promotion
    /// displaces is stale the moment `state.tmp/` exists (§4.6 step 6). A
    /// crash between the removal and the rename below is recovered the same
    /// way as any other crash in this step: the commit-step marker is still
    /// `State_Written`, and repair re-enters here, finding `state.tmp/`
    /// present and `state/` either gone or not yet replaced.
    pub fn promote_state(&self) -> Result<(), StorageError> {
        replace_dir(&self.state_tmp_dir(), &self.state_dir())
    }

    pub fn promote_importance(&self) -> Result<(), StorageError> {
        if !self.importance_wip_dir().is_dir() {
            return Ok(());
        }
        replace_dir(&self.importance_wip_dir(), &self.importance_dir())
    }

    /// Discards any in-progress promotion target left behind by a crash
    /// before `Blocks_Written` was ever written (§4.8 step 1).
    pub fn purge_tmp(&self) -> Result<(), StorageError> {
        let tmp = self.state_tmp_dir();
        if tmp.exists() {
            fs::remove_dir_all(tmp)?;
        }
        let wip = self.importance_wip_dir();
        if wip.exists() {
            fs::remove_dir_all(wip)?;
        }
        Ok(())
    }
}

/// Renames `source` to `dest`. `dest` must not already exist (§4.4).
pub fn promote_dir(source: &Path, dest: &Path) -> Result<(), StorageError> {
    if dest.exists() {
        return Err(StorageError::AlreadyExists(dest.to_path_buf()));
    }
    if !source.exists() {
        return Err(StorageError::NotFound(source.to_path_buf()));
    }
    fs::rename(source, dest)?;
    Ok(())
}

/// Renames `source` to `dest`, discarding whatever previously lived at
/// `dest`. A no-op if `source` is already gone (the rename already
/// happened on a prior, interrupted attempt at this same promotion).
fn replace_dir(source: &Path, dest: &Path) -> Result<(), StorageError> {
    if !source.exists() {
        return Ok(());
    }
    if dest.exists() {
        fs::remove_dir_all(dest)?;
    }
    fs::rename(source, dest)?;
    Ok(())
}
