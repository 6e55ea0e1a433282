use std::fs::{self, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::IndexFileError;

/// A single 64-bit little-endian counter stored as the entire contents of a
/// regular file (§3.1). Writer positions, reader positions and the
/// commit-step marker are all instances of this type.
///
/// The in-process `Mutex` serialises concurrent `increment`/`set` calls from
/// the same process; cross-process exclusion is the caller's responsibility
/// (§3.7 — directory ownership, single writer).
pub struct IndexFile {
    path: PathBuf,
    lock: Mutex<()>,
}

impl IndexFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Reads the counter. Fails if the file does not exist; callers that
    /// tolerate absence should use [`Self::get_or_zero`].
    pub fn get(&self) -> Result<u64, IndexFileError> {
        let _guard = self.lock.lock().unwrap();
        self.read_locked()
    }

    /// Reads the counter, treating a missing file as zero.
    pub fn get_or_zero(&self) -> Result<u64, IndexFileError> {
        let _guard = self.lock.lock().unwrap();
        if !self.path.is_file() {
            return Ok(0);
        }
        self.read_locked()
    }

    fn read_locked(&self) -> Result<u64, IndexFileError> {
        if !self.path.is_file() {
            return Err(IndexFileError::NotFound(self.path.clone()));
        }
        let mut file = fs::File::open(&self.path)?;
        let mut bytes = [0u8; 8];
        file.read_exact(&mut bytes)
            .map_err(|_| IndexFileError::Truncated(self.path.clone()))?;
        Ok(u64::from_le_bytes(bytes))
    }

    /// Creates or truncates the file to exactly 8 bytes, writes `value`
    /// little-endian, and fsyncs before returning (§4.1).
    pub fn set(&self, value: u64) -> Result<(), IndexFileError> {
        let _guard = self.lock.lock().unwrap();
        self.write_locked(value)
    }

    fn write_locked(&self, value: u64) -> Result<(), IndexFileError> {
        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&self.path)?;
        file.write_all(&value.to_le_bytes())?;
        file.sync_all()?;
        Ok(())
    }

    /// Equivalent to `set(get_or_zero() + 1)`, performed under a single lock
    /// acquisition, and returns the new value.
    pub fn increment(&self) -> Result<u64, IndexFileError> {
        let _guard = self.lock.lock().unwrap();
        let current = if self.path.is_file() {
            self.read_locked()?
        } else {
            0
        };
        let next = current
            .checked_add(1)
            .ok_or_else(|| IndexFileError::Overflow(self.path.clone()))?;
        self.write_locked(next)?;
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_reports_absent() {
        let dir = tempfile::tempdir().unwrap();
        let index = IndexFile::new(dir.path().join("index.dat"));

        assert!(!index.exists());
        assert_eq!(index.get_or_zero().unwrap(), 0);
        assert!(index.get().is_err());
    }

    #[test]
    fn set_and_get_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let index = IndexFile::new(dir.path().join("index.dat"));

        index.set(42).unwrap();
        assert!(index.exists());
        assert_eq!(index.get().unwrap(), 42);

        let on_disk = fs::metadata(dir.path().join("index.dat")).unwrap();
        assert_eq!(on_disk.len(), 8);
    }

    #[test]
    fn increment_starts_from_zero_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let index = IndexFile::new(dir.path().join("index.dat"));

        assert_eq!(index.increment().unwrap(), 1);
        assert_eq!(index.increment().unwrap(), 2);
        assert_eq!(index.get().unwrap(), 2);
    }

    #[test]
    fn truncated_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.dat");
        fs::write(&path, [1, 2, 3]).unwrap();

        let index = IndexFile::new(path);
        assert!(matches!(index.get(), Err(IndexFileError::Truncated(_))));
    }
}
