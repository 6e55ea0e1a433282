use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::FileQueueError;
use crate::index_file::IndexFile;

/// Renders a 64-bit id as the queue's fixed message-file name: 16 uppercase
/// hex characters plus `.dat` (§3.2, §6.1).
pub fn message_file_name(id: u64) -> String {
    format!("{:016X}.dat", id)
}

fn message_path(dir: &Path, id: u64) -> PathBuf {
    dir.join(message_file_name(id))
}

/// Appends messages to a single-producer file queue (§4.2, writer contract).
///
/// A message is "published" only once its file is complete on disk *and*
/// the writer index has advanced past it; `write` alone does neither.
pub struct FileQueueWriter {
    dir: PathBuf,
    index: IndexFile,
    current: Option<(u64, File)>,
}

impl FileQueueWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, FileQueueError> {
        Self::with_index_name(dir, "index.dat")
    }

    pub fn with_index_name(
        dir: impl Into<PathBuf>,
        index_file_name: &str,
    ) -> Result<Self, FileQueueError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;

        let index = IndexFile::new(dir.join(index_file_name));
        if !index.exists() {
            index.set(0)?;
        }

        Ok(Self {
            dir,
            index,
            current: None,
        })
    }

    /// Appends `bytes` to the currently open message file, opening a new one
    /// at the writer index if none is open.
    pub fn write(&mut self, bytes: &[u8]) -> Result<(), FileQueueError> {
        if self.current.is_none() {
            let id = self.index.get_or_zero()?;
            let path = message_path(&self.dir, id);
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)?;
            self.current = Some((id, file));
        }

        let (_, file) = self.current.as_mut().unwrap();
        file.write_all(bytes)?;
        Ok(())
    }

    /// Fsyncs and closes the current message file and advances the writer
    /// index, publishing the message. A no-op if no message is open.
    pub fn flush(&mut self) -> Result<(), FileQueueError> {
        let Some((id, file)) = self.current.take() else {
            return Ok(());
        };
        file.sync_all()?;
        drop(file);
        let next = self.index.increment()?;
        debug_assert_eq!(next, id + 1);
        debug!(queue = %self.dir.display(), id, "published queue message");
        Ok(())
    }

    pub fn writer_index(&self) -> Result<u64, FileQueueError> {
        Ok(self.index.get_or_zero()?)
    }
}

/// Reads messages from a file queue in strictly increasing id order (§4.2,
/// reader contract). One reader tracks one reader-index file; a queue may
/// have several independent readers (e.g. broker and server-recovery).
pub struct FileQueueReader {
    dir: PathBuf,
    reader_index: IndexFile,
    writer_index: IndexFile,
    /// Whether this reader deletes a message file after passing it. A queue
    /// may have two simultaneous readers (broker mode and server-recovery
    /// mode, §3.2); only the one playing the "last reader" role — the
    /// broker, in practice — deletes files. The other only advances its own
    /// index.
    deletes_on_read: bool,
}

impl FileQueueReader {
    /// A standard single-reader queue: `index_broker_r.dat` against
    /// `index.dat`, deleting each message once consumed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, FileQueueError> {
        Self::with_names(dir, "index_broker_r.dat", "index.dat", true)
    }

    pub fn with_names(
        dir: impl Into<PathBuf>,
        reader_index_name: &str,
        writer_index_name: &str,
        deletes_on_read: bool,
    ) -> Result<Self, FileQueueError> {
        let dir = dir.into();
        let reader_index = IndexFile::new(dir.join(reader_index_name));
        if !reader_index.exists() {
            reader_index.set(0)?;
        }
        let writer_index = IndexFile::new(dir.join(writer_index_name));
        Ok(Self {
            dir,
            reader_index,
            writer_index,
            deletes_on_read,
        })
    }

    pub fn reader_index(&self) -> Result<u64, FileQueueError> {
        Ok(self.reader_index.get_or_zero()?)
    }

    /// Number of unread messages, or 0 if the writer index doesn't exist yet.
    pub fn pending(&self) -> Result<usize, FileQueueError> {
        if !self.writer_index.exists() {
            return Ok(0);
        }
        let writer = self.writer_index.get()?;
        let reader = self.reader_index.get_or_zero()?;
        Ok(writer.saturating_sub(reader) as usize)
    }

    /// Reads and consumes exactly one message, if any is pending.
    ///
    /// Returns `Ok(true)` if a message was delivered to `consumer`, `Ok(false)`
    /// if the queue has nothing left to read. A missing message file while
    /// `reader_index < writer_index` is corruption, not an empty queue.
    pub fn try_read_next<F>(&mut self, mut consumer: F) -> Result<bool, FileQueueError>
    where
        F: FnMut(&[u8]) -> Result<(), Box<dyn std::error::Error + Send + Sync>>,
    {
        if !self.writer_index.exists() {
            return Ok(false);
        }
        let writer = self.writer_index.get()?;
        let reader = self.reader_index.get_or_zero()?;

        if reader >= writer {
            return Ok(false);
        }

        let path = message_path(&self.dir, reader);
        let bytes = fs::read(&path).map_err(|_| FileQueueError::Corruption {
            expected_id: reader,
            path: path.clone(),
        })?;

        consumer(&bytes).map_err(FileQueueError::Consumer)?;

        self.reader_index.set(reader + 1)?;
        if self.deletes_on_read {
            fs::remove_file(&path)?;
        }

        Ok(true)
    }

    /// Equivalent to calling `try_read_next` with a no-op consumer up to `n`
    /// times; stops early once the queue is drained.
    pub fn skip(&mut self, n: u64) -> Result<u64, FileQueueError> {
        let mut skipped = 0;
        for _ in 0..n {
            if !self.try_read_next(|_| Ok(()))? {
                break;
            }
            skipped += 1;
        }
        Ok(skipped)
    }
}
