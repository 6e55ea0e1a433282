use catapult_fq::{FileQueueReader, FileQueueWriter, IndexFile};
use catapult_storage::CatapultDataDirectory;

use crate::error::SubscriberError;
use crate::file_block_change::FileBlockChangeSubscriber;
use crate::file_finalization::FileFinalizationSubscriber;
use crate::file_pt_change::FilePtChangeSubscriber;
use crate::file_state_change::FileStateChangeSubscriber;
use crate::file_transaction_status::FileTransactionStatusSubscriber;
use crate::file_ut_change::FileUtChangeSubscriber;

pub const QUEUE_BLOCK_CHANGE: &str = "block_change";
pub const QUEUE_UT_CHANGE: &str = "unconfirmed_transactions_change";
pub const QUEUE_PT_CHANGE: &str = "partial_transactions_change";
pub const QUEUE_FINALIZATION: &str = "finalization";
pub const QUEUE_TRANSACTION_STATUS: &str = "transaction_status";
pub const QUEUE_STATE_CHANGE: &str = "state_change";

/// Builds one file-backed subscriber per family from a single data
/// directory root, mirroring the original's `FileQueueFactory`
/// (`FileSpoolingExtension.cpp`): all five (six, counting state change)
/// subscribers are constructed the same way, rooted at `R/spool/<queue>/`.
pub struct SpoolSubscriberFactory {
    data_dir: CatapultDataDirectory,
}

impl SpoolSubscriberFactory {
    pub fn new(data_dir: CatapultDataDirectory) -> Self {
        Self { data_dir }
    }

    pub fn block_change(&self) -> Result<FileBlockChangeSubscriber, SubscriberError> {
        let writer = FileQueueWriter::new(self.data_dir.spool_dir(QUEUE_BLOCK_CHANGE))?;
        Ok(FileBlockChangeSubscriber::new(writer))
    }

    pub fn ut_change(&self) -> Result<FileUtChangeSubscriber, SubscriberError> {
        let writer = FileQueueWriter::new(self.data_dir.spool_dir(QUEUE_UT_CHANGE))?;
        Ok(FileUtChangeSubscriber::new(writer))
    }

    pub fn pt_change(&self) -> Result<FilePtChangeSubscriber, SubscriberError> {
        let writer = FileQueueWriter::new(self.data_dir.spool_dir(QUEUE_PT_CHANGE))?;
        Ok(FilePtChangeSubscriber::new(writer))
    }

    pub fn finalization(&self) -> Result<FileFinalizationSubscriber, SubscriberError> {
        let writer = FileQueueWriter::new(self.data_dir.spool_dir(QUEUE_FINALIZATION))?;
        Ok(FileFinalizationSubscriber::new(writer))
    }

    pub fn transaction_status(&self) -> Result<FileTransactionStatusSubscriber, SubscriberError> {
        let writer = FileQueueWriter::new(self.data_dir.spool_dir(QUEUE_TRANSACTION_STATUS))?;
        Ok(FileTransactionStatusSubscriber::new(writer))
    }

    pub fn state_change(&self) -> Result<FileStateChangeSubscriber, SubscriberError> {
        let dir = self.data_dir.spool_dir(QUEUE_STATE_CHANGE);
        let writer = FileQueueWriter::new(&dir)?;
        let secondary_index = IndexFile::new(dir.join("index_server.dat"));
        Ok(FileStateChangeSubscriber::new(writer, secondary_index))
    }

    /// A broker-mode reader for `queue`: reads and deletes via
    /// `index_broker_r.dat` against `index.dat`.
    pub fn broker_reader(&self, queue: &str) -> Result<FileQueueReader, SubscriberError> {
        Ok(FileQueueReader::new(self.data_dir.spool_dir(queue))?)
    }

    /// A server-recovery-mode reader for `queue`: advances
    /// `index_server_r.dat` but never deletes a message file, since the
    /// broker reader is the one that plays "last reader" (§3.2).
    pub fn server_recovery_reader(&self, queue: &str) -> Result<FileQueueReader, SubscriberError> {
        Ok(FileQueueReader::with_names(
            self.data_dir.spool_dir(queue),
            "index_server_r.dat",
            "index.dat",
            false,
        )?)
    }
}
