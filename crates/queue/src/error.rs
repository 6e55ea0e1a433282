use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IndexFileError {
    #[error("index file {0:?} does not exist")]
    NotFound(PathBuf),

    #[error("index file {0:?} does not hold exactly 8 bytes")]
    Truncated(PathBuf),

    #[error("index file {0:?} would overflow on increment")]
    Overflow(PathBuf),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum FileQueueError {
    #[error(transparent)]
    IndexFile(#[from] IndexFileError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("message file for id {expected_id} missing at {path:?}: queue is corrupt")]
    Corruption { expected_id: u64, path: PathBuf },

    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    #[error("consumer callback failed")]
    Consumer(#[source] Box<dyn std::error::Error + Send + Sync>),
}
