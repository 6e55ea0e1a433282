use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Protocol(#[from] catapult_core::ProtocolError),

    #[error(transparent)]
    IndexFile(#[from] catapult_fq::IndexFileError),

    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    #[error("{0:?} already exists, cannot be promotion target")]
    AlreadyExists(PathBuf),

    #[error("{0:?} does not exist")]
    NotFound(PathBuf),
}
