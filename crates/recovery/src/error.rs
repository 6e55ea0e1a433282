use thiserror::Error;

#[derive(Debug, Error)]
pub enum RecoveryError {
    #[error(transparent)]
    Storage(#[from] catapult_storage::StorageError),

    #[error(transparent)]
    FileQueue(#[from] catapult_fq::FileQueueError),

    #[error(transparent)]
    IndexFile(#[from] catapult_fq::IndexFileError),

    #[error(transparent)]
    Subscriber(#[from] catapult_subscribers::SubscriberError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("recovery found an inconsistency it cannot repair: {0}")]
    InvariantViolation(String),
}
