use thiserror::Error;

/// The root binary/library's error type: everywhere below it propagates a
/// crate-specific error unchanged, matching the teacher's layered
/// `WalError`/`ChainError`/`DomainError` convention (`crates/core/src/lib.rs`).
#[derive(Debug, Error)]
pub enum NodeError {
    #[error(transparent)]
    Storage(#[from] catapult_storage::StorageError),

    #[error(transparent)]
    FileQueue(#[from] catapult_fq::FileQueueError),

    #[error(transparent)]
    IndexFile(#[from] catapult_fq::IndexFileError),

    #[error(transparent)]
    Subscriber(#[from] catapult_subscribers::SubscriberError),

    #[error(transparent)]
    Recovery(#[from] catapult_recovery::RecoveryError),

    #[error(transparent)]
    Protocol(#[from] catapult_core::ProtocolError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Config(#[from] config::ConfigError),

    #[error("block producer failed: {0}")]
    Producer(Box<dyn std::error::Error + Send + Sync>),

    #[error("invariant violation: {0}")]
    InvariantViolation(String),
}
