use thiserror::Error;

#[derive(Debug, Error)]
pub enum SubscriberError {
    #[error(transparent)]
    FileQueue(#[from] catapult_fq::FileQueueError),

    #[error(transparent)]
    Protocol(#[from] catapult_core::ProtocolError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
