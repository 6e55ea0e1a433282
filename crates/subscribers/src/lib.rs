//! File-backed implementations of every subscriber family (§4.5), a factory
//! that builds a full set from one data-directory root, and the state-change
//! stream parser (§4.7).

mod error;
mod factory;
mod file_block_change;
mod file_finalization;
mod file_pt_change;
mod file_state_change;
mod file_transaction_status;
mod file_ut_change;
mod state_change_reader;

pub use error::SubscriberError;
pub use factory::{
    SpoolSubscriberFactory, QUEUE_BLOCK_CHANGE, QUEUE_FINALIZATION, QUEUE_PT_CHANGE,
    QUEUE_STATE_CHANGE, QUEUE_TRANSACTION_STATUS, QUEUE_UT_CHANGE,
};
pub use file_block_change::{apply_block_change_message, FileBlockChangeSubscriber};
pub use file_finalization::{apply_finalization_message, FileFinalizationSubscriber};
pub use file_pt_change::{apply_pt_change_message, FilePtChangeSubscriber};
pub use file_state_change::FileStateChangeSubscriber;
pub use file_transaction_status::{apply_transaction_status_message, FileTransactionStatusSubscriber};
pub use file_ut_change::{apply_ut_change_message, FileUtChangeSubscriber};
pub use state_change_reader::replay_state_change_message;
