//! The commit-step protocol and the boot-time recovery orchestrator (§4.6,
//! §4.8): the machinery that lets a node or broker crash at any point and
//! come back to a deterministic, consistent state.

mod commit_step;
mod error;
mod orchestrator;

pub use commit_step::CommitStepMarker;
pub use error::RecoveryError;
pub use orchestrator::{
    reconcile_spool_queues, repair_commit_step, replay_subscribers, RecoveryOrchestrator,
    RecoverySubscribers,
};
