//! Fault injection and synthetic fixtures shared by this crate's test
//! suites: the integration tests at the workspace root, and the `#[cfg(test)]`
//! modules inside each library crate.

pub mod faults;
pub mod synthetic;

pub use faults::{
    FaultyBlockChangeSubscriber, FaultyCommitTransaction, FaultyFinalizationSubscriber,
    FaultyPtChangeSubscriber, FaultyStateChangeSubscriber, FaultyTransactionStatusSubscriber,
    FaultyUtChangeSubscriber, TestFault,
};
pub use synthetic::{
    build_synthetic_chain, synthetic_bytes, synthetic_cosignature, synthetic_finalization_round,
    synthetic_hash, synthetic_score_change, synthetic_state_change, synthetic_transaction,
    SyntheticChainConfig,
};
