use crate::{
    BlockElement, ChainScore, CommitStep, Cosignature, FinalizationRound, Height, StateChangeInfo,
    TransactionInfo,
};

/// Notified of new blocks and rollbacks as the canonical chain changes
/// (§4.5, component E).
pub trait BlockChangeSubscriber {
    type Error;

    fn notify_block(&mut self, element: &BlockElement) -> Result<(), Self::Error>;
    fn notify_drop_blocks_after(&mut self, height: Height) -> Result<(), Self::Error>;
}

/// Notified of unconfirmed-transaction-cache changes.
pub trait UtChangeSubscriber {
    type Error;

    fn notify_adds(&mut self, infos: &[TransactionInfo]) -> Result<(), Self::Error>;
    fn notify_removes(&mut self, infos: &[TransactionInfo]) -> Result<(), Self::Error>;
    fn flush(&mut self) -> Result<(), Self::Error>;
}

/// Notified of partial (aggregate-bonded) transaction cache changes.
pub trait PtChangeSubscriber {
    type Error;

    fn notify_add_partials(&mut self, infos: &[TransactionInfo]) -> Result<(), Self::Error>;
    fn notify_add_cosignature(
        &mut self,
        parent_hash: crate::Hash32,
        cosignature: Cosignature,
    ) -> Result<(), Self::Error>;
    fn notify_remove_partials(&mut self, infos: &[TransactionInfo]) -> Result<(), Self::Error>;
    fn flush(&mut self) -> Result<(), Self::Error>;
}

/// Notified when a finalization round completes.
pub trait FinalizationSubscriber {
    type Error;

    fn notify_finalized_block(
        &mut self,
        round: FinalizationRound,
        height: Height,
        hash: crate::Hash32,
    ) -> Result<(), Self::Error>;
}

/// Notified of the final disposition of a submitted transaction.
pub trait TransactionStatusSubscriber {
    type Error;

    fn notify_status(
        &mut self,
        info: &TransactionInfo,
        status_code: u32,
    ) -> Result<(), Self::Error>;
}

/// Notified of chain-score and per-cache state changes (§4.5, component G).
pub trait StateChangeSubscriber {
    type Error;

    fn notify_score_change(&mut self, score: ChainScore) -> Result<(), Self::Error>;
    fn notify_state_change(&mut self, info: &StateChangeInfo) -> Result<(), Self::Error>;
}

/// A single block-import transaction, linearised across block storage,
/// state storage and every subscriber fanout via the commit-step marker
/// (§4.6, component F).
pub trait CommitTransaction {
    type Error;

    fn current_step(&self) -> Result<Option<CommitStep>, Self::Error>;
    fn advance_to(&mut self, step: CommitStep) -> Result<(), Self::Error>;
    fn clear(&mut self) -> Result<(), Self::Error>;
}
