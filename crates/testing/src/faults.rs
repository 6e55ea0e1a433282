use std::io;

use catapult_core::{
    BlockChangeSubscriber, BlockElement, ChainScore, CommitStep, CommitTransaction, Cosignature,
    FinalizationRound, FinalizationSubscriber, Hash32, Height, PtChangeSubscriber,
    StateChangeInfo, StateChangeSubscriber, TransactionInfo, TransactionStatusSubscriber,
    UtChangeSubscriber,
};
use catapult_subscribers::SubscriberError;

/// Which collaborator a [`Faulty*`] wrapper should start failing. Mirrors
/// the teacher's wrap-and-inject-by-enum pattern (one flag, one family).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TestFault {
    #[default]
    None,
    BlockChange,
    UtChange,
    PtChange,
    Finalization,
    TransactionStatus,
    StateChange,
    CommitTransaction,
}

fn fault_err(context: &str) -> SubscriberError {
    SubscriberError::Io(io::Error::other(format!("fault injection: {context}")))
}

pub struct FaultyBlockChangeSubscriber<S> {
    inner: S,
    fault: TestFault,
}

impl<S> FaultyBlockChangeSubscriber<S> {
    pub fn new(inner: S, fault: TestFault) -> Self {
        Self { inner, fault }
    }

    fn should_fault(&self) -> bool {
        matches!(self.fault, TestFault::BlockChange)
    }
}

impl<S> BlockChangeSubscriber for FaultyBlockChangeSubscriber<S>
where
    S: BlockChangeSubscriber<Error = SubscriberError>,
{
    type Error = SubscriberError;

    fn notify_block(&mut self, element: &BlockElement) -> Result<(), Self::Error> {
        if self.should_fault() {
            return Err(fault_err("block change"));
        }
        self.inner.notify_block(element)
    }

    fn notify_drop_blocks_after(&mut self, height: Height) -> Result<(), Self::Error> {
        if self.should_fault() {
            return Err(fault_err("block change"));
        }
        self.inner.notify_drop_blocks_after(height)
    }
}

pub struct FaultyUtChangeSubscriber<S> {
    inner: S,
    fault: TestFault,
}

impl<S> FaultyUtChangeSubscriber<S> {
    pub fn new(inner: S, fault: TestFault) -> Self {
        Self { inner, fault }
    }

    fn should_fault(&self) -> bool {
        matches!(self.fault, TestFault::UtChange)
    }
}

impl<S> UtChangeSubscriber for FaultyUtChangeSubscriber<S>
where
    S: UtChangeSubscriber<Error = SubscriberError>,
{
    type Error = SubscriberError;

    fn notify_adds(&mut self, infos: &[TransactionInfo]) -> Result<(), Self::Error> {
        if self.should_fault() {
            return Err(fault_err("ut change"));
        }
        self.inner.notify_adds(infos)
    }

    fn notify_removes(&mut self, infos: &[TransactionInfo]) -> Result<(), Self::Error> {
        if self.should_fault() {
            return Err(fault_err("ut change"));
        }
        self.inner.notify_removes(infos)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        if self.should_fault() {
            return Err(fault_err("ut change"));
        }
        self.inner.flush()
    }
}

pub struct FaultyPtChangeSubscriber<S> {
    inner: S,
    fault: TestFault,
}

impl<S> FaultyPtChangeSubscriber<S> {
    pub fn new(inner: S, fault: TestFault) -> Self {
        Self { inner, fault }
    }

    fn should_fault(&self) -> bool {
        matches!(self.fault, TestFault::PtChange)
    }
}

impl<S> PtChangeSubscriber for FaultyPtChangeSubscriber<S>
where
    S: PtChangeSubscriber<Error = SubscriberError>,
{
    type Error = SubscriberError;

    fn notify_add_partials(&mut self, infos: &[TransactionInfo]) -> Result<(), Self::Error> {
        if self.should_fault() {
            return Err(fault_err("pt change"));
        }
        self.inner.notify_add_partials(infos)
    }

    fn notify_add_cosignature(
        &mut self,
        parent_hash: Hash32,
        cosignature: Cosignature,
    ) -> Result<(), Self::Error> {
        if self.should_fault() {
            return Err(fault_err("pt change"));
        }
        self.inner.notify_add_cosignature(parent_hash, cosignature)
    }

    fn notify_remove_partials(&mut self, infos: &[TransactionInfo]) -> Result<(), Self::Error> {
        if self.should_fault() {
            return Err(fault_err("pt change"));
        }
        self.inner.notify_remove_partials(infos)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        if self.should_fault() {
            return Err(fault_err("pt change"));
        }
        self.inner.flush()
    }
}

pub struct FaultyFinalizationSubscriber<S> {
    inner: S,
    fault: TestFault,
}

impl<S> FaultyFinalizationSubscriber<S> {
    pub fn new(inner: S, fault: TestFault) -> Self {
        Self { inner, fault }
    }

    fn should_fault(&self) -> bool {
        matches!(self.fault, TestFault::Finalization)
    }
}

impl<S> FinalizationSubscriber for FaultyFinalizationSubscriber<S>
where
    S: FinalizationSubscriber<Error = SubscriberError>,
{
    type Error = SubscriberError;

    fn notify_finalized_block(
        &mut self,
        round: FinalizationRound,
        height: Height,
        hash: Hash32,
    ) -> Result<(), Self::Error> {
        if self.should_fault() {
            return Err(fault_err("finalization"));
        }
        self.inner.notify_finalized_block(round, height, hash)
    }
}

pub struct FaultyTransactionStatusSubscriber<S> {
    inner: S,
    fault: TestFault,
}

impl<S> FaultyTransactionStatusSubscriber<S> {
    pub fn new(inner: S, fault: TestFault) -> Self {
        Self { inner, fault }
    }

    fn should_fault(&self) -> bool {
        matches!(self.fault, TestFault::TransactionStatus)
    }
}

impl<S> TransactionStatusSubscriber for FaultyTransactionStatusSubscriber<S>
where
    S: TransactionStatusSubscriber<Error = SubscriberError>,
{
    type Error = SubscriberError;

    fn notify_status(&mut self, info: &TransactionInfo, status_code: u32) -> Result<(), Self::Error> {
        if self.should_fault() {
            return Err(fault_err("transaction status"));
        }
        self.inner.notify_status(info, status_code)
    }
}

pub struct FaultyStateChangeSubscriber<S> {
    inner: S,
    fault: TestFault,
}

impl<S> FaultyStateChangeSubscriber<S> {
    pub fn new(inner: S, fault: TestFault) -> Self {
        Self { inner, fault }
    }

    fn should_fault(&self) -> bool {
        matches!(self.fault, TestFault::StateChange)
    }
}

impl<S> StateChangeSubscriber for FaultyStateChangeSubscriber<S>
where
    S: StateChangeSubscriber<Error = SubscriberError>,
{
    type Error = SubscriberError;

    fn notify_score_change(&mut self, score: ChainScore) -> Result<(), Self::Error> {
        if self.should_fault() {
            return Err(fault_err("state change"));
        }
        self.inner.notify_score_change(score)
    }

    fn notify_state_change(&mut self, info: &StateChangeInfo) -> Result<(), Self::Error> {
        if self.should_fault() {
            return Err(fault_err("state change"));
        }
        self.inner.notify_state_change(info)
    }
}

/// Wraps any [`CommitTransaction`] to fail `advance_to`, simulating a crash
/// partway through the nine-step commit sequence (§4.6) without needing a
/// real process kill in a test.
pub struct FaultyCommitTransaction<S> {
    inner: S,
    fault: TestFault,
}

impl<S> FaultyCommitTransaction<S> {
    pub fn new(inner: S, fault: TestFault) -> Self {
        Self { inner, fault }
    }

    fn should_fault(&self) -> bool {
        matches!(self.fault, TestFault::CommitTransaction)
    }
}

impl<S> CommitTransaction for FaultyCommitTransaction<S>
where
    S: CommitTransaction<Error = catapult_recovery::RecoveryError>,
{
    type Error = catapult_recovery::RecoveryError;

    fn current_step(&self) -> Result<Option<CommitStep>, Self::Error> {
        self.inner.current_step()
    }

    fn advance_to(&mut self, step: CommitStep) -> Result<(), Self::Error> {
        if self.should_fault() {
            return Err(catapult_recovery::RecoveryError::Io(io::Error::other(
                "fault injection: commit transaction",
            )));
        }
        self.inner.advance_to(step)
    }

    fn clear(&mut self) -> Result<(), Self::Error> {
        self.inner.clear()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catapult_core::CacheChanges;

    struct NoopBlockChange;
    impl BlockChangeSubscriber for NoopBlockChange {
        type Error = SubscriberError;
        fn notify_block(&mut self, _element: &BlockElement) -> Result<(), Self::Error> {
            Ok(())
        }
        fn notify_drop_blocks_after(&mut self, _height: Height) -> Result<(), Self::Error> {
            Ok(())
        }
    }

    #[test]
    fn passes_through_when_fault_is_none() {
        let mut subscriber = FaultyBlockChangeSubscriber::new(NoopBlockChange, TestFault::None);
        let element = BlockElement::new(1, vec![1, 2, 3], Hash32::ZERO);
        assert!(subscriber.notify_block(&element).is_ok());
    }

    #[test]
    fn injects_the_configured_fault() {
        let mut subscriber =
            FaultyBlockChangeSubscriber::new(NoopBlockChange, TestFault::BlockChange);
        let element = BlockElement::new(1, vec![1, 2, 3], Hash32::ZERO);
        assert!(subscriber.notify_block(&element).is_err());
    }

    #[test]
    fn only_the_matching_family_faults() {
        let mut subscriber = FaultyBlockChangeSubscriber::new(NoopBlockChange, TestFault::UtChange);
        let element = BlockElement::new(1, vec![1, 2, 3], Hash32::ZERO);
        assert!(subscriber.notify_block(&element).is_ok());
    }

    #[test]
    fn state_change_subscriber_can_be_wrapped_too() {
        struct NoopStateChange;
        impl StateChangeSubscriber for NoopStateChange {
            type Error = SubscriberError;
            fn notify_score_change(&mut self, _score: ChainScore) -> Result<(), Self::Error> {
                Ok(())
            }
            fn notify_state_change(&mut self, _info: &StateChangeInfo) -> Result<(), Self::Error> {
                Ok(())
            }
        }

        let mut subscriber =
            FaultyStateChangeSubscriber::new(NoopStateChange, TestFault::StateChange);
        let info = StateChangeInfo::StateChange {
            height: 1,
            changes: CacheChanges::default(),
        };
        assert!(subscriber.notify_state_change(&info).is_err());
    }
}
