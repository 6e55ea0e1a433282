//! A no-op, log-only implementation of every subscriber family, used as the
//! broker binary's default downstream until a hosting process wires in real
//! ones (consensus clients, RPC fanout, and the like all live outside this
//! core's scope, spec.md §1).

use tracing::info;

use catapult_core::{
    BlockChangeSubscriber, BlockElement, ChainScore, Cosignature, FinalizationRound, Hash32,
    Height, PtChangeSubscriber, StateChangeInfo, StateChangeSubscriber, TransactionInfo,
    TransactionStatusSubscriber, UtChangeSubscriber,
};
use catapult_subscribers::SubscriberError;

#[derive(Debug, Default)]
pub struct LoggingSubscriber;

impl BlockChangeSubscriber for LoggingSubscriber {
    type Error = SubscriberError;

    fn notify_block(&mut self, element: &BlockElement) -> Result<(), Self::Error> {
        info!(height = element.height, hash = %element.hash, "block_change");
        Ok(())
    }

    fn notify_drop_blocks_after(&mut self, height: Height) -> Result<(), Self::Error> {
        info!(height, "block_change: drop_blocks_after");
        Ok(())
    }
}

impl UtChangeSubscriber for LoggingSubscriber {
    type Error = SubscriberError;

    fn notify_adds(&mut self, infos: &[TransactionInfo]) -> Result<(), Self::Error> {
        info!(count = infos.len(), "ut_change: adds");
        Ok(())
    }

    fn notify_removes(&mut self, infos: &[TransactionInfo]) -> Result<(), Self::Error> {
        info!(count = infos.len(), "ut_change: removes");
        Ok(())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl PtChangeSubscriber for LoggingSubscriber {
    type Error = SubscriberError;

    fn notify_add_partials(&mut self, infos: &[TransactionInfo]) -> Result<(), Self::Error> {
        info!(count = infos.len(), "pt_change: add_partials");
        Ok(())
    }

    fn notify_add_cosignature(
        &mut self,
        parent_hash: Hash32,
        _cosignature: Cosignature,
    ) -> Result<(), Self::Error> {
        info!(parent_hash = %parent_hash, "pt_change: add_cosignature");
        Ok(())
    }

    fn notify_remove_partials(&mut self, infos: &[TransactionInfo]) -> Result<(), Self::Error> {
        info!(count = infos.len(), "pt_change: remove_partials");
        Ok(())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl FinalizationSubscriber for LoggingSubscriber {
    type Error = SubscriberError;

    fn notify_finalized_block(
        &mut self,
        round: FinalizationRound,
        height: Height,
        hash: Hash32,
    ) -> Result<(), Self::Error> {
        info!(epoch = round.epoch, point = round.point, height, hash = %hash, "finalization");
        Ok(())
    }
}

impl TransactionStatusSubscriber for LoggingSubscriber {
    type Error = SubscriberError;

    fn notify_status(&mut self, info: &TransactionInfo, status_code: u32) -> Result<(), Self::Error> {
        tracing::info!(hash = %info.hash, status_code, "transaction_status");
        Ok(())
    }
}

impl StateChangeSubscriber for LoggingSubscriber {
    type Error = SubscriberError;

    fn notify_score_change(&mut self, score: ChainScore) -> Result<(), Self::Error> {
        info!(high = score.high, low = score.low, "state_change: score");
        Ok(())
    }

    fn notify_state_change(&mut self, info: &StateChangeInfo) -> Result<(), Self::Error> {
        match info {
            StateChangeInfo::ScoreChange(score) => {
                info!(high = score.high, low = score.low, "state_change: score");
            }
            StateChangeInfo::StateChange { height, changes } => {
                info!(height, caches = changes.0.len(), "state_change: state");
            }
        }
        Ok(())
    }
}
