use std::time::Duration;

use tracing::{debug, info};

use catapult_core::{
    BlockChangeSubscriber, CacheChangesRegistry, FinalizationSubscriber, PtChangeSubscriber,
    StateChangeSubscriber, TransactionStatusSubscriber, UtChangeSubscriber,
};
use catapult_recovery::{RecoveryOrchestrator, RecoverySubscribers};
use catapult_storage::CatapultDataDirectory;
use catapult_subscribers::{
    apply_block_change_message, apply_finalization_message, apply_pt_change_message,
    apply_transaction_status_message, apply_ut_change_message, replay_state_change_message,
    SpoolSubscriberFactory, SubscriberError, QUEUE_BLOCK_CHANGE, QUEUE_FINALIZATION,
    QUEUE_PT_CHANGE, QUEUE_STATE_CHANGE, QUEUE_TRANSACTION_STATUS, QUEUE_UT_CHANGE,
};

use crate::error::NodeError;

/// One in-process subscriber per family, injected by the hosting process —
/// the broker itself has no opinion on what happens to a message once
/// decoded (spec.md §1, "external interface is the file queue itself").
pub struct BrokerSubscribers<B, U, P, F, T, S> {
    pub block_change: B,
    pub ut_change: U,
    pub pt_change: P,
    pub finalization: F,
    pub transaction_status: T,
    pub state_change: S,
}

/// The broker pass-through driver (component I's counterpart on the reader
/// side): boots recovery in broker-recovery mode — implicit here, since
/// recovery's replay step already prefers `index_broker_r.dat` whenever it
/// is present on disk — then polls every queue forever, one task per queue
/// (spec.md §5: "one consumer callback executes at a time per queue").
pub struct Broker<B, U, P, F, T, S> {
    data_dir: CatapultDataDirectory,
    registry: CacheChangesRegistry,
    subscribers: BrokerSubscribers<B, U, P, F, T, S>,
}

impl<B, U, P, F, T, S> Broker<B, U, P, F, T, S>
where
    B: BlockChangeSubscriber<Error = SubscriberError> + Send + 'static,
    U: UtChangeSubscriber<Error = SubscriberError> + Send + 'static,
    P: PtChangeSubscriber<Error = SubscriberError> + Send + 'static,
    F: FinalizationSubscriber<Error = SubscriberError> + Send + 'static,
    T: TransactionStatusSubscriber<Error = SubscriberError> + Send + 'static,
    S: StateChangeSubscriber<Error = SubscriberError> + Send + 'static,
{
    pub fn new(
        data_dir: CatapultDataDirectory,
        registry: CacheChangesRegistry,
        subscribers: BrokerSubscribers<B, U, P, F, T, S>,
    ) -> Self {
        Self {
            data_dir,
            registry,
            subscribers,
        }
    }

    /// Runs the recovery orchestrator once, then polls every queue forever.
    /// Returns only if one of the per-queue tasks hits a fatal error (§7:
    /// corruption is fatal, not silently skipped).
    pub async fn run(mut self, poll_interval: Duration) -> Result<(), NodeError> {
        let orchestrator = RecoveryOrchestrator::new(self.data_dir.clone());
        let mut recovery_subscribers = RecoverySubscribers {
            block_change: &mut self.subscribers.block_change,
            ut_change: &mut self.subscribers.ut_change,
            pt_change: &mut self.subscribers.pt_change,
            finalization: &mut self.subscribers.finalization,
            transaction_status: &mut self.subscribers.transaction_status,
            state_change: &mut self.subscribers.state_change,
        };
        orchestrator.recover(&self.registry, &mut recovery_subscribers)?;

        info!("broker recovered, starting per-queue poll loop");

        let factory = SpoolSubscriberFactory::new(self.data_dir.clone());
        let registry = self.registry.clone();

        let BrokerSubscribers {
            block_change,
            ut_change,
            pt_change,
            finalization,
            transaction_status,
            state_change,
        } = self.subscribers;

        let block_change_reader = factory.broker_reader(QUEUE_BLOCK_CHANGE)?;
        let ut_change_reader = factory.broker_reader(QUEUE_UT_CHANGE)?;
        let pt_change_reader = factory.broker_reader(QUEUE_PT_CHANGE)?;
        let finalization_reader = factory.broker_reader(QUEUE_FINALIZATION)?;
        let transaction_status_reader = factory.broker_reader(QUEUE_TRANSACTION_STATUS)?;
        let state_change_reader = factory.broker_reader(QUEUE_STATE_CHANGE)?;

        let result = tokio::try_join!(
            poll_forever(block_change_reader, block_change, poll_interval, move |bytes, sub| {
                apply_block_change_message(bytes, sub)
            }),
            poll_forever(ut_change_reader, ut_change, poll_interval, move |bytes, sub| {
                apply_ut_change_message(bytes, sub)
            }),
            poll_forever(pt_change_reader, pt_change, poll_interval, move |bytes, sub| {
                apply_pt_change_message(bytes, sub)
            }),
            poll_forever(finalization_reader, finalization, poll_interval, move |bytes, sub| {
                apply_finalization_message(bytes, sub)
            }),
            poll_forever(
                transaction_status_reader,
                transaction_status,
                poll_interval,
                move |bytes, sub| { apply_transaction_status_message(bytes, sub) }
            ),
            poll_forever(state_change_reader, state_change, poll_interval, move |bytes, sub| {
                replay_state_change_message(bytes, &registry, sub)
            }),
        );

        result.map(|_| ())
    }
}

/// Polls `reader` forever, draining every message with `apply` before
/// sleeping `poll_interval` when the queue runs dry. A decode failure is
/// fatal and is not retried past the poisoned id (spec.md §8 scenario 4).
async fn poll_forever<S>(
    mut reader: catapult_fq::FileQueueReader,
    mut subscriber: S,
    poll_interval: Duration,
    mut apply: impl FnMut(&[u8], &mut S) -> Result<(), SubscriberError> + Send,
) -> Result<(), NodeError>
where
    S: Send,
{
    loop {
        let mut drained_any = false;

        loop {
            let consumed = reader.try_read_next(|bytes| {
                apply(bytes, &mut subscriber)
                    .map_err(|err| Box::new(err) as Box<dyn std::error::Error + Send + Sync>)
            })?;

            if !consumed {
                break;
            }
            drained_any = true;
        }

        if !drained_any {
            debug!(pending = reader.pending()?, "queue drained, sleeping");
            tokio::time::sleep(poll_interval).await;
        }
    }
}
