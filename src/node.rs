use tracing::info;

use catapult_core::{
    BlockChangeSubscriber as _, BlockElement, CacheChangesRegistry, ChainScore, CommitStep,
    CommitTransaction as _, PtChangeSubscriber as _, StateChangeInfo, StateChangeSubscriber as _,
    TransactionStatusSubscriber as _, UtChangeSubscriber as _,
};
use catapult_recovery::{CommitStepMarker, RecoveryOrchestrator, RecoverySubscribers};
use catapult_storage::{
    BlockStorage, CatapultDataDirectory, SaveMode, StagedBlockStorage, StateStorage,
};
use catapult_subscribers::{
    FileBlockChangeSubscriber, FileFinalizationSubscriber, FilePtChangeSubscriber,
    FileStateChangeSubscriber, FileTransactionStatusSubscriber, FileUtChangeSubscriber,
    SpoolSubscriberFactory,
};

use crate::error::NodeError;
use crate::logging_subscribers::LoggingSubscriber;

/// The external collaborator that decides what block comes next: consensus,
/// block-sync, validation and execution all live outside this core's scope
/// (spec.md §1, §4.9). This is the seam the node server calls into.
pub trait BlockProducer {
    fn next_block(&mut self) -> Result<Option<ProducedBlock>, NodeError>;
}

/// A block ready to be committed, bundled with the state the commit step
/// must make durable and the messages it must fan out once that state is
/// durable (spec.md §4.6 step 7).
pub struct ProducedBlock {
    pub element: BlockElement,
    pub score: ChainScore,
    pub cache_payloads: Vec<(u32, Vec<u8>)>,
    pub state_changes: Vec<StateChangeInfo>,
}

/// The live, non-recovery driver (component I). Owns the single writer to
/// the data directory root (spec.md §4.9 commitment (c): never write from
/// more than one thread without external serialisation — callers are
/// expected to hold `&mut NodeServer` behind whatever serialisation their
/// runtime provides).
pub struct NodeServer {
    canonical: BlockStorage,
    staged: StagedBlockStorage,
    state: StateStorage,
    marker: CommitStepMarker,
    block_change: FileBlockChangeSubscriber,
    ut_change: FileUtChangeSubscriber,
    pt_change: FilePtChangeSubscriber,
    finalization: FileFinalizationSubscriber,
    transaction_status: FileTransactionStatusSubscriber,
    state_change: FileStateChangeSubscriber,
}

impl NodeServer {
    /// Prepares the data directory, runs the recovery orchestrator (§4.8)
    /// exactly once, and returns a server ready to commit new blocks. No
    /// network or scheduler thread may start before this returns.
    pub fn open(
        data_dir: CatapultDataDirectory,
        registry: &CacheChangesRegistry,
    ) -> Result<Self, NodeError> {
        data_dir.prepare()?;

        let canonical = BlockStorage::new(data_dir.root(), SaveMode::Strict);
        let staged = StagedBlockStorage::new(data_dir.staged_block_root());
        let state = StateStorage::new(data_dir.root());
        let marker = CommitStepMarker::new(data_dir.root());

        // Recovery's replay step (§4.8 step 3) catches up whatever consumer
        // the node process itself hosts downstream of the spool — it must
        // not re-publish into the very file-spool writers below, or a crash
        // recovered after any committed block would duplicate every
        // previously-published message back into the same queue. The node
        // has no in-process downstream of its own, so replay targets a
        // log-only placeholder, the same role `LoggingSubscriber` plays as
        // the broker's default consumer.
        let mut recovery_block_change = LoggingSubscriber;
        let mut recovery_ut_change = LoggingSubscriber;
        let mut recovery_pt_change = LoggingSubscriber;
        let mut recovery_finalization = LoggingSubscriber;
        let mut recovery_transaction_status = LoggingSubscriber;
        let mut recovery_state_change = LoggingSubscriber;

        let orchestrator = RecoveryOrchestrator::new(data_dir.clone());
        let mut subscribers = RecoverySubscribers {
            block_change: &mut recovery_block_change,
            ut_change: &mut recovery_ut_change,
            pt_change: &mut recovery_pt_change,
            finalization: &mut recovery_finalization,
            transaction_status: &mut recovery_transaction_status,
            state_change: &mut recovery_state_change,
        };
        orchestrator.recover(registry, &mut subscribers)?;

        info!(root = %orchestrator.data_dir().root().display(), "node server ready");

        let factory = SpoolSubscriberFactory::new(data_dir.clone());
        let block_change = factory.block_change()?;
        let ut_change = factory.ut_change()?;
        let pt_change = factory.pt_change()?;
        let finalization = factory.finalization()?;
        let transaction_status = factory.transaction_status()?;
        let state_change = factory.state_change()?;

        Ok(Self {
            canonical,
            staged,
            state,
            marker,
            block_change,
            ut_change,
            pt_change,
            finalization,
            transaction_status,
            state_change,
        })
    }

    pub fn chain_height(&self) -> Result<catapult_core::Height, NodeError> {
        Ok(self.canonical.chain_height()?)
    }

    /// Runs the nine-step sequence of spec.md §4.6 for a single block,
    /// commitment (a): the sequence is followed strictly and
    /// `commit_step.dat` is gone again before this returns (commitment (d)).
    pub fn commit_block(&mut self, produced: ProducedBlock) -> Result<(), NodeError> {
        let ProducedBlock {
            element,
            score,
            cache_payloads,
            state_changes,
        } = produced;
        let height = element.height;

        // 1. Stage the block (no marker write yet).
        self.staged.save_block(&element)?;

        // 2. Build new state into state.tmp/.
        self.state.save(height, score, &cache_payloads)?;

        // 3. commit_step = Blocks_Written.
        self.marker.advance_to(CommitStep::BlocksWritten)?;

        // 4. Promote the staged block; this also advances index.dat.
        self.canonical
            .promote_from(&self.staged.path_for(height), height)?;

        // 5. commit_step = State_Written.
        self.marker.advance_to(CommitStep::StateWritten)?;

        // 6. state.tmp -> state; importance/wip -> importance.
        self.state.promote_state()?;
        self.state.promote_importance()?;

        // 7. Fan out messages — block-change before state-change, matching
        // §5's "block-change messages for height h precede any state-change
        // message for height h".
        self.block_change.notify_block(&element)?;
        for change in &state_changes {
            match change {
                StateChangeInfo::ScoreChange(score) => {
                    self.state_change.notify_score_change(*score)?
                }
                StateChangeInfo::StateChange { .. } => {
                    self.state_change.notify_state_change(change)?
                }
            }
        }

        // 8. commit_step = All_Updated.
        self.marker.advance_to(CommitStep::AllUpdated)?;

        // 9. Delete commit_step.dat.
        self.marker.clear()?;

        info!(height, "committed block");
        Ok(())
    }

    /// Truncates the canonical chain and notifies subscribers of the
    /// rollback, used by consensus-driven reorgs (spec.md §4.5's
    /// `notify_drop_blocks_after`). Not part of the §4.6 commit sequence —
    /// no marker write accompanies it.
    pub fn drop_blocks_after(&mut self, height: catapult_core::Height) -> Result<(), NodeError> {
        self.canonical.drop_blocks_after(height)?;
        self.block_change.notify_drop_blocks_after(height)?;
        Ok(())
    }

    /// Flushes the UT/PT subscribers on their own cadence, independent of
    /// block cadence (spec.md §4.9).
    pub fn flush_queue_subscribers(&mut self) -> Result<(), NodeError> {
        self.ut_change.flush()?;
        self.pt_change.flush()?;
        Ok(())
    }

    pub fn finalization_subscriber(&mut self) -> &mut FileFinalizationSubscriber {
        &mut self.finalization
    }

    pub fn transaction_status_subscriber(&mut self) -> &mut FileTransactionStatusSubscriber {
        &mut self.transaction_status
    }

    /// Drives `producer` until it reports no further blocks, flushing
    /// UT/PT subscribers every `flush_interval`.
    pub fn run(
        &mut self,
        producer: &mut impl BlockProducer,
        flush_interval: std::time::Duration,
    ) -> Result<(), NodeError> {
        let mut last_flush = std::time::Instant::now();

        loop {
            let Some(produced) = producer.next_block()? else {
                break;
            };

            self.commit_block(produced)?;

            if last_flush.elapsed() >= flush_interval {
                self.flush_queue_subscribers()?;
                last_flush = std::time::Instant::now();
            }
        }

        Ok(())
    }
}
