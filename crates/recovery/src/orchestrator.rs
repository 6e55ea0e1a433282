use std::fs;
use std::path::Path;

use catapult_core::{
    BlockChangeSubscriber, CacheChangesRegistry, CommitStep, CommitTransaction,
    FinalizationSubscriber, PtChangeSubscriber, StateChangeSubscriber, TransactionStatusSubscriber,
    UtChangeSubscriber,
};
use catapult_fq::{FileQueueReader, IndexFile};
use catapult_storage::{BlockStorage, CatapultDataDirectory, SaveMode, StagedBlockStorage, StateStorage};
use catapult_subscribers::{
    apply_block_change_message, apply_finalization_message, apply_pt_change_message,
    apply_transaction_status_message, apply_ut_change_message, replay_state_change_message,
    SubscriberError, QUEUE_BLOCK_CHANGE, QUEUE_FINALIZATION, QUEUE_PT_CHANGE, QUEUE_STATE_CHANGE,
    QUEUE_TRANSACTION_STATUS, QUEUE_UT_CHANGE,
};
use tracing::{debug, info};

use crate::commit_step::CommitStepMarker;
use crate::error::RecoveryError;

const ALL_QUEUES: [&str; 6] = [
    QUEUE_BLOCK_CHANGE,
    QUEUE_UT_CHANGE,
    QUEUE_PT_CHANGE,
    QUEUE_FINALIZATION,
    QUEUE_TRANSACTION_STATUS,
    QUEUE_STATE_CHANGE,
];

/// The live subscriber set recovery replays queue contents into — the same
/// set normal operation feeds (§4.8 step 3). Each field is an external
/// collaborator, injected by the caller rather than owned here.
pub struct RecoverySubscribers<'a, B, U, P, F, T, S> {
    pub block_change: &'a mut B,
    pub ut_change: &'a mut U,
    pub pt_change: &'a mut P,
    pub finalization: &'a mut F,
    pub transaction_status: &'a mut T,
    pub state_change: &'a mut S,
}

/// Runs exactly once at process start, before any network or scheduler
/// thread (§4.8). Grounded in the teacher's `BootstrapExt::bootstrap`: "read
/// current marker, compare against storage, decide next action" — the same
/// role `bootstrap()` plays for a `Domain` there.
pub struct RecoveryOrchestrator {
    data_dir: CatapultDataDirectory,
}

impl RecoveryOrchestrator {
    pub fn new(data_dir: CatapultDataDirectory) -> Self {
        Self { data_dir }
    }

    pub fn data_dir(&self) -> &CatapultDataDirectory {
        &self.data_dir
    }

    /// Runs the full five-step algorithm of §4.8 and returns control to the
    /// caller. Determinism: a function of on-disk state only.
    pub fn recover<B, U, P, F, T, S>(
        &self,
        registry: &CacheChangesRegistry,
        subscribers: &mut RecoverySubscribers<'_, B, U, P, F, T, S>,
    ) -> Result<(), RecoveryError>
    where
        B: BlockChangeSubscriber<Error = SubscriberError>,
        U: UtChangeSubscriber<Error = SubscriberError>,
        P: PtChangeSubscriber<Error = SubscriberError>,
        F: FinalizationSubscriber<Error = SubscriberError>,
        T: TransactionStatusSubscriber<Error = SubscriberError>,
        S: StateChangeSubscriber<Error = SubscriberError>,
    {
        info!(root = %self.data_dir.root().display(), "recovery starting");

        let mut marker = CommitStepMarker::new(self.data_dir.root());
        let crash_recovery_needed = repair_commit_step(&mut marker, &self.data_dir)?;
        if crash_recovery_needed {
            reconcile_spool_queues(&self.data_dir)?;
            replay_subscribers(&self.data_dir, registry, subscribers)?;
        }
        marker.clear()?;

        info!("recovery complete");
        Ok(())
    }
}

/// §4.8 step 1: repair the commit-step marker, rolling forward or purging
/// in-progress artifacts depending on its value. Independently testable, as
/// the original's `RepairState.cpp`/`RepairImportance.cpp` split suggests.
///
/// Returns whether steps 2–3 (reconcile spool queues, replay subscribers)
/// are still needed: absent or `All_Updated` means the node shut down
/// cleanly (or recovery already finished) and the algorithm goes straight to
/// step 4; the two in-progress values mean a crash occurred mid-transaction
/// and the remaining steps must run.
pub fn repair_commit_step(
    marker: &mut CommitStepMarker,
    data_dir: &CatapultDataDirectory,
) -> Result<bool, RecoveryError> {
    let state = StateStorage::new(data_dir.root());
    let staged = StagedBlockStorage::new(data_dir.staged_block_root());
    let canonical = BlockStorage::new(data_dir.root(), SaveMode::Idempotent);

    let crash_recovery_needed = match marker.current_step()? {
        None | Some(CommitStep::AllUpdated) => {
            debug!("commit step absent or All_Updated: purging in-progress artifacts");
            state.purge_tmp()?;
            staged.clear()?;
            marker.clear()?;
            false
        }
        Some(CommitStep::BlocksWritten) => {
            info!("rolling forward from Blocks_Written");
            for id in staged.staged_ids()? {
                canonical.promote_from(&staged.path_for(id), id)?;
            }
            if state.state_tmp_dir().is_dir() {
                state.promote_state()?;
            }
            state.promote_importance()?;
            marker.advance_to(CommitStep::StateWritten)?;
            true
        }
        Some(CommitStep::StateWritten) => {
            info!("rolling forward from State_Written");
            if state.state_tmp_dir().is_dir() {
                state.promote_state()?;
            }
            state.promote_importance()?;
            marker.advance_to(CommitStep::AllUpdated)?;
            true
        }
    };
    Ok(crash_recovery_needed)
}

/// §4.8 step 2: reconcile each queue's secondary writer index against its
/// primary one and delete any message files left dangling past the writer
/// position.
pub fn reconcile_spool_queues(data_dir: &CatapultDataDirectory) -> Result<(), RecoveryError> {
    for queue in ALL_QUEUES {
        reconcile_queue(data_dir, queue)?;
    }
    Ok(())
}

fn reconcile_queue(data_dir: &CatapultDataDirectory, queue: &str) -> Result<(), RecoveryError> {
    let dir = data_dir.spool_dir(queue);
    let primary = IndexFile::new(dir.join("index.dat"));
    let writer_pos = primary.get_or_zero()?;

    if queue == QUEUE_STATE_CHANGE {
        let secondary = IndexFile::new(dir.join("index_server.dat"));
        let secondary_pos = secondary.get_or_zero()?;
        if secondary_pos != writer_pos {
            debug!(
                queue,
                writer_pos, secondary_pos, "realigning index_server.dat with index.dat"
            );
            secondary.set(writer_pos)?;
        }
    }

    delete_spurious_messages(&dir, writer_pos)
}

/// Deletes message files at ids `>= writer_pos`, which can only be present
/// because a crash interrupted a write before the writer index advanced
/// past them (§4.1 invariant).
fn delete_spurious_messages(dir: &Path, writer_pos: u64) -> Result<(), RecoveryError> {
    if !dir.is_dir() {
        return Ok(());
    }
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name();
        let Some(stem) = name.to_str().and_then(|s| s.strip_suffix(".dat")) else {
            continue;
        };
        if stem.len() != 16 || !stem.chars().all(|c| c.is_ascii_hexdigit()) {
            continue;
        }
        let Ok(id) = u64::from_str_radix(stem, 16) else {
            continue;
        };
        if id >= writer_pos {
            debug!(path = %entry.path().display(), id, writer_pos, "deleting spurious message file");
            fs::remove_file(entry.path())?;
        }
    }
    Ok(())
}

/// §4.8 step 3: catch every registered subscriber up by replaying queue
/// messages from whichever reader index applies through the appropriate
/// family's decode-and-replay function (§4.7).
pub fn replay_subscribers<B, U, P, F, T, S>(
    data_dir: &CatapultDataDirectory,
    registry: &CacheChangesRegistry,
    subscribers: &mut RecoverySubscribers<'_, B, U, P, F, T, S>,
) -> Result<(), RecoveryError>
where
    B: BlockChangeSubscriber<Error = SubscriberError>,
    U: UtChangeSubscriber<Error = SubscriberError>,
    P: PtChangeSubscriber<Error = SubscriberError>,
    F: FinalizationSubscriber<Error = SubscriberError>,
    T: TransactionStatusSubscriber<Error = SubscriberError>,
    S: StateChangeSubscriber<Error = SubscriberError>,
{
    replay_queue(data_dir, QUEUE_BLOCK_CHANGE, |bytes| {
        apply_block_change_message(bytes, subscribers.block_change)
    })?;
    replay_queue(data_dir, QUEUE_UT_CHANGE, |bytes| {
        apply_ut_change_message(bytes, subscribers.ut_change)
    })?;
    replay_queue(data_dir, QUEUE_PT_CHANGE, |bytes| {
        apply_pt_change_message(bytes, subscribers.pt_change)
    })?;
    replay_queue(data_dir, QUEUE_FINALIZATION, |bytes| {
        apply_finalization_message(bytes, subscribers.finalization)
    })?;
    replay_queue(data_dir, QUEUE_TRANSACTION_STATUS, |bytes| {
        apply_transaction_status_message(bytes, subscribers.transaction_status)
    })?;
    replay_queue(data_dir, QUEUE_STATE_CHANGE, |bytes| {
        replay_state_change_message(bytes, registry, subscribers.state_change)
    })?;
    Ok(())
}

/// Picks `index_broker_r.dat` if a broker reader is already present for
/// `queue`, else `index_server_r.dat` (§4.8 step 3, §9 Open Question 1).
/// Checked as a plain path test, not by constructing a [`FileQueueReader`],
/// since construction itself creates the index file it would be testing for.
fn replay_queue<A>(
    data_dir: &CatapultDataDirectory,
    queue: &str,
    mut apply: A,
) -> Result<(), RecoveryError>
where
    A: FnMut(&[u8]) -> Result<(), SubscriberError>,
{
    let dir = data_dir.spool_dir(queue);
    let broker_reader_present = dir.join("index_broker_r.dat").is_file();

    let mut reader = if broker_reader_present {
        FileQueueReader::with_names(&dir, "index_broker_r.dat", "index.dat", true)?
    } else {
        FileQueueReader::with_names(&dir, "index_server_r.dat", "index.dat", false)?
    };

    let mut replayed = 0u64;
    while reader.try_read_next(|bytes| {
        apply(bytes).map_err(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync>)
    })? {
        replayed += 1;
    }
    if replayed > 0 {
        debug!(queue, replayed, "replayed messages into subscriber during recovery");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use catapult_core::{
        ChainScore, Cosignature, FinalizationRound, Hash32, Height, StateChangeInfo,
        TransactionInfo,
    };
    use catapult_fq::FileQueueWriter;
    use catapult_subscribers::SpoolSubscriberFactory;

    fn fixture() -> (tempfile::TempDir, CatapultDataDirectory) {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = CatapultDataDirectory::new(dir.path());
        data_dir.prepare().unwrap();
        (dir, data_dir)
    }

    #[test]
    fn repair_purges_in_progress_artifacts_when_marker_absent() {
        let (_dir, data_dir) = fixture();
        let state = StateStorage::new(data_dir.root());
        state.save(1, ChainScore::default(), &[]).unwrap();
        let staged = StagedBlockStorage::new(data_dir.staged_block_root());
        staged
            .save_block(&catapult_core::BlockElement::new(1, vec![1], Hash32::ZERO))
            .unwrap();

        let mut marker = CommitStepMarker::new(data_dir.root());
        let crash_recovery_needed = repair_commit_step(&mut marker, &data_dir).unwrap();

        assert!(!crash_recovery_needed);
        assert!(!state.state_tmp_dir().exists());
        assert_eq!(staged.staged_ids().unwrap(), Vec::<Height>::new());
        assert_eq!(marker.current_step().unwrap(), None);
    }

    #[test]
    fn repair_rolls_forward_from_blocks_written() {
        let (_dir, data_dir) = fixture();
        let canonical = BlockStorage::new(data_dir.root(), SaveMode::Strict);
        canonical
            .save_block(&catapult_core::BlockElement::new(5, vec![5], Hash32::ZERO))
            .unwrap();

        let staged = StagedBlockStorage::new(data_dir.staged_block_root());
        staged
            .save_block(&catapult_core::BlockElement::new(6, vec![6], Hash32::ZERO))
            .unwrap();
        staged
            .save_block(&catapult_core::BlockElement::new(7, vec![7], Hash32::ZERO))
            .unwrap();

        let state = StateStorage::new(data_dir.root());
        state.save(7, ChainScore::new(1, 1), &[]).unwrap();

        let mut marker = CommitStepMarker::new(data_dir.root());
        marker.advance_to(CommitStep::BlocksWritten).unwrap();

        let crash_recovery_needed = repair_commit_step(&mut marker, &data_dir).unwrap();

        assert!(crash_recovery_needed);
        assert_eq!(canonical.chain_height().unwrap(), 7);
        assert_eq!(staged.staged_ids().unwrap(), Vec::<Height>::new());
        assert!(state.state_dir().join("supplemental.dat").exists());
        assert_eq!(marker.current_step().unwrap(), Some(CommitStep::StateWritten));
    }

    #[test]
    fn repair_finishes_state_written_without_replaying_queues() {
        let (_dir, data_dir) = fixture();
        let state = StateStorage::new(data_dir.root());
        state.save(7, ChainScore::new(3, 4), &[]).unwrap();

        let mut marker = CommitStepMarker::new(data_dir.root());
        marker.advance_to(CommitStep::StateWritten).unwrap();

        let crash_recovery_needed = repair_commit_step(&mut marker, &data_dir).unwrap();

        assert!(crash_recovery_needed);
        assert!(state.state_dir().join("supplemental.dat").exists());
        assert_eq!(marker.current_step().unwrap(), Some(CommitStep::AllUpdated));
    }

    #[test]
    fn repair_reports_no_crash_recovery_needed_when_all_updated() {
        let (_dir, data_dir) = fixture();
        let mut marker = CommitStepMarker::new(data_dir.root());
        marker.advance_to(CommitStep::AllUpdated).unwrap();

        let crash_recovery_needed = repair_commit_step(&mut marker, &data_dir).unwrap();

        assert!(!crash_recovery_needed);
    }

    #[test]
    fn reconcile_resets_secondary_index_down_to_primary() {
        let (_dir, data_dir) = fixture();
        let dir = data_dir.spool_dir(QUEUE_STATE_CHANGE);
        std::fs::create_dir_all(&dir).unwrap();
        IndexFile::new(dir.join("index.dat")).set(3).unwrap();
        IndexFile::new(dir.join("index_server.dat")).set(5).unwrap();

        reconcile_spool_queues(&data_dir).unwrap();

        assert_eq!(IndexFile::new(dir.join("index_server.dat")).get().unwrap(), 3);
    }

    #[test]
    fn reconcile_advances_secondary_index_up_to_primary() {
        let (_dir, data_dir) = fixture();
        let dir = data_dir.spool_dir(QUEUE_STATE_CHANGE);
        std::fs::create_dir_all(&dir).unwrap();
        IndexFile::new(dir.join("index.dat")).set(9).unwrap();
        IndexFile::new(dir.join("index_server.dat")).set(2).unwrap();

        reconcile_spool_queues(&data_dir).unwrap();

        assert_eq!(IndexFile::new(dir.join("index_server.dat")).get().unwrap(), 9);
    }

    #[test]
    fn reconcile_deletes_message_files_past_writer_index() {
        let (_dir, data_dir) = fixture();
        let dir = data_dir.spool_dir(QUEUE_BLOCK_CHANGE);
        let mut writer = FileQueueWriter::new(&dir).unwrap();
        writer.write(b"a").unwrap();
        writer.flush().unwrap();
        writer.write(b"dangling").unwrap(); // never flushed

        reconcile_spool_queues(&data_dir).unwrap();

        assert!(dir.join(catapult_fq::message_file_name(0)).exists());
        assert!(!dir.join(catapult_fq::message_file_name(1)).exists());
    }

    #[derive(Default)]
    struct RecordingBlockChange {
        blocks: Vec<catapult_core::BlockElement>,
        drops: Vec<Height>,
    }
    impl BlockChangeSubscriber for RecordingBlockChange {
        type Error = SubscriberError;
        fn notify_block(&mut self, element: &catapult_core::BlockElement) -> Result<(), Self::Error> {
            self.blocks.push(element.clone());
            Ok(())
        }
        fn notify_drop_blocks_after(&mut self, height: Height) -> Result<(), Self::Error> {
            self.drops.push(height);
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingUt {
        adds: Vec<TransactionInfo>,
    }
    impl UtChangeSubscriber for RecordingUt {
        type Error = SubscriberError;
        fn notify_adds(&mut self, infos: &[TransactionInfo]) -> Result<(), Self::Error> {
            self.adds.extend_from_slice(infos);
            Ok(())
        }
        fn notify_removes(&mut self, _infos: &[TransactionInfo]) -> Result<(), Self::Error> {
            Ok(())
        }
        fn flush(&mut self) -> Result<(), Self::Error> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingPt {
        cosignatures: u32,
    }
    impl PtChangeSubscriber for RecordingPt {
        type Error = SubscriberError;
        fn notify_add_partials(&mut self, _infos: &[TransactionInfo]) -> Result<(), Self::Error> {
            Ok(())
        }
        fn notify_add_cosignature(
            &mut self,
            _parent_hash: Hash32,
            _cosignature: Cosignature,
        ) -> Result<(), Self::Error> {
            self.cosignatures += 1;
            Ok(())
        }
        fn notify_remove_partials(&mut self, _infos: &[TransactionInfo]) -> Result<(), Self::Error> {
            Ok(())
        }
        fn flush(&mut self) -> Result<(), Self::Error> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingFinalization {
        seen: Vec<(FinalizationRound, Height, Hash32)>,
    }
    impl FinalizationSubscriber for RecordingFinalization {
        type Error = SubscriberError;
        fn notify_finalized_block(
            &mut self,
            round: FinalizationRound,
            height: Height,
            hash: Hash32,
        ) -> Result<(), Self::Error> {
            self.seen.push((round, height, hash));
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingStatus {
        seen: Vec<(TransactionInfo, u32)>,
    }
    impl TransactionStatusSubscriber for RecordingStatus {
        type Error = SubscriberError;
        fn notify_status(
            &mut self,
            info: &TransactionInfo,
            status_code: u32,
        ) -> Result<(), Self::Error> {
            self.seen.push((info.clone(), status_code));
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingStateChange {
        seen: Vec<StateChangeInfo>,
    }
    impl StateChangeSubscriber for RecordingStateChange {
        type Error = SubscriberError;
        fn notify_score_change(&mut self, score: ChainScore) -> Result<(), Self::Error> {
            self.seen.push(StateChangeInfo::ScoreChange(score));
            Ok(())
        }
        fn notify_state_change(&mut self, info: &StateChangeInfo) -> Result<(), Self::Error> {
            self.seen.push(info.clone());
            Ok(())
        }
    }

    #[test]
    fn replay_subscribers_catches_up_every_family_and_advances_reader_index() {
        let (_dir, data_dir) = fixture();
        let factory = SpoolSubscriberFactory::new(data_dir.clone());

        factory
            .block_change()
            .unwrap()
            .notify_block(&catapult_core::BlockElement::new(1, vec![9], Hash32::ZERO))
            .unwrap();

        let registry = CacheChangesRegistry::builder().build();
        let mut block_change = RecordingBlockChange::default();
        let mut ut_change = RecordingUt::default();
        let mut pt_change = RecordingPt::default();
        let mut finalization = RecordingFinalization::default();
        let mut transaction_status = RecordingStatus::default();
        let mut state_change = RecordingStateChange::default();

        let mut subscribers = RecoverySubscribers {
            block_change: &mut block_change,
            ut_change: &mut ut_change,
            pt_change: &mut pt_change,
            finalization: &mut finalization,
            transaction_status: &mut transaction_status,
            state_change: &mut state_change,
        };

        replay_subscribers(&data_dir, &registry, &mut subscribers).unwrap();

        assert_eq!(block_change.blocks.len(), 1);
        assert_eq!(block_change.blocks[0].height, 1);

        let reader_index = IndexFile::new(
            data_dir
                .spool_dir(QUEUE_BLOCK_CHANGE)
                .join("index_broker_r.dat"),
        );
        assert_eq!(reader_index.get().unwrap(), 1);
    }

    #[test]
    fn recover_runs_all_steps_in_order() {
        let (_dir, data_dir) = fixture();
        let state = StateStorage::new(data_dir.root());
        state.save(1, ChainScore::default(), &[]).unwrap();

        let registry = CacheChangesRegistry::builder().build();
        let mut block_change = RecordingBlockChange::default();
        let mut ut_change = RecordingUt::default();
        let mut pt_change = RecordingPt::default();
        let mut finalization = RecordingFinalization::default();
        let mut transaction_status = RecordingStatus::default();
        let mut state_change = RecordingStateChange::default();
        let mut subscribers = RecoverySubscribers {
            block_change: &mut block_change,
            ut_change: &mut ut_change,
            pt_change: &mut pt_change,
            finalization: &mut finalization,
            transaction_status: &mut transaction_status,
            state_change: &mut state_change,
        };

        let orchestrator = RecoveryOrchestrator::new(data_dir.clone());
        orchestrator.recover(&registry, &mut subscribers).unwrap();

        assert!(!state.state_tmp_dir().exists());
        assert!(!data_dir.root().join("commit_step.dat").exists());
    }

    #[test]
    fn recover_skips_reconciliation_on_a_clean_shutdown() {
        let (_dir, data_dir) = fixture();

        // no commit_step.dat: the previous shutdown was clean. A dangling
        // message file past the writer index should survive untouched,
        // since step 1 routes straight to step 4 without running step 2.
        let queue_dir = data_dir.spool_dir(QUEUE_BLOCK_CHANGE);
        let mut writer = FileQueueWriter::new(&queue_dir).unwrap();
        writer.write(b"never-flushed").unwrap();

        let registry = CacheChangesRegistry::builder().build();
        let mut block_change = RecordingBlockChange::default();
        let mut ut_change = RecordingUt::default();
        let mut pt_change = RecordingPt::default();
        let mut finalization = RecordingFinalization::default();
        let mut transaction_status = RecordingStatus::default();
        let mut state_change = RecordingStateChange::default();
        let mut subscribers = RecoverySubscribers {
            block_change: &mut block_change,
            ut_change: &mut ut_change,
            pt_change: &mut pt_change,
            finalization: &mut finalization,
            transaction_status: &mut transaction_status,
            state_change: &mut state_change,
        };

        let orchestrator = RecoveryOrchestrator::new(data_dir.clone());
        orchestrator.recover(&registry, &mut subscribers).unwrap();

        assert!(queue_dir.join(catapult_fq::message_file_name(0)).exists());
    }
}
