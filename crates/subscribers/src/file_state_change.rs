use catapult_core::{encode_state_change_info, ChainScore, StateChangeInfo, StateChangeSubscriber};
use catapult_fq::{FileQueueWriter, IndexFile};

use crate::error::SubscriberError;

/// Writes `state_change` messages, one per notification, published
/// immediately (§4.5, §6.1, §3.6).
///
/// `state_change` is the one queue that carries a secondary writer index,
/// `index_server.dat` (§3.2, Open Question #3 in `DESIGN.md`): the node
/// advances it to match the primary writer index once a commit-step
/// transaction's step 7 has finished writing to every spool queue, marking
/// these messages as handed off to the broker rather than merely durable.
pub struct FileStateChangeSubscriber {
    writer: FileQueueWriter,
    secondary_index: IndexFile,
}

impl FileStateChangeSubscriber {
    pub fn new(writer: FileQueueWriter, secondary_index: IndexFile) -> Self {
        Self {
            writer,
            secondary_index,
        }
    }

    /// Advances `index_server.dat` to the current writer position, marking
    /// every message written so far as visible to the broker.
    pub fn mark_visible(&self) -> Result<(), SubscriberError> {
        let current = self.writer.writer_index()?;
        self.secondary_index.set(current)?;
        Ok(())
    }
}

impl StateChangeSubscriber for FileStateChangeSubscriber {
    type Error = SubscriberError;

    fn notify_score_change(&mut self, score: ChainScore) -> Result<(), Self::Error> {
        self.notify_state_change(&StateChangeInfo::ScoreChange(score))
    }

    fn notify_state_change(&mut self, info: &StateChangeInfo) -> Result<(), Self::Error> {
        let mut buf = Vec::new();
        encode_state_change_info(info, &mut buf)?;
        self.writer.write(&buf)?;
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catapult_fq::FileQueueReader;

    #[test]
    fn notify_score_change_publishes_and_mark_visible_advances_secondary_index() {
        let dir = tempfile::tempdir().unwrap();
        let secondary_index = IndexFile::new(dir.path().join("index_server.dat"));
        let mut subscriber = FileStateChangeSubscriber::new(
            FileQueueWriter::new(dir.path()).unwrap(),
            secondary_index,
        );

        subscriber
            .notify_score_change(ChainScore::new(1, 0))
            .unwrap();
        subscriber.mark_visible().unwrap();

        let reader = FileQueueReader::new(dir.path()).unwrap();
        assert_eq!(reader.pending().unwrap(), 1);
        assert_eq!(
            IndexFile::new(dir.path().join("index_server.dat"))
                .get()
                .unwrap(),
            1
        );
    }
}
