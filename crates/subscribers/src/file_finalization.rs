use catapult_core::{
    decode_finalization, encode_finalization, FinalizationRound, FinalizationSubscriber, Hash32,
    Height,
};
use catapult_fq::FileQueueWriter;

use crate::error::SubscriberError;

/// Parses one `finalization` message and replays it into `subscriber` (§4.8
/// step 3).
pub fn apply_finalization_message<S>(
    bytes: &[u8],
    subscriber: &mut S,
) -> Result<(), SubscriberError>
where
    S: FinalizationSubscriber<Error = SubscriberError>,
{
    let (round, height, hash) = decode_finalization(&mut &bytes[..])?;
    subscriber.notify_finalized_block(round, height, hash)
}

/// Writes `finalization` messages, one per notification, published
/// immediately (§4.5, §6.1).
pub struct FileFinalizationSubscriber {
    writer: FileQueueWriter,
}

impl FileFinalizationSubscriber {
    pub fn new(writer: FileQueueWriter) -> Self {
        Self { writer }
    }
}

impl FinalizationSubscriber for FileFinalizationSubscriber {
    type Error = SubscriberError;

    fn notify_finalized_block(
        &mut self,
        round: FinalizationRound,
        height: Height,
        hash: Hash32,
    ) -> Result<(), Self::Error> {
        let mut buf = Vec::new();
        encode_finalization(round, height, hash, &mut buf)?;
        self.writer.write(&buf)?;
        self.writer.flush()?;
        Ok(())
    }
}
