use std::io::Read;

use catapult_core::{
    decode_transaction_info, encode_transaction_info, ProtocolError, TransactionInfo,
    UtChangeSubscriber,
};
use catapult_fq::FileQueueWriter;

use crate::error::SubscriberError;

const OP_ADDS: u8 = 0;
const OP_REMOVES: u8 = 1;

/// Parses one `unconfirmed_transactions_change` message and replays every
/// batch it contains into `subscriber`, followed by one `flush()` (a message
/// may hold several notify calls accumulated before the publishing flush,
/// §4.5). Used by the recovery orchestrator (§4.8 step 3).
pub fn apply_ut_change_message<S>(bytes: &[u8], subscriber: &mut S) -> Result<(), SubscriberError>
where
    S: UtChangeSubscriber<Error = SubscriberError>,
{
    let mut input = bytes;
    while !input.is_empty() {
        let mut op = [0u8; 1];
        input
            .read_exact(&mut op)
            .map_err(|_| ProtocolError::Truncated("ut change op"))?;

        let mut count_bytes = [0u8; 4];
        input
            .read_exact(&mut count_bytes)
            .map_err(|_| ProtocolError::Truncated("ut change count"))?;
        let count = u32::from_le_bytes(count_bytes);

        let mut infos = Vec::with_capacity(count as usize);
        for _ in 0..count {
            infos.push(decode_transaction_info(&mut input)?);
        }

        match op[0] {
            OP_ADDS => subscriber.notify_adds(&infos)?,
            OP_REMOVES => subscriber.notify_removes(&infos)?,
            other => {
                return Err(ProtocolError::InvalidDiscriminant {
                    context: "ut change",
                    value: other,
                }
                .into())
            }
        }
    }
    subscriber.flush()
}

/// Writes `unconfirmed_transactions_change` messages. Several notify calls
/// may accumulate into the same open message file; `flush()` is the caller's
/// explicit signal to publish them as one message (§4.5).
pub struct FileUtChangeSubscriber {
    writer: FileQueueWriter,
}

impl FileUtChangeSubscriber {
    pub fn new(writer: FileQueueWriter) -> Self {
        Self { writer }
    }

    fn write_batch(&mut self, op: u8, infos: &[TransactionInfo]) -> Result<(), SubscriberError> {
        let mut buf = vec![op];
        let count: u32 = infos.len().try_into().unwrap_or(u32::MAX);
        buf.extend_from_slice(&count.to_le_bytes());
        for info in infos {
            encode_transaction_info(info, &mut buf)?;
        }
        self.writer.write(&buf)?;
        Ok(())
    }
}

impl UtChangeSubscriber for FileUtChangeSubscriber {
    type Error = SubscriberError;

    fn notify_adds(&mut self, infos: &[TransactionInfo]) -> Result<(), Self::Error> {
        self.write_batch(OP_ADDS, infos)
    }

    fn notify_removes(&mut self, infos: &[TransactionInfo]) -> Result<(), Self::Error> {
        self.write_batch(OP_REMOVES, infos)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(self.writer.flush()?)
    }
}
