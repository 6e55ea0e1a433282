use std::io::Read;

use catapult_core::{
    decode_transaction_info, encode_transaction_info, Cosignature, Hash32, PtChangeSubscriber,
    ProtocolError, TransactionInfo,
};
use catapult_fq::FileQueueWriter;

use crate::error::SubscriberError;

const OP_ADD_PARTIALS: u8 = 0;
const OP_ADD_COSIGNATURE: u8 = 1;
const OP_REMOVE_PARTIALS: u8 = 2;

/// Parses one `partial_transactions_change` message and replays every batch
/// or cosignature it contains into `subscriber`, followed by one `flush()`
/// (§4.5, §4.8 step 3), same batching shape as
/// [`apply_ut_change_message`](crate::apply_ut_change_message).
pub fn apply_pt_change_message<S>(bytes: &[u8], subscriber: &mut S) -> Result<(), SubscriberError>
where
    S: PtChangeSubscriber<Error = SubscriberError>,
{
    let mut input = bytes;
    while !input.is_empty() {
        let mut op = [0u8; 1];
        input
            .read_exact(&mut op)
            .map_err(|_| ProtocolError::Truncated("pt change op"))?;

        match op[0] {
            OP_ADD_COSIGNATURE => {
                let mut parent_hash = [0u8; 32];
                input
                    .read_exact(&mut parent_hash)
                    .map_err(|_| ProtocolError::Truncated("pt cosignature parent hash"))?;
                let mut signer_public_key = [0u8; 32];
                input
                    .read_exact(&mut signer_public_key)
                    .map_err(|_| ProtocolError::Truncated("pt cosignature signer key"))?;
                let mut signature = [0u8; 64];
                input
                    .read_exact(&mut signature)
                    .map_err(|_| ProtocolError::Truncated("pt cosignature signature"))?;
                subscriber.notify_add_cosignature(
                    Hash32(parent_hash),
                    Cosignature {
                        signer_public_key,
                        signature,
                    },
                )?;
            }
            OP_ADD_PARTIALS | OP_REMOVE_PARTIALS => {
                let mut count_bytes = [0u8; 4];
                input
                    .read_exact(&mut count_bytes)
                    .map_err(|_| ProtocolError::Truncated("pt change count"))?;
                let count = u32::from_le_bytes(count_bytes);

                let mut infos = Vec::with_capacity(count as usize);
                for _ in 0..count {
                    infos.push(decode_transaction_info(&mut input)?);
                }

                if op[0] == OP_ADD_PARTIALS {
                    subscriber.notify_add_partials(&infos)?;
                } else {
                    subscriber.notify_remove_partials(&infos)?;
                }
            }
            other => {
                return Err(ProtocolError::InvalidDiscriminant {
                    context: "pt change",
                    value: other,
                }
                .into())
            }
        }
    }
    subscriber.flush()
}

/// Writes `partial_transactions_change` messages, accumulating across calls
/// until `flush()` (§4.5), same batching shape as [`FileUtChangeSubscriber`].
///
/// [`FileUtChangeSubscriber`]: crate::FileUtChangeSubscriber
pub struct FilePtChangeSubscriber {
    writer: FileQueueWriter,
}

impl FilePtChangeSubscriber {
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

impl PtChangeSubscriber for FilePtChangeSubscriber {
    type Error = SubscriberError;

    fn notify_add_partials(&mut self, infos: &[TransactionInfo]) -> Result<(), Self::Error> {
        self.write_batch(OP_ADD_PARTIALS, infos)
    }

    fn notify_add_cosignature(
        &mut self,
        parent_hash: Hash32,
        cosignature: Cosignature,
    ) -> Result<(), Self::Error> {
        let mut buf = vec![OP_ADD_COSIGNATURE];
        buf.extend_from_slice(parent_hash.as_bytes());
        buf.extend_from_slice(&cosignature.signer_public_key);
        buf.extend_from_slice(&cosignature.signature);
        self.writer.write(&buf)?;
        Ok(())
    }

    fn notify_remove_partials(&mut self, infos: &[TransactionInfo]) -> Result<(), Self::Error> {
        self.write_batch(OP_REMOVE_PARTIALS, infos)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(self.writer.flush()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catapult_fq::FileQueueReader;

    #[test]
    fn cosignature_and_partials_batch_until_flush() {
        let dir = tempfile::tempdir().unwrap();
        let mut subscriber = FilePtChangeSubscriber::new(FileQueueWriter::new(dir.path()).unwrap());

        let info = TransactionInfo {
            hash: Hash32([2u8; 32]),
            transaction: vec![1, 2],
        };
        subscriber.notify_add_partials(&[info]).unwrap();
        subscriber
            .notify_add_cosignature(
                Hash32([3u8; 32]),
                Cosignature {
                    signer_public_key: [4u8; 32],
                    signature: [5u8; 64],
                },
            )
            .unwrap();
        subscriber.flush().unwrap();

        let mut reader = FileQueueReader::new(dir.path()).unwrap();
        assert_eq!(reader.pending().unwrap(), 1);
    }

    #[derive(Default)]
    struct RecordingSubscriber {
        add_partials: Vec<TransactionInfo>,
        cosignatures: Vec<(Hash32, Cosignature)>,
        remove_partials: Vec<TransactionInfo>,
        flushes: u32,
    }

    impl PtChangeSubscriber for RecordingSubscriber {
        type Error = SubscriberError;

        fn notify_add_partials(&mut self, infos: &[TransactionInfo]) -> Result<(), Self::Error> {
            self.add_partials.extend_from_slice(infos);
            Ok(())
        }

        fn notify_add_cosignature(
            &mut self,
            parent_hash: Hash32,
            cosignature: Cosignature,
        ) -> Result<(), Self::Error> {
            self.cosignatures.push((parent_hash, cosignature));
            Ok(())
        }

        fn notify_remove_partials(&mut self, infos: &[TransactionInfo]) -> Result<(), Self::Error> {
            self.remove_partials.extend_from_slice(infos);
            Ok(())
        }

        fn flush(&mut self) -> Result<(), Self::Error> {
            self.flushes += 1;
            Ok(())
        }
    }

    #[test]
    fn apply_message_replays_partials_and_cosignature_then_flushes() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = FilePtChangeSubscriber::new(FileQueueWriter::new(dir.path()).unwrap());

        let info = TransactionInfo {
            hash: Hash32([6u8; 32]),
            transaction: vec![9],
        };
        writer.notify_add_partials(&[info.clone()]).unwrap();
        writer
            .notify_add_cosignature(
                Hash32([7u8; 32]),
                Cosignature {
                    signer_public_key: [8u8; 32],
                    signature: [9u8; 64],
                },
            )
            .unwrap();
        writer.flush().unwrap();

        let mut reader = FileQueueReader::new(dir.path()).unwrap();
        let mut replayed = RecordingSubscriber::default();
        assert!(reader
            .try_read_next(|bytes| {
                apply_pt_change_message(bytes, &mut replayed)
                    .map_err(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync>)
            })
            .unwrap());

        assert_eq!(replayed.add_partials, vec![info]);
        assert_eq!(replayed.cosignatures.len(), 1);
        assert_eq!(replayed.flushes, 1);
    }
}
