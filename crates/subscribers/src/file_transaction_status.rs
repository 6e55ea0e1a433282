use catapult_core::{
    decode_transaction_status, encode_transaction_status, TransactionInfo,
    TransactionStatusSubscriber,
};
use catapult_fq::FileQueueWriter;

use crate::error::SubscriberError;

/// Parses one `transaction_status` message and replays it into `subscriber`
/// (§4.8 step 3).
pub fn apply_transaction_status_message<S>(
    bytes: &[u8],
    subscriber: &mut S,
) -> Result<(), SubscriberError>
where
    S: TransactionStatusSubscriber<Error = SubscriberError>,
{
    let (info, status_code) = decode_transaction_status(&mut &bytes[..])?;
    subscriber.notify_status(&info, status_code)
}

/// Writes `transaction_status` messages, one per notification, published
/// immediately (§4.5, §6.1).
pub struct FileTransactionStatusSubscriber {
    writer: FileQueueWriter,
}

impl FileTransactionStatusSubscriber {
    pub fn new(writer: FileQueueWriter) -> Self {
        Self { writer }
    }
}

impl TransactionStatusSubscriber for FileTransactionStatusSubscriber {
    type Error = SubscriberError;

    fn notify_status(
        &mut self,
        info: &TransactionInfo,
        status_code: u32,
    ) -> Result<(), Self::Error> {
        let mut buf = Vec::new();
        encode_transaction_status(info, status_code, &mut buf)?;
        self.writer.write(&buf)?;
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catapult_core::Hash32;
    use catapult_fq::FileQueueReader;

    #[test]
    fn notify_status_publishes_immediately() {
        let dir = tempfile::tempdir().unwrap();
        let mut subscriber =
            FileTransactionStatusSubscriber::new(FileQueueWriter::new(dir.path()).unwrap());

        let info = TransactionInfo {
            hash: Hash32([9u8; 32]),
            transaction: vec![1],
        };
        subscriber.notify_status(&info, 7).unwrap();

        let mut reader = FileQueueReader::new(dir.path()).unwrap();
        assert_eq!(reader.pending().unwrap(), 1);
    }

    struct RecordingSubscriber {
        seen: Vec<(TransactionInfo, u32)>,
    }

    impl TransactionStatusSubscriber for RecordingSubscriber {
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

    #[test]
    fn apply_message_replays_decoded_status() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer =
            FileTransactionStatusSubscriber::new(FileQueueWriter::new(dir.path()).unwrap());
        let info = TransactionInfo {
            hash: Hash32([2u8; 32]),
            transaction: vec![5, 6],
        };
        writer.notify_status(&info, 404).unwrap();

        let mut reader = FileQueueReader::new(dir.path()).unwrap();
        let mut replayed = RecordingSubscriber { seen: Vec::new() };
        assert!(reader
            .try_read_next(|bytes| {
                apply_transaction_status_message(bytes, &mut replayed)
                    .map_err(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync>)
            })
            .unwrap());

        assert_eq!(replayed.seen, vec![(info, 404)]);
    }
}
