use catapult_core::{
    decode_block_element, encode_block_element, BlockChangeSubscriber, BlockElement, Height,
    ProtocolError,
};
use catapult_fq::FileQueueWriter;

use crate::error::SubscriberError;

const OP_NOTIFY_BLOCK: u8 = 0;
const OP_NOTIFY_DROP_BLOCKS_AFTER: u8 = 1;

/// Parses one `block_change` message and replays it into `subscriber`.
/// Used by the recovery orchestrator (§4.8 step 3) and the broker's normal
/// poll loop.
pub fn apply_block_change_message<S>(
    bytes: &[u8],
    subscriber: &mut S,
) -> Result<(), SubscriberError>
where
    S: BlockChangeSubscriber<Error = SubscriberError>,
{
    let (op, rest) = bytes
        .split_first()
        .ok_or(ProtocolError::Truncated("block change op"))?;
    match *op {
        OP_NOTIFY_BLOCK => {
            // height is not carried on the wire; the block's own encoded
            // hash is enough to identify it for replay purposes, so 0 is a
            // placeholder the caller overwrites if it needs the true height.
            let element = decode_block_element(0, &mut &rest[..])?;
            subscriber.notify_block(&element)
        }
        OP_NOTIFY_DROP_BLOCKS_AFTER => {
            let height_bytes: [u8; 8] = rest
                .try_into()
                .map_err(|_| ProtocolError::Truncated("drop blocks after height"))?;
            subscriber.notify_drop_blocks_after(Height::from_le_bytes(height_bytes))
        }
        other => Err(ProtocolError::InvalidDiscriminant {
            context: "block change",
            value: other,
        }
        .into()),
    }
}

/// Writes `block_change` messages. Each notification is one message,
/// published immediately (§4.5, §6.1).
pub struct FileBlockChangeSubscriber {
    writer: FileQueueWriter,
}

impl FileBlockChangeSubscriber {
    pub fn new(writer: FileQueueWriter) -> Self {
        Self { writer }
    }
}

impl BlockChangeSubscriber for FileBlockChangeSubscriber {
    type Error = SubscriberError;

    fn notify_block(&mut self, element: &BlockElement) -> Result<(), Self::Error> {
        let mut buf = vec![OP_NOTIFY_BLOCK];
        encode_block_element(element, &mut buf)?;
        self.writer.write(&buf)?;
        self.writer.flush()?;
        Ok(())
    }

    fn notify_drop_blocks_after(&mut self, height: Height) -> Result<(), Self::Error> {
        let mut buf = vec![OP_NOTIFY_DROP_BLOCKS_AFTER];
        buf.extend_from_slice(&height.to_le_bytes());
        self.writer.write(&buf)?;
        self.writer.flush()?;
        Ok(())
    }
}
