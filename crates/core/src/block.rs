use std::io::{Read, Write};

use crate::{Hash32, Height, ProtocolError};

/// The opaque body of a block: consensus, transaction execution and Merkle
/// proofs are external collaborators; this core only moves the bytes.
pub type BlockBody = Vec<u8>;

/// A canonical block at a given height, without its computed hash.
///
/// Plain-block files (§6.1) omit the hash; this is the shape used when a
/// block is staged before its hash has necessarily been recorded alongside
/// it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub height: Height,
    pub body: BlockBody,
}

/// A block together with its computed hash, as stored in the canonical
/// block store and carried in `Notify_Block` messages (§6.1, GLOSSARY).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockElement {
    pub height: Height,
    pub body: BlockBody,
    pub hash: Hash32,
}

impl BlockElement {
    pub fn new(height: Height, body: BlockBody, hash: Hash32) -> Self {
        Self { height, body, hash }
    }

    pub fn without_hash(&self) -> Block {
        Block {
            height: self.height,
            body: self.body.clone(),
        }
    }
}

/// Encodes a plain block file: `u32 LE size` | body bytes.
pub fn encode_block<W: Write>(block: &Block, out: &mut W) -> Result<(), ProtocolError> {
    let size: u32 = block
        .body
        .len()
        .try_into()
        .map_err(|_| ProtocolError::Truncated("block body too large for u32 size prefix"))?;
    out.write_all(&size.to_le_bytes())?;
    out.write_all(&block.body)?;
    Ok(())
}

/// Decodes a plain block file. The height is not carried on the wire; the
/// caller supplies it from the file's position in the sharded layout (§3.4).
pub fn decode_block<R: Read>(height: Height, input: &mut R) -> Result<Block, ProtocolError> {
    let body = read_size_prefixed_body(input)?;
    Ok(Block { height, body })
}

/// Encodes a block-element file: `u32 LE size` | body bytes | 32-byte hash.
pub fn encode_block_element<W: Write>(
    element: &BlockElement,
    out: &mut W,
) -> Result<(), ProtocolError> {
    let size: u32 = element
        .body
        .len()
        .try_into()
        .map_err(|_| ProtocolError::Truncated("block body too large for u32 size prefix"))?;
    out.write_all(&size.to_le_bytes())?;
    out.write_all(&element.body)?;
    out.write_all(element.hash.as_bytes())?;
    Ok(())
}

pub fn decode_block_element<R: Read>(
    height: Height,
    input: &mut R,
) -> Result<BlockElement, ProtocolError> {
    let body = read_size_prefixed_body(input)?;

    let mut hash_bytes = [0u8; 32];
    input
        .read_exact(&mut hash_bytes)
        .map_err(|_| ProtocolError::Truncated("block element hash"))?;

    Ok(BlockElement {
        height,
        body,
        hash: Hash32(hash_bytes),
    })
}

/// Encodes a `BlockElement` for carriage in a `block_change` message:
/// `u64 LE height | u32 LE size | body bytes | 32-byte hash`. Unlike the
/// on-disk block-element file (whose height comes from its shard/seq path),
/// a queue message is read outside any directory context and must carry its
/// own height (§6.1).
pub fn encode_block_element_message<W: Write>(
    element: &BlockElement,
    out: &mut W,
) -> Result<(), ProtocolError> {
    out.write_all(&element.height.to_le_bytes())?;
    encode_block_element(element, out)
}

pub fn decode_block_element_message<R: Read>(input: &mut R) -> Result<BlockElement, ProtocolError> {
    let mut height_bytes = [0u8; 8];
    input
        .read_exact(&mut height_bytes)
        .map_err(|_| ProtocolError::Truncated("block change message height"))?;
    decode_block_element(u64::from_le_bytes(height_bytes), input)
}

fn read_size_prefixed_body<R: Read>(input: &mut R) -> Result<Vec<u8>, ProtocolError> {
    let mut size_bytes = [0u8; 4];
    input
        .read_exact(&mut size_bytes)
        .map_err(|_| ProtocolError::Truncated("block size prefix"))?;
    let size = u32::from_le_bytes(size_bytes) as usize;

    let mut body = vec![0u8; size];
    input
        .read_exact(&mut body)
        .map_err(|_| ProtocolError::Truncated("block body"))?;

    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_round_trips() {
        let block = Block {
            height: 7,
            body: vec![1, 2, 3, 4, 5],
        };

        let mut buf = Vec::new();
        encode_block(&block, &mut buf).unwrap();

        let decoded = decode_block(7, &mut buf.as_slice()).unwrap();
        assert_eq!(block, decoded);
    }

    #[test]
    fn block_element_round_trips() {
        let element = BlockElement {
            height: 12,
            body: vec![0xDE, 0xAD, 0xBE, 0xEF],
            hash: Hash32([7u8; 32]),
        };

        let mut buf = Vec::new();
        encode_block_element(&element, &mut buf).unwrap();

        let decoded = decode_block_element(12, &mut buf.as_slice()).unwrap();
        assert_eq!(element, decoded);
    }

    #[test]
    fn block_element_message_round_trips_with_embedded_height() {
        let element = BlockElement {
            height: 99,
            body: vec![1, 2, 3],
            hash: Hash32([3u8; 32]),
        };

        let mut buf = Vec::new();
        encode_block_element_message(&element, &mut buf).unwrap();

        let decoded = decode_block_element_message(&mut buf.as_slice()).unwrap();
        assert_eq!(element, decoded);
    }

    #[test]
    fn rejects_truncated_body() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&10u32.to_le_bytes());
        buf.extend_from_slice(&[1, 2, 3]); // shorter than declared size

        let err = decode_block(1, &mut buf.as_slice()).unwrap_err();
        assert!(matches!(err, ProtocolError::Truncated(_)));
    }
}
