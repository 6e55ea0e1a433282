use std::io::{Read, Write};

use crate::{Hash32, Height, ProtocolError};

/// An opaque transaction together with its hash. Transaction execution,
/// validation and signature verification are external collaborators (§1);
/// this core only moves the encoded bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionInfo {
    pub hash: Hash32,
    pub transaction: Vec<u8>,
}

/// A cosignature attached to a partial (aggregate) transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cosignature {
    pub signer_public_key: [u8; 32],
    pub signature: [u8; 64],
}

/// A finalization round identifier (epoch, point) per §6.1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FinalizationRound {
    pub epoch: u32,
    pub point: u32,
}

/// `32-byte hash | u32 LE length | transaction bytes`, the shared encoding
/// underlying transaction-status messages and the UT/PT change batches.
pub fn encode_transaction_info<W: Write>(
    info: &TransactionInfo,
    out: &mut W,
) -> Result<(), ProtocolError> {
    out.write_all(info.hash.as_bytes())?;
    let len: u32 = info
        .transaction
        .len()
        .try_into()
        .map_err(|_| ProtocolError::Truncated("transaction too large for u32 length"))?;
    out.write_all(&len.to_le_bytes())?;
    out.write_all(&info.transaction)?;
    Ok(())
}

pub fn decode_transaction_info<R: Read>(input: &mut R) -> Result<TransactionInfo, ProtocolError> {
    let mut hash_bytes = [0u8; 32];
    input
        .read_exact(&mut hash_bytes)
        .map_err(|_| ProtocolError::Truncated("transaction hash"))?;

    let mut len_bytes = [0u8; 4];
    input
        .read_exact(&mut len_bytes)
        .map_err(|_| ProtocolError::Truncated("transaction length"))?;
    let len = u32::from_le_bytes(len_bytes) as usize;

    let mut transaction = vec![0u8; len];
    input
        .read_exact(&mut transaction)
        .map_err(|_| ProtocolError::Truncated("transaction body"))?;

    Ok(TransactionInfo {
        hash: Hash32(hash_bytes),
        transaction,
    })
}

/// Transaction-status message: `32-byte hash | u32 LE status code | tx bytes`.
pub fn encode_transaction_status<W: Write>(
    info: &TransactionInfo,
    status_code: u32,
    out: &mut W,
) -> Result<(), ProtocolError> {
    out.write_all(info.hash.as_bytes())?;
    out.write_all(&status_code.to_le_bytes())?;
    out.write_all(&info.transaction)?;
    Ok(())
}

pub fn decode_transaction_status<R: Read>(
    input: &mut R,
) -> Result<(TransactionInfo, u32), ProtocolError> {
    let mut hash_bytes = [0u8; 32];
    input
        .read_exact(&mut hash_bytes)
        .map_err(|_| ProtocolError::Truncated("transaction status hash"))?;

    let mut status_bytes = [0u8; 4];
    input
        .read_exact(&mut status_bytes)
        .map_err(|_| ProtocolError::Truncated("transaction status code"))?;

    let mut transaction = Vec::new();
    input
        .read_to_end(&mut transaction)
        .map_err(|_| ProtocolError::Truncated("transaction status body"))?;

    Ok((
        TransactionInfo {
            hash: Hash32(hash_bytes),
            transaction,
        },
        u32::from_le_bytes(status_bytes),
    ))
}

/// Finalization message: `u32 LE epoch | u32 LE point | u64 LE height | 32-byte hash`.
pub fn encode_finalization<W: Write>(
    round: FinalizationRound,
    height: Height,
    hash: Hash32,
    out: &mut W,
) -> Result<(), ProtocolError> {
    out.write_all(&round.epoch.to_le_bytes())?;
    out.write_all(&round.point.to_le_bytes())?;
    out.write_all(&height.to_le_bytes())?;
    out.write_all(hash.as_bytes())?;
    Ok(())
}

pub fn decode_finalization<R: Read>(
    input: &mut R,
) -> Result<(FinalizationRound, Height, Hash32), ProtocolError> {
    let mut epoch_bytes = [0u8; 4];
    input
        .read_exact(&mut epoch_bytes)
        .map_err(|_| ProtocolError::Truncated("finalization epoch"))?;

    let mut point_bytes = [0u8; 4];
    input
        .read_exact(&mut point_bytes)
        .map_err(|_| ProtocolError::Truncated("finalization point"))?;

    let mut height_bytes = [0u8; 8];
    input
        .read_exact(&mut height_bytes)
        .map_err(|_| ProtocolError::Truncated("finalization height"))?;

    let mut hash_bytes = [0u8; 32];
    input
        .read_exact(&mut hash_bytes)
        .map_err(|_| ProtocolError::Truncated("finalization hash"))?;

    Ok((
        FinalizationRound {
            epoch: u32::from_le_bytes(epoch_bytes),
            point: u32::from_le_bytes(point_bytes),
        },
        u64::from_le_bytes(height_bytes),
        Hash32(hash_bytes),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transaction_info_round_trips() {
        let info = TransactionInfo {
            hash: Hash32([2u8; 32]),
            transaction: vec![1, 2, 3, 4],
        };

        let mut buf = Vec::new();
        encode_transaction_info(&info, &mut buf).unwrap();

        let decoded = decode_transaction_info(&mut buf.as_slice()).unwrap();
        assert_eq!(decoded, info);
    }

    #[test]
    fn transaction_status_round_trips() {
        let info = TransactionInfo {
            hash: Hash32([1u8; 32]),
            transaction: vec![9, 9, 9],
        };

        let mut buf = Vec::new();
        encode_transaction_status(&info, 404, &mut buf).unwrap();

        let (decoded, status) = decode_transaction_status(&mut buf.as_slice()).unwrap();
        assert_eq!(decoded, info);
        assert_eq!(status, 404);
    }

    #[test]
    fn finalization_round_trips() {
        let round = FinalizationRound { epoch: 3, point: 42 };
        let hash = Hash32([8u8; 32]);

        let mut buf = Vec::new();
        encode_finalization(round, 123, hash, &mut buf).unwrap();

        let (decoded_round, height, decoded_hash) =
            decode_finalization(&mut buf.as_slice()).unwrap();
        assert_eq!(decoded_round, round);
        assert_eq!(height, 123);
        assert_eq!(decoded_hash, hash);
    }
}
