use std::io::{Read, Write};

use crate::ProtocolError;

/// A 128-bit chain score, expressed as two little-endian u64 words (§3.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct ChainScore {
    pub high: u64,
    pub low: u64,
}

impl ChainScore {
    pub fn new(high: u64, low: u64) -> Self {
        Self { high, low }
    }

    pub fn write_to<W: Write>(&self, out: &mut W) -> Result<(), ProtocolError> {
        out.write_all(&self.high.to_le_bytes())?;
        out.write_all(&self.low.to_le_bytes())?;
        Ok(())
    }

    pub fn read_from<R: Read>(input: &mut R) -> Result<Self, ProtocolError> {
        let mut high_bytes = [0u8; 8];
        let mut low_bytes = [0u8; 8];

        input
            .read_exact(&mut high_bytes)
            .map_err(|_| ProtocolError::Truncated("chain score high word"))?;
        input
            .read_exact(&mut low_bytes)
            .map_err(|_| ProtocolError::Truncated("chain score low word"))?;

        Ok(Self {
            high: u64::from_le_bytes(high_bytes),
            low: u64::from_le_bytes(low_bytes),
        })
    }
}
