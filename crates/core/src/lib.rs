//! Shared types, traits and errors for the durable core of a Catapult-family
//! blockchain node.
//!
//! Glossary:
//!  - `height`: the 1-indexed block number (block 1 is genesis).
//!  - `commit step`: the three-valued marker that linearises a block import
//!    transaction across block storage, state storage and spool publication.
//!  - `spool`: the directory tree holding all outbound file queues.

pub mod block;
pub mod chain_score;
pub mod commit_step;
pub mod error;
pub mod state_change;
pub mod subscriber;
pub mod transaction;

pub use block::*;
pub use chain_score::*;
pub use commit_step::*;
pub use error::*;
pub use state_change::*;
pub use subscriber::*;
pub use transaction::*;

/// A 1-indexed block number; block 1 is the genesis block.
pub type Height = u64;

/// The monotonic id of a message inside a single file queue.
pub type MessageId = u64;

/// A 32-byte hash (block hash, transaction hash, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Hash32(pub [u8; 32]);

impl Hash32 {
    pub const ZERO: Hash32 = Hash32([0u8; 32]);

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl From<[u8; 32]> for Hash32 {
    fn from(value: [u8; 32]) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for Hash32 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl serde::Serialize for Hash32 {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&hex::encode(self.0))
    }
}

impl<'de> serde::Deserialize<'de> for Hash32 {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let repr = String::deserialize(deserializer)?;
        let bytes = hex::decode(&repr).map_err(serde::de::Error::custom)?;
        let array: [u8; 32] = bytes
            .try_into()
            .map_err(|_| serde::de::Error::custom("expected 32-byte hash"))?;
        Ok(Hash32(array))
    }
}
