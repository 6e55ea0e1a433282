use std::io::{Read, Write};

use crate::{ChainScore, Height, ProtocolError};

const DISCRIMINANT_SCORE_CHANGE: u8 = 0;
const DISCRIMINANT_STATE_CHANGE: u8 = 1;

/// The serialized delta of a single sub-cache, keyed by its registered id.
/// The byte payload is opaque here; only the owning cache knows how to
/// apply it (§4.5, component G).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheChanges(pub Vec<(u32, Vec<u8>)>);

impl CacheChanges {
    pub fn push(&mut self, cache_id: u32, payload: Vec<u8>) {
        self.0.push((cache_id, payload));
    }
}

/// A single `state_change` message: either a chain-score update or a full
/// set of per-cache deltas at a height (§6.1).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateChangeInfo {
    ScoreChange(ChainScore),
    StateChange { height: Height, changes: CacheChanges },
}

/// The fixed set of cache ids a running node's subscribers know how to
/// decode, built once at startup and never mutated afterwards. Recovery and
/// the state-change reader reject any payload whose cache id isn't
/// registered rather than skip it silently (§7, Corruption).
#[derive(Debug, Clone)]
pub struct CacheChangesRegistry {
    names: Vec<(u32, &'static str)>,
}

impl CacheChangesRegistry {
    pub fn builder() -> CacheChangesRegistryBuilder {
        CacheChangesRegistryBuilder { names: Vec::new() }
    }

    pub fn contains(&self, cache_id: u32) -> bool {
        self.names.iter().any(|(id, _)| *id == cache_id)
    }

    pub fn name(&self, cache_id: u32) -> Option<&'static str> {
        self.names
            .iter()
            .find(|(id, _)| *id == cache_id)
            .map(|(_, name)| *name)
    }
}

pub struct CacheChangesRegistryBuilder {
    names: Vec<(u32, &'static str)>,
}

impl CacheChangesRegistryBuilder {
    pub fn register(mut self, cache_id: u32, name: &'static str) -> Self {
        self.names.push((cache_id, name));
        self
    }

    pub fn build(self) -> CacheChangesRegistry {
        CacheChangesRegistry { names: self.names }
    }
}

pub fn encode_state_change_info<W: Write>(
    info: &StateChangeInfo,
    out: &mut W,
) -> Result<(), ProtocolError> {
    match info {
        StateChangeInfo::ScoreChange(score) => {
            out.write_all(&[DISCRIMINANT_SCORE_CHANGE])?;
            score.write_to(out)?;
        }
        StateChangeInfo::StateChange { height, changes } => {
            out.write_all(&[DISCRIMINANT_STATE_CHANGE])?;
            out.write_all(&height.to_le_bytes())?;

            let count: u32 = changes
                .0
                .len()
                .try_into()
                .map_err(|_| ProtocolError::Truncated("too many cache changes for u32 count"))?;
            out.write_all(&count.to_le_bytes())?;

            for (cache_id, payload) in &changes.0 {
                out.write_all(&cache_id.to_le_bytes())?;
                let len: u32 = payload
                    .len()
                    .try_into()
                    .map_err(|_| ProtocolError::Truncated("cache payload too large for u32 len"))?;
                out.write_all(&len.to_le_bytes())?;
                out.write_all(payload)?;
            }
        }
    }
    Ok(())
}

/// Decodes a `state_change` message, validating every cache id against
/// `registry`. An unregistered id is a corrupt or unsupported payload and is
/// rejected rather than skipped (§7).
pub fn decode_state_change_info<R: Read>(
    input: &mut R,
    registry: &CacheChangesRegistry,
) -> Result<StateChangeInfo, ProtocolError> {
    let mut discriminant = [0u8; 1];
    input
        .read_exact(&mut discriminant)
        .map_err(|_| ProtocolError::Truncated("state change discriminant"))?;

    match discriminant[0] {
        DISCRIMINANT_SCORE_CHANGE => {
            let score = ChainScore::read_from(input)?;
            Ok(StateChangeInfo::ScoreChange(score))
        }
        DISCRIMINANT_STATE_CHANGE => {
            let mut height_bytes = [0u8; 8];
            input
                .read_exact(&mut height_bytes)
                .map_err(|_| ProtocolError::Truncated("state change height"))?;

            let mut count_bytes = [0u8; 4];
            input
                .read_exact(&mut count_bytes)
                .map_err(|_| ProtocolError::Truncated("state change count"))?;
            let count = u32::from_le_bytes(count_bytes);

            let mut changes = CacheChanges::default();
            for _ in 0..count {
                let mut cache_id_bytes = [0u8; 4];
                input
                    .read_exact(&mut cache_id_bytes)
                    .map_err(|_| ProtocolError::Truncated("cache change id"))?;
                let cache_id = u32::from_le_bytes(cache_id_bytes);

                if !registry.contains(cache_id) {
                    return Err(ProtocolError::UnknownCacheId(cache_id));
                }

                let mut len_bytes = [0u8; 4];
                input
                    .read_exact(&mut len_bytes)
                    .map_err(|_| ProtocolError::Truncated("cache change len"))?;
                let len = u32::from_le_bytes(len_bytes) as usize;

                let mut payload = vec![0u8; len];
                input
                    .read_exact(&mut payload)
                    .map_err(|_| ProtocolError::Truncated("cache change payload"))?;

                changes.push(cache_id, payload);
            }

            Ok(StateChangeInfo::StateChange {
                height: u64::from_le_bytes(height_bytes),
                changes,
            })
        }
        other => Err(ProtocolError::InvalidDiscriminant {
            context: "state change",
            value: other,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> CacheChangesRegistry {
        CacheChangesRegistry::builder()
            .register(1, "account")
            .register(2, "namespace")
            .build()
    }

    #[test]
    fn score_change_round_trips() {
        let info = StateChangeInfo::ScoreChange(ChainScore::new(1, 2));

        let mut buf = Vec::new();
        encode_state_change_info(&info, &mut buf).unwrap();

        let decoded = decode_state_change_info(&mut buf.as_slice(), &registry()).unwrap();
        assert_eq!(decoded, info);
    }

    #[test]
    fn state_change_round_trips() {
        let mut changes = CacheChanges::default();
        changes.push(1, vec![1, 2, 3]);
        changes.push(2, vec![]);

        let info = StateChangeInfo::StateChange { height: 99, changes };

        let mut buf = Vec::new();
        encode_state_change_info(&info, &mut buf).unwrap();

        let decoded = decode_state_change_info(&mut buf.as_slice(), &registry()).unwrap();
        assert_eq!(decoded, info);
    }

    #[test]
    fn rejects_unregistered_cache_id() {
        let mut changes = CacheChanges::default();
        changes.push(77, vec![1]);
        let info = StateChangeInfo::StateChange { height: 1, changes };

        let mut buf = Vec::new();
        encode_state_change_info(&info, &mut buf).unwrap();

        let err = decode_state_change_info(&mut buf.as_slice(), &registry()).unwrap_err();
        assert!(matches!(err, ProtocolError::UnknownCacheId(77)));
    }
}
