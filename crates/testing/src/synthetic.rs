use catapult_core::{
    BlockBody, BlockElement, CacheChanges, ChainScore, Cosignature, FinalizationRound, Hash32,
    Height, StateChangeInfo, TransactionInfo,
};

/// A small, dependency-free splitmix64 step, good enough to produce
/// deterministic, well-distributed fixture bytes without reaching for a
/// real hash crate this spec has no other use for.
fn splitmix64(seed: u64) -> u64 {
    let mut z = seed.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// A deterministic 32-byte "hash" derived from `seed`, standing in for a
/// real block or transaction hash in fixtures.
pub fn synthetic_hash(seed: u64) -> Hash32 {
    let mut bytes = [0u8; 32];
    let mut state = seed;
    for chunk in bytes.chunks_mut(8) {
        state = splitmix64(state);
        chunk.copy_from_slice(&state.to_le_bytes());
    }
    Hash32(bytes)
}

/// `len` deterministic bytes derived from `seed`.
pub fn synthetic_bytes(seed: u64, len: usize) -> Vec<u8> {
    let mut state = seed;
    (0..len)
        .map(|_| {
            state = splitmix64(state);
            (state & 0xFF) as u8
        })
        .collect()
}

pub fn synthetic_block_body(height: Height, len: usize) -> BlockBody {
    synthetic_bytes(height ^ 0xC0FF_EE00, len)
}

#[derive(Clone, Debug)]
pub struct SyntheticChainConfig {
    pub start_height: Height,
    pub block_count: u64,
    pub body_len: usize,
}

impl Default for SyntheticChainConfig {
    fn default() -> Self {
        Self {
            start_height: 1,
            block_count: 3,
            body_len: 32,
        }
    }
}

/// A deterministic run of consecutive [`BlockElement`]s, the fixture
/// equivalent of the teacher's `build_synthetic_blocks`.
pub fn build_synthetic_chain(cfg: &SyntheticChainConfig) -> Vec<BlockElement> {
    (0..cfg.block_count)
        .map(|offset| {
            let height = cfg.start_height + offset;
            let body = synthetic_block_body(height, cfg.body_len);
            let hash = synthetic_hash(height);
            BlockElement::new(height, body, hash)
        })
        .collect()
}

pub fn synthetic_transaction(seed: u64, body_len: usize) -> TransactionInfo {
    TransactionInfo {
        hash: synthetic_hash(seed),
        transaction: synthetic_bytes(seed ^ 0x7A7A, body_len),
    }
}

pub fn synthetic_score_change(height: Height) -> StateChangeInfo {
    StateChangeInfo::ScoreChange(ChainScore::new(height, height.wrapping_mul(7)))
}

/// A `StateChange` message carrying one deterministic payload per cache id
/// in `cache_ids`.
pub fn synthetic_state_change(height: Height, cache_ids: &[u32]) -> StateChangeInfo {
    let mut changes = CacheChanges::default();
    for &cache_id in cache_ids {
        let payload = synthetic_bytes(height ^ (cache_id as u64) << 32, 16);
        changes.push(cache_id, payload);
    }
    StateChangeInfo::StateChange { height, changes }
}

pub fn synthetic_finalization_round(seed: u64) -> FinalizationRound {
    FinalizationRound {
        epoch: (seed % 1_000) as u32,
        point: ((seed / 1_000) % 1_000) as u32,
    }
}

pub fn synthetic_cosignature(seed: u64) -> Cosignature {
    let mut signer_public_key = [0u8; 32];
    let mut signature = [0u8; 64];
    let mut state = seed;

    for chunk in signer_public_key.chunks_mut(8) {
        state = splitmix64(state);
        chunk.copy_from_slice(&state.to_le_bytes());
    }
    for chunk in signature.chunks_mut(8) {
        state = splitmix64(state);
        chunk.copy_from_slice(&state.to_le_bytes());
    }

    Cosignature {
        signer_public_key,
        signature,
    }
}
