use thiserror::Error;

/// Errors raised while parsing or assembling the node's on-wire / on-disk
/// message formats (§6.1).
///
/// Any discriminant outside the range a format defines is a fatal corruption
/// per spec §7 ("Corruption"): callers must not guess at recovery and should
/// propagate this unchanged.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("unexpected end of message while decoding {0}")]
    Truncated(&'static str),

    #[error("invalid discriminant {value} while decoding {context}")]
    InvalidDiscriminant { context: &'static str, value: u8 },

    #[error("unknown cache id {0} while decoding state change payload")]
    UnknownCacheId(u32),

    #[error("io error")]
    Io(#[from] std::io::Error),
}
