//! Error types

use std::io;

/// Errors returned by `from_bytes`/`TryFrom<&[u8]>` style decoders.
#[derive(Clone, Copy, Debug, Eq, PartialEq, thiserror::Error)]
pub enum DecodeError {
    /// Length of the slice was `< 4` and no algorithm can be parsed
    #[error("no algorithm typecode present")]
    NoAlgorithm,
    /// The parsed algorithm does not match the requested deserialization
    #[error("typecode does not match the expected algorithm")]
    WrongAlgorithm,
    /// The typecode is not registered
    #[error("unknown typecode 0x{0:08x}")]
    UnknownTypecode(u32),
    /// The slice did not contain enough data
    #[error("input too short")]
    TooShort,
    /// The slice contained too much data
    #[error("input too long")]
    TooLong,
    /// The parsed `q` value was too large
    #[error("leaf index out of range")]
    InvalidQ,
    /// The level count of a chain is outside `1..=8`
    #[error("invalid level count {0}")]
    InvalidLevels(u32),
}

/// Errors used throughout this crate.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The hash algorithm name is not recognized.
    #[error("unsupported hash algorithm: {0}")]
    UnsupportedAlgorithm(String),
    /// A caller supplied a malformed value.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// A signature carries the wrong number or size of elements.
    #[error("invalid signature length: expected {expected}, got {got}")]
    InvalidSignatureLength {
        /// Expected length.
        expected: usize,
        /// Actual length.
        got: usize,
    },
    /// Signature and public key reference different parameter sets.
    #[error("signature and public key use incompatible parameters")]
    IncompatibleParameters,
    /// Every leaf of the tree has been used.
    #[error("key exhausted: all one-time keys have been used")]
    Exhausted,
    /// No leaf is reserved; call `reserve` first.
    #[error("no reserved keys left")]
    NoReservedKeys,
    /// The top level of a chain is exhausted.
    #[error("chain exhausted: the top level has no keys left")]
    ChainExhausted,
    /// Internal structure does not add up. The key must not be used further.
    #[error("inconsistent tree state: {0}")]
    InconsistentTreeState(&'static str),
    /// Malformed encoding.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),
    /// Persistence failure.
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
    /// The leaf generation pool could not be started.
    #[error("worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
}

impl Error {
    /// Returns `true` for operational conditions the caller can resolve by
    /// reserving more keys and retrying.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::Exhausted | Error::NoReservedKeys | Error::ChainExhausted
        )
    }

    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Error::InvalidArgument(msg.into())
    }
}

/// Result type used by this crate.
pub type Result<T> = std::result::Result<T, Error>;
