//! Error types for pools, bitsets and tries.

use thiserror::Error;

/// Result type alias using the crate-level [`Error`].
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Errors raised by slot pools and general allocators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PoolError {
    #[error("pool exhausted: all {capacity} slots are in use")]
    OutOfMemory { capacity: u32 },

    #[error("index {index} is outside the tracked range (watermark {watermark})")]
    OutOfRange { index: u32, watermark: u32 },

    #[error("pointer does not address a slot of this pool")]
    ForeignPointer,

    #[error("slot {index} is not allocated")]
    NotAllocated { index: u32 },

    #[error("element size {size} is below the 4 byte minimum")]
    ElementTooSmall { size: usize },

    #[error("storage too small: need {needed}, got {actual}")]
    StorageTooSmall { needed: usize, actual: usize },

    #[error("alignment {align} is not a power of two")]
    BadAlignment { align: usize },

    #[error("allocator exhausted: requested {requested} bytes, {remaining} remaining")]
    Exhausted { requested: usize, remaining: usize },
}

/// Errors raised when building a hierarchical bitset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BitsetError {
    #[error("{maxbits} bits exceeds the 2^35 bit limit")]
    TooManyBits { maxbits: u64 },

    #[error("bitset storage too small: need {needed} words, got {actual}")]
    StorageTooSmall { needed: usize, actual: usize },
}

/// Errors raised by the masked radix trie.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TrieError {
    #[error("node pool exhausted: need {needed} nodes, {available} available")]
    OutOfMemory { needed: usize, available: usize },

    #[error("key {key:#x} is already present")]
    DuplicateKey { key: u64 },

    #[error("key {key:#x} is outside the index range (limit {limit})")]
    KeyOutOfRange { key: u64, limit: u64 },

    #[error("key mask selects no bits")]
    EmptyMask,

    #[error("value count must be at least 1")]
    ZeroValueCount,

    #[error("cannot index a null value reference")]
    NullValue,

    #[error("node pool slots of {actual} bytes cannot hold a {needed} byte node")]
    NodeTooLarge { needed: usize, actual: usize },

    #[error(transparent)]
    Pool(#[from] PoolError),
}

/// Crate-level error covering every component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Error {
    #[error(transparent)]
    Pool(#[from] PoolError),

    #[error(transparent)]
    Bitset(#[from] BitsetError),

    #[error(transparent)]
    Trie(#[from] TrieError),
}
