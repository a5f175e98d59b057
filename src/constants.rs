//! Core constants shared by pools, bitsets and tries.

/// Sentinel value for an empty/null slot index.
///
/// Used to indicate:
/// - End of the intrusive free list in a slot pool
/// - Empty child slot in an index-mode trie node
/// - The index counterpart of a null pointer in index/pointer translation
pub const EMPTY: u32 = u32::MAX;

/// Smallest element a slot pool can manage (room for the free-list link).
pub const MIN_ELEMENT_SIZE: usize = 4;

/// Number of bits in one bitset word.
pub const WORD_BITS: u64 = 32;

/// log2(WORD_BITS), the per-level reduction shift of the hierarchical bitset.
pub const WORD_SHIFT: u32 = 5;

/// Maximum number of levels in a hierarchical bitset (32^7 = 2^35 bits).
pub const MAX_LEVELS: usize = 7;

/// Maximum number of bits a hierarchical bitset can track.
pub const MAX_BITS: u64 = 1u64 << (WORD_SHIFT as u64 * MAX_LEVELS as u64);

/// Number of children per trie node (2^2 = 4).
pub const NODE_CHILDREN: usize = 4;

/// Number of key bits consumed per trie level.
pub const BITS_PER_LEVEL: usize = 2;

/// Maximum depth of a trie (64 key bits / 2 bits per level).
pub const MAX_DEPTH: usize = 64 / BITS_PER_LEVEL;
