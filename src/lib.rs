//! # dexed
//!
//! Indexed memory structures for memory-constrained targets.
//!
//! ## Features
//! - Fixed-size slot pools with stable 32-bit indices and O(1)
//!   index/pointer translation
//! - Hierarchical bitsets over up to 2^35 bits with O(log32 N) search
//! - Masked radix trie mapping 64-bit keys to slot indices or pointers,
//!   backed by a slot pool
//! - Every structure takes its storage explicitly; no global allocators
//! - no_std compatible (requires alloc)
//!
//! ## Example
//! ```rust
//! use dexed::key::PoolKeys;
//! use dexed::pool::SlotPool;
//! use dexed::trie::{IndexTrie, TrieConfig};
//!
//! let nodes = SlotPool::new(16, 341).unwrap();
//! let values = PoolKeys::new(SlotPool::new(8, 1024).unwrap(), 0).unwrap();
//! let mut trie = IndexTrie::new(nodes, values, TrieConfig::from_index(1024)).unwrap();
//!
//! for key in 0..1024 {
//!     let v = trie.key_access_mut().pool_mut().allocate().unwrap();
//!     assert!(trie.add(key, v));
//! }
//! assert_eq!(trie.node_count(), 341);
//! ```

#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod bitmap;
pub mod constants;
pub mod error;
pub mod key;
pub mod pool;
pub mod trie;

#[cfg(test)]
mod proptests;

pub use bitmap::HiBitset;
pub use error::{BitsetError, Error, PoolError, Result, TrieError};
pub use key::{KeyAccess, PoolKeys};
pub use pool::{SlotPool, SlotPtr, SlotRef};
pub use trie::{IndexTrie, PtrTrie, Trie, TrieConfig};
