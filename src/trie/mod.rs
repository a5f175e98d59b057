//! Masked radix trie: node structure, key layout and main API.

mod basic;
mod config;
mod iter;
mod node;
mod state;
#[allow(clippy::module_inception)]
mod trie;

pub use config::{KeyLayout, TrieConfig};
pub use iter::Iter;
pub use node::Node;
pub use trie::{IndexTrie, PtrTrie, Trie};
