//! Iterator support for Trie traversal.
//!
//! Depth-first walk over the nodes, children visited in group order. Each
//! level keeps a copy of its node and the next child slot to try, so the
//! walk needs no allocation and at most `MAX_DEPTH` frames.

use crate::constants::MAX_DEPTH;
use crate::key::KeyAccess;
use crate::pool::SlotRef;
use crate::trie::{Node, Trie};

/// Iterator over `(key, value)` pairs.
///
/// Keys are read back from the values through the key accessor. In index
/// mode pairs come out in ascending key order; in mask mode they are
/// ordered by the routed key bits.
///
/// # Performance
/// - O(1) amortized per value
/// - One node load per visited node
///
/// # Example
/// ```rust
/// use dexed::key::PoolKeys;
/// use dexed::pool::SlotPool;
/// use dexed::trie::{IndexTrie, TrieConfig};
///
/// let nodes = SlotPool::new(16, 16).unwrap();
/// let values = PoolKeys::new(SlotPool::new(8, 4).unwrap(), 0).unwrap();
/// let mut trie = IndexTrie::new(nodes, values, TrieConfig::from_index(64)).unwrap();
///
/// for key in [30, 10, 20] {
///     let v = trie.key_access_mut().pool_mut().allocate().unwrap();
///     trie.add(key, v);
/// }
///
/// let keys: Vec<u64> = trie.iter().map(|(key, _)| key).collect();
/// assert_eq!(keys, vec![10, 20, 30]);
/// ```
pub struct Iter<'a, R: SlotRef, K: KeyAccess<R>> {
    trie: &'a Trie<R, K>,

    /// Node at each level of the current path and the next slot to visit.
    stack: [(Node<R>, usize); MAX_DEPTH],

    /// Number of frames in use (0 = exhausted).
    height: usize,
}

impl<'a, R: SlotRef, K: KeyAccess<R>> Iter<'a, R, K> {
    pub(crate) fn new(trie: &'a Trie<R, K>) -> Self {
        let mut iter = Iter {
            trie,
            stack: [(Node::new(), 0); MAX_DEPTH],
            height: 0,
        };
        match trie.load(trie.root()) {
            Ok(root) => {
                iter.stack[0] = (root, 0);
                iter.height = 1;
            }
            Err(err) => tracing::warn!(%err, "trie iteration aborted"),
        }
        iter
    }
}

impl<R: SlotRef, K: KeyAccess<R>> Iterator for Iter<'_, R, K> {
    type Item = (u64, R);

    fn next(&mut self) -> Option<Self::Item> {
        let depth = self.trie.depth();
        while self.height > 0 {
            let (node, from) = self.stack[self.height - 1];
            let slot = match node.next_child(from) {
                Some(slot) => slot,
                None => {
                    self.height -= 1;
                    continue;
                }
            };
            self.stack[self.height - 1].1 = slot + 1;

            let child = node.get_child(slot);
            if self.height == depth {
                return Some((self.trie.key_access().get_key(child), child));
            }

            match self.trie.load(child) {
                Ok(below) => {
                    self.stack[self.height] = (below, 0);
                    self.height += 1;
                }
                Err(err) => {
                    tracing::warn!(%err, "trie iteration aborted");
                    self.height = 0;
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use crate::key::PoolKeys;
    use crate::pool::{SlotPool, SlotPtr};
    use crate::trie::{IndexTrie, Node, PtrTrie, TrieConfig};
    use alloc::vec::Vec;

    fn index_trie(config: TrieConfig) -> IndexTrie<PoolKeys> {
        let nodes = SlotPool::new(Node::<u32>::SIZE, 512).unwrap();
        let values = PoolKeys::new(SlotPool::new(8, 512).unwrap(), 0).unwrap();
        IndexTrie::new(nodes, values, config).unwrap()
    }

    #[test]
    fn test_iter_empty() {
        let trie = index_trie(TrieConfig::from_index(16));
        assert_eq!(trie.iter().count(), 0);
    }

    #[test]
    fn test_iter_ascending_in_index_mode() {
        let mut trie = index_trie(TrieConfig::from_index(1000));
        let keys = [999u64, 0, 512, 3, 64, 65];
        for &key in &keys {
            let v = trie.key_access_mut().pool_mut().allocate().unwrap();
            assert!(trie.add(key, v));
        }

        let walked: Vec<u64> = trie.iter().map(|(key, _)| key).collect();
        assert_eq!(walked, [0, 3, 64, 65, 512, 999]);
    }

    #[test]
    fn test_iter_yields_stored_values() {
        let mut trie = index_trie(TrieConfig::from_mask(0xF0F0));
        let mut expected = Vec::new();
        for key in [0x1020u64, 0x10A0, 0xF000] {
            let v = trie.key_access_mut().pool_mut().allocate().unwrap();
            trie.add(key, v);
            expected.push((key, v));
        }

        let walked: Vec<(u64, u32)> = (&trie).into_iter().collect();
        assert_eq!(walked, expected);
    }

    #[test]
    fn test_iter_single_level() {
        let mut trie = index_trie(TrieConfig::from_index(4));
        for key in [3u64, 1] {
            let v = trie.key_access_mut().pool_mut().allocate().unwrap();
            trie.add(key, v);
        }
        let walked: Vec<u64> = trie.iter().map(|(key, _)| key).collect();
        assert_eq!(walked, [1, 3]);
    }

    #[test]
    fn test_iter_pointer_trie() {
        let nodes = SlotPool::new(Node::<SlotPtr>::SIZE, 64).unwrap();
        let values = PoolKeys::new(SlotPool::new(8, 8).unwrap(), 0).unwrap();
        let mut trie = PtrTrie::new(nodes, values, TrieConfig::from_index(256)).unwrap();

        for key in [200u64, 7] {
            let index = trie.key_access_mut().pool_mut().allocate().unwrap();
            let ptr = trie.key_access().pool().idx2ptr(index).unwrap();
            trie.add(key, ptr);
        }

        let walked: Vec<u64> = trie.iter().map(|(key, _)| key).collect();
        assert_eq!(walked, [7, 200]);
    }
}
