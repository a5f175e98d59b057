//! Main Trie structure mapping 64-bit keys to value references.

use crate::constants::MAX_DEPTH;
use crate::error::TrieError;
use crate::key::KeyAccess;
use crate::pool::{SlotPool, SlotPtr, SlotRef};
use crate::trie::{Iter, KeyLayout, Node, TrieConfig};

/// Masked radix trie over 64-bit keys.
///
/// Maps keys to value references (`R`): slot indices or slot pointers. The
/// trie keeps no keys of its own; each value carries its key, read and
/// written through the key accessor `K`.
///
/// # Architecture
/// - 4-way branching, 2 key bits per level, most significant first
/// - Nodes live in an exclusively owned [`SlotPool`]
/// - The root is allocated at construction and never freed
/// - Nodes below the root are created on insert and freed as soon as they
///   become empty
///
/// # Performance Characteristics
/// - Add / find / remove: O(depth), at most 32 levels
/// - Memory: one `Node::SIZE` slot per non-empty node
///
/// # Example
/// ```rust
/// use dexed::key::PoolKeys;
/// use dexed::pool::SlotPool;
/// use dexed::trie::{IndexTrie, TrieConfig};
///
/// let nodes = SlotPool::new(16, 64).unwrap();
/// let values = PoolKeys::new(SlotPool::new(8, 16).unwrap(), 0).unwrap();
/// let mut trie = IndexTrie::new(nodes, values, TrieConfig::from_index(16)).unwrap();
///
/// let v = trie.key_access_mut().pool_mut().allocate().unwrap();
/// assert!(trie.add(7, v));
/// assert_eq!(trie.find(7), Some(v));
/// assert_eq!(trie.remove(7), Some(v));
/// assert_eq!(trie.find(7), None);
/// ```
#[derive(Debug)]
pub struct Trie<R: SlotRef, K: KeyAccess<R>> {
    /// Node storage; every live slot holds one encoded node.
    nodes: SlotPool,

    /// Reads and writes the keys embedded in values.
    access: K,

    config: TrieConfig,
    layout: KeyLayout,

    root: R,

    /// Number of values stored in the trie.
    len: usize,
}

/// Trie whose references are 32-bit slot indices.
pub type IndexTrie<K> = Trie<u32, K>;

/// Trie whose references are raw slot pointers.
pub type PtrTrie<K> = Trie<SlotPtr, K>;

impl<R: SlotRef, K: KeyAccess<R>> Trie<R, K> {
    /// Create an empty trie.
    ///
    /// The node pool is reset and the root node allocated from it.
    ///
    /// # Arguments
    /// * `nodes` - Pool for internal nodes; slots must hold `Node::<R>::SIZE` bytes
    /// * `access` - Key accessor for the values
    /// * `config` - Mask or index mode options
    ///
    /// # Errors
    /// - `EmptyMask` / `ZeroValueCount` for invalid options
    /// - `NodeTooLarge` if the pool slots are too small for a node
    /// - `Pool(OutOfMemory)` if the pool cannot hold the root
    pub fn new(mut nodes: SlotPool, access: K, config: TrieConfig) -> Result<Self, TrieError> {
        let layout = config.layout()?;
        if nodes.element_size() < Node::<R>::SIZE {
            return Err(TrieError::NodeTooLarge {
                needed: Node::<R>::SIZE,
                actual: nodes.element_size(),
            });
        }

        nodes.reset();
        let mut trie = Trie {
            nodes,
            access,
            config,
            layout,
            root: R::NULL,
            len: 0,
        };
        trie.root = trie.alloc_node(&Node::new())?;

        tracing::debug!(
            depth = layout.depth(),
            routing_bits = layout.bit_count(),
            index_mode = config.uses_index_mode,
            node_capacity = trie.nodes.capacity(),
            "trie initialized"
        );

        Ok(trie)
    }

    /// Insert `value` under `key`.
    ///
    /// Missing nodes on the path are allocated. The key is written into the
    /// value through the key accessor once every check has passed and before
    /// any node is touched.
    ///
    /// # Errors
    /// - `KeyOutOfRange` in index mode for keys past `value_count`
    /// - `NullValue` if `value` is the null reference
    /// - `DuplicateKey` if the terminal slot is occupied
    /// - `OutOfMemory` if the node pool cannot hold the missing nodes
    ///
    /// Nothing is modified when an error is returned.
    ///
    /// # Performance
    /// O(depth)
    pub fn try_add(&mut self, key: u64, value: R) -> Result<(), TrieError> {
        if let Some(limit) = self.layout.limit().filter(|&limit| key >= limit) {
            return Err(TrieError::KeyOutOfRange { key, limit });
        }
        if value.is_null() {
            return Err(TrieError::NullValue);
        }

        let depth = self.layout.depth();

        // Step 1: Follow existing nodes as far as the key goes
        let mut node_ref = self.root;
        let mut node = self.load(node_ref)?;
        let mut level = 0;
        while level + 1 < depth {
            let child = node.get_child(self.layout.child(key, level));
            if child.is_null() {
                break;
            }
            node_ref = child;
            node = self.load(node_ref)?;
            level += 1;
        }

        let slot = self.layout.child(key, level);
        if level + 1 == depth {
            // Step 2a: Full path exists, the terminal slot decides
            if node.has_child(slot) {
                return Err(TrieError::DuplicateKey { key });
            }
            // Key is written before any node changes
            self.access.set_key(value, key);
            node.set_child(slot, value);
            self.store(node_ref, &node)?;
        } else {
            // Step 2b: Reserve every missing node before touching the path
            let needed = depth - 1 - level;
            let available = self.nodes.available() as usize;
            if needed > available {
                tracing::warn!(key, needed, available, "trie node pool exhausted");
                return Err(TrieError::OutOfMemory { needed, available });
            }
            self.access.set_key(value, key);

            // Build the missing chain bottom-up, then attach it
            let mut chain = Node::new();
            chain.set_child(self.layout.child(key, depth - 1), value);
            let mut top = self.alloc_node(&chain)?;
            for below in (level + 1..depth - 1).rev() {
                let mut parent = Node::new();
                parent.set_child(self.layout.child(key, below), top);
                top = self.alloc_node(&parent)?;
            }
            node.set_child(slot, top);
            self.store(node_ref, &node)?;
        }

        self.len += 1;
        tracing::trace!(key, "value added");
        Ok(())
    }

    /// Insert `value` under `key`.
    ///
    /// # Returns
    /// `true` if inserted, `false` if the key was already present, out of
    /// range, or the node pool is exhausted
    pub fn add(&mut self, key: u64, value: R) -> bool {
        match self.try_add(key, value) {
            Ok(()) => true,
            Err(err) => {
                tracing::trace!(key, %err, "add rejected");
                false
            }
        }
    }

    /// Look up the value stored under `key`.
    ///
    /// A value whose embedded key differs from `key` (possible in mask mode
    /// when keys differ only in unrouted bits) is not a match.
    ///
    /// # Errors
    /// Only pool translation errors, which indicate a corrupted node
    ///
    /// # Performance
    /// O(depth), no allocation
    pub fn try_find(&self, key: u64) -> Result<Option<R>, TrieError> {
        if !self.layout.accepts(key) {
            return Ok(None);
        }

        let depth = self.layout.depth();
        let mut node = self.load(self.root)?;
        for level in 0..depth - 1 {
            let child = node.get_child(self.layout.child(key, level));
            if child.is_null() {
                return Ok(None);
            }
            node = self.load(child)?;
        }

        let value = node.get_child(self.layout.child(key, depth - 1));
        if value.is_null() || self.access.get_key(value) != key {
            return Ok(None);
        }
        Ok(Some(value))
    }

    /// Look up the value stored under `key`.
    pub fn find(&self, key: u64) -> Option<R> {
        self.try_find(key).unwrap_or_else(|err| {
            tracing::warn!(key, %err, "find failed");
            None
        })
    }

    /// Check if `key` is present.
    #[inline]
    pub fn contains(&self, key: u64) -> bool {
        self.find(key).is_some()
    }

    /// Remove the value stored under `key`.
    ///
    /// Every node left empty on the way back up is freed, except the root.
    ///
    /// # Returns
    /// The removed value reference, or None if the key was not present
    ///
    /// # Performance
    /// O(depth)
    pub fn try_remove(&mut self, key: u64) -> Result<Option<R>, TrieError> {
        if !self.layout.accepts(key) {
            return Ok(None);
        }

        let depth = self.layout.depth();

        // Step 1: Descend, remembering every node on the path
        let mut path: [(R, Node<R>); MAX_DEPTH] = [(R::NULL, Node::new()); MAX_DEPTH];
        path[0] = (self.root, self.load(self.root)?);
        for level in 0..depth - 1 {
            let child = path[level].1.get_child(self.layout.child(key, level));
            if child.is_null() {
                return Ok(None);
            }
            path[level + 1] = (child, self.load(child)?);
        }

        // Step 2: Verify and clear the terminal slot
        let last = depth - 1;
        let slot = self.layout.child(key, last);
        let value = path[last].1.get_child(slot);
        if value.is_null() || self.access.get_key(value) != key {
            return Ok(None);
        }
        path[last].1.clear_child(slot);

        // Step 3: Free empty nodes bottom-up, stopping below the root
        let mut level = last;
        while level > 0 && path[level].1.is_empty() {
            self.free_node(path[level].0)?;
            path[level - 1].1.clear_child(self.layout.child(key, level - 1));
            level -= 1;
        }
        let (node_ref, node) = path[level];
        self.store(node_ref, &node)?;

        self.len -= 1;
        tracing::trace!(key, "value removed");
        Ok(Some(value))
    }

    /// Remove the value stored under `key`.
    pub fn remove(&mut self, key: u64) -> Option<R> {
        self.try_remove(key).unwrap_or_else(|err| {
            tracing::warn!(key, %err, "remove failed");
            None
        })
    }

    /// Detach every value, calling `f` on each in key order.
    ///
    /// All nodes except the root are freed.
    pub fn clear<F: FnMut(R)>(&mut self, mut f: F) -> Result<(), TrieError> {
        self.visit(self.root, 0, &mut f)?;

        self.nodes.reset();
        self.root = self.alloc_node(&Node::new())?;
        self.len = 0;
        tracing::trace!("trie cleared");
        Ok(())
    }

    fn visit<F: FnMut(R)>(&self, node_ref: R, level: usize, f: &mut F) -> Result<(), TrieError> {
        let node = self.load(node_ref)?;
        for child in node.children.into_iter().filter(|child| !child.is_null()) {
            if level + 1 == self.layout.depth() {
                f(child);
            } else {
                self.visit(child, level + 1, f)?;
            }
        }
        Ok(())
    }

    /// Iterate over `(key, value)` pairs in routing order.
    ///
    /// In index mode this is ascending key order.
    pub fn iter(&self) -> Iter<'_, R, K> {
        Iter::new(self)
    }

    /// Number of values stored.
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of live nodes, root included.
    #[inline(always)]
    pub fn node_count(&self) -> usize {
        self.nodes.len() as usize
    }

    /// Number of levels, root included.
    #[inline(always)]
    pub fn depth(&self) -> usize {
        self.layout.depth()
    }

    pub fn config(&self) -> &TrieConfig {
        &self.config
    }

    pub fn layout(&self) -> &KeyLayout {
        &self.layout
    }

    pub fn key_access(&self) -> &K {
        &self.access
    }

    /// Mutable key accessor, e.g. to allocate values from a pool it owns.
    ///
    /// Rewriting the key of a value that is in the trie makes it
    /// unreachable by key.
    pub fn key_access_mut(&mut self) -> &mut K {
        &mut self.access
    }

    pub fn node_pool(&self) -> &SlotPool {
        &self.nodes
    }

    pub(crate) fn root(&self) -> R {
        self.root
    }

    /// Drop the trie and hand back the node pool and key accessor.
    pub fn into_parts(self) -> (SlotPool, K) {
        (self.nodes, self.access)
    }

    pub(crate) fn load(&self, node_ref: R) -> Result<Node<R>, TrieError> {
        let index = node_ref.to_index(&self.nodes)?;
        Ok(Node::load(self.nodes.slot(index)?))
    }

    fn store(&mut self, node_ref: R, node: &Node<R>) -> Result<(), TrieError> {
        let index = node_ref.to_index(&self.nodes)?;
        node.store(self.nodes.slot_mut(index)?);
        Ok(())
    }

    fn alloc_node(&mut self, node: &Node<R>) -> Result<R, TrieError> {
        let index = self.nodes.allocate()?;
        node.store(self.nodes.slot_mut(index)?);
        tracing::trace!(index, "node allocated");
        Ok(R::from_index(&self.nodes, index)?)
    }

    fn free_node(&mut self, node_ref: R) -> Result<(), TrieError> {
        let index = node_ref.to_index(&self.nodes)?;
        self.nodes.deallocate(index)?;
        tracing::trace!(index, "node freed");
        Ok(())
    }
}

impl<'a, R: SlotRef, K: KeyAccess<R>> IntoIterator for &'a Trie<R, K> {
    type Item = (u64, R);
    type IntoIter = Iter<'a, R, K>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
