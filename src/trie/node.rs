//! Internal node structure for 4-way branching trie.

use crate::constants::NODE_CHILDREN;
use crate::pool::SlotRef;

/// Internal node with 4-way branching.
///
/// Lives in a node pool slot as `NODE_CHILDREN` encoded references. A node
/// on the last level holds value references, every other node holds
/// references to child nodes.
///
/// # Memory Layout
/// - `children`: 4 × `R::WIDTH` bytes
/// - Total: 16 bytes for index tries, 32 bytes for pointer tries on 64-bit
///
/// # Performance
/// - Child access: O(1) via direct indexing
/// - Load/store: one copy of `SIZE` bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Node<R: SlotRef> {
    /// `children[i]` is the reference for group value `i`, or `R::NULL`.
    pub children: [R; NODE_CHILDREN],
}

impl<R: SlotRef> Node<R> {
    /// Encoded size in bytes.
    pub const SIZE: usize = NODE_CHILDREN * R::WIDTH;

    /// Create a node with every child empty.
    #[inline(always)]
    pub fn new() -> Self {
        Node {
            children: [R::NULL; NODE_CHILDREN],
        }
    }

    /// Decode a node from the first `SIZE` bytes of a pool slot.
    ///
    /// # Panics
    /// Panics if `bytes` is shorter than `SIZE`
    #[inline]
    pub fn load(bytes: &[u8]) -> Self {
        assert!(bytes.len() >= Self::SIZE, "node slot too small");
        let mut node = Self::new();
        for (child, raw) in node.children.iter_mut().zip(bytes.chunks_exact(R::WIDTH)) {
            *child = R::read(raw);
        }
        node
    }

    /// Encode the node into the first `SIZE` bytes of a pool slot.
    ///
    /// # Panics
    /// Panics if `bytes` is shorter than `SIZE`
    #[inline]
    pub fn store(&self, bytes: &mut [u8]) {
        assert!(bytes.len() >= Self::SIZE, "node slot too small");
        for (child, raw) in self.children.iter().zip(bytes.chunks_exact_mut(R::WIDTH)) {
            child.write(raw);
        }
    }
}

impl<R: SlotRef> Default for Node<R> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::EMPTY;
    use crate::pool::SlotPtr;

    #[test]
    fn test_new_node() {
        let node: Node<u32> = Node::new();
        for i in 0..NODE_CHILDREN {
            assert_eq!(node.children[i], EMPTY);
        }
    }

    #[test]
    fn test_node_size() {
        assert_eq!(Node::<u32>::SIZE, 16);
        assert_eq!(
            Node::<SlotPtr>::SIZE,
            NODE_CHILDREN * core::mem::size_of::<usize>()
        );
    }

    #[test]
    fn test_load_store() {
        let mut node: Node<u32> = Node::new();
        node.children[1] = 7;
        node.children[3] = 0;

        let mut slot = [0u8; 20];
        node.store(&mut slot);
        assert_eq!(Node::<u32>::load(&slot), node);
        // Trailing bytes past the node are untouched.
        assert_eq!(&slot[16..], &[0; 4]);
    }

    #[test]
    #[should_panic]
    fn test_store_short_slot() {
        let node: Node<u32> = Node::new();
        let mut slot = [0u8; 8];
        node.store(&mut slot);
    }

    #[test]
    fn test_default() {
        let node: Node<SlotPtr> = Node::default();
        assert!(node.children.iter().all(|c| c.is_null()));
    }
}
