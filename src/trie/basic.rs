//! Basic child operations for Node.

use crate::pool::SlotRef;
use crate::trie::Node;

impl<R: SlotRef> Node<R> {
    /// Check if child exists at given group value.
    ///
    /// # Arguments
    /// * `slot` - Group value (0-3)
    ///
    /// # Returns
    /// `true` if child exists, `false` otherwise
    #[inline(always)]
    pub fn has_child(&self, slot: usize) -> bool {
        !self.children[slot].is_null()
    }

    /// Get child reference at given group value.
    ///
    /// # Returns
    /// Child reference, or `R::NULL` if no child exists
    ///
    /// # Performance
    /// O(1) - direct array indexing
    #[inline(always)]
    pub fn get_child(&self, slot: usize) -> R {
        self.children[slot]
    }

    /// Set child at given group value.
    ///
    /// # Arguments
    /// * `slot` - Group value (0-3)
    /// * `child` - Node or value reference
    #[inline(always)]
    pub fn set_child(&mut self, slot: usize, child: R) {
        self.children[slot] = child;
    }

    /// Clear child at given group value.
    ///
    /// # Returns
    /// The previous child reference (`R::NULL` if there was none)
    #[inline(always)]
    pub fn clear_child(&mut self, slot: usize) -> R {
        core::mem::replace(&mut self.children[slot], R::NULL)
    }
}
