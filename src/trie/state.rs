//! Node state checking operations.

use crate::bitmap;
use crate::constants::NODE_CHILDREN;
use crate::pool::SlotRef;
use crate::trie::Node;

impl<R: SlotRef> Node<R> {
    /// Occupancy bitmap: bit `i` set iff child `i` exists.
    #[inline(always)]
    pub fn occupied(&self) -> u32 {
        let mut bits = 0;
        for slot in 0..NODE_CHILDREN {
            if self.has_child(slot) {
                bitmap::set_bit(&mut bits, slot as u32);
            }
        }
        bits
    }

    /// Check if node has no children.
    ///
    /// # Performance
    /// O(1) - four comparisons
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.occupied() == 0
    }

    /// Get number of children in this node.
    ///
    /// # Returns
    /// Count of existing children (0-4)
    ///
    /// # Performance
    /// O(1) - uses POPCNT instruction
    #[inline(always)]
    pub fn child_count(&self) -> u32 {
        bitmap::popcount(self.occupied())
    }

    /// First existing child at or after group value `from`.
    ///
    /// # Returns
    /// Group value of the child, or None if there is none
    #[inline]
    pub fn next_child(&self, from: usize) -> Option<usize> {
        if from >= NODE_CHILDREN {
            return None;
        }
        bitmap::next_set_bit(self.occupied(), from as u32).map(|slot| slot as usize)
    }
}
