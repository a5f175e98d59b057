//! Trie construction options and the key-to-path layout derived from them.

use crate::constants::{BITS_PER_LEVEL, MAX_DEPTH};
use crate::error::TrieError;

/// Construction options for a [`Trie`](crate::trie::Trie).
///
/// Two modes:
/// - **mask mode**: `mask` selects which key bits route through the trie,
///   two bits per level, most significant first
/// - **index mode**: keys are dense indices `0..value_count`; the trie is
///   `ceil(log4(value_count))` levels deep (at least 1)
///
/// # Example
/// ```rust
/// use dexed::trie::TrieConfig;
///
/// let layout = TrieConfig::from_index(1024).layout().unwrap();
/// assert_eq!(layout.depth(), 5);
///
/// let layout = TrieConfig::from_mask(0xFF00).layout().unwrap();
/// assert_eq!(layout.depth(), 4);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TrieConfig {
    /// Key bits used for routing in mask mode.
    pub mask: u64,
    /// Number of addressable keys in index mode.
    pub value_count: u32,
    /// Selects index mode over mask mode.
    pub uses_index_mode: bool,
}

impl TrieConfig {
    /// Mask mode over the set bits of `mask`.
    pub const fn from_mask(mask: u64) -> Self {
        TrieConfig {
            mask,
            value_count: 0,
            uses_index_mode: false,
        }
    }

    /// Index mode over keys `0..value_count`.
    pub const fn from_index(value_count: u32) -> Self {
        TrieConfig {
            mask: 0,
            value_count,
            uses_index_mode: true,
        }
    }

    /// Check the options without building a layout.
    ///
    /// # Errors
    /// `EmptyMask` in mask mode with no bits selected, `ZeroValueCount` in
    /// index mode with no addressable keys
    pub fn validate(&self) -> Result<(), TrieError> {
        self.layout().map(|_| ())
    }

    /// Derive the routing layout.
    pub fn layout(&self) -> Result<KeyLayout, TrieError> {
        if self.uses_index_mode {
            KeyLayout::for_index(self.value_count)
        } else {
            KeyLayout::for_mask(self.mask)
        }
    }
}

impl Default for TrieConfig {
    /// Mask mode over the full 64-bit key.
    fn default() -> Self {
        Self::from_mask(u64::MAX)
    }
}

/// Which key bits select the child at each level.
///
/// Routing bit positions are listed most significant first and consumed in
/// pairs, one pair per level. With an odd number of routing bits the last
/// level uses a single bit and only children 0 and 1.
///
/// # Memory Layout
/// ```text
/// mask = 0b1011_0000
/// positions = [7, 5, 4]
/// level 0: bits 7,5 -> child (b7 << 1) | b5
/// level 1: bit 4    -> child b4
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyLayout {
    positions: [u8; 64],
    count: u8,
    depth: u8,
    /// Exclusive upper bound on keys in index mode.
    limit: Option<u64>,
}

impl KeyLayout {
    fn for_mask(mask: u64) -> Result<Self, TrieError> {
        if mask == 0 {
            return Err(TrieError::EmptyMask);
        }

        let mut positions = [0u8; 64];
        let mut count = 0;
        for bit in (0..64u8).rev() {
            if mask & (1u64 << bit) != 0 {
                positions[count] = bit;
                count += 1;
            }
        }

        Ok(Self::build(positions, count, None))
    }

    fn for_index(value_count: u32) -> Result<Self, TrieError> {
        if value_count == 0 {
            return Err(TrieError::ZeroValueCount);
        }

        let mut depth = 1;
        while (1u64 << (BITS_PER_LEVEL * depth)) < value_count as u64 {
            depth += 1;
        }

        let count = BITS_PER_LEVEL * depth;
        let mut positions = [0u8; 64];
        for (i, position) in positions.iter_mut().take(count).enumerate() {
            *position = (count - 1 - i) as u8;
        }

        Ok(Self::build(positions, count, Some(value_count as u64)))
    }

    fn build(positions: [u8; 64], count: usize, limit: Option<u64>) -> Self {
        let depth = count.div_ceil(BITS_PER_LEVEL);
        debug_assert!(depth >= 1 && depth <= MAX_DEPTH);
        KeyLayout {
            positions,
            count: count as u8,
            depth: depth as u8,
            limit,
        }
    }

    /// Number of levels, root included.
    #[inline(always)]
    pub fn depth(&self) -> usize {
        self.depth as usize
    }

    /// Number of key bits used for routing.
    #[inline(always)]
    pub fn bit_count(&self) -> usize {
        self.count as usize
    }

    /// Exclusive upper bound on keys in index mode.
    #[inline(always)]
    pub fn limit(&self) -> Option<u64> {
        self.limit
    }

    /// Whether `key` can be stored under this layout.
    #[inline(always)]
    pub fn accepts(&self, key: u64) -> bool {
        self.limit.map_or(true, |limit| key < limit)
    }

    /// Child slot selected by `key` at `level`.
    ///
    /// # Arguments
    /// * `key` - Full 64-bit key; bits outside the layout are ignored
    /// * `level` - Level of the node being routed through (0 = root)
    ///
    /// # Returns
    /// Group value in `0..4` (`0..2` for a trailing single-bit level)
    ///
    /// # Performance
    /// O(1) - two shifts and masks
    #[inline(always)]
    pub fn child(&self, key: u64, level: usize) -> usize {
        let first = level * BITS_PER_LEVEL;
        let high = (key >> self.positions[first]) & 1;
        if first + 1 < self.count as usize {
            let low = (key >> self.positions[first + 1]) & 1;
            ((high << 1) | low) as usize
        } else {
            high as usize
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_depth() {
        let depth = |count| TrieConfig::from_index(count).layout().unwrap().depth();
        assert_eq!(depth(1), 1);
        assert_eq!(depth(4), 1);
        assert_eq!(depth(5), 2);
        assert_eq!(depth(16), 2);
        assert_eq!(depth(1024), 5);
        assert_eq!(depth(1025), 6);
        assert_eq!(depth(u32::MAX), 16);
    }

    #[test]
    fn test_index_routing_is_base4_digits() {
        let layout = TrieConfig::from_index(64).layout().unwrap();
        // 27 = 0b01_10_11
        assert_eq!(layout.child(27, 0), 1);
        assert_eq!(layout.child(27, 1), 2);
        assert_eq!(layout.child(27, 2), 3);
        assert!(layout.accepts(63));
        assert!(!layout.accepts(64));
    }

    #[test]
    fn test_mask_routing() {
        let layout = TrieConfig::from_mask(0xFF00).layout().unwrap();
        assert_eq!(layout.depth(), 4);
        assert_eq!(layout.bit_count(), 8);
        assert_eq!(layout.limit(), None);

        for level in 0..3 {
            assert_eq!(layout.child(0x0100, level), 0);
        }
        assert_eq!(layout.child(0x0100, 3), 1);
        assert_eq!(layout.child(0x0200, 3), 2);
        assert_eq!(layout.child(0xC000, 0), 3);
        // Unmasked bits do not route.
        assert_eq!(layout.child(0x00FF, 3), 0);
    }

    #[test]
    fn test_odd_mask_uses_single_bit_last_level() {
        let layout = TrieConfig::from_mask(0b1011_0000).layout().unwrap();
        assert_eq!(layout.depth(), 2);
        assert_eq!(layout.child(0b1010_0000, 0), 3);
        assert_eq!(layout.child(0b0001_0000, 1), 1);
        assert_eq!(layout.child(0b1110_0000, 1), 0);
    }

    #[test]
    fn test_full_mask() {
        let layout = TrieConfig::default().layout().unwrap();
        assert_eq!(layout.depth(), 32);
        assert_eq!(layout.child(u64::MAX, 0), 3);
        assert_eq!(layout.child(1, 31), 1);
    }

    #[test]
    fn test_validate() {
        assert_eq!(TrieConfig::from_mask(0).validate(), Err(TrieError::EmptyMask));
        assert_eq!(
            TrieConfig::from_index(0).validate(),
            Err(TrieError::ZeroValueCount)
        );
        assert!(TrieConfig::from_index(1).validate().is_ok());
    }
}
