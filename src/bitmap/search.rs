//! Search operations for finding set bits inside a single 32-bit word.

use crate::bitmap::{leading_zeros, trailing_zeros};

/// Find first set bit (minimum).
///
/// # Returns
/// Index of the lowest set bit, or None if the word is zero
#[inline]
pub fn first_set_bit(word: u32) -> Option<u32> {
    if word == 0 {
        None
    } else {
        Some(trailing_zeros(word))
    }
}

/// Find last set bit (maximum).
///
/// # Returns
/// Index of the highest set bit, or None if the word is zero
#[inline]
pub fn last_set_bit(word: u32) -> Option<u32> {
    if word == 0 {
        None
    } else {
        Some(31 - leading_zeros(word))
    }
}

/// Find the lowest set bit at or above `from`.
///
/// # Arguments
/// * `word` - 32-bit word to scan
/// * `from` - First candidate bit index (0-31)
///
/// # Performance
/// O(1) - one shift and TZCNT
#[inline]
pub fn next_set_bit(word: u32, from: u32) -> Option<u32> {
    first_set_bit(word & (!0u32 << from))
}

/// Find the highest set bit at or below `to`.
///
/// # Arguments
/// * `word` - 32-bit word to scan
/// * `to` - Last candidate bit index (0-31)
///
/// # Performance
/// O(1) - one shift and LZCNT
#[inline]
pub fn prev_set_bit(word: u32, to: u32) -> Option<u32> {
    last_set_bit(word & (!0u32 >> (31 - to)))
}
