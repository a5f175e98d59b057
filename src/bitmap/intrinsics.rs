//! CPU intrinsic operations for fast bit manipulation on 32-bit words.

/// Count trailing zeros (find first set bit from right).
///
/// Uses CPU TZCNT instruction for O(1) performance.
///
/// # Arguments
/// * `word` - 32-bit word
///
/// # Returns
/// Number of trailing zeros (0-32)
#[inline]
pub fn trailing_zeros(word: u32) -> u32 {
    word.trailing_zeros()
}

/// Count leading zeros (find first set bit from left).
///
/// Uses CPU LZCNT instruction for O(1) performance.
///
/// # Arguments
/// * `word` - 32-bit word
///
/// # Returns
/// Number of leading zeros (0-32)
#[inline]
pub fn leading_zeros(word: u32) -> u32 {
    word.leading_zeros()
}

/// Count set bits in a word.
///
/// # Performance
/// O(1) - single CPU instruction (POPCNT)
#[inline]
pub fn popcount(word: u32) -> u32 {
    word.count_ones()
}
