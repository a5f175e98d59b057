//! Basic single-bit operations on 32-bit bitmap words.

/// Mask with only bit `idx` set.
///
/// # Arguments
/// * `idx` - Bit index (0-31)
#[inline(always)]
pub fn bit_mask(idx: u32) -> u32 {
    1u32 << idx
}

/// Mask with the low `count` bits set.
///
/// # Arguments
/// * `count` - Number of valid bits (0-32)
///
/// # Returns
/// `0` for `count == 0`, all ones for `count >= 32`
#[inline]
pub fn low_mask(count: u64) -> u32 {
    if count >= 32 {
        !0u32
    } else {
        (1u32 << count) - 1
    }
}

/// Set bit `idx` in `word`.
///
/// # Returns
/// `true` if the bit was previously clear
#[inline]
pub fn set_bit(word: &mut u32, idx: u32) -> bool {
    let was_clear = *word & bit_mask(idx) == 0;
    *word |= bit_mask(idx);
    was_clear
}

/// Clear bit `idx` in `word`.
///
/// # Returns
/// `true` if the bit was previously set
#[inline]
pub fn clear_bit(word: &mut u32, idx: u32) -> bool {
    let was_set = *word & bit_mask(idx) != 0;
    *word &= !bit_mask(idx);
    was_set
}

/// Check if bit `idx` is set in `word`.
#[inline]
pub fn is_set(word: u32, idx: u32) -> bool {
    word & bit_mask(idx) != 0
}
