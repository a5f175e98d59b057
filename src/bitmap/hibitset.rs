//! Hierarchical bitset with O(log32 N) search.
//!
//! Level 0 stores one bit per tracked index. Every higher level stores one
//! summary bit per 32-bit word of the level below, in two flavours:
//! - the "any" summary bit is set iff its group has at least one set bit
//! - the "full" summary bit is set iff every valid bit of its group is set
//!
//! Set-bit searches walk the "any" pyramid, free-bit searches and
//! [`HiBitset::is_full`] walk the "full" pyramid. The top level of both is a
//! single word.
//!
//! # Memory Layout
//! One contiguous `[u32]` block: level 0 words, then "any" levels
//! `1..=maxlevel`, then "full" levels `1..=maxlevel`.
//!
//! ```text
//! maxbits = 512Kbit
//! level 0: 524288 bits, 16384 words
//! level 1:  16384 bits,   512 words (x2)
//! level 2:    512 bits,    16 words (x2)
//! level 3:     16 bits,     1 word  (x2)
//! total: 16384 + 2 * (512 + 16 + 1) = 17442 words
//! ```

use alloc::boxed::Box;
use alloc::vec;

use crate::bitmap::{
    bit_mask, clear_bit, first_set_bit, is_set, last_set_bit, low_mask, next_set_bit,
    prev_set_bit, set_bit,
};
use crate::constants::{MAX_BITS, MAX_LEVELS, WORD_BITS, WORD_SHIFT};
use crate::error::BitsetError;

/// Which bit state a search is looking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    Set,
    Free,
}

/// Per-level bit counts derived from `maxbits`.
#[derive(Debug, Clone, Copy)]
struct Geometry {
    /// Number of bits at each level.
    bits: [u64; MAX_LEVELS],
    /// Number of levels in use (maxlevel + 1).
    levels: usize,
}

#[inline(always)]
fn words_for(bits: u64) -> u64 {
    ((bits + WORD_BITS - 1) >> WORD_SHIFT).max(1)
}

impl Geometry {
    fn new(maxbits: u64) -> Result<Self, BitsetError> {
        if maxbits > MAX_BITS {
            return Err(BitsetError::TooManyBits { maxbits });
        }

        let mut bits = [0u64; MAX_LEVELS];
        let mut level = 0;
        bits[0] = maxbits;
        while words_for(bits[level]) > 1 {
            bits[level + 1] = words_for(bits[level]);
            level += 1;
        }

        Ok(Geometry {
            bits,
            levels: level + 1,
        })
    }

    fn words(&self, level: usize) -> usize {
        words_for(self.bits[level]) as usize
    }

    fn total_words(&self) -> usize {
        let summaries: usize = (1..self.levels).map(|level| self.words(level)).sum();
        self.words(0) + 2 * summaries
    }
}

/// Multi-level bitmap over up to 2^35 bits.
///
/// # Performance
/// - `set` / `clr`: O(1) amortized, O(levels) worst case (propagation stops
///   as soon as a group's aggregate state is unchanged)
/// - `find` / `upper` / `lower`: O(levels) = O(log32 maxbits)
///
/// # Example
/// ```rust
/// use dexed::bitmap::HiBitset;
///
/// let mut bits = HiBitset::new(1024).unwrap();
/// bits.set(5);
/// bits.set(300);
/// bits.set(900);
///
/// assert_eq!(bits.find(), Some(5));
/// assert_eq!(bits.upper(301), Some(900));
/// assert_eq!(bits.lower(899), Some(300));
/// ```
#[derive(Debug)]
pub struct HiBitset {
    words: Box<[u32]>,
    geometry: Geometry,
    /// Word offset of each "any" level (level 0 is the bit data itself).
    any: [usize; MAX_LEVELS],
    /// Word offset of each "full" level (level 0 is the bit data itself).
    full: [usize; MAX_LEVELS],
}

impl HiBitset {
    /// Number of `u32` words of storage needed to track `maxbits` bits.
    ///
    /// # Errors
    /// `TooManyBits` if `maxbits` exceeds 2^35
    pub fn size_in_dwords(maxbits: u64) -> Result<usize, BitsetError> {
        Ok(Geometry::new(maxbits)?.total_words())
    }

    /// Create a bitset over freshly allocated storage.
    ///
    /// # Arguments
    /// * `maxbits` - Number of bits to track
    ///
    /// # Returns
    /// Bitset with all bits clear
    pub fn new(maxbits: u64) -> Result<Self, BitsetError> {
        let geometry = Geometry::new(maxbits)?;
        let storage = vec![0u32; geometry.total_words()].into_boxed_slice();
        Ok(Self::build(storage, geometry))
    }

    /// Create a bitset over caller-provided storage.
    ///
    /// The storage is cleared; it must hold at least
    /// [`size_in_dwords(maxbits)`](Self::size_in_dwords) words.
    pub fn with_storage(mut storage: Box<[u32]>, maxbits: u64) -> Result<Self, BitsetError> {
        let geometry = Geometry::new(maxbits)?;
        let needed = geometry.total_words();
        if storage.len() < needed {
            return Err(BitsetError::StorageTooSmall {
                needed,
                actual: storage.len(),
            });
        }
        storage.fill(0);
        Ok(Self::build(storage, geometry))
    }

    fn build(words: Box<[u32]>, geometry: Geometry) -> Self {
        let mut any = [0usize; MAX_LEVELS];
        let mut full = [0usize; MAX_LEVELS];

        let mut offset = geometry.words(0);
        for level in 1..geometry.levels {
            any[level] = offset;
            offset += geometry.words(level);
        }
        for level in 1..geometry.levels {
            full[level] = offset;
            offset += geometry.words(level);
        }

        tracing::debug!(
            maxbits = geometry.bits[0],
            levels = geometry.levels,
            words = offset,
            "hierarchical bitset initialized"
        );

        HiBitset {
            words,
            geometry,
            any,
            full,
        }
    }

    /// Give the storage back to the caller.
    pub fn release(self) -> Box<[u32]> {
        self.words
    }

    /// Clear every bit.
    pub fn reset(&mut self) {
        self.words.fill(0);
    }

    /// Number of tracked bits.
    #[inline]
    pub fn len(&self) -> u64 {
        self.geometry.bits[0]
    }

    /// Index of the top level (0 when everything fits in one word).
    #[inline]
    pub fn maxlevel(&self) -> usize {
        self.geometry.levels - 1
    }

    /// Mask of the bits of word `w` at `level` that map to real groups.
    #[inline]
    fn valid_mask(&self, level: usize, w: usize) -> u32 {
        let start = (w as u64) << WORD_SHIFT;
        low_mask(self.geometry.bits[level].saturating_sub(start))
    }

    /// Bits of word `w` at `level` that lead to a bit in the `target` state.
    #[inline]
    fn candidates(&self, target: Target, level: usize, w: usize) -> u32 {
        match target {
            Target::Set => self.words[self.any[level] + w],
            Target::Free => !self.words[self.full[level] + w] & self.valid_mask(level, w),
        }
    }

    /// Set a bit.
    ///
    /// # Panics
    /// Panics if `bit` is not below [`len`](Self::len)
    pub fn set(&mut self, bit: u64) {
        assert!(bit < self.len(), "bit {} out of range {}", bit, self.len());

        let w = (bit >> WORD_SHIFT) as usize;
        let old = self.words[w];
        if !set_bit(&mut self.words[w], (bit & (WORD_BITS - 1)) as u32) {
            return;
        }
        let new = self.words[w];

        if old == 0 {
            self.mark_any(1, w as u64);
        }
        if new == self.valid_mask(0, w) {
            self.mark_full(1, w as u64);
        }
    }

    /// Clear a bit.
    ///
    /// # Panics
    /// Panics if `bit` is not below [`len`](Self::len)
    pub fn clr(&mut self, bit: u64) {
        assert!(bit < self.len(), "bit {} out of range {}", bit, self.len());

        let w = (bit >> WORD_SHIFT) as usize;
        let old = self.words[w];
        if !clear_bit(&mut self.words[w], (bit & (WORD_BITS - 1)) as u32) {
            return;
        }
        let new = self.words[w];

        if new == 0 {
            self.unmark_any(1, w as u64);
        }
        if old == self.valid_mask(0, w) {
            self.unmark_full(1, w as u64);
        }
    }

    // Group `pos` at `level - 1` became non-empty.
    fn mark_any(&mut self, mut level: usize, mut pos: u64) {
        while level < self.geometry.levels {
            let w = (pos >> WORD_SHIFT) as usize;
            let idx = self.any[level] + w;
            let old = self.words[idx];
            self.words[idx] = old | bit_mask((pos & (WORD_BITS - 1)) as u32);
            if old != 0 {
                break;
            }
            level += 1;
            pos = w as u64;
        }
    }

    // Group `pos` at `level - 1` became empty.
    fn unmark_any(&mut self, mut level: usize, mut pos: u64) {
        while level < self.geometry.levels {
            let w = (pos >> WORD_SHIFT) as usize;
            let idx = self.any[level] + w;
            let new = self.words[idx] & !bit_mask((pos & (WORD_BITS - 1)) as u32);
            self.words[idx] = new;
            if new != 0 {
                break;
            }
            level += 1;
            pos = w as u64;
        }
    }

    // Group `pos` at `level - 1` became full.
    fn mark_full(&mut self, mut level: usize, mut pos: u64) {
        while level < self.geometry.levels {
            let w = (pos >> WORD_SHIFT) as usize;
            let idx = self.full[level] + w;
            let new = self.words[idx] | bit_mask((pos & (WORD_BITS - 1)) as u32);
            self.words[idx] = new;
            if new != self.valid_mask(level, w) {
                break;
            }
            level += 1;
            pos = w as u64;
        }
    }

    // Group `pos` at `level - 1` stopped being full.
    fn unmark_full(&mut self, mut level: usize, mut pos: u64) {
        while level < self.geometry.levels {
            let w = (pos >> WORD_SHIFT) as usize;
            let idx = self.full[level] + w;
            let old = self.words[idx];
            self.words[idx] = old & !bit_mask((pos & (WORD_BITS - 1)) as u32);
            if old != self.valid_mask(level, w) {
                break;
            }
            level += 1;
            pos = w as u64;
        }
    }

    /// Check if a bit is set. Out-of-range bits read as clear.
    #[inline]
    pub fn is_set(&self, bit: u64) -> bool {
        if bit >= self.len() {
            return false;
        }
        let w = (bit >> WORD_SHIFT) as usize;
        is_set(self.words[w], (bit & (WORD_BITS - 1)) as u32)
    }

    /// Check if every bit is set.
    ///
    /// # Performance
    /// O(1) - reads the top "full" summary word
    #[inline]
    pub fn is_full(&self) -> bool {
        let top = self.maxlevel();
        self.words[self.full[top]] == self.valid_mask(top, 0)
    }

    /// Check if no bit is set.
    ///
    /// # Performance
    /// O(1) - reads the top "any" summary word
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.words[self.any[self.maxlevel()]] == 0
    }

    /// First set bit.
    pub fn find(&self) -> Option<u64> {
        self.first(Target::Set)
    }

    /// Nearest set bit at or above `pivot`.
    pub fn upper(&self, pivot: u64) -> Option<u64> {
        self.upper_in(Target::Set, pivot)
    }

    /// Nearest set bit at or below `pivot`.
    pub fn lower(&self, pivot: u64) -> Option<u64> {
        self.lower_in(Target::Set, pivot)
    }

    /// First clear bit.
    pub fn find_free(&self) -> Option<u64> {
        self.first(Target::Free)
    }

    /// Nearest clear bit at or above `pivot`.
    pub fn upper_free(&self, pivot: u64) -> Option<u64> {
        self.upper_in(Target::Free, pivot)
    }

    /// Nearest clear bit at or below `pivot`.
    pub fn lower_free(&self, pivot: u64) -> Option<u64> {
        self.lower_in(Target::Free, pivot)
    }

    /// Iterate over set bits in ascending order.
    pub fn iter(&self) -> SetBits<'_> {
        SetBits {
            bits: self,
            next: self.find(),
        }
    }

    /// Walk down from bit `pos` at `level` to level 0, taking the lowest
    /// (or highest) candidate at every step.
    fn descend(&self, target: Target, mut level: usize, mut pos: u64, highest: bool) -> u64 {
        while level > 0 {
            level -= 1;
            let w = pos as usize;
            let word = self.candidates(target, level, w);
            let bit = if highest {
                last_set_bit(word)
            } else {
                first_set_bit(word)
            };
            // Summaries guarantee a candidate below every marked group.
            debug_assert!(bit.is_some(), "summary out of sync at level {}", level);
            pos = ((w as u64) << WORD_SHIFT) + bit.unwrap_or(0) as u64;
        }
        pos
    }

    fn first(&self, target: Target) -> Option<u64> {
        let top = self.maxlevel();
        let bit = first_set_bit(self.candidates(target, top, 0))?;
        Some(self.descend(target, top, bit as u64, false))
    }

    fn upper_in(&self, target: Target, pivot: u64) -> Option<u64> {
        if pivot >= self.len() {
            return None;
        }

        let mut level = 0;
        let mut pos = pivot;
        loop {
            let w = (pos >> WORD_SHIFT) as usize;
            let from = (pos & (WORD_BITS - 1)) as u32;
            if let Some(bit) = next_set_bit(self.candidates(target, level, w), from) {
                let hit = ((w as u64) << WORD_SHIFT) + bit as u64;
                return Some(self.descend(target, level, hit, false));
            }

            level += 1;
            if level == self.geometry.levels {
                return None;
            }
            pos = w as u64 + 1;
            if pos >= self.geometry.bits[level] {
                return None;
            }
        }
    }

    fn lower_in(&self, target: Target, pivot: u64) -> Option<u64> {
        if self.len() == 0 {
            return None;
        }

        let mut level = 0;
        let mut pos = pivot.min(self.len() - 1);
        loop {
            let w = (pos >> WORD_SHIFT) as usize;
            let to = (pos & (WORD_BITS - 1)) as u32;
            if let Some(bit) = prev_set_bit(self.candidates(target, level, w), to) {
                let hit = ((w as u64) << WORD_SHIFT) + bit as u64;
                return Some(self.descend(target, level, hit, true));
            }

            level += 1;
            if w == 0 || level == self.geometry.levels {
                return None;
            }
            pos = w as u64 - 1;
        }
    }
}

/// Iterator over the set bits of a [`HiBitset`] in ascending order.
pub struct SetBits<'a> {
    bits: &'a HiBitset,
    next: Option<u64>,
}

impl Iterator for SetBits<'_> {
    type Item = u64;

    fn next(&mut self) -> Option<u64> {
        let current = self.next?;
        self.next = current
            .checked_add(1)
            .and_then(|pivot| self.bits.upper(pivot));
        Some(current)
    }
}
