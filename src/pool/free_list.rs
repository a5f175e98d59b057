//! Intrusive free list threaded through the first 4 bytes of freed slots.

use crate::constants::EMPTY;

#[inline(always)]
fn read_link(storage: &[u8], offset: usize) -> u32 {
    let mut raw = [0u8; 4];
    raw.copy_from_slice(&storage[offset..offset + 4]);
    u32::from_ne_bytes(raw)
}

#[inline(always)]
fn write_link(storage: &mut [u8], offset: usize, next: u32) {
    storage[offset..offset + 4].copy_from_slice(&next.to_ne_bytes());
}

/// Singly linked stack of recycled slot indices.
///
/// The list itself is only a head index and a count; the links live inside
/// the freed slots, which destroys their previous payload.
///
/// # Invariants
/// - The list is acyclic and terminates at `EMPTY`
/// - `len` equals the number of slots reachable from `head`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreeList {
    head: u32,
    len: u32,
}

impl FreeList {
    /// Create an empty free list.
    pub const fn new() -> Self {
        FreeList {
            head: EMPTY,
            len: 0,
        }
    }

    /// Index of the most recently freed slot, or `EMPTY`.
    #[inline(always)]
    pub fn head(&self) -> u32 {
        self.head
    }

    /// Number of slots on the list.
    #[inline(always)]
    pub fn len(&self) -> u32 {
        self.len
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.head == EMPTY
    }

    /// Push slot `index`, overwriting its first 4 bytes with the old head.
    ///
    /// # Arguments
    /// * `storage` - Slot array the list is threaded through
    /// * `element_size` - Size of one slot in bytes (at least 4)
    /// * `index` - Slot being recycled
    ///
    /// # Performance
    /// O(1) - one 4-byte write
    #[inline]
    pub fn push(&mut self, storage: &mut [u8], element_size: usize, index: u32) {
        write_link(storage, index as usize * element_size, self.head);
        self.head = index;
        self.len += 1;
    }

    /// Pop the most recently freed slot.
    ///
    /// # Returns
    /// Index of the recycled slot, or None if the list is empty
    ///
    /// # Performance
    /// O(1) - one 4-byte read
    #[inline]
    pub fn pop(&mut self, storage: &[u8], element_size: usize) -> Option<u32> {
        if self.head == EMPTY {
            return None;
        }
        let index = self.head;
        self.head = read_link(storage, index as usize * element_size);
        self.len -= 1;
        Some(index)
    }

    /// Walk the list from head to tail.
    pub fn iter<'a>(&self, storage: &'a [u8], element_size: usize) -> FreeIter<'a> {
        FreeIter {
            storage,
            element_size,
            next: self.head,
            remaining: self.len,
        }
    }
}

impl Default for FreeList {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over the indices of a [`FreeList`].
///
/// Bounded by the list length, so a corrupted link cannot loop forever.
pub struct FreeIter<'a> {
    storage: &'a [u8],
    element_size: usize,
    next: u32,
    remaining: u32,
}

impl Iterator for FreeIter<'_> {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        if self.next == EMPTY || self.remaining == 0 {
            return None;
        }
        let index = self.next;
        self.next = read_link(self.storage, index as usize * self.element_size);
        self.remaining -= 1;
        Some(index)
    }
}
