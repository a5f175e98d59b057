//! Index/pointer translation ("dexing").

use core::mem::size_of;

use crate::constants::EMPTY;
use crate::error::PoolError;
use crate::pool::SlotPtr;

/// Translation between a slot's stable 32-bit index and its address.
///
/// The `EMPTY` index maps to [`SlotPtr::NULL`] and back.
pub trait Dexer {
    /// Address of slot `index`.
    fn idx2ptr(&self, index: u32) -> Result<SlotPtr, PoolError>;

    /// Index of the slot at `ptr`.
    fn ptr2idx(&self, ptr: SlotPtr) -> Result<u32, PoolError>;
}

/// Address of element `index` in an array starting at `base`.
#[inline(always)]
pub(crate) fn index_to_addr(base: *const u8, index: u32, element_size: usize) -> SlotPtr {
    SlotPtr::new(base.wrapping_add(index as usize * element_size) as *mut u8)
}

/// Index of the element at `addr` in an array of `capacity` elements.
///
/// # Errors
/// - `ForeignPointer` if `addr` is outside the array or not on an element boundary
/// - `OutOfRange` if the element is at or past `limit`
#[inline]
pub(crate) fn addr_to_index(
    base: *const u8,
    addr: usize,
    element_size: usize,
    capacity: u32,
    limit: u32,
) -> Result<u32, PoolError> {
    let offset = addr
        .checked_sub(base as usize)
        .ok_or(PoolError::ForeignPointer)?;
    if offset % element_size != 0 {
        return Err(PoolError::ForeignPointer);
    }
    let index = offset / element_size;
    if index >= capacity as usize {
        return Err(PoolError::ForeignPointer);
    }
    let index = index as u32;
    if index >= limit {
        return Err(PoolError::OutOfRange {
            index,
            watermark: limit,
        });
    }
    Ok(index)
}

/// Dexer over an existing array, with no allocation state.
///
/// Every element of the array is addressable; bounds are checked against
/// the element count.
#[derive(Debug, Clone, Copy)]
pub struct DexedArray<'a, T> {
    items: &'a [T],
}

impl<'a, T> DexedArray<'a, T> {
    /// Wrap an array.
    ///
    /// # Errors
    /// `ElementTooSmall` for zero-sized `T`, `StorageTooSmall` if the array
    /// has more elements than a 32-bit index can address
    pub fn new(items: &'a [T]) -> Result<Self, PoolError> {
        if size_of::<T>() == 0 {
            return Err(PoolError::ElementTooSmall { size: 0 });
        }
        if items.len() >= EMPTY as usize {
            return Err(PoolError::StorageTooSmall {
                needed: items.len(),
                actual: EMPTY as usize - 1,
            });
        }
        Ok(DexedArray { items })
    }

    /// Element at `index`.
    pub fn get(&self, index: u32) -> Option<&'a T> {
        self.items.get(index as usize)
    }

    /// Number of elements.
    pub fn len(&self) -> u32 {
        self.items.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T> Dexer for DexedArray<'_, T> {
    fn idx2ptr(&self, index: u32) -> Result<SlotPtr, PoolError> {
        if index == EMPTY {
            return Ok(SlotPtr::NULL);
        }
        if index >= self.len() {
            return Err(PoolError::OutOfRange {
                index,
                watermark: self.len(),
            });
        }
        Ok(index_to_addr(
            self.items.as_ptr() as *const u8,
            index,
            size_of::<T>(),
        ))
    }

    fn ptr2idx(&self, ptr: SlotPtr) -> Result<u32, PoolError> {
        if ptr.is_null() {
            return Ok(EMPTY);
        }
        addr_to_index(
            self.items.as_ptr() as *const u8,
            ptr.addr(),
            size_of::<T>(),
            self.len(),
            self.len(),
        )
    }
}
