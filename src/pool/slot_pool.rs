//! Fixed-size slot pool with stable 32-bit indices.

use alloc::boxed::Box;
use alloc::vec;
use core::mem::size_of;

use crate::bitmap::{HiBitset, SetBits};
use crate::constants::{EMPTY, MIN_ELEMENT_SIZE};
use crate::error::PoolError;
use crate::pool::dexer::{addr_to_index, index_to_addr};
use crate::pool::free_list::{FreeIter, FreeList};
use crate::pool::{Dexer, FixedAllocator, SlotPtr};

/// Geometry of a [`SlotPool`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PoolConfig {
    /// Size of one slot in bytes (at least 4).
    pub element_size: usize,
    /// Number of slots.
    pub capacity: u32,
}

impl PoolConfig {
    pub const fn new(element_size: usize, capacity: u32) -> Self {
        PoolConfig {
            element_size,
            capacity,
        }
    }

    /// Slots sized for values of type `T`, rounded up to the 4-byte minimum.
    pub fn for_type<T>(capacity: u32) -> Self {
        PoolConfig {
            element_size: size_of::<T>().max(MIN_ELEMENT_SIZE),
            capacity,
        }
    }

    /// Bytes of backing storage the pool needs.
    ///
    /// # Returns
    /// `None` if the size overflows what a single allocation can hold
    #[inline]
    pub fn storage_bytes(&self) -> Option<usize> {
        self.element_size
            .checked_mul(self.capacity as usize)
            .filter(|&bytes| bytes <= isize::MAX as usize)
    }
}

/// Pool of `capacity` equally sized slots over one flat byte array.
///
/// Slots are handed out from an intrusive free list first, then from the
/// never-used region above the watermark. Each slot keeps the same index
/// for its whole lifetime, and the index converts to and from the slot's
/// address in constant time.
///
/// # Memory Layout
/// ```text
/// storage: [slot 0][slot 1] ... [slot watermark-1][ never used ... ]
///           live or free (first 4 bytes = next link when free)
/// ```
///
/// # Invariants
/// - Every index in `[0, watermark)` is either live or on the free list,
///   exactly once
/// - `watermark <= capacity < EMPTY`
///
/// # Performance
/// - `allocate` / `deallocate`: O(1) amortized (one free-list step plus a
///   bitset update)
/// - `idx2ptr` / `ptr2idx`: O(1)
///
/// # Example
/// ```rust
/// use dexed::pool::SlotPool;
///
/// let mut pool = SlotPool::new(16, 4).unwrap();
/// let a = pool.allocate().unwrap();
/// let ptr = pool.idx2ptr(a).unwrap();
/// assert_eq!(pool.ptr2idx(ptr).unwrap(), a);
///
/// pool.deallocate(a).unwrap();
/// assert_eq!(pool.allocate().unwrap(), a);
/// ```
#[derive(Debug)]
pub struct SlotPool {
    storage: Box<[u8]>,
    element_size: usize,
    capacity: u32,
    /// Number of slots ever handed out since the last reset.
    watermark: u32,
    free: FreeList,
    /// One bit per slot, set while the slot is live.
    live: HiBitset,
}

impl SlotPool {
    /// Create a pool with freshly allocated, zeroed storage.
    ///
    /// # Arguments
    /// * `element_size` - Size of one slot in bytes (at least 4)
    /// * `capacity` - Number of slots
    ///
    /// # Errors
    /// `ElementTooSmall` below 4 bytes, `OutOfRange` if `capacity` reaches
    /// the `EMPTY` sentinel, `StorageTooSmall` if the total size does not fit
    /// in one allocation
    pub fn new(element_size: usize, capacity: u32) -> crate::Result<Self> {
        let bytes = Self::check_geometry(element_size, capacity)?;
        let storage = vec![0u8; bytes].into_boxed_slice();
        Self::build(storage, element_size, capacity)
    }

    /// Create a pool from a [`PoolConfig`].
    pub fn from_config(config: &PoolConfig) -> crate::Result<Self> {
        Self::new(config.element_size, config.capacity)
    }

    /// Create a pool over caller-provided storage.
    ///
    /// The capacity is the number of whole slots that fit in `storage`. The
    /// storage contents are left as they are; [`release`](Self::release)
    /// hands the same block back.
    pub fn with_storage(storage: Box<[u8]>, element_size: usize) -> crate::Result<Self> {
        if element_size < MIN_ELEMENT_SIZE {
            return Err(PoolError::ElementTooSmall { size: element_size }.into());
        }
        let slots = storage.len() / element_size;
        let capacity = slots.min(EMPTY as usize - 1) as u32;
        Self::build(storage, element_size, capacity)
    }

    fn check_geometry(element_size: usize, capacity: u32) -> Result<usize, PoolError> {
        if element_size < MIN_ELEMENT_SIZE {
            return Err(PoolError::ElementTooSmall { size: element_size });
        }
        if capacity >= EMPTY {
            return Err(PoolError::OutOfRange {
                index: capacity,
                watermark: EMPTY,
            });
        }
        PoolConfig::new(element_size, capacity)
            .storage_bytes()
            .ok_or(PoolError::StorageTooSmall {
                needed: usize::MAX,
                actual: isize::MAX as usize,
            })
    }

    fn build(storage: Box<[u8]>, element_size: usize, capacity: u32) -> crate::Result<Self> {
        let live = HiBitset::new(capacity as u64)?;

        tracing::debug!(element_size, capacity, "slot pool initialized");

        Ok(SlotPool {
            storage,
            element_size,
            capacity,
            watermark: 0,
            free: FreeList::new(),
            live,
        })
    }

    /// Allocate one slot.
    ///
    /// # Returns
    /// Index of the slot: the most recently freed one if any, otherwise the
    /// next never-used one
    ///
    /// # Errors
    /// `OutOfMemory` when every slot is live
    ///
    /// # Performance
    /// O(1) amortized
    pub fn allocate(&mut self) -> Result<u32, PoolError> {
        let index = match self.free.pop(&self.storage, self.element_size) {
            Some(index) => index,
            None if self.watermark < self.capacity => {
                self.watermark += 1;
                self.watermark - 1
            }
            None => {
                tracing::warn!(capacity = self.capacity, "slot pool exhausted");
                return Err(PoolError::OutOfMemory {
                    capacity: self.capacity,
                });
            }
        };
        self.live.set(index as u64);
        tracing::trace!(index, "slot allocated");
        Ok(index)
    }

    /// Return slot `index` to the pool.
    ///
    /// The first 4 bytes of the slot are overwritten by the free-list link.
    ///
    /// # Errors
    /// - `OutOfRange` if `index` was never handed out
    /// - `NotAllocated` if the slot is already free
    ///
    /// # Performance
    /// O(1) amortized
    pub fn deallocate(&mut self, index: u32) -> Result<(), PoolError> {
        if index >= self.watermark {
            tracing::warn!(index, watermark = self.watermark, "free of untracked slot");
            return Err(PoolError::OutOfRange {
                index,
                watermark: self.watermark,
            });
        }
        if !self.live.is_set(index as u64) {
            tracing::warn!(index, "double free");
            return Err(PoolError::NotAllocated { index });
        }
        self.live.clr(index as u64);
        self.free.push(&mut self.storage, self.element_size, index);
        tracing::trace!(index, "slot freed");
        Ok(())
    }

    /// Address of slot `index`; `EMPTY` maps to [`SlotPtr::NULL`].
    ///
    /// # Errors
    /// `OutOfRange` if `index` is at or past the watermark
    ///
    /// # Performance
    /// O(1) - one multiply
    #[inline]
    pub fn idx2ptr(&self, index: u32) -> Result<SlotPtr, PoolError> {
        if index == EMPTY {
            return Ok(SlotPtr::NULL);
        }
        if index >= self.watermark {
            return Err(PoolError::OutOfRange {
                index,
                watermark: self.watermark,
            });
        }
        Ok(index_to_addr(self.storage.as_ptr(), index, self.element_size))
    }

    /// Index of the slot at `ptr`; [`SlotPtr::NULL`] maps to `EMPTY`.
    ///
    /// # Errors
    /// - `ForeignPointer` if `ptr` is not a slot address of this pool
    /// - `OutOfRange` if the slot is at or past the watermark
    ///
    /// # Performance
    /// O(1) - one divide
    #[inline]
    pub fn ptr2idx(&self, ptr: SlotPtr) -> Result<u32, PoolError> {
        if ptr.is_null() {
            return Ok(EMPTY);
        }
        addr_to_index(
            self.storage.as_ptr(),
            ptr.addr(),
            self.element_size,
            self.capacity,
            self.watermark,
        )
    }

    /// Bytes of live slot `index`.
    ///
    /// # Errors
    /// `OutOfRange` past the watermark, `NotAllocated` for a free slot
    pub fn slot(&self, index: u32) -> Result<&[u8], PoolError> {
        let start = self.live_offset(index)?;
        Ok(&self.storage[start..start + self.element_size])
    }

    /// Mutable bytes of live slot `index`.
    pub fn slot_mut(&mut self, index: u32) -> Result<&mut [u8], PoolError> {
        let start = self.live_offset(index)?;
        Ok(&mut self.storage[start..start + self.element_size])
    }

    fn live_offset(&self, index: u32) -> Result<usize, PoolError> {
        if index >= self.watermark {
            return Err(PoolError::OutOfRange {
                index,
                watermark: self.watermark,
            });
        }
        if !self.live.is_set(index as u64) {
            return Err(PoolError::NotAllocated { index });
        }
        Ok(index as usize * self.element_size)
    }

    /// Whether slot `index` is currently allocated.
    #[inline]
    pub fn is_live(&self, index: u32) -> bool {
        index < self.watermark && self.live.is_set(index as u64)
    }

    /// Number of live slots.
    #[inline]
    pub fn len(&self) -> u32 {
        self.watermark - self.free.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Number of slots ever handed out since the last reset.
    #[inline]
    pub fn watermark(&self) -> u32 {
        self.watermark
    }

    /// Number of slots that can still be allocated.
    #[inline]
    pub fn available(&self) -> u32 {
        self.capacity - self.len()
    }

    #[inline]
    pub fn element_size(&self) -> usize {
        self.element_size
    }

    /// Live slot indices in ascending order.
    pub fn live_indices(&self) -> LiveIndices<'_> {
        LiveIndices {
            bits: self.live.iter(),
        }
    }

    /// Free-list slot indices, most recently freed first.
    pub fn free_indices(&self) -> FreeIter<'_> {
        self.free.iter(&self.storage, self.element_size)
    }

    /// Forget every slot. Storage contents are not touched.
    pub fn reset(&mut self) {
        self.watermark = 0;
        self.free = FreeList::new();
        self.live.reset();
        tracing::trace!(capacity = self.capacity, "slot pool reset");
    }

    /// Drop the pool and hand the backing storage back.
    ///
    /// No per-slot cleanup runs; live slot contents are returned as-is.
    pub fn release(self) -> Box<[u8]> {
        self.storage
    }
}

impl Dexer for SlotPool {
    #[inline]
    fn idx2ptr(&self, index: u32) -> Result<SlotPtr, PoolError> {
        SlotPool::idx2ptr(self, index)
    }

    #[inline]
    fn ptr2idx(&self, ptr: SlotPtr) -> Result<u32, PoolError> {
        SlotPool::ptr2idx(self, ptr)
    }
}

impl FixedAllocator for SlotPool {
    fn element_size(&self) -> usize {
        self.element_size
    }

    fn alloc_slot(&mut self) -> Result<SlotPtr, PoolError> {
        let index = self.allocate()?;
        self.idx2ptr(index)
    }

    fn free_slot(&mut self, ptr: SlotPtr) -> Result<(), PoolError> {
        let index = self.ptr2idx(ptr)?;
        self.deallocate(index)
    }

    fn reset(&mut self) {
        SlotPool::reset(self)
    }
}

/// Iterator over the live slots of a [`SlotPool`].
pub struct LiveIndices<'a> {
    bits: SetBits<'a>,
}

impl Iterator for LiveIndices<'_> {
    type Item = u32;

    #[inline]
    fn next(&mut self) -> Option<u32> {
        self.bits.next().map(|bit| bit as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use alloc::vec::Vec;

    #[test]
    fn test_allocate_sequential() {
        let mut pool = SlotPool::new(8, 4).unwrap();
        assert_eq!(pool.allocate(), Ok(0));
        assert_eq!(pool.allocate(), Ok(1));
        assert_eq!(pool.allocate(), Ok(2));
        assert_eq!(pool.watermark(), 3);
        assert_eq!(pool.len(), 3);
        assert_eq!(pool.available(), 1);
    }

    #[test]
    fn test_free_slot_is_reused_first() {
        let mut pool = SlotPool::new(8, 4).unwrap();
        for _ in 0..3 {
            pool.allocate().unwrap();
        }
        pool.deallocate(1).unwrap();
        assert_eq!(pool.allocate(), Ok(1));
        assert_eq!(pool.allocate(), Ok(3));
    }

    #[test]
    fn test_out_of_memory() {
        let mut pool = SlotPool::new(4, 2).unwrap();
        pool.allocate().unwrap();
        pool.allocate().unwrap();
        assert_eq!(pool.allocate(), Err(PoolError::OutOfMemory { capacity: 2 }));

        pool.deallocate(0).unwrap();
        assert_eq!(pool.allocate(), Ok(0));
    }

    #[test]
    fn test_double_free_reported() {
        let mut pool = SlotPool::new(4, 4).unwrap();
        let slot = pool.allocate().unwrap();
        pool.deallocate(slot).unwrap();
        assert_eq!(
            pool.deallocate(slot),
            Err(PoolError::NotAllocated { index: slot })
        );
        assert_eq!(pool.free_indices().count(), 1);
    }

    #[test]
    fn test_untracked_free_reported() {
        let mut pool = SlotPool::new(4, 4).unwrap();
        pool.allocate().unwrap();
        assert_eq!(
            pool.deallocate(2),
            Err(PoolError::OutOfRange {
                index: 2,
                watermark: 1
            })
        );
        assert_eq!(
            pool.deallocate(EMPTY),
            Err(PoolError::OutOfRange {
                index: EMPTY,
                watermark: 1
            })
        );
    }

    #[test]
    fn test_element_too_small() {
        assert_eq!(
            SlotPool::new(2, 8).unwrap_err(),
            Error::Pool(PoolError::ElementTooSmall { size: 2 })
        );
    }

    #[test]
    fn test_index_pointer_round_trip() {
        let mut pool = SlotPool::new(12, 8).unwrap();
        let slots: Vec<u32> = (0..5).map(|_| pool.allocate().unwrap()).collect();

        for &index in &slots {
            let ptr = pool.idx2ptr(index).unwrap();
            assert_eq!(pool.ptr2idx(ptr), Ok(index));
        }

        let first = pool.idx2ptr(0).unwrap();
        let second = pool.idx2ptr(1).unwrap();
        assert_eq!(second.addr() - first.addr(), 12);
    }

    #[test]
    fn test_translation_bounded_by_watermark() {
        let mut pool = SlotPool::new(4, 8).unwrap();
        pool.allocate().unwrap();

        assert_eq!(
            pool.idx2ptr(1),
            Err(PoolError::OutOfRange {
                index: 1,
                watermark: 1
            })
        );

        // Inside the storage but above the watermark.
        let above = index_to_addr(pool.storage.as_ptr(), 3, 4);
        assert_eq!(
            pool.ptr2idx(above),
            Err(PoolError::OutOfRange {
                index: 3,
                watermark: 1
            })
        );
    }

    #[test]
    fn test_foreign_pointer() {
        let pool = SlotPool::new(4, 8).unwrap();
        let other = [0u8; 4];
        assert_eq!(
            pool.ptr2idx(SlotPtr::new(other.as_ptr() as *mut u8)),
            Err(PoolError::ForeignPointer)
        );
    }

    #[test]
    fn test_sentinel_translation() {
        let pool = SlotPool::new(4, 8).unwrap();
        assert!(pool.idx2ptr(EMPTY).unwrap().is_null());
        assert_eq!(pool.ptr2idx(SlotPtr::NULL), Ok(EMPTY));
    }

    #[test]
    fn test_slot_views_only_for_live_slots() {
        let mut pool = SlotPool::new(8, 4).unwrap();
        let slot = pool.allocate().unwrap();

        pool.slot_mut(slot).unwrap().copy_from_slice(&[7; 8]);
        assert_eq!(pool.slot(slot).unwrap(), &[7; 8]);

        pool.deallocate(slot).unwrap();
        assert_eq!(pool.slot(slot), Err(PoolError::NotAllocated { index: slot }));
        assert!(pool.slot_mut(3).is_err());
    }

    #[test]
    fn test_live_and_free_partition_watermark() {
        let mut pool = SlotPool::new(4, 16).unwrap();
        for _ in 0..10 {
            pool.allocate().unwrap();
        }
        for index in [2, 7, 4] {
            pool.deallocate(index).unwrap();
        }

        let live: Vec<u32> = pool.live_indices().collect();
        let free: Vec<u32> = pool.free_indices().collect();
        assert_eq!(live, [0, 1, 3, 5, 6, 8, 9]);
        assert_eq!(free, [4, 7, 2]);
        assert_eq!(live.len() + free.len(), pool.watermark() as usize);
    }

    #[test]
    fn test_reset() {
        let mut pool = SlotPool::new(4, 4).unwrap();
        pool.allocate().unwrap();
        pool.allocate().unwrap();
        pool.deallocate(0).unwrap();

        pool.reset();
        assert_eq!(pool.watermark(), 0);
        assert!(pool.is_empty());
        assert!(!pool.is_live(1));
        assert_eq!(pool.allocate(), Ok(0));
    }

    #[test]
    fn test_with_storage_and_release() {
        let storage = vec![0u8; 40].into_boxed_slice();
        let mut pool = SlotPool::with_storage(storage, 16).unwrap();
        assert_eq!(pool.capacity(), 2);

        let slot = pool.allocate().unwrap();
        pool.slot_mut(slot).unwrap()[0] = 0x5A;

        let storage = pool.release();
        assert_eq!(storage.len(), 40);
        assert_eq!(storage[0], 0x5A);
    }

    #[test]
    fn test_fixed_allocator() {
        let mut pool = SlotPool::from_config(&PoolConfig::for_type::<u64>(4)).unwrap();
        assert_eq!(FixedAllocator::element_size(&pool), 8);

        let ptr = pool.alloc_slot().unwrap();
        assert_eq!(pool.ptr2idx(ptr), Ok(0));
        pool.free_slot(ptr).unwrap();
        assert!(!pool.is_live(0));
        assert_eq!(pool.free_slot(ptr), Err(PoolError::NotAllocated { index: 0 }));
    }

    #[test]
    fn test_config_rounds_up_small_types() {
        let config = PoolConfig::for_type::<u8>(10);
        assert_eq!(config.element_size, MIN_ELEMENT_SIZE);
        assert_eq!(config.storage_bytes(), Some(40));
    }

    #[test]
    fn test_storage_size_overflow() {
        assert_eq!(PoolConfig::new(usize::MAX / 2, 4).storage_bytes(), None);
        assert_eq!(PoolConfig::new(usize::MAX / 4, 4).storage_bytes(), None);

        let err = SlotPool::new(usize::MAX / 2, 4).unwrap_err();
        assert!(matches!(
            err,
            Error::Pool(PoolError::StorageTooSmall { .. })
        ));
    }
}
