//! Allocator seams shared by the pools.

use core::ptr::NonNull;

use crate::error::PoolError;
use crate::pool::SlotPtr;

/// General-purpose allocator handing out blocks of any size and alignment.
pub trait Allocator {
    /// Allocate `size` bytes aligned to `align`.
    ///
    /// # Errors
    /// `BadAlignment` if `align` is not a power of two, `Exhausted` when the
    /// backing storage cannot fit the request
    fn allocate(&mut self, size: usize, align: usize) -> Result<NonNull<u8>, PoolError>;

    /// Return a block obtained from [`allocate`](Allocator::allocate).
    fn deallocate(&mut self, ptr: NonNull<u8>) -> Result<(), PoolError>;

    /// Forget every outstanding block.
    fn reset(&mut self);
}

/// Allocator of equally sized slots.
pub trait FixedAllocator {
    /// Size of every slot in bytes.
    fn element_size(&self) -> usize;

    /// Allocate one slot.
    fn alloc_slot(&mut self) -> Result<SlotPtr, PoolError>;

    /// Return a slot obtained from [`alloc_slot`](FixedAllocator::alloc_slot).
    fn free_slot(&mut self, ptr: SlotPtr) -> Result<(), PoolError>;

    /// Forget every outstanding slot.
    fn reset(&mut self);
}
