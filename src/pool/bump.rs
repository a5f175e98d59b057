//! Bump allocator and the fixed-size adapter over general allocators.

use alloc::boxed::Box;
use alloc::vec;
use core::ptr::NonNull;

use crate::constants::MIN_ELEMENT_SIZE;
use crate::error::PoolError;
use crate::pool::{Allocator, FixedAllocator, SlotPtr};

/// Linear allocator over one byte block.
///
/// Blocks are carved from a moving cursor and never individually reused.
/// When the last outstanding block is returned the cursor rewinds to the
/// start and the whole block becomes available again.
///
/// # Performance
/// O(1) allocate and deallocate
#[derive(Debug)]
pub struct BumpAllocator {
    storage: Box<[u8]>,
    cursor: usize,
    outstanding: usize,
}

impl BumpAllocator {
    /// Create an allocator over `size` freshly allocated bytes.
    pub fn new(size: usize) -> Self {
        Self::with_storage(vec![0u8; size].into_boxed_slice())
    }

    /// Create an allocator over caller-provided storage.
    pub fn with_storage(storage: Box<[u8]>) -> Self {
        tracing::debug!(size = storage.len(), "bump allocator initialized");
        BumpAllocator {
            storage,
            cursor: 0,
            outstanding: 0,
        }
    }

    /// Bytes consumed so far, alignment padding included.
    #[inline]
    pub fn used(&self) -> usize {
        self.cursor
    }

    /// Bytes left above the cursor.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.storage.len() - self.cursor
    }

    /// Number of blocks not yet returned.
    #[inline]
    pub fn outstanding(&self) -> usize {
        self.outstanding
    }

    /// Drop the allocator and hand the storage back.
    pub fn into_storage(self) -> Box<[u8]> {
        self.storage
    }
}

impl Allocator for BumpAllocator {
    /// # Arguments
    /// * `size` - Block size in bytes
    /// * `align` - Required alignment of the block address (power of two)
    fn allocate(&mut self, size: usize, align: usize) -> Result<NonNull<u8>, PoolError> {
        if !align.is_power_of_two() {
            return Err(PoolError::BadAlignment { align });
        }

        let base = self.storage.as_ptr() as usize;
        let exhausted = PoolError::Exhausted {
            requested: size,
            remaining: self.remaining(),
        };
        let start = (base + self.cursor)
            .checked_add(align - 1)
            .map(|addr| (addr & !(align - 1)) - base)
            .ok_or(exhausted)?;
        let end = start.checked_add(size).ok_or(exhausted)?;
        if end > self.storage.len() {
            tracing::warn!(size, align, remaining = self.remaining(), "bump allocator exhausted");
            return Err(exhausted);
        }

        self.cursor = end;
        self.outstanding += 1;
        tracing::trace!(offset = start, size, "block allocated");
        Ok(NonNull::from(&mut self.storage[start..]).cast())
    }

    fn deallocate(&mut self, ptr: NonNull<u8>) -> Result<(), PoolError> {
        let base = self.storage.as_ptr() as usize;
        let addr = ptr.as_ptr() as usize;
        if self.outstanding == 0 || addr < base || addr > base + self.cursor {
            return Err(PoolError::ForeignPointer);
        }

        self.outstanding -= 1;
        if self.outstanding == 0 {
            self.cursor = 0;
            tracing::trace!("bump allocator rewound");
        }
        Ok(())
    }

    fn reset(&mut self) {
        self.cursor = 0;
        self.outstanding = 0;
    }
}

/// Fixed-size allocator carved out of a general [`Allocator`].
///
/// Every slot is `element_size` bytes aligned to `align`.
#[derive(Debug)]
pub struct SizedAlloc<A: Allocator> {
    inner: A,
    element_size: usize,
    align: usize,
}

impl<A: Allocator> SizedAlloc<A> {
    /// # Errors
    /// `ElementTooSmall` below 4 bytes, `BadAlignment` if `align` is not a
    /// power of two
    pub fn new(inner: A, element_size: usize, align: usize) -> Result<Self, PoolError> {
        if element_size < MIN_ELEMENT_SIZE {
            return Err(PoolError::ElementTooSmall { size: element_size });
        }
        if !align.is_power_of_two() {
            return Err(PoolError::BadAlignment { align });
        }
        Ok(SizedAlloc {
            inner,
            element_size,
            align,
        })
    }

    pub fn inner(&self) -> &A {
        &self.inner
    }

    pub fn into_inner(self) -> A {
        self.inner
    }
}

impl<A: Allocator> FixedAllocator for SizedAlloc<A> {
    fn element_size(&self) -> usize {
        self.element_size
    }

    fn alloc_slot(&mut self) -> Result<SlotPtr, PoolError> {
        let block = self.inner.allocate(self.element_size, self.align)?;
        Ok(SlotPtr::new(block.as_ptr()))
    }

    fn free_slot(&mut self, ptr: SlotPtr) -> Result<(), PoolError> {
        let block = NonNull::new(ptr.as_ptr()).ok_or(PoolError::ForeignPointer)?;
        self.inner.deallocate(block)
    }

    fn reset(&mut self) {
        self.inner.reset()
    }
}
