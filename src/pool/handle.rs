//! Slot references: 32-bit indices or raw slot pointers.
//!
//! Trie nodes store their children as [`SlotRef`] values. Both flavours share
//! one algorithm; only the encoding and the index translation differ.

use core::fmt;
use core::mem::size_of;

use crate::constants::EMPTY;
use crate::error::PoolError;
use crate::pool::Dexer;

/// Raw address of a slot, or null.
///
/// An opaque handle: the crate never dereferences it, it only translates it
/// back to an index through the owning pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotPtr(*mut u8);

impl SlotPtr {
    /// The null pointer, counterpart of the `EMPTY` index.
    pub const NULL: SlotPtr = SlotPtr(core::ptr::null_mut());

    /// Wrap a raw pointer.
    #[inline(always)]
    pub const fn new(ptr: *mut u8) -> Self {
        SlotPtr(ptr)
    }

    /// The wrapped raw pointer.
    #[inline(always)]
    pub const fn as_ptr(self) -> *mut u8 {
        self.0
    }

    /// Numeric address of the pointer.
    #[inline(always)]
    pub fn addr(self) -> usize {
        self.0 as usize
    }

    #[inline(always)]
    pub fn is_null(self) -> bool {
        self.0.is_null()
    }
}

impl Default for SlotPtr {
    fn default() -> Self {
        Self::NULL
    }
}

/// A reference that can be stored inside a trie node.
///
/// # Contract
/// - `NULL` encodes "no child"
/// - `read`/`write` use exactly `WIDTH` bytes
/// - `from_index`/`to_index` translate through the pool that owns the slot
pub trait SlotRef: Copy + Eq + fmt::Debug {
    /// The "empty" reference.
    const NULL: Self;

    /// Encoded width in bytes.
    const WIDTH: usize;

    /// Decode a reference from the first `WIDTH` bytes of `bytes`.
    fn read(bytes: &[u8]) -> Self;

    /// Encode the reference into the first `WIDTH` bytes of `bytes`.
    fn write(self, bytes: &mut [u8]);

    /// Reference to slot `index` of `dexer`.
    fn from_index<D: Dexer + ?Sized>(dexer: &D, index: u32) -> Result<Self, PoolError>;

    /// Slot index of this reference within `dexer`.
    fn to_index<D: Dexer + ?Sized>(self, dexer: &D) -> Result<u32, PoolError>;

    #[inline(always)]
    fn is_null(self) -> bool {
        self == Self::NULL
    }
}

impl SlotRef for u32 {
    const NULL: u32 = EMPTY;
    const WIDTH: usize = size_of::<u32>();

    #[inline]
    fn read(bytes: &[u8]) -> Self {
        let mut raw = [0u8; size_of::<u32>()];
        raw.copy_from_slice(&bytes[..Self::WIDTH]);
        u32::from_ne_bytes(raw)
    }

    #[inline]
    fn write(self, bytes: &mut [u8]) {
        bytes[..Self::WIDTH].copy_from_slice(&self.to_ne_bytes());
    }

    #[inline(always)]
    fn from_index<D: Dexer + ?Sized>(_dexer: &D, index: u32) -> Result<Self, PoolError> {
        Ok(index)
    }

    #[inline(always)]
    fn to_index<D: Dexer + ?Sized>(self, _dexer: &D) -> Result<u32, PoolError> {
        Ok(self)
    }
}

impl SlotRef for SlotPtr {
    const NULL: SlotPtr = SlotPtr::NULL;
    const WIDTH: usize = size_of::<usize>();

    #[inline]
    fn read(bytes: &[u8]) -> Self {
        let mut raw = [0u8; size_of::<usize>()];
        raw.copy_from_slice(&bytes[..Self::WIDTH]);
        SlotPtr(usize::from_ne_bytes(raw) as *mut u8)
    }

    #[inline]
    fn write(self, bytes: &mut [u8]) {
        bytes[..Self::WIDTH].copy_from_slice(&self.addr().to_ne_bytes());
    }

    #[inline]
    fn from_index<D: Dexer + ?Sized>(dexer: &D, index: u32) -> Result<Self, PoolError> {
        dexer.idx2ptr(index)
    }

    #[inline]
    fn to_index<D: Dexer + ?Sized>(self, dexer: &D) -> Result<u32, PoolError> {
        dexer.ptr2idx(self)
    }
}
