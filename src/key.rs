//! Key accessor contract between a trie and the values it indexes.
//!
//! Values carry their own 64-bit key. The trie never stores keys itself: it
//! asks the accessor for a value's key when it needs to verify a match, and
//! hands the key to the accessor when a value is inserted.

use crate::error::PoolError;
use crate::pool::{SlotPool, SlotPtr, SlotRef};

/// Reads and writes the key embedded in a value.
///
/// # Type Parameters
/// * `R` - How the trie refers to values (slot index or slot pointer)
///
/// # Contract
/// - `get_key(v)` returns the key last written by `set_key(v, _)`
/// - The trie only passes references it was given through `add`
pub trait KeyAccess<R: SlotRef> {
    /// Key stored in `value`.
    fn get_key(&self, value: R) -> u64;

    /// Store `key` in `value`.
    fn set_key(&mut self, value: R, key: u64);
}

impl<R: SlotRef, T: KeyAccess<R> + ?Sized> KeyAccess<R> for &mut T {
    #[inline(always)]
    fn get_key(&self, value: R) -> u64 {
        (**self).get_key(value)
    }

    #[inline(always)]
    fn set_key(&mut self, value: R, key: u64) {
        (**self).set_key(value, key)
    }
}

const KEY_WIDTH: usize = core::mem::size_of::<u64>();

/// Key accessor for values living in a [`SlotPool`].
///
/// The key is a native-endian `u64` at a fixed byte offset inside each slot.
/// Works with both index and pointer references.
///
/// # Example
/// ```rust
/// use dexed::key::{KeyAccess, PoolKeys};
/// use dexed::pool::SlotPool;
///
/// let mut values = PoolKeys::new(SlotPool::new(16, 8).unwrap(), 8).unwrap();
/// let v = values.pool_mut().allocate().unwrap();
/// values.set_key(v, 0xBEEF);
/// assert_eq!(values.get_key(v), 0xBEEF);
/// ```
#[derive(Debug)]
pub struct PoolKeys {
    pool: SlotPool,
    key_offset: usize,
}

impl PoolKeys {
    /// Wrap `pool`, storing keys at `key_offset` in each slot.
    ///
    /// # Errors
    /// `StorageTooSmall` if the key does not fit inside one slot
    pub fn new(pool: SlotPool, key_offset: usize) -> Result<Self, PoolError> {
        let needed = key_offset + KEY_WIDTH;
        if needed > pool.element_size() {
            return Err(PoolError::StorageTooSmall {
                needed,
                actual: pool.element_size(),
            });
        }
        Ok(PoolKeys { pool, key_offset })
    }

    pub fn pool(&self) -> &SlotPool {
        &self.pool
    }

    pub fn pool_mut(&mut self) -> &mut SlotPool {
        &mut self.pool
    }

    pub fn into_pool(self) -> SlotPool {
        self.pool
    }

    /// # Panics
    /// Panics if `index` is not a live slot; the trie only holds references
    /// that were live when added.
    fn read(&self, index: u32) -> u64 {
        let slot = self
            .pool
            .slot(index)
            .unwrap_or_else(|err| panic!("key read from slot {}: {}", index, err));
        let mut raw = [0u8; KEY_WIDTH];
        raw.copy_from_slice(&slot[self.key_offset..self.key_offset + KEY_WIDTH]);
        u64::from_ne_bytes(raw)
    }

    /// # Panics
    /// Panics if `index` is not a live slot.
    fn write(&mut self, index: u32, key: u64) {
        let offset = self.key_offset;
        let slot = self
            .pool
            .slot_mut(index)
            .unwrap_or_else(|err| panic!("key write to slot {}: {}", index, err));
        slot[offset..offset + KEY_WIDTH].copy_from_slice(&key.to_ne_bytes());
    }

    fn index_of(&self, ptr: SlotPtr) -> u32 {
        self.pool
            .ptr2idx(ptr)
            .unwrap_or_else(|err| panic!("key access through {:?}: {}", ptr, err))
    }
}

impl KeyAccess<u32> for PoolKeys {
    #[inline]
    fn get_key(&self, value: u32) -> u64 {
        self.read(value)
    }

    #[inline]
    fn set_key(&mut self, value: u32, key: u64) {
        self.write(value, key)
    }
}

impl KeyAccess<SlotPtr> for PoolKeys {
    #[inline]
    fn get_key(&self, value: SlotPtr) -> u64 {
        self.read(self.index_of(value))
    }

    #[inline]
    fn set_key(&mut self, value: SlotPtr, key: u64) {
        let index = self.index_of(value);
        self.write(index, key)
    }
}
