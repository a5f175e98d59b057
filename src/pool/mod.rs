//! Slot pools and allocators.
//!
//! [`SlotPool`] is the fixed-size pool with index/pointer duality that backs
//! trie nodes. [`BumpAllocator`] and [`SizedAlloc`] cover general-purpose
//! allocation; [`DexedArray`] translates indices over an existing array.

mod bump;
mod dexer;
mod free_list;
mod handle;
mod slot_pool;
mod traits;

pub use bump::{BumpAllocator, SizedAlloc};
pub use dexer::{DexedArray, Dexer};
pub use free_list::{FreeIter, FreeList};
pub use handle::{SlotPtr, SlotRef};
pub use slot_pool::{LiveIndices, PoolConfig, SlotPool};
pub use traits::{Allocator, FixedAllocator};
