//! Bitmap operations: 32-bit word primitives and the hierarchical bitset.
//!
//! The word-level helpers operate on a single `u32`; [`HiBitset`] stacks
//! them into a multi-level summary structure for sub-linear search.

mod basic;
mod hibitset;
mod intrinsics;
mod search;

pub use basic::{bit_mask, clear_bit, is_set, low_mask, set_bit};
pub use hibitset::{HiBitset, SetBits};
pub use intrinsics::{leading_zeros, popcount, trailing_zeros};
pub use search::{first_set_bit, last_set_bit, next_set_bit, prev_set_bit};
