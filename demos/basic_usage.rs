//! Basic usage example for dexed.
//!
//! Builds a slot pool of records, indexes them with an index-mode trie and a
//! mask-mode trie, and tracks free record slots with a hierarchical bitset.

use dexed::bitmap::HiBitset;
use dexed::key::PoolKeys;
use dexed::pool::{SlotPool, SlotPtr};
use dexed::trie::{IndexTrie, Node, PtrTrie, TrieConfig};

fn main() -> Result<(), dexed::Error> {
    println!("=== dexed - Basic Usage Example ===\n");

    // Records are 16 bytes: an 8-byte key followed by an 8-byte payload.
    let records = PoolKeys::new(SlotPool::new(16, 64)?, 0)?;
    let nodes = SlotPool::new(Node::<u32>::SIZE, 32)?;
    let mut by_id = IndexTrie::new(nodes, records, TrieConfig::from_index(64))?;
    println!("Index trie over ids 0..64, depth {}", by_id.depth());

    println!("\nAdding ids: 5, 17, 42, 63");
    for id in [5u64, 17, 42, 63] {
        let record = by_id.key_access_mut().pool_mut().allocate()?;
        let payload = by_id.key_access_mut().pool_mut().slot_mut(record)?;
        payload[8..].copy_from_slice(&(id * 100).to_ne_bytes());
        by_id.try_add(id, record)?;
    }
    println!("  values: {}, nodes: {}", by_id.len(), by_id.node_count());

    println!("\nLookups:");
    println!("  find(17): {:?}", by_id.find(17));
    println!("  find(18): {:?}", by_id.find(18));
    println!("  add(17) again: {}", by_id.add(17, 0));

    println!("\nIteration (ascending ids):");
    for (id, record) in by_id.iter() {
        let bytes = by_id.key_access().pool().slot(record)?;
        let mut payload = [0u8; 8];
        payload.copy_from_slice(&bytes[8..]);
        println!("  id {:>2} -> slot {} payload {}", id, record, u64::from_ne_bytes(payload));
    }

    println!("\nRemoving id 42:");
    if let Some(record) = by_id.remove(42) {
        by_id.key_access_mut().pool_mut().deallocate(record)?;
    }
    println!("  contains(42): {}", by_id.contains(42));
    println!("  values: {}, nodes: {}", by_id.len(), by_id.node_count());

    // Free record slots, found in O(log32 N) instead of a scan.
    println!("\n=== Free Slot Tracking ===\n");
    let pool = by_id.key_access().pool();
    let mut free = HiBitset::new(pool.capacity() as u64)?;
    for index in 0..pool.capacity() {
        if !pool.is_live(index) {
            free.set(index as u64);
        }
    }
    println!("  first free slot: {:?}", free.find());
    println!("  next free slot at or after 10: {:?}", free.upper(10));
    println!("  free slots: {}", free.iter().count());

    // Pointer trie keyed on the high byte of a 16-bit tag.
    println!("\n=== Mask Mode With Pointers ===\n");
    let tags = PoolKeys::new(SlotPool::new(8, 8)?, 0)?;
    let nodes = SlotPool::new(Node::<SlotPtr>::SIZE, 16)?;
    let mut by_tag = PtrTrie::new(nodes, tags, TrieConfig::from_mask(0xFF00))?;
    for tag in [0x0100u64, 0x0200, 0x8000] {
        let index = by_tag.key_access_mut().pool_mut().allocate()?;
        let ptr = by_tag.key_access().pool().idx2ptr(index)?;
        by_tag.try_add(tag, ptr)?;
    }
    println!("  tags: {}, nodes: {}", by_tag.len(), by_tag.node_count());
    println!("  find(0x0200): {:?}", by_tag.find(0x0200));
    println!("  find(0x0201): {:?}", by_tag.find(0x0201));

    let mut detached = 0;
    by_tag.clear(|_| detached += 1)?;
    println!("  cleared {} tags, nodes left: {}", detached, by_tag.node_count());

    Ok(())
}
