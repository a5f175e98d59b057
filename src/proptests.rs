use crate::bitmap::HiBitset;
use crate::key::{KeyAccess, PoolKeys};
use crate::pool::SlotPool;
use crate::trie::{IndexTrie, Node, TrieConfig};

use proptest::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use std::vec::Vec;

fn validate_pool(pool: &SlotPool) {
    let live: Vec<u32> = pool.live_indices().collect();
    let free: Vec<u32> = pool.free_indices().collect();

    let mut seen = BTreeSet::new();
    for &index in live.iter().chain(free.iter()) {
        assert!(index < pool.watermark(), "slot {index} above watermark");
        assert!(seen.insert(index), "slot {index} is both live and free");
    }
    assert_eq!(
        seen.len(),
        pool.watermark() as usize,
        "live and free slots must cover the watermark"
    );
    assert_eq!(live.len(), pool.len() as usize);

    for &index in &live {
        let ptr = pool.idx2ptr(index).unwrap();
        assert_eq!(pool.ptr2idx(ptr), Ok(index));
    }
}

#[derive(Clone, Debug)]
enum PoolOp {
    Alloc,
    /// Free the n-th allocated slot (modulo the live count).
    Free(usize),
    /// Free an arbitrary index, valid or not.
    FreeRaw(u32),
}

fn pool_ops() -> impl Strategy<Value = Vec<PoolOp>> {
    let op = prop_oneof![
        50 => Just(PoolOp::Alloc),
        40 => any::<usize>().prop_map(PoolOp::Free),
        10 => (0u32..80).prop_map(PoolOp::FreeRaw),
    ];
    prop::collection::vec(op, 0..=400)
}

#[derive(Clone, Debug)]
enum BitOp {
    Set(u64),
    Clr(u64),
}

fn bitset_case() -> impl Strategy<Value = (u64, Vec<BitOp>, Vec<u64>)> {
    (1u64..5000).prop_flat_map(|maxbits| {
        let op = prop_oneof![
            (0..maxbits).prop_map(BitOp::Set),
            (0..maxbits).prop_map(BitOp::Clr),
        ];
        (
            Just(maxbits),
            prop::collection::vec(op, 0..=300),
            prop::collection::vec(0..maxbits + 40, 0..=40),
        )
    })
}

#[derive(Clone, Debug)]
enum TrieOp {
    Add(u64),
    Remove(u64),
    Find(u64),
}

fn trie_ops(keys: impl Strategy<Value = u64> + Clone) -> impl Strategy<Value = Vec<TrieOp>> {
    let op = prop_oneof![
        50 => keys.clone().prop_map(TrieOp::Add),
        30 => keys.clone().prop_map(TrieOp::Remove),
        20 => keys.prop_map(TrieOp::Find),
    ];
    prop::collection::vec(op, 0..=300)
}

/// Apply `ops` to `trie` and to a `BTreeMap` model, checking every step.
fn run_against_model(trie: &mut IndexTrie<PoolKeys>, ops: Vec<TrieOp>) -> Result<(), TestCaseError> {
    let mut model: BTreeMap<u64, u32> = BTreeMap::new();

    for op in ops {
        match op {
            TrieOp::Add(key) => {
                let value = trie.key_access_mut().pool_mut().allocate().unwrap();
                let added = trie.add(key, value);
                let accepted = trie.layout().accepts(key) && !model.contains_key(&key);
                prop_assert_eq!(added, accepted);
                if added {
                    model.insert(key, value);
                    prop_assert_eq!(trie.key_access().get_key(value), key);
                } else {
                    trie.key_access_mut().pool_mut().deallocate(value).unwrap();
                }
            }
            TrieOp::Remove(key) => {
                let removed = trie.remove(key);
                prop_assert_eq!(removed, model.remove(&key));
                if let Some(value) = removed {
                    trie.key_access_mut().pool_mut().deallocate(value).unwrap();
                }
            }
            TrieOp::Find(key) => {
                prop_assert_eq!(trie.find(key), model.get(&key).copied());
            }
        }
        prop_assert_eq!(trie.len(), model.len());
    }

    let got: Vec<(u64, u32)> = trie.iter().collect();
    let expected: Vec<(u64, u32)> = model.iter().map(|(&k, &v)| (k, v)).collect();
    prop_assert_eq!(got, expected);

    let keys: Vec<u64> = model.keys().copied().collect();
    for key in keys {
        let value = trie.remove(key);
        prop_assert!(value.is_some());
        if let Some(value) = value {
            trie.key_access_mut().pool_mut().deallocate(value).unwrap();
        }
    }
    prop_assert_eq!(trie.node_count(), 1, "only the root survives");
    prop_assert_eq!(trie.key_access().pool().len(), 0);
    Ok(())
}

fn new_trie(config: TrieConfig, depth: usize) -> IndexTrie<PoolKeys> {
    let nodes = SlotPool::new(Node::<u32>::SIZE, 1 + 300 * depth as u32).unwrap();
    let values = PoolKeys::new(SlotPool::new(8, 301).unwrap(), 0).unwrap();
    IndexTrie::new(nodes, values, config).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 128,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_pool_free_list_sound(ops in pool_ops()) {
        let mut pool = SlotPool::new(8, 64).unwrap();
        let mut live: Vec<u32> = Vec::new();

        for op in ops {
            match op {
                PoolOp::Alloc => match pool.allocate() {
                    Ok(index) => {
                        prop_assert!(!live.contains(&index));
                        live.push(index);
                    }
                    Err(_) => {
                        prop_assert_eq!(live.len(), 64);
                    }
                },
                PoolOp::Free(n) if !live.is_empty() => {
                    let index = live.swap_remove(n % live.len());
                    prop_assert!(pool.deallocate(index).is_ok());
                }
                PoolOp::Free(_) => {}
                PoolOp::FreeRaw(index) => {
                    let result = pool.deallocate(index);
                    prop_assert_eq!(result.is_ok(), live.contains(&index));
                    live.retain(|&l| l != index);
                }
            }
            prop_assert_eq!(pool.len() as usize, live.len());
        }

        validate_pool(&pool);
    }

    #[test]
    fn prop_bitset_matches_linear_model((maxbits, ops, pivots) in bitset_case()) {
        let mut bits = HiBitset::new(maxbits).unwrap();
        let mut model = vec![false; maxbits as usize];

        for op in ops {
            match op {
                BitOp::Set(bit) => {
                    bits.set(bit);
                    model[bit as usize] = true;
                }
                BitOp::Clr(bit) => {
                    bits.clr(bit);
                    model[bit as usize] = false;
                }
            }
        }

        let set = |b: &u64| model[*b as usize];
        let free = |b: &u64| !model[*b as usize];
        prop_assert_eq!(bits.find(), (0..maxbits).find(set));
        prop_assert_eq!(bits.find_free(), (0..maxbits).find(free));
        prop_assert_eq!(bits.is_empty(), !model.iter().any(|&b| b));
        prop_assert_eq!(bits.is_full(), model.iter().all(|&b| b));

        for pivot in pivots {
            let upto = pivot.min(maxbits - 1);
            prop_assert_eq!(bits.upper(pivot), (pivot..maxbits).find(set));
            prop_assert_eq!(bits.lower(pivot), (0..=upto).rev().find(set));
            prop_assert_eq!(bits.upper_free(pivot), (pivot..maxbits).find(free));
            prop_assert_eq!(bits.lower_free(pivot), (0..=upto).rev().find(free));
        }

        let walked: Vec<u64> = bits.iter().collect();
        let expected: Vec<u64> = (0..maxbits).filter(set).collect();
        prop_assert_eq!(walked, expected);
    }

    #[test]
    fn prop_index_trie_matches_btreemap(
        (count, ops) in (1u32..=300).prop_flat_map(|count| {
            (Just(count), trie_ops(0..count as u64 + 8))
        })
    ) {
        let config = TrieConfig::from_index(count);
        let depth = config.layout().unwrap().depth();
        let mut trie = new_trie(config, depth);
        run_against_model(&mut trie, ops)?;
    }

    #[test]
    fn prop_mask_trie_matches_btreemap(
        (mask, ops) in any::<u64>().prop_filter("mask selects bits", |m| *m != 0).prop_flat_map(|mask| {
            // Small key population inside the mask so keys collide on paths.
            let keys = (0u64..32).prop_map(move |seed| pdep(seed.wrapping_mul(0x9E37_79B9), mask));
            (Just(mask), trie_ops(keys))
        })
    ) {
        let config = TrieConfig::from_mask(mask);
        let depth = config.layout().unwrap().depth();
        let mut trie = new_trie(config, depth);
        run_against_model(&mut trie, ops)?;
    }
}

/// Scatter the low bits of `value` onto the set bits of `mask`.
fn pdep(mut value: u64, mask: u64) -> u64 {
    let mut out = 0;
    let mut remaining = mask;
    while remaining != 0 {
        let bit = remaining & remaining.wrapping_neg();
        if value & 1 != 0 {
            out |= bit;
        }
        value >>= 1;
        remaining &= remaining - 1;
    }
    out
}

#[test]
fn exhaustive_index_population() {
    let mut trie = new_trie(TrieConfig::from_index(300), 5);
    let mut values = Vec::new();
    for key in 0..300u64 {
        let value = trie.key_access_mut().pool_mut().allocate().unwrap();
        assert!(trie.add(key, value));
        values.push(value);
    }

    for (key, value) in trie.iter() {
        assert_eq!(values[key as usize], value);
        assert_eq!(trie.key_access().get_key(value), key);
    }

    for key in (0..300u64).rev() {
        assert_eq!(trie.remove(key), Some(values[key as usize]));
        trie.key_access_mut().pool_mut().deallocate(values[key as usize]).unwrap();
    }
    assert_eq!(trie.node_count(), 1);
    assert_eq!(trie.key_access().pool().len(), 0);
    validate_pool(trie.node_pool());
}
