//! Fuzz testing for map operations.
//!
//! Applies an arbitrary sequence of map operations to the B+tree map and a
//! `std::collections::BTreeMap` model, asserting result parity and a clean
//! structural audit after every structural mutation.

#![no_main]

use std::collections::BTreeMap as StdMap;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use memtree::BtreeMap;

#[derive(Debug, Arbitrary, Clone, Copy)]
enum MapOp {
    Insert { key: u16, value: u32 },
    Erase { key: u16 },
    LowerBound { key: u16 },
    EraseAtLowerBound { key: u16 },
    Clear,
}

#[derive(Debug, Arbitrary)]
struct MapInput {
    ops: Vec<MapOp>,
}

fuzz_target!(|input: MapInput| {
    let mut map: BtreeMap<u32, u32, 128> = BtreeMap::new();
    let mut model: StdMap<u32, u32> = StdMap::new();

    for op in input.ops {
        match op {
            MapOp::Insert { key, value } => {
                let key = key as u32;
                let was_present = model.contains_key(&key);
                if !was_present {
                    model.insert(key, value);
                }
                assert_eq!(map.insert(key, value), !was_present);
            }
            MapOp::Erase { key } => {
                let key = key as u32;
                assert_eq!(map.erase(&key), model.remove(&key).is_some());
            }
            MapOp::LowerBound { key } => {
                let key = key as u32;
                let expected = model.range(key..).next().map(|(&k, &v)| (k, v));
                let it = map.lower_bound(&key);
                assert_eq!(it.key().zip(it.value()), expected);
            }
            MapOp::EraseAtLowerBound { key } => {
                let key = key as u32;
                let it = map.lower_bound(&key);
                assert_eq!(it.key(), model.range(key..).next().map(|(&k, _)| k));
                if let Some(found) = it.key() {
                    let pos = it.pos();
                    map.erase_at(pos);
                    model.remove(&found);
                }
            }
            MapOp::Clear => {
                map.clear();
                model.clear();
            }
        }
        assert!(map.is_valid());
    }

    let got: Vec<(u32, u32)> = map.iter().collect();
    let want: Vec<(u32, u32)> = model.iter().map(|(&k, &v)| (k, v)).collect();
    assert_eq!(got, want);
    assert_eq!(map.size(), model.len());
});
