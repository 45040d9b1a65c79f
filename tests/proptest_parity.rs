//! Property tests: arbitrary operation sequences applied to both the
//! B+tree map and a `std::collections::BTreeMap` model must observe the
//! same results and leave the same contents.

use std::collections::BTreeMap as StdMap;

use memtree::BtreeMap;
use proptest::prelude::*;
use proptest_derive::Arbitrary;

type SmallMap = BtreeMap<u32, u32, 128>;

#[derive(Arbitrary, Debug, Clone, Copy)]
enum Action {
    Insert(#[proptest(strategy = "0..512u32")] u32, u32),
    Erase(#[proptest(strategy = "0..512u32")] u32),
    LowerBound(#[proptest(strategy = "0..600u32")] u32),
    EraseAtLowerBound(#[proptest(strategy = "0..600u32")] u32),
    Clear,
}

fn apply(map: &mut SmallMap, model: &mut StdMap<u32, u32>, action: &Action) {
    match *action {
        Action::Insert(key, value) => {
            let was_present = model.contains_key(&key);
            if !was_present {
                model.insert(key, value);
            }
            assert_eq!(map.insert(key, value), !was_present, "insert({key})");
        }
        Action::Erase(key) => {
            assert_eq!(map.erase(&key), model.remove(&key).is_some(), "erase({key})");
        }
        Action::LowerBound(key) => {
            let expected = model.range(key..).next().map(|(&k, &v)| (k, v));
            let it = map.lower_bound(&key);
            assert_eq!(it.key().zip(it.value()), expected, "lower_bound({key})");
        }
        Action::EraseAtLowerBound(key) => {
            let expected = model.range(key..).next().map(|(&k, _)| k);
            let it = map.lower_bound(&key);
            assert_eq!(it.key(), expected);
            if let Some(found) = it.key() {
                let pos = it.pos();
                let next = map.erase_at(pos);
                model.remove(&found);
                let model_next = model.range(found..).next().map(|(&k, _)| k);
                assert_eq!(map.lower_bound(&found).key(), model_next);
                assert_eq!(next.is_end(), model_next.is_none());
            }
        }
        Action::Clear => {
            map.clear();
            model.clear();
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn operations_match_reference_map(actions: Vec<Action>) {
        let mut map = SmallMap::new();
        let mut model = StdMap::new();

        for action in &actions {
            apply(&mut map, &mut model, action);
        }

        let got: Vec<(u32, u32)> = map.iter().collect();
        let want: Vec<(u32, u32)> = model.iter().map(|(&k, &v)| (k, v)).collect();
        prop_assert_eq!(got, want);
        prop_assert_eq!(map.size(), model.len());
        prop_assert!(map.is_valid());
    }

    #[test]
    fn in_order_iteration_is_strictly_sorted(actions: Vec<Action>) {
        let mut map = SmallMap::new();
        let mut model = StdMap::new();

        for action in &actions {
            apply(&mut map, &mut model, action);
        }

        let keys: Vec<u32> = map.iter().map(|(k, _)| k).collect();
        for pair in keys.windows(2) {
            prop_assert!(pair[0] < pair[1]);
        }
    }
}
