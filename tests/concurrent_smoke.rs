//! Coarse-lock concurrency smoke test.
//!
//! The map itself is single-threaded; the workbench wraps one lock around
//! each map. This test runs the benchmark's critical section (lower-bound,
//! maybe erase, maybe insert) from several threads under a single
//! `parking_lot::Mutex` and checks that the structure survives intact.

use std::sync::atomic::{AtomicI64, Ordering};

use memtree::BtreeMap;
use parking_lot::Mutex;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

const THREADS: usize = 4;
const OPS_PER_THREAD: usize = 2_000;
const KEY_SPACE: u32 = 1 << 12;

#[test]
fn coarse_locked_map_survives_contention() {
    let map = Mutex::new(BtreeMap::<u32, u32>::new());
    let net_records = AtomicI64::new(0);

    {
        let mut guard = map.lock();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        for _ in 0..1_000 {
            if guard.insert(rng.gen_range(0..KEY_SPACE), 0) {
                net_records.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    std::thread::scope(|scope| {
        for thread in 0..THREADS {
            let map = &map;
            let net_records = &net_records;
            scope.spawn(move || {
                let mut rng = ChaCha8Rng::seed_from_u64(100 + thread as u64);
                for _ in 0..OPS_PER_THREAD {
                    let mut guard = map.lock();

                    let probe = rng.gen_range(0..KEY_SPACE);
                    let it = guard.lower_bound(&probe);
                    let erased = if rng.gen_bool(0.5) {
                        match it.key() {
                            Some(_) => {
                                let pos = it.pos();
                                guard.erase_at(pos);
                                net_records.fetch_sub(1, Ordering::Relaxed);
                                true
                            }
                            None => false,
                        }
                    } else {
                        false
                    };

                    if erased && guard.insert(rng.gen_range(0..KEY_SPACE), 0) {
                        net_records.fetch_add(1, Ordering::Relaxed);
                    }
                }
            });
        }
    });

    let guard = map.lock();
    assert!(guard.is_valid());
    assert_eq!(guard.size() as i64, net_records.load(Ordering::Relaxed));

    let keys: Vec<u32> = guard.iter().map(|(k, _)| k).collect();
    for pair in keys.windows(2) {
        assert!(pair[0] < pair[1]);
    }
}
