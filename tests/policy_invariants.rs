// ==============================================
// STORE / POLICY INVARIANT TESTS (integration)
// ==============================================
//
// End-to-end eviction scenarios across all policies, plus randomized
// reference-model checks of the store's bookkeeping. These exercise
// the public `Store` surface and span policy + store + list behavior,
// so they live here rather than in any single source file.

use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rustc_hash::FxHashMap;
use stashkit::{PolicyKind, Store};

const HOUR: Duration = Duration::from_secs(3600);

fn store_with(policy: PolicyKind, max_cost: u64) -> Store {
    let mut store = Store::new();
    store.set_policy(policy);
    store.set_max_cost(max_cost);
    store
}

// ==============================================
// Eviction scenarios
// ==============================================

#[test]
fn fifo_evicts_oldest_first() {
    let mut store = store_with(PolicyKind::Fifo, 5);

    store.set(b"1", b"1", Duration::ZERO);
    store.set(b"2", b"2", Duration::ZERO);
    store.set(b"3", b"3", Duration::ZERO);
    store.evict();

    assert!(store.get(b"1").is_none());
    assert_eq!(store.get(b"2").map(|(v, _)| v), Some(b"2".to_vec()));
    assert_eq!(store.get(b"3").map(|(v, _)| v), Some(b"3".to_vec()));
    assert_eq!(store.len(), 2);
    assert_eq!(store.cost(), 4);
}

#[test]
fn lru_get_promotes_the_entry() {
    let mut store = store_with(PolicyKind::Lru, 2);

    store.set(b"0", b"0", Duration::ZERO);
    store.set(b"1", b"1", Duration::ZERO);
    assert_eq!(store.get(b"0").map(|(v, _)| v), Some(b"0".to_vec()));

    // Cost 4 > 2: exactly one eviction, and the victim must be the
    // unaccessed entry.
    store.evict();

    assert!(store.get(b"1").is_none());
    assert!(store.get(b"0").is_some());
}

#[test]
fn lfu_tie_breaks_toward_first_touched() {
    let mut store = store_with(PolicyKind::Lfu, 2);

    store.set(b"0", b"0", Duration::ZERO);
    store.set(b"1", b"1", Duration::ZERO);
    store.get(b"0");
    store.get(b"1");
    store.get(b"1");

    store.evict();

    assert!(store.get(b"0").is_none());
    assert!(store.get(b"1").is_some());
}

#[test]
fn ltr_evicts_longest_remaining_and_follows_updates() {
    let mut store = store_with(PolicyKind::Ltr, 2);

    store.set(b"0", b"0", HOUR);
    store.set(b"1", b"1", 2 * HOUR);
    store.evict();

    assert!(store.get(b"1").is_none());
    assert!(store.get(b"0").is_some());

    // Extending the survivor's ttl makes it the next victim.
    store.set(b"0", b"0", 3 * HOUR);
    store.set_max_cost(1);
    store.evict();

    assert!(store.get(b"0").is_none());
    assert_eq!(store.len(), 0);
}

#[test]
fn ltr_without_evict_zero_protects_unbounded_entries() {
    let mut store = Store::new();
    store.set_evict_zero(false);
    store.set_policy(PolicyKind::Ltr);
    store.set_max_cost(1);

    store.set(b"0", b"0", Duration::ZERO);
    store.set(b"1", b"1", Duration::ZERO);
    store.evict();

    // Over budget but every entry is unbounded: nothing may go.
    assert_eq!(store.len(), 2);
}

#[test]
fn lru_eviction_follows_reverse_access_order() {
    let mut store = store_with(PolicyKind::Lru, 0);

    for i in 0u64..5 {
        store.set(&i.to_le_bytes(), b"v", Duration::ZERO);
    }
    for i in [3u64, 0, 4, 1, 2] {
        store.get(&i.to_le_bytes());
    }

    // Most recent access sits at the front, least recent at the back.
    let expected: Vec<Vec<u8>> = [2u64, 1, 4, 0, 3]
        .iter()
        .map(|i| i.to_le_bytes().to_vec())
        .collect();
    assert_eq!(store.eviction_order(), expected);

    // Each entry costs 9; a budget of one entry evicts the other four
    // and the survivor must be the most recently accessed.
    store.set_max_cost(9);
    store.evict();
    assert_eq!(store.len(), 1);
    assert!(store.get(&2u64.to_le_bytes()).is_some());
}

#[test]
fn lfu_hot_keys_outlive_cold_keys() {
    let mut store = store_with(PolicyKind::Lfu, 0);

    store.set(b"hot", b"v", Duration::ZERO);
    store.set(b"cold", b"v", Duration::ZERO);
    for _ in 0..10 {
        store.get(b"hot");
    }
    store.get(b"cold");

    store.set_max_cost(5);
    store.evict();

    assert!(store.get(b"cold").is_none());
    assert!(store.get(b"hot").is_some());
}

// ==============================================
// Resize and cleanup behavior
// ==============================================

#[test]
fn resize_preserves_all_entries() {
    let mut store = Store::new();

    for i in 0u64..9 {
        let key = i.to_le_bytes();
        store.set(&key, &key, Duration::ZERO);
        if i == 6 {
            // The 7th insert is the first to cross 0.75 * 8.
            assert_eq!(store.capacity(), 16);
        }
    }

    for i in 0u64..9 {
        assert!(store.get(&i.to_le_bytes()).is_some(), "key {i} lost");
    }
    store.debug_validate_invariants();
}

#[test]
fn cleanup_removes_exactly_the_expired() {
    let mut store = Store::new();
    store.set(b"A", b"a", Duration::from_millis(500));
    store.set(b"B", b"b", HOUR);

    std::thread::sleep(Duration::from_millis(600));
    store.cleanup();

    assert!(store.get(b"A").is_none());
    assert_eq!(store.get(b"B").map(|(v, _)| v), Some(b"b".to_vec()));
    assert_eq!(store.len(), 1);
}

// ==============================================
// Reference-model properties
// ==============================================

#[test]
fn random_ops_match_reference_model() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    let mut store = Store::new();
    let mut model: FxHashMap<Vec<u8>, Vec<u8>> = FxHashMap::default();

    for _ in 0..5_000 {
        let key = format!("key-{}", rng.gen_range(0u32..200)).into_bytes();
        match rng.gen_range(0u8..10) {
            // Set dominates so the table actually grows.
            0..=5 => {
                let value = vec![b'v'; rng.gen_range(0usize..32)];
                store.set(&key, &value, Duration::ZERO);
                model.insert(key, value);
            }
            6..=7 => {
                let expected = model.get(&key).cloned();
                let got = store.get(&key).map(|(v, _)| v);
                assert_eq!(got, expected);
            }
            _ => {
                let expected = model.remove(&key).is_some();
                assert_eq!(store.delete(&key), expected);
            }
        }
    }

    // Live set and bookkeeping agree with the reference mapping.
    assert_eq!(store.len() as usize, model.len());
    let expected_cost: u64 = model
        .iter()
        .map(|(k, v)| (k.len() + v.len()) as u64)
        .sum();
    assert_eq!(store.cost(), expected_cost);

    for (key, value) in &model {
        assert_eq!(store.get(key).map(|(v, _)| v).as_ref(), Some(value));
    }

    // Load factor and power-of-two capacity hold after every history.
    assert!(store.capacity().is_power_of_two());
    assert!(store.capacity() >= 8);
    assert!(store.len() as f64 / store.capacity() as f64 <= 0.75);

    // Eviction-list membership equals table membership.
    let mut listed = store.eviction_order();
    listed.sort();
    let mut expected: Vec<Vec<u8>> = model.keys().cloned().collect();
    expected.sort();
    assert_eq!(listed, expected);

    store.debug_validate_invariants();
}

#[test]
fn random_ops_under_every_policy_stay_consistent() {
    for policy in [
        PolicyKind::None,
        PolicyKind::Fifo,
        PolicyKind::Lru,
        PolicyKind::Lfu,
        PolicyKind::Ltr,
    ] {
        let mut rng = StdRng::seed_from_u64(policy.as_u64());
        let mut store = store_with(policy, 512);

        for _ in 0..2_000 {
            let key = format!("key-{}", rng.gen_range(0u32..100)).into_bytes();
            match rng.gen_range(0u8..8) {
                0..=4 => {
                    let ttl = if rng.gen_bool(0.3) { HOUR } else { Duration::ZERO };
                    store.set(&key, b"some value", ttl);
                }
                5 => {
                    store.get(&key);
                }
                6 => {
                    store.delete(&key);
                }
                _ => store.evict(),
            }
            store.debug_validate_invariants();
        }

        store.evict();
        if policy != PolicyKind::None {
            assert!(store.cost() <= 512, "policy {policy:?} left cost over budget");
        }
    }
}
