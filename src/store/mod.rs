//! # Dual-Linked-List Store
//!
//! The byte-oriented heart of the cache: an open-addressed intrusive
//! hash table whose entries are simultaneously threaded through a
//! second intrusive list ordered by the active eviction policy.
//!
//! ## Architecture
//!
//! ```text
//!   ┌───────────────────────────────────────────────────────────────┐
//!   │                           Store                               │
//!   │                                                               │
//!   │   buckets: Vec<Option<NodeId>>        (capacity: power of 2)  │
//!   │   ┌─────┬─────┬─────┬─────┐                                   │
//!   │   │  0  │  1  │  2  │  3  │  …  chain heads                   │
//!   │   └──┬──┴─────┴──┬──┴─────┘                                   │
//!   │      │           │        hash chains (hash_prev/hash_next)   │
//!   │      ▼           ▼                                            │
//!   │   [id_4]──[id_1] [id_7]                                       │
//!   │                                                               │
//!   │   evict: EvictList        policy order (evict_prev/next)      │
//!   │   front ─► [id_4] ◄──► [id_1] ◄──► [id_7] ◄─ back             │
//!   │            keep longest             next victim               │
//!   │                                                               │
//!   │   arena: NodeArena        owns every Node, stable NodeIds     │
//!   └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Invariants
//!
//! 1. A live node is in exactly one hash chain, at index
//!    `hash % capacity`.
//! 2. Every live node appears exactly once in the eviction list.
//! 3. Two nodes with the same key never coexist.
//! 4. `cost` and `len` reflect the live set exactly.
//! 5. After every insert, `len / capacity <= 0.75`; the table resizes
//!    BEFORE linking the node that would cross the bound.
//! 6. Updating an existing key replaces value and expiration in place
//!    without relinking the hash chain.
//!
//! `debug_validate_invariants()` checks all of these in debug/test
//! builds.
//!
//! ## Concurrency
//!
//! The store is a single-threaded core (`&mut self` throughout); the
//! cache boundary wraps it in a `parking_lot::RwLock` and funnels every
//! mutation — including the policy's list reshuffling on `get` —
//! through the write half.

pub(crate) mod codec;
mod hash;

use std::time::{Duration, SystemTime};

use log::{debug, trace};

use crate::ds::{EvictList, Node, NodeArena, NodeId, PauseTicker};
use crate::error::{CacheError, Result};
use crate::policy::{EvictionHooks, Policy, PolicyKind};
use crate::store::hash::fnv1a;

/// Bucket count a fresh or cleared store starts with.
const INITIAL_BUCKETS: usize = 8;

/// Resize threshold.
const LOAD_FACTOR: f64 = 0.75;

/// Cleanup cadence when the caller never configures one.
pub(crate) const DEFAULT_CLEANUP_INTERVAL: Duration = Duration::from_secs(10);

/// Converts a ttl into an absolute expiration; zero means unbounded.
#[inline]
fn expiry(now: SystemTime, ttl: Duration) -> Option<SystemTime> {
    if ttl.is_zero() {
        None
    } else {
        Some(now + ttl)
    }
}

/// Byte-oriented cache store with cost accounting, TTL validity, and a
/// pluggable eviction policy.
#[derive(Debug)]
pub struct Store {
    arena: NodeArena,
    buckets: Vec<Option<NodeId>>,
    evict: EvictList,
    len: u64,
    cost: u64,
    max_cost: u64,
    policy: Policy,
    evict_zero: bool,

    pub(crate) snapshot_ticker: PauseTicker,
    pub(crate) cleanup_ticker: PauseTicker,
}

impl Store {
    /// Creates an empty store: 8 buckets, policy `None`, snapshotting
    /// disabled, cleanup remembered at the default cadence but not yet
    /// running.
    pub fn new() -> Self {
        Self {
            arena: NodeArena::new(),
            buckets: vec![None; INITIAL_BUCKETS],
            evict: EvictList::new(),
            len: 0,
            cost: 0,
            max_cost: 0,
            policy: Policy::new(PolicyKind::None, true),
            evict_zero: true,
            snapshot_ticker: PauseTicker::stopped(Duration::ZERO),
            cleanup_ticker: PauseTicker::stopped(DEFAULT_CLEANUP_INTERVAL),
        }
    }

    /// Number of live entries.
    pub fn len(&self) -> u64 {
        self.len
    }

    /// Returns `true` if the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Sum of `key.len() + value.len()` over live entries.
    pub fn cost(&self) -> u64 {
        self.cost
    }

    /// Current bucket count.
    pub fn capacity(&self) -> usize {
        self.buckets.len()
    }

    /// Cost bound; zero disables cost-based eviction.
    pub fn max_cost(&self) -> u64 {
        self.max_cost
    }

    pub fn set_max_cost(&mut self, max_cost: u64) {
        self.max_cost = max_cost;
    }

    /// The active eviction policy.
    pub fn policy_kind(&self) -> PolicyKind {
        self.policy.kind()
    }

    /// Replaces the policy object. The existing list order is kept;
    /// only future hook invocations follow the new rules.
    pub fn set_policy(&mut self, kind: PolicyKind) {
        self.policy = Policy::new(kind, self.evict_zero);
    }

    /// Whether LTR may evict entries that never expire. Rebuilds the
    /// active policy so the flag takes effect immediately.
    pub fn set_evict_zero(&mut self, evict_zero: bool) {
        self.evict_zero = evict_zero;
        self.policy = Policy::new(self.policy.kind(), evict_zero);
    }

    /// Looks up `key`. Hits run the policy's access hook and return the
    /// value with its remaining ttl (zero when unbounded). An expired
    /// entry reports a miss and is left for the cleanup pass.
    pub fn get(&mut self, key: &[u8]) -> Option<(Vec<u8>, Duration)> {
        let now = SystemTime::now();
        let id = self.lookup(key)?;
        let (value, ttl) = {
            let node = self.arena.node(id)?;
            if !node.is_valid(now) {
                return None;
            }
            (node.value.clone(), node.ttl(now))
        };
        self.policy.on_access(&mut self.evict, &mut self.arena, id);
        Some((value, ttl))
    }

    /// Inserts or replaces `key`. A zero ttl stores the entry
    /// unbounded; on an existing key it clears any previous expiration.
    pub fn set(&mut self, key: &[u8], value: &[u8], ttl: Duration) {
        let now = SystemTime::now();
        if let Some(id) = self.lookup(key) {
            self.update_node(id, value.to_vec(), expiry(now, ttl));
            return;
        }
        self.insert(key, value, ttl, now);
    }

    /// Removes `key`; returns whether an entry was present.
    pub fn delete(&mut self, key: &[u8]) -> bool {
        match self.lookup(key) {
            Some(id) => {
                self.remove_node(id);
                true
            }
            None => false,
        }
    }

    /// Drops every entry and shrinks back to the initial bucket count.
    /// Policy, cost bound, and tickers are preserved.
    pub fn clear(&mut self) {
        self.buckets = vec![None; INITIAL_BUCKETS];
        self.arena.clear();
        self.evict.clear();
        self.len = 0;
        self.cost = 0;
    }

    /// One pass over the eviction list deleting every expired entry.
    pub fn cleanup(&mut self) {
        let now = SystemTime::now();
        let mut removed = 0u64;
        let mut cursor = self.evict.front();
        while let Some(id) = cursor {
            // Successor read before any deletion.
            let (next, valid) = match self.arena.node(id) {
                Some(node) => (node.evict_next, node.is_valid(now)),
                None => break,
            };
            if !valid {
                self.remove_node(id);
                removed += 1;
            }
            cursor = next;
        }
        if removed > 0 {
            debug!("cleanup removed {removed} expired entries");
        }
    }

    /// Deletes policy-nominated victims until the cost bound is met or
    /// the policy declines. A zero `max_cost` disables the trigger.
    pub fn evict(&mut self) {
        if self.max_cost == 0 {
            return;
        }
        let mut evicted = 0u64;
        while self.cost > self.max_cost {
            let Some(victim) = self.policy.evict(&self.evict, &self.arena) else {
                break;
            };
            self.remove_node(victim);
            evicted += 1;
        }
        if evicted > 0 {
            debug!(
                "evicted {evicted} entries, cost {} / max {}",
                self.cost, self.max_cost
            );
        }
    }

    /// Rewrites the value of an existing, valid entry through `apply`,
    /// installing the result via the same in-place path as `set` on an
    /// existing key. An absent or expired entry yields
    /// [`CacheError::KeyNotFound`]; an expired entry observed here is
    /// deleted.
    pub fn update_in_place<F>(&mut self, key: &[u8], apply: F, ttl: Duration) -> Result<()>
    where
        F: FnOnce(&[u8]) -> Result<Vec<u8>>,
    {
        let now = SystemTime::now();
        let id = self.lookup(key).ok_or(CacheError::KeyNotFound)?;
        let valid = self.arena.node(id).map(|n| n.is_valid(now)).unwrap_or(false);
        if !valid {
            self.remove_node(id);
            return Err(CacheError::KeyNotFound);
        }

        let new_value = {
            let node = self.arena.node(id).ok_or(CacheError::KeyNotFound)?;
            apply(&node.value)?
        };
        self.update_node(id, new_value, expiry(now, ttl));
        Ok(())
    }

    /// Get-or-compute. A valid hit counts as an access and returns the
    /// cached value; otherwise the factory's result is inserted under
    /// `ttl` and returned. The factory runs while the caller holds the
    /// store exclusively, which is what makes concurrent memorize
    /// single-flight.
    pub fn memorize<F>(&mut self, key: &[u8], factory: F, ttl: Duration) -> Result<Vec<u8>>
    where
        F: FnOnce() -> Result<Vec<u8>>,
    {
        let now = SystemTime::now();
        if let Some(id) = self.lookup(key) {
            let valid = self.arena.node(id).map(|n| n.is_valid(now)).unwrap_or(false);
            if valid {
                let value = self
                    .arena
                    .node(id)
                    .map(|n| n.value.clone())
                    .unwrap_or_default();
                self.policy.on_access(&mut self.evict, &mut self.arena, id);
                return Ok(value);
            }
            // An expired entry must not coexist with the fresh insert.
            self.remove_node(id);
        }

        let value = factory()?;
        self.insert(key, &value, ttl, now);
        Ok(value)
    }

    /// Keys in eviction-list order, front (keep longest) to back (next
    /// victim).
    pub fn eviction_order(&self) -> Vec<Vec<u8>> {
        self.evict
            .ids(&self.arena)
            .into_iter()
            .filter_map(|id| self.arena.node(id).map(|n| n.key.clone()))
            .collect()
    }

    #[inline]
    fn bucket_index(&self, hash: u64) -> usize {
        (hash % self.buckets.len() as u64) as usize
    }

    fn lookup(&self, key: &[u8]) -> Option<NodeId> {
        let hash = fnv1a(key);
        let mut cursor = self.buckets[self.bucket_index(hash)];
        while let Some(id) = cursor {
            let node = self.arena.node(id)?;
            if node.hash == hash && node.key.as_slice() == key {
                return Some(id);
            }
            cursor = node.hash_next;
        }
        None
    }

    /// In-place value/expiration replacement; the hash chain is not
    /// relinked.
    fn update_node(&mut self, id: NodeId, value: Vec<u8>, expires_at: Option<SystemTime>) {
        if let Some(node) = self.arena.node_mut(id) {
            let old_cost = node.cost();
            node.value = value;
            node.expires_at = expires_at;
            let new_cost = node.cost();
            self.cost = self.cost + new_cost - old_cost;
        }
        self.policy.on_update(&mut self.evict, &mut self.arena, id);
    }

    fn insert(&mut self, key: &[u8], value: &[u8], ttl: Duration, now: SystemTime) {
        // Resize before linking so the load factor never crosses the
        // bound with the new node in place.
        if (self.len + 1) as f64 / self.buckets.len() as f64 > LOAD_FACTOR {
            self.resize();
        }

        let hash = fnv1a(key);
        let idx = self.bucket_index(hash);
        let node = Node::new(hash, key.to_vec(), value.to_vec(), expiry(now, ttl));
        let cost = node.cost();
        let id = self.arena.insert(node);

        self.bucket_link(idx, id);
        self.evict.push_front(&mut self.arena, id);
        self.policy.on_insert(&mut self.evict, &mut self.arena, id);

        self.cost += cost;
        self.len += 1;
    }

    fn bucket_link(&mut self, idx: usize, id: NodeId) {
        let head = self.buckets[idx];
        if let Some(node) = self.arena.node_mut(id) {
            node.hash_prev = None;
            node.hash_next = head;
        }
        if let Some(head_id) = head {
            if let Some(head_node) = self.arena.node_mut(head_id) {
                head_node.hash_prev = Some(id);
            }
        }
        self.buckets[idx] = Some(id);
    }

    fn bucket_unlink(&mut self, id: NodeId) {
        let (hash, prev, next) = match self.arena.node(id) {
            Some(node) => (node.hash, node.hash_prev, node.hash_next),
            None => return,
        };

        match prev {
            Some(prev_id) => {
                if let Some(prev_node) = self.arena.node_mut(prev_id) {
                    prev_node.hash_next = next;
                }
            }
            None => {
                let idx = self.bucket_index(hash);
                self.buckets[idx] = next;
            }
        }
        if let Some(next_id) = next {
            if let Some(next_node) = self.arena.node_mut(next_id) {
                next_node.hash_prev = prev;
            }
        }
        if let Some(node) = self.arena.node_mut(id) {
            node.hash_prev = None;
            node.hash_next = None;
        }
    }

    fn remove_node(&mut self, id: NodeId) {
        self.evict.unlink(&mut self.arena, id);
        self.bucket_unlink(id);
        if let Some(node) = self.arena.remove(id) {
            self.cost -= node.cost();
            self.len -= 1;
        }
    }

    /// Doubles the bucket array and relinks every hash chain. Nodes are
    /// not moved — their cached hashes map them into the wider array —
    /// and the eviction list is untouched.
    fn resize(&mut self) {
        let new_capacity = self.buckets.len() * 2;
        let mut buckets: Vec<Option<NodeId>> = vec![None; new_capacity];

        let mut cursor = self.evict.front();
        while let Some(id) = cursor {
            let (hash, next) = match self.arena.node(id) {
                Some(node) => (node.hash, node.evict_next),
                None => break,
            };

            let idx = (hash % new_capacity as u64) as usize;
            let head = buckets[idx];
            if let Some(node) = self.arena.node_mut(id) {
                node.hash_prev = None;
                node.hash_next = head;
            }
            if let Some(head_id) = head {
                if let Some(head_node) = self.arena.node_mut(head_id) {
                    head_node.hash_prev = Some(id);
                }
            }
            buckets[idx] = Some(id);

            cursor = next;
        }

        self.buckets = buckets;
        trace!("resized bucket array to {new_capacity}");
    }

    #[cfg(any(test, debug_assertions))]
    pub fn debug_validate_invariants(&self) {
        self.arena.debug_validate_invariants();
        self.evict.debug_validate_invariants(&self.arena);

        assert!(self.buckets.len().is_power_of_two());
        assert_eq!(self.evict.is_empty(), self.len == 0);
        assert_eq!(self.arena.is_empty(), self.len == 0);

        let listed = self.evict.ids(&self.arena);
        assert_eq!(listed.len() as u64, self.len);

        let mut total_cost = 0u64;
        for id in &listed {
            assert!(self.arena.contains(*id));
            let node = self.arena.node(*id).expect("listed node missing");
            total_cost += node.cost();

            // Hash membership: reachable from its own bucket chain.
            let idx = self.bucket_index(node.hash);
            let mut cursor = self.buckets[idx];
            let mut found = false;
            while let Some(cur) = cursor {
                if cur == *id {
                    found = true;
                    break;
                }
                cursor = self.arena.node(cur).and_then(|n| n.hash_next);
            }
            assert!(found, "node not reachable from its bucket");
        }
        assert_eq!(total_cost, self.cost);

        if self.len > 0 {
            assert!(self.len as f64 / self.buckets.len() as f64 <= LOAD_FACTOR);
        }
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}
