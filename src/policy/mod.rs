//! # Eviction Policy Family
//!
//! One capability, four operations, five variants. Every policy is a
//! set of invariants on the store's shared eviction list: the store
//! always places a fresh node at the list front, then hands it to the
//! policy, which may reorder. The list front is "keep longest", the
//! back is "next victim".
//!
//! ```text
//!                    ┌────────────────────────────────────┐
//!                    │          EvictionHooks             │
//!                    │                                    │
//!                    │  on_insert(list, arena, id)        │
//!                    │  on_access(list, arena, id)        │
//!                    │  on_update(list, arena, id)        │
//!                    │  evict(list, arena) → Option<id>   │
//!                    └──────────────┬─────────────────────┘
//!              ┌───────────┬───────┴────┬───────────┐
//!              ▼           ▼            ▼           ▼
//!          FifoPolicy  LruPolicy   LfuPolicy   LtrPolicy
//!          (None=FIFO
//!           w/o evict)
//! ```
//!
//! ## Ordering contract
//!
//! | Policy | on_insert          | on_access            | on_update            | evict returns            |
//! |--------|--------------------|----------------------|----------------------|--------------------------|
//! | None   | keep front         | no-op                | no-op                | nothing                  |
//! | FIFO   | keep front         | no-op                | no-op                | back                     |
//! | LRU    | keep front         | move to front        | move to front        | back                     |
//! | LFU    | access = 0         | access++, reposition | reposition, no count | back                     |
//! | LTR    | reposition by ttl  | no-op                | reposition by ttl    | back, gated by evict_zero|
//!
//! `None` is FIFO with eviction disabled, which unifies the insert
//! path. Switching policies replaces the [`Policy`] value atomically
//! under the store lock; the existing list order is preserved —
//! policies only redefine how future operations reshape it.
//!
//! Dispatch is a tagged union over stateless per-policy structs rather
//! than a boxed trait object: the variant set is closed and the hooks
//! sit on the store's hot path.

pub(crate) mod fifo;
pub(crate) mod lfu;
pub(crate) mod lru;
pub(crate) mod ltr;

use crate::ds::{EvictList, NodeArena, NodeId};
use crate::error::CacheError;

pub(crate) use fifo::FifoPolicy;
pub(crate) use lfu::LfuPolicy;
pub(crate) use lru::LruPolicy;
pub(crate) use ltr::LtrPolicy;

/// Available eviction policies. The discriminants are the snapshot
/// wire values and must not be reordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u64)]
pub enum PolicyKind {
    /// Insertion order is tracked but nothing is ever evicted.
    #[default]
    None = 0,
    /// First in, first out.
    Fifo = 1,
    /// Least recently used.
    Lru = 2,
    /// Least frequently used, FIFO within ties.
    Lfu = 3,
    /// Longest time remaining: the entry whose expiry is farthest away
    /// goes first; unbounded entries are kept unless `evict_zero`.
    Ltr = 4,
}

impl PolicyKind {
    /// Snapshot discriminant.
    pub fn as_u64(self) -> u64 {
        self as u64
    }
}

impl TryFrom<u64> for PolicyKind {
    type Error = CacheError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(PolicyKind::None),
            1 => Ok(PolicyKind::Fifo),
            2 => Ok(PolicyKind::Lru),
            3 => Ok(PolicyKind::Lfu),
            4 => Ok(PolicyKind::Ltr),
            other => Err(CacheError::InvalidPolicy(other)),
        }
    }
}

/// The three reorder hooks plus the victim selector.
///
/// All hooks run inside the store's critical section on a node that is
/// already a member of the eviction list. `evict` only nominates; the
/// store unlinks.
pub(crate) trait EvictionHooks {
    /// Called exactly once, immediately after the store placed the node
    /// at the list front.
    fn on_insert(&self, list: &mut EvictList, arena: &mut NodeArena, id: NodeId);

    /// Called on every successful lookup.
    fn on_access(&self, list: &mut EvictList, arena: &mut NodeArena, id: NodeId);

    /// Called when an existing entry's value or expiration is replaced
    /// in place. Must not touch the access counter.
    fn on_update(&self, list: &mut EvictList, arena: &mut NodeArena, id: NodeId);

    /// Returns the next node to remove, or `None` when nothing is
    /// eligible.
    fn evict(&self, list: &EvictList, arena: &NodeArena) -> Option<NodeId>;
}

/// Active policy object held by the store.
#[derive(Debug, Clone)]
pub(crate) enum Policy {
    Fifo(FifoPolicy),
    Lru(LruPolicy),
    Lfu(LfuPolicy),
    Ltr(LtrPolicy),
}

impl Policy {
    /// Policy factory. `evict_zero` only affects [`PolicyKind::Ltr`].
    pub fn new(kind: PolicyKind, evict_zero: bool) -> Self {
        match kind {
            PolicyKind::None => Policy::Fifo(FifoPolicy::new(false)),
            PolicyKind::Fifo => Policy::Fifo(FifoPolicy::new(true)),
            PolicyKind::Lru => Policy::Lru(LruPolicy),
            PolicyKind::Lfu => Policy::Lfu(LfuPolicy),
            PolicyKind::Ltr => Policy::Ltr(LtrPolicy::new(evict_zero)),
        }
    }

    /// The kind this policy was built from.
    pub fn kind(&self) -> PolicyKind {
        match self {
            Policy::Fifo(fifo) if fifo.should_evict() => PolicyKind::Fifo,
            Policy::Fifo(_) => PolicyKind::None,
            Policy::Lru(_) => PolicyKind::Lru,
            Policy::Lfu(_) => PolicyKind::Lfu,
            Policy::Ltr(_) => PolicyKind::Ltr,
        }
    }
}

impl EvictionHooks for Policy {
    fn on_insert(&self, list: &mut EvictList, arena: &mut NodeArena, id: NodeId) {
        match self {
            Policy::Fifo(p) => p.on_insert(list, arena, id),
            Policy::Lru(p) => p.on_insert(list, arena, id),
            Policy::Lfu(p) => p.on_insert(list, arena, id),
            Policy::Ltr(p) => p.on_insert(list, arena, id),
        }
    }

    fn on_access(&self, list: &mut EvictList, arena: &mut NodeArena, id: NodeId) {
        match self {
            Policy::Fifo(p) => p.on_access(list, arena, id),
            Policy::Lru(p) => p.on_access(list, arena, id),
            Policy::Lfu(p) => p.on_access(list, arena, id),
            Policy::Ltr(p) => p.on_access(list, arena, id),
        }
    }

    fn on_update(&self, list: &mut EvictList, arena: &mut NodeArena, id: NodeId) {
        match self {
            Policy::Fifo(p) => p.on_update(list, arena, id),
            Policy::Lru(p) => p.on_update(list, arena, id),
            Policy::Lfu(p) => p.on_update(list, arena, id),
            Policy::Ltr(p) => p.on_update(list, arena, id),
        }
    }

    fn evict(&self, list: &EvictList, arena: &NodeArena) -> Option<NodeId> {
        match self {
            Policy::Fifo(p) => p.evict(list, arena),
            Policy::Lru(p) => p.evict(list, arena),
            Policy::Lfu(p) => p.evict(list, arena),
            Policy::Ltr(p) => p.evict(list, arena),
        }
    }
}
