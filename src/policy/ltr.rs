//! Longest-time-remaining eviction.
//!
//! Entries are ordered by expiration instant, soonest-expiring at the
//! front. Entries about to lapse are left for the cleanup pass to
//! reclaim anyway, so the victim the selector nominates is the back of
//! the list — the entry whose expiry is farthest away. Unbounded
//! entries (no expiration) are never repositioned and are skipped
//! during comparisons; whether one may be nominated at the back is
//! controlled by `evict_zero`.
//!
//! Reposition walks from the node's current position: first toward the
//! back past entries expiring sooner, then toward the front past
//! entries expiring later, splicing in at the boundary. Insertions and
//! TTL rewrites both route through it; plain lookups never reorder.

use std::time::SystemTime;

use crate::ds::{EvictList, NodeArena, NodeId};
use crate::policy::EvictionHooks;

/// TTL ordering; `evict_zero` permits evicting unbounded entries.
#[derive(Debug, Clone)]
pub(crate) struct LtrPolicy {
    evict_zero: bool,
}

impl LtrPolicy {
    pub fn new(evict_zero: bool) -> Self {
        Self { evict_zero }
    }

    fn reposition(&self, list: &mut EvictList, arena: &mut NodeArena, id: NodeId) {
        let expires_at = match arena.node(id).and_then(|n| n.expires_at) {
            Some(at) => at,
            // Unbounded entries stay where insertion put them.
            None => return,
        };

        if let Some(anchor) = Self::seek_back(arena, id, expires_at) {
            list.move_after(arena, id, anchor);
            return;
        }
        if let Some(anchor) = Self::seek_front(arena, id, expires_at) {
            list.move_before(arena, id, anchor);
        }
    }

    /// Last successor expiring strictly sooner than `expires_at`,
    /// looking through unbounded entries.
    fn seek_back(arena: &NodeArena, id: NodeId, expires_at: SystemTime) -> Option<NodeId> {
        let mut dest = None;
        let mut cursor = arena.node(id).and_then(|n| n.evict_next);
        while let Some(next_id) = cursor {
            let next = arena.node(next_id)?;
            match next.expires_at {
                Some(at) if at < expires_at => dest = Some(next_id),
                Some(_) => break,
                None => {}
            }
            cursor = next.evict_next;
        }
        dest
    }

    /// Last predecessor expiring strictly later than `expires_at`,
    /// looking through unbounded entries.
    fn seek_front(arena: &NodeArena, id: NodeId, expires_at: SystemTime) -> Option<NodeId> {
        let mut dest = None;
        let mut cursor = arena.node(id).and_then(|n| n.evict_prev);
        while let Some(prev_id) = cursor {
            let prev = arena.node(prev_id)?;
            match prev.expires_at {
                Some(at) if at > expires_at => dest = Some(prev_id),
                Some(_) => break,
                None => {}
            }
            cursor = prev.evict_prev;
        }
        dest
    }
}

impl EvictionHooks for LtrPolicy {
    fn on_insert(&self, list: &mut EvictList, arena: &mut NodeArena, id: NodeId) {
        self.reposition(list, arena, id);
    }

    fn on_access(&self, _list: &mut EvictList, _arena: &mut NodeArena, _id: NodeId) {}

    fn on_update(&self, list: &mut EvictList, arena: &mut NodeArena, id: NodeId) {
        self.reposition(list, arena, id);
    }

    fn evict(&self, list: &EvictList, arena: &NodeArena) -> Option<NodeId> {
        let back = list.back()?;
        let unbounded = arena.node(back)?.expires_at.is_none();
        if unbounded && !self.evict_zero {
            return None;
        }
        Some(back)
    }
}
