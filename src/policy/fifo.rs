//! First-in-first-out eviction, doubling as the `None` policy.
//!
//! The store push-fronts every fresh node, so plain insertion order is
//! already the list order: the back of the list is the oldest entry.
//! Lookups and in-place updates never reorder. With `should_evict`
//! cleared the selector declines every request, which is the whole of
//! the `None` policy.

use crate::ds::{EvictList, NodeArena, NodeId};
use crate::policy::EvictionHooks;

/// FIFO ordering; `should_evict == false` turns it into `None`.
#[derive(Debug, Clone)]
pub(crate) struct FifoPolicy {
    should_evict: bool,
}

impl FifoPolicy {
    pub fn new(should_evict: bool) -> Self {
        Self { should_evict }
    }

    pub fn should_evict(&self) -> bool {
        self.should_evict
    }
}

impl EvictionHooks for FifoPolicy {
    fn on_insert(&self, _list: &mut EvictList, _arena: &mut NodeArena, _id: NodeId) {}

    fn on_access(&self, _list: &mut EvictList, _arena: &mut NodeArena, _id: NodeId) {}

    fn on_update(&self, _list: &mut EvictList, _arena: &mut NodeArena, _id: NodeId) {}

    fn evict(&self, list: &EvictList, _arena: &NodeArena) -> Option<NodeId> {
        if self.should_evict {
            list.back()
        } else {
            None
        }
    }
}
