//! Least-frequently-used eviction.
//!
//! The list is kept ordered by access count, descending from the front,
//! so the back holds the coldest entry. On a hit the node's counter is
//! bumped and the node walks toward the front past strictly smaller
//! counts, stopping behind the first neighbor with an equal or greater
//! count — entries tied on frequency keep their relative order, so the
//! tie-break is FIFO. In-place updates reposition without counting as
//! an access, which is what separates an LFU update from an LFU hit.

use crate::ds::{EvictList, NodeArena, NodeId};
use crate::policy::EvictionHooks;

#[derive(Debug, Clone)]
pub(crate) struct LfuPolicy;

impl LfuPolicy {
    /// Walks the node toward the front past predecessors with strictly
    /// smaller access counts and splices it behind the first one that
    /// matches or beats it.
    fn reposition(&self, list: &mut EvictList, arena: &mut NodeArena, id: NodeId) {
        let access = match arena.node(id) {
            Some(node) => node.access,
            None => return,
        };

        let mut dest = None;
        let mut cursor = arena.node(id).and_then(|n| n.evict_prev);
        while let Some(prev_id) = cursor {
            let prev = match arena.node(prev_id) {
                Some(node) => node,
                None => break,
            };
            if prev.access >= access {
                break;
            }
            dest = Some(prev_id);
            cursor = prev.evict_prev;
        }

        if let Some(anchor) = dest {
            list.move_before(arena, id, anchor);
        }
    }
}

impl EvictionHooks for LfuPolicy {
    fn on_insert(&self, _list: &mut EvictList, arena: &mut NodeArena, id: NodeId) {
        if let Some(node) = arena.node_mut(id) {
            node.access = 0;
        }
    }

    fn on_access(&self, list: &mut EvictList, arena: &mut NodeArena, id: NodeId) {
        if let Some(node) = arena.node_mut(id) {
            node.access += 1;
        }
        self.reposition(list, arena, id);
    }

    fn on_update(&self, list: &mut EvictList, arena: &mut NodeArena, id: NodeId) {
        self.reposition(list, arena, id);
    }

    fn evict(&self, list: &EvictList, _arena: &NodeArena) -> Option<NodeId> {
        list.back()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ds::Node;
    use crate::policy::test_support::{insert, key_order};

    fn node(key: &[u8]) -> Node {
        Node::new(0, key.to_vec(), Vec::new(), None)
    }

    #[test]
    fn insert_resets_counter_and_pushes_front() {
        let policy = LfuPolicy;
        let mut list = EvictList::new();
        let mut arena = NodeArena::new();

        let mut seeded = node(b"0");
        seeded.access = 42;
        let n0 = insert(&policy, &mut list, &mut arena, seeded);
        insert(&policy, &mut list, &mut arena, node(b"1"));

        assert_eq!(arena.node(n0).map(|n| n.access), Some(0));
        assert_eq!(key_order(&list, &arena), vec![b"1".to_vec(), b"0".to_vec()]);
    }

    #[test]
    fn access_promotes_past_colder_entries() {
        let policy = LfuPolicy;
        let mut list = EvictList::new();
        let mut arena = NodeArena::new();

        let n0 = insert(&policy, &mut list, &mut arena, node(b"0"));
        insert(&policy, &mut list, &mut arena, node(b"1"));

        policy.on_access(&mut list, &mut arena, n0);

        assert_eq!(key_order(&list, &arena), vec![b"0".to_vec(), b"1".to_vec()]);
    }

    #[test]
    fn evict_picks_lowest_frequency() {
        let policy = LfuPolicy;
        let mut list = EvictList::new();
        let mut arena = NodeArena::new();

        let n0 = insert(&policy, &mut list, &mut arena, node(b"0"));
        let n1 = insert(&policy, &mut list, &mut arena, node(b"1"));

        policy.on_access(&mut list, &mut arena, n0);
        assert_eq!(policy.evict(&list, &arena), Some(n1));

        policy.on_access(&mut list, &mut arena, n1);
        policy.on_access(&mut list, &mut arena, n1);
        assert_eq!(policy.evict(&list, &arena), Some(n0));
    }

    #[test]
    fn ties_keep_fifo_order() {
        let policy = LfuPolicy;
        let mut list = EvictList::new();
        let mut arena = NodeArena::new();

        let n0 = insert(&policy, &mut list, &mut arena, node(b"0"));
        let n1 = insert(&policy, &mut list, &mut arena, node(b"1"));

        // 0 reaches count 1 first; 1 catching up does not leapfrog it.
        policy.on_access(&mut list, &mut arena, n0);
        policy.on_access(&mut list, &mut arena, n1);

        assert_eq!(key_order(&list, &arena), vec![b"0".to_vec(), b"1".to_vec()]);
        assert_eq!(policy.evict(&list, &arena), Some(n1));
    }

    #[test]
    fn update_repositions_without_counting() {
        let policy = LfuPolicy;
        let mut list = EvictList::new();
        let mut arena = NodeArena::new();

        let n0 = insert(&policy, &mut list, &mut arena, node(b"0"));
        insert(&policy, &mut list, &mut arena, node(b"1"));

        policy.on_update(&mut list, &mut arena, n0);

        assert_eq!(arena.node(n0).map(|n| n.access), Some(0));
        assert_eq!(key_order(&list, &arena), vec![b"1".to_vec(), b"0".to_vec()]);
    }

    #[test]
    fn promotion_crosses_multiple_entries() {
        let policy = LfuPolicy;
        let mut list = EvictList::new();
        let mut arena = NodeArena::new();

        let n0 = insert(&policy, &mut list, &mut arena, node(b"0"));
        let n1 = insert(&policy, &mut list, &mut arena, node(b"1"));
        let n2 = insert(&policy, &mut list, &mut arena, node(b"2"));

        policy.on_access(&mut list, &mut arena, n2);
        policy.on_access(&mut list, &mut arena, n2);
        policy.on_access(&mut list, &mut arena, n1);
        policy.on_access(&mut list, &mut arena, n0);
        policy.on_access(&mut list, &mut arena, n0);
        policy.on_access(&mut list, &mut arena, n0);

        // Counts: 0 → 3, 2 → 2, 1 → 1.
        assert_eq!(
            key_order(&list, &arena),
            vec![b"0".to_vec(), b"2".to_vec(), b"1".to_vec()]
        );
        assert_eq!(policy.evict(&list, &arena), Some(n1));
    }

    #[test]
    fn empty_list_declines() {
        let policy = LfuPolicy;
        let list = EvictList::new();
        let arena = NodeArena::new();
        assert_eq!(policy.evict(&list, &arena), None);
    }
}
