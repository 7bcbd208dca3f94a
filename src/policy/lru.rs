//! Least-recently-used eviction.
//!
//! Any touch — lookup or in-place update — moves the node to the list
//! front, so the back is always the entry that has gone unused longest.

use crate::ds::{EvictList, NodeArena, NodeId};
use crate::policy::EvictionHooks;

#[derive(Debug, Clone)]
pub(crate) struct LruPolicy;

impl EvictionHooks for LruPolicy {
    fn on_insert(&self, _list: &mut EvictList, _arena: &mut NodeArena, _id: NodeId) {}

    fn on_access(&self, list: &mut EvictList, arena: &mut NodeArena, id: NodeId) {
        list.move_to_front(arena, id);
    }

    fn on_update(&self, list: &mut EvictList, arena: &mut NodeArena, id: NodeId) {
        list.move_to_front(arena, id);
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
    fn insert_pushes_front() {
        let policy = LruPolicy;
        let mut list = EvictList::new();
        let mut arena = NodeArena::new();

        insert(&policy, &mut list, &mut arena, node(b"0"));
        insert(&policy, &mut list, &mut arena, node(b"1"));

        assert_eq!(key_order(&list, &arena), vec![b"1".to_vec(), b"0".to_vec()]);
    }

    #[test]
    fn access_promotes_to_front() {
        let policy = LruPolicy;
        let mut list = EvictList::new();
        let mut arena = NodeArena::new();

        let n0 = insert(&policy, &mut list, &mut arena, node(b"0"));
        insert(&policy, &mut list, &mut arena, node(b"1"));

        policy.on_access(&mut list, &mut arena, n0);
        assert_eq!(key_order(&list, &arena), vec![b"0".to_vec(), b"1".to_vec()]);
    }

    #[test]
    fn evict_returns_least_recent() {
        let policy = LruPolicy;
        let mut list = EvictList::new();
        let mut arena = NodeArena::new();

        let n0 = insert(&policy, &mut list, &mut arena, node(b"0"));
        let n1 = insert(&policy, &mut list, &mut arena, node(b"1"));

        // Untouched: first insert is the victim.
        assert_eq!(policy.evict(&list, &arena), Some(n0));

        // Accessing it shifts the victim to the other entry.
        policy.on_access(&mut list, &mut arena, n0);
        assert_eq!(policy.evict(&list, &arena), Some(n1));
    }

    #[test]
    fn interleaved_access_orders_by_last_touch() {
        let policy = LruPolicy;
        let mut list = EvictList::new();
        let mut arena = NodeArena::new();

        let n0 = insert(&policy, &mut list, &mut arena, node(b"0"));
        policy.on_access(&mut list, &mut arena, n0);
        insert(&policy, &mut list, &mut arena, node(b"1"));

        assert_eq!(policy.evict(&list, &arena), Some(n0));
    }

    #[test]
    fn update_counts_as_use() {
        let policy = LruPolicy;
        let mut list = EvictList::new();
        let mut arena = NodeArena::new();

        let n0 = insert(&policy, &mut list, &mut arena, node(b"0"));
        let n1 = insert(&policy, &mut list, &mut arena, node(b"1"));

        policy.on_update(&mut list, &mut arena, n0);
        assert_eq!(policy.evict(&list, &arena), Some(n1));
    }

    #[test]
    fn empty_list_declines() {
        let policy = LruPolicy;
        let list = EvictList::new();
        let arena = NodeArena::new();
        assert_eq!(policy.evict(&list, &arena), None);
    }
}
