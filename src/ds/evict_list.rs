//! Eviction-order list threaded through every live node.
//!
//! The list does not own its nodes: it is the second intrusive list over
//! the [`NodeArena`], using the `evict_prev`/`evict_next` links embedded
//! in each [`Node`]. `head`/`tail` of `None` stand in for the classic
//! self-looped sentinel.
//!
//! ```text
//!   head ─► [id_4] ◄──► [id_1] ◄──► [id_7] ◄── tail
//!           front                    back
//!           (keep longest)           (next victim)
//! ```
//!
//! ## Operations
//! - `push_front(id)` / `push_back(id)`: attach a detached node
//! - `unlink(id)`: splice a node out, clearing its own links
//! - `move_to_front(id)`, `move_before(id, anchor)`,
//!   `move_after(id, anchor)`: O(1) reorder primitives for the policies
//!
//! `debug_validate_invariants()` is available in debug/test builds.

use crate::ds::node_arena::{NodeArena, NodeId};

/// Policy-ordered doubly-linked list over arena nodes.
#[derive(Debug, Default)]
pub(crate) struct EvictList {
    head: Option<NodeId>,
    tail: Option<NodeId>,
}

impl EvictList {
    /// Creates an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the front node (kept longest).
    #[inline]
    pub fn front(&self) -> Option<NodeId> {
        self.head
    }

    /// Returns the back node (next victim).
    #[inline]
    pub fn back(&self) -> Option<NodeId> {
        self.tail
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// Attaches a detached node at the front.
    pub fn push_front(&mut self, arena: &mut NodeArena, id: NodeId) {
        let old_head = self.head;
        if let Some(node) = arena.node_mut(id) {
            node.evict_prev = None;
            node.evict_next = old_head;
        } else {
            return;
        }
        match old_head {
            Some(head) => {
                if let Some(head_node) = arena.node_mut(head) {
                    head_node.evict_prev = Some(id);
                }
            }
            None => self.tail = Some(id),
        }
        self.head = Some(id);
    }

    /// Attaches a detached node at the back. Used by snapshot load to
    /// preserve file order.
    pub fn push_back(&mut self, arena: &mut NodeArena, id: NodeId) {
        let old_tail = self.tail;
        if let Some(node) = arena.node_mut(id) {
            node.evict_next = None;
            node.evict_prev = old_tail;
        } else {
            return;
        }
        match old_tail {
            Some(tail) => {
                if let Some(tail_node) = arena.node_mut(tail) {
                    tail_node.evict_next = Some(id);
                }
            }
            None => self.head = Some(id),
        }
        self.tail = Some(id);
    }

    /// Splices a node out of the list, preserving its neighbors' links
    /// and clearing the node's own.
    pub fn unlink(&mut self, arena: &mut NodeArena, id: NodeId) {
        let (prev, next) = match arena.node(id) {
            Some(node) => (node.evict_prev, node.evict_next),
            None => return,
        };

        match prev {
            Some(prev_id) => {
                if let Some(prev_node) = arena.node_mut(prev_id) {
                    prev_node.evict_next = next;
                }
            }
            None => self.head = next,
        }

        match next {
            Some(next_id) => {
                if let Some(next_node) = arena.node_mut(next_id) {
                    next_node.evict_prev = prev;
                }
            }
            None => self.tail = prev,
        }

        if let Some(node) = arena.node_mut(id) {
            node.evict_prev = None;
            node.evict_next = None;
        }
    }

    /// Moves an existing node to the front.
    pub fn move_to_front(&mut self, arena: &mut NodeArena, id: NodeId) {
        if self.head == Some(id) {
            return;
        }
        self.unlink(arena, id);
        self.push_front(arena, id);
    }

    /// Moves an existing node to directly before `anchor`.
    pub fn move_before(&mut self, arena: &mut NodeArena, id: NodeId, anchor: NodeId) {
        if id == anchor {
            return;
        }
        self.unlink(arena, id);

        let anchor_prev = match arena.node(anchor) {
            Some(node) => node.evict_prev,
            None => return,
        };
        if let Some(node) = arena.node_mut(id) {
            node.evict_prev = anchor_prev;
            node.evict_next = Some(anchor);
        }
        if let Some(anchor_node) = arena.node_mut(anchor) {
            anchor_node.evict_prev = Some(id);
        }
        match anchor_prev {
            Some(prev_id) => {
                if let Some(prev_node) = arena.node_mut(prev_id) {
                    prev_node.evict_next = Some(id);
                }
            }
            None => self.head = Some(id),
        }
    }

    /// Moves an existing node to directly after `anchor`.
    pub fn move_after(&mut self, arena: &mut NodeArena, id: NodeId, anchor: NodeId) {
        if id == anchor {
            return;
        }
        self.unlink(arena, id);

        let anchor_next = match arena.node(anchor) {
            Some(node) => node.evict_next,
            None => return,
        };
        if let Some(node) = arena.node_mut(id) {
            node.evict_next = anchor_next;
            node.evict_prev = Some(anchor);
        }
        if let Some(anchor_node) = arena.node_mut(anchor) {
            anchor_node.evict_next = Some(id);
        }
        match anchor_next {
            Some(next_id) => {
                if let Some(next_node) = arena.node_mut(next_id) {
                    next_node.evict_prev = Some(id);
                }
            }
            None => self.tail = Some(id),
        }
    }

    /// Drops all membership without touching the arena. The store clears
    /// the arena alongside.
    pub fn clear(&mut self) {
        self.head = None;
        self.tail = None;
    }

    /// Collects the list order front→back.
    pub fn ids(&self, arena: &NodeArena) -> Vec<NodeId> {
        let mut order = Vec::new();
        let mut cur = self.head;
        while let Some(id) = cur {
            order.push(id);
            cur = arena.node(id).and_then(|n| n.evict_next);
        }
        order
    }

    #[cfg(any(test, debug_assertions))]
    pub fn debug_validate_invariants(&self, arena: &NodeArena) {
        if self.head.is_none() || self.tail.is_none() {
            assert!(self.head.is_none());
            assert!(self.tail.is_none());
            return;
        }

        let mut seen = std::collections::HashSet::new();
        let mut prev = None;
        let mut current = self.head;

        while let Some(id) = current {
            assert!(seen.insert(id), "node {id:?} appears twice");
            let node = arena.node(id).expect("listed node missing from arena");
            assert_eq!(node.evict_prev, prev);
            if node.evict_next.is_none() {
                assert_eq!(self.tail, Some(id));
            }
            prev = Some(id);
            current = node.evict_next;
            assert!(seen.len() <= arena.len());
        }
    }
}
