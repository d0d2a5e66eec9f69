//! Arena-backed node store.
//!
//! Owns every node allocation of one tree. Nodes are addressed by generational
//! [`NodeId`]s, so a handle to a reclaimed node never aliases a newer one.

use generational_arena::Arena;
use tracing::{instrument, trace};

use crate::domain::error::{TreeErrors, TreeResult};
use crate::domain::node::{Node, NodeId, Payload};

#[derive(Debug)]
pub struct NodeStore<T> {
    arena: Arena<Node<T>>,
    /// Maximum number of live nodes, None for unbounded
    limit: Option<usize>,
}

impl<T: Payload> Default for NodeStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Payload> NodeStore<T> {
    pub fn new() -> Self {
        Self {
            arena: Arena::new(),
            limit: None,
        }
    }

    /// Store that refuses to hold more than `limit` live nodes.
    pub fn bounded(limit: usize) -> Self {
        Self {
            arena: Arena::with_capacity(limit),
            limit: Some(limit),
        }
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// Allocates a node holding the sentinel payload and no children.
    #[instrument(level = "trace", skip(self))]
    pub fn allocate(&mut self, parent: Option<NodeId>) -> TreeResult<NodeId> {
        if let Some(limit) = self.limit {
            if self.arena.len() >= limit {
                trace!(limit, "node limit reached");
                return Err(TreeErrors::CANT_ALLOCATE_MEMORY);
            }
        }
        Ok(NodeId(self.arena.insert(Node::empty(parent))))
    }

    pub fn get(&self, id: NodeId) -> Option<&Node<T>> {
        self.arena.get(id.0)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node<T>> {
        self.arena.get_mut(id.0)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.arena.contains(id.0)
    }

    /// Reclaims `node` and everything below it, post-order (left subtree,
    /// right subtree, node). Returns the number of nodes reclaimed.
    ///
    /// The caller is responsible for clearing the link that owned `node`.
    #[instrument(level = "trace", skip(self))]
    pub fn free_subtree(&mut self, node: NodeId) -> usize {
        let mut count = 0;
        // (node, children already scheduled)
        let mut stack: Vec<(NodeId, bool)> = vec![(node, false)];

        while let Some((current, expanded)) = stack.pop() {
            if expanded {
                if self.arena.remove(current.0).is_some() {
                    count += 1;
                }
                continue;
            }

            let Some((left, right)) = self.get(current).map(|n| (n.left, n.right)) else {
                continue;
            };
            stack.push((current, true));
            // Left is pushed last so its subtree is reclaimed first
            if let Some(right) = right {
                stack.push((right, false));
            }
            if let Some(left) = left {
                stack.push((left, false));
            }
        }

        count
    }

    /// Drops every node, keeping the limit.
    pub fn clear(&mut self) {
        self.arena.clear();
    }
}
