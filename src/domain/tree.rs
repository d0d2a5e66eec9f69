//! Tree handle: lifecycle, validation and mutation.
//!
//! A [`Tree`] owns a [`NodeStore`], an optional root link and a size counter.
//! The handle goes through `Unconstructed → Constructed → Destructed`, and a
//! destructed handle may be constructed again. Mutations are only accepted on a
//! handle that passes [`Tree::validate`].

use tracing::{debug, instrument, warn};

use crate::domain::error::{TreeErrors, TreeResult};
use crate::domain::node::{Node, NodeId, Payload, Side, Value};
use crate::domain::store::NodeStore;

/// Size recorded in a destructed handle.
pub const TRASH_SIZE: usize = 0xAB1BA5;

/// Lifecycle state derived from the root link and size counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeState {
    Unconstructed,
    Constructed,
    Destructed,
    /// Root and size disagree, e.g. after a size-consistency failure
    Corrupted,
}

/// Link a new node is written into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Root,
    Child(NodeId, Side),
}

#[derive(Debug)]
pub struct Tree<T = Value> {
    store: NodeStore<T>,
    root: Option<NodeId>,
    size: usize,
}

impl<T: Payload> Default for Tree<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Payload> Tree<T> {
    /// Unconstructed handle: no root, size 0.
    pub fn new() -> Self {
        Self {
            store: NodeStore::new(),
            root: None,
            size: 0,
        }
    }

    /// Unconstructed handle whose store holds at most `limit` nodes.
    pub fn with_node_limit(limit: usize) -> Self {
        Self {
            store: NodeStore::bounded(limit),
            root: None,
            size: 0,
        }
    }

    /// Reports which structural invariants are currently violated.
    ///
    /// Empty when the handle is constructed and usable.
    pub fn validate(&self) -> TreeErrors {
        let mut errors = TreeErrors::empty();

        if self.size == 0 || self.size == TRASH_SIZE {
            errors |= TreeErrors::INVALID_SIZE;
        }
        if self.root.is_none() {
            errors |= TreeErrors::INVALID_ROOT;
        }

        errors
    }

    pub fn check(&self) -> TreeResult<()> {
        self.validate().into_result()
    }

    pub fn state(&self) -> TreeState {
        match (self.root, self.size) {
            (Some(_), size) if size != 0 && size != TRASH_SIZE => TreeState::Constructed,
            (None, 0) => TreeState::Unconstructed,
            (None, TRASH_SIZE) => TreeState::Destructed,
            _ => TreeState::Corrupted,
        }
    }

    /// Allocates a root holding `initial_value`.
    ///
    /// Refuses to replace a well-formed tree. Any leftover allocations of a
    /// malformed handle are discarded first.
    #[instrument(level = "debug", skip(self, initial_value))]
    pub fn construct(&mut self, initial_value: impl Into<T>) -> TreeResult<NodeId> {
        if self.validate().is_empty() {
            return Err(TreeErrors::ALREADY_CONSTRUCTED);
        }

        if !self.store.is_empty() {
            warn!(leftover = self.store.len(), "discarding nodes of malformed handle");
            self.store.clear();
        }
        self.root = None;
        self.size = 0;

        let root = self.create_node(Slot::Root)?;
        self.set_payload(root, initial_value.into());
        debug!(%root, "tree constructed");
        Ok(root)
    }

    /// Reclaims every node and marks the handle destructed.
    ///
    /// A reclaimed count different from the recorded size is reported as
    /// `INVALID_SIZE`, but the handle is destructed all the same.
    #[instrument(level = "debug", skip(self))]
    pub fn destruct(&mut self) -> TreeResult<()> {
        let Some(root) = self.root.take() else {
            return Err(TreeErrors::ALREADY_DESTRUCTED);
        };

        let mut errors = TreeErrors::empty();
        let freed = self.store.free_subtree(root);
        if freed != self.size {
            warn!(freed, size = self.size, "size mismatch while destructing");
            errors |= TreeErrors::INVALID_SIZE;
        }
        self.size = TRASH_SIZE;
        debug!(freed, "tree destructed");

        errors.into_result()
    }

    /// Creates a child of `node` on `side` holding `value`.
    ///
    /// Fails with `INVALID_NODE` if `node` is stale or the slot is occupied;
    /// nothing is allocated in that case.
    #[instrument(level = "debug", skip(self, value))]
    pub fn insert(&mut self, node: NodeId, side: Side, value: impl Into<T>) -> TreeResult<NodeId> {
        self.check()?;

        let anchor = self.store.get(node).ok_or(TreeErrors::INVALID_NODE)?;
        if anchor.child(side).is_some() {
            debug!(%node, %side, "slot occupied");
            return Err(TreeErrors::INVALID_NODE);
        }

        let child = self.create_node(Slot::Child(node, side))?;
        self.set_payload(child, value.into());
        Ok(child)
    }

    /// Reclaims the subtree rooted at `node` and returns the number of nodes
    /// freed.
    ///
    /// Deleting the root leaves the handle root-less with size 0. If more nodes
    /// are freed than the tree accounts for, `INVALID_SIZE` is returned and the
    /// size is left as it was; the nodes are gone either way.
    #[instrument(level = "debug", skip(self))]
    pub fn delete_branch(&mut self, node: NodeId) -> TreeResult<usize> {
        self.check()?;

        let parent = self.store.get(node).ok_or(TreeErrors::INVALID_NODE)?.parent;
        match parent {
            Some(parent) => {
                if let Some(owner) = self.store.get_mut(parent) {
                    if owner.left == Some(node) {
                        owner.left = None;
                    } else if owner.right == Some(node) {
                        owner.right = None;
                    }
                }
            }
            None => {
                assert_eq!(self.root, Some(node), "parentless node {} is not the root", node);
                self.root = None;
            }
        }

        let freed = self.store.free_subtree(node);
        if freed > self.size {
            warn!(freed, size = self.size, "freed more nodes than the tree accounts for");
            return Err(TreeErrors::INVALID_SIZE);
        }
        self.size -= freed;
        debug!(freed, size = self.size, "branch deleted");

        Ok(freed)
    }

    /// Replaces the payload of a live node.
    #[instrument(level = "debug", skip(self, value))]
    pub fn set_value(&mut self, node: NodeId, value: impl Into<T>) -> TreeResult<()> {
        self.check()?;

        if !self.store.contains(node) {
            return Err(TreeErrors::INVALID_NODE);
        }
        self.set_payload(node, value.into());
        Ok(())
    }

    /// Allocates an empty node into `slot` and accounts for it.
    ///
    /// The slot must be empty; an occupied slot is a caller bug.
    fn create_node(&mut self, slot: Slot) -> TreeResult<NodeId> {
        assert!(self.slot_is_empty(slot), "create_node: slot {:?} is occupied", slot);

        let parent = match slot {
            Slot::Root => None,
            Slot::Child(parent, _) => Some(parent),
        };
        let id = self.store.allocate(parent)?;

        match slot {
            Slot::Root => self.root = Some(id),
            Slot::Child(parent, side) => {
                if let Some(owner) = self.store.get_mut(parent) {
                    *owner.child_mut(side) = Some(id);
                }
            }
        }
        self.size += 1;

        Ok(id)
    }

    fn slot_is_empty(&self, slot: Slot) -> bool {
        match slot {
            Slot::Root => self.root.is_none(),
            Slot::Child(parent, side) => self
                .store
                .get(parent)
                .is_some_and(|node| node.child(side).is_none()),
        }
    }

    fn set_payload(&mut self, id: NodeId, value: T) {
        if let Some(node) = self.store.get_mut(id) {
            node.value = value;
        }
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Recorded size. Holds [`TRASH_SIZE`] once destructed.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of nodes currently allocated in the store.
    pub fn len_allocated(&self) -> usize {
        self.store.len()
    }

    pub fn node_limit(&self) -> Option<usize> {
        self.store.limit()
    }

    #[instrument(level = "trace", skip(self))]
    pub fn node(&self, id: NodeId) -> Option<&Node<T>> {
        self.store.get(id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.store.contains(id)
    }

    pub fn value(&self, id: NodeId) -> Option<&T> {
        self.node(id).map(Node::value)
    }

    pub fn left(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(Node::left)
    }

    pub fn right(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(Node::right)
    }

    pub fn child(&self, id: NodeId, side: Side) -> Option<NodeId> {
        self.node(id).and_then(|n| n.child(side))
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(Node::parent)
    }

    /// Follows `path` from the root. An empty path yields the root.
    #[instrument(level = "trace", skip(self))]
    pub fn find(&self, path: &[Side]) -> Option<NodeId> {
        path.iter()
            .try_fold(self.root?, |current, &side| self.child(current, side))
    }

    /// Number of levels below and including the root, 0 without a root.
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack: Vec<(NodeId, usize)> = self.root.map(|root| (root, 1)).into_iter().collect();

        while let Some((id, level)) = stack.pop() {
            let Some(node) = self.store.get(id) else {
                continue;
            };
            deepest = deepest.max(level);
            stack.extend([node.left, node.right].into_iter().flatten().map(|child| (child, level + 1)));
        }

        deepest
    }

    /// Pre-order walk: node, left subtree, right subtree.
    pub fn preorder(&self) -> PreOrder<'_, T> {
        PreOrder::new(self)
    }

    /// Nodes reachable from the root, counted by walking the links.
    pub fn count_reachable(&self) -> usize {
        self.preorder().count()
    }
}

pub struct PreOrder<'a, T> {
    tree: &'a Tree<T>,
    stack: Vec<NodeId>,
}

impl<'a, T: Payload> PreOrder<'a, T> {
    fn new(tree: &'a Tree<T>) -> Self {
        let mut stack = Vec::new();
        if let Some(root) = tree.root() {
            stack.push(root);
        }
        Self { tree, stack }
    }
}

impl<'a, T: Payload> Iterator for PreOrder<'a, T> {
    type Item = (NodeId, &'a Node<T>);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(current) = self.stack.pop() {
            if let Some(node) = self.tree.node(current) {
                // Right first so left is visited first
                if let Some(right) = node.right {
                    self.stack.push(right);
                }
                if let Some(left) = node.left {
                    self.stack.push(left);
                }
                return Some((current, node));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn constructed(value: &str) -> Tree {
        let mut tree = Tree::new();
        tree.construct(value).unwrap();
        tree
    }

    #[test]
    fn given_new_handle_when_validating_then_reports_size_and_root() {
        let tree: Tree = Tree::new();
        assert_eq!(
            tree.validate(),
            TreeErrors::INVALID_SIZE | TreeErrors::INVALID_ROOT
        );
        assert_eq!(tree.state(), TreeState::Unconstructed);
    }

    #[test]
    #[should_panic(expected = "is occupied")]
    fn given_occupied_slot_when_creating_node_then_panics() {
        let mut tree = constructed("root");
        let root = tree.root().unwrap();
        tree.insert(root, Side::Left, "a").unwrap();

        let _ = tree.create_node(Slot::Child(root, Side::Left));
    }

    #[test]
    fn given_size_lower_than_nodes_when_deleting_root_then_reports_invalid_size() {
        let mut tree = constructed("root");
        let root = tree.root().unwrap();
        tree.insert(root, Side::Left, "a").unwrap();
        tree.insert(root, Side::Right, "b").unwrap();
        tree.size = 2;

        assert_eq!(tree.delete_branch(root), Err(TreeErrors::INVALID_SIZE));
        // Nodes are gone, the size update was skipped
        assert_eq!(tree.len_allocated(), 0);
        assert_eq!(tree.size(), 2);
        assert!(tree.root().is_none());
        assert_eq!(tree.state(), TreeState::Corrupted);
    }

    #[test]
    fn given_size_mismatch_when_destructing_then_reports_and_still_destructs() {
        let mut tree = constructed("root");
        let root = tree.root().unwrap();
        tree.insert(root, Side::Left, "a").unwrap();
        tree.size = 7;

        assert_eq!(tree.destruct(), Err(TreeErrors::INVALID_SIZE));
        assert_eq!(tree.size(), TRASH_SIZE);
        assert!(tree.root().is_none());
        assert_eq!(tree.state(), TreeState::Destructed);
        assert_eq!(tree.destruct(), Err(TreeErrors::ALREADY_DESTRUCTED));
    }

    #[test]
    fn given_corrupted_handle_when_constructing_then_discards_leftovers() {
        let mut tree = constructed("root");
        let root = tree.root().unwrap();
        tree.insert(root, Side::Left, "a").unwrap();
        tree.size = 0;

        let new_root = tree.construct("fresh").unwrap();
        assert_eq!(tree.len_allocated(), 1);
        assert_eq!(tree.size(), 1);
        assert_eq!(tree.value(new_root).unwrap(), "fresh");
        assert!(!tree.contains(root));
    }

    #[test]
    fn given_tree_when_walking_preorder_then_visits_node_left_right() {
        let mut tree = constructed("r");
        let root = tree.root().unwrap();
        let a = tree.insert(root, Side::Left, "a").unwrap();
        tree.insert(root, Side::Right, "b").unwrap();
        tree.insert(a, Side::Right, "c").unwrap();

        let order: Vec<String> = tree.preorder().map(|(_, n)| n.value().to_string()).collect();
        assert_eq!(order, vec!["r", "a", "c", "b"]);
        assert_eq!(tree.depth(), 3);
        assert_eq!(tree.count_reachable(), tree.size());
    }

    #[test]
    fn given_scalar_payload_when_inserting_then_stores_value() {
        let mut tree: Tree<i64> = Tree::new();
        let root = tree.construct(42).unwrap();
        let child = tree.insert(root, Side::Right, -7).unwrap();

        assert_eq!(tree.value(child), Some(&-7));
        assert_eq!(tree.parent(child), Some(root));
        assert_eq!(tree.find(&[Side::Right]), Some(child));
        assert_eq!(tree.find(&[Side::Left]), None);
    }
}
