//! Node, node identity and payload types.

use std::fmt;
use std::str::FromStr;

use generational_arena::Index;
use thiserror::Error;

/// Capacity of a string payload, including the terminator slot of the
/// on-disk record format. A [`Value`] holds at most `MAX_STR_SIZE - 1` bytes.
pub const MAX_STR_SIZE: usize = 64;

/// Payload stored in every node.
///
/// A freshly allocated node holds [`Payload::sentinel`] until the caller's
/// value is assigned.
pub trait Payload: Clone + fmt::Debug + fmt::Display {
    fn sentinel() -> Self;
}

/// Fixed-capacity string payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Value(String);

impl Value {
    /// Copies `s`, truncating on a char boundary to fit the capacity.
    pub fn new(s: &str) -> Self {
        let mut end = s.len().min(MAX_STR_SIZE - 1);
        while !s.is_char_boundary(end) {
            end -= 1;
        }
        Value(s[..end].to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Payload for Value {
    fn sentinel() -> Self {
        Value("nil".to_string())
    }
}

impl Payload for i64 {
    fn sentinel() -> Self {
        i64::MIN
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::new(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::new(&s)
    }
}

impl PartialEq<str> for Value {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for Value {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Stable handle to a node slot in a tree's store.
///
/// Handles are generational: once the node is reclaimed, the handle goes stale
/// and every lookup through it fails, even if the slot is reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) Index);

impl NodeId {
    /// Slot index and generation, used for dump identities.
    pub fn raw_parts(self) -> (usize, u64) {
        self.0.into_raw_parts()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (idx, generation) = self.raw_parts();
        write!(f, "{}:{}", idx, generation)
    }
}

/// Child position under a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn label(self) -> &'static str {
        match self {
            Side::Left => "Left",
            Side::Right => "Right",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid side '{0}' (expected left or right)")]
pub struct ParseSideError(pub String);

impl FromStr for Side {
    type Err = ParseSideError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "left" | "l" => Ok(Side::Left),
            "right" | "r" => Ok(Side::Right),
            _ => Err(ParseSideError(s.to_string())),
        }
    }
}

/// A tree node. Children are owned through `left` / `right`; `parent` is a
/// back link only and owns nothing.
#[derive(Debug, Clone)]
pub struct Node<T> {
    pub(crate) value: T,
    pub(crate) parent: Option<NodeId>,
    pub(crate) left: Option<NodeId>,
    pub(crate) right: Option<NodeId>,
}

impl<T: Payload> Node<T> {
    pub(crate) fn empty(parent: Option<NodeId>) -> Self {
        Self {
            value: T::sentinel(),
            parent,
            left: None,
            right: None,
        }
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn left(&self) -> Option<NodeId> {
        self.left
    }

    pub fn right(&self) -> Option<NodeId> {
        self.right
    }

    pub fn child(&self, side: Side) -> Option<NodeId> {
        match side {
            Side::Left => self.left,
            Side::Right => self.right,
        }
    }

    pub(crate) fn child_mut(&mut self, side: Side) -> &mut Option<NodeId> {
        match side {
            Side::Left => &mut self.left,
            Side::Right => &mut self.right,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.left.is_none() && self.right.is_none()
    }
}
