//! Tree error set
//!
//! Every tree operation reports a set of independent error kinds. Several kinds
//! can be present at once (an unconstructed handle has both an invalid size and
//! an invalid root), so the error type is a bit set rather than a single enum.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use thiserror::Error;

/// A single reason a tree operation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TreeErrorKind {
    CantAllocateMemory,
    AlreadyDestructed,
    InvalidRoot,
    InvalidSize,
    InvalidNode,
    AlreadyConstructed,
}

impl TreeErrorKind {
    /// All kinds in bit order.
    pub const ALL: [TreeErrorKind; 6] = [
        TreeErrorKind::CantAllocateMemory,
        TreeErrorKind::AlreadyDestructed,
        TreeErrorKind::InvalidRoot,
        TreeErrorKind::InvalidSize,
        TreeErrorKind::InvalidNode,
        TreeErrorKind::AlreadyConstructed,
    ];

    pub const fn bit(self) -> u32 {
        match self {
            TreeErrorKind::CantAllocateMemory => 1 << 0,
            TreeErrorKind::AlreadyDestructed => 1 << 1,
            TreeErrorKind::InvalidRoot => 1 << 2,
            TreeErrorKind::InvalidSize => 1 << 3,
            TreeErrorKind::InvalidNode => 1 << 4,
            TreeErrorKind::AlreadyConstructed => 1 << 5,
        }
    }

    pub const fn description(self) -> &'static str {
        match self {
            TreeErrorKind::CantAllocateMemory => "cannot allocate node",
            TreeErrorKind::AlreadyDestructed => "tree already destructed",
            TreeErrorKind::InvalidRoot => "invalid root",
            TreeErrorKind::InvalidSize => "invalid size",
            TreeErrorKind::InvalidNode => "invalid node",
            TreeErrorKind::AlreadyConstructed => "tree already constructed",
        }
    }
}

impl fmt::Display for TreeErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// Set of [`TreeErrorKind`]s, stored as a bitmask.
///
/// The empty set means "no error"; [`Tree::validate`](crate::domain::Tree::validate)
/// returns it for a well-formed handle. Fallible operations only ever return a
/// non-empty set in their `Err` arm.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[error("{}", describe(.0))]
pub struct TreeErrors(u32);

fn describe(bits: &u32) -> String {
    if *bits == 0 {
        return "no errors".to_string();
    }
    TreeErrorKind::ALL
        .iter()
        .filter(|kind| bits & kind.bit() != 0)
        .map(|kind| kind.description())
        .collect::<Vec<_>>()
        .join(", ")
}

impl TreeErrors {
    pub const CANT_ALLOCATE_MEMORY: TreeErrors = TreeErrors(TreeErrorKind::CantAllocateMemory.bit());
    pub const ALREADY_DESTRUCTED: TreeErrors = TreeErrors(TreeErrorKind::AlreadyDestructed.bit());
    pub const INVALID_ROOT: TreeErrors = TreeErrors(TreeErrorKind::InvalidRoot.bit());
    pub const INVALID_SIZE: TreeErrors = TreeErrors(TreeErrorKind::InvalidSize.bit());
    pub const INVALID_NODE: TreeErrors = TreeErrors(TreeErrorKind::InvalidNode.bit());
    pub const ALREADY_CONSTRUCTED: TreeErrors = TreeErrors(TreeErrorKind::AlreadyConstructed.bit());

    const MASK: u32 = (1 << 6) - 1;

    pub const fn empty() -> Self {
        TreeErrors(0)
    }

    /// Builds a set from raw bits, dropping bits that name no kind.
    pub const fn from_bits_truncate(bits: u32) -> Self {
        TreeErrors(bits & Self::MASK)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// True when every kind in `other` is also in `self`.
    pub const fn contains(self, other: TreeErrors) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn has(self, kind: TreeErrorKind) -> bool {
        self.0 & kind.bit() != 0
    }

    pub fn insert(&mut self, kind: TreeErrorKind) {
        self.0 |= kind.bit();
    }

    pub fn kinds(self) -> impl Iterator<Item = TreeErrorKind> {
        TreeErrorKind::ALL.into_iter().filter(move |kind| self.has(*kind))
    }

    /// `Ok(())` for the empty set, `Err(self)` otherwise.
    pub fn into_result(self) -> Result<(), TreeErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl From<TreeErrorKind> for TreeErrors {
    fn from(kind: TreeErrorKind) -> Self {
        TreeErrors(kind.bit())
    }
}

impl BitOr for TreeErrors {
    type Output = TreeErrors;

    fn bitor(self, rhs: TreeErrors) -> TreeErrors {
        TreeErrors(self.0 | rhs.0)
    }
}

impl BitOrAssign for TreeErrors {
    fn bitor_assign(&mut self, rhs: TreeErrors) {
        self.0 |= rhs.0;
    }
}

/// Result type for tree operations.
pub type TreeResult<T> = Result<T, TreeErrors>;
