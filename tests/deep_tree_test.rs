//! Degenerate (list-shaped) trees must be walked and reclaimed without
//! exhausting the call stack.
//!
//! No tracing subscriber is installed here: instrumented spans for every
//! insert would dominate the runtime.

use bintree::diagnostics::text;
use bintree::domain::{NodeId, Side, Tree, Value, TRASH_SIZE};

const SPINE: usize = 100_000;

/// Root plus a left-leaning chain of `len` nodes; returns the root's left child.
fn left_spine(tree: &mut Tree<Value>, len: usize) -> NodeId {
    let root = tree.construct("root").expect("construct");
    let first = tree.insert(root, Side::Left, "0").expect("insert");
    let mut anchor = first;
    for i in 1..len {
        anchor = tree.insert(anchor, Side::Left, i.to_string()).expect("insert");
    }
    first
}

#[test]
fn given_deep_spine_when_deleting_branch_then_reclaims_every_node() {
    // Arrange
    let mut tree: Tree<Value> = Tree::new();
    let first = left_spine(&mut tree, SPINE);
    let root = tree.root().unwrap();
    tree.insert(root, Side::Right, "leaf").unwrap();

    // Act
    let freed = tree.delete_branch(first).unwrap();

    // Assert
    assert_eq!(freed, SPINE);
    assert_eq!(tree.size(), 2);
    assert_eq!(tree.len_allocated(), 2);
    assert_eq!(tree.left(root), None);
}

#[test]
fn given_deep_spine_when_destructing_then_handle_is_trashed() {
    // Arrange
    let mut tree: Tree<Value> = Tree::new();
    left_spine(&mut tree, SPINE);

    // Act
    let result = tree.destruct();

    // Assert
    assert!(result.is_ok());
    assert_eq!(tree.size(), TRASH_SIZE);
    assert_eq!(tree.len_allocated(), 0);
}

#[test]
fn given_deep_spine_when_measuring_then_walks_iteratively() {
    // Arrange
    let mut tree: Tree<Value> = Tree::new();
    left_spine(&mut tree, SPINE);

    // Act
    let depth = tree.depth();
    let reachable = tree.count_reachable();

    // Assert
    assert_eq!(depth, SPINE + 1);
    assert_eq!(reachable, SPINE + 1);
}

#[test]
fn given_deep_spine_when_rendering_text_then_lists_every_node() {
    // Arrange: kept shorter, the indentation grows with depth
    let mut tree: Tree<Value> = Tree::new();
    left_spine(&mut tree, 2_000);

    // Act
    let dump = text::render(&tree);

    // Assert
    let nodes = dump.lines().filter(|l| l.trim_start().starts_with("node [")).count();
    let labels = dump.lines().filter(|l| l.trim() == "Left:").count();
    assert_eq!(nodes, 2_001);
    assert_eq!(labels, 2_000);
    assert_eq!(dump.lines().last(), Some("size: 2001"));
}
