//! Console dumps of a tree.

use termtree::Tree as DisplayTree;

use crate::domain::{NodeId, Payload, Side, Tree};

const INDENT: &str = "    ";

/// Line-oriented dump: one line per node, `Left:` / `Right:` labels above
/// each populated subtree, and the recorded size last.
///
/// ```text
/// node [0:0] abobus
///     Left:
///         node [1:0] 228
///     Right:
///         node [2:0] 228
/// size: 3
/// ```
pub fn render<T: Payload>(tree: &Tree<T>) -> String {
    let mut out = String::new();
    let Some(root) = tree.root() else {
        out.push_str("(no root)\n");
        out.push_str(&format!("size: {}\n", tree.size()));
        return out;
    };

    let mut stack = vec![Line::Node(root, 0)];
    while let Some(line) = stack.pop() {
        match line {
            Line::Label(side, depth) => {
                out.push_str(&format!("{}{}:\n", INDENT.repeat(depth), side));
            }
            Line::Node(id, depth) => {
                let Some(node) = tree.node(id) else {
                    continue;
                };
                out.push_str(&format!("{}node [{}] {}\n", INDENT.repeat(depth), id, node.value()));

                // Pushed in reverse so the left subtree is written first
                for side in [Side::Right, Side::Left] {
                    if let Some(child) = node.child(side) {
                        stack.push(Line::Node(child, depth + 2));
                        stack.push(Line::Label(side, depth + 1));
                    }
                }
            }
        }
    }

    out.push_str(&format!("size: {}\n", tree.size()));
    out
}

/// Pending output of [`render`].
enum Line {
    Node(NodeId, usize),
    Label(Side, usize),
}

/// Box-drawing view of the tree, children prefixed with `L`/`R`.
///
/// Built bottom-up: a node's display is assembled once both children are done.
pub fn to_termtree<T: Payload>(tree: &Tree<T>) -> DisplayTree<String> {
    let Some(root) = tree.root() else {
        return DisplayTree::new("Empty tree".to_string());
    };

    let mut done: Vec<DisplayTree<String>> = Vec::new();
    // (node, side under its parent, children already scheduled)
    let mut stack: Vec<(NodeId, Option<Side>, bool)> = vec![(root, None, false)];

    while let Some((id, side, expanded)) = stack.pop() {
        let children: Vec<(NodeId, Side)> = [Side::Left, Side::Right]
            .into_iter()
            .filter_map(|s| tree.child(id, s).map(|child| (child, s)))
            .collect();

        if expanded {
            let leaves = done.split_off(done.len() - children.len());
            done.push(DisplayTree::new(label(tree, id, side)).with_leaves(leaves));
            continue;
        }

        stack.push((id, side, true));
        for (child, s) in children.into_iter().rev() {
            stack.push((child, Some(s), false));
        }
    }

    done.pop().unwrap_or_else(|| DisplayTree::new("Empty tree".to_string()))
}

fn label<T: Payload>(tree: &Tree<T>, id: NodeId, side: Option<Side>) -> String {
    match (tree.value(id), side) {
        (Some(value), Some(Side::Left)) => format!("L: {}", value),
        (Some(value), Some(Side::Right)) => format!("R: {}", value),
        (Some(value), None) => value.to_string(),
        (None, _) => format!("<stale {}>", id),
    }
}
