//! bintree: a manually-managed binary tree
//!
//! - `domain`: node store, tree lifecycle, validation and mutation
//! - `diagnostics`: Graphviz export and textual dumps
//! - `script`: line-oriented command language driving a tree
//! - `cli`, `config`: the `bintree` binary and its settings

pub mod cli;
pub mod config;
pub mod diagnostics;
pub mod domain;
pub mod exitcode;
pub mod script;
pub mod util;

pub use domain::{Node, NodeId, Payload, Side, Tree, TreeErrorKind, TreeErrors, TreeState, Value};
