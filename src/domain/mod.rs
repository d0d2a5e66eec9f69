//! Domain layer: the binary tree container
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod error;
pub mod node;
pub mod store;
pub mod tree;

pub use error::{TreeErrorKind, TreeErrors, TreeResult};
pub use node::{Node, NodeId, ParseSideError, Payload, Side, Value, MAX_STR_SIZE};
pub use store::NodeStore;
pub use tree::{PreOrder, Tree, TreeState, TRASH_SIZE};
