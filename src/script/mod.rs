//! Line-oriented command language driving a [`Tree`](crate::domain::Tree).

pub mod parser;
pub mod runner;

use thiserror::Error;

use crate::domain::TreeErrors;

pub use parser::{format_path, parse_line, parse_path, parse_script, Command, Line};
pub use runner::{Runner, DEMO_SCRIPT};

#[derive(Error, Debug)]
pub enum ScriptError {
    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("line {line}: no node at path '{path}'")]
    UnknownPath { line: usize, path: String },

    #[error("line {line}: {source}")]
    Tree {
        line: usize,
        #[source]
        source: TreeErrors,
    },

    #[error("line {line}: expected size {expected}, found {actual}")]
    SizeMismatch {
        line: usize,
        expected: usize,
        actual: usize,
    },

    #[error("cannot write output")]
    Output(#[from] std::io::Error),
}

impl ScriptError {
    pub fn tree(line: usize, source: TreeErrors) -> Self {
        ScriptError::Tree { line, source }
    }

    /// Tree error set carried by this error, if any.
    pub fn tree_errors(&self) -> Option<TreeErrors> {
        match self {
            ScriptError::Tree { source, .. } => Some(*source),
            _ => None,
        }
    }
}

pub type ScriptResult<T> = Result<T, ScriptError>;
