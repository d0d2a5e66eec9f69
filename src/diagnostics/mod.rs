//! Read-only diagnostics: Graphviz export and textual dumps.
//!
//! Nothing in here mutates a tree or takes part in validation.

pub mod graphviz;
pub mod text;

use std::path::PathBuf;

use thiserror::Error;

pub use graphviz::{render_dot, DumpOptions, DumpReport, DumpSite, GraphDumper};

#[derive(Error, Debug)]
pub enum DiagnosticsError {
    #[error("cannot open dump file {path}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot write dump file {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type DiagnosticsResult<T> = Result<T, DiagnosticsError>;

/// Name of the enclosing function, e.g. `bintree::script::runner::Runner::dump`.
#[macro_export]
macro_rules! function_name {
    () => {{
        fn f() {}
        fn type_name_of<T>(_: T) -> &'static str {
            std::any::type_name::<T>()
        }
        let name = type_name_of(f);
        let name = name.strip_suffix("::f").unwrap_or(name);
        name.trim_end_matches("::{{closure}}")
    }};
}

/// Captures the call site of a dump: expression text, function, file and line.
#[macro_export]
macro_rules! dump_site {
    ($tree:expr) => {
        $crate::diagnostics::DumpSite {
            expr: stringify!($tree),
            function: $crate::function_name!(),
            file: file!(),
            line: line!(),
        }
    };
}

/// Exports `$tree` through `$dumper`, recording where the dump was requested.
///
/// ```ignore
/// let report = tree_dump!(dumper, &tree)?;
/// ```
#[macro_export]
macro_rules! tree_dump {
    ($dumper:expr, $tree:expr) => {
        $dumper.dump($tree, $crate::dump_site!($tree))
    };
}
