//! Executes parsed commands against a tree.

use std::io::Write;

use tracing::{debug, instrument, warn};

use crate::diagnostics::{text, GraphDumper};
use crate::domain::{NodeId, Side, Tree, Value};
use crate::script::parser::{format_path, parse_script, Command, Line};
use crate::script::{ScriptError, ScriptResult};
use crate::tree_dump;

/// Builds the five-node sample tree and prints it.
pub const DEMO_SCRIPT: &str = r#"# sample tree
new abobus
insert . left 228
insert L left 228
insert L right 228
insert . right 228
expect-size 5
print
"#;

pub struct Runner<W: Write> {
    tree: Tree<Value>,
    dumper: GraphDumper,
    dump_on_error: bool,
    out: W,
}

impl<W: Write> Runner<W> {
    pub fn new(tree: Tree<Value>, dumper: GraphDumper, out: W) -> Self {
        Self {
            tree,
            dumper,
            dump_on_error: false,
            out,
        }
    }

    /// Dump the tree whenever a command fails with a tree error.
    pub fn with_dump_on_error(mut self, enabled: bool) -> Self {
        self.dump_on_error = enabled;
        self
    }

    pub fn tree(&self) -> &Tree<Value> {
        &self.tree
    }

    pub fn dumper(&self) -> &GraphDumper {
        &self.dumper
    }

    pub fn into_output(self) -> W {
        self.out
    }

    pub fn run_source(&mut self, source: &str) -> ScriptResult<()> {
        let lines = parse_script(source)?;
        self.run(&lines)
    }

    /// Executes `lines` in order, stopping at the first failure.
    pub fn run(&mut self, lines: &[Line]) -> ScriptResult<()> {
        for line in lines {
            self.execute(line)?;
        }
        Ok(())
    }

    #[instrument(level = "debug", skip(self))]
    pub fn execute(&mut self, line: &Line) -> ScriptResult<()> {
        let result = self.apply(line);
        if let Err(ScriptError::Tree { source, .. }) = &result {
            debug!(errors = %source, "tree error");
            if self.dump_on_error {
                // the tree error is what gets reported
                if let Err(e) = self.dump_state() {
                    warn!(error = %e, "dump after failure did not complete");
                }
            }
        }
        result
    }

    fn apply(&mut self, line: &Line) -> ScriptResult<()> {
        let number = line.number;
        match &line.command {
            Command::New(value) => {
                self.tree
                    .construct(value.as_str())
                    .map_err(|e| ScriptError::tree(number, e))?;
            }
            Command::Destroy => {
                self.tree
                    .destruct()
                    .map_err(|e| ScriptError::tree(number, e))?;
            }
            Command::Insert { path, side, value } => {
                let node = self.resolve(path, number)?;
                self.tree
                    .insert(node, *side, value.as_str())
                    .map_err(|e| ScriptError::tree(number, e))?;
            }
            Command::Set { path, value } => {
                let node = self.resolve(path, number)?;
                self.tree
                    .set_value(node, value.as_str())
                    .map_err(|e| ScriptError::tree(number, e))?;
            }
            Command::Delete { path } => {
                let node = self.resolve(path, number)?;
                let freed = self
                    .tree
                    .delete_branch(node)
                    .map_err(|e| ScriptError::tree(number, e))?;
                debug!(freed, path = %format_path(path), "branch deleted");
            }
            Command::Print => write!(self.out, "{}", text::render(&self.tree))?,
            Command::Show => write!(self.out, "{}", text::to_termtree(&self.tree))?,
            Command::Dump => self.dump_state()?,
            Command::ExpectSize(expected) => {
                if self.tree.size() != *expected {
                    return Err(ScriptError::SizeMismatch {
                        line: number,
                        expected: *expected,
                        actual: self.tree.size(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Node at `path`. A malformed tree reports its validation errors rather
    /// than a missing path.
    fn resolve(&self, path: &[Side], number: usize) -> ScriptResult<NodeId> {
        self.tree.check().map_err(|e| ScriptError::tree(number, e))?;
        self.tree
            .find(path)
            .ok_or_else(|| ScriptError::UnknownPath {
                line: number,
                path: format_path(path),
            })
    }

    /// Graph export of the current tree. Export failures are reported on the
    /// output and do not stop the script.
    fn dump_state(&mut self) -> ScriptResult<()> {
        match tree_dump!(self.dumper, &self.tree) {
            Ok(report) => {
                write!(self.out, "dump {}: {}", report.index, report.dot_path.display())?;
                if let Some(image) = &report.image_path {
                    write!(self.out, " -> {}", image.display())?;
                }
                writeln!(self.out)?;
            }
            Err(e) => {
                warn!(error = %e, "graph dump failed");
                writeln!(self.out, "dump failed: {}", e)?;
            }
        }
        Ok(())
    }
}
