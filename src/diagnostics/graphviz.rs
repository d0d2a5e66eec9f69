//! Graphviz export of a tree.
//!
//! Each dump writes `<dump_dir>/<dump_name>.dot` and, when a renderer is
//! configured, rasterizes it to `<dump_dir>/<dump_name><n>.<format>` where `n`
//! counts the dumps made by this [`GraphDumper`].

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, instrument, warn};

use crate::config::Settings;
use crate::diagnostics::{DiagnosticsError, DiagnosticsResult};
use crate::domain::{NodeId, Payload, Tree};

/// Where a dump was requested from. Built by [`dump_site!`](crate::dump_site).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DumpSite {
    pub expr: &'static str,
    pub function: &'static str,
    pub file: &'static str,
    pub line: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DumpOptions {
    pub dump_dir: PathBuf,
    pub dump_name: String,
    /// Renderer executable, None to only write the .dot file
    pub renderer: Option<String>,
    pub image_format: String,
}

impl DumpOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            dump_dir: settings.dump_dir.clone(),
            dump_name: settings.dump_name.clone(),
            renderer: settings.render.then(|| settings.renderer.clone()),
            image_format: settings.image_format.clone(),
        }
    }
}

impl Default for DumpOptions {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}

/// Files produced by one dump.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DumpReport {
    pub dot_path: PathBuf,
    /// Rendered image, None if rendering was disabled or failed
    pub image_path: Option<PathBuf>,
    /// Counter value this dump was numbered with
    pub index: usize,
}

#[derive(Debug)]
pub struct GraphDumper {
    options: DumpOptions,
    dumps_count: usize,
}

impl GraphDumper {
    pub fn new(options: DumpOptions) -> Self {
        Self {
            options,
            dumps_count: 0,
        }
    }

    pub fn options(&self) -> &DumpOptions {
        &self.options
    }

    /// Number of completed exports.
    pub fn dumps_count(&self) -> usize {
        self.dumps_count
    }

    pub fn dot_path(&self) -> PathBuf {
        self.options
            .dump_dir
            .join(format!("{}.dot", self.options.dump_name))
    }

    fn image_path(&self, index: usize) -> PathBuf {
        self.options.dump_dir.join(format!(
            "{}{}.{}",
            self.options.dump_name, index, self.options.image_format
        ))
    }

    /// Writes the .dot file for `tree` and renders it.
    ///
    /// Failing to write the .dot file abandons the export and leaves the
    /// counter alone. Renderer failures are only logged.
    #[instrument(level = "debug", skip(self, tree))]
    pub fn dump<T: Payload>(&mut self, tree: &Tree<T>, site: DumpSite) -> DiagnosticsResult<DumpReport> {
        let dot_path = self.dot_path();

        fs::create_dir_all(&self.options.dump_dir).map_err(|source| DiagnosticsError::Open {
            path: self.options.dump_dir.clone(),
            source,
        })?;
        let mut file = File::create(&dot_path).map_err(|source| DiagnosticsError::Open {
            path: dot_path.clone(),
            source,
        })?;
        file.write_all(render_dot(tree, &site).as_bytes())
            .map_err(|source| DiagnosticsError::Write {
                path: dot_path.clone(),
                source,
            })?;
        drop(file);

        let index = self.dumps_count;
        let image_path = self.render(&dot_path, index);
        self.dumps_count += 1;

        debug!(dot = %dot_path.display(), index, "tree dumped");
        Ok(DumpReport {
            dot_path,
            image_path,
            index,
        })
    }

    fn render(&self, dot_path: &Path, index: usize) -> Option<PathBuf> {
        let renderer = self.options.renderer.as_ref()?;
        let image_path = self.image_path(index);

        let status = Command::new(renderer)
            .arg(dot_path)
            .arg("-T")
            .arg(&self.options.image_format)
            .arg("-o")
            .arg(&image_path)
            .status();

        match status {
            Ok(status) if status.success() => Some(image_path),
            Ok(status) => {
                warn!(%renderer, %status, "renderer failed");
                None
            }
            Err(e) => {
                warn!(%renderer, error = %e, "cannot run renderer");
                None
            }
        }
    }
}

fn dot_id(id: NodeId) -> String {
    let (idx, generation) = id.raw_parts();
    format!("node_{}_{}", idx, generation)
}

fn link_label(link: Option<NodeId>) -> String {
    link.map_or_else(|| "nil".to_string(), |id| id.to_string())
}

/// Escapes a plain quoted label (non-record shapes).
fn escape_quoted(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '"' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Escapes characters that are structural inside record labels.
fn escape_record(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '"' | '\\' | '{' | '}' | '|' | '<' | '>') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Graphviz description of `tree`: one record per node, one edge per child
/// link and an info node naming the dump site.
pub fn render_dot<T: Payload>(tree: &Tree<T>, site: &DumpSite) -> String {
    let mut out = String::new();
    out.push_str(
        "digraph G\n\
         {\n    \
         graph [dpi = 150]\n    \
         ranksep = 0.6;\n    \
         splines = curved;\n    \
         edge [minlen = 3];\n    \
         node [shape = record, style = \"rounded\", fixedsize = true, height = 1, width = 4, fontsize = 15];\n",
    );
    out.push_str(&format!(
        "    info_node [shape = note, color = green, label = \"{} size = {}\\n from {}\\n {}:{}\\n {}\"];\n",
        escape_quoted(site.expr),
        tree.size(),
        escape_quoted(site.function),
        escape_quoted(site.file),
        site.line,
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
    ));

    for (id, node) in tree.preorder() {
        out.push_str(&format!(
            "    {} [label = \"[{}] {} | {{ <l> left = [{}] | <r> right = [{}] }}\"];\n",
            dot_id(id),
            id,
            escape_record(&node.value().to_string()),
            link_label(node.left()),
            link_label(node.right()),
        ));
    }

    for (id, node) in tree.preorder() {
        if let Some(left) = node.left() {
            out.push_str(&format!("    {}:l -> {};\n", dot_id(id), dot_id(left)));
        }
        if let Some(right) = node.right() {
            out.push_str(&format!("    {}:r -> {};\n", dot_id(id), dot_id(right)));
        }
    }

    if let Some(root) = tree.root() {
        out.push_str(&format!("    info_node -> {} [style = invis];\n", dot_id(root)));
    }
    out.push_str("}\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Side, Value};
    use crate::dump_site;

    fn sample_tree() -> Tree {
        let mut tree = Tree::new();
        let root = tree.construct("root").unwrap();
        tree.insert(root, Side::Left, "a|b").unwrap();
        tree.insert(root, Side::Right, "c").unwrap();
        tree
    }

    #[test]
    fn given_tree_when_rendering_dot_then_emits_nodes_edges_and_site() {
        let tree = sample_tree();
        let site = dump_site!(tree);

        let dot = render_dot(&tree, &site);

        assert!(dot.starts_with("digraph G"));
        assert_eq!(dot.matches("[label = \"[").count(), 3);
        assert_eq!(dot.matches(" -> node_").count(), 3); // 2 edges + info link
        assert!(dot.contains(":l -> "));
        assert!(dot.contains(":r -> "));
        assert!(dot.contains("a\\|b"));
        assert!(dot.contains("size = 3"));
        assert!(dot.contains(file!()));
        assert!(dot.contains("given_tree_when_rendering_dot_then_emits_nodes_edges_and_site"));
        assert!(dot.trim_end().ends_with('}'));
    }

    #[test]
    fn given_record_metacharacters_in_site_when_rendering_then_info_label_keeps_them() {
        let tree = sample_tree();
        let site = DumpSite {
            expr: "pick(&t, {a|b}) < \"x\"",
            function: "f",
            file: "dir\\file.rs",
            line: 7,
        };

        let dot = render_dot(&tree, &site);

        let info = dot
            .lines()
            .find(|l| l.contains("info_node [shape = note"))
            .expect("info node");
        assert!(info.contains("label = \"pick(&t, {a|b}) < \\\"x\\\" size = 3"));
        assert!(info.contains("dir\\\\file.rs:7"));
        // record labels are still escaped
        assert!(dot.contains("a\\|b"));
    }

    #[test]
    fn given_empty_tree_when_rendering_dot_then_only_info_node() {
        let tree: Tree<Value> = Tree::new();
        let dot = render_dot(&tree, &dump_site!(tree));

        assert!(dot.contains("info_node"));
        assert!(!dot.contains("->"));
    }

    #[test]
    fn given_dump_site_macro_when_expanded_then_records_expression() {
        let tree = sample_tree();
        let site = dump_site!(&tree);
        assert_eq!(site.expr, "&tree");
        assert_eq!(site.file, file!());
        assert!(site.function.ends_with("given_dump_site_macro_when_expanded_then_records_expression"));
    }
}
