//! Script runner and graph dumps against a real dump directory.

use std::fs;

use rstest::rstest;
use tempfile::TempDir;

use bintree::diagnostics::{DumpOptions, GraphDumper};
use bintree::domain::{Side, Tree, TreeErrors, Value};
use bintree::script::{Runner, ScriptError, DEMO_SCRIPT};
use bintree::tree_dump;
use bintree::util::testing;

fn dump_options(dir: &TempDir, renderer: Option<&str>) -> DumpOptions {
    DumpOptions {
        dump_dir: dir.path().join("graphviz"),
        dump_name: "tree_dump".to_string(),
        renderer: renderer.map(str::to_string),
        image_format: "png".to_string(),
    }
}

fn runner(dir: &TempDir) -> Runner<Vec<u8>> {
    testing::init_test_setup();
    Runner::new(Tree::new(), GraphDumper::new(dump_options(dir, None)), Vec::new())
}

// ============================================================
// Runner
// ============================================================

#[test]
fn given_demo_script_when_running_then_prints_sample_tree() {
    // Arrange
    let dir = TempDir::new().unwrap();
    let mut runner = runner(&dir);

    // Act
    runner.run_source(DEMO_SCRIPT).expect("demo script");

    // Assert
    let tree = runner.tree();
    let root = tree.root().unwrap();
    let left = tree.left(root).unwrap();
    assert_eq!(tree.size(), 5);
    assert_eq!(tree.value(root).unwrap(), "abobus");
    assert!(tree.left(left).is_some());
    assert!(tree.right(left).is_some());
    assert!(tree.right(root).is_some());

    let output = String::from_utf8(runner.into_output()).unwrap();
    assert_eq!(output.lines().filter(|l| l.contains("228")).count(), 4);
}

#[test]
fn given_script_with_dump_when_running_then_writes_dot_file() {
    // Arrange
    let dir = TempDir::new().unwrap();
    let mut runner = runner(&dir);
    let script = "new root\ninsert . right leaf\ndump\n";

    // Act
    runner.run_source(script).expect("script");

    // Assert
    let dot_path = dir.path().join("graphviz").join("tree_dump.dot");
    let dot = fs::read_to_string(&dot_path).expect("dot file written");
    assert!(dot.starts_with("digraph G"));
    assert!(dot.contains("leaf"));
    assert!(dot.contains("size = 2"));
    assert_eq!(runner.dumper().dumps_count(), 1);

    let output = String::from_utf8(runner.into_output()).unwrap();
    assert!(output.starts_with("dump 0: "));
}

#[test]
fn given_dump_on_error_when_tree_error_then_dumps_and_reports_error() {
    // Arrange
    let dir = TempDir::new().unwrap();
    let mut runner = runner(&dir).with_dump_on_error(true);

    // Act
    let err = runner
        .run_source("new root\ninsert . left a\ninsert . left b\n")
        .unwrap_err();

    // Assert
    assert_eq!(err.tree_errors(), Some(TreeErrors::INVALID_NODE));
    assert!(dir.path().join("graphviz").join("tree_dump.dot").exists());
    assert_eq!(runner.dumper().dumps_count(), 1);
}

#[test]
fn given_set_and_delete_when_running_then_tree_reflects_changes() {
    // Arrange
    let dir = TempDir::new().unwrap();
    let mut runner = runner(&dir);
    let script = r#"
new root
insert . left a
insert L right b
set LR "renamed node"
insert . right c
delete L
expect-size 2
"#;

    // Act
    runner.run_source(script).expect("script");

    // Assert
    let tree = runner.tree();
    let root = tree.root().unwrap();
    assert_eq!(tree.left(root), None);
    assert_eq!(tree.value(tree.right(root).unwrap()).unwrap(), "c");
}

#[test]
fn given_destroy_then_new_when_running_then_tree_is_rebuilt() {
    let dir = TempDir::new().unwrap();
    let mut runner = runner(&dir);

    runner
        .run_source("new V\ninsert . left x\ndestroy\nnew W\nexpect-size 1\n")
        .expect("script");

    let tree = runner.tree();
    assert_eq!(tree.value(tree.root().unwrap()).unwrap(), "W");
}

#[rstest]
#[case("destroy\n", TreeErrors::ALREADY_DESTRUCTED)]
#[case("new a\nnew b\n", TreeErrors::ALREADY_CONSTRUCTED)]
#[case("new a\ndestroy\ninsert . left x\n", TreeErrors::INVALID_ROOT | TreeErrors::INVALID_SIZE)]
fn given_lifecycle_misuse_when_running_then_reports_tree_errors(
    #[case] script: &str,
    #[case] expected: TreeErrors,
) {
    let dir = TempDir::new().unwrap();
    let mut runner = runner(&dir);

    let err = runner.run_source(script).unwrap_err();

    assert_eq!(err.tree_errors(), Some(expected));
}

#[test]
fn given_unknown_keyword_when_running_then_nothing_executes() {
    let dir = TempDir::new().unwrap();
    let mut runner = runner(&dir);

    let err = runner.run_source("new root\nfrobnicate\n").unwrap_err();

    assert!(matches!(err, ScriptError::Parse { line: 2, .. }));
    // Parsing happens before execution
    assert!(runner.tree().root().is_none());
}

// ============================================================
// GraphDumper
// ============================================================

#[test]
fn given_missing_renderer_when_dumping_then_dot_is_kept_and_counter_advances() {
    // Arrange
    testing::init_test_setup();
    let dir = TempDir::new().unwrap();
    let mut dumper = GraphDumper::new(dump_options(&dir, Some("bintree-no-such-renderer")));
    let mut tree: Tree<Value> = Tree::new();
    let root = tree.construct("root").unwrap();
    tree.insert(root, Side::Left, "a").unwrap();

    // Act
    let first = tree_dump!(dumper, &tree).expect("dump");
    let second = tree_dump!(dumper, &tree).expect("dump");

    // Assert
    assert!(first.image_path.is_none());
    assert_eq!(first.index, 0);
    assert_eq!(second.index, 1);
    assert_eq!(dumper.dumps_count(), 2);
    assert!(first.dot_path.exists());
}

#[test]
fn given_unwritable_dump_dir_when_dumping_then_reports_open_error() {
    // Arrange
    let dir = TempDir::new().unwrap();
    let blocker = dir.path().join("graphviz");
    fs::write(&blocker, "not a directory").unwrap();
    let mut dumper = GraphDumper::new(dump_options(&dir, None));
    let mut tree: Tree<Value> = Tree::new();
    tree.construct("root").unwrap();

    // Act
    let result = tree_dump!(dumper, &tree);

    // Assert
    assert!(result.is_err());
    assert_eq!(dumper.dumps_count(), 0);
}
