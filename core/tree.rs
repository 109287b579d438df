//! Directory tree construction and rendering for prompt embedding.
//!
//! A flat list of non-ignored file paths becomes a [`TreeNode`] hierarchy,
//! which renders as the familiar `tree`-style diagram that gets pasted into
//! model prompts.

use crate::config::Config;
use crate::error::Result;
use crate::scan;
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeNode {
    pub name: String,
    pub is_directory: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    /// Synthetic root: empty name, classified as a directory.
    pub fn root() -> Self {
        Self {
            name: String::new(),
            is_directory: true,
            children: Vec::new(),
        }
    }

    fn new(name: &str, is_directory: bool) -> Self {
        Self {
            name: name.to_string(),
            is_directory,
            children: Vec::new(),
        }
    }
}

/// Builds a tree from slash-delimited relative paths.
///
/// Paths sharing a directory prefix merge into one subtree regardless of
/// input order, because each level is matched by segment name. The function
/// is total: empty strings and doubled slashes yield nodes with empty names
/// rather than an error.
pub fn build_tree(paths: &[String]) -> TreeNode {
    log::debug!("Building directory tree from {} paths...", paths.len());
    let mut root = TreeNode::root();
    for path in paths {
        insert_path(&mut root, path);
    }
    root
}

fn insert_path(root: &mut TreeNode, path: &str) {
    let segments: Vec<&str> = path.split('/').collect();
    let mut node = root;
    for (depth, segment) in segments.iter().enumerate() {
        let is_last = depth + 1 == segments.len();
        let index = match node.children.iter().position(|c| c.name == *segment) {
            Some(index) => index,
            None => {
                node.children.push(TreeNode::new(segment, !is_last));
                sort_children(&mut node.children);
                node.children
                    .iter()
                    .position(|c| c.name == *segment)
                    .unwrap_or(node.children.len() - 1)
            }
        };
        node = &mut node.children[index];
    }
}

/// Directories before files, then alphabetical within each group.
fn sort_children(children: &mut [TreeNode]) {
    children.sort_by(|a, b| {
        b.is_directory
            .cmp(&a.is_directory)
            .then_with(|| a.name.cmp(&b.name))
    });
}

/// Renders a node as an indented text diagram.
///
/// Each named node emits one line: the accumulated ancestor `prefix`, then
/// `├── ` or (for the last sibling) `└── `, then the name. The prefix passed
/// to its children grows by `│   ` or four spaces, so vertical bars continue
/// only where a later sibling still follows. Nodes with empty names (the
/// synthetic root) print nothing themselves but still render their children;
/// an empty tree therefore renders as "". Start with `prefix = ""` and
/// `is_last = true`.
pub fn render_tree(node: &TreeNode, prefix: &str, is_last: bool) -> String {
    let mut out = String::new();
    let mut child_prefix = prefix.to_string();
    if !node.name.is_empty() {
        let connector = if is_last { "└── " } else { "├── " };
        out.push_str(prefix);
        out.push_str(connector);
        out.push_str(&node.name);
        out.push('\n');
        child_prefix.push_str(if is_last { "    " } else { "│   " });
    }
    let count = node.children.len();
    for (i, child) in node.children.iter().enumerate() {
        out.push_str(&render_tree(child, &child_prefix, i + 1 == count));
    }
    out
}

/// Produces the prompt-ready tree string for a project root.
///
/// This is the boundary that never fails: a blank root yields "", and any
/// enumeration error is logged and swallowed so prompt assembly degrades to
/// an empty tree section instead of aborting the request.
pub fn generate_directory_tree(project_root: &Path, config: &Config) -> String {
    if project_root.as_os_str().is_empty()
        || project_root.to_string_lossy().trim().is_empty()
    {
        log::debug!("Blank project root, skipping directory tree generation.");
        return String::new();
    }
    match tree_for_root(project_root, config) {
        Ok(rendered) => rendered,
        Err(e) => {
            log::error!(
                "Directory tree generation failed for '{}': {}",
                project_root.display(),
                e
            );
            String::new()
        }
    }
}

fn tree_for_root(project_root: &Path, config: &Config) -> Result<String> {
    let paths = scan::collect_project_files(project_root, config)?;
    let root = build_tree(&paths);
    Ok(render_tree(&root, "", true).trim_end().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn paths(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn empty_input_yields_bare_root_and_empty_rendering() {
        let root = build_tree(&[]);
        assert_eq!(root.name, "");
        assert!(root.is_directory);
        assert!(root.children.is_empty());
        assert_eq!(render_tree(&root, "", true), "");
    }

    #[test]
    fn single_file_renders_one_line() {
        let root = build_tree(&paths(&["readme.md"]));
        assert_eq!(render_tree(&root, "", true), "└── readme.md\n");
    }

    #[test]
    fn shared_prefixes_merge_regardless_of_order() {
        let forward = build_tree(&paths(&["a/b.ts", "a/c.ts"]));
        let reversed = build_tree(&paths(&["a/c.ts", "a/b.ts"]));
        assert_eq!(forward, reversed);
        assert_eq!(forward.children.len(), 1);
        let dir = &forward.children[0];
        assert_eq!(dir.name, "a");
        assert!(dir.is_directory);
        let names: Vec<&str> = dir.children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["b.ts", "c.ts"]);
    }

    #[test]
    fn duplicates_do_not_create_sibling_copies() {
        let root = build_tree(&paths(&["a/b.ts", "a/b.ts"]));
        assert_eq!(root.children.len(), 1);
        assert_eq!(root.children[0].children.len(), 1);
    }

    #[test]
    fn directories_sort_before_files_then_alphabetical() {
        let root = build_tree(&paths(&["b.ts", "a/x.ts"]));
        let names: Vec<(&str, bool)> = root
            .children
            .iter()
            .map(|c| (c.name.as_str(), c.is_directory))
            .collect();
        assert_eq!(names, vec![("a", true), ("b.ts", false)]);
    }

    #[test]
    fn intermediate_segments_are_directories_and_final_is_file() {
        let root = build_tree(&paths(&["src/components/Button.tsx"]));
        let src = &root.children[0];
        assert!(src.is_directory);
        let components = &src.children[0];
        assert!(components.is_directory);
        let file = &components.children[0];
        assert_eq!(file.name, "Button.tsx");
        assert!(!file.is_directory);
    }

    #[test]
    fn doubled_slashes_yield_empty_name_nodes_without_error() {
        let root = build_tree(&paths(&["a//b.ts"]));
        let a = &root.children[0];
        assert_eq!(a.name, "a");
        let blank = &a.children[0];
        assert_eq!(blank.name, "");
        assert!(blank.is_directory);
        assert_eq!(blank.children[0].name, "b.ts");
    }

    #[test]
    fn existing_file_node_is_not_reclassified_when_descended_through() {
        // "a" arrives as a file first, then as a parent. The builder only
        // looks up by name, so the node keeps its file classification while
        // gaining children.
        let root = build_tree(&paths(&["a", "a/b.txt"]));
        assert_eq!(root.children.len(), 1);
        let a = &root.children[0];
        assert!(!a.is_directory);
        assert_eq!(a.children[0].name, "b.txt");
    }

    #[test]
    fn rendering_is_deterministic() {
        let root = build_tree(&paths(&["src/lib.rs", "src/main.rs", "Cargo.toml"]));
        let first = render_tree(&root, "", true);
        let second = render_tree(&root, "", true);
        assert_eq!(first, second);
    }

    #[test]
    fn end_to_end_diagram_matches_tree_command_style() {
        let root = build_tree(&paths(&[
            "src/index.ts",
            "src/utils/helper.ts",
            "package.json",
        ]));
        let rendered = render_tree(&root, "", true);
        let expected = "\
├── src
│   ├── utils
│   │   └── helper.ts
│   └── index.ts
└── package.json
";
        assert_eq!(rendered, expected);
    }

    #[test]
    fn last_sibling_children_indent_with_spaces_not_bars() {
        let root = build_tree(&paths(&["a/deep/leaf.rs", "a/top.rs"]));
        let rendered = render_tree(&root, "", true);
        let expected = "\
└── a
    ├── deep
    │   └── leaf.rs
    └── top.rs
";
        assert_eq!(rendered, expected);
    }

    #[test]
    fn blank_project_root_yields_empty_string() {
        let config = Config::default();
        assert_eq!(generate_directory_tree(Path::new(""), &config), "");
        assert_eq!(generate_directory_tree(Path::new("   "), &config), "");
    }

    #[test]
    fn enumeration_failure_is_swallowed_to_empty_string() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("file.rs"), "fn main() {}\n").unwrap();
        let mut config = Config::default();
        config.tree.exclude = vec!["[invalid".to_string()];
        assert_eq!(generate_directory_tree(dir.path(), &config), "");
    }

    #[test]
    fn orchestrator_returns_trimmed_diagram() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("src")).unwrap();
        std::fs::write(dir.path().join("src/main.rs"), "fn main() {}\n").unwrap();
        std::fs::write(dir.path().join("README.md"), "# readme\n").unwrap();
        let config = Config::default();
        let rendered = generate_directory_tree(dir.path(), &config);
        assert_eq!(rendered, "├── src\n│   └── main.rs\n└── README.md");
    }
}
