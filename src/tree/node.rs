//! Tree node type shared by desired and live trees.

use serde::{Deserialize, Serialize};
use std::fmt::Write;

use super::path;

/// One path-addressed entry of a desired or live tree.
///
/// The root node has no name. Children are matched by name when diffing,
/// so their order never produces actions by itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    /// Segment name, unique among siblings. `None` only for the root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Payload stored at this path.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub value: String,
    /// Exclusion flag; `Some(true)` leaves this subtree untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ignore: Option<bool>,
    /// Child nodes.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Node>,
}

impl Node {
    /// Creates an unnamed root node with the given children.
    #[must_use]
    pub const fn root(children: Vec<Self>) -> Self {
        Self {
            name: None,
            value: String::new(),
            ignore: None,
            children,
        }
    }

    /// Creates a named leaf node.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            value: value.into(),
            ignore: None,
            children: Vec::new(),
        }
    }

    /// Replaces the children of this node.
    #[must_use]
    pub fn with_children(mut self, children: Vec<Self>) -> Self {
        self.children = children;
        self
    }

    /// Appends one child.
    #[must_use]
    pub fn with_child(mut self, child: Self) -> Self {
        self.children.push(child);
        self
    }

    /// Sets the ignore flag.
    #[must_use]
    pub const fn with_ignore(mut self, ignore: bool) -> Self {
        self.ignore = Some(ignore);
        self
    }

    /// Returns the segment name, or an empty string for the root.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or_default()
    }

    /// Returns true if this node and its subtree are excluded from diffing.
    #[must_use]
    pub fn is_ignored(&self) -> bool {
        self.ignore == Some(true)
    }

    /// Finds a direct child by name.
    #[must_use]
    pub fn child(&self, name: &str) -> Option<&Self> {
        self.children.iter().find(|c| c.name() == name)
    }

    /// Resolves an absolute path relative to this node taken as `/`.
    #[must_use]
    pub fn find(&self, target: &str) -> Option<&Self> {
        path::segments(target).try_fold(self, |node, segment| node.child(segment))
    }

    /// Counts the nodes in this subtree, including this one.
    #[must_use]
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(Self::node_count).sum::<usize>()
    }

    /// Renders an indented outline of the tree.
    ///
    /// `max_depth` limits how many levels below this node are shown;
    /// `None` renders everything.
    #[must_use]
    pub fn outline(&self, max_depth: Option<usize>) -> String {
        let mut output = String::new();
        self.write_outline(&mut output, 0, max_depth);
        output
    }

    fn write_outline(&self, output: &mut String, depth: usize, max_depth: Option<usize>) {
        let indent = "  ".repeat(depth);
        let label = self.name.as_deref().unwrap_or("/");
        let _ = write!(output, "{indent}{label}");
        if !self.value.is_empty() {
            let _ = write!(output, " = {}", self.value);
        }
        if self.is_ignored() {
            output.push_str(" [ignored]");
        }
        output.push('\n');

        if max_depth.is_some_and(|max| depth >= max) {
            if !self.children.is_empty() {
                let _ = writeln!(output, "{indent}  ... ({} more)", self.node_count() - 1);
            }
            return;
        }

        for child in &self.children {
            child.write_outline(output, depth + 1, max_depth);
        }
    }
}
