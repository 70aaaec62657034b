//! Structural validation of desired trees.
//!
//! A desired tree must satisfy the model invariants before any remote call
//! is made: an unnamed root, non-empty sibling names without `/`, and no
//! duplicate names under one parent.

use std::collections::HashSet;
use tracing::debug;

use crate::error::{Result, TreeError, ZkTreeError};

use super::node::Node;
use super::path;

/// Validator for desired trees.
#[derive(Debug, Default)]
pub struct TreeValidator;

impl TreeValidator {
    /// Creates a new validator.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Validates a tree, failing on the first violation found.
    ///
    /// # Errors
    ///
    /// Returns a [`TreeError`] describing the first malformed node.
    pub fn validate(&self, root: &Node) -> Result<()> {
        let errors = self.check(root);

        match errors.into_iter().next() {
            None => {
                debug!("Tree validation passed ({} nodes)", root.node_count());
                Ok(())
            }
            Some(first) => Err(ZkTreeError::Tree(first)),
        }
    }

    /// Collects every violation in the tree, in traversal order.
    #[must_use]
    pub fn check(&self, root: &Node) -> Vec<TreeError> {
        let mut errors = Vec::new();

        if let Some(name) = &root.name {
            errors.push(TreeError::NamedRoot { name: name.clone() });
        }
        Self::check_children(root, path::ROOT, &mut errors);

        errors
    }

    fn check_children(node: &Node, node_path: &str, errors: &mut Vec<TreeError>) {
        let mut seen = HashSet::new();

        for child in &node.children {
            let Some(name) = child.name.as_deref() else {
                errors.push(TreeError::MissingName {
                    parent: node_path.to_string(),
                });
                continue;
            };

            if name.is_empty() || name.contains('/') {
                errors.push(TreeError::InvalidName {
                    parent: node_path.to_string(),
                    name: name.to_string(),
                });
                continue;
            }

            if !seen.insert(name) {
                errors.push(TreeError::DuplicateName {
                    parent: node_path.to_string(),
                    name: name.to_string(),
                });
            }

            Self::check_children(child, &path::join(node_path, name), errors);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_tree() {
        let tree = Node::root(vec![
            Node::new("a", "1").with_child(Node::new("b", "")),
            Node::new("b", "2"),
        ]);
        assert!(TreeValidator::new().validate(&tree).is_ok());
    }

    #[test]
    fn test_duplicate_siblings_rejected() {
        let tree = Node::root(vec![
            Node::new("a", "1").with_children(vec![Node::new("x", "1"), Node::new("x", "2")]),
        ]);

        let err = TreeValidator::new().validate(&tree).expect_err("duplicate");
        match err {
            ZkTreeError::Tree(TreeError::DuplicateName { parent, name }) => {
                assert_eq!(parent, "/a");
                assert_eq!(name, "x");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_collects_all_violations() {
        let mut root = Node::root(vec![
            Node::new("", "1"),
            Node::new("a/b", "2"),
            Node::default(),
        ]);
        root.name = Some(String::from("root"));

        let errors = TreeValidator::new().check(&root);
        assert_eq!(errors.len(), 4);
        assert!(matches!(errors[0], TreeError::NamedRoot { .. }));
        assert!(matches!(errors[3], TreeError::MissingName { .. }));
    }
}
