//! Diff engine for comparing desired vs live trees.
//!
//! Children are matched by name. The emitted order respects the
//! coordination service's structural rules: a node is created only after
//! its parent, and deleted only after all of its descendants.

use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

use crate::tree::{path, Node, TreeHasher};

use super::plan::{Action, ReconcilePlan};

/// Engine for computing the edit from a live tree to a desired tree.
#[derive(Debug, Default)]
pub struct DiffEngine {
    /// Tree hasher.
    hasher: TreeHasher,
}

impl DiffEngine {
    /// Creates a new diff engine.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            hasher: TreeHasher::new(),
        }
    }

    /// Computes the ordered action sequence turning `live` into `desired`.
    ///
    /// Both trees are rooted at `/`. Root values are not compared.
    #[must_use]
    pub fn diff(&self, desired: &Node, live: &Node) -> Vec<Action> {
        let mut actions = Vec::new();

        if desired.is_ignored() {
            debug!("Root is ignored, nothing to compare");
            return actions;
        }

        Self::diff_children(desired, live, path::ROOT, &mut actions);
        actions
    }

    /// Computes the diff and wraps it in a plan with both fingerprints.
    #[must_use]
    pub fn plan(&self, desired: &Node, live: &Node) -> ReconcilePlan {
        let plan = ReconcilePlan::new(
            self.diff(desired, live),
            &self.hasher.hash_tree(desired),
            &self.hasher.hash_tree(live),
        );

        info!(
            "Diff: {} creates, {} value updates, {} deletes",
            plan.create_count(),
            plan.update_count(),
            plan.delete_count()
        );
        plan
    }

    /// Compares a pair of nodes present on both sides.
    fn diff_pair(desired: &Node, live: &Node, node_path: &str, actions: &mut Vec<Action>) {
        if desired.is_ignored() {
            debug!("Skipping ignored subtree {node_path}");
            return;
        }

        if desired.value != live.value {
            debug!("Value of {node_path} differs");
            actions.push(Action::set_value(node_path, &desired.value, &live.value));
        }

        Self::diff_children(desired, live, node_path, actions);
    }

    fn diff_children(desired: &Node, live: &Node, node_path: &str, actions: &mut Vec<Action>) {
        let desired_names: HashSet<&str> = desired.children.iter().map(Node::name).collect();
        let live_by_name: HashMap<&str, &Node> =
            live.children.iter().map(|c| (c.name(), c)).collect();

        // Deletions first, in live order
        for live_child in &live.children {
            if !desired_names.contains(live_child.name()) {
                let child_path = path::join(node_path, live_child.name());
                debug!("Node {child_path} is not desired");
                Self::delete_subtree(live_child, &child_path, actions);
            }
        }

        for desired_child in &desired.children {
            let child_path = path::join(node_path, desired_child.name());
            match live_by_name.get(desired_child.name()) {
                Some(live_child) => Self::diff_pair(desired_child, live_child, &child_path, actions),
                None => Self::create_subtree(desired_child, &child_path, actions),
            }
        }
    }

    /// Emits CREATE actions parent-before-child.
    fn create_subtree(node: &Node, node_path: &str, actions: &mut Vec<Action>) {
        if node.is_ignored() {
            debug!("Not creating ignored subtree {node_path}");
            return;
        }

        actions.push(Action::create(node_path, &node.value));
        for child in &node.children {
            Self::create_subtree(child, &path::join(node_path, child.name()), actions);
        }
    }

    /// Emits DELETE actions child-before-parent.
    fn delete_subtree(node: &Node, node_path: &str, actions: &mut Vec<Action>) {
        for child in &node.children {
            Self::delete_subtree(child, &path::join(node_path, child.name()), actions);
        }
        actions.push(Action::delete(node_path));
    }
}
