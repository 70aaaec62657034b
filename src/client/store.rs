//! Znode table shared by the in-process client backends.

use std::collections::BTreeMap;

use crate::error::ClientError;
use crate::tree::{path, Node};

use super::traits::ClientResult;

/// Flat path → value table with coordination-service semantics.
///
/// The root always exists, a node can only be created under an existing
/// parent, and a node with children cannot be deleted.
#[derive(Debug, Clone)]
pub(crate) struct ZnodeStore {
    nodes: BTreeMap<String, Vec<u8>>,
}

impl Default for ZnodeStore {
    fn default() -> Self {
        let mut nodes = BTreeMap::new();
        nodes.insert(path::ROOT.to_string(), Vec::new());
        Self { nodes }
    }
}

impl ZnodeStore {
    /// Builds a store holding every node of `root`. Ignore flags are dropped.
    pub(crate) fn from_tree(root: &Node) -> Self {
        let mut store = Self::default();
        store
            .nodes
            .insert(path::ROOT.to_string(), root.value.as_bytes().to_vec());
        store.insert_children(root, path::ROOT);
        store
    }

    fn insert_children(&mut self, node: &Node, node_path: &str) {
        for child in &node.children {
            let child_path = path::join(node_path, child.name());
            self.nodes
                .insert(child_path.clone(), child.value.as_bytes().to_vec());
            self.insert_children(child, &child_path);
        }
    }

    /// Materializes the store as a tree with children in name order.
    pub(crate) fn to_tree(&self) -> Node {
        let mut root = self.build(path::ROOT);
        root.name = None;
        root
    }

    fn build(&self, node_path: &str) -> Node {
        let value = self
            .nodes
            .get(node_path)
            .map(|v| String::from_utf8_lossy(v).into_owned())
            .unwrap_or_default();
        let children = self
            .child_names(node_path)
            .into_iter()
            .map(|name| self.build(&path::join(node_path, &name)))
            .collect();

        Node::new(path::base_name(node_path), value).with_children(children)
    }

    /// Number of nodes, excluding the root.
    pub(crate) fn len(&self) -> usize {
        self.nodes.len() - 1
    }

    pub(crate) fn get(&self, node_path: &str) -> ClientResult<Vec<u8>> {
        check_path(node_path)?;
        self.nodes.get(node_path).cloned().ok_or(ClientError::NoNode)
    }

    pub(crate) fn children(&self, node_path: &str) -> ClientResult<Vec<String>> {
        check_path(node_path)?;
        if !self.nodes.contains_key(node_path) {
            return Err(ClientError::NoNode);
        }
        Ok(self.child_names(node_path))
    }

    pub(crate) fn create(&mut self, node_path: &str, value: &[u8]) -> ClientResult<()> {
        check_path(node_path)?;
        if self.nodes.contains_key(node_path) {
            return Err(ClientError::NodeExists);
        }
        let parent = path::parent(node_path).ok_or(ClientError::NodeExists)?;
        if !self.nodes.contains_key(parent) {
            return Err(ClientError::NoNode);
        }
        self.nodes.insert(node_path.to_string(), value.to_vec());
        Ok(())
    }

    pub(crate) fn delete(&mut self, node_path: &str) -> ClientResult<()> {
        check_path(node_path)?;
        if node_path == path::ROOT {
            return Err(ClientError::InvalidPath(String::from("cannot delete the root")));
        }
        if !self.nodes.contains_key(node_path) {
            return Err(ClientError::NoNode);
        }
        if !self.child_names(node_path).is_empty() {
            return Err(ClientError::NotEmpty);
        }
        self.nodes.remove(node_path);
        Ok(())
    }

    pub(crate) fn set(&mut self, node_path: &str, value: &[u8]) -> ClientResult<()> {
        check_path(node_path)?;
        let slot = self.nodes.get_mut(node_path).ok_or(ClientError::NoNode)?;
        *slot = value.to_vec();
        Ok(())
    }

    fn child_names(&self, node_path: &str) -> Vec<String> {
        let prefix = if node_path == path::ROOT {
            String::from("/")
        } else {
            format!("{node_path}/")
        };

        self.nodes
            .range(prefix.clone()..)
            .map(|(key, _)| key)
            .take_while(|key| key.starts_with(&prefix))
            .filter_map(|key| {
                let rest = &key[prefix.len()..];
                (!rest.is_empty() && !rest.contains('/')).then(|| rest.to_string())
            })
            .collect()
    }
}

fn check_path(node_path: &str) -> ClientResult<()> {
    if path::is_valid(node_path) {
        Ok(())
    } else {
        Err(ClientError::InvalidPath(node_path.to_string()))
    }
}
