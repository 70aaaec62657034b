//! Tree fingerprinting for change detection.
//!
//! Fingerprints are order-independent across siblings, matching the
//! by-name comparison the diff engine performs.

use sha2::{Digest, Sha256};

use super::node::Node;

/// Hasher for computing tree fingerprints.
#[derive(Debug, Default)]
pub struct TreeHasher;

impl TreeHasher {
    /// Creates a new tree hasher.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Computes a hex-encoded SHA-256 fingerprint of a tree.
    #[must_use]
    pub fn hash_tree(&self, node: &Node) -> String {
        hex::encode(self.digest(node))
    }

    fn digest(&self, node: &Node) -> Vec<u8> {
        let mut hasher = Sha256::new();

        // Length prefixes keep ("ab","c") distinct from ("a","bc").
        let name = node.name();
        hasher.update((name.len() as u64).to_be_bytes());
        hasher.update(name.as_bytes());
        hasher.update((node.value.len() as u64).to_be_bytes());
        hasher.update(node.value.as_bytes());
        hasher.update([match node.ignore {
            None => 0u8,
            Some(false) => 1,
            Some(true) => 2,
        }]);

        let mut children: Vec<&Node> = node.children.iter().collect();
        children.sort_by(|a, b| a.name().cmp(b.name()));
        for child in children {
            hasher.update(self.digest(child));
        }

        hasher.finalize().to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_ignores_sibling_order() {
        let hasher = TreeHasher::new();
        let a = Node::root(vec![Node::new("x", "1"), Node::new("y", "2")]);
        let b = Node::root(vec![Node::new("y", "2"), Node::new("x", "1")]);
        assert_eq!(hasher.hash_tree(&a), hasher.hash_tree(&b));
    }

    #[test]
    fn test_hash_detects_value_change() {
        let hasher = TreeHasher::new();
        let a = Node::root(vec![Node::new("x", "1")]);
        let b = Node::root(vec![Node::new("x", "2")]);
        assert_ne!(hasher.hash_tree(&a), hasher.hash_tree(&b));
        assert_eq!(hasher.hash_tree(&a).len(), 64);
    }
}
