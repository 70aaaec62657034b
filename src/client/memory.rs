//! In-memory coordination client.
//!
//! Useful for previews against a loaded tree and for tests. Mutations are
//! counted so callers can assert that a run performed no writes.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;
use tracing::trace;

use crate::tree::Node;

use super::store::ZnodeStore;
use super::traits::{ClientResult, CoordinationClient};

/// Coordination client backed by process memory.
#[derive(Debug, Default)]
pub struct MemoryClient {
    store: RwLock<ZnodeStore>,
    writes: AtomicUsize,
}

impl MemoryClient {
    /// Creates an empty client holding only the root node.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a client seeded with every node of `root`.
    #[must_use]
    pub fn from_tree(root: &Node) -> Self {
        Self {
            store: RwLock::new(ZnodeStore::from_tree(root)),
            writes: AtomicUsize::new(0),
        }
    }

    /// Returns the current contents as a tree.
    pub async fn to_tree(&self) -> Node {
        self.store.read().await.to_tree()
    }

    /// Number of nodes held, excluding the root.
    pub async fn len(&self) -> usize {
        self.store.read().await.len()
    }

    /// Returns true if only the root exists.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Number of create/delete/set calls received, successful or not.
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn record_write(&self, op: &str, path: &str) {
        trace!("memory {op} {path}");
        self.writes.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl CoordinationClient for MemoryClient {
    async fn get_value(&self, path: &str) -> ClientResult<Vec<u8>> {
        self.store.read().await.get(path)
    }

    async fn get_children(&self, path: &str) -> ClientResult<Vec<String>> {
        self.store.read().await.children(path)
    }

    async fn create(&self, path: &str, value: &[u8]) -> ClientResult<()> {
        self.record_write("create", path);
        self.store.write().await.create(path, value)
    }

    async fn delete(&self, path: &str) -> ClientResult<()> {
        self.record_write("delete", path);
        self.store.write().await.delete(path)
    }

    async fn set_value(&self, path: &str, value: &[u8]) -> ClientResult<()> {
        self.record_write("set", path);
        self.store.write().await.set(path, value)
    }

    fn backend_type(&self) -> &'static str {
        "memory"
    }
}
