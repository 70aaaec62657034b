//! Local file-backed coordination client.
//!
//! This module provides a single-machine stand-in for a coordination
//! service: the whole tree lives in one JSON document that is re-read
//! before every call and rewritten atomically after every mutation.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::ClientError;
use crate::tree::Node;

use super::store::ZnodeStore;
use super::traits::{ClientResult, CoordinationClient};

/// Default store directory name.
pub const STORE_DIR: &str = ".zktree";

/// Default store file name.
pub const STORE_FILE: &str = "store.json";

/// Coordination client persisted to a local JSON file.
#[derive(Debug)]
pub struct LocalClient {
    /// Path to the store file.
    store_path: PathBuf,
    /// Serializes read-modify-write cycles within this process.
    guard: Mutex<()>,
}

impl LocalClient {
    /// Creates a client for the given store file. The file is created on
    /// the first mutation.
    #[must_use]
    pub fn new(store_path: impl Into<PathBuf>) -> Self {
        Self {
            store_path: store_path.into(),
            guard: Mutex::new(()),
        }
    }

    /// Creates a client using `<base_dir>/.zktree/store.json`.
    #[must_use]
    pub fn with_base_dir(base_dir: impl AsRef<Path>) -> Self {
        Self::new(base_dir.as_ref().join(STORE_DIR).join(STORE_FILE))
    }

    /// Path of the store file.
    #[must_use]
    pub fn store_path(&self) -> &Path {
        &self.store_path
    }

    async fn load(&self) -> ClientResult<ZnodeStore> {
        if !self.store_path.exists() {
            debug!("Store file does not exist: {}", self.store_path.display());
            return Ok(ZnodeStore::default());
        }

        let content = fs::read_to_string(&self.store_path)
            .await
            .map_err(|e| ClientError::backend(format!("Failed to read store file: {e}")))?;

        let root: Node = serde_json::from_str(&content)
            .map_err(|e| ClientError::backend(format!("Failed to parse store file: {e}")))?;

        Ok(ZnodeStore::from_tree(&root))
    }

    async fn save(&self, store: &ZnodeStore) -> ClientResult<()> {
        let missing_dir = self
            .store_path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty() && !dir.exists());
        if let Some(dir) = missing_dir {
            debug!("Creating store directory: {}", dir.display());
            fs::create_dir_all(dir)
                .await
                .map_err(|e| ClientError::backend(format!("Failed to create store directory: {e}")))?;
        }

        let content = serde_json::to_string_pretty(&store.to_tree())
            .map_err(|e| ClientError::backend(format!("Failed to serialize store: {e}")))?;

        // Write to a temporary file first, then rename for atomicity
        let temp_path = self.store_path.with_extension("tmp");

        let mut file = fs::File::create(&temp_path)
            .await
            .map_err(|e| ClientError::backend(format!("Failed to create temp store file: {e}")))?;

        file.write_all(content.as_bytes())
            .await
            .map_err(|e| ClientError::backend(format!("Failed to write store file: {e}")))?;

        file.sync_all()
            .await
            .map_err(|e| ClientError::backend(format!("Failed to sync store file: {e}")))?;

        fs::rename(&temp_path, &self.store_path)
            .await
            .map_err(|e| ClientError::backend(format!("Failed to rename store file: {e}")))?;

        Ok(())
    }

    async fn mutate<F>(&self, op: &str, path: &str, apply: F) -> ClientResult<()>
    where
        F: FnOnce(&mut ZnodeStore) -> ClientResult<()> + Send,
    {
        let _guard = self.guard.lock().await;
        let mut store = self.load().await?;
        apply(&mut store)?;
        self.save(&store).await?;
        info!("local {op} {path}");
        Ok(())
    }
}

#[async_trait]
impl CoordinationClient for LocalClient {
    async fn get_value(&self, path: &str) -> ClientResult<Vec<u8>> {
        let _guard = self.guard.lock().await;
        self.load().await?.get(path)
    }

    async fn get_children(&self, path: &str) -> ClientResult<Vec<String>> {
        let _guard = self.guard.lock().await;
        self.load().await?.children(path)
    }

    async fn create(&self, path: &str, value: &[u8]) -> ClientResult<()> {
        self.mutate("create", path, |store| store.create(path, value))
            .await
    }

    async fn delete(&self, path: &str) -> ClientResult<()> {
        self.mutate("delete", path, |store| store.delete(path)).await
    }

    async fn set_value(&self, path: &str, value: &[u8]) -> ClientResult<()> {
        self.mutate("set", path, |store| store.set(path, value))
            .await
    }

    fn backend_type(&self) -> &'static str {
        "local"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_client() -> (LocalClient, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let client = LocalClient::with_base_dir(temp_dir.path());
        (client, temp_dir)
    }

    #[tokio::test]
    async fn test_fresh_store_has_only_root() {
        let (client, _temp) = create_test_client();

        assert!(client.get_children("/").await.expect("children").is_empty());
        assert!(!client.store_path().exists());
    }

    #[tokio::test]
    async fn test_mutations_persist_across_instances() {
        let (client, temp) = create_test_client();

        client.create("/app", b"v1").await.expect("create");
        client.create("/app/db", b"postgres").await.expect("create child");
        client.set_value("/app", b"v2").await.expect("set");

        let reopened = LocalClient::with_base_dir(temp.path());
        assert_eq!(reopened.get_value("/app").await.expect("value"), b"v2".to_vec());
        assert_eq!(reopened.get_children("/app").await.expect("children"), vec!["db"]);
    }

    #[tokio::test]
    async fn test_failed_mutation_leaves_file_untouched() {
        let (client, _temp) = create_test_client();
        client.create("/a", b"").await.expect("create");
        client.create("/a/b", b"").await.expect("create");

        assert_eq!(client.delete("/a").await, Err(ClientError::NotEmpty));
        assert_eq!(client.get_children("/a").await.expect("children"), vec!["b"]);
    }
}
