//! Coordination client trait definition.
//!
//! This module defines the primitives the reconciliation core needs from a
//! ZooKeeper-like coordination service.

use async_trait::async_trait;

use crate::error::ClientError;

/// Result of a single client primitive.
pub type ClientResult<T> = std::result::Result<T, ClientError>;

/// Path-addressed access to a coordination service.
///
/// All paths are absolute and `/`-separated. Implementations own connection
/// handling; each method is one remote call.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CoordinationClient: Send + Sync {
    /// Reads the value stored at `path`.
    async fn get_value(&self, path: &str) -> ClientResult<Vec<u8>>;

    /// Lists the names of the children of `path`.
    async fn get_children(&self, path: &str) -> ClientResult<Vec<String>>;

    /// Creates `path` with `value`. The parent must exist.
    async fn create(&self, path: &str, value: &[u8]) -> ClientResult<()>;

    /// Deletes `path`. Fails with [`ClientError::NotEmpty`] if it has children.
    async fn delete(&self, path: &str) -> ClientResult<()>;

    /// Replaces the value stored at `path`.
    async fn set_value(&self, path: &str, value: &[u8]) -> ClientResult<()>;

    /// Makes sure the client's root node exists before a write run.
    ///
    /// Plain clients address the service root, which always exists.
    async fn prepare(&self) -> ClientResult<()> {
        Ok(())
    }

    /// Gets the backend type name.
    fn backend_type(&self) -> &'static str;
}

#[async_trait]
impl CoordinationClient for Box<dyn CoordinationClient> {
    async fn get_value(&self, path: &str) -> ClientResult<Vec<u8>> {
        (**self).get_value(path).await
    }

    async fn get_children(&self, path: &str) -> ClientResult<Vec<String>> {
        (**self).get_children(path).await
    }

    async fn create(&self, path: &str, value: &[u8]) -> ClientResult<()> {
        (**self).create(path, value).await
    }

    async fn delete(&self, path: &str) -> ClientResult<()> {
        (**self).delete(path).await
    }

    async fn set_value(&self, path: &str, value: &[u8]) -> ClientResult<()> {
        (**self).set_value(path, value).await
    }

    async fn prepare(&self) -> ClientResult<()> {
        (**self).prepare().await
    }

    fn backend_type(&self) -> &'static str {
        (**self).backend_type()
    }
}
