//! Base-path namespacing for coordination clients.

use async_trait::async_trait;
use tracing::debug;

use crate::error::ClientError;
use crate::tree::path;

use super::traits::{ClientResult, CoordinationClient};

/// Wraps a client so every path is resolved under a fixed base path.
///
/// With base `/app`, the caller's `/` is the service's `/app` and `/a` is
/// `/app/a`. An empty base or `/` is a pass-through.
#[derive(Debug)]
pub struct NamespacedClient<C> {
    inner: C,
    base: String,
}

impl<C: CoordinationClient> NamespacedClient<C> {
    /// Creates a namespaced client. Leading and trailing separators on
    /// `base` are normalized.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidPath`] if the base has empty segments.
    pub fn new(inner: C, base: &str) -> ClientResult<Self> {
        let trimmed = base.trim_matches('/');
        let base = if trimmed.is_empty() {
            path::ROOT.to_string()
        } else {
            format!("/{trimmed}")
        };

        if !path::is_valid(&base) {
            return Err(ClientError::InvalidPath(base));
        }

        Ok(Self { inner, base })
    }

    /// The normalized base path.
    #[must_use]
    pub fn base(&self) -> &str {
        &self.base
    }

    /// The wrapped client.
    #[must_use]
    pub const fn inner(&self) -> &C {
        &self.inner
    }

    /// Returns the wrapped client.
    pub fn into_inner(self) -> C {
        self.inner
    }

    /// Resolves a caller path to the service path.
    #[must_use]
    pub fn resolve(&self, relative: &str) -> String {
        if self.base == path::ROOT {
            relative.to_string()
        } else if relative == path::ROOT {
            self.base.clone()
        } else {
            format!("{}{relative}", self.base)
        }
    }

    /// Creates every missing node along the base path.
    ///
    /// # Errors
    ///
    /// Returns the first client error other than [`ClientError::NodeExists`].
    pub async fn ensure_namespace(&self) -> ClientResult<()> {
        let mut current = String::from(path::ROOT);
        for segment in path::segments(&self.base) {
            current = path::join(&current, segment);
            match self.inner.create(&current, &[]).await {
                Ok(()) => debug!("Created namespace node {current}"),
                Err(ClientError::NodeExists) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }
}

#[async_trait]
impl<C: CoordinationClient> CoordinationClient for NamespacedClient<C> {
    async fn get_value(&self, path: &str) -> ClientResult<Vec<u8>> {
        self.inner.get_value(&self.resolve(path)).await
    }

    async fn get_children(&self, path: &str) -> ClientResult<Vec<String>> {
        self.inner.get_children(&self.resolve(path)).await
    }

    async fn create(&self, path: &str, value: &[u8]) -> ClientResult<()> {
        self.inner.create(&self.resolve(path), value).await
    }

    async fn delete(&self, path: &str) -> ClientResult<()> {
        self.inner.delete(&self.resolve(path)).await
    }

    async fn set_value(&self, path: &str, value: &[u8]) -> ClientResult<()> {
        self.inner.set_value(&self.resolve(path), value).await
    }

    async fn prepare(&self) -> ClientResult<()> {
        self.ensure_namespace().await
    }

    fn backend_type(&self) -> &'static str {
        self.inner.backend_type()
    }
}
