//! Live tree accessor.
//!
//! This module reads the current state of the coordination service into a
//! [`Node`] snapshot and exposes the mutation primitives the executor
//! replays actions through. Every failure is tagged with the path it
//! happened at.

use futures_util::future::{try_join_all, BoxFuture, FutureExt};
use tracing::{debug, warn};

use crate::client::CoordinationClient;
use crate::error::{RemoteError, Result, ZkTreeError};
use crate::tree::{path, Node};

/// Read/write access to the live tree held by a coordination client.
#[derive(Debug)]
pub struct LiveTree<C> {
    client: C,
}

impl<C: CoordinationClient> LiveTree<C> {
    /// Creates an accessor over the given client.
    #[must_use]
    pub const fn new(client: C) -> Self {
        Self { client }
    }

    /// The underlying client.
    #[must_use]
    pub const fn client(&self) -> &C {
        &self.client
    }

    /// Returns the underlying client.
    pub fn into_inner(self) -> C {
        self.client
    }

    /// Fetches the whole tree as an unnamed root node.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::ReadFailure`] naming the first path whose value
    /// or children could not be read.
    pub async fn fetch_root(&self) -> Result<Node> {
        let mut root = self.fetch_subtree(path::ROOT).await?;
        root.name = None;
        Ok(root)
    }

    /// Fetches the subtree rooted at `node_path`.
    ///
    /// Sibling subtrees are fetched concurrently; children keep the order
    /// the service listed them in. A failure anywhere aborts the fetch.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::ReadFailure`] naming the failing path.
    pub async fn fetch_subtree(&self, node_path: &str) -> Result<Node> {
        debug!("Fetching live subtree at {node_path}");
        let node = self
            .fetch_node(node_path.to_string())
            .await
            .map_err(ZkTreeError::Remote)?;
        debug!("Fetched {} live nodes under {node_path}", node.node_count());
        Ok(node)
    }

    fn fetch_node(&self, node_path: String) -> BoxFuture<'_, std::result::Result<Node, RemoteError>> {
        async move {
            let data = self
                .client
                .get_value(&node_path)
                .await
                .map_err(|cause| RemoteError::ReadFailure {
                    path: node_path.clone(),
                    cause,
                })?;

            let names = self
                .client
                .get_children(&node_path)
                .await
                .map_err(|cause| RemoteError::ReadFailure {
                    path: node_path.clone(),
                    cause,
                })?;

            let children = try_join_all(
                names
                    .iter()
                    .map(|name| self.fetch_node(path::join(&node_path, name))),
            )
            .await?;

            let name = (node_path != path::ROOT).then(|| path::base_name(&node_path).to_string());

            Ok(Node {
                name,
                value: decode_value(&node_path, data),
                ignore: None,
                children,
            })
        }
        .boxed()
    }

    /// Creates any missing nodes the client's root depends on.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::WriteFailure`] if the service rejects the call.
    pub async fn prepare(&self) -> std::result::Result<(), RemoteError> {
        self.client
            .prepare()
            .await
            .map_err(|cause| RemoteError::WriteFailure {
                path: path::ROOT.to_string(),
                cause,
            })
    }

    /// Creates `node_path` with `value`.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::WriteFailure`] if the service rejects the call.
    pub async fn create(&self, node_path: &str, value: &str) -> std::result::Result<(), RemoteError> {
        self.client
            .create(node_path, value.as_bytes())
            .await
            .map_err(|cause| RemoteError::WriteFailure {
                path: node_path.to_string(),
                cause,
            })
    }

    /// Deletes `node_path`, which must have no children.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::WriteFailure`] if the service rejects the call.
    pub async fn delete(&self, node_path: &str) -> std::result::Result<(), RemoteError> {
        self.client
            .delete(node_path)
            .await
            .map_err(|cause| RemoteError::WriteFailure {
                path: node_path.to_string(),
                cause,
            })
    }

    /// Replaces the value of `node_path`.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::WriteFailure`] if the service rejects the call.
    pub async fn set_value(&self, node_path: &str, value: &str) -> std::result::Result<(), RemoteError> {
        self.client
            .set_value(node_path, value.as_bytes())
            .await
            .map_err(|cause| RemoteError::WriteFailure {
                path: node_path.to_string(),
                cause,
            })
    }
}

fn decode_value(node_path: &str, data: Vec<u8>) -> String {
    String::from_utf8(data).unwrap_or_else(|e| {
        warn!("Value at {node_path} is not valid UTF-8; decoding lossily");
        String::from_utf8_lossy(e.as_bytes()).into_owned()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{MemoryClient, MockCoordinationClient};
    use crate::error::ClientError;

    #[tokio::test]
    async fn test_fetch_root_snapshot() {
        let tree = Node::root(vec![
            Node::new("a", "1").with_child(Node::new("b", "2")),
            Node::new("c", ""),
        ]);
        let live = LiveTree::new(MemoryClient::from_tree(&tree));

        assert_eq!(live.fetch_root().await.expect("fetch"), tree);

        let sub = live.fetch_subtree("/a").await.expect("fetch subtree");
        assert_eq!(sub.name.as_deref(), Some("a"));
        assert_eq!(sub.children.len(), 1);
    }

    #[tokio::test]
    async fn test_descendant_failure_names_path() {
        let mut mock = MockCoordinationClient::new();
        mock.expect_get_value().returning(|p| {
            if p == "/a/b" {
                Err(ClientError::backend("session expired"))
            } else {
                Ok(Vec::new())
            }
        });
        mock.expect_get_children().returning(|p| match p {
            "/" => Ok(vec![String::from("a")]),
            "/a" => Ok(vec![String::from("b")]),
            _ => Ok(Vec::new()),
        });

        let live = LiveTree::new(mock);
        let err = live.fetch_root().await.expect_err("fetch must fail");

        match err {
            ZkTreeError::Remote(RemoteError::ReadFailure { path, cause }) => {
                assert_eq!(path, "/a/b");
                assert_eq!(cause, ClientError::backend("session expired"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_write_failure_carries_path() {
        let live = LiveTree::new(MemoryClient::new());

        let err = live.create("/a/b", "x").await.expect_err("parent missing");
        assert_eq!(err.path(), "/a/b");
        assert_eq!(err.cause(), &ClientError::NoNode);

        live.create("/a", "1").await.expect("create");
        live.set_value("/a", "2").await.expect("set");
        assert_eq!(live.client().get_value("/a").await.expect("value"), b"2".to_vec());
        live.delete("/a").await.expect("delete");
    }

    #[tokio::test]
    async fn test_invalid_utf8_is_decoded_lossily() {
        let client = MemoryClient::new();
        client.create("/bin", &[0x66, 0xff, 0x6f]).await.expect("create");

        let root = LiveTree::new(client).fetch_root().await.expect("fetch");
        assert_eq!(root.find("/bin").map(|n| n.value.as_str()), Some("f\u{fffd}o"));
    }
}
