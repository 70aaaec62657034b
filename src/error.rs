//! Error types for the zktree reconciliation system.
//!
//! This module provides the error hierarchy for every stage of a
//! reconciliation run: configuration, desired-tree loading, remote access to
//! the coordination service, and action execution.

use std::path::PathBuf;
use thiserror::Error;

use crate::planner::Action;

/// The main error type for the zktree system.
#[derive(Debug, Error)]
pub enum ZkTreeError {
    /// Configuration-related errors.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Desired tree is malformed or could not be loaded.
    #[error("Malformed tree: {0}")]
    Tree(#[from] TreeError),

    /// Coordination service access errors.
    #[error("Remote error: {0}")]
    Remote(#[from] RemoteError),

    /// Action execution errors.
    #[error("Execution error: {0}")]
    Execute(#[from] ExecuteError),

    /// IO errors.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file was not found.
    #[error("Configuration file not found: {path}")]
    FileNotFound {
        /// Path to the missing file.
        path: PathBuf,
    },

    /// The configuration file could not be parsed.
    #[error("Failed to parse configuration: {message}")]
    ParseError {
        /// Description of the parse error.
        message: String,
        /// Optional source location.
        location: Option<String>,
    },

    /// Validation failed.
    #[error("Configuration validation failed: {message}")]
    ValidationError {
        /// Description of the validation error.
        message: String,
        /// Field that failed validation.
        field: Option<String>,
    },
}

/// Errors raised while loading or validating a desired tree.
///
/// All of these are detected before any remote call is made.
#[derive(Debug, Clone, Error)]
pub enum TreeError {
    /// Tree file was not found.
    #[error("Tree file not found: {path}")]
    FileNotFound {
        /// Path to the missing file.
        path: PathBuf,
    },

    /// Tree document could not be parsed.
    #[error("Failed to parse tree: {message}")]
    ParseError {
        /// Description of the parse error.
        message: String,
        /// Optional source location.
        location: Option<String>,
    },

    /// Two siblings share a name.
    #[error("Duplicate node name '{name}' under {parent}")]
    DuplicateName {
        /// Path of the parent node.
        parent: String,
        /// The duplicated name.
        name: String,
    },

    /// A node name is empty or contains the path separator.
    #[error("Invalid node name '{name}' under {parent}")]
    InvalidName {
        /// Path of the parent node.
        parent: String,
        /// The offending name.
        name: String,
    },

    /// A non-root node has no name.
    #[error("Unnamed node under {parent}")]
    MissingName {
        /// Path of the parent node.
        parent: String,
    },

    /// The root node carries a name.
    #[error("Root node must not have a name (found '{name}')")]
    NamedRoot {
        /// The root's name.
        name: String,
    },
}

/// Failure reported by a coordination client primitive.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ClientError {
    /// The node does not exist.
    #[error("no node")]
    NoNode,

    /// The node already exists.
    #[error("node exists")]
    NodeExists,

    /// The node still has children.
    #[error("node not empty")]
    NotEmpty,

    /// The path is not a valid absolute path.
    #[error("invalid path: {0}")]
    InvalidPath(String),

    /// The call did not complete in time.
    #[error("timed out after {0}ms")]
    Timeout(u64),

    /// Backend-specific failure (connection, storage, serialization).
    #[error("{0}")]
    Backend(String),
}

/// Coordination service access errors, enriched with the affected path.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// Reading a value or listing children failed.
    #[error("Failed to read {path}: {cause}")]
    ReadFailure {
        /// Path whose read failed.
        path: String,
        /// Underlying client error.
        cause: ClientError,
    },

    /// Creating, deleting or setting a node failed.
    #[error("Failed to write {path}: {cause}")]
    WriteFailure {
        /// Path whose write failed.
        path: String,
        /// Underlying client error.
        cause: ClientError,
    },
}

/// Errors that abort an execution run.
///
/// Every variant carries the actions applied before the abort so the
/// operator knows which prefix of the plan reached the live tree.
#[derive(Debug, Error)]
pub enum ExecuteError {
    /// A remote mutation failed.
    #[error("{failed} failed after {} applied action(s): {source}", .applied.len())]
    ActionFailed {
        /// Actions applied before the failure.
        applied: Vec<Action>,
        /// The action whose mutation failed.
        failed: Box<Action>,
        /// Remote cause.
        source: RemoteError,
    },

    /// The handler could not obtain input or write output.
    #[error("Handler failed on {key}: {message}")]
    InputFailed {
        /// Key of the action being handled.
        key: String,
        /// Description of the failure.
        message: String,
        /// Actions applied before the failure.
        applied: Vec<Action>,
    },
}

/// Result type alias for zktree operations.
pub type Result<T> = std::result::Result<T, ZkTreeError>;

impl ZkTreeError {
    /// Creates a new internal error with the given message.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Returns the actions applied before the run aborted, if this error
    /// came from the executor.
    #[must_use]
    pub fn applied_actions(&self) -> Option<&[Action]> {
        match self {
            Self::Execute(
                ExecuteError::ActionFailed { applied, .. }
                | ExecuteError::InputFailed { applied, .. },
            ) => Some(applied),
            _ => None,
        }
    }
}

impl ConfigError {
    /// Creates a validation error for a specific field.
    #[must_use]
    pub fn validation(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
            field: Some(field.into()),
        }
    }
}

impl ClientError {
    /// Creates a backend error with the given message.
    #[must_use]
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend(message.into())
    }

    /// Returns true if retrying the call may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout(_) | Self::Backend(_))
    }
}

impl RemoteError {
    /// Path the failure relates to.
    #[must_use]
    pub fn path(&self) -> &str {
        match self {
            Self::ReadFailure { path, .. } | Self::WriteFailure { path, .. } => path,
        }
    }

    /// Underlying client error.
    #[must_use]
    pub const fn cause(&self) -> &ClientError {
        match self {
            Self::ReadFailure { cause, .. } | Self::WriteFailure { cause, .. } => cause,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_client_errors() {
        assert!(ClientError::Timeout(100).is_retryable());
        assert!(ClientError::backend("connection reset").is_retryable());
        assert!(!ClientError::NoNode.is_retryable());
        assert!(!ClientError::NotEmpty.is_retryable());
    }

    #[test]
    fn test_remote_error_carries_path() {
        let err = RemoteError::ReadFailure {
            path: String::from("/a/b"),
            cause: ClientError::NoNode,
        };
        assert_eq!(err.path(), "/a/b");
        assert_eq!(err.cause(), &ClientError::NoNode);
        assert_eq!(err.to_string(), "Failed to read /a/b: no node");
    }

    #[test]
    fn test_action_failed_exposes_applied_prefix() {
        let err = ZkTreeError::from(ExecuteError::ActionFailed {
            applied: vec![Action::create("/a", "1")],
            failed: Box::new(Action::create("/a/b", "2")),
            source: RemoteError::WriteFailure {
                path: String::from("/a/b"),
                cause: ClientError::backend("disk full"),
            },
        });

        let applied = err.applied_actions().expect("executor error");
        assert_eq!(applied.len(), 1);
        assert_eq!(applied[0].key(), "/a");
        assert!(err.to_string().contains("after 1 applied action(s)"));
    }
}
