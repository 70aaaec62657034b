//! Loading and writing serialized trees.
//!
//! Trees are stored as nested documents whose nodes carry `name`, `value`,
//! an optional `ignore` flag and `children`. YAML is the default format;
//! files ending in `.json` are read and written as JSON.

use std::path::Path;
use tracing::{debug, info};

use crate::error::{Result, TreeError, ZkTreeError};

use super::node::Node;

/// Serialization format of a tree document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TreeFormat {
    /// YAML document.
    #[default]
    Yaml,
    /// JSON document.
    Json,
}

impl TreeFormat {
    /// Picks a format from a file extension.
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Yaml,
        }
    }
}

/// Parser for desired-tree documents.
#[derive(Debug, Default)]
pub struct TreeParser;

impl TreeParser {
    /// Creates a new tree parser.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Loads a tree from a file, choosing the format by extension.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<Node> {
        let path = path.as_ref();
        info!("Loading tree from: {}", path.display());

        if !path.exists() {
            return Err(ZkTreeError::Tree(TreeError::FileNotFound {
                path: path.to_path_buf(),
            }));
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            ZkTreeError::Tree(TreeError::ParseError {
                message: format!("Failed to read file: {e}"),
                location: Some(path.display().to_string()),
            })
        })?;

        match TreeFormat::from_path(path) {
            TreeFormat::Yaml => self.parse_yaml(&content, Some(path)),
            TreeFormat::Json => self.parse_json(&content, Some(path)),
        }
    }

    /// Parses a tree from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is invalid.
    pub fn parse_yaml(&self, content: &str, source: Option<&Path>) -> Result<Node> {
        debug!("Parsing YAML tree");

        let root: Node = serde_yaml::from_str(content).map_err(|e| {
            ZkTreeError::Tree(TreeError::ParseError {
                message: format!("YAML parse error: {e}"),
                location: source.map(|p| p.display().to_string()),
            })
        })?;

        debug!("Parsed tree with {} nodes", root.node_count());
        Ok(root)
    }

    /// Parses a tree from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is invalid.
    pub fn parse_json(&self, content: &str, source: Option<&Path>) -> Result<Node> {
        debug!("Parsing JSON tree");

        let root: Node = serde_json::from_str(content).map_err(|e| {
            ZkTreeError::Tree(TreeError::ParseError {
                message: format!("JSON parse error: {e}"),
                location: source.map(|p| p.display().to_string()),
            })
        })?;

        debug!("Parsed tree with {} nodes", root.node_count());
        Ok(root)
    }

    /// Serializes a tree in the given format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn serialize(&self, root: &Node, format: TreeFormat) -> Result<String> {
        match format {
            TreeFormat::Yaml => serde_yaml::to_string(root)
                .map_err(|e| ZkTreeError::internal(format!("Failed to serialize tree: {e}"))),
            TreeFormat::Json => serde_json::to_string_pretty(root)
                .map_err(|e| ZkTreeError::internal(format!("Failed to serialize tree: {e}"))),
        }
    }
}
