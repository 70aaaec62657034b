//! Settings parser for loading `zktree.yaml`.
//!
//! Settings come from, in increasing precedence: built-in defaults, the
//! YAML file, then `ZKTREE_*` environment variables. Command-line flags are
//! applied on top by the binary.

use crate::error::{ConfigError, Result, ZkTreeError};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::settings::{Settings, StoreBackend};

/// Environment variable overriding the store file path.
pub const ENV_STORE: &str = "ZKTREE_STORE";

/// Environment variable overriding the store backend.
pub const ENV_BACKEND: &str = "ZKTREE_BACKEND";

/// Environment variable overriding the namespace.
pub const ENV_NAMESPACE: &str = "ZKTREE_NAMESPACE";

/// Default settings file names to search for.
pub const DEFAULT_CONFIG_FILES: &[&str] = &["zktree.yaml", "zktree.yml"];

/// Parser for loading settings.
#[derive(Debug, Default)]
pub struct SettingsParser {
    /// Directory holding the `.env` file.
    base_path: Option<PathBuf>,
}

impl SettingsParser {
    /// Creates a new settings parser.
    #[must_use]
    pub const fn new() -> Self {
        Self { base_path: None }
    }

    /// Sets the directory the `.env` file is looked up in.
    #[must_use]
    pub fn with_base_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.base_path = Some(path.into());
        self
    }

    /// Loads settings from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file does not exist or cannot be parsed.
    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<Settings> {
        let path = path.as_ref();
        info!("Loading settings from: {}", path.display());

        if !path.exists() {
            return Err(ZkTreeError::Config(ConfigError::FileNotFound {
                path: path.to_path_buf(),
            }));
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            ZkTreeError::Config(ConfigError::ParseError {
                message: format!("Failed to read file: {e}"),
                location: Some(path.display().to_string()),
            })
        })?;

        self.parse_yaml(&content, Some(path))
    }

    /// Parses settings from a YAML string. An empty document yields the
    /// defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is invalid or has unknown keys.
    pub fn parse_yaml(&self, content: &str, source: Option<&Path>) -> Result<Settings> {
        if content.trim().is_empty() {
            debug!("Empty settings document, using defaults");
            return Ok(Settings::default());
        }

        serde_yaml::from_str(content).map_err(|e| {
            ZkTreeError::Config(ConfigError::ParseError {
                message: format!("YAML parse error: {e}"),
                location: source.map(|p| p.display().to_string()),
            })
        })
    }

    /// Resolves the effective settings.
    ///
    /// An explicit `path` must exist. Without one, `zktree.yaml` is searched
    /// upward from `start_dir`, and defaults apply if nothing is found.
    /// Environment overrides are applied last.
    ///
    /// # Errors
    ///
    /// Returns an error if a found or given file cannot be parsed, or an
    /// environment override is invalid.
    pub fn resolve(&self, path: Option<&Path>, start_dir: impl AsRef<Path>) -> Result<Settings> {
        let mut settings = match path {
            Some(path) => self.load_file(path)?,
            None => match find_config_file(start_dir) {
                Ok(found) => self.load_file(found)?,
                Err(_) => {
                    debug!("No settings file found, using defaults");
                    Settings::default()
                }
            },
        };

        Self::apply_env_overrides(&mut settings)?;
        Ok(settings)
    }

    /// Applies `ZKTREE_*` environment overrides.
    fn apply_env_overrides(settings: &mut Settings) -> Result<()> {
        if let Ok(store) = std::env::var(ENV_STORE) {
            debug!("Overriding store.path from environment");
            settings.store.path = PathBuf::from(store);
        }

        if let Ok(backend) = std::env::var(ENV_BACKEND) {
            debug!("Overriding store.backend from environment");
            settings.store.backend = parse_backend(&backend)?;
        }

        if let Ok(namespace) = std::env::var(ENV_NAMESPACE) {
            debug!("Overriding store.namespace from environment");
            settings.store.namespace = Some(namespace);
        }

        Ok(())
    }

    /// Loads the `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns an error if the `.env` file exists but cannot be loaded.
    pub fn load_dotenv(&self) -> Result<()> {
        let env_path = self
            .base_path
            .as_ref()
            .map_or_else(|| PathBuf::from(".env"), |p| p.join(".env"));

        if env_path.exists() {
            info!("Loading environment from: {}", env_path.display());
            dotenvy::from_path(&env_path).map_err(|e| {
                ZkTreeError::Config(ConfigError::ParseError {
                    message: format!("Failed to load .env file: {e}"),
                    location: Some(env_path.display().to_string()),
                })
            })?;
        } else {
            debug!(".env file not found at: {}", env_path.display());
        }

        Ok(())
    }
}

fn parse_backend(value: &str) -> Result<StoreBackend> {
    match value.trim().to_ascii_lowercase().as_str() {
        "local" => Ok(StoreBackend::Local),
        "memory" => Ok(StoreBackend::Memory),
        other => Err(ZkTreeError::Config(ConfigError::validation(
            format!("Unknown store backend '{other}' in {ENV_BACKEND}"),
            "store.backend",
        ))),
    }
}

/// Finds the settings file in the given directory or its ancestors.
///
/// # Errors
///
/// Returns an error if no settings file is found.
pub fn find_config_file(start_dir: impl AsRef<Path>) -> Result<PathBuf> {
    let start = start_dir.as_ref();
    let mut current = start.to_path_buf();

    loop {
        for filename in DEFAULT_CONFIG_FILES {
            let config_path = current.join(filename);
            if config_path.exists() {
                info!("Found settings file: {}", config_path.display());
                return Ok(config_path);
            }
        }

        if !current.pop() {
            break;
        }
    }

    Err(ZkTreeError::Config(ConfigError::FileNotFound {
        path: start.join(DEFAULT_CONFIG_FILES[0]),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreBackend;
    use tempfile::TempDir;

    #[test]
    fn test_parse_full_settings() {
        let yaml = r"
store:
  backend: memory
  path: /tmp/tree.json
  namespace: /app
retry:
  max_retries: 1
  delay_ms: 10
  timeout_secs: 2
";
        let settings = SettingsParser::new().parse_yaml(yaml, None).expect("parse");
        assert_eq!(settings.store.backend, StoreBackend::Memory);
        assert_eq!(settings.store.namespace.as_deref(), Some("/app"));
        assert_eq!(settings.retry.delay_ms, 10);
    }

    #[test]
    fn test_empty_document_is_default() {
        let settings = SettingsParser::new().parse_yaml("  \n", None).expect("parse");
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_invalid_yaml_reports_location() {
        let err = SettingsParser::new()
            .parse_yaml("store: [", Some(Path::new("zktree.yaml")))
            .expect_err("invalid");
        assert!(matches!(
            err,
            ZkTreeError::Config(ConfigError::ParseError { location: Some(ref l), .. }) if l == "zktree.yaml"
        ));
    }

    #[test]
    fn test_find_config_file_walks_upward() {
        let dir = TempDir::new().expect("tempdir");
        std::fs::write(dir.path().join("zktree.yml"), "store:\n  backend: memory\n").expect("write");
        let nested = dir.path().join("a").join("b");
        std::fs::create_dir_all(&nested).expect("mkdir");

        let found = find_config_file(&nested).expect("found");
        assert_eq!(found, dir.path().join("zktree.yml"));
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let dir = TempDir::new().expect("tempdir");
        let err = SettingsParser::new()
            .load_file(dir.path().join("nope.yaml"))
            .expect_err("missing");
        assert!(matches!(err, ZkTreeError::Config(ConfigError::FileNotFound { .. })));
    }

    #[test]
    fn test_parse_backend() {
        assert_eq!(parse_backend("Memory").expect("memory"), StoreBackend::Memory);
        assert!(parse_backend("zookeeper").is_err());
    }
}
