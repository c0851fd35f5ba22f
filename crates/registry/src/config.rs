use std::{env, io::ErrorKind, path::PathBuf};

use dirs_next::config_dir;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use taxonode_util::expand_tilde;
use tracing::debug;

use crate::RegistryError;

/// Environment variable that overrides the config file location.
pub const CONFIG_PATH_ENV_VAR: &str = "TAXONODE_CONFIG_PATH";

fn default_timeout_secs() -> u64 {
    30
}

fn default_concurrency() -> usize {
    1
}

/// User configuration, stored as JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxonodeConfig {
    /// Extra catalog files (YAML or JSON), loaded after the embedded ones.
    #[serde(default)]
    pub catalogs: Vec<String>,
    /// Base URL overrides keyed by node name.
    #[serde(default)]
    pub base_urls: IndexMap<String, String>,
    /// Per-request timeout for the HTTP transport.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Maximum number of requests in flight; `1` runs items sequentially.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

impl Default for TaxonodeConfig {
    fn default() -> Self {
        Self {
            catalogs: Vec::new(),
            base_urls: IndexMap::new(),
            timeout_secs: default_timeout_secs(),
            concurrency: default_concurrency(),
        }
    }
}

impl TaxonodeConfig {
    /// Loads the config from [`default_config_path`].
    ///
    /// A missing file yields the defaults; an unreadable or malformed file is
    /// an error.
    pub fn load() -> Result<Self, RegistryError> {
        Self::load_from(default_config_path())
    }

    pub fn load_from(path: PathBuf) -> Result<Self, RegistryError> {
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(error) if error.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "no config file; using defaults");
                return Ok(Self::default());
            }
            Err(source) => return Err(RegistryError::Io { path, source }),
        };
        serde_json::from_str(&content).map_err(|source| RegistryError::Config { path, source })
    }

    /// Catalog paths with `~` expanded.
    pub fn catalog_paths(&self) -> Vec<PathBuf> {
        self.catalogs.iter().map(|path| expand_tilde(path)).collect()
    }
}

/// Get the default path for the configuration file.
pub fn default_config_path() -> PathBuf {
    if let Ok(path) = env::var(CONFIG_PATH_ENV_VAR)
        && !path.trim().is_empty()
    {
        return expand_tilde(&path);
    }

    config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("taxonode")
        .join("config.json")
}
