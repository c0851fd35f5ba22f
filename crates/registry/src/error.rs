use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading configuration or node catalogs.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("could not read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not parse {origin}: {source}")]
    Parse {
        origin: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("could not parse config {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("node '{0}' is declared more than once")]
    DuplicateNode(String),

    #[error("node '{node}' is invalid: {reason}")]
    InvalidNode { node: String, reason: String },
}

impl RegistryError {
    pub fn invalid_node(node: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidNode {
            node: node.into(),
            reason: reason.into(),
        }
    }
}
