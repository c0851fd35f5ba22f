//! Credential lookup for nodes that authenticate with query tokens.
//!
//! Tokens are resolved once per invocation and applied to every plan as
//! static injections.

use std::env;

use indexmap::IndexMap;
use taxonode_types::{CredentialSpec, NodeSpec};
use tracing::debug;

use crate::EngineError;

/// Supplies the credential values a node declares.
pub trait CredentialProvider: Send + Sync {
    /// Returns `query name -> token` for every credential that is available.
    ///
    /// # Errors
    /// [`EngineError::MissingCredential`] when a required credential has no
    /// value.
    fn tokens_for(&self, node: &NodeSpec) -> Result<IndexMap<String, String>, EngineError>;
}

/// Reads each credential from the environment variable named in the node
/// catalog. Blank variables count as unset.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvCredentialProvider;

impl CredentialProvider for EnvCredentialProvider {
    fn tokens_for(&self, node: &NodeSpec) -> Result<IndexMap<String, String>, EngineError> {
        collect_tokens(node, |credential| {
            credential
                .env
                .as_deref()
                .and_then(|var| env::var(var).ok())
                .filter(|value| !value.trim().is_empty())
        })
    }
}

/// Fixed tokens keyed by node name, for tests and embedding hosts that
/// manage secrets themselves.
#[derive(Debug, Clone, Default)]
pub struct StaticCredentials {
    tokens: IndexMap<String, IndexMap<String, String>>,
}

impl StaticCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(mut self, node: impl Into<String>, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.tokens
            .entry(node.into())
            .or_default()
            .insert(name.into(), value.into());
        self
    }
}

impl CredentialProvider for StaticCredentials {
    fn tokens_for(&self, node: &NodeSpec) -> Result<IndexMap<String, String>, EngineError> {
        let configured = self.tokens.get(&node.name);
        collect_tokens(node, |credential| {
            configured.and_then(|tokens| tokens.get(&credential.name)).cloned()
        })
    }
}

fn collect_tokens(
    node: &NodeSpec,
    lookup: impl Fn(&CredentialSpec) -> Option<String>,
) -> Result<IndexMap<String, String>, EngineError> {
    let mut tokens = IndexMap::new();
    for credential in &node.credentials {
        match lookup(credential) {
            Some(value) => {
                tokens.insert(credential.name.clone(), value);
            }
            None if credential.required => {
                return Err(EngineError::MissingCredential {
                    node: node.name.clone(),
                    name: credential.name.clone(),
                });
            }
            None => debug!(node = %node.name, credential = %credential.name, "optional credential not set"),
        }
    }
    Ok(tokens)
}
