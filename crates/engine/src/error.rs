use taxonode_util::http::TransportError;
use thiserror::Error;

/// Failure while turning one item into a request plan. Never involves I/O.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error("missing required parameter '{0}'")]
    MissingRequiredParameter(String),

    #[error("invalid value for parameter '{key}': {reason}")]
    InvalidParameterValue { key: String, reason: String },
}

impl CompileError {
    pub fn invalid(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParameterValue {
            key: key.into(),
            reason: reason.into(),
        }
    }
}

/// Errors surfaced by [`crate::Executor`].
///
/// Item-scoped variants carry the 0-based index of the item that failed.
/// Results of earlier items are discarded.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("item {item_index}: {source}")]
    Compile {
        item_index: usize,
        #[source]
        source: CompileError,
    },

    #[error("item {item_index}: {source}")]
    Transport {
        item_index: usize,
        #[source]
        source: TransportError,
    },

    #[error("node '{node}' has no operation '{resource}:{operation}'")]
    UnknownResourceOperation {
        node: String,
        resource: String,
        operation: String,
    },

    #[error("unknown node '{0}'")]
    UnknownNode(String),

    #[error("node '{node}' requires credential '{name}' but none is configured")]
    MissingCredential { node: String, name: String },
}

impl EngineError {
    /// Index of the failing item, when the error is item-scoped.
    pub fn item_index(&self) -> Option<usize> {
        match self {
            Self::Compile { item_index, .. } | Self::Transport { item_index, .. } => Some(*item_index),
            _ => None,
        }
    }
}
