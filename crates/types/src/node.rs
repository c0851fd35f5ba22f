use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{parameter::ParameterSpec, plan::HttpMethod};

/// A (resource, operation) selection, e.g. `species:get`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceOperation {
    pub resource: String,
    pub operation: String,
}

impl ResourceOperation {
    pub fn new(resource: impl Into<String>, operation: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            operation: operation.into(),
        }
    }
}

impl fmt::Display for ResourceOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.resource, self.operation)
    }
}

/// Post-processing applied to a decoded response before it is emitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ResponseProjection {
    /// Pass the body through unchanged.
    #[default]
    None,
    /// Take element 0 of an array body.
    FirstElement,
    /// Follow a JSON pointer (`/results/0/key`) into the body.
    Pointer(String),
}

impl ResponseProjection {
    /// Applies the projection. A projection that does not match the body
    /// shape yields `Value::Null`.
    pub fn apply(&self, body: Value) -> Value {
        match self {
            Self::None => body,
            Self::FirstElement => match body {
                Value::Array(mut items) if !items.is_empty() => items.swap_remove(0),
                _ => Value::Null,
            },
            Self::Pointer(pointer) => body.pointer(pointer).cloned().unwrap_or(Value::Null),
        }
    }
}

impl FromStr for ResponseProjection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" | "none" => Ok(Self::None),
            "first_element" => Ok(Self::FirstElement),
            pointer if pointer.starts_with('/') => Ok(Self::Pointer(pointer.to_string())),
            other => Err(format!(
                "invalid projection '{other}'; expected 'none', 'first_element' or a JSON pointer"
            )),
        }
    }
}

impl TryFrom<String> for ResponseProjection {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ResponseProjection> for String {
    fn from(projection: ResponseProjection) -> Self {
        match projection {
            ResponseProjection::None => "none".to_string(),
            ResponseProjection::FirstElement => "first_element".to_string(),
            ResponseProjection::Pointer(pointer) => pointer,
        }
    }
}

/// An action available on a resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationSpec {
    pub name: String,
    #[serde(default)]
    pub method: HttpMethod,
    /// Path template relative to the node base URL, e.g.
    /// `/species/{key?}/{subresource?}`.
    pub path: String,
    #[serde(default)]
    pub projection: ResponseProjection,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceSpec {
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub operations: Vec<OperationSpec>,
}

/// A credential a node injects into every request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialSpec {
    /// Query parameter name the token is sent as.
    pub name: String,
    /// Environment variable consulted by the environment credential provider.
    #[serde(default)]
    pub env: Option<String>,
    #[serde(default)]
    pub required: bool,
}

/// One API integration: resources, operations and the declared fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSpec {
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    pub base_url: String,
    #[serde(default)]
    pub credentials: Vec<CredentialSpec>,
    #[serde(default)]
    pub resources: Vec<ResourceSpec>,
    /// All declared fields in display order.
    #[serde(default)]
    pub parameters: Vec<ParameterSpec>,
}

impl NodeSpec {
    /// Looks up the operation for a selection.
    pub fn operation(&self, resource: &str, operation: &str) -> Option<&OperationSpec> {
        self.resources
            .iter()
            .find(|candidate| candidate.name == resource)?
            .operations
            .iter()
            .find(|candidate| candidate.name == operation)
    }

    /// Every valid selection of this node in declaration order.
    pub fn selections(&self) -> Vec<ResourceOperation> {
        self.resources
            .iter()
            .flat_map(|resource| {
                resource
                    .operations
                    .iter()
                    .map(|operation| ResourceOperation::new(&resource.name, &operation.name))
            })
            .collect()
    }
}
