//! Shared type definitions for Taxonode.
//!
//! The types in this crate describe biodiversity API integrations as data:
//! a [`NodeSpec`] declares the resources and operations an API exposes and
//! the ordered [`ParameterSpec`]s a user can fill in. The engine interprets
//! these declarations to build a [`RequestPlan`] per input item.

pub mod node;
pub mod parameter;
pub mod plan;
pub mod value;

pub use node::{CredentialSpec, NodeSpec, OperationSpec, ResourceOperation, ResourceSpec, ResponseProjection};
pub use parameter::{ArrayStyle, ParameterKind, ParameterOption, ParameterSpec, ParameterTarget};
pub use plan::{HttpMethod, QueryPair, RequestPlan};
pub use value::ParameterValue;

/// Field name that refers to the selected resource inside a `show` rule.
pub const RESOURCE_FIELD: &str = "resource";
/// Field name that refers to the selected operation inside a `show` rule.
pub const OPERATION_FIELD: &str = "operation";
