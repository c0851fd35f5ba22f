//! Registry crate for managing node catalogs.
//!
//! This crate loads the declarative node catalogs (embedded and user
//! supplied), answers lookups by node/resource/operation and resolves which
//! parameters are active for a selection.

pub mod config;
pub mod error;
pub mod models;
pub mod visibility;

pub use config::{TaxonodeConfig, default_config_path};
pub use error::RegistryError;
pub use models::SchemaRegistry;
pub use taxonode_types::{NodeSpec, OperationSpec, ParameterSpec, ResourceOperation};
pub use visibility::{is_visible, resolve_active, resolve_nested};

/// Catalogs compiled into the binary, as `(file name, YAML source)`.
pub const EMBEDDED_CATALOGS: &[(&str, &str)] = &[
    ("gbif.yaml", include_str!("../catalogs/gbif.yaml")),
    ("taxonworks.yaml", include_str!("../catalogs/taxonworks.yaml")),
];
