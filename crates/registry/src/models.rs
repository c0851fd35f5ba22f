use std::path::Path;

use indexmap::IndexMap;
use taxonode_types::{
    NodeSpec, OPERATION_FIELD, OperationSpec, ParameterSpec, ParameterTarget, RESOURCE_FIELD, ResourceOperation,
};
use taxonode_util::{PathSegment, parse_path_template};
use tracing::{debug, warn};

use crate::{EMBEDDED_CATALOGS, RegistryError, TaxonodeConfig, visibility::resolve_active};

/// All known node catalogs keyed by node name.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    nodes: IndexMap<String, NodeSpec>,
}

impl SchemaRegistry {
    /// Builds a registry from already parsed nodes.
    ///
    /// # Errors
    /// Fails when two nodes share a name or a node does not validate.
    pub fn from_nodes(nodes: Vec<NodeSpec>) -> Result<Self, RegistryError> {
        let mut registry = Self::default();
        for node in nodes {
            if registry.nodes.contains_key(&node.name) {
                return Err(RegistryError::DuplicateNode(node.name));
            }
            registry.insert(node)?;
        }
        Ok(registry)
    }

    /// Loads the catalogs compiled into the binary.
    pub fn from_embedded() -> Result<Self, RegistryError> {
        let nodes = EMBEDDED_CATALOGS
            .iter()
            .map(|(origin, source)| parse_catalog(origin, source))
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_nodes(nodes)
    }

    /// Loads the embedded catalogs, then every catalog listed in `config`,
    /// then applies base URL overrides.
    ///
    /// A user catalog whose node name matches an embedded node replaces it.
    pub fn from_config(config: &TaxonodeConfig) -> Result<Self, RegistryError> {
        let mut registry = Self::from_embedded()?;
        for path in config.catalog_paths() {
            let node = load_catalog_file(&path)?;
            if registry.nodes.contains_key(&node.name) {
                debug!(node = %node.name, path = %path.display(), "user catalog replaces node");
            }
            registry.insert(node)?;
        }
        for (name, base_url) in &config.base_urls {
            match registry.nodes.get_mut(name) {
                Some(node) => node.base_url = base_url.clone(),
                None => warn!(node = %name, "base URL override for unknown node ignored"),
            }
        }
        Ok(registry)
    }

    /// Validates and inserts a node, replacing any node of the same name.
    pub fn insert(&mut self, node: NodeSpec) -> Result<(), RegistryError> {
        validate_node(&node)?;
        self.nodes.insert(node.name.clone(), node);
        Ok(())
    }

    pub fn nodes(&self) -> impl Iterator<Item = &NodeSpec> {
        self.nodes.values()
    }

    pub fn find_node(&self, name: &str) -> Option<&NodeSpec> {
        self.nodes.get(name)
    }

    /// Finds the operation declared for a selection of a node.
    pub fn operation(&self, node: &str, selection: &ResourceOperation) -> Option<&OperationSpec> {
        self.find_node(node)?
            .operation(&selection.resource, &selection.operation)
    }

    /// Active parameters of a selection, or `None` when the node or the
    /// selection is unknown.
    pub fn specs_for(&self, node: &str, selection: &ResourceOperation) -> Option<Vec<&ParameterSpec>> {
        let node = self.find_node(node)?;
        node.operation(&selection.resource, &selection.operation)?;
        Some(resolve_active(selection, &node.parameters))
    }
}

/// Parses one catalog document. JSON documents are accepted as YAML.
pub fn parse_catalog(origin: &str, source: &str) -> Result<NodeSpec, RegistryError> {
    serde_yaml::from_str(source).map_err(|source| RegistryError::Parse {
        origin: origin.to_string(),
        source,
    })
}

/// Reads and parses a catalog file.
pub fn load_catalog_file(path: &Path) -> Result<NodeSpec, RegistryError> {
    let source = std::fs::read_to_string(path).map_err(|source| RegistryError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_catalog(&path.display().to_string(), &source)
}

/// Checks the invariants the compiler relies on:
/// - top-level `show` rules only reference the selection
/// - every path placeholder of an operation is a path-targeted parameter
///   visible for that operation
/// - every active path-targeted parameter has a placeholder in the template
/// - path-targeted parameters are scalar and never nested
/// - body-targeted parameters, nested fields included, are only active for
///   methods that send a body
fn validate_node(node: &NodeSpec) -> Result<(), RegistryError> {
    for spec in &node.parameters {
        if let Some(field) = spec
            .show
            .keys()
            .find(|field| field.as_str() != RESOURCE_FIELD && field.as_str() != OPERATION_FIELD)
        {
            return Err(RegistryError::invalid_node(
                &node.name,
                format!("parameter '{}' has a show rule on '{}'; only nested fields may depend on siblings", spec.key, field),
            ));
        }
        if spec.target == ParameterTarget::Path && !spec.kind.is_scalar() {
            return Err(RegistryError::invalid_node(
                &node.name,
                format!("path parameter '{}' must be single-valued", spec.key),
            ));
        }
        if let Some(field) = spec.fields.iter().find(|field| field.target == ParameterTarget::Path) {
            return Err(RegistryError::invalid_node(
                &node.name,
                format!("nested field '{}.{}' cannot target the path", spec.key, field.key),
            ));
        }
    }

    for selection in node.selections() {
        let Some(operation) = node.operation(&selection.resource, &selection.operation) else {
            continue;
        };
        let active = resolve_active(&selection, &node.parameters);
        if !operation.method.has_body()
            && let Some(key) = body_parameter(&active)
        {
            return Err(RegistryError::invalid_node(
                &node.name,
                format!("{selection} uses {} but parameter '{key}' targets the body", operation.method),
            ));
        }
        let placeholders: Vec<String> = parse_path_template(&operation.path)
            .into_iter()
            .filter_map(|segment| match segment {
                PathSegment::Literal(_) => None,
                PathSegment::Required(key) | PathSegment::Optional(key) => Some(key),
            })
            .collect();
        for key in &placeholders {
            let declared = active
                .iter()
                .any(|spec| &spec.key == key && spec.target == ParameterTarget::Path);
            if !declared {
                return Err(RegistryError::invalid_node(
                    &node.name,
                    format!("{selection} path placeholder '{key}' has no active path parameter"),
                ));
            }
        }
        if let Some(spec) = active
            .iter()
            .find(|spec| spec.target == ParameterTarget::Path && !placeholders.contains(&spec.key))
        {
            return Err(RegistryError::invalid_node(
                &node.name,
                format!("{selection} path parameter '{}' has no placeholder in '{}'", spec.key, operation.path),
            ));
        }
    }
    Ok(())
}

/// First body-targeted parameter among `active` or their nested fields.
fn body_parameter(active: &[&ParameterSpec]) -> Option<String> {
    active.iter().find_map(|spec| {
        if spec.target == ParameterTarget::Body {
            return Some(spec.key.clone());
        }
        spec.fields
            .iter()
            .find(|field| field.target == ParameterTarget::Body)
            .map(|field| format!("{}.{}", spec.key, field.key))
    })
}
