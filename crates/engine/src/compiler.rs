//! Request compilation.
//!
//! A [`RequestCompiler`] is built once per invocation from the operation and
//! its active parameters, then turns each item into an immutable
//! [`RequestPlan`]. Compilation is pure: it performs no I/O and the same
//! inputs always produce the same plan.

use indexmap::IndexMap;
use serde_json::{Map, Value};
use taxonode_registry::resolve_nested;
use taxonode_types::{
    OperationSpec, ParameterKind, ParameterSpec, ParameterTarget, ParameterValue, QueryPair, RequestPlan,
    ResourceOperation,
};
use taxonode_util::{PathSegment, encode_path_segment, parse_path_template};

use crate::{CompileError, coerce::resolve_value};

/// Compiles items for one resource/operation selection.
#[derive(Debug, Clone)]
pub struct RequestCompiler<'a> {
    selection: ResourceOperation,
    operation: &'a OperationSpec,
    base_url: &'a str,
    active: Vec<&'a ParameterSpec>,
    injections: IndexMap<String, String>,
}

impl<'a> RequestCompiler<'a> {
    /// `active` must be the visibility-resolved parameters for `selection`;
    /// `injections` are set on every plan after all parameters.
    pub fn new(
        selection: ResourceOperation,
        operation: &'a OperationSpec,
        base_url: &'a str,
        active: Vec<&'a ParameterSpec>,
        injections: IndexMap<String, String>,
    ) -> Self {
        Self {
            selection,
            operation,
            base_url,
            active,
            injections,
        }
    }

    pub fn active_specs(&self) -> &[&'a ParameterSpec] {
        &self.active
    }

    /// Builds the request plan for one item.
    ///
    /// # Errors
    /// [`CompileError::MissingRequiredParameter`] when a required parameter
    /// (or a mandatory path placeholder) has neither a value nor a default;
    /// [`CompileError::InvalidParameterValue`] when a value cannot be coerced.
    pub fn compile(&self, item: &Map<String, Value>) -> Result<RequestPlan, CompileError> {
        let mut resolved: Vec<(&ParameterSpec, ParameterValue)> = Vec::with_capacity(self.active.len());
        for spec in self.active.iter().copied() {
            match resolve_value(spec, item)? {
                Some(value) => resolved.push((spec, value)),
                None if spec.required => return Err(CompileError::MissingRequiredParameter(spec.key.clone())),
                None if spec.kind == ParameterKind::Collection => self.check_absent_collection(spec)?,
                None => {}
            }
        }

        let mut plan = RequestPlan {
            method: self.operation.method,
            base_url: self.base_url.to_string(),
            path_segments: self.compose_path(&resolved)?,
            ..Default::default()
        };

        let mut body = Map::new();
        for (spec, value) in &resolved {
            if spec.target == ParameterTarget::Path {
                continue;
            }
            self.place(&mut plan, &mut body, spec, value)?;
        }
        if self.operation.method.has_body() {
            plan.body = Some(body);
        }

        for (name, value) in &self.injections {
            plan.inject(name, value);
        }
        Ok(plan)
    }

    /// Expands the path template. An omitted optional placeholder drops
    /// itself and every segment after it.
    fn compose_path(&self, resolved: &[(&ParameterSpec, ParameterValue)]) -> Result<Vec<String>, CompileError> {
        let path_value = |key: &str| {
            resolved
                .iter()
                .find(|(spec, _)| spec.key == key && spec.target == ParameterTarget::Path)
                .and_then(|(_, value)| value.as_query_value())
                .filter(|value| !value.is_empty())
        };

        let mut segments = Vec::new();
        for segment in parse_path_template(&self.operation.path) {
            match segment {
                PathSegment::Literal(text) => segments.push(text),
                PathSegment::Required(key) => {
                    let value = path_value(&key).ok_or(CompileError::MissingRequiredParameter(key))?;
                    segments.push(encode_path_segment(&value));
                }
                PathSegment::Optional(key) => match path_value(&key) {
                    Some(value) => segments.push(encode_path_segment(&value)),
                    None => break,
                },
            }
        }
        Ok(segments)
    }

    /// An absent collection still fails when one of its fields that is
    /// visible without siblings is required.
    fn check_absent_collection(&self, spec: &ParameterSpec) -> Result<(), CompileError> {
        match resolve_nested(&self.selection, &spec.fields, &Map::new())
            .into_iter()
            .find(|field| field.required && field.default.is_none())
        {
            Some(field) => Err(CompileError::MissingRequiredParameter(field.key.clone())),
            None => Ok(()),
        }
    }

    fn place(
        &self,
        plan: &mut RequestPlan,
        body: &mut Map<String, Value>,
        spec: &ParameterSpec,
        value: &ParameterValue,
    ) -> Result<(), CompileError> {
        if let ParameterValue::Collection(fields) = value {
            return self.place_collection(plan, body, spec, fields);
        }
        match spec.target {
            ParameterTarget::Path => {}
            ParameterTarget::Body => {
                body.insert(spec.wire_name().to_string(), value.to_json());
            }
            ParameterTarget::Query => {
                if let Some(scalar) = value.as_query_value() {
                    plan.query.insert(spec.wire_name().to_string(), scalar);
                } else if let Some(tokens) = value.tokens() {
                    plan.multi_query.extend(tokens.iter().map(|token| QueryPair {
                        name: spec.wire_name().to_string(),
                        value: token.clone(),
                        style: spec.array_style,
                    }));
                }
            }
        }
        Ok(())
    }

    /// Flattens a collection: every nested field that is visible given its
    /// siblings is placed like a top-level parameter.
    fn place_collection(
        &self,
        plan: &mut RequestPlan,
        body: &mut Map<String, Value>,
        spec: &ParameterSpec,
        fields: &IndexMap<String, ParameterValue>,
    ) -> Result<(), CompileError> {
        let siblings: Map<String, Value> = fields
            .iter()
            .map(|(key, value)| (key.clone(), value.to_json()))
            .collect();
        for field in resolve_nested(&self.selection, &spec.fields, &siblings) {
            match fields.get(&field.key) {
                Some(value) if field.kind != ParameterKind::Collection => self.place(plan, body, field, value)?,
                Some(_) => {
                    return Err(CompileError::invalid(&field.key, "collections cannot be nested"));
                }
                None if field.required => return Err(CompileError::MissingRequiredParameter(field.key.clone())),
                None => {}
            }
        }
        Ok(())
    }
}

/// One-shot form of [`RequestCompiler::compile`].
pub fn compile(
    selection: &ResourceOperation,
    operation: &OperationSpec,
    base_url: &str,
    active: &[&ParameterSpec],
    item: &Map<String, Value>,
    injections: &IndexMap<String, String>,
) -> Result<RequestPlan, CompileError> {
    RequestCompiler::new(selection.clone(), operation, base_url, active.to_vec(), injections.clone()).compile(item)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use taxonode_types::{ArrayStyle, HttpMethod, ResponseProjection};

    fn operation(method: HttpMethod, path: &str) -> OperationSpec {
        OperationSpec {
            name: "get".into(),
            method,
            path: path.into(),
            projection: ResponseProjection::None,
            description: None,
        }
    }

    fn item(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap_or_default()
    }

    fn species_get() -> (OperationSpec, Vec<ParameterSpec>) {
        let specs = vec![
            ParameterSpec::new("key", ParameterKind::String).with_target(ParameterTarget::Path),
            ParameterSpec::new("subresource", ParameterKind::Options)
                .with_target(ParameterTarget::Path)
                .with_options(["children", "synonyms"]),
            ParameterSpec::new("language", ParameterKind::String),
        ];
        (operation(HttpMethod::Get, "/species/{key?}/{subresource?}"), specs)
    }

    fn compile_item(operation: &OperationSpec, specs: &[ParameterSpec], values: Value) -> Result<RequestPlan, CompileError> {
        let active: Vec<&ParameterSpec> = specs.iter().collect();
        compile(
            &ResourceOperation::new("species", "get"),
            operation,
            "https://api.gbif.org/v1",
            &active,
            &item(values),
            &IndexMap::new(),
        )
    }

    #[test]
    fn optional_path_segments_follow_presence() {
        let (operation, specs) = species_get();

        let plan = compile_item(&operation, &specs, json!({})).unwrap();
        assert_eq!(plan.path(), "/species");

        let plan = compile_item(&operation, &specs, json!({ "key": "212" })).unwrap();
        assert_eq!(plan.path(), "/species/212");

        let plan = compile_item(&operation, &specs, json!({ "key": 212, "subresource": "children" })).unwrap();
        assert_eq!(plan.path(), "/species/212/children");
        assert!(plan.query.is_empty(), "path values leaked into the query: {:?}", plan.query);
    }

    #[test]
    fn sub_resource_never_appears_without_its_parent() {
        let (operation, specs) = species_get();
        let plan = compile_item(&operation, &specs, json!({ "subresource": "children" })).unwrap();
        assert_eq!(plan.path(), "/species");
    }

    #[test]
    fn path_values_are_percent_encoded() {
        let (operation, specs) = species_get();
        let plan = compile_item(&operation, &specs, json!({ "key": "a b/c" })).unwrap();
        assert_eq!(plan.path_segments, vec!["species".to_string(), "a%20b%2Fc".to_string()]);
    }

    #[test]
    fn mandatory_placeholder_without_value_fails() {
        let specs = vec![ParameterSpec::new("key", ParameterKind::String).with_target(ParameterTarget::Path)];
        let error = compile_item(&operation(HttpMethod::Get, "/occurrence/{key}"), &specs, json!({})).unwrap_err();
        assert_eq!(error, CompileError::MissingRequiredParameter("key".into()));
    }

    #[test]
    fn absent_and_empty_values_are_omitted_but_falsy_values_are_sent() {
        let specs = vec![
            ParameterSpec::new("q", ParameterKind::String),
            ParameterSpec::new("strict", ParameterKind::Boolean),
            ParameterSpec::new("offset", ParameterKind::Number),
            ParameterSpec::new("datasetKey", ParameterKind::String),
        ];
        let plan = compile_item(
            &operation(HttpMethod::Get, "/species/search"),
            &specs,
            json!({ "q": "", "strict": false, "offset": 0 }),
        )
        .unwrap();
        assert_eq!(
            plan.query_pairs(),
            vec![
                ("strict".to_string(), "false".to_string()),
                ("offset".to_string(), "0".to_string()),
            ]
        );
    }

    #[test]
    fn external_names_are_used_on_the_wire() {
        let specs = vec![
            ParameterSpec::new("geographicAreaId", ParameterKind::String).with_external_name("geographic_area_id"),
            ParameterSpec::new("otuIds", ParameterKind::DelimitedList).with_external_name("otu_id"),
        ];
        let plan = compile_item(
            &operation(HttpMethod::Get, "/asserted_distributions"),
            &specs,
            json!({ "geographicAreaId": "33", "otuIds": "1,2" }),
        )
        .unwrap();
        assert_eq!(
            plan.query_pairs(),
            vec![
                ("geographic_area_id".to_string(), "33".to_string()),
                ("otu_id[]".to_string(), "1".to_string()),
                ("otu_id[]".to_string(), "2".to_string()),
            ]
        );
        assert!(!plan.has_query_key("geographicAreaId"));
    }

    #[test]
    fn required_parameter_without_value_or_default_fails() {
        let specs = vec![ParameterSpec::new("name", ParameterKind::String).with_required(true)];
        let error = compile_item(&operation(HttpMethod::Get, "/species/match"), &specs, json!({})).unwrap_err();
        assert_eq!(error, CompileError::MissingRequiredParameter("name".into()));

        let with_default = vec![
            ParameterSpec::new("name", ParameterKind::String)
                .with_required(true)
                .with_default(json!("Puma concolor")),
        ];
        let plan = compile_item(&operation(HttpMethod::Get, "/species/match"), &with_default, json!({})).unwrap();
        assert_eq!(plan.query["name"], "Puma concolor");
    }

    #[test]
    fn body_parameters_only_appear_for_body_methods() {
        let specs = vec![
            ParameterSpec::new("name", ParameterKind::String).with_target(ParameterTarget::Body),
            ParameterSpec::new("tags", ParameterKind::DelimitedList).with_target(ParameterTarget::Body),
            ParameterSpec::new("dry_run", ParameterKind::Boolean),
        ];
        let plan = compile_item(
            &operation(HttpMethod::Post, "/otus"),
            &specs,
            json!({ "name": "Aus bus", "tags": "a, b", "dry_run": true }),
        )
        .unwrap();
        assert_eq!(plan.body, Some(item(json!({ "name": "Aus bus", "tags": ["a", "b"] }))));
        assert_eq!(plan.query["dry_run"], "true");

        let plan = compile_item(&operation(HttpMethod::Post, "/otus"), &specs, json!({})).unwrap();
        assert_eq!(plan.body, Some(Map::new()));
    }

    #[test]
    fn collections_flatten_visible_fields() {
        let specs = vec![
            ParameterSpec::new("additionalFields", ParameterKind::Collection).with_fields(vec![
                ParameterSpec::new("hasCoordinate", ParameterKind::Boolean),
                ParameterSpec::new("hasGeospatialIssue", ParameterKind::Boolean)
                    .shown_when("hasCoordinate", vec![json!(true)]),
                ParameterSpec::new("recordedBy", ParameterKind::String),
            ]),
        ];
        let search = operation(HttpMethod::Get, "/occurrence/search");

        let plan = compile_item(
            &search,
            &specs,
            json!({ "additionalFields": { "hasCoordinate": true, "hasGeospatialIssue": false } }),
        )
        .unwrap();
        assert_eq!(plan.query["hasCoordinate"], "true");
        assert_eq!(plan.query["hasGeospatialIssue"], "false");

        let plan = compile_item(
            &search,
            &specs,
            json!({ "additionalFields": { "hasCoordinate": false, "hasGeospatialIssue": true, "recordedBy": "Darwin" } }),
        )
        .unwrap();
        assert!(!plan.has_query_key("hasGeospatialIssue"));
        assert_eq!(plan.query["recordedBy"], "Darwin");
    }

    #[test]
    fn required_collection_fields_fail_even_when_the_collection_is_absent() {
        let specs = vec![
            ParameterSpec::new("additionalFields", ParameterKind::Collection).with_fields(vec![
                ParameterSpec::new("hasCoordinate", ParameterKind::Boolean),
                ParameterSpec::new("recordedBy", ParameterKind::String).with_required(true),
            ]),
        ];
        let search = operation(HttpMethod::Get, "/occurrence/search");
        let missing = CompileError::MissingRequiredParameter("recordedBy".into());

        assert_eq!(compile_item(&search, &specs, json!({})).unwrap_err(), missing);
        assert_eq!(
            compile_item(&search, &specs, json!({ "additionalFields": { "other": 1 } })).unwrap_err(),
            missing
        );
        assert_eq!(
            compile_item(&search, &specs, json!({ "additionalFields": { "hasCoordinate": true } })).unwrap_err(),
            missing
        );
        let plan = compile_item(&search, &specs, json!({ "additionalFields": { "recordedBy": "Darwin" } })).unwrap();
        assert_eq!(plan.query["recordedBy"], "Darwin");
    }

    #[test]
    fn hidden_or_defaulted_collection_fields_do_not_block_an_absent_collection() {
        let specs = vec![
            ParameterSpec::new("additionalFields", ParameterKind::Collection).with_fields(vec![
                ParameterSpec::new("hasCoordinate", ParameterKind::Boolean),
                ParameterSpec::new("hasGeospatialIssue", ParameterKind::Boolean)
                    .with_required(true)
                    .shown_when("hasCoordinate", vec![json!(true)]),
                ParameterSpec::new("month", ParameterKind::Number)
                    .with_required(true)
                    .with_default(json!(1)),
            ]),
        ];
        let plan = compile_item(&operation(HttpMethod::Get, "/occurrence/search"), &specs, json!({})).unwrap();
        assert!(plan.query.is_empty());
    }

    #[test]
    fn injections_are_applied_last_and_override() {
        let specs = vec![
            ParameterSpec::new("project_token", ParameterKind::String),
            ParameterSpec::new("per", ParameterKind::Number),
        ];
        let active: Vec<&ParameterSpec> = specs.iter().collect();
        let injections = IndexMap::from([("project_token".to_string(), "secret".to_string())]);
        let plan = compile(
            &ResourceOperation::new("otu", "get"),
            &operation(HttpMethod::Get, "/otus"),
            "https://sandbox.taxonworks.org/api/v1",
            &active,
            &item(json!({ "project_token": "spoofed", "per": 5 })),
            &injections,
        )
        .unwrap();
        assert_eq!(
            plan.query_pairs(),
            vec![
                ("per".to_string(), "5".to_string()),
                ("project_token".to_string(), "secret".to_string()),
            ]
        );
    }

    #[test]
    fn repeat_style_lists_expand_without_brackets() {
        let specs = vec![
            ParameterSpec::new("rank", ParameterKind::MultiOptions)
                .with_array_style(ArrayStyle::Repeat)
                .with_options(["GENUS", "SPECIES"]),
        ];
        let plan = compile_item(
            &operation(HttpMethod::Get, "/species/search"),
            &specs,
            json!({ "rank": ["GENUS", "SPECIES"] }),
        )
        .unwrap();
        assert_eq!(plan.multi_values("rank"), vec!["GENUS", "SPECIES"]);
        assert_eq!(plan.query_pairs()[0], ("rank".to_string(), "GENUS".to_string()));
    }

    #[test]
    fn compiling_twice_yields_identical_plans() {
        let (operation, specs) = species_get();
        let values = json!({ "key": "5", "language": "eng" });
        assert_eq!(
            compile_item(&operation, &specs, values.clone()).unwrap(),
            compile_item(&operation, &specs, values).unwrap()
        );
    }
}
