//! Visibility resolution for declared parameters.
//!
//! A parameter is active when every entry of its `show` rule holds. Entries
//! named `resource` / `operation` are checked against the current selection;
//! any other entry is checked against a sibling value, which only exists for
//! fields nested inside a collection.

use serde_json::{Map, Value};
use taxonode_types::{OPERATION_FIELD, ParameterSpec, RESOURCE_FIELD, ResourceOperation};

/// Returns the parameters visible for `selection`, in declaration order.
///
/// A selection that matches no parameter yields an empty list; operations
/// without parameters are valid.
pub fn resolve_active<'a>(selection: &ResourceOperation, specs: &'a [ParameterSpec]) -> Vec<&'a ParameterSpec> {
    specs
        .iter()
        .filter(|spec| is_visible(spec, selection, None))
        .collect()
}

/// Returns the nested fields of a collection that are visible given the
/// selection and the sibling values supplied inside the collection.
pub fn resolve_nested<'a>(
    selection: &ResourceOperation,
    fields: &'a [ParameterSpec],
    siblings: &Map<String, Value>,
) -> Vec<&'a ParameterSpec> {
    fields
        .iter()
        .filter(|spec| is_visible(spec, selection, Some(siblings)))
        .collect()
}

/// Evaluates the `show` rule of one parameter.
///
/// Without `siblings`, conditions on fields other than the selection never
/// hold. An absent or `null` sibling never satisfies a condition.
pub fn is_visible(spec: &ParameterSpec, selection: &ResourceOperation, siblings: Option<&Map<String, Value>>) -> bool {
    spec.show.iter().all(|(field, allowed)| match field.as_str() {
        RESOURCE_FIELD => allowed.iter().any(|value| value.as_str() == Some(&selection.resource)),
        OPERATION_FIELD => allowed.iter().any(|value| value.as_str() == Some(&selection.operation)),
        sibling => siblings
            .and_then(|values| values.get(sibling))
            .filter(|actual| !actual.is_null())
            .is_some_and(|actual| allowed.iter().any(|expected| loosely_equal(expected, actual))),
    })
}

/// Compares rule values with item values, accepting a string rendering of
/// scalars (`"true"` matches `true`, `"5"` matches `5`).
fn loosely_equal(expected: &Value, actual: &Value) -> bool {
    if expected == actual {
        return true;
    }
    match (expected, actual) {
        (Value::String(text), other) | (other, Value::String(text)) => match other {
            Value::Bool(flag) => text.eq_ignore_ascii_case(&flag.to_string()),
            Value::Number(number) => text.trim() == number.to_string(),
            _ => false,
        },
        _ => false,
    }
}
