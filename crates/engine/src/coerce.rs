//! Conversion of raw item values into typed [`ParameterValue`]s.
//!
//! Absence is explicit: `Ok(None)` means "not supplied" and the parameter is
//! omitted from the request. `false` and `0` are present values.

use indexmap::IndexMap;
use serde_json::{Map, Number, Value};
use taxonode_types::{ParameterKind, ParameterSpec, ParameterValue};

use crate::CompileError;

/// Resolves the value of `spec` for one item: the item value when present,
/// otherwise the declared default, otherwise absent.
pub fn resolve_value(spec: &ParameterSpec, item: &Map<String, Value>) -> Result<Option<ParameterValue>, CompileError> {
    if let Some(raw) = item.get(&spec.key)
        && let Some(value) = coerce_value(spec, raw)?
    {
        return Ok(Some(value));
    }
    match &spec.default {
        Some(default) => coerce_value(spec, default),
        None => Ok(None),
    }
}

/// Coerces one raw JSON value according to the declared kind of `spec`.
pub fn coerce_value(spec: &ParameterSpec, raw: &Value) -> Result<Option<ParameterValue>, CompileError> {
    if raw.is_null() {
        return Ok(None);
    }
    match spec.kind {
        ParameterKind::String => {
            let text = scalar_text(spec, raw)?;
            Ok((!text.is_empty()).then_some(ParameterValue::String(text)))
        }
        ParameterKind::Number => coerce_number(spec, raw),
        ParameterKind::Boolean => coerce_boolean(spec, raw),
        ParameterKind::Options => {
            let text = scalar_text(spec, raw)?;
            let text = text.trim();
            if text.is_empty() {
                return Ok(None);
            }
            check_option(spec, text)?;
            Ok(Some(ParameterValue::Choice(text.to_string())))
        }
        ParameterKind::MultiOptions => {
            let tokens = split_tokens(spec, raw)?;
            for token in &tokens {
                check_option(spec, token)?;
            }
            Ok((!tokens.is_empty()).then_some(ParameterValue::MultiChoice(tokens)))
        }
        ParameterKind::DelimitedList => {
            let tokens = split_tokens(spec, raw)?;
            Ok((!tokens.is_empty()).then_some(ParameterValue::List(tokens)))
        }
        ParameterKind::Collection => coerce_collection(spec, raw),
    }
}

fn scalar_text(spec: &ParameterSpec, raw: &Value) -> Result<String, CompileError> {
    match raw {
        Value::String(text) => Ok(text.clone()),
        Value::Number(number) => Ok(number.to_string()),
        Value::Bool(flag) => Ok(flag.to_string()),
        other => Err(CompileError::invalid(
            &spec.key,
            format!("expected a single value, got {}", json_type(other)),
        )),
    }
}

fn coerce_number(spec: &ParameterSpec, raw: &Value) -> Result<Option<ParameterValue>, CompileError> {
    let text = match raw {
        Value::Number(number) => return Ok(Some(ParameterValue::Number(number.clone()))),
        Value::String(text) => text.trim(),
        other => {
            return Err(CompileError::invalid(
                &spec.key,
                format!("expected a number, got {}", json_type(other)),
            ));
        }
    };
    if text.is_empty() {
        return Ok(None);
    }
    let number = text
        .parse::<i64>()
        .map(Number::from)
        .ok()
        .or_else(|| text.parse::<u64>().map(Number::from).ok())
        .or_else(|| text.parse::<f64>().ok().and_then(Number::from_f64))
        .ok_or_else(|| CompileError::invalid(&spec.key, format!("'{text}' is not a number")))?;
    Ok(Some(ParameterValue::Number(number)))
}

fn coerce_boolean(spec: &ParameterSpec, raw: &Value) -> Result<Option<ParameterValue>, CompileError> {
    match raw {
        Value::Bool(flag) => Ok(Some(ParameterValue::Boolean(*flag))),
        Value::String(text) => {
            let text = text.trim();
            if text.is_empty() {
                Ok(None)
            } else if text.eq_ignore_ascii_case("true") {
                Ok(Some(ParameterValue::Boolean(true)))
            } else if text.eq_ignore_ascii_case("false") {
                Ok(Some(ParameterValue::Boolean(false)))
            } else {
                Err(CompileError::invalid(&spec.key, format!("'{text}' is not a boolean")))
            }
        }
        other => Err(CompileError::invalid(
            &spec.key,
            format!("expected a boolean, got {}", json_type(other)),
        )),
    }
}

/// Splits a comma separated string or an array into trimmed, non-empty
/// tokens.
fn split_tokens(spec: &ParameterSpec, raw: &Value) -> Result<Vec<String>, CompileError> {
    let pieces = match raw {
        Value::Array(elements) => elements
            .iter()
            .filter(|element| !element.is_null())
            .map(|element| scalar_text(spec, element))
            .collect::<Result<Vec<_>, _>>()?,
        other => vec![scalar_text(spec, other)?],
    };
    Ok(pieces
        .iter()
        .flat_map(|piece| piece.split(','))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect())
}

fn check_option(spec: &ParameterSpec, value: &str) -> Result<(), CompileError> {
    if spec.allows(value) {
        return Ok(());
    }
    let allowed: Vec<&str> = spec.options.iter().map(|option| option.value.as_str()).collect();
    Err(CompileError::invalid(
        &spec.key,
        format!("'{value}' is not one of: {}", allowed.join(", ")),
    ))
}

/// Coerces every declared nested field. Undeclared keys are ignored and an
/// object with no present field is absent.
fn coerce_collection(spec: &ParameterSpec, raw: &Value) -> Result<Option<ParameterValue>, CompileError> {
    let Value::Object(values) = raw else {
        return Err(CompileError::invalid(
            &spec.key,
            format!("expected an object, got {}", json_type(raw)),
        ));
    };
    let mut fields = IndexMap::new();
    for field in &spec.fields {
        if let Some(value) = resolve_value(field, values)? {
            fields.insert(field.key.clone(), value);
        }
    }
    Ok((!fields.is_empty()).then_some(ParameterValue::Collection(fields)))
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
