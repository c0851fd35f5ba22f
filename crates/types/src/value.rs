use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

/// A concrete, present value bound to a parameter for one item.
///
/// Absence is modelled with `Option<ParameterValue>`; a `Boolean(false)` or a
/// `Number(0)` is a present value and is sent like any other.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ParameterValue {
    String(String),
    Number(Number),
    Boolean(bool),
    Choice(String),
    MultiChoice(Vec<String>),
    /// Tokens of a delimited logical set, already split and trimmed.
    List(Vec<String>),
    Collection(IndexMap<String, ParameterValue>),
}

impl ParameterValue {
    /// Renders a single-valued variant as a query string value.
    ///
    /// Returns `None` for multi-valued and collection variants.
    pub fn as_query_value(&self) -> Option<String> {
        match self {
            Self::String(text) | Self::Choice(text) => Some(text.clone()),
            Self::Number(number) => Some(number.to_string()),
            Self::Boolean(flag) => Some(flag.to_string()),
            Self::MultiChoice(_) | Self::List(_) | Self::Collection(_) => None,
        }
    }

    /// The individual tokens of a multi-valued variant.
    pub fn tokens(&self) -> Option<&[String]> {
        match self {
            Self::MultiChoice(tokens) | Self::List(tokens) => Some(tokens),
            _ => None,
        }
    }

    /// Converts the value into the JSON shape used for request bodies.
    pub fn to_json(&self) -> Value {
        match self {
            Self::String(text) | Self::Choice(text) => Value::String(text.clone()),
            Self::Number(number) => Value::Number(number.clone()),
            Self::Boolean(flag) => Value::Bool(*flag),
            Self::MultiChoice(tokens) | Self::List(tokens) => {
                Value::Array(tokens.iter().cloned().map(Value::String).collect())
            }
            Self::Collection(fields) => Value::Object(
                fields
                    .iter()
                    .map(|(key, value)| (key.clone(), value.to_json()))
                    .collect(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn falsy_scalars_render_as_query_values() {
        assert_eq!(ParameterValue::Boolean(false).as_query_value().as_deref(), Some("false"));
        assert_eq!(ParameterValue::Number(Number::from(0)).as_query_value().as_deref(), Some("0"));
    }

    #[test]
    fn multi_valued_variants_expose_tokens_not_scalars() {
        let list = ParameterValue::List(vec!["a".into(), "b".into()]);
        assert!(list.as_query_value().is_none());
        assert_eq!(list.tokens(), Some(&["a".to_string(), "b".to_string()][..]));
        assert_eq!(list.to_json(), json!(["a", "b"]));
    }

    #[test]
    fn collection_converts_to_nested_object() {
        let mut fields = IndexMap::new();
        fields.insert("strict".to_string(), ParameterValue::Boolean(true));
        fields.insert("name".to_string(), ParameterValue::String("Puma".into()));
        let value = ParameterValue::Collection(fields);
        assert_eq!(value.to_json(), json!({ "strict": true, "name": "Puma" }));
    }
}
