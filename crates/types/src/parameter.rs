use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The declared data type of a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterKind {
    /// Free text.
    String,
    /// Integer or decimal number.
    Number,
    /// `true` / `false` toggle.
    Boolean,
    /// Exactly one value out of `options`.
    Options,
    /// Any number of values out of `options`.
    MultiOptions,
    /// A comma separated string that stands for a set of independent values.
    DelimitedList,
    /// A group of nested, individually optional fields.
    Collection,
}

impl ParameterKind {
    /// Whether a value of this kind maps onto exactly one wire value.
    pub fn is_scalar(&self) -> bool {
        !matches!(self, Self::MultiOptions | Self::DelimitedList | Self::Collection)
    }
}

/// Where a compiled parameter value is placed in the request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterTarget {
    #[default]
    Query,
    /// Consumed by a `{key}` or `{key?}` placeholder of the operation path.
    Path,
    Body,
}

/// Wire format for multi-valued query parameters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArrayStyle {
    /// `name[]=a&name[]=b`
    #[default]
    Brackets,
    /// `name=a&name=b`
    Repeat,
}

/// One allowed value of an options parameter.
///
/// Catalog files may list options either as bare strings or as
/// `{ name, value }` pairs when the label differs from the wire value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawOption")]
pub struct ParameterOption {
    /// Human readable label.
    pub name: String,
    /// Value sent to the API.
    pub value: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawOption {
    Bare(String),
    Labeled {
        value: String,
        #[serde(default)]
        name: Option<String>,
    },
}

impl From<RawOption> for ParameterOption {
    fn from(raw: RawOption) -> Self {
        match raw {
            RawOption::Bare(value) => Self {
                name: value.clone(),
                value,
            },
            RawOption::Labeled { value, name } => Self {
                name: name.unwrap_or_else(|| value.clone()),
                value,
            },
        }
    }
}

/// Declarative description of a single input field of a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSpec {
    /// Unique name within its resource+operation scope.
    pub key: String,
    /// Label shown to users; falls back to `key`.
    #[serde(default)]
    pub display_name: Option<String>,
    pub kind: ParameterKind,
    /// Value used when an item does not supply one.
    #[serde(default)]
    pub default: Option<Value>,
    /// Whether a missing value (with no default) is an error.
    #[serde(default)]
    pub required: bool,
    /// Visibility rule: every listed field must hold one of its allowed
    /// values. `resource` and `operation` refer to the current selection,
    /// any other name to a sibling value.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub show: IndexMap<String, Vec<Value>>,
    #[serde(default)]
    pub target: ParameterTarget,
    /// Name used on the wire when it differs from `key`.
    #[serde(default)]
    pub external_name: Option<String>,
    #[serde(default)]
    pub array_style: ArrayStyle,
    /// Allowed values for `options` and `multi_options` kinds.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<ParameterOption>,
    /// Nested fields of a `collection` kind.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<ParameterSpec>,
    #[serde(default)]
    pub description: Option<String>,
}

impl ParameterSpec {
    /// Creates a visible-everywhere, optional query parameter.
    pub fn new(key: impl Into<String>, kind: ParameterKind) -> Self {
        Self {
            key: key.into(),
            display_name: None,
            kind,
            default: None,
            required: false,
            show: IndexMap::new(),
            target: ParameterTarget::Query,
            external_name: None,
            array_style: ArrayStyle::Brackets,
            options: Vec::new(),
            fields: Vec::new(),
            description: None,
        }
    }

    /// The name this parameter carries on the wire.
    pub fn wire_name(&self) -> &str {
        self.external_name.as_deref().unwrap_or(&self.key)
    }

    /// The label shown to users.
    pub fn label(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.key)
    }

    /// Whether `value` is acceptable for an options kind.
    ///
    /// Parameters that declare no options accept anything.
    pub fn allows(&self, value: &str) -> bool {
        self.options.is_empty() || self.options.iter().any(|option| option.value == value)
    }

    pub fn with_required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    pub fn with_target(mut self, target: ParameterTarget) -> Self {
        self.target = target;
        self
    }

    pub fn with_external_name(mut self, name: impl Into<String>) -> Self {
        self.external_name = Some(name.into());
        self
    }

    pub fn with_array_style(mut self, style: ArrayStyle) -> Self {
        self.array_style = style;
        self
    }

    /// Adds a visibility condition on `field`.
    pub fn shown_when(mut self, field: impl Into<String>, allowed: Vec<Value>) -> Self {
        self.show.insert(field.into(), allowed);
        self
    }

    pub fn with_options<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = values
            .into_iter()
            .map(|value| {
                let value = value.into();
                ParameterOption {
                    name: value.clone(),
                    value,
                }
            })
            .collect();
        self
    }

    pub fn with_fields(mut self, fields: Vec<ParameterSpec>) -> Self {
        self.fields = fields;
        self
    }
}
