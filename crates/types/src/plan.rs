use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::parameter::ArrayStyle;

/// HTTP methods a node operation may use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }

    /// Whether requests with this method carry a JSON body.
    pub fn has_body(&self) -> bool {
        matches!(self, Self::Post | Self::Put | Self::Patch)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One occurrence of a multi-valued query parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryPair {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub style: ArrayStyle,
}

impl QueryPair {
    /// The key as it appears on the wire, including the `[]` suffix for
    /// bracket-style arrays.
    pub fn wire_key(&self) -> String {
        match self.style {
            ArrayStyle::Brackets if !self.name.ends_with("[]") => format!("{}[]", self.name),
            _ => self.name.clone(),
        }
    }
}

/// A fully compiled request for one item.
///
/// Plans are produced by the request compiler and consumed by a transport.
/// Path segments are stored already percent-encoded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestPlan {
    pub method: HttpMethod,
    pub base_url: String,
    pub path_segments: Vec<String>,
    /// Single-valued query parameters in insertion order.
    pub query: IndexMap<String, String>,
    /// Multi-valued query parameters, one entry per occurrence.
    pub multi_query: Vec<QueryPair>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Map<String, Value>>,
}

impl RequestPlan {
    /// The request path, e.g. `/species/212/children`.
    pub fn path(&self) -> String {
        self.path_segments.iter().fold(String::new(), |mut path, segment| {
            path.push('/');
            path.push_str(segment);
            path
        })
    }

    /// Base URL joined with the request path, without the query string.
    pub fn url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), self.path())
    }

    /// Flattens the plan into the exact `(key, value)` pairs sent on the
    /// wire: scalar parameters first, then multi-valued occurrences.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let scalars = self.query.iter().map(|(key, value)| (key.clone(), value.clone()));
        let repeated = self.multi_query.iter().map(|pair| (pair.wire_key(), pair.value.clone()));
        scalars.chain(repeated).collect()
    }

    /// Whether any scalar or multi-valued entry uses `name`.
    pub fn has_query_key(&self, name: &str) -> bool {
        self.query.contains_key(name) || self.multi_query.iter().any(|pair| pair.name == name)
    }

    /// All values recorded for a multi-valued parameter, in order.
    pub fn multi_values(&self, name: &str) -> Vec<&str> {
        self.multi_query
            .iter()
            .filter(|pair| pair.name == name)
            .map(|pair| pair.value.as_str())
            .collect()
    }

    /// Sets a value that must override anything compiled under the same name.
    pub fn inject(&mut self, name: &str, value: &str) {
        self.multi_query.retain(|pair| pair.name != name);
        self.query.shift_remove(name);
        self.query.insert(name.to_string(), value.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(name: &str, value: &str, style: ArrayStyle) -> QueryPair {
        QueryPair {
            name: name.to_string(),
            value: value.to_string(),
            style,
        }
    }

    #[test]
    fn path_and_url_join_segments() {
        let plan = RequestPlan {
            base_url: "https://api.gbif.org/v1/".into(),
            path_segments: vec!["species".into(), "212".into(), "children".into()],
            ..Default::default()
        };
        assert_eq!(plan.path(), "/species/212/children");
        assert_eq!(plan.url(), "https://api.gbif.org/v1/species/212/children");
    }

    #[test]
    fn empty_plan_has_empty_path() {
        let plan = RequestPlan::default();
        assert_eq!(plan.path(), "");
    }

    #[test]
    fn query_pairs_apply_array_styles() {
        let mut plan = RequestPlan::default();
        plan.query.insert("limit".into(), "20".into());
        plan.multi_query.push(pair("otu_id", "1", ArrayStyle::Brackets));
        plan.multi_query.push(pair("otu_id[]", "2", ArrayStyle::Brackets));
        plan.multi_query.push(pair("rank", "GENUS", ArrayStyle::Repeat));

        assert_eq!(
            plan.query_pairs(),
            vec![
                ("limit".to_string(), "20".to_string()),
                ("otu_id[]".to_string(), "1".to_string()),
                ("otu_id[]".to_string(), "2".to_string()),
                ("rank".to_string(), "GENUS".to_string()),
            ]
        );
    }

    #[test]
    fn inject_replaces_scalar_and_multi_entries() {
        let mut plan = RequestPlan::default();
        plan.query.insert("token".into(), "user-supplied".into());
        plan.query.insert("q".into(), "Puma".into());
        plan.multi_query.push(pair("token", "x", ArrayStyle::Repeat));

        plan.inject("token", "abc");

        assert_eq!(plan.multi_values("token"), Vec::<&str>::new());
        assert_eq!(plan.query.get_index(1), Some((&"token".to_string(), &"abc".to_string())));
        assert_eq!(plan.query.len(), 2);
    }

    #[test]
    fn methods_report_body_support() {
        assert!(HttpMethod::Post.has_body());
        assert!(!HttpMethod::Get.has_body());
        assert_eq!(HttpMethod::Delete.to_string(), "DELETE");
    }
}
