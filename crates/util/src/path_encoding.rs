use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

/// Every byte except RFC3986 unreserved characters is encoded.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'.').remove(b'_').remove(b'~');

/// One segment of an operation path template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// Fixed text such as `species`.
    Literal(String),
    /// `{key}`: the value must be supplied.
    Required(String),
    /// `{key?}`: the segment is dropped when the value is absent, together
    /// with every segment nested after it.
    Optional(String),
}

/// Splits a path template like `/species/{key?}/{subresource?}` into
/// segments. Empty segments (leading, trailing or doubled slashes) are
/// ignored.
pub fn parse_path_template(template: &str) -> Vec<PathSegment> {
    template
        .split('/')
        .filter(|segment| !segment.is_empty())
        .map(|segment| match segment.strip_prefix('{').and_then(|rest| rest.strip_suffix('}')) {
            Some(inner) => match inner.strip_suffix('?') {
                Some(key) => PathSegment::Optional(key.trim().to_string()),
                None => PathSegment::Required(inner.trim().to_string()),
            },
            None => PathSegment::Literal(segment.to_string()),
        })
        .collect()
}

/// Percent-encodes a path placeholder value while preserving RFC3986
/// unreserved bytes (`A-Z`, `a-z`, `0-9`, `-`, `.`, `_`, `~`).
pub fn encode_path_segment(value: &str) -> String {
    utf8_percent_encode(value, PATH_SEGMENT).to_string()
}
