//! # HTTP Utilities
//!
//! Helpers for turning raw HTTP responses into JSON values and for
//! summarizing failed responses in error messages.

use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

/// Return a user-friendly hint for common HTTP error status codes.
///
/// # Example
/// ```rust
/// use taxonode_util::http::status_error_message;
///
/// let error_401 = status_error_message(401).unwrap();
/// assert!(error_401.contains("Unauthorized"));
/// assert!(error_401.contains("token"));
///
/// assert!(status_error_message(404).is_some());
/// assert!(status_error_message(500).is_none());
/// ```
pub fn status_error_message(status_code: u16) -> Option<String> {
    match status_code {
        401 => Some("Unauthorized (401). Hint: check the project or API token for this node".into()),
        403 => Some("Forbidden (403). Hint: the token does not grant access to this project".into()),
        404 => Some("Not found (404). Hint: check the identifier and sub-resource".into()),
        429 => Some("Too many requests (429). Hint: the API is rate limiting this client".into()),
        _ => None,
    }
}

/// Parse HTTP response text into JSON, providing detailed errors on failure.
///
/// Any parsing error is decorated with the originating HTTP status code and
/// a truncated preview of the response body.
///
/// # Errors
/// Returns a [`JsonParseError`] describing the parse failure. The message
/// includes the original serde error and up to 200 characters of the
/// response body (with whitespace collapsed).
pub fn parse_response_json_strict(text: &str, status: Option<StatusCode>) -> Result<Value, JsonParseError> {
    serde_json::from_str::<Value>(text).map_err(|error| {
        let status_note = status
            .map(|code| format!("status {code}"))
            .unwrap_or_else(|| "unknown status".to_string());
        let preview = truncate_response_preview(text, 200);

        JsonParseError::new(status_note, error, preview)
    })
}

/// Collapses whitespace and truncates a response body for error messages.
pub fn truncate_response_preview(text: &str, limit: usize) -> String {
    if text.trim().is_empty() {
        return "<empty>".to_string();
    }

    let mut preview = String::new();
    for ch in text.chars() {
        if preview.len() >= limit {
            preview.push_str("...");
            break;
        }
        match ch {
            '\n' | '\r' | '\t' => {
                if !preview.ends_with(' ') {
                    preview.push(' ');
                }
            }
            _ => preview.push(ch),
        }
    }

    preview.trim().to_string()
}

/// Error returned when strict JSON parsing of an HTTP response fails.
#[derive(Debug, Error)]
#[error("failed to parse JSON response ({status_note}): {source}. body preview: {body_preview}")]
pub struct JsonParseError {
    status_note: String,
    #[source]
    source: serde_json::Error,
    body_preview: String,
}

impl JsonParseError {
    pub fn new(status_note: String, source: serde_json::Error, body_preview: String) -> Self {
        Self {
            status_note,
            source,
            body_preview,
        }
    }

    /// Access the truncated response preview captured during parsing.
    pub fn body_preview(&self) -> &str {
        &self.body_preview
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strict_parse_reports_status_and_preview() {
        let error = parse_response_json_strict("<html>\n<body>oops</body>", Some(StatusCode::OK)).unwrap_err();
        let message = error.to_string();
        assert!(message.contains("status 200 OK"), "message: {message}");
        assert_eq!(error.body_preview(), "<html> <body>oops</body>");
    }

    #[test]
    fn strict_parse_accepts_arrays() {
        let value = parse_response_json_strict(r#"[{"scientificName":"Puma concolor"}]"#, None).expect("valid json");
        assert!(value.is_array());
    }

    #[test]
    fn preview_truncates_long_bodies() {
        let body = "x".repeat(300);
        let preview = truncate_response_preview(&body, 10);
        assert_eq!(preview, "xxxxxxxxxx...");
        assert_eq!(truncate_response_preview("  ", 10), "<empty>");
    }
}
