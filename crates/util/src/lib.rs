pub mod http;
pub mod path_encoding;
pub mod path_processing;

pub use path_encoding::*;
pub use path_processing::*;

use once_cell::sync::Lazy;
use regex::Regex;

static SENSITIVE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)(authorization: )([\w\-\.=:/+]+)",
        r"(?i)([A-Z0-9_]*?(?:API_?KEY|TOKEN|SECRET|PASSWORD)=)([^\s&]+)",
        r#"(?i)("[A-Z0-9_]*?(?:API_?KEY|TOKEN|SECRET|PASSWORD)"\s*:\s*")([^"]*)"#,
    ]
    .iter()
    .filter_map(|pattern| Regex::new(pattern).ok())
    .collect()
});

/// Redacts values that look like secrets in a string.
///
/// Handles `Authorization:` headers, `name=value` pairs (query strings, env
/// assignments) and `"name": "value"` JSON members whose name ends in
/// token, secret, password or api key.
pub fn redact_sensitive(input: &str) -> String {
    let mut redacted = input.to_string();
    for re in SENSITIVE_PATTERNS.iter() {
        redacted = re
            .replace_all(&redacted, |caps: &regex::Captures| {
                let prefix = caps.get(1).map(|m| m.as_str()).unwrap_or("");
                format!("{}<redacted>", prefix)
            })
            .to_string();
    }
    redacted
}
