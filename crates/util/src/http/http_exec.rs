//! HTTP execution of compiled request plans.
//!
//! This module turns a [`RequestPlan`] into a `reqwest` request, sends it
//! through an [`ApiClient`] and decodes the JSON response.

use std::time::Instant;

use reqwest::StatusCode;
use serde_json::Value;
use taxonode_api::{ApiClient, to_reqwest_method};
use taxonode_types::RequestPlan;
use thiserror::Error;
use tracing::{debug, warn};

use crate::http::{JsonParseError, parse_response_json_strict, status_error_message, truncate_response_preview};

/// Failure while executing a request plan.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("could not build request: {0}")]
    Request(String),

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("HTTP {status}: {body_preview}")]
    Status { status: u16, body_preview: String },

    #[error(transparent)]
    Decode(#[from] JsonParseError),
}

impl TransportError {
    /// Build a status error, prefixing a hint for well-known status codes.
    pub fn status(status: StatusCode, body: &str) -> Self {
        let preview = truncate_response_preview(body, 200);
        let body_preview = match status_error_message(status.as_u16()) {
            Some(hint) => format!("{hint}. {preview}"),
            None => preview,
        };
        Self::Status {
            status: status.as_u16(),
            body_preview,
        }
    }
}

/// Execute a compiled plan and parse the JSON response payload.
///
/// # Returns
/// Returns the parsed JSON payload for a successful response, `Value::Null`
/// for empty bodies, or a [`TransportError`] for network failures, non-2xx
/// statuses and malformed JSON.
pub async fn execute_request_plan(client: &ApiClient, plan: &RequestPlan) -> Result<Value, TransportError> {
    let start = Instant::now();
    let url = plan.url();
    let query_pairs = plan.query_pairs();
    debug!(
        method = %plan.method,
        path = %plan.path(),
        query_parameter_count = query_pairs.len(),
        has_body = plan.body.is_some(),
        "http request started"
    );

    let mut request_builder = client
        .request(to_reqwest_method(plan.method), &url)
        .map_err(|error| TransportError::Request(error.to_string()))?;
    if !query_pairs.is_empty() {
        request_builder = request_builder.query(&query_pairs);
    }
    if let Some(body) = &plan.body {
        request_builder = request_builder.json(&Value::Object(body.clone()));
    }

    let response = request_builder.send().await?;
    let status = response.status();
    let body_text = response.text().await?;

    if !status.is_success() {
        warn!(
            method = %plan.method,
            path = %plan.path(),
            status = %status,
            duration_ms = start.elapsed().as_millis(),
            "http request failed"
        );
        return Err(TransportError::status(status, &body_text));
    }

    if body_text.trim().is_empty() {
        debug!(
            method = %plan.method,
            path = %plan.path(),
            status = %status,
            duration_ms = start.elapsed().as_millis(),
            "http request completed with empty response"
        );
        return Ok(Value::Null);
    }

    let parsed = parse_response_json_strict(&body_text, Some(status)).inspect_err(|error| {
        warn!(
            method = %plan.method,
            path = %plan.path(),
            status = %status,
            body_len = body_text.len(),
            duration_ms = start.elapsed().as_millis(),
            error = %error,
            "http response JSON parse failed"
        );
    })?;
    debug!(
        method = %plan.method,
        path = %plan.path(),
        status = %status,
        duration_ms = start.elapsed().as_millis(),
        "http request completed"
    );
    Ok(parsed)
}
