//! HTTP client for biodiversity data APIs.
//!
//! This crate provides a lightweight client shared by every node:
//!
//! - Constructing an HTTP client with sensible defaults (timeout, JSON
//!   `Accept` header, User-Agent)
//! - Validating request URLs for safety before anything is sent
//! - Mapping node HTTP methods onto `reqwest` methods
//!
//! Unlike a single-service client, [`ApiClient`] is not bound to one base
//! URL: each compiled request plan carries the base URL of its node.
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use taxonode_api::ApiClient;
//!
//! let client = ApiClient::new(Duration::from_secs(30))?;
//! let request = client.request(reqwest::Method::GET, "https://api.gbif.org/v1/species/212")?;
//! # Ok::<(), anyhow::Error>(())
//! ```

use std::env;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use reqwest::{Client, Method, RequestBuilder, Url, header};
use taxonode_types::HttpMethod;
use tracing::debug;

/// Hostnames allowed for local development regardless of scheme.
const LOCALHOST_DOMAINS: &[&str] = &["localhost", "127.0.0.1"];

/// Default request timeout when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
/// Thin wrapper around a configured `reqwest::Client`.
///
/// The client pre-configures default headers and validates every URL it is
/// asked to build a request for.
pub struct ApiClient {
    pub http: Client,
    pub user_agent: String,
}

impl ApiClient {
    /// Construct an [`ApiClient`] with the given request timeout.
    pub fn new(timeout: Duration) -> Result<Self> {
        let mut default_headers = header::HeaderMap::new();
        default_headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));

        let http = Client::builder()
            .default_headers(default_headers)
            .timeout(timeout)
            .build()
            .context("build http client")?;

        Ok(Self {
            http,
            user_agent: format!("taxonode/{}; {}", env!("CARGO_PKG_VERSION"), env::consts::OS),
        })
    }

    /// Build a `reqwest::RequestBuilder` for a method and absolute URL.
    ///
    /// The URL must pass [`validate_base_url`]. The resulting request
    /// includes the configured User-Agent and default headers.
    pub fn request(&self, method: Method, url: &str) -> Result<RequestBuilder> {
        validate_base_url(url)?;
        debug!(%url, %method, "building request");

        Ok(self.http.request(method, url).header(header::USER_AGENT, &self.user_agent))
    }
}

/// Maps a node HTTP method onto the `reqwest` method.
pub fn to_reqwest_method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Patch => Method::PATCH,
        HttpMethod::Delete => Method::DELETE,
    }
}

/// Validate that a base URL is acceptable for use by the client.
///
/// Rules:
/// - `localhost` or `127.0.0.1`: any scheme is allowed
/// - otherwise: scheme must be HTTPS
pub fn validate_base_url(base: &str) -> Result<()> {
    let parsed_base_url = Url::parse(base).map_err(|e| anyhow!("Invalid base URL '{}': {}", base, e))?;

    let host_name = parsed_base_url
        .host_str()
        .ok_or_else(|| anyhow!("base URL '{}' must include a host", base))?;

    if LOCALHOST_DOMAINS
        .iter()
        .any(|&allowed| host_name.eq_ignore_ascii_case(allowed))
    {
        return Ok(());
    }

    if parsed_base_url.scheme() != "https" {
        return Err(anyhow!(
            "base URL must use https for non-localhost hosts; got '{}://'",
            parsed_base_url.scheme()
        ));
    }

    Ok(())
}
