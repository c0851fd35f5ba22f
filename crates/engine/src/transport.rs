use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use taxonode_api::ApiClient;
use taxonode_types::RequestPlan;
use taxonode_util::http::{TransportError, execute_request_plan};

/// Sends a compiled plan and returns the decoded JSON body.
///
/// Implementations own timeouts and connection reuse. The executor never
/// retries.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn request(&self, plan: &RequestPlan) -> Result<Value, TransportError>;
}

/// [`Transport`] backed by the shared HTTP client.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: ApiClient,
}

impl HttpTransport {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Builds a transport with its own client and the given per-request
    /// timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        Ok(Self::new(ApiClient::new(timeout)?))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn request(&self, plan: &RequestPlan) -> Result<Value, TransportError> {
        execute_request_plan(&self.client, plan).await
    }
}
