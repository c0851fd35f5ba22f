use std::sync::Arc;

use futures_util::{StreamExt, TryStreamExt, stream};
use serde_json::{Map, Value};
use taxonode_registry::SchemaRegistry;
use taxonode_types::{NodeSpec, OperationSpec, RequestPlan, ResourceOperation, ResponseProjection};
use tracing::{debug, info};

use crate::{CredentialProvider, EngineError, RequestCompiler, Transport};

/// Runs a node operation over a batch of input items.
///
/// Visibility and credentials are resolved once per call; each item is then
/// compiled and sent on its own. Outputs keep item order and the first
/// failure aborts the whole batch.
pub struct Executor {
    registry: SchemaRegistry,
    transport: Arc<dyn Transport>,
    credentials: Arc<dyn CredentialProvider>,
    concurrency: usize,
}

struct Prepared<'a> {
    node: &'a NodeSpec,
    operation: &'a OperationSpec,
    compiler: RequestCompiler<'a>,
}

impl Executor {
    pub fn new(
        registry: SchemaRegistry,
        transport: Arc<dyn Transport>,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Self {
        Self {
            registry,
            transport,
            credentials,
            concurrency: 1,
        }
    }

    /// Allows up to `limit` requests in flight. `0` and `1` both mean
    /// sequential execution.
    pub fn with_concurrency(mut self, limit: usize) -> Self {
        self.concurrency = limit.max(1);
        self
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    /// Compiles every item without sending anything.
    pub fn plan(
        &self,
        node: &str,
        resource: &str,
        operation: &str,
        items: &[Map<String, Value>],
    ) -> Result<Vec<RequestPlan>, EngineError> {
        let prepared = self.prepare(node, resource, operation)?;
        compile_all(&prepared.compiler, items)
    }

    /// Executes `resource:operation` of `node` once per item and returns one
    /// (projected) response per item, in item order.
    ///
    /// # Errors
    /// Lookup and credential failures are returned before any item is
    /// compiled. Item failures carry the 0-based index of the failing item.
    pub async fn execute(
        &self,
        node: &str,
        resource: &str,
        operation: &str,
        items: &[Map<String, Value>],
    ) -> Result<Vec<Value>, EngineError> {
        let prepared = self.prepare(node, resource, operation)?;
        let projection = &prepared.operation.projection;
        info!(
            node = %prepared.node.name,
            resource,
            operation,
            items = items.len(),
            concurrency = self.concurrency,
            "executing operation"
        );

        if self.concurrency == 1 {
            let mut outputs = Vec::with_capacity(items.len());
            for (item_index, item) in items.iter().enumerate() {
                let plan = prepared
                    .compiler
                    .compile(item)
                    .map_err(|source| EngineError::Compile { item_index, source })?;
                outputs.push(send(self.transport.as_ref(), projection, item_index, &plan).await?);
            }
            return Ok(outputs);
        }

        let plans = compile_all(&prepared.compiler, items)?;
        let transport = self.transport.as_ref();
        stream::iter(plans.iter().enumerate())
            .map(move |(item_index, plan)| send(transport, projection, item_index, plan))
            .buffered(self.concurrency)
            .try_collect()
            .await
    }

    fn prepare(&self, node: &str, resource: &str, operation: &str) -> Result<Prepared<'_>, EngineError> {
        let node_spec = self
            .registry
            .find_node(node)
            .ok_or_else(|| EngineError::UnknownNode(node.to_string()))?;
        let selection = ResourceOperation::new(resource, operation);
        let operation_spec = node_spec
            .operation(resource, operation)
            .ok_or_else(|| EngineError::UnknownResourceOperation {
                node: node.to_string(),
                resource: resource.to_string(),
                operation: operation.to_string(),
            })?;
        let active = self
            .registry
            .specs_for(node, &selection)
            .ok_or_else(|| EngineError::UnknownResourceOperation {
                node: node.to_string(),
                resource: resource.to_string(),
                operation: operation.to_string(),
            })?;
        let injections = self.credentials.tokens_for(node_spec)?;
        debug!(
            node = %node_spec.name,
            selection = %selection,
            active_parameters = active.len(),
            injections = injections.len(),
            "prepared operation"
        );

        Ok(Prepared {
            node: node_spec,
            operation: operation_spec,
            compiler: RequestCompiler::new(selection, operation_spec, &node_spec.base_url, active, injections),
        })
    }
}

fn compile_all(compiler: &RequestCompiler<'_>, items: &[Map<String, Value>]) -> Result<Vec<RequestPlan>, EngineError> {
    items
        .iter()
        .enumerate()
        .map(|(item_index, item)| {
            compiler
                .compile(item)
                .map_err(|source| EngineError::Compile { item_index, source })
        })
        .collect()
}

async fn send(
    transport: &dyn Transport,
    projection: &ResponseProjection,
    item_index: usize,
    plan: &RequestPlan,
) -> Result<Value, EngineError> {
    debug!(item_index, method = %plan.method, path = %plan.path(), "sending item");
    let body = transport
        .request(plan)
        .await
        .map_err(|source| EngineError::Transport { item_index, source })?;
    Ok(projection.apply(body))
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use serde_json::json;
    use taxonode_util::http::TransportError;

    use super::*;
    use crate::StaticCredentials;

    #[derive(Default)]
    struct EchoTransport {
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Transport for EchoTransport {
        async fn request(&self, plan: &RequestPlan) -> Result<Value, TransportError> {
            self.calls.lock().expect("lock").push(plan.path());
            Ok(json!([{ "path": plan.path() }]))
        }
    }

    fn executor(transport: Arc<EchoTransport>) -> Executor {
        let registry = SchemaRegistry::from_embedded().expect("embedded catalogs");
        Executor::new(registry, transport, Arc::new(StaticCredentials::new()))
    }

    #[tokio::test]
    async fn unknown_node_and_operation_are_reported_before_any_call() {
        let transport = Arc::new(EchoTransport::default());
        let executor = executor(transport.clone());

        let error = executor.execute("itis", "species", "get", &[Map::new()]).await.unwrap_err();
        assert!(matches!(error, EngineError::UnknownNode(ref name) if name == "itis"));

        let error = executor
            .execute("gbif", "species", "delete", &[Map::new()])
            .await
            .unwrap_err();
        assert!(matches!(error, EngineError::UnknownResourceOperation { ref operation, .. } if operation == "delete"));
        assert!(transport.calls.lock().expect("lock").is_empty());
    }

    #[tokio::test]
    async fn projection_is_applied_per_item() {
        let transport = Arc::new(EchoTransport::default());
        let executor = executor(transport.clone());
        let items = vec![
            json!({ "name": "Puma concolor" }).as_object().cloned().expect("object"),
        ];
        let outputs = executor.execute("gbif", "parser", "name", &items).await.expect("execute");
        assert_eq!(outputs, vec![json!({ "path": "/parser/name" })]);
    }

    #[tokio::test]
    async fn missing_required_credential_fails_fast() {
        let transport = Arc::new(EchoTransport::default());
        let executor = executor(transport.clone());
        let error = executor
            .execute("taxonworks", "otu", "get", &[Map::new()])
            .await
            .unwrap_err();
        assert!(matches!(error, EngineError::MissingCredential { ref name, .. } if name == "project_token"));
        assert!(transport.calls.lock().expect("lock").is_empty());
    }

    #[test]
    fn plan_compiles_without_sending() {
        let transport = Arc::new(EchoTransport::default());
        let executor = executor(transport.clone());
        let items = vec![Map::new(), json!({ "key": "5" }).as_object().cloned().expect("object")];
        let plans = executor.plan("gbif", "species", "get", &items).expect("plans");
        assert_eq!(plans[0].path(), "/species");
        assert_eq!(plans[1].path(), "/species/5");
        assert!(transport.calls.lock().expect("lock").is_empty());
    }
}
