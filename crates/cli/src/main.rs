mod input;

use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde_json::{Value, json};
use taxonode_engine::{EnvCredentialProvider, Executor, HttpTransport};
use taxonode_registry::{SchemaRegistry, TaxonodeConfig};
use taxonode_types::{ParameterSpec, RequestPlan, ResourceOperation};
use taxonode_util::redact_sensitive;
use url::Url;

use crate::input::ItemInput;

#[derive(Debug, Parser)]
#[command(name = "taxonode", version, about = "Query biodiversity APIs through declarative node catalogs")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List nodes with their resources and operations
    Nodes,
    /// List the parameters active for an operation
    Params(Selection),
    /// Print the compiled requests without sending them
    Plan {
        #[command(flatten)]
        selection: Selection,
        #[command(flatten)]
        input: ItemInput,
    },
    /// Execute an operation and print the JSON output array
    Run {
        #[command(flatten)]
        selection: Selection,
        #[command(flatten)]
        input: ItemInput,
        /// Maximum number of requests in flight (defaults to the configured value)
        #[arg(long)]
        concurrency: Option<usize>,
    },
}

#[derive(Debug, Args)]
struct Selection {
    /// Node name, e.g. `gbif`
    node: String,
    /// Resource name, e.g. `species`
    resource: String,
    /// Operation name, e.g. `get`
    operation: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = TaxonodeConfig::load().context("could not load configuration")?;
    let registry = SchemaRegistry::from_config(&config).context("could not load node catalogs")?;

    match cli.command {
        Command::Nodes => print_nodes(&registry),
        Command::Params(selection) => print_params(&registry, &selection),
        Command::Plan { selection, input } => {
            let items = input.items()?;
            let executor = build_executor(registry, &config)?;
            let plans = executor.plan(&selection.node, &selection.resource, &selection.operation, &items)?;
            let rendered = plans.iter().map(render_plan).collect::<Result<Vec<_>>>()?;
            println!("{}", redact_sensitive(&serde_json::to_string_pretty(&rendered)?));
            Ok(())
        }
        Command::Run {
            selection,
            input,
            concurrency,
        } => {
            let items = input.items()?;
            let executor =
                build_executor(registry, &config)?.with_concurrency(concurrency.unwrap_or(config.concurrency));
            let outputs = executor
                .execute(&selection.node, &selection.resource, &selection.operation, &items)
                .await?;
            println!("{}", serde_json::to_string_pretty(&outputs)?);
            Ok(())
        }
    }
}

fn init_tracing() {
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn build_executor(registry: SchemaRegistry, config: &TaxonodeConfig) -> Result<Executor> {
    let transport = HttpTransport::with_timeout(Duration::from_secs(config.timeout_secs))?;
    Ok(Executor::new(registry, Arc::new(transport), Arc::new(EnvCredentialProvider)).with_concurrency(config.concurrency))
}

fn print_nodes(registry: &SchemaRegistry) -> Result<()> {
    for node in registry.nodes() {
        println!("{} ({})  {}", node.name, node.display_name.as_deref().unwrap_or(&node.name), node.base_url);
        for resource in &node.resources {
            for operation in &resource.operations {
                let selection = ResourceOperation::new(&resource.name, &operation.name);
                println!(
                    "  {:<32} {:<6} {}",
                    selection.to_string(),
                    operation.method,
                    operation.description.as_deref().unwrap_or(&operation.path)
                );
            }
        }
    }
    Ok(())
}

fn print_params(registry: &SchemaRegistry, selection: &Selection) -> Result<()> {
    let current = ResourceOperation::new(&selection.resource, &selection.operation);
    let specs = registry
        .specs_for(&selection.node, &current)
        .with_context(|| format!("node '{}' has no operation '{}'", selection.node, current))?;
    if specs.is_empty() {
        println!("{current} takes no parameters");
    }
    for spec in specs {
        print_param(spec, 0);
    }
    Ok(())
}

fn print_param(spec: &ParameterSpec, depth: usize) {
    let indent = "  ".repeat(depth);
    let mut notes = Vec::new();
    if spec.required {
        notes.push("required".to_string());
    }
    if spec.wire_name() != spec.key {
        notes.push(format!("sent as {}", spec.wire_name()));
    }
    if let Some(default) = &spec.default {
        notes.push(format!("default {default}"));
    }
    if !spec.options.is_empty() {
        notes.push(format!("{} options", spec.options.len()));
    }
    println!(
        "{indent}{:<28} {:<14} {:<6} {}",
        spec.key,
        serde_label(serde_json::to_value(spec.kind)),
        serde_label(serde_json::to_value(spec.target)),
        notes.join(", ")
    );
    for field in &spec.fields {
        print_param(field, depth + 1);
    }
}

fn serde_label(value: serde_json::Result<Value>) -> String {
    value
        .ok()
        .and_then(|value| value.as_str().map(str::to_string))
        .unwrap_or_default()
}

/// Renders a plan as `{method, url, body}` with the query string applied.
fn render_plan(plan: &RequestPlan) -> Result<Value> {
    let mut url = Url::parse(&plan.url()).with_context(|| format!("invalid request URL '{}'", plan.url()))?;
    let pairs = plan.query_pairs();
    if !pairs.is_empty() {
        url.query_pairs_mut().extend_pairs(pairs);
    }
    Ok(json!({
        "method": plan.method,
        "url": url.as_str(),
        "body": plan.body,
    }))
}
