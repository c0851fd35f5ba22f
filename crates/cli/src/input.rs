use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Args;
use serde_json::{Map, Value};

/// Item values supplied on the command line.
#[derive(Debug, Args)]
pub struct ItemInput {
    /// Parameter value applied to every item, as KEY=VALUE (repeatable).
    /// VALUE is kept as text unless it is a JSON array or object.
    #[arg(long = "set", value_name = "KEY=VALUE", value_parser = parse_assignment)]
    pub set: Vec<(String, Value)>,

    /// JSON file holding an array of item objects
    #[arg(long, value_name = "FILE")]
    pub items: Option<PathBuf>,
}

impl ItemInput {
    /// Builds the item list. `--set` values are shared by every item and
    /// overridden by values from the items file.
    pub fn items(&self) -> Result<Vec<Map<String, Value>>> {
        let shared: Map<String, Value> = self.set.iter().cloned().collect();
        let Some(path) = &self.items else {
            return Ok(vec![shared]);
        };

        let content = std::fs::read_to_string(path).with_context(|| format!("could not read {}", path.display()))?;
        let parsed: Vec<Value> =
            serde_json::from_str(&content).with_context(|| format!("{} must hold a JSON array", path.display()))?;
        parsed
            .into_iter()
            .enumerate()
            .map(|(index, value)| match value {
                Value::Object(values) => {
                    let mut item = shared.clone();
                    item.extend(values);
                    Ok(item)
                }
                other => bail!("item {index} in {} is not an object: {other}", path.display()),
            })
            .collect()
    }
}

fn parse_assignment(raw: &str) -> Result<(String, Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{raw}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing key in '{raw}'"));
    }
    let structured = value.trim_start().starts_with(['[', '{']);
    let value = structured
        .then(|| serde_json::from_str(value).ok())
        .flatten()
        .unwrap_or_else(|| Value::String(value.to_string()));
    Ok((key.to_string(), value))
}
