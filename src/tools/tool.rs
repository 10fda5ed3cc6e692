// ToolSet trait and tool description overrides

use crate::tools::{Result, ToolDefinition, ToolOutput};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

/// The tools one application exposes.
#[async_trait]
pub trait ToolSet: Send + Sync {
    /// Application the tools drive, e.g. "Notes"
    fn app_name(&self) -> &'static str;

    /// Definitions of every tool in the set
    fn definitions(&self) -> Vec<ToolDefinition>;

    /// Run one tool of the set with JSON input
    async fn call(&self, tool: &str, input: serde_json::Value) -> Result<ToolOutput>;

    /// Whether the application answers Apple Events
    async fn check_access(&self) -> bool;

    /// Names of the tools in the set
    fn tool_names(&self) -> Vec<String> {
        self.definitions().into_iter().map(|d| d.name).collect()
    }
}

#[derive(Debug, Deserialize)]
struct ToolEntry {
    description: Option<String>,
}

/// Load tool descriptions from a TOML file of `[tool_name] description = "..."` tables
pub fn load_tool_descriptions(path: &Path) -> Result<HashMap<String, String>> {
    if !path.exists() {
        debug!(path = %path.display(), "tools.toml not found, using default descriptions");
        return Ok(HashMap::new());
    }

    let content = std::fs::read_to_string(path)?;
    let entries: HashMap<String, ToolEntry> = toml::from_str(&content)?;

    let descriptions: HashMap<String, String> = entries
        .into_iter()
        .filter_map(|(name, entry)| entry.description.map(|d| (name, d)))
        .collect();

    debug!(path = %path.display(), tool_count = descriptions.len(), "loaded tool descriptions from config");
    Ok(descriptions)
}
