// Tool registry
#![allow(dead_code)]

use crate::applescript::ScriptRunner;
use crate::telemetry;
use crate::tools::apps::{
    CalendarApp, ContactsApp, MailApp, MapsApp, MessagesApp, NotesApp, RemindersApp,
};
use crate::tools::config::ToolsConfig;
use crate::tools::error::{Result, ToolError};
use crate::tools::tool::{ToolSet, load_tool_descriptions};
use crate::tools::types::{ToolDefinition, ToolOutput};
use futures::future::join_all;
use indexmap::IndexMap;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Every application tool set, addressable by tool name
pub struct Toolbox {
    config: ToolsConfig,
    sets: Vec<Arc<dyn ToolSet>>,
    /// Tool name -> index into `sets`, in registration order
    index: IndexMap<String, usize>,
    descriptions: HashMap<String, String>,
}

impl Toolbox {
    /// Register all seven application tool sets on one runner
    pub fn init(config: ToolsConfig, runner: Arc<dyn ScriptRunner>) -> Self {
        debug!(
            tools_toml = %config.tools_toml_path.display(),
            notes_folder = %config.default_note_folder,
            reminders_list = %config.default_reminder_list,
            calendar = %config.default_calendar,
            "initializing toolbox"
        );

        let sets: Vec<Arc<dyn ToolSet>> = vec![
            Arc::new(ContactsApp::new(runner.clone())),
            Arc::new(NotesApp::new(runner.clone(), config.default_note_folder.clone())),
            Arc::new(MessagesApp::new(runner.clone())),
            Arc::new(MailApp::new(runner.clone())),
            Arc::new(RemindersApp::new(runner.clone(), config.default_reminder_list.clone())),
            Arc::new(CalendarApp::new(runner.clone(), config.default_calendar.clone())),
            Arc::new(MapsApp::new(runner)),
        ];

        let descriptions = load_tool_descriptions(&config.tools_toml_path).unwrap_or_else(|e| {
            warn!(error = %e, "ignoring invalid tool descriptions");
            HashMap::new()
        });

        let mut index = IndexMap::new();
        for (position, set) in sets.iter().enumerate() {
            for name in set.tool_names() {
                if index.insert(name.clone(), position).is_some() {
                    warn!(tool_name = %name, app = set.app_name(), "duplicate tool name");
                }
            }
        }

        info!(
            app_count = sets.len(),
            tool_count = index.len(),
            "toolbox initialized with tools"
        );

        Self {
            config,
            sets,
            index,
            descriptions,
        }
    }

    pub fn config(&self) -> &ToolsConfig {
        &self.config
    }

    /// Names of all registered tools, in registration order
    pub fn tool_names(&self) -> Vec<&str> {
        self.index.keys().map(String::as_str).collect()
    }

    pub fn contains(&self, tool_name: &str) -> bool {
        self.index.contains_key(tool_name)
    }

    /// Definitions of all tools, with description overrides applied
    pub fn tool_definitions(&self) -> Vec<ToolDefinition> {
        self.sets
            .iter()
            .flat_map(|set| set.definitions())
            .map(|mut definition| {
                if let Some(description) = self.descriptions.get(&definition.name) {
                    definition.description = description.clone();
                }
                definition
            })
            .collect()
    }

    /// Execute a tool by name with JSON input
    pub async fn execute(&self, tool_name: &str, input: serde_json::Value) -> Result<ToolOutput> {
        debug!(tool_name = %tool_name, "looking up tool");

        let set = self
            .index
            .get(tool_name)
            .and_then(|&position| self.sets.get(position))
            .ok_or_else(|| ToolError::UnknownTool(tool_name.to_string()))?;

        info!(tool_name = %tool_name, app = set.app_name(), "executing tool");
        telemetry::timed_async(tool_name, &input, set.call(tool_name, input.clone())).await
    }

    /// Probe every application concurrently
    pub async fn check_access(&self) -> Vec<(&'static str, bool)> {
        let probes = self.sets.iter().map(|set| async move {
            let granted = set.check_access().await;
            (set.app_name(), granted)
        });
        join_all(probes).await
    }
}
