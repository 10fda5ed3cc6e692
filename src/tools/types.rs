// Data types for the tool layer
#![allow(dead_code)]

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Tool definition (name, description, JSON schema of its input)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    #[serde(rename = "input_schema")]
    pub input_schema: Value,
}

impl ToolDefinition {
    pub fn new(name: &str, description: &str, input_schema: Value) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            input_schema,
        }
    }
}

/// Output from a tool call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolOutput {
    /// JSON-rendered result, or the failure text
    pub content: String,
    /// Whether the call failed
    #[serde(default)]
    pub is_error: bool,
}

impl ToolOutput {
    pub fn success(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_error: false,
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_error: true,
        }
    }

    /// Render a serializable result as pretty JSON.
    pub fn json(value: &impl Serialize) -> serde_json::Result<Self> {
        Ok(Self::success(serde_json::to_string_pretty(value)?))
    }

    /// Parse the content back into JSON.
    pub fn value(&self) -> serde_json::Result<Value> {
        serde_json::from_str(&self.content)
    }
}

/// Outcome of a side-effecting action (send, create, open).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionResult {
    pub success: bool,
    pub message: String,
    /// What the action worked on, present only on success
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl ActionResult {
    /// Read a `SUCCESS:`/`ERROR:` answer from a script.
    pub fn from_reply(reply: &str) -> Self {
        Self {
            success: reply.starts_with("SUCCESS:"),
            message: reply.replace("SUCCESS:", "").replace("ERROR:", "").trim().to_string(),
            details: None,
        }
    }

    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            details: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            details: None,
        }
    }

    /// Attach details when the action succeeded.
    pub fn with_details(mut self, details: Value) -> Self {
        if self.success {
            self.details = Some(details);
        }
        self
    }
}
