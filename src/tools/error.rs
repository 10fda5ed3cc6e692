// Error types for the tool layer
#![allow(dead_code)]

use crate::applescript::AppleScriptError;
use thiserror::Error;

/// Tool error types
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Invalid input for tool '{0}': {1}")]
    InvalidInput(String, String),

    #[error("Script error: {0}")]
    Script(#[from] AppleScriptError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

impl ToolError {
    pub fn invalid(tool: &str, reason: impl Into<String>) -> Self {
        ToolError::InvalidInput(tool.to_string(), reason.into())
    }
}

pub type Result<T> = std::result::Result<T, ToolError>;
