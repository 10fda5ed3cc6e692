// Error types for the AppleScript interop layer

use std::time::Duration;
use thiserror::Error;

/// Failures raised while running a script out-of-process.
///
/// Parsing never fails: text that cannot be decoded degrades to a plain
/// string value instead of producing an error.
#[derive(Debug, Error)]
pub enum AppleScriptError {
    #[error("Failed to spawn interpreter '{0}': {1}")]
    SpawnFailed(String, String),

    #[error("AppleScript execution failed (exit code {code}): {stderr}")]
    ExecutionFailed { code: i32, stderr: String },

    #[error("AppleScript execution timed out after {0:?}")]
    Timeout(Duration),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppleScriptError {
    /// Whether the interpreter was killed at the timeout boundary.
    pub fn is_timeout(&self) -> bool {
        matches!(self, AppleScriptError::Timeout(_))
    }
}

pub type Result<T> = std::result::Result<T, AppleScriptError>;
