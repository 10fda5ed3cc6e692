// Script executor configuration

use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

/// Parse an environment variable, logging a warning if the value is present but invalid.
pub(crate) fn parse_env_var<T: std::str::FromStr>(name: &str, default: T) -> T {
    match std::env::var(name) {
        Ok(v) => match v.parse() {
            Ok(parsed) => parsed,
            Err(_) => {
                warn!(var = name, value = %v, "Invalid env var value, using default");
                default
            }
        },
        Err(_) => default,
    }
}

/// Script executor configuration
#[derive(Debug, Clone)]
pub struct ScriptConfig {
    /// Interpreter binary
    pub interpreter: PathBuf,
    /// Flag preceding the script argument; `None` pipes the script through stdin
    pub script_flag: Option<String>,
    /// Default per-call timeout in seconds
    pub timeout_secs: u64,
    /// Maximum bytes captured per output stream
    pub max_output_bytes: usize,
}

impl Default for ScriptConfig {
    fn default() -> Self {
        Self {
            interpreter: PathBuf::from("/usr/bin/osascript"),
            script_flag: Some("-e".to_string()),
            timeout_secs: 30,
            max_output_bytes: 1048576, // 1MB
        }
    }
}

impl ScriptConfig {
    /// Load from environment variables
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let mut config = ScriptConfig::default();

        if let Ok(path) = std::env::var("OSASCRIPT_PATH")
            && !path.trim().is_empty()
        {
            config.interpreter = PathBuf::from(path);
        }
        config.timeout_secs = parse_env_var("APPLESCRIPT_TIMEOUT_SECS", config.timeout_secs);
        config.max_output_bytes =
            parse_env_var("APPLESCRIPT_MAX_OUTPUT_BYTES", config.max_output_bytes);

        config
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
