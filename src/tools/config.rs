// Tool layer configuration

use std::path::PathBuf;

/// Tool layer configuration
#[derive(Debug, Clone)]
pub struct ToolsConfig {
    /// Path to the tools.toml description overrides
    pub tools_toml_path: PathBuf,
    /// Notes folder used when none is given
    pub default_note_folder: String,
    /// Reminders list used when none is given
    pub default_reminder_list: String,
    /// Calendar used for new events when none is given
    pub default_calendar: String,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            tools_toml_path: PathBuf::from("tools.toml"),
            default_note_folder: "Claude".to_string(),
            default_reminder_list: "Reminders".to_string(),
            default_calendar: "Calendar".to_string(),
        }
    }
}

impl ToolsConfig {
    /// Load from environment variables
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let mut config = ToolsConfig::default();

        if let Some(path) = env_string("APPLE_BRIDGE_TOOLS_TOML") {
            config.tools_toml_path = PathBuf::from(path);
        }
        if let Some(folder) = env_string("APPLE_NOTES_FOLDER") {
            config.default_note_folder = folder;
        }
        if let Some(list) = env_string("APPLE_REMINDERS_LIST") {
            config.default_reminder_list = list;
        }
        if let Some(calendar) = env_string("APPLE_CALENDAR_NAME") {
            config.default_calendar = calendar;
        }

        config
    }
}

fn env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}
