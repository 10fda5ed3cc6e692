// Reminders tools

use super::{
    action_output, check_app_access, date_literal, input_datetime, parse_input, parse_records,
    query_output, run_action,
};
use crate::applescript::{self, AppleScriptError, Record, ScriptRunner, quote};
use crate::tools::{ActionResult, Result, ToolDefinition, ToolError, ToolOutput, ToolSet};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
struct CreateReminderInput {
    title: String,
    notes: Option<String>,
    due_date: Option<String>,
    list_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct QueryInput {
    query: String,
}

pub struct RemindersApp {
    runner: Arc<dyn ScriptRunner>,
    default_list: String,
}

impl RemindersApp {
    pub fn new(runner: Arc<dyn ScriptRunner>, default_list: impl Into<String>) -> Self {
        Self {
            runner,
            default_list: default_list.into(),
        }
    }

    /// Create a reminder in a list (the default list when `None`)
    pub async fn create(
        &self,
        title: &str,
        list_name: Option<&str>,
        notes: Option<&str>,
        due: Option<&NaiveDateTime>,
    ) -> ActionResult {
        let mut properties = vec![format!("name:{}", quote(title))];
        if let Some(notes) = notes.filter(|n| !n.is_empty()) {
            properties.push(format!("body:{}", quote(notes)));
        }
        if let Some(due) = due {
            properties.push(format!("due date:{}", date_literal(due)));
        }
        let list = list_name
            .filter(|l| !l.trim().is_empty())
            .unwrap_or(&self.default_list);

        let script = format!(
            r#"tell application "Reminders"
    try
        tell list {list}
            make new reminder with properties {{{properties}}}
            return "SUCCESS:Reminder created in list " & {list}
        end tell
    on error errMsg
        return "ERROR:" & errMsg
    end try
end tell"#,
            list = quote(list),
            properties = properties.join(", ")
        );

        run_action(self.runner.as_ref(), "create_reminder", &script)
            .await
            .with_details(json!({ "title": title, "list": list }))
    }

    /// Reminders whose name or body contains `query`
    pub async fn search(&self, query: &str) -> applescript::Result<Vec<Record>> {
        let script = format!(
            r#"tell application "Reminders"
    try
        set matchingReminders to {{}}
        repeat with r in every reminder
            if name of r contains {query} or (body of r is not missing value and body of r contains {query}) then
                set reminderData to {{name:name of r, notes:body of r, due_date:due date of r, completed:completed of r, list:name of container of r}}
                copy reminderData to end of matchingReminders
            end if
        end repeat
        return matchingReminders
    on error errMsg
        return "ERROR:" & errMsg
    end try
end tell"#,
            query = quote(query)
        );
        let reply = self.runner.run(&script).await?;

        // The script traps its own errors; surface them as a failed run.
        if let Some(message) = reply.strip_prefix("ERROR:") {
            return Err(AppleScriptError::ExecutionFailed {
                code: 0,
                stderr: message.trim().to_string(),
            });
        }
        Ok(parse_records(&reply))
    }

    /// All reminder lists with their reminder counts
    pub async fn lists(&self) -> applescript::Result<Vec<Record>> {
        let script = r#"tell application "Reminders"
    set allLists to {}
    repeat with l in every list
        set end of allLists to {name:name of l, id:id of l, color:color of l, reminder_count:count of (reminders in l)}
    end repeat
    return allLists
end tell"#;
        let reply = self.runner.run(script).await?;
        Ok(parse_records(&reply))
    }

    /// Show the first reminder whose name contains `query`
    pub async fn open(&self, query: &str) -> ActionResult {
        let script = format!(
            r#"tell application "Reminders"
    set foundReminder to missing value
    repeat with r in every reminder
        if name of r contains {query} then
            set foundReminder to r
            exit repeat
        end if
    end repeat
    if foundReminder is not missing value then
        show foundReminder
        return "SUCCESS:Opened reminder: " & name of foundReminder
    else
        return "ERROR:No reminder found matching " & {query}
    end if
end tell"#,
            query = quote(query)
        );
        run_action(self.runner.as_ref(), "open_reminder", &script).await
    }
}

#[async_trait]
impl ToolSet for RemindersApp {
    fn app_name(&self) -> &'static str {
        "Reminders"
    }

    fn definitions(&self) -> Vec<ToolDefinition> {
        vec![
            ToolDefinition::new(
                "create_reminder",
                "Create a new reminder.",
                json!({
                    "type": "object",
                    "properties": {
                        "title": { "type": "string" },
                        "notes": { "type": "string" },
                        "due_date": { "type": "string", "description": "Due date (YYYY-MM-DD or YYYY-MM-DD HH:MM:SS)" },
                        "list_name": { "type": "string", "description": "Reminders list (default: Reminders)" }
                    },
                    "required": ["title"]
                }),
            ),
            ToolDefinition::new(
                "search_reminders",
                "Search for reminders containing the given text.",
                json!({
                    "type": "object",
                    "properties": {
                        "query": { "type": "string" }
                    },
                    "required": ["query"]
                }),
            ),
            ToolDefinition::new(
                "list_reminder_lists",
                "List all reminder lists.",
                json!({ "type": "object", "properties": {} }),
            ),
            ToolDefinition::new(
                "open_reminder",
                "Open the first reminder whose name contains the given text.",
                json!({
                    "type": "object",
                    "properties": {
                        "query": { "type": "string" }
                    },
                    "required": ["query"]
                }),
            ),
        ]
    }

    async fn call(&self, tool: &str, input: serde_json::Value) -> Result<ToolOutput> {
        match tool {
            "create_reminder" => {
                let CreateReminderInput {
                    title,
                    notes,
                    due_date,
                    list_name,
                } = parse_input(tool, input)?;
                let due = due_date
                    .as_deref()
                    .map(|d| input_datetime(tool, "due_date", d))
                    .transpose()?;
                let result = self
                    .create(&title, list_name.as_deref(), notes.as_deref(), due.as_ref())
                    .await;
                action_output(&result)
            }
            "search_reminders" => {
                let QueryInput { query } = parse_input(tool, input)?;
                query_output(tool, self.search(&query).await)
            }
            "list_reminder_lists" => query_output(tool, self.lists().await),
            "open_reminder" => {
                let QueryInput { query } = parse_input(tool, input)?;
                action_output(&self.open(&query).await)
            }
            _ => Err(ToolError::UnknownTool(tool.to_string())),
        }
    }

    async fn check_access(&self) -> bool {
        check_app_access(self.runner.as_ref(), self.app_name()).await
    }
}
