// Notes tools

use super::{
    action_output, check_app_access, field_text, parse_input, parse_records, query_output,
    run_action,
};
use crate::applescript::{self, Record, ScriptRunner, quote};
use crate::tools::{ActionResult, Result, ToolDefinition, ToolError, ToolOutput, ToolSet};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

/// A note as returned by search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub title: String,
    pub content: String,
}

#[derive(Debug, Deserialize)]
struct CreateNoteInput {
    title: String,
    content: String,
    folder: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchNotesInput {
    query: String,
}

pub struct NotesApp {
    runner: Arc<dyn ScriptRunner>,
    default_folder: String,
}

impl NotesApp {
    pub fn new(runner: Arc<dyn ScriptRunner>, default_folder: impl Into<String>) -> Self {
        Self {
            runner,
            default_folder: default_folder.into(),
        }
    }

    /// Notes whose title or body contains `query`
    pub async fn search(&self, query: &str) -> applescript::Result<Vec<Note>> {
        let script = format!(
            r#"tell application "Notes"
    set matchingNotes to {{}}
    repeat with n in every note
        if (body of n contains {query}) or (name of n contains {query}) then
            set noteData to {{name:name of n, body:body of n}}
            copy noteData to end of matchingNotes
        end if
    end repeat
    return matchingNotes
end tell"#,
            query = quote(query)
        );
        let reply = self.runner.run(&script).await?;

        Ok(parse_records(&reply)
            .iter()
            .map(|record| Note {
                title: field_text(record, "name").unwrap_or_default(),
                content: field_text(record, "body").unwrap_or_default(),
            })
            .collect())
    }

    /// Every note with its folder and timestamps
    pub async fn list(&self) -> applescript::Result<Vec<Record>> {
        let script = r#"tell application "Notes"
    set allNotes to {}
    repeat with n in every note
        set end of allNotes to {title:name of n, content:body of n, folder:name of container of n, creation_date:creation date of n, modification_date:modification date of n}
    end repeat
    return allNotes
end tell"#;
        let reply = self.runner.run(script).await?;
        Ok(parse_records(&reply))
    }

    /// Create a note, making the iCloud folder first if needed
    pub async fn create(&self, title: &str, body: &str, folder: Option<&str>) -> ActionResult {
        let folder = folder
            .filter(|f| !f.trim().is_empty())
            .unwrap_or(&self.default_folder);

        let script = format!(
            r#"tell application "Notes"
    tell account "iCloud"
        if not (exists folder {folder}) then
            make new folder with properties {{name:{folder}}}
        end if
        tell folder {folder}
            make new note with properties {{name:{title}, body:{body}}}
            return "SUCCESS:Created note in folder " & {folder}
        end tell
    end tell
end tell"#,
            folder = quote(folder),
            title = quote(title),
            body = quote(body)
        );

        run_action(self.runner.as_ref(), "create_note", &script)
            .await
            .with_details(json!({ "title": title, "content": body, "folder": folder }))
    }
}

#[async_trait]
impl ToolSet for NotesApp {
    fn app_name(&self) -> &'static str {
        "Notes"
    }

    fn definitions(&self) -> Vec<ToolDefinition> {
        vec![
            ToolDefinition::new(
                "create_note",
                "Create a new note in Apple Notes.",
                json!({
                    "type": "object",
                    "properties": {
                        "title": { "type": "string" },
                        "content": { "type": "string" },
                        "folder": { "type": "string", "description": "Folder name (default: Claude)" }
                    },
                    "required": ["title", "content"]
                }),
            ),
            ToolDefinition::new(
                "search_notes",
                "Search for notes containing the given text.",
                json!({
                    "type": "object",
                    "properties": {
                        "query": { "type": "string" }
                    },
                    "required": ["query"]
                }),
            ),
            ToolDefinition::new(
                "list_notes",
                "List every note with its folder and timestamps.",
                json!({ "type": "object", "properties": {} }),
            ),
        ]
    }

    async fn call(&self, tool: &str, input: serde_json::Value) -> Result<ToolOutput> {
        match tool {
            "create_note" => {
                let CreateNoteInput {
                    title,
                    content,
                    folder,
                } = parse_input(tool, input)?;
                action_output(&self.create(&title, &content, folder.as_deref()).await)
            }
            "search_notes" => {
                let SearchNotesInput { query } = parse_input(tool, input)?;
                query_output(tool, self.search(&query).await)
            }
            "list_notes" => query_output(tool, self.list().await),
            _ => Err(ToolError::UnknownTool(tool.to_string())),
        }
    }

    async fn check_access(&self) -> bool {
        check_app_access(self.runner.as_ref(), self.app_name()).await
    }
}
