// Messages tools

use super::{
    action_output, check_app_access, date_literal, input_datetime, parse_input, parse_records,
    query_output, run_action,
};
use crate::applescript::{self, Record, ScriptRunner, quote};
use crate::tools::{ActionResult, Result, ToolDefinition, ToolError, ToolOutput, ToolSet};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

fn default_limit() -> u32 {
    10
}

#[derive(Debug, Deserialize)]
struct SendMessageInput {
    to: String,
    content: String,
    scheduled_time: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ReadMessagesInput {
    phone_number: String,
    #[serde(default = "default_limit")]
    limit: u32,
}

#[derive(Debug, Deserialize)]
struct UnreadMessagesInput {
    #[serde(default = "default_limit")]
    limit: u32,
}

/// Script prefix resolving the iMessage buddy for a number
fn buddy_prelude(phone_number: &str) -> String {
    format!(
        r#"    set targetService to 1st service whose service type = iMessage
    set targetBuddy to buddy {phone} of targetService"#,
        phone = quote(phone_number)
    )
}

pub struct MessagesApp {
    runner: Arc<dyn ScriptRunner>,
}

impl MessagesApp {
    pub fn new(runner: Arc<dyn ScriptRunner>) -> Self {
        Self { runner }
    }

    /// Send an iMessage now
    pub async fn send(&self, phone_number: &str, message: &str) -> ActionResult {
        let script = format!(
            r#"tell application "Messages"
{prelude}
    send {message} to targetBuddy
    return "SUCCESS:Message sent"
end tell"#,
            prelude = buddy_prelude(phone_number),
            message = quote(message)
        );
        run_action(self.runner.as_ref(), "send_message", &script)
            .await
            .with_details(json!({ "to": phone_number, "content": message }))
    }

    /// Send an iMessage at a later time
    pub async fn schedule(&self, phone_number: &str, message: &str, at: &NaiveDateTime) -> ActionResult {
        let script = format!(
            r#"tell application "Messages"
{prelude}
    set scheduledTime to {at}
    send {message} to targetBuddy at scheduledTime
    return "SUCCESS:Message scheduled"
end tell"#,
            prelude = buddy_prelude(phone_number),
            at = date_literal(at),
            message = quote(message)
        );
        run_action(self.runner.as_ref(), "send_message", &script)
            .await
            .with_details(json!({
                "to": phone_number,
                "content": message,
                "scheduled_time": at.format("%Y-%m-%d %H:%M:%S").to_string()
            }))
    }

    /// Most recent messages exchanged with a number
    pub async fn read(&self, phone_number: &str, limit: u32) -> applescript::Result<Vec<Record>> {
        let script = format!(
            r#"tell application "Messages"
{prelude}
    set msgs to {{}}
    set convMessages to messages of chat targetBuddy
    repeat with i from 1 to {limit}
        if i > (count of convMessages) then exit repeat
        set m to item i of convMessages
        set end of msgs to {{content:text of m, sender:sender of m, date:date sent of m, is_from_me:(sender of m = me)}}
    end repeat
    return msgs
end tell"#,
            prelude = buddy_prelude(phone_number),
            limit = limit
        );
        let reply = self.runner.run(&script).await?;
        Ok(parse_records(&reply))
    }

    /// Unread messages across all chats
    pub async fn unread(&self, limit: u32) -> applescript::Result<Vec<Record>> {
        let script = format!(
            r#"tell application "Messages"
    set unreadMsgs to {{}}
    repeat with c in every chat
        if unread count of c > 0 then
            set msgs to messages of c
            repeat with i from 1 to {limit}
                if i > (count of msgs) then exit repeat
                set m to item i of msgs
                if read status of m is false then
                    set end of unreadMsgs to {{content:text of m, sender:sender of m, date:date sent of m, is_from_me:(sender of m = me)}}
                end if
            end repeat
        end if
    end repeat
    return unreadMsgs
end tell"#,
            limit = limit
        );
        let reply = self.runner.run(&script).await?;
        Ok(parse_records(&reply))
    }
}

#[async_trait]
impl ToolSet for MessagesApp {
    fn app_name(&self) -> &'static str {
        "Messages"
    }

    fn definitions(&self) -> Vec<ToolDefinition> {
        vec![
            ToolDefinition::new(
                "send_message",
                "Send an iMessage, optionally scheduled for a later time.",
                json!({
                    "type": "object",
                    "properties": {
                        "to": { "type": "string", "description": "Recipient phone number or iMessage address" },
                        "content": { "type": "string" },
                        "scheduled_time": { "type": "string", "description": "When to send (YYYY-MM-DD HH:MM:SS)" }
                    },
                    "required": ["to", "content"]
                }),
            ),
            ToolDefinition::new(
                "read_messages",
                "Read recent messages from a specific contact.",
                json!({
                    "type": "object",
                    "properties": {
                        "phone_number": { "type": "string" },
                        "limit": { "type": "integer", "default": 10 }
                    },
                    "required": ["phone_number"]
                }),
            ),
            ToolDefinition::new(
                "get_unread_messages",
                "Get unread messages across all conversations.",
                json!({
                    "type": "object",
                    "properties": {
                        "limit": { "type": "integer", "default": 10 }
                    }
                }),
            ),
        ]
    }

    async fn call(&self, tool: &str, input: serde_json::Value) -> Result<ToolOutput> {
        match tool {
            "send_message" => {
                let SendMessageInput {
                    to,
                    content,
                    scheduled_time,
                } = parse_input(tool, input)?;
                let result = match scheduled_time {
                    Some(when) => {
                        let at = input_datetime(tool, "scheduled_time", &when)?;
                        self.schedule(&to, &content, &at).await
                    }
                    None => self.send(&to, &content).await,
                };
                action_output(&result)
            }
            "read_messages" => {
                let ReadMessagesInput {
                    phone_number,
                    limit,
                } = parse_input(tool, input)?;
                query_output(tool, self.read(&phone_number, limit).await)
            }
            "get_unread_messages" => {
                let UnreadMessagesInput { limit } = parse_input(tool, input)?;
                query_output(tool, self.unread(limit).await)
            }
            _ => Err(ToolError::UnknownTool(tool.to_string())),
        }
    }

    async fn check_access(&self) -> bool {
        check_app_access(self.runner.as_ref(), self.app_name()).await
    }
}
