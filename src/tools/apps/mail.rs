// Mail tools

use super::{
    action_output, check_app_access, parse_input, parse_records, parse_strings, query_output,
};
use crate::applescript::{self, Record, ScriptRunner, quote};
use crate::tools::{ActionResult, Result, ToolDefinition, ToolError, ToolOutput, ToolSet};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::error;

fn default_limit() -> u32 {
    10
}

#[derive(Debug, Deserialize)]
struct SendEmailInput {
    to: String,
    subject: String,
    body: String,
    cc: Option<String>,
    bcc: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchEmailsInput {
    query: String,
    #[serde(default = "default_limit")]
    limit: u32,
}

#[derive(Debug, Deserialize)]
struct UnreadEmailsInput {
    account: Option<String>,
    mailbox: Option<String>,
    #[serde(default = "default_limit")]
    limit: u32,
}

#[derive(Debug, Deserialize)]
struct ListMailboxesInput {
    account: Option<String>,
}

/// An outgoing email
#[derive(Debug, Clone, Default)]
pub struct Email {
    pub to: String,
    pub subject: String,
    pub body: String,
    pub cc: Option<String>,
    pub bcc: Option<String>,
}

/// Loop body collecting message fields into `results`
fn collect_messages(source: &str, limit: u32) -> String {
    format!(
        r#"    set msgs to {source}
    repeat with i from 1 to {limit}
        if i > (count of msgs) then exit repeat
        set m to item i of msgs
        set end of results to {{subject:subject of m, sender:sender of m, content:content of m, date:date received of m, mailbox:name of mailbox of m, account:name of account of mailbox of m}}
    end repeat"#
    )
}

pub struct MailApp {
    runner: Arc<dyn ScriptRunner>,
}

impl MailApp {
    pub fn new(runner: Arc<dyn ScriptRunner>) -> Self {
        Self { runner }
    }

    /// Compose and send an email
    pub async fn send(&self, email: &Email) -> ActionResult {
        let mut recipients = format!(
            "make new to recipient with properties {{address:{}}}",
            quote(&email.to)
        );
        if let Some(cc) = email.cc.as_deref().filter(|s| !s.is_empty()) {
            recipients.push_str(&format!(
                "\n        make new cc recipient with properties {{address:{}}}",
                quote(cc)
            ));
        }
        if let Some(bcc) = email.bcc.as_deref().filter(|s| !s.is_empty()) {
            recipients.push_str(&format!(
                "\n        make new bcc recipient with properties {{address:{}}}",
                quote(bcc)
            ));
        }

        let script = format!(
            r#"tell application "Mail"
    set newMessage to make new outgoing message with properties {{subject:{subject}, content:{body}, visible:true}}
    tell newMessage
        {recipients}
        send
    end tell
end tell"#,
            subject = quote(&email.subject),
            body = quote(&email.body),
            recipients = recipients
        );

        match self.runner.run(&script).await {
            Ok(_) => ActionResult::ok(format!("Email sent to {}", email.to)),
            Err(e) => {
                error!(error = %e, "sending email failed");
                ActionResult::failed(e.to_string())
            }
        }
    }

    /// Inbox messages whose subject or content contains `term`
    pub async fn search(&self, term: &str, limit: u32) -> applescript::Result<Vec<Record>> {
        let source = format!(
            "(messages of inbox whose subject contains {term} or content contains {term})",
            term = quote(term)
        );
        self.collect(&source, limit).await
    }

    /// Unread messages of the inbox, or of one account's mailbox
    pub async fn unread(
        &self,
        account: Option<&str>,
        mailbox: Option<&str>,
        limit: u32,
    ) -> applescript::Result<Vec<Record>> {
        let source = match account {
            Some(account) => {
                let container = match mailbox {
                    Some(mailbox) => format!("mailbox {}", quote(mailbox)),
                    None => "inbox".to_string(),
                };
                format!(
                    "(messages of {container} of account {account} whose read status is false)",
                    account = quote(account)
                )
            }
            None => "(messages of inbox whose read status is false)".to_string(),
        };
        self.collect(&source, limit).await
    }

    async fn collect(&self, source: &str, limit: u32) -> applescript::Result<Vec<Record>> {
        let script = format!(
            r#"tell application "Mail"
    set results to {{}}
{body}
    return results
end tell"#,
            body = collect_messages(source, limit)
        );
        let reply = self.runner.run(&script).await?;
        Ok(parse_records(&reply))
    }

    /// Names of all configured accounts
    pub async fn accounts(&self) -> applescript::Result<Vec<String>> {
        let script = r#"tell application "Mail"
    set theAccounts to {}
    repeat with a in accounts
        set end of theAccounts to name of a
    end repeat
    return theAccounts
end tell"#;
        let reply = self.runner.run(script).await?;
        Ok(parse_strings(&reply))
    }

    /// Mailbox names of one account, or of every account
    pub async fn mailboxes(&self, account: Option<&str>) -> applescript::Result<Vec<String>> {
        let script = match account {
            Some(account) => format!(
                r#"tell application "Mail"
    set theMailboxes to {{}}
    repeat with m in mailboxes of account {account}
        set end of theMailboxes to name of m
    end repeat
    return theMailboxes
end tell"#,
                account = quote(account)
            ),
            None => r#"tell application "Mail"
    set theMailboxes to {}
    repeat with a in accounts
        repeat with m in mailboxes of a
            set end of theMailboxes to name of m
        end repeat
    end repeat
    return theMailboxes
end tell"#
                .to_string(),
        };
        let reply = self.runner.run(&script).await?;
        Ok(parse_strings(&reply))
    }
}

#[async_trait]
impl ToolSet for MailApp {
    fn app_name(&self) -> &'static str {
        "Mail"
    }

    fn definitions(&self) -> Vec<ToolDefinition> {
        vec![
            ToolDefinition::new(
                "send_email",
                "Send an email using Apple Mail.",
                json!({
                    "type": "object",
                    "properties": {
                        "to": { "type": "string" },
                        "subject": { "type": "string" },
                        "body": { "type": "string" },
                        "cc": { "type": "string" },
                        "bcc": { "type": "string" }
                    },
                    "required": ["to", "subject", "body"]
                }),
            ),
            ToolDefinition::new(
                "search_emails",
                "Search inbox emails whose subject or content contains the given text.",
                json!({
                    "type": "object",
                    "properties": {
                        "query": { "type": "string" },
                        "limit": { "type": "integer", "default": 10 }
                    },
                    "required": ["query"]
                }),
            ),
            ToolDefinition::new(
                "get_unread_emails",
                "Get unread emails from the inbox, or from a mailbox of one account.",
                json!({
                    "type": "object",
                    "properties": {
                        "account": { "type": "string" },
                        "mailbox": { "type": "string", "description": "Mailbox name (requires account)" },
                        "limit": { "type": "integer", "default": 10 }
                    }
                }),
            ),
            ToolDefinition::new(
                "list_mail_accounts",
                "List the names of all Mail accounts.",
                json!({ "type": "object", "properties": {} }),
            ),
            ToolDefinition::new(
                "list_mailboxes",
                "List mailbox names, for one account or all accounts.",
                json!({
                    "type": "object",
                    "properties": {
                        "account": { "type": "string" }
                    }
                }),
            ),
        ]
    }

    async fn call(&self, tool: &str, input: serde_json::Value) -> Result<ToolOutput> {
        match tool {
            "send_email" => {
                let SendEmailInput {
                    to,
                    subject,
                    body,
                    cc,
                    bcc,
                } = parse_input(tool, input)?;
                let email = Email {
                    to,
                    subject,
                    body,
                    cc,
                    bcc,
                };
                action_output(&self.send(&email).await)
            }
            "search_emails" => {
                let SearchEmailsInput { query, limit } = parse_input(tool, input)?;
                query_output(tool, self.search(&query, limit).await)
            }
            "get_unread_emails" => {
                let UnreadEmailsInput {
                    account,
                    mailbox,
                    limit,
                } = parse_input(tool, input)?;
                if mailbox.is_some() && account.is_none() {
                    return Err(ToolError::invalid(tool, "mailbox requires an account"));
                }
                query_output(
                    tool,
                    self.unread(account.as_deref(), mailbox.as_deref(), limit).await,
                )
            }
            "list_mail_accounts" => query_output(tool, self.accounts().await),
            "list_mailboxes" => {
                let ListMailboxesInput { account } = parse_input(tool, input)?;
                query_output(tool, self.mailboxes(account.as_deref()).await)
            }
            _ => Err(ToolError::UnknownTool(tool.to_string())),
        }
    }

    async fn check_access(&self) -> bool {
        check_app_access(self.runner.as_ref(), self.app_name()).await
    }
}
