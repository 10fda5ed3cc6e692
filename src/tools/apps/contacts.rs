// Contacts tools

use super::{check_app_access, field_text, parse_input, parse_records, parse_strings, query_output};
use crate::applescript::{self, ParsedValue, ScriptRunner, quote};
use crate::tools::{Result, ToolDefinition, ToolError, ToolOutput, ToolSet};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

/// A contact and its phone numbers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub name: String,
    pub phones: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct FindContactInput {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FindByPhoneInput {
    phone_number: String,
}

pub struct ContactsApp {
    runner: Arc<dyn ScriptRunner>,
}

impl ContactsApp {
    pub fn new(runner: Arc<dyn ScriptRunner>) -> Self {
        Self { runner }
    }

    /// Phone numbers of every contact whose name contains `name`
    pub async fn find_numbers(&self, name: &str) -> applescript::Result<Vec<String>> {
        let script = format!(
            r#"tell application "Contacts"
    set matchingPeople to (every person whose name contains {name})
    set phoneNumbers to {{}}
    repeat with p in matchingPeople
        repeat with ph in phones of p
            copy value of ph to end of phoneNumbers
        end repeat
    end repeat
    return phoneNumbers
end tell"#,
            name = quote(name)
        );
        let reply = self.runner.run(&script).await?;
        Ok(parse_strings(&reply))
    }

    /// Every contact that has at least one phone number
    pub async fn all_contacts(&self) -> applescript::Result<Vec<Contact>> {
        let script = r#"tell application "Contacts"
    set allContacts to {}
    repeat with p in every person
        set phoneValues to {}
        repeat with ph in phones of p
            copy value of ph to end of phoneValues
        end repeat
        if length of phoneValues is greater than 0 then
            set end of allContacts to {name:name of p, phones:phoneValues}
        end if
    end repeat
    return allContacts
end tell"#;
        let reply = self.runner.run(script).await?;

        Ok(parse_records(&reply)
            .into_iter()
            .filter_map(|record| {
                let name = field_text(&record, "name")?;
                let phones = match record.get("phones") {
                    Some(ParsedValue::List(items)) => {
                        items.iter().filter_map(ParsedValue::to_text).collect()
                    }
                    Some(ParsedValue::String(raw)) => parse_strings(raw),
                    _ => Vec::new(),
                };
                Some(Contact { name, phones })
            })
            .collect())
    }

    /// Name of the first contact with a number containing `phone_number`
    pub async fn find_by_phone(&self, phone_number: &str) -> applescript::Result<Option<String>> {
        let script = format!(
            r#"tell application "Contacts"
    set foundName to missing value
    repeat with p in every person
        repeat with ph in phones of p
            if value of ph contains {phone} then
                set foundName to name of p
                exit repeat
            end if
        end repeat
        if foundName is not missing value then
            exit repeat
        end if
    end repeat
    return foundName
end tell"#,
            phone = quote(phone_number)
        );
        let reply = self.runner.run(&script).await?;

        if reply.is_empty() || reply.eq_ignore_ascii_case(applescript::MISSING_VALUE) {
            return Ok(None);
        }
        Ok(Some(reply))
    }
}

#[async_trait]
impl ToolSet for ContactsApp {
    fn app_name(&self) -> &'static str {
        "Contacts"
    }

    fn definitions(&self) -> Vec<ToolDefinition> {
        vec![
            ToolDefinition::new(
                "find_contact",
                "Search for contacts by name. If no name is provided, returns all contacts with phone numbers.",
                json!({
                    "type": "object",
                    "properties": {
                        "name": { "type": "string", "description": "Part of the contact's name" }
                    }
                }),
            ),
            ToolDefinition::new(
                "find_contact_by_phone",
                "Find the name of the contact owning a phone number.",
                json!({
                    "type": "object",
                    "properties": {
                        "phone_number": { "type": "string", "description": "Phone number or a fragment of it" }
                    },
                    "required": ["phone_number"]
                }),
            ),
        ]
    }

    async fn call(&self, tool: &str, input: serde_json::Value) -> Result<ToolOutput> {
        match tool {
            "find_contact" => {
                let FindContactInput { name } = parse_input(tool, input)?;
                let result = match name.filter(|n| !n.trim().is_empty()) {
                    Some(name) => self
                        .find_numbers(&name)
                        .await
                        .map(|phones| {
                            vec![Contact {
                                name: name.clone(),
                                phones,
                            }]
                        }),
                    None => self.all_contacts().await,
                };
                query_output(tool, result)
            }
            "find_contact_by_phone" => {
                let FindByPhoneInput { phone_number } = parse_input(tool, input)?;
                let result = self
                    .find_by_phone(&phone_number)
                    .await
                    .map(|name| json!({ "phone_number": phone_number, "name": name }));
                query_output(tool, result)
            }
            _ => Err(ToolError::UnknownTool(tool.to_string())),
        }
    }

    async fn check_access(&self) -> bool {
        check_app_access(self.runner.as_ref(), self.app_name()).await
    }
}
