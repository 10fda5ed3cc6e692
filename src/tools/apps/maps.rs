// Maps tools
//
// Maps is driven through its UI, so every action probes access before
// scripting it.

use super::{action_output, check_app_access, parse_input, parse_records, run_action};
use crate::applescript::{Record, ScriptRunner, quote};
use crate::tools::{ActionResult, Result, ToolDefinition, ToolError, ToolOutput, ToolSet};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{error, info};

pub const ACCESS_DENIED: &str = "Cannot access Maps app. Please grant access in System Settings > Privacy & Security > Automation.";

fn default_limit() -> usize {
    5
}

#[derive(Debug, Deserialize)]
struct SearchLocationsInput {
    query: String,
    #[serde(default = "default_limit")]
    limit: usize,
}

#[derive(Debug, Deserialize)]
struct DirectionsInput {
    from_address: String,
    to_address: String,
    #[serde(default)]
    transport_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PlaceInput {
    name: String,
    address: String,
}

/// How a route is travelled
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportType {
    #[default]
    Driving,
    Walking,
    Transit,
}

impl TransportType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransportType::Driving => "driving",
            TransportType::Walking => "walking",
            TransportType::Transit => "transit",
        }
    }
}

impl fmt::Display for TransportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransportType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "driving" => Ok(TransportType::Driving),
            "walking" => Ok(TransportType::Walking),
            "transit" => Ok(TransportType::Transit),
            other => Err(format!(
                "unknown transport type '{}' (expected driving, walking or transit)",
                other
            )),
        }
    }
}

/// Result of a location search
#[derive(Debug, Clone, Serialize)]
pub struct LocationSearch {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub locations: Vec<Record>,
}

impl LocationSearch {
    fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            locations: Vec::new(),
        }
    }
}

/// Script prefix searching Maps and selecting the first hit
fn search_prelude(query: &str) -> String {
    format!(
        r#"    activate
    search {query}
    delay 1
    set foundLocation to selected location"#,
        query = quote(query)
    )
}

pub struct MapsApp {
    runner: Arc<dyn ScriptRunner>,
}

impl MapsApp {
    pub fn new(runner: Arc<dyn ScriptRunner>) -> Self {
        Self { runner }
    }

    async fn ensure_access(&self) -> bool {
        let granted = check_app_access(self.runner.as_ref(), self.app_name()).await;
        if !granted {
            error!("Maps access denied");
        }
        granted
    }

    /// Search Maps, keeping at most `limit` locations
    pub async fn search_locations(&self, query: &str, limit: usize) -> LocationSearch {
        if !self.ensure_access().await {
            return LocationSearch::failed(ACCESS_DENIED);
        }

        let script = format!(
            r#"tell application "Maps"
    try
{prelude}
        set locations to {{}}
        if foundLocation is not missing value then
            set locAddress to formatted address of foundLocation
            if locAddress is missing value then
                set locAddress to "Unknown"
            end if
            set end of locations to {{name:name of foundLocation, address:locAddress}}
        end if
        return locations
    on error errMsg
        return "ERROR:" & errMsg
    end try
end tell"#,
            prelude = search_prelude(query)
        );

        match self.runner.run(&script).await {
            Ok(reply) => {
                if let Some(message) = reply.strip_prefix("ERROR:") {
                    error!(error = message, "location search failed");
                    return LocationSearch::failed(message.trim());
                }
                let mut locations = parse_records(&reply);
                locations.truncate(limit);
                LocationSearch {
                    success: true,
                    message: None,
                    locations,
                }
            }
            Err(e) => {
                error!(error = %e, "location search failed");
                LocationSearch::failed(e.to_string())
            }
        }
    }

    /// Show directions between two addresses
    pub async fn directions(
        &self,
        from_address: &str,
        to_address: &str,
        transport: TransportType,
    ) -> ActionResult {
        if !self.ensure_access().await {
            return ActionResult::failed(ACCESS_DENIED);
        }
        info!(from = from_address, to = to_address, transport = %transport, "getting directions");

        let script = format!(
            r#"tell application "Maps"
    activate
    get directions from {from} to {to} by {transport}
    return "SUCCESS:Displaying directions from " & {from} & " to " & {to} & " by {transport_name}"
end tell"#,
            from = quote(from_address),
            to = quote(to_address),
            transport = quote(transport.as_str()),
            transport_name = transport.as_str()
        );

        run_action(self.runner.as_ref(), "get_directions", &script)
            .await
            .with_details(json!({
                "route": {
                    "from": from_address,
                    "to": to_address,
                    "transport_type": transport
                }
            }))
    }

    /// Add the location at `address` to favorites under `name`
    pub async fn save_location(&self, name: &str, address: &str) -> ActionResult {
        if !self.ensure_access().await {
            return ActionResult::failed(ACCESS_DENIED);
        }
        info!(name = name, address = address, "saving location");

        let script = format!(
            r#"tell application "Maps"
{prelude}
    if foundLocation is not missing value then
        add to favorites foundLocation with properties {{name:{name}}}
        return "SUCCESS:Added " & {name} & " to favorites"
    else
        return "ERROR:Could not find location for " & {address}
    end if
end tell"#,
            prelude = search_prelude(address),
            name = quote(name),
            address = quote(address)
        );

        run_action(self.runner.as_ref(), "save_location", &script).await
    }

    /// Locate `address` so a pin named `name` can be dropped on it
    pub async fn drop_pin(&self, name: &str, address: &str) -> ActionResult {
        if !self.ensure_access().await {
            return ActionResult::failed(ACCESS_DENIED);
        }
        info!(name = name, address = address, "dropping pin");

        let script = format!(
            r#"tell application "Maps"
{prelude}
    if foundLocation is not missing value then
        return "SUCCESS:Location found. Right-click and select 'Drop Pin' to create a pin named " & {name}
    else
        return "ERROR:Could not find location for " & {address}
    end if
end tell"#,
            prelude = search_prelude(address),
            name = quote(name),
            address = quote(address)
        );

        run_action(self.runner.as_ref(), "drop_pin", &script).await
    }
}

#[async_trait]
impl ToolSet for MapsApp {
    fn app_name(&self) -> &'static str {
        "Maps"
    }

    fn definitions(&self) -> Vec<ToolDefinition> {
        vec![
            ToolDefinition::new(
                "search_locations",
                "Search for places in Apple Maps.",
                json!({
                    "type": "object",
                    "properties": {
                        "query": { "type": "string" },
                        "limit": { "type": "integer", "default": 5 }
                    },
                    "required": ["query"]
                }),
            ),
            ToolDefinition::new(
                "get_directions",
                "Show directions between two addresses in Apple Maps.",
                json!({
                    "type": "object",
                    "properties": {
                        "from_address": { "type": "string" },
                        "to_address": { "type": "string" },
                        "transport_type": {
                            "type": "string",
                            "enum": ["driving", "walking", "transit"],
                            "default": "driving"
                        }
                    },
                    "required": ["from_address", "to_address"]
                }),
            ),
            ToolDefinition::new(
                "save_location",
                "Save a location to Apple Maps favorites.",
                json!({
                    "type": "object",
                    "properties": {
                        "name": { "type": "string" },
                        "address": { "type": "string" }
                    },
                    "required": ["name", "address"]
                }),
            ),
            ToolDefinition::new(
                "drop_pin",
                "Find an address in Apple Maps to drop a named pin on.",
                json!({
                    "type": "object",
                    "properties": {
                        "name": { "type": "string" },
                        "address": { "type": "string" }
                    },
                    "required": ["name", "address"]
                }),
            ),
        ]
    }

    async fn call(&self, tool: &str, input: serde_json::Value) -> Result<ToolOutput> {
        match tool {
            "search_locations" => {
                let SearchLocationsInput { query, limit } = parse_input(tool, input)?;
                let search = self.search_locations(&query, limit).await;
                let mut output = ToolOutput::json(&search)?;
                output.is_error = !search.success;
                Ok(output)
            }
            "get_directions" => {
                let DirectionsInput {
                    from_address,
                    to_address,
                    transport_type,
                } = parse_input(tool, input)?;
                let transport = match transport_type.as_deref() {
                    Some(text) => text
                        .parse::<TransportType>()
                        .map_err(|e| ToolError::invalid(tool, e))?,
                    None => TransportType::default(),
                };
                action_output(&self.directions(&from_address, &to_address, transport).await)
            }
            "save_location" => {
                let PlaceInput { name, address } = parse_input(tool, input)?;
                action_output(&self.save_location(&name, &address).await)
            }
            "drop_pin" => {
                let PlaceInput { name, address } = parse_input(tool, input)?;
                action_output(&self.drop_pin(&name, &address).await)
            }
            _ => Err(ToolError::UnknownTool(tool.to_string())),
        }
    }

    async fn check_access(&self) -> bool {
        check_app_access(self.runner.as_ref(), self.app_name()).await
    }
}
