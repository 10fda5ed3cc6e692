// Calendar tools

use super::{
    action_output, check_app_access, date_literal, input_datetime, parse_input, parse_records,
    query_output, run_action,
};
use crate::applescript::{self, Record, ScriptRunner, quote};
use crate::tools::{ActionResult, Result, ToolDefinition, ToolError, ToolOutput, ToolSet};
use async_trait::async_trait;
use chrono::{Days, Local, NaiveDate, NaiveDateTime, NaiveTime};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

/// Days covered by a search when no end date is given.
const DEFAULT_RANGE_DAYS: u64 = 7;

#[derive(Debug, Deserialize)]
struct CreateEventInput {
    title: String,
    start_date: String,
    end_date: String,
    location: Option<String>,
    notes: Option<String>,
    #[serde(default)]
    is_all_day: bool,
    calendar_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchEventsInput {
    query: String,
    from_date: Option<String>,
    to_date: Option<String>,
    limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct ListEventsInput {
    from_date: Option<String>,
    to_date: Option<String>,
    limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct OpenEventInput {
    event_id: String,
}

/// A new event's properties
#[derive(Debug, Clone)]
pub struct NewEvent {
    pub title: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub location: Option<String>,
    pub notes: Option<String>,
    pub all_day: bool,
    pub calendar: Option<String>,
}

/// Search window: today at midnight through the end of today + 7 days.
pub fn default_range(today: NaiveDate) -> (NaiveDateTime, NaiveDateTime) {
    let end_day = today
        .checked_add_days(Days::new(DEFAULT_RANGE_DAYS))
        .unwrap_or(today);
    (today.and_time(NaiveTime::MIN), end_of_day(end_day))
}

fn end_of_day(day: NaiveDate) -> NaiveDateTime {
    day.and_hms_opt(23, 59, 59)
        .unwrap_or_else(|| day.and_time(NaiveTime::MIN))
}

/// Resolve the tool's date bounds. A missing bound comes from the default
/// window around the start day; a date-only upper bound covers that whole day.
fn input_range(
    tool: &str,
    from_date: Option<&str>,
    to_date: Option<&str>,
) -> Result<(NaiveDateTime, NaiveDateTime)> {
    let from = match from_date {
        Some(text) => input_datetime(tool, "from_date", text)?,
        None => default_range(Local::now().date_naive()).0,
    };
    let to = match to_date {
        Some(text) => match NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d") {
            Ok(day) => end_of_day(day),
            Err(_) => input_datetime(tool, "to_date", text)?,
        },
        None => default_range(from.date()).1,
    };

    if to < from {
        return Err(ToolError::invalid(tool, "to_date is before from_date"));
    }
    Ok((from, to))
}

/// Loop collecting event fields for every event matching `filter`
fn collect_events(filter: &str, from: &NaiveDateTime, to: &NaiveDateTime) -> String {
    format!(
        r#"tell application "Calendar"
    set allEvents to {{}}
    set searchStart to {from}
    set searchEnd to {to}
    repeat with c in every calendar
        set foundEvents to (every event of c whose {filter}start date is greater than or equal to searchStart and start date is less than or equal to searchEnd)
        repeat with e in foundEvents
            set end of allEvents to {{id:uid of e, title:summary of e, start_date:start date of e, end_date:end date of e, location:location of e, notes:description of e, calendar:name of c}}
        end repeat
    end repeat
    return allEvents
end tell"#,
        from = date_literal(from),
        to = date_literal(to)
    )
}

pub struct CalendarApp {
    runner: Arc<dyn ScriptRunner>,
    default_calendar: String,
}

impl CalendarApp {
    pub fn new(runner: Arc<dyn ScriptRunner>, default_calendar: impl Into<String>) -> Self {
        Self {
            runner,
            default_calendar: default_calendar.into(),
        }
    }

    /// Create an event in a calendar (the default calendar when `None`)
    pub async fn create_event(&self, event: &NewEvent) -> ActionResult {
        if event.end < event.start {
            return ActionResult::failed("End date is before start date");
        }

        let mut properties = vec![
            format!("summary:{}", quote(&event.title)),
            format!("start date:({})", date_literal(&event.start)),
            format!("end date:({})", date_literal(&event.end)),
        ];
        if let Some(location) = event.location.as_deref().filter(|l| !l.is_empty()) {
            properties.push(format!("location:{}", quote(location)));
        }
        if let Some(notes) = event.notes.as_deref().filter(|n| !n.is_empty()) {
            properties.push(format!("description:{}", quote(notes)));
        }
        if event.all_day {
            properties.push("allday event:true".to_string());
        }
        let calendar = event
            .calendar
            .as_deref()
            .filter(|c| !c.trim().is_empty())
            .unwrap_or(&self.default_calendar);

        let script = format!(
            r#"tell application "Calendar"
    try
        tell (first calendar whose name is {calendar})
            make new event at end with properties {{{properties}}}
            return "SUCCESS:Event created in calendar " & {calendar}
        end tell
    on error errMsg
        return "ERROR:" & errMsg
    end try
end tell"#,
            calendar = quote(calendar),
            properties = properties.join(", ")
        );

        run_action(self.runner.as_ref(), "create_event", &script)
            .await
            .with_details(json!({
                "title": event.title,
                "start_date": event.start.format("%Y-%m-%d %H:%M:%S").to_string(),
                "end_date": event.end.format("%Y-%m-%d %H:%M:%S").to_string(),
                "calendar": calendar,
                "is_all_day": event.all_day
            }))
    }

    /// Events in the window whose summary contains `query`
    pub async fn search(
        &self,
        query: &str,
        from: &NaiveDateTime,
        to: &NaiveDateTime,
        limit: Option<usize>,
    ) -> applescript::Result<Vec<Record>> {
        let filter = format!("summary contains {} and ", quote(query));
        self.collect(&collect_events(&filter, from, to), limit).await
    }

    /// Every event in the window
    pub async fn events(
        &self,
        from: &NaiveDateTime,
        to: &NaiveDateTime,
        limit: Option<usize>,
    ) -> applescript::Result<Vec<Record>> {
        self.collect(&collect_events("", from, to), limit).await
    }

    async fn collect(&self, script: &str, limit: Option<usize>) -> applescript::Result<Vec<Record>> {
        let reply = self.runner.run(script).await?;
        let mut events = parse_records(&reply);
        if let Some(limit) = limit {
            events.truncate(limit);
        }
        Ok(events)
    }

    /// Show the event with the given uid
    pub async fn open(&self, event_id: &str) -> ActionResult {
        let script = format!(
            r#"tell application "Calendar"
    try
        set theEvent to missing value
        repeat with c in every calendar
            set matches to (every event of c whose uid is {uid})
            if (count of matches) > 0 then
                set theEvent to item 1 of matches
                exit repeat
            end if
        end repeat
        if theEvent is missing value then
            return "ERROR:Event not found"
        end if
        show theEvent
        return "SUCCESS:Opened event: " & summary of theEvent
    on error errMsg
        return "ERROR:" & errMsg
    end try
end tell"#,
            uid = quote(event_id)
        );
        run_action(self.runner.as_ref(), "open_event", &script).await
    }
}

#[async_trait]
impl ToolSet for CalendarApp {
    fn app_name(&self) -> &'static str {
        "Calendar"
    }

    fn definitions(&self) -> Vec<ToolDefinition> {
        vec![
            ToolDefinition::new(
                "create_event",
                "Create a new calendar event.",
                json!({
                    "type": "object",
                    "properties": {
                        "title": { "type": "string" },
                        "start_date": { "type": "string", "description": "Start (YYYY-MM-DD HH:MM:SS)" },
                        "end_date": { "type": "string", "description": "End (YYYY-MM-DD HH:MM:SS)" },
                        "location": { "type": "string" },
                        "notes": { "type": "string" },
                        "is_all_day": { "type": "boolean", "default": false },
                        "calendar_name": { "type": "string" }
                    },
                    "required": ["title", "start_date", "end_date"]
                }),
            ),
            ToolDefinition::new(
                "search_events",
                "Search calendar events by title. Defaults to the next 7 days.",
                json!({
                    "type": "object",
                    "properties": {
                        "query": { "type": "string" },
                        "from_date": { "type": "string" },
                        "to_date": { "type": "string" },
                        "limit": { "type": "integer" }
                    },
                    "required": ["query"]
                }),
            ),
            ToolDefinition::new(
                "list_events",
                "List calendar events in a date range. Defaults to the next 7 days.",
                json!({
                    "type": "object",
                    "properties": {
                        "from_date": { "type": "string" },
                        "to_date": { "type": "string" },
                        "limit": { "type": "integer" }
                    }
                }),
            ),
            ToolDefinition::new(
                "open_event",
                "Open a calendar event by its identifier.",
                json!({
                    "type": "object",
                    "properties": {
                        "event_id": { "type": "string" }
                    },
                    "required": ["event_id"]
                }),
            ),
        ]
    }

    async fn call(&self, tool: &str, input: serde_json::Value) -> Result<ToolOutput> {
        match tool {
            "create_event" => {
                let input: CreateEventInput = parse_input(tool, input)?;
                let event = NewEvent {
                    start: input_datetime(tool, "start_date", &input.start_date)?,
                    end: input_datetime(tool, "end_date", &input.end_date)?,
                    title: input.title,
                    location: input.location,
                    notes: input.notes,
                    all_day: input.is_all_day,
                    calendar: input.calendar_name,
                };
                action_output(&self.create_event(&event).await)
            }
            "search_events" => {
                let SearchEventsInput {
                    query,
                    from_date,
                    to_date,
                    limit,
                } = parse_input(tool, input)?;
                let (from, to) = input_range(tool, from_date.as_deref(), to_date.as_deref())?;
                query_output(tool, self.search(&query, &from, &to, limit).await)
            }
            "list_events" => {
                let ListEventsInput {
                    from_date,
                    to_date,
                    limit,
                } = parse_input(tool, input)?;
                let (from, to) = input_range(tool, from_date.as_deref(), to_date.as_deref())?;
                query_output(tool, self.events(&from, &to, limit).await)
            }
            "open_event" => {
                let OpenEventInput { event_id } = parse_input(tool, input)?;
                action_output(&self.open(&event_id).await)
            }
            _ => Err(ToolError::UnknownTool(tool.to_string())),
        }
    }

    async fn check_access(&self) -> bool {
        check_app_access(self.runner.as_ref(), self.app_name()).await
    }
}
