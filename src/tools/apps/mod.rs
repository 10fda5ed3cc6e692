// Per-application tool sets
//
// Every app follows the same shape: build a script with user text escaped
// through `quote`, run it, then decode the reply with the list/record parser.

pub mod calendar;
pub mod contacts;
pub mod mail;
pub mod maps;
pub mod messages;
pub mod notes;
pub mod reminders;

pub use calendar::CalendarApp;
pub use contacts::ContactsApp;
pub use mail::MailApp;
pub use maps::MapsApp;
pub use messages::MessagesApp;
pub use notes::NotesApp;
pub use reminders::RemindersApp;

use crate::applescript::{self, Record, ScriptRunner, parse_list, parse_record, parse_scalar, quote};
use crate::tools::{ActionResult, Result, ToolError, ToolOutput};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{error, warn};

/// Probe whether an application answers Apple Events.
pub(crate) async fn check_app_access(runner: &dyn ScriptRunner, app: &str) -> bool {
    let script = format!(
        r#"try
    tell application {app}
        get name
    end tell
    return true
on error
    return false
end try"#,
        app = quote(app)
    );

    match runner.run(&script).await {
        Ok(reply) => reply.trim().eq_ignore_ascii_case("true"),
        Err(e) => {
            warn!(app = app, error = %e, "cannot access application");
            false
        }
    }
}

/// Deserialize a tool's JSON input.
pub(crate) fn parse_input<T: DeserializeOwned>(tool: &str, input: Value) -> Result<T> {
    serde_json::from_value(input).map_err(|e| ToolError::invalid(tool, e.to_string()))
}

/// Decode a list of records.
pub(crate) fn parse_records(raw: &str) -> Vec<Record> {
    parse_list(raw).iter().map(|item| parse_record(item)).collect()
}

/// Decode a list of plain strings, dropping missing values.
pub(crate) fn parse_strings(raw: &str) -> Vec<String> {
    parse_list(raw)
        .iter()
        .filter_map(|item| parse_scalar(item).to_text())
        .collect()
}

/// Text of a record field, if present and not missing.
pub(crate) fn field_text(record: &Record, key: &str) -> Option<String> {
    record.get(key).and_then(|v| v.to_text())
}

/// Render a query result; a failed script becomes error output.
pub(crate) fn query_output<T: Serialize>(
    tool: &str,
    result: applescript::Result<T>,
) -> Result<ToolOutput> {
    match result {
        Ok(value) => Ok(ToolOutput::json(&value)?),
        Err(e) => {
            error!(tool = tool, error = %e, "query failed");
            Ok(ToolOutput::error(e.to_string()))
        }
    }
}

/// Render an action result; `is_error` mirrors `success`.
pub(crate) fn action_output(result: &ActionResult) -> Result<ToolOutput> {
    let mut output = ToolOutput::json(result)?;
    output.is_error = !result.success;
    Ok(output)
}

/// Run a script that answers `SUCCESS:`/`ERROR:`; failures become `success: false`.
pub(crate) async fn run_action(runner: &dyn ScriptRunner, tool: &str, script: &str) -> ActionResult {
    match runner.run(script).await {
        Ok(reply) => ActionResult::from_reply(&reply),
        Err(e) => {
            error!(tool = tool, error = %e, "action failed");
            ActionResult::failed(e.to_string())
        }
    }
}

/// Parse `YYYY-MM-DD`, `YYYY-MM-DD HH:MM[:SS]`, the ISO `T` form, or RFC 3339.
pub(crate) fn parse_datetime(text: &str) -> Option<NaiveDateTime> {
    const FORMATS: [&str; 4] = [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
    ];

    let text = text.trim();
    for format in FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Some(dt);
        }
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_local());
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Parse a date field of a tool's input.
pub(crate) fn input_datetime(tool: &str, field: &str, text: &str) -> Result<NaiveDateTime> {
    parse_datetime(text).ok_or_else(|| {
        ToolError::invalid(tool, format!("'{}' is not a valid date for {}", text, field))
    })
}

/// AppleScript date literal, e.g. `date "2025-04-01 14:00:00"`.
pub(crate) fn date_literal(dt: &NaiveDateTime) -> String {
    format!("date {}", quote(&dt.format("%Y-%m-%d %H:%M:%S").to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::applescript::ParsedValue;

    #[test]
    fn test_parse_datetime_forms() {
        let expected = NaiveDate::from_ymd_opt(2025, 4, 1)
            .unwrap()
            .and_hms_opt(14, 30, 0)
            .unwrap();
        assert_eq!(parse_datetime("2025-04-01 14:30:00"), Some(expected));
        assert_eq!(parse_datetime("2025-04-01T14:30:00"), Some(expected));
        assert_eq!(parse_datetime("2025-04-01 14:30"), Some(expected));
        assert_eq!(parse_datetime("2025-04-01T14:30:00+02:00"), Some(expected));
        assert_eq!(
            parse_datetime("2025-04-01"),
            NaiveDate::from_ymd_opt(2025, 4, 1).unwrap().and_hms_opt(0, 0, 0)
        );
        assert_eq!(parse_datetime("next tuesday"), None);
    }

    #[test]
    fn test_date_literal() {
        let dt = parse_datetime("2025-04-01T09:05").unwrap();
        assert_eq!(date_literal(&dt), r#"date "2025-04-01 09:05:00""#);
    }

    #[test]
    fn test_parse_records_and_strings() {
        let records = parse_records(r#"{{name:"A", id:1}, {name:"B", id:2}}"#);
        assert_eq!(records.len(), 2);
        assert_eq!(records[1]["id"], ParsedValue::Integer(2));

        assert_eq!(parse_strings("Inbox, Sent"), vec!["Inbox", "Sent"]);
        assert_eq!(parse_strings(r#"{"Work", missing value}"#), vec!["Work"]);
    }

    #[test]
    fn test_invalid_input_is_reported() {
        #[derive(Debug, serde::Deserialize)]
        #[allow(dead_code)]
        struct Input {
            query: String,
        }
        let err = parse_input::<Input>("search_notes", serde_json::json!({})).unwrap_err();
        assert!(matches!(err, ToolError::InvalidInput(ref tool, _) if tool == "search_notes"));
    }
}
