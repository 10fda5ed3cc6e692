// AppleScript literal formatting

use super::value::ParsedValue;

/// Token AppleScript uses for an absent value.
pub const MISSING_VALUE: &str = "missing value";

/// Escape text for embedding between double quotes in a script.
///
/// Only `\` and `"` are escaped; newlines and unicode pass through literally.
pub fn escape_string(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        if ch == '\\' || ch == '"' {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// Quote and escape text as an AppleScript string literal.
pub fn quote(text: &str) -> String {
    format!("\"{}\"", escape_string(text))
}

/// Render a value in AppleScript literal syntax.
pub fn format_value(value: &ParsedValue) -> String {
    match value {
        ParsedValue::Missing => MISSING_VALUE.to_string(),
        ParsedValue::Bool(b) => b.to_string(),
        ParsedValue::Integer(n) => n.to_string(),
        // Debug keeps the fractional part of integral floats ("1.0"), so the
        // literal decodes back to a float rather than an integer.
        ParsedValue::Float(f) => format!("{:?}", f),
        ParsedValue::String(s) => quote(s),
        ParsedValue::List(items) => {
            let inner = items.iter().map(format_value).collect::<Vec<_>>().join(", ");
            format!("{{{}}}", inner)
        }
        ParsedValue::Record(fields) => {
            let inner = fields
                .iter()
                .map(|(key, value)| format!("{}:{}", key, format_value(value)))
                .collect::<Vec<_>>()
                .join(", ");
            format!("{{{}}}", inner)
        }
    }
}
