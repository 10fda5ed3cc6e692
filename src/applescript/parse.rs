// AppleScript list/record/literal parsing
//
// Every function here is total: malformed text yields a best-effort result,
// never an error. Scanning is iterative and decoding descends at most one
// level below a record, so no input can recurse unboundedly.

use super::format::MISSING_VALUE;
use super::value::{ParsedValue, Record};
use std::str::CharIndices;

/// A character together with the structure surrounding it.
#[derive(Debug, Clone, Copy)]
struct Token {
    index: usize,
    ch: char,
    /// Brace depth before this character is consumed
    depth: usize,
    /// Inside a quoted string (delimiters included)
    quoted: bool,
}

impl Token {
    fn is_top_level(&self) -> bool {
        self.depth == 0 && !self.quoted
    }
}

/// Walks text tracking brace depth and quoted-string state.
struct Structure<'a> {
    chars: CharIndices<'a>,
    depth: usize,
    in_quotes: bool,
    escape_next: bool,
}

impl<'a> Structure<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            chars: text.char_indices(),
            depth: 0,
            in_quotes: false,
            escape_next: false,
        }
    }
}

impl Iterator for Structure<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        let (index, ch) = self.chars.next()?;
        let depth = self.depth;

        if self.in_quotes {
            if self.escape_next {
                self.escape_next = false;
            } else if ch == '\\' {
                self.escape_next = true;
            } else if ch == '"' {
                self.in_quotes = false;
            }
            return Some(Token {
                index,
                ch,
                depth,
                quoted: true,
            });
        }

        match ch {
            '"' => {
                self.in_quotes = true;
                return Some(Token {
                    index,
                    ch,
                    depth,
                    quoted: true,
                });
            }
            '{' => self.depth += 1,
            // Unbalanced closers clamp at zero
            '}' => self.depth = self.depth.saturating_sub(1),
            _ => {}
        }

        Some(Token {
            index,
            ch,
            depth,
            quoted: false,
        })
    }
}

/// Remove one pair of braces when the brace at the start closes at the end.
///
/// `{a:=1}, {b:=2}` is left intact because its first brace closes early.
/// An opening brace that never closes is dropped.
fn strip_enclosing_braces(text: &str) -> &str {
    let text = text.trim();
    if !text.starts_with('{') {
        return text;
    }

    for token in Structure::new(text) {
        if token.ch == '}' && !token.quoted && token.depth == 1 {
            return if token.index == text.len() - 1 {
                &text[1..token.index]
            } else {
                text
            };
        }
    }

    &text[1..]
}

/// Split on commas at depth zero outside quotes; empty segments are dropped.
fn split_top_level(text: &str) -> Vec<&str> {
    let mut segments = Vec::new();
    let mut start = 0;

    for token in Structure::new(text) {
        if token.ch == ',' && token.is_top_level() {
            segments.push(text[start..token.index].trim());
            start = token.index + 1;
        }
    }
    segments.push(text[start..].trim());

    segments.retain(|s| !s.is_empty());
    segments
}

/// Split a record segment into key and raw value.
///
/// The first top-level `:=` wins; without one, the first top-level `:`.
fn split_field(segment: &str) -> Option<(&str, &str)> {
    let mut first_colon = None;

    for token in Structure::new(segment) {
        if token.ch != ':' || !token.is_top_level() {
            continue;
        }
        if segment[token.index + 1..].starts_with('=') {
            return Some((&segment[..token.index], &segment[token.index + 2..]));
        }
        first_colon.get_or_insert(token.index);
    }

    first_colon.map(|i| (&segment[..i], &segment[i + 1..]))
}

/// Whether braced text holds record fields anywhere inside it.
fn contains_record_delimiter(text: &str) -> bool {
    Structure::new(text).any(|t| t.ch == ':' && !t.quoted)
}

/// Split AppleScript list text into raw, trimmed element texts.
///
/// Callers decide whether each element is a record or a scalar.
pub fn parse_list(text: &str) -> Vec<String> {
    let inner = strip_enclosing_braces(text);
    if inner.trim().is_empty() {
        return Vec::new();
    }
    split_top_level(inner)
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Parse AppleScript record text into an ordered mapping.
///
/// Values that are themselves records stay raw text; nested lists of scalars
/// are decoded one level deep.
pub fn parse_record(text: &str) -> Record {
    let mut record = Record::new();
    let inner = strip_enclosing_braces(text);
    if inner.trim().is_empty() {
        return record;
    }

    for segment in split_top_level(inner) {
        let Some((key, raw)) = split_field(segment) else {
            continue;
        };
        let key = key.trim();
        if key.is_empty() {
            continue;
        }
        record.insert(key.to_string(), parse_field_value(raw));
    }

    record
}

fn parse_field_value(raw: &str) -> ParsedValue {
    let raw = raw.trim();
    if !raw.starts_with('{') {
        return parse_scalar(raw);
    }
    if contains_record_delimiter(raw) {
        return ParsedValue::String(raw.to_string());
    }
    ParsedValue::List(parse_list(raw).iter().map(|s| parse_scalar(s)).collect())
}

/// Decode a list into values: record elements become records, everything
/// else is decoded as a scalar.
pub fn parse_list_values(text: &str) -> Vec<ParsedValue> {
    parse_list(text)
        .iter()
        .map(|element| {
            if element.starts_with('{') && contains_record_delimiter(element) {
                ParsedValue::Record(parse_record(element))
            } else {
                parse_field_value(element)
            }
        })
        .collect()
}

/// Decode a single literal.
///
/// Precedence: `missing value`, booleans, integers, finite floats, quoted
/// strings (quotes removed, no unescaping), then the text unchanged.
pub fn parse_scalar(text: &str) -> ParsedValue {
    let text = text.trim();

    if text == MISSING_VALUE {
        return ParsedValue::Missing;
    }
    match text {
        "true" => return ParsedValue::Bool(true),
        "false" => return ParsedValue::Bool(false),
        _ => {}
    }
    if let Ok(n) = text.parse::<i64>() {
        return ParsedValue::Integer(n);
    }
    if let Ok(f) = text.parse::<f64>()
        && f.is_finite()
    {
        return ParsedValue::Float(f);
    }
    if text.len() >= 2 && text.starts_with('"') && text.ends_with('"') {
        return ParsedValue::String(text[1..text.len() - 1].to_string());
    }

    ParsedValue::String(text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_inputs() {
        assert!(parse_list("").is_empty());
        assert!(parse_list("{}").is_empty());
        assert!(parse_list("  { }  ").is_empty());
        assert!(parse_record("").is_empty());
        assert!(parse_record("{}").is_empty());
    }

    #[test]
    fn test_parse_simple_list() {
        assert_eq!(parse_list("{1, 2, 3}"), vec!["1", "2", "3"]);
        assert_eq!(parse_list(r#"{"a", "b", "c"}"#), vec![r#""a""#, r#""b""#, r#""c""#]);
        assert_eq!(parse_list(r#"{1, "two", 3}"#), vec!["1", r#""two""#, "3"]);
    }

    #[test]
    fn test_parse_list_without_braces() {
        // `as text` coercions print bare comma-separated items
        assert_eq!(parse_list("Inbox, Sent, Drafts"), vec!["Inbox", "Sent", "Drafts"]);
    }

    #[test]
    fn test_parse_list_respects_quotes_and_nesting() {
        let items = parse_list(r#"{"a, b", {1, 2}, {x:=1, y:=2}, "say \"hi, there\""}"#);
        assert_eq!(
            items,
            vec![
                r#""a, b""#,
                "{1, 2}",
                "{x:=1, y:=2}",
                r#""say \"hi, there\"""#
            ]
        );
    }

    #[test]
    fn test_parse_bare_record_sequence() {
        let items = parse_list(r#"{title:"Meeting 1"}, {title:"Meeting 2"}"#);
        assert_eq!(items.len(), 2);
        assert_eq!(parse_record(&items[1])["title"], ParsedValue::from("Meeting 2"));
    }

    #[test]
    fn test_parse_simple_record() {
        let record = parse_record(r#"{name:="John", age:=30}"#);
        assert_eq!(record["name"], ParsedValue::from("John"));
        assert_eq!(record["age"], ParsedValue::Integer(30));
        assert_eq!(record.keys().collect::<Vec<_>>(), vec!["name", "age"]);
    }

    #[test]
    fn test_parse_record_with_plain_colons() {
        let record = parse_record(r#"{title:"Standup", start_date:"2025-04-01 14:00:00", done:false}"#);
        assert_eq!(record["title"], ParsedValue::from("Standup"));
        assert_eq!(record["start_date"], ParsedValue::from("2025-04-01 14:00:00"));
        assert_eq!(record["done"], ParsedValue::Bool(false));
    }

    #[test]
    fn test_nested_record_stays_raw() {
        let record = parse_record(r#"{person:={name:="Jane", age:=25}, active:=true}"#);
        assert_eq!(record["active"], ParsedValue::Bool(true));
        let person = record["person"].as_str().expect("nested record kept as text");
        assert!(person.contains("name:="));
    }

    #[test]
    fn test_nested_list_in_record() {
        let record = parse_record(r#"{name:"Ann", phones:{"555-1234", "555-9876"}}"#);
        assert_eq!(
            record["phones"],
            ParsedValue::List(vec!["555-1234".into(), "555-9876".into()])
        );
    }

    #[test]
    fn test_duplicate_keys_keep_first_position() {
        let record = parse_record("{a:=1, b:=2, a:=3}");
        assert_eq!(record.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(record["a"], ParsedValue::Integer(3));
    }

    #[test]
    fn test_malformed_records_are_best_effort() {
        let truncated = parse_record(r#"{name:="John", age:=3"#);
        assert_eq!(truncated["name"], ParsedValue::from("John"));
        assert_eq!(truncated["age"], ParsedValue::Integer(3));

        let no_delimiter = parse_record("{just some words, more words}");
        assert!(no_delimiter.is_empty());

        let unbalanced = parse_record("}}}{{{a:=1");
        assert!(unbalanced.len() <= 1);

        let open_quote = parse_record(r#"{a:="unterminated, b:=2}"#);
        assert_eq!(open_quote.len(), 1);
    }

    #[test]
    fn test_deep_nesting_does_not_overflow() {
        let deep = format!("{}{}", "{".repeat(100_000), "}".repeat(100_000));
        assert!(parse_list(&deep).len() <= 1);
        let deep_record = format!("{{a:={}1{}}}", "{".repeat(100_000), "}".repeat(100_000));
        let record = parse_record(&deep_record);
        assert!(record["a"].as_str().is_some() || matches!(record["a"], ParsedValue::List(_)));
    }

    #[test]
    fn test_parse_scalar_precedence() {
        assert_eq!(parse_scalar("missing value"), ParsedValue::Missing);
        assert_eq!(parse_scalar("true"), ParsedValue::Bool(true));
        assert_eq!(parse_scalar("false"), ParsedValue::Bool(false));
        assert_eq!(parse_scalar("42"), ParsedValue::Integer(42));
        assert_eq!(parse_scalar("3.14"), ParsedValue::Float(3.14));
        assert_eq!(parse_scalar(r#""Hello""#), ParsedValue::from("Hello"));
        assert_eq!(parse_scalar(r#""42""#), ParsedValue::from("42"));
        assert_eq!(parse_scalar("something else"), ParsedValue::from("something else"));
    }

    #[test]
    fn test_parse_scalar_degrades_to_text() {
        assert_eq!(parse_scalar("inf"), ParsedValue::from("inf"));
        assert_eq!(parse_scalar("NaN"), ParsedValue::from("NaN"));
        assert_eq!(parse_scalar("\""), ParsedValue::from("\""));
        assert_eq!(parse_scalar(r#""a\"b""#), ParsedValue::from(r#"a\"b"#));
        assert_eq!(parse_scalar("{1, 2}"), ParsedValue::from("{1, 2}"));
    }

    #[test]
    fn test_parse_scalar_idempotent_on_text() {
        for text in ["something else", "Tuesday, April 1, 2025", "", "a:b"] {
            let once = parse_scalar(text);
            let ParsedValue::String(ref s) = once else {
                panic!("expected text for {:?}", text);
            };
            assert_eq!(parse_scalar(s), once);
        }
    }

    #[test]
    fn test_parse_list_values() {
        let values = parse_list_values(r#"{1, "two", {name:"x"}, {3, 4}, missing value}"#);
        let mut record = Record::new();
        record.insert("name".to_string(), "x".into());
        assert_eq!(
            values,
            vec![
                ParsedValue::Integer(1),
                ParsedValue::from("two"),
                ParsedValue::Record(record),
                ParsedValue::List(vec![3i64.into(), 4i64.into()]),
                ParsedValue::Missing,
            ]
        );
    }
}
