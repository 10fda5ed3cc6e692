// AppleScript interop layer - script execution, literal formatting and output parsing
#![allow(unused_imports)]

pub mod config;
pub mod error;
pub mod format;
pub mod parse;
pub mod runner;
pub mod value;

pub use config::ScriptConfig;
pub use error::{AppleScriptError, Result};
pub use format::{MISSING_VALUE, escape_string, format_value, quote};
pub use parse::{parse_list, parse_list_values, parse_record, parse_scalar};
pub use runner::{Osascript, ScriptRunner};
pub use value::{ParsedValue, Record};
