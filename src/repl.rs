// Interactive tool shell

use crate::applescript::Osascript;
use crate::tools::Toolbox;
use rustyline::Editor;
use rustyline::error::ReadlineError;
use rustyline::history::FileHistory;
use std::io;
use std::path::{Path, PathBuf};

const HISTORY_FILE: &str = ".apple_bridge_history";

/// One line of REPL input
#[derive(Debug, Clone, PartialEq)]
pub enum ReplCommand {
    /// `<tool> [json]`
    Call { tool: String, input: String },
    /// `:exec <script>`
    Exec(String),
    /// `:tools`
    Tools,
    /// `:help`
    Help,
    /// `:quit`
    Quit,
    /// Anything unrecognised after `:`
    Unknown(String),
}

/// Split a line into a REPL command; blank lines yield `None`.
pub fn parse_command(line: &str) -> Option<ReplCommand> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    if let Some(directive) = line.strip_prefix(':') {
        let (name, rest) = directive
            .split_once(char::is_whitespace)
            .map(|(name, rest)| (name, rest.trim()))
            .unwrap_or((directive, ""));
        return Some(match name {
            "exec" if !rest.is_empty() => ReplCommand::Exec(rest.to_string()),
            "tools" => ReplCommand::Tools,
            "help" => ReplCommand::Help,
            "quit" | "q" => ReplCommand::Quit,
            _ => ReplCommand::Unknown(name.to_string()),
        });
    }

    let (tool, input) = line
        .split_once(char::is_whitespace)
        .map(|(tool, input)| (tool, input.trim()))
        .unwrap_or((line, ""));
    Some(ReplCommand::Call {
        tool: tool.to_string(),
        input: if input.is_empty() { "{}".to_string() } else { input.to_string() },
    })
}

pub fn default_history_file() -> PathBuf {
    dirs::home_dir()
        .map(|p| p.join(HISTORY_FILE))
        .unwrap_or_else(|| PathBuf::from(HISTORY_FILE))
}

fn print_help() {
    println!("  <tool> [json]     run a tool, e.g. search_notes {{\"query\": \"groceries\"}}");
    println!("  :exec <script>    run raw AppleScript");
    println!("  :tools            list tool names");
    println!("  :quit             leave (or Ctrl+D)");
}

/// Run the read-eval-print loop until EOF or `:quit`.
pub async fn run(toolbox: &Toolbox, osascript: &Osascript, history_file: &Path) -> io::Result<()> {
    let mut rl: Editor<(), FileHistory> = Editor::new().map_err(io::Error::other)?;

    if history_file.exists()
        && let Err(e) = rl.load_history(history_file)
    {
        eprintln!("[warning] Failed to load history: {}", e);
    }

    println!("apple-bridge v{}", env!("CARGO_PKG_VERSION"));
    println!("Type :help for commands. Ctrl+D to quit.");
    println!();

    loop {
        let line = match rl.readline("> ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("[error] Readline error: {}", e);
                break;
            }
        };

        let Some(command) = parse_command(&line) else {
            continue;
        };
        let _ = rl.add_history_entry(line.trim());

        match command {
            ReplCommand::Call { tool, input } => {
                let input = match serde_json::from_str(&input) {
                    Ok(input) => input,
                    Err(e) => {
                        println!("[error] Input is not valid JSON: {}", e);
                        continue;
                    }
                };
                match toolbox.execute(&tool, input).await {
                    Ok(output) if output.is_error => println!("[error] {}", output.content),
                    Ok(output) => println!("{}", output.content),
                    Err(e) => println!("[error] {}", e),
                }
            }
            ReplCommand::Exec(script) => {
                match osascript.execute(&script, osascript.config().timeout()).await {
                    Ok(output) => println!("{}", output),
                    Err(e) => println!("[error] {}", e),
                }
            }
            ReplCommand::Tools => {
                for name in toolbox.tool_names() {
                    println!("  {}", name);
                }
            }
            ReplCommand::Help => print_help(),
            ReplCommand::Quit => break,
            ReplCommand::Unknown(name) => println!("[error] Unknown command :{}", name),
        }
    }

    if let Err(e) = rl.save_history(history_file) {
        eprintln!("[warning] Failed to save history: {}", e);
    }

    println!("\nGoodbye!");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tool_call() {
        assert_eq!(
            parse_command(r#"search_notes {"query": "milk"}"#),
            Some(ReplCommand::Call {
                tool: "search_notes".to_string(),
                input: r#"{"query": "milk"}"#.to_string(),
            })
        );
        assert_eq!(
            parse_command("  list_notes  "),
            Some(ReplCommand::Call {
                tool: "list_notes".to_string(),
                input: "{}".to_string(),
            })
        );
    }

    #[test]
    fn test_parse_directives() {
        assert_eq!(
            parse_command(r#":exec return "hi""#),
            Some(ReplCommand::Exec(r#"return "hi""#.to_string()))
        );
        assert_eq!(parse_command(":tools"), Some(ReplCommand::Tools));
        assert_eq!(parse_command(":q"), Some(ReplCommand::Quit));
        assert_eq!(parse_command(":exec"), Some(ReplCommand::Unknown("exec".to_string())));
        assert_eq!(parse_command("   "), None);
    }

    #[test]
    fn test_history_file_name() {
        assert!(default_history_file().ends_with(HISTORY_FILE));
    }
}
