mod applescript;
mod repl;
mod telemetry;
mod tools;

use applescript::{Osascript, ScriptConfig, ScriptRunner};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::time::Duration;
use tools::{Toolbox, ToolsConfig};
use tracing::level_filters::LevelFilter;
use tracing::{debug, error, info};

/// How `exec` decodes the script's output
#[derive(Debug, Clone, Copy, ValueEnum)]
enum ParseMode {
    List,
    Record,
    Scalar,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print every tool definition as JSON
    Tools,
    /// Run one tool with JSON input
    Call {
        tool: String,
        /// Tool input as a JSON object
        #[arg(short, long, default_value = "{}")]
        input: String,
    },
    /// Run raw AppleScript
    Exec {
        script: String,
        /// Timeout in seconds (defaults to APPLESCRIPT_TIMEOUT_SECS)
        #[arg(short, long)]
        timeout: Option<u64>,
        /// Decode the output instead of printing it verbatim
        #[arg(short, long, value_enum)]
        parse: Option<ParseMode>,
    },
    /// Check automation access to every application
    Doctor,
    /// Interactive tool shell
    Repl {
        /// History file path
        #[arg(long)]
        history_file: Option<PathBuf>,
    },
}

/// CLI arguments
#[derive(Debug, Parser)]
#[command(name = "apple-bridge")]
#[command(about = "Drive macOS applications through AppleScript")]
struct Args {
    /// Log level (off, error, warn, info, debug, trace); falls back to APPLE_BRIDGE_LOG
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let level_name = args
        .log_level
        .clone()
        .or_else(|| std::env::var("APPLE_BRIDGE_LOG").ok())
        .unwrap_or_else(|| "warn".to_string());
    let level = telemetry::parse_level(&level_name).unwrap_or_else(|| {
        eprintln!("[warning] Unknown log level '{}', using warn", level_name);
        LevelFilter::WARN
    });
    telemetry::configure(level);

    if let Err(e) = run(args.command).await {
        error!(error = %e, "command failed");
        eprintln!("[error] {}", e);
        process::exit(1);
    }
}

async fn run(command: Command) -> Result<(), Box<dyn std::error::Error>> {
    let script_config = ScriptConfig::from_env();
    let tools_config = ToolsConfig::from_env();
    debug!(
        interpreter = %script_config.interpreter.display(),
        timeout_secs = script_config.timeout_secs,
        "configuration loaded"
    );

    let osascript = Osascript::new(script_config);
    let runner: Arc<dyn ScriptRunner> = Arc::new(osascript.clone());

    match command {
        Command::Tools => {
            let toolbox = Toolbox::init(tools_config, runner);
            println!("{}", serde_json::to_string_pretty(&toolbox.tool_definitions())?);
        }
        Command::Call { tool, input } => {
            let toolbox = Toolbox::init(tools_config, runner);
            let input: serde_json::Value = serde_json::from_str(&input)?;
            let output = toolbox.execute(&tool, input).await?;
            if output.is_error {
                eprintln!("[error] {}", output.content);
                process::exit(2);
            }
            println!("{}", output.content);
        }
        Command::Exec {
            script,
            timeout,
            parse,
        } => {
            let timeout = timeout
                .map(Duration::from_secs)
                .unwrap_or_else(|| osascript.config().timeout());
            let output = osascript.execute(&script, timeout).await?;
            let rendered = telemetry::timed("applescript.decode", parse, || {
                render_output(&output, parse)
            })?;
            println!("{}", rendered);
        }
        Command::Doctor => {
            let toolbox = Toolbox::init(tools_config, runner);
            let report = toolbox.check_access().await;
            let denied = report.iter().filter(|(_, granted)| !granted).count();
            for (app, granted) in &report {
                println!("{:<10} {}", app, if *granted { "ok" } else { "no access" });
            }
            info!(apps = report.len(), denied = denied, "access check finished");
            if denied > 0 {
                process::exit(2);
            }
        }
        Command::Repl { history_file } => {
            let toolbox = Toolbox::init(tools_config, runner);
            let history_file = history_file.unwrap_or_else(repl::default_history_file);
            repl::run(&toolbox, &osascript, &history_file).await?;
        }
    }

    Ok(())
}

/// Raw output, or its decoded form as pretty JSON
fn render_output(output: &str, mode: Option<ParseMode>) -> serde_json::Result<String> {
    match mode {
        None => Ok(output.to_string()),
        Some(ParseMode::List) => serde_json::to_string_pretty(&applescript::parse_list_values(output)),
        Some(ParseMode::Record) => serde_json::to_string_pretty(&applescript::parse_record(output)),
        Some(ParseMode::Scalar) => serde_json::to_string_pretty(&applescript::parse_scalar(output)),
    }
}
