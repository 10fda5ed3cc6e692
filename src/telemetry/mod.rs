// Telemetry module - process-wide logging level and call timing
#![allow(dead_code)]

use std::fmt::{Debug, Display};
use std::future::Future;
use std::sync::OnceLock;
use std::time::Instant;
use tracing::level_filters::LevelFilter;
use tracing::{debug, info};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{Registry, fmt, reload};

/// Longest rendering of call arguments kept in a log line
const MAX_ARGS_CHARS: usize = 120;

static LEVEL_HANDLE: OnceLock<reload::Handle<LevelFilter, Registry>> = OnceLock::new();

/// Set the process-wide log level.
///
/// The first call installs the global subscriber (stderr output); later calls
/// swap the level in place. If another subscriber is already installed, the
/// call leaves it untouched.
pub fn configure(level: LevelFilter) {
    if let Some(handle) = LEVEL_HANDLE.get() {
        if let Err(e) = handle.modify(|filter| *filter = level) {
            eprintln!("[warning] Failed to update log level: {}", e);
        }
        return;
    }

    let (filter, handle) = reload::Layer::new(level);
    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_writer(std::io::stderr),
        )
        .try_init()
        .is_ok();

    if installed {
        let _ = LEVEL_HANDLE.set(handle);
    }
}

/// Level currently in effect for every call site.
pub fn current_level() -> LevelFilter {
    LevelFilter::current()
}

/// Parse a level name such as `debug` or `off`.
pub fn parse_level(name: &str) -> Option<LevelFilter> {
    name.trim().parse().ok()
}

/// Render arguments for a log line, truncated on a char boundary.
pub fn summarize_args(args: &dyn Debug) -> String {
    let rendered = format!("{:?}", args);
    if rendered.chars().count() <= MAX_ARGS_CHARS {
        return rendered;
    }
    let mut truncated: String = rendered.chars().take(MAX_ARGS_CHARS).collect();
    truncated.push_str("...");
    truncated
}

fn record<T, E: Display>(name: &str, args: &str, start: Instant, result: &Result<T, E>) {
    let elapsed_ms = start.elapsed().as_millis() as u64;
    match result {
        Ok(_) => info!(
            function = name,
            args = %args,
            elapsed_ms = elapsed_ms,
            outcome = "ok",
            "call completed"
        ),
        Err(e) => info!(
            function = name,
            args = %args,
            elapsed_ms = elapsed_ms,
            outcome = "error",
            error = %e,
            "call failed"
        ),
    }
}

/// Time a fallible operation and log its outcome.
///
/// The result is returned exactly as the operation produced it.
pub fn timed<T, E, F>(name: &str, args: impl Debug, op: F) -> Result<T, E>
where
    E: Display,
    F: FnOnce() -> Result<T, E>,
{
    let args = summarize_args(&args);
    debug!(function = name, args = %args, "call started");
    let start = Instant::now();
    let result = op();
    record(name, &args, start, &result);
    result
}

/// Time an operation that cannot fail.
pub fn timed_value<T, F>(name: &str, args: impl Debug, op: F) -> T
where
    F: FnOnce() -> T,
{
    match timed(name, args, || Ok::<T, std::convert::Infallible>(op())) {
        Ok(value) => value,
        Err(never) => match never {},
    }
}

/// Time a future and log its outcome; the wait stays a suspension point.
pub async fn timed_async<T, E, Fut>(name: &str, args: impl Debug, fut: Fut) -> Result<T, E>
where
    E: Display,
    Fut: Future<Output = Result<T, E>>,
{
    let args = summarize_args(&args);
    debug!(function = name, args = %args, "call started");
    let start = Instant::now();
    let result = fut.await;
    record(name, &args, start, &result);
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summarize_args_truncates() {
        let long = "x".repeat(500);
        let summary = summarize_args(&long);
        assert!(summary.ends_with("..."));
        assert_eq!(summary.chars().count(), MAX_ARGS_CHARS + 3);

        assert_eq!(summarize_args(&("a", 1)), r#"("a", 1)"#);
    }

    #[test]
    fn test_summarize_args_multibyte() {
        let text = "日本語".repeat(100);
        let summary = summarize_args(&text);
        assert!(summary.ends_with("..."));
    }

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("debug"), Some(LevelFilter::DEBUG));
        assert_eq!(parse_level(" WARN "), Some(LevelFilter::WARN));
        assert_eq!(parse_level("off"), Some(LevelFilter::OFF));
        assert_eq!(parse_level("chatty"), None);
    }

    #[test]
    fn test_timed_passes_result_through() {
        let ok: Result<i32, String> = timed("add", (1, 2), || Ok(1 + 2));
        assert_eq!(ok, Ok(3));

        let err: Result<i32, String> = timed("fail", (), || Err("boom".to_string()));
        assert_eq!(err, Err("boom".to_string()));

        assert_eq!(timed_value("add", (1, 2), || 1 + 2), 3);
    }

    #[tokio::test]
    async fn test_timed_async_passes_result_through() {
        let ok: Result<&str, String> = timed_async("echo", "hi", async { Ok("hi") }).await;
        assert_eq!(ok, Ok("hi"));

        let err: Result<(), String> =
            timed_async("fail", "", async { Err("late boom".to_string()) }).await;
        assert_eq!(err.unwrap_err(), "late boom");
    }
}
