// Integration tests for the AppleScript interop layer
// The executor is driven through /bin/sh so these run without osascript.

#[path = "../src/telemetry/mod.rs"]
mod telemetry;

#[path = "../src/applescript/mod.rs"]
mod applescript;

fn init_tracing() {
    use std::sync::Once;
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_target(true)
            .with_thread_ids(true)
            .try_init();
    });
}

fn shell_config() -> applescript::ScriptConfig {
    applescript::ScriptConfig {
        interpreter: std::path::PathBuf::from("/bin/sh"),
        script_flag: Some("-c".to_string()),
        ..Default::default()
    }
}

fn shell() -> applescript::Osascript {
    applescript::Osascript::new(shell_config())
}

/// Whether `pid` is still a live process; a reaped-pending zombie counts as gone.
fn process_alive(pid: i32) -> bool {
    if unsafe { libc::kill(pid, 0) } != 0 {
        return false;
    }
    match std::fs::read_to_string(format!("/proc/{}/stat", pid)) {
        Ok(stat) => !stat
            .rsplit(')')
            .next()
            .is_some_and(|state| state.trim_start().starts_with('Z')),
        Err(_) => true,
    }
}

/// Text for literal round trips: anything but `"` and `\`, which are not unescaped.
fn random_text(rng: &mut impl rand::Rng) -> String {
    const CHARS: &[char] = &[
        'a', 'Z', '0', '7', ' ', ',', ':', '=', '{', '}', '\'', '-', '.', '\n', 'é', '日', '🙂',
    ];
    let len = rng.gen_range(0..16);
    (0..len)
        .map(|_| CHARS[rng.gen_range(0..CHARS.len())])
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use applescript::{AppleScriptError, ParsedValue, ScriptRunner};
    use std::sync::Arc;
    use std::time::{Duration, Instant};
    use tokio_test::{assert_err, assert_ok};

    /// Trimmed stdout comes back on exit code 0
    #[tokio::test]
    async fn test_execute_returns_trimmed_stdout() {
        init_tracing();

        let output = assert_ok!(shell().execute("echo '  ok  '", Duration::from_secs(5)).await);
        assert_eq!(output, "ok");
    }

    /// Non-zero exit carries the code and trimmed stderr
    #[tokio::test]
    async fn test_execute_failure_reports_stderr() {
        init_tracing();

        let err = assert_err!(
            shell()
                .execute("echo 'no such app' >&2; exit 3", Duration::from_secs(5))
                .await
        );
        match err {
            AppleScriptError::ExecutionFailed { code, stderr } => {
                assert_eq!(code, 3);
                assert_eq!(stderr, "no such app");
            }
            other => panic!("expected ExecutionFailed, got {:?}", other),
        }
    }

    /// Scripts can be fed through stdin instead of an argument
    #[tokio::test]
    async fn test_execute_through_stdin() {
        init_tracing();

        let runner = applescript::Osascript::new(applescript::ScriptConfig {
            script_flag: None,
            ..shell_config()
        });
        let output = assert_ok!(runner.execute("echo piped", Duration::from_secs(5)).await);
        assert_eq!(output, "piped");
    }

    /// A timed out interpreter is killed before the error is returned
    #[tokio::test]
    async fn test_timeout_kills_interpreter() {
        init_tracing();

        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("finished");
        let script = format!("sleep 1; touch '{}'", marker.display());

        let start = Instant::now();
        let err = assert_err!(shell().execute(&script, Duration::from_millis(100)).await);
        assert!(err.is_timeout(), "expected timeout, got {:?}", err);
        assert!(start.elapsed() < Duration::from_secs(1));

        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert!(!marker.exists(), "interpreter kept running after timeout");
    }

    /// Scripts fed through stdin still honour the timeout
    #[tokio::test]
    async fn test_stdin_script_times_out() {
        init_tracing();

        let runner = applescript::Osascript::new(applescript::ScriptConfig {
            script_flag: None,
            ..shell_config()
        });
        let script = format!("sleep 5\n{}", "# filler line for the pipe\n".repeat(10_000));

        let start = Instant::now();
        let err = assert_err!(runner.execute(&script, Duration::from_millis(300)).await);
        assert!(err.is_timeout(), "expected timeout, got {:?}", err);
        assert!(start.elapsed() < Duration::from_secs(2));
    }

    /// Processes the script started die with the interpreter on timeout
    #[tokio::test]
    async fn test_timeout_kills_grandchildren() {
        init_tracing();

        let dir = tempfile::tempdir().unwrap();
        let pid_file = dir.path().join("sleep.pid");
        let script = format!("sleep 5 & echo $! > '{}'; wait", pid_file.display());

        let start = Instant::now();
        let err = assert_err!(shell().execute(&script, Duration::from_millis(500)).await);
        assert!(err.is_timeout(), "expected timeout, got {:?}", err);
        assert!(start.elapsed() < Duration::from_secs(2));

        let pid: i32 = std::fs::read_to_string(&pid_file)
            .unwrap()
            .trim()
            .parse()
            .unwrap();
        let deadline = Instant::now() + Duration::from_secs(2);
        while process_alive(pid) && Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        assert!(!process_alive(pid), "background sleep {} survived the timeout", pid);
    }

    /// A missing interpreter is a spawn failure, not a panic
    #[tokio::test]
    async fn test_missing_interpreter() {
        init_tracing();

        let runner = applescript::Osascript::new(applescript::ScriptConfig {
            interpreter: std::path::PathBuf::from("/nonexistent/osascript"),
            ..shell_config()
        });
        let err = assert_err!(runner.execute("echo hi", Duration::from_secs(1)).await);
        assert!(matches!(err, AppleScriptError::SpawnFailed(..)));
    }

    /// Captured output stops at the configured cap
    #[tokio::test]
    async fn test_output_is_capped() {
        init_tracing();

        let runner = applescript::Osascript::new(applescript::ScriptConfig {
            max_output_bytes: 4,
            ..shell_config()
        });
        let output = assert_ok!(runner.execute("printf abcdefgh", Duration::from_secs(5)).await);
        assert_eq!(output, "abcd");
    }

    /// Output far beyond the cap is truncated, not turned into a failure
    #[tokio::test]
    async fn test_large_output_is_truncated_not_failed() {
        init_tracing();

        let runner = applescript::Osascript::new(applescript::ScriptConfig {
            max_output_bytes: 4,
            ..shell_config()
        });
        let output = assert_ok!(
            runner
                .execute("head -c 200000 /dev/zero | tr '\\0' a", Duration::from_secs(5))
                .await
        );
        assert_eq!(output, "aaaa");
    }

    /// Concurrent calls run independently through the trait object
    #[tokio::test]
    async fn test_concurrent_runs() {
        init_tracing();

        let runner: Arc<dyn ScriptRunner> = Arc::new(shell());
        let calls = (0..8).map(|i| {
            let runner = runner.clone();
            async move { runner.run(&format!("sleep 0.1; echo {}", i)).await }
        });

        let results = futures::future::join_all(calls).await;
        for (i, result) in results.into_iter().enumerate() {
            assert_eq!(result.unwrap(), i.to_string());
        }
    }

    /// Executor output flows straight into the parser
    #[tokio::test]
    async fn test_execute_then_parse_records() {
        init_tracing();

        let script = r#"echo '{{title:"Standup", start_date:"2025-04-01 09:00:00", attendees:3}, {title:"Retro", start_date:missing value, attendees:0}}'"#;
        let output = assert_ok!(shell().execute(script, Duration::from_secs(5)).await);

        let events: Vec<_> = applescript::parse_list(&output)
            .iter()
            .map(|item| applescript::parse_record(item))
            .collect();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0]["title"], ParsedValue::from("Standup"));
        assert_eq!(events[0]["attendees"], ParsedValue::Integer(3));
        assert!(events[1]["start_date"].is_missing());
    }

    #[test]
    fn test_format_then_parse_list() {
        let values = ParsedValue::from(vec![
            ParsedValue::Integer(1),
            ParsedValue::from("two"),
            ParsedValue::Bool(true),
            ParsedValue::Missing,
        ]);
        let literal = applescript::format_value(&values);
        assert_eq!(literal, r#"{1, "two", true, missing value}"#);

        let decoded = applescript::parse_list_values(&literal);
        assert_eq!(decoded, vec![
            ParsedValue::Integer(1),
            ParsedValue::from("two"),
            ParsedValue::Bool(true),
            ParsedValue::Missing,
        ]);
    }

    #[test]
    fn test_quote_escapes_user_text() {
        assert_eq!(
            applescript::quote(r#"say "hi" \ bye"#),
            r#""say \"hi\" \\ bye""#
        );
    }

    /// Scalars survive format -> parse
    #[test]
    fn test_random_scalars_round_trip() {
        use rand::Rng;

        let mut rng = rand::thread_rng();
        for _ in 0..500 {
            let value = match rng.gen_range(0..4) {
                0 => ParsedValue::Integer(rng.gen_range(i64::MIN..=i64::MAX)),
                1 => ParsedValue::Float(rng.gen_range(-1.0e12..1.0e12)),
                2 => ParsedValue::Bool(rng.gen_range(0..2) == 1),
                _ => ParsedValue::String(random_text(&mut rng)),
            };

            let literal = applescript::format_value(&value);
            assert_eq!(applescript::parse_scalar(&literal), value, "literal {}", literal);
        }
    }

    #[test]
    fn test_scalar_record_round_trip() {
        let mut record = applescript::Record::new();
        record.insert("note".to_string(), ParsedValue::from("a, b: {c} := d"));
        record.insert("n".to_string(), ParsedValue::Integer(1));
        record.insert("f".to_string(), ParsedValue::Float(2.5));
        record.insert("done".to_string(), ParsedValue::Bool(false));
        record.insert("due".to_string(), ParsedValue::Missing);

        let literal = applescript::format_value(&ParsedValue::Record(record.clone()));
        assert_eq!(
            literal,
            r#"{note:"a, b: {c} := d", n:1, f:2.5, done:false, due:missing value}"#
        );
        let parsed = applescript::parse_record(&literal);
        assert_eq!(parsed, record);
        assert!(parsed.keys().eq(record.keys()));
    }

    /// Records of random scalars survive format -> parse with field order intact
    #[test]
    fn test_random_records_round_trip() {
        use rand::Rng;

        let mut rng = rand::thread_rng();
        for _ in 0..200 {
            let mut record = applescript::Record::new();
            for i in 0..rng.gen_range(1..6) {
                let value = match rng.gen_range(0..5) {
                    0 => ParsedValue::Integer(rng.gen_range(-1_000_000..1_000_000)),
                    1 => ParsedValue::Float(rng.gen_range(-1.0e6..1.0e6)),
                    2 => ParsedValue::Bool(rng.gen_range(0..2) == 1),
                    3 => ParsedValue::Missing,
                    _ => ParsedValue::String(random_text(&mut rng)),
                };
                record.insert(format!("field{}", i), value);
            }

            let literal = applescript::format_value(&ParsedValue::Record(record.clone()));
            let parsed = applescript::parse_record(&literal);
            assert_eq!(parsed, record, "literal {}", literal);
            assert!(parsed.keys().eq(record.keys()), "field order changed in {}", literal);
        }
    }
}
