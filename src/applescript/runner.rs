// Out-of-process script execution
#![allow(dead_code)]

use crate::applescript::config::ScriptConfig;
use crate::applescript::error::{AppleScriptError, Result};
use crate::telemetry;
use async_trait::async_trait;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Anything that can run a script and hand back its standard output.
#[async_trait]
pub trait ScriptRunner: Send + Sync {
    /// Run with the runner's default timeout
    async fn run(&self, script: &str) -> Result<String>;
}

/// Runs scripts through the configured interpreter, one process per call.
#[derive(Debug, Clone)]
pub struct Osascript {
    config: ScriptConfig,
}

impl Osascript {
    pub fn new(config: ScriptConfig) -> Self {
        debug!(
            interpreter = %config.interpreter.display(),
            timeout_secs = config.timeout_secs,
            max_output_bytes = config.max_output_bytes,
            "initializing script runner"
        );
        Self { config }
    }

    pub fn config(&self) -> &ScriptConfig {
        &self.config
    }

    /// Execute a script, waiting at most `timeout` for the interpreter to exit.
    ///
    /// Returns trimmed stdout on exit code 0. On timeout the child is killed
    /// and reaped before [`AppleScriptError::Timeout`] is returned.
    pub async fn execute(&self, script: &str, timeout: Duration) -> Result<String> {
        telemetry::timed_async(
            "applescript.execute",
            (script, timeout),
            self.spawn_and_wait(script, timeout),
        )
        .await
    }

    async fn spawn_and_wait(&self, script: &str, timeout: Duration) -> Result<String> {
        let interpreter = self.config.interpreter.display().to_string();
        let start = Instant::now();

        let mut cmd = Command::new(&self.config.interpreter);
        cmd.stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        // Own process group, so a timeout can take down anything the script spawned.
        #[cfg(unix)]
        cmd.process_group(0);

        match &self.config.script_flag {
            Some(flag) => {
                cmd.arg(flag).arg(script).stdin(Stdio::null());
            }
            None => {
                cmd.stdin(Stdio::piped());
            }
        }

        let mut child = cmd
            .spawn()
            .map_err(|e| AppleScriptError::SpawnFailed(interpreter.clone(), e.to_string()))?;
        let pid = child.id();

        debug!(
            interpreter = %interpreter,
            pid = pid.unwrap_or_default(),
            script_bytes = script.len(),
            "interpreter spawned"
        );

        // Drain both pipes concurrently so a full pipe never stalls the child.
        let limit = self.config.max_output_bytes;
        let stdout_task = tokio::spawn(read_stream(child.stdout.take(), limit));
        let stderr_task = tokio::spawn(read_stream(child.stderr.take(), limit));

        // Feed stdin from its own task so the write is bounded by the timeout too.
        let stdin_task = child.stdin.take().map(|mut stdin| {
            let script = script.to_owned();
            tokio::spawn(async move {
                // The interpreter may exit before reading everything; its exit
                // status reports that case.
                if let Err(e) = stdin.write_all(script.as_bytes()).await {
                    warn!(error = %e, "failed to write script to stdin");
                }
            })
        });

        let status = match tokio::time::timeout(timeout, child.wait()).await {
            Ok(status) => status?,
            Err(_elapsed) => {
                kill_process_group(pid);
                if let Err(e) = child.start_kill() {
                    warn!(error = %e, "failed to kill timed out interpreter");
                }
                // Reap so no zombie is left behind.
                if let Err(e) = child.wait().await {
                    warn!(error = %e, "failed to reap timed out interpreter");
                }
                stdout_task.abort();
                stderr_task.abort();
                if let Some(task) = stdin_task {
                    task.abort();
                }
                info!(
                    interpreter = %interpreter,
                    timeout_ms = timeout.as_millis() as u64,
                    "script timed out, interpreter killed"
                );
                return Err(AppleScriptError::Timeout(timeout));
            }
        };

        let stdout = stdout_task.await.unwrap_or_default();
        let stderr = stderr_task.await.unwrap_or_default();
        let code = status.code().unwrap_or(-1);

        debug!(
            exit_code = code,
            duration_ms = start.elapsed().as_millis() as u64,
            stdout_bytes = stdout.len(),
            stderr_bytes = stderr.len(),
            "interpreter exited"
        );

        if !status.success() {
            return Err(AppleScriptError::ExecutionFailed {
                code,
                stderr: String::from_utf8_lossy(&stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&stdout).trim().to_string())
    }
}

#[async_trait]
impl ScriptRunner for Osascript {
    async fn run(&self, script: &str) -> Result<String> {
        self.execute(script, self.config.timeout()).await
    }
}

impl Default for Osascript {
    fn default() -> Self {
        Self::new(ScriptConfig::default())
    }
}

/// Read a stream to the end, keeping at most `limit` bytes.
///
/// Output past the cap is drained and discarded; closing the pipe early
/// would kill the writer with SIGPIPE.
async fn read_stream<R: AsyncRead + Unpin>(handle: Option<R>, limit: usize) -> Vec<u8> {
    let mut buf = Vec::new();
    if let Some(mut h) = handle {
        let _ = (&mut h).take(limit as u64).read_to_end(&mut buf).await;
        let _ = tokio::io::copy(&mut h, &mut tokio::io::sink()).await;
    }
    buf
}

/// SIGKILL the interpreter's process group, grandchildren included.
#[cfg(unix)]
fn kill_process_group(pid: Option<u32>) {
    let Some(pid) = pid else {
        return;
    };
    // The child leads its own group, so the group id is its pid.
    let rc = unsafe { libc::killpg(pid as libc::pid_t, libc::SIGKILL) };
    if rc != 0 {
        warn!(pid = pid, error = %std::io::Error::last_os_error(), "failed to kill process group");
    }
}

#[cfg(not(unix))]
fn kill_process_group(_pid: Option<u32>) {}
