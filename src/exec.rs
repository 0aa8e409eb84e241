//! External tool invocation
//!
//! Every external process the harness spawns goes through [`ToolRunner`]: output
//! is captured rather than streamed so failures can be reported as data, and each
//! invocation is bounded by the configured timeout. A hung compiler or analyzer
//! therefore stalls only its own directory's worker, never the whole run.

use anyhow::{Context, Result};
use std::ffi::OsStr;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Captured result of one external invocation
#[derive(Debug, Clone)]
pub struct CapturedOutput {
    /// Process exit code, if the process exited normally
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    /// True when the invocation exceeded the timeout and was killed
    pub timed_out: bool,
}

impl CapturedOutput {
    /// True iff the process exited with status zero
    pub fn success(&self) -> bool {
        !self.timed_out && self.status == Some(0)
    }

    /// Combined diagnostic text for failure reporting
    pub fn diagnostics(&self) -> String {
        if self.timed_out {
            return "invocation timed out".to_string();
        }
        let mut text = String::new();
        if !self.stderr.trim().is_empty() {
            text.push_str(self.stderr.trim());
        }
        if !self.stdout.trim().is_empty() {
            if !text.is_empty() {
                text.push('\n');
            }
            text.push_str(self.stdout.trim());
        }
        if text.is_empty() {
            text = format!("exit status {:?}", self.status);
        }
        text
    }

    /// Full stdout+stderr transcript, in that order
    pub fn transcript(&self) -> String {
        let mut text = self.stdout.clone();
        text.push_str(&self.stderr);
        text
    }
}

/// Spawns external tools with captured output and a hard timeout
#[derive(Debug, Clone)]
pub struct ToolRunner {
    timeout: Duration,
}

impl ToolRunner {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Runs a tool to completion, capturing stdout and stderr
    ///
    /// Returns `Err` only when the process cannot be spawned; a non-zero exit or
    /// a timeout is reported through the returned [`CapturedOutput`] so callers
    /// can treat failure as a value.
    pub async fn run<I, S>(
        &self,
        program: &Path,
        args: I,
        cwd: Option<&Path>,
        envs: &[(String, String)],
    ) -> Result<CapturedOutput>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut command = Command::new(program);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if let Some(dir) = cwd {
            command.current_dir(dir);
        }
        for (key, value) in envs {
            command.env(key, value);
        }

        debug!(program = %program.display(), cwd = ?cwd, "Spawning external tool");

        let child = command
            .spawn()
            .with_context(|| format!("Failed to spawn {}", program.display()))?;

        match timeout(self.timeout, child.wait_with_output()).await {
            Ok(output) => {
                let output = output
                    .with_context(|| format!("Failed to wait for {}", program.display()))?;
                let captured = CapturedOutput {
                    status: output.status.code(),
                    stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                    stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                    timed_out: false,
                };
                if !captured.success() {
                    debug!(
                        program = %program.display(),
                        status = ?captured.status,
                        "External tool exited non-zero"
                    );
                }
                Ok(captured)
            }
            Err(_) => {
                // kill_on_drop reaps the child when the future is dropped here
                warn!(
                    program = %program.display(),
                    timeout_secs = self.timeout.as_secs(),
                    "External tool timed out"
                );
                Ok(CapturedOutput {
                    status: None,
                    stdout: String::new(),
                    stderr: String::new(),
                    timed_out: true,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn runner() -> ToolRunner {
        ToolRunner::new(Duration::from_secs(5))
    }

    #[tokio::test]
    async fn test_successful_invocation() {
        let output = runner()
            .run(Path::new("true"), Vec::<&str>::new(), None, &[])
            .await
            .unwrap();

        assert!(output.success());
        assert_eq!(output.status, Some(0));
        assert!(!output.timed_out);
    }

    #[tokio::test]
    async fn test_failing_invocation() {
        let output = runner()
            .run(Path::new("false"), Vec::<&str>::new(), None, &[])
            .await
            .unwrap();

        assert!(!output.success());
        assert_eq!(output.status, Some(1));
    }

    #[tokio::test]
    async fn test_captured_stdout() {
        let output = runner()
            .run(Path::new("echo"), ["hello"], None, &[])
            .await
            .unwrap();

        assert!(output.success());
        assert_eq!(output.stdout.trim(), "hello");
    }

    #[tokio::test]
    async fn test_env_propagation() {
        let envs = vec![("BRIDGECHECK_TEST_VAR".to_string(), "flagged".to_string())];
        let output = runner()
            .run(
                Path::new("sh"),
                ["-c", "echo $BRIDGECHECK_TEST_VAR"],
                None,
                &envs,
            )
            .await
            .unwrap();

        assert_eq!(output.stdout.trim(), "flagged");
    }

    #[tokio::test]
    async fn test_spawn_failure_is_error() {
        let result = runner()
            .run(
                &PathBuf::from("/nonexistent/tool-binary"),
                Vec::<&str>::new(),
                None,
                &[],
            )
            .await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_timeout_reported_as_value() {
        let output = ToolRunner::new(Duration::from_millis(100))
            .run(Path::new("sleep"), ["5"], None, &[])
            .await
            .unwrap();

        assert!(output.timed_out);
        assert!(!output.success());
        assert_eq!(output.diagnostics(), "invocation timed out");
    }

    #[test]
    fn test_diagnostics_prefers_stderr() {
        let output = CapturedOutput {
            status: Some(1),
            stdout: "stdout text".to_string(),
            stderr: "stderr text".to_string(),
            timed_out: false,
        };
        let diag = output.diagnostics();
        assert!(diag.starts_with("stderr text"));
        assert!(diag.contains("stdout text"));
    }

    #[test]
    fn test_diagnostics_falls_back_to_status() {
        let output = CapturedOutput {
            status: Some(3),
            stdout: String::new(),
            stderr: String::new(),
            timed_out: false,
        };
        assert!(output.diagnostics().contains("3"));
    }
}
