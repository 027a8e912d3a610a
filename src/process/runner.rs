//! Command runner seam and the tokio-backed implementation.

use super::{ExitOutcome, Invocation, blocking_cleanup};
use crate::cli::OutputManager;
use crate::error::{ProcessError, Result};
use std::future::Future;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;

/// Bound for blocking runs that carry no timeout of their own
const BLOCKING_TIMEOUT: Duration = Duration::from_secs(30);

/// Executes invocations.
///
/// `run` reports the exit outcome and leaves judging it to the caller;
/// `capture` returns stdout and fails on a non-zero exit.
pub trait CommandRunner: Send + Sync {
    /// Run to completion, streaming output to the terminal
    fn run(&self, invocation: &Invocation) -> impl Future<Output = Result<ExitOutcome>> + Send;

    /// Run to completion and return stdout
    fn capture(&self, invocation: &Invocation) -> impl Future<Output = Result<String>> + Send;

    /// Run from a synchronous context such as `Drop`, waiting at most the
    /// invocation's timeout. Returns whether the command succeeded.
    fn run_blocking(&self, invocation: &Invocation) -> bool;
}

/// Spawns real child processes with tokio.
///
/// Children are killed when the future driving them is dropped, so
/// cancelling an operation never leaves a stray `docker run` behind.
#[derive(Debug, Clone)]
pub struct SystemRunner {
    output: OutputManager,
}

impl SystemRunner {
    /// Create a runner that streams child stdout through `output`
    pub fn new(output: OutputManager) -> Self {
        Self { output }
    }

    fn resolve(program: &str) -> Result<PathBuf> {
        which::which(program).map_err(|source| {
            ProcessError::NotFound {
                program: program.to_string(),
                source,
            }
            .into()
        })
    }

    fn command(invocation: &Invocation) -> Result<Command> {
        let mut command = Command::new(Self::resolve(&invocation.program)?);
        command
            .args(&invocation.args)
            .envs(&invocation.env)
            .kill_on_drop(true);
        if let Some(dir) = &invocation.cwd {
            command.current_dir(dir);
        }
        Ok(command)
    }

    fn spawn_failed(invocation: &Invocation, source: std::io::Error) -> ProcessError {
        ProcessError::SpawnFailed {
            command: invocation.display(),
            source,
        }
    }
}

/// Print `stdout` line by line until EOF.
///
/// Bytes are decoded lossily. The pipe is always drained, since closing it
/// early would kill a child that is still writing.
async fn stream_lines<S: AsyncRead + Unpin>(stdout: S, output: &OutputManager) {
    let mut reader = BufReader::new(stdout);
    let mut line = Vec::new();
    loop {
        line.clear();
        match reader.read_until(b'\n', &mut line).await {
            Ok(0) => break,
            Ok(_) => {
                let text = String::from_utf8_lossy(&line);
                output.indent(text.trim_end_matches(['\n', '\r']));
            }
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => {
                log::warn!("Child output unreadable, discarding the rest: {}", e);
                if let Err(e) = tokio::io::copy(&mut reader, &mut tokio::io::sink()).await {
                    log::debug!("Draining child output failed: {}", e);
                }
                break;
            }
        }
    }
}

impl CommandRunner for SystemRunner {
    async fn run(&self, invocation: &Invocation) -> Result<ExitOutcome> {
        log::debug!("Running: {}", invocation.display());
        if !invocation.env.is_empty() {
            log::debug!(
                "Injected variables: {}",
                invocation.env.keys().cloned().collect::<Vec<_>>().join(", ")
            );
        }

        let mut command = Self::command(invocation)?;
        if invocation.interactive {
            command
                .stdin(Stdio::inherit())
                .stdout(Stdio::inherit())
                .stderr(Stdio::inherit());
        } else if invocation.quiet {
            command
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null());
        } else {
            command
                .stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::inherit());
        }

        let mut child = command
            .spawn()
            .map_err(|e| Self::spawn_failed(invocation, e))?;
        let stdout = child.stdout.take();
        let output = &self.output;

        let finish = async {
            if let Some(stdout) = stdout {
                stream_lines(stdout, output).await;
            }
            child.wait().await
        };

        let status = match invocation.timeout {
            None => finish.await?,
            Some(limit) => {
                let waited = tokio::time::timeout(limit, finish).await;
                match waited {
                    Ok(status) => status?,
                    Err(_elapsed) => {
                        output.warn(&format!(
                            "'{}' timed out, terminating...",
                            invocation.display()
                        ));
                        if let Err(e) = child.kill().await {
                            log::warn!("Failed to kill '{}': {}", invocation.display(), e);
                        }
                        return Err(ProcessError::TimedOut {
                            command: invocation.display(),
                            seconds: limit.as_secs(),
                        }
                        .into());
                    }
                }
            }
        };

        let outcome = ExitOutcome::from(status);
        log::debug!("'{}' exited with {:?}", invocation.display(), outcome.code);
        Ok(outcome)
    }

    async fn capture(&self, invocation: &Invocation) -> Result<String> {
        log::debug!("Capturing: {}", invocation.display());

        let mut command = Self::command(invocation)?;
        command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit());

        let pending = command.output();
        let output = match invocation.timeout {
            None => pending.await,
            Some(limit) => tokio::time::timeout(limit, pending).await.map_err(|_| {
                ProcessError::TimedOut {
                    command: invocation.display(),
                    seconds: limit.as_secs(),
                }
            })?,
        }
        .map_err(|e| Self::spawn_failed(invocation, e))?;

        if !output.status.success() {
            return Err(ProcessError::Failed {
                command: invocation.display(),
                code: output.status.code(),
            }
            .into());
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn run_blocking(&self, invocation: &Invocation) -> bool {
        log::debug!("Running (blocking): {}", invocation.display());
        blocking_cleanup(
            &invocation.program,
            &invocation.args,
            invocation.cwd.as_deref(),
            invocation.timeout.unwrap_or(BLOCKING_TIMEOUT),
        )
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn runner() -> SystemRunner {
        SystemRunner::new(OutputManager::new(false, true))
    }

    #[tokio::test]
    async fn test_run_reports_exit_code() {
        let ok = runner()
            .run(&Invocation::new("sh").args(["-c", "exit 0"]))
            .await
            .unwrap();
        assert!(ok.success());

        let failed = runner()
            .run(&Invocation::new("sh").args(["-c", "exit 7"]))
            .await
            .unwrap();
        assert_eq!(failed.code, Some(7));
    }

    #[tokio::test]
    async fn test_non_utf8_output_does_not_fail_child() {
        let script = "printf 'ok\\n\\377\\376 latin1\\n'; sleep 0.2; \
                      i=0; while [ $i -lt 20000 ]; do echo line $i; i=$((i+1)); done; exit 0";
        let outcome = runner()
            .run(&Invocation::new("sh").args(["-c", script]))
            .await
            .unwrap();
        assert!(outcome.success(), "exit 0 reported as {:?}", outcome);
    }

    #[tokio::test]
    async fn test_injected_env_reaches_child() {
        let out = runner()
            .capture(
                &Invocation::new("sh")
                    .args(["-c", "printf %s \"$INJECTED\""])
                    .env("INJECTED", "value"),
            )
            .await
            .unwrap();
        assert_eq!(out, "value");
    }

    #[tokio::test]
    async fn test_missing_program() {
        let err = runner()
            .run(&Invocation::new("definitely-not-a-real-program-xyz"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            crate::error::ReleaseError::Process(ProcessError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_timeout_kills_child() {
        let err = runner()
            .run(
                &Invocation::new("sleep")
                    .arg("5")
                    .timeout(std::time::Duration::from_millis(100)),
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            crate::error::ReleaseError::Process(ProcessError::TimedOut { .. })
        ));
    }
}
