//! Scoped lifetime of the auxiliary mock server.
//!
//! [`MockServer::start`] acquires the service and [`MockServer::stop`]
//! releases it. Callers stop explicitly on both success and failure; the
//! drop guard only covers panics and dropped futures.

use crate::config::MockServerSettings;
use crate::error::{ConfigError, ProcessError, Result};
use crate::process::{CommandRunner, Invocation};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Upper bound on the blocking stop performed from drop
const DROP_STOP_TIMEOUT: Duration = Duration::from_secs(60);

/// A started mock server. Stops the service when released.
pub struct MockServer<'r, R: CommandRunner> {
    runner: &'r R,
    stop_argv: Vec<String>,
    cwd: PathBuf,
    running: bool,
}

fn invocation(argv: &[String], field: &str, cwd: &Path) -> Result<Invocation> {
    Invocation::from_argv(argv)
        .map(|inv| inv.current_dir(cwd))
        .ok_or_else(|| {
            ConfigError::InvalidValue {
                field: format!("mock_server.{}", field),
                reason: "command must not be empty".to_string(),
            }
            .into()
        })
}

impl<'r, R: CommandRunner> MockServer<'r, R> {
    /// Build and start the mock server.
    ///
    /// If the start command fails the stop command still runs, since a
    /// partially started service may have left containers behind.
    pub async fn start(runner: &'r R, settings: &MockServerSettings, cwd: &Path) -> Result<Self> {
        let start = invocation(&settings.start, "start", cwd)?;
        invocation(&settings.stop, "stop", cwd)?;

        let mut server = Self {
            runner,
            stop_argv: settings.stop.clone(),
            cwd: cwd.to_path_buf(),
            running: true,
        };

        let outcome = runner.run(&start).await?;
        if !outcome.success() {
            if let Err(e) = server.release().await {
                log::warn!("Stopping mock server after failed start: {}", e);
            }
            return Err(ProcessError::Failed {
                command: start.display(),
                code: outcome.code,
            }
            .into());
        }

        Ok(server)
    }

    /// Stop the mock server
    pub async fn stop(mut self) -> Result<()> {
        self.release().await
    }

    async fn release(&mut self) -> Result<()> {
        self.running = false;
        let stop = invocation(&self.stop_argv, "stop", &self.cwd)?;
        let outcome = self.runner.run(&stop).await?;
        if !outcome.success() {
            return Err(ProcessError::Failed {
                command: stop.display(),
                code: outcome.code,
            }
            .into());
        }
        Ok(())
    }
}

impl<R: CommandRunner> Drop for MockServer<'_, R> {
    fn drop(&mut self) {
        if !self.running {
            return;
        }
        if let Some(stop) = Invocation::from_argv(&self.stop_argv) {
            log::warn!("Mock server still running; stopping it with '{}'", stop.display());
            let stop = stop.current_dir(&self.cwd).timeout(DROP_STOP_TIMEOUT);
            if !self.runner.run_blocking(&stop) {
                log::warn!("Stopping the mock server from drop failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::recorder::RecordingRunner;

    #[tokio::test]
    async fn test_start_then_stop() {
        let runner = RecordingRunner::new();
        let settings = MockServerSettings::default();
        let server = MockServer::start(&runner, &settings, Path::new("/work"))
            .await
            .unwrap();
        server.stop().await.unwrap();

        assert_eq!(
            runner.commands(),
            vec!["make -C mock_connect image up", "make -C mock_connect down"]
        );
        assert!(runner.calls().iter().all(|c| c.cwd.as_deref() == Some(Path::new("/work"))));
    }

    #[tokio::test]
    async fn test_failed_start_still_stops() {
        let runner = RecordingRunner::new().fail_when("image up", 2);
        let settings = MockServerSettings::default();
        let result = MockServer::start(&runner, &settings, Path::new("/work")).await;

        assert_eq!(result.err().map(|e| e.exit_code()), Some(2));
        assert_eq!(runner.commands().last().map(String::as_str), Some("make -C mock_connect down"));
    }

    #[tokio::test]
    async fn test_dropped_server_is_stopped() {
        let runner = RecordingRunner::new();
        let settings = MockServerSettings::default();
        let server = MockServer::start(&runner, &settings, Path::new("/work"))
            .await
            .unwrap();
        drop(server);

        let stop = runner.calls().pop().unwrap();
        assert_eq!(stop.display(), "make -C mock_connect down");
        assert_eq!(stop.timeout, Some(DROP_STOP_TIMEOUT));
        assert_eq!(stop.cwd.as_deref(), Some(Path::new("/work")));
    }
}
