//! RAII guard for Docker container cleanup.
//!
//! A named container is force-removed if the run driving it is abandoned
//! (cancellation, timeout or panic). Normal completion disarms the guard;
//! `--rm` already removes the container on exit.

use crate::process::{CommandRunner, Invocation};
use std::time::Duration;

/// Upper bound on waiting for `docker rm -f` during drop
const CLEANUP_TIMEOUT: Duration = Duration::from_secs(5);

/// Force-removes a named container on drop unless disarmed
pub struct ContainerGuard<'r, R: CommandRunner> {
    runner: &'r R,
    name: String,
    armed: bool,
}

impl<'r, R: CommandRunner> ContainerGuard<'r, R> {
    /// Guard the container called `name`
    pub fn new(runner: &'r R, name: impl Into<String>) -> Self {
        Self {
            runner,
            name: name.into(),
            armed: true,
        }
    }

    /// Container name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The run finished; nothing to clean up
    pub fn disarm(&mut self) {
        self.armed = false;
    }

    /// `docker rm -f <name>`, quiet and bounded
    fn removal(&self) -> Invocation {
        Invocation::new("docker")
            .args(["rm", "-f", self.name.as_str()])
            .quiet()
            .timeout(CLEANUP_TIMEOUT)
    }
}

impl<R: CommandRunner> Drop for ContainerGuard<'_, R> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        log::debug!("Removing abandoned container {}", self.name);
        if !self.runner.run_blocking(&self.removal()) {
            eprintln!(
                "Warning: Failed to clean up container '{}'. Remove it with: docker rm -f {}",
                self.name, self.name
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::recorder::RecordingRunner;

    #[test]
    fn test_disarmed_guard_does_nothing() {
        let runner = RecordingRunner::new();
        let mut guard = ContainerGuard::new(&runner, "rsconnect-python-3_8-test");
        assert_eq!(guard.name(), "rsconnect-python-3_8-test");
        guard.disarm();
        drop(guard);
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn test_armed_guard_removes_container() {
        let runner = RecordingRunner::new();
        drop(ContainerGuard::new(&runner, "rsconnect-python-3_8-test"));

        let calls = runner.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].display(), "docker rm -f rsconnect-python-3_8-test");
        assert!(calls[0].quiet);
        assert_eq!(calls[0].timeout, Some(CLEANUP_TIMEOUT));
    }
}
