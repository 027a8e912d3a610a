//! Blocking best-effort cleanup for drop guards.
//!
//! Drop cannot await, so guards fall back to `std::process` with a bounded
//! wait. Errors are logged and swallowed; drop must never panic.

use std::path::Path;
use std::process::{Command, Stdio};
use std::time::Duration;
use wait_timeout::ChildExt;

/// Run `program args..` and wait at most `timeout` for it to finish.
///
/// Returns whether the command completed successfully.
pub(crate) fn blocking_cleanup(
    program: &str,
    args: &[String],
    cwd: Option<&Path>,
    timeout: Duration,
) -> bool {
    let label = format!("{} {}", program, args.join(" "));

    let mut command = Command::new(program);
    if let Some(dir) = cwd {
        command.current_dir(dir);
    }
    let mut child = match command
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
    {
        Ok(child) => child,
        Err(e) => {
            log::warn!("Cleanup '{}' could not start: {}", label, e);
            return false;
        }
    };

    match child.wait_timeout(timeout) {
        Ok(Some(status)) if status.success() => true,
        Ok(Some(status)) => {
            log::warn!(
                "Cleanup '{}' failed (exit code: {})",
                label,
                status.code().unwrap_or(-1)
            );
            false
        }
        Ok(None) => {
            let _ = child.kill();
            let _ = child.wait();
            log::warn!(
                "Cleanup '{}' timed out after {} seconds",
                label,
                timeout.as_secs()
            );
            false
        }
        Err(e) => {
            let _ = child.kill();
            let _ = child.wait();
            log::warn!("Cleanup '{}' could not be awaited: {}", label, e);
            false
        }
    }
}
