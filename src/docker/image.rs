//! Docker image management.
//!
//! Composes the per-environment test images and checks that the Docker
//! daemon is reachable before anything is built or run.

use crate::config::BuildConfig;
use crate::environment::EnvironmentTag;
use crate::error::{ProcessError, ReleaseError, Result};
use crate::process::{CommandRunner, Invocation};
use std::time::Duration;

/// Timeout for Docker info check (5 seconds)
pub const DOCKER_INFO_TIMEOUT: Duration = Duration::from_secs(5);

/// Timeout for Docker image build operations (30 minutes)
/// Image builds can take a long time due to base image downloads and apt updates
pub const DOCKER_BUILD_TIMEOUT: Duration = Duration::from_secs(1800);

#[cfg(target_os = "macos")]
const DOCKER_START_HELP: &str = "Start Docker Desktop from Applications or Spotlight";

#[cfg(target_os = "linux")]
const DOCKER_START_HELP: &str = "Start Docker daemon: sudo systemctl start docker";

#[cfg(target_os = "windows")]
const DOCKER_START_HELP: &str = "Start Docker Desktop from the Start menu";

#[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
const DOCKER_START_HELP: &str = "Start the Docker daemon";

/// `docker info`, quiet and bounded
pub fn docker_info() -> Invocation {
    Invocation::new("docker")
        .arg("info")
        .quiet()
        .timeout(DOCKER_INFO_TIMEOUT)
}

/// `docker build -t <repo>:<tag> --build-arg BASE_IMAGE=<base> .` in the project
pub fn build_image(config: &BuildConfig, tag: &EnvironmentTag) -> Invocation {
    Invocation::new("docker")
        .args([
            "build".to_string(),
            "-t".to_string(),
            tag.image_name(&config.environments),
            "--build-arg".to_string(),
            format!("BASE_IMAGE={}", tag.base_image(&config.environments)),
            ".".to_string(),
        ])
        .current_dir(&config.project_dir)
        .timeout(DOCKER_BUILD_TIMEOUT)
}

/// Checks if Docker is installed and the daemon is running.
pub async fn check_docker_available<R: CommandRunner>(runner: &R) -> Result<()> {
    let unavailable = |reason: String| -> ReleaseError {
        ProcessError::Unavailable {
            tool: "Docker".to_string(),
            reason,
        }
        .into()
    };

    match runner.run(&docker_info()).await {
        Ok(outcome) if outcome.success() => Ok(()),
        Ok(outcome) => Err(unavailable(format!(
            "daemon is not responding (exit code: {}).\n\
             \n\
             {}\n\
             \n\
             If Docker is not installed, visit: https://docs.docker.com/get-docker/",
            outcome.code.unwrap_or(-1),
            DOCKER_START_HELP
        ))),
        Err(ReleaseError::Process(ProcessError::TimedOut { seconds, .. })) => {
            Err(unavailable(format!(
                "daemon check timed out after {} seconds.\n\
                 \n\
                 {}\n\
                 \n\
                 If Docker is running, check: docker ps",
                seconds, DOCKER_START_HELP
            )))
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::recorder::RecordingRunner;

    #[test]
    fn test_build_image_invocation() {
        let config = BuildConfig::for_project("/work");
        let tag = EnvironmentTag::parse("3.6").unwrap();
        let inv = build_image(&config, &tag);
        assert_eq!(
            inv.display(),
            "docker build -t rsconnect-python:3.6 --build-arg BASE_IMAGE=python:3.6-slim ."
        );
        assert_eq!(inv.cwd.as_deref(), Some(std::path::Path::new("/work")));
        assert!(inv.env.is_empty());
    }

    #[tokio::test]
    async fn test_daemon_down_is_reported() {
        let runner = RecordingRunner::new().fail_when("docker info", 1);
        let err = check_docker_available(&runner).await.unwrap_err();
        assert!(err.to_string().contains("daemon is not responding"));
    }
}
