//! Named build and release operations.
//!
//! [`Orchestrator`] maps each operation to a sequence of external process
//! invocations and fails fast on the first non-zero exit. Every process goes
//! through a [`CommandRunner`], so the sequencing can be exercised without
//! Docker, Python, or AWS installed.

use crate::cli::OutputManager;
use crate::clean::{clean_build_outputs, clean_state_dirs};
use crate::config::BuildConfig;
use crate::docker::{ContainerGuard, ContainerRun, build_image, check_docker_available};
use crate::environment::{EnvironmentTag, fan_out_tags, resolve_tag};
use crate::error::{ProcessError, ReleaseError, Result};
use crate::mock_server::{
    CONNECT_API_KEY, CONNECT_SERVER, MockServer, server_address, wait_until_ready,
};
use crate::packaging::{
    PackageReport, WheelArtifact, bdist_wheel, remove_legacy_artifacts, resolve_version,
    twine_check, write_github_outputs,
};
use crate::process::{CommandRunner, Invocation};
use crate::publish::PublishTarget;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio_util::sync::CancellationToken;

/// Drives every named operation against one immutable configuration
pub struct Orchestrator<R: CommandRunner> {
    config: BuildConfig,
    runner: R,
    output: OutputManager,
    cancel: CancellationToken,
    docker_checked: AtomicBool,
}

impl<R: CommandRunner> Orchestrator<R> {
    /// Create an orchestrator
    pub fn new(config: BuildConfig, runner: R, output: OutputManager) -> Self {
        Self {
            config,
            runner,
            output,
            cancel: CancellationToken::new(),
            docker_checked: AtomicBool::new(false),
        }
    }

    /// Configuration in effect
    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    /// Underlying runner
    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Token that interrupts the running operation when cancelled
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    fn tag(&self, tag: Option<&str>) -> Result<EnvironmentTag> {
        resolve_tag(tag, &self.config.environments)
    }

    /// Run one step to completion; non-zero exit is an error.
    ///
    /// Interactive steps own the terminal and are not interrupted.
    async fn step(&self, invocation: &Invocation) -> Result<()> {
        let outcome = if invocation.interactive {
            self.runner.run(invocation).await?
        } else {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    return Err(ProcessError::Cancelled {
                        command: invocation.display(),
                    }
                    .into());
                }
                outcome = self.runner.run(invocation) => outcome?,
            }
        };

        if !outcome.success() {
            return Err(ProcessError::Failed {
                command: invocation.display(),
                code: outcome.code,
            }
            .into());
        }
        Ok(())
    }

    /// `docker info` once per process, before the first Docker call
    async fn ensure_docker(&self) -> Result<()> {
        if self.docker_checked.load(Ordering::Acquire) {
            return Ok(());
        }
        check_docker_available(&self.runner).await?;
        self.docker_checked.store(true, Ordering::Release);
        Ok(())
    }

    /// Build the image for `tag` (default tag when `None`)
    pub async fn compose_image(&self, tag: Option<&str>) -> Result<()> {
        let tag = self.tag(tag)?;
        self.build(&tag).await
    }

    async fn build(&self, tag: &EnvironmentTag) -> Result<()> {
        self.ensure_docker().await?;
        let image = tag.image_name(&self.config.environments);
        self.output.progress(&format!("Building image {}", image));
        self.step(&build_image(&self.config, tag)).await?;
        self.output.success(&format!("Built {}", image));
        Ok(())
    }

    /// Run a command inside the environment's container.
    ///
    /// A container left behind by an interrupted or timed-out run is
    /// force-removed when the guard drops.
    pub async fn run_in_container(&self, run: ContainerRun<'_>) -> Result<()> {
        self.ensure_docker().await?;
        let name = run.container_name(&self.config);
        let mut guard = ContainerGuard::new(&self.runner, name.clone());

        self.output
            .verbose(&format!("{} in {}", run.command, guard.name()));
        let result = self.step(&run.invocation(&self.config, &name)).await;

        match &result {
            Err(ReleaseError::Process(
                ProcessError::Cancelled { .. } | ProcessError::TimedOut { .. },
            )) => {}
            _ => guard.disarm(),
        }
        result
    }

    /// Run the test suite in the environment, with no injected variables
    pub async fn test(&self, tag: Option<&str>) -> Result<()> {
        let tag = self.tag(tag)?;
        self.test_with_env(&tag, BTreeMap::new()).await
    }

    async fn test_with_env(&self, tag: &EnvironmentTag, env: BTreeMap<String, String>) -> Result<()> {
        self.output.progress(&format!("Running tests on Python {}", tag));
        let run = ContainerRun::new(tag, &self.config.commands.test).with_env(env);
        self.run_in_container(run).await?;
        self.output.success(&format!("Tests passed on Python {}", tag));
        Ok(())
    }

    /// Run every style check, stopping at the first failure
    pub async fn lint(&self, tag: Option<&str>) -> Result<()> {
        let tag = self.tag(tag)?;
        tag.require_tooling(&self.config.environments, "lint")?;
        for command in &self.config.commands.lint {
            self.output.progress(command);
            self.run_in_container(ContainerRun::new(&tag, command)).await?;
        }
        self.output.success(&format!("Lint passed on Python {}", tag));
        Ok(())
    }

    /// Reformat the source tree
    pub async fn format(&self, tag: Option<&str>) -> Result<()> {
        let tag = self.tag(tag)?;
        tag.require_tooling(&self.config.environments, "fmt")?;
        self.run_in_container(ContainerRun::new(&tag, &self.config.commands.format))
            .await
    }

    /// Install the project's dependencies inside the environment
    pub async fn deps(&self, tag: Option<&str>) -> Result<()> {
        let tag = self.tag(tag)?;
        self.run_in_container(ContainerRun::new(&tag, &self.config.commands.deps))
            .await
    }

    /// Open an interactive shell in the environment
    pub async fn shell(&self, tag: Option<&str>) -> Result<()> {
        let tag = self.tag(tag)?;
        self.run_in_container(ContainerRun::new(&tag, &self.config.commands.shell).interactive())
            .await
    }

    /// Run the tests against the auxiliary mock server.
    ///
    /// The server is stopped whether the tests pass, fail, time out waiting
    /// for readiness, or are cancelled. A test failure takes precedence over
    /// a failure to stop.
    pub async fn mock_test(&self, tag: Option<&str>) -> Result<()> {
        let tag = self.tag(tag)?;
        let settings = &self.config.mock_server;
        let address = server_address(settings)?;

        let removed = self.clean_stores()?;
        if !removed.is_empty() {
            self.output
                .verbose(&format!("Removed {} local state director(ies)", removed.len()));
        }

        self.ensure_docker().await?;
        self.output.progress("Starting mock server");
        let server = MockServer::start(&self.runner, settings, &self.config.project_dir).await?;

        let session = async {
            let waited = wait_until_ready(
                &address,
                settings.readiness_timeout(),
                settings.poll_interval(),
                &self.cancel,
            )
            .await?;
            self.output.verbose(&format!(
                "Mock server at {} ready after {} ms",
                address,
                waited.as_millis()
            ));

            let env = BTreeMap::from([
                (CONNECT_SERVER.to_string(), address.clone()),
                (CONNECT_API_KEY.to_string(), settings.api_key.clone()),
            ]);
            self.test_with_env(&tag, env).await
        };
        let result = session.await;

        self.output.progress("Stopping mock server");
        let stopped = server.stop().await;

        match (result, stopped) {
            (Err(e), Err(stop_err)) => {
                log::warn!("Mock server stop also failed: {}", stop_err);
                Err(e)
            }
            (Err(e), Ok(())) | (Ok(()), Err(e)) => Err(e),
            (Ok(()), Ok(())) => Ok(()),
        }
    }

    /// Build, verify and validate the wheel.
    ///
    /// The source-date epoch is fixed once and exported to the build, so
    /// repeated runs on the same tree report the same epoch.
    pub async fn package(&self) -> Result<PackageReport> {
        let epoch = self
            .config
            .source_date_epoch
            .unwrap_or_else(|| chrono::Utc::now().timestamp());
        let version = resolve_version(&self.runner, &self.config).await?;
        let wheel = WheelArtifact::for_version(&self.config, &version);

        self.output.progress(&format!(
            "Building {} (SOURCE_DATE_EPOCH={})",
            wheel.basename(),
            epoch
        ));
        self.step(&bdist_wheel(&self.config, epoch)).await?;
        let size = wheel.verify()?;

        self.output.progress("Checking package metadata");
        self.step(&twine_check(&self.config, &wheel)).await?;

        for removed in remove_legacy_artifacts(&self.config)? {
            self.output
                .indent(&format!("removed {}", removed.display()));
        }

        let report = PackageReport {
            version,
            artifact: wheel.path().to_path_buf(),
            basename: wheel.basename(),
            sha256: wheel.sha256()?,
            size,
            source_date_epoch: epoch,
        };

        if let Some(path) = &self.config.github_output {
            write_github_outputs(path, &report)?;
            log::debug!("Wrote step outputs to {}", path.display());
        }

        self.output.success(&format!(
            "Built {} ({} bytes, sha256 {})",
            report.basename, report.size, report.sha256
        ));
        Ok(report)
    }

    /// Upload the wheel for the current version; returns the destination.
    ///
    /// Fails before the uploader runs if the wheel has not been built.
    pub async fn publish(&self, target: PublishTarget) -> Result<String> {
        let version = resolve_version(&self.runner, &self.config).await?;
        let wheel = WheelArtifact::for_version(&self.config, &version);
        wheel.verify()?;

        let destination = target.destination(&self.config, &version, &wheel);
        self.output.progress(&format!("Uploading {} to {}", wheel.basename(), destination));
        self.step(&target.upload(&self.config, &version, &wheel)).await?;
        self.output.success(&format!("Published {}", destination));
        Ok(destination)
    }

    /// The version embedded in artifact names
    pub async fn print_version(&self) -> Result<String> {
        resolve_version(&self.runner, &self.config).await
    }

    /// Remove build outputs
    pub fn clean(&self) -> Result<Vec<PathBuf>> {
        let removed = clean_build_outputs(&self.config)?;
        for path in &removed {
            self.output.indent(&format!("removed {}", path.display()));
        }
        Ok(removed)
    }

    /// Remove local state directories left by earlier test runs
    pub fn clean_stores(&self) -> Result<Vec<PathBuf>> {
        clean_state_dirs(
            &self.config.project_dir,
            &self.config.mock_server.state_dir_name,
        )
    }

    /// Build the documentation
    pub async fn docs(&self) -> Result<()> {
        let docs_dir = self.config.project_dir.join(&self.config.docs_dir);
        let make = Invocation::new("make")
            .arg("-C")
            .arg(docs_dir.display().to_string())
            .current_dir(&self.config.project_dir);
        self.step(&make).await
    }

    /// Build every environment's image, in order
    pub async fn build_all(&self) -> Result<()> {
        let tags = fan_out_tags(&self.config.environments)?;
        self.output.section("Building images");
        for tag in &tags {
            self.build(tag).await?;
        }
        Ok(())
    }

    /// Build every image, then run the tests in each environment
    pub async fn test_all(&self) -> Result<()> {
        self.build_all().await?;
        let tags = fan_out_tags(&self.config.environments)?;
        self.output.section("Running tests");
        for tag in &tags {
            self.test_with_env(tag, BTreeMap::new()).await?;
        }
        Ok(())
    }
}
