//! `docker run` invocations for per-environment commands.

use crate::config::BuildConfig;
use crate::environment::EnvironmentTag;
use crate::process::Invocation;
use std::collections::BTreeMap;
use std::time::Duration;
use uuid::Uuid;

/// A command to run inside an environment's container
#[derive(Debug, Clone)]
pub struct ContainerRun<'a> {
    /// Environment whose image is used
    pub tag: &'a EnvironmentTag,
    /// Shell command passed to `bash -c`
    pub command: &'a str,
    /// Variables injected into the container by name
    pub env: BTreeMap<String, String>,
    /// Attach the terminal
    pub interactive: bool,
}

impl<'a> ContainerRun<'a> {
    /// Non-interactive run with no injected variables
    pub fn new(tag: &'a EnvironmentTag, command: &'a str) -> Self {
        Self {
            tag,
            command,
            env: BTreeMap::new(),
            interactive: false,
        }
    }

    /// Inject variables
    pub fn with_env(mut self, env: BTreeMap<String, String>) -> Self {
        self.env = env;
        self
    }

    /// Attach the terminal
    pub fn interactive(mut self) -> Self {
        self.interactive = true;
        self
    }

    /// Unique container name, so an abandoned run can be force-removed
    pub fn container_name(&self, config: &BuildConfig) -> String {
        let id = Uuid::new_v4().simple().to_string();
        format!(
            "{}-{}-{}",
            config.environments.image_repo,
            self.tag.as_str().replace('.', "_"),
            &id[..12]
        )
    }

    /// Build the `docker run` invocation.
    ///
    /// The working tree is mounted read-write at the configured mount point.
    /// Injected variables are forwarded with `-e NAME`; their values travel in
    /// the docker process environment so they never appear in argv.
    pub fn invocation(&self, config: &BuildConfig, container_name: &str) -> Invocation {
        let settings = &config.environments;
        let mut inv = Invocation::new("docker").args([
            "run".to_string(),
            "--rm".to_string(),
            "--name".to_string(),
            container_name.to_string(),
        ]);

        if self.interactive {
            inv = inv.arg("-it").interactive();
        }

        inv = inv.args([
            "-v".to_string(),
            format!("{}:{}", config.project_dir.display(), settings.mount_point),
            "-w".to_string(),
            settings.mount_point.clone(),
        ]);

        for (key, value) in &self.env {
            inv = inv.arg("-e").arg(key.clone()).env(key.clone(), value.clone());
        }

        inv = inv
            .arg(self.tag.image_name(settings))
            .args(["bash", "-c", self.command])
            .current_dir(&config.project_dir);

        if let Some(secs) = settings.container_timeout_secs {
            inv = inv.timeout(Duration::from_secs(secs));
        }
        inv
    }
}
