//! Build configuration.
//!
//! All orchestration settings live in one immutable [`BuildConfig`] record,
//! assembled once per invocation from built-in defaults, an optional
//! `release.toml`, and a handful of environment overrides.

use crate::error::{ConfigError, Result};
use path_absolutize::Absolutize;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Config file looked up in the project directory when `--config` is absent
pub const DEFAULT_CONFIG_FILE: &str = "release.toml";

/// Overrides the version reported by the packaging tool
pub const ENV_VERSION_OVERRIDE: &str = "RSCONNECT_RELEASE_VERSION";

/// Overrides `publish.s3_prefix`
pub const ENV_S3_PREFIX: &str = "RSCONNECT_RELEASE_S3_PREFIX";

/// Overrides `mock_server.host`
pub const ENV_MOCK_HOST: &str = "RSCONNECT_RELEASE_MOCK_HOST";

/// Reproducible-builds timestamp, read and exported by the package operation
pub const ENV_SOURCE_DATE_EPOCH: &str = "SOURCE_DATE_EPOCH";

/// File that receives `whl=` / `whl_basename=` step outputs in CI
pub const ENV_GITHUB_OUTPUT: &str = "GITHUB_OUTPUT";

/// Complete, immutable configuration for one orchestrator invocation
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Absolute path of the managed project's working tree
    pub project_dir: PathBuf,
    /// Image and container settings
    pub environments: EnvironmentSettings,
    /// Fixed command strings run inside containers
    pub commands: CommandSettings,
    /// Wheel build settings
    pub packaging: PackagingSettings,
    /// Auxiliary mock server settings
    pub mock_server: MockServerSettings,
    /// Object store settings
    pub publish: PublishSettings,
    /// Directory handed to `make -C` by the docs command
    pub docs_dir: PathBuf,
    /// Version used instead of querying the packaging tool
    pub version_override: Option<String>,
    /// Timestamp held constant for the package operation
    pub source_date_epoch: Option<i64>,
    /// CI step output file written after packaging
    pub github_output: Option<PathBuf>,
}

/// Image and container settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EnvironmentSettings {
    /// Image repository; images are tagged `<image_repo>:<tag>`
    pub image_repo: String,
    /// Base image template, `{tag}` is replaced by the environment tag
    pub base_image: String,
    /// Where the working tree is mounted inside the container
    pub mount_point: String,
    /// Tag used when a command is given none
    pub default_tag: String,
    /// Tags covered by build-all and test-all
    pub tags: Vec<String>,
    /// Tags whose runtimes cannot run the lint/format tooling
    pub legacy_tags: Vec<String>,
    /// Optional time budget for a single container run
    pub container_timeout_secs: Option<u64>,
}

impl Default for EnvironmentSettings {
    fn default() -> Self {
        Self {
            image_repo: "rsconnect-python".to_string(),
            base_image: "python:{tag}-slim".to_string(),
            mount_point: "/rsconnect".to_string(),
            default_tag: "3.8".to_string(),
            tags: ["2.7", "3.5", "3.6", "3.7", "3.8"]
                .into_iter()
                .map(String::from)
                .collect(),
            legacy_tags: vec!["2.7".to_string(), "3.5".to_string()],
            container_timeout_secs: None,
        }
    }
}

/// Command strings run through `bash -c` inside the container
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CommandSettings {
    /// Test runner
    pub test: String,
    /// Style checks, run in order
    pub lint: Vec<String>,
    /// Auto-formatter
    pub format: String,
    /// Dependency installation
    pub deps: String,
    /// Interactive shell
    pub shell: String,
}

impl Default for CommandSettings {
    fn default() -> Self {
        Self {
            test: "scripts/runtests".to_string(),
            lint: vec![
                "black --check --diff rsconnect/".to_string(),
                "flake8 rsconnect/".to_string(),
                "flake8 tests/".to_string(),
                "mypy rsconnect".to_string(),
            ],
            format: "black .".to_string(),
            deps: "pip install --pre -r requirements.txt".to_string(),
            shell: "bash".to_string(),
        }
    }
}

/// Wheel build settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PackagingSettings {
    /// Host Python used for `setup.py`
    pub python: String,
    /// Metadata checker
    pub twine: String,
    /// Output directory, relative to the project
    pub dist_dir: String,
    /// Distribution name as it appears in wheel file names
    pub dist_name: String,
    /// Wheel compatibility tag
    pub wheel_tag: String,
    /// Legacy artifact variants deleted after the build, relative to `dist_dir`
    pub legacy_artifacts: Vec<String>,
    /// Paths removed by `clean`, globbed relative to the project
    pub clean_paths: Vec<String>,
}

impl Default for PackagingSettings {
    fn default() -> Self {
        Self {
            python: "python".to_string(),
            twine: "twine".to_string(),
            dist_dir: "dist".to_string(),
            dist_name: "rsconnect_python".to_string(),
            wheel_tag: "py2.py3-none-any".to_string(),
            legacy_artifacts: vec!["*.egg".to_string()],
            clean_paths: [
                "build",
                "dist",
                "*.egg-info",
                ".coverage",
                ".mypy_cache",
                ".pytest_cache",
                "htmlcov",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        }
    }
}

/// Auxiliary mock server settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MockServerSettings {
    /// Command that builds and starts the mock server
    pub start: Vec<String>,
    /// Command that stops the mock server
    pub stop: Vec<String>,
    /// Host name used in `CONNECT_SERVER`; the local hostname when unset
    pub host: Option<String>,
    /// Port the mock server listens on
    pub port: u16,
    /// Placeholder credential injected as `CONNECT_API_KEY`
    pub api_key: String,
    /// How long to wait for the server to answer
    pub readiness_timeout_secs: u64,
    /// Delay between readiness checks
    pub poll_interval_ms: u64,
    /// Local state directories with this name are removed before a mock test
    pub state_dir_name: String,
}

impl Default for MockServerSettings {
    fn default() -> Self {
        Self {
            start: ["make", "-C", "mock_connect", "image", "up"]
                .into_iter()
                .map(String::from)
                .collect(),
            stop: ["make", "-C", "mock_connect", "down"]
                .into_iter()
                .map(String::from)
                .collect(),
            host: None,
            port: 3939,
            api_key: "0123456789abcdef0123456789abcdef".to_string(),
            readiness_timeout_secs: 30,
            poll_interval_ms: 250,
            state_dir_name: "rsconnect-python".to_string(),
        }
    }
}

impl MockServerSettings {
    /// Readiness budget as a duration
    pub fn readiness_timeout(&self) -> Duration {
        Duration::from_secs(self.readiness_timeout_secs)
    }

    /// Probe interval as a duration
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Object store settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PublishSettings {
    /// Uploader executable
    pub aws: String,
    /// Destination prefix; versioned and latest keys are placed under it
    pub s3_prefix: String,
}

impl Default for PublishSettings {
    fn default() -> Self {
        Self {
            aws: "aws".to_string(),
            s3_prefix: "s3://rstudio-connect-downloads/connect/rsconnect-python".to_string(),
        }
    }
}

/// On-disk shape of `release.toml`
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
    environments: EnvironmentSettings,
    commands: CommandSettings,
    packaging: PackagingSettings,
    mock_server: MockServerSettings,
    publish: PublishSettings,
    docs_dir: Option<PathBuf>,
    version: Option<String>,
}

impl BuildConfig {
    /// Built-in defaults for the given project directory
    pub fn for_project(project_dir: impl Into<PathBuf>) -> Self {
        Self::from_file_contents(project_dir.into(), ConfigFile::default())
    }

    /// Load configuration for a project.
    ///
    /// Reads `config_path` when given (it must exist), otherwise
    /// `<project_dir>/release.toml` when present, then applies environment
    /// overrides and validates the result.
    pub fn load(project_dir: &Path, config_path: Option<&Path>) -> Result<Self> {
        let project_dir = project_dir
            .absolutize()
            .map_err(|e| ConfigError::InvalidValue {
                field: "project_dir".to_string(),
                reason: format!("cannot resolve {}: {}", project_dir.display(), e),
            })?
            .into_owned();

        let file_path = match config_path {
            Some(path) => Some(path.to_path_buf()),
            None => {
                let candidate = project_dir.join(DEFAULT_CONFIG_FILE);
                candidate.is_file().then_some(candidate)
            }
        };

        let file = match file_path {
            Some(path) => {
                log::debug!("Loading configuration from {}", path.display());
                let text = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
                    path: path.clone(),
                    source,
                })?;
                toml::from_str::<ConfigFile>(&text)
                    .map_err(|source| ConfigError::Parse { path, source })?
            }
            None => ConfigFile::default(),
        };

        let mut config = Self::from_file_contents(project_dir, file);
        config.apply_env_overrides(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    fn from_file_contents(project_dir: PathBuf, file: ConfigFile) -> Self {
        Self {
            project_dir,
            environments: file.environments,
            commands: file.commands,
            packaging: file.packaging,
            mock_server: file.mock_server,
            publish: file.publish,
            docs_dir: file.docs_dir.unwrap_or_else(|| PathBuf::from("docs")),
            version_override: file.version,
            source_date_epoch: None,
            github_output: None,
        }
    }

    /// Apply environment overrides using `lookup` to read variables
    fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(version) = non_empty(ENV_VERSION_OVERRIDE) {
            self.version_override = Some(version.trim().to_string());
        }
        if let Some(prefix) = non_empty(ENV_S3_PREFIX) {
            self.publish.s3_prefix = prefix;
        }
        if let Some(host) = non_empty(ENV_MOCK_HOST) {
            self.mock_server.host = Some(host);
        }
        if let Some(path) = non_empty(ENV_GITHUB_OUTPUT) {
            self.github_output = Some(PathBuf::from(path));
        }
        if let Some(epoch) = non_empty(ENV_SOURCE_DATE_EPOCH) {
            let parsed = epoch
                .trim()
                .parse::<i64>()
                .map_err(|e| ConfigError::InvalidValue {
                    field: ENV_SOURCE_DATE_EPOCH.to_string(),
                    reason: format!("'{}' is not a unix timestamp: {}", epoch, e),
                })?;
            self.source_date_epoch = Some(parsed);
        }
        Ok(())
    }

    /// Check values that would otherwise fail deep inside an operation
    pub fn validate(&self) -> Result<()> {
        let invalid = |field: &str, reason: &str| ConfigError::InvalidValue {
            field: field.to_string(),
            reason: reason.to_string(),
        };

        if !self.environments.mount_point.starts_with('/') {
            return Err(invalid("environments.mount_point", "must be an absolute path").into());
        }
        if !self.environments.base_image.contains("{tag}") {
            return Err(invalid("environments.base_image", "must contain {tag}").into());
        }
        if self.environments.tags.is_empty() {
            return Err(invalid("environments.tags", "at least one tag is required").into());
        }
        if self.mock_server.port == 0 {
            return Err(invalid("mock_server.port", "must be non-zero").into());
        }
        if self.mock_server.api_key.is_empty() {
            return Err(invalid("mock_server.api_key", "must not be empty").into());
        }
        if self.mock_server.start.is_empty() || self.mock_server.stop.is_empty() {
            return Err(invalid("mock_server.start/stop", "commands must not be empty").into());
        }
        if self.mock_server.poll_interval_ms == 0 {
            return Err(invalid("mock_server.poll_interval_ms", "must be non-zero").into());
        }
        if self.publish.s3_prefix.trim_end_matches('/').is_empty() {
            return Err(invalid("publish.s3_prefix", "must not be empty").into());
        }
        Ok(())
    }

    /// Absolute path of the dist directory
    pub fn dist_dir(&self) -> PathBuf {
        self.project_dir.join(&self.packaging.dist_dir)
    }
}
