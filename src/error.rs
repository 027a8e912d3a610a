//! Error types for rsconnect_release operations.
//!
//! Every failure surfaces as a [`ReleaseError`], which knows the process exit
//! code it maps to and which recovery hints to print.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for rsconnect_release operations
pub type Result<T> = std::result::Result<T, ReleaseError>;

/// Main error type for all rsconnect_release operations
#[derive(Error, Debug)]
pub enum ReleaseError {
    /// Environment tag errors
    #[error("Environment error: {0}")]
    Environment(#[from] EnvironmentError),

    /// External process errors
    #[error("Process error: {0}")]
    Process(#[from] ProcessError),

    /// Build artifact errors
    #[error("Artifact error: {0}")]
    Artifact(#[from] ArtifactError),

    /// Version string errors
    #[error("Version error: {0}")]
    Version(#[from] VersionError),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Auxiliary mock server errors
    #[error("Mock server error: {0}")]
    Service(#[from] ServiceError),

    /// CLI argument errors
    #[error("CLI error: {0}")]
    Cli(#[from] CliError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Environment tag errors
#[derive(Error, Debug)]
pub enum EnvironmentError {
    /// The tag cannot be used as an image tag
    #[error("Invalid environment tag '{tag}': {reason}")]
    InvalidTag {
        /// Offending tag
        tag: String,
        /// Reason for the error
        reason: String,
    },

    /// Legacy runtimes cannot run the lint/format tooling
    #[error("ERROR: Python {tag} cannot run the {operation} tools")]
    UnsupportedTooling {
        /// Offending tag
        tag: String,
        /// Operation that was requested
        operation: String,
    },
}

/// External process errors
#[derive(Error, Debug)]
pub enum ProcessError {
    /// Executable not found on PATH
    #[error("'{program}' not found on PATH: {source}")]
    NotFound {
        /// Program name
        program: String,
        /// Lookup error
        #[source]
        source: which::Error,
    },

    /// Process could not be started
    #[error("Failed to start '{command}': {source}")]
    SpawnFailed {
        /// Command line
        command: String,
        /// Spawn error
        #[source]
        source: std::io::Error,
    },

    /// Process exited unsuccessfully
    #[error("'{command}' failed with {}", describe_code(.code))]
    Failed {
        /// Command line
        command: String,
        /// Exit code, absent when killed by a signal
        code: Option<i32>,
    },

    /// Process exceeded its time budget and was killed
    #[error("'{command}' timed out after {seconds} seconds")]
    TimedOut {
        /// Command line
        command: String,
        /// Timeout that elapsed
        seconds: u64,
    },

    /// Interrupted before the process finished
    #[error("Interrupted while running '{command}'")]
    Cancelled {
        /// Command line
        command: String,
    },

    /// A required tool is installed but not usable
    #[error("{tool} is not available: {reason}")]
    Unavailable {
        /// Tool name
        tool: String,
        /// Reason for the error
        reason: String,
    },

    /// Process produced output that could not be used
    #[error("'{command}' produced unusable output: {reason}")]
    BadOutput {
        /// Command line
        command: String,
        /// Reason for the error
        reason: String,
    },
}

fn describe_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {code}"),
        None => "no exit code (terminated by signal)".to_string(),
    }
}

/// Build artifact errors
#[derive(Error, Debug)]
pub enum ArtifactError {
    /// Expected artifact does not exist
    #[error("Artifact not found: {path}")]
    Missing {
        /// Expected path
        path: PathBuf,
    },

    /// Artifact exists but is empty
    #[error("Artifact is empty (0 bytes): {path}")]
    Empty {
        /// Artifact path
        path: PathBuf,
    },

    /// Artifact could not be read
    #[error("Cannot read artifact {path}: {source}")]
    Unreadable {
        /// Artifact path
        path: PathBuf,
        /// Read error
        #[source]
        source: std::io::Error,
    },
}

/// Version string errors
#[derive(Error, Debug)]
pub enum VersionError {
    /// Packaging tool reported nothing
    #[error("Version string is empty")]
    Empty,

    /// Version cannot be embedded in a file name
    #[error("Version '{version}' is not safe to use in a file name")]
    Unsafe {
        /// Version string
        version: String,
    },
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("Failed to read config file {path}: {source}")]
    Read {
        /// Config path
        path: PathBuf,
        /// Read error
        #[source]
        source: std::io::Error,
    },

    /// Config file could not be parsed
    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        /// Config path
        path: PathBuf,
        /// Parse error
        #[source]
        source: toml::de::Error,
    },

    /// A value is out of range or malformed
    #[error("Invalid value for {field}: {reason}")]
    InvalidValue {
        /// Field name
        field: String,
        /// Reason for the error
        reason: String,
    },
}

/// Auxiliary mock server errors
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Server never answered within the readiness budget
    #[error("Mock server at {url} was not ready after {waited_ms} ms")]
    NotReady {
        /// Probed URL
        url: String,
        /// Time spent polling
        waited_ms: u128,
    },

    /// Server URL could not be built
    #[error("Invalid mock server URL '{url}': {source}")]
    InvalidUrl {
        /// URL text
        url: String,
        /// Parse error
        #[source]
        source: url::ParseError,
    },

    /// HTTP client for the readiness check could not be created
    #[error("Readiness check failed: {reason}")]
    Probe {
        /// Reason for the error
        reason: String,
    },

    /// Operation was interrupted
    #[error("Interrupted while {during}")]
    Cancelled {
        /// What was running
        during: String,
    },
}

/// CLI-specific errors
#[derive(Error, Debug)]
pub enum CliError {
    /// Invalid command line arguments
    #[error("Invalid arguments: {reason}")]
    InvalidArguments {
        /// Reason for the error
        reason: String,
    },
}

impl ReleaseError {
    /// Process exit code for this error.
    ///
    /// Sub-process failures propagate the child's exit code; everything else is 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            ReleaseError::Process(ProcessError::Failed {
                code: Some(code), ..
            }) if *code != 0 => *code,
            ReleaseError::Service(ServiceError::Cancelled { .. })
            | ReleaseError::Process(ProcessError::Cancelled { .. }) => 130,
            _ => 1,
        }
    }

    /// Get actionable recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<String> {
        match self {
            ReleaseError::Environment(EnvironmentError::UnsupportedTooling { .. }) => vec![
                "Run lint and fmt with a newer Python tag, e.g. `lint 3.8`".to_string(),
            ],
            ReleaseError::Process(ProcessError::NotFound { program, .. }) => vec![
                format!("Install '{program}' and make sure it is on PATH"),
            ],
            ReleaseError::Artifact(ArtifactError::Missing { .. }) => vec![
                "Build the wheel first: rsconnect_release dist".to_string(),
                "Check that the version reported by `rsconnect_release version` is current"
                    .to_string(),
            ],
            ReleaseError::Service(ServiceError::NotReady { .. }) => vec![
                "Check that the mock server container is running: docker ps".to_string(),
                "Raise mock_server.readiness_timeout_secs in release.toml".to_string(),
            ],
            ReleaseError::Config(_) => vec![
                "Check release.toml against the documented defaults".to_string(),
            ],
            _ => vec![],
        }
    }
}
