//! Version string of the managed project.
//!
//! Queried once per invocation from `python setup.py --version` unless a
//! version override is configured.

use crate::config::BuildConfig;
use crate::error::{ProcessError, Result, VersionError};
use crate::process::{CommandRunner, Invocation};
use regex::Regex;

/// Characters a version may contain and still be embedded in a file name
const SAFE_VERSION: &str = r"^[A-Za-z0-9][A-Za-z0-9._+!-]*$";

/// `python setup.py --version` in the project directory
pub fn version_query(config: &BuildConfig) -> Invocation {
    Invocation::new(config.packaging.python.clone())
        .args(["setup.py", "--version"])
        .current_dir(&config.project_dir)
}

/// Check that a version is non-empty and path-safe
pub fn validate_version(version: &str) -> Result<()> {
    if version.is_empty() {
        return Err(VersionError::Empty.into());
    }
    let safe = Regex::new(SAFE_VERSION)
        .map(|re| re.is_match(version))
        .unwrap_or(false);
    if !safe {
        return Err(VersionError::Unsafe {
            version: version.to_string(),
        }
        .into());
    }
    Ok(())
}

/// Extract the version from the packaging tool's stdout.
///
/// setuptools may print warnings before the version, so the last non-empty
/// line wins.
pub fn parse_version_output(stdout: &str) -> Result<String> {
    let version = stdout
        .lines()
        .map(str::trim)
        .rfind(|line| !line.is_empty())
        .unwrap_or_default()
        .to_string();
    validate_version(&version)?;
    Ok(version)
}

/// Resolve the version for this invocation
pub async fn resolve_version<R: CommandRunner>(runner: &R, config: &BuildConfig) -> Result<String> {
    if let Some(version) = &config.version_override {
        log::debug!("Using configured version {}", version);
        validate_version(version)?;
        return Ok(version.clone());
    }

    let query = version_query(config);
    let stdout = runner.capture(&query).await?;
    parse_version_output(&stdout).map_err(|e| {
        log::debug!("Unusable version output: {:?}", stdout);
        match e {
            crate::error::ReleaseError::Version(VersionError::Empty) => ProcessError::BadOutput {
                command: query.display(),
                reason: "no version printed".to_string(),
            }
            .into(),
            other => other,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::recorder::RecordingRunner;

    #[test]
    fn test_last_line_wins() {
        let out = "warning: setuptools is old\n\n1.5.1.dev3+g1234abc\n\n";
        assert_eq!(parse_version_output(out).unwrap(), "1.5.1.dev3+g1234abc");
    }

    #[test]
    fn test_unsafe_versions_rejected() {
        assert!(validate_version("1.5.0").is_ok());
        assert!(validate_version("").is_err());
        assert!(validate_version("../1.0").is_err());
        assert!(validate_version("1.0 beta").is_err());
        assert!(validate_version("1/0").is_err());
        assert!(validate_version(".hidden").is_err());
    }

    #[tokio::test]
    async fn test_override_skips_query() {
        let runner = RecordingRunner::new();
        let mut config = BuildConfig::for_project("/work");
        config.version_override = Some("2.0.0".to_string());
        assert_eq!(resolve_version(&runner, &config).await.unwrap(), "2.0.0");
        assert!(runner.calls().is_empty());
    }

    #[tokio::test]
    async fn test_query_packaging_tool() {
        let runner = RecordingRunner::new().output_for("setup.py --version", "1.4.5\n");
        let config = BuildConfig::for_project("/work");
        assert_eq!(resolve_version(&runner, &config).await.unwrap(), "1.4.5");
        assert_eq!(runner.commands(), vec!["python setup.py --version"]);
    }

    #[tokio::test]
    async fn test_empty_output_is_bad_output() {
        let runner = RecordingRunner::new().output_for("setup.py --version", "\n");
        let config = BuildConfig::for_project("/work");
        let err = resolve_version(&runner, &config).await.unwrap_err();
        assert!(matches!(
            err,
            crate::error::ReleaseError::Process(ProcessError::BadOutput { .. })
        ));
    }
}
