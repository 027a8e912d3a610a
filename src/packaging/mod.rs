//! Wheel packaging for the managed project.
//!
//! The package operation builds `dist/<name>-<version>-<tag>.whl` with a
//! fixed `SOURCE_DATE_EPOCH`, validates it with `twine check`, and removes
//! legacy `.egg` variants so only the wheel is published.

mod artifact;
mod version;

pub use artifact::{WheelArtifact, latest_basename, remove_legacy_artifacts};
pub use version::{parse_version_output, resolve_version, validate_version, version_query};

use crate::config::{BuildConfig, ENV_SOURCE_DATE_EPOCH};
use crate::process::Invocation;
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Outcome of a package operation
#[derive(Debug, Clone, Serialize)]
pub struct PackageReport {
    /// Version embedded in the artifact name
    pub version: String,
    /// Artifact path
    pub artifact: PathBuf,
    /// Artifact file name
    pub basename: String,
    /// Hex SHA-256 of the artifact
    pub sha256: String,
    /// Size in bytes
    pub size: u64,
    /// Timestamp exported to the build
    pub source_date_epoch: i64,
}

/// `python setup.py bdist_wheel` with the epoch exported
pub fn bdist_wheel(config: &BuildConfig, epoch: i64) -> Invocation {
    Invocation::new(config.packaging.python.clone())
        .args(["setup.py", "bdist_wheel"])
        .env(ENV_SOURCE_DATE_EPOCH, epoch.to_string())
        .current_dir(&config.project_dir)
}

/// `twine check <wheel>`
pub fn twine_check(config: &BuildConfig, wheel: &WheelArtifact) -> Invocation {
    Invocation::new(config.packaging.twine.clone())
        .arg("check")
        .arg(wheel.path().display().to_string())
        .current_dir(&config.project_dir)
}

/// Append `whl=` and `whl_basename=` to a GitHub Actions output file
pub fn write_github_outputs(path: &Path, report: &PackageReport) -> std::io::Result<()> {
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;
    writeln!(file, "whl={}", report.artifact.display())?;
    writeln!(file, "whl_basename={}", report.basename)?;
    Ok(())
}
