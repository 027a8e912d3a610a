//! Wheel artifact location, verification and digest.

use crate::config::BuildConfig;
use crate::error::{ArtifactError, Result};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// The wheel produced for one version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WheelArtifact {
    path: PathBuf,
}

impl WheelArtifact {
    /// `dist/<dist_name>-<version>-<wheel_tag>.whl` under the project
    pub fn for_version(config: &BuildConfig, version: &str) -> Self {
        let packaging = &config.packaging;
        let file_name = format!(
            "{}-{}-{}.whl",
            packaging.dist_name, version, packaging.wheel_tag
        );
        Self {
            path: config.dist_dir().join(file_name),
        }
    }

    /// Full path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name without directories
    pub fn basename(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Verify the artifact exists and is not empty; returns its size
    pub fn verify(&self) -> Result<u64> {
        let metadata = std::fs::metadata(&self.path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                ArtifactError::Missing {
                    path: self.path.clone(),
                }
            } else {
                ArtifactError::Unreadable {
                    path: self.path.clone(),
                    source,
                }
            }
        })?;

        if !metadata.is_file() {
            return Err(ArtifactError::Missing {
                path: self.path.clone(),
            }
            .into());
        }
        if metadata.len() == 0 {
            return Err(ArtifactError::Empty {
                path: self.path.clone(),
            }
            .into());
        }
        Ok(metadata.len())
    }

    /// Hex SHA-256 of the artifact
    pub fn sha256(&self) -> Result<String> {
        let unreadable = |source| ArtifactError::Unreadable {
            path: self.path.clone(),
            source,
        };
        let mut file = std::fs::File::open(&self.path).map_err(unreadable)?;
        let mut hasher = Sha256::new();
        std::io::copy(&mut file, &mut hasher).map_err(unreadable)?;
        Ok(hex::encode(hasher.finalize()))
    }
}

/// Object key name of the "latest" wheel
pub fn latest_basename(config: &BuildConfig) -> String {
    format!(
        "{}-latest-{}.whl",
        config.packaging.dist_name, config.packaging.wheel_tag
    )
}

/// Delete legacy artifact variants from the dist directory
pub fn remove_legacy_artifacts(config: &BuildConfig) -> Result<Vec<PathBuf>> {
    let dist_dir = config.dist_dir();
    let mut removed = Vec::new();

    for pattern in &config.packaging.legacy_artifacts {
        let entries = match glob::glob(&crate::clean::anchored_pattern(&dist_dir, pattern)) {
            Ok(entries) => entries,
            Err(e) => {
                log::warn!("Skipping invalid legacy artifact pattern '{}': {}", pattern, e);
                continue;
            }
        };
        for path in entries.flatten() {
            if path.is_file() {
                std::fs::remove_file(&path)?;
                log::debug!("Removed legacy artifact {}", path.display());
                removed.push(path);
            }
        }
    }

    Ok(removed)
}
