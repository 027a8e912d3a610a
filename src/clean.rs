//! Removal of build output and local state directories.

use crate::config::BuildConfig;
use crate::error::Result;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Remove the configured build output paths; returns what was removed
pub fn clean_build_outputs(config: &BuildConfig) -> Result<Vec<PathBuf>> {
    let mut removed = Vec::new();

    for pattern in &config.packaging.clean_paths {
        let entries = match glob::glob(&anchored_pattern(&config.project_dir, pattern)) {
            Ok(entries) => entries,
            Err(e) => {
                log::warn!("Skipping invalid clean pattern '{}': {}", pattern, e);
                continue;
            }
        };
        for path in entries.flatten() {
            remove_path(&path)?;
            removed.push(path);
        }
    }

    Ok(removed)
}

/// Remove every directory called `name` below `root`.
///
/// Removed directories are not descended into.
pub fn clean_state_dirs(root: &Path, name: &str) -> Result<Vec<PathBuf>> {
    let mut removed = Vec::new();
    let mut walker = WalkDir::new(root).min_depth(1).into_iter();

    while let Some(entry) = walker.next() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                log::debug!("Skipping unreadable entry: {}", e);
                continue;
            }
        };
        if entry.file_type().is_dir() && entry.file_name() == name {
            walker.skip_current_dir();
            std::fs::remove_dir_all(entry.path())?;
            log::debug!("Removed state directory {}", entry.path().display());
            removed.push(entry.into_path());
        }
    }

    Ok(removed)
}

/// Glob pattern rooted at `dir`, with `dir` itself matched literally
pub(crate) fn anchored_pattern(dir: &Path, pattern: &str) -> String {
    format!(
        "{}/{}",
        glob::Pattern::escape(&dir.to_string_lossy()),
        pattern
    )
}

fn remove_path(path: &Path) -> std::io::Result<()> {
    let metadata = std::fs::symlink_metadata(path)?;
    if metadata.is_dir() {
        std::fs::remove_dir_all(path)?;
    } else {
        std::fs::remove_file(path)?;
    }
    log::debug!("Removed {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_build_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        std::fs::create_dir_all(root.join("build/lib")).unwrap();
        std::fs::create_dir_all(root.join("dist")).unwrap();
        std::fs::create_dir_all(root.join("rsconnect_python.egg-info")).unwrap();
        std::fs::write(root.join(".coverage"), b"x").unwrap();
        std::fs::write(root.join("setup.py"), b"x").unwrap();

        let config = BuildConfig::for_project(root);
        let removed = clean_build_outputs(&config).unwrap();

        assert_eq!(removed.len(), 4);
        assert!(!root.join("build").exists());
        assert!(!root.join("rsconnect_python.egg-info").exists());
        assert!(root.join("setup.py").exists());

        // nothing left to remove
        assert!(clean_build_outputs(&config).unwrap().is_empty());
    }

    #[test]
    fn test_clean_state_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        std::fs::create_dir_all(root.join("rsconnect-python/servers")).unwrap();
        std::fs::create_dir_all(root.join("tests/home/rsconnect-python")).unwrap();
        std::fs::create_dir_all(root.join("rsconnect")).unwrap();
        std::fs::write(root.join("rsconnect-python.txt"), b"x").unwrap();

        let mut removed = clean_state_dirs(root, "rsconnect-python").unwrap();
        removed.sort();

        assert_eq!(removed.len(), 2);
        assert!(!root.join("rsconnect-python").exists());
        assert!(!root.join("tests/home/rsconnect-python").exists());
        assert!(root.join("rsconnect").exists());
        assert!(root.join("rsconnect-python.txt").exists());
    }
}
