//! Environment tags.
//!
//! A tag names a Python runtime version and selects the container image the
//! managed project is tested in.

use crate::config::EnvironmentSettings;
use crate::error::{EnvironmentError, Result};
use std::fmt;

/// Maximum length Docker accepts for an image tag
const MAX_TAG_LEN: usize = 128;

/// Validated environment tag, e.g. `3.8`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EnvironmentTag(String);

impl EnvironmentTag {
    /// Parse a tag, enforcing Docker's image tag grammar
    pub fn parse(tag: &str) -> Result<Self> {
        let invalid = |reason: &str| EnvironmentError::InvalidTag {
            tag: tag.to_string(),
            reason: reason.to_string(),
        };

        if tag.is_empty() {
            return Err(invalid("tag is empty").into());
        }
        if tag.len() > MAX_TAG_LEN {
            return Err(invalid("tag is longer than 128 characters").into());
        }
        if tag.starts_with(['.', '-']) {
            return Err(invalid("tag must not start with '.' or '-'").into());
        }
        if let Some(bad) = tag
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')))
        {
            return Err(invalid(&format!("character '{}' is not allowed", bad)).into());
        }

        Ok(Self(tag.to_string()))
    }

    /// Tag text
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Image name for this environment, `<repo>:<tag>`
    pub fn image_name(&self, settings: &EnvironmentSettings) -> String {
        format!("{}:{}", settings.image_repo, self.0)
    }

    /// Base image this environment's image is built from
    pub fn base_image(&self, settings: &EnvironmentSettings) -> String {
        settings.base_image.replace("{tag}", &self.0)
    }

    /// Whether the lint/format tooling runs in this environment
    pub fn supports_tooling(&self, settings: &EnvironmentSettings) -> bool {
        !settings.legacy_tags.iter().any(|legacy| legacy == &self.0)
    }

    /// Fail with a descriptive error when `operation` needs the tooling
    pub fn require_tooling(&self, settings: &EnvironmentSettings, operation: &str) -> Result<()> {
        if self.supports_tooling(settings) {
            Ok(())
        } else {
            Err(EnvironmentError::UnsupportedTooling {
                tag: self.0.clone(),
                operation: operation.to_string(),
            }
            .into())
        }
    }
}

impl fmt::Display for EnvironmentTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Resolve an optional tag argument against the configured default
pub fn resolve_tag(tag: Option<&str>, settings: &EnvironmentSettings) -> Result<EnvironmentTag> {
    EnvironmentTag::parse(tag.unwrap_or(&settings.default_tag))
}

/// Every tag covered by build-all and test-all
pub fn fan_out_tags(settings: &EnvironmentSettings) -> Result<Vec<EnvironmentTag>> {
    settings
        .tags
        .iter()
        .map(|tag| EnvironmentTag::parse(tag))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_naming() {
        let settings = EnvironmentSettings::default();
        let tag = EnvironmentTag::parse("3.7").unwrap();
        assert_eq!(tag.image_name(&settings), "rsconnect-python:3.7");
        assert_eq!(tag.base_image(&settings), "python:3.7-slim");
    }

    #[test]
    fn test_tag_grammar() {
        assert!(EnvironmentTag::parse("3.8").is_ok());
        assert!(EnvironmentTag::parse("3.9-rc_1").is_ok());
        assert!(EnvironmentTag::parse("").is_err());
        assert!(EnvironmentTag::parse("-3.8").is_err());
        assert!(EnvironmentTag::parse("3.8; rm -rf /").is_err());
        assert!(EnvironmentTag::parse(&"9".repeat(129)).is_err());
    }

    #[test]
    fn test_legacy_tags_lack_tooling() {
        let settings = EnvironmentSettings::default();
        for tag in &settings.tags {
            let tag = EnvironmentTag::parse(tag).unwrap();
            let legacy = tag.as_str() == "2.7" || tag.as_str() == "3.5";
            assert_eq!(tag.supports_tooling(&settings), !legacy, "tag {}", tag);
            assert_eq!(tag.require_tooling(&settings, "lint").is_err(), legacy);
        }
    }

    #[test]
    fn test_resolve_tag_defaults() {
        let settings = EnvironmentSettings::default();
        assert_eq!(resolve_tag(None, &settings).unwrap().as_str(), "3.8");
        assert_eq!(resolve_tag(Some("3.6"), &settings).unwrap().as_str(), "3.6");
        assert_eq!(fan_out_tags(&settings).unwrap().len(), 5);
    }
}
