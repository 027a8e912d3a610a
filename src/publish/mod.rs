//! Object-store publication of built wheels.
//!
//! Uploads go through `aws s3 cp` with `bucket-owner-full-control` so the
//! bucket owner keeps control of objects written by CI credentials.

use crate::config::BuildConfig;
use crate::packaging::{WheelArtifact, latest_basename};
use crate::process::Invocation;

/// Where a wheel is published
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishTarget {
    /// `<prefix>/<version>/<basename>`
    Versioned,
    /// `<prefix>/latest/<name>-latest-<tag>.whl`, never cached
    Latest,
}

impl PublishTarget {
    /// Destination URL for `wheel` built at `version`
    pub fn destination(self, config: &BuildConfig, version: &str, wheel: &WheelArtifact) -> String {
        let prefix = config.publish.s3_prefix.trim_end_matches('/');
        match self {
            PublishTarget::Versioned => format!("{}/{}/{}", prefix, version, wheel.basename()),
            PublishTarget::Latest => format!("{}/latest/{}", prefix, latest_basename(config)),
        }
    }

    /// The `aws s3 cp` invocation
    pub fn upload(self, config: &BuildConfig, version: &str, wheel: &WheelArtifact) -> Invocation {
        let mut inv = Invocation::new(config.publish.aws.clone()).args([
            "s3",
            "cp",
            "--acl",
            "bucket-owner-full-control",
        ]);
        if self == PublishTarget::Latest {
            inv = inv.args(["--cache-control", "max-age=0"]);
        }
        inv.arg(wheel.path().display().to_string())
            .arg(self.destination(config, version, wheel))
            .current_dir(&config.project_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_versioned_upload() {
        let config = BuildConfig::for_project("/work");
        let wheel = WheelArtifact::for_version(&config, "1.5.0");
        let inv = PublishTarget::Versioned.upload(&config, "1.5.0", &wheel);
        assert_eq!(
            inv.display(),
            "aws s3 cp --acl bucket-owner-full-control \
             /work/dist/rsconnect_python-1.5.0-py2.py3-none-any.whl \
             s3://rstudio-connect-downloads/connect/rsconnect-python/1.5.0/\
             rsconnect_python-1.5.0-py2.py3-none-any.whl"
        );
    }

    #[test]
    fn test_latest_upload_disables_caching() {
        let mut config = BuildConfig::for_project("/work");
        config.publish.s3_prefix = "s3://bucket/prefix/".to_string();
        let wheel = WheelArtifact::for_version(&config, "1.5.0");
        let inv = PublishTarget::Latest.upload(&config, "1.5.0", &wheel);
        assert!(inv.display().contains("--cache-control max-age=0"));
        assert!(inv.display().ends_with(
            "s3://bucket/prefix/latest/rsconnect_python-latest-py2.py3-none-any.whl"
        ));
    }
}
