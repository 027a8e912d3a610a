//! # rsconnect_release
//!
//! Build and release orchestration for rsconnect-python.
//!
//! Replaces the project's Makefile: every named operation runs the project's
//! own tooling inside a per-Python Docker image, builds and validates the
//! wheel on the host, or publishes it to S3. The orchestrator contains no
//! application logic of its own.
//!
//! ## Features
//!
//! - **Per-environment containers**: `test`, `lint`, `fmt`, `deps` and `shell`
//!   in `rsconnect-python:<tag>` images
//! - **Mock server tests**: the auxiliary server is polled for readiness and
//!   always stopped, even on failure or Ctrl-C
//! - **Reproducible wheels**: one `SOURCE_DATE_EPOCH` per build, `twine check`,
//!   SHA-256 digest
//! - **Publishing**: versioned and latest S3 keys
//!
//! ## Usage
//!
//! ```bash
//! rsconnect_release test 3.7       # run the test suite on Python 3.7
//! rsconnect_release lint           # black, flake8, mypy on the default tag
//! rsconnect_release mock-test-3.8  # Makefile-style alias
//! rsconnect_release dist --json    # build the wheel, print the report
//! rsconnect_release sync-to-s3     # publish under the current version
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod clean;
pub mod cli;
pub mod config;
pub mod docker;
pub mod environment;
pub mod error;
pub mod mock_server;
pub mod orchestrator;
pub mod packaging;
pub mod process;
pub mod publish;

pub use cli::Args;
pub use config::BuildConfig;
pub use environment::EnvironmentTag;
pub use error::{CliError, ReleaseError, Result};
pub use orchestrator::Orchestrator;
pub use packaging::{PackageReport, WheelArtifact};
pub use process::{CommandRunner, ExitOutcome, Invocation, SystemRunner};
pub use publish::PublishTarget;
