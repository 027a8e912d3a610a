//! Command line argument parsing and validation.
//!
//! Subcommands mirror the targets of the managed project's Makefile, and the
//! Makefile's tag-suffixed spellings (`test-3.8`, `image3.6`) are accepted
//! as aliases.

use clap::{Parser, Subcommand};
use std::ffi::OsString;
use std::path::PathBuf;

/// Docker-based test, lint, packaging and publishing for rsconnect-python
#[derive(Parser, Debug)]
#[command(
    name = "rsconnect_release",
    version,
    about = "Docker-based test, lint, packaging and publishing for rsconnect-python",
    long_about = "Runs the rsconnect-python test, lint and format tooling inside per-Python
Docker images, builds and validates the wheel, and publishes it to S3.

Usage:
  rsconnect_release test 3.7
  rsconnect_release test-3.7
  rsconnect_release mock-test
  rsconnect_release dist --json
  rsconnect_release sync-latest-to-s3"
)]
pub struct Args {
    /// Project working tree
    #[arg(long, global = true, value_name = "DIR", default_value = ".")]
    pub project_dir: PathBuf,

    /// Configuration file (default: <project>/release.toml when present)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Show debug logging and per-step details
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only print errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Operation to run
    #[command(subcommand)]
    pub command: Command,
}

/// Named operations
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Build the image for every Python version
    #[command(name = "build-all")]
    BuildAll,

    /// Build every image, then run the tests in each
    #[command(name = "test-all")]
    TestAll,

    /// Build the image for one Python version
    #[command(name = "image")]
    Image {
        /// Python version tag (default: 3.8)
        tag: Option<String>,
    },

    /// Open an interactive shell in the container
    #[command(name = "shell")]
    Shell {
        /// Python version tag (default: 3.8)
        tag: Option<String>,
    },

    /// Run the test suite in the container
    #[command(name = "test")]
    Test {
        /// Python version tag (default: 3.8)
        tag: Option<String>,
    },

    /// Run the test suite against the mock Connect server
    #[command(name = "mock-test")]
    MockTest {
        /// Python version tag (default: 3.8)
        tag: Option<String>,
    },

    /// Reformat the source tree with black
    #[command(name = "fmt")]
    Fmt {
        /// Python version tag (default: 3.8)
        tag: Option<String>,
    },

    /// Run black, flake8 and mypy
    #[command(name = "lint")]
    Lint {
        /// Python version tag (default: 3.8)
        tag: Option<String>,
    },

    /// Install requirements inside the container
    #[command(name = "deps")]
    Deps {
        /// Python version tag (default: 3.8)
        tag: Option<String>,
    },

    /// Remove build output
    #[command(name = "clean")]
    Clean,

    /// Remove local rsconnect-python state directories
    #[command(name = "clean-stores")]
    CleanStores,

    /// Build the documentation
    #[command(name = "docs")]
    Docs,

    /// Print the package version
    #[command(name = "version")]
    Version,

    /// Build and check the wheel
    #[command(name = "dist")]
    Dist {
        /// Print the package report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Upload the wheel under its version
    #[command(name = "sync-to-s3")]
    SyncToS3,

    /// Upload the wheel as the latest release
    #[command(name = "sync-latest-to-s3")]
    SyncLatestToS3,
}

impl Command {
    /// Subcommand name as typed
    pub fn name(&self) -> &'static str {
        match self {
            Command::BuildAll => "build-all",
            Command::TestAll => "test-all",
            Command::Image { .. } => "image",
            Command::Shell { .. } => "shell",
            Command::Test { .. } => "test",
            Command::MockTest { .. } => "mock-test",
            Command::Fmt { .. } => "fmt",
            Command::Lint { .. } => "lint",
            Command::Deps { .. } => "deps",
            Command::Clean => "clean",
            Command::CleanStores => "clean-stores",
            Command::Docs => "docs",
            Command::Version => "version",
            Command::Dist { .. } => "dist",
            Command::SyncToS3 => "sync-to-s3",
            Command::SyncLatestToS3 => "sync-latest-to-s3",
        }
    }

    /// Whether stdout carries the command's result rather than progress
    pub fn prints_result(&self) -> bool {
        matches!(self, Command::Version | Command::Dist { json: true })
    }
}

/// Subcommands that take a tag and accept the Makefile suffix spelling
const TAGGED_COMMANDS: [&str; 7] = ["image", "shell", "test", "mock-test", "fmt", "lint", "deps"];

/// Global options that consume the following argument
const VALUE_OPTIONS: [&str; 2] = ["--project-dir", "--config"];

/// `test-3.8` -> (`test`, `3.8`); the tag must start with a digit
fn split_alias(target: &str) -> Option<(&'static str, &str)> {
    TAGGED_COMMANDS.iter().find_map(|command| {
        let rest = target.strip_prefix(command)?;
        let tag = rest.strip_prefix('-').unwrap_or(rest);
        tag.starts_with(|c: char| c.is_ascii_digit())
            .then_some((*command, tag))
    })
}

/// Split a Makefile-style target (`test-3.8`, `image3.6`) into subcommand and tag.
///
/// Only the first positional argument is considered; everything else is
/// passed through untouched.
pub fn normalize_target_args<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let mut out = Vec::new();
    let mut expect_value = false;
    let mut seen_positional = false;

    for (index, arg) in args.into_iter().map(Into::into).enumerate() {
        if index == 0 || seen_positional {
            out.push(arg);
            continue;
        }
        if expect_value {
            expect_value = false;
            out.push(arg);
            continue;
        }

        let Some(text) = arg.to_str() else {
            out.push(arg);
            continue;
        };
        if text.starts_with('-') {
            expect_value = VALUE_OPTIONS.contains(&text);
            out.push(arg);
            continue;
        }

        seen_positional = true;
        let split = split_alias(text).map(|(command, tag)| (command, OsString::from(tag)));
        match split {
            Some((command, tag)) => {
                out.push(OsString::from(command));
                out.push(tag);
            }
            None => out.push(arg),
        }
    }

    out
}

impl Args {
    /// Parse command line arguments, expanding Makefile-style aliases
    pub fn parse_args() -> Self {
        Self::parse_from(normalize_target_args(std::env::args_os()))
    }

    /// Validate arguments for consistency
    pub fn validate(&self) -> Result<(), String> {
        if self.project_dir.as_os_str().is_empty() {
            return Err("--project-dir must not be empty".to_string());
        }
        if let Some(config) = &self.config
            && config.as_os_str().is_empty()
        {
            return Err("--config must not be empty".to_string());
        }
        Ok(())
    }
}

/// Configuration derived from command line arguments
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Output manager for colored terminal output
    output: super::OutputManager,
}

impl RuntimeConfig {
    /// Create runtime configuration
    pub fn new(verbose: bool, quiet: bool) -> Self {
        Self {
            output: super::OutputManager::new(verbose, quiet),
        }
    }

    /// Get a reference to the output manager
    pub fn output(&self) -> &super::OutputManager {
        &self.output
    }

    /// Print message
    pub fn println(&self, message: &str) {
        self.output.println(message);
    }

    /// Print error message (always shown)
    pub fn error_println(&self, message: &str) {
        self.output.error(message);
    }

    /// Print success message
    pub fn success_println(&self, message: &str) {
        self.output.success(message);
    }

    /// Print indented text
    pub fn indent(&self, message: &str) {
        self.output.indent(message);
    }

    /// Check if verbose output is enabled
    pub fn is_verbose(&self) -> bool {
        self.output.is_verbose()
    }

    /// Check if quiet mode is enabled
    pub fn is_quiet(&self) -> bool {
        self.output.is_quiet()
    }
}

impl From<&Args> for RuntimeConfig {
    /// Commands whose stdout is their result run quietly
    fn from(args: &Args) -> Self {
        Self::new(args.verbose, args.quiet || args.command.prints_result())
    }
}
