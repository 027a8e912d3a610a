//! Command line interface for rsconnect_release.
//!
//! Argument parsing, logging setup, colored output and dispatch of each
//! subcommand to the orchestrator.

mod args;
pub mod commands;
mod output;

pub use args::{Args, Command, RuntimeConfig, normalize_target_args};
pub use commands::execute_command;
pub use output::OutputManager;

use crate::error::Result;

/// Main CLI entry point
pub async fn run() -> Result<i32> {
    let args = Args::parse_args();
    init_logging(args.verbose);
    execute_command(args).await
}

/// Route `log` output to stderr: `warn` by default, `debug` with `--verbose`,
/// `RUST_LOG` wins over both
fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    let initialised = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(default_filter),
    )
    .format_timestamp(None)
    .try_init();
    if let Err(e) = initialised {
        eprintln!("Logger already initialised: {}", e);
    }
}
