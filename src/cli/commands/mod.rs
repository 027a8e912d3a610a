//! Command execution.
//!
//! Loads the build configuration, wires the orchestrator to real processes,
//! and maps each subcommand to an orchestrator operation.

use crate::cli::{Args, Command, RuntimeConfig};
use crate::config::BuildConfig;
use crate::error::{CliError, Result};
use crate::orchestrator::Orchestrator;
use crate::process::{CommandRunner, SystemRunner};
use crate::publish::PublishTarget;

/// Execute the main command based on parsed arguments
pub async fn execute_command(args: Args) -> Result<i32> {
    args.validate()
        .map_err(|reason| CliError::InvalidArguments { reason })?;

    let runtime = RuntimeConfig::from(&args);
    let config = BuildConfig::load(&args.project_dir, args.config.as_deref())?;
    log::debug!("Project directory: {}", config.project_dir.display());

    let orchestrator = Orchestrator::new(
        config,
        SystemRunner::new(runtime.output().clone()),
        runtime.output().clone(),
    );

    let cancel = orchestrator.cancellation_token();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::warn!("Interrupt received, stopping current step");
            cancel.cancel();
        }
    });

    let result = dispatch(&args.command, &orchestrator, &runtime).await;
    interrupt.abort();

    match result {
        Ok(()) => {
            if !runtime.is_quiet() {
                runtime.success_println(&format!(
                    "Command '{}' completed successfully",
                    args.command.name()
                ));
            }
            Ok(0)
        }
        Err(e) => {
            runtime.error_println(&format!(
                "Command '{}' failed: {}",
                args.command.name(),
                e
            ));

            if runtime.is_verbose() {
                let suggestions = e.recovery_suggestions();
                if !suggestions.is_empty() {
                    runtime.println("\n💡 Recovery suggestions:");
                    for suggestion in suggestions {
                        runtime.println(&format!("  • {}", suggestion));
                    }
                }
            }

            Ok(e.exit_code())
        }
    }
}

async fn dispatch<R: CommandRunner>(
    command: &Command,
    orchestrator: &Orchestrator<R>,
    runtime: &RuntimeConfig,
) -> Result<()> {
    match command {
        Command::BuildAll => orchestrator.build_all().await,
        Command::TestAll => orchestrator.test_all().await,
        Command::Image { tag } => orchestrator.compose_image(tag.as_deref()).await,
        Command::Shell { tag } => orchestrator.shell(tag.as_deref()).await,
        Command::Test { tag } => orchestrator.test(tag.as_deref()).await,
        Command::MockTest { tag } => orchestrator.mock_test(tag.as_deref()).await,
        Command::Fmt { tag } => orchestrator.format(tag.as_deref()).await,
        Command::Lint { tag } => orchestrator.lint(tag.as_deref()).await,
        Command::Deps { tag } => orchestrator.deps(tag.as_deref()).await,
        Command::Clean => {
            let removed = orchestrator.clean()?;
            if removed.is_empty() {
                runtime.indent("nothing to remove");
            }
            Ok(())
        }
        Command::CleanStores => {
            for path in orchestrator.clean_stores()? {
                runtime.indent(&format!("removed {}", path.display()));
            }
            Ok(())
        }
        Command::Docs => orchestrator.docs().await,
        Command::Version => {
            let version = orchestrator.print_version().await?;
            println!("{}", version);
            Ok(())
        }
        Command::Dist { json } => {
            let report = orchestrator.package().await?;
            if *json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            }
            Ok(())
        }
        Command::SyncToS3 => orchestrator
            .publish(PublishTarget::Versioned)
            .await
            .map(|_| ()),
        Command::SyncLatestToS3 => orchestrator
            .publish(PublishTarget::Latest)
            .await
            .map(|_| ()),
    }
}
