//! Clean command - remove the outputs of one build type

use super::{determine_build_type, make_runner, ProjectArgs};
use anyhow::{Context, Result};
use colored::Colorize;
use hpipe_build::{Task, TaskOptions, TaskOutcome, TaskRegistry};
use hpipe_config::GlobalConfig;
use std::process::ExitCode;

/// Clean command arguments
#[derive(Debug, Clone, Default)]
pub struct CleanArgs {
    pub project: ProjectArgs,
    /// Build type whose outputs are removed
    pub build_type: Option<String>,
}

/// Run the clean command
pub fn run(args: CleanArgs, global: GlobalConfig, registry: &TaskRegistry) -> Result<ExitCode> {
    let options = TaskOptions::new(determine_build_type(args.build_type.as_deref(), &global));
    let mut runner = make_runner(&args.project, global)?;

    let outcome = registry
        .run(Task::Clean.name(), &mut runner, &options)
        .context("Clean failed")?;

    if let TaskOutcome::Cleaned(removed) = &outcome {
        if removed.is_empty() {
            println!("Nothing to clean for {}", options.build_type);
        }
        for path in removed {
            println!("{} {}", "Removed".green().bold(), path.display());
        }
    }

    Ok(ExitCode::from(outcome.exit_code()))
}
