//! Build command - compile every declared target and report the outcome

use super::{determine_build_type, make_runner, ProjectArgs};
use anyhow::{Context, Result};
use colored::Colorize;
use hpipe_build::{render, Report, Task, TaskOptions, TaskRegistry};
use hpipe_config::GlobalConfig;
use std::process::ExitCode;

/// Build command arguments
#[derive(Debug, Clone, Default)]
pub struct BuildArgs {
    pub project: ProjectArgs,
    /// Build type name (Debug or Release, any case)
    pub build_type: Option<String>,
    /// Remove previous outputs first
    pub clean: bool,
    /// Rediscover the toolchain instead of using the cached one
    pub reconfigure: bool,
    /// Print the report as JSON
    pub json: bool,
}

impl BuildArgs {
    fn task_options(&self, global: &GlobalConfig) -> TaskOptions {
        TaskOptions::new(determine_build_type(self.build_type.as_deref(), global))
            .with_clean(self.clean)
            .with_reconfigure(self.reconfigure)
    }
}

/// Run the build command
///
/// Structural errors surface as `Err`. Target failures are part of the
/// report and turn into a non-zero exit code.
pub fn run(args: BuildArgs, global: GlobalConfig, registry: &TaskRegistry) -> Result<ExitCode> {
    let options = args.task_options(&global);
    let mut runner = make_runner(&args.project, global)?;

    if !args.json {
        println!(
            "{} {} ({})",
            "Building".green().bold(),
            runner.project_root().display(),
            options.build_type
        );
    }

    let outcome = registry
        .run(Task::Build.name(), &mut runner, &options)
        .context("Build failed")?;

    if let Some(report) = outcome.report() {
        if args.json {
            println!("{}", report.to_json().context("Failed to serialize report")?);
        } else {
            print_report(report);
        }
    }

    Ok(ExitCode::from(outcome.exit_code()))
}

fn print_report(report: &Report) {
    print!("{}", render(report));
    if report.is_success() {
        println!("{}", "Build succeeded".green().bold());
    } else {
        println!("{}", "Build failed".red().bold());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_options_from_args() {
        let args = BuildArgs {
            build_type: Some("release".to_string()),
            clean: true,
            ..Default::default()
        };
        let options = args.task_options(&GlobalConfig::default());
        assert_eq!(options.build_type, "release");
        assert!(options.clean);
        assert!(!options.reconfigure);
    }

    #[test]
    fn test_task_options_default_build_type() {
        let options = BuildArgs::default().task_options(&GlobalConfig::default());
        assert_eq!(options, TaskOptions::default());
    }
}
