use anyhow::{Context, Result};
use clap::builder::FalseyValueParser;
use clap::{ArgAction, CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use hpipe_build::TaskRegistry;
use hpipe_config::ConfigLoader;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

mod commands;
mod config;

/// Task runner for hpipe C/C++ builds.
///
/// Reads the targets and packages declared in hbuild.toml, compiles each
/// target with the configured toolchain and prints a per-target report.
///
/// EXAMPLES:
///     htask build                        Debug build of the current project
///     htask build --build-type Release   Optimized build
///     htask build --clean                Remove previous outputs first
///     htask clean --build-type Release   Remove release outputs
///
/// ENVIRONMENT VARIABLES:
///     HPIPE_CC          Compiler program (overrides discovery)
///     HPIPE_BUILD_TYPE  Default build type
///     HPIPE_OUTPUT_DIR  Output prefix
///     HPIPE_JSON        Set to '1' for JSON reports ('0' or 'false' to disable)
///     HPIPE_LOG         Log filter (env_logger syntax)
///     NO_COLOR          Set to disable colored output
#[derive(Parser)]
#[command(name = "htask")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Project directory containing hbuild.toml
    #[arg(long, short = 'C', global = true)]
    project_dir: Option<PathBuf>,

    /// Output directory prefix (default: <project>/build)
    #[arg(long, global = true)]
    output_dir: Option<PathBuf>,

    /// Verbose logging
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build every target declared in hbuild.toml
    ///
    /// All targets are attempted even when some fail. The exit code is
    /// non-zero if any target failed.
    ///
    /// EXAMPLES:
    ///     htask build
    ///     htask build -t release --clean
    ///     htask build --reconfigure     Rediscover the compiler
    ///     htask build --json            Machine-readable report
    #[command(visible_alias = "b")]
    Build {
        /// Build type: Debug or Release (case-insensitive)
        #[arg(long, short = 't')]
        build_type: Option<String>,
        /// Remove previous outputs before building
        #[arg(long)]
        clean: bool,
        /// Ignore the cached toolchain and discover it again
        #[arg(long)]
        reconfigure: bool,
        /// Print the report as JSON
        #[arg(
            long,
            env = "HPIPE_JSON",
            action = ArgAction::SetTrue,
            value_parser = FalseyValueParser::new()
        )]
        json: bool,
    },

    /// Remove the outputs of one build type
    ///
    /// Removing outputs that do not exist is not an error.
    Clean {
        /// Build type: Debug or Release (case-insensitive)
        #[arg(long, short = 't')]
        build_type: Option<String>,
    },

    /// Generate shell completions
    ///
    /// EXAMPLES:
    ///     htask completions bash > ~/.bash_completions/htask.bash
    ///     htask completions zsh > ~/.zfunc/_htask
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let cli_config = config::Config::from_env();
    cli_config.init_logging(cli.verbose);
    if cli_config.no_color {
        colored::control::set_override(false);
    }

    let project = commands::ProjectArgs {
        project_dir: cli.project_dir,
        output_dir: cli.output_dir,
    };
    let registry = TaskRegistry::with_defaults();

    match cli.command {
        Commands::Build {
            build_type,
            clean,
            reconfigure,
            json,
        } => {
            let global = load_global_config()?;
            let args = commands::build::BuildArgs {
                project,
                build_type,
                clean,
                reconfigure,
                json,
            };
            commands::build::run(args, global, &registry)
        }
        Commands::Clean { build_type } => {
            let global = load_global_config()?;
            let args = commands::clean::CleanArgs {
                project,
                build_type,
            };
            commands::clean::run(args, global, &registry)
        }
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(shell, &mut cmd, name, &mut io::stdout());
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Global config with HPIPE_* overrides applied
fn load_global_config() -> Result<hpipe_config::GlobalConfig> {
    ConfigLoader::new()
        .load()
        .context("Failed to load configuration")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_smoke() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_build_flags() {
        let cli = Cli::parse_from([
            "htask",
            "build",
            "--build-type",
            "release",
            "--clean",
            "--reconfigure",
        ]);
        match cli.command {
            Commands::Build {
                build_type,
                clean,
                reconfigure,
                ..
            } => {
                assert_eq!(build_type.as_deref(), Some("release"));
                assert!(clean);
                assert!(reconfigure);
            }
            _ => panic!("Expected Build command"),
        }
    }

    #[test]
    fn test_alias_b_for_build() {
        let cli = Cli::parse_from(["htask", "b"]);
        assert!(matches!(cli.command, Commands::Build { .. }));
    }

    #[test]
    fn test_global_options_after_subcommand() {
        let cli = Cli::parse_from(["htask", "clean", "-t", "Debug", "-C", "proj", "-v"]);
        assert_eq!(cli.project_dir, Some(PathBuf::from("proj")));
        assert!(cli.verbose);
        match cli.command {
            Commands::Clean { build_type } => assert_eq!(build_type.as_deref(), Some("Debug")),
            _ => panic!("Expected Clean command"),
        }
    }

    #[test]
    fn test_completions_bash() {
        let cli = Cli::parse_from(["htask", "completions", "bash"]);
        match cli.command {
            Commands::Completions { shell } => assert_eq!(shell, Shell::Bash),
            _ => panic!("Expected Completions command"),
        }
    }

    #[test]
    fn test_json_flag_without_value() {
        let cli = Cli::parse_from(["htask", "build", "--json"]);
        assert!(matches!(cli.command, Commands::Build { json: true, .. }));
    }

    #[test]
    fn test_unknown_task_rejected() {
        assert!(Cli::try_parse_from(["htask", "deploy"]).is_err());
    }
}
