pub mod build;
pub mod clean;

use anyhow::{Context, Result};
use hpipe_build::{BuildType, TaskRunner};
use hpipe_config::GlobalConfig;
use std::path::{Path, PathBuf};

/// Options shared by every task command
#[derive(Debug, Clone, Default)]
pub struct ProjectArgs {
    /// Project directory (defaults to current directory)
    pub project_dir: Option<PathBuf>,
    /// Output prefix override
    pub output_dir: Option<PathBuf>,
}

/// Build type precedence: command-line flag, then the configured default
/// (global config or HPIPE_BUILD_TYPE), then Debug
pub fn determine_build_type(flag: Option<&str>, global: &GlobalConfig) -> String {
    flag.or_else(|| global.default_build_type())
        .map(str::to_string)
        .unwrap_or_else(|| BuildType::default().name().to_string())
}

/// Create a runner rooted at the project directory
///
/// Paths are made absolute because the compiler runs inside the project
/// root while the output prefix may have been given relative to the
/// caller's working directory.
pub fn make_runner(args: &ProjectArgs, global: GlobalConfig) -> Result<TaskRunner> {
    let project_dir = args
        .project_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from("."));
    let project_dir = std::fs::canonicalize(&project_dir).with_context(|| {
        format!("Project directory not found: {}", project_dir.display())
    })?;

    let mut runner = TaskRunner::new(project_dir).with_global_config(global);
    if let Some(dir) = &args.output_dir {
        runner = runner.with_output_dir(absolute(dir)?);
    }
    log::debug!(
        "project {} -> {}",
        runner.project_root().display(),
        runner.output_prefix().display()
    );
    Ok(runner)
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()
            .context("Failed to read current directory")?
            .join(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_build_type_flag_wins() {
        let global: GlobalConfig = toml_config("[defaults]\nbuild_type = \"release\"\n");
        assert_eq!(determine_build_type(Some("Debug"), &global), "Debug");
        assert_eq!(determine_build_type(None, &global), "release");
    }

    #[test]
    fn test_build_type_default() {
        assert_eq!(determine_build_type(None, &GlobalConfig::default()), "Debug");
    }

    #[test]
    fn test_make_runner_defaults_to_build_dir() {
        let temp_dir = TempDir::new().unwrap();
        let args = ProjectArgs {
            project_dir: Some(temp_dir.path().to_path_buf()),
            output_dir: None,
        };

        let runner = make_runner(&args, GlobalConfig::default()).unwrap();
        let root = std::fs::canonicalize(temp_dir.path()).unwrap();
        assert_eq!(runner.project_root(), root);
        assert_eq!(runner.output_prefix(), root.join("build"));
    }

    #[test]
    fn test_make_runner_missing_project() {
        let temp_dir = TempDir::new().unwrap();
        let args = ProjectArgs {
            project_dir: Some(temp_dir.path().join("missing")),
            output_dir: None,
        };

        let err = make_runner(&args, GlobalConfig::default()).err().unwrap();
        assert!(err.to_string().contains("Project directory not found"));
    }

    fn toml_config(content: &str) -> GlobalConfig {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, content).unwrap();
        GlobalConfig::load_from_file(&path).unwrap()
    }
}
