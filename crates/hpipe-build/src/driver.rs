//! Compiler driver
//!
//! Turns one target plus the active configuration into one toolchain
//! invocation and exactly one [`Outcome`]. Failures are data: the driver
//! never returns an error, so the runner can keep compiling the remaining
//! targets.

use crate::error::{BuildError, BuildResult};
use crate::fs::FileSystem;
use crate::profile::Configuration;
use crate::report::Outcome;
use crate::targets::Target;
use crate::toolchain::{Invocation, Toolchain};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Drives the toolchain for each target of a build
pub struct CompilerDriver<'a> {
    toolchain: &'a dyn Toolchain,
    fs: &'a dyn FileSystem,
    /// Sources and include paths are resolved against this directory
    project_root: PathBuf,
}

impl<'a> CompilerDriver<'a> {
    pub fn new(
        toolchain: &'a dyn Toolchain,
        fs: &'a dyn FileSystem,
        project_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            toolchain,
            fs,
            project_root: project_root.into(),
        }
    }

    /// Compile a single target
    pub fn compile(&self, target: &Target, config: &Configuration) -> Outcome {
        let start = Instant::now();
        let artifact = config.artifact_path(target);
        log::info!("compiling {} ({}, {})", target.name, target.kind, config.build_type);

        if let Err(error) = self.prepare_output(&artifact, config) {
            log::warn!("{}: {}", target.name, error);
            return Outcome::from_error(&target.name, &error, start.elapsed());
        }

        let sources = self.resolve(&target.sources);
        let include_paths = self.resolve(&target.include_paths);
        let invocation = Invocation {
            kind: target.kind,
            sources: &sources,
            include_paths: &include_paths,
            flags: &config.flags,
            output_path: &artifact,
            intermediate_dir: &config.intermediate_root,
        };

        let error = match self.toolchain.invoke(&invocation) {
            Ok(output) if output.success() => {
                return Outcome::succeeded(&target.name, artifact, start.elapsed());
            }
            Ok(output) => BuildError::CompilationFailed {
                target: target.name.clone(),
                exit_code: output.exit_code,
                output: output.output,
            },
            Err(error) => error,
        };

        log::warn!("{}", error);
        Outcome::from_error(&target.name, &error, start.elapsed())
    }

    /// Output directories exist and the artifact is free to overwrite
    fn prepare_output(&self, artifact: &Path, config: &Configuration) -> BuildResult<()> {
        for dir in [&config.output_root, &config.intermediate_root] {
            self.fs
                .create_dir_all(dir)
                .map_err(|e| BuildError::io(dir.clone(), e))?;
        }

        if self.fs.exists(artifact) && self.fs.is_file_busy(artifact) {
            return Err(BuildError::ResourceBusy {
                path: artifact.to_path_buf(),
            });
        }
        Ok(())
    }

    fn resolve(&self, paths: &[PathBuf]) -> Vec<PathBuf> {
        paths.iter().map(|p| self.project_root.join(p)).collect()
    }
}
