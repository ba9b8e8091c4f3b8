//! Toolchain collaborator
//!
//! The core hands the toolchain one [`Invocation`] per target. Flag contents
//! are opaque strings supplied by the configuration. [`CommandToolchain`]
//! turns an invocation into one or more processes depending on the target
//! kind:
//!
//! ```text
//! executable:     <cc> <flags> <includes> <sources> -o <artifact>
//! shared-library: <cc> <flags> -shared -fPIC <includes> <sources> -o <artifact>
//! static-library: <cc> <flags> <includes> -c <source> -o <obj>   (per source)
//!                 <ar> rcs <artifact> <obj>...
//! ```

use crate::error::{BuildError, BuildResult};
use crate::targets::TargetKind;
use hpipe_config::GlobalConfig;
use std::collections::HashMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Programs probed on PATH when nothing is configured
pub const DEFAULT_CANDIDATES: [&str; 3] = ["cc", "clang", "gcc"];

/// One compiler invocation
#[derive(Debug, Clone, Copy)]
pub struct Invocation<'a> {
    /// Kind of artifact to produce
    pub kind: TargetKind,
    /// Source files, already resolved against the project root
    pub sources: &'a [PathBuf],
    /// Include directories, already resolved against the project root
    pub include_paths: &'a [PathBuf],
    /// Configuration flags
    pub flags: &'a [String],
    /// Artifact to produce
    pub output_path: &'a Path,
    /// Scratch directory for intermediate objects, exported as HPIPE_OBJ_DIR
    pub intermediate_dir: &'a Path,
}

impl Invocation<'_> {
    /// Directory holding the object files of this artifact
    pub fn object_dir(&self) -> PathBuf {
        let stem = self.output_path.file_stem().unwrap_or_default();
        self.intermediate_dir.join(stem)
    }

    /// Object file compiled from `source`
    fn object_path(&self, source: &Path) -> PathBuf {
        let mut name = source.file_name().unwrap_or_default().to_os_string();
        name.push(".o");
        self.object_dir().join(name)
    }
}

/// Result of running the toolchain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolchainOutput {
    /// Process exit code
    pub exit_code: i32,
    /// Captured stdout and stderr
    pub output: String,
}

impl ToolchainOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Compiles one target per call
pub trait Toolchain {
    /// Run the compiler to completion. `Err` means the process could not be
    /// started at all; a compiler that ran and failed is `Ok` with a non-zero
    /// exit code.
    fn invoke(&self, invocation: &Invocation<'_>) -> BuildResult<ToolchainOutput>;
}

/// A single process launched for an invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandStep {
    pub program: PathBuf,
    pub args: Vec<OsString>,
}

/// Toolchain driven through external compiler and archiver processes
#[derive(Debug, Clone)]
pub struct CommandToolchain {
    /// Compiler driver program
    program: PathBuf,
    /// Flag preceding the artifact path
    output_flag: String,
    /// Flag prefixed to each include directory
    include_flag: String,
    /// Flag that stops the compiler before linking
    compile_flag: String,
    /// Extra flags for shared libraries
    shared_flags: Vec<String>,
    /// Static library archiver
    archiver: PathBuf,
    /// Archiver flags preceding the archive path
    archive_flags: Vec<String>,
    /// Working directory for the compiler process
    working_dir: Option<PathBuf>,
    /// Extra environment variables
    env_vars: HashMap<String, String>,
}

impl CommandToolchain {
    /// Create a toolchain for `program` with cc-style conventions
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            output_flag: "-o".to_string(),
            include_flag: "-I".to_string(),
            compile_flag: "-c".to_string(),
            shared_flags: vec!["-shared".to_string(), "-fPIC".to_string()],
            archiver: PathBuf::from("ar"),
            archive_flags: vec!["rcs".to_string()],
            working_dir: None,
            env_vars: HashMap::new(),
        }
    }

    /// Set the output flag
    pub fn with_output_flag(mut self, flag: impl Into<String>) -> Self {
        self.output_flag = flag.into();
        self
    }

    /// Set the include flag
    pub fn with_include_flag(mut self, flag: impl Into<String>) -> Self {
        self.include_flag = flag.into();
        self
    }

    /// Set the static library archiver
    pub fn with_archiver(mut self, archiver: impl Into<PathBuf>) -> Self {
        self.archiver = archiver.into();
        self
    }

    /// Set the compiler working directory
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Add an environment variable for the compiler process
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env_vars.insert(key.into(), value.into());
        self
    }

    /// Apply `[toolchain]` conventions from the global configuration
    pub fn merge_with_global(mut self, global: &GlobalConfig) -> Self {
        if let Some(toolchain) = &global.toolchain {
            if let Some(flag) = &toolchain.output_flag {
                self.output_flag = flag.clone();
            }
            if let Some(flag) = &toolchain.include_flag {
                self.include_flag = flag.clone();
            }
            if let Some(flag) = &toolchain.compile_flag {
                self.compile_flag = flag.clone();
            }
            if let Some(flags) = &toolchain.shared_flags {
                self.shared_flags = flags.clone();
            }
            if let Some(archiver) = &toolchain.archiver {
                self.archiver = PathBuf::from(archiver);
            }
            if let Some(flags) = &toolchain.archive_flags {
                self.archive_flags = flags.clone();
            }
        }
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Processes to run for an invocation, in order
    pub fn plan(&self, invocation: &Invocation<'_>) -> Vec<CommandStep> {
        match invocation.kind {
            TargetKind::Executable => vec![self.link_step(invocation, &[])],
            TargetKind::SharedLibrary => vec![self.link_step(invocation, &self.shared_flags)],
            TargetKind::StaticLibrary => {
                let mut steps = Vec::with_capacity(invocation.sources.len() + 1);
                let mut archive_args: Vec<OsString> =
                    self.archive_flags.iter().map(OsString::from).collect();
                archive_args.push(invocation.output_path.as_os_str().to_owned());

                for source in invocation.sources {
                    let object = invocation.object_path(source);
                    let mut args = self.common_args(invocation, &[]);
                    args.push(OsString::from(&self.compile_flag));
                    args.push(source.as_os_str().to_owned());
                    args.push(OsString::from(&self.output_flag));
                    args.push(object.as_os_str().to_owned());
                    steps.push(self.compiler_step(args));
                    archive_args.push(object.into_os_string());
                }

                steps.push(CommandStep {
                    program: self.archiver.clone(),
                    args: archive_args,
                });
                steps
            }
        }
    }

    /// `<flags> <extra> <includes>`
    fn common_args(&self, invocation: &Invocation<'_>, extra: &[String]) -> Vec<OsString> {
        let mut args: Vec<OsString> = invocation
            .flags
            .iter()
            .chain(extra)
            .map(OsString::from)
            .collect();
        for dir in invocation.include_paths {
            let mut arg = OsString::from(&self.include_flag);
            arg.push(dir.as_os_str());
            args.push(arg);
        }
        args
    }

    /// Compile and link all sources straight into the artifact
    fn link_step(&self, invocation: &Invocation<'_>, extra: &[String]) -> CommandStep {
        let mut args = self.common_args(invocation, extra);
        args.extend(invocation.sources.iter().map(|s| s.as_os_str().to_owned()));
        args.push(OsString::from(&self.output_flag));
        args.push(invocation.output_path.as_os_str().to_owned());
        self.compiler_step(args)
    }

    fn compiler_step(&self, args: Vec<OsString>) -> CommandStep {
        CommandStep {
            program: self.program.clone(),
            args,
        }
    }

    /// Run one step to completion, capturing its output
    fn run_step(
        &self,
        step: &CommandStep,
        invocation: &Invocation<'_>,
    ) -> BuildResult<ToolchainOutput> {
        log::debug!("running {} {:?}", step.program.display(), step.args);

        let mut command = Command::new(&step.program);
        command
            .args(&step.args)
            .envs(&self.env_vars)
            .env("HPIPE_OBJ_DIR", invocation.intermediate_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = &self.working_dir {
            command.current_dir(dir);
        }

        let output = command
            .spawn()
            .and_then(|child| child.wait_with_output())
            .map_err(|e| BuildError::ToolchainLaunch {
                program: step.program.clone(),
                error: e,
            })?;

        let mut captured = String::from_utf8_lossy(&output.stdout).to_string();
        captured.push_str(&String::from_utf8_lossy(&output.stderr));

        Ok(ToolchainOutput {
            // No exit code means the process was killed by a signal
            exit_code: output.status.code().unwrap_or(1),
            output: captured,
        })
    }
}

impl Toolchain for CommandToolchain {
    fn invoke(&self, invocation: &Invocation<'_>) -> BuildResult<ToolchainOutput> {
        if invocation.kind == TargetKind::StaticLibrary {
            let object_dir = invocation.object_dir();
            std::fs::create_dir_all(&object_dir).map_err(|e| BuildError::io(object_dir, e))?;
        }

        let mut combined = ToolchainOutput {
            exit_code: 0,
            output: String::new(),
        };
        for step in self.plan(invocation) {
            let output = self.run_step(&step, invocation)?;
            combined.output.push_str(&output.output);
            combined.exit_code = output.exit_code;
            if !output.success() {
                break;
            }
        }
        Ok(combined)
    }
}

/// Find an executable by name on a PATH-style search list
pub fn find_program(name: &str, search_path: Option<OsString>) -> Option<PathBuf> {
    let candidate = Path::new(name);
    if candidate.components().count() > 1 {
        return candidate.is_file().then(|| candidate.to_path_buf());
    }

    let search_path = search_path?;
    std::env::split_paths(&search_path)
        .map(|dir| dir.join(format!("{}{}", name, std::env::consts::EXE_SUFFIX)))
        .find(|path| path.is_file())
}

/// Probe the default candidates on the process PATH
pub fn discover_program() -> Option<PathBuf> {
    DEFAULT_CANDIDATES
        .iter()
        .find_map(|name| find_program(name, std::env::var_os("PATH")))
}
