//! Task runner
//!
//! Entry point for callers. Exposes the `build` and `clean` tasks through an
//! explicit [`TaskRegistry`] and sequences one invocation as a small state
//! machine:
//!
//! ```text
//! build: Idle -> [Cleaning] -> Declaring -> Compiling -> Reporting -> Done
//! clean: Idle -> Cleaning -> Done
//! ```
//!
//! Structural errors move the runner to `Failed` and are returned as `Err`.
//! Per-target compilation failures are not errors at this level: they end up
//! in the [`Report`] and the runner still reaches `Done`.

use crate::driver::CompilerDriver;
use crate::env::{Environment, CC_KEY};
use crate::error::{BuildError, BuildResult};
use crate::fs::{FileSystem, LocalFileSystem};
use crate::graph::ProjectGraph;
use crate::manifest::BuildManifest;
use crate::profile::{resolve_configuration, BuildType, Configuration};
use crate::report::{Report, Reporter};
use crate::toolchain::{discover_program, CommandToolchain, Toolchain};
use hpipe_config::{EnvStore, GlobalConfig, TomlEnvStore};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Instant;

/// Runner lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunnerState {
    Idle,
    Cleaning,
    Declaring,
    Compiling,
    Reporting,
    Done,
    Failed,
}

impl std::fmt::Display for RunnerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Cleaning => "cleaning",
            Self::Declaring => "declaring",
            Self::Compiling => "compiling",
            Self::Reporting => "reporting",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        write!(f, "{}", name)
    }
}

/// Current state plus every state entered during the last task
#[derive(Debug, Clone)]
struct StateMachine {
    state: RunnerState,
    history: Vec<RunnerState>,
}

impl StateMachine {
    fn new() -> Self {
        Self {
            state: RunnerState::Idle,
            history: vec![RunnerState::Idle],
        }
    }

    fn reset(&mut self) {
        *self = Self::new();
    }

    fn enter(&mut self, state: RunnerState) {
        log::debug!("runner: {} -> {}", self.state, state);
        self.state = state;
        self.history.push(state);
    }

    /// Move to `Failed` and hand the error back for propagation
    fn fail(&mut self, error: BuildError) -> BuildError {
        log::error!("{}", error);
        self.enter(RunnerState::Failed);
        error
    }
}

/// Built-in tasks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Task {
    Build,
    Clean,
}

impl Task {
    pub const ALL: [Task; 2] = [Task::Build, Task::Clean];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Build => "build",
            Self::Clean => "clean",
        }
    }

    fn handler(&self) -> TaskHandler {
        match self {
            Self::Build => TaskRunner::build,
            Self::Clean => TaskRunner::clean,
        }
    }
}

impl FromStr for Task {
    type Err = BuildError;

    fn from_str(s: &str) -> BuildResult<Self> {
        Task::ALL
            .into_iter()
            .find(|task| task.name() == s)
            .ok_or_else(|| BuildError::UnknownTask(s.to_string()))
    }
}

impl std::fmt::Display for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Options recognized by the tasks
///
/// `clean` ignores `clean` and `reconfigure`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskOptions {
    /// Build type name, parsed case-insensitively when the task starts
    pub build_type: String,
    /// Remove previous outputs before building
    pub clean: bool,
    /// Ignore the cached toolchain and discover it again
    pub reconfigure: bool,
}

impl Default for TaskOptions {
    fn default() -> Self {
        Self {
            build_type: BuildType::default().name().to_string(),
            clean: false,
            reconfigure: false,
        }
    }
}

impl TaskOptions {
    pub fn new(build_type: impl Into<String>) -> Self {
        Self {
            build_type: build_type.into(),
            ..Self::default()
        }
    }

    pub fn with_clean(mut self, clean: bool) -> Self {
        self.clean = clean;
        self
    }

    pub fn with_reconfigure(mut self, reconfigure: bool) -> Self {
        self.reconfigure = reconfigure;
        self
    }
}

/// What a finished task produced
#[derive(Debug)]
pub enum TaskOutcome {
    /// Report of a build, successful or not
    Built(Report),
    /// Directories removed by a clean (empty when nothing existed)
    Cleaned(Vec<PathBuf>),
}

impl TaskOutcome {
    pub fn is_success(&self) -> bool {
        match self {
            Self::Built(report) => report.is_success(),
            Self::Cleaned(_) => true,
        }
    }

    /// Process exit code for this outcome
    pub fn exit_code(&self) -> u8 {
        if self.is_success() {
            0
        } else {
            1
        }
    }

    pub fn report(&self) -> Option<&Report> {
        match self {
            Self::Built(report) => Some(report),
            Self::Cleaned(_) => None,
        }
    }
}

/// Handler signature shared by every registered task
pub type TaskHandler = fn(&mut TaskRunner, &TaskOptions) -> BuildResult<TaskOutcome>;

/// Task name to handler map, built once at startup
#[derive(Clone, Default)]
pub struct TaskRegistry {
    handlers: BTreeMap<String, TaskHandler>,
}

impl TaskRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with `build` and `clean`
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for task in Task::ALL {
            registry.register(task.name(), task.handler());
        }
        registry
    }

    /// Register a handler, replacing any previous one of the same name
    pub fn register(&mut self, name: impl Into<String>, handler: TaskHandler) {
        self.handlers.insert(name.into(), handler);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Registered task names, sorted
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }

    /// Run the task registered as `name`
    pub fn run(
        &self,
        name: &str,
        runner: &mut TaskRunner,
        options: &TaskOptions,
    ) -> BuildResult<TaskOutcome> {
        let handler = self
            .handlers
            .get(name)
            .ok_or_else(|| BuildError::UnknownTask(name.to_string()))?;
        log::debug!("running task '{}'", name);
        handler(runner, options)
    }
}

/// Sequences one build or clean over a project
pub struct TaskRunner {
    /// Directory holding the manifest; sources resolve against it
    project_root: PathBuf,
    /// Output prefix (`<root>/build` by default)
    output_prefix: PathBuf,
    global: GlobalConfig,
    fs: Box<dyn FileSystem>,
    env_store: Box<dyn EnvStore>,
    /// Injected toolchain; discovered from the environment when absent
    toolchain: Option<Box<dyn Toolchain>>,
    machine: StateMachine,
}

impl TaskRunner {
    /// Create a runner for the project at `project_root`
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        let project_root = project_root.into();
        let output_prefix = project_root.join("build");
        Self {
            env_store: Box::new(TomlEnvStore::in_dir(&output_prefix)),
            project_root,
            output_prefix,
            global: GlobalConfig::default(),
            fs: Box::new(LocalFileSystem),
            toolchain: None,
            machine: StateMachine::new(),
        }
    }

    /// Set the output prefix; the default env store moves along with it
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_prefix = dir.into();
        self.env_store = Box::new(TomlEnvStore::in_dir(&self.output_prefix));
        self
    }

    /// Apply the global configuration, including its output directory
    pub fn with_global_config(mut self, global: GlobalConfig) -> Self {
        if let Some(dir) = global.output_dir() {
            let dir = self.project_root.join(dir);
            self = self.with_output_dir(dir);
        }
        self.global = global;
        self
    }

    pub fn with_filesystem(mut self, fs: impl FileSystem + 'static) -> Self {
        self.fs = Box::new(fs);
        self
    }

    pub fn with_env_store(mut self, store: impl EnvStore + 'static) -> Self {
        self.env_store = Box::new(store);
        self
    }

    /// Use `toolchain` instead of discovering one
    pub fn with_toolchain(mut self, toolchain: impl Toolchain + 'static) -> Self {
        self.toolchain = Some(Box::new(toolchain));
        self
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    pub fn output_prefix(&self) -> &Path {
        &self.output_prefix
    }

    pub fn state(&self) -> RunnerState {
        self.machine.state
    }

    /// States entered during the last task, starting with `Idle`
    pub fn history(&self) -> &[RunnerState] {
        &self.machine.history
    }

    /// Build every target declared in the project manifest
    pub fn build(&mut self, options: &TaskOptions) -> BuildResult<TaskOutcome> {
        let root = self.project_root.clone();
        self.build_with(options, |graph| {
            BuildManifest::load(&root)?.declare_into(graph)
        })
    }

    /// Build the targets declared by `declare`
    pub fn build_with<F>(&mut self, options: &TaskOptions, declare: F) -> BuildResult<TaskOutcome>
    where
        F: FnOnce(&mut ProjectGraph) -> BuildResult<()>,
    {
        self.machine.reset();
        let start = Instant::now();

        let config = match self.configuration(&options.build_type) {
            Ok(config) => config,
            Err(e) => return Err(self.machine.fail(e)),
        };

        if options.clean {
            self.machine.enter(RunnerState::Cleaning);
            if let Err(e) = self.remove_outputs(&config) {
                return Err(self.machine.fail(e));
            }
        }

        self.machine.enter(RunnerState::Declaring);
        let graph = match ProjectGraph::declare(declare) {
            Ok(graph) => graph,
            Err(e) => return Err(self.machine.fail(e)),
        };
        log::info!(
            "declared {} target(s), {} package(s)",
            graph.len(),
            graph.packages().len()
        );

        let discovered: CommandToolchain;
        let toolchain: &dyn Toolchain = match &self.toolchain {
            Some(toolchain) => toolchain.as_ref(),
            None => {
                discovered = match self.command_toolchain(&config, options.reconfigure) {
                    Ok(toolchain) => toolchain,
                    Err(e) => return Err(self.machine.fail(e)),
                };
                &discovered
            }
        };

        self.machine.enter(RunnerState::Compiling);
        let driver = CompilerDriver::new(toolchain, self.fs.as_ref(), &self.project_root);
        let reporter = Reporter::new();
        for target in graph.targets() {
            reporter.record(driver.compile(target, &config));
        }

        self.machine.enter(RunnerState::Reporting);
        let report = reporter.summarize().with_packages(graph.packages());
        log::info!(
            "{} build finished in {:.2}s: {} succeeded, {} failed",
            config.build_type,
            start.elapsed().as_secs_f64(),
            report.succeeded(),
            report.failed()
        );

        self.machine.enter(RunnerState::Done);
        Ok(TaskOutcome::Built(report))
    }

    /// Remove the outputs of one build type
    pub fn clean(&mut self, options: &TaskOptions) -> BuildResult<TaskOutcome> {
        self.machine.reset();

        let config = match self.configuration(&options.build_type) {
            Ok(config) => config,
            Err(e) => return Err(self.machine.fail(e)),
        };

        self.machine.enter(RunnerState::Cleaning);
        let removed = match self.remove_outputs(&config) {
            Ok(removed) => removed,
            Err(e) => return Err(self.machine.fail(e)),
        };

        self.machine.enter(RunnerState::Done);
        Ok(TaskOutcome::Cleaned(removed))
    }

    fn configuration(&self, build_type: &str) -> BuildResult<Configuration> {
        let mut config = resolve_configuration(build_type, &self.output_prefix)?;
        config.merge_with_global(&self.global);
        Ok(config)
    }

    /// Remove the output root and intermediate folder, skipping missing ones
    fn remove_outputs(&self, config: &Configuration) -> BuildResult<Vec<PathBuf>> {
        let mut removed = Vec::new();
        for dir in [&config.output_root, &config.intermediate_root] {
            if !self.fs.exists(dir) {
                log::debug!("nothing to remove at {}", dir.display());
                continue;
            }
            self.fs
                .remove_tree(dir)
                .map_err(|error| BuildError::CleanFailed {
                    path: dir.clone(),
                    error,
                })?;
            log::info!("removed {}", dir.display());
            removed.push(dir.clone());
        }
        Ok(removed)
    }

    /// Resolve the compiler program through the cached environment
    ///
    /// An explicitly configured program always wins. Otherwise the cached
    /// `CC` is reused unless `reconfigure` is set, and PATH is probed as a
    /// last resort. The result is written back to the store.
    fn command_toolchain(
        &self,
        config: &Configuration,
        reconfigure: bool,
    ) -> BuildResult<CommandToolchain> {
        let mut env = Environment::load(self.env_store.as_ref())?;

        let program = match self.global.toolchain_program() {
            Some(program) => PathBuf::from(program),
            None => {
                let cached = env.get(CC_KEY).filter(|_| !reconfigure).map(PathBuf::from);
                match cached {
                    Some(program) => program,
                    None => discover_program().ok_or(BuildError::ToolchainNotFound)?,
                }
            }
        };
        log::debug!("using toolchain {}", program.display());

        env.set(CC_KEY, program.to_string_lossy());
        env.save(self.env_store.as_ref())?;

        Ok(CommandToolchain::new(program)
            .merge_with_global(&self.global)
            .with_working_dir(&self.project_root)
            .with_env("HPIPE_BUILD_TYPE", config.build_type.name()))
    }
}
