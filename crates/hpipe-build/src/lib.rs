//! hpipe build orchestration
//!
//! A small build orchestrator for C/C++ projects:
//! - Targets and packages declared into an explicit project graph
//! - Debug / Release configurations with opaque toolchain flags
//! - A compiler driver that turns each target into one toolchain call
//! - Per-target outcomes collected into a report, failures included
//! - `build` and `clean` tasks sequenced by a task runner
//!
//! # Example
//!
//! ```no_run
//! use hpipe_build::{TaskOptions, TaskRegistry, TaskRunner};
//!
//! let registry = TaskRegistry::with_defaults();
//! let mut runner = TaskRunner::new(".");
//! let outcome = registry
//!     .run("build", &mut runner, &TaskOptions::new("Release"))
//!     .unwrap();
//! std::process::exit(outcome.exit_code().into());
//! ```

pub mod driver;
pub mod env;
pub mod error;
pub mod fs;
pub mod graph;
pub mod manifest;
pub mod profile;
pub mod report;
pub mod runner;
pub mod targets;
pub mod toolchain;

// Re-export main types
pub use driver::CompilerDriver;
pub use env::Environment;
pub use error::{BuildError, BuildResult};
pub use fs::{FileSystem, LocalFileSystem};
pub use graph::ProjectGraph;
pub use manifest::{BuildManifest, ManifestEntry, MANIFEST_FILE};
pub use profile::{resolve_configuration, BuildType, Configuration};
pub use report::{render, Outcome, OutcomeStatus, PackageOutcome, Report, Reporter};
pub use runner::{
    RunnerState, Task, TaskHandler, TaskOptions, TaskOutcome, TaskRegistry, TaskRunner,
};
pub use targets::{Package, Target, TargetKind};
pub use toolchain::{CommandStep, CommandToolchain, Invocation, Toolchain, ToolchainOutput};
