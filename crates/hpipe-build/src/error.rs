/// Build system error types
use std::path::PathBuf;
use thiserror::Error;

pub type BuildResult<T> = Result<T, BuildError>;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Duplicate {kind} name: '{name}'")]
    DuplicateName { kind: &'static str, name: String },

    #[error("Target '{target}' has no source files")]
    EmptySourceList { target: String },

    #[error("Package '{package}' references unknown target '{target}'")]
    UnknownTarget { package: String, target: String },

    #[error("Package '{package}' has no member targets")]
    EmptyPackage { package: String },

    #[error("Unknown build type '{0}': expected Debug or Release")]
    UnknownBuildType(String),

    #[error("Unknown task '{0}'")]
    UnknownTask(String),

    #[error("Failed to read manifest at {path}: {error}")]
    ManifestRead { path: PathBuf, error: String },

    #[error("Invalid manifest {path}: {error}")]
    ManifestParse { path: PathBuf, error: String },

    #[error("Compilation failed for target '{target}' (exit code {exit_code})")]
    CompilationFailed {
        target: String,
        exit_code: i32,
        output: String,
    },

    #[error("Artifact {path} is held open by another process")]
    ResourceBusy { path: PathBuf },

    #[error("Failed to launch toolchain '{program}': {error}")]
    ToolchainLaunch {
        program: PathBuf,
        error: std::io::Error,
    },

    #[error("No C/C++ toolchain found: set HPIPE_CC or [toolchain] program in ~/.hpipe/config.toml")]
    ToolchainNotFound,

    #[error("Failed to remove {path}: {error}")]
    CleanFailed {
        path: PathBuf,
        error: std::io::Error,
    },

    #[error("I/O error at {path}: {error}")]
    IoError {
        path: PathBuf,
        error: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    Config(#[from] hpipe_config::ConfigError),
}

impl BuildError {
    /// Create a duplicate name error
    pub fn duplicate(kind: &'static str, name: impl Into<String>) -> Self {
        Self::DuplicateName {
            kind,
            name: name.into(),
        }
    }

    /// Create an unknown target error
    pub fn unknown_target(package: impl Into<String>, target: impl Into<String>) -> Self {
        Self::UnknownTarget {
            package: package.into(),
            target: target.into(),
        }
    }

    /// Create a manifest read error
    pub fn manifest_read(path: impl Into<PathBuf>, error: impl ToString) -> Self {
        Self::ManifestRead {
            path: path.into(),
            error: error.to_string(),
        }
    }

    /// Create a manifest parse error
    pub fn manifest_parse(path: impl Into<PathBuf>, error: impl ToString) -> Self {
        Self::ManifestParse {
            path: path.into(),
            error: error.to_string(),
        }
    }

    /// Create an I/O error with path context
    pub fn io(path: impl Into<PathBuf>, error: std::io::Error) -> Self {
        Self::IoError {
            path: path.into(),
            error,
        }
    }

    /// Declaration and configuration errors abort the whole invocation
    /// before any target is compiled.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::DuplicateName { .. }
                | Self::EmptySourceList { .. }
                | Self::UnknownTarget { .. }
                | Self::EmptyPackage { .. }
                | Self::UnknownBuildType(_)
                | Self::UnknownTask(_)
                | Self::ManifestRead { .. }
                | Self::ManifestParse { .. }
        )
    }
}
