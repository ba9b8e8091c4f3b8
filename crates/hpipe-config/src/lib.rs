//! hpipe configuration system
//!
//! Provides the configuration layers consumed by the build orchestrator:
//! - Global user configuration (~/.hpipe/config.toml)
//! - Environment variable overrides (HPIPE_*)
//! - A persisted key/value store for cached toolchain discovery
//!
//! # Configuration Hierarchy
//!
//! Configuration is loaded and merged in the following order (later overrides earlier):
//! 1. Built-in defaults
//! 2. Global config (~/.hpipe/config.toml)
//! 3. Environment variables (HPIPE_*)
//! 4. CLI flags (handled by the caller)
//!
//! # Example
//!
//! ```no_run
//! use hpipe_config::ConfigLoader;
//!
//! let mut loader = ConfigLoader::new();
//! let config = loader.load().unwrap();
//! println!("{:?}", config.default_build_type());
//! ```

pub mod env_store;
pub mod global;
pub mod loader;

use std::path::PathBuf;
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid TOML syntax in {file}: {error}")]
    TomlParseError {
        file: PathBuf,
        error: toml::de::Error,
    },

    #[error("Failed to serialize {file}: {error}")]
    TomlSerializeError {
        file: PathBuf,
        error: toml::ser::Error,
    },

    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Home directory not found")]
    HomeNotFound,
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

// Re-export main types
pub use env_store::{EnvMap, EnvStore, TomlEnvStore};
pub use global::GlobalConfig;
pub use loader::ConfigLoader;
