//! Persisted toolchain environment
//!
//! A flat string table that survives between invocations so discovered
//! toolchain locations do not have to be probed on every build.

use crate::{ConfigError, ConfigResult};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Cached environment values, ordered by key so the saved file is stable
pub type EnvMap = BTreeMap<String, String>;

/// Key/value persistence for cached discovery results
pub trait EnvStore {
    /// Load every stored value. A store that was never saved is empty.
    fn load_env(&self) -> ConfigResult<EnvMap>;

    /// Replace the stored values
    fn save_env(&self, env: &EnvMap) -> ConfigResult<()>;
}

/// Environment store backed by a TOML file
#[derive(Debug, Clone)]
pub struct TomlEnvStore {
    path: PathBuf,
}

impl TomlEnvStore {
    /// Conventional file name inside the output prefix
    pub const FILE_NAME: &'static str = ".hpipe-env.toml";

    /// Create a store at an explicit path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Create a store inside an output directory
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(dir.as_ref().join(Self::FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl EnvStore for TomlEnvStore {
    fn load_env(&self) -> ConfigResult<EnvMap> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("no cached environment at {}", self.path.display());
                return Ok(EnvMap::new());
            }
            Err(e) => return Err(ConfigError::IoError(e)),
        };

        toml::from_str(&content).map_err(|e| ConfigError::TomlParseError {
            file: self.path.clone(),
            error: e,
        })
    }

    fn save_env(&self, env: &EnvMap) -> ConfigResult<()> {
        let content = toml::to_string(env).map_err(|e| ConfigError::TomlSerializeError {
            file: self.path.clone(),
            error: e,
        })?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, content)?;
        log::debug!("saved {} cached values to {}", env.len(), self.path.display());
        Ok(())
    }
}
