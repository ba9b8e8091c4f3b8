//! Configuration Loader
//!
//! Handles loading the global configuration and applying environment overrides.

use crate::global::{DefaultsConfig, GlobalConfig, ToolchainConfig};
use crate::{ConfigError, ConfigResult};
use std::env;
use std::path::PathBuf;

/// Configuration loader
///
/// Loads configuration from multiple sources and merges them with proper precedence:
/// 1. Global config (~/.hpipe/config.toml) - lowest priority
/// 2. Environment variables (HPIPE_*) - overrides global
/// 3. CLI flags - highest priority (handled by caller)
pub struct ConfigLoader {
    /// Cached global config path
    global_config_path: Option<PathBuf>,
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new() -> Self {
        Self {
            global_config_path: None,
        }
    }

    /// Use an explicit global config path instead of ~/.hpipe/config.toml
    pub fn with_global_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.global_config_path = Some(path.into());
        self
    }

    /// Load the merged configuration
    pub fn load(&mut self) -> ConfigResult<GlobalConfig> {
        let config = self.load_global_config()?;
        let config = self.apply_env_overrides(config)?;
        config.validate()?;
        Ok(config)
    }

    /// Load global configuration, missing file yields defaults
    fn load_global_config(&mut self) -> ConfigResult<GlobalConfig> {
        let path = match &self.global_config_path {
            Some(path) => path.clone(),
            None => match GlobalConfig::global_config_path() {
                Ok(path) => path,
                Err(ConfigError::HomeNotFound) => {
                    log::debug!("home directory not found, skipping global config");
                    return Ok(GlobalConfig::default());
                }
                Err(e) => return Err(e),
            },
        };
        self.global_config_path = Some(path.clone());

        if !path.exists() {
            return Ok(GlobalConfig::default());
        }

        log::debug!("loading global config from {}", path.display());
        GlobalConfig::load_from_file(&path)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&self, mut config: GlobalConfig) -> ConfigResult<GlobalConfig> {
        if let Ok(build_type) = env::var("HPIPE_BUILD_TYPE") {
            config
                .defaults
                .get_or_insert_with(DefaultsConfig::default)
                .build_type = Some(build_type);
        }

        if let Ok(output_dir) = env::var("HPIPE_OUTPUT_DIR") {
            config
                .defaults
                .get_or_insert_with(DefaultsConfig::default)
                .output_dir = Some(PathBuf::from(output_dir));
        }

        if let Ok(program) = env::var("HPIPE_CC") {
            config
                .toolchain
                .get_or_insert_with(ToolchainConfig::default)
                .program = Some(program);
        }

        Ok(config)
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn clear_env() {
        env::remove_var("HPIPE_BUILD_TYPE");
        env::remove_var("HPIPE_OUTPUT_DIR");
        env::remove_var("HPIPE_CC");
    }

    fn create_config_file(dir: &Path, content: &str) -> PathBuf {
        let config_path = dir.join("config.toml");
        fs::write(&config_path, content).unwrap();
        config_path
    }

    #[test]
    #[serial]
    fn test_missing_global_config_is_default() {
        clear_env();
        let temp_dir = TempDir::new().unwrap();

        let mut loader =
            ConfigLoader::new().with_global_config_path(temp_dir.path().join("config.toml"));
        let config = loader.load().unwrap();

        assert_eq!(config, GlobalConfig::default());
    }

    #[test]
    #[serial]
    fn test_load_global_config() {
        clear_env();
        let temp_dir = TempDir::new().unwrap();
        let path = create_config_file(
            temp_dir.path(),
            r#"
[toolchain]
program = "clang"
"#,
        );

        let mut loader = ConfigLoader::new().with_global_config_path(path);
        let config = loader.load().unwrap();

        assert_eq!(config.toolchain_program(), Some("clang"));
    }

    #[test]
    #[serial]
    fn test_env_override_toolchain() {
        clear_env();
        let temp_dir = TempDir::new().unwrap();
        let path = create_config_file(
            temp_dir.path(),
            r#"
[toolchain]
program = "clang"
"#,
        );

        env::set_var("HPIPE_CC", "gcc");

        let mut loader = ConfigLoader::new().with_global_config_path(path);
        let config = loader.load().unwrap();

        assert_eq!(config.toolchain_program(), Some("gcc"));

        env::remove_var("HPIPE_CC");
    }

    #[test]
    #[serial]
    fn test_env_override_build_type_and_output() {
        clear_env();
        let temp_dir = TempDir::new().unwrap();

        env::set_var("HPIPE_BUILD_TYPE", "Release");
        env::set_var("HPIPE_OUTPUT_DIR", "/tmp/hpipe-out");

        let mut loader =
            ConfigLoader::new().with_global_config_path(temp_dir.path().join("config.toml"));
        let config = loader.load().unwrap();

        assert_eq!(config.default_build_type(), Some("Release"));
        assert_eq!(config.output_dir(), Some(Path::new("/tmp/hpipe-out")));

        clear_env();
    }

    #[test]
    #[serial]
    fn test_invalid_env_build_type_rejected() {
        clear_env();
        let temp_dir = TempDir::new().unwrap();

        env::set_var("HPIPE_BUILD_TYPE", "Fastest");

        let mut loader =
            ConfigLoader::new().with_global_config_path(temp_dir.path().join("config.toml"));
        assert!(matches!(
            loader.load(),
            Err(ConfigError::InvalidValue { .. })
        ));

        clear_env();
    }
}
