//! Global Configuration (~/.hpipe/config.toml)
//!
//! Handles user-level configuration: default build type, output prefix,
//! toolchain program and per-build-type flag overrides.

use crate::{ConfigError, ConfigResult};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Global user configuration from ~/.hpipe/config.toml
#[derive(Debug, Clone, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct GlobalConfig {
    /// Default settings
    pub defaults: Option<DefaultsConfig>,

    /// Toolchain invocation settings
    pub toolchain: Option<ToolchainConfig>,

    /// Flag overrides per build type
    pub flags: Option<FlagsConfig>,
}

/// Default settings
#[derive(Debug, Clone, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct DefaultsConfig {
    /// Build type used when none is given ("Debug" or "Release")
    pub build_type: Option<String>,

    /// Output prefix, relative paths are resolved against the project root
    pub output_dir: Option<PathBuf>,
}

/// Toolchain invocation settings
#[derive(Debug, Clone, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct ToolchainConfig {
    /// Compiler driver program (name on PATH or absolute path)
    pub program: Option<String>,

    /// Flag preceding the artifact path (default: "-o")
    pub output_flag: Option<String>,

    /// Flag prefixed to each include directory (default: "-I")
    pub include_flag: Option<String>,

    /// Flag that compiles without linking (default: "-c")
    pub compile_flag: Option<String>,

    /// Extra flags for shared libraries (default: ["-shared", "-fPIC"])
    pub shared_flags: Option<Vec<String>>,

    /// Static library archiver (default: "ar")
    pub archiver: Option<String>,

    /// Archiver flags preceding the archive path (default: ["rcs"])
    pub archive_flags: Option<Vec<String>>,
}

/// Flag overrides per build type
#[derive(Debug, Clone, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct FlagsConfig {
    pub debug: Option<Vec<String>>,

    pub release: Option<Vec<String>>,
}

impl GlobalConfig {
    /// Load global configuration from a file
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound(path.to_path_buf())
            } else {
                ConfigError::IoError(e)
            }
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::TomlParseError {
            file: path.to_path_buf(),
            error: e,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the global configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if let Some(build_type) = self.default_build_type() {
            if !is_valid_build_type(build_type) {
                return Err(ConfigError::InvalidValue {
                    field: "defaults.build_type".to_string(),
                    reason: format!("must be 'Debug' or 'Release', got '{}'", build_type),
                });
            }
        }

        if let Some(toolchain) = &self.toolchain {
            if let Some(program) = &toolchain.program {
                if program.trim().is_empty() {
                    return Err(ConfigError::InvalidValue {
                        field: "toolchain.program".to_string(),
                        reason: "must not be empty".to_string(),
                    });
                }
            }
            let required = [
                ("toolchain.output_flag", &toolchain.output_flag),
                ("toolchain.compile_flag", &toolchain.compile_flag),
                ("toolchain.archiver", &toolchain.archiver),
            ];
            for (field, value) in required {
                if value.as_deref().is_some_and(|v| v.trim().is_empty()) {
                    return Err(ConfigError::InvalidValue {
                        field: field.to_string(),
                        reason: "must not be empty".to_string(),
                    });
                }
            }
        }

        Ok(())
    }

    /// Get the global config file path (~/.hpipe/config.toml)
    pub fn global_config_path() -> ConfigResult<PathBuf> {
        let home = dirs::home_dir().ok_or(ConfigError::HomeNotFound)?;
        Ok(home.join(".hpipe").join("config.toml"))
    }

    /// Get the default build type
    pub fn default_build_type(&self) -> Option<&str> {
        self.defaults.as_ref().and_then(|d| d.build_type.as_deref())
    }

    /// Get the configured output prefix
    pub fn output_dir(&self) -> Option<&Path> {
        self.defaults.as_ref().and_then(|d| d.output_dir.as_deref())
    }

    /// Get the configured toolchain program
    pub fn toolchain_program(&self) -> Option<&str> {
        self.toolchain.as_ref().and_then(|t| t.program.as_deref())
    }

    /// Get the flag override for a build type directory name ("debug" / "release")
    pub fn flags_for(&self, build_type: &str) -> Option<&[String]> {
        let flags = self.flags.as_ref()?;
        match build_type.to_lowercase().as_str() {
            "debug" => flags.debug.as_deref(),
            "release" => flags.release.as_deref(),
            _ => None,
        }
    }
}

/// Check if a build type name is recognized
fn is_valid_build_type(build_type: &str) -> bool {
    matches!(build_type.to_lowercase().as_str(), "debug" | "release")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_global_config() {
        let toml = r#"
[defaults]
build_type = "Release"
"#;

        let config: GlobalConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.default_build_type(), Some("Release"));
        assert!(config.toolchain_program().is_none());
    }

    #[test]
    fn test_parse_full_global_config() {
        let toml = r#"
[defaults]
build_type = "debug"
output_dir = "out"

[toolchain]
program = "clang"
output_flag = "-o"
include_flag = "-I"
archiver = "llvm-ar"
shared_flags = ["-shared"]

[flags]
debug = ["-O0", "-g3"]
release = ["-O3"]
"#;

        let config: GlobalConfig = toml::from_str(toml).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.toolchain_program(), Some("clang"));
        let toolchain = config.toolchain.as_ref().unwrap();
        assert_eq!(toolchain.archiver.as_deref(), Some("llvm-ar"));
        assert_eq!(toolchain.shared_flags, Some(vec!["-shared".to_string()]));
        assert_eq!(config.output_dir(), Some(Path::new("out")));
        assert_eq!(
            config.flags_for("Debug"),
            Some(&["-O0".to_string(), "-g3".to_string()][..])
        );
        assert_eq!(config.flags_for("release"), Some(&["-O3".to_string()][..]));
    }

    #[test]
    fn test_invalid_build_type() {
        let config = GlobalConfig {
            defaults: Some(DefaultsConfig {
                build_type: Some("Profile".to_string()),
                output_dir: None,
            }),
            ..Default::default()
        };

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_archiver_rejected() {
        let config: GlobalConfig = toml::from_str("[toolchain]\narchiver = \" \"\n").unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("toolchain.archiver"));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let toml = r#"
[defaults]
jobs = 4
"#;
        assert!(toml::from_str::<GlobalConfig>(toml).is_err());
    }
}
