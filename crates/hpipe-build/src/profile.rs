//! Build-type configuration
//!
//! Resolves a build type name (Debug, Release) into the configuration shared
//! by every compiler driver call of one invocation: optimization and
//! debug-symbol policy, output locations and the opaque toolchain flag set.

use crate::error::{BuildError, BuildResult};
use crate::targets::Target;
use hpipe_config::GlobalConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Build type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BuildType {
    /// Unoptimized, debug symbols enabled (default)
    #[default]
    Debug,
    /// Optimized, debug symbols stripped
    Release,
}

impl BuildType {
    /// Get build type name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Debug => "Debug",
            Self::Release => "Release",
        }
    }

    /// Output subdirectory for this build type
    pub fn dir_name(&self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Release => "release",
        }
    }

    pub fn optimize(&self) -> bool {
        matches!(self, Self::Release)
    }

    pub fn debug_symbols(&self) -> bool {
        matches!(self, Self::Debug)
    }

    /// Default toolchain flags for this build type
    pub fn default_flags(&self) -> Vec<String> {
        let flags: &[&str] = match self {
            Self::Debug => &["-O0", "-g"],
            Self::Release => &["-O2", "-DNDEBUG", "-s"],
        };
        flags.iter().map(|f| f.to_string()).collect()
    }
}

impl FromStr for BuildType {
    type Err = BuildError;

    fn from_str(s: &str) -> BuildResult<Self> {
        match s.to_lowercase().as_str() {
            "debug" => Ok(Self::Debug),
            "release" => Ok(Self::Release),
            _ => Err(BuildError::UnknownBuildType(s.to_string())),
        }
    }
}

impl std::fmt::Display for BuildType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Resolved configuration for one build invocation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Configuration {
    /// Selected build type
    pub build_type: BuildType,
    /// Directory receiving artifacts (`<prefix>/<debug|release>`)
    pub output_root: PathBuf,
    /// Directory receiving intermediate objects (`<prefix>/obj/<debug|release>`)
    pub intermediate_root: PathBuf,
    /// Enable optimization
    pub optimize: bool,
    /// Emit debug symbols
    pub debug_symbols: bool,
    /// Toolchain flags, passed through verbatim
    pub flags: Vec<String>,
}

impl Configuration {
    /// Create the default configuration for a build type under `prefix`
    pub fn new(build_type: BuildType, prefix: impl AsRef<Path>) -> Self {
        let prefix = prefix.as_ref();
        Self {
            build_type,
            output_root: prefix.join(build_type.dir_name()),
            intermediate_root: prefix.join("obj").join(build_type.dir_name()),
            optimize: build_type.optimize(),
            debug_symbols: build_type.debug_symbols(),
            flags: build_type.default_flags(),
        }
    }

    /// Replace the flag set
    pub fn with_flags(mut self, flags: Vec<String>) -> Self {
        self.flags = flags;
        self
    }

    /// Apply flag overrides from the global configuration
    pub fn merge_with_global(&mut self, global: &GlobalConfig) {
        if let Some(flags) = global.flags_for(self.build_type.dir_name()) {
            self.flags = flags.to_vec();
        }
    }

    /// Path of the artifact produced for `target`
    pub fn artifact_path(&self, target: &Target) -> PathBuf {
        self.output_root.join(target.artifact_filename())
    }
}

/// Resolve a build type name into a configuration rooted at `prefix`
pub fn resolve_configuration(name: &str, prefix: impl AsRef<Path>) -> BuildResult<Configuration> {
    let build_type = BuildType::from_str(name)?;
    Ok(Configuration::new(build_type, prefix))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::targets::TargetKind;
    use hpipe_config::global::FlagsConfig;

    #[test]
    fn test_build_type_from_str() {
        assert_eq!(BuildType::from_str("Debug").unwrap(), BuildType::Debug);
        assert_eq!(BuildType::from_str("debug").unwrap(), BuildType::Debug);
        assert_eq!(BuildType::from_str("RELEASE").unwrap(), BuildType::Release);
        assert!(matches!(
            BuildType::from_str("RelWithDebInfo"),
            Err(BuildError::UnknownBuildType(_))
        ));
    }

    #[test]
    fn test_build_type_default_is_debug() {
        assert_eq!(BuildType::default(), BuildType::Debug);
    }

    #[test]
    fn test_debug_configuration() {
        let config = resolve_configuration("Debug", "/work/build").unwrap();
        assert_eq!(config.build_type, BuildType::Debug);
        assert_eq!(config.output_root, PathBuf::from("/work/build/debug"));
        assert_eq!(config.intermediate_root, PathBuf::from("/work/build/obj/debug"));
        assert!(!config.optimize);
        assert!(config.debug_symbols);
        assert!(config.flags.contains(&"-g".to_string()));
    }

    #[test]
    fn test_release_configuration() {
        let config = resolve_configuration("Release", "/work/build").unwrap();
        assert_eq!(config.output_root, PathBuf::from("/work/build/release"));
        assert!(config.optimize);
        assert!(!config.debug_symbols);
        assert!(!config.flags.contains(&"-g".to_string()));
    }

    #[test]
    fn test_global_flags_override() {
        let global = GlobalConfig {
            flags: Some(FlagsConfig {
                debug: None,
                release: Some(vec!["-O3".to_string()]),
            }),
            ..Default::default()
        };

        let mut debug = Configuration::new(BuildType::Debug, "build");
        debug.merge_with_global(&global);
        assert_eq!(debug.flags, BuildType::Debug.default_flags());

        let mut release = Configuration::new(BuildType::Release, "build");
        release.merge_with_global(&global);
        assert_eq!(release.flags, vec!["-O3".to_string()]);
    }

    #[test]
    fn test_artifact_path() {
        let config = Configuration::new(BuildType::Debug, "build");
        let target = Target::new(
            "softrast",
            TargetKind::Executable,
            vec![PathBuf::from("softrast.cpp")],
        );
        assert_eq!(
            config.artifact_path(&target),
            PathBuf::from("build")
                .join("debug")
                .join(format!("softrast{}", std::env::consts::EXE_SUFFIX))
        );
    }
}
