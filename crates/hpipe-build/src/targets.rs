/// Target and package declarations
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Kind of compilable unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TargetKind {
    /// Executable program
    Executable,
    /// Static library archive
    StaticLibrary,
    /// Shared (dynamic) library
    SharedLibrary,
}

impl TargetKind {
    /// Platform file name of the artifact this kind produces for `name`
    pub fn artifact_filename(&self, name: &str) -> String {
        match self {
            Self::Executable => format!("{}{}", name, std::env::consts::EXE_SUFFIX),
            Self::StaticLibrary => {
                if cfg!(windows) {
                    format!("{}.lib", name)
                } else {
                    format!("lib{}.a", name)
                }
            }
            Self::SharedLibrary => format!(
                "{}{}{}",
                std::env::consts::DLL_PREFIX,
                name,
                std::env::consts::DLL_SUFFIX
            ),
        }
    }
}

impl std::fmt::Display for TargetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Executable => write!(f, "executable"),
            Self::StaticLibrary => write!(f, "static-library"),
            Self::SharedLibrary => write!(f, "shared-library"),
        }
    }
}

/// A single compilable unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Target {
    /// Target name, unique within a project graph
    pub name: String,
    /// Target kind
    pub kind: TargetKind,
    /// Source files (relative to project root)
    pub sources: Vec<PathBuf>,
    /// Include/search directories (relative to project root)
    #[serde(default)]
    pub include_paths: Vec<PathBuf>,
}

impl Target {
    /// Create a new target
    pub fn new(name: impl Into<String>, kind: TargetKind, sources: Vec<PathBuf>) -> Self {
        Self {
            name: name.into(),
            kind,
            sources,
            include_paths: Vec::new(),
        }
    }

    /// Set include paths
    pub fn with_include_paths(mut self, include_paths: Vec<PathBuf>) -> Self {
        self.include_paths = include_paths;
        self
    }

    /// Get the artifact file name for this target
    pub fn artifact_filename(&self) -> String {
        self.kind.artifact_filename(&self.name)
    }
}

/// A named aggregation of previously declared targets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Package {
    /// Package name, unique within a project graph
    pub name: String,
    /// Member target names, in declaration order
    pub targets: Vec<String>,
}

impl Package {
    pub fn new(name: impl Into<String>, targets: Vec<String>) -> Self {
        Self {
            name: name.into(),
            targets,
        }
    }

    /// Check whether a target is a member of this package
    pub fn contains(&self, target: &str) -> bool {
        self.targets.iter().any(|t| t == target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_kind_display_format() {
        assert_eq!(TargetKind::Executable.to_string(), "executable");
        assert_eq!(TargetKind::StaticLibrary.to_string(), "static-library");
        assert_eq!(TargetKind::SharedLibrary.to_string(), "shared-library");
    }

    #[test]
    #[cfg(unix)]
    fn test_artifact_filenames_unix() {
        assert_eq!(TargetKind::Executable.artifact_filename("softrast"), "softrast");
        assert_eq!(TargetKind::StaticLibrary.artifact_filename("core"), "libcore.a");
        assert!(TargetKind::SharedLibrary
            .artifact_filename("core")
            .starts_with("libcore."));
    }

    #[test]
    #[cfg(windows)]
    fn test_artifact_filenames_windows() {
        assert_eq!(TargetKind::Executable.artifact_filename("softrast"), "softrast.exe");
        assert_eq!(TargetKind::StaticLibrary.artifact_filename("core"), "core.lib");
        assert_eq!(TargetKind::SharedLibrary.artifact_filename("core"), "core.dll");
    }

    #[test]
    fn test_target_creation() {
        let target = Target::new(
            "softrast",
            TargetKind::Executable,
            vec![PathBuf::from("softrast.cpp")],
        )
        .with_include_paths(vec![PathBuf::from("include")]);

        assert_eq!(target.name, "softrast");
        assert_eq!(target.kind, TargetKind::Executable);
        assert_eq!(target.sources.len(), 1);
        assert_eq!(target.include_paths, vec![PathBuf::from("include")]);
    }

    #[test]
    fn test_kind_deserializes_kebab_case() {
        let kind: TargetKind = serde_json::from_str("\"static-library\"").unwrap();
        assert_eq!(kind, TargetKind::StaticLibrary);
    }

    #[test]
    fn test_package_membership() {
        let package = Package::new("sofrast", vec!["softrast".to_string()]);
        assert!(package.contains("softrast"));
        assert!(!package.contains("sofrast"));
    }
}
