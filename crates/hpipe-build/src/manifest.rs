//! Build manifest (hbuild.toml)
//!
//! Declares the project graph in TOML. Entries are replayed through
//! [`ProjectGraph`] in document order, so every declaration rule applies to
//! manifests too: a `[[package]]` may only name targets declared above it.

use crate::error::{BuildError, BuildResult};
use crate::graph::ProjectGraph;
use crate::targets::{Target, TargetKind};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use toml::Spanned;

/// Manifest file name looked up in the project root
pub const MANIFEST_FILE: &str = "hbuild.toml";

/// Parsed hbuild.toml
#[derive(Debug, Clone, PartialEq)]
pub struct BuildManifest {
    /// Project metadata
    pub project: Option<ProjectSection>,
    /// Targets and packages, in document order
    pub entries: Vec<ManifestEntry>,
}

/// One `[[target]]` or `[[package]]` table
#[derive(Debug, Clone, PartialEq)]
pub enum ManifestEntry {
    Target(TargetEntry),
    Package(PackageEntry),
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ProjectSection {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct TargetEntry {
    pub name: String,
    #[serde(default = "default_kind")]
    pub kind: TargetKind,
    pub sources: Vec<PathBuf>,
    #[serde(default)]
    pub include_paths: Vec<PathBuf>,
}

fn default_kind() -> TargetKind {
    TargetKind::Executable
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PackageEntry {
    pub name: String,
    pub targets: Vec<String>,
}

/// On-disk layout; serde groups each array of tables under its own key
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawManifest {
    #[serde(default)]
    project: Option<ProjectSection>,
    #[serde(default, rename = "target")]
    targets: Vec<Spanned<TargetEntry>>,
    #[serde(default, rename = "package")]
    packages: Vec<Spanned<PackageEntry>>,
}

impl From<RawManifest> for BuildManifest {
    fn from(raw: RawManifest) -> Self {
        let mut positioned: Vec<(usize, ManifestEntry)> = raw
            .targets
            .into_iter()
            .map(|t| (t.span().start, ManifestEntry::Target(t.into_inner())))
            .chain(
                raw.packages
                    .into_iter()
                    .map(|p| (p.span().start, ManifestEntry::Package(p.into_inner()))),
            )
            .collect();
        positioned.sort_by_key(|(start, _)| *start);

        Self {
            project: raw.project,
            entries: positioned.into_iter().map(|(_, entry)| entry).collect(),
        }
    }
}

impl BuildManifest {
    /// Load the manifest from a project directory
    pub fn load(project_root: &Path) -> BuildResult<Self> {
        Self::load_from_file(&project_root.join(MANIFEST_FILE))
    }

    /// Load the manifest from an explicit file
    pub fn load_from_file(path: &Path) -> BuildResult<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|e| BuildError::manifest_read(path, e))?;
        Self::parse(&content, path)
    }

    /// Parse manifest text; `path` is only used for error messages
    pub fn parse(content: &str, path: &Path) -> BuildResult<Self> {
        toml::from_str::<RawManifest>(content)
            .map(Self::from)
            .map_err(|e| BuildError::manifest_parse(path, e))
    }

    /// Project name, if the manifest declares one
    pub fn project_name(&self) -> Option<&str> {
        self.project.as_ref().map(|p| p.name.as_str())
    }

    /// Target entries, in document order
    pub fn targets(&self) -> impl Iterator<Item = &TargetEntry> {
        self.entries.iter().filter_map(|entry| match entry {
            ManifestEntry::Target(target) => Some(target),
            ManifestEntry::Package(_) => None,
        })
    }

    /// Package entries, in document order
    pub fn packages(&self) -> impl Iterator<Item = &PackageEntry> {
        self.entries.iter().filter_map(|entry| match entry {
            ManifestEntry::Package(package) => Some(package),
            ManifestEntry::Target(_) => None,
        })
    }

    /// Replay all declarations into `graph`, stopping at the first error
    pub fn declare_into(&self, graph: &mut ProjectGraph) -> BuildResult<()> {
        for entry in &self.entries {
            match entry {
                ManifestEntry::Target(target) => {
                    let declared = Target::new(&target.name, target.kind, target.sources.clone())
                        .with_include_paths(target.include_paths.clone());
                    graph.add_target(declared)?;
                }
                ManifestEntry::Package(package) => {
                    graph.declare_package(&package.name, package.targets.iter().cloned())?;
                }
            }
        }
        Ok(())
    }

    /// Build a fresh graph from this manifest
    pub fn to_graph(&self) -> BuildResult<ProjectGraph> {
        ProjectGraph::declare(|graph| self.declare_into(graph))
    }
}
