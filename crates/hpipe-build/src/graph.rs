//! Project graph declaration
//!
//! The graph is flat: packages reference targets by name and targets
//! reference nothing, so no cycles are possible. Both collections keep
//! declaration order, which drives compilation and report order.

use crate::error::{BuildError, BuildResult};
use crate::targets::{Package, Target, TargetKind};
use std::collections::HashMap;
use std::path::PathBuf;

/// All targets and packages declared for one build invocation
#[derive(Debug, Default, Clone)]
pub struct ProjectGraph {
    targets: Vec<Target>,
    target_index: HashMap<String, usize>,
    packages: Vec<Package>,
    package_index: HashMap<String, usize>,
}

impl ProjectGraph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Run a declaration pass against a fresh graph and return it
    pub fn declare<F>(declaration: F) -> BuildResult<Self>
    where
        F: FnOnce(&mut ProjectGraph) -> BuildResult<()>,
    {
        let mut graph = Self::new();
        declaration(&mut graph)?;
        log::debug!(
            "declared {} targets and {} packages",
            graph.targets.len(),
            graph.packages.len()
        );
        Ok(graph)
    }

    /// Declare a target from its parts
    pub fn declare_target(
        &mut self,
        name: impl Into<String>,
        kind: TargetKind,
        sources: Vec<PathBuf>,
    ) -> BuildResult<&Target> {
        self.add_target(Target::new(name, kind, sources))
    }

    /// Declare a fully built target
    pub fn add_target(&mut self, target: Target) -> BuildResult<&Target> {
        if self.target_index.contains_key(&target.name) {
            return Err(BuildError::duplicate("target", target.name));
        }
        if target.sources.is_empty() {
            return Err(BuildError::EmptySourceList {
                target: target.name,
            });
        }

        let index = self.targets.len();
        self.target_index.insert(target.name.clone(), index);
        self.targets.push(target);
        Ok(&self.targets[index])
    }

    /// Declare a package over targets declared earlier in this pass
    pub fn declare_package<I, S>(
        &mut self,
        name: impl Into<String>,
        targets: I,
    ) -> BuildResult<&Package>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let name = name.into();
        if self.package_index.contains_key(&name) {
            return Err(BuildError::duplicate("package", name));
        }

        let targets: Vec<String> = targets.into_iter().map(Into::into).collect();
        if targets.is_empty() {
            return Err(BuildError::EmptyPackage { package: name });
        }
        if let Some(missing) = targets.iter().find(|t| !self.target_index.contains_key(*t)) {
            return Err(BuildError::unknown_target(name, missing.clone()));
        }

        let index = self.packages.len();
        self.package_index.insert(name.clone(), index);
        self.packages.push(Package::new(name, targets));
        Ok(&self.packages[index])
    }

    /// Targets in declaration order
    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    /// Packages in declaration order
    pub fn packages(&self) -> &[Package] {
        &self.packages
    }

    /// Look up a target by name
    pub fn target(&self, name: &str) -> Option<&Target> {
        self.target_index.get(name).map(|&i| &self.targets[i])
    }

    /// Look up a package by name
    pub fn package(&self, name: &str) -> Option<&Package> {
        self.package_index.get(name).map(|&i| &self.packages[i])
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}
