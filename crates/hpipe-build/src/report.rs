//! Compilation outcomes and the build report
//!
//! Every attempted target yields exactly one [`Outcome`]. The [`Reporter`]
//! collects them in order, [`Reporter::summarize`] folds them into a
//! [`Report`], and packages are reduced from their members' outcomes.

use crate::error::BuildError;
use crate::targets::Package;
use serde::Serialize;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

/// Status of a target or package
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeStatus {
    Succeeded,
    Failed,
}

impl OutcomeStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded)
    }
}

impl std::fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Succeeded => write!(f, "succeeded"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Result of compiling one target
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Outcome {
    target: String,
    status: OutcomeStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    artifact: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    diagnostics: Option<String>,
    #[serde(serialize_with = "serde_secs::serialize")]
    elapsed: Duration,
}

impl Outcome {
    /// A target that produced `artifact`
    pub fn succeeded(target: impl Into<String>, artifact: PathBuf, elapsed: Duration) -> Self {
        Self {
            target: target.into(),
            status: OutcomeStatus::Succeeded,
            artifact: Some(artifact),
            diagnostics: None,
            elapsed,
        }
    }

    /// A target that failed with `diagnostics`
    pub fn failed(
        target: impl Into<String>,
        diagnostics: impl Into<String>,
        elapsed: Duration,
    ) -> Self {
        Self {
            target: target.into(),
            status: OutcomeStatus::Failed,
            artifact: None,
            diagnostics: Some(diagnostics.into()),
            elapsed,
        }
    }

    /// A failed target; compiler failures keep the captured output verbatim
    pub fn from_error(target: impl Into<String>, error: &BuildError, elapsed: Duration) -> Self {
        match error {
            BuildError::CompilationFailed { output, .. } => Self::failed(target, output, elapsed),
            other => Self::failed(target, other.to_string(), elapsed),
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn status(&self) -> OutcomeStatus {
        self.status
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Present iff the target succeeded
    pub fn artifact(&self) -> Option<&Path> {
        self.artifact.as_deref()
    }

    /// Present iff the target failed
    pub fn diagnostics(&self) -> Option<&str> {
        self.diagnostics.as_deref()
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }
}

/// Aggregate status of a package
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PackageOutcome {
    pub name: String,
    pub status: OutcomeStatus,
    pub members: Vec<String>,
    /// Members without a successful outcome, in member order
    pub failed_members: Vec<String>,
}

impl PackageOutcome {
    /// Reduce a package over already computed outcomes. A member with no
    /// outcome counts as failed.
    pub fn aggregate(package: &Package, outcomes: &[Outcome]) -> Self {
        let failed_members: Vec<String> = package
            .targets
            .iter()
            .filter(|member| {
                !outcomes
                    .iter()
                    .any(|o| o.target() == member.as_str() && o.is_success())
            })
            .cloned()
            .collect();

        let status = if failed_members.is_empty() {
            OutcomeStatus::Succeeded
        } else {
            OutcomeStatus::Failed
        };

        Self {
            name: package.name.clone(),
            status,
            members: package.targets.clone(),
            failed_members,
        }
    }
}

/// Accumulates outcomes for one invocation
///
/// `record` takes `&self` so a reporter can be shared between compiler
/// driver calls running on different threads.
#[derive(Debug, Default)]
pub struct Reporter {
    outcomes: Mutex<Vec<Outcome>>,
}

impl Reporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an outcome, preserving call order
    pub fn record(&self, outcome: Outcome) {
        log::debug!("{}: {}", outcome.target(), outcome.status());
        self.outcomes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(outcome);
    }

    pub fn len(&self) -> usize {
        self.outcomes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot the recorded outcomes into a report
    pub fn summarize(&self) -> Report {
        let outcomes = self
            .outcomes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        Report::from_outcomes(outcomes)
    }
}

/// Aggregated result of one build invocation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    outcomes: Vec<Outcome>,
    packages: Vec<PackageOutcome>,
    succeeded: usize,
    failed: usize,
    status: OutcomeStatus,
}

impl Report {
    /// Build a report from outcomes in a single pass
    pub fn from_outcomes(outcomes: Vec<Outcome>) -> Self {
        let succeeded = outcomes.iter().filter(|o| o.is_success()).count();
        let failed = outcomes.len() - succeeded;
        let status = if failed == 0 {
            OutcomeStatus::Succeeded
        } else {
            OutcomeStatus::Failed
        };

        Self {
            outcomes,
            packages: Vec::new(),
            succeeded,
            failed,
            status,
        }
    }

    /// Attach package aggregates computed from this report's outcomes
    pub fn with_packages(mut self, packages: &[Package]) -> Self {
        self.packages = packages
            .iter()
            .map(|p| PackageOutcome::aggregate(p, &self.outcomes))
            .collect();
        self
    }

    pub fn outcomes(&self) -> &[Outcome] {
        &self.outcomes
    }

    pub fn outcome(&self, target: &str) -> Option<&Outcome> {
        self.outcomes.iter().find(|o| o.target() == target)
    }

    pub fn packages(&self) -> &[PackageOutcome] {
        &self.packages
    }

    pub fn package(&self, name: &str) -> Option<&PackageOutcome> {
        self.packages.iter().find(|p| p.name == name)
    }

    pub fn succeeded(&self) -> usize {
        self.succeeded
    }

    pub fn failed(&self) -> usize {
        self.failed
    }

    /// Succeeded iff every outcome succeeded
    pub fn status(&self) -> OutcomeStatus {
        self.status
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Render as pretty JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Render a report as human-readable text
///
/// Targets appear in declaration order, then packages, then the aggregate
/// line.
pub fn render(report: &Report) -> String {
    let mut out = String::new();

    for outcome in report.outcomes() {
        let secs = outcome.elapsed().as_secs_f64();
        match outcome.status() {
            OutcomeStatus::Succeeded => {
                let _ = write!(out, "[ok]     {} ({:.2}s)", outcome.target(), secs);
                if let Some(artifact) = outcome.artifact() {
                    let _ = write!(out, " -> {}", artifact.display());
                }
                out.push('\n');
            }
            OutcomeStatus::Failed => {
                let _ = writeln!(out, "[failed] {} ({:.2}s)", outcome.target(), secs);
                if let Some(diagnostics) = outcome.diagnostics() {
                    for line in diagnostics.lines() {
                        let _ = writeln!(out, "    {}", line);
                    }
                }
            }
        }
    }

    for package in report.packages() {
        let _ = write!(out, "package {}: {}", package.name, package.status);
        if !package.failed_members.is_empty() {
            let _ = write!(out, " ({})", package.failed_members.join(", "));
        }
        out.push('\n');
    }

    let _ = writeln!(
        out,
        "{} succeeded, {} failed",
        report.succeeded(),
        report.failed()
    );
    out
}

/// Serialize durations as fractional seconds
mod serde_secs {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_f64(duration.as_secs_f64())
    }
}
