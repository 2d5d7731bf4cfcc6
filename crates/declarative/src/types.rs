//! Core types for feature execution

use crate::error::FeatureError;
use manifest::Section;
use serde::{Deserialize, Serialize};
use std::fmt;

/// What the runner does with one feature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// Run the feature's install contract
    Install,
    /// Run the feature's update contract (or remove + install)
    Update,
    /// Run the feature's remove contract
    Remove,
    /// Nothing to do; the feature stays installed
    Skip,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Install => "install",
            Self::Update => "update",
            Self::Remove => "remove",
            Self::Skip => "skip",
        };
        f.write_str(label)
    }
}

/// Recorded status of a feature after the runner touched it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeatureStatus {
    Installed,
    Failed,
    Removed,
}

impl fmt::Display for FeatureStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Installed => "installed",
            Self::Failed => "failed",
            Self::Removed => "removed",
        };
        f.write_str(label)
    }
}

/// Outcome of one plan step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureOutcome {
    /// Feature name
    pub name: String,
    /// Action that was attempted
    pub action: Action,
    /// Resulting status
    pub status: FeatureStatus,
    /// Config that is now applied, or that was being applied when the step failed
    pub config: Option<Section>,
    /// Failure cause, when the step failed
    pub error: Option<String>,
}

impl FeatureOutcome {
    pub fn is_success(&self) -> bool {
        self.status != FeatureStatus::Failed
    }
}

/// Summary of a run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub installed: usize,
    pub updated: usize,
    pub removed: usize,
    pub unchanged: usize,
    pub failed: usize,
}

impl RunSummary {
    /// Total number of actual changes made
    pub fn total_changes(&self) -> usize {
        self.installed + self.updated + self.removed
    }

    /// Check if the run had no failures
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }

    /// Total number of features processed
    pub fn total(&self) -> usize {
        self.installed + self.updated + self.removed + self.unchanged + self.failed
    }

    /// Add an outcome to the summary
    pub fn add_outcome(&mut self, outcome: &FeatureOutcome) {
        match (outcome.status, outcome.action) {
            (FeatureStatus::Failed, _) => self.failed += 1,
            (_, Action::Install) => self.installed += 1,
            (_, Action::Update) => self.updated += 1,
            (_, Action::Remove) => self.removed += 1,
            (_, Action::Skip) => self.unchanged += 1,
        }
    }
}

/// What the runner does when a feature fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorPolicy {
    /// Stop at the first failure
    #[default]
    Abort,
    /// Record the failure and keep going
    Continue,
}

/// Why a run stopped before the end of its plan
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Halt {
    /// A feature failed under [`ErrorPolicy::Abort`]
    Failed(FeatureError),
    /// The cancellation token fired between steps
    Interrupted,
}

/// Everything a run produced, in plan order
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    /// Outcomes of every step reached
    pub outcomes: Vec<FeatureOutcome>,
    /// Counts per outcome kind
    pub summary: RunSummary,
    /// Set when the run stopped early
    pub halt: Option<Halt>,
}

impl RunReport {
    pub(crate) fn record(&mut self, outcome: FeatureOutcome) {
        self.summary.add_outcome(&outcome);
        self.outcomes.push(outcome);
    }

    /// True when every step of the plan was reached
    pub fn is_complete(&self) -> bool {
        self.halt.is_none()
    }

    /// Whether the run was cut short by cancellation
    pub fn was_interrupted(&self) -> bool {
        matches!(self.halt, Some(Halt::Interrupted))
    }

    /// Failed outcomes, in plan order
    pub fn failures(&self) -> impl Iterator<Item = &FeatureOutcome> {
        self.outcomes.iter().filter(|o| !o.is_success())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(action: Action, status: FeatureStatus) -> FeatureOutcome {
        FeatureOutcome {
            name: "a".into(),
            action,
            status,
            config: None,
            error: None,
        }
    }

    #[test]
    fn test_summary_counts() {
        let mut summary = RunSummary::default();
        summary.add_outcome(&outcome(Action::Install, FeatureStatus::Installed));
        summary.add_outcome(&outcome(Action::Update, FeatureStatus::Installed));
        summary.add_outcome(&outcome(Action::Remove, FeatureStatus::Removed));
        summary.add_outcome(&outcome(Action::Skip, FeatureStatus::Installed));
        summary.add_outcome(&outcome(Action::Install, FeatureStatus::Failed));

        assert_eq!(summary.total_changes(), 3);
        assert_eq!(summary.unchanged, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.total(), 5);
        assert!(!summary.is_success());
    }

    #[test]
    fn test_report_failures_keep_cause() {
        let mut report = RunReport::default();
        report.record(outcome(Action::Install, FeatureStatus::Installed));
        let mut failed = outcome(Action::Remove, FeatureStatus::Failed);
        failed.error = Some("boom".into());
        report.record(failed);

        let failures: Vec<_> = report.failures().collect();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].error.as_deref(), Some("boom"));
        assert!(report.is_complete());
    }
}
