//! Execution planner - turns a manifest diff into ordered feature steps

use crate::types::Action;
use manifest::{FeatureDiff, FeatureState, Section};
use std::collections::BTreeSet;

/// One step of a plan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedStep {
    pub name: String,
    pub action: Action,
    /// Config currently applied (update and remove)
    pub old: Option<Section>,
    /// Config to apply (install and update)
    pub new: Option<Section>,
}

/// Options that widen what counts as a change
#[derive(Debug, Clone, Default)]
pub struct PlanOptions {
    /// Re-run every unchanged feature through its update path
    pub reconfigure: bool,
    /// Unchanged features to update anyway (last recorded as failed)
    pub retry: BTreeSet<String>,
}

impl PlanOptions {
    pub fn reconfigure(mut self, reconfigure: bool) -> Self {
        self.reconfigure = reconfigure;
        self
    }

    pub fn retry<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.retry.extend(names.into_iter().map(Into::into));
        self
    }
}

/// Ordered steps to run, in diff order
#[derive(Debug, Clone, Default)]
pub struct ExecutionPlan {
    pub steps: Vec<PlannedStep>,
}

impl ExecutionPlan {
    /// Map diff states to actions, preserving diff order
    pub fn from_diff(diffs: Vec<FeatureDiff>, opts: &PlanOptions) -> Self {
        let steps = diffs
            .into_iter()
            .map(|diff| {
                let action = match diff.state {
                    FeatureState::Add => Action::Install,
                    FeatureState::Remove => Action::Remove,
                    FeatureState::Update => Action::Update,
                    FeatureState::Unchanged
                        if opts.reconfigure || opts.retry.contains(&diff.name) =>
                    {
                        Action::Update
                    }
                    FeatureState::Unchanged => Action::Skip,
                };
                PlannedStep {
                    name: diff.name,
                    action,
                    old: diff.old,
                    new: diff.new,
                }
            })
            .collect();

        Self { steps }
    }

    /// Steps that do real work
    pub fn changes(&self) -> impl Iterator<Item = &PlannedStep> {
        self.steps.iter().filter(|s| s.action != Action::Skip)
    }

    pub fn total_changes(&self) -> usize {
        self.changes().count()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}
