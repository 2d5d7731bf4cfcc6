//! Execution context and progress reporting
//!
//! These types let the runner hand features a working area and report
//! progress without depending on a particular terminal UI.

use crate::types::{Action, FeatureOutcome, RunSummary};
use std::io;
use std::path::{Path, PathBuf};

/// Where a run takes place: one namespace and its feature directories
#[derive(Debug, Clone)]
pub struct ExecutionScope {
    /// Namespace of the environment being changed
    pub namespace: String,
    /// Parent of the per-feature working directories
    pub features_dir: PathBuf,
    /// Whether features should output verbose information
    pub verbose: bool,
}

impl ExecutionScope {
    pub fn new(namespace: impl Into<String>, features_dir: impl Into<PathBuf>) -> Self {
        Self {
            namespace: namespace.into(),
            features_dir: features_dir.into(),
            verbose: false,
        }
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Context handed to the feature called `name`
    pub fn context_for(&self, name: &str) -> FeatureContext {
        FeatureContext {
            namespace: self.namespace.clone(),
            name: name.to_string(),
            work_dir: self.features_dir.join(name),
            verbose: self.verbose,
        }
    }
}

/// Context passed to every feature contract
#[derive(Debug, Clone)]
pub struct FeatureContext {
    /// Namespace the feature belongs to
    pub namespace: String,
    /// Feature (section) name
    pub name: String,
    /// Private working directory, removed with the environment
    pub work_dir: PathBuf,
    /// Whether to output verbose information
    pub verbose: bool,
}

impl FeatureContext {
    /// Create the working directory on first use
    pub fn ensure_work_dir(&self) -> io::Result<&Path> {
        std::fs::create_dir_all(&self.work_dir)?;
        Ok(&self.work_dir)
    }
}

/// Progress callback for plan execution
///
/// Implement this trait to receive progress updates during execution.
pub trait ProgressCallback {
    /// Called once before the first step with the number of steps that change something
    fn on_plan_start(&mut self, changes: usize);

    /// Called when a feature step with real work begins
    fn on_feature_start(&mut self, name: &str, action: Action);

    /// Called after every step, including skipped ones
    fn on_feature_complete(&mut self, outcome: &FeatureOutcome);

    /// Called once after the last step reached
    fn on_plan_complete(&mut self, summary: &RunSummary);
}

/// No-op progress callback
pub struct NoProgress;

impl ProgressCallback for NoProgress {
    fn on_plan_start(&mut self, _changes: usize) {}
    fn on_feature_start(&mut self, _name: &str, _action: Action) {}
    fn on_feature_complete(&mut self, _outcome: &FeatureOutcome) {}
    fn on_plan_complete(&mut self, _summary: &RunSummary) {}
}
