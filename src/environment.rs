//! Environment lifecycle: install, update, remove, activate, deactivate, validate
//!
//! One [`Environment`] runs one command. It computes the manifest diff,
//! drives the feature runner, and persists the result through
//! [`Directory`]. The current [`Phase`] decides what happens when a run
//! stops early: only an interrupted or failed install is rolled back.

use crate::activation;
use crate::directory::Directory;
use crate::error::{Error, Result};
use crate::state::StateTable;
use declarative::{
    Action, CancellationToken, ErrorPolicy, ExecutionPlan, ExecutionScope, FeatureRegistry,
    FeatureStatus, Halt, NoProgress, PlanOptions, PlannedStep, ProgressCallback, RunReport,
};
use manifest::{Location, Manifest, is_valid_name};
use std::fmt;
use std::fs;
use std::path::PathBuf;

/// Lifecycle phase of an [`Environment`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    None,
    Install,
    Update,
    Remove,
    Activate,
    Deactivate,
    Validate,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::None => "none",
            Self::Install => "install",
            Self::Update => "update",
            Self::Remove => "remove",
            Self::Activate => "activate",
            Self::Deactivate => "deactivate",
            Self::Validate => "validate",
        };
        f.write_str(label)
    }
}

/// What a lifecycle command did
#[derive(Debug, Default)]
pub struct Report {
    pub namespace: String,
    /// Feature runner outcomes (empty for activate/deactivate)
    pub run: RunReport,
    /// Non-fatal problems
    pub warnings: Vec<String>,
}

impl Report {
    fn new(namespace: &str) -> Self {
        Self {
            namespace: namespace.to_string(),
            ..Self::default()
        }
    }
}

/// Orchestrates one lifecycle command
pub struct Environment {
    root: PathBuf,
    registry: FeatureRegistry,
    rc_files: Vec<PathBuf>,
    cancel: CancellationToken,
    progress: Box<dyn ProgressCallback>,
    verbose: bool,
    phase: Phase,
}

impl Environment {
    pub fn new(root: impl Into<PathBuf>, registry: FeatureRegistry) -> Self {
        Self {
            root: root.into(),
            registry,
            rc_files: Vec::new(),
            cancel: CancellationToken::new(),
            progress: Box::new(NoProgress),
            verbose: false,
            phase: Phase::None,
        }
    }

    /// Shell rc files activation writes to
    pub fn with_rc_files(mut self, rc_files: Vec<PathBuf>) -> Self {
        self.rc_files = rc_files;
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_progress(mut self, progress: Box<dyn ProgressCallback>) -> Self {
        self.progress = progress;
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn registry(&self) -> &FeatureRegistry {
        &self.registry
    }

    /// Run `f` inside `phase`, returning to [`Phase::None`] afterwards
    fn in_phase<T>(&mut self, phase: Phase, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        log::debug!("Phase {} -> {phase}", self.phase);
        self.phase = phase;
        let result = f(self);
        log::debug!("Phase {phase} -> {}", Phase::None);
        self.phase = Phase::None;
        result
    }

    // ========================================================================
    // Install
    // ========================================================================

    /// Install `target` as a new environment
    ///
    /// The namespace is `namespace`, else the manifest's own, else the file
    /// stem of where the manifest was loaded from.
    pub fn install(&mut self, target: Manifest, namespace: Option<&str>) -> Result<Report> {
        self.in_phase(Phase::Install, |env| env.run_install(target, namespace))
    }

    fn run_install(&mut self, target: Manifest, namespace: Option<&str>) -> Result<Report> {
        self.check(&target)?;
        let namespace = resolve_namespace(namespace, &target)?;
        let target = record_upstream(target, None);

        let directory = Directory::create(&self.root, &namespace)?;
        log::info!("Installing '{namespace}' into {}", directory.path().display());

        let plan = ExecutionPlan::from_diff(Manifest::empty().diff(&target), &PlanOptions::default());
        let run = self.execute(&plan, &directory, ErrorPolicy::Abort);

        let committed = match &run.halt {
            Some(halt) => Err(halt_error(halt, Phase::Install)),
            None => self.finish_install(&directory, &target, &run),
        };

        if let Err(err) = committed {
            self.rollback(&directory, &run);
            return Err(err);
        }

        let mut report = Report::new(&namespace);
        report.run = run;
        report.warnings = self.inject_all(&directory);
        Ok(report)
    }

    fn finish_install(&self, directory: &Directory, target: &Manifest, run: &RunReport) -> Result<()> {
        let mut states = StateTable::new();
        states.apply_outcomes(&run.outcomes);
        directory.write_hooks(&self.render_hooks(directory, target))?;
        directory.commit(target, &states)
    }

    /// Undo a partial install: remove what was installed, then the directory
    fn rollback(&self, directory: &Directory, run: &RunReport) {
        log::warn!("Rolling back install of '{}'", directory.namespace());

        let steps = run
            .outcomes
            .iter()
            .rev()
            .filter(|o| o.status == FeatureStatus::Installed)
            .map(|o| PlannedStep {
                name: o.name.clone(),
                action: Action::Remove,
                old: o.config.clone(),
                new: None,
            })
            .collect();
        let plan = ExecutionPlan { steps };

        let scope = self.scope(directory);
        let undo = declarative::execute(
            &plan,
            &self.registry,
            &scope,
            ErrorPolicy::Continue,
            &CancellationToken::new(),
            &mut NoProgress,
        );
        for failed in undo.failures() {
            log::warn!(
                "Could not undo '{}': {}",
                failed.name,
                failed.error.as_deref().unwrap_or_default()
            );
        }

        for rc in &self.rc_files {
            if let Err(e) = activation::clear(rc, directory.namespace()) {
                log::warn!("Could not clean {}: {e}", rc.display());
            }
        }

        if let Err(e) = directory.remove() {
            log::error!("Rollback could not remove {}: {e}", directory.path().display());
        }
    }

    // ========================================================================
    // Update
    // ========================================================================

    /// Upstream location recorded by an installed environment
    pub fn upstream(&self, namespace: &str) -> Result<String> {
        let directory = Directory::load(&self.root, namespace)?;
        directory
            .source()?
            .resolve_source_uri()
            .map(str::to_string)
            .ok_or_else(|| Error::NoUpstream(namespace.to_string()))
    }

    /// Converge an installed environment onto `target`
    pub fn update(&mut self, namespace: &str, target: Manifest, reconfigure: bool) -> Result<Report> {
        self.in_phase(Phase::Update, |env| env.run_update(namespace, target, reconfigure))
    }

    fn run_update(&mut self, namespace: &str, target: Manifest, reconfigure: bool) -> Result<Report> {
        let directory = Directory::load(&self.root, namespace)?;
        let source = directory.source()?;
        let mut states = directory.states()?;

        self.check(&target)?;
        let target = record_upstream(target, source.resolve_source_uri());

        let retry: Vec<String> = states
            .failed()
            .into_iter()
            .filter(|name| target.feature(name).is_some())
            .collect();
        if !retry.is_empty() {
            log::info!("Retrying previously failed: {}", retry.join(", "));
        }

        let opts = PlanOptions::default().reconfigure(reconfigure).retry(retry);
        let mut plan = ExecutionPlan::from_diff(source.diff(&target), &opts);
        reconcile_with_states(&mut plan, &states);
        log::info!("Updating '{namespace}' ({} changes)", plan.total_changes());

        let run = self.execute(&plan, &directory, ErrorPolicy::Abort);
        states.apply_outcomes(&run.outcomes);

        if let Some(halt) = &run.halt {
            directory.record_states(&states)?;
            return Err(halt_error(halt, Phase::Update));
        }

        states.prune_removed();
        directory.write_hooks(&self.render_hooks(&directory, &target))?;
        directory.commit(&target, &states)?;

        let mut report = Report::new(namespace);
        report.run = run;
        Ok(report)
    }

    // ========================================================================
    // Remove
    // ========================================================================

    /// Remove every feature, then the environment itself
    ///
    /// Feature failures do not stop the removal; they come back as
    /// failed outcomes in the report.
    pub fn remove(&mut self, namespace: &str) -> Result<Report> {
        self.in_phase(Phase::Remove, |env| env.run_remove(namespace))
    }

    fn run_remove(&mut self, namespace: &str) -> Result<Report> {
        let directory = Directory::load(&self.root, namespace)?;
        let source = directory.source()?;
        let mut states = directory.states()?;

        let mut plan = ExecutionPlan::from_diff(source.diff(&Manifest::empty()), &PlanOptions::default());
        reconcile_with_states(&mut plan, &states);
        log::info!("Removing '{namespace}' ({} features)", plan.total_changes());
        let run = self.execute(&plan, &directory, ErrorPolicy::Continue);

        if let Some(halt) = &run.halt {
            states.apply_outcomes(&run.outcomes);
            directory.record_states(&states)?;
            return Err(halt_error(halt, Phase::Remove));
        }

        let mut report = Report::new(namespace);
        for rc in &self.rc_files {
            if let Err(e) = activation::clear(rc, namespace) {
                report
                    .warnings
                    .push(format!("could not clean {}: {e}", rc.display()));
            }
        }
        directory.remove()?;

        report.run = run;
        Ok(report)
    }

    // ========================================================================
    // Activate / Deactivate
    // ========================================================================

    /// Hook the environment into the shell and run feature activate hooks
    pub fn activate(&mut self, namespace: &str) -> Result<Report> {
        self.in_phase(Phase::Activate, |env| env.run_activation(namespace, true))
    }

    /// Unhook the environment from the shell and run feature deactivate hooks
    pub fn deactivate(&mut self, namespace: &str) -> Result<Report> {
        self.in_phase(Phase::Deactivate, |env| env.run_activation(namespace, false))
    }

    fn run_activation(&mut self, namespace: &str, activate: bool) -> Result<Report> {
        let directory = Directory::load(&self.root, namespace)?;
        let source = directory.source()?;
        let scope = self.scope(&directory);
        let mut report = Report::new(namespace);

        for spec in source.features() {
            let ctx = scope.context_for(&spec.name);
            let result = self.registry.resolve(&spec.config).and_then(|feature| {
                if activate {
                    feature.activate(&ctx, &spec.config)
                } else {
                    feature.deactivate(&ctx, &spec.config)
                }
            });
            if let Err(e) = result {
                report.warnings.push(format!("feature '{}': {e:#}", spec.name));
            }
        }

        if activate {
            directory.write_hooks(&self.render_hooks(&directory, &source))?;
            report.warnings.extend(self.inject_all(&directory));
        } else {
            for rc in &self.rc_files {
                if let Err(e) = activation::clear(rc, namespace) {
                    report
                        .warnings
                        .push(format!("could not clean {}: {e}", rc.display()));
                }
            }
        }

        for warning in &report.warnings {
            log::warn!("{warning}");
        }
        Ok(report)
    }

    /// Inject the hook block into the rc files
    ///
    /// Files that do not exist are skipped, unless none exists, in which
    /// case the first one is created.
    fn inject_all(&self, directory: &Directory) -> Vec<String> {
        let mut targets: Vec<&PathBuf> = self.rc_files.iter().filter(|rc| rc.exists()).collect();
        if targets.is_empty()
            && let Some(first) = self.rc_files.first()
        {
            targets.push(first);
        }

        let mut warnings = Vec::new();
        for rc in targets {
            if let Err(e) = activation::inject(rc, directory.namespace(), &directory.hooks_path()) {
                warnings.push(format!("could not update {}: {e}", rc.display()));
            }
        }
        warnings
    }

    // ========================================================================
    // Validate
    // ========================================================================

    /// Problems with `target`; empty means valid. Touches nothing.
    pub fn validate(&mut self, target: &Manifest) -> Vec<String> {
        self.phase = Phase::Validate;
        let errors = self.registry.validate_manifest(target);
        self.phase = Phase::None;
        errors
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    fn check(&self, target: &Manifest) -> Result<()> {
        let errors = self.registry.validate_manifest(target);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(Error::Invalid(errors))
        }
    }

    fn scope(&self, directory: &Directory) -> ExecutionScope {
        ExecutionScope::new(directory.namespace(), directory.features_dir()).verbose(self.verbose)
    }

    fn execute(&mut self, plan: &ExecutionPlan, directory: &Directory, policy: ErrorPolicy) -> RunReport {
        let scope = self.scope(directory);
        declarative::execute(
            plan,
            &self.registry,
            &scope,
            policy,
            &self.cancel,
            self.progress.as_mut(),
        )
    }

    fn render_hooks(&self, directory: &Directory, manifest: &Manifest) -> String {
        let scope = self.scope(directory);
        let hooks = manifest.features().iter().filter_map(|spec| {
            let feature = self.registry.resolve(&spec.config).ok()?;
            let ctx = scope.context_for(&spec.name);
            Some((spec.name.as_str(), feature.hooks(&ctx, &spec.config)))
        });
        activation::render_hooks(directory.namespace(), hooks)
    }
}

fn halt_error(halt: &Halt, phase: Phase) -> Error {
    match halt {
        Halt::Interrupted => Error::Interrupted { phase },
        Halt::Failed(err) => Error::Feature(err.clone()),
    }
}

/// Align a diff-based plan with the state table
///
/// The manifest only moves on a successful commit, so after an aborted
/// update the records say what is really on disk. Recorded configs
/// replace `old`, features recorded as removed are installed again or
/// dropped, and live features outside both manifests are removed after
/// every other step.
fn reconcile_with_states(plan: &mut ExecutionPlan, states: &StateTable) {
    let mut steps = Vec::with_capacity(plan.steps.len());
    for mut step in plan.steps.drain(..) {
        let Some(record) = states.get(&step.name) else {
            steps.push(step);
            continue;
        };

        match (record.status, &record.config) {
            (FeatureStatus::Removed, _) => {
                if step.action == Action::Remove {
                    log::debug!("'{}' already removed", step.name);
                    continue;
                }
                step.action = Action::Install;
                step.old = None;
            }
            // A failed install is attempted again as an install
            (FeatureStatus::Failed, _) if step.action == Action::Install => {}
            (status, Some(applied)) => {
                let drifted = step.new.as_ref() != Some(applied);
                step.action = match step.action {
                    Action::Install | Action::Skip if drifted => Action::Update,
                    Action::Install if status == FeatureStatus::Installed => Action::Skip,
                    action => action,
                };
                if drifted && step.old.is_some() {
                    log::debug!("'{}' differs from the manifest, using recorded config", step.name);
                }
                step.old = Some(applied.clone());
            }
            (_, None) => {}
        }
        steps.push(step);
    }

    for (name, record) in states.iter() {
        if steps.iter().any(|s| s.name == name) || record.status == FeatureStatus::Removed {
            continue;
        }
        let Some(applied) = &record.config else {
            log::warn!("'{name}' has no recorded config and cannot be removed");
            continue;
        };
        log::info!("'{name}' is left over from an earlier run, removing");
        steps.push(PlannedStep {
            name: name.to_string(),
            action: Action::Remove,
            old: Some(applied.clone()),
            new: None,
        });
    }

    plan.steps = steps;
}

/// Explicit namespace, else the manifest's, else the location's file stem
fn resolve_namespace(explicit: Option<&str>, target: &Manifest) -> Result<String> {
    let namespace = explicit
        .map(str::to_string)
        .or_else(|| target.namespace().map(str::to_string))
        .or_else(|| target.location().and_then(Location::file_stem))
        .ok_or(Error::NoNamespace)?;

    if !is_valid_name(&namespace) {
        return Err(Error::Invalid(vec![format!(
            "invalid namespace '{namespace}': use letters, digits, '.', '_' or '-'"
        )]));
    }
    Ok(namespace)
}

/// Make sure the manifest remembers where updates come from
///
/// A declared `source` wins; otherwise the location it was loaded from
/// (absolute for local files), otherwise `fallback`.
fn record_upstream(target: Manifest, fallback: Option<&str>) -> Manifest {
    if target.resolve_source_uri().is_some() {
        return target;
    }
    let loaded_from = target.location().map(|location| match location {
        Location::Path(path) => fs::canonicalize(path)
            .unwrap_or_else(|_| path.clone())
            .display()
            .to_string(),
        Location::Remote(uri) => uri.clone(),
    });
    match loaded_from.or_else(|| fallback.map(str::to_string)) {
        Some(source) => target.with_source(source),
        None => target,
    }
}
