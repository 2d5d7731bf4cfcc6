//! Execution engine - runs plan steps sequentially against the registry

use crate::cancel::CancellationToken;
use crate::context::{ExecutionScope, FeatureContext, ProgressCallback};
use crate::error::FeatureError;
use crate::feature::UpdatePath;
use crate::planner::{ExecutionPlan, PlannedStep};
use crate::registry::FeatureRegistry;
use crate::types::{Action, ErrorPolicy, FeatureOutcome, FeatureStatus, Halt, RunReport};
use anyhow::{Result, anyhow};
use manifest::Section;

/// Execute a plan in declaration order
///
/// The cancellation token is checked before every step; once set, the
/// run stops and the report is marked [`Halt::Interrupted`]. Under
/// [`ErrorPolicy::Abort`] the first failure stops the run with
/// [`Halt::Failed`]; under [`ErrorPolicy::Continue`] it is recorded and
/// the next step runs. Every step reached produces an outcome.
pub fn execute<P>(
    plan: &ExecutionPlan,
    registry: &FeatureRegistry,
    scope: &ExecutionScope,
    policy: ErrorPolicy,
    cancel: &CancellationToken,
    progress: &mut P,
) -> RunReport
where
    P: ProgressCallback + ?Sized,
{
    let mut report = RunReport::default();
    progress.on_plan_start(plan.total_changes());

    for step in &plan.steps {
        if cancel.is_cancelled() {
            log::warn!("Interrupted before '{}' ({})", step.name, step.action);
            report.halt = Some(Halt::Interrupted);
            break;
        }

        if step.action != Action::Skip {
            log::info!("{} '{}'", step.action, step.name);
            progress.on_feature_start(&step.name, step.action);
        } else {
            log::debug!("'{}' unchanged", step.name);
        }

        let ctx = scope.context_for(&step.name);
        let outcome = match run_step(step, registry, &ctx) {
            Ok(status) => FeatureOutcome {
                name: step.name.clone(),
                action: step.action,
                status,
                config: applied_config(step).cloned(),
                error: None,
            },
            Err(e) => {
                let err = FeatureError::from_anyhow(&step.name, &e);
                log::error!("{err}");
                FeatureOutcome {
                    name: step.name.clone(),
                    action: step.action,
                    status: FeatureStatus::Failed,
                    config: applied_config(step).cloned(),
                    error: Some(err.cause.clone()),
                }
            }
        };

        progress.on_feature_complete(&outcome);
        let failed = !outcome.is_success();
        let cause = outcome.error.clone();
        report.record(outcome);

        // A step killed by the same Ctrl-C counts as the interrupt
        if failed && cancel.is_cancelled() {
            log::warn!("Interrupted during '{}' ({})", step.name, step.action);
            report.halt = Some(Halt::Interrupted);
            break;
        }

        if failed && policy == ErrorPolicy::Abort {
            let err = FeatureError::new(step.name.clone(), cause.unwrap_or_default());
            report.halt = Some(Halt::Failed(err));
            break;
        }
    }

    progress.on_plan_complete(&report.summary);
    report
}

/// Config an outcome records: the attempted one for install and update,
/// the previously applied one for remove
fn applied_config(step: &PlannedStep) -> Option<&Section> {
    match step.action {
        Action::Remove => step.old.as_ref(),
        _ => step.new.as_ref().or(step.old.as_ref()),
    }
}

/// Run a single step, returning the status to record
fn run_step(
    step: &PlannedStep,
    registry: &FeatureRegistry,
    ctx: &FeatureContext,
) -> Result<FeatureStatus> {
    match step.action {
        Action::Skip => Ok(FeatureStatus::Installed),
        Action::Install => {
            let new = required(&step.new, "new")?;
            registry.resolve(new)?.install(ctx, new)?;
            Ok(FeatureStatus::Installed)
        }
        Action::Remove => {
            let old = required(&step.old, "old")?;
            registry.resolve(old)?.remove(ctx, old)?;
            Ok(FeatureStatus::Removed)
        }
        Action::Update => {
            let old = required(&step.old, "old")?;
            let new = required(&step.new, "new")?;
            let old_feature = registry.resolve(old)?;
            let new_feature = registry.resolve(new)?;

            let path = if old_feature.formula() == new_feature.formula() {
                new_feature.update(ctx, old, new)?
            } else {
                log::debug!(
                    "'{}' changes formula {} -> {}",
                    ctx.name,
                    old_feature.formula(),
                    new_feature.formula()
                );
                UpdatePath::Unsupported
            };

            if path == UpdatePath::Unsupported {
                log::debug!("'{}' has no in-place update, reinstalling", ctx.name);
                old_feature.remove(ctx, old)?;
                new_feature.install(ctx, new)?;
            }
            Ok(FeatureStatus::Installed)
        }
    }
}

fn required<'a>(config: &'a Option<Section>, which: &str) -> Result<&'a Section> {
    config
        .as_ref()
        .ok_or_else(|| anyhow!("plan step is missing its {which} config"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::NoProgress;
    use crate::feature::Feature;
    use crate::planner::PlanOptions;
    use crate::types::RunSummary;
    use manifest::{FeatureSchema, Manifest};
    use std::sync::{Arc, Mutex};

    /// Records every call; fails on sections that carry `fail = <contract>`
    #[derive(Debug, Clone)]
    struct Recorder {
        formula: &'static str,
        in_place: bool,
        calls: Arc<Mutex<Vec<String>>>,
    }

    impl Recorder {
        fn new(formula: &'static str, in_place: bool, calls: &Arc<Mutex<Vec<String>>>) -> Self {
            Self {
                formula,
                in_place,
                calls: Arc::clone(calls),
            }
        }

        fn call(&self, what: &str, ctx: &FeatureContext, config: &Section) -> Result<()> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("{what} {}", ctx.name));
            if config.get("fail") == Some(what) {
                anyhow::bail!("{what} exploded");
            }
            Ok(())
        }
    }

    impl Feature for Recorder {
        fn formula(&self) -> &'static str {
            self.formula
        }

        fn description(&self) -> &'static str {
            "Recording test feature"
        }

        fn schema(&self) -> FeatureSchema {
            FeatureSchema::open(&[])
        }

        fn install(&self, ctx: &FeatureContext, config: &Section) -> Result<()> {
            self.call("install", ctx, config)
        }

        fn update(&self, ctx: &FeatureContext, _old: &Section, new: &Section) -> Result<UpdatePath> {
            if !self.in_place {
                return Ok(UpdatePath::Unsupported);
            }
            self.call("update", ctx, new)?;
            Ok(UpdatePath::Applied)
        }

        fn remove(&self, ctx: &FeatureContext, config: &Section) -> Result<()> {
            self.call("remove", ctx, config)
        }
    }

    struct Harness {
        registry: FeatureRegistry,
        calls: Arc<Mutex<Vec<String>>>,
        scope: ExecutionScope,
    }

    impl Harness {
        fn new() -> Self {
            let calls = Arc::new(Mutex::new(Vec::new()));
            let registry = FeatureRegistry::new()
                .with(Recorder::new("inplace", true, &calls))
                .with(Recorder::new("replace", false, &calls));
            Self {
                registry,
                calls,
                scope: ExecutionScope::new("test", "/nonexistent/features"),
            }
        }

        fn run(&self, source: &str, target: &str, policy: ErrorPolicy) -> RunReport {
            self.run_with(source, target, policy, &CancellationToken::new())
        }

        fn run_with(
            &self,
            source: &str,
            target: &str,
            policy: ErrorPolicy,
            cancel: &CancellationToken,
        ) -> RunReport {
            let source = Manifest::parse(source).unwrap();
            let target = Manifest::parse(target).unwrap();
            let plan = ExecutionPlan::from_diff(source.diff(&target), &PlanOptions::default());
            execute(&plan, &self.registry, &self.scope, policy, cancel, &mut NoProgress)
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[test]
    fn test_execute_empty_plan() {
        let h = Harness::new();
        let report = h.run("", "", ErrorPolicy::Abort);
        assert_eq!(report.summary, RunSummary::default());
        assert!(report.is_complete());
        assert!(h.calls().is_empty());
    }

    #[test]
    fn test_dispatch_by_state() {
        let h = Harness::new();
        let report = h.run(
            "[a]\nformula = inplace\nv = 1\n[b]\nformula = inplace\n[k]\nformula = inplace\n",
            "[a]\nformula = inplace\nv = 2\n[c]\nformula = inplace\n[k]\nformula = inplace\n",
            ErrorPolicy::Abort,
        );

        assert_eq!(h.calls(), vec!["update a", "install c", "remove b"]);
        assert_eq!(report.summary.updated, 1);
        assert_eq!(report.summary.installed, 1);
        assert_eq!(report.summary.removed, 1);
        assert_eq!(report.summary.unchanged, 1);
        assert!(report.is_complete());
    }

    #[test]
    fn test_update_without_in_place_path_reinstalls() {
        let h = Harness::new();
        h.run(
            "[a]\nformula = replace\nv = 1\n",
            "[a]\nformula = replace\nv = 2\n",
            ErrorPolicy::Abort,
        );
        assert_eq!(h.calls(), vec!["remove a", "install a"]);
    }

    #[test]
    fn test_formula_change_reinstalls_with_each_implementation() {
        let h = Harness::new();
        let report = h.run(
            "[a]\nformula = inplace\n",
            "[a]\nformula = replace\n",
            ErrorPolicy::Abort,
        );
        assert_eq!(h.calls(), vec!["remove a", "install a"]);
        assert_eq!(report.outcomes[0].status, FeatureStatus::Installed);
    }

    #[test]
    fn test_abort_stops_at_first_failure() {
        let h = Harness::new();
        let report = h.run(
            "",
            "[a]\nformula = inplace\n[b]\nformula = inplace\nfail = install\n[c]\nformula = inplace\n",
            ErrorPolicy::Abort,
        );

        assert_eq!(h.calls(), vec!["install a", "install b"]);
        assert_eq!(report.outcomes.len(), 2);
        match &report.halt {
            Some(Halt::Failed(err)) => {
                assert_eq!(err.name, "b");
                assert!(err.cause.contains("install exploded"));
            }
            other => panic!("unexpected halt: {other:?}"),
        }
    }

    #[test]
    fn test_continue_records_and_moves_on() {
        let h = Harness::new();
        let report = h.run(
            "[a]\nformula = inplace\nfail = remove\n[b]\nformula = inplace\n",
            "",
            ErrorPolicy::Continue,
        );

        assert_eq!(h.calls(), vec!["remove a", "remove b"]);
        assert!(report.is_complete());
        assert_eq!(report.summary.failed, 1);
        assert_eq!(report.summary.removed, 1);

        let failed = report.failures().next().unwrap();
        assert_eq!(failed.name, "a");
        assert_eq!(failed.config.as_ref().unwrap().get("fail"), Some("remove"));
        assert!(report.halt.is_none());
    }

    #[test]
    fn test_unknown_formula_is_feature_error() {
        let h = Harness::new();
        let report = h.run("", "[a]\nformula = ghost\n", ErrorPolicy::Abort);
        match &report.halt {
            Some(Halt::Failed(err)) => {
                assert_eq!(err.name, "a");
                assert!(err.to_string().contains("unknown formula 'ghost'"));
            }
            other => panic!("unexpected halt: {other:?}"),
        }
    }

    #[test]
    fn test_cancelled_before_start_runs_nothing() {
        let h = Harness::new();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let report = h.run_with("", "[a]\nformula = inplace\n", ErrorPolicy::Abort, &cancel);
        assert!(report.was_interrupted());
        assert!(report.outcomes.is_empty());
        assert!(h.calls().is_empty());
    }

    #[test]
    fn test_cancel_between_steps() {
        /// Cancels the token once the first feature completes
        struct CancelAfterFirst(CancellationToken);

        impl ProgressCallback for CancelAfterFirst {
            fn on_plan_start(&mut self, _changes: usize) {}
            fn on_feature_start(&mut self, _name: &str, _action: Action) {}
            fn on_feature_complete(&mut self, _outcome: &FeatureOutcome) {
                self.0.cancel();
            }
            fn on_plan_complete(&mut self, _summary: &RunSummary) {}
        }

        let h = Harness::new();
        let cancel = CancellationToken::new();
        let source = Manifest::empty();
        let target = Manifest::parse("[a]\nformula = inplace\n[b]\nformula = inplace\n").unwrap();
        let plan = ExecutionPlan::from_diff(source.diff(&target), &PlanOptions::default());

        let report = execute(
            &plan,
            &h.registry,
            &h.scope,
            ErrorPolicy::Abort,
            &cancel,
            &mut CancelAfterFirst(cancel.clone()),
        );

        assert!(report.was_interrupted());
        assert_eq!(h.calls(), vec!["install a"]);
        assert_eq!(report.outcomes.len(), 1);
    }

    #[test]
    fn test_failure_after_cancel_is_interrupt() {
        /// Cancels the token as a feature starts, like a Ctrl-C reaching its script
        struct CancelOnStart(CancellationToken);

        impl ProgressCallback for CancelOnStart {
            fn on_plan_start(&mut self, _changes: usize) {}
            fn on_feature_start(&mut self, _name: &str, _action: Action) {
                self.0.cancel();
            }
            fn on_feature_complete(&mut self, _outcome: &FeatureOutcome) {}
            fn on_plan_complete(&mut self, _summary: &RunSummary) {}
        }

        let h = Harness::new();
        let cancel = CancellationToken::new();
        let source = Manifest::parse("[a]\nformula = inplace\nfail = remove\n[b]\nformula = inplace\n").unwrap();
        let plan = ExecutionPlan::from_diff(source.diff(&Manifest::empty()), &PlanOptions::default());

        let report = execute(
            &plan,
            &h.registry,
            &h.scope,
            ErrorPolicy::Continue,
            &cancel,
            &mut CancelOnStart(cancel.clone()),
        );

        assert!(report.was_interrupted());
        assert_eq!(h.calls(), vec!["remove a"]);
        assert_eq!(report.summary.failed, 1);
    }
}
