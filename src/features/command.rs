//! Command feature - user-supplied shell snippets

use crate::runner::Script;
use anyhow::{Context, Result};
use declarative::{Feature, FeatureContext, UpdatePath};
use manifest::{FeatureSchema, Section};

/// Runs the section's `install`, `update`, `remove`, `activate` and
/// `deactivate` snippets with `sh -c` inside the feature directory.
/// `rc` lines are added to the activation hook.
#[derive(Debug)]
pub struct Command;

impl Command {
    fn run(&self, ctx: &FeatureContext, config: &Section, key: &str) -> Result<bool> {
        let Some(script) = config.get(key).filter(|s| !s.trim().is_empty()) else {
            return Ok(false);
        };
        let dir = ctx
            .ensure_work_dir()
            .with_context(|| format!("Failed to create {}", ctx.work_dir.display()))?;

        Script::new(script, dir)
            .env("SPRINTER_NAMESPACE", &ctx.namespace)
            .env("SPRINTER_FEATURE", &ctx.name)
            .env("SPRINTER_FEATURE_DIR", dir.display().to_string())
            .inherit(ctx.verbose)
            .run()
            .with_context(|| format!("{key} script failed"))?;
        Ok(true)
    }
}

impl Feature for Command {
    fn formula(&self) -> &'static str {
        "command"
    }

    fn description(&self) -> &'static str {
        "Run shell commands to install, update and remove"
    }

    fn schema(&self) -> FeatureSchema {
        FeatureSchema::new(
            &["install"],
            &["update", "remove", "activate", "deactivate", "rc"],
        )
    }

    fn install(&self, ctx: &FeatureContext, config: &Section) -> Result<()> {
        self.run(ctx, config, "install")?;
        Ok(())
    }

    fn update(&self, ctx: &FeatureContext, _old: &Section, new: &Section) -> Result<UpdatePath> {
        if self.run(ctx, new, "update")? {
            Ok(UpdatePath::Applied)
        } else {
            Ok(UpdatePath::Unsupported)
        }
    }

    fn remove(&self, ctx: &FeatureContext, config: &Section) -> Result<()> {
        self.run(ctx, config, "remove")?;
        Ok(())
    }

    fn activate(&self, ctx: &FeatureContext, config: &Section) -> Result<()> {
        self.run(ctx, config, "activate")?;
        Ok(())
    }

    fn deactivate(&self, ctx: &FeatureContext, config: &Section) -> Result<()> {
        self.run(ctx, config, "deactivate")?;
        Ok(())
    }

    fn hooks(&self, _ctx: &FeatureContext, config: &Section) -> Vec<String> {
        config
            .get("rc")
            .map(|rc| rc.lines().map(str::to_string).collect())
            .unwrap_or_default()
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use declarative::ExecutionScope;
    use tempfile::TempDir;

    fn section(pairs: &[(&str, &str)]) -> Section {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_install_runs_in_feature_dir() {
        let tmp = TempDir::new().unwrap();
        let ctx = ExecutionScope::new("tools", tmp.path()).context_for("git");

        let config = section(&[("install", "echo \"$SPRINTER_NAMESPACE/$SPRINTER_FEATURE\" > marker")]);
        Command.install(&ctx, &config).unwrap();

        let marker = std::fs::read_to_string(tmp.path().join("git").join("marker")).unwrap();
        assert_eq!(marker.trim(), "tools/git");
    }

    #[test]
    fn test_update_path_depends_on_update_key() {
        let tmp = TempDir::new().unwrap();
        let ctx = ExecutionScope::new("tools", tmp.path()).context_for("git");
        let old = section(&[("install", "true")]);

        let without = section(&[("install", "true")]);
        assert_eq!(
            Command.update(&ctx, &old, &without).unwrap(),
            UpdatePath::Unsupported
        );

        let with = section(&[("install", "true"), ("update", "touch updated")]);
        assert_eq!(Command.update(&ctx, &old, &with).unwrap(), UpdatePath::Applied);
        assert!(tmp.path().join("git").join("updated").exists());
    }

    #[test]
    fn test_failing_script_is_error() {
        let tmp = TempDir::new().unwrap();
        let ctx = ExecutionScope::new("tools", tmp.path()).context_for("bad");
        let err = Command
            .install(&ctx, &section(&[("install", "exit 7")]))
            .unwrap_err();
        assert!(format!("{err:#}").contains("install script failed"));
    }

    #[test]
    fn test_remove_without_script_is_noop() {
        let tmp = TempDir::new().unwrap();
        let ctx = ExecutionScope::new("tools", tmp.path()).context_for("git");
        Command.remove(&ctx, &section(&[("install", "true")])).unwrap();
        assert!(!ctx.work_dir.exists());
    }

    #[test]
    fn test_rc_lines_become_hooks() {
        let ctx = ExecutionScope::new("tools", "/nowhere").context_for("git");
        let config = section(&[("install", "true"), ("rc", "alias g=git\nexport EDITOR=vim")]);
        assert_eq!(
            Command.hooks(&ctx, &config),
            vec!["alias g=git".to_string(), "export EDITOR=vim".to_string()]
        );
    }
}
