//! Commands that act on an installed environment by namespace

use anyhow::{Context as AnyhowContext, Result};

use crate::Context;
use crate::config::Settings;
use crate::ui;

pub fn remove(ctx: &Context, namespace: &str) -> Result<()> {
    let settings = Settings::load()?;
    let mut env = super::environment(ctx, &settings)?;

    let report = env
        .remove(namespace)
        .with_context(|| format!("Failed to remove '{namespace}'"))?;

    super::print_report(ctx, &report);
    let failed: Vec<&str> = report.run.failures().map(|o| o.name.as_str()).collect();
    if failed.is_empty() {
        if !ctx.quiet {
            ui::success(&format!("Removed '{namespace}'"));
        }
    } else {
        ui::warn(&format!(
            "Removed '{namespace}', but these features may have left files behind: {}",
            failed.join(", ")
        ));
    }
    Ok(())
}

pub fn activate(ctx: &Context, namespace: &str) -> Result<()> {
    let settings = Settings::load()?;
    let mut env = super::environment(ctx, &settings)?;

    let report = env
        .activate(namespace)
        .with_context(|| format!("Failed to activate '{namespace}'"))?;

    super::print_report(ctx, &report);
    if !ctx.quiet {
        ui::success(&format!("Activated '{namespace}' (takes effect in new shells)"));
    }
    Ok(())
}

pub fn deactivate(ctx: &Context, namespace: &str) -> Result<()> {
    let settings = Settings::load()?;
    let mut env = super::environment(ctx, &settings)?;

    let report = env
        .deactivate(namespace)
        .with_context(|| format!("Failed to deactivate '{namespace}'"))?;

    super::print_report(ctx, &report);
    if !ctx.quiet {
        ui::success(&format!("Deactivated '{namespace}'"));
    }
    Ok(())
}
