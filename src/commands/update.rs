use anyhow::{Context as AnyhowContext, Result};

use crate::Context;
use crate::cli::UpdateArgs;
use crate::config::Settings;
use crate::ui;

pub fn run(ctx: &Context, args: UpdateArgs) -> Result<()> {
    let settings = Settings::load()?;
    let mut env = super::environment(ctx, &settings)?;

    let target = match args.target {
        Some(target) => target,
        None => env.upstream(&args.namespace)?,
    };
    log::info!("Updating '{}' from {target}", args.namespace);
    let manifest = super::load_manifest(&settings, &target, &args.fetch)?;

    let report = env
        .update(&args.namespace, manifest, args.reconfigure)
        .with_context(|| format!("Failed to update '{}'", args.namespace))?;

    super::print_report(ctx, &report);
    if !ctx.quiet {
        if report.run.summary.total_changes() == 0 {
            ui::success(&format!("'{}' is up to date", report.namespace));
        } else {
            ui::success(&format!("Updated '{}'", report.namespace));
        }
    }
    Ok(())
}
