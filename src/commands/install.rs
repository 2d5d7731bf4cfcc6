use anyhow::{Context as AnyhowContext, Result};

use crate::Context;
use crate::cli::InstallArgs;
use crate::config::Settings;
use crate::directory::Directory;
use crate::ui;

pub fn run(ctx: &Context, args: InstallArgs) -> Result<()> {
    let settings = Settings::load()?;
    let target = super::load_manifest(&settings, &args.target, &args.fetch)?;
    let mut env = super::environment(ctx, &settings)?;

    let report = env
        .install(target, args.namespace.as_deref())
        .with_context(|| format!("Failed to install '{}'", args.target))?;

    super::print_report(ctx, &report);
    if !ctx.quiet {
        ui::success(&format!("Installed '{}'", report.namespace));
        let directory = Directory::load(&settings.root()?, &report.namespace)?;
        ui::dim(&format!(
            "Open a new shell or run: source {}",
            directory.hooks_path().display()
        ));
    }
    Ok(())
}
