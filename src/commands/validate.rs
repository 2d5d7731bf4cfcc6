use anyhow::Result;

use crate::Context;
use crate::cli::ValidateArgs;
use crate::config::Settings;
use crate::error::Error;
use crate::ui;

pub fn run(ctx: &Context, args: ValidateArgs) -> Result<()> {
    let settings = Settings::load()?;
    let manifest = super::load_manifest(&settings, &args.target, &args.fetch)?;
    let mut env = super::environment(ctx, &settings)?;

    let errors = env.validate(&manifest);
    if !errors.is_empty() {
        return Err(Error::Invalid(errors).into());
    }

    if !ctx.quiet {
        ui::success(&format!(
            "Manifest is valid ({} features)",
            manifest.features().len()
        ));
    }
    Ok(())
}
