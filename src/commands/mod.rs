//! Command implementations
//!
//! Each subcommand builds one [`Environment`] from the user settings,
//! runs a single lifecycle operation on it and prints the outcome.

pub mod environments;
pub mod install;
pub mod lifecycle;
pub mod update;
pub mod validate;

use anyhow::{Context as AnyhowContext, Result};
use manifest::{FetchOptions, Manifest};

use crate::Context;
use crate::cli::FetchArgs;
use crate::config::Settings;
use crate::environment::{Environment, Report};
use crate::progress::Spinners;
use crate::{credentials, features, interrupt, ui};

/// Build the environment orchestrator for one command
pub(crate) fn environment(ctx: &Context, settings: &Settings) -> Result<Environment> {
    let root = settings.root()?;
    log::debug!("Environment root: {}", root.display());

    Ok(Environment::new(root, features::registry())
        .with_rc_files(settings.rc_files()?)
        .with_cancellation(interrupt::token())
        .with_progress(Box::new(Spinners::new(ctx.verbose > 0, ctx.quiet)))
        .verbose(ctx.verbose > 0))
}

/// Fetch and parse the manifest at `target`
pub(crate) fn load_manifest(settings: &Settings, target: &str, fetch: &FetchArgs) -> Result<Manifest> {
    let credentials = credentials::resolve(&fetch.credentials.supplied(), target)?;
    let opts = FetchOptions::default()
        .with_credentials(credentials)
        .verify_certificate(!fetch.allow_bad_certificate)
        .timeout(settings.fetch_timeout());

    Manifest::load(target, &opts).with_context(|| format!("Could not load manifest '{target}'"))
}

/// Print the summary and warnings of a finished command
pub(crate) fn print_report(ctx: &Context, report: &Report) {
    if ctx.quiet {
        return;
    }
    if report.run.summary.total() > 0 {
        ui::summary(&report.run.summary);
    }
    for warning in &report.warnings {
        ui::warn(warning);
    }
}
