mod activation;
mod cli;
mod commands;
mod config;
mod credentials;
mod directory;
mod environment;
mod error;
mod features;
mod interrupt;
mod logging;
mod paths;
mod progress;
mod runner;
mod state;
mod ui;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Command};
use std::io;
use std::process::ExitCode;

/// Global context for the application
pub struct Context {
    pub verbose: u8,
    pub quiet: bool,
}

fn run(ctx: &Context, command: Command) -> Result<()> {
    match command {
        Command::Install(args) => commands::install::run(ctx, args),
        Command::Update(args) => commands::update::run(ctx, args),
        Command::Remove { namespace } => commands::lifecycle::remove(ctx, &namespace),
        Command::Activate { namespace } => commands::lifecycle::activate(ctx, &namespace),
        Command::Deactivate { namespace } => commands::lifecycle::deactivate(ctx, &namespace),
        Command::Validate(args) => commands::validate::run(ctx, args),
        Command::Environments { json } => commands::environments::run(ctx, json),
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "sprinter", &mut io::stdout());
            Ok(())
        }
    }
}

fn is_interrupted(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        cause
            .downcast_ref::<error::Error>()
            .is_some_and(error::Error::is_interrupted)
    })
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    logging::init(logging::level(cli.verbose, cli.quiet));
    interrupt::install();

    let ctx = Context {
        verbose: cli.verbose,
        quiet: cli.quiet,
    };

    let Err(err) = run(&ctx, cli.command) else {
        return ExitCode::SUCCESS;
    };

    let interrupted = is_interrupted(&err);
    log::debug!("Command failed: {err:?}");

    let log_path = paths::debug_log();
    let command_line = std::env::args().collect::<Vec<_>>().join(" ");
    let wrote_log = match logging::write_debug_log(&log_path, &command_line, &err) {
        Ok(()) => true,
        Err(e) => {
            log::warn!("Could not write debug log {}: {e}", log_path.display());
            false
        }
    };

    ui::error(&format!("{err:#}"));
    if wrote_log {
        eprintln!("  Debug log written to {}", log_path.display());
    }

    if interrupted {
        ExitCode::from(interrupt::EXIT_INTERRUPTED as u8)
    } else {
        ExitCode::FAILURE
    }
}
