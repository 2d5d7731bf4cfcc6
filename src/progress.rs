//! Terminal progress for feature runs

use crate::ui;
use colored::Colorize;
use declarative::{Action, FeatureOutcome, FeatureStatus, ProgressCallback, RunSummary};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Create a spinner with a message
pub fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.blue} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

fn verb(action: Action) -> &'static str {
    match action {
        Action::Install => "Installing",
        Action::Update => "Updating",
        Action::Remove => "Removing",
        Action::Skip => "Checking",
    }
}

/// One spinner per feature, replaced by a ✓ or ✗ line when it finishes
///
/// With `plain` set no spinner is drawn, so feature scripts can write to
/// the terminal directly.
pub struct Spinners {
    current: Option<ProgressBar>,
    step: usize,
    total: usize,
    plain: bool,
    quiet: bool,
}

impl Spinners {
    pub fn new(plain: bool, quiet: bool) -> Self {
        Self {
            current: None,
            step: 0,
            total: 0,
            plain,
            quiet,
        }
    }
}

impl ProgressCallback for Spinners {
    fn on_plan_start(&mut self, changes: usize) {
        self.step = 0;
        self.total = changes;
        if changes == 0 && !self.quiet {
            ui::dim("Nothing to change");
        }
    }

    fn on_feature_start(&mut self, name: &str, action: Action) {
        self.step += 1;
        if self.quiet {
            return;
        }
        let msg = format!(
            "{} {} {}",
            format!("[{}/{}]", self.step, self.total).blue().bold(),
            verb(action),
            name.bold()
        );
        if self.plain {
            println!("{msg}");
        } else {
            self.current = Some(spinner(&msg));
        }
    }

    fn on_feature_complete(&mut self, outcome: &FeatureOutcome) {
        if let Some(pb) = self.current.take() {
            pb.finish_and_clear();
        }
        if self.quiet || outcome.action == Action::Skip {
            return;
        }
        match outcome.status {
            FeatureStatus::Installed | FeatureStatus::Removed => {
                ui::success(&format!("{} ({})", outcome.name, outcome.action));
            }
            FeatureStatus::Failed => {
                let cause = outcome.error.as_deref().unwrap_or("unknown error");
                ui::error(&format!("{}: {cause}", outcome.name));
            }
        }
    }

    fn on_plan_complete(&mut self, _summary: &RunSummary) {
        if let Some(pb) = self.current.take() {
            pb.finish_and_clear();
        }
    }
}
