use anyhow::Result;
use colored::Colorize;
use declarative::FeatureStatus;
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::Context;
use crate::config::Settings;
use crate::directory::Directory;
use crate::ui;

#[derive(Debug, Serialize)]
struct EnvironmentInfo {
    namespace: String,
    path: PathBuf,
    source: Option<String>,
    features: usize,
    failed: Vec<String>,
}

fn describe(root: &Path, namespace: &str) -> crate::error::Result<EnvironmentInfo> {
    let directory = Directory::load(root, namespace)?;
    let manifest = directory.source()?;
    let states = directory.states()?;
    Ok(EnvironmentInfo {
        namespace: namespace.to_string(),
        path: directory.path().to_path_buf(),
        source: manifest.resolve_source_uri().map(str::to_string),
        features: states.count(FeatureStatus::Installed),
        failed: states.failed(),
    })
}

pub fn run(ctx: &Context, json: bool) -> Result<()> {
    let root = Settings::load()?.root()?;

    let mut environments = Vec::new();
    for namespace in Directory::list(&root)? {
        match describe(&root, &namespace) {
            Ok(info) => environments.push(info),
            Err(e) => log::warn!("Skipping '{namespace}': {e}"),
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&environments)?);
        return Ok(());
    }

    if environments.is_empty() {
        if !ctx.quiet {
            ui::info(&format!("No environments installed in {}", root.display()));
        }
        return Ok(());
    }

    ui::header("Environments");
    for env in &environments {
        let mut line = format!("{} ({} features)", env.namespace.bold(), env.features);
        if !env.failed.is_empty() {
            line.push_str(&format!(" {}", format!("{} failed", env.failed.len()).red()));
        }
        println!("  {line}");
        if ctx.verbose > 0 {
            ui::kv("path", &env.path.display().to_string());
            if let Some(source) = &env.source {
                ui::kv("source", source);
            }
            if !env.failed.is_empty() {
                ui::kv("failed", &env.failed.join(", "));
            }
        }
    }
    Ok(())
}
