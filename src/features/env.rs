//! Env feature - variables exported by the activation hook

use anyhow::Result;
use declarative::{Feature, FeatureContext, UpdatePath};
use manifest::{FORMULA_KEY, FeatureSchema, Section};

/// Key whose value is prepended to `PATH` instead of exported as-is
const PATH_KEY: &str = "path";

/// Every key other than `formula` becomes `export KEY="value"`
///
/// Values are double-quoted so `$HOME` and friends still expand when the
/// hook is sourced. The feature has no footprint of its own: install and
/// remove only log, and updates always apply in place.
#[derive(Debug)]
pub struct Env;

fn is_identifier(key: &str) -> bool {
    let mut chars = key.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn quote(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        if matches!(c, '"' | '\\' | '`') {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}

fn variables(config: &Section) -> impl Iterator<Item = (&str, &str)> {
    config.iter().filter(|(k, _)| *k != FORMULA_KEY)
}

impl Feature for Env {
    fn formula(&self) -> &'static str {
        "env"
    }

    fn description(&self) -> &'static str {
        "Export environment variables when the environment is active"
    }

    fn schema(&self) -> FeatureSchema {
        FeatureSchema::open(&[])
    }

    fn validate(&self, config: &Section) -> Vec<String> {
        variables(config)
            .filter(|(key, _)| *key != PATH_KEY && !is_identifier(key))
            .map(|(key, _)| format!("'{key}' is not a valid variable name"))
            .collect()
    }

    fn install(&self, ctx: &FeatureContext, config: &Section) -> Result<()> {
        log::debug!("{}: {} variables", ctx.name, variables(config).count());
        Ok(())
    }

    fn update(&self, _ctx: &FeatureContext, _old: &Section, _new: &Section) -> Result<UpdatePath> {
        Ok(UpdatePath::Applied)
    }

    fn remove(&self, ctx: &FeatureContext, _config: &Section) -> Result<()> {
        log::debug!("{}: variables dropped from the hook", ctx.name);
        Ok(())
    }

    fn hooks(&self, _ctx: &FeatureContext, config: &Section) -> Vec<String> {
        variables(config)
            .map(|(key, value)| {
                if key == PATH_KEY {
                    format!("export PATH={}:\"$PATH\"", quote(value))
                } else {
                    format!("export {key}={}", quote(value))
                }
            })
            .collect()
    }
}
