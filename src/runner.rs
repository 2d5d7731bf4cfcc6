use anyhow::{Context, Result, bail};
use std::path::Path;
use std::process::{Command, Stdio};

/// A shell script to run for a feature
#[derive(Debug, Clone)]
pub struct Script<'a> {
    pub script: &'a str,
    pub cwd: &'a Path,
    pub env: Vec<(&'static str, String)>,
    /// Show output live instead of capturing it
    pub inherit: bool,
}

impl<'a> Script<'a> {
    pub fn new(script: &'a str, cwd: &'a Path) -> Self {
        Self {
            script,
            cwd,
            env: Vec::new(),
            inherit: false,
        }
    }

    pub fn env(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.env.push((key, value.into()));
        self
    }

    pub fn inherit(mut self, inherit: bool) -> Self {
        self.inherit = inherit;
        self
    }

    /// Run with `sh -c`, failing on a non-zero exit
    pub fn run(&self) -> Result<()> {
        log::debug!("sh -c {:?} (in {})", self.script, self.cwd.display());

        let mut cmd = Command::new("sh");
        cmd.arg("-c")
            .arg(self.script)
            .current_dir(self.cwd)
            .envs(self.env.iter().map(|(k, v)| (*k, v.as_str())))
            .stdin(Stdio::null());

        if self.inherit {
            let status = cmd
                .stdout(Stdio::inherit())
                .stderr(Stdio::inherit())
                .status()
                .with_context(|| format!("Failed to execute: {}", self.script))?;
            if !status.success() {
                bail!("`{}` exited with {status}", first_line(self.script));
            }
            return Ok(());
        }

        let output = cmd
            .output()
            .with_context(|| format!("Failed to execute: {}", self.script))?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        if !stdout.trim().is_empty() {
            log::debug!("{}", stdout.trim_end());
        }

        if output.status.success() {
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!(
                "`{}` exited with {}: {}",
                first_line(self.script),
                output.status,
                stderr.trim()
            )
        }
    }
}

fn first_line(script: &str) -> &str {
    script.lines().next().unwrap_or(script).trim()
}
