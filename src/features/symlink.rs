//! Symlink feature - link a file or directory into place

use anyhow::{Context, Result, bail};
use declarative::{Feature, FeatureContext, UpdatePath};
use manifest::{FeatureSchema, Section};
use std::fs;
use std::path::{Path, PathBuf};

/// Creates `target` as a symlink to `source`
///
/// Only links this feature would have created are ever deleted; a regular
/// file at `target` is left alone unless `force = true`, in which case it
/// is moved aside to `<target>.sprinter-backup`.
#[derive(Debug)]
pub struct Symlink;

#[derive(Debug)]
struct Link {
    source: PathBuf,
    target: PathBuf,
    force: bool,
}

#[derive(Debug)]
enum LinkState {
    Missing,
    Correct,
    WrongTarget(PathBuf),
    FileExists,
}

impl Link {
    fn from_config(config: &Section) -> Result<Self> {
        let source = config.get("source").context("missing 'source'")?;
        let target = config.get("target").context("missing 'target'")?;
        Ok(Self {
            source: crate::paths::expand(source),
            target: crate::paths::expand(target),
            force: parse_bool(config.get("force"))?,
        })
    }

    fn check_current(&self) -> Result<LinkState> {
        let target = &self.target;

        if !target.exists() && !target.is_symlink() {
            return Ok(LinkState::Missing);
        }

        if target.is_symlink() {
            let link_target = fs::read_link(target).context("Failed to read symlink")?;

            // Canonicalize for comparison
            let expected = self.source.canonicalize().unwrap_or(self.source.clone());
            let actual = if link_target.is_absolute() {
                link_target.canonicalize().unwrap_or(link_target)
            } else {
                target
                    .parent()
                    .map(|p| p.join(&link_target))
                    .and_then(|p| p.canonicalize().ok())
                    .unwrap_or(link_target)
            };

            if expected == actual {
                Ok(LinkState::Correct)
            } else {
                Ok(LinkState::WrongTarget(actual))
            }
        } else {
            Ok(LinkState::FileExists)
        }
    }

    fn backup_path(&self) -> PathBuf {
        let mut name = self.target.as_os_str().to_os_string();
        name.push(".sprinter-backup");
        PathBuf::from(name)
    }

    fn create(&self) -> Result<()> {
        let (source, target) = (&self.source, &self.target);

        if !source.exists() {
            bail!("Source does not exist: {}", source.display());
        }

        match self.check_current()? {
            LinkState::Correct => return Ok(()),
            LinkState::Missing => {}
            LinkState::WrongTarget(actual) => {
                log::debug!("Relinking {} (was -> {})", target.display(), actual.display());
                fs::remove_file(target).with_context(|| {
                    format!("Failed to remove existing symlink: {}", target.display())
                })?;
            }
            LinkState::FileExists if self.force => {
                let backup = self.backup_path();
                log::warn!("Moving {} to {}", target.display(), backup.display());
                fs::rename(target, &backup)
                    .with_context(|| format!("Failed to back up {}", target.display()))?;
            }
            LinkState::FileExists => {
                bail!(
                    "{} already exists and is not a symlink (set force = true to replace it)",
                    target.display()
                );
            }
        }

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create parent directory: {}", parent.display())
            })?;
        }

        link(source, target)
    }

    fn remove(&self) -> Result<()> {
        match self.check_current()? {
            LinkState::Correct => {
                fs::remove_file(&self.target).with_context(|| {
                    format!("Failed to remove symlink: {}", self.target.display())
                })?;
                let backup = self.backup_path();
                if backup.exists() || backup.is_symlink() {
                    log::info!("Restoring {}", self.target.display());
                    fs::rename(&backup, &self.target).with_context(|| {
                        format!("Failed to restore {}", backup.display())
                    })?;
                }
                Ok(())
            }
            LinkState::Missing => Ok(()),
            LinkState::WrongTarget(actual) => {
                log::warn!(
                    "Leaving {}: it now points to {}",
                    self.target.display(),
                    actual.display()
                );
                Ok(())
            }
            LinkState::FileExists => {
                log::warn!("Leaving {}: it is not a symlink", self.target.display());
                Ok(())
            }
        }
    }
}

fn parse_bool(value: Option<&str>) -> Result<bool> {
    match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
        None | Some("false" | "no" | "0") => Ok(false),
        Some("true" | "yes" | "1") => Ok(true),
        Some(other) => bail!("expected true or false, got '{other}'"),
    }
}

fn link(source: &Path, target: &Path) -> Result<()> {
    #[cfg(unix)]
    std::os::unix::fs::symlink(source, target).with_context(|| {
        format!(
            "Failed to create symlink: {} -> {}",
            target.display(),
            source.display()
        )
    })?;

    #[cfg(windows)]
    {
        use std::os::windows::fs::{symlink_dir, symlink_file};

        if source.is_dir() {
            // Junctions need no admin privileges; fall back to symlink_dir
            match junction::create(source, target) {
                Ok(()) => (),
                Err(e) => {
                    log::debug!("Junction creation failed ({}), trying symlink_dir", e);
                    symlink_dir(source, target).with_context(|| {
                        format!(
                            "Failed to create directory symlink: {} -> {}",
                            target.display(),
                            source.display()
                        )
                    })?;
                }
            }
        } else {
            symlink_file(source, target).with_context(|| {
                format!(
                    "Failed to create file symlink: {} -> {}",
                    target.display(),
                    source.display()
                )
            })?;
        }
    }

    #[cfg(not(any(unix, windows)))]
    bail!("Symlinks not supported on this platform");

    Ok(())
}

impl Feature for Symlink {
    fn formula(&self) -> &'static str {
        "symlink"
    }

    fn description(&self) -> &'static str {
        "Symlink a file or directory into place"
    }

    fn schema(&self) -> FeatureSchema {
        FeatureSchema::new(&["source", "target"], &["force"])
    }

    fn validate(&self, config: &Section) -> Vec<String> {
        match parse_bool(config.get("force")) {
            Ok(_) => Vec::new(),
            Err(e) => vec![format!("force: {e}")],
        }
    }

    fn install(&self, _ctx: &FeatureContext, config: &Section) -> Result<()> {
        Link::from_config(config)?.create()
    }

    fn update(&self, _ctx: &FeatureContext, old: &Section, new: &Section) -> Result<UpdatePath> {
        let old = Link::from_config(old)?;
        let new = Link::from_config(new)?;
        if old.target != new.target {
            old.remove()?;
        }
        new.create()?;
        Ok(UpdatePath::Applied)
    }

    fn remove(&self, _ctx: &FeatureContext, config: &Section) -> Result<()> {
        Link::from_config(config)?.remove()
    }
}
