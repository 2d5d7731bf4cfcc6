//! Centralized path resolution for sprinter
//!
//! # Environment Variables
//!
//! - `SPRINTER_CONFIG_DIR` - Override config directory
//! - `SPRINTER_ROOT` - Override the directory holding installed environments
//! - `SPRINTER_RC_FILES` - Colon-separated shell rc files used by activate/deactivate
//! - `SPRINTER_DEBUG_LOG` - Override the debug log written on failure
//!
//! # Path Resolution Priority
//!
//! For config_dir():
//! 1. `SPRINTER_CONFIG_DIR` environment variable
//! 2. `XDG_CONFIG_HOME/sprinter` (if set)
//! 3. `~/.config/sprinter`
//!
//! The environment root is resolved in [`crate::config::Settings`] because the
//! config file may set it too.

use anyhow::{Context, Result};
use std::path::PathBuf;

/// Environment variable for config directory override
pub const ENV_CONFIG_DIR: &str = "SPRINTER_CONFIG_DIR";

/// Environment variable for the environment root override
pub const ENV_ROOT: &str = "SPRINTER_ROOT";

/// Environment variable for the rc file list override
pub const ENV_RC_FILES: &str = "SPRINTER_RC_FILES";

/// Environment variable for the debug log path override
pub const ENV_DEBUG_LOG: &str = "SPRINTER_DEBUG_LOG";

/// Where the diagnostic log goes when a command fails
pub const DEFAULT_DEBUG_LOG: &str = "/tmp/sprinter.log";

/// Get the sprinter config directory path
pub fn config_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(ENV_CONFIG_DIR) {
        let path = expand(&dir);
        log::debug!(
            "Using config dir from {}: {}",
            ENV_CONFIG_DIR,
            path.display()
        );
        return Ok(path);
    }

    if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
        let path = PathBuf::from(xdg_config).join("sprinter");
        log::debug!("Using XDG_CONFIG_HOME: {}", path.display());
        return Ok(path);
    }

    let home = home_dir()?;
    Ok(home.join(".config").join("sprinter"))
}

/// Default environment root: `~/.sprinter`
pub fn default_root() -> Result<PathBuf> {
    Ok(home_dir()?.join(".sprinter"))
}

/// Shell rc files activation writes to when nothing is configured
pub fn default_rc_files() -> Result<Vec<PathBuf>> {
    let home = home_dir()?;
    Ok(vec![
        home.join(".bashrc"),
        home.join(".bash_profile"),
        home.join(".zshrc"),
    ])
}

/// Path of the debug log written when a command fails
pub fn debug_log() -> PathBuf {
    match std::env::var(ENV_DEBUG_LOG) {
        Ok(path) if !path.is_empty() => expand(&path),
        _ => PathBuf::from(DEFAULT_DEBUG_LOG),
    }
}

fn home_dir() -> Result<PathBuf> {
    dirs::home_dir().context("Could not determine home directory")
}

/// Expand ~ and environment variables in a path string.
///
/// This is the canonical path expansion function for sprinter. All modules
/// should use this instead of calling shellexpand directly.
pub fn expand(path: &str) -> PathBuf {
    let expanded = shellexpand::full(path).unwrap_or(std::borrow::Cow::Borrowed(path));
    PathBuf::from(expanded.as_ref())
}

// ============================================================================
// Tests
// ============================================================================
