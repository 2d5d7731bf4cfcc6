//! User settings (`config.toml` in the config directory)

use crate::paths;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Name of the settings file inside the config directory
pub const CONFIG_FILE: &str = "config.toml";

/// Settings file contents; every key is optional
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Directory holding installed environments
    pub root: Option<String>,
    /// Shell rc files activate/deactivate write to
    pub rc_files: Option<Vec<String>>,
    /// Timeout for remote manifest requests
    pub fetch_timeout_secs: Option<u64>,
}

impl Settings {
    /// Load settings from the config directory, or defaults if there is no file
    pub fn load() -> Result<Self> {
        let path = paths::config_dir()?.join(CONFIG_FILE);
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("No settings file at {}", path.display());
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Could not read {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("Invalid settings in {}", path.display()))
    }

    /// Environment root: `SPRINTER_ROOT`, then `root`, then `~/.sprinter`
    pub fn root(&self) -> Result<PathBuf> {
        if let Ok(dir) = std::env::var(paths::ENV_ROOT)
            && !dir.is_empty()
        {
            return Ok(paths::expand(&dir));
        }
        match &self.root {
            Some(root) => Ok(paths::expand(root)),
            None => paths::default_root(),
        }
    }

    /// Rc files for activation: `SPRINTER_RC_FILES`, then `rc_files`, then defaults
    pub fn rc_files(&self) -> Result<Vec<PathBuf>> {
        if let Ok(list) = std::env::var(paths::ENV_RC_FILES) {
            return Ok(list
                .split(':')
                .filter(|s| !s.trim().is_empty())
                .map(|s| paths::expand(s.trim()))
                .collect());
        }
        match &self.rc_files {
            Some(files) => Ok(files.iter().map(|f| paths::expand(f)).collect()),
            None => paths::default_rc_files(),
        }
    }

    pub fn fetch_timeout(&self) -> Duration {
        self.fetch_timeout_secs
            .map_or(manifest::DEFAULT_TIMEOUT, Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paths::tests::{with_env_var, without_env_var};
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_default() {
        let tmp = TempDir::new().unwrap();
        let settings = Settings::load_from(&tmp.path().join(CONFIG_FILE)).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.fetch_timeout(), manifest::DEFAULT_TIMEOUT);
    }

    #[test]
    fn test_load_from_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(CONFIG_FILE);
        fs::write(
            &path,
            "root = \"/opt/sprinter\"\nrc_files = [\"/home/me/.zshrc\"]\nfetch_timeout_secs = 5\n",
        )
        .unwrap();

        let settings = Settings::load_from(&path).unwrap();
        assert_eq!(settings.fetch_timeout(), Duration::from_secs(5));
        without_env_var(paths::ENV_ROOT, || {
            assert_eq!(settings.root().unwrap(), PathBuf::from("/opt/sprinter"));
        });
        without_env_var(paths::ENV_RC_FILES, || {
            assert_eq!(
                settings.rc_files().unwrap(),
                vec![PathBuf::from("/home/me/.zshrc")]
            );
        });
    }

    #[test]
    fn test_unknown_key_rejected() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(CONFIG_FILE);
        fs::write(&path, "rooot = \"/typo\"\n").unwrap();
        assert!(Settings::load_from(&path).is_err());
    }

    #[test]
    fn test_env_overrides_file() {
        let settings = Settings {
            root: Some("/from/file".into()),
            rc_files: Some(vec!["/from/file/rc".into()]),
            fetch_timeout_secs: None,
        };
        with_env_var(paths::ENV_ROOT, "/from/env", || {
            assert_eq!(settings.root().unwrap(), PathBuf::from("/from/env"));
        });
        with_env_var(paths::ENV_RC_FILES, "/a/.bashrc::/b/.zshrc", || {
            assert_eq!(
                settings.rc_files().unwrap(),
                vec![PathBuf::from("/a/.bashrc"), PathBuf::from("/b/.zshrc")]
            );
        });
    }
}
