//! On-disk footprint of one installed environment
//!
//! ```text
//! <root>/<namespace>/
//!   state.toml      last-applied manifest text + feature records
//!   manifest.cfg    readable copy of the last-applied manifest
//!   env.sh          activation hook
//!   features/<name> per-feature working directories
//! ```
//!
//! `state.toml` is the commit point: a namespace counts as installed only
//! once it exists, and every write replaces it with a rename.

use crate::error::{Error, Result};
use crate::state::{STATE_FORMAT, StateFile, StateTable};
use chrono::Utc;
use manifest::Manifest;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

const STATE_FILE: &str = "state.toml";
const MANIFEST_FILE: &str = "manifest.cfg";
const HOOKS_FILE: &str = "env.sh";
const FEATURES_DIR: &str = "features";

/// Handle on `<root>/<namespace>`
#[derive(Debug, Clone)]
pub struct Directory {
    namespace: String,
    path: PathBuf,
}

impl Directory {
    /// Whether `namespace` has a committed state under `root`
    pub fn exists(root: &Path, namespace: &str) -> bool {
        root.join(namespace).join(STATE_FILE).is_file()
    }

    /// Create the footprint for a new namespace
    ///
    /// A leftover directory without a committed state (a crashed install)
    /// is cleared first.
    pub fn create(root: &Path, namespace: &str) -> Result<Self> {
        if Self::exists(root, namespace) {
            return Err(Error::AlreadyInstalled(namespace.to_string()));
        }

        let dir = Self::at(root, namespace);
        if dir.path.exists() {
            log::warn!(
                "Clearing uncommitted leftovers at {}",
                dir.path.display()
            );
            dir.remove()?;
        }

        let features = dir.features_dir();
        fs::create_dir_all(&features).map_err(|e| Error::io(&features, e))?;
        log::debug!("Created {}", dir.path.display());
        Ok(dir)
    }

    /// Open an installed namespace
    pub fn load(root: &Path, namespace: &str) -> Result<Self> {
        if !Self::exists(root, namespace) {
            return Err(Error::NotFound(namespace.to_string()));
        }
        Ok(Self::at(root, namespace))
    }

    fn at(root: &Path, namespace: &str) -> Self {
        Self {
            namespace: namespace.to_string(),
            path: root.join(namespace),
        }
    }

    /// Namespaces with a committed state under `root`, sorted
    pub fn list(root: &Path) -> Result<Vec<String>> {
        let entries = match fs::read_dir(root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(Error::io(root, e)),
        };

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| Error::io(root, e))?;
            if let Some(name) = entry.file_name().to_str()
                && Self::exists(root, name)
            {
                names.push(name.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn state_path(&self) -> PathBuf {
        self.path.join(STATE_FILE)
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.path.join(MANIFEST_FILE)
    }

    pub fn hooks_path(&self) -> PathBuf {
        self.path.join(HOOKS_FILE)
    }

    pub fn features_dir(&self) -> PathBuf {
        self.path.join(FEATURES_DIR)
    }

    // ========================================================================
    // Reading
    // ========================================================================

    fn read_state(&self) -> Result<StateFile> {
        let path = self.state_path();
        let content = fs::read_to_string(&path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => Error::NotFound(self.namespace.clone()),
            _ => Error::io(&path, e),
        })?;

        let state: StateFile = toml::from_str(&content).map_err(|e| Error::State {
            path: path.clone(),
            message: e.to_string(),
        })?;

        if state.format != STATE_FORMAT {
            return Err(Error::State {
                path,
                message: format!(
                    "unsupported state format {} (expected {STATE_FORMAT})",
                    state.format
                ),
            });
        }
        Ok(state)
    }

    /// The last fully applied manifest
    pub fn source(&self) -> Result<Manifest> {
        let state = self.read_state()?;
        Manifest::parse(&state.manifest).map_err(|e| Error::State {
            path: self.state_path(),
            message: format!("embedded manifest: {e}"),
        })
    }

    /// Per-feature records
    pub fn states(&self) -> Result<StateTable> {
        Ok(self.read_state()?.features)
    }

    // ========================================================================
    // Writing
    // ========================================================================

    /// Atomically record `manifest` as fully applied, with `states`
    pub fn commit(&self, manifest: &Manifest, states: &StateTable) -> Result<()> {
        let text = manifest.to_string();
        write_atomic(&self.manifest_path(), &text)?;

        let state = StateFile {
            format: STATE_FORMAT,
            namespace: self.namespace.clone(),
            committed_at: Utc::now(),
            manifest: text,
            features: states.clone(),
        };
        self.write_state(&state)?;
        log::debug!(
            "Committed '{}' ({} features)",
            self.namespace,
            manifest.len()
        );
        Ok(())
    }

    /// Replace the feature records, keeping the committed manifest
    pub fn record_states(&self, states: &StateTable) -> Result<()> {
        let mut state = self.read_state()?;
        state.features = states.clone();
        self.write_state(&state)
    }

    fn write_state(&self, state: &StateFile) -> Result<()> {
        let path = self.state_path();
        let content = toml::to_string_pretty(state).map_err(|e| Error::State {
            path: path.clone(),
            message: e.to_string(),
        })?;
        write_atomic(&path, &content)
    }

    /// Write the activation hook
    pub fn write_hooks(&self, script: &str) -> Result<()> {
        write_atomic(&self.hooks_path(), script)
    }

    /// Delete the whole footprint; removing a missing directory is not an error
    pub fn remove(&self) -> Result<()> {
        match fs::remove_dir_all(&self.path) {
            Ok(()) => {
                log::debug!("Removed {}", self.path.display());
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::io(&self.path, e)),
        }
    }
}

/// Write `content` beside `path` and rename it into place
fn write_atomic(path: &Path, content: &str) -> Result<()> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp = path.with_file_name(format!("{file_name}.tmp"));

    let write = || -> io::Result<()> {
        let mut file = fs::File::create(&tmp)?;
        file.write_all(content.as_bytes())?;
        file.sync_all()?;
        fs::rename(&tmp, path)
    };

    write().map_err(|e| {
        let _ = fs::remove_file(&tmp);
        Error::io(path, e)
    })
}
