//! Error types for environment lifecycle operations

use crate::environment::Phase;
use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by the environment lifecycle
#[derive(Debug, Error)]
pub enum Error {
    /// The manifest failed validation; nothing was changed
    #[error("manifest is invalid:\n  - {}", .0.join("\n  - "))]
    Invalid(Vec<String>),

    #[error("environment '{0}' is already installed (use `sprinter update {0}`)")]
    AlreadyInstalled(String),

    #[error("environment '{0}' is not installed")]
    NotFound(String),

    #[error("interrupted during {phase}")]
    Interrupted { phase: Phase },

    #[error("no namespace given and none could be derived from the manifest")]
    NoNamespace,

    #[error("environment '{0}' does not record an upstream source; pass --target")]
    NoUpstream(String),

    #[error(transparent)]
    Manifest(#[from] manifest::Error),

    #[error(transparent)]
    Feature(#[from] declarative::FeatureError),

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("corrupt state file {path}: {message}")]
    State { path: PathBuf, message: String },
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this error came from a user interrupt
    pub fn is_interrupted(&self) -> bool {
        matches!(self, Self::Interrupted { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
