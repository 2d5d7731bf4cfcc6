//! Error types for the manifest crate

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading or building a manifest
#[derive(Error, Debug)]
pub enum Error {
    /// Manifest source could not be reached or read
    #[error("could not fetch manifest from {location}: {message}")]
    Fetch { location: String, message: String },

    /// Remote source rejected the supplied credentials
    #[error("credentials rejected by {location} (HTTP {status})")]
    Auth { location: String, status: u16 },

    /// Malformed manifest document
    #[error("invalid manifest at line {line}: {message}")]
    Parse { line: usize, message: String },

    /// IO error while reading a local manifest
    #[error("IO error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// Whether the error came from the network or filesystem rather than the document
    pub fn is_fetch(&self) -> bool {
        matches!(self, Self::Fetch { .. } | Self::Auth { .. } | Self::Io { .. })
    }
}

/// Result type for manifest operations
pub type Result<T> = std::result::Result<T, Error>;
