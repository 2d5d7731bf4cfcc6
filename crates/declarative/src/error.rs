//! Error types for feature execution

use thiserror::Error;

/// A single feature's install, update or remove failed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("feature '{name}' failed: {cause}")]
pub struct FeatureError {
    /// Name of the failing feature
    pub name: String,
    /// Human-readable cause, including the error chain
    pub cause: String,
}

impl FeatureError {
    pub fn new(name: impl Into<String>, cause: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cause: cause.into(),
        }
    }

    /// Wrap an implementation error, keeping its full context chain
    pub fn from_anyhow(name: &str, err: &anyhow::Error) -> Self {
        Self::new(name, format!("{err:#}"))
    }
}
