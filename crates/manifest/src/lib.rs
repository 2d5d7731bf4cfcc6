//! # Manifest
//!
//! Declarative environment manifests.
//!
//! A manifest is a sectioned document describing the features of one
//! environment. This crate provides functionality to:
//! - Load manifests from local files or HTTP(S) sources (optionally with
//!   basic-auth credentials)
//! - Parse and serialize the sectioned format, preserving feature order
//! - Diff a source manifest against a target manifest
//! - Validate features against schemas supplied by the caller
//!
//! ## Example
//!
//! ```no_run
//! use manifest::{FeatureState, FetchOptions, Manifest};
//!
//! let installed = Manifest::load("~/.sprinter/tools/manifest.cfg", &FetchOptions::default())?;
//! let target = Manifest::load("https://example.com/tools.cfg", &FetchOptions::default())?;
//!
//! for diff in installed.diff(&target) {
//!     if diff.state != FeatureState::Unchanged {
//!         println!("{}: {}", diff.name, diff.state);
//!     }
//! }
//! # Ok::<(), manifest::Error>(())
//! ```

mod diff;
mod error;
mod fetch;
mod parser;
mod types;
mod validate;
mod writer;

pub use diff::{FeatureDiff, FeatureState};
pub use error::{Error, Result};
pub use fetch::{Credentials, DEFAULT_TIMEOUT, FetchOptions};
pub use types::{FeatureSpec, Location, Section};
pub use validate::{FeatureSchema, SchemaProvider, is_valid_name};

use std::fmt;
use std::path::Path;

/// Name of the reserved section holding manifest-level settings
pub const CONFIG_SECTION: &str = "config";

/// Reserved feature key naming the feature type
pub const FORMULA_KEY: &str = "formula";

/// `[config]` key for the default namespace
pub const NAMESPACE_KEY: &str = "namespace";

/// `[config]` key for the canonical upstream location of the manifest
pub const SOURCE_KEY: &str = "source";

/// `[config]` key for the document version
pub const VERSION_KEY: &str = "version";

/// The only document version this crate understands
pub const SUPPORTED_VERSION: &str = "1";

/// A parsed manifest: manifest-level settings plus ordered feature sections
#[derive(Debug, Clone, Default)]
pub struct Manifest {
    location: Option<Location>,
    config: Section,
    features: Vec<FeatureSpec>,
}

impl Manifest {
    /// A manifest with no features, used as the other side of install and remove diffs
    pub fn empty() -> Self {
        Self::default()
    }

    pub(crate) fn from_parts(config: Section, features: Vec<FeatureSpec>) -> Self {
        Self {
            location: None,
            config,
            features,
        }
    }

    /// Parse manifest text
    pub fn parse(content: &str) -> Result<Self> {
        parser::parse_str(content)
    }

    /// Parse a local manifest file
    pub fn from_path(path: &Path) -> Result<Self> {
        let manifest = parser::parse_file(path)?;
        Ok(manifest.with_location(Location::Path(path.to_path_buf())))
    }

    /// Load a manifest from a local path or an HTTP(S) URI
    pub fn load(source: &str, opts: &FetchOptions) -> Result<Self> {
        let location = Location::parse(source);
        let content = fetch::fetch(&location, opts)?;
        let manifest = Self::parse(&content)?;
        log::debug!(
            "Loaded manifest from {} ({} features)",
            location,
            manifest.len()
        );
        Ok(manifest.with_location(location))
    }

    /// Attach the location this manifest was read from
    pub fn with_location(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    pub fn location(&self) -> Option<&Location> {
        self.location.as_ref()
    }

    /// Manifest-level settings (`[config]`)
    pub fn config(&self) -> &Section {
        &self.config
    }

    /// Namespace declared by the manifest itself
    pub fn namespace(&self) -> Option<&str> {
        self.config.get(NAMESPACE_KEY).filter(|s| !s.is_empty())
    }

    /// Canonical upstream location the manifest declares for itself
    pub fn resolve_source_uri(&self) -> Option<&str> {
        self.config.get(SOURCE_KEY).filter(|s| !s.is_empty())
    }

    /// Record an upstream location in `[config]`
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.config.insert(SOURCE_KEY, source);
        self
    }

    /// Document version (defaults to the supported version when absent)
    pub fn version(&self) -> &str {
        self.config.get(VERSION_KEY).unwrap_or(SUPPORTED_VERSION)
    }

    /// Features in declaration order
    pub fn features(&self) -> &[FeatureSpec] {
        &self.features
    }

    /// Config of a feature by name
    pub fn feature(&self, name: &str) -> Option<&Section> {
        self.features
            .iter()
            .find(|f| f.name == name)
            .map(|f| &f.config)
    }

    pub fn feature_names(&self) -> Vec<&str> {
        self.features.iter().map(|f| f.name.as_str()).collect()
    }

    /// Number of features
    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

impl PartialEq for Manifest {
    fn eq(&self, other: &Self) -> bool {
        self.config == other.config && self.features == other.features
    }
}

impl Eq for Manifest {}

impl fmt::Display for Manifest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&writer::write_string(self))
    }
}
