//! Data types for the manifest crate

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::path::{Path, PathBuf};

/// An ordered string-keyed section of a manifest
///
/// Keys keep their declaration order for serialization. Equality ignores
/// order: two sections are equal when they hold the same keys and values.
#[derive(Debug, Clone, Default)]
pub struct Section {
    entries: Vec<(String, String)>,
}

impl Section {
    /// Create an empty section
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a value by key
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Check whether a key is present
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    /// Insert or replace a value, returning the previous one
    ///
    /// A replaced key keeps its original position.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        let key = key.into();
        let value = value.into();
        if let Some((_, existing)) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            return Some(std::mem::replace(existing, value));
        }
        self.entries.push((key, value));
        None
    }

    /// Iterate over keys in declaration order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Iterate over key/value pairs in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The feature-type tag of this section, if declared
    pub fn formula(&self) -> Option<&str> {
        self.get(crate::FORMULA_KEY)
    }

    /// Append a continuation line to an existing value
    pub(crate) fn append_line(&mut self, key: &str, line: &str) {
        if let Some((_, value)) = self.entries.iter_mut().find(|(k, _)| k == key) {
            if !value.is_empty() {
                value.push('\n');
            }
            value.push_str(line);
        }
    }
}

impl PartialEq for Section {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|(k, v)| other.get(k) == Some(v))
    }
}

impl Eq for Section {}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Section {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut section = Section::new();
        for (k, v) in iter {
            section.insert(k, v);
        }
        section
    }
}

impl Serialize for Section {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Section {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct SectionVisitor;

        impl<'de> Visitor<'de> for SectionVisitor {
            type Value = Section;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of string keys to string values")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Section, A::Error> {
                let mut section = Section::new();
                while let Some((key, value)) = access.next_entry::<String, String>()? {
                    section.insert(key, value);
                }
                Ok(section)
            }
        }

        deserializer.deserialize_map(SectionVisitor)
    }
}

/// A named feature section of a manifest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureSpec {
    /// Feature name, unique within its manifest
    pub name: String,
    /// Key/value configuration, including the `formula` tag
    pub config: Section,
}

impl FeatureSpec {
    pub fn new(name: impl Into<String>, config: Section) -> Self {
        Self {
            name: name.into(),
            config,
        }
    }
}

/// Where a manifest was loaded from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    /// Local file
    Path(PathBuf),
    /// HTTP(S) URI
    Remote(String),
}

impl Location {
    /// Classify a source string as a remote URI or a local path
    pub fn parse(source: &str) -> Self {
        let trimmed = source.trim();
        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            Self::Remote(trimmed.to_string())
        } else {
            Self::Path(PathBuf::from(trimmed))
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Remote(_))
    }

    /// File stem of the last path segment, e.g. `tools` for `https://host/tools.cfg`
    pub fn file_stem(&self) -> Option<String> {
        match self {
            Self::Path(path) => path
                .file_stem()
                .map(|s| s.to_string_lossy().to_string()),
            Self::Remote(uri) => {
                let without_query = uri.split(['?', '#']).next().unwrap_or(uri);
                let after_scheme = without_query
                    .split_once("://")
                    .map_or(without_query, |(_, rest)| rest);
                let path = after_scheme.split_once('/').map_or("", |(_, p)| p);
                let segment = path.trim_end_matches('/').rsplit('/').next()?;
                if segment.is_empty() {
                    return None;
                }
                Path::new(segment)
                    .file_stem()
                    .map(|s| s.to_string_lossy().to_string())
            }
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(path) => write!(f, "{}", path.display()),
            Self::Remote(uri) => write!(f, "{uri}"),
        }
    }
}
