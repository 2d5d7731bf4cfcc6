//! Structural diff between two manifests

use crate::Manifest;
use crate::types::Section;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Classification of a feature when moving from a source to a target manifest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeatureState {
    /// Present in target, absent in source
    Add,
    /// Present in source, absent in target
    Remove,
    /// Present in both with differing config
    Update,
    /// Present in both with identical config
    Unchanged,
}

impl fmt::Display for FeatureState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Add => "add",
            Self::Remove => "remove",
            Self::Update => "update",
            Self::Unchanged => "unchanged",
        };
        f.write_str(label)
    }
}

/// One feature's entry in a manifest diff
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureDiff {
    /// Feature name
    pub name: String,
    /// Classification
    pub state: FeatureState,
    /// Config in the source manifest
    pub old: Option<Section>,
    /// Config in the target manifest
    pub new: Option<Section>,
}

impl Manifest {
    /// Diff this (source) manifest against a target manifest
    ///
    /// Entries follow the target's declaration order for add, update and
    /// unchanged features, then the source-only features in source order as
    /// removals.
    pub fn diff(&self, target: &Manifest) -> Vec<FeatureDiff> {
        let mut diffs = Vec::with_capacity(target.len() + self.len());

        for feature in target.features() {
            let entry = match self.feature(&feature.name) {
                None => FeatureDiff {
                    name: feature.name.clone(),
                    state: FeatureState::Add,
                    old: None,
                    new: Some(feature.config.clone()),
                },
                Some(old) => FeatureDiff {
                    name: feature.name.clone(),
                    state: if *old == feature.config {
                        FeatureState::Unchanged
                    } else {
                        FeatureState::Update
                    },
                    old: Some(old.clone()),
                    new: Some(feature.config.clone()),
                },
            };
            diffs.push(entry);
        }

        for feature in self.features() {
            if target.feature(&feature.name).is_none() {
                diffs.push(FeatureDiff {
                    name: feature.name.clone(),
                    state: FeatureState::Remove,
                    old: Some(feature.config.clone()),
                    new: None,
                });
            }
        }

        diffs
    }
}
