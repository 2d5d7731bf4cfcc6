//! Persisted state of one installed environment

use chrono::{DateTime, Utc};
use declarative::{FeatureOutcome, FeatureStatus};
use manifest::Section;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Current layout version of `state.toml`
pub const STATE_FORMAT: u32 = 1;

// ============================================================================
// State Structures
// ============================================================================

/// Contents of `state.toml`
///
/// The last-applied manifest text lives in the same file as the feature
/// table so both are replaced by a single rename.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateFile {
    /// Layout version
    pub format: u32,

    /// Namespace this state belongs to
    pub namespace: String,

    /// When the manifest was last committed
    pub committed_at: DateTime<Utc>,

    /// Serialized last-applied manifest
    pub manifest: String,

    /// Per-feature records
    #[serde(default)]
    pub features: StateTable,
}

/// Last known state of one feature
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureRecord {
    pub status: FeatureStatus,

    /// Config last applied, or attempted when the feature failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<Section>,

    /// Cause of the last failure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    pub updated_at: DateTime<Utc>,
}

/// Feature name → record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateTable {
    records: BTreeMap<String, FeatureRecord>,
}

impl StateTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&FeatureRecord> {
        self.records.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FeatureRecord)> {
        self.records.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    // ========================================================================
    // Record Helpers
    // ========================================================================

    /// Mark a feature as installed with `config`
    pub fn mark_installed(&mut self, name: &str, config: Option<Section>) {
        self.set(name, FeatureStatus::Installed, config, None);
    }

    /// Mark a feature as failed, keeping the config that was attempted
    pub fn mark_failed(&mut self, name: &str, config: Option<Section>, error: &str) {
        self.set(name, FeatureStatus::Failed, config, Some(error.to_string()));
    }

    /// Mark a feature as removed
    pub fn mark_removed(&mut self, name: &str, config: Option<Section>) {
        self.set(name, FeatureStatus::Removed, config, None);
    }

    fn set(
        &mut self,
        name: &str,
        status: FeatureStatus,
        config: Option<Section>,
        error: Option<String>,
    ) {
        self.records.insert(
            name.to_string(),
            FeatureRecord {
                status,
                config,
                error,
                updated_at: Utc::now(),
            },
        );
    }

    /// Fold runner outcomes into the table
    pub fn apply_outcomes(&mut self, outcomes: &[FeatureOutcome]) {
        for outcome in outcomes {
            match outcome.status {
                FeatureStatus::Installed => {
                    self.mark_installed(&outcome.name, outcome.config.clone());
                }
                FeatureStatus::Removed => {
                    self.mark_removed(&outcome.name, outcome.config.clone());
                }
                FeatureStatus::Failed => self.mark_failed(
                    &outcome.name,
                    outcome.config.clone(),
                    outcome.error.as_deref().unwrap_or("unknown error"),
                ),
            }
        }
    }

    /// Drop records of features that are gone
    pub fn prune_removed(&mut self) {
        self.records
            .retain(|_, record| record.status != FeatureStatus::Removed);
    }

    /// Names of features whose last run failed
    pub fn failed(&self) -> Vec<String> {
        self.records
            .iter()
            .filter(|(_, r)| r.status == FeatureStatus::Failed)
            .map(|(name, _)| name.clone())
            .collect()
    }

    pub fn count(&self, status: FeatureStatus) -> usize {
        self.records.values().filter(|r| r.status == status).count()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use declarative::Action;

    fn section(pairs: &[(&str, &str)]) -> Section {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_mark_helpers() {
        let mut table = StateTable::new();
        table.mark_installed("a", Some(section(&[("formula", "command")])));
        table.mark_failed("b", None, "boom");
        table.mark_removed("c", None);

        assert_eq!(table.len(), 3);
        assert_eq!(table.failed(), vec!["b".to_string()]);
        assert_eq!(table.get("b").unwrap().error.as_deref(), Some("boom"));
        assert_eq!(table.count(FeatureStatus::Installed), 1);

        table.prune_removed();
        assert!(table.get("c").is_none());

        // A later success clears the failure
        table.mark_installed("b", None);
        assert!(table.failed().is_empty());
        assert!(table.get("b").unwrap().error.is_none());
    }

    #[test]
    fn test_apply_outcomes() {
        let mut table = StateTable::new();
        table.apply_outcomes(&[
            FeatureOutcome {
                name: "a".into(),
                action: Action::Install,
                status: FeatureStatus::Installed,
                config: Some(section(&[("v", "1")])),
                error: None,
            },
            FeatureOutcome {
                name: "b".into(),
                action: Action::Update,
                status: FeatureStatus::Failed,
                config: Some(section(&[("v", "2")])),
                error: Some("exit status 1".into()),
            },
        ]);

        assert_eq!(table.get("a").unwrap().status, FeatureStatus::Installed);
        let b = table.get("b").unwrap();
        assert_eq!(b.status, FeatureStatus::Failed);
        assert_eq!(b.config.as_ref().unwrap().get("v"), Some("2"));
    }

    #[test]
    fn test_state_file_toml_roundtrip() {
        let mut features = StateTable::new();
        features.mark_installed("git", Some(section(&[("formula", "command"), ("install", "true")])));
        features.mark_failed("vim", None, "exit status 2");

        let state = StateFile {
            format: STATE_FORMAT,
            namespace: "tools".into(),
            committed_at: Utc::now(),
            manifest: "[git]\nformula = command\ninstall = true\n".into(),
            features,
        };

        let text = toml::to_string_pretty(&state).unwrap();
        assert!(text.contains("namespace = \"tools\""));
        assert!(text.contains("[features.git]"));

        let parsed: StateFile = toml::from_str(&text).unwrap();
        assert_eq!(parsed.namespace, "tools");
        assert_eq!(parsed.manifest, state.manifest);
        assert_eq!(parsed.features, state.features);
    }
}
