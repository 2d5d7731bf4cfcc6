//! Registry of feature implementations keyed by formula

use crate::feature::{BoxedFeature, Feature};
use anyhow::{Result, anyhow};
use manifest::{FORMULA_KEY, FeatureSchema, Manifest, SchemaProvider, Section};
use std::collections::BTreeMap;

/// Maps `formula` tags to feature implementations
#[derive(Debug, Default)]
pub struct FeatureRegistry {
    features: BTreeMap<&'static str, BoxedFeature>,
}

impl FeatureRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an implementation, replacing any previous one with the same formula
    pub fn register<F: Feature + 'static>(&mut self, feature: F) {
        let formula = feature.formula();
        if self.features.insert(formula, Box::new(feature)).is_some() {
            log::debug!("Replaced feature implementation for '{formula}'");
        }
    }

    /// Builder form of [`register`](Self::register)
    pub fn with<F: Feature + 'static>(mut self, feature: F) -> Self {
        self.register(feature);
        self
    }

    pub fn get(&self, formula: &str) -> Option<&dyn Feature> {
        self.features.get(formula).map(|f| f.as_ref())
    }

    /// Implementation named by a section's `formula` key
    pub fn resolve(&self, config: &Section) -> Result<&dyn Feature> {
        let formula = config
            .formula()
            .ok_or_else(|| anyhow!("section has no '{FORMULA_KEY}' key"))?;
        self.get(formula)
            .ok_or_else(|| anyhow!("unknown formula '{formula}'"))
    }

    /// Registered formula tags, sorted
    pub fn formulas(&self) -> Vec<&'static str> {
        self.features.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// `name (description)` for every registered formula
    pub fn describe(&self) -> String {
        self.formulas()
            .into_iter()
            .filter_map(|formula| {
                self.get(formula)
                    .map(|f| format!("{formula} ({})", f.description()))
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Schema validation plus every feature's own checks
    ///
    /// Feature-level checks only run for sections whose formula resolves,
    /// so each problem is reported once. A manifest naming an unknown
    /// formula also gets the list of known ones.
    pub fn validate_manifest(&self, manifest: &Manifest) -> Vec<String> {
        let mut errors = manifest.validate(self);
        let unknown_formula = manifest
            .features()
            .iter()
            .filter_map(|spec| spec.config.formula())
            .any(|formula| self.get(formula).is_none());

        for spec in manifest.features() {
            let Ok(feature) = self.resolve(&spec.config) else {
                continue;
            };
            errors.extend(
                feature
                    .validate(&spec.config)
                    .into_iter()
                    .map(|msg| format!("feature '{}': {msg}", spec.name)),
            );
        }

        if unknown_formula {
            errors.push(format!("known formulas: {}", self.describe()));
        }
        errors
    }
}

impl SchemaProvider for FeatureRegistry {
    fn schema(&self, formula: &str) -> Option<FeatureSchema> {
        self.get(formula).map(|f| f.schema())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::FeatureContext;

    #[derive(Debug)]
    struct Echo;

    impl Feature for Echo {
        fn formula(&self) -> &'static str {
            "echo"
        }

        fn description(&self) -> &'static str {
            "Echo test feature"
        }

        fn schema(&self) -> FeatureSchema {
            FeatureSchema::new(&["text"], &[])
        }

        fn validate(&self, config: &Section) -> Vec<String> {
            match config.get("text") {
                Some(text) if text.len() > 10 => vec!["text is too long".into()],
                _ => Vec::new(),
            }
        }

        fn install(&self, _ctx: &FeatureContext, _config: &Section) -> Result<()> {
            Ok(())
        }

        fn remove(&self, _ctx: &FeatureContext, _config: &Section) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_resolve() {
        let registry = FeatureRegistry::new().with(Echo);
        assert_eq!(registry.formulas(), vec!["echo"]);

        let mut config = Section::new();
        assert!(registry.resolve(&config).is_err());

        config.insert(FORMULA_KEY, "echo");
        assert_eq!(registry.resolve(&config).unwrap().formula(), "echo");

        config.insert(FORMULA_KEY, "nope");
        let err = registry.resolve(&config).unwrap_err();
        assert!(err.to_string().contains("unknown formula 'nope'"));
    }

    #[test]
    fn test_validate_manifest_runs_feature_checks() {
        let registry = FeatureRegistry::new().with(Echo);
        let manifest = Manifest::parse(
            "[a]\nformula = echo\ntext = much too long here\n[b]\nformula = other\n",
        )
        .unwrap();

        let errors = registry.validate_manifest(&manifest);
        assert_eq!(
            errors,
            vec![
                "feature 'b' uses unknown formula 'other'".to_string(),
                "feature 'a': text is too long".to_string(),
                "known formulas: echo (Echo test feature)".to_string(),
            ]
        );
    }

    #[test]
    fn test_known_formulas_only_listed_when_needed() {
        let registry = FeatureRegistry::new().with(Echo);
        let manifest = Manifest::parse("[a]\nformula = echo\ntext = hi\n").unwrap();
        assert!(registry.validate_manifest(&manifest).is_empty());
        assert_eq!(registry.describe(), "echo (Echo test feature)");
    }
}
