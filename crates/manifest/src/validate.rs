//! Structural validation of manifests against feature schemas

use crate::{FORMULA_KEY, Manifest, SUPPORTED_VERSION};

/// Required and optional keys for one feature type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureSchema {
    /// Keys that must be present with a non-empty value
    pub required: &'static [&'static str],
    /// Keys that may be present
    pub optional: &'static [&'static str],
    /// Whether keys outside `required` and `optional` are accepted
    pub open: bool,
}

impl FeatureSchema {
    pub const fn new(required: &'static [&'static str], optional: &'static [&'static str]) -> Self {
        Self {
            required,
            optional,
            open: false,
        }
    }

    /// A schema accepting arbitrary extra keys
    pub const fn open(required: &'static [&'static str]) -> Self {
        Self {
            required,
            optional: &[],
            open: true,
        }
    }

    /// Whether a key is allowed by this schema
    pub fn allows(&self, key: &str) -> bool {
        self.open
            || key == FORMULA_KEY
            || self.required.contains(&key)
            || self.optional.contains(&key)
    }
}

/// Source of feature schemas, keyed by formula tag
pub trait SchemaProvider {
    /// Schema for a formula, or `None` if the formula is unknown
    fn schema(&self, formula: &str) -> Option<FeatureSchema>;
}

/// Names usable as namespaces and feature names (they become directory names)
pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
}

impl Manifest {
    /// Validate the manifest, returning human-readable problems
    ///
    /// An empty list means the manifest is valid. No feature is executed.
    pub fn validate(&self, schemas: &dyn SchemaProvider) -> Vec<String> {
        let mut errors = Vec::new();

        let version = self.version();
        if version != SUPPORTED_VERSION {
            errors.push(format!(
                "unsupported manifest version '{version}' (expected {SUPPORTED_VERSION})"
            ));
        }

        if let Some(namespace) = self.namespace()
            && !is_valid_name(namespace)
        {
            errors.push(format!(
                "invalid namespace '{namespace}': use letters, digits, '.', '_' or '-'"
            ));
        }

        for feature in self.features() {
            let name = &feature.name;

            if !is_valid_name(name) {
                errors.push(format!(
                    "invalid feature name '{name}': use letters, digits, '.', '_' or '-'"
                ));
            }

            let Some(formula) = feature.config.formula() else {
                errors.push(format!("feature '{name}' has no '{FORMULA_KEY}' key"));
                continue;
            };

            let Some(schema) = schemas.schema(formula) else {
                errors.push(format!("feature '{name}' uses unknown formula '{formula}'"));
                continue;
            };

            for key in schema.required {
                match feature.config.get(key) {
                    Some(value) if !value.trim().is_empty() => {}
                    Some(_) => errors.push(format!("feature '{name}': '{key}' must not be empty")),
                    None => errors.push(format!("feature '{name}': missing required key '{key}'")),
                }
            }

            for key in feature.config.keys() {
                if !schema.allows(key) {
                    errors.push(format!(
                        "feature '{name}': unknown key '{key}' for formula '{formula}'"
                    ));
                }
            }
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestSchemas;

    impl SchemaProvider for TestSchemas {
        fn schema(&self, formula: &str) -> Option<FeatureSchema> {
            match formula {
                "command" => Some(FeatureSchema::new(&["install"], &["remove"])),
                "env" => Some(FeatureSchema::open(&[])),
                _ => None,
            }
        }
    }

    fn errors(text: &str) -> Vec<String> {
        Manifest::parse(text).unwrap().validate(&TestSchemas)
    }

    #[test]
    fn test_valid_manifest() {
        let errs = errors(
            "[config]\nnamespace = tools\n[a]\nformula = command\ninstall = true\n[b]\nformula = env\nANY = thing\n",
        );
        assert!(errs.is_empty(), "{errs:?}");
    }

    #[test]
    fn test_missing_formula() {
        let errs = errors("[a]\ninstall = true\n");
        assert_eq!(errs, vec!["feature 'a' has no 'formula' key".to_string()]);
    }

    #[test]
    fn test_unknown_formula_is_error() {
        let errs = errors("[a]\nformula = teleport\n");
        assert_eq!(
            errs,
            vec!["feature 'a' uses unknown formula 'teleport'".to_string()]
        );
    }

    #[test]
    fn test_required_and_unknown_keys() {
        let errs = errors("[a]\nformula = command\ncolor = blue\n");
        assert_eq!(errs.len(), 2);
        assert!(errs.iter().any(|e| e.contains("missing required key 'install'")));
        assert!(errs.iter().any(|e| e.contains("unknown key 'color'")));
    }

    #[test]
    fn test_empty_required_value() {
        let errs = errors("[a]\nformula = command\ninstall =\n");
        assert_eq!(errs, vec!["feature 'a': 'install' must not be empty".to_string()]);
    }

    #[test]
    fn test_version_and_namespace() {
        let errs = errors("[config]\nversion = 2\nnamespace = ../etc\n");
        assert_eq!(errs.len(), 2);
        assert!(errs[0].contains("unsupported manifest version '2'"));
        assert!(errs[1].contains("invalid namespace"));
    }

    #[test]
    fn test_is_valid_name() {
        assert!(is_valid_name("my-tools_1.0"));
        assert!(!is_valid_name(""));
        assert!(!is_valid_name(".."));
        assert!(!is_valid_name("a/b"));
        assert!(!is_valid_name("with space"));
    }
}
