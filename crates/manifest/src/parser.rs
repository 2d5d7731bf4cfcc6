//! Parser for the sectioned manifest format.
//!
//! ```text
//! [config]
//! namespace = tools
//! source = https://example.com/tools.cfg
//!
//! [git]
//! formula = command
//! install = brew install git
//! remove = brew uninstall git
//! ```
//!
//! Indented lines continue the previous value, joined with a newline.
//! Inside a value, indented `#` lines and blank lines are kept as script
//! text.

use crate::error::{Error, Result};
use crate::types::{FeatureSpec, Section};
use crate::{CONFIG_SECTION, Manifest};
use std::path::Path;

/// Which section subsequent key/value lines belong to
#[derive(Debug, Clone, Copy)]
enum Current {
    None,
    Config,
    Feature(usize),
}

/// Parse a manifest from a file path.
pub fn parse_file(path: &Path) -> Result<Manifest> {
    let content = std::fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_str(&content)
}

/// Parse a manifest from a string.
pub fn parse_str(content: &str) -> Result<Manifest> {
    let mut config = Section::new();
    let mut features: Vec<FeatureSpec> = Vec::new();
    let mut seen_config = false;
    let mut current = Current::None;
    let mut last_key: Option<String> = None;
    // Blank lines inside a multi-line value, kept only if more follows
    let mut pending_blank = 0;

    for (idx, raw) in content.lines().enumerate() {
        let line_num = idx + 1;
        let trimmed = raw.trim();

        if trimmed.is_empty() {
            if last_key.is_some() {
                pending_blank += 1;
            }
            continue;
        }

        // Continuation of the previous value; may itself start with '#' or ';'
        if raw.starts_with(char::is_whitespace)
            && let Some(key) = &last_key
        {
            if let Some(section) = section_mut(&mut config, &mut features, current) {
                for _ in 0..pending_blank {
                    section.append_line(key, "");
                }
                section.append_line(key, trimmed);
            }
            pending_blank = 0;
            continue;
        }
        pending_blank = 0;

        if trimmed.starts_with('#') || trimmed.starts_with(';') {
            continue;
        }

        if let Some(header) = trimmed.strip_prefix('[') {
            let name = header.strip_suffix(']').ok_or_else(|| Error::Parse {
                line: line_num,
                message: "unterminated section header".to_string(),
            })?;
            let name = name.trim();

            if name.is_empty() {
                return Err(Error::Parse {
                    line: line_num,
                    message: "empty section name".to_string(),
                });
            }

            if name == CONFIG_SECTION {
                if seen_config {
                    return Err(Error::Parse {
                        line: line_num,
                        message: format!("duplicate [{CONFIG_SECTION}] section"),
                    });
                }
                seen_config = true;
                current = Current::Config;
            } else {
                if features.iter().any(|f| f.name == name) {
                    return Err(Error::Parse {
                        line: line_num,
                        message: format!("duplicate feature [{name}]"),
                    });
                }
                features.push(FeatureSpec::new(name, Section::new()));
                current = Current::Feature(features.len() - 1);
            }

            last_key = None;
            continue;
        }

        let (key, value) = split_key_value(trimmed).ok_or_else(|| Error::Parse {
            line: line_num,
            message: format!("expected 'key = value', found '{trimmed}'"),
        })?;

        if key.is_empty() {
            return Err(Error::Parse {
                line: line_num,
                message: "empty key".to_string(),
            });
        }

        let section =
            section_mut(&mut config, &mut features, current).ok_or_else(|| Error::Parse {
                line: line_num,
                message: format!("'{key}' appears before any section header"),
            })?;

        if section.contains_key(key) {
            return Err(Error::Parse {
                line: line_num,
                message: format!("duplicate key '{key}'"),
            });
        }

        section.insert(key, value);
        last_key = Some(key.to_string());
    }

    Ok(Manifest::from_parts(config, features))
}

fn section_mut<'a>(
    config: &'a mut Section,
    features: &'a mut [FeatureSpec],
    current: Current,
) -> Option<&'a mut Section> {
    match current {
        Current::None => None,
        Current::Config => Some(config),
        Current::Feature(idx) => features.get_mut(idx).map(|f| &mut f.config),
    }
}

/// Split `key = value` or `key: value`; the first separator wins.
fn split_key_value(line: &str) -> Option<(&str, &str)> {
    let pos = line.find(['=', ':'])?;
    Some((line[..pos].trim(), line[pos + 1..].trim()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r"
# developer tools
[config]
namespace = tools
source = https://example.com/tools.cfg

[git]
formula = command
install = brew install git
remove: brew uninstall git

[setup]
formula = command
install = echo one
    echo two
; trailing comment
";

    #[test]
    fn test_parse_sections_in_order() {
        let manifest = parse_str(SAMPLE).unwrap();
        assert_eq!(manifest.namespace(), Some("tools"));
        assert_eq!(
            manifest.resolve_source_uri(),
            Some("https://example.com/tools.cfg")
        );
        assert_eq!(manifest.feature_names(), vec!["git", "setup"]);

        let git = manifest.feature("git").unwrap();
        assert_eq!(git.formula(), Some("command"));
        assert_eq!(git.get("remove"), Some("brew uninstall git"));
    }

    #[test]
    fn test_parse_continuation_lines() {
        let manifest = parse_str(SAMPLE).unwrap();
        let setup = manifest.feature("setup").unwrap();
        assert_eq!(setup.get("install"), Some("echo one\necho two"));
    }

    #[test]
    fn test_continuation_keeps_comments_and_blank_lines() {
        let text = "[a]\ninstall = echo a\n    # note\n\n    echo b\n\n# top-level comment\n[b]\nx = 1\n";
        let manifest = parse_str(text).unwrap();
        assert_eq!(
            manifest.feature("a").unwrap().get("install"),
            Some("echo a\n# note\n\necho b")
        );
        assert_eq!(manifest.feature("b").unwrap().get("x"), Some("1"));
    }

    #[test]
    fn test_comment_after_key_is_not_continuation() {
        let manifest = parse_str("[a]\nx = 1\n# just a comment\ny = 2\n").unwrap();
        let a = manifest.feature("a").unwrap();
        assert_eq!(a.get("x"), Some("1"));
        assert_eq!(a.get("y"), Some("2"));
    }

    #[test]
    fn test_value_may_contain_separators() {
        let manifest = parse_str("[a]\nurl = https://example.com/x?y=1\n").unwrap();
        assert_eq!(
            manifest.feature("a").unwrap().get("url"),
            Some("https://example.com/x?y=1")
        );
    }

    #[test]
    fn test_duplicate_feature_is_error() {
        let err = parse_str("[a]\nformula = command\n[a]\nformula = command\n").unwrap_err();
        match err {
            Error::Parse { line, message } => {
                assert_eq!(line, 3);
                assert!(message.contains("duplicate feature"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_duplicate_key_is_error() {
        let err = parse_str("[a]\nx = 1\nx = 2\n").unwrap_err();
        assert!(matches!(err, Error::Parse { line: 3, .. }));
    }

    #[test]
    fn test_key_before_section_is_error() {
        let err = parse_str("x = 1\n[a]\n").unwrap_err();
        assert!(matches!(err, Error::Parse { line: 1, .. }));
    }

    #[test]
    fn test_unterminated_header_is_error() {
        let err = parse_str("[a\nx = 1\n").unwrap_err();
        assert!(matches!(err, Error::Parse { line: 1, .. }));
    }

    #[test]
    fn test_garbage_line_is_error() {
        let err = parse_str("[a]\njust words\n").unwrap_err();
        assert!(matches!(err, Error::Parse { line: 2, .. }));
    }

    #[test]
    fn test_empty_document() {
        let manifest = parse_str("# nothing here\n\n").unwrap();
        assert!(manifest.is_empty());
        assert!(manifest.namespace().is_none());
    }
}
