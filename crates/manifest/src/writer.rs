//! Writer for the sectioned manifest format.
//!
//! Output parses back into an equal manifest.

use crate::types::Section;
use crate::{CONFIG_SECTION, Manifest};

/// Indentation used for continuation lines of multi-line values
const CONTINUATION_INDENT: &str = "    ";

/// Write a manifest to a string.
pub fn write_string(manifest: &Manifest) -> String {
    let mut output = String::new();
    let mut first_section = true;

    if !manifest.config().is_empty() {
        write_section(&mut output, CONFIG_SECTION, manifest.config());
        first_section = false;
    }

    for feature in manifest.features() {
        if !first_section {
            output.push('\n');
        }
        first_section = false;
        write_section(&mut output, &feature.name, &feature.config);
    }

    output
}

fn write_section(output: &mut String, name: &str, section: &Section) {
    output.push_str(&format!("[{name}]\n"));
    for (key, value) in section.iter() {
        let mut lines = value.lines();
        output.push_str(&format!("{key} = {}\n", lines.next().unwrap_or_default()));
        for line in lines {
            let line = line.trim();
            if !line.is_empty() {
                output.push_str(CONTINUATION_INDENT);
                output.push_str(line);
            }
            output.push('\n');
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_str;

    #[test]
    fn test_write_config_first() {
        let manifest = parse_str("[a]\nformula = command\n[config]\nnamespace = ns\n").unwrap();
        let text = write_string(&manifest);
        assert!(text.starts_with("[config]\nnamespace = ns\n"));
        assert!(text.contains("[a]\nformula = command\n"));
    }

    #[test]
    fn test_round_trip_multiline() {
        let original =
            parse_str("[a]\nformula = command\ninstall = echo one\n  echo two\n").unwrap();
        let reparsed = parse_str(&write_string(&original)).unwrap();
        assert_eq!(original, reparsed);
        assert_eq!(
            reparsed.feature("a").unwrap().get("install"),
            Some("echo one\necho two")
        );
    }

    #[test]
    fn test_round_trip_script_with_comment_and_blank_line() {
        let original = parse_str(
            "[a]\nformula = command\ninstall = echo a\n    # note\n\n    echo b\n[b]\nformula = command\n",
        )
        .unwrap();
        let text = write_string(&original);
        assert!(text.contains("install = echo a\n    # note\n\n    echo b\n"));
        assert_eq!(parse_str(&text).unwrap(), original);
    }

    #[test]
    fn test_round_trip_diffs_unchanged() {
        let original = parse_str(
            "[config]\nnamespace = ns\n\n[a]\nformula = command\ninstall = true\n\n[b]\nformula = env\nPATH = ~/bin\n",
        )
        .unwrap();
        let reparsed = parse_str(&write_string(&original)).unwrap();
        for diff in original.diff(&reparsed) {
            assert_eq!(diff.state, crate::FeatureState::Unchanged, "{}", diff.name);
        }
    }
}
