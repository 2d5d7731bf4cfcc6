//! Activation hook generation and shell rc injection
//!
//! Each activated namespace owns one marked block in every rc file:
//!
//! ```text
//! # >>> sprinter:tools >>>
//! [ -r "/home/me/.sprinter/tools/env.sh" ] && . "/home/me/.sprinter/tools/env.sh"
//! # <<< sprinter:tools <<<
//! ```

use std::fs;
use std::io;
use std::path::Path;

fn begin_marker(namespace: &str) -> String {
    format!("# >>> sprinter:{namespace} >>>")
}

fn end_marker(namespace: &str) -> String {
    format!("# <<< sprinter:{namespace} <<<")
}

/// Render `env.sh` from each feature's hook lines, in feature order
pub fn render_hooks<'a, I>(namespace: &str, features: I) -> String
where
    I: IntoIterator<Item = (&'a str, Vec<String>)>,
{
    let mut script = format!("# sprinter environment '{namespace}' (generated, do not edit)\n");
    for (name, lines) in features {
        if lines.is_empty() {
            continue;
        }
        script.push_str(&format!("\n# {name}\n"));
        for line in lines {
            script.push_str(&line);
            script.push('\n');
        }
    }
    script
}

/// The rc block sourcing a namespace's hook file
pub fn block(namespace: &str, hooks_path: &Path) -> String {
    let hooks = hooks_path.display();
    format!(
        "{}\n[ -r \"{hooks}\" ] && . \"{hooks}\"\n{}\n",
        begin_marker(namespace),
        end_marker(namespace)
    )
}

/// Content with the namespace block removed; `None` when there was none
fn strip_block(content: &str, namespace: &str) -> Option<String> {
    let begin = begin_marker(namespace);
    let end = end_marker(namespace);

    let mut out = String::with_capacity(content.len());
    let mut inside = false;
    let mut found = false;
    for line in content.lines() {
        if !inside && line.trim_end() == begin {
            inside = true;
            found = true;
            continue;
        }
        if inside {
            if line.trim_end() == end {
                inside = false;
            }
            continue;
        }
        out.push_str(line);
        out.push('\n');
    }
    found.then_some(out)
}

/// Add or refresh the namespace block in `rc`
///
/// Returns whether the file changed.
pub fn inject(rc: &Path, namespace: &str, hooks_path: &Path) -> io::Result<bool> {
    let content = match fs::read_to_string(rc) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(e),
    };

    let mut updated = strip_block(&content, namespace).unwrap_or_else(|| content.clone());
    if !updated.is_empty() && !updated.ends_with('\n') {
        updated.push('\n');
    }
    updated.push_str(&block(namespace, hooks_path));

    if updated == content {
        return Ok(false);
    }
    fs::write(rc, updated)?;
    log::debug!("Injected '{namespace}' into {}", rc.display());
    Ok(true)
}

/// Remove the namespace block from `rc`
///
/// Missing files and files without the block are left untouched.
pub fn clear(rc: &Path, namespace: &str) -> io::Result<bool> {
    let content = match fs::read_to_string(rc) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(e),
    };

    match strip_block(&content, namespace) {
        Some(stripped) => {
            fs::write(rc, stripped)?;
            log::debug!("Cleared '{namespace}' from {}", rc.display());
            Ok(true)
        }
        None => Ok(false),
    }
}

/// Whether `rc` currently carries the namespace block
pub fn is_injected(rc: &Path, namespace: &str) -> bool {
    let begin = begin_marker(namespace);
    fs::read_to_string(rc)
        .map(|content| content.lines().any(|l| l.trim_end() == begin))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_render_hooks_skips_empty() {
        let script = render_hooks(
            "tools",
            vec![
                ("a", vec!["export A=1".to_string()]),
                ("b", Vec::new()),
                ("c", vec!["alias g=git".to_string(), "export C=3".to_string()]),
            ],
        );
        assert!(script.starts_with("# sprinter environment 'tools'"));
        assert!(script.contains("\n# a\nexport A=1\n"));
        assert!(!script.contains("# b"));
        assert!(script.contains("\n# c\nalias g=git\nexport C=3\n"));
    }

    #[test]
    fn test_inject_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        let rc = tmp.path().join(".bashrc");
        fs::write(&rc, "export PATH=$PATH:/opt/bin").unwrap();
        let hooks = tmp.path().join("tools/env.sh");

        assert!(inject(&rc, "tools", &hooks).unwrap());
        let once = fs::read_to_string(&rc).unwrap();
        assert!(!inject(&rc, "tools", &hooks).unwrap());
        assert_eq!(fs::read_to_string(&rc).unwrap(), once);

        assert!(once.starts_with("export PATH=$PATH:/opt/bin\n"));
        assert_eq!(once.matches("sprinter:tools >>>").count(), 1);
        assert!(is_injected(&rc, "tools"));
    }

    #[test]
    fn test_clear_restores_other_content() {
        let tmp = TempDir::new().unwrap();
        let rc = tmp.path().join(".zshrc");
        fs::write(&rc, "alias ll='ls -l'\n").unwrap();
        let hooks = tmp.path().join("env.sh");

        inject(&rc, "tools", &hooks).unwrap();
        inject(&rc, "other", &hooks).unwrap();
        assert!(clear(&rc, "tools").unwrap());

        let content = fs::read_to_string(&rc).unwrap();
        assert!(content.starts_with("alias ll='ls -l'\n"));
        assert!(!is_injected(&rc, "tools"));
        assert!(is_injected(&rc, "other"));

        assert!(!clear(&rc, "tools").unwrap());
    }

    #[test]
    fn test_missing_rc_file() {
        let tmp = TempDir::new().unwrap();
        let rc = tmp.path().join(".profile");
        assert!(!clear(&rc, "tools").unwrap());
        assert!(!rc.exists());

        assert!(inject(&rc, "tools", Path::new("/x/env.sh")).unwrap());
        assert!(is_injected(&rc, "tools"));
    }
}
