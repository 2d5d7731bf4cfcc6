use colored::Colorize;
use declarative::RunSummary;

/// Print an info message
pub fn info(msg: &str) {
    println!("{} {}", "ℹ".blue(), msg);
}

/// Print a success message
pub fn success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

/// Print a warning message
pub fn warn(msg: &str) {
    println!("{} {}", "⚠".yellow(), msg);
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

/// Print a dim/muted message
pub fn dim(msg: &str) {
    println!("  {}", msg.dimmed());
}

/// Print a header/title
pub fn header(title: &str) {
    println!();
    println!("{}", title.bold());
    println!("{}", "─".repeat(title.chars().count()).dimmed());
}

/// Print a key-value pair
pub fn kv(key: &str, value: &str) {
    println!("  {}: {}", key.dimmed(), value);
}

// ============================================================================
// Run Summary
// ============================================================================

/// One-line description of a run, e.g. "2 installed, 1 updated, 3 unchanged"
pub fn summary_line(summary: &RunSummary) -> String {
    let parts: Vec<String> = [
        (summary.installed, "installed"),
        (summary.updated, "updated"),
        (summary.removed, "removed"),
        (summary.unchanged, "unchanged"),
        (summary.failed, "failed"),
    ]
    .into_iter()
    .filter(|(count, _)| *count > 0)
    .map(|(count, label)| format!("{count} {label}"))
    .collect();

    if parts.is_empty() {
        "no features".to_string()
    } else {
        parts.join(", ")
    }
}

/// Print the summary of a run, in red when anything failed
pub fn summary(summary: &RunSummary) {
    let line = summary_line(summary);
    if summary.is_success() {
        println!("{} {}", "Summary:".bold(), line);
    } else {
        println!("{} {}", "Summary:".bold(), line.red());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_line_skips_zero_counts() {
        let summary = RunSummary {
            installed: 2,
            unchanged: 3,
            ..RunSummary::default()
        };
        assert_eq!(summary_line(&summary), "2 installed, 3 unchanged");
    }

    #[test]
    fn test_summary_line_empty() {
        assert_eq!(summary_line(&RunSummary::default()), "no features");
    }
}
