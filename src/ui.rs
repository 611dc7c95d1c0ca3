use colored::Colorize;
use serde_json::Value;
use similar::{ChangeTag, TextDiff};

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
// Value Formatting
// ============================================================================

/// Placeholder shown for a missing value
pub const ABSENT: &str = "(absent)";

/// Format a value on one line: strings unquoted, null as `(absent)`
pub fn format_value(value: &Value) -> String {
    match value {
        Value::Null => ABSENT.to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Format an adapter key: strings as-is, arrays joined with `:`
pub fn format_key(key: &Value) -> String {
    match key {
        Value::Array(segments) if segments.iter().all(Value::is_string) => segments
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join(":"),
        other => format_value(other),
    }
}

/// Check if a change is better shown as a line diff than as `old → new`
pub fn is_structured(old: &Value, new: &Value) -> bool {
    let nested = |v: &Value| v.is_array() || v.is_object();
    nested(old) && nested(new)
}

/// Line diff of two values rendered as pretty JSON
///
/// Returns only the changed lines, tagged insert or delete.
pub fn value_diff(old: &Value, new: &Value) -> Vec<(ChangeTag, String)> {
    let old = serde_json::to_string_pretty(old).unwrap_or_else(|_| old.to_string());
    let new = serde_json::to_string_pretty(new).unwrap_or_else(|_| new.to_string());

    TextDiff::from_lines(&old, &new)
        .iter_all_changes()
        .filter(|change| change.tag() != ChangeTag::Equal)
        .map(|change| (change.tag(), change.value().trim_end().to_string()))
        .collect()
}

/// Print a value diff, indented
pub fn print_value_diff(indent: &str, old: &Value, new: &Value) {
    for (tag, line) in value_diff(old, new) {
        match tag {
            ChangeTag::Delete => println!("{}{}", indent, format!("- {line}").red()),
            ChangeTag::Insert => println!("{}{}", indent, format!("+ {line}").green()),
            ChangeTag::Equal => {}
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
