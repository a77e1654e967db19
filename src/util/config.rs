//! Configuration file parsing utilities.
//!
//! This module provides helpers for parsing configuration files with common
//! patterns like comment skipping and key-value parsing.

/// What: Check if a line should be skipped (empty or comment).
///
/// Inputs:
/// - `line`: Line to check
///
/// Output:
/// - `true` if the line should be skipped, `false` otherwise
///
/// Details:
/// - Skips empty lines and lines starting with `#`, `//`, or `;`
#[must_use]
pub fn skip_comment_or_empty(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.is_empty()
        || trimmed.starts_with('#')
        || trimmed.starts_with("//")
        || trimmed.starts_with(';')
}

/// What: Parse a key-value pair from a line.
///
/// Inputs:
/// - `line`: Line containing key=value format
///
/// Output:
/// - `Some((key, value))` if parsing succeeds, `None` otherwise
///
/// Details:
/// - Splits on the first `=` character
/// - Normalizes the key to lowercase with `.`, `-` and spaces mapped to `_`
/// - Strips a trailing inline comment from the value
#[must_use]
pub fn parse_key_value(line: &str) -> Option<(String, String)> {
    let (key, value) = line.trim().split_once('=')?;
    let key = key.trim().to_lowercase().replace(['.', '-', ' '], "_");
    if key.is_empty() {
        return None;
    }
    Some((key, strip_inline_comment(value).to_string()))
}

/// What: Remove a trailing `# ...` or `// ...` comment from a value.
///
/// Details:
/// - A comment marker only counts when preceded by whitespace, so URLs such
///   as `https://galaxy.example` survive intact.
#[must_use]
pub fn strip_inline_comment(value: &str) -> &str {
    let mut end = value.len();
    for marker in [" #", "\t#", " //", "\t//"] {
        if let Some(i) = value.find(marker) {
            end = end.min(i);
        }
    }
    value[..end].trim()
}
