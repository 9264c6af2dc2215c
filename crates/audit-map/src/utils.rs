//! Utility functions for header handling.

/// Form of a header that patterns are matched against: trimmed and lowercased.
pub fn normalize_header(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Find a header by exact name, falling back to a trimmed case-insensitive match.
pub fn find_column<'a>(columns: &'a [String], wanted: &str) -> Option<&'a str> {
    if let Some(exact) = columns.iter().find(|c| c.as_str() == wanted) {
        return Some(exact.as_str());
    }
    let wanted = normalize_header(wanted);
    columns
        .iter()
        .find(|c| normalize_header(c) == wanted)
        .map(String::as_str)
}
