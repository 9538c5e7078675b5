//! Text normalization for similarity comparison

use std::collections::BTreeSet;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Normalize free text for token comparison
///
/// - Removes diacritics
/// - Replaces punctuation with spaces
/// - Converts to lowercase
/// - Collapses whitespace
pub(crate) fn normalize_text(text: &str) -> String {
    let stripped: String = text
        // Unicode normalize (NFKD to separate combining characters)
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();

    collapse_whitespace(&stripped.to_lowercase())
}

/// Collapse runs of whitespace into single spaces and trim the ends
fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Tokens of a normalized string, sorted and de-duplicated
pub(crate) fn token_set(text: &str) -> BTreeSet<String> {
    normalize_text(text)
        .split(' ')
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Tokens of a normalized string, sorted (duplicates kept)
pub(crate) fn sorted_tokens(text: &str) -> Vec<String> {
    let mut tokens: Vec<String> = normalize_text(text)
        .split(' ')
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect();
    tokens.sort();
    tokens
}

/// Split a delimited category list into a set of trimmed, non-empty items
pub(crate) fn split_set(value: &str, delimiter: char) -> BTreeSet<&str> {
    value
        .split(delimiter)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// The set of distinct characters of a string
pub(crate) fn char_set(value: &str) -> BTreeSet<char> {
    value.chars().collect()
}
