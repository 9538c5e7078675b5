//! Similarity scoring between the two values of a twin attribute

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::collections::BTreeSet;
use strsim::{levenshtein, normalized_levenshtein};

use super::normalization::{char_set, sorted_tokens, split_set, token_set};

/// Date layouts accepted for date-of-birth values
const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%d.%m.%Y", "%m/%d/%Y"];

/// Timestamp layouts whose date part is used
const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Days per year used by the age approximation (leap days are ignored)
const DAYS_PER_YEAR: i64 = 365;

/// Jaccard similarity of two sets
///
/// Two empty sets are identical (1.0); an empty set shares nothing with a
/// non-empty one (0.0).
pub fn jaccard<T: Ord>(a: &BTreeSet<T>, b: &BTreeSet<T>) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }

    let intersection = a.intersection(b).count();
    let union = a.len() + b.len() - intersection;
    intersection as f64 / union as f64
}

/// Jaccard similarity of two delimited category lists, e.g. `"US,CA"`
pub fn delimited_jaccard(a: &str, b: &str, delimiter: char) -> f64 {
    jaccard(&split_set(a, delimiter), &split_set(b, delimiter))
}

/// Jaccard similarity of the character sets of two strings
///
/// Sequence is ignored, so `"123"` and `"321"` score 1.0.
pub fn char_jaccard(a: &str, b: &str) -> f64 {
    jaccard(&char_set(a), &char_set(b))
}

/// Edit-based ratio of two strings on a 0-100 scale
fn ratio(a: &str, b: &str) -> f64 {
    normalized_levenshtein(a, b) * 100.0
}

/// Score for a pair where at least one side has no tokens
fn empty_token_score(a_empty: bool, b_empty: bool) -> Option<i64> {
    match (a_empty, b_empty) {
        (true, true) => Some(100),
        (true, false) | (false, true) => Some(0),
        (false, false) => None,
    }
}

/// Token-set fuzzy ratio (0-100)
///
/// Shared tokens are compared against each side's full sorted token list,
/// so word order never matters and a string whose tokens are a subset of
/// the other's scores 100. Spelling differences in the unshared tokens cost
/// proportionally to their edit distance.
pub fn token_set_ratio(a: &str, b: &str) -> i64 {
    let tokens_a = token_set(a);
    let tokens_b = token_set(b);

    if let Some(score) = empty_token_score(tokens_a.is_empty(), tokens_b.is_empty()) {
        return score;
    }

    let join = |tokens: Vec<&String>| {
        tokens
            .into_iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(" ")
    };

    let sect = join(tokens_a.intersection(&tokens_b).collect());
    let only_a = join(tokens_a.difference(&tokens_b).collect());
    let only_b = join(tokens_b.difference(&tokens_a).collect());

    let combined_a = format!("{} {}", sect, only_a).trim().to_string();
    let combined_b = format!("{} {}", sect, only_b).trim().to_string();

    let best = [
        ratio(&sect, &combined_a),
        ratio(&sect, &combined_b),
        ratio(&combined_a, &combined_b),
    ]
    .into_iter()
    .fold(0.0_f64, f64::max);

    best.round() as i64
}

/// Token-sort fuzzy ratio (0-100): tokens are sorted before comparison
pub fn token_sort_ratio(a: &str, b: &str) -> i64 {
    let tokens_a = sorted_tokens(a);
    let tokens_b = sorted_tokens(b);

    if let Some(score) = empty_token_score(tokens_a.is_empty(), tokens_b.is_empty()) {
        return score;
    }

    ratio(&tokens_a.join(" "), &tokens_b.join(" ")).round() as i64
}

/// `100 - levenshtein(a, b)`, optionally clamped to `[0, 100]`
pub fn edit_complement(a: &str, b: &str, clamp: bool) -> i64 {
    let distance = i64::try_from(levenshtein(a, b)).unwrap_or(i64::MAX);
    let score = 100_i64.saturating_sub(distance);
    if clamp {
        score.clamp(0, 100)
    } else {
        score
    }
}

/// Parse a date value, accepting plain dates and timestamps
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
                .map(|dt| dt.date())
        })
        .or_else(|| {
            DateTime::parse_from_rfc3339(value)
                .ok()
                .map(|dt| dt.date_naive())
        })
}

/// Parse a date in `format` first, falling back to the built-in layouts
pub fn parse_date_as(value: &str, format: Option<&str>) -> Option<NaiveDate> {
    format
        .and_then(|fmt| NaiveDate::parse_from_str(value.trim(), fmt).ok())
        .or_else(|| parse_date(value))
}

/// Absolute difference between two dates in whole years
pub fn year_difference(a: NaiveDate, b: NaiveDate) -> i64 {
    (a - b).num_days().abs() / DAYS_PER_YEAR
}
