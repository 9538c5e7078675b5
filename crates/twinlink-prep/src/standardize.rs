//! Value standardization rules

use chrono::format::{Item, StrftimeItems};
use chrono::NaiveDate;
use std::fmt::Write;
use twinlink_features::parse_date;

/// Re-render a date in `format`, or `None` if the value is not a date or
/// `format` cannot render a date
pub fn format_date(value: &str, format: &str) -> Option<String> {
    parse_date(value).and_then(|date| render_date(date, format))
}

fn render_date(date: NaiveDate, format: &str) -> Option<String> {
    let mut out = String::new();
    write!(out, "{}", date.format(format)).ok()?;
    Some(out)
}

/// Check that `format` renders dates that parse back to the same day
///
/// Rejects invalid specifiers, time fields, and layouts that drop the year,
/// month or day.
pub fn is_valid_date_format(format: &str) -> bool {
    if format.is_empty() || StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
        return false;
    }
    // day above 12 so day/month swaps cannot round-trip
    let Some(sample) = NaiveDate::from_ymd_opt(1987, 11, 23) else {
        return false;
    };
    render_date(sample, format)
        .and_then(|text| NaiveDate::parse_from_str(&text, format).ok())
        == Some(sample)
}

/// Encode gender as `1` (male) or `0` (female); anything else is unknown
pub fn gender_code(value: &str) -> Option<i64> {
    match value.trim() {
        v if v.eq_ignore_ascii_case("m") => Some(1),
        v if v.eq_ignore_ascii_case("f") => Some(0),
        _ => None,
    }
}

/// Canonical city spelling: trimmed, upper case
pub fn normalize_city(value: &str) -> String {
    value.trim().to_uppercase()
}

/// True when `value` is a non-empty run of ASCII digits
pub(crate) fn is_digits(value: &str) -> bool {
    let value = value.trim();
    !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit())
}
