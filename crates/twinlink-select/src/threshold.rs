//! Selection thresholds derived from the importance distribution

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::SelectionError;

/// Rule turning an importance vector into a cut-off value
///
/// Parsed from `"mean"`, `"median"`, `"<factor>*mean"`, `"<factor>*median"`
/// or a literal number.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Threshold {
    Mean,
    Median,
    ScaledMean(f64),
    ScaledMedian(f64),
    Value(f64),
}

impl Default for Threshold {
    fn default() -> Self {
        Threshold::Mean
    }
}

impl Threshold {
    /// Cut-off value for `importances`
    pub fn resolve(&self, importances: &[f64]) -> f64 {
        match *self {
            Threshold::Mean => mean(importances),
            Threshold::Median => median(importances),
            Threshold::ScaledMean(factor) => factor * mean(importances),
            Threshold::ScaledMedian(factor) => factor * median(importances),
            Threshold::Value(value) => value,
        }
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Median of `values`; the mean of the two middle values for even counts
pub fn median(values: &[f64]) -> f64 {
    let count = values.len();
    if count == 0 {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    if count % 2 == 0 {
        (sorted[count / 2 - 1] + sorted[count / 2]) / 2.0
    } else {
        sorted[count / 2]
    }
}

impl fmt::Display for Threshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Threshold::Mean => write!(f, "mean"),
            Threshold::Median => write!(f, "median"),
            Threshold::ScaledMean(k) => write!(f, "{}*mean", k),
            Threshold::ScaledMedian(k) => write!(f, "{}*median", k),
            Threshold::Value(v) => write!(f, "{}", v),
        }
    }
}

impl FromStr for Threshold {
    type Err = SelectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || SelectionError::InvalidThreshold(s.to_string());
        let parse_number = |text: &str| {
            text.trim()
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(invalid)
        };

        let spec = s.trim().to_ascii_lowercase();
        match spec.as_str() {
            "mean" => return Ok(Threshold::Mean),
            "median" => return Ok(Threshold::Median),
            _ => {}
        }

        if let Some((factor, base)) = spec.split_once('*') {
            let factor = parse_number(factor)?;
            return match base.trim() {
                "mean" => Ok(Threshold::ScaledMean(factor)),
                "median" => Ok(Threshold::ScaledMedian(factor)),
                _ => Err(invalid()),
            };
        }

        parse_number(&spec).map(Threshold::Value)
    }
}

impl TryFrom<String> for Threshold {
    type Error = SelectionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Threshold> for String {
    fn from(threshold: Threshold) -> Self {
        threshold.to_string()
    }
}
