//! Feature catalogue: which attribute each similarity feature compares and how

use serde::{Deserialize, Serialize};
use twinlink_io::ColumnType;

use crate::similarity::{
    char_jaccard, delimited_jaccard, edit_complement, parse_date_as, token_set_ratio,
    token_sort_ratio, year_difference,
};

/// Semantic family of a similarity feature, each with a fixed value range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureKind {
    /// Absolute numeric difference, `[0, ∞)`
    NumericDifference,
    /// Jaccard similarity of two sets, `[0, 1]`
    SetJaccard,
    /// Fuzzy token ratio, `[0, 100]`
    FuzzyTokenRatio,
    /// `100 - edit distance`, `[0, 100]` when clamped
    EditDistanceComplement,
}

impl FeatureKind {
    /// Inclusive value range of this kind
    pub fn range(&self, clamped: bool) -> (f64, f64) {
        match self {
            FeatureKind::NumericDifference => (0.0, f64::INFINITY),
            FeatureKind::SetJaccard => (0.0, 1.0),
            FeatureKind::FuzzyTokenRatio => (0.0, 100.0),
            FeatureKind::EditDistanceComplement if clamped => (0.0, 100.0),
            FeatureKind::EditDistanceComplement => (f64::NEG_INFINITY, 100.0),
        }
    }
}

/// How the two values of a twin attribute are compared
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Metric {
    /// Whole years between two dates
    YearDifference,
    /// Jaccard of delimiter-separated item sets
    DelimitedJaccard { delimiter: char },
    /// Jaccard of character sets
    CharacterJaccard,
    /// Token-set fuzzy ratio
    TokenSetRatio,
    /// Token-sort fuzzy ratio
    TokenSortRatio,
    /// `100 - levenshtein`
    EditComplement { clamp: bool },
}

/// A single computed feature value
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FeatureValue {
    Int(i64),
    Float(f64),
}

impl Metric {
    /// The feature kind produced by this metric
    pub fn kind(&self) -> FeatureKind {
        match self {
            Metric::YearDifference => FeatureKind::NumericDifference,
            Metric::DelimitedJaccard { .. } | Metric::CharacterJaccard => FeatureKind::SetJaccard,
            Metric::TokenSetRatio | Metric::TokenSortRatio => FeatureKind::FuzzyTokenRatio,
            Metric::EditComplement { .. } => FeatureKind::EditDistanceComplement,
        }
    }

    /// Column type of the produced values
    pub fn output_type(&self) -> ColumnType {
        match self.kind() {
            FeatureKind::SetJaccard => ColumnType::Float64,
            _ => ColumnType::Int64,
        }
    }

    /// Compare two non-null values
    ///
    /// Dates are read in `date_format` when given, then in the built-in
    /// layouts. Fails only when a value cannot be interpreted (an
    /// unparseable date).
    pub fn evaluate(
        &self,
        left: &str,
        right: &str,
        date_format: Option<&str>,
    ) -> Result<FeatureValue, String> {
        let value = match *self {
            Metric::YearDifference => {
                let a = parse_date_as(left, date_format)
                    .ok_or_else(|| "unrecognized date".to_string())?;
                let b = parse_date_as(right, date_format)
                    .ok_or_else(|| "unrecognized date".to_string())?;
                FeatureValue::Int(year_difference(a, b))
            }
            Metric::DelimitedJaccard { delimiter } => {
                FeatureValue::Float(delimited_jaccard(left, right, delimiter))
            }
            Metric::CharacterJaccard => FeatureValue::Float(char_jaccard(left, right)),
            Metric::TokenSetRatio => FeatureValue::Int(token_set_ratio(left, right)),
            Metric::TokenSortRatio => FeatureValue::Int(token_sort_ratio(left, right)),
            Metric::EditComplement { clamp } => FeatureValue::Int(edit_complement(left, right, clamp)),
        };
        Ok(value)
    }
}

/// A derived feature: output name, source attribute and metric
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureSpec {
    /// Output column name
    pub name: &'static str,
    /// Accepted base names of the twin attribute, in lookup order
    pub attributes: &'static [&'static str],
    /// Comparison metric
    pub metric: Metric,
    /// Whether a missing twin pair is an error (otherwise the feature is skipped)
    pub required: bool,
}

impl FeatureSpec {
    /// Feature kind of this spec
    pub fn kind(&self) -> FeatureKind {
        self.metric.kind()
    }
}

/// Suffix of the base name under which the cleaner keeps dates as read
pub const RAW_SUFFIX: &str = "_raw";

pub const DATE_OF_BIRTH: &[&str] = &["date_of_birth", "dob"];
/// Dates as read take precedence over standardized ones
pub const DATE_OF_BIRTH_AS_READ: &[&str] =
    &["date_of_birth_raw", "dob_raw", "date_of_birth", "dob"];
pub const CITIZENSHIP: &[&str] = &["citizenship"];
pub const MARITAL_STATUS: &[&str] = &["marital_status"];
pub const ADDRESS_STREET: &[&str] = &["address_street"];
pub const IDENTIFICATION_NUMBER: &[&str] = &["identification_number", "id_num"];
pub const NAME: &[&str] = &["name"];

/// Base name of the as-read copy of `base`
pub fn raw_attribute(base: &str) -> String {
    format!("{}{}", base, RAW_SUFFIX)
}

/// The standard feature set, in output order
pub fn standard_features(clamp_dob_sim: bool, include_name_sim: bool) -> Vec<FeatureSpec> {
    let mut features = vec![
        FeatureSpec {
            name: "age_diff",
            attributes: DATE_OF_BIRTH,
            metric: Metric::YearDifference,
            required: true,
        },
        FeatureSpec {
            name: "citizenship_sim",
            attributes: CITIZENSHIP,
            metric: Metric::DelimitedJaccard { delimiter: ',' },
            required: true,
        },
        FeatureSpec {
            name: "marital_status_sim",
            attributes: MARITAL_STATUS,
            metric: Metric::DelimitedJaccard { delimiter: ',' },
            required: true,
        },
        FeatureSpec {
            name: "address_street_sim",
            attributes: ADDRESS_STREET,
            metric: Metric::TokenSetRatio,
            required: true,
        },
        FeatureSpec {
            name: "id_num_sim",
            attributes: IDENTIFICATION_NUMBER,
            metric: Metric::CharacterJaccard,
            required: true,
        },
        FeatureSpec {
            name: "dob_sim",
            attributes: DATE_OF_BIRTH_AS_READ,
            metric: Metric::EditComplement {
                clamp: clamp_dob_sim,
            },
            required: true,
        },
    ];

    if include_name_sim {
        features.push(FeatureSpec {
            name: "name_sim",
            attributes: NAME,
            metric: Metric::TokenSortRatio,
            required: false,
        });
    }

    features
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_feature_order() {
        let names: Vec<_> = standard_features(true, false)
            .iter()
            .map(|f| f.name)
            .collect();
        assert_eq!(
            names,
            vec![
                "age_diff",
                "citizenship_sim",
                "marital_status_sim",
                "address_street_sim",
                "id_num_sim",
                "dob_sim"
            ]
        );
    }

    #[test]
    fn test_name_sim_is_optional() {
        let features = standard_features(true, true);
        let name_sim = features.iter().find(|f| f.name == "name_sim").unwrap();
        assert!(!name_sim.required);
        assert_eq!(name_sim.kind(), FeatureKind::FuzzyTokenRatio);
    }

    #[test]
    fn test_output_types() {
        assert_eq!(Metric::CharacterJaccard.output_type(), ColumnType::Float64);
        assert_eq!(Metric::YearDifference.output_type(), ColumnType::Int64);
        assert_eq!(Metric::TokenSetRatio.output_type(), ColumnType::Int64);
    }

    #[test]
    fn test_kind_ranges() {
        assert_eq!(FeatureKind::SetJaccard.range(true), (0.0, 1.0));
        assert_eq!(
            FeatureKind::EditDistanceComplement.range(false).0,
            f64::NEG_INFINITY
        );
    }

    #[test]
    fn test_evaluate_invalid_date() {
        let result = Metric::YearDifference.evaluate("1990-01-01", "yesterday", None);
        assert!(result.is_err());
    }

    #[test]
    fn test_evaluate_values() {
        assert_eq!(
            Metric::YearDifference.evaluate("1990-01-01", "1991-01-01", None),
            Ok(FeatureValue::Int(1))
        );
        assert_eq!(
            Metric::CharacterJaccard.evaluate("123", "321", None),
            Ok(FeatureValue::Float(1.0))
        );
    }

    #[test]
    fn test_evaluate_with_date_format() {
        // day-first layout; the built-in layouts would read 13/01 as invalid
        assert_eq!(
            Metric::YearDifference.evaluate("13/01/1990", "13/01/1992", Some("%d/%m/%Y")),
            Ok(FeatureValue::Int(2))
        );
        assert!(Metric::YearDifference
            .evaluate("13/01/1990", "13/01/1992", None)
            .is_err());
    }

    #[test]
    fn test_dob_sim_prefers_dates_as_read() {
        let features = standard_features(true, false);
        let dob_sim = features.iter().find(|f| f.name == "dob_sim").unwrap();
        assert_eq!(dob_sim.attributes[0], raw_attribute("date_of_birth"));
        let age_diff = features.iter().find(|f| f.name == "age_diff").unwrap();
        assert!(!age_diff.attributes.iter().any(|a| a.ends_with(RAW_SUFFIX)));
    }
}
