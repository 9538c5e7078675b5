//! twinlink-features - Pairwise similarity features for paired records
//!
//! Each twin attribute pair (`attr_x`/`attr_y` or `attr.1`/`attr.2`) is
//! replaced by one scalar describing how alike the two individuals are:
//!
//! | Feature | Metric |
//! |---|---|
//! | `age_diff` | whole years between dates of birth |
//! | `citizenship_sim` | Jaccard of comma-separated sets |
//! | `marital_status_sim` | Jaccard of comma-separated sets |
//! | `address_street_sim` | token-set fuzzy ratio |
//! | `id_num_sim` | Jaccard of character sets |
//! | `dob_sim` | `100 - edit distance` of the date strings as read |
//! | `name_sim` | token-sort fuzzy ratio (only when `name` twins exist) |

mod engine;
mod error;
mod feature;
mod normalization;
mod similarity;

pub use engine::{EngineConfig, FeatureEngine};
pub use error::{EngineError, EngineResult};
pub use feature::{
    raw_attribute, standard_features, FeatureKind, FeatureSpec, FeatureValue, Metric, RAW_SUFFIX,
};
pub use similarity::{
    char_jaccard, delimited_jaccard, edit_complement, jaccard, parse_date, parse_date_as,
    token_set_ratio, token_sort_ratio, year_difference,
};
