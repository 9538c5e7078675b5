//! Twin attribute naming conventions
//!
//! A paired record stores each attribute twice, once per individual, and the
//! two copies are told apart by a suffix. Two spellings occur in practice:
//! `date_of_birth_x`/`date_of_birth_y` and `date_of_birth.1`/`date_of_birth.2`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::schema::TableSchema;

/// Which individual of a pair a column belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Left,
    Right,
}

/// Suffix convention distinguishing the two individuals of a pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TwinConvention {
    /// `attr_x` / `attr_y`
    Underscore,
    /// `attr.1` / `attr.2`
    Dotted,
}

impl TwinConvention {
    /// Every supported convention, in detection preference order
    pub const ALL: [TwinConvention; 2] = [TwinConvention::Underscore, TwinConvention::Dotted];

    /// Left and right suffixes
    pub fn suffixes(self) -> (&'static str, &'static str) {
        match self {
            TwinConvention::Underscore => ("_x", "_y"),
            TwinConvention::Dotted => (".1", ".2"),
        }
    }

    /// Suffix for one side
    pub fn suffix(self, side: Side) -> &'static str {
        let (left, right) = self.suffixes();
        match side {
            Side::Left => left,
            Side::Right => right,
        }
    }

    /// Column names of both twins of `base`
    pub fn twin_names(self, base: &str) -> (String, String) {
        let (left, right) = self.suffixes();
        (format!("{}{}", base, left), format!("{}{}", base, right))
    }

    /// Split a column name into its base attribute and side
    pub fn split(self, column: &str) -> Option<(&str, Side)> {
        let (left, right) = self.suffixes();
        let split = match column.strip_suffix(left) {
            Some(base) => Some((base, Side::Left)),
            None => column.strip_suffix(right).map(|base| (base, Side::Right)),
        };
        split.filter(|(base, _)| !base.is_empty())
    }

    /// Base names that have both twins present, in schema order
    pub fn twin_bases(self, schema: &TableSchema) -> Vec<String> {
        schema
            .columns
            .iter()
            .filter_map(|c| match self.split(&c.name) {
                Some((base, Side::Left)) => Some(base),
                _ => None,
            })
            .filter(|base| schema.contains(&self.twin_names(base).1))
            .map(str::to_string)
            .collect()
    }

    /// Detect the convention used by a schema
    ///
    /// Picks the convention with the most complete twin pairs; ties go to
    /// the earlier entry of [`TwinConvention::ALL`]. Returns `None` when no
    /// complete pair exists.
    pub fn detect(schema: &TableSchema) -> Option<Self> {
        let mut best: Option<(TwinConvention, usize)> = None;
        for convention in Self::ALL {
            let pairs = convention.twin_bases(schema).len();
            if pairs > 0 && best.map_or(true, |(_, n)| pairs > n) {
                best = Some((convention, pairs));
            }
        }
        best.map(|(convention, _)| convention)
    }
}

impl fmt::Display for TwinConvention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (left, right) = self.suffixes();
        write!(f, "{}/{}", left, right)
    }
}

impl FromStr for TwinConvention {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "underscore" | "_x/_y" | "xy" => Ok(TwinConvention::Underscore),
            "dotted" | ".1/.2" | "12" => Ok(TwinConvention::Dotted),
            other => Err(format!("unknown twin convention: {}", other)),
        }
    }
}
