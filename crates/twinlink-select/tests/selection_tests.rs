//! Feature selection integration tests
//!
//! Runs engineered-looking tables through `FeatureSelector` and checks the
//! selection invariants with property-based inputs.

use proptest::prelude::*;
use twinlink_io::{CsvOptions, CsvReader, DataColumn, Table};
use twinlink_select::{
    train_test_split, ForestConfig, FeatureSelector, SelectionError, SelectorConfig, Threshold,
};

fn small_forest() -> SelectorConfig {
    SelectorConfig {
        forest: ForestConfig {
            n_trees: 15,
            ..ForestConfig::default()
        },
        ..SelectorConfig::default()
    }
}

/// A feature table shaped like the similarity engine's output
fn engineered(n: usize) -> Table {
    let mut csv = String::from(
        "id,age_diff,citizenship_sim,marital_status_sim,address_street_sim,id_num_sim,dob_sim,label\n",
    );
    for i in 0..n {
        let is_match = i % 3 == 0;
        let (age, street, dob) = if is_match {
            (i % 2, 90 + i % 10, 100 - i % 3)
        } else {
            (5 + i % 20, 20 + i % 40, 60 + i % 30)
        };
        csv.push_str(&format!(
            "{},{},{},{},{},{},{},{}\n",
            i + 1,
            age,
            (i % 4) as f64 / 4.0,
            if i % 5 == 0 { 1.0 } else { 0.0 },
            street,
            (i % 7) as f64 / 7.0,
            dob,
            if is_match { 1 } else { 0 }
        ));
    }
    CsvReader::read_from(csv.as_bytes(), CsvOptions::typed()).unwrap()
}

#[test]
fn test_engineered_table_selection() {
    let selection = FeatureSelector::new(small_forest())
        .select(&engineered(90))
        .unwrap();

    let selected = selection.model.selected_features();
    assert!(!selected.is_empty());
    assert!(selected.len() <= 6);
    // the informative features outrank the noise
    let top = selection.model.ranking()[0].0;
    assert!(["age_diff", "address_street_sim", "dob_sim"].contains(&top));

    // identifier first, label last, selected features in between
    let names = selection.train.column_names();
    assert_eq!(names.first(), Some(&"id"));
    assert_eq!(names.last(), Some(&"label"));
    assert_eq!(names.len(), selected.len() + 2);
    assert_eq!(selection.test.column_names(), names);

    // 90 rows, ceil(18) held out
    assert_eq!(selection.train.num_rows(), 72);
    assert_eq!(selection.test.num_rows(), 18);
}

#[test]
fn test_support_applies_to_new_tables() {
    let selector = FeatureSelector::new(small_forest());
    let model = selector.fit(&engineered(60)).unwrap();

    let fresh = engineered(12);
    let reduced = model.transform(&fresh).unwrap();
    assert_eq!(reduced.num_rows(), 12);
    for name in model.selected_features() {
        assert_eq!(reduced.column(name), fresh.column(name));
    }
}

#[test]
fn test_median_threshold_keeps_half_or_more() {
    let config = SelectorConfig {
        threshold: Threshold::Median,
        ..small_forest()
    };
    let model = FeatureSelector::new(config).fit(&engineered(60)).unwrap();
    assert!(model.selected_features().len() >= 3);
}

#[test]
fn test_requested_string_feature_is_rejected() {
    let table = engineered(20)
        .with_column(
            "address_city",
            DataColumn::String(vec![Some("BERLIN".to_string()); 20]),
        )
        .unwrap();
    let config = SelectorConfig {
        feature_columns: Some(vec!["age_diff".to_string(), "address_city".to_string()]),
        ..small_forest()
    };
    let err = FeatureSelector::new(config).fit(&table).unwrap_err();
    assert!(matches!(
        err,
        SelectionError::NonNumericFeature { ref column, ref row_id } if column == "address_city" && row_id == "1"
    ));
}

#[test]
fn test_explicit_feature_columns_skip_passthrough() {
    let table = engineered(30)
        .with_column(
            "address_city",
            DataColumn::String(vec![Some("BERLIN".to_string()); 30]),
        )
        .unwrap();
    let config = SelectorConfig {
        feature_columns: Some(vec!["age_diff".to_string(), "dob_sim".to_string()]),
        ..small_forest()
    };
    let model = FeatureSelector::new(config).fit(&table).unwrap();
    assert_eq!(model.feature_names(), vec!["age_diff", "dob_sim"]);
}

#[test]
fn test_too_few_rows() {
    let table = engineered(1);
    let err = FeatureSelector::new(small_forest())
        .select(&table)
        .unwrap_err();
    assert!(matches!(err, SelectionError::TooFewRows { rows: 1, .. }));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn test_selection_invariants(seed in 0u64..1000, n in 30usize..80) {
        let config = SelectorConfig { seed, ..small_forest() };
        let model = FeatureSelector::new(config).fit(&engineered(n)).unwrap();

        let importances = model.importances();
        let total: f64 = importances.iter().sum();
        prop_assert!((total - 1.0).abs() < 1e-9);
        prop_assert!(importances.iter().all(|&x| x >= 0.0));

        let selected = model.selected_features();
        prop_assert!(!selected.is_empty());
        prop_assert!(selected.len() <= importances.len());
        for (name, importance) in model.ranking() {
            prop_assert_eq!(selected.contains(&name), importance >= model.threshold() - 1e-12);
        }
    }

    #[test]
    fn test_partition_sizes(n in 2usize..500, seed in any::<u64>()) {
        let p = train_test_split(n, 0.2, seed).unwrap();
        let expected = ((n as f64 * 0.2).ceil() as usize).clamp(1, n - 1);
        prop_assert_eq!(p.test.len(), expected);
        prop_assert_eq!(p.train.len() + p.test.len(), n);
    }
}
