//! End-to-end pipeline runs through the filesystem

use std::fs;
use tempfile::TempDir;
use twinlink_core::{Pipeline, PipelineConfig, PipelineError, Threshold};

const HEADER: &str = "id,dob_x,dob_y,citizenship_x,citizenship_y,marital_status_x,marital_status_y,address_street_x,address_street_y,identification_number_x,identification_number_y,tax_number_x,tax_number_y,is_match";

/// Matches share almost everything; non-matches share little
fn raw_csv(n: usize) -> String {
    let mut csv = format!("{}\n", HEADER);
    for i in 0..n {
        let line = if i % 2 == 0 {
            format!(
                "{id},1980-01-{d:02},1980-01-{d:02},DE,DE,married,married,{n} Ring,Ring {n},P{id}A,P{id}A,{t},{t},1",
                id = i + 1,
                d = 1 + i % 28,
                n = i,
                t = 1000 + i,
            )
        } else {
            format!(
                "{id},1960-05-{d:02},1990-11-{d:02},FR,\"US,CA\",single,married,{n} Main St,{m} Oak Ave,Q{id},Z9{id}X,{t},{u},0",
                id = i + 1,
                d = 1 + i % 28,
                n = i,
                m = i + 3,
                t = 2000 + i,
                u = 3000 + i,
            )
        };
        csv.push_str(&line);
        csv.push('\n');
    }
    // a duplicate of the first record
    csv.push_str(&format!(
        "{},1980-01-01,1980-01-01,DE,DE,married,married,0 Ring,Ring 0,P1A,P1A,1000,1000,1\n",
        n + 1
    ));
    csv
}

const PASSTHROUGH_HEADER: &str = "id,date_of_birth_x,date_of_birth_y,citizenship_x,citizenship_y,marital_status_x,marital_status_y,address_street_x,address_street_y,identification_number_x,identification_number_y,tax_number_x,tax_number_y,gender_x,gender_y,address_city_x,address_city_y,is_match";

/// Records carrying tax, gender and city twins, with dates written two ways
///
/// Every day of month is above 12, so a day/month swap cannot go unnoticed.
fn passthrough_csv(n: usize) -> String {
    let mut csv = format!("{}\n", PASSTHROUGH_HEADER);
    for i in 0..n {
        let day = 13 + i % 15;
        let line = if i % 2 == 0 {
            format!(
                "{id},03/{d}/1985,1985-03-{d},DE,DE,married,married,{n} Ring,Ring {n},P{id}A,P{id}A,{t},{t},M,m,berlin,Berlin,1",
                id = i + 1,
                d = day,
                n = i,
                t = 1000 + i,
            )
        } else {
            format!(
                "{id},1960-05-{d},1990-11-{d},FR,US,single,married,{n} Main St,{m} Oak Ave,Q{id},Z9{id}X,{t},{u},M,F,paris,Rome,0",
                id = i + 1,
                d = day,
                n = i,
                m = i + 3,
                t = 2000 + i,
                u = 3000 + i,
            )
        };
        csv.push_str(&line);
        csv.push('\n');
    }
    csv
}

fn config() -> PipelineConfig {
    let mut config = PipelineConfig::default();
    config.selection.label_column = "is_match".to_string();
    config.selection.forest.n_trees = 20;
    config
}

#[test]
fn test_run_writes_every_stage() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("suspect.csv");
    fs::write(&input, raw_csv(40)).unwrap();
    let out_dir = dir.path().join("out");

    let pipeline = Pipeline::new(config()).unwrap();
    let outputs = pipeline.run(&input, &out_dir).unwrap();

    assert_eq!(outputs.clean_report.input_rows, 41);
    assert_eq!(outputs.clean_report.duplicates_removed, 1);
    assert_eq!(outputs.clean_report.output_rows, 40);

    for path in [
        &outputs.cleaned,
        &outputs.features,
        &outputs.selected,
        &outputs.importances,
    ] {
        assert!(path.exists(), "missing {}", path.display());
    }

    let features = pipeline.read_table(&outputs.features).unwrap();
    assert_eq!(features.num_rows(), 40);
    assert_eq!(
        &features.column_names()[..7],
        &[
            "id",
            "age_diff",
            "citizenship_sim",
            "marital_status_sim",
            "address_street_sim",
            "id_num_sim",
            "dob_sim"
        ]
    );
    assert_eq!(features.text(0, "address_street_sim").as_deref(), Some("100"));
    assert_eq!(features.text(0, "citizenship_sim").as_deref(), Some("1.0"));

    // fitting partition: 40 - ceil(40 * 0.2)
    let selected = pipeline.read_table(&outputs.selected).unwrap();
    assert_eq!(selected.num_rows(), 32);
    let names = selected.column_names();
    assert_eq!(names.first(), Some(&"id"));
    assert_eq!(names.last(), Some(&"is_match"));
    assert!(!outputs.model.selected_features().is_empty());

    let report: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&outputs.importances).unwrap()).unwrap();
    assert_eq!(report["threshold_rule"], "mean");
    // only the similarity features are candidates, never the tax numbers
    assert_eq!(report["features"].as_array().unwrap().len(), 6);
    assert!(!outputs.model.feature_names().contains(&"tax_number_x"));
}

#[test]
fn test_passthrough_attributes_are_not_fitted() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("suspect.csv");
    fs::write(&input, passthrough_csv(30)).unwrap();

    let pipeline = Pipeline::new(config()).unwrap();
    let outputs = pipeline.run(&input, dir.path().join("out")).unwrap();

    // the engine carries the passthrough twins along
    let features = pipeline.read_table(&outputs.features).unwrap();
    for name in ["tax_number_x", "gender_y", "address_city_x", "address_city_y"] {
        assert!(features.schema().contains(name), "missing {}", name);
    }
    assert_eq!(features.text(0, "gender_y").as_deref(), Some("1"));
    assert_eq!(features.text(0, "address_city_x").as_deref(), Some("BERLIN"));

    // the selector only sees similarity features
    assert_eq!(
        outputs.model.feature_names(),
        vec![
            "age_diff",
            "citizenship_sim",
            "marital_status_sim",
            "address_street_sim",
            "id_num_sim",
            "dob_sim"
        ]
    );
    let selected = pipeline.read_table(&outputs.selected).unwrap();
    let names = selected.column_names();
    assert_eq!(names.first(), Some(&"id"));
    assert_eq!(names.last(), Some(&"is_match"));
    assert_eq!(names.len(), outputs.model.selected_features().len() + 2);
    assert!(!names.iter().any(|n| n.starts_with("address_city")));
}

#[test]
fn test_dob_sim_compares_dates_as_read() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("suspect.csv");
    fs::write(&input, passthrough_csv(30)).unwrap();

    let pipeline = Pipeline::new(config()).unwrap();
    let outputs = pipeline.run(&input, dir.path().join("out")).unwrap();

    let cleaned = pipeline.read_table(&outputs.cleaned).unwrap();
    assert_eq!(cleaned.text(0, "date_of_birth_x").as_deref(), Some("1985-03-13"));
    assert_eq!(cleaned.text(0, "date_of_birth_raw_x").as_deref(), Some("03/13/1985"));

    // same day written two ways: age_diff sees one date, dob_sim two strings
    let features = pipeline.read_table(&outputs.features).unwrap();
    assert_eq!(features.text(0, "age_diff").as_deref(), Some("0"));
    assert_eq!(features.text(0, "dob_sim").as_deref(), Some("90"));
    assert!(!features.schema().contains("date_of_birth_raw_x"));
}

#[test]
fn test_day_first_date_format() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("suspect.csv");
    fs::write(&input, passthrough_csv(30)).unwrap();

    let mut config = config();
    config.clean.date_format = "%d/%m/%Y".to_string();
    let pipeline = Pipeline::new(config).unwrap();
    let outputs = pipeline.run(&input, dir.path().join("out")).unwrap();

    let cleaned = pipeline.read_table(&outputs.cleaned).unwrap();
    assert_eq!(cleaned.text(0, "date_of_birth_x").as_deref(), Some("13/03/1985"));

    let features = pipeline.read_table(&outputs.features).unwrap();
    assert_eq!(features.text(0, "age_diff").as_deref(), Some("0"));
    // 1960-05-14 to 1990-11-14
    assert_eq!(features.text(1, "age_diff").as_deref(), Some("30"));
}

#[test]
fn test_unreadable_date_format_is_rejected() {
    let mut config = config();
    config.clean.date_format = "%d %B".to_string();
    assert!(matches!(
        Pipeline::new(config),
        Err(PipelineError::Config(_))
    ));
}

#[test]
fn test_stages_compose_like_run() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("suspect.csv");
    fs::write(&input, raw_csv(30)).unwrap();

    let pipeline = Pipeline::new(config()).unwrap();
    let raw = pipeline.read_table(&input).unwrap();
    let (cleaned, _) = pipeline.clean(&raw).unwrap();
    let features = pipeline.features(&cleaned).unwrap();
    let a = pipeline.select(&features).unwrap();
    let b = pipeline.select(&features).unwrap();

    assert_eq!(a.model.selected_features(), b.model.selected_features());
    assert_eq!(a.train, b.train);
    assert_eq!(a.test.num_rows(), 6);
}

#[test]
fn test_delimiter_applies_to_input_and_output() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("suspect.csv");
    let semicolon = raw_csv(20)
        .lines()
        .map(|line| {
            // only the unquoted commas are field separators
            let mut out = String::new();
            let mut quoted = false;
            for c in line.chars() {
                match c {
                    '"' => {
                        quoted = !quoted;
                        out.push(c);
                    }
                    ',' if !quoted => out.push(';'),
                    _ => out.push(c),
                }
            }
            out + "\n"
        })
        .collect::<String>();
    fs::write(&input, semicolon).unwrap();

    let mut config = config();
    config.io.delimiter = ';';
    config.selection.threshold = Threshold::Median;
    let pipeline = Pipeline::new(config).unwrap();
    let outputs = pipeline.run(&input, dir.path().join("out")).unwrap();

    let text = fs::read_to_string(&outputs.features).unwrap();
    assert!(text.starts_with("id;age_diff;citizenship_sim"));
}

#[test]
fn test_load_config_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("twinlink.toml");
    fs::write(
        &path,
        "[selection]\nlabel_column = \"is_match\"\n\n[selection.forest]\nn_trees = 5\n",
    )
    .unwrap();

    let config = PipelineConfig::load(&path).unwrap();
    assert_eq!(config.selection.label_column, "is_match");
    assert_eq!(config.selection.forest.n_trees, 5);

    let json = dir.path().join("twinlink.json");
    fs::write(&json, config.to_json().unwrap()).unwrap();
    assert_eq!(PipelineConfig::load(&json).unwrap(), config);
}

#[test]
fn test_missing_label_fails_selection() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("suspect.csv");
    fs::write(&input, raw_csv(10)).unwrap();

    let mut config = config();
    config.selection.label_column = "verdict".to_string();
    let pipeline = Pipeline::new(config).unwrap();
    let err = pipeline.run(&input, dir.path().join("out")).unwrap_err();
    assert!(matches!(err, PipelineError::Selection(_)));
}
