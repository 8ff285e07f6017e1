//! Property tests for column lookup and matching.

use cv_config::{Config, Row};
use proptest::prelude::*;
use serde_json::json;

fn config_with(columns: &[String], deps: serde_json::Value) -> Config {
    let columns: serde_json::Map<String, serde_json::Value> = columns
        .iter()
        .map(|c| (c.clone(), json!([])))
        .collect();
    Config::from_value(json!({
        "analyticsTools": { "ga": {} },
        "columns": columns,
        "dependenciesConfig": deps
    }))
    .expect("config builds")
}

proptest! {
    #[test]
    fn exists_column_ignores_case(name in "[A-Za-z][A-Za-z0-9 ]{0,15}[A-Za-z0-9]") {
        let config = config_with(&[name.clone()], json!([]));
        prop_assert!(config.exists_column(&name.to_uppercase()));
        prop_assert!(config.exists_column(&name.to_lowercase()));
    }

    #[test]
    fn undeclared_column_is_absent(name in "[a-z]{1,12}") {
        let config = config_with(&["Declared Column".to_string()], json!([]));
        prop_assume!(name != "declared column");
        prop_assert!(!config.exists_column(&name));
    }

    #[test]
    fn empty_rules_accept_every_value(value in ".*") {
        let config = config_with(&["Url".to_string()], json!([]));
        prop_assert!(config.validate_rules_for("Url", &value).unwrap());
    }

    #[test]
    fn no_dependencies_is_vacuously_true(value in ".*", other in ".*") {
        let config = config_with(&["A".to_string(), "B".to_string()], json!([]));
        let row: Row = [("A", other.as_str()), ("B", value.as_str())].into_iter().collect();
        prop_assert!(config.validate_dependency_rules_for(&row, "B", &value).unwrap());
    }

    #[test]
    fn inapplicable_dependency_never_rejects(value in "[a-z]{0,8}") {
        let config = config_with(
            &["Country".to_string(), "State".to_string()],
            json!([{
                "columnReference": "Country",
                "valuesReference": ["US"],
                "hasMatch": true,
                "columnDestiny": "State",
                "matches": []
            }]),
        );
        let row: Row = [("Country", "FR"), ("State", value.as_str())].into_iter().collect();
        prop_assert!(config.validate_dependency_rules_for(&row, "State", &value).unwrap());
    }
}
