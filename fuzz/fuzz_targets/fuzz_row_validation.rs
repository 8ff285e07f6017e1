//! Fuzz target for row validation against a fixed config.
//!
//! Arbitrary rows must yield a report, never a panic, and every violation
//! must name a declared column.

#![no_main]

use arbitrary::Arbitrary;
use cv_config::{Config, Row, RowValidator};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct Input {
    cells: Vec<(String, String)>,
}

const CONFIG: &str = r#"{
    "separator": "_",
    "spaceSeparator": "-",
    "insertTime": "2024-01-01T00:00:00.000Z",
    "version": 1,
    "analyticsTools": { "ga": { "utm_source": ["Vehicle"] } },
    "columns": {
        "Country": ["US", "CA"],
        "State": [],
        "Vehicle": ["google*", "*tiktok*", "meta"]
    },
    "dependenciesConfig": [
        {
            "columnReference": "Country",
            "valuesReference": ["US"],
            "hasMatch": true,
            "columnDestiny": "State",
            "matches": ["CA", "NY"]
        }
    ]
}"#;

fuzz_target!(|input: Input| {
    let Ok(config) = Config::from_json_str(CONFIG) else {
        return;
    };
    let Ok(validator) = RowValidator::new(&config) else {
        return;
    };

    let row: Row = input.cells.into_iter().collect();
    let report = validator.validate(&row);
    for violation in &report.violations {
        assert!(config.exists_column(&violation.column));
    }
});
