//! Fuzz target for config document parsing.
//!
//! Tenant documents come from storage we do not control, so loading and
//! re-serializing must never panic, only return an error.

#![no_main]

use cv_config::Config;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(config) = Config::from_slice(data) {
        let _ = config.validate_config();
        let _ = config.to_csv_template();
        let _ = config.to_json();
    }
});
