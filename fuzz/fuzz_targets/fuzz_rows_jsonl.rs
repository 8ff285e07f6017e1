//! Fuzz target for the JSON Lines rows reader.

#![no_main]

use cv_core::commands::parse_rows;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        let _ = parse_rows(text);
    }
});
