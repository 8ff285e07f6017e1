//! Fuzz target for pattern compilation and matching.

#![no_main]

use cv_config::Pattern;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|input: (&str, &str)| {
    let (raw, value) = input;
    if let Ok(pattern) = Pattern::compile(raw) {
        let matched = pattern.matches(value);
        assert_eq!(matched, pattern.match_kind(value).is_some());
    }
});
