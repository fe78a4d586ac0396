//! Fuzz target for planning-input parsing and prediction.
//!
//! Any text must either fail to parse or produce an outcome that keeps
//! `spent <= committed <= allocation`.

#![no_main]

use bp_core::input::{parse_inputs, InputFormat};
use bp_core::predict;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    for format in [InputFormat::Json, InputFormat::Toml, InputFormat::Yaml] {
        if let Ok(inputs) = parse_inputs(text, format) {
            let outcome = predict(&inputs);
            let (allocation, committed, spent) = outcome.amounts();
            if !outcome.is_fallback() {
                assert!(allocation >= 0);
                assert!(committed <= allocation);
                assert!(spent <= committed);
            }
        }
    }
});
