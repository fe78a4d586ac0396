//! Fuzz target for history.json parsing and validation.

#![no_main]

use bp_config::validate::validate_history;
use bp_config::HistoricalDataset;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(history) = serde_json::from_slice::<HistoricalDataset>(data) {
        let _ = validate_history(&history);
        let _ = history.latest();
    }
});
