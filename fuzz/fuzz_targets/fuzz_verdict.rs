//! Fuzz target for turning arbitrary evaluation values into rule verdicts.
//!
//! Run with:
//! ```bash
//! cargo +nightly fuzz run fuzz_verdict
//! ```

#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        let _ = clusterguard_domain::fuzz::parse_verdict(text);
    }
});
