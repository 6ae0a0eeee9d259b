//! Fuzz target for METADATA annotation parsing.
//!
//! Run with:
//! ```bash
//! cargo +nightly fuzz run fuzz_annotations
//! ```

#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        let _ = clusterguard_domain::fuzz::parse_annotations(text);
    }
});
