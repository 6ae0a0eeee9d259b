//! Fuzz target for input document parsing in both supported formats.
//!
//! Run with:
//! ```bash
//! cargo +nightly fuzz run fuzz_input_document
//! ```

#![no_main]

use clusterguard_source::{InputFormat, parse_input};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        let _ = parse_input(text, InputFormat::Json);
        let _ = parse_input(text, InputFormat::Yaml);
    }
});
