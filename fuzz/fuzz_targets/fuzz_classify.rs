//! Fuzz target: Received traffic summaries
//!
//! Peers under test answer with arbitrary bytes. Classifying and logging
//! them must never panic, whole or split at any point.

#![no_main]

use h2fuzz_runner::response::{classify, first_line, hex_dump, parse_status};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let _ = classify(data);
    let _ = parse_status(data);
    let _ = first_line(data);
    assert_eq!(hex_dump(data).len(), (data.len() * 3).saturating_sub(1));

    if data.len() > 10 {
        let mid = data.len() / 2;
        let _ = classify(&data[..mid]);
        let _ = classify(&data[mid..]);
    }
});
