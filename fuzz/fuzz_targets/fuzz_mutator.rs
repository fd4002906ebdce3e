//! Fuzz target: Byte array mutation
//!
//! Random subjects, seeds, ratio windows and ignore sets. The mutator must
//! never panic, never change the length and never touch an ignored byte.

#![no_main]

use arbitrary::Arbitrary;
use h2fuzz::mutator::{ByteArrayMutator, ByteSet};
use h2fuzz::{FuzzErrorKind, MutationParams, Mutator, RatioWindow};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct MutationInput {
    subject:    Vec<u8>,
    seed:       u64,
    start_test: u16,
    min_ratio:  u8,
    max_ratio:  u8,
    ignored:    Vec<u8>,
    steps:      u8,
}

fuzz_target!(|input: MutationInput| {
    if input.seed == 0 {
        return;
    }
    let (low, high) = if input.min_ratio <= input.max_ratio {
        (input.min_ratio, input.max_ratio)
    } else {
        (input.max_ratio, input.min_ratio)
    };
    let ratio = RatioWindow::new(f64::from(low) / 255.0, f64::from(high) / 255.0)
        .expect("ratio within [0, 1]");
    let params = MutationParams::new(input.seed, u64::from(input.start_test), ratio)
        .expect("non-zero seed");

    let ignored: ByteSet = input.ignored.iter().copied().collect();
    let mut mutator = ByteArrayMutator::new(input.subject.clone(), &params)
        .expect("valid parameters")
        .with_ignored(ignored);

    for _ in 0..input.steps % 8 {
        match mutator.next() {
            Ok(fuzzed) => {
                assert_eq!(fuzzed.len(), input.subject.len());
                for (before, after) in input.subject.iter().zip(&fuzzed) {
                    if ignored.contains(*before) {
                        assert_eq!(before, after, "ignored byte was mutated");
                    }
                }
                assert_eq!(mutator.original(), &input.subject[..]);
            },
            Err(err) => assert_eq!(err.kind, FuzzErrorKind::NothingToMutate),
        }
    }
});
