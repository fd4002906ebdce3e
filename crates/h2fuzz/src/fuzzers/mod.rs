//! Per-frame-type fuzzers.
//!
//! Byte and dictionary fuzzers wrap a [`Mutator`](crate::mutator::Mutator)
//! around a canonical subject and advance by drawing from its base PRNG.
//! Field fuzzers (RST_STREAM, PING, GOAWAY, WINDOW_UPDATE) instead reseed a
//! fresh PRNG with `seed * test` on every call, so their output depends on
//! the test index alone.

/// `FrameFuzzer` methods that forward to a `mutator` field.
macro_rules! delegate_mutator {
    ($name:literal) => {
        fn name(&self) -> &'static str {
            $name
        }

        fn reset(&mut self) {
            self.mutator.reset();
        }

        fn set_test(&mut self, test: u64) {
            self.mutator.set_test(test);
        }

        fn test(&self) -> u64 {
            self.mutator.test()
        }
    };
}

mod fields;
mod headers;
mod raw;

pub use fields::{
    GoAwayFuzzer, MAX_GOAWAY_DEBUG_LENGTH, PingFuzzer, RstStreamFuzzer, WindowUpdateFuzzer,
};
pub use headers::{ContinuationFuzzer, HeadersFuzzer, PushPromiseFuzzer};
use rand::SeedableRng;
use rand::rngs::StdRng;
pub use raw::{
    COMMON_PAYLOAD_LENGTH, CommonFrameFuzzer, DATA_SUBJECT_LENGTH, DataFuzzer, HpackFuzzer,
    PriorityFuzzer, SettingsFuzzer,
};

use crate::error::{FuzzError, FuzzErrorKind};
use crate::frame::StreamId;
use crate::mutator::MutationParams;

/// Stream used by fuzzers of stream-bound frame types unless overridden.
pub const DEFAULT_STREAM_ID: StreamId = StreamId(1);

/// Promised stream of the PUSH_PROMISE fuzzer unless overridden.
pub const DEFAULT_PROMISED_STREAM_ID: StreamId = StreamId(2);

/// A generator of fuzzed, fully encoded HTTP/2 frames.
///
/// Fuzzers own their generators, so each thread can drive its own set.
pub trait FrameFuzzer: Send {
    /// Short name used in logs, e.g. `settings`.
    fn name(&self) -> &'static str;

    /// Produce the frame for the current test index, then advance it.
    fn next(&mut self) -> Result<Vec<u8>, FuzzError>;

    fn reset(&mut self);

    /// Reposition the test index so a driver can resume a given test.
    fn set_test(&mut self, test: u64);

    fn test(&self) -> u64;
}

impl<F: FrameFuzzer + ?Sized> FrameFuzzer for Box<F> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn next(&mut self) -> Result<Vec<u8>, FuzzError> {
        (**self).next()
    }

    fn reset(&mut self) {
        (**self).reset()
    }

    fn set_test(&mut self, test: u64) {
        (**self).set_test(test)
    }

    fn test(&self) -> u64 {
        (**self).test()
    }
}

/// Test index bookkeeping for the reseed-per-call policy.
#[derive(Debug, Clone)]
pub(crate) struct ReseedClock {
    seed:       u64,
    start_test: u64,
    test:       u64,
}

impl ReseedClock {
    pub(crate) fn new(params: &MutationParams) -> Result<Self, FuzzError> {
        if params.seed == 0 {
            return Err(FuzzErrorKind::ZeroSeed.into());
        }
        Ok(Self {
            seed:       params.seed,
            start_test: params.start_test,
            test:       params.start_test,
        })
    }

    /// Fresh PRNG for the current test.
    pub(crate) fn rng(&self) -> StdRng {
        StdRng::seed_from_u64(self.seed.wrapping_mul(self.test))
    }

    pub(crate) fn advance(&mut self) {
        self.test += 1;
    }

    pub(crate) fn reset(&mut self) {
        self.test = self.start_test;
    }

    pub(crate) fn set_test(&mut self, test: u64) {
        self.test = test;
    }

    pub(crate) fn test(&self) -> u64 {
        self.test
    }
}
