//! Round-robin composition of the enabled frame fuzzers.

use crate::error::{FuzzError, FuzzErrorKind};
use crate::fuzzers::{
    CommonFrameFuzzer, ContinuationFuzzer, DataFuzzer, FrameFuzzer, GoAwayFuzzer, HeadersFuzzer,
    HpackFuzzer, PingFuzzer, PriorityFuzzer, PushPromiseFuzzer, RstStreamFuzzer, SettingsFuzzer,
    WindowUpdateFuzzer,
};
use crate::hpack::default_request_headers;
use crate::mutator::MutationParams;

/// The frame fuzzers a composition can enable, in dispatch order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FuzzerKind {
    Common,
    Settings,
    Headers,
    Hpack,
    Priority,
    RstStream,
    Data,
    PushPromise,
    Ping,
    GoAway,
    WindowUpdate,
    Continuation,
}

impl FuzzerKind {
    /// Dispatch order: test N of a full run always maps to the same frame
    /// type.
    pub const ALL: [FuzzerKind; 12] = [
        FuzzerKind::Common,
        FuzzerKind::Settings,
        FuzzerKind::Headers,
        FuzzerKind::Hpack,
        FuzzerKind::Priority,
        FuzzerKind::Data,
        FuzzerKind::RstStream,
        FuzzerKind::PushPromise,
        FuzzerKind::Ping,
        FuzzerKind::GoAway,
        FuzzerKind::WindowUpdate,
        FuzzerKind::Continuation,
    ];

    /// Name matching the command line flag, e.g. `rst_stream`.
    pub fn name(self) -> &'static str {
        match self {
            Self::Common => "common",
            Self::Settings => "settings",
            Self::Headers => "headers",
            Self::Hpack => "hpack",
            Self::Priority => "priority",
            Self::RstStream => "rst_stream",
            Self::Data => "data",
            Self::PushPromise => "push_promise",
            Self::Ping => "ping",
            Self::GoAway => "goaway",
            Self::WindowUpdate => "window_update",
            Self::Continuation => "continuation",
        }
    }

    /// Build the fuzzer with its default subject and stream ids.
    pub fn build(self, params: &MutationParams) -> Result<Box<dyn FrameFuzzer>, FuzzError> {
        Ok(match self {
            Self::Common => Box::new(CommonFrameFuzzer::new(params)?),
            Self::Settings => Box::new(SettingsFuzzer::new(params)?),
            Self::Headers => Box::new(HeadersFuzzer::new(default_request_headers(), params)?),
            Self::Hpack => Box::new(HpackFuzzer::new(default_request_headers(), params)?),
            Self::Priority => Box::new(PriorityFuzzer::new(params)?),
            Self::RstStream => Box::new(RstStreamFuzzer::new(params)?),
            Self::Data => Box::new(DataFuzzer::new(params)?),
            Self::PushPromise => {
                Box::new(PushPromiseFuzzer::new(default_request_headers(), params)?)
            },
            Self::Ping => Box::new(PingFuzzer::new(params)?),
            Self::GoAway => Box::new(GoAwayFuzzer::new(params)?),
            Self::WindowUpdate => Box::new(WindowUpdateFuzzer::new(params)?),
            Self::Continuation => {
                Box::new(ContinuationFuzzer::new(default_request_headers(), params)?)
            },
        })
    }
}

impl std::fmt::Display for FuzzerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Mutation parameters plus the set of enabled fuzzers.
#[derive(Debug, Clone, PartialEq)]
pub struct FuzzConfig {
    pub params:  MutationParams,
    pub enabled: Vec<FuzzerKind>,
}

impl FuzzConfig {
    /// Every fuzzer enabled.
    pub fn all(params: MutationParams) -> Self {
        Self {
            params,
            enabled: FuzzerKind::ALL.to_vec(),
        }
    }
}

/// Cycles through the enabled fuzzers, one frame per call.
///
/// Each fuzzer keeps its own test index. Callers that track a global test
/// number use [`RoundRobin::next_test`] so the two stay in lockstep.
pub struct RoundRobin {
    fuzzers: Vec<Box<dyn FrameFuzzer>>,
    cursor:  usize,
}

impl RoundRobin {
    pub fn new(fuzzers: Vec<Box<dyn FrameFuzzer>>) -> Result<Self, FuzzError> {
        if fuzzers.is_empty() {
            return Err(FuzzErrorKind::NoFuzzersEnabled.into());
        }
        Ok(Self { fuzzers, cursor: 0 })
    }

    /// Build the enabled fuzzers in [`FuzzerKind::ALL`] order. Duplicates
    /// in `config.enabled` are collapsed.
    pub fn from_config(config: &FuzzConfig) -> Result<Self, FuzzError> {
        let fuzzers = FuzzerKind::ALL
            .into_iter()
            .filter(|kind| config.enabled.contains(kind))
            .map(|kind| kind.build(&config.params))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(fuzzers)
    }

    /// Frame from the fuzzer under the cursor, then move the cursor on.
    ///
    /// The cursor only advances when the fuzzer succeeds.
    pub fn next(&mut self) -> Result<Vec<u8>, FuzzError> {
        let frame = self.fuzzers[self.cursor].next()?;
        self.cursor = (self.cursor + 1) % self.fuzzers.len();
        Ok(frame)
    }

    /// Position the current fuzzer at `test`, then produce its frame.
    pub fn next_test(&mut self, test: u64) -> Result<Vec<u8>, FuzzError> {
        self.fuzzers[self.cursor].set_test(test);
        self.next()
    }

    /// Reset every fuzzer and move the cursor back to the first one.
    pub fn reset(&mut self) {
        for fuzzer in &mut self.fuzzers {
            fuzzer.reset();
        }
        self.cursor = 0;
    }

    /// Name of the fuzzer the next call will use.
    pub fn current_name(&self) -> &'static str {
        self.fuzzers[self.cursor].name()
    }

    pub fn len(&self) -> usize {
        self.fuzzers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fuzzers.is_empty()
    }
}

impl std::fmt::Debug for RoundRobin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.fuzzers.iter().map(|f| f.name()).collect();
        f.debug_struct("RoundRobin")
            .field("fuzzers", &names)
            .field("cursor", &self.cursor)
            .finish()
    }
}
