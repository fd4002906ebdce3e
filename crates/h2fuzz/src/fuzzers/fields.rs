use rand::Rng;

use super::{DEFAULT_STREAM_ID, FrameFuzzer, ReseedClock};
use crate::error::FuzzError;
use crate::frame::{
    FrameBuilder, GoAwayFrame, MAX_ERROR_CODE, PING_DATA_LENGTH, PingFrame, RstStreamFrame,
    StreamId, WindowUpdateFrame,
};
use crate::mutator::MutationParams;

/// Upper bound (inclusive) of the GOAWAY debug data length.
pub const MAX_GOAWAY_DEBUG_LENGTH: usize = 4096;

macro_rules! delegate_clock {
    ($name:literal) => {
        fn name(&self) -> &'static str {
            $name
        }

        fn reset(&mut self) {
            self.clock.reset();
        }

        fn set_test(&mut self, test: u64) {
            self.clock.set_test(test);
        }

        fn test(&self) -> u64 {
            self.clock.test()
        }
    };
}

/// RST_STREAM with a random error code in `[0, 2^32 - 1)`.
#[derive(Debug, Clone)]
pub struct RstStreamFuzzer {
    clock:     ReseedClock,
    stream_id: StreamId,
}

impl RstStreamFuzzer {
    pub fn new(params: &MutationParams) -> Result<Self, FuzzError> {
        Ok(Self {
            clock:     ReseedClock::new(params)?,
            stream_id: DEFAULT_STREAM_ID,
        })
    }

    pub fn with_stream_id(mut self, stream_id: StreamId) -> Result<Self, FuzzError> {
        self.stream_id = RstStreamFrame::new(stream_id, 0)?.stream_id();
        Ok(self)
    }
}

impl FrameFuzzer for RstStreamFuzzer {
    delegate_clock!("rst_stream");

    fn next(&mut self) -> Result<Vec<u8>, FuzzError> {
        let error_code = self.clock.rng().gen_range(0..MAX_ERROR_CODE);
        let frame = RstStreamFrame::new(self.stream_id, error_code)?.encode()?;
        self.clock.advance();
        Ok(frame)
    }
}

/// PING with 8 random opaque bytes.
#[derive(Debug, Clone)]
pub struct PingFuzzer {
    clock: ReseedClock,
}

impl PingFuzzer {
    pub fn new(params: &MutationParams) -> Result<Self, FuzzError> {
        Ok(Self {
            clock: ReseedClock::new(params)?,
        })
    }
}

impl FrameFuzzer for PingFuzzer {
    delegate_clock!("ping");

    fn next(&mut self) -> Result<Vec<u8>, FuzzError> {
        let mut data = [0u8; PING_DATA_LENGTH];
        self.clock.rng().fill(&mut data);
        let frame = PingFrame::new(data).encode()?;
        self.clock.advance();
        Ok(frame)
    }
}

/// GOAWAY with random last-stream-id, error code and debug data.
///
/// Each field comes from its own PRNG, all three seeded identically.
#[derive(Debug, Clone)]
pub struct GoAwayFuzzer {
    clock: ReseedClock,
}

impl GoAwayFuzzer {
    pub fn new(params: &MutationParams) -> Result<Self, FuzzError> {
        Ok(Self {
            clock: ReseedClock::new(params)?,
        })
    }
}

impl FrameFuzzer for GoAwayFuzzer {
    delegate_clock!("goaway");

    fn next(&mut self) -> Result<Vec<u8>, FuzzError> {
        let last_stream_id: u32 = self.clock.rng().r#gen();
        let error_code: u32 = self.clock.rng().r#gen();

        let mut debug_rng = self.clock.rng();
        let length = debug_rng.gen_range(0..=MAX_GOAWAY_DEBUG_LENGTH);
        let mut debug_data = vec![0u8; length];
        debug_rng.fill(debug_data.as_mut_slice());

        let frame = GoAwayFrame::new(last_stream_id, error_code, debug_data).encode()?;
        self.clock.advance();
        Ok(frame)
    }
}

/// WINDOW_UPDATE with a random 32-bit increment, on stream 0 by default.
#[derive(Debug, Clone)]
pub struct WindowUpdateFuzzer {
    clock:     ReseedClock,
    stream_id: StreamId,
}

impl WindowUpdateFuzzer {
    pub fn new(params: &MutationParams) -> Result<Self, FuzzError> {
        Ok(Self {
            clock:     ReseedClock::new(params)?,
            stream_id: StreamId::CONNECTION,
        })
    }

    /// WINDOW_UPDATE accepts any stream, including 0.
    pub fn with_stream_id(mut self, stream_id: StreamId) -> Self {
        self.stream_id = stream_id;
        self
    }
}

impl FrameFuzzer for WindowUpdateFuzzer {
    delegate_clock!("window_update");

    fn next(&mut self) -> Result<Vec<u8>, FuzzError> {
        let increment: u32 = self.clock.rng().r#gen();
        let frame = WindowUpdateFrame::new(self.stream_id, increment).encode()?;
        self.clock.advance();
        Ok(frame)
    }
}
