use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

use super::{DEFAULT_STREAM_ID, FrameFuzzer};
use crate::error::{FuzzError, FuzzErrorKind};
use crate::frame::{
    DataFrame, FrameBuilder, FrameType, HeadersFrame, PriorityFrame, SettingsFrame, StreamId,
    encode_frame,
};
use crate::hpack::HeaderList;
use crate::mutator::{ByteArrayMutator, MutationParams, Mutator};

/// Payload length of the DATA frame mutated by [`CommonFrameFuzzer`].
pub const COMMON_PAYLOAD_LENGTH: usize = 4096;

/// Length of the pseudo-random subject of [`DataFuzzer`].
pub const DATA_SUBJECT_LENGTH: usize = 256;

/// Mutates every byte of an encoded frame, header included.
///
/// The default subject is a DATA frame on stream 0 with flags 0 and a
/// 4096-byte zero payload (4105 bytes on the wire). Output is exactly the
/// mutated bytes; no frame header is added.
#[derive(Debug, Clone)]
pub struct CommonFrameFuzzer {
    mutator: ByteArrayMutator,
}

impl CommonFrameFuzzer {
    pub fn new(params: &MutationParams) -> Result<Self, FuzzError> {
        let frame = encode_frame(
            FrameType::Data.code(),
            0,
            StreamId::CONNECTION,
            &[0u8; COMMON_PAYLOAD_LENGTH],
        )?;
        Self::with_frame(frame, params)
    }

    /// Mutate an arbitrary pre-encoded frame instead of the default one.
    pub fn with_frame(frame: Vec<u8>, params: &MutationParams) -> Result<Self, FuzzError> {
        Ok(Self {
            mutator: ByteArrayMutator::new(frame, params)?,
        })
    }

    pub fn original(&self) -> &[u8] {
        self.mutator.original()
    }
}

impl FrameFuzzer for CommonFrameFuzzer {
    delegate_mutator!("common");

    fn next(&mut self) -> Result<Vec<u8>, FuzzError> {
        self.mutator.next()
    }
}

/// Mutates the payload of a default SETTINGS frame and re-frames it as
/// SETTINGS, flags 0, stream 0.
#[derive(Debug, Clone)]
pub struct SettingsFuzzer {
    mutator: ByteArrayMutator,
}

impl SettingsFuzzer {
    pub fn new(params: &MutationParams) -> Result<Self, FuzzError> {
        Ok(Self {
            mutator: ByteArrayMutator::new(SettingsFrame::new().payload(), params)?,
        })
    }
}

impl FrameFuzzer for SettingsFuzzer {
    delegate_mutator!("settings");

    fn next(&mut self) -> Result<Vec<u8>, FuzzError> {
        let payload = self.mutator.next()?;
        encode_frame(
            FrameType::Settings.code(),
            0,
            StreamId::CONNECTION,
            &payload,
        )
    }
}

/// Corrupts the compressed header block of a HEADERS frame at the byte
/// level. Flags and stream id stay those of the unfuzzed frame.
#[derive(Debug, Clone)]
pub struct HpackFuzzer {
    mutator:   ByteArrayMutator,
    flags:     u8,
    stream_id: StreamId,
}

impl HpackFuzzer {
    pub fn new(headers: HeaderList, params: &MutationParams) -> Result<Self, FuzzError> {
        if headers.is_empty() {
            return Err(FuzzErrorKind::MissingHeaders.into());
        }
        let frame = HeadersFrame::new(DEFAULT_STREAM_ID, headers)?;
        Ok(Self {
            mutator:   ByteArrayMutator::new(frame.payload(), params)?,
            flags:     frame.flags(),
            stream_id: frame.stream_id(),
        })
    }
}

impl FrameFuzzer for HpackFuzzer {
    delegate_mutator!("hpack");

    fn next(&mut self) -> Result<Vec<u8>, FuzzError> {
        let payload = self.mutator.next()?;
        encode_frame(
            FrameType::Headers.code(),
            self.flags,
            self.stream_id,
            &payload,
        )
    }
}

/// Mutates a default PRIORITY payload (dependency 0, weight 32).
#[derive(Debug, Clone)]
pub struct PriorityFuzzer {
    mutator:   ByteArrayMutator,
    stream_id: StreamId,
}

impl PriorityFuzzer {
    pub fn new(params: &MutationParams) -> Result<Self, FuzzError> {
        let frame = PriorityFrame::new(DEFAULT_STREAM_ID)?;
        Ok(Self {
            mutator:   ByteArrayMutator::new(frame.payload(), params)?,
            stream_id: frame.stream_id(),
        })
    }

    pub fn with_stream_id(mut self, stream_id: StreamId) -> Result<Self, FuzzError> {
        self.stream_id = PriorityFrame::new(stream_id)?.stream_id();
        Ok(self)
    }
}

impl FrameFuzzer for PriorityFuzzer {
    delegate_mutator!("priority");

    fn next(&mut self) -> Result<Vec<u8>, FuzzError> {
        let payload = self.mutator.next()?;
        encode_frame(FrameType::Priority.code(), 0, self.stream_id, &payload)
    }
}

/// Mutates a pseudo-random blob and sends it as the data of a padded DATA
/// frame.
#[derive(Debug, Clone)]
pub struct DataFuzzer {
    mutator:   ByteArrayMutator,
    stream_id: StreamId,
}

impl DataFuzzer {
    /// The blob is derived from the seed, so it is stable per seed.
    pub fn new(params: &MutationParams) -> Result<Self, FuzzError> {
        let mut blob = vec![0u8; DATA_SUBJECT_LENGTH];
        StdRng::seed_from_u64(params.seed).fill_bytes(&mut blob);
        Self::with_data(blob, params)
    }

    pub fn with_data(data: Vec<u8>, params: &MutationParams) -> Result<Self, FuzzError> {
        Ok(Self {
            mutator:   ByteArrayMutator::new(data, params)?,
            stream_id: DEFAULT_STREAM_ID,
        })
    }

    pub fn with_stream_id(mut self, stream_id: StreamId) -> Result<Self, FuzzError> {
        self.stream_id = DataFrame::new(stream_id, Vec::new())?.stream_id();
        Ok(self)
    }
}

impl FrameFuzzer for DataFuzzer {
    delegate_mutator!("data");

    fn next(&mut self) -> Result<Vec<u8>, FuzzError> {
        let data = self.mutator.next()?;
        DataFrame::new(self.stream_id, data)?.encode()
    }
}
