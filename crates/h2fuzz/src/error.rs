use crate::frame::StreamId;

/// Classification of fuzzer errors (public API)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FuzzErrorKind {
    /// Seed value of zero, which would make every run identical
    ZeroSeed,
    /// Ratio window outside `0 <= min <= max <= 1` (detail in the `String`)
    InvalidRatio(String),
    /// Frame type requires a stream id greater than zero
    InvalidStreamId,
    /// PUSH_PROMISE promised stream id must be greater than zero
    InvalidPromisedStreamId,
    /// RST_STREAM error code must be below 2^32 - 1
    InvalidErrorCode(u64),
    /// Payload does not fit the 24-bit frame length field
    PayloadTooLarge(usize),
    /// Buffer shorter than the 9-byte frame header (length in the `usize`)
    Truncated(usize),
    /// Every reachable position of the subject is ignored
    NothingToMutate,
    /// Composition was built without any frame fuzzer
    NoFuzzersEnabled,
    /// Header-based fuzzer was built without a header dictionary
    MissingHeaders,
}

impl std::fmt::Display for FuzzErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ZeroSeed => write!(f, "seed cannot be zero"),
            Self::InvalidRatio(msg) => write!(f, "invalid mutation ratio: {msg}"),
            Self::InvalidStreamId => write!(f, "frame requires a stream id greater than zero"),
            Self::InvalidPromisedStreamId => {
                write!(f, "promised stream id must be greater than zero")
            },
            Self::InvalidErrorCode(code) => write!(f, "invalid error code {code}"),
            Self::PayloadTooLarge(len) => {
                write!(f, "payload of {len} bytes does not fit the 24-bit length field")
            },
            Self::Truncated(len) => {
                write!(f, "buffer of {len} bytes is shorter than a frame header")
            },
            Self::NothingToMutate => write!(f, "every position of the subject is ignored"),
            Self::NoFuzzersEnabled => write!(f, "no fuzzer enabled"),
            Self::MissingHeaders => write!(f, "headers not specified"),
        }
    }
}

/// Fuzzer error with optional stream context (public API)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FuzzError {
    /// What went wrong
    pub kind:      FuzzErrorKind,
    /// The stream id that was rejected, if applicable
    pub stream_id: Option<StreamId>,
}

impl FuzzError {
    /// Create an error without stream context.
    pub fn new(kind: FuzzErrorKind) -> Self {
        Self {
            kind,
            stream_id: None,
        }
    }

    /// Create an error carrying the offending stream id.
    pub fn with_stream(kind: FuzzErrorKind, stream_id: StreamId) -> Self {
        Self {
            kind,
            stream_id: Some(stream_id),
        }
    }
}

impl From<FuzzErrorKind> for FuzzError {
    fn from(kind: FuzzErrorKind) -> Self {
        Self::new(kind)
    }
}

impl std::fmt::Display for FuzzError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(sid) = self.stream_id {
            write!(f, "[stream {sid}] {}", self.kind)
        } else {
            write!(f, "{}", self.kind)
        }
    }
}

impl std::error::Error for FuzzError {}
