//! HTTP/2 frame codec (RFC 7540 §4.1) and per-type payload builders.

use crate::error::{FuzzError, FuzzErrorKind};

mod builders;

pub use builders::{
    ContinuationFrame, DEFAULT_DATA_PADDING, DEFAULT_DEPENDENCY, DEFAULT_HEADERS_PADDING,
    DEFAULT_WEIGHT, DataFrame, FrameBuilder, GoAwayFrame, HeadersFrame, MAX_ERROR_CODE,
    PING_DATA_LENGTH, PingFrame, PriorityFrame, PushPromiseFrame, RstStreamFrame,
    SETTINGS_ENABLE_PUSH, SETTINGS_HEADER_TABLE_SIZE, SETTINGS_INITIAL_WINDOW_SIZE,
    SETTINGS_MAX_CONCURRENT_STREAMS, SETTINGS_MAX_FRAME_SIZE, SETTINGS_MAX_HEADER_LIST_SIZE,
    SettingsFrame, WindowUpdateFrame,
};

/// HTTP/2 connection preface: "PRI * HTTP/2.0\r\n\r\nSM\r\n\r\n"
pub const CONNECTION_PREFACE: &[u8; 24] = b"PRI * HTTP/2.0\r\n\r\nSM\r\n\r\n";

/// Frame flags
pub const FLAG_END_STREAM: u8 = 0x01;
pub const FLAG_ACK: u8 = 0x01;
pub const FLAG_END_HEADERS: u8 = 0x04;
pub const FLAG_PADDED: u8 = 0x08;
pub const FLAG_PRIORITY: u8 = 0x20;

/// Frame header size (9 bytes)
pub const FRAME_HEADER_SIZE: usize = 9;

/// Maximum payload length the 24-bit length field can carry
pub const MAX_FRAME_PAYLOAD_LENGTH: usize = (1 << 24) - 1;

/// Largest valid stream identifier (31 bits)
pub const MAX_STREAM_ID: u32 = (1 << 31) - 1;

/// Newtype for HTTP/2 stream identifiers (RFC 7540 §5.1.1: 31-bit unsigned
/// integer).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StreamId(pub u32);

impl StreamId {
    /// Stream 0, used for connection-level frames.
    pub const CONNECTION: StreamId = StreamId(0);

    /// True for ids that address a stream (1..=2^31-1).
    pub fn is_stream(self) -> bool {
        self.0 > 0 && self.0 <= MAX_STREAM_ID
    }
}

impl std::fmt::Display for StreamId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for StreamId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

impl From<StreamId> for u32 {
    fn from(v: StreamId) -> Self {
        v.0
    }
}

/// Frame types defined by RFC 7540 §6
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum FrameType {
    Data         = 0x0,
    Headers      = 0x1,
    Priority     = 0x2,
    RstStream    = 0x3,
    Settings     = 0x4,
    PushPromise  = 0x5,
    Ping         = 0x6,
    GoAway       = 0x7,
    WindowUpdate = 0x8,
    Continuation = 0x9,
}

impl FrameType {
    /// Wire code of this frame type.
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Map a wire code back to a known frame type.
    pub fn from_code(code: u8) -> Option<Self> {
        Some(match code {
            0x0 => Self::Data,
            0x1 => Self::Headers,
            0x2 => Self::Priority,
            0x3 => Self::RstStream,
            0x4 => Self::Settings,
            0x5 => Self::PushPromise,
            0x6 => Self::Ping,
            0x7 => Self::GoAway,
            0x8 => Self::WindowUpdate,
            0x9 => Self::Continuation,
            _ => return None,
        })
    }

    /// Upper-case RFC name, e.g. `RST_STREAM`.
    pub fn name(self) -> &'static str {
        match self {
            Self::Data => "DATA",
            Self::Headers => "HEADERS",
            Self::Priority => "PRIORITY",
            Self::RstStream => "RST_STREAM",
            Self::Settings => "SETTINGS",
            Self::PushPromise => "PUSH_PROMISE",
            Self::Ping => "PING",
            Self::GoAway => "GOAWAY",
            Self::WindowUpdate => "WINDOW_UPDATE",
            Self::Continuation => "CONTINUATION",
        }
    }
}

impl From<FrameType> for u8 {
    fn from(v: FrameType) -> Self {
        v.code()
    }
}

impl std::fmt::Display for FrameType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Decoded HTTP/2 frame header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameHeader {
    pub length:     u32,
    pub frame_type: u8,
    pub flags:      u8,
    pub stream_id:  StreamId,
}

impl FrameHeader {
    /// Known frame type, if the type code is one of 0x0..=0x9.
    pub fn known_type(&self) -> Option<FrameType> {
        FrameType::from_code(self.frame_type)
    }
}

/// Returns the client connection preface as an owned buffer.
pub fn client_preface() -> Vec<u8> {
    CONNECTION_PREFACE.to_vec()
}

/// Check if buffer starts with HTTP/2 connection preface
pub fn is_http2_preface(buffer: &[u8]) -> bool {
    buffer.len() >= CONNECTION_PREFACE.len() && buffer.starts_with(CONNECTION_PREFACE)
}

/// Heuristic check if buffer looks like an HTTP/2 frame header.
/// Checks for valid frame type and reasonable length.
pub fn looks_like_http2_frame(buffer: &[u8]) -> bool {
    let Ok(header) = decode_header(buffer) else {
        return false;
    };

    // Frame type should be a known type (0-9 are defined)
    let Some(frame_type) = header.known_type() else {
        return false;
    };

    // SETTINGS on stream 0 carries 6-byte parameters
    !(frame_type == FrameType::Settings
        && header.stream_id == StreamId::CONNECTION
        && !header.length.is_multiple_of(6))
}

/// Encode a complete frame: 9-byte header followed by `payload`.
///
/// The reserved bit of the stream identifier is always written as zero.
/// Fails with `PayloadTooLarge` instead of truncating the 24-bit length field.
pub fn encode_frame(
    frame_type: u8,
    flags: u8,
    stream_id: StreamId,
    payload: &[u8],
) -> Result<Vec<u8>, FuzzError> {
    if payload.len() > MAX_FRAME_PAYLOAD_LENGTH {
        return Err(FuzzError::new(FuzzErrorKind::PayloadTooLarge(payload.len())));
    }

    let length = payload.len() as u32;
    let mut frame = Vec::with_capacity(FRAME_HEADER_SIZE + payload.len());
    frame.extend_from_slice(&length.to_be_bytes()[1..]);
    frame.push(frame_type);
    frame.push(flags);
    frame.extend_from_slice(&(stream_id.0 & MAX_STREAM_ID).to_be_bytes());
    frame.extend_from_slice(payload);
    Ok(frame)
}

/// Parse the 9-byte frame header.
///
/// Zero-length frames are valid per RFC 7540 (e.g., SETTINGS ACK, empty
/// DATA with END_STREAM, PING). This function does not reject length == 0.
pub fn decode_header(buffer: &[u8]) -> Result<FrameHeader, FuzzError> {
    if buffer.len() < FRAME_HEADER_SIZE {
        return Err(FuzzError::new(FuzzErrorKind::Truncated(buffer.len())));
    }

    let length = u32::from_be_bytes([0, buffer[0], buffer[1], buffer[2]]);
    let frame_type = buffer[3];
    let flags = buffer[4];
    let stream_id = StreamId(u32::from_be_bytes([
        buffer[5] & 0x7F,
        buffer[6],
        buffer[7],
        buffer[8],
    ]));

    Ok(FrameHeader {
        length,
        frame_type,
        flags,
        stream_id,
    })
}

/// Split a received buffer into complete frames, returning each header with
/// its payload. Trailing bytes that do not form a complete frame are
/// returned as the second element.
pub fn split_frames(buffer: &[u8]) -> (Vec<(FrameHeader, &[u8])>, &[u8]) {
    let mut frames = Vec::new();
    let mut pos = 0;

    while let Ok(header) = decode_header(&buffer[pos..]) {
        let total = FRAME_HEADER_SIZE + header.length as usize;
        if pos + total > buffer.len() {
            break; // Incomplete frame
        }
        let payload = &buffer[pos + FRAME_HEADER_SIZE..pos + total];
        frames.push((header, payload));
        pos += total;
    }

    (frames, &buffer[pos..])
}
