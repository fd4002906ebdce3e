use super::{
    FLAG_END_HEADERS, FLAG_END_STREAM, FLAG_PADDED, FLAG_PRIORITY, FrameType, StreamId,
    encode_frame,
};
use crate::error::{FuzzError, FuzzErrorKind};
use crate::hpack::{HeaderList, encode_header_block};

/// Default PRIORITY/HEADERS weight
pub const DEFAULT_WEIGHT: u8 = 32;
/// Default HEADERS padding length
pub const DEFAULT_HEADERS_PADDING: u8 = 8;
/// Default DATA and PUSH_PROMISE padding length
pub const DEFAULT_DATA_PADDING: u8 = 32;
/// Default stream dependency (no exclusive bit, no dependency)
pub const DEFAULT_DEPENDENCY: u32 = 0;

/// RST_STREAM error codes must stay below this value
pub const MAX_ERROR_CODE: u64 = (1 << 32) - 1;

/// Shared interface of the typed frame builders.
pub trait FrameBuilder {
    fn frame_type(&self) -> FrameType;

    /// Flags of the default (non-fuzzed) construction.
    fn flags(&self) -> u8;

    fn stream_id(&self) -> StreamId;

    fn payload(&self) -> Vec<u8>;

    /// Complete frame: header plus payload.
    fn encode(&self) -> Result<Vec<u8>, FuzzError> {
        encode_frame(
            self.frame_type().code(),
            self.flags(),
            self.stream_id(),
            &self.payload(),
        )
    }
}

fn require_stream(stream_id: StreamId) -> Result<StreamId, FuzzError> {
    if stream_id.is_stream() {
        Ok(stream_id)
    } else {
        Err(FuzzError::with_stream(
            FuzzErrorKind::InvalidStreamId,
            stream_id,
        ))
    }
}

fn push_padding(payload: &mut Vec<u8>, padding_length: u8) {
    payload.extend(std::iter::repeat_n(0u8, padding_length as usize));
}

/// DATA frame (RFC 7540 §6.1): padded, END_STREAM.
#[derive(Debug, Clone)]
pub struct DataFrame {
    stream_id:      StreamId,
    data:           Vec<u8>,
    padding_length: u8,
}

impl DataFrame {
    pub fn new(stream_id: StreamId, data: Vec<u8>) -> Result<Self, FuzzError> {
        Ok(Self {
            stream_id: require_stream(stream_id)?,
            data,
            padding_length: DEFAULT_DATA_PADDING,
        })
    }
}

impl FrameBuilder for DataFrame {
    fn frame_type(&self) -> FrameType {
        FrameType::Data
    }

    fn flags(&self) -> u8 {
        FLAG_PADDED | FLAG_END_STREAM
    }

    fn stream_id(&self) -> StreamId {
        self.stream_id
    }

    fn payload(&self) -> Vec<u8> {
        // [Pad Length (1)] [Data] [Padding]
        let mut payload = Vec::with_capacity(1 + self.data.len() + self.padding_length as usize);
        payload.push(self.padding_length);
        payload.extend_from_slice(&self.data);
        push_padding(&mut payload, self.padding_length);
        payload
    }
}

/// HEADERS frame (RFC 7540 §6.2): padded, with priority fields,
/// END_HEADERS and END_STREAM.
#[derive(Debug, Clone)]
pub struct HeadersFrame {
    stream_id:      StreamId,
    headers:        HeaderList,
    padding_length: u8,
    dependency:     u32,
    weight:         u8,
}

impl HeadersFrame {
    pub fn new(stream_id: StreamId, headers: HeaderList) -> Result<Self, FuzzError> {
        Ok(Self {
            stream_id: require_stream(stream_id)?,
            headers,
            padding_length: DEFAULT_HEADERS_PADDING,
            dependency: DEFAULT_DEPENDENCY,
            weight: DEFAULT_WEIGHT,
        })
    }

    pub fn headers(&self) -> &HeaderList {
        &self.headers
    }
}

impl FrameBuilder for HeadersFrame {
    fn frame_type(&self) -> FrameType {
        FrameType::Headers
    }

    fn flags(&self) -> u8 {
        FLAG_PADDED | FLAG_END_HEADERS | FLAG_PRIORITY | FLAG_END_STREAM
    }

    fn stream_id(&self) -> StreamId {
        self.stream_id
    }

    fn payload(&self) -> Vec<u8> {
        // [Pad Length (1)] [E + Stream Dep (4)] [Weight (1)] [Header Block] [Padding]
        let block = encode_header_block(&self.headers);
        let mut payload = Vec::with_capacity(6 + block.len() + self.padding_length as usize);
        payload.push(self.padding_length);
        payload.extend_from_slice(&self.dependency.to_be_bytes());
        payload.push(self.weight);
        payload.extend_from_slice(&block);
        push_padding(&mut payload, self.padding_length);
        payload
    }
}

/// PRIORITY frame (RFC 7540 §6.3). No flags.
#[derive(Debug, Clone)]
pub struct PriorityFrame {
    stream_id:  StreamId,
    dependency: u32,
    weight:     u8,
}

impl PriorityFrame {
    pub fn new(stream_id: StreamId) -> Result<Self, FuzzError> {
        Ok(Self {
            stream_id:  require_stream(stream_id)?,
            dependency: DEFAULT_DEPENDENCY,
            weight:     DEFAULT_WEIGHT,
        })
    }
}

impl FrameBuilder for PriorityFrame {
    fn frame_type(&self) -> FrameType {
        FrameType::Priority
    }

    fn flags(&self) -> u8 {
        0
    }

    fn stream_id(&self) -> StreamId {
        self.stream_id
    }

    fn payload(&self) -> Vec<u8> {
        let mut payload = Vec::with_capacity(5);
        payload.extend_from_slice(&self.dependency.to_be_bytes());
        payload.push(self.weight);
        payload
    }
}

/// RST_STREAM frame (RFC 7540 §6.4). No flags.
#[derive(Debug, Clone)]
pub struct RstStreamFrame {
    stream_id:  StreamId,
    error_code: u32,
}

impl RstStreamFrame {
    /// Fails for stream 0 and for error codes of 2^32 - 1 or above.
    pub fn new(stream_id: StreamId, error_code: u64) -> Result<Self, FuzzError> {
        let stream_id = require_stream(stream_id)?;
        if error_code >= MAX_ERROR_CODE {
            return Err(FuzzError::with_stream(
                FuzzErrorKind::InvalidErrorCode(error_code),
                stream_id,
            ));
        }
        Ok(Self {
            stream_id,
            error_code: error_code as u32,
        })
    }

    pub fn error_code(&self) -> u32 {
        self.error_code
    }
}

impl FrameBuilder for RstStreamFrame {
    fn frame_type(&self) -> FrameType {
        FrameType::RstStream
    }

    fn flags(&self) -> u8 {
        0
    }

    fn stream_id(&self) -> StreamId {
        self.stream_id
    }

    fn payload(&self) -> Vec<u8> {
        self.error_code.to_be_bytes().to_vec()
    }
}

/// SETTINGS parameter identifiers (RFC 7540 §6.5.2)
pub const SETTINGS_HEADER_TABLE_SIZE: u16 = 0x1;
pub const SETTINGS_ENABLE_PUSH: u16 = 0x2;
pub const SETTINGS_MAX_CONCURRENT_STREAMS: u16 = 0x3;
pub const SETTINGS_INITIAL_WINDOW_SIZE: u16 = 0x4;
pub const SETTINGS_MAX_FRAME_SIZE: u16 = 0x5;
pub const SETTINGS_MAX_HEADER_LIST_SIZE: u16 = 0x6;

/// SETTINGS frame (RFC 7540 §6.5) carrying all six parameters, always on
/// stream 0.
#[derive(Debug, Clone)]
pub struct SettingsFrame {
    pub header_table_size:      u32,
    pub enable_push:            u32,
    pub max_concurrent_streams: u32,
    pub initial_window_size:    u32,
    pub max_frame_size:         u32,
    pub max_header_list_size:   u32,
}

impl Default for SettingsFrame {
    fn default() -> Self {
        Self {
            header_table_size:      4096,
            enable_push:            1,
            max_concurrent_streams: 100,
            initial_window_size:    65535,
            max_frame_size:         16384,
            max_header_list_size:   65535,
        }
    }
}

impl SettingsFrame {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advertise ENABLE_PUSH = 0. Some clients refuse a peer that enables push.
    pub fn disable_push(&mut self) {
        self.enable_push = 0;
    }

    fn parameters(&self) -> [(u16, u32); 6] {
        [
            (SETTINGS_HEADER_TABLE_SIZE, self.header_table_size),
            (SETTINGS_ENABLE_PUSH, self.enable_push),
            (SETTINGS_MAX_CONCURRENT_STREAMS, self.max_concurrent_streams),
            (SETTINGS_INITIAL_WINDOW_SIZE, self.initial_window_size),
            (SETTINGS_MAX_FRAME_SIZE, self.max_frame_size),
            (SETTINGS_MAX_HEADER_LIST_SIZE, self.max_header_list_size),
        ]
    }
}

impl FrameBuilder for SettingsFrame {
    fn frame_type(&self) -> FrameType {
        FrameType::Settings
    }

    fn flags(&self) -> u8 {
        0
    }

    fn stream_id(&self) -> StreamId {
        StreamId::CONNECTION
    }

    fn payload(&self) -> Vec<u8> {
        // 6 bytes per setting (2-byte id, 4-byte value)
        let mut payload = Vec::with_capacity(36);
        for (id, value) in self.parameters() {
            payload.extend_from_slice(&id.to_be_bytes());
            payload.extend_from_slice(&value.to_be_bytes());
        }
        payload
    }
}

/// PUSH_PROMISE frame (RFC 7540 §6.6): padded, END_HEADERS.
#[derive(Debug, Clone)]
pub struct PushPromiseFrame {
    stream_id:          StreamId,
    promised_stream_id: StreamId,
    headers:            HeaderList,
    padding_length:     u8,
}

impl PushPromiseFrame {
    pub fn new(
        stream_id: StreamId,
        promised_stream_id: StreamId,
        headers: HeaderList,
    ) -> Result<Self, FuzzError> {
        let stream_id = require_stream(stream_id)?;
        if !promised_stream_id.is_stream() {
            return Err(FuzzError::with_stream(
                FuzzErrorKind::InvalidPromisedStreamId,
                promised_stream_id,
            ));
        }
        Ok(Self {
            stream_id,
            promised_stream_id,
            headers,
            padding_length: DEFAULT_DATA_PADDING,
        })
    }
}

impl FrameBuilder for PushPromiseFrame {
    fn frame_type(&self) -> FrameType {
        FrameType::PushPromise
    }

    fn flags(&self) -> u8 {
        FLAG_PADDED | FLAG_END_HEADERS
    }

    fn stream_id(&self) -> StreamId {
        self.stream_id
    }

    fn payload(&self) -> Vec<u8> {
        // [Pad Length (1)] [Promised Stream ID (4)] [Header Block] [Padding]
        let block = encode_header_block(&self.headers);
        let mut payload = Vec::with_capacity(5 + block.len() + self.padding_length as usize);
        payload.push(self.padding_length);
        payload.extend_from_slice(&self.promised_stream_id.0.to_be_bytes());
        payload.extend_from_slice(&block);
        push_padding(&mut payload, self.padding_length);
        payload
    }
}

/// Length of PING opaque data
pub const PING_DATA_LENGTH: usize = 8;

/// PING frame (RFC 7540 §6.7), always on stream 0.
#[derive(Debug, Clone)]
pub struct PingFrame {
    data: [u8; PING_DATA_LENGTH],
}

impl PingFrame {
    pub fn new(data: [u8; PING_DATA_LENGTH]) -> Self {
        Self { data }
    }
}

impl FrameBuilder for PingFrame {
    fn frame_type(&self) -> FrameType {
        FrameType::Ping
    }

    fn flags(&self) -> u8 {
        0
    }

    fn stream_id(&self) -> StreamId {
        StreamId::CONNECTION
    }

    fn payload(&self) -> Vec<u8> {
        self.data.to_vec()
    }
}

/// GOAWAY frame (RFC 7540 §6.8), always on stream 0.
///
/// `last_stream_id` is written as a full 32-bit value so the reserved bit
/// can be exercised.
#[derive(Debug, Clone)]
pub struct GoAwayFrame {
    last_stream_id: u32,
    error_code:     u32,
    debug_data:     Vec<u8>,
}

impl GoAwayFrame {
    pub fn new(last_stream_id: u32, error_code: u32, debug_data: Vec<u8>) -> Self {
        Self {
            last_stream_id,
            error_code,
            debug_data,
        }
    }
}

impl FrameBuilder for GoAwayFrame {
    fn frame_type(&self) -> FrameType {
        FrameType::GoAway
    }

    fn flags(&self) -> u8 {
        0
    }

    fn stream_id(&self) -> StreamId {
        StreamId::CONNECTION
    }

    fn payload(&self) -> Vec<u8> {
        let mut payload = Vec::with_capacity(8 + self.debug_data.len());
        payload.extend_from_slice(&self.last_stream_id.to_be_bytes());
        payload.extend_from_slice(&self.error_code.to_be_bytes());
        payload.extend_from_slice(&self.debug_data);
        payload
    }
}

/// WINDOW_UPDATE frame (RFC 7540 §6.9) on a caller-supplied stream.
#[derive(Debug, Clone)]
pub struct WindowUpdateFrame {
    stream_id:             StreamId,
    window_size_increment: u32,
}

impl WindowUpdateFrame {
    pub fn new(stream_id: StreamId, window_size_increment: u32) -> Self {
        Self {
            stream_id,
            window_size_increment,
        }
    }
}

impl FrameBuilder for WindowUpdateFrame {
    fn frame_type(&self) -> FrameType {
        FrameType::WindowUpdate
    }

    fn flags(&self) -> u8 {
        0
    }

    fn stream_id(&self) -> StreamId {
        self.stream_id
    }

    fn payload(&self) -> Vec<u8> {
        self.window_size_increment.to_be_bytes().to_vec()
    }
}

/// CONTINUATION frame (RFC 7540 §6.10): header block only, no flags.
#[derive(Debug, Clone)]
pub struct ContinuationFrame {
    stream_id: StreamId,
    headers:   HeaderList,
}

impl ContinuationFrame {
    pub fn new(stream_id: StreamId, headers: HeaderList) -> Result<Self, FuzzError> {
        Ok(Self {
            stream_id: require_stream(stream_id)?,
            headers,
        })
    }
}

impl FrameBuilder for ContinuationFrame {
    fn frame_type(&self) -> FrameType {
        FrameType::Continuation
    }

    fn flags(&self) -> u8 {
        0
    }

    fn stream_id(&self) -> StreamId {
        self.stream_id
    }

    fn payload(&self) -> Vec<u8> {
        encode_header_block(&self.headers)
    }
}
