//! Summaries of what the peer sent back.

use h2fuzz::StreamId;
use h2fuzz::frame::{FrameHeader, FrameType, is_http2_preface, looks_like_http2_frame, split_frames};
use http::StatusCode;
use tracing::info;

/// Space separated lower-case hex, e.g. `00 04 ff`.
pub fn hex_dump(data: &[u8]) -> String {
    let mut out = String::with_capacity(data.len() * 3);
    for (i, byte) in data.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        out.push_str(&format!("{byte:02x}"));
    }
    out
}

/// Check if data starts with an HTTP/1.x response
pub fn is_http1_response(data: &[u8]) -> bool {
    data.starts_with(b"HTTP/1.0") || data.starts_with(b"HTTP/1.1")
}

/// Status code of an HTTP/1.x response, once its status line is complete.
pub fn parse_status(data: &[u8]) -> Option<StatusCode> {
    let mut headers = [httparse::EMPTY_HEADER; 64];
    let mut res = httparse::Response::new(&mut headers);

    match res.parse(data) {
        Ok(httparse::Status::Complete(_)) | Ok(httparse::Status::Partial) => {},
        Err(_) => return None,
    }

    StatusCode::from_u16(res.code?).ok()
}

/// First line of `data`, lossily decoded, without the line break.
pub fn first_line(data: &[u8]) -> String {
    let end = data.iter().position(|&b| b == b'\n').unwrap_or(data.len());
    String::from_utf8_lossy(&data[..end]).trim_end_matches('\r').to_string()
}

/// One received frame, header fields only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameSummary {
    pub frame_type: u8,
    pub flags:      u8,
    pub stream_id:  StreamId,
    pub length:     u32,
}

impl From<&FrameHeader> for FrameSummary {
    fn from(header: &FrameHeader) -> Self {
        Self {
            frame_type: header.frame_type,
            flags:      header.flags,
            stream_id:  header.stream_id,
            length:     header.length,
        }
    }
}

impl std::fmt::Display for FrameSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match FrameType::from_code(self.frame_type) {
            Some(kind) => write!(f, "{kind}")?,
            None => write!(f, "UNKNOWN(0x{:02x})", self.frame_type)?,
        }
        write!(
            f,
            " flags=0x{:02x} stream={} length={}",
            self.flags, self.stream_id, self.length
        )
    }
}

/// What a chunk of received bytes looks like.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Received {
    /// Nothing arrived
    Empty,
    /// HTTP/2 frames, plus the number of trailing bytes of an incomplete frame
    Http2 {
        frames:   Vec<FrameSummary>,
        trailing: usize,
    },
    /// HTTP/1.x response
    Http1 {
        status: Option<StatusCode>,
        line:   String,
    },
    /// Anything else, by length
    Opaque(usize),
}

/// Classify received bytes. A leading client connection preface is skipped.
pub fn classify(data: &[u8]) -> Received {
    let data = if is_http2_preface(data) {
        &data[h2fuzz::CONNECTION_PREFACE.len()..]
    } else {
        data
    };

    if data.is_empty() {
        return Received::Empty;
    }
    if is_http1_response(data) {
        return Received::Http1 {
            status: parse_status(data),
            line:   first_line(data),
        };
    }
    if looks_like_http2_frame(data) {
        let (frames, rest) = split_frames(data);
        return Received::Http2 {
            frames:   frames.iter().map(|(header, _)| header.into()).collect(),
            trailing: rest.len(),
        };
    }
    Received::Opaque(data.len())
}

/// Log received bytes as hex plus one line per recognised frame.
pub fn log_received(test: u64, data: &[u8]) {
    if data.is_empty() {
        info!(test, "nothing received");
        return;
    }
    info!(test, "received {} bytes: {}", data.len(), hex_dump(data));
    match classify(data) {
        Received::Http2 { frames, trailing } => {
            for frame in &frames {
                info!(test, "  {frame}");
            }
            if trailing > 0 {
                info!(test, "  {trailing} bytes of an incomplete frame");
            }
        },
        Received::Http1 { line, .. } => info!(test, "  {line}"),
        Received::Empty | Received::Opaque(_) => {},
    }
}
