#![allow(dead_code)]
//! Helpers shared by the integration tests: raw frame inspection and
//! canned mutation parameters.

use h2fuzz::{HeaderList, MutationParams, RatioWindow};

/// Frame type constants
pub const FRAME_TYPE_DATA: u8 = 0x00;
pub const FRAME_TYPE_HEADERS: u8 = 0x01;
pub const FRAME_TYPE_SETTINGS: u8 = 0x04;

/// Parameters with a fixed mutation ratio.
pub fn fixed_params(seed: u64, ratio: f64) -> MutationParams {
    MutationParams::new(seed, 0, RatioWindow::fixed(ratio).unwrap()).unwrap()
}

/// Parameters with a ratio window.
pub fn window_params(seed: u64, min: f64, max: f64) -> MutationParams {
    MutationParams::new(seed, 0, RatioWindow::new(min, max).unwrap()).unwrap()
}

/// Split a raw frame into `(length, type, flags, stream_id)` and payload
/// without going through the crate's decoder.
pub fn raw_frame(frame: &[u8]) -> ((u32, u8, u8, u32), &[u8]) {
    assert!(frame.len() >= 9, "frame shorter than its header");
    let length = (frame[0] as u32) << 16 | (frame[1] as u32) << 8 | frame[2] as u32;
    let stream_id = u32::from_be_bytes([frame[5], frame[6], frame[7], frame[8]]);
    ((length, frame[3], frame[4], stream_id), &frame[9..])
}

/// Indices where two equally long buffers differ.
pub fn diff_positions(a: &[u8], b: &[u8]) -> Vec<usize> {
    assert_eq!(a.len(), b.len());
    a.iter()
        .zip(b)
        .enumerate()
        .filter(|(_, (x, y))| x != y)
        .map(|(i, _)| i)
        .collect()
}

/// Decode an HPACK header block with a fresh decoder.
pub fn decode_block(block: &[u8]) -> Vec<(Vec<u8>, Vec<u8>)> {
    let mut decoder = loona_hpack::Decoder::new();
    let mut headers = Vec::new();
    decoder
        .decode_with_cb(block, |name, value| {
            headers.push((name.to_vec(), value.to_vec()));
        })
        .expect("valid header block");
    headers
}

/// The two-entry dictionary `{"a": "1", "bb": "22"}`.
pub fn small_dictionary() -> HeaderList {
    [("a", "1"), ("bb", "22")].into_iter().collect()
}
