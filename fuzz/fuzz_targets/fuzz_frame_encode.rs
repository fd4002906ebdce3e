//! Fuzz target: Frame encoding
//!
//! Structured arbitrary frames are encoded and decoded again. The header
//! must survive the round trip and a stream of frames must split back
//! into the same frames.

#![no_main]

use arbitrary::Arbitrary;
use h2fuzz::frame::{FRAME_HEADER_SIZE, MAX_STREAM_ID, decode_header, split_frames};
use h2fuzz::{StreamId, encode_frame};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct FuzzFrame {
    frame_type: u8,
    flags:      u8,
    stream_id:  u32,
    payload:    Vec<u8>,
}

fuzz_target!(|frames: Vec<FuzzFrame>| {
    let mut stream = Vec::new();
    for frame in &frames {
        let encoded = encode_frame(
            frame.frame_type,
            frame.flags,
            StreamId(frame.stream_id),
            &frame.payload,
        )
        .expect("payload fits the length field");
        assert_eq!(encoded.len(), FRAME_HEADER_SIZE + frame.payload.len());

        let header = decode_header(&encoded).expect("complete header");
        assert_eq!(header.length as usize, frame.payload.len());
        assert_eq!(header.frame_type, frame.frame_type);
        assert_eq!(header.flags, frame.flags);
        assert_eq!(header.stream_id, StreamId(frame.stream_id & MAX_STREAM_ID));
        stream.extend(encoded);
    }

    let (split, rest) = split_frames(&stream);
    assert!(rest.is_empty());
    assert_eq!(split.len(), frames.len());
    for ((_, payload), frame) in split.iter().zip(&frames) {
        assert_eq!(*payload, &frame.payload[..]);
    }
});
