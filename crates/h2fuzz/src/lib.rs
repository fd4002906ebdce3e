// HTTP/2 protocol fuzzing core
// Deterministic mutators, the RFC 7540 frame codec and per-frame fuzzers.
// Performs no I/O; connection handling lives in the runner crate.

#[cfg(feature = "tracing")]
macro_rules! trace_warn {
    ($($arg:tt)*) => { ::tracing::warn!($($arg)*) }
}
#[cfg(not(feature = "tracing"))]
macro_rules! trace_warn {
    ($($arg:tt)*) => {};
}
pub(crate) use trace_warn;

#[cfg(feature = "tracing")]
macro_rules! trace_debug {
    ($($arg:tt)*) => { ::tracing::debug!($($arg)*) }
}
#[cfg(not(feature = "tracing"))]
macro_rules! trace_debug {
    ($($arg:tt)*) => {};
}
pub(crate) use trace_debug;

mod compose;
mod error;
pub mod frame;
pub mod fuzzers;
pub mod hpack;
mod http1;
pub mod mutator;

pub use compose::{FuzzConfig, FuzzerKind, RoundRobin};
pub use error::{FuzzError, FuzzErrorKind};
pub use frame::{CONNECTION_PREFACE, FrameType, StreamId, client_preface, encode_frame};
pub use fuzzers::FrameFuzzer;
pub use hpack::{HeaderList, default_request_headers};
pub use http1::{DEFAULT_REQUEST, Http1RequestFuzzer, Http1Upgrade};
pub use mutator::{MutationParams, Mutator, RatioWindow};
