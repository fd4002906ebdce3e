use super::{DEFAULT_PROMISED_STREAM_ID, DEFAULT_STREAM_ID, FrameFuzzer};
use crate::error::{FuzzError, FuzzErrorKind};
use crate::frame::{ContinuationFrame, FrameBuilder, HeadersFrame, PushPromiseFrame, StreamId};
use crate::hpack::{DEFAULT_IGNORED_HEADER_NAMES, HeaderList};
use crate::mutator::{DictionaryMutator, MutationParams, Mutator};

fn header_mutator(
    headers: HeaderList,
    params: &MutationParams,
) -> Result<DictionaryMutator, FuzzError> {
    if headers.is_empty() {
        return Err(FuzzErrorKind::MissingHeaders.into());
    }
    Ok(DictionaryMutator::new(headers, params)?.with_ignored_keys(DEFAULT_IGNORED_HEADER_NAMES))
}

/// Mutates a header dictionary, then builds a HEADERS frame from it.
///
/// The pseudo-header and `accept` entries are left alone so the request
/// stays routable.
#[derive(Debug, Clone)]
pub struct HeadersFuzzer {
    mutator:   DictionaryMutator,
    stream_id: StreamId,
}

impl HeadersFuzzer {
    pub fn new(headers: HeaderList, params: &MutationParams) -> Result<Self, FuzzError> {
        Ok(Self {
            mutator:   header_mutator(headers, params)?,
            stream_id: DEFAULT_STREAM_ID,
        })
    }

    pub fn with_stream_id(mut self, stream_id: StreamId) -> Result<Self, FuzzError> {
        self.stream_id = HeadersFrame::new(stream_id, HeaderList::new())?.stream_id();
        Ok(self)
    }

    /// Replace the default ignored keys.
    pub fn with_ignored_keys<I, K>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<Vec<u8>>,
    {
        self.mutator = self.mutator.with_ignored_keys(keys);
        self
    }
}

impl FrameFuzzer for HeadersFuzzer {
    delegate_mutator!("headers");

    fn next(&mut self) -> Result<Vec<u8>, FuzzError> {
        let headers = self.mutator.next()?;
        HeadersFrame::new(self.stream_id, headers)?.encode()
    }
}

/// Mutates a header dictionary, then builds a PUSH_PROMISE frame from it.
#[derive(Debug, Clone)]
pub struct PushPromiseFuzzer {
    mutator:            DictionaryMutator,
    stream_id:          StreamId,
    promised_stream_id: StreamId,
}

impl PushPromiseFuzzer {
    pub fn new(headers: HeaderList, params: &MutationParams) -> Result<Self, FuzzError> {
        Ok(Self {
            mutator:            header_mutator(headers, params)?,
            stream_id:          DEFAULT_STREAM_ID,
            promised_stream_id: DEFAULT_PROMISED_STREAM_ID,
        })
    }

    pub fn with_stream_ids(
        mut self,
        stream_id: StreamId,
        promised_stream_id: StreamId,
    ) -> Result<Self, FuzzError> {
        PushPromiseFrame::new(stream_id, promised_stream_id, HeaderList::new())?;
        self.stream_id = stream_id;
        self.promised_stream_id = promised_stream_id;
        Ok(self)
    }
}

impl FrameFuzzer for PushPromiseFuzzer {
    delegate_mutator!("push_promise");

    fn next(&mut self) -> Result<Vec<u8>, FuzzError> {
        let headers = self.mutator.next()?;
        PushPromiseFrame::new(self.stream_id, self.promised_stream_id, headers)?.encode()
    }
}

/// Mutates a header dictionary, then builds a CONTINUATION frame from it.
#[derive(Debug, Clone)]
pub struct ContinuationFuzzer {
    mutator:   DictionaryMutator,
    stream_id: StreamId,
}

impl ContinuationFuzzer {
    pub fn new(headers: HeaderList, params: &MutationParams) -> Result<Self, FuzzError> {
        Ok(Self {
            mutator:   header_mutator(headers, params)?,
            stream_id: DEFAULT_STREAM_ID,
        })
    }

    pub fn with_stream_id(mut self, stream_id: StreamId) -> Result<Self, FuzzError> {
        self.stream_id = ContinuationFrame::new(stream_id, HeaderList::new())?.stream_id();
        Ok(self)
    }
}

impl FrameFuzzer for ContinuationFuzzer {
    delegate_mutator!("continuation");

    fn next(&mut self) -> Result<Vec<u8>, FuzzError> {
        let headers = self.mutator.next()?;
        ContinuationFrame::new(self.stream_id, headers)?.encode()
    }
}
