use super::{ByteSet, Engine, MutationParams, Mutator, Subject};
use crate::error::FuzzError;

struct ByteSubject<'a> {
    buf:     &'a mut [u8],
    ignored: &'a ByteSet,
}

impl Subject for ByteSubject<'_> {
    fn is_mutable(&self, pos: usize) -> bool {
        !self.ignored.contains(self.buf[pos])
    }

    fn overwrite(&mut self, pos: usize, byte: u8) -> bool {
        self.buf[pos] = byte;
        true
    }
}

/// Mutates a fixed byte sequence.
#[derive(Debug, Clone)]
pub struct ByteArrayMutator {
    original:       Vec<u8>,
    ignored:        ByteSet,
    engine:         Engine,
    last_positions: Vec<usize>,
}

impl ByteArrayMutator {
    pub fn new(original: impl Into<Vec<u8>>, params: &MutationParams) -> Result<Self, FuzzError> {
        let original = original.into();
        let engine = Engine::new(params, original.len())?;
        Ok(Self {
            original,
            ignored: ByteSet::new(),
            engine,
            last_positions: Vec::new(),
        })
    }

    /// Never choose a position whose current byte is in `ignored`.
    pub fn with_ignored(mut self, ignored: ByteSet) -> Self {
        self.ignored = ignored;
        self
    }

    pub fn original(&self) -> &[u8] {
        &self.original
    }

    /// `(min_bytes, max_bytes)` derived from the ratio window.
    pub fn byte_counts(&self) -> (usize, usize) {
        self.engine.byte_counts()
    }

    /// Positions written by the most recent successful `next()`.
    pub fn last_positions(&self) -> &[usize] {
        &self.last_positions
    }
}

impl Mutator for ByteArrayMutator {
    type Output = Vec<u8>;

    fn next(&mut self) -> Result<Vec<u8>, FuzzError> {
        let mut fuzzed = self.original.clone();
        let len = fuzzed.len();
        let mut subject = ByteSubject {
            buf:     &mut fuzzed,
            ignored: &self.ignored,
        };
        self.last_positions = self.engine.mutate(&mut subject, len)?;
        Ok(fuzzed)
    }

    fn reset(&mut self) {
        self.engine.reset();
        self.last_positions.clear();
    }

    fn set_test(&mut self, test: u64) {
        self.engine.set_test(test);
    }

    fn test(&self) -> u64 {
        self.engine.test()
    }
}

/// Mutates the ASCII encoding of a string.
///
/// Non-ASCII characters are dropped when the subject is encoded. The output
/// is raw bytes since mutated bytes can leave the ASCII range.
#[derive(Debug, Clone)]
pub struct AsciiStringMutator {
    inner: ByteArrayMutator,
}

impl AsciiStringMutator {
    pub fn new(original: &str, params: &MutationParams) -> Result<Self, FuzzError> {
        let encoded: Vec<u8> = original
            .chars()
            .filter(char::is_ascii)
            .map(|c| c as u8)
            .collect();
        Ok(Self {
            inner: ByteArrayMutator::new(encoded, params)?,
        })
    }

    /// Never choose a position holding one of `symbols`. Non-ASCII symbols
    /// cannot occur in the subject and are skipped.
    pub fn with_ignored_symbols(mut self, symbols: &[char]) -> Self {
        let ignored = symbols
            .iter()
            .filter(|c| c.is_ascii())
            .map(|&c| c as u8)
            .collect();
        self.inner = self.inner.with_ignored(ignored);
        self
    }

    /// The ASCII-encoded subject.
    pub fn original(&self) -> &[u8] {
        self.inner.original()
    }
}

impl Mutator for AsciiStringMutator {
    type Output = Vec<u8>;

    fn next(&mut self) -> Result<Vec<u8>, FuzzError> {
        self.inner.next()
    }

    fn reset(&mut self) {
        self.inner.reset();
    }

    fn set_test(&mut self, test: u64) {
        self.inner.set_test(test);
    }

    fn test(&self) -> u64 {
        self.inner.test()
    }
}
