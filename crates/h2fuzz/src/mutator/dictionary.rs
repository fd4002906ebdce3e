use super::{ByteSet, Engine, MutationParams, Mutator, Subject};
use crate::error::FuzzError;
use crate::hpack::HeaderList;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Part {
    Key,
    Value,
}

/// View of a header list as one address space: `key1 value1 key2 value2 ...`
/// in insertion order.
pub(super) struct DictionarySubject<'a> {
    pub(super) list:          &'a mut HeaderList,
    pub(super) ignored_keys:  &'a [Vec<u8>],
    pub(super) ignored_bytes: &'a ByteSet,
}

impl DictionarySubject<'_> {
    /// Map a virtual position to `(entry, part, offset)` against the current
    /// state of the list. Positions past the current end resolve to nothing.
    fn resolve(&self, mut pos: usize) -> Option<(usize, Part, usize)> {
        for (index, (key, value)) in self.list.entries().iter().enumerate() {
            if pos < key.len() {
                return Some((index, Part::Key, pos));
            }
            pos -= key.len();
            if pos < value.len() {
                return Some((index, Part::Value, pos));
            }
            pos -= value.len();
        }
        None
    }

    fn is_ignored_key(&self, key: &[u8]) -> bool {
        self.ignored_keys.iter().any(|k| k == key)
    }
}

impl Subject for DictionarySubject<'_> {
    fn is_mutable(&self, pos: usize) -> bool {
        let Some((index, part, offset)) = self.resolve(pos) else {
            return false;
        };
        let (key, value) = &self.list.entries()[index];
        if self.is_ignored_key(key) {
            return false;
        }
        let symbol = match part {
            Part::Key => key[offset],
            Part::Value => value[offset],
        };
        !self.ignored_bytes.contains(symbol)
    }

    fn overwrite(&mut self, pos: usize, byte: u8) -> bool {
        let Some((index, part, offset)) = self.resolve(pos) else {
            return false;
        };
        match part {
            Part::Value => {
                self.list.entries_mut()[index].1[offset] = byte;
                true
            },
            Part::Key => {
                let mut renamed = self.list.entries()[index].0.clone();
                renamed[offset] = byte;
                if self.is_ignored_key(&renamed) {
                    return false;
                }
                // A rename always moves the entry: it is removed and then
                // inserted under the new key.
                let (_, value) = self.list.entries_mut().remove(index);
                self.list.insert(renamed, value);
                true
            },
        }
    }
}

/// Mutates the keys and values of a header dictionary.
///
/// The address space length is the sum of key and value lengths of the
/// original list. Within one call a renamed entry moves to the end of the
/// list (or merges into an existing entry with the same key), so later
/// positions of the same pass resolve against the moved layout.
#[derive(Debug, Clone)]
pub struct DictionaryMutator {
    original:      HeaderList,
    ignored_keys:  Vec<Vec<u8>>,
    ignored_bytes: ByteSet,
    engine:        Engine,
}

impl DictionaryMutator {
    pub fn new(original: HeaderList, params: &MutationParams) -> Result<Self, FuzzError> {
        let engine = Engine::new(params, original.total_len())?;
        Ok(Self {
            original,
            ignored_keys: Vec::new(),
            ignored_bytes: ByteSet::new(),
            engine,
        })
    }

    /// Entries with these keys are never touched, neither key nor value.
    pub fn with_ignored_keys<I, K>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<Vec<u8>>,
    {
        self.ignored_keys = keys.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_ignored_bytes(mut self, ignored: ByteSet) -> Self {
        self.ignored_bytes = ignored;
        self
    }

    pub fn original(&self) -> &HeaderList {
        &self.original
    }

    pub fn byte_counts(&self) -> (usize, usize) {
        self.engine.byte_counts()
    }
}

impl Mutator for DictionaryMutator {
    type Output = HeaderList;

    fn next(&mut self) -> Result<HeaderList, FuzzError> {
        let mut fuzzed = self.original.clone();
        let len = self.original.total_len();
        let mut subject = DictionarySubject {
            list:          &mut fuzzed,
            ignored_keys:  &self.ignored_keys,
            ignored_bytes: &self.ignored_bytes,
        };
        self.engine.mutate(&mut subject, len)?;
        Ok(fuzzed)
    }

    fn reset(&mut self) {
        self.engine.reset();
    }

    fn set_test(&mut self, test: u64) {
        self.engine.set_test(test);
    }

    fn test(&self) -> u64 {
        self.engine.test()
    }
}
