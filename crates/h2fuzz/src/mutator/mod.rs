//! Deterministic, seed-driven mutation of byte arrays, ASCII strings and
//! header dictionaries.
//!
//! Every mutator owns a base PRNG seeded once from the configured seed. Each
//! `next()` takes one draw from it, adds the current test index, and uses the
//! sum to seed three fresh PRNGs: one for the mutation count, one for
//! positions and one for replacement bytes. Rebuilding a mutator with the
//! same parameters therefore replays the same sequence, and `reset()`
//! rewinds it.

mod bytes;
mod dictionary;

pub use bytes::{AsciiStringMutator, ByteArrayMutator};
pub use dictionary::DictionaryMutator;
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};

use crate::error::{FuzzError, FuzzErrorKind};

/// Consecutive ignored draws tolerated before falling back to a scan of
/// the eligible positions, for subjects shorter than 8 bytes.
const MIN_REDRAW_LIMIT: usize = 64;

/// Ignored draws tolerated per subject byte before the scan fallback.
const REDRAWS_PER_BYTE: usize = 8;

/// Fraction of the subject to mutate per call, `0 <= min <= max <= 1`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatioWindow {
    min: f64,
    max: f64,
}

impl RatioWindow {
    pub fn new(min: f64, max: f64) -> Result<Self, FuzzError> {
        if !min.is_finite() || !max.is_finite() {
            return Err(FuzzErrorKind::InvalidRatio(format!("{min}:{max} is not finite")).into());
        }
        if min < 0.0 || max > 1.0 {
            return Err(FuzzErrorKind::InvalidRatio(format!("{min}:{max} is outside [0, 1]")).into());
        }
        if min > max {
            return Err(
                FuzzErrorKind::InvalidRatio(format!("minimum {min} exceeds maximum {max}")).into(),
            );
        }
        Ok(Self { min, max })
    }

    /// Window where min and max are the same ratio.
    pub fn fixed(ratio: f64) -> Result<Self, FuzzError> {
        Self::new(ratio, ratio)
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    /// Absolute `(min_bytes, max_bytes)` for a subject of `len` bytes.
    /// Halves round to even.
    pub fn to_byte_counts(&self, len: usize) -> (usize, usize) {
        let scale = |ratio: f64| (ratio * len as f64).round_ties_even() as usize;
        (scale(self.min), scale(self.max))
    }
}

impl Default for RatioWindow {
    fn default() -> Self {
        Self {
            min: 0.01,
            max: 0.05,
        }
    }
}

/// Seed context shared by every mutator and frame fuzzer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MutationParams {
    pub seed:       u64,
    pub start_test: u64,
    pub ratio:      RatioWindow,
}

impl MutationParams {
    /// Fails with `ZeroSeed` when `seed` is zero.
    pub fn new(seed: u64, start_test: u64, ratio: RatioWindow) -> Result<Self, FuzzError> {
        if seed == 0 {
            return Err(FuzzErrorKind::ZeroSeed.into());
        }
        Ok(Self {
            seed,
            start_test,
            ratio,
        })
    }
}

impl Default for MutationParams {
    fn default() -> Self {
        Self {
            seed:       1,
            start_test: 0,
            ratio:      RatioWindow::default(),
        }
    }
}

/// Set of byte values a mutator must never pick as a mutation site.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ByteSet {
    bits: [u64; 4],
}

impl ByteSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every byte value.
    pub fn all() -> Self {
        Self {
            bits: [u64::MAX; 4],
        }
    }

    pub fn insert(&mut self, byte: u8) {
        self.bits[(byte >> 6) as usize] |= 1 << (byte & 0x3F);
    }

    pub fn contains(&self, byte: u8) -> bool {
        self.bits[(byte >> 6) as usize] & (1 << (byte & 0x3F)) != 0
    }

    pub fn is_empty(&self) -> bool {
        self.bits.iter().all(|word| *word == 0)
    }
}

impl FromIterator<u8> for ByteSet {
    fn from_iter<I: IntoIterator<Item = u8>>(iter: I) -> Self {
        let mut set = ByteSet::new();
        for byte in iter {
            set.insert(byte);
        }
        set
    }
}

/// A deterministic generator of mutated copies of a fixed subject.
pub trait Mutator {
    type Output;

    /// Produce the mutation for the current test index, then advance it.
    ///
    /// On error the test index is left unchanged, but the base PRNG has
    /// still advanced, so retrying the same index draws a different pass.
    fn next(&mut self) -> Result<Self::Output, FuzzError>;

    /// Rewind to the start test and reseed the base PRNG.
    fn reset(&mut self);

    /// Reposition the test index without touching the base PRNG.
    fn set_test(&mut self, test: u64);

    fn test(&self) -> u64;
}

/// Mutable view of a subject during one mutation pass.
///
/// Positions address a virtual space whose length is fixed at the start of
/// the pass.
pub(crate) trait Subject {
    /// Whether the position may be chosen given the current state.
    fn is_mutable(&self, pos: usize) -> bool;

    /// Write `byte` at `pos`. Returns false when the write is rejected, in
    /// which case the draw counts as ignored.
    fn overwrite(&mut self, pos: usize, byte: u8) -> bool;
}

/// Seed bookkeeping and the position/byte selection loop shared by all
/// mutator flavors.
#[derive(Debug, Clone)]
pub(crate) struct Engine {
    seed:       u64,
    start_test: u64,
    test:       u64,
    min_bytes:  usize,
    max_bytes:  usize,
    base:       StdRng,
}

impl Engine {
    pub(crate) fn new(params: &MutationParams, subject_len: usize) -> Result<Self, FuzzError> {
        if params.seed == 0 {
            return Err(FuzzErrorKind::ZeroSeed.into());
        }
        let (min_bytes, max_bytes) = params.ratio.to_byte_counts(subject_len);
        if min_bytes > max_bytes {
            return Err(FuzzErrorKind::InvalidRatio(format!(
                "{min_bytes} minimum bytes exceed {max_bytes} maximum bytes"
            ))
            .into());
        }
        Ok(Self {
            seed: params.seed,
            start_test: params.start_test,
            test: params.start_test,
            min_bytes,
            max_bytes,
            base: StdRng::seed_from_u64(params.seed),
        })
    }

    pub(crate) fn reset(&mut self) {
        self.test = self.start_test;
        self.base = StdRng::seed_from_u64(self.seed);
    }

    pub(crate) fn set_test(&mut self, test: u64) {
        self.test = test;
    }

    pub(crate) fn test(&self) -> u64 {
        self.test
    }

    pub(crate) fn byte_counts(&self) -> (usize, usize) {
        (self.min_bytes, self.max_bytes)
    }

    /// Run one mutation pass over a subject whose virtual length is `len`.
    /// Returns the positions written, in order (repeats allowed).
    pub(crate) fn mutate<S: Subject>(
        &mut self,
        subject: &mut S,
        len: usize,
    ) -> Result<Vec<usize>, FuzzError> {
        let combining_seed = self.base.next_u64().wrapping_add(self.test);
        let count = if self.min_bytes == self.max_bytes {
            self.min_bytes
        } else {
            StdRng::seed_from_u64(combining_seed).gen_range(self.min_bytes..self.max_bytes)
        };
        crate::trace_debug!(test = self.test, count, "mutation pass");

        let mut positions = StdRng::seed_from_u64(combining_seed);
        let mut bytes = StdRng::seed_from_u64(combining_seed);
        let mut written = Vec::with_capacity(count);
        if count > 0 && len == 0 {
            return Err(FuzzErrorKind::NothingToMutate.into());
        }

        let redraw_limit = (len * REDRAWS_PER_BYTE).max(MIN_REDRAW_LIMIT);
        let mut misses = 0;
        while written.len() < count {
            let pos = if misses < redraw_limit {
                positions.gen_range(0..len)
            } else {
                let eligible: Vec<usize> = (0..len).filter(|&p| subject.is_mutable(p)).collect();
                if eligible.is_empty() {
                    crate::trace_warn!("every position is ignored");
                    return Err(FuzzErrorKind::NothingToMutate.into());
                }
                eligible[positions.gen_range(0..eligible.len())]
            };

            if !subject.is_mutable(pos) {
                misses += 1;
                continue;
            }

            let byte: u8 = bytes.r#gen();
            if subject.overwrite(pos, byte) {
                written.push(pos);
                misses = 0;
            } else {
                misses += 1;
                if misses > redraw_limit * 2 {
                    crate::trace_warn!(pos, "rejected writes exhausted the redraw budget");
                    return Err(FuzzErrorKind::NothingToMutate.into());
                }
            }
        }

        self.test += 1;
        Ok(written)
    }
}
