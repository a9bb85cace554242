use core::ops::Range;

use portable_atomic::{AtomicU64, Ordering};

use crate::padded::Padded;

/// The shared counter every strategy ultimately draws from.
///
/// A claim of `n` numbers atomically advances the counter by `n` and grants
/// the caller the half-open range `[lower, lower + n)`. Claims are totally
/// ordered, so granted ranges never overlap and each one lies above every
/// range granted before it.
///
/// The counter wraps modulo 2^64 like the underlying fetch-and-add.
///
/// # Example
/// ```
/// use seqcomb::SequenceSource;
///
/// let source = SequenceSource::new();
/// assert_eq!(source.claim(4), 0);
/// assert_eq!(source.claim(1), 4);
/// assert_eq!(source.current(), 5);
/// ```
#[derive(Debug)]
pub struct SequenceSource {
    next: Padded<AtomicU64>,
}

impl SequenceSource {
    /// Creates a source whose first claim starts at zero.
    pub const fn new() -> Self {
        Self::starting_at(0)
    }

    /// Creates a source whose first claim starts at `start`.
    pub const fn starting_at(start: u64) -> Self {
        Self {
            next: Padded::new(AtomicU64::new(start)),
        }
    }

    /// Claims `n` numbers and returns the lowest one.
    ///
    /// The caller exclusively owns `[lower, lower + n)`. Claiming zero numbers
    /// is a no-op that returns the current value.
    #[inline]
    pub fn claim(&self, n: u64) -> u64 {
        self.next.fetch_add(n, Ordering::AcqRel)
    }

    /// Claims `n` numbers and returns them as a range.
    #[inline]
    pub fn claim_range(&self, n: u64) -> Range<u64> {
        let lower = self.claim(n);
        lower..lower.wrapping_add(n)
    }

    /// The number the next claim will start at.
    pub fn current(&self) -> u64 {
        self.next.load(Ordering::Acquire)
    }
}

impl Default for SequenceSource {
    fn default() -> Self {
        Self::new()
    }
}
