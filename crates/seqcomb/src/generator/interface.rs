use core::fmt;

use crate::Result;

/// A strategy for handing out unique, increasing sequence numbers to a fixed
/// population of callers.
///
/// `caller` identifies the calling thread. Strategies that need a stable
/// per-thread identity (the [`CombinerPool`]) route on it; the baselines
/// ignore it. A caller id must only ever be used by one thread at a time.
///
/// [`CombinerPool`]: crate::CombinerPool
pub trait SequenceGenerator {
    /// The error type returned by [`SequenceGenerator::try_next_sequence`].
    type Err: fmt::Debug;

    /// Returns the next sequence number for `caller`.
    ///
    /// This is the infallible counterpart to
    /// [`SequenceGenerator::try_next_sequence`], available when the
    /// strategy cannot fail.
    fn next_sequence(&self, caller: usize) -> u64
    where
        Self::Err: Into<core::convert::Infallible>,
    {
        match self.try_next_sequence(caller) {
            Ok(sequence) => sequence,
            Err(e) => {
                #[allow(unreachable_code)]
                // `into()` satisfies the trait bound at compile time.
                match e.into() {}
            }
        }
    }

    /// Returns the next sequence number for `caller`.
    ///
    /// # Errors
    ///
    /// May return an error if the underlying implementation uses a lock and it
    /// is poisoned.
    fn try_next_sequence(&self, caller: usize) -> Result<u64, Self::Err>;

    /// The value the backing counter will hand out next.
    ///
    /// After a run this minus the starting value is the number of sequence
    /// numbers issued.
    ///
    /// # Errors
    ///
    /// May return an error if the underlying implementation uses a lock and it
    /// is poisoned.
    fn try_counter(&self) -> Result<u64, Self::Err>;
}
