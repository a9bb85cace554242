#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{
    LockError, Result,
    generator::{Mutex, SequenceGenerator},
    padded::Padded,
};

/// A lock-based sequence generator: all callers are serialized behind one
/// mutex around a plain increment.
///
/// ## Features
/// - ✅ Thread-safe
/// - ✅ Works on targets without 64-bit atomics
/// - ❌ Every call is a full lock acquisition; no fairness guarantee
///
/// ## Recommended When
/// - You need a reference point for the other strategies
///
/// ## See Also
/// - [`AtomicSequenceGenerator`]
/// - [`CombinerPool`]
///
/// [`AtomicSequenceGenerator`]: crate::AtomicSequenceGenerator
/// [`CombinerPool`]: crate::CombinerPool
#[derive(Debug, Default)]
pub struct LockSequenceGenerator {
    pub(crate) state: Padded<Mutex<u64>>,
}

impl LockSequenceGenerator {
    /// Creates a generator whose first number is zero.
    pub fn new() -> Self {
        Self::starting_at(0)
    }

    /// Creates a generator whose first number is `start`.
    pub fn starting_at(start: u64) -> Self {
        Self {
            state: Padded::new(Mutex::new(start)),
        }
    }

    /// Returns the next sequence number.
    ///
    /// # Panics
    /// Without `parking-lot`, panics if the lock is poisoned. For explicitly
    /// fallible behavior, use [`Self::try_next`] instead.
    ///
    /// # Example
    /// ```
    /// use seqcomb::LockSequenceGenerator;
    ///
    /// let generator = LockSequenceGenerator::new();
    /// assert_eq!(generator.next(), 0);
    /// assert_eq!(generator.next(), 1);
    /// ```
    pub fn next(&self) -> u64 {
        match self.try_next() {
            Ok(sequence) => sequence,
            #[cfg(feature = "parking-lot")]
            Err(e) => match e {},
            #[cfg(not(feature = "parking-lot"))]
            Err(e) => panic!("sequence lock failed: {e}"),
        }
    }

    /// A fallible version of `next` that reports lock poisoning.
    ///
    /// # Errors
    /// - Returns [`Error::LockPoisoned`] if another thread panicked while
    ///   holding the lock (std mutex only).
    ///
    /// # Example
    /// ```
    /// use seqcomb::LockSequenceGenerator;
    ///
    /// let generator = LockSequenceGenerator::starting_at(100);
    /// assert_eq!(generator.try_next().unwrap(), 100);
    /// ```
    ///
    /// [`Error::LockPoisoned`]: crate::Error::LockPoisoned
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    pub fn try_next(&self) -> Result<u64, LockError> {
        let mut next = self.lock()?;
        let sequence = *next;
        *next = sequence.wrapping_add(1);
        Ok(sequence)
    }

    /// The number the next call will return.
    ///
    /// # Errors
    /// - Returns [`Error::LockPoisoned`] if the lock is poisoned (std mutex
    ///   only).
    ///
    /// [`Error::LockPoisoned`]: crate::Error::LockPoisoned
    pub fn try_current(&self) -> Result<u64, LockError> {
        Ok(*self.lock()?)
    }

    fn lock(&self) -> Result<crate::generator::MutexGuard<'_, u64>, LockError> {
        #[cfg(feature = "parking-lot")]
        {
            Ok(self.state.lock())
        }
        #[cfg(not(feature = "parking-lot"))]
        {
            Ok(self.state.lock()?)
        }
    }
}

impl SequenceGenerator for LockSequenceGenerator {
    type Err = LockError;

    fn try_next_sequence(&self, _caller: usize) -> Result<u64, Self::Err> {
        self.try_next()
    }

    fn try_counter(&self) -> Result<u64, Self::Err> {
        self.try_current()
    }
}
