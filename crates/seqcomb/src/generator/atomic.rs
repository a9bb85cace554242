use std::sync::Arc;

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{Result, SequenceGenerator, SequenceSource};

/// A lock-free sequence generator: every call is one fetch-and-add on a
/// shared [`SequenceSource`].
///
/// ## Features
/// - ✅ Thread-safe
/// - ✅ Never blocks
/// - ❌ Every caller contends on the same cache line
///
/// ## Recommended When
/// - Contention is light, or few threads share the counter
/// - You want the simplest correct baseline
///
/// ## See Also
/// - [`LockSequenceGenerator`]
/// - [`CombinerPool`]
///
/// [`LockSequenceGenerator`]: crate::LockSequenceGenerator
/// [`CombinerPool`]: crate::CombinerPool
#[derive(Debug, Default)]
pub struct AtomicSequenceGenerator {
    source: Arc<SequenceSource>,
}

impl AtomicSequenceGenerator {
    /// Creates a generator whose first number is zero.
    ///
    /// # Example
    /// ```
    /// use seqcomb::AtomicSequenceGenerator;
    ///
    /// let generator = AtomicSequenceGenerator::new();
    /// assert_eq!(generator.next(), 0);
    /// assert_eq!(generator.next(), 1);
    /// ```
    pub fn new() -> Self {
        Self::with_source(Arc::new(SequenceSource::new()))
    }

    /// Creates a generator drawing from an existing, possibly shared, source.
    pub const fn with_source(source: Arc<SequenceSource>) -> Self {
        Self { source }
    }

    /// Returns the next sequence number.
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    #[inline]
    pub fn next(&self) -> u64 {
        self.source.claim(1)
    }

    /// The source this generator draws from.
    pub fn source(&self) -> &Arc<SequenceSource> {
        &self.source
    }
}

impl SequenceGenerator for AtomicSequenceGenerator {
    type Err = core::convert::Infallible;

    fn try_next_sequence(&self, _caller: usize) -> Result<u64, Self::Err> {
        Ok(self.next())
    }

    fn try_counter(&self) -> Result<u64, Self::Err> {
        Ok(self.source.current())
    }
}
