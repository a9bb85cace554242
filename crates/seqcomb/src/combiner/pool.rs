use std::sync::Arc;

use crate::{
    CombinerGroup, CombinerStats, LockError, Result, RetryPolicy, SequenceGenerator,
    SequenceSource,
};

/// A fixed population of callers partitioned into [`CombinerGroup`]s that all
/// claim from one shared [`SequenceSource`].
///
/// Callers are numbered `0..callers()`. Consecutive blocks of `group_size`
/// callers form one group: caller `c` lives in group `c / group_size` at slot
/// `c % group_size`. The assignment never changes after construction.
///
/// ## Features
/// - ✅ Thread-safe
/// - ✅ Contention on the shared counter drops with the group size
/// - ❌ Each caller id must be owned by exactly one thread
///
/// ## Recommended When
/// - Many threads hammer one counter and can be given stable ids
///
/// ## See Also
/// - [`AtomicSequenceGenerator`]
/// - [`LockSequenceGenerator`]
///
/// [`AtomicSequenceGenerator`]: crate::AtomicSequenceGenerator
/// [`LockSequenceGenerator`]: crate::LockSequenceGenerator
///
/// # Example
/// ```
/// use seqcomb::CombinerPool;
///
/// let pool = CombinerPool::new(8, 4);
/// assert_eq!(pool.groups().len(), 2);
///
/// let (group, slot) = pool.route(5);
/// assert_eq!(slot, 1);
/// assert!(std::ptr::eq(group, &pool.groups()[1]));
///
/// assert_eq!(pool.request(5), 0);
/// ```
#[derive(Debug)]
pub struct CombinerPool {
    groups: Vec<CombinerGroup>,
    group_size: usize,
    source: Arc<SequenceSource>,
}

impl CombinerPool {
    /// Creates a pool for `callers` callers in groups of `group_size`, drawing
    /// from a fresh source that starts at zero.
    ///
    /// # Panics
    /// Panics if `callers` or `group_size` is zero, or if `group_size` does
    /// not evenly divide `callers`.
    pub fn new(callers: usize, group_size: usize) -> Self {
        Self::with_source(callers, group_size, Arc::new(SequenceSource::new()))
    }

    /// Creates a pool drawing from an existing source.
    ///
    /// # Panics
    /// Panics if `callers` or `group_size` is zero, or if `group_size` does
    /// not evenly divide `callers`.
    pub fn with_source(callers: usize, group_size: usize, source: Arc<SequenceSource>) -> Self {
        Self::with_policy(callers, group_size, source, RetryPolicy::default())
    }

    /// Creates a pool drawing from an existing source, with an explicit
    /// [`RetryPolicy`] for every group.
    ///
    /// # Panics
    /// Panics if `callers` or `group_size` is zero, or if `group_size` does
    /// not evenly divide `callers`.
    pub fn with_policy(
        callers: usize,
        group_size: usize,
        source: Arc<SequenceSource>,
        policy: RetryPolicy,
    ) -> Self {
        assert!(callers > 0, "must have at least 1 caller");
        assert!(group_size > 0, "group size must be at least 1");
        assert!(
            callers % group_size == 0,
            "group size {group_size} must evenly divide {callers} callers"
        );

        let groups: Vec<_> = (0..callers / group_size)
            .map(|_| CombinerGroup::with_policy(group_size, Arc::clone(&source), policy))
            .collect();

        #[cfg(feature = "tracing")]
        tracing::debug!(
            callers,
            group_size,
            groups = groups.len(),
            ?policy,
            "combiner pool ready"
        );

        Self {
            groups,
            group_size,
            source,
        }
    }

    /// The group and slot owned by `caller`.
    ///
    /// # Panics
    /// Panics if `caller >= self.callers()`.
    #[inline]
    pub fn route(&self, caller: usize) -> (&CombinerGroup, usize) {
        (
            &self.groups[caller / self.group_size],
            caller % self.group_size,
        )
    }

    /// Returns the next sequence number for `caller`.
    ///
    /// # Panics
    /// Panics if `caller >= self.callers()`. Without `parking-lot`, also
    /// panics if a group lock is poisoned.
    pub fn request(&self, caller: usize) -> u64 {
        let (group, slot) = self.route(caller);
        group.request(slot)
    }

    /// A fallible version of [`Self::request`].
    ///
    /// # Errors
    /// - Returns [`Error::LockPoisoned`] if the caller's group lock is
    ///   poisoned (std mutex only).
    ///
    /// # Panics
    /// Panics if `caller >= self.callers()`.
    ///
    /// [`Error::LockPoisoned`]: crate::Error::LockPoisoned
    pub fn try_request(&self, caller: usize) -> Result<u64, LockError> {
        let (group, slot) = self.route(caller);
        group.try_request(slot)
    }

    /// Number of callers the pool was built for.
    pub fn callers(&self) -> usize {
        self.groups.len() * self.group_size
    }

    /// Size of every group.
    pub const fn group_size(&self) -> usize {
        self.group_size
    }

    /// All groups, in caller order.
    pub fn groups(&self) -> &[CombinerGroup] {
        &self.groups
    }

    /// The source shared by every group.
    pub fn source(&self) -> &Arc<SequenceSource> {
        &self.source
    }

    /// Stats of all groups merged.
    ///
    /// # Errors
    /// - Returns [`Error::LockPoisoned`] if any group lock is poisoned (std
    ///   mutex only).
    ///
    /// [`Error::LockPoisoned`]: crate::Error::LockPoisoned
    pub fn stats(&self) -> Result<CombinerStats, LockError> {
        self.groups.iter().map(CombinerGroup::stats).sum()
    }
}

impl SequenceGenerator for CombinerPool {
    type Err = LockError;

    fn try_next_sequence(&self, caller: usize) -> Result<u64, Self::Err> {
        self.try_request(caller)
    }

    fn try_counter(&self) -> Result<u64, Self::Err> {
        Ok(self.source.current())
    }
}
